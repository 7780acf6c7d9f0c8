//! Change of Character (CHoCH) detection.
//!
//! A CHoCH is a directional-change structure built from six consecutive
//! alternating pivots. The bullish variant needs a lower high and a lower
//! low followed by a contraction that holds above the last swing low; the
//! signal fires on the first close above the fifth pivot's high. The
//! bearish variant is the mirror image, firing on the first close below
//! the fifth pivot's low.

use std::collections::HashMap;

use super::detect_six_pivot;
use crate::{
    params::{get_flag, ParamMeta, Parameterized},
    Ohlc, PatternId, PivotMark, Result, StructureDetector, StructureMatch,
};

impl_with_defaults!(ChochDetector);

pub const CHOCH: PatternId = PatternId("CHOCH");

const CHOCH_PARAMS: &[ParamMeta] = &[
    ParamMeta::flag("bullish", 1.0, "Detect bullish CHoCH structures"),
    ParamMeta::flag("bearish", 1.0, "Detect bearish CHoCH structures"),
];

/// CHoCH - Change of Character (bullish and bearish)
#[derive(Debug, Clone)]
pub struct ChochDetector {
    pub bullish: bool,
    pub bearish: bool,
}

impl Default for ChochDetector {
    fn default() -> Self {
        Self {
            bullish: true,
            bearish: true,
        }
    }
}

impl StructureDetector for ChochDetector {
    fn id(&self) -> PatternId {
        CHOCH
    }

    fn detect<T: Ohlc>(&self, bars: &[T], pivots: &[PivotMark]) -> Result<Vec<StructureMatch>> {
        detect_six_pivot(CHOCH, bars, pivots, self.bullish, self.bearish)
    }
}

impl Parameterized for ChochDetector {
    fn param_meta() -> &'static [ParamMeta] {
        CHOCH_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            bullish: get_flag(params, "bullish", true)?,
            bearish: get_flag(params, "bearish", true)?,
        })
    }

    fn id_str() -> &'static str {
        "CHOCH"
    }
}
