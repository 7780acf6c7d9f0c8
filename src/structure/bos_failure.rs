//! Break of Structure (BOS) failure detection.
//!
//! Shares the six-pivot geometry and breakout rule with CHoCH but carries
//! its own pattern id, so consumers tracking failed structure breaks can
//! tell the two signals apart.

use std::collections::HashMap;

use super::detect_six_pivot;
use crate::{
    params::{get_flag, ParamMeta, Parameterized},
    Ohlc, PatternId, PivotMark, Result, StructureDetector, StructureMatch,
};

impl_with_defaults!(BosFailureDetector);

pub const BOS_FAILURE: PatternId = PatternId("BOS_FAILURE");

const BOS_FAILURE_PARAMS: &[ParamMeta] = &[
    ParamMeta::flag("bullish", 1.0, "Detect bullish BOS-failure structures"),
    ParamMeta::flag("bearish", 1.0, "Detect bearish BOS-failure structures"),
];

/// BOS failure (bullish and bearish)
#[derive(Debug, Clone)]
pub struct BosFailureDetector {
    pub bullish: bool,
    pub bearish: bool,
}

impl Default for BosFailureDetector {
    fn default() -> Self {
        Self {
            bullish: true,
            bearish: true,
        }
    }
}

impl StructureDetector for BosFailureDetector {
    fn id(&self) -> PatternId {
        BOS_FAILURE
    }

    fn detect<T: Ohlc>(&self, bars: &[T], pivots: &[PivotMark]) -> Result<Vec<StructureMatch>> {
        detect_six_pivot(BOS_FAILURE, bars, pivots, self.bullish, self.bearish)
    }
}

impl Parameterized for BosFailureDetector {
    fn param_meta() -> &'static [ParamMeta] {
        BOS_FAILURE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            bullish: get_flag(params, "bullish", true)?,
            bearish: get_flag(params, "bearish", true)?,
        })
    }

    fn id_str() -> &'static str {
        "BOS_FAILURE"
    }
}
