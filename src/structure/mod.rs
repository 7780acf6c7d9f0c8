//! Six-pivot market-structure pattern matchers.
//!
//! Both built-in patterns walk the ordered pivot list with a window of six
//! consecutive pivots, validate an alternating high/low kind sequence plus
//! an inequality chain over the pivot extremes, and then scan forward from
//! the sixth pivot for the first close beyond the fifth pivot's extreme
//! (the breakout). Every overlapping six-window is evaluated; a match never
//! skips the scan ahead.

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod bos_failure;
pub mod choch;

pub use bos_failure::BosFailureDetector;
pub use choch::ChochDetector;

use crate::{Direction, Ohlc, PatternId, PivotMark, Result, ScanError, StructureMatch};

const BULLISH_KINDS: [PivotMark; 6] = [
    PivotMark::High,
    PivotMark::Low,
    PivotMark::High,
    PivotMark::Low,
    PivotMark::High,
    PivotMark::Low,
];

const BEARISH_KINDS: [PivotMark; 6] = [
    PivotMark::Low,
    PivotMark::High,
    PivotMark::Low,
    PivotMark::High,
    PivotMark::Low,
    PivotMark::High,
];

/// Series indices of every marked pivot, in time order.
pub(crate) fn pivot_indices(pivots: &[PivotMark]) -> Vec<usize> {
    pivots
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.is_pivot().then_some(i))
        .collect()
}

/// Shared six-pivot walk used by CHoCH and BOS-failure detection.
///
/// For each window, bullish is evaluated before bearish, and windows run in
/// ascending order; the returned match list preserves that order so folding
/// it into a signal column reproduces the scan's write order exactly.
pub(crate) fn detect_six_pivot<T: Ohlc>(
    id: PatternId,
    bars: &[T],
    pivots: &[PivotMark],
    bullish: bool,
    bearish: bool,
) -> Result<Vec<StructureMatch>> {
    if bars.len() != pivots.len() {
        return Err(ScanError::LengthMismatch {
            bars: bars.len(),
            pivots: pivots.len(),
        });
    }

    let mut matches = Vec::new();
    if !bullish && !bearish {
        return Ok(matches);
    }

    let indices = pivot_indices(pivots);
    if indices.len() < 6 {
        return Ok(matches);
    }

    for w in indices.windows(6) {
        let kinds = [
            pivots[w[0]],
            pivots[w[1]],
            pivots[w[2]],
            pivots[w[3]],
            pivots[w[4]],
            pivots[w[5]],
        ];
        let six: [usize; 6] = [w[0], w[1], w[2], w[3], w[4], w[5]];

        if bullish && kinds == BULLISH_KINDS {
            let (p1, p3, p5) = (bars[w[0]].high(), bars[w[2]].high(), bars[w[4]].high());
            let (p2, p4, p6) = (bars[w[1]].low(), bars[w[3]].low(), bars[w[5]].low());

            // Lower high (p3 < p1), lower low (p4 < p2), then a contraction
            // holding above the last swing low (p4 < p6 < p5 < p3).
            let valid = p1 > p2
                && p3 > p2
                && p3 < p1
                && p4 < p2
                && p5 > p4
                && p5 < p3
                && p6 < p5
                && p6 > p4;

            if valid {
                if let Some(breakout) = (w[5]..bars.len()).find(|&i| bars[i].close() > p5) {
                    matches.push(StructureMatch {
                        pattern_id: id,
                        direction: Direction::Bullish,
                        pivot_indices: six,
                        trigger: p5,
                        breakout_index: breakout,
                    });
                }
            }
        }

        if bearish && kinds == BEARISH_KINDS {
            let (p1, p3, p5) = (bars[w[0]].low(), bars[w[2]].low(), bars[w[4]].low());
            let (p2, p4, p6) = (bars[w[1]].high(), bars[w[3]].high(), bars[w[5]].high());

            let valid = p1 < p2
                && p3 < p2
                && p3 > p1
                && p4 > p2
                && p5 < p4
                && p5 > p3
                && p6 > p5
                && p6 < p4;

            if valid {
                if let Some(breakout) = (w[5]..bars.len()).find(|&i| bars[i].close() < p5) {
                    matches.push(StructureMatch {
                        pattern_id: id,
                        direction: Direction::Bearish,
                        pivot_indices: six,
                        trigger: p5,
                        breakout_index: breakout,
                    });
                }
            }
        }
    }

    Ok(matches)
}

/// Fold a match list into a per-bar signal column.
///
/// Matches are applied in list order, so when two windows break out at the
/// same bar the later one wins - the same write order as the scan itself.
pub fn signal_column(matches: &[StructureMatch], len: usize) -> Vec<Option<Direction>> {
    let mut column = vec![None; len];
    for m in matches {
        if m.breakout_index < len {
            column[m.breakout_index] = Some(m.direction);
        }
    }
    column
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pivot_indices() {
        let pivots = [
            PivotMark::None,
            PivotMark::High,
            PivotMark::None,
            PivotMark::Low,
            PivotMark::High,
        ];
        assert_eq!(pivot_indices(&pivots), vec![1, 3, 4]);
    }

    #[test]
    fn test_signal_column_overwrite() {
        let template = StructureMatch {
            pattern_id: PatternId("CHOCH"),
            direction: Direction::Bullish,
            pivot_indices: [0, 1, 2, 3, 4, 5],
            trigger: 1.0,
            breakout_index: 7,
        };
        let matches = [
            template,
            StructureMatch {
                direction: Direction::Bearish,
                ..template
            },
        ];

        let column = signal_column(&matches, 10);
        assert_eq!(column[7], Some(Direction::Bearish));
        assert_eq!(column.iter().filter(|s| s.is_some()).count(), 1);
    }

    #[test]
    fn test_signal_column_empty() {
        let column = signal_column(&[], 5);
        assert_eq!(column, vec![None; 5]);
    }
}
