//! Pivot-point extraction over a centered sliding window.
//!
//! A bar is a pivot high when its high is the maximum high of the window
//! centered on it, and a pivot low when its low is the window minimum low.
//! Ties go to pivot high. Bars whose window runs off either end of the
//! series are never marked.
//!
//! The window extrema are maintained with monotonic deques, so a full pass
//! is O(n) regardless of window size.

use std::collections::{HashMap, VecDeque};

use crate::{
    params::{get_window, ParamMeta, Parameterized},
    Ohlc, PivotMark, Result, Window,
};

const PIVOT_PARAMS: &[ParamMeta] = &[ParamMeta::window(
    "window",
    17.0,
    (5.0, 41.0, 2.0),
    "Centered window size for pivot classification (odd)",
)];

/// Marks each bar of an OHLC series as pivot high, pivot low, or neither
#[derive(Debug, Clone)]
pub struct PivotExtractor {
    pub window: Window,
}

impl Default for PivotExtractor {
    fn default() -> Self {
        Self {
            window: Window::new_const(17),
        }
    }
}

impl PivotExtractor {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Classify every bar. The output always has `bars.len()` entries;
    /// a series shorter than the window yields all `None`.
    pub fn extract<T: Ohlc>(&self, bars: &[T]) -> Vec<PivotMark> {
        let len = bars.len();
        let mut marks = vec![PivotMark::None; len];

        let w = self.window.get();
        if len < w {
            return marks;
        }
        let half = self.window.half();

        // Monotonic deques of bar indices: max_dq non-increasing by high,
        // min_dq non-decreasing by low. Equal values are kept so a tie at
        // the window edge still reports the true extremum.
        let mut max_dq: VecDeque<usize> = VecDeque::with_capacity(w + 1);
        let mut min_dq: VecDeque<usize> = VecDeque::with_capacity(w + 1);

        for j in 0..len {
            let high = bars[j].high();
            while let Some(&back) = max_dq.back() {
                if bars[back].high() < high {
                    max_dq.pop_back();
                } else {
                    break;
                }
            }
            max_dq.push_back(j);

            let low = bars[j].low();
            while let Some(&back) = min_dq.back() {
                if bars[back].low() > low {
                    min_dq.pop_back();
                } else {
                    break;
                }
            }
            min_dq.push_back(j);

            // The window ending at j is full once j >= w - 1; its center
            // is i = j - half.
            if j + 1 < w {
                continue;
            }
            let start = j + 1 - w;
            while max_dq.front().is_some_and(|&f| f < start) {
                max_dq.pop_front();
            }
            while min_dq.front().is_some_and(|&f| f < start) {
                min_dq.pop_front();
            }

            let center = j - half;
            // High first; the low check is skipped on a tie. See PivotMark.
            if bars[center].high() == bars[max_dq[0]].high() {
                marks[center] = PivotMark::High;
            } else if bars[center].low() == bars[min_dq[0]].low() {
                marks[center] = PivotMark::Low;
            }
        }

        marks
    }
}

impl Parameterized for PivotExtractor {
    fn param_meta() -> &'static [ParamMeta] {
        PIVOT_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_window(params, "window", 17)?,
        })
    }

    fn id_str() -> &'static str {
        "PIVOT_POINTS"
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct Bar {
        h: f64,
        l: f64,
    }

    impl Ohlc for Bar {
        fn open(&self) -> f64 {
            (self.h + self.l) / 2.0
        }

        fn high(&self) -> f64 {
            self.h
        }

        fn low(&self) -> f64 {
            self.l
        }

        fn close(&self) -> f64 {
            (self.h + self.l) / 2.0
        }
    }

    fn bars_from(points: &[(f64, f64)]) -> Vec<Bar> {
        points.iter().map(|&(h, l)| Bar { h, l }).collect()
    }

    /// Reference implementation: rescan the whole window per bar.
    fn extract_naive(bars: &[Bar], window: Window) -> Vec<PivotMark> {
        let half = window.half();
        let len = bars.len();
        let mut marks = vec![PivotMark::None; len];
        for i in 0..len {
            if i < half || i + half >= len {
                continue;
            }
            let slice = &bars[i - half..=i + half];
            let max = slice.iter().map(|b| b.h).fold(f64::NEG_INFINITY, f64::max);
            let min = slice.iter().map(|b| b.l).fold(f64::INFINITY, f64::min);
            if bars[i].h == max {
                marks[i] = PivotMark::High;
            } else if bars[i].l == min {
                marks[i] = PivotMark::Low;
            }
        }
        marks
    }

    #[test]
    fn test_single_peak_and_trough() {
        let bars = bars_from(&[
            (5.0, 4.0),
            (6.0, 5.0),
            (9.0, 8.0), // pivot high at 2
            (6.0, 5.0),
            (5.0, 2.0), // pivot low at 4
            (6.0, 5.0),
            (7.0, 6.0),
        ]);
        let marks = PivotExtractor::new(Window::new(3).unwrap()).extract(&bars);

        assert_eq!(marks[2], PivotMark::High);
        assert_eq!(marks[4], PivotMark::Low);
        assert_eq!(marks[3], PivotMark::None);
    }

    #[test]
    fn test_edges_unmarked() {
        let bars = bars_from(&[(9.0, 1.0); 20]);
        let window = Window::new(5).unwrap();
        let marks = PivotExtractor::new(window).extract(&bars);

        for i in 0..window.half() {
            assert_eq!(marks[i], PivotMark::None, "leading edge {i}");
            assert_eq!(marks[19 - i], PivotMark::None, "trailing edge {}", 19 - i);
        }
    }

    #[test]
    fn test_flat_series_ties_go_high() {
        // Every bar is simultaneously window max-high and min-low; the
        // high check wins.
        let bars = bars_from(&[(5.0, 5.0); 10]);
        let marks = PivotExtractor::new(Window::new(3).unwrap()).extract(&bars);

        assert_eq!(marks[0], PivotMark::None);
        for mark in &marks[1..9] {
            assert_eq!(*mark, PivotMark::High);
        }
        assert_eq!(marks[9], PivotMark::None);
    }

    #[test]
    fn test_series_shorter_than_window() {
        let bars = bars_from(&[(9.0, 1.0), (8.0, 2.0), (7.0, 3.0)]);
        let marks = PivotExtractor::new(Window::new(5).unwrap()).extract(&bars);
        assert!(marks.iter().all(|m| *m == PivotMark::None));
    }

    #[test]
    fn test_window_one_marks_everything_high() {
        let bars = bars_from(&[(1.0, 0.5), (2.0, 1.5), (3.0, 2.5)]);
        let marks = PivotExtractor::new(Window::new(1).unwrap()).extract(&bars);
        assert!(marks.iter().all(|m| *m == PivotMark::High));
    }

    #[test]
    fn test_deterministic() {
        let bars = bars_from(&[
            (5.0, 4.0),
            (7.0, 6.0),
            (6.0, 3.0),
            (8.0, 7.0),
            (4.0, 2.0),
            (9.0, 8.0),
            (5.0, 4.0),
        ]);
        let extractor = PivotExtractor::new(Window::new(3).unwrap());
        assert_eq!(extractor.extract(&bars), extractor.extract(&bars));
    }

    #[test]
    fn test_with_params() {
        let mut params = HashMap::new();
        params.insert("window", 9.0);
        let extractor = PivotExtractor::with_params(&params).unwrap();
        assert_eq!(extractor.window.get(), 9);

        params.insert("window", 8.0);
        assert!(PivotExtractor::with_params(&params).is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_bars(max_len: usize) -> impl Strategy<Value = Vec<Bar>> {
            prop::collection::vec((1.0f64..100.0, 0.0f64..1.0), 0..max_len).prop_map(|points| {
                points
                    .into_iter()
                    .map(|(l, spread)| Bar { h: l + spread, l })
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn matches_naive_reference(bars in arb_bars(80), half in 0usize..6) {
                let window = Window::new(2 * half + 1).unwrap();
                let fast = PivotExtractor::new(window).extract(&bars);
                let naive = extract_naive(&bars, window);
                prop_assert_eq!(fast, naive);
            }

            #[test]
            fn edges_never_marked(bars in arb_bars(40)) {
                let window = Window::new(7).unwrap();
                let marks = PivotExtractor::new(window).extract(&bars);
                let half = window.half();
                for (i, mark) in marks.iter().enumerate() {
                    if i < half || i + half >= bars.len() {
                        prop_assert_eq!(*mark, PivotMark::None);
                    }
                }
            }
        }
    }
}
