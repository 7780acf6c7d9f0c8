//! # pivotscan - Pivot Point & Market Structure Pattern Detection
//!
//! Annotates OHLC price series with pivot-point marks and six-pivot
//! market-structure breakout signals (Change of Character, BOS failure).
//!
//! ## Quick Start
//!
//! ```rust
//! use pivotscan::prelude::*;
//!
//! // Define your OHLC data
//! struct Bar { o: f64, h: f64, l: f64, c: f64 }
//!
//! impl Ohlc for Bar {
//!     fn open(&self) -> f64 { self.o }
//!     fn high(&self) -> f64 { self.h }
//!     fn low(&self) -> f64 { self.l }
//!     fn close(&self) -> f64 { self.c }
//! }
//!
//! // Engine with the default pipeline: window-17 pivots + CHoCH (both directions)
//! let engine = EngineBuilder::new()
//!     .with_defaults()
//!     .build()
//!     .unwrap();
//!
//! let bars: Vec<Bar> = vec![];
//! let annotations = engine.scan(&bars).unwrap();
//! assert!(annotations.matches.is_empty());
//! ```

pub mod params;
pub mod pivots;
pub mod structure;

pub mod prelude {
    pub use crate::{
        // Parameters
        params::{get_flag, get_window, ParamMeta, ParamType, Parameterized},
        // Pivot extraction
        pivots::PivotExtractor,
        // Parallel
        scan_parallel,
        // Structure detectors
        structure::{signal_column, BosFailureDetector, ChochDetector},
        // Output
        Annotations,
        // Engine
        BuiltinDetector,
        Direction,
        // Core traits
        DynStructureDetector,
        EngineBuilder,
        Ohlc,
        OhlcExt,
        PatternId,
        PivotMark,
        Result,
        ScanEngine,
        // Errors
        ScanError,
        ScanFailure,
        ScanResult,
        StructureDetector,
        StructureMatch,
        Window,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors that can occur during pivot extraction or pattern scanning
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Pivot column has {pivots} entries but series has {bars} bars")]
    LengthMismatch { bars: usize, pivots: usize },

    #[error("Invalid OHLC at index {index}: {reason}")]
    InvalidOhlc { index: usize, reason: &'static str },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Pivot window size: odd positive integer, centered on the evaluated bar.
///
/// An even window would skew the lookback/lookahead split by one bar and
/// silently shift every pivot, so `new` rejects it outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Window(usize);

impl Window {
    /// Create a new Window, validating the value is odd and > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(ScanError::InvalidValue("Window must be > 0"));
        }
        if value % 2 == 0 {
            return Err(ScanError::InvalidValue(
                "Window must be odd to center symmetrically",
            ));
        }
        Ok(Self(value))
    }

    /// Create a Window from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }

    /// Number of bars on each side of the window center
    #[inline]
    pub fn half(self) -> usize {
        (self.0 - 1) / 2
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new_const(17)
    }
}

impl serde::Serialize for Window {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Window {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Window::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLC TRAITS
// ============================================================

/// Core OHLC data trait
pub trait Ohlc {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;

    fn timestamp(&self) -> Option<i64> {
        None
    }
}

/// Blanket impl for references to dyn Ohlc
impl Ohlc for &dyn Ohlc {
    fn open(&self) -> f64 {
        (*self).open()
    }

    fn high(&self) -> f64 {
        (*self).high()
    }

    fn low(&self) -> f64 {
        (*self).low()
    }

    fn close(&self) -> f64 {
        (*self).close()
    }

    fn timestamp(&self) -> Option<i64> {
        (*self).timestamp()
    }
}

/// Extension trait with computed properties for OHLC data
pub trait OhlcExt: Ohlc {
    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    /// Validate OHLC data consistency
    fn validate(&self) -> Result<()> {
        if self.high() < self.low() {
            return Err(ScanError::InvalidOhlc {
                index: 0,
                reason: "high < low",
            });
        }
        if self.open().is_nan()
            || self.high().is_nan()
            || self.low().is_nan()
            || self.close().is_nan()
        {
            return Err(ScanError::InvalidOhlc {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if self.open().is_infinite()
            || self.high().is_infinite()
            || self.low().is_infinite()
            || self.close().is_infinite()
        {
            return Err(ScanError::InvalidOhlc {
                index: 0,
                reason: "Infinite value in OHLC",
            });
        }
        Ok(())
    }
}

impl<T: Ohlc> OhlcExt for T {}

// ============================================================
// ANNOTATION VALUE TYPES
// ============================================================

/// Per-bar pivot classification.
///
/// Integer-coded `0/1/2` (none/high/low) on the wire. A bar whose high is
/// the window maximum AND whose low is the window minimum (flat data) is
/// classified `High`: the high check runs first and short-circuits the low
/// check. Downstream pattern results depend on this precedence, so it must
/// not change without notice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PivotMark {
    #[default]
    None,
    High,
    Low,
}

impl PivotMark {
    /// Integer code: 0 = none, 1 = pivot high, 2 = pivot low
    #[inline]
    pub fn code(self) -> u8 {
        match self {
            PivotMark::None => 0,
            PivotMark::High => 1,
            PivotMark::Low => 2,
        }
    }

    /// Inverse of [`code`](Self::code)
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(PivotMark::None),
            1 => Ok(PivotMark::High),
            2 => Ok(PivotMark::Low),
            _ => Err(ScanError::InvalidValue("PivotMark code must be 0, 1 or 2")),
        }
    }

    #[inline]
    pub fn is_pivot(self) -> bool {
        !matches!(self, PivotMark::None)
    }

    #[inline]
    pub fn is_high(self) -> bool {
        matches!(self, PivotMark::High)
    }

    #[inline]
    pub fn is_low(self) -> bool {
        matches!(self, PivotMark::Low)
    }
}

impl serde::Serialize for PivotMark {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.code().serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for PivotMark {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let code = u8::deserialize(d)?;
        PivotMark::from_code(code).map_err(serde::de::Error::custom)
    }
}

/// Direction of a structure breakout signal.
///
/// Signal-coded `+1/-1` on the wire; "no signal" is `Option::None` in the
/// output column, not a variant or a magic zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    /// Integer code: +1 = bullish, -1 = bearish
    #[inline]
    pub fn code(self) -> i8 {
        match self {
            Direction::Bullish => 1,
            Direction::Bearish => -1,
        }
    }

    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

impl serde::Serialize for Direction {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.code().serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Direction {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        match i8::deserialize(d)? {
            1 => Ok(Direction::Bullish),
            -1 => Ok(Direction::Bearish),
            _ => Err(serde::de::Error::custom("Direction code must be +1 or -1")),
        }
    }
}

/// Unique identifier for a structure pattern type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternId(pub &'static str);

impl PatternId {
    /// Returns the string identifier
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// One validated six-pivot structure with a confirmed breakout - Copy, no allocations
#[derive(Debug, Clone, Copy)]
pub struct StructureMatch {
    pub pattern_id: PatternId,
    pub direction: Direction,
    /// Series indices of the six pivots, in time order
    pub pivot_indices: [usize; 6],
    /// The fifth pivot's extreme: the level the breakout close crossed
    pub trigger: f64,
    /// Series index of the first close beyond the trigger, at or after the
    /// sixth pivot
    pub breakout_index: usize,
}

// ============================================================
// STRUCTURE DETECTOR TRAITS
// ============================================================

/// Generic structure detector trait - for concrete types
pub trait StructureDetector: Send + Sync {
    fn id(&self) -> PatternId;

    /// Scan the pivot-annotated series for validated pattern occurrences.
    ///
    /// `pivots` must be the same length as `bars`; a mismatch is the typed
    /// equivalent of "the series is missing its pivot column" and fails fast.
    fn detect<T: Ohlc>(&self, bars: &[T], pivots: &[PivotMark]) -> Result<Vec<StructureMatch>>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

/// Object-safe structure detector trait - for custom detectors
pub trait DynStructureDetector: Send + Sync {
    fn id(&self) -> PatternId;
    fn detect(&self, bars: &[&dyn Ohlc], pivots: &[PivotMark]) -> Result<Vec<StructureMatch>>;
    fn validate_config(&self) -> Result<()>;
}

impl<D: StructureDetector> DynStructureDetector for D {
    fn id(&self) -> PatternId {
        StructureDetector::id(self)
    }

    fn detect(&self, bars: &[&dyn Ohlc], pivots: &[PivotMark]) -> Result<Vec<StructureMatch>> {
        StructureDetector::detect(self, bars, pivots)
    }

    fn validate_config(&self) -> Result<()> {
        StructureDetector::validate_config(self)
    }
}

// ============================================================
// BUILTIN DETECTORS - fast path via enum dispatch
// ============================================================

use structure::{BosFailureDetector, ChochDetector};

/// All builtin structure detectors - enum dispatch, no vtable
#[derive(Debug, Clone)]
pub enum BuiltinDetector {
    Choch(ChochDetector),
    BosFailure(BosFailureDetector),
}

impl BuiltinDetector {
    #[inline]
    pub fn detect<T: Ohlc>(&self, bars: &[T], pivots: &[PivotMark]) -> Result<Vec<StructureMatch>> {
        match self {
            Self::Choch(d) => StructureDetector::detect(d, bars, pivots),
            Self::BosFailure(d) => StructureDetector::detect(d, bars, pivots),
        }
    }

    #[inline]
    pub fn id(&self) -> PatternId {
        match self {
            Self::Choch(d) => StructureDetector::id(d),
            Self::BosFailure(d) => StructureDetector::id(d),
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        match self {
            Self::Choch(d) => StructureDetector::validate_config(d),
            Self::BosFailure(d) => StructureDetector::validate_config(d),
        }
    }
}

// ============================================================
// SCAN OUTPUT
// ============================================================

/// Per-bar annotation columns plus the full match list for one scan
#[derive(Debug, Clone)]
pub struct Annotations {
    /// Pivot classification per bar, same length as the input series
    pub pivots: Vec<PivotMark>,
    /// Breakout signal per bar; at most one signal per bar, later matches
    /// overwrite earlier ones targeting the same index
    pub signals: Vec<Option<Direction>>,
    /// Every validated structure occurrence, in evaluation order
    pub matches: Vec<StructureMatch>,
}

impl Annotations {
    /// Number of annotated bars
    pub fn len(&self) -> usize {
        self.pivots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pivots.is_empty()
    }

    /// Pivot column as integer codes: 0 = none, 1 = high, 2 = low
    pub fn pivot_codes(&self) -> Vec<u8> {
        self.pivots.iter().map(|p| p.code()).collect()
    }

    /// Signal column as integer codes: 0 = none, +1 = bullish, -1 = bearish
    pub fn signal_codes(&self) -> Vec<i8> {
        self.signals
            .iter()
            .map(|s| s.map_or(0, Direction::code))
            .collect()
    }
}

// ============================================================
// SCAN ENGINE
// ============================================================

/// Engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub validate_data: bool,
}

/// Two-stage scan engine: pivot extraction followed by structure matching
pub struct ScanEngine {
    extractor: pivots::PivotExtractor,
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn DynStructureDetector>>,
    config: EngineConfig,
}

impl ScanEngine {
    // ===========================================
    // LOW-LEVEL: Primitives
    // ===========================================

    /// Run only the pivot extraction stage.
    #[inline]
    pub fn extract_pivots<T: Ohlc>(&self, bars: &[T]) -> Vec<PivotMark> {
        self.extractor.extract(bars)
    }

    // ===========================================
    // HIGH-LEVEL: Full pipeline
    // ===========================================

    /// Extract pivots, run every configured detector, and fold the match
    /// list into per-bar annotation columns.
    pub fn scan<T: Ohlc>(&self, bars: &[T]) -> Result<Annotations> {
        if self.config.validate_data {
            self.validate_bars(bars)?;
        }

        let pivots = self.extractor.extract(bars);
        let matches = self.detect_all(bars, &pivots)?;
        let signals = structure::signal_column(&matches, bars.len());

        Ok(Annotations {
            pivots,
            signals,
            matches,
        })
    }

    /// Run only the structure-matching stage against a caller-supplied
    /// pivot column (e.g. one computed with a different window).
    pub fn scan_with_pivots<T: Ohlc>(
        &self,
        bars: &[T],
        pivots: &[PivotMark],
    ) -> Result<Vec<StructureMatch>> {
        if self.config.validate_data {
            self.validate_bars(bars)?;
        }
        self.detect_all(bars, pivots)
    }

    // ===========================================
    // Internal helpers
    // ===========================================

    fn detect_all<T: Ohlc>(&self, bars: &[T], pivots: &[PivotMark]) -> Result<Vec<StructureMatch>> {
        let mut matches = Vec::new();

        // Fast path: builtin detectors (enum dispatch, no vtable)
        for detector in &self.builtin {
            matches.extend(detector.detect(bars, pivots)?);
        }

        // Slow path: custom detectors (vtable)
        if !self.custom.is_empty() {
            let bar_refs: Vec<&dyn Ohlc> = bars.iter().map(|b| b as &dyn Ohlc).collect();
            for detector in &self.custom {
                matches.extend(detector.detect(&bar_refs, pivots)?);
            }
        }

        Ok(matches)
    }

    fn validate_bars<T: Ohlc>(&self, bars: &[T]) -> Result<()> {
        for (i, bar) in bars.iter().enumerate() {
            bar.validate().map_err(|e| match e {
                ScanError::InvalidOhlc { reason, .. } => ScanError::InvalidOhlc { index: i, reason },
                other => other,
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for d in &self.builtin {
            d.validate_config()?;
        }
        for d in &self.custom {
            d.validate_config()?;
        }
        Ok(())
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating ScanEngine instances
pub struct EngineBuilder {
    extractor: pivots::PivotExtractor,
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn DynStructureDetector>>,
    config: EngineConfig,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            extractor: pivots::PivotExtractor::default(),
            builtin: Vec::new(),
            custom: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    /// Set the pivot window (default 17)
    pub fn window(mut self, window: Window) -> Self {
        self.extractor = pivots::PivotExtractor::new(window);
        self
    }

    /// Replace the pivot extractor wholesale
    pub fn extractor(mut self, extractor: pivots::PivotExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// The default pipeline: CHoCH detection in both directions
    pub fn with_defaults(self) -> Self {
        self.add(BuiltinDetector::Choch(ChochDetector::with_defaults()))
    }

    /// Add a builtin detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        self.builtin.push(detector);
        self
    }

    /// Add a custom detector (slow path)
    pub fn add_custom<D: DynStructureDetector + 'static>(mut self, detector: D) -> Self {
        self.custom.push(Box::new(detector));
        self
    }

    /// Enable/disable data validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<ScanEngine> {
        let engine = ScanEngine {
            extractor: self.extractor,
            builtin: self.builtin,
            custom: self.custom,
            config: self.config,
        };
        engine.validate()?;
        Ok(engine)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Result of scanning a single instrument
#[derive(Debug)]
pub struct ScanResult {
    pub symbol: String,
    pub annotations: Annotations,
}

/// Error from scanning a single instrument
#[derive(Debug)]
pub struct ScanFailure {
    pub symbol: String,
    pub error: ScanError,
}

/// Parallel scanning of multiple instruments
pub fn scan_parallel<'a, T, I>(
    engine: &ScanEngine,
    instruments: I,
) -> (Vec<ScanResult>, Vec<ScanFailure>)
where
    T: Ohlc + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            engine
                .scan(bars)
                .map(|annotations| ScanResult {
                    symbol: symbol.to_string(),
                    annotations,
                })
                .map_err(|error| ScanFailure {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
