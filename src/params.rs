//! Parameter metadata for the pivot extractor and structure detectors
//!
//! This module provides metadata about component parameters, enabling:
//! - Grid search optimization
//! - Parameter documentation
//! - Automatic configuration UI generation
//!
//! # Example
//!
//! ```rust
//! use pivotscan::params::{ParamMeta, ParamType, Parameterized};
//! use pivotscan::prelude::*;
//!
//! // Get parameter metadata for a detector
//! let params = ChochDetector::param_meta();
//! for param in params {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//! ```

use std::collections::HashMap;

use crate::{Result, ScanError, Window};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Centered window size (odd positive integer)
    Window,
    /// Boolean flag encoded as 0.0 / 1.0
    Flag,
}

/// Metadata for a single component parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
    /// Parameter name (e.g., "window")
    pub name: &'static str,
    /// Parameter type (Window or Flag)
    pub param_type: ParamType,
    /// Default value
    pub default: f64,
    /// Range for optimization: (min, max, step)
    pub range: (f64, f64, f64),
    /// Human-readable description
    pub description: &'static str,
}

impl ParamMeta {
    /// Create a new ParamMeta for a Window parameter
    pub const fn window(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self {
            name,
            param_type: ParamType::Window,
            default,
            range,
            description,
        }
    }

    /// Create a new ParamMeta for a Flag parameter
    pub const fn flag(name: &'static str, default: f64, description: &'static str) -> Self {
        Self {
            name,
            param_type: ParamType::Flag,
            default,
            range: (0.0, 1.0, 1.0),
            description,
        }
    }

    /// Generate all values for grid search
    pub fn generate_grid(&self) -> Vec<f64> {
        let (min, max, step) = self.range;
        let mut values = Vec::new();
        let mut v = min;
        while v <= max + f64::EPSILON {
            values.push(v);
            v += step;
        }
        values
    }

    /// Validate a value for this parameter
    pub fn validate(&self, value: f64) -> Result<()> {
        let (min, max, _) = self.range;
        if value < min || value > max {
            return Err(ScanError::OutOfRange {
                field: self.name,
                value,
                min,
                max,
            });
        }
        match self.param_type {
            ParamType::Window => {
                if value < 1.0 || value.fract() != 0.0 {
                    return Err(ScanError::InvalidValue(
                        "Window must be a positive integer",
                    ));
                }
                if (value as usize) % 2 == 0 {
                    return Err(ScanError::InvalidValue("Window must be odd"));
                }
                Ok(())
            }
            ParamType::Flag => {
                if value != 0.0 && value != 1.0 {
                    return Err(ScanError::InvalidValue("Flag must be 0 or 1"));
                }
                Ok(())
            }
        }
    }
}

// ============================================================
// PARAMETERIZED COMPONENT TRAIT
// ============================================================

/// Trait for components that support parameterization
///
/// Implementing this trait enables:
/// - Discovery of available parameters
/// - Creation of components with custom parameter values
/// - Grid search optimization
pub trait Parameterized: Sized {
    /// Returns metadata for all configurable parameters
    fn param_meta() -> &'static [ParamMeta];

    /// Creates a component with parameters from a HashMap
    ///
    /// Missing parameters use their default values.
    fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

    /// Returns the component's id string
    fn id_str() -> &'static str;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Window from params with default fallback
pub fn get_window(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Window> {
    let value = params.get(key).copied().unwrap_or(default as f64);
    if value < 1.0 || value.fract() != 0.0 {
        return Err(ScanError::InvalidValue("Window must be a positive integer"));
    }
    Window::new(value as usize)
}

/// Helper to get a boolean flag from params with default fallback
pub fn get_flag(params: &HashMap<&str, f64>, key: &str, default: bool) -> Result<bool> {
    let value = params
        .get(key)
        .copied()
        .unwrap_or(if default { 1.0 } else { 0.0 });
    if value == 0.0 {
        Ok(false)
    } else if value == 1.0 {
        Ok(true)
    } else {
        Err(ScanError::InvalidValue("Flag must be 0 or 1"))
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_meta_window() {
        let meta = ParamMeta::window("window", 17.0, (5.0, 41.0, 2.0), "Pivot window");

        assert_eq!(meta.name, "window");
        assert_eq!(meta.param_type, ParamType::Window);
        assert_eq!(meta.default, 17.0);
    }

    #[test]
    fn test_param_meta_flag() {
        let meta = ParamMeta::flag("bullish", 1.0, "Detect bullish structures");

        assert_eq!(meta.name, "bullish");
        assert_eq!(meta.param_type, ParamType::Flag);
        assert_eq!(meta.default, 1.0);
        assert_eq!(meta.range, (0.0, 1.0, 1.0));
    }

    #[test]
    fn test_generate_grid() {
        let meta = ParamMeta::window("window", 7.0, (5.0, 9.0, 2.0), "Test");

        let grid = meta.generate_grid();
        assert_eq!(grid.len(), 3);
        assert!((grid[0] - 5.0).abs() < f64::EPSILON);
        assert!((grid[1] - 7.0).abs() < f64::EPSILON);
        assert!((grid[2] - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_flag_grid_is_binary() {
        let meta = ParamMeta::flag("bearish", 1.0, "Test");
        assert_eq!(meta.generate_grid(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_validate_window() {
        let meta = ParamMeta::window("window", 17.0, (5.0, 41.0, 2.0), "Test");

        assert!(meta.validate(17.0).is_ok());
        assert!(meta.validate(5.0).is_ok());
        assert!(meta.validate(41.0).is_ok());
        assert!(meta.validate(3.0).is_err()); // below range
        assert!(meta.validate(43.0).is_err()); // above range
        assert!(meta.validate(16.0).is_err()); // even
        assert!(meta.validate(17.5).is_err()); // fractional
    }

    #[test]
    fn test_validate_flag() {
        let meta = ParamMeta::flag("bullish", 1.0, "Test");

        assert!(meta.validate(0.0).is_ok());
        assert!(meta.validate(1.0).is_ok());
        assert!(meta.validate(0.5).is_err());
        assert!(meta.validate(2.0).is_err());
    }

    #[test]
    fn test_get_window_helper() {
        let mut params = HashMap::new();
        params.insert("key1", 9.0);

        assert_eq!(get_window(&params, "key1", 17).unwrap().get(), 9);
        assert_eq!(get_window(&params, "key2", 17).unwrap().get(), 17);

        params.insert("key1", 8.0);
        assert!(get_window(&params, "key1", 17).is_err());
    }

    #[test]
    fn test_get_flag_helper() {
        let mut params = HashMap::new();
        params.insert("key1", 0.0);

        assert!(!get_flag(&params, "key1", true).unwrap());
        assert!(get_flag(&params, "key2", true).unwrap());
        assert!(!get_flag(&params, "key3", false).unwrap());

        params.insert("key1", 0.5);
        assert!(get_flag(&params, "key1", true).is_err());
    }
}
