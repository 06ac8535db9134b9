//! Tunable constants for a table session.

use kurbo::{Size, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Configuration shared by the arrangement engine, the view and the sync client.
///
/// Every field has a default, so a front-end may deserialize a partial JSON
/// object and only override what it cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Base address of the relay, without trailing slash.
    pub relay_base: String,
    /// Prefix put in front of the table name to form the endpoint path segment.
    pub endpoint_prefix: String,
    /// Table joined when no name is given.
    pub default_table: String,
    /// Base of the exponential wheel scale factor.
    pub scale_sensitivity: f64,
    /// Number of sensitivity steps applied per wheel notch.
    pub wheel_step: f64,
    /// Offset between an item and its clone.
    pub clone_offset: Vec2,
    /// Natural size used while an item's image is not loaded.
    pub fallback_size: Size,
    /// Relative tolerance when following a pile chain.
    pub pile_tolerance: f64,
    /// Relative tolerance when testing whether a dropped item lands on a pile.
    pub snap_tolerance: f64,
    /// Horizontal distance between pile neighbours, as a fraction of the width.
    pub pile_offset: f64,
    /// Minimum view scale.
    pub min_zoom: f64,
    /// Maximum view scale.
    pub max_zoom: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            relay_base: "ws://localhost:3030".to_string(),
            endpoint_prefix: "table-".to_string(),
            default_table: "default".to_string(),
            scale_sensitivity: 1.05,
            wheel_step: 3.0,
            clone_offset: Vec2::new(20.0, 20.0),
            fallback_size: Size::new(50.0, 50.0),
            pile_tolerance: 0.01,
            snap_tolerance: 0.25,
            pile_offset: 0.25,
            min_zoom: 0.01,
            max_zoom: 100.0,
        }
    }
}

impl TableConfig {
    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the pile geometry cannot make an item its own neighbour.
    ///
    /// Two items on the same spot must never count as neighbours, so both
    /// tolerances have to stay below the neighbour offset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !within(self.pile_offset, 0.0, f64::INFINITY) {
            return Err(ConfigError::Invalid("pile_offset must be positive"));
        }
        if !within(self.pile_tolerance, 0.0, self.pile_offset) {
            return Err(ConfigError::Invalid(
                "pile_tolerance must be positive and below pile_offset",
            ));
        }
        if !within(self.snap_tolerance, 0.0, 2.0 * self.pile_offset) {
            return Err(ConfigError::Invalid(
                "snap_tolerance must be positive and below twice pile_offset",
            ));
        }
        if !within(self.min_zoom, 0.0, f64::INFINITY) || self.max_zoom < self.min_zoom {
            return Err(ConfigError::Invalid("zoom limits must be positive and ordered"));
        }
        if !within(self.scale_sensitivity, 0.0, f64::INFINITY) {
            return Err(ConfigError::Invalid("scale_sensitivity must be positive"));
        }
        Ok(())
    }

    /// Scale factor for one wheel notch; `delta_y > 0` shrinks.
    pub fn wheel_factor(&self, delta_y: f64) -> f64 {
        let steps = if delta_y > 0.0 {
            self.wheel_step
        } else {
            -self.wheel_step
        };
        self.scale_sensitivity.powf(-steps)
    }
}

/// `lower < value < upper`; false for NaN.
fn within(value: f64, lower: f64, upper: f64) -> bool {
    value > lower && value < upper
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = TableConfig::from_json(r#"{"default_table":"poker"}"#).unwrap();
        assert_eq!(config.default_table, "poker");
        assert_eq!(config.fallback_size, Size::new(50.0, 50.0));
        assert!((config.snap_tolerance - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_is_valid() {
        assert!(TableConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_degenerate_pile_geometry() {
        for json in [
            r#"{"pile_offset":0}"#,
            r#"{"pile_offset":-0.25}"#,
            r#"{"pile_tolerance":0.25}"#,
            r#"{"pile_tolerance":0}"#,
            r#"{"snap_tolerance":0.5}"#,
            r#"{"min_zoom":0}"#,
        ] {
            assert!(
                matches!(TableConfig::from_json(json), Err(ConfigError::Invalid(_))),
                "{json} should be rejected"
            );
        }
        assert!(matches!(
            TableConfig::from_json("{"),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn test_wheel_factor_direction() {
        let config = TableConfig::default();
        let shrink = config.wheel_factor(120.0);
        let grow = config.wheel_factor(-4.0);
        assert!(shrink < 1.0);
        assert!(grow > 1.0);
        assert!((shrink * grow - 1.0).abs() < 1e-12);
        assert!((grow - 1.05f64.powi(3)).abs() < 1e-12);
    }
}
