//! Simulation configuration

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::physics::DEFAULT_SLOPE_STEP_LIMIT;

/// Simulation parameters, loadable from RON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seconds per fixed step
    pub fixed_timestep: f32,
    /// Step budget per frame
    pub max_steps_per_frame: u32,
    /// Downward acceleration in world units per second squared
    pub gravity: f32,
    /// How many tile heights below a slope surface a collider may be lifted from
    pub slope_step_limit: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            max_steps_per_frame: 5,
            gravity: 980.0,
            slope_step_limit: DEFAULT_SLOPE_STEP_LIMIT,
        }
    }
}

impl SimConfig {
    /// Set the fixed step length in seconds
    #[must_use]
    pub fn with_fixed_timestep(mut self, seconds: f32) -> Self {
        self.fixed_timestep = seconds;
        self
    }

    /// Set the per-frame step budget
    #[must_use]
    pub fn with_max_steps_per_frame(mut self, steps: u32) -> Self {
        self.max_steps_per_frame = steps;
        self
    }

    /// Set gravity
    #[must_use]
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the slope step limit
    #[must_use]
    pub fn with_slope_step_limit(mut self, limit: f32) -> Self {
        self.slope_step_limit = limit;
        self
    }

    /// Fixed step as a `Duration`
    #[must_use]
    pub fn timestep(&self) -> Duration {
        Duration::from_secs_f32(self.fixed_timestep.max(0.0))
    }

    /// Check the configuration, clamping recoverable values
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive or non-finite timestep or a zero
    /// step budget
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if !(self.fixed_timestep.is_finite() && self.fixed_timestep > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fixed_timestep must be positive, got {}",
                self.fixed_timestep
            )));
        }
        if self.max_steps_per_frame == 0 {
            return Err(ConfigError::Invalid(
                "max_steps_per_frame must be at least 1".to_string(),
            ));
        }
        if !self.gravity.is_finite() {
            log::warn!("Non-finite gravity {}, using 0", self.gravity);
            self.gravity = 0.0;
        }
        if !(self.slope_step_limit >= 0.0) {
            log::warn!(
                "Negative slope_step_limit {}, clamping to 0",
                self.slope_step_limit
            );
            self.slope_step_limit = 0.0;
        }
        Ok(self)
    }

    /// Parse a configuration from a RON string and validate it
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails
    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimConfig =
            ron::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()
    }

    /// Load a configuration from a RON file and validate it
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }
}

/// Errors that can occur while loading configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// IO error
    Io(String),
    /// Malformed document
    Parse(String),
    /// Out-of-range value
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = SimConfig::from_ron_str("(gravity: 500.0)").unwrap();
        assert_eq!(config.gravity, 500.0);
        assert_eq!(config.max_steps_per_frame, 5);
    }

    #[test]
    fn test_invalid_values() {
        let zero_step = SimConfig::default().with_fixed_timestep(0.0);
        assert!(matches!(zero_step.validate(), Err(ConfigError::Invalid(_))));

        let no_budget = SimConfig::default().with_max_steps_per_frame(0);
        assert!(matches!(no_budget.validate(), Err(ConfigError::Invalid(_))));

        let clamped = SimConfig::default()
            .with_slope_step_limit(-2.0)
            .validate()
            .unwrap();
        assert_eq!(clamped.slope_step_limit, 0.0);
    }

    #[test]
    fn test_load_ron_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.ron");
        fs::write(&path, "(fixed_timestep: 0.01, max_steps_per_frame: 2)").unwrap();

        let config = SimConfig::load_ron(&path).unwrap();
        assert_eq!(config.timestep(), Duration::from_secs_f32(0.01));
        assert!(matches!(
            SimConfig::load_ron(dir.path().join("missing.ron")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_malformed_ron() {
        assert!(matches!(
            SimConfig::from_ron_str("(gravity: )"),
            Err(ConfigError::Parse(_))
        ));
    }
}
