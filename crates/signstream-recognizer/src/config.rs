//! Configuration for stabilization and model loading

use serde::{Deserialize, Serialize};
use signstream_core::{Error, Result};
use std::time::Duration;

/// When a stable streak produces emissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmissionMode {
    /// Emit on every qualifying observation once the streak is long enough
    #[default]
    Level,
    /// Emit once, on the observation that completes the streak
    Edge,
}

/// Stabilization tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Minimum top probability for an observation to count (inclusive)
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f32,

    /// Consecutive matching observations required before emitting
    #[serde(default = "default_required_consecutive")]
    pub required_consecutive: u32,

    /// Level- or edge-triggered emission
    #[serde(default)]
    pub emission_mode: EmissionMode,
}

fn default_threshold() -> f32 {
    0.80
}

fn default_required_consecutive() -> u32 {
    3
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_threshold(),
            required_consecutive: default_required_consecutive(),
            emission_mode: EmissionMode::default(),
        }
    }
}

impl RecognitionConfig {
    /// Create a config with the given threshold and streak length
    pub fn new(confidence_threshold: f32, required_consecutive: u32) -> Result<Self> {
        let config = Self {
            confidence_threshold,
            required_consecutive,
            emission_mode: EmissionMode::Level,
        };
        config.validate()?;
        Ok(config)
    }

    /// Set emission mode
    pub fn with_emission_mode(mut self, mode: EmissionMode) -> Self {
        self.emission_mode = mode;
        self
    }

    /// Check that all tunables are in range
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.confidence_threshold)?;
        validate_required_consecutive(self.required_consecutive)
    }
}

pub(crate) fn validate_threshold(threshold: f32) -> Result<()> {
    if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(Error::config(format!(
            "confidence threshold {} must be within [0, 1]",
            threshold
        )))
    }
}

pub(crate) fn validate_required_consecutive(n: u32) -> Result<()> {
    if n == 0 {
        Err(Error::config("required consecutive observations must be at least 1"))
    } else {
        Ok(())
    }
}

/// Model manager settings
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Upper bound on a single model load
    pub load_timeout: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_secs(10),
        }
    }
}

impl ManagerConfig {
    /// Create config with a specific load timeout
    pub fn with_load_timeout(timeout: Duration) -> Self {
        Self {
            load_timeout: timeout,
        }
    }
}
