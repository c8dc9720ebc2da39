//! Prediction stabilization
//!
//! Turns a high-frequency stream of per-frame classifier results into a
//! sparse stream of accepted labels. A label is accepted only after it has
//! been the top, threshold-passing result for `required_consecutive`
//! observations in a row.
//!
//! The engine is a one-element lookback state machine: only the current
//! candidate label and its streak length are remembered, never past
//! probabilities.

use crate::config::{validate_required_consecutive, validate_threshold, EmissionMode, RecognitionConfig};
use signstream_core::{Emission, RawObservation, Result};
use tracing::{debug, warn};

/// Mutable stabilization state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StabilizationState {
    /// Label of the most recent emission
    pub last_accepted_label: Option<String>,

    /// Top label of the current streak
    pub last_candidate_label: Option<String>,

    /// Length of the current streak
    pub consecutive_count: u32,

    /// Most recent emission
    pub last_emission: Option<Emission>,

    /// Whether the current streak already emitted (edge mode only)
    pub streak_emitted: bool,
}

/// Result of feeding one observation to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The streak is long and confident enough
    Emitted(Emission),
    /// Counted toward a streak, nothing emitted yet
    Pending { label: String, count: u32 },
    /// Empty or below threshold; streak broken
    Rejected,
    /// Failed boundary validation; treated as non-matching
    Malformed,
}

impl Outcome {
    /// Convert to the emission, if any
    pub fn into_emission(self) -> Option<Emission> {
        match self {
            Self::Emitted(emission) => Some(emission),
            _ => None,
        }
    }
}

/// Consecutive-match stabilization engine
#[derive(Debug, Clone)]
pub struct StabilizationEngine {
    config: RecognitionConfig,
    state: StabilizationState,
    generation: u64,
}

impl StabilizationEngine {
    /// Create a new engine
    pub fn new(config: RecognitionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: StabilizationState::default(),
            generation: 0,
        })
    }

    /// Feed one observation, returning the emission if one occurs
    pub fn observe(&mut self, raw: &RawObservation) -> Option<Emission> {
        self.observe_detailed(raw).into_emission()
    }

    /// Feed one observation and report what happened to it
    pub fn observe_detailed(&mut self, raw: &RawObservation) -> Outcome {
        if let Err(e) = raw.validate() {
            warn!("Dropping frame: {}", e);
            self.break_streak();
            return Outcome::Malformed;
        }

        let top = match raw.top() {
            Some(top) if top.probability >= self.config.confidence_threshold => top,
            _ => {
                self.break_streak();
                return Outcome::Rejected;
            }
        };

        let label = top.normalized_label();
        if self.state.last_candidate_label.as_deref() == Some(label) {
            self.state.consecutive_count = self.state.consecutive_count.saturating_add(1);
        } else {
            debug!(label, "New candidate streak");
            self.state.last_candidate_label = Some(label.to_string());
            self.state.consecutive_count = 1;
            self.state.streak_emitted = false;
        }

        let count = self.state.consecutive_count;
        if count < self.config.required_consecutive {
            return Outcome::Pending {
                label: label.to_string(),
                count,
            };
        }

        if self.config.emission_mode == EmissionMode::Edge && self.state.streak_emitted {
            return Outcome::Pending {
                label: label.to_string(),
                count,
            };
        }

        let emission = Emission::new(label, top.probability);
        self.state.last_accepted_label = Some(emission.label.clone());
        self.state.last_emission = Some(emission.clone());
        self.state.streak_emitted = true;
        Outcome::Emitted(emission)
    }

    /// Clear all state and start a new generation
    pub fn reset(&mut self) {
        self.state = StabilizationState::default();
        self.generation = self.generation.wrapping_add(1);
    }

    fn break_streak(&mut self) {
        self.state.consecutive_count = 0;
        self.state.last_candidate_label = None;
        self.state.streak_emitted = false;
    }

    /// Update the confidence threshold; applies from the next observation
    pub fn set_confidence_threshold(&mut self, threshold: f32) -> Result<()> {
        validate_threshold(threshold)?;
        self.config.confidence_threshold = threshold;
        Ok(())
    }

    /// Update the required streak length; applies from the next observation
    pub fn set_required_consecutive(&mut self, n: u32) -> Result<()> {
        validate_required_consecutive(n)?;
        self.config.required_consecutive = n;
        Ok(())
    }

    /// Switch between level- and edge-triggered emission
    pub fn set_emission_mode(&mut self, mode: EmissionMode) {
        self.config.emission_mode = mode;
    }

    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    pub fn state(&self) -> &StabilizationState {
        &self.state
    }

    pub fn consecutive_count(&self) -> u32 {
        self.state.consecutive_count
    }

    pub fn last_candidate(&self) -> Option<&str> {
        self.state.last_candidate_label.as_deref()
    }

    pub fn last_emission(&self) -> Option<&Emission> {
        self.state.last_emission.as_ref()
    }

    /// Number of resets so far; results computed before a reset carry a stale generation
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for StabilizationEngine {
    fn default() -> Self {
        Self {
            config: RecognitionConfig::default(),
            state: StabilizationState::default(),
            generation: 0,
        }
    }
}
