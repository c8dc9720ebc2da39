//! Core types for Signstream

use crate::error::{Error, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// One image frame handed to a classifier.
///
/// The pixel payload is opaque to the engine; only the classifier
/// provider interprets it.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Monotonic acquisition sequence number
    pub sequence: u64,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Encoded or raw pixel data
    pub data: Bytes,

    /// Acquisition timestamp
    pub captured_at: SystemTime,
}

impl Frame {
    /// Create a new frame
    pub fn new(sequence: u64, width: u32, height: u32, data: impl Into<Bytes>) -> Self {
        Self {
            sequence,
            width,
            height,
            data: data.into(),
            captured_at: SystemTime::now(),
        }
    }

    /// Create a frame without pixel data
    pub fn empty(sequence: u64) -> Self {
        Self::new(sequence, 0, 0, Bytes::new())
    }
}

/// A single ranked (label, probability) pair from a classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Class label
    pub label: String,

    /// Probability (0.0-1.0)
    pub probability: f32,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }

    /// Label with surrounding whitespace removed
    pub fn normalized_label(&self) -> &str {
        self.label.trim()
    }

    /// Check the entry against the classifier port contract
    pub fn validate(&self) -> Result<()> {
        if self.normalized_label().is_empty() {
            return Err(Error::malformed("empty label"));
        }
        if !self.probability.is_finite() || !(0.0..=1.0).contains(&self.probability) {
            return Err(Error::malformed(format!(
                "probability {} for '{}' outside [0, 1]",
                self.probability, self.label
            )));
        }
        Ok(())
    }
}

/// One frame's inference result, ranked by descending probability.
///
/// The order is the classifier's; it is never re-sorted, so the first entry
/// wins probability ties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawObservation {
    predictions: Vec<Prediction>,
}

impl RawObservation {
    /// Create an observation from an already ranked list
    pub fn from_ranked(predictions: Vec<Prediction>) -> Self {
        Self { predictions }
    }

    /// Observation for a frame with no detection
    pub fn empty() -> Self {
        Self::default()
    }

    /// Observation with a single entry
    pub fn single(label: impl Into<String>, probability: f32) -> Self {
        Self::from_ranked(vec![Prediction::new(label, probability)])
    }

    /// Top-ranked entry, if any
    pub fn top(&self) -> Option<&Prediction> {
        self.predictions.first()
    }

    /// All ranked entries
    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    /// Check if there is no detection
    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Validate every entry; any bad entry rejects the whole frame
    pub fn validate(&self) -> Result<()> {
        self.predictions.iter().try_for_each(Prediction::validate)
    }
}

impl From<Vec<Prediction>> for RawObservation {
    fn from(predictions: Vec<Prediction>) -> Self {
        Self::from_ranked(predictions)
    }
}

/// A label accepted by the stabilization engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emission {
    /// Accepted label (normalized)
    pub label: String,

    /// Probability of the observation that triggered the emission
    pub probability: f32,
}

impl Emission {
    /// Create a new emission
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_carries_dimensions_and_timestamp() {
        let before = SystemTime::now();
        let frame = Frame::new(9, 640, 480, vec![0u8; 16]);

        assert_eq!(frame.sequence, 9);
        assert_eq!((frame.width, frame.height), (640, 480));
        assert_eq!(frame.data.len(), 16);
        assert!(frame.captured_at >= before);

        let empty = Frame::empty(10);
        assert_eq!((empty.width, empty.height), (0, 0));
        assert!(empty.data.is_empty());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(Prediction::new("A", 1.2).validate().is_err());
        assert!(Prediction::new("A", -0.1).validate().is_err());
        assert!(Prediction::new("A", f32::NAN).validate().is_err());
        assert!(Prediction::new("A", 1.0).validate().is_ok());
        assert!(Prediction::new("A", 0.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_label() {
        assert!(Prediction::new("   ", 0.9).validate().is_err());
        assert_eq!(Prediction::new(" Hola ", 0.9).normalized_label(), "Hola");
    }

    #[test]
    fn test_one_bad_entry_rejects_frame() {
        let obs = RawObservation::from_ranked(vec![
            Prediction::new("A", 0.9),
            Prediction::new("", 0.1),
        ]);
        assert!(obs.validate().is_err());
    }

    #[test]
    fn test_observation_from_yaml() {
        let yaml = r#"
- label: "B"
  probability: 0.91
- label: "A"
  probability: 0.09
"#;
        let obs: RawObservation = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs.top().map(|p| p.label.as_str()), Some("B"));
    }
}
