//! Classifier port and frame source traits

use async_trait::async_trait;
use signstream_core::{Frame, RawObservation, Result};

/// Trait for all image classifiers.
///
/// Implementations return the ranked (label, probability) list for one
/// frame, ordered by descending probability. The engine consumes the
/// ranking as-is.
#[async_trait]
pub trait ClassifierPort: Send + Sync {
    /// Classify a single frame
    async fn predict(&self, frame: &Frame) -> Result<RawObservation>;

    /// Get the provider name
    fn name(&self) -> &str;

    /// Release provider resources.
    ///
    /// Called once when the handle wrapping this classifier is discarded.
    fn release(&self) {}
}

/// Source of camera frames.
///
/// "No frame" is an expected condition, not an error.
pub trait FrameSource: Send + Sync {
    /// Read the current frame, if one is available
    fn current_frame(&self) -> Option<Frame>;

    /// Check whether a frame is currently available
    fn has_frame(&self) -> bool {
        self.current_frame().is_some()
    }
}
