//! Signstream Core
//!
//! Core types and error handling shared across Signstream components.
//!
//! This crate provides:
//! - Frame and classifier output types (`Frame`, `Prediction`, `RawObservation`)
//! - The `Emission` produced once a prediction has stabilized
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Emission, Frame, Prediction, RawObservation};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{Emission, Frame, Prediction, RawObservation};
}
