//! Signstream Recognizer
//!
//! Turns noisy per-frame classifier scores into a small number of stable
//! label emissions, and hot-swaps between independently trained classifiers
//! without corrupting that stabilization state.
//!
//! Components, leaf to root:
//! - [`ClassifierPort`]: opaque "frame in, ranked labels out" capability
//! - [`ModelManager`]: model registry, loading, atomic switching
//! - [`StabilizationEngine`]: confidence threshold plus consecutive-match streaks
//! - [`RecognitionSession`]: polling loop and public `try_recognize` entry

pub mod classifier;
pub mod config;
pub mod events;
pub mod lifecycle;
pub mod loader_plugin;
pub mod model_config;
pub mod session;
pub mod stabilizer;
pub mod stats;

pub use classifier::{ClassifierPort, FrameSource};
pub use config::{EmissionMode, ManagerConfig, RecognitionConfig};
pub use events::{EventBus, RecognitionEvent};
pub use lifecycle::{Checkout, ClassifierHandle, ModelManager, SharedEngine};
pub use loader_plugin::ClassifierLoader;
pub use model_config::{ModelCatalog, ModelDescriptor};
pub use session::{RecognitionSession, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL};
pub use stabilizer::{Outcome, StabilizationEngine, StabilizationState};
pub use stats::{SessionStats, StatsSnapshot};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{ClassifierPort, FrameSource};
    pub use crate::config::{EmissionMode, RecognitionConfig};
    pub use crate::lifecycle::ModelManager;
    pub use crate::loader_plugin::ClassifierLoader;
    pub use crate::model_config::{ModelCatalog, ModelDescriptor};
    pub use crate::session::RecognitionSession;
    pub use crate::stabilizer::StabilizationEngine;
    pub use signstream_core::prelude::*;
}
