//! Extension point for classifier loading.

use crate::classifier::ClassifierPort;
use crate::model_config::ModelDescriptor;
use signstream_core::Result;

/// Pluggable inference provider that turns a descriptor into a live classifier.
///
/// The model manager is the only caller; it is the one place that knows
/// which concrete provider is in use. Loading may be slow and may fail.
#[async_trait::async_trait]
pub trait ClassifierLoader: Send + Sync {
    /// Load the classifier addressed by `descriptor.locator`.
    async fn load(&self, descriptor: &ModelDescriptor) -> Result<Box<dyn ClassifierPort>>;

    /// Provider name used in logs.
    fn provider(&self) -> &str;
}
