//! Model lifecycle management
//!
//! The [`ModelManager`] owns the registry of model descriptors and the single
//! active classifier. A switch loads the new classifier first, then swaps
//! the handle and resets stabilization inside one critical section, so an
//! observer sees either the old model with its old state or the new model
//! with fresh state.
//!
//! Lock order is always `active` before `engine`.

use crate::classifier::ClassifierPort;
use crate::config::ManagerConfig;
use crate::loader_plugin::ClassifierLoader;
use crate::model_config::{ModelCatalog, ModelDescriptor};
use crate::stabilizer::StabilizationEngine;
use parking_lot::{Mutex, RwLock};
use signstream_core::{Error, Frame, RawObservation, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Stabilization engine shared between the manager and the session
pub type SharedEngine = Arc<Mutex<StabilizationEngine>>;

/// A live, loaded classifier and the descriptor it was loaded from
pub struct ClassifierHandle {
    descriptor: Arc<ModelDescriptor>,
    port: Box<dyn ClassifierPort>,
}

impl ClassifierHandle {
    pub fn new(descriptor: Arc<ModelDescriptor>, port: Box<dyn ClassifierPort>) -> Self {
        Self { descriptor, port }
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    pub fn key(&self) -> &str {
        &self.descriptor.key
    }

    /// Run the classifier on one frame
    pub async fn predict(&self, frame: &Frame) -> Result<RawObservation> {
        self.port.predict(frame).await
    }
}

impl Drop for ClassifierHandle {
    fn drop(&mut self) {
        debug!("Releasing classifier '{}' ({})", self.descriptor.key, self.port.name());
        self.port.release();
    }
}

/// Active handle together with the engine generation it pairs with
#[derive(Clone)]
pub struct Checkout {
    pub handle: Arc<ClassifierHandle>,
    pub generation: u64,
}

/// Registry of known models and owner of the active classifier
pub struct ModelManager {
    registry: RwLock<Vec<Arc<ModelDescriptor>>>,
    loader: Arc<dyn ClassifierLoader>,
    engine: SharedEngine,
    active: Mutex<Option<Arc<ClassifierHandle>>>,
    switch_lock: tokio::sync::Mutex<()>,
    config: ManagerConfig,
}

impl ModelManager {
    /// Create a new manager around an inference provider
    pub fn new(loader: Arc<dyn ClassifierLoader>, engine: StabilizationEngine) -> Self {
        Self::with_config(loader, engine, ManagerConfig::default())
    }

    pub fn with_config(
        loader: Arc<dyn ClassifierLoader>,
        engine: StabilizationEngine,
        config: ManagerConfig,
    ) -> Self {
        Self {
            registry: RwLock::new(Vec::new()),
            loader,
            engine: Arc::new(Mutex::new(engine)),
            active: Mutex::new(None),
            switch_lock: tokio::sync::Mutex::new(()),
            config,
        }
    }

    /// Add a descriptor to the registry
    pub fn register(&self, descriptor: ModelDescriptor) -> Result<()> {
        if descriptor.key.trim().is_empty() {
            return Err(Error::config("model key must not be empty"));
        }

        let mut registry = self.registry.write();
        if registry.iter().any(|d| d.key == descriptor.key) {
            return Err(Error::DuplicateKey {
                key: descriptor.key,
            });
        }

        info!("Registered model '{}' ({})", descriptor.key, descriptor.display_name());
        registry.push(Arc::new(descriptor));
        Ok(())
    }

    /// Register every model in a catalog, stopping at the first conflict
    pub fn register_catalog(&self, catalog: &ModelCatalog) -> Result<()> {
        for descriptor in &catalog.models {
            self.register(descriptor.clone())?;
        }
        Ok(())
    }

    /// Look up a registered descriptor
    pub fn descriptor(&self, key: &str) -> Option<Arc<ModelDescriptor>> {
        self.registry.read().iter().find(|d| d.key == key).cloned()
    }

    /// All registered descriptors in registration order
    pub fn known_models(&self) -> Vec<Arc<ModelDescriptor>> {
        self.registry.read().clone()
    }

    /// Make `key` the active model.
    ///
    /// Activating the already-active key is a no-op and leaves stabilization
    /// state untouched. While a load is pending every other call fails with
    /// [`Error::SwitchInProgress`]. On load failure the previous model stays
    /// active and unchanged.
    pub async fn activate(&self, key: &str) -> Result<()> {
        let descriptor = self
            .descriptor(key)
            .ok_or_else(|| Error::unknown_model(key))?;

        let _switch = self.switch_lock.try_lock().map_err(|_| Error::SwitchInProgress {
            requested: key.to_string(),
        })?;

        if self.current_key().as_deref() == Some(key) {
            debug!("Model '{}' already active", key);
            return Ok(());
        }

        info!(
            "Loading model '{}' ({}) via {}",
            key,
            descriptor.display_name(),
            self.loader.provider()
        );

        let port = match tokio::time::timeout(self.config.load_timeout, self.loader.load(&descriptor)).await {
            Ok(Ok(port)) => port,
            Ok(Err(e)) => {
                warn!("Failed to load model '{}': {}", key, e);
                return Err(Error::load(key, e));
            }
            Err(_) => {
                warn!(
                    "Loading model '{}' timed out after {:?}",
                    key, self.config.load_timeout
                );
                return Err(Error::load(key, Error::Timeout));
            }
        };

        let handle = Arc::new(ClassifierHandle::new(Arc::clone(&descriptor), port));
        let previous = {
            let mut active = self.active.lock();
            let mut engine = self.engine.lock();
            let previous = active.take();
            *active = Some(handle);
            engine.reset();
            previous
        };
        drop(previous);

        metrics::counter!("signstream_model_switches_total").increment(1);
        info!("Model active: {}", descriptor.display_name());
        if !descriptor.labels.is_empty() {
            info!("Labels: {}", descriptor.labels.join(", "));
        }

        Ok(())
    }

    /// Descriptor of the active model
    pub fn current_model(&self) -> Option<Arc<ModelDescriptor>> {
        self.active
            .lock()
            .as_ref()
            .map(|handle| Arc::clone(&handle.descriptor))
    }

    pub fn current_key(&self) -> Option<String> {
        self.active.lock().as_ref().map(|h| h.key().to_string())
    }

    /// Display name of the active model
    pub fn current_model_name(&self) -> Option<String> {
        self.current_model().map(|d| d.display_name().to_string())
    }

    /// Whether a model is active
    pub fn is_ready(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Whether a load is currently pending
    pub fn is_switching(&self) -> bool {
        self.switch_lock.try_lock().is_err()
    }

    /// Borrow the active handle for a single inference call.
    ///
    /// Callers must not hold on to it across calls; a switch may happen in
    /// between.
    pub fn checkout(&self) -> Option<Checkout> {
        let active = self.active.lock();
        let handle = active.as_ref()?;
        let generation = self.engine.lock().generation();
        Some(Checkout {
            handle: Arc::clone(handle),
            generation,
        })
    }

    /// The stabilization engine reset on every switch
    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    /// Release the active classifier and clear stabilization state
    pub fn shutdown(&self) {
        let previous = {
            let mut active = self.active.lock();
            let mut engine = self.engine.lock();
            engine.reset();
            active.take()
        };

        if let Some(handle) = previous {
            info!("Shutting down model '{}'", handle.key());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecognitionConfig;
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl ClassifierPort for Fixed {
        async fn predict(&self, _frame: &Frame) -> Result<RawObservation> {
            Ok(RawObservation::single(self.0, 0.99))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FixedLoader;

    #[async_trait]
    impl ClassifierLoader for FixedLoader {
        async fn load(&self, descriptor: &ModelDescriptor) -> Result<Box<dyn ClassifierPort>> {
            if descriptor.locator == "broken" {
                return Err(Error::classifier("corrupt weights"));
            }
            Ok(Box::new(Fixed("A")))
        }

        fn provider(&self) -> &str {
            "fixed"
        }
    }

    fn manager() -> ModelManager {
        let engine = StabilizationEngine::new(RecognitionConfig::default()).unwrap();
        let manager = ModelManager::new(Arc::new(FixedLoader), engine);
        manager
            .register(ModelDescriptor::new("letters", "Letters", "./letters"))
            .unwrap();
        manager
            .register(ModelDescriptor::new("broken", "Broken", "broken"))
            .unwrap();
        manager
    }

    #[test]
    fn test_register_duplicate() {
        let manager = manager();
        let err = manager
            .register(ModelDescriptor::new("letters", "Again", "./x"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { .. }));
        assert_eq!(manager.known_models().len(), 2);
    }

    #[tokio::test]
    async fn test_activate_and_query() {
        let manager = manager();
        assert!(!manager.is_ready());

        manager.activate("letters").await.unwrap();

        assert!(manager.is_ready());
        assert_eq!(manager.current_key().as_deref(), Some("letters"));
        assert_eq!(manager.current_model_name().as_deref(), Some("Letters"));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous() {
        let manager = manager();
        manager.activate("letters").await.unwrap();
        let generation = manager.engine().lock().generation();

        let err = manager.activate("broken").await.unwrap_err();

        assert!(matches!(err, Error::Load { ref key, .. } if key == "broken"));
        assert_eq!(manager.current_key().as_deref(), Some("letters"));
        assert_eq!(manager.engine().lock().generation(), generation);
    }

    #[tokio::test]
    async fn test_shutdown_releases_handle() {
        let manager = manager();
        manager.activate("letters").await.unwrap();

        manager.shutdown();

        assert!(!manager.is_ready());
        assert!(manager.checkout().is_none());
    }
}
