//! Mock classifiers, loaders and frame sources for testing
//!
//! Provides configurable mock implementations of the recognizer's traits
//! for testing stabilization, model switching and error handling.

#![allow(dead_code)]

use async_trait::async_trait;
use signstream_core::{Error, Frame, RawObservation, Result};
use signstream_recognizer::{
    ClassifierLoader, ClassifierPort, FrameSource, ModelDescriptor, ModelManager,
    RecognitionConfig, StabilizationEngine,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// A classifier that replays a fixed list of observations
#[derive(Clone)]
pub struct ScriptedClassifier {
    name: String,
    script: Arc<Vec<RawObservation>>,
    cursor: Arc<AtomicUsize>,
    repeat: bool,
    calls: Arc<AtomicU32>,
    released: Arc<AtomicU32>,
}

impl ScriptedClassifier {
    /// Replay `script` once, then answer with empty observations
    pub fn new(name: &str, script: Vec<RawObservation>) -> Self {
        Self {
            name: name.to_string(),
            script: Arc::new(script),
            cursor: Arc::new(AtomicUsize::new(0)),
            repeat: false,
            calls: Arc::new(AtomicU32::new(0)),
            released: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Always answer with the same single prediction
    pub fn constant(name: &str, label: &str, probability: f32) -> Self {
        let mut classifier = Self::new(name, vec![RawObservation::single(label, probability)]);
        classifier.repeat = true;
        classifier
    }

    /// Get the number of times predict was called
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Get the number of times release was called
    pub fn release_count(&self) -> u32 {
        self.released.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ClassifierPort for ScriptedClassifier {
    async fn predict(&self, _frame: &Frame) -> Result<RawObservation> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);

        let observation = if self.repeat && !self.script.is_empty() {
            self.script[index % self.script.len()].clone()
        } else {
            self.script.get(index).cloned().unwrap_or_default()
        };
        Ok(observation)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }
}

/// A classifier that always fails - for testing error paths
#[derive(Clone)]
pub struct FailingClassifier {
    name: String,
    error_message: String,
}

impl FailingClassifier {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            error_message: "Simulated inference failure".to_string(),
        }
    }
}

#[async_trait]
impl ClassifierPort for FailingClassifier {
    async fn predict(&self, _frame: &Frame) -> Result<RawObservation> {
        Err(Error::classifier(&self.error_message))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A classifier that fails on selected calls and answers constantly otherwise
#[derive(Clone)]
pub struct FlakyClassifier {
    label: String,
    probability: f32,
    fail_on: Arc<Vec<usize>>,
    calls: Arc<AtomicUsize>,
}

impl FlakyClassifier {
    /// `fail_on` lists zero-based call indices that return an error
    pub fn new(label: &str, probability: f32, fail_on: Vec<usize>) -> Self {
        Self {
            label: label.to_string(),
            probability,
            fail_on: Arc::new(fail_on),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl ClassifierPort for FlakyClassifier {
    async fn predict(&self, _frame: &Frame) -> Result<RawObservation> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_on.contains(&call) {
            return Err(Error::classifier("inference backend unavailable"));
        }
        Ok(RawObservation::single(self.label.clone(), self.probability))
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// A rendezvous point: the task under test signals `entered`, then parks
/// until the test calls `open`.
#[derive(Clone, Default)]
pub struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until the gated task has reached the gate
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let the gated task continue
    pub fn open(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

/// A classifier that blocks inside predict until its gate opens
#[derive(Clone)]
pub struct GatedClassifier {
    label: String,
    probability: f32,
    gate: Gate,
}

impl GatedClassifier {
    pub fn new(label: &str, probability: f32, gate: Gate) -> Self {
        Self {
            label: label.to_string(),
            probability,
            gate,
        }
    }
}

#[async_trait]
impl ClassifierPort for GatedClassifier {
    async fn predict(&self, _frame: &Frame) -> Result<RawObservation> {
        self.gate.pass().await;
        Ok(RawObservation::single(self.label.clone(), self.probability))
    }

    fn name(&self) -> &str {
        "gated"
    }
}

type Factory = Arc<dyn Fn() -> Result<Box<dyn ClassifierPort>> + Send + Sync>;

/// A loader serving mock classifiers by model key
#[derive(Default)]
pub struct MockLoader {
    factories: HashMap<String, Factory>,
    gates: HashMap<String, Gate>,
    loads: AtomicU32,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a clone of `classifier` whenever `key` is loaded
    pub fn with_classifier<C>(mut self, key: &str, classifier: C) -> Self
    where
        C: ClassifierPort + Clone + 'static,
    {
        let factory: Factory =
            Arc::new(move || Ok(Box::new(classifier.clone()) as Box<dyn ClassifierPort>));
        self.factories.insert(key.to_string(), factory);
        self
    }

    /// Fail every load of `key`
    pub fn with_failure(mut self, key: &str, message: &str) -> Self {
        let message = message.to_string();
        let factory: Factory = Arc::new(move || Err(Error::classifier(message.clone())));
        self.factories.insert(key.to_string(), factory);
        self
    }

    /// Park loads of `key` at `gate`
    pub fn with_gate(mut self, key: &str, gate: Gate) -> Self {
        self.gates.insert(key.to_string(), gate);
        self
    }

    /// Get the number of load attempts
    pub fn load_count(&self) -> u32 {
        self.loads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ClassifierLoader for MockLoader {
    async fn load(&self, descriptor: &ModelDescriptor) -> Result<Box<dyn ClassifierPort>> {
        self.loads.fetch_add(1, Ordering::Relaxed);

        if let Some(gate) = self.gates.get(&descriptor.key) {
            gate.pass().await;
        }

        match self.factories.get(&descriptor.key) {
            Some(factory) => factory(),
            None => Err(Error::classifier(format!(
                "no model files at {}",
                descriptor.locator
            ))),
        }
    }

    fn provider(&self) -> &str {
        "mock"
    }
}

/// A frame source whose availability can be toggled
pub struct MockFrameSource {
    available: AtomicBool,
    sequence: AtomicU64,
}

impl MockFrameSource {
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }
}

impl FrameSource for MockFrameSource {
    fn current_frame(&self) -> Option<Frame> {
        if !self.available.load(Ordering::Relaxed) {
            return None;
        }
        Some(Frame::empty(self.sequence.fetch_add(1, Ordering::Relaxed)))
    }
}

/// Manager with the letters / numbers / greetings catalog registered
pub fn manager_with(loader: MockLoader, config: RecognitionConfig) -> Arc<ModelManager> {
    let engine = StabilizationEngine::new(config).expect("valid config");
    let manager = ModelManager::new(Arc::new(loader), engine);

    for (key, name) in [("letters", "Letters"), ("numbers", "Numbers"), ("greetings", "Greetings")] {
        manager
            .register(ModelDescriptor::new(key, name, format!("./models/{}/", key)))
            .expect("unique key");
    }

    Arc::new(manager)
}

/// Config used throughout the tests: threshold 0.8, three in a row
pub fn test_config() -> RecognitionConfig {
    RecognitionConfig::new(0.8, 3).expect("valid config")
}
