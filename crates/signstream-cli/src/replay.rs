//! Replay inference provider
//!
//! Stands in for a real vision backend: each model locator points at a YAML
//! trace of ranked predictions, and frame `n` is answered with entry
//! `n mod len`. A locator naming a directory resolves to `trace.yaml` inside it.
//! Relative locators resolve against the loader's base directory.

use async_trait::async_trait;
use signstream_core::{Error, Frame, RawObservation, Result};
use signstream_recognizer::{ClassifierLoader, ClassifierPort, FrameSource, ModelDescriptor};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

const TRACE_FILE: &str = "trace.yaml";

/// Classifier answering from a recorded trace
pub struct ReplayClassifier {
    name: String,
    trace: Arc<Vec<RawObservation>>,
}

impl ReplayClassifier {
    pub fn new(name: impl Into<String>, trace: Vec<RawObservation>) -> Self {
        Self {
            name: name.into(),
            trace: Arc::new(trace),
        }
    }

    /// Parse a trace from YAML text
    pub fn from_yaml_str(name: impl Into<String>, yaml: &str) -> Result<Self> {
        let trace: Vec<RawObservation> = serde_yaml::from_str(yaml)?;
        Ok(Self::new(name, trace))
    }

    pub fn len(&self) -> usize {
        self.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }
}

#[async_trait]
impl ClassifierPort for ReplayClassifier {
    async fn predict(&self, frame: &Frame) -> Result<RawObservation> {
        if self.trace.is_empty() {
            return Ok(RawObservation::empty());
        }
        let index = (frame.sequence % self.trace.len() as u64) as usize;
        Ok(self.trace[index].clone())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn release(&self) {
        debug!("Replay classifier '{}' released", self.name);
    }
}

/// Loads [`ReplayClassifier`]s from trace files
pub struct ReplayLoader {
    base_dir: PathBuf,
}

impl ReplayLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolve a locator to the trace file it names
    pub fn resolve(&self, locator: &str) -> PathBuf {
        let path = Path::new(locator);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };

        if path.is_dir() || locator.ends_with('/') {
            path.join(TRACE_FILE)
        } else {
            path
        }
    }
}

#[async_trait]
impl ClassifierLoader for ReplayLoader {
    async fn load(&self, descriptor: &ModelDescriptor) -> Result<Box<dyn ClassifierPort>> {
        let path = self.resolve(&descriptor.locator);
        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
            Error::classifier(format!("cannot read trace {}: {}", path.display(), e))
        })?;

        let classifier = ReplayClassifier::from_yaml_str(descriptor.display_name(), &contents)?;
        info!(
            "Loaded replay trace for '{}' ({} frames) from {}",
            descriptor.key,
            classifier.len(),
            path.display()
        );
        Ok(Box::new(classifier))
    }

    fn provider(&self) -> &str {
        "replay"
    }
}

/// Always-on synthetic camera producing sequenced empty frames
#[derive(Default)]
pub struct TickFrameSource {
    sequence: AtomicU64,
}

impl TickFrameSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSource for TickFrameSource {
    fn current_frame(&self) -> Option<Frame> {
        Some(Frame::empty(self.sequence.fetch_add(1, Ordering::Relaxed)))
    }

    fn has_frame(&self) -> bool {
        true
    }
}
