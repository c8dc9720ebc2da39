//! CLI configuration

use serde::{Deserialize, Serialize};
use signstream_recognizer::{EmissionMode, ModelCatalog, RecognitionConfig};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Signstream runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignstreamConfig {
    /// Stabilization tunables
    #[serde(default)]
    pub recognition: RecognitionConfig,

    /// Models offered for selection
    #[serde(default)]
    pub catalog: ModelCatalog,

    /// Model activated at startup
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Frame polling cadence
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on a single model load
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    /// Stop after this many polled frames (0 = until Ctrl+C)
    #[serde(default)]
    pub frames: u64,

    /// Scheduled model switches
    #[serde(default)]
    pub switches: Vec<SwitchAt>,
}

impl SignstreamConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &crate::Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(model) = &cli.model {
            config.default_model = model.clone();
        }

        if let Some(threshold) = cli.threshold {
            config.recognition.confidence_threshold = threshold;
        }

        if let Some(consecutive) = cli.consecutive {
            config.recognition.required_consecutive = consecutive;
        }

        if cli.edge {
            config.recognition.emission_mode = EmissionMode::Edge;
        }

        if let Some(interval) = cli.interval_ms {
            config.poll_interval_ms = interval;
        }

        if let Some(frames) = cli.frames {
            config.frames = frames;
        }

        if !cli.switches.is_empty() {
            config.switches = cli.switches.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that the recognizer would reject at runtime
    pub fn validate(&self) -> anyhow::Result<()> {
        self.recognition.validate()?;
        self.catalog.validate()?;

        if self.catalog.get(&self.default_model).is_none() {
            anyhow::bail!("default model '{}' is not in the catalog", self.default_model);
        }
        if self.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than zero");
        }
        if self.load_timeout_ms == 0 {
            anyhow::bail!("load_timeout_ms must be greater than zero");
        }
        if let Some(switch) = self.switches.iter().find(|s| self.catalog.get(&s.key).is_none()) {
            anyhow::bail!("scheduled switch to unknown model '{}'", switch.key);
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Frame budget for the polling loop, `None` when unbounded
    pub fn frame_limit(&self) -> Option<u64> {
        (self.frames > 0).then_some(self.frames)
    }
}

impl Default for SignstreamConfig {
    fn default() -> Self {
        Self {
            recognition: RecognitionConfig::default(),
            catalog: ModelCatalog::default(),
            default_model: default_model(),
            poll_interval_ms: default_poll_interval_ms(),
            load_timeout_ms: default_load_timeout_ms(),
            frames: 0,
            switches: Vec::new(),
        }
    }
}

/// Switch to `key` once `frame` frames have been polled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchAt {
    pub frame: u64,
    pub key: String,
}

impl FromStr for SwitchAt {
    type Err = String;

    /// Parses `FRAME:KEY`, e.g. `12:numeros`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (frame, key) = s
            .split_once(':')
            .ok_or_else(|| format!("expected FRAME:KEY, got '{}'", s))?;
        let frame = frame
            .trim()
            .parse()
            .map_err(|e| format!("invalid frame '{}': {}", frame, e))?;
        let key = key.trim();
        if key.is_empty() {
            return Err("model key must not be empty".to_string());
        }
        Ok(Self {
            frame,
            key: key.to_string(),
        })
    }
}

fn default_model() -> String {
    "abecedario".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_load_timeout_ms() -> u64 {
    10_000
}
