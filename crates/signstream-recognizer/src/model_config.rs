//! Model descriptor and catalog structures

use serde::{Deserialize, Serialize};
use signstream_core::{Error, Result};
use std::collections::HashSet;
use std::path::Path;

/// Identifies one loadable classifier. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Stable registry key
    pub key: String,

    /// Human-readable name
    #[serde(default)]
    pub name: String,

    /// Opaque locator resolved by the inference provider (URI or path)
    pub locator: String,

    /// Labels the model can produce, in model output order
    #[serde(default)]
    pub labels: Vec<String>,
}

impl ModelDescriptor {
    /// Create a new descriptor
    pub fn new(key: impl Into<String>, name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            locator: locator.into(),
            labels: Vec::new(),
        }
    }

    /// Set the model's label set
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Name for display, falling back to the key
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.key
        } else {
            &self.name
        }
    }
}

/// Static catalog of models known at process start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCatalog {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl ModelCatalog {
    /// Load a catalog from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parse a catalog from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let catalog: ModelCatalog = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reject blank keys and duplicates
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for model in &self.models {
            if model.key.trim().is_empty() {
                return Err(Error::config("model key must not be empty"));
            }
            if !seen.insert(model.key.as_str()) {
                return Err(Error::DuplicateKey {
                    key: model.key.clone(),
                });
            }
        }
        Ok(())
    }

    /// Get a model descriptor by key
    pub fn get(&self, key: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.key == key)
    }
}

impl Default for ModelCatalog {
    /// The three sign vocabularies shipped with the application
    fn default() -> Self {
        let letters = (b'A'..=b'Z').map(|c| (c as char).to_string());
        let digits = (0..=9).map(|d| d.to_string());

        Self {
            version: default_version(),
            models: vec![
                ModelDescriptor::new("abecedario", "Abecedario LSB", "./models/abecedario/")
                    .with_labels(letters),
                ModelDescriptor::new("numeros", "Números LSB", "./models/numeros/")
                    .with_labels(digits),
                ModelDescriptor::new("saludos", "Saludos LSB", "./models/saludos/")
                    .with_labels(["Hola", "Gracias", "Por favor", "Adiós"]),
            ],
        }
    }
}
