//! Error types for Signstream

/// Result type alias using Signstream's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Signstream operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Activation or lookup with a key that was never registered
    #[error("unknown model: {key}")]
    UnknownModel { key: String },

    /// Registration with a key that already exists
    #[error("model key already registered: {key}")]
    DuplicateKey { key: String },

    /// The inference provider failed to load a model
    #[error("failed to load model '{key}': {source}")]
    Load {
        key: String,
        #[source]
        source: Box<Error>,
    },

    /// Another model switch is still loading
    #[error("model switch already in progress, cannot activate '{requested}'")]
    SwitchInProgress { requested: String },

    /// Classifier output that failed boundary validation
    #[error("malformed observation: {0}")]
    MalformedObservation(String),

    /// Classifier execution errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a new unknown model error
    pub fn unknown_model(key: impl Into<String>) -> Self {
        Self::UnknownModel { key: key.into() }
    }

    /// Create a new load error wrapping the provider's cause
    pub fn load(key: impl Into<String>, source: Error) -> Self {
        Self::Load {
            key: key.into(),
            source: Box::new(source),
        }
    }

    /// Create a new malformed observation error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedObservation(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the caller can recover by retrying or choosing another model.
    ///
    /// Nothing in the engine is fatal to the process; only misconfiguration
    /// needs operator attention.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}
