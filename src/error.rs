use thiserror::Error;

/// Domain errors for the detection-to-decision pipeline.
///
/// Per-item failures (`DecodeError`) and matcher input conditions are absorbed
/// inside a frame cycle; the rest surface to the application layer where they
/// can be chained with anyhow.

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unrecognized card label: {0:?}")]
    UnrecognizedLabel(String),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherInputError {
    #[error("Need at least 3 cards to search for a set, found {found}")]
    TooFew { found: usize },

    #[error("No set among the cards in frame")]
    NoSet,
}

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Detector inference failed")]
    InferenceFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to load detector input from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid detector input: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum ThrottleError {
    #[error("Failed to start frame worker thread")]
    WorkerSpawnFailed(#[source] std::io::Error),

    #[error("Frame throttler is stopped")]
    Stopped,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the platform config directory")]
    NoConfigDir,
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
