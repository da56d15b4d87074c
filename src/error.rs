//! Error types for IVR Assist.

/// Top-level error type for the dialogue controller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
}

/// Configuration-related errors.
///
/// All of these are fatal at startup — no session is accepted with a
/// malformed content file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read content file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse content file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: String, id: String },
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid event format: {0}")]
    InvalidEvent(String),
}

/// Classifier errors.
///
/// The router treats any of these as "no confident match" — a failing
/// classifier degrades to the fallback path, it never picks a label.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Classifier request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Invalid classifier response: {reason}")]
    InvalidResponse { reason: String },
}

/// Result type alias for the controller.
pub type Result<T> = std::result::Result<T, Error>;
