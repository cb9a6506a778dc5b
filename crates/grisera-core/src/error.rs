use thiserror::Error;

/// Top-level error type for the GRISERA backends.
#[derive(Error, Debug)]
pub enum GriseraError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid property value for {key}: {reason}")]
    InvalidProperty { key: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GriseraError>;
