use thiserror::Error;

pub mod config;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] rquest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("No checkpoint found: {0}")]
    NoCheckpointFound(String),

    #[error("Malformed row: {0}")]
    MalformedRow(String),

    #[error("Schema violation: missing or null fields: {}", .0.join(", "))]
    SchemaViolation(Vec<String>),

    #[error("Publish failed on batch {index} of {total}: {reason}")]
    PublishFailed {
        index: usize,
        total: usize,
        reason: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}
