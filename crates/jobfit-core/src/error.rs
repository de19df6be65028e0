use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown job template: {0}")]
    UnknownTemplate(String),

    #[error("Worker task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
