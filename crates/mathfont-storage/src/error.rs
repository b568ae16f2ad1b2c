use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage file {path} does not hold a JSON object")]
    NotAnObject { path: String },

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
