use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown setting key: {0}")]
    UnknownKey(String),
}
