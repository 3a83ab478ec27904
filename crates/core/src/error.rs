use codedash_api::ApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the backend could not be reached or answered with a failure
    /// status.
    pub fn is_transport(&self) -> bool {
        matches!(self, CoreError::Api(e) if e.is_transport())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
