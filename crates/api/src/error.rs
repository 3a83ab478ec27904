#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Transport failure on {endpoint}: {message}")]
    Transport { endpoint: String, message: String },
    #[error("Backend returned status {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },
    #[error("Malformed payload from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ApiError {
    /// Network errors and non-2xx responses. Both are surfaced to the caller
    /// and never retried implicitly.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. } | ApiError::Status { .. })
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ApiError::Transport { endpoint, .. }
            | ApiError::Status { endpoint, .. }
            | ApiError::Decode { endpoint, .. } => Some(endpoint),
            ApiError::InvalidArgument(_) => None,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
