pub mod backend;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use backend::AnalysisBackend;
pub use error::{ApiError, ApiResult};
pub use models::*;
