use crate::error::ApiResult;
use crate::models::{FunctionDocument, FunctionId, FunctionStats, ProgressSnapshot, ResultItem};
use async_trait::async_trait;

/// Typed boundary to the analysis backend.
///
/// Implementations are pure transport: they perform exactly one request per
/// call, map non-2xx responses to [`crate::ApiError::Status`] and never retry.
/// Decision logic (which endpoint to call, what to do with the result) lives
/// with the callers.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// `GET /stats/progress`
    async fn progress(&self) -> ApiResult<ProgressSnapshot>;

    /// `GET /functions?limit=..&include_stats=true`
    async fn functions(&self, limit: usize) -> ApiResult<Vec<FunctionStats>>;

    /// `GET /search?q=..&limit=..&fuzzy=..`
    async fn search(&self, query: &str, limit: usize, fuzzy: bool) -> ApiResult<Vec<ResultItem>>;

    /// `POST /analyze` with `{"stacktrace": ..}`
    async fn analyze(&self, stacktrace: &str) -> ApiResult<Vec<ResultItem>>;

    /// `GET /code/{function_id}`
    async fn function_code(&self, function_id: &FunctionId) -> ApiResult<FunctionDocument>;
}
