//! HTTP implementation of [`AnalysisBackend`].

use crate::config::DashboardConfig;
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use codedash_api::models::{FunctionDocument, FunctionId, FunctionStats, ProgressSnapshot, ResultItem};
use codedash_api::{AnalysisBackend, ApiError, ApiResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

#[derive(Serialize)]
struct SearchParams<'a> {
    q: &'a str,
    limit: usize,
    fuzzy: bool,
}

#[derive(Serialize)]
struct FunctionsParams {
    limit: usize,
    include_stats: bool,
}

#[derive(Serialize)]
struct AnalyzeBody<'a> {
    stacktrace: &'a str,
}

/// One request per call, no retries, no caching.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        if base.cannot_be_a_base() {
            return Err(CoreError::Config(format!("API URL '{}' cannot be a base", base)));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, base })
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        Self::new(config.api_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, name: &str, request: reqwest::RequestBuilder) -> ApiResult<T> {
        tracing::debug!("Requesting {}", name);
        let response = request.send().await.map_err(|e| ApiError::Transport {
            endpoint: name.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("{} answered with status {}", name, status);
            return Err(ApiError::Status {
                endpoint: name.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| ApiError::Transport {
            endpoint: name.to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode {
            endpoint: name.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn progress(&self) -> ApiResult<ProgressSnapshot> {
        let url = self.endpoint(&["stats", "progress"]);
        self.send("/stats/progress", self.client.get(url)).await
    }

    async fn functions(&self, limit: usize) -> ApiResult<Vec<FunctionStats>> {
        let url = self.endpoint(&["functions"]);
        let params = FunctionsParams {
            limit,
            include_stats: true,
        };
        self.send("/functions", self.client.get(url).query(&params))
            .await
    }

    async fn search(&self, query: &str, limit: usize, fuzzy: bool) -> ApiResult<Vec<ResultItem>> {
        let url = self.endpoint(&["search"]);
        let params = SearchParams {
            q: query,
            limit,
            fuzzy,
        };
        self.send("/search", self.client.get(url).query(&params))
            .await
    }

    async fn analyze(&self, stacktrace: &str) -> ApiResult<Vec<ResultItem>> {
        let url = self.endpoint(&["analyze"]);
        self.send("/analyze", self.client.post(url).json(&AnalyzeBody { stacktrace }))
            .await
    }

    async fn function_code(&self, function_id: &FunctionId) -> ApiResult<FunctionDocument> {
        if function_id.as_str().is_empty() {
            return Err(ApiError::InvalidArgument("empty function id".to_string()));
        }
        let url = self.endpoint(&["code", function_id.as_str()]);
        self.send("/code", self.client.get(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(Url::parse(base).unwrap(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let root = backend("http://localhost:8000");
        assert_eq!(
            root.endpoint(&["stats", "progress"]).as_str(),
            "http://localhost:8000/stats/progress"
        );

        let nested = backend("http://host/api/v1/");
        assert_eq!(nested.endpoint(&["search"]).as_str(), "http://host/api/v1/search");
    }

    #[test]
    fn test_function_id_is_percent_encoded() {
        let root = backend("http://localhost:8000/");
        assert_eq!(
            root.endpoint(&["code", "a/b c"]).as_str(),
            "http://localhost:8000/code/a%2Fb%20c"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        let url = Url::parse("mailto:dev@example.com").unwrap();
        assert!(HttpBackend::new(url, Duration::from_secs(1)).is_err());
    }
}
