use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Enrichment progress of the corpus (`GET /stats/progress`).
///
/// `enriched_chunks + pending_chunks == total_chunks` is trusted as reported.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, JsonSchema)]
pub struct ProgressSnapshot {
    pub total_chunks: u64,
    pub enriched_chunks: u64,
    pub pending_chunks: u64,
    #[serde(default)]
    pub avg_complexity: Option<f64>,
    #[serde(default)]
    pub avg_impact: Option<f64>,
}

impl ProgressSnapshot {
    pub fn is_complete(&self) -> bool {
        self.pending_chunks == 0
    }
}
