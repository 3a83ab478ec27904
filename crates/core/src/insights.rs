//! Derived figures for the progress and analytics panels.

use crate::config::InsightConfig;
use codedash_api::models::{FunctionStats, ProgressSnapshot};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressStatus {
    Complete,
    InProgress,
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressStatus::Complete => f.write_str("Complete"),
            ProgressStatus::InProgress => f.write_str("In Progress"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub total_chunks: u64,
    pub enriched_chunks: u64,
    pub pending_chunks: u64,
    /// Rounded to one decimal.
    pub percentage: f64,
    pub eta_minutes: u64,
    pub status: ProgressStatus,
}

pub fn summarize_progress(progress: &ProgressSnapshot, chunks_per_minute: f64) -> ProgressSummary {
    let percentage = if progress.total_chunks == 0 {
        0.0
    } else {
        let raw = progress.enriched_chunks as f64 / progress.total_chunks as f64 * 100.0;
        (raw * 10.0).round() / 10.0
    };
    let eta_minutes = if progress.pending_chunks == 0 || chunks_per_minute <= 0.0 {
        0
    } else {
        (progress.pending_chunks as f64 / chunks_per_minute).ceil() as u64
    };
    ProgressSummary {
        total_chunks: progress.total_chunks,
        enriched_chunks: progress.enriched_chunks,
        pending_chunks: progress.pending_chunks,
        percentage,
        eta_minutes,
        status: if progress.is_complete() {
            ProgressStatus::Complete
        } else {
            ProgressStatus::InProgress
        },
    }
}

/// Functions with a known complexity, most complex first.
pub fn top_complex_functions(functions: &[FunctionStats], limit: usize) -> Vec<&FunctionStats> {
    let mut ranked: Vec<&FunctionStats> = functions.iter().filter(|f| f.complexity() > 0.0).collect();
    ranked.sort_by(|a, b| b.complexity().total_cmp(&a.complexity()));
    ranked.truncate(limit);
    ranked
}

#[derive(Debug, Clone, PartialEq)]
pub struct DebtReport<'a> {
    /// Number of candidates before truncation.
    pub total: usize,
    pub shown: Vec<&'a FunctionStats>,
}

/// High-complexity, low-impact functions: refactoring candidates.
pub fn debt_candidates<'a>(functions: &'a [FunctionStats], config: &InsightConfig) -> DebtReport<'a> {
    let candidates: Vec<&FunctionStats> = functions
        .iter()
        .filter(|f| f.complexity() > 0.0 && f.impact() > 0.0)
        .filter(|f| f.complexity() > config.high_complexity && f.impact() < config.low_impact)
        .collect();
    DebtReport {
        total: candidates.len(),
        shown: candidates.into_iter().take(config.max_debt_shown).collect(),
    }
}
