//! Routing of free-form query text to the search or stack-trace endpoint.

use crate::classify::ResultView;
use crate::error::Result;
use crate::state::StateStore;
use codedash_api::AnalysisBackend;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Scope separator that marks input as a stack-trace fragment.
pub const SCOPE_SEPARATOR: &str = "::";

pub const SEARCH_FAILED_MESSAGE: &str = "Search failed. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    PlainSearch,
    StacktraceAnalysis,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::PlainSearch => "search",
            QueryKind::StacktraceAnalysis => "stacktrace",
        }
    }
}

/// `None` for input that is empty after trimming.
pub fn classify_query(raw: &str) -> Option<QueryKind> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.contains(SCOPE_SEPARATOR) {
        Some(QueryKind::StacktraceAnalysis)
    } else {
        Some(QueryKind::PlainSearch)
    }
}

/// Monotonic request counter. Only the holder of the most recently issued
/// ticket may publish its outcome.
#[derive(Debug, Default)]
pub struct Sequencer {
    latest: AtomicU64,
}

impl Sequencer {
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Blank input; nothing was sent.
    Ignored,
    Applied {
        kind: QueryKind,
        items: usize,
        displayed: usize,
    },
    /// A newer query was issued before this one returned; its result was dropped.
    Superseded { kind: QueryKind },
}

/// Keeps `pending_queries` raised for as long as a request is outstanding.
struct InFlight<'a> {
    store: &'a StateStore,
}

impl<'a> InFlight<'a> {
    fn enter(store: &'a StateStore) -> Self {
        store.update(|s| s.pending_queries += 1);
        Self { store }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.store
            .update(|s| s.pending_queries = s.pending_queries.saturating_sub(1));
    }
}

pub struct QueryRouter {
    backend: Arc<dyn AnalysisBackend>,
    store: StateStore,
    search_limit: usize,
    sequence: Sequencer,
}

impl QueryRouter {
    pub fn new(backend: Arc<dyn AnalysisBackend>, store: StateStore, search_limit: usize) -> Self {
        Self {
            backend,
            store,
            search_limit,
            sequence: Sequencer::default(),
        }
    }

    /// Sends `raw` to exactly one endpoint and publishes the classified
    /// result. Results and errors of superseded requests are discarded.
    pub async fn dispatch(&self, raw: &str, fuzzy: bool) -> Result<DispatchOutcome> {
        let Some(kind) = classify_query(raw) else {
            tracing::debug!("Ignoring blank query");
            return Ok(DispatchOutcome::Ignored);
        };
        let text = raw.trim();
        let ticket = self.sequence.issue();
        tracing::info!("Dispatching {} query #{} ({} chars)", kind.as_str(), ticket, text.len());

        let _in_flight = InFlight::enter(&self.store);
        let response = match kind {
            QueryKind::PlainSearch => self.backend.search(text, self.search_limit, fuzzy).await,
            QueryKind::StacktraceAnalysis => self.backend.analyze(text).await,
        };

        match response {
            Ok(items) => {
                let view = ResultView::build(kind, &items);
                let counts = (items.len(), view.display_items.len());
                let applied = self.store.try_update(|state| {
                    if !self.sequence.is_latest(ticket) {
                        return None;
                    }
                    state.search_results = items;
                    state.view = view;
                    state.search_error = None;
                    Some(())
                });
                if applied.is_none() {
                    tracing::debug!("Discarding result of superseded query #{}", ticket);
                    return Ok(DispatchOutcome::Superseded { kind });
                }
                tracing::info!(
                    "Query #{} returned {} items ({} displayed)",
                    ticket,
                    counts.0,
                    counts.1
                );
                Ok(DispatchOutcome::Applied {
                    kind,
                    items: counts.0,
                    displayed: counts.1,
                })
            }
            Err(e) => {
                let published = self.store.try_update(|state| {
                    if !self.sequence.is_latest(ticket) {
                        return None;
                    }
                    state.search_error = Some(SEARCH_FAILED_MESSAGE.to_string());
                    Some(())
                });
                if published.is_none() {
                    tracing::debug!("Discarding failure of superseded query #{}: {}", ticket, e);
                    return Ok(DispatchOutcome::Superseded { kind });
                }
                tracing::warn!("Query #{} failed: {}", ticket, e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_query() {
        assert_eq!(classify_query(""), None);
        assert_eq!(classify_query("   \t\n"), None);
        assert_eq!(classify_query("parseToken"), Some(QueryKind::PlainSearch));
        assert_eq!(classify_query("a:b"), Some(QueryKind::PlainSearch));
        assert_eq!(
            classify_query("  App::Auth::login  "),
            Some(QueryKind::StacktraceAnalysis)
        );
        assert_eq!(
            classify_query("#0 main\n#1 Foo::bar()"),
            Some(QueryKind::StacktraceAnalysis)
        );
    }

    #[test]
    fn test_sequencer_latest_ticket() {
        let seq = Sequencer::default();
        let first = seq.issue();
        assert!(seq.is_latest(first));

        let second = seq.issue();
        assert!(!seq.is_latest(first));
        assert!(seq.is_latest(second));
    }
}
