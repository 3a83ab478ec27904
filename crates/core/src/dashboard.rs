//! The dashboard session: owns the store, the router, the code navigator and
//! the refresh timer, and wires them to one backend.

use crate::code_view::{CodeNavigator, CodePane, Focus};
use crate::config::DashboardConfig;
use crate::error::{CoreError, Result};
use crate::refresh::RefreshScheduler;
use crate::router::{DispatchOutcome, QueryRouter, Sequencer};
use crate::state::{DashboardState, StatePatch, StateStore};
use codedash_api::AnalysisBackend;
use codedash_api::models::{FunctionId, HighlightRange};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load dashboard data. Make sure the API is running.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// Another load was already in flight.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Displayed { anchor: u32, rows: usize },
    /// A later open request won; this document was not displayed.
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub range: HighlightRange,
    pub function_id: Option<FunctionId>,
    pub focus: Focus,
}

/// Owns the `is_loading` flag of one load. Dropping it unfinished, e.g. when
/// the refresh timer cancels a load mid-request, clears the flag.
struct LoadGuard<'a> {
    store: &'a StateStore,
    finished: bool,
}

impl<'a> LoadGuard<'a> {
    /// `None` when another load already holds the flag.
    fn acquire(store: &'a StateStore) -> Option<Self> {
        store.try_update(|state| {
            if state.is_loading {
                None
            } else {
                state.is_loading = true;
                Some(())
            }
        })?;
        Some(Self {
            store,
            finished: false,
        })
    }

    fn finish(mut self, patch: StatePatch) {
        self.finished = true;
        self.store.set_state(patch.loading(false));
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!("Dashboard load cancelled");
            self.store.set_loading(false);
        }
    }
}

pub struct Dashboard {
    config: DashboardConfig,
    store: StateStore,
    backend: Arc<dyn AnalysisBackend>,
    router: QueryRouter,
    navigator: Mutex<CodeNavigator>,
    code_sequence: Sequencer,
    scheduler: Mutex<RefreshScheduler>,
}

impl Dashboard {
    pub fn new(backend: Arc<dyn AnalysisBackend>, config: DashboardConfig) -> Arc<Self> {
        let store = StateStore::default();
        store.set_auto_refresh(config.auto_refresh);
        let router = QueryRouter::new(Arc::clone(&backend), store.clone(), config.search_limit);
        let scheduler = RefreshScheduler::new(store.clone(), config.refresh_interval());
        Arc::new(Self {
            config,
            store,
            backend,
            router,
            navigator: Mutex::new(CodeNavigator::default()),
            code_sequence: Sequencer::default(),
            scheduler: Mutex::new(scheduler),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn state(&self) -> Arc<DashboardState> {
        self.store.get_state()
    }

    fn navigator(&self) -> MutexGuard<'_, CodeNavigator> {
        self.navigator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn scheduler(&self) -> MutexGuard<'_, RefreshScheduler> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches progress and the ranked function list concurrently. Previous
    /// data is kept when either request fails.
    pub async fn load(&self) -> Result<LoadOutcome> {
        let Some(guard) = LoadGuard::acquire(&self.store) else {
            tracing::debug!("Dashboard load already in flight");
            return Ok(LoadOutcome::Skipped);
        };

        let result = tokio::try_join!(
            self.backend.progress(),
            self.backend.functions(self.config.functions_limit)
        );

        match result {
            Ok((progress, functions)) => {
                tracing::info!(
                    "Dashboard loaded: {}/{} chunks enriched, {} functions",
                    progress.enriched_chunks,
                    progress.total_chunks,
                    functions.len()
                );
                guard.finish(
                    StatePatch::default()
                        .progress(progress)
                        .functions(functions)
                        .load_error(None),
                );
                Ok(LoadOutcome::Loaded)
            }
            Err(e) => {
                tracing::warn!("Dashboard load failed: {}", e);
                guard.finish(
                    StatePatch::default().load_error(Some(LOAD_FAILED_MESSAGE.to_string())),
                );
                Err(e.into())
            }
        }
    }

    pub async fn query(&self, raw: &str, fuzzy: bool) -> Result<DispatchOutcome> {
        self.router.dispatch(raw, fuzzy).await
    }

    /// Loads a function body into the code pane. Only the most recent request
    /// is displayed.
    pub async fn open_function(&self, function_id: &FunctionId) -> Result<OpenOutcome> {
        let ticket = self.code_sequence.issue();
        let fetched = self.backend.function_code(function_id).await;
        if !self.code_sequence.is_latest(ticket) {
            tracing::debug!("Discarding superseded code load for {}", function_id);
            return Ok(OpenOutcome::Superseded);
        }

        let mut doc = fetched.inspect_err(|e| {
            tracing::warn!("Failed to load code for {}: {}", function_id, e);
        })?;
        if doc.function_id.is_none() {
            doc.function_id = Some(function_id.clone());
        }

        // Pane and store change under the same lock.
        let mut navigator = self.navigator();
        if !self.code_sequence.is_latest(ticket) {
            return Ok(OpenOutcome::Superseded);
        }
        navigator.display(&doc);
        let anchor = doc.anchor();
        let rows = navigator.pane().map(|p| p.rows().len()).unwrap_or(0);
        self.store.set_current_function(Some(doc), anchor);
        tracing::info!("Displaying function {} at line {} ({} rows)", function_id, anchor, rows);
        Ok(OpenOutcome::Displayed { anchor, rows })
    }

    /// Opens the `index`-th leaf of the function tree.
    pub async fn open_tree_leaf(&self, index: usize) -> Result<OpenOutcome> {
        let function_id = {
            let state = self.store.get_state();
            let item = state
                .view
                .tree
                .leaf(index)
                .ok_or_else(|| CoreError::NotFound(format!("no tree entry #{}", index)))?;
            item.function_id()
                .cloned()
                .ok_or_else(|| CoreError::InvalidArgument(format!("tree entry #{} has no function id", index)))?
        };
        self.open_function(&function_id).await
    }

    /// Highlights and scrolls to the line span of the `index`-th result card
    /// within the currently displayed function.
    pub fn select_result(&self, index: usize) -> Result<Selection> {
        let state = self.store.get_state();
        let item = state
            .view
            .item(index)
            .ok_or_else(|| CoreError::NotFound(format!("no result #{}", index)))?;
        let range = item
            .line_range()
            .ok_or_else(|| CoreError::InvalidArgument(format!("result #{} has no line range", index)))?;
        let focus = self.navigator().focus(range);
        Ok(Selection {
            range,
            function_id: item.function_id().cloned(),
            focus,
        })
    }

    pub fn highlight(&self, range: HighlightRange) -> Focus {
        self.navigator().focus(range)
    }

    pub fn code_pane(&self) -> Option<CodePane> {
        self.navigator().pane().cloned()
    }

    /// Toggles auto-refresh. Enabling starts the timer; disabling stops it.
    /// Must be called from within a tokio runtime.
    pub fn set_auto_refresh(self: &Arc<Self>, enabled: bool) {
        self.store.set_auto_refresh(enabled);
        let mut scheduler = self.scheduler();
        if !enabled {
            scheduler.stop();
            return;
        }
        let weak = Arc::downgrade(self);
        scheduler.start(move || {
            let weak = weak.clone();
            async move {
                let Some(dashboard) = weak.upgrade() else {
                    return;
                };
                if let Err(e) = dashboard.load().await {
                    tracing::debug!("Background refresh failed: {}", e);
                }
            }
        });
    }

    pub fn is_refresh_running(&self) -> bool {
        self.scheduler().is_running()
    }

    /// Starts the timer when auto-refresh was enabled by configuration.
    pub fn resume(self: &Arc<Self>) {
        if self.store.get_state().auto_refresh {
            self.set_auto_refresh(true);
        }
    }

    pub fn shutdown(&self) {
        self.scheduler().stop();
        tracing::info!("Dashboard shut down");
    }
}
