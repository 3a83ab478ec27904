use codedash_core::state::{DashboardState, Subscription};
use codedash_core::Dashboard;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct ShellContext {
    pub dashboard: Arc<Dashboard>,
    pub rt_handle: tokio::runtime::Handle,
    fuzzy: Arc<AtomicBool>,
    /// Set while a command runs, so its own state changes are not announced.
    busy: Arc<AtomicBool>,
    notices: Arc<Mutex<Vec<String>>>,
}

impl ShellContext {
    pub fn new(dashboard: Arc<Dashboard>, rt_handle: tokio::runtime::Handle) -> Self {
        Self {
            dashboard,
            rt_handle,
            fuzzy: Arc::new(AtomicBool::new(false)),
            busy: Arc::new(AtomicBool::new(false)),
            notices: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn state(&self) -> Arc<DashboardState> {
        self.dashboard.state()
    }

    pub fn fuzzy(&self) -> bool {
        self.fuzzy.load(Ordering::Relaxed)
    }

    pub fn set_fuzzy(&self, enabled: bool) {
        self.fuzzy.store(enabled, Ordering::Relaxed);
    }

    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }

    /// Queues a message whenever a load finishes outside of a command,
    /// i.e. a background refresh.
    pub fn watch_background_refresh(&self) -> Subscription {
        let busy = Arc::clone(&self.busy);
        let notices = Arc::clone(&self.notices);
        let was_loading = Mutex::new(false);
        self.dashboard.store().subscribe(move |state| {
            let mut was = was_loading.lock().unwrap_or_else(|e| e.into_inner());
            let finished = *was && !state.is_loading;
            *was = state.is_loading;
            if !finished || busy.load(Ordering::SeqCst) {
                return;
            }
            let message = match (&state.load_error, &state.progress) {
                (Some(error), _) => format!("Background refresh failed: {}", error),
                (None, Some(p)) => format!(
                    "Dashboard refreshed: {}/{} chunks enriched, {} functions",
                    p.enriched_chunks,
                    p.total_chunks,
                    state.functions.len()
                ),
                (None, None) => "Dashboard refreshed".to_string(),
            };
            notices
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(message);
        })
    }

    pub fn take_notices(&self) -> Vec<String> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// The refresh timer is spawned onto the runtime, which must be entered
    /// from the synchronous shell loop.
    pub fn set_auto_refresh(&self, enabled: bool) {
        let _guard = self.rt_handle.enter();
        self.dashboard.set_auto_refresh(enabled);
    }
}
