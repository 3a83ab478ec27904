//! Observable application state.
//!
//! [`StateStore`] is the single owner of [`DashboardState`]. Readers get
//! immutable snapshots; writers go through [`StateStore::set_state`] or
//! [`StateStore::update`], and every mutation synchronously notifies the
//! current subscribers with the fully merged state.

use crate::classify::ResultView;
use codedash_api::models::{FunctionDocument, FunctionStats, ProgressSnapshot, ResultItem};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardState {
    pub progress: Option<ProgressSnapshot>,
    pub functions: Vec<FunctionStats>,
    /// Raw items of the last applied query, in backend order.
    pub search_results: Vec<ResultItem>,
    pub view: ResultView,
    pub current_function: Option<FunctionDocument>,
    pub current_start_line: u32,
    pub auto_refresh: bool,
    /// A dashboard load (progress + functions) is in flight.
    pub is_loading: bool,
    /// Number of dispatched queries that have not returned yet.
    pub pending_queries: u32,
    pub load_error: Option<String>,
    pub search_error: Option<String>,
}

impl DashboardState {
    pub fn is_searching(&self) -> bool {
        self.pending_queries > 0
    }
}

/// A shallow partial update. Fields left as `None` keep their current value;
/// nullable fields use a nested `Option` so they can be cleared explicitly.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub progress: Option<Option<ProgressSnapshot>>,
    pub functions: Option<Vec<FunctionStats>>,
    pub search_results: Option<Vec<ResultItem>>,
    pub view: Option<ResultView>,
    pub current_function: Option<Option<FunctionDocument>>,
    pub current_start_line: Option<u32>,
    pub auto_refresh: Option<bool>,
    pub is_loading: Option<bool>,
    pub load_error: Option<Option<String>>,
    pub search_error: Option<Option<String>>,
}

impl StatePatch {
    pub fn progress(mut self, progress: ProgressSnapshot) -> Self {
        self.progress = Some(Some(progress));
        self
    }

    pub fn functions(mut self, functions: Vec<FunctionStats>) -> Self {
        self.functions = Some(functions);
        self
    }

    pub fn search_results(mut self, items: Vec<ResultItem>) -> Self {
        self.search_results = Some(items);
        self
    }

    pub fn view(mut self, view: ResultView) -> Self {
        self.view = Some(view);
        self
    }

    pub fn current_function(mut self, function: Option<FunctionDocument>, start_line: u32) -> Self {
        self.current_function = Some(function);
        self.current_start_line = Some(start_line);
        self
    }

    pub fn auto_refresh(mut self, enabled: bool) -> Self {
        self.auto_refresh = Some(enabled);
        self
    }

    pub fn loading(mut self, is_loading: bool) -> Self {
        self.is_loading = Some(is_loading);
        self
    }

    pub fn load_error(mut self, error: Option<String>) -> Self {
        self.load_error = Some(error);
        self
    }

    pub fn search_error(mut self, error: Option<String>) -> Self {
        self.search_error = Some(error);
        self
    }

    pub fn apply(self, state: &mut DashboardState) {
        if let Some(value) = self.progress {
            state.progress = value;
        }
        if let Some(value) = self.functions {
            state.functions = value;
        }
        if let Some(value) = self.search_results {
            state.search_results = value;
        }
        if let Some(value) = self.view {
            state.view = value;
        }
        if let Some(value) = self.current_function {
            state.current_function = value;
        }
        if let Some(value) = self.current_start_line {
            state.current_start_line = value;
        }
        if let Some(value) = self.auto_refresh {
            state.auto_refresh = value;
        }
        if let Some(value) = self.is_loading {
            state.is_loading = value;
        }
        if let Some(value) = self.load_error {
            state.load_error = value;
        }
        if let Some(value) = self.search_error {
            state.search_error = value;
        }
    }
}

type Callback = Arc<dyn Fn(&DashboardState) + Send + Sync>;

struct StoreInner {
    state: Mutex<Arc<DashboardState>>,
    /// Held by a writer from its mutation through its notification pass, so
    /// subscribers see snapshots in the order they were produced.
    delivery: Mutex<()>,
    subscribers: Mutex<Vec<(u64, Callback)>>,
    next_id: AtomicU64,
}

impl StoreInner {
    fn subscribers(&self) -> MutexGuard<'_, Vec<(u64, Callback)>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: u64) {
        self.subscribers().retain(|(sid, _)| *sid != id);
    }
}

#[derive(Clone)]
pub struct StateStore {
    inner: Arc<StoreInner>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(DashboardState::default())
    }
}

impl StateStore {
    pub fn new(initial: DashboardState) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(Arc::new(initial)),
                delivery: Mutex::new(()),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Immutable snapshot of the current state. Later mutations do not
    /// affect a snapshot that was already handed out.
    pub fn get_state(&self) -> Arc<DashboardState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_state(&self, patch: StatePatch) {
        self.update(|state| patch.apply(state));
    }

    /// Atomic read-modify-write. `f` runs under the state lock, so it must not
    /// call back into the store; subscribers are notified after it returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut DashboardState) -> R) -> R {
        self.mutate(|state| (f(state), true))
    }

    /// Like [`StateStore::update`], but `f` declines the write by returning
    /// `None`, in which case it must leave the state as it found it and no
    /// subscriber is notified.
    pub fn try_update<R>(&self, f: impl FnOnce(&mut DashboardState) -> Option<R>) -> Option<R> {
        self.mutate(|state| {
            let result = f(state);
            let changed = result.is_some();
            (result, changed)
        })
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut DashboardState) -> (R, bool)) -> R {
        // Writers serialize on `delivery` before touching the state and keep
        // it through the notification pass. Readers only take `state`, so
        // callbacks may call `get_state` but must not write to the store.
        let _delivery = self
            .inner
            .delivery
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (result, snapshot) = {
            let mut guard = self
                .inner
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let (result, changed) = f(Arc::make_mut(&mut guard));
            if !changed {
                return result;
            }
            (result, guard.clone())
        };
        self.notify(&snapshot);
        result
    }

    /// Callbacks run on the writing thread, one mutation at a time. They may
    /// read the store but must not write to it.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&DashboardState) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers().push((id, Arc::new(callback)));
        tracing::trace!("State subscriber {} registered", id);
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }

    fn notify(&self, snapshot: &DashboardState) {
        // The pass works on a copy of the list so callbacks may subscribe or
        // unsubscribe without affecting who is called in this pass.
        let callbacks: Vec<Callback> = self
            .inner
            .subscribers()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(snapshot);
        }
    }

    // ---- Convenience setters ----

    pub fn set_loading(&self, is_loading: bool) {
        self.set_state(StatePatch::default().loading(is_loading));
    }

    pub fn set_progress(&self, progress: ProgressSnapshot) {
        self.set_state(StatePatch::default().progress(progress));
    }

    pub fn set_functions(&self, functions: Vec<FunctionStats>) {
        self.set_state(StatePatch::default().functions(functions));
    }

    pub fn set_search_results(&self, items: Vec<ResultItem>) {
        self.set_state(StatePatch::default().search_results(items));
    }

    pub fn set_auto_refresh(&self, enabled: bool) {
        self.set_state(StatePatch::default().auto_refresh(enabled));
    }

    pub fn set_current_function(&self, function: Option<FunctionDocument>, start_line: u32) {
        self.set_state(StatePatch::default().current_function(function, start_line));
    }
}

/// Handle returned by [`StateStore::subscribe`]. Dropping it (or calling
/// [`Subscription::unsubscribe`]) removes the callback.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    id: u64,
    inner: Weak<StoreInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.remove(self.id);
            tracing::trace!("State subscriber {} removed", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_snapshot_is_detached_from_later_updates() {
        let store = StateStore::default();
        let before = store.get_state();
        store.set_auto_refresh(true);

        assert!(!before.auto_refresh);
        assert!(store.get_state().auto_refresh);
    }

    #[test]
    fn test_patch_merges_shallowly() {
        let store = StateStore::default();
        store.set_state(
            StatePatch::default()
                .auto_refresh(true)
                .load_error(Some("down".to_string())),
        );
        store.set_state(StatePatch::default().loading(true));

        let state = store.get_state();
        assert!(state.auto_refresh);
        assert!(state.is_loading);
        assert_eq!(state.load_error.as_deref(), Some("down"));

        store.set_state(StatePatch::default().load_error(None));
        assert!(store.get_state().load_error.is_none());
    }

    #[test]
    fn test_every_mutation_notifies_once_with_merged_state() {
        let store = StateStore::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(move |state| {
            sink.lock()
                .unwrap()
                .push((state.auto_refresh, state.is_loading));
        });

        store.set_state(StatePatch::default().auto_refresh(true).loading(true));
        store.set_loading(false);

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![(true, true), (true, false)]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let store = StateStore::default();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let sub = store.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        store.set_loading(true);
        sub.unsubscribe();
        store.set_loading(false);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_during_notification_keeps_current_pass() {
        let store = StateStore::default();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let second_calls = Arc::new(AtomicUsize::new(0));

        let slot_in_first = Arc::clone(&slot);
        let _first = store.subscribe(move |_| {
            // Drops the second subscriber mid-pass.
            slot_in_first.lock().unwrap().take();
        });

        let calls = Arc::clone(&second_calls);
        let second = store.subscribe(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        *slot.lock().unwrap() = Some(second);

        store.set_loading(true);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);

        store.set_loading(false);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn test_update_returns_closure_result() {
        let store = StateStore::default();
        let began = store.update(|s| {
            if s.is_loading {
                false
            } else {
                s.is_loading = true;
                true
            }
        });
        let again = store.update(|s| !s.is_loading);

        assert!(began);
        assert!(!again);
    }

    #[test]
    fn test_declined_update_does_not_notify() {
        let store = StateStore::default();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let _sub = store.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let declined = store.try_update(|s| if s.is_loading { Some(()) } else { None });
        assert!(declined.is_none());
        assert_eq!(count.load(Ordering::SeqCst), 0);

        let committed = store.try_update(|s| {
            s.is_loading = true;
            Some(7)
        });
        assert_eq!(committed, Some(7));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_writers_notify_in_mutation_order() {
        let store = StateStore::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(move |state| {
            // Widens the window between mutation and delivery.
            std::thread::yield_now();
            sink.lock().unwrap().push(state.pending_queries);
        });

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        store.update(|s| s.pending_queries += 1);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1000);
        // Each write bumps the counter by one, so in-order delivery is 1..=1000.
        assert!(seen.windows(2).all(|w| w[1] == w[0] + 1));
        assert_eq!(store.get_state().pending_queries, 1000);
    }

    #[test]
    fn test_callback_may_read_store() {
        let store = StateStore::default();
        let reader = store.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(move |state| {
            sink.lock()
                .unwrap()
                .push(reader.get_state().is_loading == state.is_loading);
        });

        store.set_loading(true);
        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }
}
