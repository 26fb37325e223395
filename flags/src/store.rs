use crate::metrics_defs::{REFRESH_COALESCED, REFRESH_UPDATED};
use crate::parser;
use crate::remote::FlagSource;
use crate::types::{Flag, FlagDomain, FlagSet, SyncState};
use crate::counter;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime};
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

struct StoreInner {
    source: Arc<dyn FlagSource>,
    state: watch::Sender<SyncState>,
    // Only notified when the flag set itself changes.
    flags: watch::Sender<Arc<FlagSet>>,
    // Single permit: at most one refresh talks to the source at a time.
    refresh_lock: Arc<Semaphore>,
    // Number of refreshes that ran to completion. Lets a waiting caller tell
    // that the refresh it queued behind already did its work.
    completed: AtomicU64,
    poller: Mutex<Option<JoinHandle<()>>>,
    disposed: AtomicBool,
}

impl StoreInner {
    /// Fetches, parses and commits one result. State transitions are published
    /// as whole snapshots, so readers never see a partial update.
    async fn refresh_once(&self) {
        self.state.send_modify(|state| state.is_fetching = true);
        tracing::debug!("refreshing feature flags");

        match self.source.fetch_raw().await {
            Ok(raw) => {
                let flags = raw.as_ref().map(parser::parse).unwrap_or_default();
                self.commit(flags);
            }
            Err(err) => {
                tracing::error!(error = %err, "feature flag source failed");
                self.fail(err.to_string());
            }
        }
    }

    fn commit(&self, flags: FlagSet) {
        let mut updated = None;
        self.state.send_modify(|state| {
            state.is_fetching = false;
            if *state.flags != flags {
                let flags = Arc::new(flags);
                state.flags = flags.clone();
                state.last_fetch = Some(SystemTime::now());
                state.last_error = None;
                updated = Some(flags);
            }
        });

        if let Some(flags) = updated {
            tracing::info!(
                domains = ?flags.domains().collect::<Vec<_>>(),
                "feature flags updated"
            );
            counter!(REFRESH_UPDATED).increment(1);
            self.flags.send_replace(flags);
        }
    }

    fn fail(&self, message: String) {
        self.state.send_modify(|state| {
            state.is_fetching = false;
            state.last_error = Some(message);
        });
    }
}

struct CompletedGuard<'a>(&'a AtomicU64);

impl Drop for CompletedGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::Release);
    }
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        if let Some(handle) = self.poller.get_mut().take() {
            handle.abort();
        }
    }
}

/// Owns the synchronized flag state.
///
/// Handles are cheap to clone and share one state. Consumers read the latest
/// committed snapshot with [`FlagStore::state`] or watch it with
/// [`FlagStore::subscribe`]. Polling must be stopped by whoever started it.
#[derive(Clone)]
pub struct FlagStore {
    inner: Arc<StoreInner>,
}

impl FlagStore {
    pub fn new(source: Arc<dyn FlagSource>) -> Self {
        let (state, _) = watch::channel(SyncState::default());
        let (flags, _) = watch::channel(Arc::new(FlagSet::new()));

        FlagStore {
            inner: Arc::new(StoreInner {
                source,
                state,
                flags,
                refresh_lock: Arc::new(Semaphore::new(1)),
                completed: AtomicU64::new(0),
                poller: Mutex::new(None),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    pub fn state(&self) -> SyncState {
        self.inner.state.borrow().clone()
    }

    pub fn flags(&self) -> Arc<FlagSet> {
        self.inner.state.borrow().flags.clone()
    }

    pub fn flag(&self, domain: FlagDomain) -> Option<Flag> {
        self.inner.state.borrow().flags.get(domain).cloned()
    }

    pub fn is_enabled(&self, domain: FlagDomain) -> bool {
        self.inner.state.borrow().flags.is_enabled(domain)
    }

    /// Notified on every committed transition, including `is_fetching` toggles.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    /// Notified only when the flag set changes.
    pub fn subscribe_flags(&self) -> watch::Receiver<Arc<FlagSet>> {
        self.inner.flags.subscribe()
    }

    /// Fetches the latest flags. A call made while another refresh is in
    /// flight waits for that one instead of issuing a second request.
    ///
    /// Never fails; source errors end up in [`SyncState::last_error`]. The
    /// fetch runs on its own task, so dropping this future does not cancel it.
    pub async fn refresh(&self) {
        let seen = self.inner.completed.load(Ordering::Acquire);

        // The semaphore is only closed once the store is disposed.
        let Ok(permit) = self.inner.refresh_lock.clone().acquire_owned().await else {
            return;
        };

        if self.inner.completed.load(Ordering::Acquire) != seen {
            counter!(REFRESH_COALESCED).increment(1);
            return;
        }

        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let _permit = permit;
            // Counted before the permit is released, even if the source panics.
            let _completed = CompletedGuard(&inner.completed);
            inner.refresh_once().await;
        });

        if let Err(err) = task.await {
            tracing::error!(error = %err, "feature flag refresh task failed");
            self.inner.fail(err.to_string());
        }
    }

    /// Refreshes immediately, then every `interval` until [`FlagStore::stop_polling`].
    /// Restarting replaces the previous timer. Must be called within a Tokio runtime.
    pub fn start_polling(&self, interval: Duration) {
        if self.inner.disposed.load(Ordering::Acquire) {
            tracing::warn!("ignoring start_polling on a disposed flag store");
            return;
        }

        let interval = if interval.is_zero() {
            tracing::warn!(
                default = ?DEFAULT_POLL_INTERVAL,
                "polling interval cannot be zero, using the default"
            );
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };

        let mut poller = self.inner.poller.lock();
        if let Some(previous) = poller.take() {
            previous.abort();
        }

        // The timer only holds a weak reference so it cannot keep the store alive.
        let weak: Weak<StoreInner> = Arc::downgrade(&self.inner);
        *poller = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                FlagStore { inner }.refresh().await;
            }
        }));

        tracing::info!(interval = ?interval, "started feature flag polling");
    }

    /// Cancels the polling timer. An in-flight refresh still completes.
    pub fn stop_polling(&self) {
        if let Some(handle) = self.inner.poller.lock().take() {
            handle.abort();
            tracing::info!("stopped feature flag polling");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.inner
            .poller
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops polling and returns to the initial empty state.
    pub fn reset(&self) {
        self.stop_polling();
        self.inner.state.send_replace(SyncState::default());
        self.inner.flags.send_if_modified(|flags| {
            if flags.is_empty() {
                return false;
            }
            *flags = Arc::new(FlagSet::new());
            true
        });
    }

    /// Ends the store's lifecycle: polling stops and later refreshes are no-ops.
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::Release);
        self.stop_polling();
        self.inner.refresh_lock.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{PanickingSource, ScriptedSource};
    use serde_json::json;

    fn sections_payload(gallery: bool) -> serde_json::Value {
        json!({"sections-visibility": {"enabled": true, "gallery": gallery}})
    }

    #[tokio::test]
    async fn test_refresh_commits_flags() {
        let source = ScriptedSource::new(sections_payload(true));
        let store = FlagStore::new(source.clone());

        let initial = store.state();
        assert!(initial.flags.is_empty());
        assert!(initial.last_fetch.is_none());
        assert!(!initial.is_fetching);

        store.refresh().await;

        let state = store.state();
        assert!(!state.is_fetching);
        assert!(state.last_fetch.is_some());
        assert!(state.last_error.is_none());
        assert!(store.is_enabled(FlagDomain::SectionsVisibility));
        assert!(store.flag(FlagDomain::OutOfService).is_none());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_payload_keeps_flags() {
        let source = ScriptedSource::new(sections_payload(true));
        let store = FlagStore::new(source.clone());
        let mut flags_rx = store.subscribe_flags();

        store.refresh().await;
        assert!(flags_rx.has_changed().unwrap());
        flags_rx.borrow_and_update();

        let first = store.state();
        store.refresh().await;
        let second = store.state();

        assert_eq!(source.calls(), 2);
        assert!(Arc::ptr_eq(&first.flags, &second.flags));
        assert_eq!(first.last_fetch, second.last_fetch);
        assert!(!flags_rx.has_changed().unwrap());

        source.set_payload(sections_payload(false));
        store.refresh().await;
        assert!(flags_rx.has_changed().unwrap());
        assert!(!Arc::ptr_eq(&second.flags, &store.flags()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_refreshes_share_one_request() {
        let source = ScriptedSource::with_delay(sections_payload(true), Duration::from_secs(2));
        let store = FlagStore::new(source.clone());

        tokio::join!(store.refresh(), store.refresh(), store.refresh());

        assert_eq!(source.calls(), 1);
        assert!(store.is_enabled(FlagDomain::SectionsVisibility));

        // Once nothing is in flight a new call fetches again.
        store.refresh().await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_fetching_visible_while_in_flight() {
        let source = ScriptedSource::with_delay(sections_payload(true), Duration::from_secs(2));
        let store = FlagStore::new(source);
        let mut state_rx = store.subscribe();

        let background = store.clone();
        let handle = tokio::spawn(async move { background.refresh().await });

        state_rx.changed().await.unwrap();
        assert!(state_rx.borrow_and_update().is_fetching);

        handle.await.unwrap();
        assert!(!store.state().is_fetching);
    }

    #[tokio::test]
    async fn test_source_error_keeps_flags() {
        let source = ScriptedSource::new(sections_payload(true));
        let store = FlagStore::new(source.clone());
        store.refresh().await;
        let before = store.flags();

        source.set_error("boom");
        store.refresh().await;

        let state = store.state();
        assert!(Arc::ptr_eq(&before, &state.flags));
        assert!(!state.is_fetching);
        assert_eq!(state.last_error.as_deref(), Some("flag source error: boom"));
    }

    #[tokio::test]
    async fn test_empty_result_falls_back_to_defaults() {
        let source = ScriptedSource::new(sections_payload(true));
        let store = FlagStore::new(source.clone());
        store.refresh().await;
        source.set_error("boom");
        store.refresh().await;

        source.set_empty();
        store.refresh().await;

        let state = store.state();
        assert!(state.flags.is_empty());
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_panicking_source_is_captured() {
        let source = PanickingSource::new(Duration::ZERO);
        let store = FlagStore::new(source.clone());
        store.refresh().await;

        let state = store.state();
        assert!(!state.is_fetching);
        assert!(state.last_error.is_some());
        assert!(state.flags.is_empty());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_share_a_panicked_refresh() {
        let source = PanickingSource::new(Duration::from_millis(50));
        let store = FlagStore::new(source.clone());

        tokio::join!(store.refresh(), store.refresh());

        assert_eq!(source.calls(), 1);
        assert!(store.state().last_error.is_some());

        // The store is still usable afterwards.
        store.refresh().await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_cadence() {
        let source = ScriptedSource::new(sections_payload(true));
        let store = FlagStore::new(source.clone());

        store.start_polling(Duration::from_secs(60));
        assert!(store.is_polling());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.calls(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 2);

        store.stop_polling();
        assert!(!store.is_polling());
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_polling_replaces_timer() {
        let source = ScriptedSource::new(sections_payload(true));
        let store = FlagStore::new(source.clone());

        store.start_polling(Duration::from_secs(60));
        store.start_polling(Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.calls(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 2);

        store.stop_polling();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_polling_lets_in_flight_refresh_finish() {
        let source = ScriptedSource::with_delay(sections_payload(true), Duration::from_secs(5));
        let store = FlagStore::new(source.clone());

        store.start_polling(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(store.state().is_fetching);

        store.stop_polling();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let state = store.state();
        assert!(!state.is_fetching);
        assert!(store.is_enabled(FlagDomain::SectionsVisibility));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_reset_and_dispose() {
        let source = ScriptedSource::new(sections_payload(true));
        let store = FlagStore::new(source.clone());
        store.refresh().await;

        store.reset();
        assert!(store.state().flags.is_empty());
        assert!(store.state().last_fetch.is_none());

        store.dispose();
        store.refresh().await;
        store.start_polling(Duration::from_secs(1));
        assert!(!store.is_polling());
        assert_eq!(source.calls(), 1);
    }
}
