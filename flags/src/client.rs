use crate::config::{Config, ValidationError};
use crate::dismissal::{DismissalManager, DismissalRecord, OutOfServiceNotice};
use crate::get_store;
use crate::remote::{FetchError, RemoteFetcher};
use crate::resolver::{self, ResolvedVisibility, VisibilityDomain};
use crate::store::FlagStore;
use crate::types::{FlagSet, SyncState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),
    #[error("could not create flag fetcher: {0}")]
    Fetch(#[from] FetchError),
}

/// Entry point for UI collaborators: the synchronized state, per-item
/// resolution, and the out-of-service notice.
#[derive(Clone)]
pub struct FlagClient {
    store: FlagStore,
    dismissal: Arc<DismissalManager>,
    poll_interval: Duration,
}

impl FlagClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        config.validate()?;

        let fetcher = RemoteFetcher::new(config.remote.url.clone(), config.remote.timeout())?;
        tracing::info!(
            url = %fetcher.url(),
            timeout = ?config.remote.timeout(),
            "configured remote flag source"
        );
        let storage = get_store(&config.dismissal_store.r#type);

        Ok(FlagClient::from_parts(
            FlagStore::new(Arc::new(fetcher)),
            DismissalManager::new(storage),
            config.polling.interval(),
        ))
    }

    pub fn from_parts(
        store: FlagStore,
        dismissal: DismissalManager,
        poll_interval: Duration,
    ) -> Self {
        FlagClient {
            store,
            dismissal: Arc::new(dismissal),
            poll_interval,
        }
    }

    pub fn store(&self) -> &FlagStore {
        &self.store
    }

    pub fn state(&self) -> SyncState {
        self.store.state()
    }

    pub fn flags(&self) -> Arc<FlagSet> {
        self.store.flags()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.store.subscribe()
    }

    pub fn subscribe_flags(&self) -> watch::Receiver<Arc<FlagSet>> {
        self.store.subscribe_flags()
    }

    pub async fn refresh(&self) {
        self.store.refresh().await;
    }

    /// Starts polling at the configured interval.
    pub fn start_polling(&self) {
        self.store.start_polling(self.poll_interval);
    }

    pub fn start_polling_every(&self, interval: Duration) {
        self.store.start_polling(interval);
    }

    pub fn stop_polling(&self) {
        self.store.stop_polling();
    }

    pub fn dispose(&self) {
        self.store.dispose();
    }

    pub fn resolve_visibility(&self, domain: VisibilityDomain, item_id: &str) -> bool {
        resolver::resolve_visibility(&self.store.flags(), domain, item_id)
    }

    pub fn resolved_visibility(&self, domain: VisibilityDomain) -> ResolvedVisibility {
        resolver::resolved_visibility(&self.store.flags(), domain)
    }

    pub fn notice(&self) -> OutOfServiceNotice {
        self.dismissal.notice(&self.store.flags())
    }

    pub fn dismiss(&self) {
        self.dismissal.dismiss(&self.store.flags());
    }

    pub fn reset_dismissal(&self) {
        self.dismissal.reset();
    }

    pub fn dismissal_record(&self) -> DismissalRecord {
        self.dismissal.record()
    }
}
