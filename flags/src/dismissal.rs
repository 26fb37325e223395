//! Acknowledgment state for the out-of-service notice.
//!
//! The notice is shown as a modal until the user dismisses it, then as a
//! banner. The dismissal is stored together with a version token derived from
//! the flag's `enabled` value; when the flag flips, the stored dismissal is
//! stale and the modal comes back once.
//!
//! Visibility is always recomputed from the flags and the stored record. The
//! record lives outside the process and is written without locking, so two
//! concurrent writers simply race and the last one wins.

use crate::schema::OutOfServiceConfig;
use crate::storage::KeyValueStore;
use crate::types::FlagSet;
use serde::Serialize;
use std::sync::Arc;

pub const MODAL_DISMISSED_KEY: &str = "outOfServiceModalDismissed";
pub const FLAG_VERSION_KEY: &str = "outOfServiceFlagVersion";

pub fn version_token(enabled: bool) -> String {
    format!("v{enabled}")
}

/// What the UI should show for the out-of-service notice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutOfServiceNotice {
    pub show_modal: bool,
    pub show_banner: bool,
    /// Remote config merged over the local defaults.
    pub config: OutOfServiceConfig,
}

impl OutOfServiceNotice {
    fn hidden() -> Self {
        OutOfServiceNotice {
            show_modal: false,
            show_banner: false,
            config: OutOfServiceConfig::default(),
        }
    }
}

/// The persisted record as currently stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DismissalRecord {
    pub dismissed: bool,
    pub version_token: Option<String>,
}

pub struct DismissalManager {
    storage: Arc<dyn KeyValueStore>,
}

impl DismissalManager {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        DismissalManager { storage }
    }

    /// Computes the notice projection for `flags`.
    ///
    /// When the out-of-service flag is present and its token differs from the
    /// stored one, the stored dismissal is cleared and the new token recorded.
    /// An absent flag carries no version and leaves the record alone.
    pub fn notice(&self, flags: &FlagSet) -> OutOfServiceNotice {
        let Some(toggle) = flags.out_of_service() else {
            return OutOfServiceNotice::hidden();
        };

        let current = version_token(toggle.enabled);
        let stale = self.read(FLAG_VERSION_KEY).as_deref() != Some(current.as_str());
        if stale {
            tracing::debug!(version = %current, "out-of-service flag changed, resetting dismissal");
            self.remove(MODAL_DISMISSED_KEY);
            self.write(FLAG_VERSION_KEY, &current);
        }

        if !toggle.enabled {
            return OutOfServiceNotice::hidden();
        }

        let config = toggle.config.clone().unwrap_or_default();
        if stale {
            return OutOfServiceNotice {
                show_modal: true,
                show_banner: false,
                config,
            };
        }

        let dismissed = self.is_dismissed();
        OutOfServiceNotice {
            show_modal: !dismissed,
            show_banner: dismissed,
            config,
        }
    }

    /// Records that the user acknowledged the notice for the current flag version.
    pub fn dismiss(&self, flags: &FlagSet) {
        let enabled = flags.out_of_service().is_some_and(|toggle| toggle.enabled);
        self.write(MODAL_DISMISSED_KEY, "true");
        self.write(FLAG_VERSION_KEY, &version_token(enabled));
        tracing::info!("out-of-service notice dismissed");
    }

    /// Forgets any acknowledgment, as if the notice had never been seen.
    pub fn reset(&self) {
        self.remove(MODAL_DISMISSED_KEY);
        self.remove(FLAG_VERSION_KEY);
    }

    pub fn record(&self) -> DismissalRecord {
        DismissalRecord {
            dismissed: self.is_dismissed(),
            version_token: self.read(FLAG_VERSION_KEY),
        }
    }

    fn is_dismissed(&self) -> bool {
        self.read(MODAL_DISMISSED_KEY).as_deref() == Some("true")
    }

    // Unreadable state counts as missing, which means "not dismissed".
    fn read(&self, key: &str) -> Option<String> {
        self.storage.get(key).unwrap_or_else(|err| {
            tracing::warn!(key, error = %err, "failed to read dismissal state");
            None
        })
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(err) = self.storage.set(key, value) {
            tracing::warn!(key, error = %err, "failed to store dismissal state");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(err) = self.storage.remove(key) {
            tracing::warn!(key, error = %err, "failed to clear dismissal state");
        }
    }
}
