use serde::Deserialize;
use std::time::Duration;
use url::Url;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("remote url must use http or https, got {0}")]
    UnsupportedScheme(String),
    #[error("remote timeout cannot be 0")]
    ZeroTimeout,
    #[error("polling interval cannot be 0")]
    ZeroInterval,
    #[error("filesystem dismissal store requires a non-empty path")]
    EmptyStorePath,
}

#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum DismissalStoreType {
    #[default]
    Memory,
    Filesystem {
        path: String,
    },
}

#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
pub struct DismissalStore {
    #[serde(flatten)]
    pub r#type: DismissalStoreType,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_interval_secs() -> u64 {
    300
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Remote {
    /// Endpoint serving the flag document. Requested with a plain GET.
    pub url: Url,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Remote {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Polling {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for Polling {
    fn default() -> Self {
        Polling {
            interval_secs: default_interval_secs(),
        }
    }
}

impl Polling {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Config {
    pub remote: Remote,
    #[serde(default)]
    pub polling: Polling,
    #[serde(default)]
    pub dismissal_store: DismissalStore,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let scheme = self.remote.url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ValidationError::UnsupportedScheme(scheme.to_string()));
        }

        if self.remote.timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout);
        }

        if self.polling.interval_secs == 0 {
            return Err(ValidationError::ZeroInterval);
        }

        if let DismissalStoreType::Filesystem { path } = &self.dismissal_store.r#type
            && path.is_empty()
        {
            return Err(ValidationError::EmptyStorePath);
        }

        Ok(())
    }
}
