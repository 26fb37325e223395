use crate::metrics_defs::{FETCH_DEGRADED, FETCH_DURATION};
use crate::{counter, histogram};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::{Duration, Instant};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    Status(StatusCode),
    #[error("flag source error: {0}")]
    Source(String),
}

/// Where raw flag documents come from.
///
/// `Ok(None)` is the explicit "no data" signal and is treated exactly like a
/// document that configures no flags. An `Err` is reserved for sources that
/// want the failure recorded in the sync state instead of silently degrading.
#[async_trait]
pub trait FlagSource: Send + Sync {
    async fn fetch_raw(&self) -> Result<Option<Value>, FetchError>;
}

/// Fetches the flag document over HTTP.
///
/// Any failure (non-2xx, timeout, network, undecodable body) degrades to
/// `Ok(None)` so callers fall back to local defaults. There are no retries
/// here; the store's polling provides the retry cadence.
pub struct RemoteFetcher {
    client: reqwest::Client,
    url: Url,
}

impl RemoteFetcher {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(RemoteFetcher { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn request(&self) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl FlagSource for RemoteFetcher {
    async fn fetch_raw(&self) -> Result<Option<Value>, FetchError> {
        let start = Instant::now();
        let result = self.request().await;
        histogram!(FETCH_DURATION).record(start.elapsed().as_secs_f64());

        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::warn!(
                    url = %self.url,
                    error = %err,
                    "flag fetch failed, falling back to local defaults"
                );
                counter!(FETCH_DEGRADED).increment(1);
                Ok(None)
            }
        }
    }
}
