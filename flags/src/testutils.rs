use crate::remote::{FetchError, FlagSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Flag source returning a scripted response and counting requests.
pub struct ScriptedSource {
    response: Mutex<Result<Option<Value>, String>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(payload: Value) -> Arc<Self> {
        Self::with_delay(payload, Duration::ZERO)
    }

    pub fn with_delay(payload: Value, delay: Duration) -> Arc<Self> {
        Arc::new(ScriptedSource {
            response: Mutex::new(Ok(Some(payload))),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_payload(&self, payload: Value) {
        *self.response.lock() = Ok(Some(payload));
    }

    pub fn set_empty(&self) {
        *self.response.lock() = Ok(None);
    }

    pub fn set_error(&self, message: &str) {
        *self.response.lock() = Err(message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FlagSource for ScriptedSource {
    async fn fetch_raw(&self) -> Result<Option<Value>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response.lock().clone().map_err(FetchError::Source)
    }
}

/// Flag source that panics after `delay`, standing in for a broken implementation.
pub struct PanickingSource {
    delay: Duration,
    calls: AtomicUsize,
}

impl PanickingSource {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(PanickingSource {
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FlagSource for PanickingSource {
    async fn fetch_raw(&self) -> Result<Option<Value>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        panic!("flag source exploded");
    }
}
