pub mod catalog;
pub mod client;
pub mod config;
pub mod dismissal;
pub mod metrics_defs;
pub mod parser;
pub mod remote;
pub mod resolver;
pub mod schema;
pub mod storage;
pub mod store;
pub mod types;

#[cfg(test)]
mod testutils;

use config::DismissalStoreType;
use std::sync::Arc;
use storage::{FilesystemStore, KeyValueStore, MemoryStore};

pub fn get_store(store_type: &DismissalStoreType) -> Arc<dyn KeyValueStore> {
    match store_type {
        DismissalStoreType::Memory => Arc::new(MemoryStore::new()),
        DismissalStoreType::Filesystem { path } => Arc::new(FilesystemStore::new(path)),
    }
}
