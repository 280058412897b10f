//! In-memory remote store substitute for tests and offline use.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::RemoteStore;
use crate::errors::AppError;

/// In-memory [`RemoteStore`] with the same path semantics as the HTTP
/// adapter, plus switches and inspection helpers for exercising failure
/// paths in tests.
#[derive(Default)]
pub struct MemoryRemoteStore {
    documents: RwLock<BTreeMap<String, Value>>,
    fail_writes: AtomicBool,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `write`/`remove` fail with a persist error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Seed a document directly, bypassing the adapter interface.
    pub async fn seed(&self, path: &str, value: Value) {
        self.documents.write().await.insert(path.to_string(), value);
    }

    /// Snapshot the value currently persisted at `path`.
    pub async fn persisted(&self, path: &str) -> Option<Value> {
        self.documents.read().await.get(path).cloned()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    /// Paths form a document tree: reading a parent path assembles any
    /// documents stored below it into an object keyed by child id, the way
    /// the HTTP document store answers a parent read.
    async fn read(&self, path: &str) -> Result<Option<Value>, AppError> {
        let documents = self.documents.read().await;
        if let Some(value) = documents.get(path) {
            return Ok(Some(value.clone()));
        }

        let prefix = format!("{}/", path);
        let mut assembled = serde_json::Map::new();
        for (key, value) in documents.range(prefix.clone()..) {
            let Some(child) = key.strip_prefix(&prefix) else {
                break;
            };
            assembled.insert(child.to_string(), value.clone());
        }
        if assembled.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Value::Object(assembled)))
        }
    }

    async fn write(&self, path: &str, value: &Value) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persist(format!(
                "Remote write of {} rejected",
                path
            )));
        }
        let mut documents = self.documents.write().await;
        // A parent write replaces the whole subtree.
        let prefix = format!("{}/", path);
        documents.retain(|key, _| !key.starts_with(&prefix));
        documents.insert(path.to_string(), value.clone());
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persist(format!(
                "Remote delete of {} rejected",
                path
            )));
        }
        let mut documents = self.documents.write().await;
        let prefix = format!("{}/", path);
        documents.retain(|key, _| !key.starts_with(&prefix));
        documents.remove(path);
        Ok(())
    }
}
