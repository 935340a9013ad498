use crate::core::snapshot::SnapshotStore;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory snapshot store for tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let store = self.inner.lock().await;
        let value = store.get(key).cloned();
        if value.is_some() {
            debug!("Store HIT for key: {}", key);
        } else {
            debug!("Store MISS for key: {}", key);
        }
        Ok(value)
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let mut store = self.inner.lock().await;
        debug!("Store PUT for key: {}", key);
        store.insert(key.to_string(), data.to_vec());
        Ok(())
    }
}
