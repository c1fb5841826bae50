use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::db::cache::{CacheRecord, CacheStore};
use crate::error::AppResult;

/// Process-local cache store
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, CacheRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    async fn load(&self, key: &str) -> AppResult<Option<CacheRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn save(&self, record: CacheRecord) {
        self.records
            .write()
            .await
            .insert(record.key.clone(), record);
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
