use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::db::memory::MemoryStore;
use crate::error::AppResult;

/// TTL classes shared by both cache tiers
pub mod ttl {
    use std::time::Duration;

    pub const SEARCH: Duration = Duration::from_secs(12 * 60 * 60);
    pub const DETAIL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
    pub const DISCOVER_POOL: Duration = Duration::from_secs(6 * 60 * 60);
    /// Static assets are only refetched on a cache miss
    pub const STATIC_ASSET: Duration = Duration::MAX;
    /// Every read goes to the network; the record only serves as fallback
    pub const NETWORK_FIRST: Duration = Duration::ZERO;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Search { query: String, page: u32 },
    Title(String),
    DiscoverPool(String),
    Request(String),
    Asset(String),
}

impl CacheKey {
    pub fn search(query: &str) -> Self {
        CacheKey::Search {
            query: query.trim().to_string(),
            page: 1,
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Search { query, page } => {
                write!(f, "search:{}:p{}", query.trim().to_lowercase(), page)
            }
            CacheKey::Title(id) => write!(f, "title:{}", id),
            CacheKey::DiscoverPool(seed) => write!(f, "discover:{}", seed),
            CacheKey::Request(url) => write!(f, "req:{}", url),
            CacheKey::Asset(path) => write!(f, "asset:{}", path),
        }
    }
}

/// A stored payload together with the moment it was written and its lifetime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheRecord {
    pub key: String,
    pub payload: serde_json::Value,
    pub stored_at: DateTime<Utc>,
    pub ttl_ms: u64,
}

impl CacheRecord {
    pub fn new(key: String, payload: serde_json::Value, ttl: Duration) -> Self {
        Self {
            key,
            payload,
            stored_at: Utc::now(),
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// A record is valid iff `now - stored_at < ttl`
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let age = (now - self.stored_at).to_std().unwrap_or_default();
        age < self.ttl()
    }
}

/// Backing storage for cache records
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn load(&self, key: &str) -> AppResult<Option<CacheRecord>>;

    /// Best-effort write; failures are logged by the store
    async fn save(&self, record: CacheRecord);

    fn name(&self) -> &'static str;
}

/// Fail-open response cache
///
/// The same contract backs the network-interception tier (keyed by exact request)
/// and the backend tier (keyed by normalized endpoint and params). Tiers differ only
/// in their store, namespace and the TTL classes their callers pass.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    namespace: &'static str,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, namespace: &'static str) -> Self {
        Self { store, namespace }
    }

    pub fn in_memory(namespace: &'static str) -> Self {
        Self::new(Arc::new(MemoryStore::new()), namespace)
    }

    fn storage_key(&self, key: &CacheKey) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Returns a fresh cached payload, or runs `fetch` and caches its result.
    ///
    /// When `fetch` fails and an expired record exists, the stale payload is
    /// returned instead of the error. Without any record the error propagates.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &CacheKey, ttl: Duration, fetch: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let storage_key = self.storage_key(key);

        let existing = match self.store.load(&storage_key).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, key = %storage_key, store = self.store.name(), "Cache read failed");
                None
            }
        };

        if let Some(record) = &existing {
            if record.is_fresh(Utc::now()) {
                match serde_json::from_value::<T>(record.payload.clone()) {
                    Ok(value) => {
                        tracing::debug!(key = %storage_key, "Cache hit");
                        return Ok(value);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, key = %storage_key, "Cached payload has unexpected shape");
                    }
                }
            }
        }

        tracing::debug!(key = %storage_key, stale = existing.is_some(), "Cache miss");

        match fetch().await {
            Ok(value) => {
                match serde_json::to_value(&value) {
                    Ok(payload) => {
                        self.store
                            .save(CacheRecord::new(storage_key, payload, ttl))
                            .await
                    }
                    Err(e) => tracing::error!(error = %e, "Cache serialization error"),
                }
                Ok(value)
            }
            Err(e) => {
                if let Some(record) = existing {
                    if let Ok(stale) = serde_json::from_value::<T>(record.payload) {
                        tracing::warn!(
                            error = %e,
                            key = %storage_key,
                            stored_at = %record.stored_at,
                            "Fetch failed, serving stale cache record"
                        );
                        return Ok(stale);
                    }
                }
                Err(e)
            }
        }
    }
}
