use std::sync::Arc;

use crate::{
    config::Config,
    db::{create_redis_client, CacheWriterHandle, RedisStore, ResponseCache},
    services::{discover::DiscoverPool, providers::MetadataProvider, providers::OmdbProvider},
};

const CACHE_NAMESPACE: &str = "cineseek";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MetadataProvider>,
    pub discover: Arc<DiscoverPool>,
}

impl AppState {
    pub fn new(provider: Arc<dyn MetadataProvider>, discover: DiscoverPool) -> Self {
        Self {
            provider,
            discover: Arc::new(discover),
        }
    }

    /// Builds the state from configuration
    ///
    /// Uses Redis for the response cache when `REDIS_URL` is set, otherwise an
    /// in-process store. The writer handle must be shut down after the server stops.
    pub fn from_config(config: &Config) -> anyhow::Result<(Self, Option<CacheWriterHandle>)> {
        let (cache, writer) = match config.redis_url.as_deref() {
            Some(url) => {
                let client = create_redis_client(url)?;
                let (store, writer) = RedisStore::new(client);
                tracing::info!("Response cache backed by Redis");
                (ResponseCache::new(Arc::new(store), CACHE_NAMESPACE), Some(writer))
            }
            None => {
                tracing::info!("REDIS_URL not set, response cache kept in memory");
                (ResponseCache::in_memory(CACHE_NAMESPACE), None)
            }
        };

        let provider: Arc<dyn MetadataProvider> = Arc::new(OmdbProvider::new(
            cache.clone(),
            config.omdb_api_key.clone(),
            config.omdb_api_url.clone(),
        )?);
        let discover = DiscoverPool::new(provider.clone(), cache, config.discover_sample_size);

        Ok((Self::new(provider, discover), writer))
    }
}
