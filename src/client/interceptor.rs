//! Request-routing shim between the client core and the network
//!
//! - Shell assets on the allow-list: cache first, network only on a miss.
//! - Requests under `/api/`: network first, the last good response for the
//!   exact request as fallback, then a synthetic `{"results": []}`.
//! - Everything else passes straight through.
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    client::transport::{HttpResponse, Transport},
    db::{ttl, CacheKey, CacheStore, FileStore, ResponseCache},
    error::{AppError, AppResult},
};

const STATIC_NAMESPACE: &str = "cineseek-static-v1";
const API_NAMESPACE: &str = "cineseek-api-v1";

pub const STATIC_ASSETS: [&str; 5] = [
    "/",
    "/static/css/style.css",
    "/static/js/app.js",
    "/static/img/placeholder.png",
    "/manifest.webmanifest",
];

pub const API_PREFIX: &str = "/api/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    StaticAsset,
    Api,
    PassThrough,
}

pub fn route(path: &str) -> Route {
    let bare = path.split('?').next().unwrap_or(path);

    if STATIC_ASSETS.contains(&bare) {
        Route::StaticAsset
    } else if bare.starts_with(API_PREFIX) {
        Route::Api
    } else {
        Route::PassThrough
    }
}

pub struct OfflineInterceptor<T: Transport> {
    inner: T,
    static_cache: ResponseCache,
    api_cache: ResponseCache,
}

impl<T: Transport> OfflineInterceptor<T> {
    pub fn new(inner: T, static_cache: ResponseCache, api_cache: ResponseCache) -> Self {
        Self {
            inner,
            static_cache,
            api_cache,
        }
    }

    pub fn in_memory(inner: T) -> Self {
        Self::new(
            inner,
            ResponseCache::in_memory(STATIC_NAMESPACE),
            ResponseCache::in_memory(API_NAMESPACE),
        )
    }

    /// Both tiers stored as files under `dir`, shared with later sessions
    pub fn persistent(inner: T, dir: impl Into<PathBuf>) -> Self {
        let store: Arc<dyn CacheStore> = Arc::new(FileStore::new(dir));
        Self::new(
            inner,
            ResponseCache::new(store.clone(), STATIC_NAMESPACE),
            ResponseCache::new(store, API_NAMESPACE),
        )
    }

    /// Pre-populates the static cache; returns how many assets are cached
    pub async fn install(&self) -> usize {
        let mut cached = 0;

        for path in STATIC_ASSETS {
            match self.static_asset(path).await {
                Ok(_) => cached += 1,
                Err(e) => tracing::warn!(error = %e, path = %path, "Static asset not cached at install"),
            }
        }

        tracing::info!(cached, total = STATIC_ASSETS.len(), "Offline cache installed");
        cached
    }

    async fn fetch_ok(&self, path: &str) -> AppResult<HttpResponse> {
        let response = self.inner.get(path).await?;
        if !response.is_success() {
            return Err(AppError::UpstreamStatus(response.status));
        }
        Ok(response)
    }

    async fn static_asset(&self, path: &str) -> AppResult<HttpResponse> {
        self.static_cache
            .get_or_fetch(&CacheKey::Asset(path.to_string()), ttl::STATIC_ASSET, || {
                self.fetch_ok(path)
            })
            .await
    }

    async fn api_request(&self, path: &str) -> HttpResponse {
        let result = self
            .api_cache
            .get_or_fetch(&CacheKey::Request(path.to_string()), ttl::NETWORK_FIRST, || {
                self.fetch_ok(path)
            })
            .await;

        match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, path = %path, "API request failed with nothing cached");
                HttpResponse::empty_results()
            }
        }
    }
}

#[async_trait::async_trait]
impl<T: Transport> Transport for OfflineInterceptor<T> {
    async fn get(&self, path: &str) -> AppResult<HttpResponse> {
        match route(path) {
            Route::StaticAsset => self.static_asset(path).await,
            Route::Api => Ok(self.api_request(path).await),
            Route::PassThrough => self.inner.get(path).await,
        }
    }
}
