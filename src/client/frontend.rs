use std::sync::Arc;
use std::time::Duration;

use crate::{
    client::{
        catalog::{Catalog, HttpCatalog},
        interceptor::OfflineInterceptor,
        suggest::{SuggestEngine, DEFAULT_DEBOUNCE},
        transport::ReqwestTransport,
        watchlist::{PersistentWatchlist, WatchlistStore},
        watchlist_view::{render_watchlist, WatchlistView},
    },
    config::Config,
    models::{Spotlight, Title, WatchlistEntry},
};

pub const OFFLINE_CACHE_DIR: &str = "offline-cache";

/// User actions the page can trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Add { id: String, title: String },
    Remove { id: String },
    Clear,
    SeedSelect(String),
    Shuffle,
}

/// What the page re-renders after an action
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Watchlist(Vec<WatchlistEntry>),
    /// Discover grid; empty renders the "empty grid" message
    Discover(Vec<Title>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpotlightView {
    Featured(Spotlight),
    Welcome,
}

/// Client session wiring the catalog, watchlist and live search together
pub struct Frontend {
    catalog: Arc<dyn Catalog>,
    watchlist: Arc<dyn WatchlistStore>,
    suggest: SuggestEngine,
    seed: Option<String>,
}

impl Frontend {
    pub fn new(catalog: Arc<dyn Catalog>, watchlist: Arc<dyn WatchlistStore>) -> Self {
        Self::with_debounce(catalog, watchlist, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(
        catalog: Arc<dyn Catalog>,
        watchlist: Arc<dyn WatchlistStore>,
        debounce: Duration,
    ) -> Self {
        Self {
            suggest: SuggestEngine::new(catalog.clone()).with_debounce(debounce),
            catalog,
            watchlist,
            seed: None,
        }
    }

    /// Session against a running server
    ///
    /// The watchlist and both offline cache tiers live under the data dir, and
    /// the shell assets are cached before the session is returned.
    pub async fn from_config(config: &Config, base_url: &str) -> Self {
        let data_dir = config.data_dir();

        let interceptor = OfflineInterceptor::persistent(
            ReqwestTransport::new(base_url),
            data_dir.join(OFFLINE_CACHE_DIR),
        );
        interceptor.install().await;

        let catalog: Arc<dyn Catalog> = Arc::new(HttpCatalog::new(interceptor));
        let watchlist = Arc::new(PersistentWatchlist::open(&data_dir));

        Self::with_debounce(
            catalog,
            watchlist,
            Duration::from_millis(config.suggest_debounce_ms),
        )
    }

    pub fn suggest(&self) -> &SuggestEngine {
        &self.suggest
    }

    pub fn seed(&self) -> Option<&str> {
        self.seed.as_deref()
    }

    pub async fn dispatch(&mut self, action: Action) -> ActionOutcome {
        tracing::debug!(?action, "Dispatching action");

        match action {
            Action::Add { id, title } => {
                self.watchlist.add(&id, &title);
                ActionOutcome::Watchlist(self.watchlist.list())
            }
            Action::Remove { id } => {
                self.watchlist.remove(&id);
                ActionOutcome::Watchlist(self.watchlist.list())
            }
            Action::Clear => {
                self.watchlist.clear();
                ActionOutcome::Watchlist(Vec::new())
            }
            Action::SeedSelect(seed) => {
                let seed = seed.trim().to_string();
                self.seed = (!seed.is_empty()).then_some(seed);
                ActionOutcome::Discover(self.load_discover().await)
            }
            Action::Shuffle => ActionOutcome::Discover(self.load_discover().await),
        }
    }

    /// Discover grid for the current seed
    pub async fn load_discover(&self) -> Vec<Title> {
        match self.catalog.discover(self.seed.clone()).await {
            Ok(titles) => titles,
            Err(e) => {
                tracing::warn!(error = %e, seed = ?self.seed, "Discover grid unavailable");
                Vec::new()
            }
        }
    }

    pub async fn spotlight_view(&self) -> SpotlightView {
        match self.catalog.spotlight().await {
            Ok(Some(spotlight)) => SpotlightView::Featured(spotlight),
            Ok(None) => SpotlightView::Welcome,
            Err(e) => {
                tracing::debug!(error = %e, "Spotlight unavailable");
                SpotlightView::Welcome
            }
        }
    }

    pub async fn watchlist_view(&self) -> WatchlistView {
        render_watchlist(self.watchlist.as_ref(), self.catalog.as_ref()).await
    }
}
