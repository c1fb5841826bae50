use crate::{
    client::{catalog::Catalog, watchlist::WatchlistStore},
    models::{MinimalTitle, WatchlistEntry},
};

/// Poster shown when a card has no image of its own
pub const PLACEHOLDER_POSTER: &str = "/static/img/placeholder.png";

/// One rendered watchlist row
#[derive(Debug, Clone, PartialEq)]
pub struct WatchlistCard {
    pub id: String,
    pub title: String,
    pub year: String,
    pub poster: Option<String>,
    /// Lookup failed; the row shows the stored title only
    pub degraded: bool,
}

impl WatchlistCard {
    fn from_lookup(entry: WatchlistEntry, minimal: MinimalTitle) -> Self {
        Self {
            title: minimal.title.unwrap_or(entry.title),
            year: minimal.year.unwrap_or_default(),
            poster: minimal.poster,
            id: entry.id,
            degraded: false,
        }
    }

    fn degraded(entry: WatchlistEntry) -> Self {
        Self {
            id: entry.id,
            title: entry.title,
            year: String::new(),
            poster: None,
            degraded: true,
        }
    }

    pub fn poster_src(&self) -> &str {
        self.poster.as_deref().unwrap_or(PLACEHOLDER_POSTER)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WatchlistView {
    /// Nothing saved; the page shows its empty-state message
    Empty,
    Cards(Vec<WatchlistCard>),
}

/// Renders the watchlist, refreshing each entry with a minimal lookup.
///
/// Lookups run one at a time in list order. A failed lookup never drops the
/// row; it falls back to what was stored at add time.
pub async fn render_watchlist(store: &dyn WatchlistStore, catalog: &dyn Catalog) -> WatchlistView {
    let entries = store.list();
    if entries.is_empty() {
        return WatchlistView::Empty;
    }

    let mut cards = Vec::with_capacity(entries.len());
    for entry in entries {
        let card = match catalog.minimal(&entry.id).await {
            Ok(minimal) if minimal.ok => WatchlistCard::from_lookup(entry, minimal),
            Ok(_) => WatchlistCard::degraded(entry),
            Err(e) => {
                tracing::debug!(error = %e, id = %entry.id, "Watchlist lookup failed");
                WatchlistCard::degraded(entry)
            }
        };
        cards.push(card);
    }

    WatchlistView::Cards(cards)
}
