use serde::{Deserialize, Serialize};

/// Minimal persisted watchlist record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchlistEntry {
    /// Catalog identifier, unique within the store
    pub id: String,
    /// Title as it was when the entry was added
    pub title: String,
}

impl WatchlistEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}
