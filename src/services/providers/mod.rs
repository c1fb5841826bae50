/// Metadata provider abstraction
///
/// Backend view of the remote catalog: paged title search and full title
/// records. Implementations route their calls through the backend cache tier.
use serde_json::Value;

use crate::{error::AppResult, models::SearchPage};

pub mod omdb;

pub use omdb::OmdbProvider;

/// Trait for title metadata sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Search titles by free text
    ///
    /// `page` is 1-based. Items without an identifier are dropped.
    async fn search_titles(&self, query: &str, page: u32) -> AppResult<SearchPage>;

    /// Fetch the full raw record for a title id
    async fn fetch_title(&self, id: &str) -> AppResult<Value>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
