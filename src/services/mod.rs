pub mod discover;
pub mod providers;
pub mod spotlight;
pub mod title_search;
pub mod titles;

pub use discover::{DiscoverPool, DiscoverSample};
pub use providers::{MetadataProvider, OmdbProvider};
