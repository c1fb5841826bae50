//! Client-side core: offline-aware transport, live search, watchlist and
//! the action dispatcher the page drives.

pub mod catalog;
pub mod frontend;
pub mod interceptor;
pub mod suggest;
pub mod transport;
pub mod watchlist;
pub mod watchlist_view;

pub use catalog::{Catalog, HttpCatalog};
pub use frontend::{Action, ActionOutcome, Frontend, SpotlightView};
pub use interceptor::OfflineInterceptor;
pub use suggest::{Key, Navigation, SuggestEngine};
pub use transport::{HttpResponse, ReqwestTransport, Transport};
pub use watchlist::{FileStorage, MemoryStorage, PersistentWatchlist, Storage, WatchlistStore};
pub use watchlist_view::{render_watchlist, WatchlistCard, WatchlistView};
