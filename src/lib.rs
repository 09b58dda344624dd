pub mod browse;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod favorites;
pub mod filter;
pub mod history;
pub mod http;
pub mod playlist;
pub mod progress;
pub mod storage;
pub mod theme;

// Re-export main types for convenience
pub use browse::{BrowsePage, BrowseQuery, browse, fetch_page};
pub use catalog::{CatalogClient, DEFAULT_BASE_URL, Episode, Genre, Preview, Season, Show};
pub use config::Config;
pub use dashboard::{FavoriteSeason, HistoryItem, load_favorite_seasons, load_listen_history};
pub use error::{CatalogError, ConfigError, DashboardError, StorageError};
pub use favorites::{EpisodeKey, FavoriteEntry, FavoritesStore, Hydration, Mutation, Unchanged};
pub use filter::{
    ITEMS_PER_PAGE, Listing, SortOrder, dedup_favorites, filter_by_genre, filter_by_title,
    sort_by,
};
pub use history::{COMPLETION_THRESHOLD, ListenHistory, ListenedEntry, has_completed};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use playlist::{LoadedSeason, PlaylistState, Rejection, TrackChange, track_key};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use storage::{FileStore, KeyValueStore, LocalStorage, MemoryStore};
pub use theme::Theme;
