mod client;
mod models;

pub use client::{CatalogClient, DEFAULT_BASE_URL, MAX_GENRE_PROBE};
pub use models::{Episode, Genre, Preview, Season, Show, parse_timestamp};
pub(crate) use models::{ordinal, show_id};
