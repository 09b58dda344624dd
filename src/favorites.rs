use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{ordinal, show_id};
use crate::storage::{FAVORITES_KEY, LocalStorage};

/// Identifies a single episode of a show
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpisodeKey {
    pub show_id: String,
    pub season: u32,
    pub episode: u32,
}

impl EpisodeKey {
    pub fn new(show_id: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            show_id: show_id.into(),
            season,
            episode,
        }
    }
}

/// A favorited episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    #[serde(deserialize_with = "show_id")]
    pub show_id: String,
    #[serde(deserialize_with = "ordinal")]
    pub season: u32,
    #[serde(deserialize_with = "ordinal")]
    pub episode: u32,
    /// When the favorite was added; not part of the identity
    pub date: DateTime<Utc>,
}

impl FavoriteEntry {
    /// A favorite added right now
    pub fn new(show_id: impl Into<String>, season: u32, episode: u32) -> Self {
        Self::at(show_id, season, episode, Utc::now())
    }

    pub fn at(show_id: impl Into<String>, season: u32, episode: u32, date: DateTime<Utc>) -> Self {
        Self {
            show_id: show_id.into(),
            season,
            episode,
            date,
        }
    }

    pub fn key(&self) -> EpisodeKey {
        EpisodeKey::new(self.show_id.clone(), self.season, self.episode)
    }

    pub fn matches(&self, key: &EpisodeKey) -> bool {
        self.show_id == key.show_id && self.season == key.season && self.episode == key.episode
    }
}

/// Result of a store action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Applied,
    Unchanged(Unchanged),
}

/// Why an action left the entries as they were
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unchanged {
    AlreadyFavorite,
    NotFavorite,
}

/// What [`FavoritesStore::sync`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// Entries were already in memory, storage was not consulted
    AlreadyLoaded,
    /// Entries were loaded from storage
    Loaded(usize),
    /// Nothing was stored yet; an empty list was written
    Initialized,
}

/// In-memory favorites mirrored to local storage.
///
/// Memory is the source of truth. Every mutation is written through to
/// storage; a failed write is logged and does not roll back memory.
pub struct FavoritesStore {
    entries: Vec<FavoriteEntry>,
    storage: LocalStorage,
}

impl FavoritesStore {
    /// An empty store; call [`sync`](Self::sync) to hydrate it
    pub fn new(storage: LocalStorage) -> Self {
        Self {
            entries: Vec::new(),
            storage,
        }
    }

    /// One-time hydration from storage.
    ///
    /// Only consults storage while `entries` is empty, so changes made to
    /// storage by someone else after hydration are never picked up.
    pub fn sync(&mut self) -> Hydration {
        if !self.entries.is_empty() {
            return Hydration::AlreadyLoaded;
        }

        match self.storage.load::<Vec<FavoriteEntry>>(FAVORITES_KEY) {
            Some(saved) => {
                debug!(count = saved.len(), "hydrated favorites");
                self.entries = saved;
                Hydration::Loaded(self.entries.len())
            }
            None => {
                self.storage.save(FAVORITES_KEY, &self.entries);
                Hydration::Initialized
            }
        }
    }

    /// Add `entry` unless its episode is already a favorite.
    ///
    /// A duplicate keeps the date of the first add. The list is persisted
    /// either way.
    pub fn add(&mut self, entry: FavoriteEntry) -> Mutation {
        self.sync();

        let key = entry.key();
        let outcome = if self.contains(&key) {
            Mutation::Unchanged(Unchanged::AlreadyFavorite)
        } else {
            self.entries.push(entry);
            Mutation::Applied
        };

        self.persist();
        outcome
    }

    /// Remove every entry for the episode identified by `key`
    pub fn remove(&mut self, key: &EpisodeKey) -> Mutation {
        self.sync();

        let before = self.entries.len();
        self.entries.retain(|entry| !entry.matches(key));
        let removed = before - self.entries.len();

        self.persist();

        if removed > 0 {
            Mutation::Applied
        } else {
            Mutation::Unchanged(Unchanged::NotFavorite)
        }
    }

    /// Flip the favorite state of `entry`'s episode, returning whether it is a favorite now
    pub fn toggle(&mut self, entry: FavoriteEntry) -> bool {
        self.sync();

        let key = entry.key();
        if self.contains(&key) {
            self.remove(&key);
            false
        } else {
            self.add(entry);
            true
        }
    }

    pub fn contains(&self, key: &EpisodeKey) -> bool {
        self.entries.iter().any(|entry| entry.matches(key))
    }

    /// Favorites in insertion order
    pub fn entries(&self) -> &[FavoriteEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Favorited episode numbers of one season, in insertion order
    pub fn episodes_in_season(&self, show_id: &str, season: u32) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|entry| entry.show_id == show_id && entry.season == season)
            .map(|entry| entry.episode)
            .collect()
    }

    fn persist(&self) -> bool {
        self.storage.save(FAVORITES_KEY, &self.entries)
    }
}
