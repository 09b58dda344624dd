use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{ordinal, show_id};
use crate::favorites::EpisodeKey;
use crate::storage::{LISTENED_KEY, LocalStorage};

/// Fraction of an episode that has to be played before it counts as listened
pub const COMPLETION_THRESHOLD: f64 = 0.95;

/// Whether playback at `position` of `duration` (same unit) crossed the completion threshold
pub fn has_completed(position: f64, duration: f64) -> bool {
    duration > 0.0 && position / duration >= COMPLETION_THRESHOLD
}

/// A record that an episode was played to near completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenedEntry {
    #[serde(deserialize_with = "show_id")]
    pub show_id: String,
    #[serde(deserialize_with = "ordinal")]
    pub season: u32,
    #[serde(deserialize_with = "ordinal")]
    pub episode: u32,
    /// Audio file that was played
    pub url: String,
    pub date: DateTime<Utc>,
}

impl ListenedEntry {
    pub fn key(&self) -> EpisodeKey {
        EpisodeKey::new(self.show_id.clone(), self.season, self.episode)
    }
}

/// Append-only log of completed plays.
///
/// Holds no cache; every call goes to storage.
#[derive(Clone)]
pub struct ListenHistory {
    storage: LocalStorage,
}

impl ListenHistory {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// Append `entry`. Repeated plays of the same episode are all kept.
    pub fn record_listened(&self, entry: ListenedEntry) {
        let mut entries = self.listened();
        entries.push(entry);
        self.storage.save(LISTENED_KEY, &entries);
    }

    /// Everything recorded so far, oldest first
    pub fn listened(&self) -> Vec<ListenedEntry> {
        self.storage.load(LISTENED_KEY).unwrap_or_default()
    }

    pub fn is_listened(&self, key: &EpisodeKey) -> bool {
        self.listened().iter().any(|entry| &entry.key() == key)
    }

    /// Forget the whole history
    pub fn reset(&self) {
        self.storage.clear(LISTENED_KEY);
    }
}
