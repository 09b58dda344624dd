use chrono::{DateTime, Utc};

use crate::catalog::{Episode, Season};
use crate::favorites::EpisodeKey;
use crate::history::ListenedEntry;

/// A season together with the show it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSeason {
    pub show_id: String,
    pub season: Season,
}

/// Pointer into the episodes of the loaded season.
///
/// Knows nothing about playback position; the player polls audio progress
/// itself and only tells this state which track to point at.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PlaylistState {
    #[default]
    Idle,
    Loaded {
        season: LoadedSeason,
        /// Always within `0..season.episodes.len()`
        index: usize,
    },
}

/// Result of a track change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackChange {
    Moved { index: usize },
    Rejected(Rejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No season loaded
    Idle,
    /// Requested index is outside the season
    OutOfRange { requested: usize, len: usize },
    /// Already on the first track
    AtStart,
    /// Already on the last track
    AtEnd,
}

/// Identity under which track `index` of `season` is recorded as listened.
///
/// The episode is its 1-based position in the season, not the catalog's
/// episode number, which may skip values.
pub fn track_key(show_id: &str, season: &Season, index: usize) -> EpisodeKey {
    EpisodeKey::new(show_id, season.season, index as u32 + 1)
}

impl PlaylistState {
    pub fn new() -> Self {
        Self::Idle
    }

    /// Replace whatever is loaded with `season`, starting at its first track
    pub fn load_season(&mut self, show_id: impl Into<String>, season: Season) {
        *self = Self::Loaded {
            season: LoadedSeason {
                show_id: show_id.into(),
                season,
            },
            index: 0,
        };
    }

    /// Point at track `index`; out-of-range indices are ignored
    pub fn set_track(&mut self, index: usize) -> TrackChange {
        let Self::Loaded {
            season,
            index: current,
        } = self
        else {
            return TrackChange::Rejected(Rejection::Idle);
        };

        let len = season.season.episodes.len();
        if index >= len {
            return TrackChange::Rejected(Rejection::OutOfRange {
                requested: index,
                len,
            });
        }

        *current = index;
        TrackChange::Moved { index }
    }

    /// Advance one track, staying put on the last one
    pub fn next(&mut self) -> TrackChange {
        match self.position() {
            None => TrackChange::Rejected(Rejection::Idle),
            Some((index, len)) if index + 1 < len => self.set_track(index + 1),
            Some(_) => TrackChange::Rejected(Rejection::AtEnd),
        }
    }

    /// Go back one track, staying put on the first one
    pub fn previous(&mut self) -> TrackChange {
        match self.position() {
            None => TrackChange::Rejected(Rejection::Idle),
            Some((0, _)) => TrackChange::Rejected(Rejection::AtStart),
            Some((index, _)) => self.set_track(index - 1),
        }
    }

    /// Like [`next`](Self::next), but jumps to the first track from the last one
    pub fn next_or_wrap(&mut self) -> TrackChange {
        match self.next() {
            TrackChange::Rejected(Rejection::AtEnd) => self.set_track(0),
            change => change,
        }
    }

    /// Like [`previous`](Self::previous), but jumps to the last track from the first one
    pub fn previous_or_wrap(&mut self) -> TrackChange {
        match self.previous() {
            TrackChange::Rejected(Rejection::AtStart) => {
                let last = self.episode_count().saturating_sub(1);
                self.set_track(last)
            }
            change => change,
        }
    }

    pub fn loaded(&self) -> Option<&LoadedSeason> {
        match self {
            Self::Idle => None,
            Self::Loaded { season, .. } => Some(season),
        }
    }

    pub fn track_index(&self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Loaded { index, .. } => Some(*index),
        }
    }

    pub fn episode_count(&self) -> usize {
        self.loaded()
            .map(|loaded| loaded.season.episodes.len())
            .unwrap_or(0)
    }

    pub fn current_episode(&self) -> Option<&Episode> {
        match self {
            Self::Idle => None,
            Self::Loaded { season, index } => season.season.episodes.get(*index),
        }
    }

    /// The history record for finishing the current track
    pub fn listened_entry(&self, date: DateTime<Utc>) -> Option<ListenedEntry> {
        let loaded = self.loaded()?;
        let index = self.track_index()?;
        let episode = self.current_episode()?;

        let key = track_key(&loaded.show_id, &loaded.season, index);

        Some(ListenedEntry {
            show_id: key.show_id,
            season: key.season,
            episode: key.episode,
            url: episode.file.clone(),
            date,
        })
    }

    fn position(&self) -> Option<(usize, usize)> {
        match self {
            Self::Idle => None,
            Self::Loaded { season, index } => Some((*index, season.season.episodes.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn season(episodes: u32) -> Season {
        Season {
            season: 2,
            title: "Season 2".to_string(),
            image: String::new(),
            episodes: (1..=episodes)
                .map(|n| Episode {
                    title: format!("Episode {n}"),
                    description: String::new(),
                    episode: n,
                    file: format!("https://example.com/{n}.mp3"),
                })
                .collect(),
        }
    }

    fn loaded(episodes: u32) -> PlaylistState {
        let mut state = PlaylistState::new();
        state.load_season("42", season(episodes));
        state
    }

    #[test]
    fn starts_idle() {
        let mut state = PlaylistState::new();

        assert!(state.current_episode().is_none());
        assert_eq!(state.next(), TrackChange::Rejected(Rejection::Idle));
        assert_eq!(state.previous(), TrackChange::Rejected(Rejection::Idle));
        assert_eq!(state.set_track(0), TrackChange::Rejected(Rejection::Idle));
        assert_eq!(state, PlaylistState::Idle);
    }

    #[test]
    fn load_season_starts_at_first_track() {
        let mut state = loaded(3);
        state.set_track(2);

        state.load_season("7", season(5));

        assert_eq!(state.track_index(), Some(0));
        assert_eq!(state.loaded().unwrap().show_id, "7");
        assert_eq!(state.episode_count(), 5);
    }

    #[test]
    fn set_track_accepts_zero_and_rejects_out_of_range() {
        let mut state = loaded(3);
        state.set_track(2);

        assert_eq!(state.set_track(0), TrackChange::Moved { index: 0 });
        assert_eq!(
            state.set_track(3),
            TrackChange::Rejected(Rejection::OutOfRange {
                requested: 3,
                len: 3
            })
        );
        assert_eq!(state.track_index(), Some(0));
    }

    #[test]
    fn next_stalls_at_last_track() {
        let mut state = loaded(3);
        state.set_track(2);

        assert_eq!(state.next(), TrackChange::Rejected(Rejection::AtEnd));
        assert_eq!(state.track_index(), Some(2));
    }

    #[test]
    fn previous_stalls_at_first_track() {
        let mut state = loaded(3);

        assert_eq!(state.previous(), TrackChange::Rejected(Rejection::AtStart));
        assert_eq!(state.track_index(), Some(0));
    }

    #[test]
    fn next_and_previous_move_one_step() {
        let mut state = loaded(3);

        assert_eq!(state.next(), TrackChange::Moved { index: 1 });
        assert_eq!(state.next(), TrackChange::Moved { index: 2 });
        assert_eq!(state.previous(), TrackChange::Moved { index: 1 });
        assert_eq!(state.current_episode().unwrap().title, "Episode 2");
    }

    #[test]
    fn wrapping_variants_cycle() {
        let mut state = loaded(3);

        assert_eq!(state.previous_or_wrap(), TrackChange::Moved { index: 2 });
        assert_eq!(state.next_or_wrap(), TrackChange::Moved { index: 0 });
        assert_eq!(state.next_or_wrap(), TrackChange::Moved { index: 1 });
    }

    #[test]
    fn empty_season_rejects_every_move() {
        let mut state = loaded(0);

        assert!(state.current_episode().is_none());
        assert!(matches!(state.next_or_wrap(), TrackChange::Rejected(_)));
        assert!(matches!(state.previous_or_wrap(), TrackChange::Rejected(_)));
        assert!(state.listened_entry(Utc::now()).is_none());
    }

    #[test]
    fn listened_entry_describes_current_track() {
        let mut state = loaded(3);
        state.next();
        let now = Utc::now();

        let entry = state.listened_entry(now).unwrap();

        assert_eq!(entry.show_id, "42");
        assert_eq!(entry.season, 2);
        assert_eq!(entry.episode, 2);
        assert_eq!(entry.url, "https://example.com/2.mp3");
        assert_eq!(entry.date, now);
    }

    #[test]
    fn listened_entry_matches_track_key_when_numbers_skip() {
        let mut season = season(3);
        for (episode, number) in season.episodes.iter_mut().zip([1, 5, 9]) {
            episode.episode = number;
        }
        let mut state = PlaylistState::new();
        state.load_season("42", season.clone());
        state.set_track(2);

        let entry = state.listened_entry(Utc::now()).unwrap();

        assert_eq!(entry.key(), track_key("42", &season, 2));
        assert_eq!(entry.episode, 3);
    }
}
