use std::fmt;

use serde::{Deserialize, Serialize};

use crate::storage::{LocalStorage, THEME_KEY};

/// Color theme preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// The stored theme, or `fallback` if none is stored
    pub fn load_or(storage: &LocalStorage, fallback: Theme) -> Self {
        storage.load(THEME_KEY).unwrap_or(fallback)
    }

    pub fn save(self, storage: &LocalStorage) -> bool {
        storage.save(THEME_KEY, &self)
    }

    /// Flip the stored theme and return the new one
    pub fn toggle(storage: &LocalStorage) -> Self {
        let theme = Self::load_or(storage, Self::default()).toggled();
        theme.save(storage);
        theme
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_fallback() {
        let storage = LocalStorage::in_memory();
        assert_eq!(Theme::load_or(&storage, Theme::Dark), Theme::Dark);
    }

    #[test]
    fn toggle_persists() {
        let storage = LocalStorage::in_memory();

        assert_eq!(Theme::toggle(&storage), Theme::Dark);
        assert_eq!(Theme::load_or(&storage, Theme::Light), Theme::Dark);
        assert_eq!(Theme::toggle(&storage), Theme::Light);
    }

    #[test]
    fn stored_as_lowercase_string() {
        let storage = LocalStorage::in_memory();
        Theme::Dark.save(&storage);

        assert_eq!(
            storage.backend().read(THEME_KEY).unwrap(),
            Some("\"dark\"".to_string())
        );
    }
}
