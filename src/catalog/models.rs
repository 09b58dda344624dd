// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Summary of a show, as returned by the catalog listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    #[serde(deserialize_with = "show_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Number of seasons
    #[serde(default)]
    pub seasons: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub genres: Vec<u32>,
    #[serde(default)]
    pub updated: String,
}

impl Preview {
    /// Last update of the show, if the API sent a parseable timestamp
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.updated)
    }
}

/// A genre and the shows tagged with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "show_ids")]
    pub shows: Vec<String>,
}

/// A complete show with its seasons and episodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    #[serde(deserialize_with = "show_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub seasons: Vec<Season>,
}

impl Show {
    /// Look up a season by its 1-based position in the show
    pub fn season_at(&self, ordinal: u32) -> Option<&Season> {
        (ordinal as usize)
            .checked_sub(1)
            .and_then(|index| self.seasons.get(index))
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.updated)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    /// 1-based season number
    pub season: u32,
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// 1-based episode number
    pub episode: u32,
    /// URL of the audio file
    pub file: String,
}

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// Show ids come back as numbers from the listing and as strings from `/id/{id}`
pub(crate) fn show_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn show_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<RawId>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(String::from).collect())
}

/// Accept an ordinal written either as a number or a numeric string
pub(crate) fn ordinal<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => u32::try_from(n).map_err(de::Error::custom),
        RawId::Text(s) => s.trim().parse().map_err(de::Error::custom),
    }
}
