// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::catalog::{CatalogClient, Season};
use crate::error::DashboardError;
use crate::favorites::FavoriteEntry;
use crate::filter::{Listing, dedup_favorites};
use crate::history::ListenedEntry;
use crate::http::HttpClient;
use crate::progress::ProgressEvent;

/// A favorited season with the show it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteSeason {
    pub show_id: String,
    pub season: Season,
    /// When the season's first favorite was added
    pub date: DateTime<Utc>,
}

impl Listing for FavoriteSeason {
    fn title(&self) -> &str {
        &self.season.title
    }

    fn sort_date(&self) -> Option<DateTime<Utc>> {
        Some(self.date)
    }
}

/// A listen-history record with the title of its show
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryItem {
    pub entry: ListenedEntry,
    pub show_title: String,
}

/// Resolve favorites into one card per season.
///
/// Shows are fetched concurrently and only used once every fetch has
/// finished. Favorites whose show or season cannot be fetched are left out.
/// Cancelling `cancel` abandons the batch without producing results.
pub async fn load_favorite_seasons<C: HttpClient>(
    catalog: &CatalogClient<C>,
    favorites: &[FavoriteEntry],
    cancel: &CancellationToken,
) -> Result<Vec<FavoriteSeason>, DashboardError> {
    if favorites.is_empty() {
        return Err(DashboardError::NoFavorites);
    }

    let unique = dedup_favorites(favorites);
    let fetches = unique.iter().map(|favorite| async move {
        let show = catalog.fetch_show(&favorite.show_id).await;
        (favorite, show)
    });

    let results = tokio::select! {
        _ = cancel.cancelled() => return Err(DashboardError::Cancelled),
        results = join_all(fetches) => results,
    };

    if cancel.is_cancelled() {
        return Err(DashboardError::Cancelled);
    }

    let reporter = catalog.reporter();
    let mut seasons = Vec::with_capacity(results.len());

    for (favorite, show) in results {
        let season = match show {
            Ok(show) => show.season_at(favorite.season).cloned(),
            Err(e) => {
                reporter.report(ProgressEvent::ShowUnavailable {
                    show_id: favorite.show_id.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        match season {
            Some(season) => seasons.push(FavoriteSeason {
                show_id: favorite.show_id.clone(),
                season,
                date: favorite.date,
            }),
            None => debug!(
                show_id = %favorite.show_id,
                season = favorite.season,
                "favorite season no longer exists"
            ),
        }
    }

    reporter.report(ProgressEvent::AggregationCompleted {
        loaded_count: seasons.len(),
        dropped_count: unique.len() - seasons.len(),
    });

    if seasons.is_empty() {
        return Err(DashboardError::Unavailable);
    }

    Ok(seasons)
}

/// Attach show titles to the listen history, oldest first.
///
/// Shows are fetched one after another, once per show. Records whose show
/// cannot be fetched are left out.
pub async fn load_listen_history<C: HttpClient>(
    catalog: &CatalogClient<C>,
    entries: &[ListenedEntry],
    cancel: &CancellationToken,
) -> Result<Vec<HistoryItem>, DashboardError> {
    let mut titles: HashMap<&str, Option<String>> = HashMap::new();
    let mut items = Vec::with_capacity(entries.len());

    for entry in entries {
        if cancel.is_cancelled() {
            return Err(DashboardError::Cancelled);
        }

        if !titles.contains_key(entry.show_id.as_str()) {
            let title = match catalog.fetch_show(&entry.show_id).await {
                Ok(show) => Some(show.title),
                Err(e) => {
                    catalog.reporter().report(ProgressEvent::ShowUnavailable {
                        show_id: entry.show_id.clone(),
                        error: e.to_string(),
                    });
                    None
                }
            };
            titles.insert(entry.show_id.as_str(), title);
        }

        if let Some(Some(title)) = titles.get(entry.show_id.as_str()) {
            items.push(HistoryItem {
                entry: entry.clone(),
                show_title: title.clone(),
            });
        }
    }

    if cancel.is_cancelled() {
        return Err(DashboardError::Cancelled);
    }

    if items.is_empty() {
        return Err(DashboardError::NoHistory);
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::TimeZone;

    use crate::catalog::DEFAULT_BASE_URL;
    use crate::filter::sort_by;
    use crate::http::HttpResponse;

    /// Knows shows "1" (two seasons) and "2" (one season); everything else is 404
    #[derive(Default)]
    struct MockHttpClient {
        requests: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    fn show_json(id: &str, title: &str, seasons: &[&str]) -> String {
        let seasons: Vec<String> = seasons
            .iter()
            .enumerate()
            .map(|(i, t)| {
                format!(
                    r#"{{"season": {}, "title": "{t}", "image": "", "episodes": [
                        {{"title": "E1", "description": "", "episode": 1, "file": "https://example.com/{id}/{i}.mp3"}}
                    ]}}"#,
                    i + 1
                )
            })
            .collect();
        format!(
            r#"{{"id": "{id}", "title": "{title}", "seasons": [{}]}}"#,
            seasons.join(",")
        )
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
            self.requests.lock().unwrap().push(url.to_string());

            let body = if url.ends_with("/id/1") {
                Some(show_json("1", "Alpha Show", &["Beta Season", "Alpha Season"]))
            } else if url.ends_with("/id/2") {
                Some(show_json("2", "Zulu Show", &["Zulu Season"]))
            } else {
                None
            };

            Ok(match body {
                Some(body) => HttpResponse {
                    status: 200,
                    body: Bytes::from(body),
                },
                None => HttpResponse {
                    status: 404,
                    body: Bytes::new(),
                },
            })
        }
    }

    fn catalog() -> CatalogClient<MockHttpClient> {
        CatalogClient::new(MockHttpClient::default(), DEFAULT_BASE_URL).unwrap()
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, d, 9, 0, 0).unwrap()
    }

    fn listened(show_id: &str, episode: u32) -> ListenedEntry {
        ListenedEntry {
            show_id: show_id.to_string(),
            season: 1,
            episode,
            url: "https://example.com/a.mp3".to_string(),
            date: day(1),
        }
    }

    #[tokio::test]
    async fn one_card_per_season() {
        let favorites = vec![
            FavoriteEntry::at("1", 1, 1, day(1)),
            FavoriteEntry::at("1", 1, 2, day(2)),
            FavoriteEntry::at("1", 2, 1, day(3)),
            FavoriteEntry::at("2", 1, 1, day(4)),
        ];

        let seasons = load_favorite_seasons(&catalog(), &favorites, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(seasons.len(), 3);
        assert_eq!(seasons[0].season.title, "Beta Season");
        assert_eq!(seasons[0].date, day(1));
    }

    #[tokio::test]
    async fn unavailable_shows_and_seasons_are_dropped() {
        let favorites = vec![
            FavoriteEntry::at("1", 1, 1, day(1)),
            FavoriteEntry::at("404", 1, 1, day(2)),
            FavoriteEntry::at("2", 9, 1, day(3)),
        ];

        let seasons = load_favorite_seasons(&catalog(), &favorites, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(seasons.len(), 1);
        assert_eq!(seasons[0].show_id, "1");
    }

    #[tokio::test]
    async fn no_favorites_is_reported() {
        let result = load_favorite_seasons(&catalog(), &[], &CancellationToken::new()).await;
        assert_eq!(result, Err(DashboardError::NoFavorites));
    }

    #[tokio::test]
    async fn all_failed_is_unavailable() {
        let favorites = vec![FavoriteEntry::at("404", 1, 1, day(1))];

        let result = load_favorite_seasons(&catalog(), &favorites, &CancellationToken::new()).await;
        assert_eq!(result, Err(DashboardError::Unavailable));
    }

    #[tokio::test]
    async fn cancelled_load_produces_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let favorites = vec![FavoriteEntry::at("1", 1, 1, day(1))];

        let result = load_favorite_seasons(&catalog(), &favorites, &cancel).await;
        assert_eq!(result, Err(DashboardError::Cancelled));
    }

    #[tokio::test]
    async fn favorite_seasons_sort_by_title_and_date() {
        let favorites = vec![
            FavoriteEntry::at("2", 1, 1, day(5)),
            FavoriteEntry::at("1", 2, 1, day(1)),
            FavoriteEntry::at("1", 1, 1, day(3)),
        ];
        let seasons = load_favorite_seasons(&catalog(), &favorites, &CancellationToken::new())
            .await
            .unwrap();

        let by_title = sort_by(seasons.clone(), "a-z");
        assert_eq!(by_title[0].season.title, "Alpha Season");

        let newest = sort_by(seasons, "newest");
        assert_eq!(newest[0].season.title, "Zulu Season");
        assert_eq!(newest[2].season.title, "Alpha Season");
    }

    #[tokio::test]
    async fn history_gets_show_titles_and_fetches_each_show_once() {
        let catalog = catalog();
        let entries = vec![listened("1", 1), listened("404", 1), listened("1", 2)];

        let items = load_listen_history(&catalog, &entries, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.show_title == "Alpha Show"));
        assert_eq!(items[1].entry.episode, 2);
    }

    #[tokio::test]
    async fn history_fetch_count() {
        let http = MockHttpClient::default();
        let catalog = CatalogClient::new(http, DEFAULT_BASE_URL).unwrap();
        let entries = vec![listened("1", 1), listened("1", 2), listened("1", 3)];

        load_listen_history(&catalog, &entries, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(catalog.http_client().request_count(), 1);
    }

    #[tokio::test]
    async fn empty_history_is_reported() {
        let result = load_listen_history(&catalog(), &[], &CancellationToken::new()).await;
        assert_eq!(result, Err(DashboardError::NoHistory));
    }
}
