// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::CatalogError;
use crate::http::HttpClient;
use crate::progress::{NoopReporter, ProgressEvent, SharedProgressReporter};

use super::models::{Genre, Preview, Show};

/// Public podcast catalog
pub const DEFAULT_BASE_URL: &str = "https://podcast-api.netlify.app";

/// Upper bound for genre probing, in case the API never answers with a gap
pub const MAX_GENRE_PROBE: u32 = 64;

/// Read-only client for the three catalog endpoints
#[derive(Clone)]
pub struct CatalogClient<C> {
    http: C,
    base_url: Url,
    reporter: SharedProgressReporter,
}

impl<C: HttpClient> CatalogClient<C> {
    /// Create a client for the catalog living at `base_url`
    pub fn new(http: C, base_url: &str) -> Result<Self, CatalogError> {
        let base_url = Url::parse(base_url)?;
        Self::with_base_url(http, base_url)
    }

    pub fn with_base_url(http: C, base_url: Url) -> Result<Self, CatalogError> {
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }

        Ok(Self {
            http,
            base_url,
            reporter: NoopReporter::shared(),
        })
    }

    /// Route progress events to `reporter`
    pub fn with_reporter(mut self, reporter: SharedProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn reporter(&self) -> &SharedProgressReporter {
        &self.reporter
    }

    pub fn http_client(&self) -> &C {
        &self.http
    }

    /// `GET /` - every show preview, in whatever order the API returns them
    pub async fn fetch_previews(&self) -> Result<Vec<Preview>, CatalogError> {
        self.reporter.report(ProgressEvent::FetchingPreviews);

        let previews: Vec<Preview> = self.get_json(self.base_url.clone()).await?;

        self.reporter.report(ProgressEvent::PreviewsFetched {
            count: previews.len(),
        });
        Ok(previews)
    }

    /// `GET /genre/{id}`
    pub async fn fetch_genre(&self, id: u32) -> Result<Genre, CatalogError> {
        let url = self.endpoint(&["genre", &id.to_string()]);
        self.get_json(url).await
    }

    /// `GET /id/{id}` - a show with all seasons and episodes
    pub async fn fetch_show(&self, id: &str) -> Result<Show, CatalogError> {
        self.reporter.report(ProgressEvent::FetchingShow {
            show_id: id.to_string(),
        });

        let url = self.endpoint(&["id", id]);
        self.get_json(url).await
    }

    /// Fetch the given genres in order, leaving out the ones that fail
    pub async fn fetch_genres(&self, ids: &[u32]) -> Vec<Genre> {
        let mut genres = Vec::with_capacity(ids.len());

        for &id in ids {
            match self.fetch_genre(id).await {
                Ok(genre) => genres.push(genre),
                Err(e) => debug!(id, error = %e, "skipping unavailable genre"),
            }
        }

        genres
    }

    /// Probe genre ids 1, 2, 3, ... and stop at the first one that fails.
    ///
    /// Ids are assumed to be contiguous: a gap ends the scan even if higher
    /// ids would exist.
    pub async fn fetch_all_genres(&self) -> Vec<Genre> {
        let mut genres = Vec::new();
        let mut id = 1;

        while id <= MAX_GENRE_PROBE {
            self.reporter.report(ProgressEvent::ProbingGenre { id });

            match self.fetch_genre(id).await {
                Ok(genre) => genres.push(genre),
                Err(e) => {
                    debug!(id, error = %e, "genre scan stopped");
                    break;
                }
            }
            id += 1;
        }

        self.reporter.report(ProgressEvent::GenreScanFinished {
            found: genres.len(),
            stopped_at: id,
        });
        genres
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in the constructor
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        debug!(%url, "GET");

        let response = self
            .http
            .get(url.as_str())
            .await
            .map_err(|e| CatalogError::FetchFailed {
                url: url.to_string(),
                source: e,
            })?;

        if !response.is_success() {
            return Err(CatalogError::HttpStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| CatalogError::ParseFailed {
            url: url.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::http::HttpResponse;

    /// Serves canned bodies by URL and answers 404 for everything else
    #[derive(Default)]
    struct MockHttpClient {
        routes: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        fn route(mut self, url: &str, body: &str) -> Self {
            self.routes.insert(url.to_string(), body.to_string());
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
            self.requested.lock().unwrap().push(url.to_string());

            Ok(match self.routes.get(url) {
                Some(body) => HttpResponse {
                    status: 200,
                    body: Bytes::from(body.clone()),
                },
                None => HttpResponse {
                    status: 404,
                    body: Bytes::from_static(b"Not Found"),
                },
            })
        }
    }

    fn genre_json(id: u32) -> String {
        format!(r#"{{"id": {id}, "title": "Genre {id}", "description": "", "shows": []}}"#)
    }

    fn catalog(mock: MockHttpClient) -> CatalogClient<MockHttpClient> {
        CatalogClient::new(mock, DEFAULT_BASE_URL).unwrap()
    }

    #[tokio::test]
    async fn fetch_previews_parses_listing() {
        let mock = MockHttpClient::default().route(
            "https://podcast-api.netlify.app/",
            r#"[{"id": 1, "title": "B"}, {"id": 2, "title": "A"}]"#,
        );

        let previews = catalog(mock).fetch_previews().await.unwrap();

        assert_eq!(previews.len(), 2);
        // No sorting happens in the client
        assert_eq!(previews[0].title, "B");
    }

    #[tokio::test]
    async fn fetch_show_uses_id_endpoint() {
        let mock = MockHttpClient::default().route(
            "https://podcast-api.netlify.app/id/10716",
            r#"{"id": "10716", "title": "Show", "seasons": []}"#,
        );

        let show = catalog(mock).fetch_show("10716").await.unwrap();
        assert_eq!(show.title, "Show");
    }

    #[tokio::test]
    async fn missing_show_is_not_found() {
        let err = catalog(MockHttpClient::default())
            .fetch_show("nope")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn malformed_body_is_parse_failure() {
        let mock = MockHttpClient::default()
            .route("https://podcast-api.netlify.app/genre/1", "<html>oops</html>");

        let err = catalog(mock).fetch_genre(1).await.unwrap_err();
        assert!(matches!(err, CatalogError::ParseFailed { .. }));
    }

    #[tokio::test]
    async fn genre_scan_stops_at_first_gap() {
        let mock = MockHttpClient::default()
            .route("https://podcast-api.netlify.app/genre/1", &genre_json(1))
            .route("https://podcast-api.netlify.app/genre/2", &genre_json(2))
            .route("https://podcast-api.netlify.app/genre/3", &genre_json(3))
            .route("https://podcast-api.netlify.app/genre/5", &genre_json(5));
        let client = catalog(mock);

        let genres = client.fetch_all_genres().await;

        assert_eq!(genres.len(), 3);
        assert_eq!(
            genres.iter().map(|g| g.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        // Id 5 is never probed
        assert!(
            !client
                .http
                .requested()
                .iter()
                .any(|url| url.ends_with("/genre/5"))
        );
    }

    #[tokio::test]
    async fn fetch_genres_skips_failures() {
        let mock = MockHttpClient::default()
            .route("https://podcast-api.netlify.app/genre/1", &genre_json(1))
            .route("https://podcast-api.netlify.app/genre/3", &genre_json(3));

        let genres = catalog(mock).fetch_genres(&[1, 2, 3]).await;

        assert_eq!(genres.iter().map(|g| g.id).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let client =
            CatalogClient::new(MockHttpClient::default(), "https://example.com/api/").unwrap();

        assert_eq!(
            client.endpoint(&["genre", "4"]).as_str(),
            "https://example.com/api/genre/4"
        );
    }

    #[test]
    fn rejects_non_base_url() {
        let result = CatalogClient::new(MockHttpClient::default(), "mailto:someone@example.com");
        assert!(result.is_err());
    }
}
