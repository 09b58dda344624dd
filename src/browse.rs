use crate::catalog::{CatalogClient, Genre, Preview};
use crate::error::CatalogError;
use crate::filter::{
    ITEMS_PER_PAGE, WILDCARD, filter_by_genre, filter_by_title, page_count, paginate,
    resolve_genre, sort_by,
};
use crate::http::HttpClient;

/// Order used when the query names none
pub const DEFAULT_ORDER: &str = "a-z";

/// What the show listing is asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseQuery {
    /// Genre title; `None` or `*` for all genres
    pub genre: Option<String>,
    /// Title substring; `None` or `*` for all titles
    pub title: Option<String>,
    /// One of the orders understood by [`sort_by`]
    pub order: String,
    /// Zero-based page
    pub page: usize,
    pub per_page: usize,
}

impl Default for BrowseQuery {
    fn default() -> Self {
        Self {
            genre: None,
            title: None,
            order: DEFAULT_ORDER.to_string(),
            page: 0,
            per_page: ITEMS_PER_PAGE,
        }
    }
}

impl BrowseQuery {
    fn genre_filter(&self) -> Option<&str> {
        self.genre
            .as_deref()
            .filter(|genre| !genre.is_empty() && *genre != WILDCARD)
    }
}

/// One page of the filtered, sorted listing
#[derive(Debug, Clone, PartialEq)]
pub struct BrowsePage {
    pub items: Vec<Preview>,
    pub page: usize,
    /// Matches across all pages
    pub total: usize,
    pub page_count: usize,
    pub has_next: bool,
}

/// Apply genre, title, order and page to a listing.
///
/// A genre title that matches none of `genres` yields an empty page.
pub fn browse(previews: Vec<Preview>, genres: &[Genre], query: &BrowseQuery) -> BrowsePage {
    let filtered = match query.genre_filter() {
        None => previews,
        Some(title) => match resolve_genre(genres, title) {
            Some(id) => filter_by_genre(previews, Some(id)),
            None => Vec::new(),
        },
    };

    let filtered = filter_by_title(filtered, query.title.as_deref());
    let sorted = sort_by(filtered, &query.order);

    let total = sorted.len();
    let items = paginate(&sorted, query.page, query.per_page).to_vec();

    BrowsePage {
        items,
        page: query.page,
        total,
        page_count: page_count(total, query.per_page),
        has_next: query.page.saturating_add(1).saturating_mul(query.per_page) < total,
    }
}

/// Fetch the listing (and the genres, when filtering by one) and build the page
pub async fn fetch_page<C: HttpClient>(
    catalog: &CatalogClient<C>,
    query: &BrowseQuery,
) -> Result<BrowsePage, CatalogError> {
    let previews = catalog.fetch_previews().await?;

    let genres = if query.genre_filter().is_some() {
        catalog.fetch_all_genres().await
    } else {
        Vec::new()
    };

    Ok(browse(previews, &genres, query))
}
