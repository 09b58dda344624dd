//! Filtering, sorting and paging of show listings.
//!
//! Everything here is pure. Filters applied to their own output change
//! nothing, and sorting is stable, so sorting twice by the same order gives
//! the same list as sorting once.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::catalog::{Genre, Preview};
use crate::favorites::FavoriteEntry;

/// Shows per page in listings
pub const ITEMS_PER_PAGE: usize = 10;

/// Placeholder meaning "no filter" in query parameters
pub const WILDCARD: &str = "*";

/// Something that appears in a sortable listing
pub trait Listing {
    fn title(&self) -> &str;

    /// Timestamp used by the date orders
    fn sort_date(&self) -> Option<DateTime<Utc>>;

    fn genre_ids(&self) -> &[u32] {
        &[]
    }
}

impl Listing for Preview {
    fn title(&self) -> &str {
        &self.title
    }

    fn sort_date(&self) -> Option<DateTime<Utc>> {
        self.updated_at()
    }

    fn genre_ids(&self) -> &[u32] {
        &self.genres
    }
}

/// Listing orders understood by [`sort_by`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    AToZ,
    ZToA,
    Newest,
    Oldest,
}

impl SortOrder {
    /// Parse a query value; unknown values give `None`
    pub fn from_param(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "a-z" => Some(Self::AToZ),
            "z-a" => Some(Self::ZToA),
            "newest" | "new" => Some(Self::Newest),
            "oldest" | "old" => Some(Self::Oldest),
            _ => None,
        }
    }

    pub fn as_param(self) -> &'static str {
        match self {
            Self::AToZ => "a-z",
            Self::ZToA => "z-a",
            Self::Newest => "newest",
            Self::Oldest => "oldest",
        }
    }

    fn compare<T: Listing>(self, a: &T, b: &T) -> Ordering {
        match self {
            Self::AToZ => compare_titles(a.title(), b.title()),
            Self::ZToA => compare_titles(b.title(), a.title()),
            Self::Newest => b.sort_date().cmp(&a.sort_date()),
            Self::Oldest => a.sort_date().cmp(&b.sort_date()),
        }
    }
}

/// Compare titles the way a reader expects: accents folded, case ignored,
/// with the raw strings as tie-break so the order is total.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

fn fold(title: &str) -> String {
    deunicode::deunicode(title).to_lowercase()
}

/// Keep items tagged with `genre`; `None` keeps everything
pub fn filter_by_genre<T: Listing>(items: Vec<T>, genre: Option<u32>) -> Vec<T> {
    match genre {
        None => items,
        Some(id) => items
            .into_iter()
            .filter(|item| item.genre_ids().contains(&id))
            .collect(),
    }
}

/// Keep items whose title contains `query`, ignoring case.
///
/// `None`, an empty query and `*` keep everything.
pub fn filter_by_title<T: Listing>(items: Vec<T>, query: Option<&str>) -> Vec<T> {
    let query = match query {
        None | Some("") | Some(WILDCARD) => return items,
        Some(query) => query.to_lowercase(),
    };

    items
        .into_iter()
        .filter(|item| item.title().to_lowercase().contains(&query))
        .collect()
}

/// Sort by a query value; unknown orders return `items` untouched
pub fn sort_by<T: Listing>(items: Vec<T>, order: &str) -> Vec<T> {
    match SortOrder::from_param(order) {
        Some(order) => sort_by_order(items, order),
        None => items,
    }
}

pub fn sort_by_order<T: Listing>(mut items: Vec<T>, order: SortOrder) -> Vec<T> {
    items.sort_by(|a, b| order.compare(a, b));
    items
}

/// One favorite per season: the first entry seen for each `(show, season)`.
///
/// Coarser than the favorites store's own per-episode identity on purpose;
/// the dashboard shows one card per season.
pub fn dedup_favorites(entries: &[FavoriteEntry]) -> Vec<FavoriteEntry> {
    let mut seen = HashSet::new();

    entries
        .iter()
        .filter(|entry| seen.insert((entry.show_id.clone(), entry.season)))
        .cloned()
        .collect()
}

/// Map a genre title (as carried in the browse query) to its id; titles must match exactly
pub fn resolve_genre(genres: &[Genre], title: &str) -> Option<u32> {
    genres
        .iter()
        .find(|genre| genre.title == title)
        .map(|genre| genre.id)
}

/// The slice of `items` shown on zero-based `page`
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    if per_page == 0 {
        return &[];
    }

    let start = page.saturating_mul(per_page).min(items.len());
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}

/// Number of pages needed for `len` items
pub fn page_count(len: usize, per_page: usize) -> usize {
    if per_page == 0 {
        0
    } else {
        len.div_ceil(per_page)
    }
}
