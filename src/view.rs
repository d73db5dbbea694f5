//! Filtering, sorting and pagination of the album collection.
//!
//! The controller holds only view state (query, sort order, current page).
//! The collection itself stays in [`AlbumStore`] and is passed in for every
//! operation.

use chrono::Local;

use crate::album::{Album, AlbumId};
use crate::order::SortOrder;
use crate::store::AlbumStore;

pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Albums matching `query` (case-insensitive) in their current order.
pub fn filter_albums<'a, I>(albums: I, query: &str) -> Vec<&'a Album>
where
    I: IntoIterator<Item = &'a Album>,
{
    let needle = query.to_lowercase();
    albums.into_iter().filter(|a| a.matches(&needle)).collect()
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Items on 1-indexed `page`; empty past the end.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(size).min(items.len());
    let end = start.saturating_add(size).min(items.len());
    &items[start..end]
}

/// One album as shown on a gallery page.
#[derive(Debug, Clone)]
pub struct AlbumCard<'a> {
    pub album: &'a Album,
    pub description: &'a str,
    pub photos_label: String,
    pub created: String,
}

impl<'a> AlbumCard<'a> {
    fn new(album: &'a Album) -> Self {
        let count = album.photo_count();
        let photos_label = format!("{} {}", count, if count == 1 { "photo" } else { "photos" });
        Self {
            album,
            description: album.description.as_deref().unwrap_or("No description"),
            photos_label,
            created: format_date(album),
        }
    }

    pub fn id(&self) -> &AlbumId {
        &self.album.id
    }
}

fn format_date(album: &Album) -> String {
    album
        .created_at
        .with_timezone(&Local)
        .format("%b %-d, %Y")
        .to_string()
}

/// Everything needed to draw the gallery grid.
#[derive(Debug, Clone)]
pub struct GalleryPage<'a> {
    pub cards: Vec<AlbumCard<'a>>,
    pub page: usize,
    pub page_count: usize,
    /// Albums matching the query across all pages.
    pub total: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl GalleryPage<'_> {
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

pub struct AlbumViewController {
    query: String,
    sort: SortOrder,
    page: usize,
    page_size: usize,
}

impl AlbumViewController {
    pub fn new(page_size: usize, sort: SortOrder) -> Self {
        Self {
            query: String::new(),
            sort,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// New search term; always starts over at page 1.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
    }

    /// Reorder the stored collection and keep the order for later renders.
    pub fn apply_sort(&mut self, store: &mut AlbumStore, order: SortOrder) {
        self.sort = order;
        store.sort(order);
        self.clamp(store);
    }

    /// Filtered and sorted albums across all pages.
    pub fn matching<'a>(&self, store: &'a AlbumStore) -> Vec<&'a Album> {
        let mut albums = filter_albums(store.albums(), &self.query);
        self.sort.sort_refs(&mut albums);
        albums
    }

    pub fn page_count(&self, store: &AlbumStore) -> usize {
        page_count(self.matching(store).len(), self.page_size)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self, store: &AlbumStore) -> bool {
        self.page < self.page_count(store)
    }

    pub fn next_page(&mut self, store: &AlbumStore) -> bool {
        if self.has_next(store) {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev_page(&mut self) -> bool {
        if self.has_prev() {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    pub fn go_to_page(&mut self, store: &AlbumStore, page: usize) {
        self.page = page;
        self.clamp(store);
    }

    /// Keep the current page inside the valid range after the collection
    /// shrank.
    pub fn clamp(&mut self, store: &AlbumStore) {
        let pages = self.page_count(store).max(1);
        self.page = self.page.clamp(1, pages);
    }

    pub fn render<'a>(&self, store: &'a AlbumStore) -> GalleryPage<'a> {
        let matching = self.matching(store);
        let total = matching.len();
        let pages = page_count(total, self.page_size);
        let page = self.page.clamp(1, pages.max(1));
        let cards = page_slice(&matching, page, self.page_size)
            .iter()
            .map(|album| AlbumCard::new(album))
            .collect();

        GalleryPage {
            cards,
            page,
            page_count: pages,
            total,
            has_prev: page > 1,
            has_next: page < pages,
        }
    }
}
