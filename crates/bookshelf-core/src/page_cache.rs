//! In-memory page cache.
//!
//! Maps page numbers to the records the server returned for them. Pages are
//! kept in the order they were first inserted, and every flattening
//! operation walks them in that order rather than by page number.
//!
//! Once present, a page is never refreshed by a fetch; it is only edited in
//! place by write operations or dropped through [`PageCache::invalidate`].
//! There is no eviction.
//!
//! ```rust
//! use bookshelf_core::{Book, BookId, PageCache};
//!
//! let mut cache = PageCache::new();
//! cache.insert(2, vec![Book::new(11, "Persuasion")]);
//! cache.insert(1, vec![Book::new(1, "War and Peace"), Book::new(2, "Hobbit")]);
//!
//! // Insertion order, not page order
//! let ids: Vec<u64> = cache.iter_books().map(|b| b.id.0).collect();
//! assert_eq!(ids, vec![11, 1, 2]);
//!
//! assert_eq!(cache.remove_book(BookId(2)), vec![1]);
//! assert_eq!(cache.get(1).map(<[Book]>::len), Some(1));
//! ```

use crate::types::{Book, BookId};
use indexmap::IndexMap;

/// Insertion-ordered map from page number to cached records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageCache {
    pages: IndexMap<u32, Vec<Book>>,
}

impl PageCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records cached for `page`, if any.
    #[must_use]
    pub fn get(&self, page: u32) -> Option<&[Book]> {
        self.pages.get(&page).map(Vec::as_slice)
    }

    /// Whether `page` has a cached entry, even an empty one.
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains_key(&page)
    }

    /// Store the records of a page.
    ///
    /// Re-inserting an existing page replaces its records but keeps its
    /// original position in the iteration order.
    pub fn insert(&mut self, page: u32, books: Vec<Book>) {
        self.pages.insert(page, books);
    }

    /// Drop a single page. Returns the records it held.
    ///
    /// Later pages move up in iteration order.
    pub fn invalidate(&mut self, page: u32) -> Option<Vec<Book>> {
        self.pages.shift_remove(&page)
    }

    /// Drop every page.
    pub fn clear(&mut self) {
        self.pages.clear();
    }

    /// Remove every record with `id` from every page.
    ///
    /// Returns the pages that changed. Pages are not re-balanced, so a page
    /// may end up shorter than the page size it was fetched with.
    pub fn remove_book(&mut self, id: BookId) -> Vec<u32> {
        let mut touched = Vec::new();
        for (page, books) in &mut self.pages {
            let before = books.len();
            books.retain(|b| b.id != id);
            if books.len() != before {
                touched.push(*page);
            }
        }
        touched
    }

    /// Replace the first record with `id` on each page by `book`.
    ///
    /// Returns the pages that changed.
    pub fn replace_book(&mut self, id: BookId, book: &Book) -> Vec<u32> {
        let mut touched = Vec::new();
        for (page, books) in &mut self.pages {
            if let Some(slot) = books.iter_mut().find(|b| b.id == id) {
                *slot = book.clone();
                touched.push(*page);
            }
        }
        touched
    }

    /// First record with `id`, scanning pages in insertion order.
    #[must_use]
    pub fn find(&self, id: BookId) -> Option<&Book> {
        self.iter_books().find(|b| b.id == id)
    }

    /// All cached records, pages in insertion order, records in page order.
    pub fn iter_books(&self) -> impl Iterator<Item = &Book> {
        self.pages.values().flatten()
    }

    /// Title search over every cached record, windowed by `window`.
    ///
    /// Matches are case-insensitive substrings. The result is the slice
    /// `[(page - 1) * window, page * window)` of all matches; `page` 0 is
    /// treated as 1.
    #[must_use]
    pub fn filtered(&self, query: &str, page: u32, window: usize) -> Vec<Book> {
        let start = (page.max(1) as usize - 1).saturating_mul(window);
        self.iter_books()
            .filter(|b| b.title_matches(query))
            .skip(start)
            .take(window)
            .cloned()
            .collect()
    }

    /// Cached page numbers in insertion order.
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    /// Number of cached pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no page is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn titled(ids: &[(u64, &str)]) -> Vec<Book> {
        ids.iter().map(|(id, title)| Book::new(*id, *title)).collect()
    }

    fn sample() -> PageCache {
        let mut cache = PageCache::new();
        cache.insert(1, titled(&[(1, "War and Peace"), (2, "Hobbit")]));
        cache.insert(2, titled(&[(3, "Warlock"), (4, "Emma")]));
        cache
    }

    #[test]
    fn test_get_missing_page() {
        let cache = sample();
        assert!(cache.get(7).is_none());
        assert!(!cache.contains(7));
    }

    #[test]
    fn test_empty_page_is_still_cached() {
        let mut cache = PageCache::new();
        cache.insert(5, Vec::new());
        assert!(cache.contains(5));
        assert_eq!(cache.get(5), Some(&[][..]));
    }

    #[test]
    fn test_filter_matches_title_case_insensitively() {
        let mut cache = PageCache::new();
        cache.insert(1, titled(&[(1, "War and Peace"), (2, "Hobbit")]));
        let hits = cache.filtered("war", 1, 10);
        assert_eq!(hits, titled(&[(1, "War and Peace")]));
    }

    #[test]
    fn test_filter_spans_pages_in_insertion_order() {
        let mut cache = PageCache::new();
        cache.insert(2, titled(&[(3, "Warlock")]));
        cache.insert(1, titled(&[(1, "War and Peace")]));
        let ids: Vec<_> = cache.filtered("WAR", 1, 10).iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![BookId(3), BookId(1)]);
    }

    #[test]
    fn test_filter_window() {
        let mut cache = PageCache::new();
        let books: Vec<Book> = (1..=25).map(|i| Book::new(i, format!("Book {i}"))).collect();
        cache.insert(1, books);

        assert_eq!(cache.filtered("book", 1, 10).len(), 10);
        assert_eq!(cache.filtered("book", 3, 10).len(), 5);
        assert_eq!(cache.filtered("book", 3, 10)[0].id, BookId(21));
        assert!(cache.filtered("book", 4, 10).is_empty());
        assert_eq!(cache.filtered("book", 0, 10), cache.filtered("book", 1, 10));
    }

    #[test]
    fn test_remove_book_touches_only_matching_pages() {
        let mut cache = sample();
        let untouched = cache.get(2).unwrap().to_vec();
        assert_eq!(cache.remove_book(BookId(2)), vec![1]);
        assert_eq!(cache.get(1).unwrap(), &titled(&[(1, "War and Peace")])[..]);
        assert_eq!(cache.get(2).unwrap(), &untouched[..]);
    }

    #[test]
    fn test_remove_book_removes_duplicates_across_pages() {
        let mut cache = sample();
        cache.insert(3, titled(&[(2, "Hobbit"), (9, "Dune")]));
        assert_eq!(cache.remove_book(BookId(2)), vec![1, 3]);
        assert!(cache.find(BookId(2)).is_none());
    }

    #[test]
    fn test_replace_book_keeps_position() {
        let mut cache = sample();
        let replacement = Book::new(3, "Warlock (2nd ed.)").with_favorite(true);
        assert_eq!(cache.replace_book(BookId(3), &replacement), vec![2]);
        assert_eq!(cache.get(2).unwrap()[0], replacement);
        assert_eq!(cache.get(2).unwrap()[1].id, BookId(4));
    }

    #[test]
    fn test_replace_book_first_match_per_page() {
        let mut cache = PageCache::new();
        cache.insert(1, titled(&[(5, "a"), (5, "b")]));
        let replacement = Book::new(5, "c");
        cache.replace_book(BookId(5), &replacement);
        assert_eq!(cache.get(1).unwrap(), &titled(&[(5, "c"), (5, "b")])[..]);
    }

    #[test]
    fn test_replace_missing_book_is_noop() {
        let mut cache = sample();
        let before = cache.clone();
        assert!(cache.replace_book(BookId(99), &Book::new(99, "x")).is_empty());
        assert_eq!(cache, before);
    }

    #[test]
    fn test_find_prefers_first_inserted_page() {
        let mut cache = PageCache::new();
        cache.insert(4, vec![Book::new(1, "from page 4")]);
        cache.insert(1, vec![Book::new(1, "from page 1")]);
        assert_eq!(cache.find(BookId(1)).unwrap().title(), Some("from page 4"));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut cache = sample();
        assert_eq!(cache.invalidate(1).map(|b| b.len()), Some(2));
        assert_eq!(cache.pages().collect::<Vec<_>>(), vec![2]);
        assert!(cache.invalidate(1).is_none());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
    }

    proptest! {
        #[test]
        fn test_remove_book_leaves_no_trace(
            pages in proptest::collection::vec(proptest::collection::vec(0u64..8, 0..6), 1..5),
            target in 0u64..8,
        ) {
            let mut cache = PageCache::new();
            for (i, ids) in pages.iter().enumerate() {
                let page = u32::try_from(i).unwrap() + 1;
                cache.insert(page, ids.iter().map(|id| Book::new(*id, "t")).collect());
            }
            let before = cache.clone();
            let touched = cache.remove_book(BookId(target));

            prop_assert!(cache.find(BookId(target)).is_none());
            for page in before.pages() {
                let old = before.get(page).unwrap();
                let new = cache.get(page).unwrap();
                if touched.contains(&page) {
                    let expected: Vec<Book> =
                        old.iter().filter(|b| b.id.0 != target).cloned().collect();
                    prop_assert_eq!(new, &expected[..]);
                } else {
                    prop_assert_eq!(new, old);
                }
            }
        }
    }
}
