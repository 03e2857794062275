// Page cache - every page fetched for one context, kept until the context is dropped
use crate::entry::Entry;

/// One fetch result: entries plus the token for the page after it.
/// An empty token means there are no further pages.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListingPage {
    pub entries: Vec<Entry>,
    pub next_token: String,
}

impl ListingPage {
    pub fn new(entries: Vec<Entry>, next_token: impl Into<String>) -> Self {
        Self {
            entries,
            next_token: next_token.into(),
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_token.is_empty()
    }
}

/// Stands in for a page index outside the cache.
static EMPTY_PAGE: ListingPage = ListingPage {
    entries: Vec::new(),
    next_token: String::new(),
};

/// Pages indexed from 1. Never evicts.
#[derive(Clone, Debug, PartialEq)]
pub struct PageCache {
    pages: Vec<ListingPage>,
}

impl PageCache {
    pub fn new(first: ListingPage) -> Self {
        Self { pages: vec![first] }
    }

    /// `None` means the page was never fetched and a fetch is required.
    pub fn get(&self, page_index: usize) -> Option<&ListingPage> {
        page_index.checked_sub(1).and_then(|i| self.pages.get(i))
    }

    pub fn push(&mut self, page: ListingPage) {
        self.pages.push(page);
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Like `get`, but an index outside the cache reads as an empty last page.
    pub fn get_or_empty(&self, page_index: usize) -> &ListingPage {
        self.get(page_index).unwrap_or(&EMPTY_PAGE)
    }

    /// Token that was consumed to reach each page after the first.
    #[cfg(test)]
    pub fn back_tokens(&self) -> impl Iterator<Item = &str> {
        let fetched = self.pages.len().saturating_sub(1);
        self.pages.iter().take(fetched).map(|p| p.next_token.as_str())
    }
}
