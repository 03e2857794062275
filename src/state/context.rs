// Browse context - one pageable listing (a folder or a search) and its cursor
use crate::entry::Entry;
#[cfg(test)]
use crate::error::BrowseError;
use crate::error::FetchError;
use crate::io::ListingService;
use crate::state::page_cache::{ListingPage, PageCache};
use tracing::debug;

/// What a context lists. Two contexts with different sources never share a cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListingSource {
    Folder { id: String },
    Search { query: String },
}

impl ListingSource {
    pub fn folder(id: impl Into<String>) -> Self {
        Self::Folder { id: id.into() }
    }

    pub fn search(query: impl Into<String>) -> Self {
        Self::Search {
            query: query.into(),
        }
    }

    pub fn fetch(
        &self,
        service: &dyn ListingService,
        page_token: &str,
    ) -> Result<ListingPage, FetchError> {
        match self {
            Self::Folder { id } => service.list_children(id, page_token),
            Self::Search { query } => service.search(query, page_token),
        }
    }
}

/// A pending "fetch the page after this one" request.
#[derive(Clone, Debug, PartialEq)]
pub struct PageRequest {
    pub source: ListingSource,
    pub token: String,
}

impl PageRequest {
    pub fn fetch(&self, service: &dyn ListingService) -> Result<ListingPage, FetchError> {
        self.source.fetch(service, &self.token)
    }
}

/// First half of an advance: what has to happen before the next page shows.
#[derive(Clone, Debug, PartialEq)]
pub enum AdvanceStep {
    /// Moved onto a page that was already cached.
    Cached,
    /// No page after this one.
    AtEnd,
    Fetch(PageRequest),
}

#[cfg(test)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advanced {
    Cached,
    Fetched,
    AtEnd,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BrowseContext {
    source: ListingSource,
    cache: PageCache,
    current_page: usize,
    cursor: usize,
    at_last_page: bool,
}

impl BrowseContext {
    pub fn new(source: ListingSource, first: ListingPage) -> Self {
        Self {
            source,
            cache: PageCache::new(first),
            current_page: 1,
            cursor: 0,
            at_last_page: false,
        }
    }

    #[cfg(test)]
    pub fn folder_id(&self) -> Option<&str> {
        match &self.source {
            ListingSource::Folder { id } => Some(id),
            ListingSource::Search { .. } => None,
        }
    }

    fn page(&self) -> &ListingPage {
        self.cache.get_or_empty(self.current_page)
    }

    pub fn active_entries(&self) -> &[Entry] {
        &self.page().entries
    }

    pub fn next_token(&self) -> &str {
        &self.page().next_token
    }

    #[cfg(test)]
    pub fn back_tokens(&self) -> Vec<&str> {
        self.cache
            .back_tokens()
            .take(self.current_page - 1)
            .collect()
    }

    pub fn current_page_index(&self) -> usize {
        self.current_page
    }

    #[cfg(test)]
    pub fn cached_pages(&self) -> usize {
        self.cache.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn at_last_page(&self) -> bool {
        self.at_last_page
    }

    pub fn selected(&self) -> Option<&Entry> {
        self.active_entries().get(self.cursor)
    }

    // --- Cursor ---

    pub fn cursor_down(&mut self) {
        let len = self.active_entries().len();
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor + 1) % len;
    }

    pub fn cursor_up(&mut self) {
        let len = self.active_entries().len();
        if len == 0 {
            return;
        }
        self.cursor = if self.cursor == 0 {
            len - 1
        } else {
            self.cursor - 1
        };
    }

    // --- Paging ---

    /// Moves forward when the next page is known locally, otherwise says what to fetch.
    pub fn begin_advance(&mut self) -> AdvanceStep {
        if self.current_page < self.cache.len() {
            self.current_page += 1;
            self.cursor = 0;
            self.at_last_page = false;
            debug!(page = self.current_page, "advance served from cache");
            return AdvanceStep::Cached;
        }
        if self.page().is_last() {
            self.at_last_page = true;
            return AdvanceStep::AtEnd;
        }
        AdvanceStep::Fetch(PageRequest {
            source: self.source.clone(),
            token: self.next_token().to_string(),
        })
    }

    /// Installs a fetched page. Returns false if the context moved on since the request.
    pub fn finish_advance(&mut self, request: &PageRequest, page: ListingPage) -> bool {
        let still_current = request.source == self.source
            && self.current_page == self.cache.len()
            && request.token == self.next_token();
        if !still_current {
            debug!("dropping stale page result");
            return false;
        }
        self.cache.push(page);
        self.current_page += 1;
        self.cursor = 0;
        self.at_last_page = false;
        true
    }

    #[cfg(test)]
    pub fn advance(&mut self, service: &dyn ListingService) -> Result<Advanced, BrowseError> {
        match self.begin_advance() {
            AdvanceStep::Cached => Ok(Advanced::Cached),
            AdvanceStep::AtEnd => Ok(Advanced::AtEnd),
            AdvanceStep::Fetch(request) => {
                let page = request.fetch(service)?;
                self.finish_advance(&request, page);
                Ok(Advanced::Fetched)
            }
        }
    }

    /// Steps back one page from the cache. Returns false when already on the first page.
    pub fn retreat(&mut self) -> bool {
        self.at_last_page = false;
        if self.current_page <= 1 {
            return false;
        }
        self.current_page -= 1;
        self.cursor = 0;
        true
    }
}
