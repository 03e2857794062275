// Call-counting listing service used by the state tests
use crate::entry::{Entry, FOLDER_MIME};
use crate::error::FetchError;
use crate::io::{Content, ContentService, ListingService};
use crate::state::navigation::Crumb;
use crate::state::page_cache::ListingPage;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub fn entries(prefix: &str, count: usize) -> Vec<Entry> {
    (0..count)
        .map(|i| Entry::new(format!("{}-{}", prefix, i), format!("{} {}.txt", prefix, i), "text/plain"))
        .collect()
}

fn build_pages(key: &str, sizes: &[usize]) -> Vec<ListingPage> {
    sizes
        .iter()
        .enumerate()
        .map(|(i, size)| {
            let token = if i + 1 < sizes.len() {
                format!("{}@{}", key, i + 2)
            } else {
                String::new()
            };
            ListingPage::new(entries(&format!("{}-p{}", key, i + 1), *size), token)
        })
        .collect()
}

fn page_at<'a>(pages: &'a [ListingPage], token: &str) -> Option<&'a ListingPage> {
    if token.is_empty() {
        return pages.first();
    }
    let (_, number) = token.rsplit_once('@')?;
    let number: usize = number.parse().ok()?;
    pages.get(number.checked_sub(1)?)
}

pub struct StubDrive {
    folders: HashMap<String, Vec<ListingPage>>,
    searches: HashMap<String, Vec<ListingPage>>,
    parents: HashMap<String, (String, Option<String>)>,
    list_calls: AtomicUsize,
    search_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
    fail_next: AtomicBool,
}

impl StubDrive {
    pub fn new() -> Self {
        let mut parents = HashMap::new();
        parents.insert("root".to_string(), ("My Drive".to_string(), None));
        Self {
            folders: HashMap::new(),
            searches: HashMap::new(),
            parents,
            list_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            resolve_calls: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn with_folder(mut self, id: &str, sizes: &[usize]) -> Self {
        self.folders.insert(id.to_string(), build_pages(id, sizes));
        self
    }

    /// Adds a folder and lists it first on its parent's first page.
    pub fn with_subfolder(mut self, parent: &str, id: &str, name: &str, sizes: &[usize]) -> Self {
        self = self.with_folder(id, sizes);
        self.parents
            .insert(id.to_string(), (name.to_string(), Some(parent.to_string())));
        if let Some(first) = self.folders.get_mut(parent).and_then(|p| p.first_mut()) {
            first.entries.insert(0, Entry::new(id, name, FOLDER_MIME));
        }
        self
    }

    pub fn with_search(mut self, query: &str, sizes: &[usize]) -> Self {
        self.searches
            .insert(query.to_string(), build_pages(&format!("q:{}", query), sizes));
        self
    }

    pub fn with_search_hit(mut self, query: &str, entry: Entry) -> Self {
        if let Some(first) = self.searches.get_mut(query).and_then(|p| p.first_mut()) {
            first.entries.insert(0, entry);
        }
        self
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), FetchError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(FetchError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn not_found(id: &str) -> FetchError {
        FetchError::Api {
            status: 404,
            message: format!("file not found: {}", id),
        }
    }
}

impl ListingService for StubDrive {
    fn list_children(&self, folder_id: &str, page_token: &str) -> Result<ListingPage, FetchError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.folders
            .get(folder_id)
            .and_then(|pages| page_at(pages, page_token))
            .cloned()
            .ok_or_else(|| Self::not_found(folder_id))
    }

    fn search(&self, query: &str, page_token: &str) -> Result<ListingPage, FetchError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self
            .searches
            .get(query)
            .and_then(|pages| page_at(pages, page_token))
            .cloned()
            .unwrap_or_default())
    }

    fn get_ancestors(&self, entry_id: &str) -> Result<Vec<Crumb>, FetchError> {
        self.check_failure()?;
        let mut chain = Vec::new();
        let mut current = Some(entry_id.to_string());
        while let Some(id) = current {
            let (name, parent) = self.parents.get(&id).ok_or_else(|| Self::not_found(&id))?;
            chain.push(Crumb::new(id.clone(), name.clone()));
            current = parent.clone();
        }
        Ok(chain)
    }

    fn resolve_type(&self, entry_id: &str) -> Result<String, FetchError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        if self.folders.contains_key(entry_id) {
            Ok(FOLDER_MIME.to_string())
        } else {
            Ok("application/octet-stream".to_string())
        }
    }
}

/// Content is the entry id as bytes.
impl ContentService for StubDrive {
    fn fetch_content(&self, entry: &Entry) -> Result<Content, FetchError> {
        self.check_failure()?;
        Ok(Content {
            file_name: entry.name.clone(),
            reader: Box::new(Cursor::new(entry.id.clone().into_bytes())),
        })
    }
}
