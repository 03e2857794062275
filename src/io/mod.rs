mod auth;
mod download;
mod drive;
pub mod worker;

pub use auth::Credentials;
pub use download::{export_format, save_content};
pub use drive::{DriveClient, UserInfo};

use crate::entry::Entry;
use crate::error::FetchError;
use crate::state::{Crumb, ListingPage};
use std::io::Read;

/// Remote listing backend. Request/response only, no state visible to the session.
pub trait ListingService {
    fn list_children(&self, folder_id: &str, page_token: &str) -> Result<ListingPage, FetchError>;
    fn search(&self, query: &str, page_token: &str) -> Result<ListingPage, FetchError>;
    /// Entry first, root last.
    fn get_ancestors(&self, entry_id: &str) -> Result<Vec<Crumb>, FetchError>;
    fn resolve_type(&self, entry_id: &str) -> Result<String, FetchError>;
}

/// Byte stream for a non-folder entry, with the file name it should be saved under.
pub struct Content {
    pub file_name: String,
    pub reader: Box<dyn Read + Send>,
}

pub trait ContentService {
    fn fetch_content(&self, entry: &Entry) -> Result<Content, FetchError>;
}
