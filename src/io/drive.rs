// Google Drive v3 REST client
use super::{export_format, Content, ContentService, Credentials, ListingService};
use crate::entry::Entry;
use crate::error::FetchError;
use crate::state::{Crumb, ListingPage};
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

const API_BASE: &str = "https://www.googleapis.com/drive/v3";
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, size, modifiedTime)";
/// Guards against cycles in the parent chain of shared items.
const MAX_ANCESTORS: usize = 64;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: Option<String>,
    /// int64 encoded as a string by the API
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    parents: Option<Vec<String>>,
}

impl DriveFile {
    fn into_entry(self) -> Entry {
        let mut entry = Entry::new(self.id, self.name, self.mime_type.unwrap_or_default());
        entry.size = self.size.and_then(|s| s.parse().ok());
        entry.modified = self.modified_time;
        entry
    }
}

impl From<FileList> for ListingPage {
    fn from(list: FileList) -> Self {
        ListingPage::new(
            list.files.into_iter().map(DriveFile::into_entry).collect(),
            list.next_page_token.unwrap_or_default(),
        )
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct About {
    user: UserInfo,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email_address: String,
}

/// Drive query literal: backslash and single quote must be escaped.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn children_query(folder_id: &str) -> String {
    format!("{} in parents and trashed = false", quote(folder_id))
}

fn search_query(text: &str) -> String {
    format!("name contains {} and trashed = false", quote(text))
}

pub struct DriveClient {
    http: Client,
    credentials: Credentials,
    page_size: u32,
    order_by: String,
}

impl DriveClient {
    pub fn new(credentials: Credentials, page_size: u32, order_by: String) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(concat!("kura/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            credentials,
            page_size: page_size.clamp(1, 1000),
            order_by,
        })
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, FetchError> {
        let token = self.credentials.access_token(&self.http)?;
        Ok(self.http.get(format!("{}{}", API_BASE, path)).bearer_auth(token))
    }

    fn send(request: RequestBuilder) -> Result<Response, FetchError> {
        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
        Err(FetchError::Api {
            status: status.as_u16(),
            message,
        })
    }

    fn list(&self, query: &str, page_token: &str) -> Result<ListingPage, FetchError> {
        let page_size = self.page_size.to_string();
        let mut params = vec![
            ("q", query),
            ("pageSize", page_size.as_str()),
            ("orderBy", self.order_by.as_str()),
            ("fields", LIST_FIELDS),
        ];
        if !page_token.is_empty() {
            params.push(("pageToken", page_token));
        }
        debug!(q = query, token = page_token, "files.list");
        let list: FileList = Self::send(self.get("/files")?.query(&params))?.json()?;
        Ok(list.into())
    }

    fn get_file(&self, id: &str, fields: &str) -> Result<DriveFile, FetchError> {
        let path = format!("/files/{}", id);
        Ok(Self::send(self.get(&path)?.query(&[("fields", fields)]))?.json()?)
    }

    /// Signed-in account, shown in the header.
    pub fn about(&self) -> Result<UserInfo, FetchError> {
        let request = self
            .get("/about")?
            .query(&[("fields", "user(displayName, emailAddress)")]);
        let about: About = Self::send(request)?.json()?;
        Ok(about.user)
    }
}

impl ListingService for DriveClient {
    fn list_children(&self, folder_id: &str, page_token: &str) -> Result<ListingPage, FetchError> {
        self.list(&children_query(folder_id), page_token)
    }

    fn search(&self, query: &str, page_token: &str) -> Result<ListingPage, FetchError> {
        self.list(&search_query(query), page_token)
    }

    fn get_ancestors(&self, entry_id: &str) -> Result<Vec<Crumb>, FetchError> {
        let mut chain = Vec::new();
        let mut next = Some(entry_id.to_string());
        while let Some(id) = next {
            if chain.len() >= MAX_ANCESTORS {
                break;
            }
            let file = self.get_file(&id, "id, name, parents")?;
            next = file.parents.and_then(|p| p.into_iter().next());
            chain.push(Crumb::new(file.id, file.name));
        }
        Ok(chain)
    }

    fn resolve_type(&self, entry_id: &str) -> Result<String, FetchError> {
        Ok(self
            .get_file(entry_id, "mimeType")?
            .mime_type
            .unwrap_or_default())
    }
}

impl ContentService for DriveClient {
    fn fetch_content(&self, entry: &Entry) -> Result<Content, FetchError> {
        let (request, file_name) = match export_format(&entry.mime_type) {
            Some(format) => {
                let path = format!("/files/{}/export", entry.id);
                let request = self.get(&path)?.query(&[("mimeType", format.mime_type)]);
                (request, format.file_name(&entry.name))
            }
            None => {
                let path = format!("/files/{}", entry.id);
                (self.get(&path)?.query(&[("alt", "media")]), entry.name.clone())
            }
        };
        let response = Self::send(request)?;
        Ok(Content {
            file_name,
            reader: Box::new(response),
        })
    }
}
