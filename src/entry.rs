use chrono::{DateTime, Local, Utc};

pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    File,
    /// Listed without a content type; resolved on open.
    Unknown,
}

/// One listed item. Immutable once fetched.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub id: String,
    pub name: String,
    pub kind: EntryKind,
    pub mime_type: String,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        Self {
            id: id.into(),
            name: name.into(),
            kind: kind_for_mime(&mime_type),
            mime_type,
            size: None,
            modified: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
            _ => String::new(),
        }
    }

    pub fn get_icon(&self) -> &'static str {
        if self.is_folder() {
            return "📁";
        }
        match self.mime_type.as_str() {
            "application/vnd.google-apps.document" => return "📘",
            "application/vnd.google-apps.spreadsheet" => return "📊",
            "application/vnd.google-apps.presentation" => return "📙",
            "application/vnd.google-apps.drawing" => return "🎨",
            "application/pdf" => return "📕",
            "application/zip" => return "📦",
            m if m.starts_with("image/") => return "🖼",
            m if m.starts_with("video/") => return "🎬",
            m if m.starts_with("audio/") => return "🎵",
            _ => {}
        }
        match self.extension().as_str() {
            "txt" => "📝",
            "md" => "📝",
            "rs" => "🦀",
            "py" => "🐍",
            "go" => "🐹",
            "java" => "☕",
            "js" | "ts" => "⚡",
            "html" | "htm" => "🌐",
            "json" | "log" => "📋",
            "doc" | "docx" => "📘",
            "xls" | "xlsx" | "csv" => "📊",
            "ppt" | "pptx" => "📙",
            "tar" | "gz" | "7z" | "rar" => "🗜",
            _ => "📄",
        }
    }

    pub fn size_label(&self) -> String {
        self.size
            .map(|s| bytesize::ByteSize(s).to_string())
            .unwrap_or_default()
    }

    pub fn modified_label(&self) -> String {
        self.modified
            .map(|m| {
                let local: DateTime<Local> = m.into();
                local.format("%Y-%m-%d %H:%M").to_string()
            })
            .unwrap_or_default()
    }
}

pub fn kind_for_mime(mime_type: &str) -> EntryKind {
    match mime_type {
        "" => EntryKind::Unknown,
        FOLDER_MIME => EntryKind::Folder,
        _ => EntryKind::File,
    }
}
