// Downloads - export targets for native documents and writing content to disk
use super::Content;
use crate::error::FetchError;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportFormat {
    pub mime_type: &'static str,
    pub extension: &'static str,
}

impl ExportFormat {
    /// Name under which the exported file is saved.
    pub fn file_name(&self, name: &str) -> String {
        let suffix = format!(".{}", self.extension);
        if name.to_lowercase().ends_with(&suffix) {
            name.to_string()
        } else {
            format!("{}{}", name, suffix)
        }
    }
}

/// Native Google formats cannot be downloaded raw and must be exported.
pub fn export_format(mime_type: &str) -> Option<ExportFormat> {
    let (mime_type, extension) = match mime_type {
        "application/vnd.google-apps.document" | "application/vnd.google-apps.presentation" => {
            ("application/pdf", "pdf")
        }
        "application/vnd.google-apps.spreadsheet" => (
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "xlsx",
        ),
        "application/vnd.google-apps.drawing" => ("image/png", "png"),
        _ => return None,
    };
    Some(ExportFormat {
        mime_type,
        extension,
    })
}

/// Strips path separators so a remote name cannot escape the output directory.
fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => "download".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// A transfer that fails midway leaves no partial file behind.
pub fn save_content(content: Content, dir: &Path) -> Result<PathBuf, FetchError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(safe_file_name(&content.file_name));
    let mut reader = content.reader;
    let mut writer = BufWriter::new(File::create(&path)?);
    let copied = io::copy(&mut reader, &mut writer).and_then(|bytes| {
        writer.flush()?;
        Ok(bytes)
    });
    drop(writer);
    match copied {
        Ok(bytes) => {
            info!(path = %path.display(), bytes, "download saved");
            Ok(path)
        }
        Err(e) => {
            if let Err(remove) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %remove, "could not remove partial download");
            }
            Err(e.into())
        }
    }
}
