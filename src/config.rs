use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub drive: DriveConfig,
    pub download: DownloadConfig,
    pub ui: UiConfig,
    pub log: LogConfig,
}

/// Remote listing configuration
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct DriveConfig {
    /// Entries requested per page
    pub page_size: u32,
    /// Drive `orderBy` clause
    pub order_by: String,
    /// Folder id the session starts in
    pub root_folder: String,
    /// OAuth client secrets; defaults to `credentials.json` in the config dir
    pub credentials_file: Option<PathBuf>,
    /// Stored token; defaults to `token.json` in the config dir
    pub token_file: Option<PathBuf>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct DownloadConfig {
    pub output_dir: PathBuf,
    /// Open files with the system default application once saved
    pub open_after_download: bool,
}

/// UI behavior configuration
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct UiConfig {
    pub show_icons: bool,
    /// Show size and modified columns
    pub show_details: bool,
    pub message_timeout_secs: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Defaults to `kura.log` in the data dir
    pub file: Option<PathBuf>,
}

impl Default for DriveConfig {
    fn default() -> Self {
        DriveConfig {
            page_size: 10,
            order_by: "folder,name".to_string(),
            root_folder: "root".to_string(),
            credentials_file: None,
            token_file: None,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        DownloadConfig {
            output_dir: PathBuf::from("output"),
            open_after_download: false,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            show_icons: true,
            show_details: true,
            message_timeout_secs: 5,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
            file: None,
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "kura")
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn config_dir() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Load configuration from file, or return defaults if missing or invalid
    /// Loads before logging exists, so a fallback comes back as a warning for the caller to log.
    pub fn load() -> (Self, Option<String>) {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => (Config::default(), None),
        }
    }

    pub fn load_from(path: &Path) -> (Self, Option<String>) {
        let problem = match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => return (config, None),
                Err(e) => format!("failed to parse {}: {}", path.display(), e),
            },
            Err(e) => format!("failed to read {}: {}", path.display(), e),
        };
        (Config::default(), Some(format!("{}, using defaults", problem)))
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let contents = toml::to_string_pretty(self)?;
            fs::write(&path, contents)?;
            return Ok(());
        }

        Err("Could not determine config directory".into())
    }

    /// Create a default config file if it doesn't exist
    pub fn create_default() -> Result<(), Box<dyn std::error::Error>> {
        if let Some(path) = Self::config_path() {
            if !path.exists() {
                Config::default().save()?;
            }
        }
        Ok(())
    }

    fn in_config_dir(explicit: &Option<PathBuf>, name: &str) -> Option<PathBuf> {
        explicit
            .clone()
            .or_else(|| Self::config_dir().map(|dir| dir.join(name)))
    }

    pub fn token_path(&self) -> Option<PathBuf> {
        Self::in_config_dir(&self.drive.token_file, "token.json")
    }

    pub fn credentials_path(&self) -> Option<PathBuf> {
        Self::in_config_dir(&self.drive.credentials_file, "credentials.json")
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.log.file.clone().or_else(|| {
            project_dirs().map(|dirs| dirs.data_dir().join("kura.log"))
        })
    }
}
