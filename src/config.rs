use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ClientError, Result};
use crate::export::ExportPolicy;

// Default configuration
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4";
pub const DEFAULT_SCROLL_THRESHOLD_PX: f32 = 100.0;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

const KEYRING_SERVICE: &str = "legal-chat-client";

/// Persisted client settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the chat service, e.g. "https://legal.example.com"
    pub api_base_url: String,
    pub default_model: String,
    /// Free-text instructions sent along with every message
    pub user_instructions: String,
    pub export: ExportPolicy,
    /// Distance from the bottom (px) that still counts as "at the bottom"
    pub scroll_threshold_px: f32,
    pub request_timeout_secs: u64,
    /// Where downloads are saved; the user's download dir when unset
    pub download_dir: Option<PathBuf>,
    /// Keyring account the bearer token is stored under
    pub account: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            user_instructions: String::new(),
            export: ExportPolicy::default(),
            scroll_threshold_px: DEFAULT_SCROLL_THRESHOLD_PX,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            download_dir: None,
            account: "default".to_string(),
        }
    }
}

impl Settings {
    /// Resolve the directory downloads should land in.
    pub fn download_dir(&self) -> PathBuf {
        if let Some(dir) = &self.download_dir {
            return dir.clone();
        }
        UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub fn settings_path() -> Option<PathBuf> {
    if let Some(proj) = ProjectDirs::from("com", "legalchat", "legal-chat-client") {
        let dir = proj.config_dir();
        if let Err(e) = fs::create_dir_all(dir) {
            tracing::warn!("Failed to create config dir: {}", e);
            return None;
        }
        return Some(dir.join("settings.json"));
    }
    None
}

/// Load settings from the default location, if any were saved.
pub fn load_settings() -> Option<Settings> {
    let path = settings_path()?;
    match load_settings_from(&path) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::debug!("No usable settings at {}: {}", path.display(), e);
            None
        }
    }
}

pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let path = settings_path()
        .ok_or_else(|| ClientError::Config("Failed to determine config directory".into()))?;
    save_settings_to(&path, settings)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    let data = serde_json::to_string_pretty(settings)?;
    let mut file = fs::File::create(path)?;
    file.write_all(data.as_bytes())?;
    Ok(())
}

/// Read the stored bearer token for `account`.
pub fn load_auth_token(account: &str) -> Result<Option<String>> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, account)?;
    match entry.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_auth_token(account: &str, token: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, account)?;
    entry.set_password(token)?;
    Ok(())
}

pub fn clear_auth_token(account: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, account)?;
    match entry.delete_password() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
