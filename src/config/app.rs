//! Application configuration loading from config.toml
//!
//! Non-secret settings (listen address, upload directory, seed values for the
//! event settings row, fallback slides) come from a TOML file. Secrets such as
//! the admin token and the file-sharing API key are read from the environment
//! (optionally populated from `.env` by `dotenvy` in `main`).

use crate::{
    core::payload::SlidePayload,
    errors::{Error, Result},
    storage::ImageBackend,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Largest accepted image upload: 5 MB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Local image upload settings
    #[serde(default)]
    pub uploads: UploadConfig,
    /// Third-party file-sharing API; remote uploads are disabled when absent
    #[serde(default)]
    pub remote_storage: Option<RemoteStorageConfig>,
    /// Values used to create the settings row on first start
    #[serde(default)]
    pub event: EventSeed,
    /// Fallback content shown when the database cannot be read
    #[serde(default)]
    pub defaults: DefaultContent,
    /// Bearer token guarding admin routes, from `ADMIN_TOKEN`
    #[serde(skip)]
    pub admin_token: Option<String>,
}

/// HTTP listener settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding the listener
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Local image upload settings
#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Directory served publicly under `public_prefix`
    #[serde(default = "default_upload_dir")]
    pub directory: PathBuf,
    /// URL prefix the directory is served under
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Largest accepted image in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    /// Where content item images are stored
    #[serde(default)]
    pub item_backend: ImageBackend,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            directory: default_upload_dir(),
            public_prefix: default_public_prefix(),
            max_bytes: default_max_bytes(),
            item_backend: ImageBackend::default(),
        }
    }
}

/// Third-party file-sharing API settings
#[derive(Debug, Deserialize, Clone)]
pub struct RemoteStorageConfig {
    /// Base URL of the API, without trailing slash
    pub base_url: String,
    /// API key, from `REMOTE_STORAGE_API_KEY`
    #[serde(skip)]
    pub api_key: Option<String>,
}

/// Seed values for the event settings row
#[derive(Debug, Deserialize, Clone)]
pub struct EventSeed {
    /// Display name of the event
    #[serde(default = "default_event_name")]
    pub name: String,
    /// Edition active on first start; defaults to the current calendar year
    #[serde(default)]
    pub current_year: Option<i32>,
    /// Countdown target; defaults to now when absent
    #[serde(default)]
    pub event_date: Option<DateTime<Utc>>,
    /// Maximum registrations per edition
    #[serde(default = "default_capacity")]
    pub capacity: i32,
    /// Registration fee
    #[serde(default)]
    pub price: f64,
    /// How participants pay
    #[serde(default)]
    pub payment_method: String,
    /// Payment instructions
    #[serde(default)]
    pub payment_details: String,
    /// Whether registration starts open
    #[serde(default)]
    pub registration_open: bool,
}

impl Default for EventSeed {
    fn default() -> Self {
        Self {
            name: default_event_name(),
            current_year: None,
            event_date: None,
            capacity: default_capacity(),
            price: 0.0,
            payment_method: String::new(),
            payment_details: String::new(),
            registration_open: false,
        }
    }
}

/// Hardcoded fallback content for public pages
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DefaultContent {
    /// Slides shown when the carousel cannot be loaded
    #[serde(default)]
    pub slides: Vec<SlidePayload>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("public/uploads")
}

fn default_public_prefix() -> String {
    "/uploads".to_string()
}

const fn default_max_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_event_name() -> String {
    "Marcha Cicloturista".to_string()
}

const fn default_capacity() -> i32 {
    300
}

/// Parses configuration from a TOML string and fills secrets from the environment
///
/// # Errors
/// Returns an error if the TOML syntax is invalid or a field has the wrong type
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let mut config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    config.admin_token = std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty());
    if let Some(remote) = config.remote_storage.as_mut() {
        remote.api_key = std::env::var("REMOTE_STORAGE_API_KEY").ok();
    }

    let prefix = config.uploads.public_prefix.trim_end_matches('/');
    if !prefix.starts_with('/') || prefix.len() < 2 {
        return Err(Error::Config {
            message: format!(
                "uploads.public_prefix must be a path below the root (got '{}')",
                config.uploads.public_prefix
            ),
        });
    }

    if config.uploads.max_bytes == 0 {
        return Err(Error::Config {
            message: "uploads.max_bytes must be greater than zero".to_string(),
        });
    }

    if config.uploads.item_backend == ImageBackend::Remote && config.remote_storage.is_none() {
        return Err(Error::Config {
            message: "uploads.item_backend = \"remote\" needs a [remote_storage] section"
                .to_string(),
        });
    }

    Ok(config)
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `CONFIG_PATH` or `./config.toml`, falling back to
/// built-in defaults when the file does not exist
///
/// # Errors
/// Returns an error if the file exists but cannot be parsed
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_config(&path)
    } else {
        tracing::warn!("{path} not found, using built-in defaults");
        parse_config("")
    }
}
