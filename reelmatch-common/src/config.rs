//! Configuration loading
//!
//! Settings are resolved once at startup and handed to the pipelines by
//! reference. Priority for every individual setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Built-in default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "REELMATCH_CONFIG";
/// Environment variable overriding the SQLite database path
pub const DATABASE_ENV: &str = "REELMATCH_DATABASE";
/// Environment variable toggling remote feed fetching (`false`/`0` disable it)
pub const FETCH_ENV: &str = "REELMATCH_FETCH";
/// Environment variable carrying the external lookup API key
pub const API_KEY_ENV: &str = "REELMATCH_LOOKUP_API_KEY";

const DEFAULT_FEED_URL: &str = "http://api-public.netflix.com/catalog/titles/streaming";
const DEFAULT_SEARCH_URL: &str = "http://api.rottentomatoes.com/api/public/v1.0/movies.json";

/// Bootstrap configuration loaded from TOML file
///
/// Every section is optional; missing keys fall back to built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Path to SQLite database file (relative or absolute)
    pub database_path: Option<PathBuf>,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Catalog feed ingestion settings
    pub feed: FeedConfig,

    /// External review lookup settings
    pub lookup: LookupConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Catalog feed settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Fetch the feed over HTTP instead of reading `path`
    pub fetch: bool,

    /// Remote catalog endpoint
    pub url: String,

    /// Local catalog file used when not fetching
    pub path: PathBuf,

    /// Pre-computed `Authorization` header value for the remote endpoint
    pub authorization: Option<String>,

    /// Number of concurrent writers
    pub writers: usize,

    /// Work queue capacity; defaults to twice the writer count
    pub queue_capacity: Option<usize>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            fetch: false,
            url: DEFAULT_FEED_URL.to_string(),
            path: PathBuf::from("catalog.xml"),
            authorization: None,
            writers: 4,
            queue_capacity: None,
        }
    }
}

impl FeedConfig {
    /// Writer count, never less than one
    pub fn writer_count(&self) -> usize {
        self.writers.max(1)
    }

    /// Effective work queue capacity
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or(self.writer_count() * 2)
            .max(1)
    }

    /// Authorization header required for remote fetching
    pub fn require_authorization(&self) -> Result<&str> {
        match self.authorization.as_deref() {
            Some(value) if is_valid_key(value) => Ok(value),
            _ => Err(Error::Config(
                "Feed authorization not configured. Set [feed] authorization in the TOML config \
                 or read the catalog from a local file instead"
                    .to_string(),
            )),
        }
    }
}

/// How candidate titles are compared against the query title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Normalized titles equal, release years equal
    Exact,
    /// Candidate title contains the query title, years within two
    Loose,
}

impl MatchMode {
    /// Allowed distance between the query year and the theatrical year
    pub fn year_tolerance(self) -> i32 {
        match self {
            MatchMode::Exact => 0,
            MatchMode::Loose => 2,
        }
    }
}

/// How the search query string is sent to the external service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryStyle {
    /// One `q` parameter per whitespace-delimited word
    PerWord,
    /// A single `q` parameter joining filtered words with `+`
    Joined,
}

/// External review lookup settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Search endpoint
    pub search_url: String,

    /// API key appended as `apikey` when present
    pub api_key: Option<String>,

    /// Steady-state request ceiling
    pub rate_per_second: u32,

    /// Token bucket capacity (initial burst)
    pub burst: usize,

    /// Maximum candidates requested per search
    pub limit: u32,

    pub mode: MatchMode,

    pub query_style: QueryStyle,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            api_key: None,
            rate_per_second: 9,
            burst: 9,
            limit: 10,
            mode: MatchMode::Loose,
            query_style: QueryStyle::Joined,
        }
    }
}

/// Load configuration from the first available source
///
/// An explicitly named file (CLI argument or `REELMATCH_CONFIG`) must be
/// readable. The per-user default file is optional: when it is missing the
/// built-in defaults are used.
pub fn load_config(cli_path: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = cli_path {
        return read_toml_config(path);
    }

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return read_toml_config(Path::new(&path));
    }

    match default_config_path() {
        Some(path) if path.exists() => read_toml_config(&path),
        Some(path) => {
            info!(
                "No config file at {}, using built-in defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Read and parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    debug!("Reading config file: {}", path.display());
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Per-user config file location (`~/.config/reelmatch/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("reelmatch").join("config.toml"))
}

/// Resolve the SQLite database path
pub fn resolve_database_path(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATABASE_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.database_path {
        return path.clone();
    }

    default_database_path()
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("reelmatch"))
        .unwrap_or_else(|| PathBuf::from("./reelmatch_data"))
        .join("catalog.db")
}

/// Resolve whether the feed is fetched remotely
pub fn resolve_fetch(cli_arg: Option<bool>, config: &TomlConfig) -> bool {
    if let Some(fetch) = cli_arg {
        return fetch;
    }

    std::env::var(FETCH_ENV)
        .ok()
        .and_then(|value| parse_toggle(&value))
        .unwrap_or(config.feed.fetch)
}

/// Interpret an environment toggle; anything but `false`/`0` enables it
///
/// Blank values are treated as unset.
pub fn parse_toggle(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some(value != "false" && value != "0")
}

/// Resolve the external lookup API key, if any
pub fn resolve_api_key(cli_arg: Option<&str>, config: &TomlConfig) -> Option<String> {
    let env_key = std::env::var(API_KEY_ENV).ok().filter(|k| is_valid_key(k));
    let toml_key = config.lookup.api_key.clone().filter(|k| is_valid_key(k));

    if let Some(key) = cli_arg.filter(|k| is_valid_key(k)) {
        return Some(key.to_string());
    }

    if env_key.is_some() && toml_key.is_some() {
        warn!("Lookup API key found in environment and TOML config. Using environment.");
    }

    env_key.or(toml_key)
}

/// Validate a credential (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
