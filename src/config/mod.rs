//! Configuration management.
//!
//! Settings are read from a TOML file and layered with `DOIBIB_*`
//! environment variables (nested keys use `__`, e.g.
//! `DOIBIB_UI__COOLDOWN_SECS=5`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [endpoints]
//! doi_base = "https://doi.org"
//! semantic_scholar_base = "https://api.semanticscholar.org/graph/v1"
//! crossref_base = "https://api.crossref.org"
//!
//! [api_keys]
//! semantic_scholar = "your-api-key"
//!
//! [http]
//! timeout_secs = 30
//! connect_timeout_secs = 10
//! mailto = "you@example.org"
//!
//! [ui]
//! cooldown_secs = 10
//! copy_revert_secs = 2
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base URLs of the metadata services
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// API keys for various services
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Timers driving the fetch trigger and copy control
    #[serde(default)]
    pub ui: UiConfig,

    /// Logging section
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Service base URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// DOI resolver used for BibTeX content negotiation
    #[serde(default = "default_doi_base")]
    pub doi_base: String,

    /// Semantic Scholar Graph API root
    #[serde(default = "default_semantic_base")]
    pub semantic_scholar_base: String,

    /// Crossref REST API root
    #[serde(default = "default_crossref_base")]
    pub crossref_base: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            doi_base: default_doi_base(),
            semantic_scholar_base: default_semantic_base(),
            crossref_base: default_crossref_base(),
        }
    }
}

fn default_doi_base() -> String {
    "https://doi.org".to_string()
}

fn default_semantic_base() -> String {
    "https://api.semanticscholar.org/graph/v1".to_string()
}

fn default_crossref_base() -> String {
    "https://api.crossref.org".to_string()
}

/// API keys for external services
///
/// Keys missing from the file fall back to their environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Semantic Scholar API key (optional, for higher rate limits)
    #[serde(
        default = "semantic_scholar_key_from_env",
        skip_serializing_if = "Option::is_none"
    )]
    pub semantic_scholar: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            semantic_scholar: semantic_scholar_key_from_env(),
        }
    }
}

fn semantic_scholar_key_from_env() -> Option<String> {
    std::env::var("SEMANTIC_SCHOLAR_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Custom user agent (defaults to `doibib/<version>`)
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Contact address appended to the user agent for the Crossref polite pool
    #[serde(default)]
    pub mailto: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: None,
            mailto: None,
        }
    }
}

impl HttpConfig {
    /// User agent sent with every request
    pub fn effective_user_agent(&self) -> String {
        let base = self.user_agent.clone().unwrap_or_else(|| {
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
        });
        match &self.mailto {
            Some(mailto) => format!("{} (mailto:{})", base, mailto),
            None => base,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// Presentation timers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Seconds the fetch trigger stays disabled after a successful fetch
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,

    /// Seconds before the "Copied!" label reverts
    #[serde(default = "default_copy_revert")]
    pub copy_revert_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown(),
            copy_revert_secs: default_copy_revert(),
        }
    }
}

fn default_cooldown() -> u64 {
    10
}

fn default_copy_revert() -> u64 {
    2
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid endpoint URL for {name}: {reason}")]
    InvalidEndpoint { name: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    /// Check that every endpoint is an absolute http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoints = [
            ("doi_base", &self.endpoints.doi_base),
            ("semantic_scholar_base", &self.endpoints.semantic_scholar_base),
            ("crossref_base", &self.endpoints.crossref_base),
        ];
        for (name, value) in endpoints {
            let parsed = url::Url::parse(value).map_err(|e| ConfigError::InvalidEndpoint {
                name,
                reason: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidEndpoint {
                    name,
                    reason: format!("unsupported scheme: {}", parsed.scheme()),
                });
            }
        }
        Ok(())
    }

    /// Write the configuration as TOML
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Load configuration from a file, layered with `DOIBIB_*` environment variables
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Get the configuration from environment variables and defaults only
pub fn get_config() -> Result<Config, ConfigError> {
    let settings = config::Config::builder().add_source(environment()).build()?;
    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("DOIBIB")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Default location of the user configuration file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("doibib").join("config.toml"))
}

/// Find a configuration file: `./doibib.toml` first, then the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("doibib.toml");
    if local.is_file() {
        return Some(local);
    }
    default_config_path().filter(|path| path.is_file())
}
