use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{AppError, ConfigError};

/// Environment variable that overrides `luma.api_key`.
pub const API_KEY_ENV: &str = "LUMA_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single-line message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config.toml and the event cache
    pub config_dir: PathBuf,

    /// Luma calendar API access
    #[serde(default)]
    pub luma: LumaConfig,

    /// Event cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Rate-limit retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Display formatting
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LumaConfig {
    /// API key sent as `x-luma-api-key`. `LUMA_API_KEY` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_luma_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_luma_base_url() -> String {
    "https://api.lu.ma".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for LumaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_luma_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a cached feed stays fresh (default: 5 minutes)
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// SQLite file name, relative to `config_dir`
    #[serde(default = "default_cache_file_name")]
    pub file_name: String,
}

fn default_ttl_seconds() -> u64 {
    300
}

fn default_cache_file_name() -> String {
    "events_cache.db".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            file_name: default_cache_file_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first request
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait used when a 429 carries no usable Retry-After
    #[serde(default = "default_wait_secs")]
    pub default_wait_secs: u64,

    /// Upper bound on any single rate-limit wait
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wait_secs: Option<u64>,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_wait_secs() -> u64 {
    60
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            default_wait_secs: default_wait_secs(),
            max_wait_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// IANA timezone used for event dates and times
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vana");

        Self {
            config_dir,
            luma: LumaConfig::default(),
            cache: CacheConfig::default(),
            retry: RetryConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let mut config = Self::default();
            if let Some(parent) = path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; any error fails the load.
    pub fn load_validated() -> Result<Self, AppError> {
        Self::load()?.validated()
    }

    /// Check a loaded configuration, logging warnings and failing on errors
    pub fn validated(self) -> Result<Self, AppError> {
        if self.api_key().is_none() {
            return Err(ConfigError::MissingSetting(format!(
                "luma.api_key (or {})",
                API_KEY_ENV
            ))
            .into());
        }

        let validation = self.validate();
        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(self)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.luma.api_key = Some(key);
            }
        }
    }

    /// The configured API key, if it is non-empty
    pub fn api_key(&self) -> Option<&str> {
        self.luma
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    /// Path of the SQLite event cache
    pub fn cache_path(&self) -> PathBuf {
        self.config_dir.join(&self.cache.file_name)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.luma.base_url, "luma.base_url", &mut result);

        if self.luma.request_timeout_secs == 0 {
            result.add_error(
                "luma.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.retry.max_attempts == 0 {
            result.add_error("retry.max_attempts", "At least one attempt is required");
        } else if self.retry.max_attempts > 10 {
            result.add_warning(
                "retry.max_attempts",
                "More than 10 attempts may keep the page waiting for a long time",
            );
        }

        match self.retry.max_wait_secs {
            None => result.add_warning(
                "retry.max_wait_secs",
                "Rate-limit waits are unbounded; the server controls how long we sleep",
            ),
            Some(0) => result.add_warning(
                "retry.max_wait_secs",
                "Rate-limit waits are disabled (0 seconds)",
            ),
            Some(_) => {}
        }

        if self.cache.ttl_seconds == 0 {
            result.add_warning("cache.ttl_seconds", "Event cache disabled (0 seconds)");
        }

        if self.cache.file_name.trim().is_empty() {
            result.add_error("cache.file_name", "Cache file name must not be empty");
        }

        if self.display.timezone.parse::<chrono_tz::Tz>().is_err() {
            result.add_error(
                "display.timezone",
                format!("Unknown timezone: {}", self.display.timezone),
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("vana");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        let mut config = Config::default();
        config.luma.api_key = Some("secret".to_string());
        config.retry.max_wait_secs = Some(120);
        config
    }

    #[test]
    fn test_valid_default_config() {
        let result = configured().validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_defaults_match_feed_contract() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.default_wait_secs, 60);
        assert_eq!(config.luma.base_url, "https://api.lu.ma");
    }

    #[test]
    fn test_invalid_url() {
        let mut config = configured();
        config.luma.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "luma.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = configured();
        config.luma.base_url = "ftp://api.lu.ma".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_attempts_is_error() {
        let mut config = configured();
        config.retry.max_attempts = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "retry.max_attempts"));
    }

    #[test]
    fn test_unbounded_wait_is_warning() {
        let mut config = configured();
        config.retry.max_wait_secs = None;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "retry.max_wait_secs"));
    }

    #[test]
    fn test_unknown_timezone() {
        let mut config = configured();
        config.display.timezone = "Mars/Olympus_Mons".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.error_summary().contains("display.timezone"));
    }

    #[test]
    fn test_zero_ttl_is_warning() {
        let mut config = configured();
        config.cache.ttl_seconds = 0;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "cache.ttl_seconds"));
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let mut config = configured();
        config.luma.api_key = Some("   ".to_string());
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_validated_requires_api_key() {
        let err = Config::default().validated().unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::MissingSetting(_))));
    }

    #[test]
    fn test_validated_rejects_errors_and_accepts_warnings() {
        let mut config = configured();
        config.retry.max_attempts = 0;
        let err = config.validated().unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::Invalid(ref m)) if m.contains("retry.max_attempts")));

        let mut config = configured();
        config.cache.ttl_seconds = 0;
        let config = config.validated().unwrap();
        assert_eq!(config.cache.ttl_seconds, 0);
    }

    #[test]
    fn test_load_from_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.config_dir, dir.path());
        assert_eq!(config.cache_path(), dir.path().join("events_cache.db"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = configured();
        config.config_dir = dir.path().to_path_buf();
        config.display.timezone = "America/New_York".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key(), Some("secret"));
        assert_eq!(loaded.display.timezone, "America/New_York");
        assert_eq!(loaded.retry.max_wait_secs, Some(120));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            format!("config_dir = {:?}\n\n[retry]\nmax_attempts = 5\n", dir.path()),
        )
        .unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.retry.max_attempts, 5);
        assert_eq!(loaded.retry.default_wait_secs, 60);
        assert_eq!(loaded.cache.ttl_seconds, 300);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }
}
