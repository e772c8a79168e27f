//! Configuration management for KabaddiGuru
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{GuruError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for KabaddiGuru
///
/// Holds everything the client needs: where the backend lives, chat
/// policy knobs, cache lifetimes, local storage location and the
/// contact-form relay settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Chat thread policy
    #[serde(default)]
    pub chat: ChatConfig,
    /// Response cache lifetimes
    #[serde(default)]
    pub cache: CacheConfig,
    /// Local persistence
    #[serde(default)]
    pub storage: StorageConfig,
    /// Email collaborator used by the contact relay
    #[serde(default)]
    pub email: EmailConfig,
    /// Contact form endpoint and relay bind address
    #[serde(default)]
    pub contact: ContactConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the analytics backend
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Chat thread policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Minutes of inactivity after which the next message opens a new thread
    #[serde(default = "default_inactivity_window_minutes")]
    pub inactivity_window_minutes: u64,

    /// Conversation summaries a non-admin user may generate
    #[serde(default = "default_max_summaries")]
    pub max_summaries: u32,
}

fn default_inactivity_window_minutes() -> u64 {
    20
}

fn default_max_summaries() -> u32 {
    5
}

/// Longest accepted inactivity window (one week)
pub const MAX_INACTIVITY_WINDOW_MINUTES: u64 = 7 * 24 * 60;

impl ChatConfig {
    /// Inactivity window as a `chrono` duration
    ///
    /// # Errors
    ///
    /// Returns `GuruError::Config` if the window does not fit a duration
    pub fn inactivity_window(&self) -> Result<chrono::Duration> {
        i64::try_from(self.inactivity_window_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .ok_or_else(|| {
                GuruError::Config(format!(
                    "chat.inactivity_window_minutes out of range: {}",
                    self.inactivity_window_minutes
                ))
                .into()
            })
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            inactivity_window_minutes: default_inactivity_window_minutes(),
            max_summaries: default_max_summaries(),
        }
    }
}

/// Response cache configuration for GET requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default lifetime of a cached GET response (seconds)
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Lifetime of cached suggestion lookups (seconds)
    #[serde(default = "default_suggestions_ttl_seconds")]
    pub suggestions_ttl_seconds: u64,
}

fn default_ttl_seconds() -> u64 {
    60
}

fn default_suggestions_ttl_seconds() -> u64 {
    300
}

impl CacheConfig {
    /// Default GET cache lifetime
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Suggestions cache lifetime
    pub fn suggestions_ttl(&self) -> Duration {
        Duration::from_secs(self.suggestions_ttl_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            suggestions_ttl_seconds: default_suggestions_ttl_seconds(),
        }
    }
}

/// Local persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory of the embedded store; the platform data dir when unset
    #[serde(default)]
    pub path: Option<String>,
}

/// Email collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Delivery provider; only `console` is built in
    #[serde(default = "default_email_provider")]
    pub provider: String,

    /// Provider API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sender address
    #[serde(default = "default_email_from")]
    pub from: String,

    /// Support inbox receiving contact submissions
    #[serde(default = "default_email_to")]
    pub to: String,
}

fn default_email_provider() -> String {
    "console".to_string()
}

fn default_email_from() -> String {
    "noreply@kabaddiai.com".to_string()
}

fn default_email_to() -> String {
    "support@kabaddiai.com".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: default_email_provider(),
            api_key: None,
            from: default_email_from(),
            to: default_email_to(),
        }
    }
}

/// Contact form configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    /// URL the client posts contact forms to
    #[serde(default = "default_contact_url")]
    pub url: String,

    /// Address the local relay listens on
    #[serde(default = "default_contact_bind")]
    pub bind: String,
}

fn default_contact_url() -> String {
    "http://localhost:3000/api/contact".to_string()
}

fn default_contact_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            url: default_contact_url(),
            bind: default_contact_bind(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GuruError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| GuruError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("NEXT_PUBLIC_API_URL") {
            tracing::debug!(base_url = %base_url, "Env override: NEXT_PUBLIC_API_URL");
            self.api.base_url = base_url;
        }

        if let Ok(store_path) = std::env::var("KABADDIGURU_STORE_PATH") {
            self.storage.path = Some(store_path);
        }

        if let Ok(contact_url) = std::env::var("KABADDIGURU_CONTACT_URL") {
            self.contact.url = contact_url;
        }

        if let Ok(provider) = std::env::var("EMAIL_PROVIDER") {
            self.email.provider = provider;
        }

        if let Ok(api_key) = std::env::var("EMAIL_API_KEY") {
            self.email.api_key = Some(api_key);
        }

        if let Ok(from) = std::env::var("EMAIL_FROM") {
            self.email.from = from;
        }

        if let Ok(to) = std::env::var("EMAIL_TO") {
            self.email.to = to;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(api_url) = &cli.api_url {
            self.api.base_url = api_url.clone();
        }
        if let Some(store_path) = &cli.store_path {
            self.storage.path = Some(store_path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `GuruError::Config` describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.api.base_url).map_err(|e| {
            GuruError::Config(format!("Invalid api.base_url '{}': {}", self.api.base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GuruError::Config(format!(
                "api.base_url must use http or https, got '{}'",
                parsed.scheme()
            ))
            .into());
        }

        if self.chat.inactivity_window_minutes == 0 {
            return Err(GuruError::Config(
                "chat.inactivity_window_minutes must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.inactivity_window_minutes > MAX_INACTIVITY_WINDOW_MINUTES {
            return Err(GuruError::Config(format!(
                "chat.inactivity_window_minutes must be at most {}",
                MAX_INACTIVITY_WINDOW_MINUTES
            ))
            .into());
        }

        if self.cache.ttl_seconds == 0 || self.cache.suggestions_ttl_seconds == 0 {
            return Err(
                GuruError::Config("cache TTLs must be greater than 0".to_string()).into(),
            );
        }

        if self.email.provider != "console" {
            return Err(GuruError::Config(format!(
                "Unsupported email provider: {}",
                self.email.provider
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.chat.inactivity_window_minutes, 20);
        assert_eq!(config.chat.max_summaries, 5);
        assert_eq!(config.cache.ttl(), Duration::from_secs(60));
        assert_eq!(config.cache.suggestions_ttl(), Duration::from_secs(300));
        assert_eq!(config.email.from, "noreply@kabaddiai.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml_uses_defaults() {
        let yaml = r#"
api:
  base_url: "https://api.kabaddiguru.example"
chat:
  max_summaries: 3
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.api.base_url, "https://api.kabaddiguru.example");
        assert_eq!(config.chat.max_summaries, 3);
        assert_eq!(config.chat.inactivity_window_minutes, 20);
        assert_eq!(config.cache.ttl_seconds, 60);
    }

    #[test]
    fn test_sample_config_parses() {
        let config: Config = serde_yaml::from_str(include_str!("../config/config.yaml")).unwrap();
        assert_eq!(config.contact.bind, "127.0.0.1:3000");
        assert!(config.storage.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let mut config = Config::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = Config::default();
        config.chat.inactivity_window_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_email_provider() {
        let mut config = Config::default();
        config.email.provider = "carrier-pigeon".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Unsupported email provider"));
    }

    #[test]
    fn test_validate_rejects_oversized_window() {
        let yaml = "chat:\n  inactivity_window_minutes: 200000000000000000\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must be at most 10080"));
        assert!(config.chat.inactivity_window().is_err());

        let yaml = "chat:\n  inactivity_window_minutes: 18446744073709551615\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
        assert!(config.chat.inactivity_window().is_err());
    }

    #[test]
    fn test_validate_accepts_one_week_window() {
        let mut config = Config::default();
        config.chat.inactivity_window_minutes = MAX_INACTIVITY_WINDOW_MINUTES;
        assert!(config.validate().is_ok());
        assert_eq!(
            config.chat.inactivity_window().unwrap(),
            chrono::Duration::days(7)
        );
    }

    #[test]
    fn test_inactivity_window_duration() {
        let config = ChatConfig::default();
        assert_eq!(
            config.inactivity_window().unwrap(),
            chrono::Duration::minutes(20)
        );
    }

    #[test]
    #[serial]
    fn test_load_missing_file_applies_env_and_cli() {
        std::env::set_var("NEXT_PUBLIC_API_URL", "http://backend.test:9000");
        std::env::set_var("EMAIL_TO", "help@kabaddi.test");

        let cli = Cli::default();
        let config = Config::load("/nonexistent/kabaddiguru.yaml", &cli).unwrap();
        assert_eq!(config.api.base_url, "http://backend.test:9000");
        assert_eq!(config.email.to, "help@kabaddi.test");

        let cli = Cli {
            api_url: Some("http://override.test".to_string()),
            ..Cli::default()
        };
        let config = Config::load("/nonexistent/kabaddiguru.yaml", &cli).unwrap();
        assert_eq!(config.api.base_url, "http://override.test");

        std::env::remove_var("NEXT_PUBLIC_API_URL");
        std::env::remove_var("EMAIL_TO");
    }
}
