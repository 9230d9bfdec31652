//! Configuration loading
//!
//! Settings come from a TOML file (`$CONTACTS_CLI_CONFIG`, or
//! `<config dir>/contacts-cli/config.toml`), falling back to defaults for
//! anything missing. Store connection settings can be overridden through the
//! environment, which is also where `.env` values land.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::resilience::{BackoffStrategy, RetryConfig};
use crate::formatting::StatusMarkers;

pub const CONFIG_PATH_ENV: &str = "CONTACTS_CLI_CONFIG";
pub const API_URL_ENV: &str = "CONTACTS_API_URL";
pub const API_TOKEN_ENV: &str = "CONTACTS_API_TOKEN";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub retry: RetrySettings,
    pub markers: StatusMarkers,
}

/// Record store / jobs API connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1".to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

/// Retry settings as written in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff: BackoffStrategy,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 2000,
            max_delay_ms: 30000,
            backoff: BackoffStrategy::Fixed,
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetrySettings {
    /// Reject settings that would make the retry delays meaningless
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 0.0 {
            anyhow::bail!(
                "retry.backoff_multiplier must be a non-negative number, got {}",
                self.backoff_multiplier
            );
        }
        if self.max_delay_ms < self.base_delay_ms {
            anyhow::bail!(
                "retry.max_delay_ms ({}) is below retry.base_delay_ms ({})",
                self.max_delay_ms,
                self.base_delay_ms
            );
        }
        Ok(())
    }

    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
            strategy: self.backoff,
            jitter: self.jitter,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("contacts-cli").join("config.toml"))
    }

    /// Load from the configured location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(Self::default_path);

        let mut config = match path {
            Some(path) if path.exists() => Self::read_file(&path)?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load an explicit file, then apply environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.retry.validate()?;
        Ok(config)
    }

    /// Override store settings from environment-style lookups
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.is_empty()) {
            self.store.base_url = url;
        }
        if let Some(token) = lookup(API_TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.store.token = Some(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        let retry = config.retry.to_retry_config();

        assert_eq!(retry, RetryConfig::default());
        assert_eq!(config.markers.status_for(2), "Duplicate (2)");
        assert_eq!(config.store.timeout_secs, 30);
        assert!(config.store.token.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml_str(
            r#"
            [store]
            base_url = "https://records.example.com/v1"

            [retry]
            max_attempts = 3
            backoff = "exponential"
            jitter = true

            [markers]
            unique = "OK"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.base_url, "https://records.example.com/v1");
        assert_eq!(config.store.timeout_secs, 30);

        let retry = config.retry.to_retry_config();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.strategy, BackoffStrategy::Exponential);
        assert!(retry.jitter);
        assert_eq!(retry.base_delay, Duration::from_secs(2));

        assert_eq!(config.markers.unique, "OK");
        assert_eq!(config.markers.duplicate, "Duplicate ({count})");
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::from_toml_str("[retry]\nmax_attempts = \"many\"").is_err());
    }

    #[test]
    fn test_negative_backoff_multiplier_is_rejected() {
        let err = Config::from_toml_str(
            "[retry]\nbackoff = \"exponential\"\nbackoff_multiplier = -2.0\n",
        )
        .unwrap_err();

        assert!(err.to_string().contains("backoff_multiplier"));
    }

    #[test]
    fn test_max_delay_below_base_delay_is_rejected() {
        let err = Config::from_toml_str("[retry]\nbase_delay_ms = 5000\nmax_delay_ms = 1000\n")
            .unwrap_err();

        assert!(err.to_string().contains("max_delay_ms"));
    }

    #[test]
    fn test_zero_multiplier_is_accepted() {
        let config = Config::from_toml_str("[retry]\nbackoff_multiplier = 0.0\n").unwrap();
        assert_eq!(config.retry.backoff_multiplier, 0.0);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (API_URL_ENV, "https://override.example.com"),
            (API_TOKEN_ENV, "sk_test"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.store.base_url, "https://override.example.com");
        assert_eq!(config.store.token.as_deref(), Some("sk_test"));
    }

    #[test]
    fn test_empty_overrides_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|_| Some(String::new()));

        assert_eq!(config.store, StoreConfig::default());
    }
}
