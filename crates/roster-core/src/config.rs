//! Configuration types for the roster sync service
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main roster configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Directory service configuration
    pub directory: DirectoryConfig,

    /// Member store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Webhook receiver configuration
    pub webhook: WebhookConfig,

    /// Optional reconciliation settings
    #[serde(default)]
    pub sync: SyncConfig,
}

impl RosterConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.directory.validate()?;
        self.store.validate()?;
        self.webhook.validate()?;
        self.sync.validate()?;
        Ok(())
    }
}

/// Directory service configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// API credential (bearer token)
    pub api_token: String,

    /// Base URL override (e.g. for a mock or a proxy)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Members requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl DirectoryConfig {
    /// Create a directory configuration with default paging
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: None,
            page_size: default_page_size(),
        }
    }

    /// Point the client at a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Validate the directory configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_token.is_empty() {
            return Err(crate::Error::config("Directory API token cannot be empty"));
        }
        if let Some(url) = &self.base_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "Directory base URL must use HTTP or HTTPS scheme. Got: {}",
                url
            )));
        }
        if self.page_size == 0 || self.page_size > 1000 {
            return Err(crate::Error::config(format!(
                "Directory page size must be between 1 and 1000. Got: {}",
                self.page_size
            )));
        }
        Ok(())
    }
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// Member store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// File-based member store
    File {
        /// Path to the member file
        path: String,
    },

    /// In-memory member store (not persistent)
    #[default]
    Memory,
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("Member store path cannot be empty"))
            }
            _ => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::File { .. } => "file",
            StoreConfig::Memory => "memory",
        }
    }
}

/// Webhook receiver configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Token every inbound envelope must carry
    pub verification_token: String,
}

impl WebhookConfig {
    /// Validate the webhook configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.verification_token.is_empty() {
            return Err(crate::Error::config(
                "Webhook verification token cannot be empty",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("verification_token", &"<REDACTED>")
            .finish()
    }
}

/// Reconciliation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Time bound for one directory fetch (in milliseconds)
    ///
    /// Expiry counts as a failed attempt.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Fixed part of the delay between attempts (in milliseconds)
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Upper bound of the random part of the delay (in milliseconds)
    ///
    /// Set to 0 to disable jitter.
    #[serde(default = "default_retry_jitter_ms")]
    pub retry_jitter_ms: u64,

    /// Capacity of the sync event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SyncConfig {
    /// Validate the sync configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.fetch_timeout_ms == 0 {
            return Err(crate::Error::config("Fetch timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: default_fetch_timeout_ms(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_jitter_ms: default_retry_jitter_ms(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_page_size() -> u32 {
    200
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_retry_base_delay_ms() -> u64 {
    1_000
}

fn default_retry_jitter_ms() -> u64 {
    1_000
}

fn default_event_channel_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> RosterConfig {
        RosterConfig {
            directory: DirectoryConfig::new("xoxb-test"),
            store: StoreConfig::Memory,
            webhook: WebhookConfig {
                verification_token: "verify-me".to_string(),
            },
            sync: SyncConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let mut config = valid_config();
        config.directory.api_token.clear();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.webhook.verification_token.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_url_scheme() {
        let mut config = valid_config();
        config.directory = DirectoryConfig::new("xoxb-test").with_base_url("ftp://example.com");
        assert!(config.validate().is_err());

        config.directory = DirectoryConfig::new("xoxb-test").with_base_url("http://127.0.0.1:8081");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sync_defaults() {
        let sync: SyncConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(sync.fetch_timeout_ms, 10_000);
        assert_eq!(sync.retry_base_delay_ms, 1_000);
        assert_eq!(sync.retry_jitter_ms, 1_000);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = valid_config();
        config.sync.fetch_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_config_tagged() {
        let store: StoreConfig =
            serde_json::from_str(r#"{"type": "file", "path": "/tmp/roster.json"}"#).unwrap();
        assert_eq!(store.type_name(), "file");
        assert!(store.validate().is_ok());

        let empty = StoreConfig::File {
            path: String::new(),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_secrets_not_exposed_in_debug() {
        let debug_str = format!("{:?}", valid_config());
        assert!(!debug_str.contains("xoxb-test"));
        assert!(!debug_str.contains("verify-me"));
    }
}
