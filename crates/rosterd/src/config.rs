// Environment-variable configuration for rosterd
//
// Variables are read once at startup. Anything missing or malformed is a
// configuration error and the process exits with code 1.

use anyhow::{Context, Result};
use roster_core::config::{DirectoryConfig, RosterConfig, StoreConfig, SyncConfig, WebhookConfig};
use std::str::FromStr;

/// Application configuration
pub struct Config {
    pub directory_token: String,
    pub directory_url: Option<String>,
    pub page_size: u32,
    pub verification_token: String,
    pub store_type: String,
    pub store_path: String,
    pub port: u16,
    pub fetch_timeout_secs: u64,
    pub retry_delay_ms: u64,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            directory_token: lookup("ROSTER_DIRECTORY_TOKEN")
                .context("ROSTER_DIRECTORY_TOKEN is required")?,
            directory_url: lookup("ROSTER_DIRECTORY_URL").filter(|url| !url.is_empty()),
            page_size: parse_or(&lookup, "ROSTER_DIRECTORY_PAGE_SIZE", 200)?,
            verification_token: lookup("ROSTER_VERIFICATION_TOKEN")
                .context("ROSTER_VERIFICATION_TOKEN is required")?,
            store_type: lookup("ROSTER_STORE_TYPE").unwrap_or_else(|| "file".to_string()),
            store_path: lookup("ROSTER_STORE_PATH").unwrap_or_else(|| "roster.json".to_string()),
            port: parse_or(&lookup, "ROSTER_PORT", 3000)?,
            fetch_timeout_secs: parse_or(&lookup, "ROSTER_FETCH_TIMEOUT_SECS", 10)?,
            retry_delay_ms: parse_or(&lookup, "ROSTER_RETRY_DELAY_MS", 1000)?,
            log_level: lookup("ROSTER_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.directory_token.is_empty() {
            anyhow::bail!(
                "ROSTER_DIRECTORY_TOKEN is required. \
                Set it via: export ROSTER_DIRECTORY_TOKEN=xoxb-..."
            );
        }

        if self.verification_token.is_empty() {
            anyhow::bail!(
                "ROSTER_VERIFICATION_TOKEN is required. \
                Copy it from the app's event subscription settings."
            );
        }

        match self.store_type.as_str() {
            "file" | "memory" => {}
            _ => anyhow::bail!(
                "ROSTER_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.store_type
            ),
        }

        if self.store_type == "file" && self.store_path.is_empty() {
            anyhow::bail!("ROSTER_STORE_PATH cannot be empty when ROSTER_STORE_TYPE=file");
        }

        if let Some(url) = &self.directory_url
            && url.starts_with("http://")
        {
            eprintln!(
                "WARNING: ROSTER_DIRECTORY_URL uses HTTP (not HTTPS). \
                The directory token will be sent in clear text."
            );
        }

        if self.port == 0 {
            anyhow::bail!("ROSTER_PORT must be between 1 and 65535");
        }

        if !(1..=300).contains(&self.fetch_timeout_secs) {
            anyhow::bail!(
                "ROSTER_FETCH_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.fetch_timeout_secs
            );
        }

        if self.retry_delay_ms > 600_000 {
            anyhow::bail!(
                "ROSTER_RETRY_DELAY_MS must be at most 600000. Got: {}",
                self.retry_delay_ms
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "ROSTER_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        // Library-level checks (URL scheme, page size bounds)
        self.roster_config().validate()?;

        Ok(())
    }

    /// Translate into the library configuration
    pub fn roster_config(&self) -> RosterConfig {
        let store = match self.store_type.as_str() {
            "memory" => StoreConfig::Memory,
            _ => StoreConfig::File {
                path: self.store_path.clone(),
            },
        };

        RosterConfig {
            directory: DirectoryConfig {
                api_token: self.directory_token.clone(),
                base_url: self.directory_url.clone(),
                page_size: self.page_size,
            },
            store,
            webhook: WebhookConfig {
                verification_token: self.verification_token.clone(),
            },
            sync: SyncConfig {
                fetch_timeout_ms: self.fetch_timeout_secs * 1000,
                retry_base_delay_ms: self.retry_delay_ms,
                ..SyncConfig::default()
            },
        }
    }
}

// Custom Debug implementation that hides both tokens
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("directory_token", &"<REDACTED>")
            .field("directory_url", &self.directory_url)
            .field("page_size", &self.page_size)
            .field("verification_token", &"<REDACTED>")
            .field("store_type", &self.store_type)
            .field("store_path", &self.store_path)
            .field("port", &self.port)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: '{}'", key, raw)),
        None => Ok(default),
    }
}
