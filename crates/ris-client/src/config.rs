//! # Client Configuration
//!
//! Connection and credential settings for talking to RIS.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     RIS_MERCHANT_ID=999666                                              │
//! │     RIS_CONFIG_KEY=...                                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/sdk/ris.toml (Linux)                                      │
//! │     ~/Library/Application Support/com.ris.sdk/ris.toml (macOS)          │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     timeout 10000 ms, version 0700                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # ris.toml
//! [merchant]
//! id = 999666
//! config_key = "..."           # Base85, exactly as issued
//!
//! [server]
//! url = "https://risk.test.kount.net"
//! connect_timeout_ms = 10000
//! version = "0700"
//!
//! [auth]
//! api_key = "..."              # or certificate_file + private_key_password
//!
//! [logging]
//! log_elapsed = true
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

/// Environment variables read by [`RisConfig::load`].
pub mod env {
    pub const MERCHANT_ID: &str = "RIS_MERCHANT_ID";
    pub const URL: &str = "RIS_URL";
    pub const CONFIG_KEY: &str = "RIS_CONFIG_KEY";
    pub const CONNECT_TIMEOUT: &str = "RIS_CONNECT_TIMEOUT";
    pub const VERSION: &str = "RIS_VERSION";
    pub const API_KEY: &str = "RIS_API_KEY";
    pub const CERTIFICATE_FILE: &str = "RIS_CERTIFICATE_FILE";
    pub const PRIVATE_KEY_PASSWORD: &str = "RIS_PRIVATE_KEY_PASSWORD";
    pub const LOG_ELAPSED: &str = "RIS_LOG_ELAPSED";
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct MerchantSettings {
    /// Six-digit merchant id issued by Kount.
    #[serde(default)]
    pub id: Option<u32>,

    /// Base85-encoded KHASH config key.
    #[serde(default)]
    pub config_key: Option<String>,
}

impl fmt::Debug for MerchantSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantSettings")
            .field("id", &self.id)
            .field("config_key", &self.config_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// RIS endpoint.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// RIS protocol version (`VERS`).
    #[serde(default = "default_version")]
    pub version: String,

    /// Set to false to skip the URL and credential checks in
    /// [`RisConfig::validate`].
    #[serde(default = "default_true")]
    pub check_config: bool,
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_version() -> String {
    ris_core::request::DEFAULT_VERSION.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: None,
            connect_timeout_ms: default_connect_timeout(),
            version: default_version(),
            check_config: true,
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthSettings {
    /// API key sent as `X-Kount-Api-Key`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Client certificate (PKCS#12) for certificate authentication.
    #[serde(default)]
    pub certificate_file: Option<PathBuf>,

    #[serde(default)]
    pub private_key_password: Option<String>,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("certificate_file", &self.certificate_file)
            .field(
                "private_key_password",
                &self.private_key_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log the transport round-trip time of each request.
    #[serde(default)]
    pub log_elapsed: bool,
}

// =============================================================================
// RisConfig
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RisConfig {
    #[serde(default)]
    pub merchant: MerchantSettings,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl RisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (ris.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading RIS config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> ClientResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "RIS config saved");
        Ok(())
    }

    /// Checks that the configuration can build a client.
    ///
    /// Merchant id and config key are always required. URL and credentials
    /// are checked unless `server.check_config` is false.
    pub fn validate(&self) -> ClientResult<()> {
        let merchant_id = self.merchant.id.ok_or(ClientError::MissingConfig("merchant.id"))?;
        if !(100_000..=999_999).contains(&merchant_id) {
            return Err(ClientError::InvalidConfig(format!(
                "merchant id must have six digits, got: {}",
                merchant_id
            )));
        }

        match self.merchant.config_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => return Err(ClientError::MissingConfig("merchant.config_key")),
        }

        if !self.server.check_config {
            return Ok(());
        }

        let url = self.server.url.as_deref().ok_or(ClientError::MissingConfig("server.url"))?;
        let parsed = url::Url::parse(url)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ClientError::InvalidConfig(format!(
                "RIS URL must start with http:// or https://, got: {}",
                url
            )));
        }

        if self.server.connect_timeout_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "connect_timeout_ms must be greater than 0".into(),
            ));
        }

        let has_api_key = self.auth.api_key.as_deref().map_or(false, |k| !k.is_empty());
        let has_certificate =
            self.auth.certificate_file.is_some() && self.auth.private_key_password.is_some();
        if !has_api_key && !has_certificate {
            return Err(ClientError::MissingConfig("auth.api_key"));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides from `lookup`, keyed by the names in [`env`].
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup(env::MERCHANT_ID) {
            match id.trim().parse::<u32>() {
                Ok(parsed) => {
                    debug!(merchant_id = parsed, "Overriding merchant id from environment");
                    self.merchant.id = Some(parsed);
                }
                Err(_) => warn!(value = %id, "Ignoring non-numeric merchant id in environment"),
            }
        }

        if let Some(url) = lookup(env::URL) {
            debug!(url = %url, "Overriding RIS URL from environment");
            self.server.url = Some(url);
        }

        if let Some(key) = lookup(env::CONFIG_KEY) {
            debug!("Overriding config key from environment");
            self.merchant.config_key = Some(key);
        }

        if let Some(timeout) = lookup(env::CONNECT_TIMEOUT) {
            if let Ok(ms) = timeout.trim().parse::<u64>() {
                self.server.connect_timeout_ms = ms;
            }
        }

        if let Some(version) = lookup(env::VERSION) {
            self.server.version = version;
        }

        if let Some(api_key) = lookup(env::API_KEY) {
            self.auth.api_key = Some(api_key);
        }

        if let Some(file) = lookup(env::CERTIFICATE_FILE) {
            self.auth.certificate_file = Some(PathBuf::from(file));
        }

        if let Some(password) = lookup(env::PRIVATE_KEY_PASSWORD) {
            self.auth.private_key_password = Some(password);
        }

        if let Some(flag) = lookup(env::LOG_ELAPSED) {
            match flag.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => self.logging.log_elapsed = true,
                "false" | "0" | "no" => self.logging.log_elapsed = false,
                _ => warn!(value = %flag, "Unknown log-elapsed flag in environment"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "ris", "sdk")
            .map(|dirs| dirs.config_dir().join("ris.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.server.connect_timeout_ms)
    }

    pub fn url(&self) -> Option<&str> {
        self.server.url.as_deref()
    }
}
