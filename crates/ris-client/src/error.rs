//! # Client Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │      Core       │  │       Transport         │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  MissingConfig  │  │  Validation     │  │  Transport(message)     │ │
//! │  │  InvalidConfig  │  │  Base85 / KHASH │  │                         │ │
//! │  │  ConfigLoad/Save│  │  UnknownMode    │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use ris_core::CoreError;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// A mandatory configuration parameter is absent.
    #[error("Missing configuration parameter: {0}")]
    MissingConfig(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Request Errors
    // =========================================================================
    /// Request preparation failed (validation, encoding, usage).
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The transport reported a failure while posting the request.
    #[error("Transport error: {0}")]
    Transport(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidConfig(format!("URL: {}", err))
    }
}

impl ClientError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::MissingConfig(_)
                | ClientError::InvalidConfig(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
                | ClientError::Core(CoreError::EmptyConfigKey)
                | ClientError::Core(CoreError::ConfigKeyNotUtf8)
                | ClientError::Core(CoreError::InvalidBase85Character { .. })
                | ClientError::Core(CoreError::MisplacedZeroBlock { .. })
                | ClientError::Core(CoreError::TrailingSingleCharacter)
        )
    }

    /// Validation errors, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&[ris_core::ValidationError]> {
        match self {
            ClientError::Core(CoreError::Validation(failure)) => Some(failure.errors()),
            _ => None,
        }
    }
}
