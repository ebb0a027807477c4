//! # Error Types
//!
//! Domain-specific error types for ris-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ris-core errors (this file)                                           │
//! │  ├── CoreError          - Usage and configuration errors (fatal)       │
//! │  ├── ValidationError    - One rule violation (collected)               │
//! │  └── ValidationFailure  - Aggregate of ValidationErrors                │
//! │                                                                         │
//! │  ris-client errors (separate crate)                                    │
//! │  └── ClientError        - Config loading, transport failures           │
//! │                                                                         │
//! │  Flow: ValidationError → ValidationFailure → CoreError → ClientError   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, value, pattern)
//! 3. Errors are enum variants, never String
//! 4. Validation errors are data: they are collected, never thrown one by one

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::types::Mode;

// =============================================================================
// Core Error
// =============================================================================

/// Usage and configuration errors.
///
/// Every variant is fatal for the call that produced it. Nothing in this
/// crate retries.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A payment type code string is not part of the RIS vocabulary.
    #[error("Unknown payment type: {0}")]
    UnknownPaymentType(String),

    /// A mode character is not one of Q, P, W, J, U, X.
    #[error("Unknown mode: {0:?}")]
    UnknownMode(String),

    /// Base85 input contains a character outside `'!'..='u'`.
    ///
    /// ## When This Occurs
    /// - Config key copied with stray punctuation (`~`, `{`, `|`)
    /// - Config key pasted into a quoted string with escapes left in
    #[error("Bad character {character:?} at offset {offset}: Base85 only allows '!' to 'u'")]
    InvalidBase85Character { character: char, offset: usize },

    /// The `z` shortcut appeared inside a partially read block.
    #[error("The character 'z' is invalid inside a Base85 block (offset {offset})")]
    MisplacedZeroBlock { offset: usize },

    /// The input ended with a single undecoded character.
    #[error("The last block of Base85 data cannot be a single character")]
    TrailingSingleCharacter,

    /// The decoded config key is empty.
    #[error("Config key is empty; it must be set before any payment token is hashed")]
    EmptyConfigKey,

    /// The decoded config key bytes are not UTF-8 text.
    #[error("Config key is not valid UTF-8 after Base85 decoding")]
    ConfigKeyNotUtf8,

    /// A gift card was hashed but no merchant id is present on the request.
    #[error("Gift card hashing requires MERC to be set")]
    MissingMerchantId,

    /// A rule row could not be turned into a usable rule.
    #[error("Invalid rule for {field}: {reason}")]
    InvalidRule { field: String, reason: String },

    /// The rule table document could not be parsed.
    #[error("Failed to parse rule table: {0}")]
    RuleTableParse(String),

    /// Validation failed under the fail-fast policy.
    #[error("Validation failed:\n{0}")]
    Validation(#[from] ValidationFailure),
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::RuleTableParse(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::RuleTableParse(err.to_string())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single rule violation found while checking the field registry.
///
/// Built fresh on every validation pass. The `Display` output is the exact
/// text RIS integrators are used to seeing in their logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// A field required for the active mode is absent.
    MissingRequired { field: String, mode: Mode },

    /// A present field does not fully match the rule's pattern.
    RegexMismatch {
        field: String,
        value: String,
        pattern: String,
    },

    /// A present field is longer than the rule's maximum.
    LengthExceeded {
        field: String,
        value: String,
        max: usize,
    },
}

impl ValidationError {
    /// Name of the offending field (indexed for cart fields, e.g. `PROD_ITEM[2]`).
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingRequired { field, .. }
            | ValidationError::RegexMismatch { field, .. }
            | ValidationError::LengthExceeded { field, .. } => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingRequired { field, mode } => {
                write!(f, "Required field [{}] missing for mode [{}]", field, mode)
            }
            ValidationError::RegexMismatch {
                field,
                value,
                pattern,
            } => write!(
                f,
                "Field [{}] has value [{}] which does not match the pattern [{}]",
                field, value, pattern
            ),
            ValidationError::LengthExceeded { field, value, max } => write!(
                f,
                "Field [{}] has length [{}] which is longer than the maximum of [{}]",
                field,
                value.chars().count(),
                max
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

// =============================================================================
// Validation Failure (aggregate)
// =============================================================================

/// Non-empty list of validation errors, in rule-table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    errors: Vec<ValidationError>,
}

impl ValidationFailure {
    /// Wraps a list of errors. Returns `None` when the list is empty, so a
    /// `ValidationFailure` always carries at least one error.
    pub fn new(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(ValidationFailure { errors })
        }
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MissingRequired {
            field: "SESS".to_string(),
            mode: Mode::Q,
        };
        assert_eq!(err.to_string(), "Required field [SESS] missing for mode [Q]");

        let err = ValidationError::LengthExceeded {
            field: "LAST4".to_string(),
            value: "123456".to_string(),
            max: 4,
        };
        assert_eq!(
            err.to_string(),
            "Field [LAST4] has length [6] which is longer than the maximum of [4]"
        );

        let err = ValidationError::RegexMismatch {
            field: "MACK".to_string(),
            value: "Q".to_string(),
            pattern: "^[YN]$".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Field [MACK] has value [Q] which does not match the pattern [^[YN]$]"
        );
    }

    #[test]
    fn test_validation_failure_requires_errors() {
        assert!(ValidationFailure::new(Vec::new()).is_none());

        let failure = ValidationFailure::new(vec![ValidationError::MissingRequired {
            field: "MERC".to_string(),
            mode: Mode::U,
        }])
        .unwrap();
        assert_eq!(failure.errors().len(), 1);
        assert_eq!(failure.to_string(), "Required field [MERC] missing for mode [U]\n");
    }

    #[test]
    fn test_validation_failure_converts_to_core_error() {
        let failure = ValidationFailure::new(vec![ValidationError::MissingRequired {
            field: "SITE".to_string(),
            mode: Mode::Q,
        }])
        .unwrap();
        let core_err: CoreError = failure.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_base85_error_messages() {
        let err = CoreError::InvalidBase85Character {
            character: '~',
            offset: 3,
        };
        assert_eq!(
            err.to_string(),
            "Bad character '~' at offset 3: Base85 only allows '!' to 'u'"
        );
    }
}
