//! # KHASH Payment Token Hashing
//!
//! One-way, salted, BIN-preserving transform applied to payment credentials
//! before they leave the merchant's process.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  token = "4111111111111111"                                             │
//! │                                                                         │
//! │  prefix  = first 6 characters            "411111"  (BIN, kept in clear) │
//! │                                                                         │
//! │  digest  = SHA-1( token + "." + config_key )                            │
//! │  hex     = uppercase hex of digest       "A1B2C3D4E5F6..." (40 chars)   │
//! │                                                                         │
//! │  for i in 0, 2, 4, ... 26:               (14 windows)                   │
//! │      n = hex[i .. i+7] as integer                                       │
//! │      out += ALPHABET[n % 36]             "0-9A-Z"                       │
//! │                                                                         │
//! │  KHASH = prefix + out                    20 characters for a card       │
//! │                                                                         │
//! │  Gift cards: the decimal merchant id replaces the 6-character prefix.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Config Key Lifecycle
//! The config key is an explicit, immutable value. It is decoded once when
//! the SDK is configured and shared by every [`Khash`] built from it. A
//! `Khash` cannot exist without a non-empty key.

use std::fmt;
use std::sync::Arc;

use sha1::{Digest, Sha1};

use crate::base85;
use crate::error::{CoreError, CoreResult};

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Characters of the raw token kept verbatim in front of the hash.
pub const BIN_PREFIX_LEN: usize = 6;

/// Characters appended after the prefix.
pub const SUFFIX_LEN: usize = 14;

const WINDOW_NIBBLES: usize = 7;
const WINDOW_STEP: usize = 2;

// =============================================================================
// Config Key
// =============================================================================

/// Decoded shared secret used as salt by the KHASH scheme.
///
/// Every hash depends on its exact value, so it is immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct ConfigKey(Arc<str>);

impl ConfigKey {
    /// Wraps an already-decoded key.
    pub fn new(plain: impl Into<String>) -> CoreResult<Self> {
        let plain = plain.into();
        if plain.is_empty() {
            return Err(CoreError::EmptyConfigKey);
        }
        Ok(ConfigKey(Arc::from(plain)))
    }

    /// Decodes the Base85 form merchants receive from RIS.
    pub fn from_base85(encoded: &str) -> CoreResult<Self> {
        let bytes = base85::decode(encoded.trim())?;
        let plain = String::from_utf8(bytes).map_err(|_| CoreError::ConfigKeyNotUtf8)?;
        ConfigKey::new(plain)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConfigKey(<redacted>)")
    }
}

// =============================================================================
// Hasher
// =============================================================================

/// KHASH token hasher bound to one config key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Khash {
    key: ConfigKey,
}

impl Khash {
    pub fn new(key: ConfigKey) -> Self {
        Khash { key }
    }

    pub fn config_key(&self) -> &ConfigKey {
        &self.key
    }

    /// Hashes a payment token, keeping its first six characters (the BIN).
    ///
    /// ## Example
    /// ```rust
    /// use ris_core::khash::{ConfigKey, Khash};
    ///
    /// let khash = Khash::new(ConfigKey::new("RIS sample salt for unit tests").unwrap());
    /// assert_eq!(khash.hash_payment_token("4111111111111111"), "4111113PAS7BP5E4JVNZ");
    /// ```
    pub fn hash_payment_token(&self, token: &str) -> String {
        let prefix = leading_chars(token, BIN_PREFIX_LEN);
        let mut out = String::with_capacity(prefix.len() + SUFFIX_LEN);
        out.push_str(prefix);
        out.push_str(&self.hash(token));
        out
    }

    /// Hashes a gift card number; the merchant id takes the place of the BIN.
    pub fn hash_gift_card(&self, merchant_id: u32, card_number: &str) -> String {
        format!("{}{}", merchant_id, self.hash(card_number))
    }

    /// The 14-character salted suffix for `plain_text`.
    pub fn hash(&self, plain_text: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(plain_text.as_bytes());
        hasher.update(b".");
        hasher.update(self.key.as_str().as_bytes());
        let digest = hasher.finalize();

        // Hex digits of the digest, most significant nibble first
        let nibbles: Vec<u32> = digest
            .iter()
            .flat_map(|byte| [u32::from(byte >> 4), u32::from(byte & 0x0f)])
            .collect();

        (0..SUFFIX_LEN)
            .map(|i| {
                let start = i * WINDOW_STEP;
                let window = nibbles[start..start + WINDOW_NIBBLES]
                    .iter()
                    .fold(0u32, |acc, nibble| (acc << 4) | nibble);
                ALPHABET[(window % 36) as usize] as char
            })
            .collect()
    }
}

/// First `n` characters of `s` (all of `s` if shorter).
pub(crate) fn leading_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Last `n` characters of `s` (all of `s` if shorter).
pub(crate) fn trailing_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    match s.char_indices().nth(count - n) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
