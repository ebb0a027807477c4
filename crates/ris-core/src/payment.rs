//! # Payment Encoder
//!
//! Turns `{payment type, raw credential}` into the payment fields of a
//! request. The raw credential never reaches the registry unless hash
//! encoding has been switched off explicitly.
//!
//! ## Decision Table
//! ```text
//! ┌──────────────────┬──────────────┬──────────────────────────────────────┐
//! │ Entry point      │ PENC         │ PTOK written                         │
//! ├──────────────────┼──────────────┼──────────────────────────────────────┤
//! │ apply_payment    │ KHASH        │ KHASH digest (gift: MERC + suffix)   │
//! │ apply_payment    │ anything else│ raw credential                       │
//! │ apply_payment    │ (NONE type)  │ empty                                │
//! │ apply_masked_card│ set to MASK  │ 411111XXXXXX1111                     │
//! └──────────────────┴──────────────┴──────────────────────────────────────┘
//!
//! LAST4 is derived from the credential only when the caller has not set it.
//! ```

use crate::error::{CoreError, CoreResult};
use crate::khash::{trailing_chars, Khash, BIN_PREFIX_LEN};
use crate::registry::{keys, FieldRegistry};
use crate::types::PaymentType;

/// `PENC` value selecting KHASH encoding of `PTOK`.
pub const KHASH_ENCODING: &str = "KHASH";

/// `PENC` value marking a masked card number in `PTOK`.
pub const MASK_ENCODING: &str = "MASK";

/// Characters kept in clear at the end of a masked token.
pub const MASK_SUFFIX_LEN: usize = 4;

const LAST4_LEN: usize = 4;
const MASK_CHAR: char = 'X';

/// Writes payment fields into a [`FieldRegistry`].
#[derive(Debug, Clone)]
pub struct PaymentEncoder {
    khash: Khash,
}

impl PaymentEncoder {
    pub fn new(khash: Khash) -> Self {
        PaymentEncoder { khash }
    }

    /// Resolves `payment_type` and stores the credential in its encoded form.
    ///
    /// ## Errors
    /// - [`CoreError::MissingMerchantId`] when a gift card is KHASH-encoded
    ///   and `MERC` is absent or not numeric
    pub fn apply_payment(
        &self,
        registry: &mut FieldRegistry,
        payment_type: PaymentType,
        credential: &str,
    ) -> CoreResult<()> {
        registry.insert(keys::PTYP, payment_type.code());

        if payment_type == PaymentType::None {
            registry.insert(keys::PTOK, "");
            return Ok(());
        }

        if !credential.is_empty() && !registry.contains(keys::LAST4) {
            registry.insert(keys::LAST4, trailing_chars(credential, LAST4_LEN));
        }

        let token = if credential.is_empty() || !is_khash_encoded(registry) {
            credential.to_string()
        } else if payment_type == PaymentType::GiftCard {
            let merchant_id = merchant_id(registry).ok_or(CoreError::MissingMerchantId)?;
            self.khash.hash_gift_card(merchant_id, credential)
        } else {
            self.khash.hash_payment_token(credential)
        };

        registry.insert(keys::PTOK, token);
        Ok(())
    }

    /// String-typed variant of [`apply_payment`](Self::apply_payment).
    pub fn apply_payment_code(
        &self,
        registry: &mut FieldRegistry,
        code: &str,
        credential: &str,
    ) -> CoreResult<()> {
        let payment_type = code.parse::<PaymentType>()?;
        self.apply_payment(registry, payment_type, credential)
    }

    /// Stores a masked card number and flags the payment as masked.
    pub fn apply_masked_card(&self, registry: &mut FieldRegistry, card_number: &str) {
        registry.insert(keys::PTYP, PaymentType::Card.code());
        registry.insert(keys::PENC, MASK_ENCODING);

        if !card_number.is_empty() && !registry.contains(keys::LAST4) {
            registry.insert(keys::LAST4, trailing_chars(card_number, LAST4_LEN));
        }

        registry.insert(keys::PTOK, mask_token(card_number));
    }
}

/// Keeps the first six and last four characters, replacing the rest with `X`.
///
/// Tokens of ten characters or fewer have nothing between the two kept
/// ranges and come back unchanged.
///
/// ```rust
/// use ris_core::payment::mask_token;
///
/// assert_eq!(mask_token("0007380568572514"), "000738XXXXXX2514");
/// ```
pub fn mask_token(token: &str) -> String {
    let len = token.chars().count();
    let keep_from = len.saturating_sub(MASK_SUFFIX_LEN);
    token
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if i < BIN_PREFIX_LEN || i >= keep_from {
                c
            } else {
                MASK_CHAR
            }
        })
        .collect()
}

fn is_khash_encoded(registry: &FieldRegistry) -> bool {
    registry.get_text(keys::PENC).as_deref() == Some(KHASH_ENCODING)
}

fn merchant_id(registry: &FieldRegistry) -> Option<u32> {
    registry.get_text(keys::MERC)?.trim().parse().ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::khash::ConfigKey;
    use proptest::prelude::*;

    fn encoder() -> PaymentEncoder {
        PaymentEncoder::new(Khash::new(ConfigKey::new("RIS sample salt for unit tests").unwrap()))
    }

    fn khash_registry() -> FieldRegistry {
        let mut registry = FieldRegistry::new();
        registry.insert(keys::MERC, 666666u32);
        registry.insert(keys::PENC, KHASH_ENCODING);
        registry
    }

    #[test]
    fn test_card_payment_is_hashed() {
        let mut registry = khash_registry();
        encoder()
            .apply_payment(&mut registry, PaymentType::Card, "4111111111111111")
            .unwrap();

        assert_eq!(registry.get_text(keys::PTYP).as_deref(), Some("CARD"));
        assert_eq!(registry.get_text(keys::PTOK).as_deref(), Some("4111113PAS7BP5E4JVNZ"));
        assert_eq!(registry.get_text(keys::LAST4).as_deref(), Some("1111"));
    }

    #[test]
    fn test_gift_card_uses_merchant_prefix() {
        let mut registry = khash_registry();
        encoder()
            .apply_payment(&mut registry, PaymentType::GiftCard, "5199185454061655")
            .unwrap();

        assert_eq!(registry.get_text(keys::PTYP).as_deref(), Some("GIFT"));
        assert_eq!(registry.get_text(keys::PTOK).as_deref(), Some("666666XX1Z5NSXS6IE8H"));
    }

    #[test]
    fn test_gift_card_without_merchant_fails() {
        let mut registry = FieldRegistry::new();
        registry.insert(keys::PENC, KHASH_ENCODING);
        let err = encoder()
            .apply_payment(&mut registry, PaymentType::GiftCard, "5199185454061655")
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingMerchantId));
    }

    #[test]
    fn test_raw_passthrough_when_not_hashing() {
        let mut registry = FieldRegistry::new();
        encoder()
            .apply_payment(&mut registry, PaymentType::Paypal, "paypal-account-id")
            .unwrap();

        assert_eq!(registry.get_text(keys::PTYP).as_deref(), Some("PYPL"));
        assert_eq!(registry.get_text(keys::PTOK).as_deref(), Some("paypal-account-id"));
        assert_eq!(registry.get_text(keys::LAST4).as_deref(), Some("t-id"));
    }

    #[test]
    fn test_preset_last4_is_never_overwritten() {
        let mut registry = khash_registry();
        registry.insert(keys::LAST4, "9999");
        let encoder = encoder();
        encoder
            .apply_payment(&mut registry, PaymentType::Card, "4111111111111111")
            .unwrap();
        encoder.apply_masked_card(&mut registry, "5199185454061655");

        assert_eq!(registry.get_text(keys::LAST4).as_deref(), Some("9999"));
    }

    #[test]
    fn test_short_credential_last4_is_whole_credential() {
        let mut registry = FieldRegistry::new();
        encoder()
            .apply_payment(&mut registry, PaymentType::Check, "123")
            .unwrap();
        assert_eq!(registry.get_text(keys::LAST4).as_deref(), Some("123"));
    }

    #[test]
    fn test_no_payment_writes_empty_token() {
        let mut registry = khash_registry();
        encoder()
            .apply_payment(&mut registry, PaymentType::None, "ignored")
            .unwrap();

        assert_eq!(registry.get_text(keys::PTYP).as_deref(), Some("NONE"));
        assert_eq!(registry.get_text(keys::PTOK).as_deref(), Some(""));
        assert!(!registry.contains(keys::LAST4));
    }

    #[test]
    fn test_empty_credential_is_not_hashed() {
        let mut registry = khash_registry();
        encoder()
            .apply_payment(&mut registry, PaymentType::Card, "")
            .unwrap();
        assert_eq!(registry.get_text(keys::PTOK).as_deref(), Some(""));
        assert!(!registry.contains(keys::LAST4));
    }

    #[test]
    fn test_payment_code_entry_point() {
        let mut registry = khash_registry();
        let encoder = encoder();
        encoder
            .apply_payment_code(&mut registry, "CARD", "4111111111111111")
            .unwrap();
        assert_eq!(registry.get_text(keys::PTOK).as_deref(), Some("4111113PAS7BP5E4JVNZ"));

        let err = encoder
            .apply_payment_code(&mut registry, "BITCOIN", "x")
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownPaymentType(code) if code == "BITCOIN"));
    }

    #[test]
    fn test_masked_card() {
        let mut registry = khash_registry();
        encoder().apply_masked_card(&mut registry, "0007380568572514");

        assert_eq!(registry.get_text(keys::PTYP).as_deref(), Some("CARD"));
        assert_eq!(registry.get_text(keys::PENC).as_deref(), Some("MASK"));
        assert_eq!(registry.get_text(keys::PTOK).as_deref(), Some("000738XXXXXX2514"));
        assert_eq!(registry.get_text(keys::LAST4).as_deref(), Some("2514"));
    }

    #[test]
    fn test_payment_after_mask_keeps_mask_encoding() {
        let mut registry = khash_registry();
        let encoder = encoder();
        encoder.apply_masked_card(&mut registry, "0007380568572514");
        encoder
            .apply_payment(&mut registry, PaymentType::Card, "4111111111111111")
            .unwrap();

        // PENC is still MASK, so the credential is stored as given
        assert_eq!(registry.get_text(keys::PENC).as_deref(), Some("MASK"));
        assert_eq!(registry.get_text(keys::PTOK).as_deref(), Some("4111111111111111"));
    }

    #[test]
    fn test_mask_short_tokens_unchanged() {
        assert_eq!(mask_token(""), "");
        assert_eq!(mask_token("123456"), "123456");
        assert_eq!(mask_token("1234567890"), "1234567890");
        assert_eq!(mask_token("12345678901"), "123456X8901");
    }

    proptest! {
        #[test]
        fn prop_mask_invariant(token in "[0-9]{10,24}") {
            let masked = mask_token(&token);
            let len = token.len();
            prop_assert_eq!(masked.len(), len);
            prop_assert_eq!(&masked[..6], &token[..6]);
            prop_assert_eq!(&masked[len - 4..], &token[len - 4..]);
            prop_assert!(masked[6..len - 4].chars().all(|c| c == 'X'));
        }
    }
}
