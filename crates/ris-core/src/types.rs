//! # Domain Types
//!
//! Core domain types used throughout the RIS SDK.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Mode       │   │  PaymentType    │   │    CartItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Q P W J (inq)  │   │  CARD, GIFT,    │   │  product_type   │       │
//! │  │  U X (update)   │   │  PYPL, NONE...  │   │  item, desc     │       │
//! │  └─────────────────┘   └─────────────────┘   │  quantity,price │       │
//! │                                              └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Address      │   │    ShipType     │   │ RefundChargeback│       │
//! │  │  line1..country │   │  SD ND 2D ST    │   │  R | C          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// =============================================================================
// Mode
// =============================================================================

/// Single-character discriminator selecting the server-side processing
/// variant and the required-field subset of the rule table.
///
/// ## Mode Families
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  INQUIRY                               UPDATE                           │
/// │  ───────                               ──────                           │
/// │  Q  Default inquiry                    U  Update, no re-score           │
/// │  P  Phone order (no IP address)        X  Update and re-score           │
/// │  W  Kount Central full inquiry                                          │
/// │  J  Kount Central fast inquiry                                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Q,
    P,
    W,
    J,
    U,
    X,
}

impl Mode {
    /// The wire character for this mode.
    pub const fn as_char(self) -> char {
        match self {
            Mode::Q => 'Q',
            Mode::P => 'P',
            Mode::W => 'W',
            Mode::J => 'J',
            Mode::U => 'U',
            Mode::X => 'X',
        }
    }

    /// Returns true for the update family (U, X).
    pub const fn is_update(self) -> bool {
        matches!(self, Mode::U | Mode::X)
    }
}

impl TryFrom<char> for Mode {
    type Error = CoreError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'Q' => Ok(Mode::Q),
            'P' => Ok(Mode::P),
            'W' => Ok(Mode::W),
            'J' => Ok(Mode::J),
            'U' => Ok(Mode::U),
            'X' => Ok(Mode::X),
            other => Err(CoreError::UnknownMode(other.to_string())),
        }
    }
}

impl FromStr for Mode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Mode::try_from(c),
            _ => Err(CoreError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Modes an inquiry may run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InquiryMode {
    #[default]
    Q,
    P,
    W,
    J,
}

impl From<InquiryMode> for Mode {
    fn from(mode: InquiryMode) -> Self {
        match mode {
            InquiryMode::Q => Mode::Q,
            InquiryMode::P => Mode::P,
            InquiryMode::W => Mode::W,
            InquiryMode::J => Mode::J,
        }
    }
}

impl TryFrom<Mode> for InquiryMode {
    type Error = CoreError;

    fn try_from(mode: Mode) -> Result<Self, Self::Error> {
        match mode {
            Mode::Q => Ok(InquiryMode::Q),
            Mode::P => Ok(InquiryMode::P),
            Mode::W => Ok(InquiryMode::W),
            Mode::J => Ok(InquiryMode::J),
            other => Err(CoreError::UnknownMode(other.to_string())),
        }
    }
}

/// Modes an update may run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    #[default]
    U,
    X,
}

impl From<UpdateMode> for Mode {
    fn from(mode: UpdateMode) -> Self {
        match mode {
            UpdateMode::U => Mode::U,
            UpdateMode::X => Mode::X,
        }
    }
}

// =============================================================================
// Payment Type
// =============================================================================

/// Payment methods known to RIS.
///
/// The mapping to wire codes is an exhaustive `match`, so adding a variant
/// without a code does not compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaymentType {
    Apple,
    BillMeLater,
    Bpay,
    Card,
    CarteBleue,
    Check,
    Elv,
    GreenDotMoneyPak,
    GiftCard,
    GiroPay,
    Google,
    Interac,
    MercadePago,
    Neteller,
    None,
    Poli,
    Paypal,
    Sepa,
    Skrill,
    Sofort,
    Token,
}

impl PaymentType {
    /// Every payment type, in code order.
    pub const ALL: [PaymentType; 21] = [
        PaymentType::Apple,
        PaymentType::BillMeLater,
        PaymentType::Bpay,
        PaymentType::Card,
        PaymentType::CarteBleue,
        PaymentType::Check,
        PaymentType::Elv,
        PaymentType::GreenDotMoneyPak,
        PaymentType::GiftCard,
        PaymentType::GiroPay,
        PaymentType::Google,
        PaymentType::Interac,
        PaymentType::MercadePago,
        PaymentType::Neteller,
        PaymentType::None,
        PaymentType::Poli,
        PaymentType::Paypal,
        PaymentType::Sepa,
        PaymentType::Skrill,
        PaymentType::Sofort,
        PaymentType::Token,
    ];

    /// The `PTYP` code sent to RIS.
    pub const fn code(self) -> &'static str {
        match self {
            PaymentType::Apple => "APAY",
            PaymentType::BillMeLater => "BLML",
            PaymentType::Bpay => "BPAY",
            PaymentType::Card => "CARD",
            PaymentType::CarteBleue => "CARTE_BLEUE",
            PaymentType::Check => "CHEK",
            PaymentType::Elv => "ELV",
            PaymentType::GreenDotMoneyPak => "GDMP",
            PaymentType::GiftCard => "GIFT",
            PaymentType::GiroPay => "GIROPAY",
            PaymentType::Google => "GOOG",
            PaymentType::Interac => "INTERAC",
            PaymentType::MercadePago => "MERCADE_PAGO",
            PaymentType::Neteller => "NETELLER",
            PaymentType::None => "NONE",
            PaymentType::Poli => "POLI",
            PaymentType::Paypal => "PYPL",
            PaymentType::Sepa => "SEPA",
            PaymentType::Skrill => "SKRILL",
            PaymentType::Sofort => "SOFORT",
            PaymentType::Token => "TOKEN",
        }
    }
}

impl FromStr for PaymentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentType::ALL
            .into_iter()
            .find(|ptyp| ptyp.code() == s)
            .ok_or_else(|| CoreError::UnknownPaymentType(s.to_string()))
    }
}

impl TryFrom<String> for PaymentType {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PaymentType> for String {
    fn from(ptyp: PaymentType) -> Self {
        ptyp.code().to_string()
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// One product line of an order.
///
/// Expanded at set-time into five indexed fields:
/// `PROD_TYPE[i]`, `PROD_ITEM[i]`, `PROD_DESC[i]`, `PROD_QUANT[i]`, `PROD_PRICE[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// High-level category, e.g. `SPORTING_GOODS`.
    pub product_type: String,

    /// Merchant item code / SKU.
    pub item: String,

    pub description: String,

    pub quantity: i64,

    /// Unit price in the smallest currency unit (cents).
    pub price: i64,
}

impl CartItem {
    pub fn new(
        product_type: impl Into<String>,
        item: impl Into<String>,
        description: impl Into<String>,
        quantity: i64,
        price: i64,
    ) -> Self {
        CartItem {
            product_type: product_type.into(),
            item: item.into(),
            description: description.into(),
            quantity,
            price,
        }
    }
}

// =============================================================================
// Address
// =============================================================================

/// Billing or shipping address block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code.
    #[serde(default)]
    pub country: String,
    /// Building / premise, sent only when present.
    #[serde(default)]
    pub premise: Option<String>,
    /// Street name without house number, sent only when present.
    #[serde(default)]
    pub street: Option<String>,
}

// =============================================================================
// Small enumerations
// =============================================================================

/// Shipping speed (`SHTP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipType {
    /// Same day.
    #[serde(rename = "SD")]
    SameDay,
    /// Next day.
    #[serde(rename = "ND")]
    NextDay,
    /// Second day.
    #[serde(rename = "2D")]
    SecondDay,
    /// Standard.
    #[serde(rename = "ST")]
    Standard,
}

impl ShipType {
    pub const fn code(self) -> &'static str {
        match self {
            ShipType::SameDay => "SD",
            ShipType::NextDay => "ND",
            ShipType::SecondDay => "2D",
            ShipType::Standard => "ST",
        }
    }
}

/// Update-only flag telling RIS the order was refunded or charged back (`RFCB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundChargeback {
    #[serde(rename = "R")]
    Refund,
    #[serde(rename = "C")]
    Chargeback,
}

impl RefundChargeback {
    pub const fn as_char(self) -> char {
        match self {
            RefundChargeback::Refund => 'R',
            RefundChargeback::Chargeback => 'C',
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_char_round_trip() {
        for c in ['Q', 'P', 'W', 'J', 'U', 'X'] {
            assert_eq!(Mode::try_from(c).unwrap().as_char(), c);
        }
        assert!(matches!(Mode::try_from('Z'), Err(CoreError::UnknownMode(m)) if m == "Z"));
        assert_eq!("X".parse::<Mode>().unwrap(), Mode::X);
        assert!("QQ".parse::<Mode>().is_err());
        assert!("".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_families() {
        assert!(Mode::from(UpdateMode::X).is_update());
        assert!(!Mode::from(InquiryMode::P).is_update());
        assert_eq!(Mode::from(InquiryMode::default()), Mode::Q);
        assert_eq!(Mode::from(UpdateMode::default()), Mode::U);
        assert_eq!(InquiryMode::try_from(Mode::W).unwrap(), InquiryMode::W);
        assert!(InquiryMode::try_from(Mode::X).is_err());
    }

    #[test]
    fn test_payment_type_codes() {
        assert_eq!(PaymentType::Card.code(), "CARD");
        assert_eq!(PaymentType::GiftCard.code(), "GIFT");
        assert_eq!(PaymentType::Paypal.code(), "PYPL");
        assert_eq!(PaymentType::Check.code(), "CHEK");
        assert_eq!(PaymentType::Sepa.code(), "SEPA");
    }

    #[test]
    fn test_payment_type_parse() {
        for ptyp in PaymentType::ALL {
            assert_eq!(ptyp.code().parse::<PaymentType>().unwrap(), ptyp);
        }
        let err = "BITCOIN".parse::<PaymentType>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownPaymentType(code) if code == "BITCOIN"));
    }

    #[test]
    fn test_payment_type_serde_uses_codes() {
        let json = serde_json::to_string(&PaymentType::GreenDotMoneyPak).unwrap();
        assert_eq!(json, "\"GDMP\"");
        let parsed: PaymentType = serde_json::from_str("\"MERCADE_PAGO\"").unwrap();
        assert_eq!(parsed, PaymentType::MercadePago);
        assert!(serde_json::from_str::<PaymentType>("\"VENMO\"").is_err());
    }

    #[test]
    fn test_ship_type_codes() {
        assert_eq!(ShipType::SecondDay.code(), "2D");
        let parsed: ShipType = serde_json::from_str("\"ND\"").unwrap();
        assert_eq!(parsed, ShipType::NextDay);
    }
}
