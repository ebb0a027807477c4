//! # Request Orchestration
//!
//! Inquiry and update requests over one [`FieldRegistry`].
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   RequestContext (merchant, version, KHASH key, rules)   built once     │
//! │        │                                                                │
//! │        ├──► Request::inquiry(&ctx)   MODE=Q CURR=USD SDK PENC=KHASH     │
//! │        └──► Request::update(&ctx)    MODE=U PENC=KHASH                  │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │            setters (any order, last write wins)                         │
//! │            set_payment / set_masked_card_payment (last call wins)       │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │            prepare(policy)                                              │
//! │              1. PTOK empty + PENC=KHASH  →  PENC cleared                │
//! │              2. validate for current MODE                               │
//! │              3. FailFast: errors → Err(Validation)                      │
//! │                 CollectAndContinue: errors carried in PreparedRequest   │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │            PreparedRequest ──► form body for the transport              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `PTOK` is computed when the payment setter runs. Changing hash encoding
//! afterwards does not recompute it; call the payment setter again.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::error::{CoreError, CoreResult, ValidationError, ValidationFailure};
use crate::khash::Khash;
use crate::payment::{PaymentEncoder, KHASH_ENCODING};
use crate::registry::{keys, FieldRegistry, FieldValue};
use crate::rules::RuleSet;
use crate::types::{
    Address, CartItem, InquiryMode, Mode, PaymentType, RefundChargeback, ShipType, UpdateMode,
};
use crate::validation::{indexed_keys, validate};

/// RIS protocol version sent as `VERS` unless overridden.
pub const DEFAULT_VERSION: &str = "0700";

/// `SDK` field value identifying this SDK to RIS.
pub const SDK_NAME: &str = "RUST";

/// `SDK_VERSION` field value.
pub const SDK_VERSION: &str = concat!("Sdk-Ris-Rust-", env!("CARGO_PKG_VERSION"));

/// Replacement text for `PTOK` in redacted renderings.
pub const HIDDEN_TOKEN: &str = "payment token hidden";

const DEFAULT_CURRENCY: &str = "USD";

// =============================================================================
// Context
// =============================================================================

/// Everything a request needs that does not change between requests.
#[derive(Debug, Clone)]
pub struct RequestContext {
    merchant_id: u32,
    version: String,
    encoder: PaymentEncoder,
    rules: Arc<RuleSet>,
}

impl RequestContext {
    pub fn new(merchant_id: u32, khash: Khash, rules: Arc<RuleSet>) -> Self {
        RequestContext {
            merchant_id,
            version: DEFAULT_VERSION.to_string(),
            encoder: PaymentEncoder::new(khash),
            rules,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn merchant_id(&self) -> u32 {
        self.merchant_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }
}

// =============================================================================
// Policy
// =============================================================================

/// What [`Request::prepare`] does with validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationPolicy {
    /// Any error aborts with [`CoreError::Validation`].
    #[default]
    FailFast,
    /// Errors are returned alongside the prepared request.
    CollectAndContinue,
}

// =============================================================================
// Request
// =============================================================================

/// Marker for inquiry requests (modes Q, P, W, J).
#[derive(Debug, Clone, Copy)]
pub struct Inquiry;

/// Marker for update requests (modes U, X).
#[derive(Debug, Clone, Copy)]
pub struct Update;

/// A RIS request being assembled.
///
/// `K` is [`Inquiry`] or [`Update`] and decides which setters exist.
#[derive(Debug, Clone)]
pub struct Request<K> {
    fields: FieldRegistry,
    encoder: PaymentEncoder,
    rules: Arc<RuleSet>,
    kind: PhantomData<K>,
}

pub type InquiryRequest = Request<Inquiry>;
pub type UpdateRequest = Request<Update>;

impl Request<Inquiry> {
    /// New inquiry in mode Q with currency USD and KHASH encoding on.
    pub fn inquiry(ctx: &RequestContext) -> Self {
        let mut request = Request::with_defaults(ctx, InquiryMode::default().into());
        request.fields.insert(keys::CURR, DEFAULT_CURRENCY);
        request.fields.insert(keys::SDK, SDK_NAME);
        request.fields.insert(keys::SDK_VERSION, SDK_VERSION);
        request
    }

    pub fn set_mode(&mut self, mode: InquiryMode) -> &mut Self {
        self.fields.insert(keys::MODE, Mode::from(mode).as_char());
        self
    }

    /// ISO 4217 currency code.
    pub fn set_currency(&mut self, currency: &str) -> &mut Self {
        self.set_field(keys::CURR, currency)
    }

    /// Order total in the smallest currency unit.
    pub fn set_total(&mut self, total: i64) -> &mut Self {
        self.set_field(keys::TOTL, total)
    }

    /// Cash amount in the smallest currency unit.
    pub fn set_cash(&mut self, cash: i64) -> &mut Self {
        self.set_field(keys::CASH, cash)
    }

    pub fn set_ip_address(&mut self, address: &str) -> &mut Self {
        self.set_field(keys::IPAD, address)
    }

    pub fn set_user_agent(&mut self, user_agent: &str) -> &mut Self {
        self.set_field(keys::UAGT, user_agent)
    }

    pub fn set_email(&mut self, email: &str) -> &mut Self {
        self.set_field(keys::EMAL, email)
    }

    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.set_field(keys::NAME, name)
    }

    pub fn set_unique_customer_id(&mut self, unique: &str) -> &mut Self {
        self.set_field(keys::UNIQ, unique)
    }

    /// Customer creation time as seconds since the Unix epoch.
    pub fn set_epoch<Tz: TimeZone>(&mut self, created_at: &DateTime<Tz>) -> &mut Self {
        self.set_field(keys::EPOC, created_at.timestamp())
    }

    pub fn set_date_of_birth(&mut self, dob: NaiveDate) -> &mut Self {
        self.set_field(keys::DOB, dob.format("%Y-%m-%d").to_string())
    }

    /// `M` or `F`.
    pub fn set_gender(&mut self, gender: char) -> &mut Self {
        self.set_field(keys::GENDER, gender)
    }

    pub fn set_ship_type(&mut self, ship_type: ShipType) -> &mut Self {
        self.set_field(keys::SHTP, ship_type.code())
    }

    pub fn set_anid(&mut self, anid: &str) -> &mut Self {
        self.set_field(keys::ANID, anid)
    }

    /// Website id configured in the Agent Web Console.
    pub fn set_website(&mut self, site: &str) -> &mut Self {
        self.set_field(keys::SITE, site)
    }

    pub fn set_user_defined_field(&mut self, label: &str, value: impl Into<FieldValue>) -> &mut Self {
        self.set_field(keys::user_defined(label), value)
    }

    pub fn set_billing_address(&mut self, address: &Address) -> &mut Self {
        self.set_address(
            address,
            [keys::B2A1, keys::B2A2, keys::B2CI, keys::B2ST, keys::B2PC, keys::B2CC],
            keys::BPREMISE,
            keys::BSTREET,
        )
    }

    pub fn set_billing_phone(&mut self, phone: &str) -> &mut Self {
        self.set_field(keys::B2PN, phone)
    }

    pub fn set_shipping_address(&mut self, address: &Address) -> &mut Self {
        self.set_address(
            address,
            [keys::S2A1, keys::S2A2, keys::S2CI, keys::S2ST, keys::S2PC, keys::S2CC],
            keys::SPREMISE,
            keys::SSTREET,
        )
    }

    pub fn set_shipping_phone(&mut self, phone: &str) -> &mut Self {
        self.set_field(keys::S2PN, phone)
    }

    pub fn set_shipping_name(&mut self, name: &str) -> &mut Self {
        self.set_field(keys::S2NM, name)
    }

    pub fn set_shipping_email(&mut self, email: &str) -> &mut Self {
        self.set_field(keys::S2EM, email)
    }

    /// Replaces the cart with `items`, expanded into `PROD_*[i]` fields.
    pub fn set_cart(&mut self, items: &[CartItem]) -> &mut Self {
        for prefix in keys::CART_PREFIXES {
            let stale: Vec<String> = indexed_keys(&self.fields, prefix)
                .into_iter()
                .map(str::to_string)
                .collect();
            for name in stale {
                self.fields.remove(&name);
            }
        }

        for (i, item) in items.iter().enumerate() {
            self.fields.insert(keys::indexed(keys::PROD_TYPE, i), item.product_type.as_str());
            self.fields.insert(keys::indexed(keys::PROD_ITEM, i), item.item.as_str());
            self.fields.insert(keys::indexed(keys::PROD_DESC, i), item.description.as_str());
            self.fields.insert(keys::indexed(keys::PROD_QUANT, i), item.quantity);
            self.fields.insert(keys::indexed(keys::PROD_PRICE, i), item.price);
        }
        self
    }

    fn set_address(
        &mut self,
        address: &Address,
        [line1, line2, city, state, postal_code, country]: [&str; 6],
        premise: &str,
        street: &str,
    ) -> &mut Self {
        self.fields.insert(line1, address.line1.as_str());
        self.fields.insert(line2, address.line2.as_str());
        self.fields.insert(city, address.city.as_str());
        self.fields.insert(state, address.state.as_str());
        self.fields.insert(postal_code, address.postal_code.as_str());
        self.fields.insert(country, address.country.as_str());
        if let Some(value) = &address.premise {
            self.fields.insert(premise, value.as_str());
        }
        if let Some(value) = &address.street {
            self.fields.insert(street, value.as_str());
        }
        self
    }
}

impl Request<Update> {
    /// New update in mode U with KHASH encoding on.
    pub fn update(ctx: &RequestContext) -> Self {
        Request::with_defaults(ctx, UpdateMode::default().into())
    }

    pub fn set_mode(&mut self, mode: UpdateMode) -> &mut Self {
        self.fields.insert(keys::MODE, Mode::from(mode).as_char());
        self
    }

    /// RIS transaction id returned by the original inquiry.
    pub fn set_transaction_id(&mut self, transaction_id: &str) -> &mut Self {
        self.set_field(keys::TRAN, transaction_id)
    }

    pub fn set_refund_chargeback(&mut self, status: RefundChargeback) -> &mut Self {
        self.set_field(keys::RFCB, status.as_char())
    }
}

impl<K> Request<K> {
    fn with_defaults(ctx: &RequestContext, mode: Mode) -> Self {
        let mut fields = FieldRegistry::new();
        fields.insert(keys::MODE, mode.as_char());
        fields.insert(keys::MERC, ctx.merchant_id);
        fields.insert(keys::VERS, ctx.version.as_str());
        fields.insert(keys::PENC, KHASH_ENCODING);

        Request {
            fields,
            encoder: ctx.encoder.clone(),
            rules: Arc::clone(&ctx.rules),
            kind: PhantomData,
        }
    }

    /// Raw field write. Typed setters should be preferred.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.fields.insert(name, value);
        self
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    pub fn set_merchant_id(&mut self, merchant_id: u32) -> &mut Self {
        self.set_field(keys::MERC, merchant_id)
    }

    pub fn set_version(&mut self, version: &str) -> &mut Self {
        self.set_field(keys::VERS, version)
    }

    pub fn set_session_id(&mut self, session_id: &str) -> &mut Self {
        self.set_field(keys::SESS, session_id)
    }

    pub fn set_order_number(&mut self, order_number: &str) -> &mut Self {
        self.set_field(keys::ORDR, order_number)
    }

    /// Kount Central customer id.
    pub fn set_customer_id(&mut self, customer_id: &str) -> &mut Self {
        self.set_field(keys::CUSTOMER_ID, customer_id)
    }

    /// Merchant acknowledgement: `Y` when the order will ship.
    pub fn set_mack(&mut self, acknowledged: bool) -> &mut Self {
        self.set_field(keys::MACK, if acknowledged { 'Y' } else { 'N' })
    }

    /// Authorization status: `A` approved, `D` declined.
    pub fn set_auth(&mut self, approved: bool) -> &mut Self {
        self.set_field(keys::AUTH, if approved { 'A' } else { 'D' })
    }

    pub fn set_avs_zip(&mut self, result: char) -> &mut Self {
        self.set_field(keys::AVSZ, result)
    }

    pub fn set_avs_street(&mut self, result: char) -> &mut Self {
        self.set_field(keys::AVST, result)
    }

    pub fn set_cvv_result(&mut self, result: char) -> &mut Self {
        self.set_field(keys::CVVR, result)
    }

    pub fn set_last4(&mut self, last4: &str) -> &mut Self {
        self.set_field(keys::LAST4, last4)
    }

    /// Turns KHASH encoding of future payment tokens on or off.
    pub fn set_hash_encoding(&mut self, enabled: bool) -> &mut Self {
        self.set_field(keys::PENC, if enabled { KHASH_ENCODING } else { "" })
    }

    pub fn set_payment(&mut self, payment_type: PaymentType, credential: &str) -> CoreResult<&mut Self> {
        self.encoder.apply_payment(&mut self.fields, payment_type, credential)?;
        Ok(self)
    }

    /// Payment by `PTYP` code string.
    pub fn set_payment_code(&mut self, code: &str, credential: &str) -> CoreResult<&mut Self> {
        self.encoder.apply_payment_code(&mut self.fields, code, credential)?;
        Ok(self)
    }

    pub fn set_masked_card_payment(&mut self, card_number: &str) -> &mut Self {
        self.encoder.apply_masked_card(&mut self.fields, card_number);
        self
    }

    pub fn set_no_payment(&mut self) -> &mut Self {
        self.fields.insert(keys::PTYP, PaymentType::None.code());
        self.fields.insert(keys::PTOK, "");
        self
    }

    /// Mode currently recorded in `MODE`.
    pub fn mode(&self) -> CoreResult<Mode> {
        current_mode(&self.fields)
    }

    /// Validation errors the request would be submitted with.
    pub fn validate(&self) -> CoreResult<Vec<ValidationError>> {
        let fields = self.submission_fields();
        let mode = current_mode(&fields)?;
        Ok(validate(&fields, &self.rules, mode))
    }

    /// Applies the pre-submission fix-up and validates under `policy`.
    ///
    /// ## Errors
    /// - [`CoreError::UnknownMode`] when `MODE` was overwritten with junk
    /// - [`CoreError::Validation`] under [`ValidationPolicy::FailFast`]
    pub fn prepare(&self, policy: ValidationPolicy) -> CoreResult<PreparedRequest> {
        let fields = self.submission_fields();
        let mode = current_mode(&fields)?;
        let errors = validate(&fields, &self.rules, mode);

        if policy == ValidationPolicy::FailFast {
            if let Some(failure) = ValidationFailure::new(errors.clone()) {
                return Err(CoreError::Validation(failure));
            }
        }

        Ok(PreparedRequest {
            mode,
            fields,
            errors,
        })
    }

    fn submission_fields(&self) -> FieldRegistry {
        let mut fields = self.fields.clone();
        let token_missing = fields.get_text(keys::PTOK).map_or(true, |t| t.is_empty());
        let khash = fields.get_text(keys::PENC).as_deref() == Some(KHASH_ENCODING);
        if token_missing && khash {
            fields.insert(keys::PENC, "");
        }
        fields
    }
}

fn current_mode(fields: &FieldRegistry) -> CoreResult<Mode> {
    match fields.get(keys::MODE) {
        Some(FieldValue::Char(c)) => Mode::try_from(*c),
        Some(other) => other.to_string().parse(),
        None => Err(CoreError::UnknownMode(String::new())),
    }
}

// =============================================================================
// Prepared Request
// =============================================================================

/// A request that went through fix-up and validation, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    mode: Mode,
    fields: FieldRegistry,
    errors: Vec<ValidationError>,
}

impl PreparedRequest {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    /// Errors kept under [`ValidationPolicy::CollectAndContinue`].
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn merchant_id(&self) -> Option<String> {
        self.fields.get_text(keys::MERC)
    }

    /// `key=value&...` body in registry order.
    pub fn form_body(&self) -> String {
        self.fields.to_form_body()
    }

    /// Form body with `PTOK` replaced, for logs.
    pub fn redacted_form_body(&self) -> String {
        let mut fields = self.fields.clone();
        if fields.contains(keys::PTOK) {
            fields.insert(keys::PTOK, HIDDEN_TOKEN);
        }
        fields.to_form_body()
    }

    /// `(name, value)` pairs for logging, with `PTOK` hidden.
    pub fn redacted_fields(&self) -> impl Iterator<Item = (&str, String)> {
        self.fields.iter().map(|(name, value)| {
            let shown = if name == keys::PTOK {
                HIDDEN_TOKEN.to_string()
            } else {
                value.to_string()
            };
            (name, shown)
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
