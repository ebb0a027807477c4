//! # ris-core: Request Preparation for the RIS Fraud-Scoring Service
//!
//! This crate assembles, validates and encodes RIS requests. It contains no
//! I/O: posting the body and reading the response belong to the caller.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          RIS SDK Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Merchant checkout / order service               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ris-client (config, logging, transport seam)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ris-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐   │   │
//! │  │   │ request  │─►│ payment  │─►│  khash   │─►│   base85     │   │   │
//! │  │   │ Inquiry  │  │ encoder  │  │  SHA-1   │  │ (config key) │   │   │
//! │  │   │ Update   │  └──────────┘  └──────────┘  └──────────────┘   │   │
//! │  │   │          │─►┌──────────┐  ┌──────────┐                     │   │
//! │  │   └──────────┘  │validation│─►│  rules   │                     │   │
//! │  │        │        └──────────┘  └──────────┘                     │   │
//! │  │        └──────► registry (ordered fields, form body)            │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO LOGGING                              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`base85`] - Base85 codec used for the config key
//! - [`khash`] - KHASH payment token hashing
//! - [`registry`] - Ordered field store and form-body rendering
//! - [`payment`] - Payment type resolution, hashing and masking
//! - [`rules`] - Declarative rule table
//! - [`validation`] - Rule checks over a registry
//! - [`request`] - Inquiry / update orchestration
//! - [`types`] - Modes, payment types, cart items, addresses
//! - [`error`] - Error types
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use ris_core::{ConfigKey, Khash, PaymentType, Request, RequestContext, RuleSet};
//! use ris_core::request::ValidationPolicy;
//!
//! let key = ConfigKey::from_base85(";Fse0F(&p)Ch4`1@;L$.AoD]4F`(o8+EV19FE7").unwrap();
//! let ctx = RequestContext::new(999666, Khash::new(key), Arc::new(RuleSet::builtin().unwrap()));
//!
//! let mut inquiry = Request::inquiry(&ctx);
//! inquiry.set_session_id("a1b2c3").set_total(1000);
//! inquiry.set_payment(PaymentType::Card, "4111111111111111").unwrap();
//!
//! let prepared = inquiry.prepare(ValidationPolicy::CollectAndContinue).unwrap();
//! assert!(prepared.form_body().contains("PTOK=4111113PAS7BP5E4JVNZ"));
//! assert!(!prepared.is_valid()); // e.g. EMAL and IPAD are still missing
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod base85;
pub mod error;
pub mod khash;
pub mod payment;
pub mod registry;
pub mod request;
pub mod rules;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError, ValidationFailure};
pub use khash::{ConfigKey, Khash};
pub use payment::{mask_token, PaymentEncoder};
pub use registry::{FieldRegistry, FieldValue};
pub use request::{
    Inquiry, InquiryRequest, PreparedRequest, Request, RequestContext, Update, UpdateRequest,
    ValidationPolicy,
};
pub use rules::{Rule, RuleSet};
pub use types::*;
pub use validation::validate;
