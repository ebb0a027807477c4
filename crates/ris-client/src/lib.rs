//! # ris-client: Configuration and Submission for RIS Requests
//!
//! The edge around [`ris_core`]: loads [`RisConfig`], decodes the config key
//! once, builds inquiries and updates, and hands validated bodies to a
//! caller-supplied [`Transport`]. Response parsing is left to the caller.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ris_client::{ClientResult, OutboundRequest, RisClient, Transport};
//! use ris_core::{PaymentType, ValidationPolicy};
//!
//! struct MyHttp;
//!
//! impl Transport for MyHttp {
//!     fn post(&self, request: &OutboundRequest<'_>) -> ClientResult<String> {
//!         // POST request.body to request.url with request.headers
//!         unimplemented!()
//!     }
//! }
//!
//! ris_client::logging::init();
//! let client = RisClient::from_env(None)?;
//!
//! let mut inquiry = client.inquiry();
//! inquiry.set_session_id("a1b2c3").set_total(1000).set_email("buyer@example.com");
//! inquiry.set_payment(PaymentType::Card, "4111111111111111")?;
//!
//! let submission = client.submit(&inquiry, ValidationPolicy::FailFast, &MyHttp)?;
//! println!("{}", submission.response);
//! # Ok::<(), ris_client::ClientError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod error;
pub mod logging;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use client::{ClientCertificate, OutboundRequest, RisClient, Submission, Transport};
pub use config::RisConfig;
pub use error::{ClientError, ClientResult};
