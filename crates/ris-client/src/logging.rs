//! Tracing setup for binaries and examples built on the SDK.
//!
//! Libraries never install a subscriber; applications call [`init`] once.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,ris=debug";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages, including redacted request fields
/// - `RUST_LOG=ris_client=trace` - Trace for the client only
/// - Default: [`DEFAULT_FILTER`]
///
/// Calling it twice is harmless; the second call is ignored.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
