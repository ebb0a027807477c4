//! # RIS Client
//!
//! Builds requests from configuration and hands prepared bodies to a
//! [`Transport`].
//!
//! ## Submission Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  RisClient::new(config)                                                 │
//! │     • config.validate()                                                 │
//! │     • config key Base85 → ConfigKey (once)                              │
//! │     • built-in rule table (once, shared)                                │
//! │                                                                         │
//! │  client.inquiry() / client.update()  ──► caller sets fields             │
//! │                                                                         │
//! │  client.submit(&request, policy, &transport)                            │
//! │     1. prepare: PENC fix-up + validation                                │
//! │     2. error! per validation error                                      │
//! │     3. FailFast with errors → Err, transport never called               │
//! │     4. debug! redacted fields (PTOK = "payment token hidden")           │
//! │     5. transport.post(url, headers, body)                               │
//! │     6. debug! elapsed time when logging.log_elapsed                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ris_core::{
    ConfigKey, CoreError, InquiryRequest, Khash, PreparedRequest, Request, RequestContext,
    RuleSet, UpdateRequest, ValidationError, ValidationFailure, ValidationPolicy,
};
use tracing::{debug, error, info};

use crate::config::RisConfig;
use crate::error::{ClientError, ClientResult};

/// Header carrying the merchant id.
pub const MERCHANT_ID_HEADER: &str = "X-Kount-Merc-Id";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-Kount-Api-Key";

/// Content type of the request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// =============================================================================
// Transport
// =============================================================================

/// Client certificate for certificate-authenticated merchants.
#[derive(Clone)]
pub struct ClientCertificate {
    pub file: PathBuf,
    pub password: String,
}

impl fmt::Debug for ClientCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCertificate")
            .field("file", &self.file)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything a transport needs to post one request.
#[derive(Debug, Clone)]
pub struct OutboundRequest<'a> {
    pub url: &'a str,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
    pub connect_timeout: Duration,
    pub certificate: Option<&'a ClientCertificate>,
}

/// Posts a form body to RIS and returns the raw response text.
///
/// Implemented by the application (HTTP client, TLS, certificates). Failures
/// should be reported as [`ClientError::Transport`].
pub trait Transport {
    fn post(&self, request: &OutboundRequest<'_>) -> ClientResult<String>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post(&self, request: &OutboundRequest<'_>) -> ClientResult<String> {
        (**self).post(request)
    }
}

// =============================================================================
// Submission
// =============================================================================

/// Result of a submitted request.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Raw RIS response text, unparsed.
    pub response: String,

    /// Validation errors accepted under [`ValidationPolicy::CollectAndContinue`].
    pub errors: Vec<ValidationError>,

    pub elapsed: Duration,
}

// =============================================================================
// Client
// =============================================================================

pub struct RisClient {
    config: RisConfig,
    context: RequestContext,
    certificate: Option<ClientCertificate>,
}

impl RisClient {
    /// Builds a client with the built-in rule table.
    ///
    /// ## Errors
    /// Any configuration problem, including a config key that does not
    /// decode. Nothing is deferred to the first request.
    pub fn new(config: RisConfig) -> ClientResult<Self> {
        let rules = RuleSet::builtin()?;
        Self::with_rules(config, Arc::new(rules))
    }

    pub fn with_rules(config: RisConfig, rules: Arc<RuleSet>) -> ClientResult<Self> {
        config.validate()?;

        let merchant_id = config
            .merchant
            .id
            .ok_or(ClientError::MissingConfig("merchant.id"))?;
        let encoded_key = config
            .merchant
            .config_key
            .as_deref()
            .ok_or(ClientError::MissingConfig("merchant.config_key"))?;
        let key = ConfigKey::from_base85(encoded_key)?;

        let context = RequestContext::new(merchant_id, Khash::new(key), rules)
            .with_version(config.server.version.clone());

        let certificate = match (&config.auth.certificate_file, &config.auth.private_key_password) {
            (Some(file), Some(password)) => Some(ClientCertificate {
                file: file.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        info!(
            merchant_id,
            version = %config.server.version,
            url = config.url().unwrap_or("<unset>"),
            "RIS client configured"
        );

        Ok(RisClient {
            config,
            context,
            certificate,
        })
    }

    /// Loads configuration (file + environment) and builds a client.
    pub fn from_env(config_path: Option<PathBuf>) -> ClientResult<Self> {
        Self::new(RisConfig::load(config_path)?)
    }

    pub fn config(&self) -> &RisConfig {
        &self.config
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn inquiry(&self) -> InquiryRequest {
        Request::inquiry(&self.context)
    }

    pub fn update(&self) -> UpdateRequest {
        Request::update(&self.context)
    }

    /// Validates `request`, logs it, and posts it through `transport`.
    pub fn submit<K, T>(
        &self,
        request: &Request<K>,
        policy: ValidationPolicy,
        transport: &T,
    ) -> ClientResult<Submission>
    where
        T: Transport + ?Sized,
    {
        let prepared = self.prepare(request, policy)?;
        let url = self.config.url().ok_or(ClientError::MissingConfig("server.url"))?;

        let outbound = OutboundRequest {
            url,
            headers: self.headers(&prepared),
            body: prepared.form_body(),
            connect_timeout: self.config.connect_timeout(),
            certificate: self.certificate.as_ref(),
        };

        let start = Instant::now();
        let response = transport.post(&outbound)?;
        let elapsed = start.elapsed();

        if self.config.logging.log_elapsed {
            debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                mode = %prepared.mode(),
                "RIS transport round trip"
            );
        }

        Ok(Submission {
            response,
            errors: prepared.errors().to_vec(),
            elapsed,
        })
    }

    /// Runs the pre-submission fix-up and validation, logging each error.
    pub fn prepare<K>(&self, request: &Request<K>, policy: ValidationPolicy) -> ClientResult<PreparedRequest> {
        let prepared = request.prepare(ValidationPolicy::CollectAndContinue)?;

        for validation_error in prepared.errors() {
            error!(
                field = validation_error.field(),
                mode = %prepared.mode(),
                "{}",
                validation_error
            );
        }

        if policy == ValidationPolicy::FailFast {
            if let Some(failure) = ValidationFailure::new(prepared.errors().to_vec()) {
                return Err(CoreError::Validation(failure).into());
            }
        }

        for (name, value) in prepared.redacted_fields() {
            debug!(field = name, value = %value, "RIS request field");
        }

        Ok(prepared)
    }

    /// Custom headers for `prepared`.
    pub fn headers(&self, prepared: &PreparedRequest) -> Vec<(&'static str, String)> {
        let mut headers = vec![("Content-Type", FORM_CONTENT_TYPE.to_string())];
        if let Some(merchant_id) = prepared.merchant_id() {
            headers.push((MERCHANT_ID_HEADER, merchant_id));
        }
        if let Some(api_key) = self.config.auth.api_key.as_deref().filter(|k| !k.is_empty()) {
            headers.push((API_KEY_HEADER, api_key.to_string()));
        }
        headers
    }
}

impl fmt::Debug for RisClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RisClient")
            .field("config", &self.config)
            .field("merchant_id", &self.context.merchant_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ris_core::PaymentType;
    use std::cell::RefCell;

    struct Recorder {
        calls: RefCell<Vec<(String, Vec<(&'static str, String)>, String)>>,
    }

    impl Transport for Recorder {
        fn post(&self, request: &OutboundRequest<'_>) -> ClientResult<String> {
            self.calls.borrow_mut().push((
                request.url.to_string(),
                request.headers.clone(),
                request.body.clone(),
            ));
            Ok("VERS=0700\nMODE=Q\nAUTO=A\n".to_string())
        }
    }

    fn config() -> RisConfig {
        let mut config = RisConfig::default();
        config.merchant.id = Some(999666);
        config.merchant.config_key = Some(";Fse0F(&p)Ch4`1@;L$.AoD]4F`(o8+EV19FE7".into());
        config.server.url = Some("https://risk.test.kount.net".into());
        config.auth.api_key = Some("api-key".into());
        config
    }

    #[test]
    fn test_new_decodes_key_once() {
        let client = RisClient::new(config()).unwrap();
        assert_eq!(client.context().merchant_id(), 999666);

        let mut inquiry = client.inquiry();
        inquiry
            .set_payment(PaymentType::Card, "4111111111111111")
            .unwrap();
        assert_eq!(
            inquiry.fields().get_text("PTOK").as_deref(),
            Some("4111113PAS7BP5E4JVNZ")
        );
    }

    #[test]
    fn test_bad_config_key_is_fatal_at_construction() {
        let mut config = config();
        config.merchant.config_key = Some("{{{{".into());
        let err = RisClient::new(config).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_fail_fast_never_calls_transport() {
        let client = RisClient::new(config()).unwrap();
        let recorder = Recorder {
            calls: RefCell::new(Vec::new()),
        };

        let err = client
            .submit(&client.inquiry(), ValidationPolicy::FailFast, &recorder)
            .unwrap_err();
        assert!(err.validation_errors().is_some());
        assert!(recorder.calls.borrow().is_empty());
    }

    #[test]
    fn test_collect_and_continue_posts_with_headers() {
        let client = RisClient::new(config()).unwrap();
        let recorder = Recorder {
            calls: RefCell::new(Vec::new()),
        };

        let mut update = client.update();
        update.set_session_id("abc123").set_transaction_id("P01J0FD1XDXX");
        let submission = client
            .submit(&update, ValidationPolicy::CollectAndContinue, &recorder)
            .unwrap();

        assert!(submission.errors.is_empty());
        assert!(submission.response.contains("AUTO=A"));

        let calls = recorder.calls.borrow();
        let (url, headers, body) = &calls[0];
        assert_eq!(url, "https://risk.test.kount.net");
        assert!(headers.contains(&(MERCHANT_ID_HEADER, "999666".to_string())));
        assert!(headers.contains(&(API_KEY_HEADER, "api-key".to_string())));
        assert!(body.starts_with("MODE=U&MERC=999666&VERS=0700"));
        assert!(body.contains("TRAN=P01J0FD1XDXX"));
    }
}
