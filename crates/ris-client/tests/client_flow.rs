//! End-to-end flow: config file on disk, client construction, inquiry
//! submission through a recording transport.

use std::sync::Mutex;

use ris_client::{ClientError, ClientResult, OutboundRequest, RisClient, RisConfig, Transport};
use ris_core::{CartItem, InquiryMode, PaymentType, ValidationPolicy};

const TEST_CONFIG_KEY: &str = ";Fse0F(&p)Ch4`1@;L$.AoD]4F`(o8+EV19FE7";

#[derive(Default)]
struct RecordingTransport {
    bodies: Mutex<Vec<String>>,
}

impl Transport for RecordingTransport {
    fn post(&self, request: &OutboundRequest<'_>) -> ClientResult<String> {
        self.bodies.lock().unwrap().push(request.body.clone());
        Ok("MODE=Q\nAUTO=A\nSCOR=12\n".to_string())
    }
}

struct FailingTransport;

impl Transport for FailingTransport {
    fn post(&self, _request: &OutboundRequest<'_>) -> ClientResult<String> {
        Err(ClientError::Transport("connection refused".into()))
    }
}

fn sample_config() -> RisConfig {
    let mut config = RisConfig::default();
    config.merchant.id = Some(999666);
    config.merchant.config_key = Some(TEST_CONFIG_KEY.into());
    config.server.url = Some("https://risk.test.kount.net".into());
    config.auth.api_key = Some("api-key".into());
    config.logging.log_elapsed = true;
    config
}

fn cart() -> Vec<CartItem> {
    vec![CartItem {
        product_type: "SPORTING_GOODS".into(),
        item: "SG999999".into(),
        description: "3000 CANDLEPOWER PLASMA FLASHLIGHT".into(),
        quantity: 2,
        price: 68990,
    }]
}

#[test]
fn test_config_file_round_trip_builds_client() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("ris.toml");

    sample_config().save(Some(path.clone())).unwrap();
    let mut loaded = RisConfig::from_file(&path).unwrap();
    assert_eq!(loaded.merchant.id, Some(999666));
    assert_eq!(loaded.merchant.config_key.as_deref(), Some(TEST_CONFIG_KEY));
    assert!(loaded.logging.log_elapsed);

    loaded.apply_overrides(|name| match name {
        "RIS_VERSION" => Some("0695".to_string()),
        _ => None,
    });
    let client = RisClient::new(loaded).unwrap();
    assert_eq!(client.context().version(), "0695");
}

#[test]
fn test_full_inquiry_is_posted_with_hashed_token() {
    let client = RisClient::new(sample_config()).unwrap();
    let transport = RecordingTransport::default();

    let mut inquiry = client.inquiry();
    inquiry
        .set_mode(InquiryMode::Q)
        .set_session_id("a1b2c3d4")
        .set_total(137980)
        .set_email("buyer@example.com")
        .set_ip_address("131.206.45.21")
        .set_mack(true)
        .set_cart(&cart());
    inquiry
        .set_payment(PaymentType::Card, "4111111111111111")
        .unwrap();

    let submission = client
        .submit(&inquiry, ValidationPolicy::FailFast, &transport)
        .unwrap();
    assert!(submission.errors.is_empty());
    assert!(submission.response.contains("AUTO=A"));

    let bodies = transport.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert!(body.contains("PTOK=4111113PAS7BP5E4JVNZ"));
    assert!(body.contains("PENC=KHASH"));
    assert!(body.contains("LAST4=1111"));
    assert!(body.contains("PROD_ITEM%5B0%5D=SG999999"));
    assert!(!body.contains("4111111111111111"));
}

#[test]
fn test_collect_and_continue_reports_missing_fields() {
    let client = RisClient::new(sample_config()).unwrap();
    let transport = RecordingTransport::default();

    let mut inquiry = client.inquiry();
    inquiry.set_session_id("a1b2c3d4").set_no_payment();

    let submission = client
        .submit(&inquiry, ValidationPolicy::CollectAndContinue, &transport)
        .unwrap();

    let missing: Vec<&str> = submission.errors.iter().map(|e| e.field()).collect();
    assert!(missing.contains(&"TOTL"));
    assert!(missing.contains(&"EMAL"));
    assert!(missing.contains(&"IPAD"));
    assert_eq!(transport.bodies.lock().unwrap().len(), 1);
}

#[test]
fn test_transport_failure_is_surfaced() {
    let client = RisClient::new(sample_config()).unwrap();

    let mut update = client.update();
    update.set_session_id("a1b2c3d4").set_transaction_id("P01J0FD1XDXX");

    let err = client
        .submit(&update, ValidationPolicy::FailFast, &FailingTransport)
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(!err.is_config_error());
}

#[test]
fn test_missing_merchant_id_is_a_config_error() {
    let mut config = sample_config();
    config.merchant.id = None;

    let err = RisClient::new(config).unwrap_err();
    assert!(err.is_config_error());
}
