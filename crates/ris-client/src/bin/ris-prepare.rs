//! # RIS Request Preparer
//!
//! Builds an inquiry from an order file and prints the form body that would
//! be posted, with the payment token hidden. Nothing is sent.
//!
//! ## Usage
//! ```bash
//! # Uses ris.toml from the platform config dir plus RIS_* variables
//! cargo run -p ris-client --bin ris-prepare -- --order ./order.toml
//!
//! # Explicit config file
//! cargo run -p ris-client --bin ris-prepare -- --order ./order.toml --config ./ris.toml
//! ```
//!
//! ## Order File
//! ```toml
//! mode = "Q"                      # Q | P | W | J
//! session_id = "a1b2c3"           # generated when absent
//!
//! [payment]
//! type = "CARD"
//! token = "4111111111111111"
//! masked = false
//!
//! [fields]
//! TOTL = 123456
//! EMAL = "buyer@example.com"
//! IPAD = "131.206.45.21"
//! MACK = "Y"
//!
//! [[cart]]
//! product_type = "SPORTING_GOODS"
//! item = "SG999999"
//! description = "3000 CANDLEPOWER PLASMA FLASHLIGHT"
//! quantity = 2
//! price = 68990
//! ```

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use chrono::Utc;
use ris_client::{logging, RisClient, RisConfig};
use ris_core::{CartItem, FieldValue, InquiryMode, Mode, PaymentType, ValidationPolicy};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct Order {
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    payment: Option<OrderPayment>,
    #[serde(default)]
    fields: BTreeMap<String, toml::Value>,
    #[serde(default)]
    cart: Vec<CartItem>,
}

#[derive(Debug, Deserialize)]
struct OrderPayment {
    #[serde(rename = "type")]
    payment_type: PaymentType,
    #[serde(default)]
    token: String,
    #[serde(default)]
    masked: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut order_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--order" | "-o" => {
                if i + 1 < args.len() {
                    order_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let Some(order_path) = order_path else {
        print_help();
        return Err("--order is required".into());
    };

    logging::init();

    let mut config = match config_path.or_else(RisConfig::default_config_path) {
        Some(path) if path.exists() => RisConfig::from_file(&path)?,
        _ => RisConfig::default(),
    };
    config.apply_overrides(|name| env::var(name).ok());
    // Nothing is posted, so URL and credentials are not needed
    config.server.check_config = false;

    let client = RisClient::new(config)?;
    let order: Order = toml::from_str(&std::fs::read_to_string(&order_path)?)?;

    let mut inquiry = client.inquiry();
    if let Some(mode) = order.mode.as_deref() {
        inquiry.set_mode(InquiryMode::try_from(mode.parse::<Mode>()?)?);
    }

    let session_id = order
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
    inquiry.set_session_id(&session_id).set_epoch(&Utc::now());

    for (name, value) in &order.fields {
        inquiry.set_field(name.as_str(), field_value(value));
    }

    if !order.cart.is_empty() {
        inquiry.set_cart(&order.cart);
    }

    match order.payment {
        Some(payment) if payment.masked => {
            inquiry.set_masked_card_payment(&payment.token);
        }
        Some(payment) => {
            inquiry.set_payment(payment.payment_type, &payment.token)?;
        }
        None => {
            inquiry.set_no_payment();
        }
    }

    let prepared = client.prepare(&inquiry, ValidationPolicy::CollectAndContinue)?;
    info!(path = ?order_path, session_id = %session_id, "Order prepared");

    println!("{}", prepared.redacted_form_body());

    if prepared.is_valid() {
        return Ok(());
    }

    eprintln!();
    eprintln!("{} validation error(s):", prepared.errors().len());
    for validation_error in prepared.errors() {
        eprintln!("  {}", validation_error);
    }
    Err("order failed validation".into())
}

fn field_value(value: &toml::Value) -> FieldValue {
    match value {
        toml::Value::Integer(n) => FieldValue::Integer(*n),
        toml::Value::String(s) => FieldValue::Text(s.clone()),
        other => FieldValue::Text(other.to_string()),
    }
}

fn print_help() {
    println!("RIS Request Preparer");
    println!();
    println!("Usage: ris-prepare --order <PATH> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -o, --order <PATH>   Order file (TOML)");
    println!("  -c, --config <PATH>  RIS config file (default: platform config dir)");
    println!("  -h, --help           Show this help message");
}
