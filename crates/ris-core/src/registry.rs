//! # Field Registry
//!
//! Ordered key/value store of outbound RIS fields. It is the single source
//! of truth for validation and for the form body sent to RIS.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Request::inquiry() ► empty registry + defaults (MODE, MERC, VERS, PENC)│
//! │        │                                                                │
//! │        ▼                                                                │
//! │  setters ─────────► insert(name, value)   last write wins,              │
//! │        │                                   first-insert position kept   │
//! │        ▼                                                                │
//! │  validate() ──────► read only                                           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  to_form_body() ──► "MODE=Q&MERC=999666&...&PTOK=411111WMS5YA6FUZA1KC"  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Field names understood by RIS.
pub mod keys {
    pub const MODE: &str = "MODE";
    pub const MERC: &str = "MERC";
    pub const VERS: &str = "VERS";
    pub const SDK: &str = "SDK";
    pub const SDK_VERSION: &str = "SDK_VERSION";

    pub const SESS: &str = "SESS";
    pub const ORDR: &str = "ORDR";
    pub const TRAN: &str = "TRAN";
    pub const CUSTOMER_ID: &str = "CUSTOMER_ID";

    pub const PTYP: &str = "PTYP";
    pub const PTOK: &str = "PTOK";
    pub const PENC: &str = "PENC";
    pub const LAST4: &str = "LAST4";

    pub const MACK: &str = "MACK";
    pub const AUTH: &str = "AUTH";
    pub const AVSZ: &str = "AVSZ";
    pub const AVST: &str = "AVST";
    pub const CVVR: &str = "CVVR";
    pub const RFCB: &str = "RFCB";

    pub const CURR: &str = "CURR";
    pub const TOTL: &str = "TOTL";
    pub const CASH: &str = "CASH";
    pub const IPAD: &str = "IPAD";
    pub const UAGT: &str = "UAGT";
    pub const EMAL: &str = "EMAL";
    pub const NAME: &str = "NAME";
    pub const UNIQ: &str = "UNIQ";
    pub const EPOC: &str = "EPOC";
    pub const SHTP: &str = "SHTP";
    pub const ANID: &str = "ANID";
    pub const SITE: &str = "SITE";
    pub const DOB: &str = "DOB";
    pub const GENDER: &str = "GENDER";

    pub const B2A1: &str = "B2A1";
    pub const B2A2: &str = "B2A2";
    pub const B2CI: &str = "B2CI";
    pub const B2ST: &str = "B2ST";
    pub const B2PC: &str = "B2PC";
    pub const B2CC: &str = "B2CC";
    pub const B2PN: &str = "B2PN";
    pub const BPREMISE: &str = "BPREMISE";
    pub const BSTREET: &str = "BSTREET";

    pub const S2A1: &str = "S2A1";
    pub const S2A2: &str = "S2A2";
    pub const S2CI: &str = "S2CI";
    pub const S2ST: &str = "S2ST";
    pub const S2PC: &str = "S2PC";
    pub const S2CC: &str = "S2CC";
    pub const S2PN: &str = "S2PN";
    pub const S2NM: &str = "S2NM";
    pub const S2EM: &str = "S2EM";
    pub const SPREMISE: &str = "SPREMISE";
    pub const SSTREET: &str = "SSTREET";

    pub const PROD_TYPE: &str = "PROD_TYPE";
    pub const PROD_ITEM: &str = "PROD_ITEM";
    pub const PROD_DESC: &str = "PROD_DESC";
    pub const PROD_QUANT: &str = "PROD_QUANT";
    pub const PROD_PRICE: &str = "PROD_PRICE";

    /// Prefixes of the indexed cart families (`PROD_TYPE[0]`, ...).
    pub const CART_PREFIXES: [&str; 5] = [PROD_TYPE, PROD_ITEM, PROD_DESC, PROD_QUANT, PROD_PRICE];

    /// `PROD_ITEM[3]`
    pub fn indexed(prefix: &str, index: usize) -> String {
        format!("{}[{}]", prefix, index)
    }

    /// `UDF[label]`
    pub fn user_defined(label: &str) -> String {
        format!("UDF[{}]", label)
    }
}

// =============================================================================
// Field Value
// =============================================================================

/// A registry value. RIS receives everything as text; the variant only
/// records how the caller supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    Char(char),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Char(c) => write!(f, "{}", c),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::Text(s.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Integer(i64::from(n))
    }
}

impl From<char> for FieldValue {
    fn from(c: char) -> Self {
        FieldValue::Char(c)
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Ordered mapping of field name to value.
///
/// ## Invariants
/// - Keys are unique
/// - Overwriting a key keeps its original position
/// - Iteration order is first-insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRegistry {
    entries: Vec<(String, FieldValue)>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `name`. Returns the previous value, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.position(name).map(|idx| &self.entries[idx].1)
    }

    /// The value rendered as text, as RIS will receive it.
    pub fn get_text(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| v.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// `application/x-www-form-urlencoded` body in registry order.
    pub fn to_form_body(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in self.iter() {
            serializer.append_pair(name, &value.to_string());
        }
        serializer.finish()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == name)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
