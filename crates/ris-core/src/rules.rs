//! # Rule Table
//!
//! Declarative, ordered list of field rules. Loaded once and shared
//! read-only (behind an `Arc`) by every request.
//!
//! ## Row Format (TOML)
//! ```toml
//! [[rule]]
//! field = "PROD_QUANT"            # exact name or indexed family prefix
//! required = ["Q", "P", "W", "J"] # [] = every mode, omitted = optional
//! max_length = 15
//! regex = '\d+'                   # must match the whole value
//!
//! [[rule]]
//! field = "PTOK"
//! regex = '^\d{6}X{5,9}\d{1,4}$'
//! when = { field = "PENC", equals = "MASK" }
//! ```

use regex::Regex;
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::registry::FieldRegistry;
use crate::types::Mode;

const BUILTIN_TABLE: &str = include_str!("../resources/validate.toml");

// =============================================================================
// Raw Rows
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleTable {
    #[serde(default, rename = "rule")]
    rules: Vec<RuleRow>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleRow {
    field: String,
    #[serde(default)]
    required: Option<Vec<Mode>>,
    #[serde(default)]
    max_length: Option<usize>,
    #[serde(default)]
    regex: Option<String>,
    #[serde(default)]
    when: Option<Condition>,
}

// =============================================================================
// Rule
// =============================================================================

/// Gate that limits a rule to requests where `field` equals `equals`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    pub field: String,
    pub equals: String,
}

impl Condition {
    pub fn holds(&self, registry: &FieldRegistry) -> bool {
        registry.get_text(&self.field).as_deref() == Some(self.equals.as_str())
    }
}

/// A compiled pattern together with the text it was written as.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    compiled: Regex,
}

impl Pattern {
    /// Compiles `source` so that it only accepts full matches.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let compiled = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Pattern {
            source: source.to_string(),
            compiled,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_full_match(&self, value: &str) -> bool {
        self.compiled.is_match(value)
    }
}

/// One validated, immutable rule.
#[derive(Debug, Clone)]
pub struct Rule {
    field: String,
    required: Option<Vec<Mode>>,
    max_length: Option<usize>,
    pattern: Option<Pattern>,
    condition: Option<Condition>,
}

impl Rule {
    fn from_row(row: RuleRow) -> CoreResult<Self> {
        let field = row.field.trim().to_string();
        if field.is_empty() {
            return Err(CoreError::InvalidRule {
                field: row.field,
                reason: "field name is empty".to_string(),
            });
        }

        if row.required.is_some() && row.when.is_some() {
            return Err(CoreError::InvalidRule {
                field,
                reason: "required cannot be combined with when".to_string(),
            });
        }

        let pattern = row
            .regex
            .as_deref()
            .map(Pattern::new)
            .transpose()
            .map_err(|e| CoreError::InvalidRule {
                field: field.clone(),
                reason: e.to_string(),
            })?;

        Ok(Rule {
            field,
            required: row.required,
            max_length: row.max_length,
            pattern,
            condition: row.when,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// True when the field must be present in `mode`.
    pub fn is_required_for(&self, mode: Mode) -> bool {
        match &self.required {
            Some(modes) => modes.is_empty() || modes.contains(&mode),
            None => false,
        }
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// False when the rule's `when` gate does not hold for `registry`.
    pub fn applies_to(&self, registry: &FieldRegistry) -> bool {
        self.condition.as_ref().map_or(true, |c| c.holds(registry))
    }
}

// =============================================================================
// Rule Set
// =============================================================================

/// Ordered rule table.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// The RIS field rules shipped with this crate.
    pub fn builtin() -> CoreResult<Self> {
        RuleSet::from_toml_str(BUILTIN_TABLE)
    }

    pub fn from_toml_str(source: &str) -> CoreResult<Self> {
        let table: RuleTable = toml::from_str(source)?;
        RuleSet::from_table(table)
    }

    /// Same rows as the TOML form, as `{"rule": [...]}`.
    pub fn from_json_str(source: &str) -> CoreResult<Self> {
        let table: RuleTable = serde_json::from_str(source)?;
        RuleSet::from_table(table)
    }

    fn from_table(table: RuleTable) -> CoreResult<Self> {
        let rules = table
            .rules
            .into_iter()
            .map(Rule::from_row)
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(RuleSet { rules })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Fields required in `mode`, in table order, without duplicates.
    pub fn required_fields(&self, mode: Mode) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for rule in self.rules.iter().filter(|r| r.is_required_for(mode)) {
            if !fields.contains(&rule.field()) {
                fields.push(rule.field());
            }
        }
        fields
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
