//! # Validation Engine
//!
//! Checks a [`FieldRegistry`] against a [`RuleSet`] for one mode. Pure: the
//! registry is only read, and every rule is checked (no short-circuit).
//!
//! ## Per-Rule Checks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rule "PROD_QUANT"                                                      │
//! │                                                                         │
//! │  targets = exact key, if present      → ["PROD_QUANT"]                  │
//! │            plus indexed entries       → ["PROD_QUANT[0]", ...]          │
//! │                                                                         │
//! │  1. Required  targets empty AND rule requires current mode              │
//! │  2. Length    per target: chars(value) > max_length                     │
//! │  3. Regex     per target: value is not a full match                     │
//! │                                                                         │
//! │  Errors are appended in rule order, then target order.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::registry::{keys, FieldRegistry};
use crate::rules::{Rule, RuleSet};
use crate::types::Mode;

/// Checks `registry` against every rule for `mode`.
pub fn validate(registry: &FieldRegistry, rules: &RuleSet, mode: Mode) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for rule in rules.iter().filter(|r| r.applies_to(registry)) {
        let targets = targets(registry, rule.field());

        if targets.is_empty() && rule.is_required_for(mode) {
            errors.push(ValidationError::MissingRequired {
                field: rule.field().to_string(),
                mode,
            });
        }

        for name in targets {
            if let Some(value) = registry.get_text(name) {
                check_value(rule, name, value, &mut errors);
            }
        }
    }

    errors
}

fn check_value(rule: &Rule, name: &str, value: String, errors: &mut Vec<ValidationError>) {
    if let Some(max) = rule.max_length() {
        if value.chars().count() > max {
            errors.push(ValidationError::LengthExceeded {
                field: name.to_string(),
                value: value.clone(),
                max,
            });
        }
    }

    if let Some(pattern) = rule.pattern() {
        if !pattern.is_full_match(&value) {
            errors.push(ValidationError::RegexMismatch {
                field: name.to_string(),
                value,
                pattern: pattern.as_str().to_string(),
            });
        }
    }
}

/// Registry keys a rule applies to. A cart prefix covers its bare key and
/// every indexed entry.
fn targets<'a>(registry: &'a FieldRegistry, field: &str) -> Vec<&'a str> {
    let mut found: Vec<&'a str> = registry.keys().filter(|name| *name == field).collect();
    if is_indexed_family(field) {
        found.extend(indexed_keys(registry, field));
    }
    found
}

fn is_indexed_family(field: &str) -> bool {
    keys::CART_PREFIXES.contains(&field)
}

/// `PROD_TYPE[0]`, `PROD_TYPE[1]`, ... for `prefix = "PROD_TYPE"`.
pub fn indexed_keys<'a>(registry: &'a FieldRegistry, prefix: &str) -> Vec<&'a str> {
    registry
        .keys()
        .filter(|name| {
            name.strip_prefix(prefix)
                .map_or(false, |rest| rest.starts_with('['))
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_rules() -> RuleSet {
        RuleSet::from_toml_str(
            r#"
            [[rule]]
            field = "MODE"
            required = []
            regex = '[QPWJUX]'

            [[rule]]
            field = "TRAN"
            required = ["U", "X"]

            [[rule]]
            field = "PROD_ITEM"
            required = ["Q"]
            max_length = 8

            [[rule]]
            field = "PROD_QUANT"
            required = ["Q"]
            max_length = 3
            regex = '\d+'
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_registry_reports_required_for_mode() {
        let rules = cart_rules();
        let registry = FieldRegistry::new();

        let errors = validate(&registry, &rules, Mode::Q);
        let fields: Vec<_> = errors.iter().map(|e| e.field()).collect();
        assert_eq!(fields, vec!["MODE", "PROD_ITEM", "PROD_QUANT"]);

        let errors = validate(&registry, &rules, Mode::U);
        let fields: Vec<_> = errors.iter().map(|e| e.field()).collect();
        assert_eq!(fields, vec!["MODE", "TRAN"]);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::MissingRequired { mode: Mode::U, .. })));
    }

    #[test]
    fn test_indexed_family_satisfies_required_and_is_checked() {
        let rules = cart_rules();
        let mut registry = FieldRegistry::new();
        registry.insert("MODE", 'Q');
        registry.insert("PROD_ITEM[0]", "SG999999");
        registry.insert("PROD_QUANT[0]", 2i64);
        registry.insert("PROD_ITEM[1]", "TOO-LONG-ITEM");
        registry.insert("PROD_QUANT[1]", "two");

        let errors = validate(&registry, &rules, Mode::Q);
        assert_eq!(
            errors,
            vec![
                ValidationError::LengthExceeded {
                    field: "PROD_ITEM[1]".to_string(),
                    value: "TOO-LONG-ITEM".to_string(),
                    max: 8,
                },
                ValidationError::RegexMismatch {
                    field: "PROD_QUANT[1]".to_string(),
                    value: "two".to_string(),
                    pattern: r"\d+".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_bare_cart_key_does_not_hide_indexed_entries() {
        let rules = cart_rules();
        let mut registry = FieldRegistry::new();
        registry.insert("MODE", 'Q');
        registry.insert("PROD_ITEM[0]", "SG999999");
        registry.insert("PROD_QUANT", 5i64);
        registry.insert("PROD_QUANT[1]", "not-a-number");

        let errors = validate(&registry, &rules, Mode::Q);
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            &errors[0],
            ValidationError::LengthExceeded { field, max: 3, .. } if field == "PROD_QUANT[1]"
        ));
        assert_eq!(
            errors[1],
            ValidationError::RegexMismatch {
                field: "PROD_QUANT[1]".to_string(),
                value: "not-a-number".to_string(),
                pattern: r"\d+".to_string(),
            }
        );
    }

    #[test]
    fn test_one_field_can_fail_length_and_regex() {
        let rules = cart_rules();
        let mut registry = FieldRegistry::new();
        registry.insert("MODE", 'Q');
        registry.insert("PROD_ITEM[0]", "A");
        registry.insert("PROD_QUANT[0]", "abcd");

        let errors = validate(&registry, &rules, Mode::Q);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ValidationError::LengthExceeded { max: 3, .. }));
        assert!(matches!(errors[1], ValidationError::RegexMismatch { .. }));
    }

    #[test]
    fn test_length_counts_characters() {
        let rules = RuleSet::from_toml_str("[[rule]]\nfield = \"NAME\"\nmax_length = 4\n").unwrap();
        let mut registry = FieldRegistry::new();
        registry.insert("NAME", "Jörg");
        assert!(validate(&registry, &rules, Mode::Q).is_empty());
    }

    #[test]
    fn test_validation_is_pure() {
        let rules = cart_rules();
        let mut registry = FieldRegistry::new();
        registry.insert("MODE", 'Z');
        let before = registry.clone();

        let first = validate(&registry, &rules, Mode::Q);
        let second = validate(&registry, &rules, Mode::Q);
        assert_eq!(first, second);
        assert_eq!(registry, before);
    }

    fn ipad_errors(value: &str) -> Vec<ValidationError> {
        let mut registry = FieldRegistry::new();
        registry.insert(keys::IPAD, value);
        validate(&registry, &RuleSet::builtin().unwrap(), Mode::Q)
            .into_iter()
            .filter(|e| e.field() == keys::IPAD)
            .collect()
    }

    #[test]
    fn test_builtin_ipad_accepts_well_formed_addresses() {
        let accepted = [
            "8.8.8.8",
            "192.168.100.200",
            "255.255.255.255",
            "FE80:0000:0000:0000:0202:B3FF:FE1E:8329",
            "FE80::0202:B3FF:FE1E:8329",
            "::1",
            "1:2:3:4:5:6:1.2.3.4",
            "ABCD:ABCD:ABCD:ABCD:ABCD:ABCD:192.168.158.190",
            "::FFFF:129.144.52.38",
        ];
        for value in accepted {
            assert!(ipad_errors(value).is_empty(), "{value} should be accepted");
        }
    }

    #[test]
    fn test_builtin_ipad_rejects_malformed_addresses() {
        let rejected = [
            ":::::",
            "999.999.999.999",
            "127.0.0.256",
            "192.1.100.2048",
            "8.8.8",
            "2001:0:3238:mech:63::FEFB",
            "02001:0000:1234:0000:0000:C1C0:ABCD:0876",
            "2001:0000:1234:0000:0000:C1C0:ABCD:0876  0",
            "3ffe:0b00:0000:0001:0000:0000:000a",
            "FF02:0000:0000:0000:0000:0000:0000:0000:0001",
            "3ffe:b00::1::a",
            "::1111:2222:3333:4444:5555:6666::",
        ];
        for value in rejected {
            assert!(!ipad_errors(value).is_empty(), "{value} should be rejected");
        }
    }

    #[test]
    fn test_indexed_keys_requires_bracket() {
        let mut registry = FieldRegistry::new();
        registry.insert("PROD_TYPE[0]", "A");
        registry.insert("PROD_TYPEX", "B");
        registry.insert("PROD_TYPE[1]", "C");

        let found = indexed_keys(&registry, "PROD_TYPE");
        assert_eq!(found, vec!["PROD_TYPE[0]", "PROD_TYPE[1]"]);
    }
}
