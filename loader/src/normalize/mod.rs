//! Field normalization applied to every raw value before type validation.
//!
//! Rules, in order:
//!
//! 1. non-textual values pass through (`null` becomes absent)
//! 2. whitespace is stripped when the config says so
//! 3. boolean fields resolve against the configured literal pair, anything
//!    else becomes absent
//! 4. non-empty strings are returned as-is
//! 5. empty values of non-string fields become absent
//! 6. empty values of string fields become absent only for optional fields
//!    covered by `empty_optional_str_fields_to_none`
//!
//! Empty required numeric cells therefore reach the type layer as absent and
//! fail there with a "value is required" error, while empty strings stay
//! empty strings unless the schema opts in.

use serde_json::Value;

use crate::schema::{FieldSpec, FieldType, NormalizationConfig};

/// Outcome of normalizing one value.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// No value: feeds optional-field handling.
    Absent,
    /// Value to hand to type coercion.
    Value(Value),
}

impl Normalized {
    pub fn is_absent(&self) -> bool {
        matches!(self, Normalized::Absent)
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Normalized::Absent => None,
            Normalized::Value(v) => Some(v),
        }
    }
}

/// Normalize a raw value for the given field.
pub fn normalize_value(value: &Value, spec: &FieldSpec, config: &NormalizationConfig) -> Normalized {
    let raw = match value {
        Value::String(s) => s.as_str(),
        Value::Null => return Normalized::Absent,
        other => return Normalized::Value(other.clone()),
    };

    let stripped = if config.strip_whitespace { raw.trim() } else { raw };

    if spec.field_type == FieldType::Boolean {
        return match config.bool_literals.parse(stripped) {
            Some(b) => Normalized::Value(Value::Bool(b)),
            None => Normalized::Absent,
        };
    }

    if !stripped.is_empty() {
        return Normalized::Value(Value::String(stripped.to_string()));
    }

    if !spec.field_type.is_string() {
        return Normalized::Absent;
    }

    if !spec.required && config.empty_optional_str_fields_to_none.applies_to(&spec.name) {
        return Normalized::Absent;
    }

    Normalized::Value(Value::String(String::new()))
}

/// Normalize a raw string cell.
pub fn normalize_str(raw: &str, spec: &FieldSpec, config: &NormalizationConfig) -> Normalized {
    normalize_value(&Value::String(raw.to_string()), spec, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BoolLiterals, EmptyStrPolicy};
    use serde_json::json;

    fn norm(raw: &str, spec: &FieldSpec) -> Normalized {
        normalize_str(raw, spec, &NormalizationConfig::default())
    }

    #[test]
    fn test_strip_all_whitespace_classes() {
        let spec = FieldSpec::required("name", FieldType::String);
        assert_eq!(
            norm("\n\n   first string\t\t \u{a0}\n", &spec),
            Normalized::Value(json!("first string"))
        );
    }

    #[test]
    fn test_strip_disabled() {
        let spec = FieldSpec::required("name", FieldType::String);
        let config = NormalizationConfig::default().with_strip_whitespace(false);
        assert_eq!(
            normalize_str("  padded ", &spec, &config),
            Normalized::Value(json!("  padded "))
        );
    }

    #[test]
    fn test_stripping_is_idempotent() {
        let configs = [
            NormalizationConfig::default(),
            NormalizationConfig::default().with_strip_whitespace(false),
            NormalizationConfig::default().with_empty_str_policy(EmptyStrPolicy::none()),
        ];
        let specs = [
            FieldSpec::required("s", FieldType::String),
            FieldSpec::optional("s", FieldType::String),
            FieldSpec::required("i", FieldType::Integer),
            FieldSpec::optional("b", FieldType::Boolean),
        ];
        let inputs = ["  42 ", "", "   ", "\t1\n", "text", "0"];

        for config in &configs {
            for spec in &specs {
                for input in inputs {
                    let once = normalize_str(input, spec, config);
                    if let Normalized::Value(v) = &once {
                        assert_eq!(normalize_value(v, spec, config), once);
                    }
                }
            }
        }
    }

    #[test]
    fn test_non_textual_passthrough() {
        let spec = FieldSpec::required("n", FieldType::Integer);
        let config = NormalizationConfig::default();
        assert_eq!(normalize_value(&json!(123), &spec, &config), Normalized::Value(json!(123)));
        assert_eq!(normalize_value(&json!(null), &spec, &config), Normalized::Absent);
    }

    #[test]
    fn test_empty_numeric_is_absent_regardless_of_policy() {
        let config = NormalizationConfig::default().with_empty_str_policy(EmptyStrPolicy::none());
        for spec in [
            FieldSpec::required("i", FieldType::Integer),
            FieldSpec::optional("i", FieldType::Integer),
            FieldSpec::required("f", FieldType::Float),
        ] {
            assert!(normalize_str("  ", &spec, &config).is_absent());
        }
    }

    #[test]
    fn test_empty_optional_string_default_policy() {
        let spec = FieldSpec::optional("note", FieldType::String);
        assert!(norm("", &spec).is_absent());
    }

    #[test]
    fn test_empty_optional_string_excluded_by_policy() {
        let spec = FieldSpec::optional("note", FieldType::String);
        let config = NormalizationConfig::default()
            .with_empty_str_policy(EmptyStrPolicy::fields(["other"]));
        assert_eq!(normalize_str("", &spec, &config), Normalized::Value(json!("")));
    }

    #[test]
    fn test_empty_required_string_stays_empty() {
        // listed in the policy, but required fields are never converted
        let spec = FieldSpec::required("name", FieldType::String);
        let config = NormalizationConfig::default()
            .with_empty_str_policy(EmptyStrPolicy::fields(["name"]));
        assert_eq!(normalize_str("   ", &spec, &config), Normalized::Value(json!("")));
    }

    #[test]
    fn test_bool_literals() {
        let spec = FieldSpec::optional("flag", FieldType::Boolean);
        let config = NormalizationConfig::default().with_bool_literals(BoolLiterals::new("YES", "NO"));

        assert_eq!(normalize_str(" YES ", &spec, &config), Normalized::Value(json!(true)));
        assert_eq!(normalize_str("NO", &spec, &config), Normalized::Value(json!(false)));
        assert!(normalize_str("", &spec, &config).is_absent());
        assert!(normalize_str("1", &spec, &config).is_absent());
        assert!(normalize_str("maybe", &spec, &config).is_absent());
    }

    #[test]
    fn test_default_bool_literals() {
        let spec = FieldSpec::required("flag", FieldType::Boolean);
        assert_eq!(norm("1", &spec), Normalized::Value(json!(true)));
        assert_eq!(norm("0", &spec), Normalized::Value(json!(false)));
        assert!(norm("true", &spec).is_absent());
    }
}
