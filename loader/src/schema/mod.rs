//! Record schemas: the explicit field table rows are validated against.
//!
//! A [`RowSchema`] is built once per record type, either with
//! [`RowSchema::builder`] or by deserializing a JSON schema file:
//!
//! ```json
//! {
//!   "fields": [
//!     { "name": "index", "type": "integer" },
//!     { "name": "website", "type": "string", "required": false }
//!   ],
//!   "normalization": {
//!     "strip_whitespace": true,
//!     "empty_optional_str_fields_to_none": ["__all__"],
//!     "bool_literals": { "true_literal": "1", "false_literal": "0" }
//!   }
//! }
//! ```
//!
//! Rust types opt in by implementing [`CsvRecord`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::error::{ConfigError, ConfigResult};

/// Token in `empty_optional_str_fields_to_none` meaning "every field".
pub const ALL_FIELDS: &str = "__all__";

// =============================================================================
// Field Types
// =============================================================================

/// Primitive type a field is declared with.
///
/// Optionality is carried separately by [`FieldSpec::required`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Integer,
    /// 64-bit floating point
    Float,
    /// Boolean, parsed from the configured literal pair
    Boolean,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, FieldType::String)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Metadata for one target field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name, also the key rows are mapped to
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the field must hold a value
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType, required: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            required,
        }
    }

    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, field_type, true)
    }

    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, field_type, false)
    }
}

// =============================================================================
// Normalization Config
// =============================================================================

/// Which optional string fields turn into `None` when empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EmptyStrPolicy {
    /// Every optional string field.
    #[default]
    All,
    /// Only the named fields. An empty set disables the conversion.
    Fields(BTreeSet<String>),
}

impl EmptyStrPolicy {
    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from(names.into_iter().map(Into::into).collect::<Vec<String>>())
    }

    /// Policy that keeps every empty string as-is.
    pub fn none() -> Self {
        Self::Fields(BTreeSet::new())
    }

    pub fn applies_to(&self, field: &str) -> bool {
        match self {
            Self::All => true,
            Self::Fields(names) => names.contains(field),
        }
    }
}

impl From<Vec<String>> for EmptyStrPolicy {
    fn from(names: Vec<String>) -> Self {
        if names.iter().any(|n| n == ALL_FIELDS) {
            Self::All
        } else {
            Self::Fields(names.into_iter().collect())
        }
    }
}

impl From<EmptyStrPolicy> for Vec<String> {
    fn from(policy: EmptyStrPolicy) -> Self {
        match policy {
            EmptyStrPolicy::All => vec![ALL_FIELDS.to_string()],
            EmptyStrPolicy::Fields(names) => names.into_iter().collect(),
        }
    }
}

impl Serialize for EmptyStrPolicy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Vec::<String>::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EmptyStrPolicy {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<String>::deserialize(deserializer).map(Self::from)
    }
}

/// Literal pair recognised for boolean fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolLiterals {
    pub true_literal: String,
    pub false_literal: String,
}

impl BoolLiterals {
    pub fn new(true_literal: impl Into<String>, false_literal: impl Into<String>) -> Self {
        Self {
            true_literal: true_literal.into(),
            false_literal: false_literal.into(),
        }
    }

    /// Resolve a (stripped) cell to a boolean, `None` for anything else.
    pub fn parse(&self, value: &str) -> Option<bool> {
        if value == self.true_literal {
            Some(true)
        } else if value == self.false_literal {
            Some(false)
        } else {
            None
        }
    }
}

impl Default for BoolLiterals {
    fn default() -> Self {
        Self::new("1", "0")
    }
}

/// Per-record-type normalization settings applied before type validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationConfig {
    /// Strip leading/trailing whitespace from every string cell
    #[serde(default = "default_strip_whitespace")]
    pub strip_whitespace: bool,

    /// Optional string fields converted to `None` when empty
    #[serde(default)]
    pub empty_optional_str_fields_to_none: EmptyStrPolicy,

    /// Literals parsed as `true` / `false` for boolean fields
    #[serde(default)]
    pub bool_literals: BoolLiterals,
}

fn default_strip_whitespace() -> bool {
    true
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            strip_whitespace: default_strip_whitespace(),
            empty_optional_str_fields_to_none: EmptyStrPolicy::default(),
            bool_literals: BoolLiterals::default(),
        }
    }
}

impl NormalizationConfig {
    pub fn with_strip_whitespace(mut self, strip: bool) -> Self {
        self.strip_whitespace = strip;
        self
    }

    pub fn with_empty_str_policy(mut self, policy: EmptyStrPolicy) -> Self {
        self.empty_optional_str_fields_to_none = policy;
        self
    }

    pub fn with_bool_literals(mut self, literals: BoolLiterals) -> Self {
        self.bool_literals = literals;
        self
    }
}

// =============================================================================
// Row Schema
// =============================================================================

/// Field table for one record type, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSchema {
    fields: Vec<FieldSpec>,
    #[serde(default)]
    normalization: NormalizationConfig,
}

impl RowSchema {
    pub fn builder() -> RowSchemaBuilder {
        RowSchemaBuilder::default()
    }

    /// Parse and check a schema from its JSON representation.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let schema: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError::InvalidSchema(e.to_string()))?;
        schema.validate_structure()?;
        Ok(schema)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Validates the schema structure itself (not a row).
    pub fn validate_structure(&self) -> ConfigResult<()> {
        if self.fields.is_empty() {
            return Err(ConfigError::InvalidSchema("schema declares no fields".into()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(ConfigError::InvalidSchema("field name cannot be empty".into()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::InvalidSchema(format!(
                    "field '{}' declared more than once",
                    field.name
                )));
            }
        }

        let literals = &self.normalization.bool_literals;
        if literals.true_literal == literals.false_literal {
            return Err(ConfigError::InvalidSchema(format!(
                "boolean literals must differ, both are '{}'",
                literals.true_literal
            )));
        }

        Ok(())
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn normalization(&self) -> &NormalizationConfig {
        &self.normalization
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`RowSchema`].
#[derive(Debug, Clone, Default)]
pub struct RowSchemaBuilder {
    fields: Vec<FieldSpec>,
    normalization: NormalizationConfig,
}

impl RowSchemaBuilder {
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn required(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.field(FieldSpec::required(name, field_type))
    }

    pub fn optional(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.field(FieldSpec::optional(name, field_type))
    }

    pub fn required_string(self, name: impl Into<String>) -> Self {
        self.required(name, FieldType::String)
    }

    pub fn optional_string(self, name: impl Into<String>) -> Self {
        self.optional(name, FieldType::String)
    }

    pub fn required_int(self, name: impl Into<String>) -> Self {
        self.required(name, FieldType::Integer)
    }

    pub fn optional_int(self, name: impl Into<String>) -> Self {
        self.optional(name, FieldType::Integer)
    }

    pub fn required_float(self, name: impl Into<String>) -> Self {
        self.required(name, FieldType::Float)
    }

    pub fn optional_float(self, name: impl Into<String>) -> Self {
        self.optional(name, FieldType::Float)
    }

    pub fn required_bool(self, name: impl Into<String>) -> Self {
        self.required(name, FieldType::Boolean)
    }

    pub fn optional_bool(self, name: impl Into<String>) -> Self {
        self.optional(name, FieldType::Boolean)
    }

    pub fn normalization(mut self, config: NormalizationConfig) -> Self {
        self.normalization = config;
        self
    }

    pub fn build(self) -> ConfigResult<RowSchema> {
        let schema = RowSchema {
            fields: self.fields,
            normalization: self.normalization,
        };
        schema.validate_structure()?;
        Ok(schema)
    }
}

/// A Rust type that rows can be loaded into.
///
/// `schema()` describes the fields in declaration order; once a row passes
/// validation it is converted into `Self` through serde, so field names must
/// match the `Deserialize` representation.
pub trait CsvRecord: DeserializeOwned {
    fn schema() -> RowSchema;
}

/// Example schema for an organizations export.
pub fn example_schema() -> RowSchema {
    RowSchema {
        fields: vec![
            FieldSpec::required("index", FieldType::Integer),
            FieldSpec::required("organization_id", FieldType::String),
            FieldSpec::required("name", FieldType::String),
            FieldSpec::optional("random_float", FieldType::Float),
            FieldSpec::required("website", FieldType::String),
            FieldSpec::required("country", FieldType::String),
            FieldSpec::required("description", FieldType::String),
            FieldSpec::required("founded", FieldType::Integer),
            FieldSpec::required("industry", FieldType::String),
            FieldSpec::required("number_of_employees", FieldType::Integer),
        ],
        normalization: NormalizationConfig::default(),
    }
}
