//! Validated records and load results.
//!
//! - [`FieldValue`] - a typed field value
//! - [`RowRecord`] - one validated row, immutable
//! - [`RowRecordCollection`] - records in source order, with query helpers
//! - [`LoadResult`] - records, aggregated row errors and the captured header

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{RecordError, RecordResult, RowError};
use crate::schema::RowSchema;

// =============================================================================
// Field Value
// =============================================================================

/// A typed value held by a record field.
///
/// Floats compare and hash by bit pattern so values can be grouped; `NaN`
/// equals itself and `0.0` differs from `-0.0`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float value; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Str(s) => json!(s),
            FieldValue::Int(i) => json!(i),
            FieldValue::Float(f) => json!(f),
            FieldValue::Bool(b) => json!(b),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Str(a), FieldValue::Str(b)) => a == b,
            (FieldValue::Int(a), FieldValue::Int(b)) => a == b,
            (FieldValue::Float(a), FieldValue::Float(b)) => a.to_bits() == b.to_bits(),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FieldValue::Str(s) => s.hash(state),
            FieldValue::Int(i) => i.hash(state),
            FieldValue::Float(f) => f.to_bits().hash(state),
            FieldValue::Bool(b) => b.hash(state),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

// =============================================================================
// Row Record
// =============================================================================

/// One validated row: every schema field in declaration order, `None` when
/// the field is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    fields: Vec<(String, Option<FieldValue>)>,
}

impl RowRecord {
    pub(crate) fn new(fields: Vec<(String, Option<FieldValue>)>) -> Self {
        Self { fields }
    }

    /// Value of a field; `None` when absent or not declared.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.slot(name).and_then(Option::as_ref)
    }

    /// `Some(None)` for an absent field, `None` for an undeclared one.
    pub fn slot(&self, name: &str) -> Option<&Option<FieldValue>> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&FieldValue>)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON object with absent fields as `null`.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(n, v)| (n.clone(), v.as_ref().map_or(Value::Null, FieldValue::to_json)))
            .collect();
        Value::Object(map)
    }

    /// Convert into a caller-defined type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> RecordResult<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

impl Serialize for RowRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter().map(|(n, v)| (n, v)))
    }
}

// =============================================================================
// Record Collection
// =============================================================================

/// Records sharing one value of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup<'a> {
    /// Shared value, `None` when the field is absent in these records
    pub value: Option<&'a FieldValue>,
    /// Positions within the collection, ascending
    pub indices: Vec<usize>,
}

/// Records in source row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecordCollection {
    field_names: Vec<String>,
    rows: Vec<RowRecord>,
}

impl RowRecordCollection {
    pub fn new(schema: &RowSchema) -> Self {
        Self {
            field_names: schema.field_names().map(String::from).collect(),
            rows: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, record: RowRecord) {
        self.rows.push(record);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RowRecord> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RowRecord> {
        self.rows.iter()
    }

    pub fn as_slice(&self) -> &[RowRecord] {
        &self.rows
    }

    pub fn into_vec(self) -> Vec<RowRecord> {
        self.rows
    }

    fn check_field(&self, name: &str) -> RecordResult<()> {
        if self.field_names.iter().any(|n| n == name) {
            Ok(())
        } else {
            Err(RecordError::UnknownField(name.to_string()))
        }
    }

    /// Every value of a field, in record order.
    pub fn field_values(&self, name: &str) -> RecordResult<Vec<Option<&FieldValue>>> {
        self.check_field(name)?;
        Ok(self.rows.iter().map(|r| r.get(name)).collect())
    }

    /// Distinct values of a field. Callers must not rely on the order.
    pub fn field_values_unique(&self, name: &str) -> RecordResult<Vec<Option<&FieldValue>>> {
        let mut seen = HashSet::new();
        Ok(self
            .field_values(name)?
            .into_iter()
            .filter(|v| seen.insert(*v))
            .collect())
    }

    /// Values shared by more than one record, in order of first appearance.
    pub fn field_duplicates(&self, name: &str) -> RecordResult<Vec<DuplicateGroup<'_>>> {
        let mut groups: Vec<DuplicateGroup<'_>> = Vec::new();
        let mut positions: HashMap<Option<&FieldValue>, usize> = HashMap::new();

        for (index, value) in self.field_values(name)?.into_iter().enumerate() {
            match positions.get(&value) {
                Some(&g) => groups[g].indices.push(index),
                None => {
                    positions.insert(value, groups.len());
                    groups.push(DuplicateGroup {
                        value,
                        indices: vec![index],
                    });
                }
            }
        }

        groups.retain(|g| g.indices.len() > 1);
        Ok(groups)
    }

    /// Convert every record into a caller-defined type.
    pub fn deserialize_all<T: DeserializeOwned>(&self) -> RecordResult<Vec<T>> {
        self.rows.iter().map(|r| r.deserialize::<T>()).collect()
    }
}

impl<'a> IntoIterator for &'a RowRecordCollection {
    type Item = &'a RowRecord;
    type IntoIter = std::slice::Iter<'a, RowRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl IntoIterator for RowRecordCollection {
    type Item = RowRecord;
    type IntoIter = std::vec::IntoIter<RowRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

// =============================================================================
// Load Result
// =============================================================================

/// Result of a load: records, aggregated row errors and captured header.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    /// Successfully validated records
    pub rows: RowRecordCollection,
    /// Row errors, in encounter order (aggregate mode only)
    pub errors: Vec<RowError>,
    /// Trimmed header, empty when header mode is off
    pub header: Vec<String>,
}

impl LoadResult {
    pub fn new(schema: &RowSchema) -> Self {
        Self {
            rows: RowRecordCollection::new(schema),
            errors: Vec::new(),
            header: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        format!(
            "Loaded: {} records, {} errors",
            self.rows.len(),
            self.errors.len()
        )
    }

    /// Convert every record into a caller-defined type.
    pub fn deserialize_rows<T: DeserializeOwned>(&self) -> RecordResult<Vec<T>> {
        self.rows.deserialize_all()
    }

    /// JSON report with header, records and human-readable errors.
    pub fn to_json(&self) -> Value {
        let rows: Vec<Value> = self.rows.iter().map(RowRecord::to_json).collect();
        let errors: Vec<Value> = self
            .errors
            .iter()
            .map(|e| {
                json!({
                    "line": e.line_number,
                    "message": e.to_string(),
                })
            })
            .collect();

        json!({
            "header": self.header,
            "rows": rows,
            "errors": errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn schema() -> RowSchema {
        RowSchema::builder()
            .required_string("code")
            .optional_int("amount")
            .build()
            .unwrap()
    }

    fn collection(codes: &[&str]) -> RowRecordCollection {
        let mut rows = RowRecordCollection::new(&schema());
        for code in codes {
            rows.push(RowRecord::new(vec![
                ("code".to_string(), Some(FieldValue::from(*code))),
                ("amount".to_string(), None),
            ]));
        }
        rows
    }

    #[test]
    fn test_field_values_preserve_order() {
        let rows = collection(&["b", "a", "c"]);
        let values: Vec<_> = rows
            .field_values("code")
            .unwrap()
            .into_iter()
            .map(|v| v.and_then(FieldValue::as_str))
            .collect();
        assert_eq!(values, vec![Some("b"), Some("a"), Some("c")]);
    }

    #[test]
    fn test_field_values_unique() {
        let rows = collection(&["mno", "mno", "abc", "mno"]);
        let mut unique: Vec<&str> = rows
            .field_values_unique("code")
            .unwrap()
            .into_iter()
            .filter_map(|v| v.and_then(FieldValue::as_str))
            .collect();
        unique.sort_unstable();
        assert_eq!(unique, vec!["abc", "mno"]);
    }

    #[test]
    fn test_field_duplicates() {
        let rows = collection(&["mno", "mno", "mno", "abc"]);
        let dups = rows.field_duplicates("code").unwrap();

        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].value, Some(&FieldValue::from("mno")));
        assert_eq!(dups[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_field_duplicates_absent_values_grouped() {
        let rows = collection(&["x", "y"]);
        let dups = rows.field_duplicates("amount").unwrap();
        assert_eq!(dups, vec![DuplicateGroup { value: None, indices: vec![0, 1] }]);
    }

    #[test]
    fn test_unknown_field() {
        let rows = collection(&["a"]);
        assert!(matches!(
            rows.field_values("nope"),
            Err(RecordError::UnknownField(name)) if name == "nope"
        ));
        assert!(rows.field_duplicates("nope").is_err());
    }

    #[test]
    fn test_record_structural_equality() {
        let a = RowRecord::new(vec![("x".into(), Some(FieldValue::Float(1.5)))]);
        let b = RowRecord::new(vec![("x".into(), Some(FieldValue::Float(1.5)))]);
        let c = RowRecord::new(vec![("x".into(), None)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_record_slot_distinguishes_absent_and_undeclared() {
        let record = RowRecord::new(vec![("x".into(), None)]);
        assert_eq!(record.slot("x"), Some(&None));
        assert_eq!(record.slot("y"), None);
        assert_eq!(record.get("x"), None);
    }

    #[test]
    fn test_record_to_json_and_deserialize() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Row {
            code: String,
            amount: Option<i64>,
        }

        let record = RowRecord::new(vec![
            ("code".into(), Some(FieldValue::from("abc"))),
            ("amount".into(), None),
        ]);
        assert_eq!(record.to_json(), json!({"code": "abc", "amount": null}));
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"code": "abc", "amount": null})
        );
        assert_eq!(
            record.deserialize::<Row>().unwrap(),
            Row { code: "abc".into(), amount: None }
        );
    }

    #[test]
    fn test_load_result_has_errors() {
        use crate::error::{FieldError, RowFailure};

        let mut result = LoadResult::new(&schema());
        assert!(!result.has_errors());

        result.errors.push(RowError::new(
            2,
            RowFailure::Validation(vec![FieldError::missing("code")]),
        ));
        assert!(result.has_errors());
        assert_eq!(result.summary(), "Loaded: 0 records, 1 errors");
        assert_eq!(result.to_json()["errors"][0]["line"], 2);
    }
}
