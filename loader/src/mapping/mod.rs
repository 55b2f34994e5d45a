//! Mapping strategies: turning a row of cells into a name→value mapping.
//!
//! - [`ByFieldOrder`] - cells are assigned to schema fields in declaration order
//! - [`ByHeader`] - cells are keyed by the captured header, with optional renames
//!
//! The loader owns exactly one strategy and asks it to check its
//! preconditions against the loader options before reading any row.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult, MappingError, MappingResult};
use crate::loader::LoaderOptions;
use crate::schema::RowSchema;

/// Name→value mapping consumed by validation.
pub type ParamMap = Map<String, Value>;

/// Builds a [`ParamMap`] from one row's cells.
pub trait MappingStrategy {
    /// Check the loader configuration this strategy will run under.
    fn validate_configuration(&self, _options: &LoaderOptions) -> ConfigResult<()> {
        Ok(())
    }

    /// Receive the captured (trimmed) header. Called at most once per load.
    fn set_header(&mut self, _header: &[String]) {}

    /// Map one row.
    fn create_param_map(&self, cells: &[&str]) -> MappingResult<ParamMap>;
}

// =============================================================================
// By Field Order
// =============================================================================

/// 1:1 assignment of cells to fields in declaration order.
///
/// Surplus cells are dropped; missing trailing cells leave their fields unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByFieldOrder {
    field_names: Vec<String>,
}

impl ByFieldOrder {
    pub fn new(schema: &RowSchema) -> Self {
        Self {
            field_names: schema.field_names().map(String::from).collect(),
        }
    }
}

impl MappingStrategy for ByFieldOrder {
    fn create_param_map(&self, cells: &[&str]) -> MappingResult<ParamMap> {
        Ok(self
            .field_names
            .iter()
            .zip(cells)
            .map(|(name, cell)| (name.clone(), Value::String((*cell).to_string())))
            .collect())
    }
}

// =============================================================================
// By Header
// =============================================================================

/// Renames a header label to a schema field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRemapField {
    pub header_field: String,
    pub model_attr: String,
}

impl HeaderRemapField {
    pub fn new(header_field: impl Into<String>, model_attr: impl Into<String>) -> Self {
        Self {
            header_field: header_field.into(),
            model_attr: model_attr.into(),
        }
    }
}

/// Parses `"Header Label=field_name"`.
impl FromStr for HeaderRemapField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (label, attr) = s
            .rsplit_once('=')
            .ok_or_else(|| format!("expected 'Header Label=field_name', got '{s}'"))?;
        let (label, attr) = (label.trim(), attr.trim());
        if label.is_empty() || attr.is_empty() {
            return Err(format!("expected 'Header Label=field_name', got '{s}'"));
        }
        Ok(Self::new(label, attr))
    }
}

/// Cells keyed by header column. Requires header mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByHeader {
    header: Option<Vec<String>>,
    header_remap: Vec<HeaderRemapField>,
}

impl ByHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remap(header_remap: Vec<HeaderRemapField>) -> Self {
        Self {
            header: None,
            header_remap,
        }
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    fn remap(&self, mut mapping: ParamMap) -> ParamMap {
        for remap in &self.header_remap {
            if let Some(value) = mapping.remove(&remap.header_field) {
                mapping.insert(remap.model_attr.clone(), value);
            }
        }
        mapping
    }
}

impl MappingStrategy for ByHeader {
    fn validate_configuration(&self, options: &LoaderOptions) -> ConfigResult<()> {
        if !options.has_header {
            return Err(ConfigError::HeaderRequired);
        }
        Ok(())
    }

    fn set_header(&mut self, header: &[String]) {
        self.header = Some(header.to_vec());
    }

    fn create_param_map(&self, cells: &[&str]) -> MappingResult<ParamMap> {
        let header = self.header.as_ref().ok_or(MappingError::HeaderNotSet)?;

        if cells.len() > header.len() {
            return Err(MappingError::OutOfHeaderBounds {
                cells: cells.len(),
                columns: header.len(),
            });
        }

        let mapping: ParamMap = header
            .iter()
            .zip(cells)
            .map(|(label, cell)| (label.clone(), Value::String((*cell).to_string())))
            .collect();

        Ok(self.remap(mapping))
    }
}
