//! Error types for the csvload pipeline.
//!
//! Errors are grouped by the layer that produces them:
//!
//! - [`ConfigError`] - loader/strategy preconditions, raised at construction
//! - [`FieldError`] - a single field failing normalization or type coercion
//! - [`MappingError`] - a mapping strategy unable to build a parameter map
//! - [`RowFailure`] / [`RowError`] - everything that went wrong with one row
//! - [`LoaderError`] - top-level result of a load
//! - [`RecordError`] - record collection queries and typed deserialization
//! - [`SourceError`] - reading and splitting the raw CSV input
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::schema::FieldType;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Loader or mapping strategy preconditions that are not met.
///
/// These are never aggregated: they always abort the load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Header-based mapping selected while header mode is off.
    #[error("Header must be enabled in order to map rows by header")]
    HeaderRequired,

    /// Header-based mapping used before any header was captured.
    #[error("Header must be set in order to map rows by header")]
    HeaderNotSet,

    /// The record schema itself is malformed.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}

// =============================================================================
// Field Errors
// =============================================================================

/// A single field that could not be turned into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Required field is absent after normalization.
    #[error("field '{field}': value is required")]
    Missing { field: String },

    /// Value cannot be parsed into the declared type.
    #[error("field '{field}': expected {expected}, got '{value}'")]
    InvalidType {
        field: String,
        value: String,
        expected: FieldType,
    },
}

impl FieldError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }

    pub fn invalid_type(field: impl Into<String>, value: impl Into<String>, expected: FieldType) -> Self {
        Self::InvalidType {
            field: field.into(),
            value: value.into(),
            expected,
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::Missing { field } | Self::InvalidType { field, .. } => field,
        }
    }
}

// =============================================================================
// Mapping Errors
// =============================================================================

/// Errors raised by a [`crate::mapping::MappingStrategy`] for a single row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// No header has been handed to the strategy yet.
    #[error("Header must be set in order to map rows by header")]
    HeaderNotSet,

    /// The row has more cells than the header has columns.
    #[error("Row value index out of header bounds ({cells} cells, {columns} header columns)")]
    OutOfHeaderBounds { cells: usize, columns: usize },
}

// =============================================================================
// Row Errors
// =============================================================================

/// Why a single row did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowFailure {
    /// One or more fields failed validation. Never empty.
    #[error("{} validation error(s): {}", .0.len(), join_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// The mapping strategy could not build a parameter map.
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl RowFailure {
    /// Field-level failures, empty for mapping failures.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation(errors) => errors,
            Self::Mapping(_) => &[],
        }
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A failed row together with its position in the source.
///
/// `line_number` is the 0-based index of the row in the iteration over the
/// source, counting the header row and skipped empty rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error at line {line_number}: {cause}")]
pub struct RowError {
    pub line_number: usize,
    #[source]
    pub cause: RowFailure,
}

impl RowError {
    pub fn new(line_number: usize, cause: impl Into<RowFailure>) -> Self {
        Self {
            line_number,
            cause: cause.into(),
        }
    }

    /// 1-based line, as a text editor would show it.
    pub fn source_line(&self) -> usize {
        self.line_number + 1
    }
}

// =============================================================================
// Loader Errors (top-level)
// =============================================================================

/// Top-level errors returned by [`crate::loader::CsvLoader::load`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// First failing row in fail-fast mode.
    #[error(transparent)]
    Row(#[from] RowError),
}

// =============================================================================
// Record Errors
// =============================================================================

/// Errors from querying or converting validated records.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Field name not declared by the schema.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Validated record does not fit the target Rust type.
    #[error("Cannot build record: {0}")]
    Deserialize(#[from] serde_json::Error),
}

// =============================================================================
// Source Errors
// =============================================================================

/// Errors while reading and splitting raw CSV input.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    Parse(#[from] csv::Error),

    /// Delimiter must fit in a single byte.
    #[error("Delimiter must be a single-byte character, got '{0}'")]
    InvalidDelimiter(char),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration checks.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for mapping strategies.
pub type MappingResult<T> = Result<T, MappingError>;

/// Result type for loads.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Result type for record queries.
pub type RecordResult<T> = Result<T, RecordError>;

/// Result type for row source operations.
pub type SourceResult<T> = Result<T, SourceError>;
