//! # csvload - CSV rows to validated records
//!
//! csvload turns rows of raw CSV cells into validated, typed records. Every
//! field is normalized (whitespace, empty optionals, boolean literals) before
//! it is coerced into its declared type, and failing rows are either reported
//! immediately or collected alongside the rows that did load.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Row source │────▶│   Mapping   │────▶│ Normalize + │────▶│ LoadResult  │
//! │ (csv cells) │     │  strategy   │     │  validate   │     │ rows+errors │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use csvload::{parser, CsvLoader, LoaderOptions, RowSchema};
//!
//! let schema = RowSchema::builder()
//!     .required_int("index")
//!     .required_string("name")
//!     .optional_float("score")
//!     .build()?;
//!
//! let source = parser::read_file_auto("people.csv")?;
//! let options = LoaderOptions { aggregate_errors: true, ..Default::default() };
//! let result = CsvLoader::new(source.rows, schema, options)?.load()?;
//!
//! println!("{}", result.summary());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Layered error types
//! - [`schema`] - Field table and normalization config
//! - [`normalize`] - Pre-validation normalization policy
//! - [`validation`] - Type coercion and row validation
//! - [`mapping`] - Row mapping strategies
//! - [`models`] - Records, record collections and load results
//! - [`loader`] - The loader itself
//! - [`parser`] - CSV row source with encoding/delimiter detection

// Core modules
pub mod error;
pub mod models;
pub mod schema;

// Pipeline
pub mod loader;
pub mod mapping;
pub mod normalize;
pub mod validation;

// Row source
pub mod parser;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, FieldError, LoaderError, MappingError, RecordError, RowError, RowFailure,
    SourceError,
};

// =============================================================================
// Re-exports - Schema
// =============================================================================

pub use schema::{
    example_schema, BoolLiterals, CsvRecord, EmptyStrPolicy, FieldSpec, FieldType,
    NormalizationConfig, RowSchema, RowSchemaBuilder,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{DuplicateGroup, FieldValue, LoadResult, RowRecord, RowRecordCollection};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use loader::{CsvLoader, LoaderOptions, RawRow};
pub use mapping::{ByFieldOrder, ByHeader, HeaderRemapField, MappingStrategy, ParamMap};
pub use normalize::{normalize_value, Normalized};
pub use validation::{coerce_value, validate_record};

// =============================================================================
// Re-exports - Row source
// =============================================================================

pub use parser::{parse_bytes_auto, read_file_auto, ParsedSource};
