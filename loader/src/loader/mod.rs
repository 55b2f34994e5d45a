//! CSV loader: drives a row source through mapping and validation.
//!
//! # Example
//!
//! ```rust,ignore
//! use csvload::{CsvLoader, LoaderOptions, RowSchema};
//!
//! let schema = RowSchema::builder()
//!     .required_int("index")
//!     .required_string("organization_id")
//!     .build()?;
//!
//! let rows = vec![
//!     vec!["Index", "Organization Id"],
//!     vec!["1", "FAB0d41d5b5d22c"],
//!     vec!["oops", "6A7EdDEA9FaDC52"],
//! ];
//!
//! let options = LoaderOptions { aggregate_errors: true, ..Default::default() };
//! let result = CsvLoader::new(rows, schema, options)?.load()?;
//!
//! for error in &result.errors {
//!     eprintln!("{error}");
//! }
//! for row in &result.rows {
//!     println!("{:?}", row.get("organization_id"));
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::error::{ConfigError, ConfigResult, LoaderResult, MappingError, RowError, RowFailure};
use crate::mapping::{ByFieldOrder, MappingStrategy};
use crate::models::{LoadResult, RowRecord};
use crate::schema::{CsvRecord, RowSchema};
use crate::validation::validate_record;

// =============================================================================
// Options
// =============================================================================

/// Options for a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderOptions {
    /// Row 0 is a header, not data. An empty row 0 means there is no header
    #[serde(default = "default_has_header")]
    pub has_header: bool,

    /// Collect row errors and keep going instead of stopping at the first one
    #[serde(default)]
    pub aggregate_errors: bool,
}

fn default_has_header() -> bool {
    true
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            has_header: default_has_header(),
            aggregate_errors: false,
        }
    }
}

// =============================================================================
// Raw Rows
// =============================================================================

/// One row of raw string cells, as produced by a CSV reader.
pub trait RawRow {
    fn cells(&self) -> Vec<&str>;
}

impl<S: AsRef<str>> RawRow for [S] {
    fn cells(&self) -> Vec<&str> {
        self.iter().map(AsRef::<str>::as_ref).collect()
    }
}

impl<S: AsRef<str>> RawRow for Vec<S> {
    fn cells(&self) -> Vec<&str> {
        self.as_slice().cells()
    }
}

impl<S: AsRef<str>, const N: usize> RawRow for [S; N] {
    fn cells(&self) -> Vec<&str> {
        self.as_slice().cells()
    }
}

impl RawRow for csv::StringRecord {
    fn cells(&self) -> Vec<&str> {
        self.iter().collect()
    }
}

impl<T: RawRow + ?Sized> RawRow for &T {
    fn cells(&self) -> Vec<&str> {
        (**self).cells()
    }
}

// =============================================================================
// Loader
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    AwaitingHeader,
    Reading,
}

/// Loads rows from a source into validated records.
///
/// A loader is consumed by [`CsvLoader::load`], so its header is captured
/// at most once.
pub struct CsvLoader<I> {
    rows: I,
    schema: RowSchema,
    options: LoaderOptions,
    strategy: Box<dyn MappingStrategy>,
}

impl<I> CsvLoader<I>
where
    I: Iterator,
    I::Item: RawRow,
{
    /// Loader mapping cells to fields in declaration order.
    pub fn new<R>(rows: R, schema: RowSchema, options: LoaderOptions) -> ConfigResult<Self>
    where
        R: IntoIterator<IntoIter = I>,
    {
        let strategy = Box::new(ByFieldOrder::new(&schema));
        Self::with_mapping_strategy(rows, schema, options, strategy)
    }

    /// Loader with an explicit mapping strategy.
    ///
    /// Fails with a [`ConfigError`] when the strategy's preconditions are
    /// not met by `options`.
    pub fn with_mapping_strategy<R>(
        rows: R,
        schema: RowSchema,
        options: LoaderOptions,
        strategy: Box<dyn MappingStrategy>,
    ) -> ConfigResult<Self>
    where
        R: IntoIterator<IntoIter = I>,
    {
        strategy.validate_configuration(&options)?;

        Ok(Self {
            rows: rows.into_iter(),
            schema,
            options,
            strategy,
        })
    }

    /// Loader for a type implementing [`CsvRecord`].
    pub fn for_record<T, R>(rows: R, options: LoaderOptions) -> ConfigResult<Self>
    where
        T: CsvRecord,
        R: IntoIterator<IntoIter = I>,
    {
        Self::new(rows, T::schema(), options)
    }

    pub fn schema(&self) -> &RowSchema {
        &self.schema
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Read every row of the source.
    ///
    /// In fail-fast mode the first failing row aborts the load and is
    /// returned as [`crate::LoaderError::Row`]; in aggregate mode failing rows
    /// are collected in [`LoadResult::errors`] and the load runs to the end.
    pub fn load(self) -> LoaderResult<LoadResult> {
        let Self {
            rows,
            schema,
            options,
            mut strategy,
        } = self;

        let span = info_span!("load", fields = schema.len(), aggregate = options.aggregate_errors);
        let _enter = span.enter();

        let mut result = LoadResult::new(&schema);
        let mut state = if options.has_header {
            LoadState::AwaitingHeader
        } else {
            LoadState::Reading
        };

        for (line_number, row) in rows.enumerate() {
            let cells = row.cells();

            if cells.is_empty() {
                debug!(line_number, "skipping empty row");
                // only row 0 can be the header
                if state == LoadState::AwaitingHeader {
                    state = LoadState::Reading;
                }
                continue;
            }

            if state == LoadState::AwaitingHeader {
                let header: Vec<String> = cells.iter().map(|c| c.trim().to_string()).collect();
                debug!(line_number, columns = header.len(), "captured header");
                strategy.set_header(&header);
                result.header = header;
                state = LoadState::Reading;
                continue;
            }

            match build_record(strategy.as_ref(), &schema, &cells) {
                Ok(record) => result.rows.push(record),
                Err(RowFailure::Mapping(MappingError::HeaderNotSet)) => {
                    return Err(ConfigError::HeaderNotSet.into());
                }
                Err(cause) => {
                    let error = RowError::new(line_number, cause);
                    if !options.aggregate_errors {
                        debug!(line_number, "aborting load on first row error");
                        return Err(error.into());
                    }
                    warn!(line_number, %error, "row rejected");
                    result.errors.push(error);
                }
            }
        }

        info!(
            rows = result.rows.len(),
            errors = result.errors.len(),
            "load finished"
        );
        Ok(result)
    }
}

/// Map and validate one row.
fn build_record(
    strategy: &dyn MappingStrategy,
    schema: &RowSchema,
    cells: &[&str],
) -> Result<RowRecord, RowFailure> {
    let params = strategy.create_param_map(cells)?;
    validate_record(schema, &params).map_err(RowFailure::Validation)
}
