//! Row source: raw CSV bytes to rows of string cells.
//!
//! Handles encoding and delimiter auto-detection and leaves quoting and
//! escaping to the `csv` crate. Rows come out untouched (no trimming, no
//! header handling); that is the loader's job.

use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{SourceError, SourceResult};

/// Rows read from a source, with the settings used to read them.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedSource {
    /// Raw rows, one `Vec` of cells per CSV record
    pub rows: Vec<Vec<String>>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown labels and malformed input fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let encoding = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => encoding_rs::UTF_8,
        // WHATWG maps latin1 onto windows-1252
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::WINDOWS_1252,
        label => match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(enc) => enc,
            None => {
                warn!(encoding = label, "unknown encoding, decoding as UTF-8");
                encoding_rs::UTF_8
            }
        },
    };

    let (decoded, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(encoding = used.name(), "malformed input replaced while decoding");
    }
    decoded.into_owned()
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Split CSV content into rows of cells.
///
/// Rows may have different lengths; nothing is treated as a header.
pub fn read_rows<R: Read>(reader: R, delimiter: char) -> SourceResult<Vec<Vec<String>>> {
    let delimiter_byte = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(SourceError::InvalidDelimiter(delimiter))?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter_byte)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(String::from).collect());
    }

    Ok(rows)
}

/// Parse CSV text with an explicit delimiter.
pub fn parse_str(content: &str, delimiter: char) -> SourceResult<Vec<Vec<String>>> {
    read_rows(content.as_bytes(), delimiter)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> SourceResult<ParsedSource> {
    parse_bytes(bytes, None)
}

/// Parse CSV bytes, auto-detecting the delimiter unless one is given.
pub fn parse_bytes(bytes: &[u8], delimiter: Option<char>) -> SourceResult<ParsedSource> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));

    debug!(%encoding, ?delimiter, "reading csv content");
    let rows = parse_str(&content, delimiter)?;

    Ok(ParsedSource {
        rows,
        encoding,
        delimiter,
    })
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn read_file_auto<P: AsRef<Path>>(path: P) -> SourceResult<ParsedSource> {
    read_file(path, None)
}

/// Parse a CSV file, auto-detecting the delimiter unless one is given.
pub fn read_file<P: AsRef<Path>>(path: P, delimiter: Option<char>) -> SourceResult<ParsedSource> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes, delimiter)
}
