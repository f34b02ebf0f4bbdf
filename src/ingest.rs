//! CSV ingestion: uploaded bytes to an ordered column list plus raw rows.
//!
//! The first record names the columns. Every later record becomes a
//! [`RawRow`] keyed by those names. Cells stay plain strings; nothing is
//! coerced. A malformed file fails as a whole, there is no partial recovery.
//!
//! The file-type gate ([`check_file_type`]) runs before any byte is read so
//! a rejected upload never reaches the parser.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result as AnyResult};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};
use serde::Serialize;

use crate::{
    error::{ReconcileError, Result, ValidationError},
    io_utils,
};

/// Upload limit advertised by the import wizard.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

const CSV_MIME_TYPE: &str = "text/csv";

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: io_utils::DEFAULT_CSV_DELIMITER,
            encoding: UTF_8,
        }
    }
}

/// One data record keyed by source column name.
///
/// Columns missing from a short record are absent rather than empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RawRow {
    values: BTreeMap<String, String>,
}

impl RawRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<String>,
{
    /// Collects `(column, value)` pairs; the first pair for a column wins.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut values = BTreeMap::new();
        for (column, value) in iter {
            values.entry(column.into()).or_insert_with(|| value.into());
        }
        Self { values }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl ParsedTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Row values laid out in header order, absent cells as empty strings.
    pub fn grid(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|column| row.get(column).unwrap_or_default().to_string())
                    .collect()
            })
            .collect()
    }
}

pub fn check_file_type(name: &str) -> Result<()> {
    if has_csv_extension(name) {
        Ok(())
    } else {
        Err(ReconcileError::InvalidFileType {
            name: name.to_string(),
        })
    }
}

/// Accepts an upload when either the declared MIME type or the file name
/// identifies it as CSV.
pub fn check_upload(name: &str, mime_type: Option<&str>) -> Result<()> {
    let mime_matches = mime_type
        .map(|mime| mime.trim().eq_ignore_ascii_case(CSV_MIME_TYPE))
        .unwrap_or(false);
    if mime_matches {
        return Ok(());
    }
    check_file_type(name)
}

fn has_csv_extension(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".csv")
}

pub fn parse(bytes: &[u8], options: &ParseOptions) -> Result<ParsedTable> {
    let text = io_utils::decode_bytes(bytes, options.encoding).ok_or_else(|| {
        ReconcileError::parse(
            None,
            format!("input is not valid {}", options.encoding.name()),
        )
    })?;

    if let Some(line) = find_unterminated_quote(&text, options.delimiter) {
        return Err(ReconcileError::parse(
            Some(line),
            "unterminated quoted field",
        ));
    }

    let mut reader = io_utils::open_csv_reader(text.as_bytes(), options.delimiter);
    let mut records = reader.records();

    let columns = loop {
        match records.next() {
            None => return Err(ReconcileError::parse(None, "input has no header line")),
            Some(record) => {
                let record = record.map_err(csv_error)?;
                if !is_blank_line(&text, &record) {
                    break record.iter().map(str::to_string).collect::<Vec<String>>();
                }
            }
        }
    };
    debug!("Detected {} column(s): {:?}", columns.len(), columns);

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(csv_error)?;
        if is_blank_line(&text, &record) {
            continue;
        }
        if record.len() > columns.len() {
            return Err(ReconcileError::parse(
                record_line(&record),
                format!(
                    "record has {} field(s) but the header defines {}",
                    record.len(),
                    columns.len()
                ),
            ));
        }
        rows.push(
            columns
                .iter()
                .zip(record.iter())
                .map(|(column, value)| (column.as_str(), value))
                .collect::<RawRow>(),
        );
    }

    Ok(ParsedTable { columns, rows })
}

/// Reads and parses a file on disk.
///
/// The name check runs first, then the size limit, then the parse.
pub fn read_csv_file(path: &Path, options: &ParseOptions, max_bytes: u64) -> AnyResult<ParsedTable> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    check_file_type(&name)?;

    let size = fs::metadata(path)
        .with_context(|| format!("Reading metadata for {path:?}"))?
        .len();
    if size > max_bytes {
        return Err(ReconcileError::from(ValidationError::FileTooLarge {
            name,
            size,
            limit: max_bytes,
        })
        .into());
    }

    let bytes = fs::read(path).with_context(|| format!("Opening input file {path:?}"))?;
    let table = parse(&bytes, options)?;
    info!(
        "Parsed {} row(s) across {} column(s) from {:?} using delimiter '{}'",
        table.row_count(),
        table.columns.len(),
        path,
        io_utils::printable_delimiter(options.delimiter)
    );
    Ok(table)
}

fn csv_error(err: csv::Error) -> ReconcileError {
    let line = err.position().map(|pos| pos.line());
    ReconcileError::parse(line, err.to_string())
}

fn record_line(record: &csv::StringRecord) -> Option<u64> {
    record.position().map(|pos| pos.line())
}

/// A record is a blank line only when its source line holds nothing but
/// whitespace. A quoted empty value such as `""` is data.
fn is_blank_line(text: &str, record: &csv::StringRecord) -> bool {
    if record.len() > 1 {
        return false;
    }
    let Some(start) = record
        .position()
        .and_then(|pos| usize::try_from(pos.byte()).ok())
    else {
        return false;
    };
    // The reader discards empty lines as part of the next record, so its
    // position can point at them.
    text.get(start..)
        .map(|rest| rest.trim_start_matches(['\r', '\n']))
        .and_then(|rest| rest.lines().next())
        .is_none_or(|line| line.trim().is_empty())
}

/// Returns the line on which a quoted field opens without ever closing.
///
/// A quote only opens a field when it is the field's first character; inside
/// a quoted field `""` is an escaped quote.
fn find_unterminated_quote(text: &str, delimiter: u8) -> Option<u64> {
    let bytes = text.as_bytes();
    let mut line = 1u64;
    let mut open_at: Option<u64> = None;
    let mut field_start = true;
    let mut idx = 0;

    while idx < bytes.len() {
        let byte = bytes[idx];
        if open_at.is_some() {
            match byte {
                b'"' if bytes.get(idx + 1) == Some(&b'"') => idx += 1,
                b'"' => open_at = None,
                b'\n' => line += 1,
                _ => {}
            }
        } else if byte == b'"' && field_start {
            open_at = Some(line);
            field_start = false;
        } else if byte == b'\n' {
            line += 1;
            field_start = true;
        } else {
            field_start = byte == delimiter || byte == b'\r';
        }
        idx += 1;
    }

    open_at
}
