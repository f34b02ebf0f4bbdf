use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{export::ExportFormat, ingest::DEFAULT_MAX_FILE_BYTES};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Map bank-transaction CSV files onto canonical accounting fields",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse a CSV file and preview its columns and first rows
    Inspect(InspectArgs),
    /// List the canonical fields rows are mapped onto
    Fields(FieldsArgs),
    /// Show how canonical fields map onto the columns of a CSV file
    Map(MapArgs),
    /// Project a CSV file onto canonical fields, apply edits, and export
    Review(ReviewArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Input CSV file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Reject input files larger than this many bytes
    #[arg(long = "max-bytes", default_value_t = DEFAULT_MAX_FILE_BYTES)]
    pub max_bytes: u64,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Number of rows to display (0 = all)
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}

#[derive(Debug, Args)]
pub struct FieldsArgs {
    /// YAML profile listing canonical fields (defaults to the built-in set)
    #[arg(short = 'f', long = "fields")]
    pub fields: Option<PathBuf>,
    /// Write the active field list to this YAML profile
    #[arg(long = "save")]
    pub save: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct MappingArgs {
    /// YAML profile listing canonical fields (defaults to the built-in set)
    #[arg(short = 'f', long = "fields")]
    pub fields: Option<PathBuf>,
    /// Saved bindings to apply on top of the automatic mapping
    #[arg(short = 'm', long = "mapping")]
    pub mapping: Option<PathBuf>,
    /// Bind a field to a column, e.g. `Amount=Debit` (repeatable)
    #[arg(long = "map", action = clap::ArgAction::Append)]
    pub bindings: Vec<String>,
    /// Leave a field unbound even if a column matches (repeatable)
    #[arg(long = "unmap", action = clap::ArgAction::Append)]
    pub unbind: Vec<String>,
    /// Write the resulting bindings to this YAML file
    #[arg(long = "save-mapping")]
    pub save_mapping: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MapArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub mapping: MappingArgs,
}

#[derive(Debug, Args)]
pub struct ReviewArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub mapping: MappingArgs,
    /// Edit one cell, e.g. `2:Account Code=400` (1-based row, repeatable)
    #[arg(long = "edit", value_parser = parse_edit, action = clap::ArgAction::Append)]
    pub edits: Vec<CellEdit>,
    /// Output file for the canonical rows (a table is printed if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Output format
    #[arg(long = "format", value_enum, default_value = "csv")]
    pub format: ExportFormat,
    /// Delimiter to use for CSV output
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Maximum rows to print in the review table (0 = all)
    #[arg(long, default_value_t = 0)]
    pub rows: usize,
}

/// A single `--edit` directive with a zero-based row index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEdit {
    pub row: usize,
    pub field: String,
    pub value: String,
}

pub fn parse_edit(value: &str) -> Result<CellEdit, String> {
    let (row, rest) = value
        .split_once(':')
        .ok_or_else(|| format!("Edit '{value}' must look like ROW:Field=Value"))?;
    let row = row
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Edit '{value}' has an invalid row number"))?;
    if row == 0 {
        return Err("Row numbers start at 1".to_string());
    }
    let (field, new_value) = rest
        .split_once('=')
        .ok_or_else(|| format!("Edit '{value}' must look like ROW:Field=Value"))?;
    Ok(CellEdit {
        row: row - 1,
        field: field.trim().to_string(),
        value: new_value.to_string(),
    })
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => return Ok(b'\t'),
        "comma" => return Ok(b','),
        "pipe" => return Ok(b'|'),
        "semicolon" => return Ok(b';'),
        _ => {}
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Err("Delimiter cannot be empty".to_string()),
        (Some(_), Some(_)) => Err("Delimiter must be a single character".to_string()),
        (Some(ch), None) if !ch.is_ascii() => Err("Delimiter must be ASCII".to_string()),
        (Some('"'), None) => Err("Delimiter cannot be the quote character".to_string()),
        (Some(ch), None) => Ok(ch as u8),
    }
}
