//! Writes reviewed canonical rows to a local file or stdout.
//!
//! Columns always follow canonical field order. Uploading to an accounting
//! system is not supported; this is the "download" half only.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use log::info;

use crate::{fields::FieldSet, io_utils, projection::CanonicalRow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

pub fn write_rows(
    path: Option<&Path>,
    format: ExportFormat,
    delimiter: u8,
    fields: &FieldSet,
    rows: &[CanonicalRow],
) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(path, delimiter, fields, rows)?,
        ExportFormat::Json => write_json(path, rows)?,
    }
    let destination = path
        .filter(|p| !io_utils::is_dash(p))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    info!("Exported {} row(s) -> {}", rows.len(), destination);
    Ok(())
}

fn write_csv(
    path: Option<&Path>,
    delimiter: u8,
    fields: &FieldSet,
    rows: &[CanonicalRow],
) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(path, delimiter)?;
    writer
        .write_record(fields.iter())
        .context("Writing output headers")?;
    for (idx, row) in rows.iter().enumerate() {
        writer
            .write_record(row.values())
            .with_context(|| format!("Writing output row {}", idx + 1))?;
    }
    writer.flush().context("Flushing output writer")?;
    Ok(())
}

fn write_json(path: Option<&Path>, rows: &[CanonicalRow]) -> Result<()> {
    let mut writer: Box<dyn Write> = match path {
        Some(p) if !io_utils::is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(io::stdout()),
    };
    serde_json::to_writer_pretty(&mut writer, rows).context("Writing JSON rows")?;
    writeln!(writer).context("Writing JSON rows")?;
    writer.flush().context("Flushing output writer")?;
    Ok(())
}
