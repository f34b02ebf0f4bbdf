//! Plain-text tables for the terminal: raw previews, canonical rows, and the
//! field mapping.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{fields::FieldSet, mapping::FieldMapping, projection::CanonicalRow};

/// Shown in place of an empty canonical cell.
pub const EMPTY_CELL: &str = "-";

pub const NO_ROWS_MESSAGE: &str =
    "No transaction data available. Upload a CSV file and map the columns.";

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| cell_width(header).max(1))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", join_padded(headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", join_padded(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", join_padded(row, &widths));
    }
    output
}

/// Renders canonical rows under their field headers, with a leading 1-based
/// row number column.
pub fn render_canonical(fields: &FieldSet, rows: &[CanonicalRow]) -> String {
    if rows.is_empty() {
        return format!("{NO_ROWS_MESSAGE}\n");
    }
    let mut headers = vec!["#".to_string()];
    headers.extend(fields.names().iter().cloned());
    let body = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let mut cells = vec![(idx + 1).to_string()];
            cells.extend(row.values().iter().map(|value| {
                if value.is_empty() {
                    EMPTY_CELL.to_string()
                } else {
                    value.clone()
                }
            }));
            cells
        })
        .collect::<Vec<_>>();
    render_table(&headers, &body)
}

/// One line per canonical field: its bound column and how it was bound.
pub fn render_mapping(fields: &FieldSet, mapping: &FieldMapping) -> String {
    let headers = ["field", "column", "source"].map(str::to_string).to_vec();
    let body = fields
        .iter()
        .map(|field| match mapping.binding(field) {
            Some(binding) => vec![
                field.to_string(),
                binding.column.clone(),
                binding.origin.to_string(),
            ],
            None => vec![
                field.to_string(),
                EMPTY_CELL.to_string(),
                "unbound".to_string(),
            ],
        })
        .collect::<Vec<_>>();
    render_table(&headers, &body)
}

pub fn print(rendered: &str) {
    print!("{rendered}");
}

fn join_padded(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        let cell = flatten(cell);
        line.push_str(&cell);
        let pad = width.saturating_sub(cell_width(&cell));
        line.extend(std::iter::repeat_n(' ', pad));
    }
    line.truncate(line.trim_end().len());
    line
}

fn cell_width(value: &str) -> usize {
    value.chars().count()
}

// Embedded line breaks and tabs would break column alignment.
fn flatten(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
