//! Projection of raw rows onto canonical rows, and single-cell edits.
//!
//! [`project`] is total: every canonical row carries every canonical field,
//! with an empty string wherever the field is unbound or the bound column is
//! missing from the raw row. It always recomputes from scratch and never
//! looks at previously edited rows. Keeping edits across a remap is the
//! session's job (see [`crate::session::RemapPolicy`]).

use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{
    error::{Result, ValidationError},
    fields::FieldSet,
    ingest::RawRow,
    mapping::FieldMapping,
};

/// A row keyed by canonical field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRow {
    // Parallel to the field set used to build the row.
    fields: Vec<String>,
    values: Vec<String>,
}

impl CanonicalRow {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .position(|candidate| candidate == field)
            .map(|idx| self.values[idx].as_str())
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// `(field, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .zip(self.values.iter())
            .map(|(field, value)| (field.as_str(), value.as_str()))
    }
}

impl Serialize for CanonicalRow {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

pub fn project(raw_rows: &[RawRow], mapping: &FieldMapping, fields: &FieldSet) -> Vec<CanonicalRow> {
    let sources = fields
        .iter()
        .map(|field| mapping.column_for(field))
        .collect::<Vec<_>>();
    raw_rows
        .iter()
        .map(|raw| CanonicalRow {
            fields: fields.names().to_vec(),
            values: sources
                .iter()
                .map(|source| {
                    source
                        .and_then(|column| raw.get(column))
                        .unwrap_or_default()
                        .to_string()
                })
                .collect(),
        })
        .collect()
}

/// Returns a copy of `rows` with one cell replaced. Every other row and
/// field is carried over unchanged.
pub fn edit_cell(
    rows: &[CanonicalRow],
    row_index: usize,
    field: &str,
    value: impl Into<String>,
) -> Result<Vec<CanonicalRow>> {
    let mut next = rows.to_vec();
    apply_edit(&mut next, row_index, field, value.into())?;
    Ok(next)
}

pub(crate) fn apply_edit(
    rows: &mut [CanonicalRow],
    row_index: usize,
    field: &str,
    value: String,
) -> Result<()> {
    let len = rows.len();
    let row = rows
        .get_mut(row_index)
        .ok_or(ValidationError::RowOutOfRange {
            index: row_index,
            len,
        })?;
    let idx = row
        .fields
        .iter()
        .position(|candidate| candidate == field)
        .ok_or_else(|| ValidationError::UnknownField {
            field: field.to_string(),
        })?;
    row.values[idx] = value;
    Ok(())
}
