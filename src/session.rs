//! The state of one import: uploaded file, mapping, and reviewed rows.
//!
//! A [`Session`] owns every table of the pipeline and replaces them
//! wholesale on each transition. Callers drive it with explicit operations
//! (load, map, edit) and read back the latest snapshot.

use std::{collections::BTreeMap, path::Path};

use anyhow::Result as AnyResult;
use log::{debug, info};

use crate::{
    error::Result,
    fields::FieldSet,
    ingest::{self, ParseOptions, ParsedTable, RawRow},
    mapping::{self, FieldMapping, MappingFile},
    projection::{self, CanonicalRow},
};

/// What happens to cell edits when the mapping changes and rows are
/// projected again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemapPolicy {
    /// Re-apply every recorded edit on top of the new projection.
    #[default]
    PreserveEdits,
    /// Drop all edits; the new projection wins.
    Discard,
}

#[derive(Debug, Clone)]
pub struct Session {
    fields: FieldSet,
    policy: RemapPolicy,
    options: ParseOptions,
    file_name: Option<String>,
    table: ParsedTable,
    mapping: FieldMapping,
    rows: Vec<CanonicalRow>,
    edits: BTreeMap<(usize, String), String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(FieldSet::default())
    }
}

impl Session {
    pub fn new(fields: FieldSet) -> Self {
        Self {
            fields,
            policy: RemapPolicy::default(),
            options: ParseOptions::default(),
            file_name: None,
            table: ParsedTable::default(),
            mapping: FieldMapping::new(),
            rows: Vec::new(),
            edits: BTreeMap::new(),
        }
    }

    pub fn with_policy(mut self, policy: RemapPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Accepts an uploaded file. On failure the session is left untouched.
    pub fn load(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        ingest::check_file_type(name)?;
        let table = ingest::parse(bytes, &self.options)?;
        self.install(name.to_string(), table);
        Ok(())
    }

    pub fn load_path(&mut self, path: &Path, max_bytes: u64) -> AnyResult<()> {
        let table = ingest::read_csv_file(path, &self.options, max_bytes)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.install(name, table);
        Ok(())
    }

    /// Forgets the uploaded file and everything derived from it.
    pub fn clear(&mut self) {
        self.file_name = None;
        self.table = ParsedTable::default();
        self.mapping = FieldMapping::new();
        self.rows.clear();
        self.edits.clear();
    }

    pub fn set_mapping(&mut self, field: &str, column: &str) -> Result<()> {
        self.mapping = mapping::set_mapping(
            &self.mapping,
            &self.fields,
            &self.table.columns,
            field,
            column,
        )?;
        info!("Mapped field '{field}' to column '{column}'");
        self.reproject()
    }

    pub fn unbind(&mut self, field: &str) -> Result<()> {
        self.mapping = mapping::unbind(&self.mapping, &self.fields, field)?;
        info!("Cleared mapping for field '{field}'");
        self.reproject()
    }

    /// Applies saved bindings. Either all of them apply or none do.
    pub fn apply_mapping_file(&mut self, file: &MappingFile) -> Result<()> {
        self.mapping = file.apply(&self.mapping, &self.fields, &self.table.columns)?;
        self.reproject()
    }

    pub fn edit_cell(&mut self, row_index: usize, field: &str, value: &str) -> Result<()> {
        projection::apply_edit(&mut self.rows, row_index, field, value.to_string())?;
        self.edits
            .insert((row_index, field.to_string()), value.to_string());
        debug!("Edited row {row_index} field '{field}'");
        Ok(())
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn columns(&self) -> &[String] {
        &self.table.columns
    }

    pub fn raw_rows(&self) -> &[RawRow] {
        &self.table.rows
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    pub fn rows(&self) -> &[CanonicalRow] {
        &self.rows
    }

    pub fn unbound_fields(&self) -> Vec<&str> {
        self.mapping.unbound_fields(&self.fields)
    }

    /// Recorded edits as `((row, field), value)` in row order.
    pub fn edited_cells(&self) -> impl Iterator<Item = ((usize, &str), &str)> {
        self.edits
            .iter()
            .map(|((row, field), value)| ((*row, field.as_str()), value.as_str()))
    }

    fn install(&mut self, name: String, table: ParsedTable) {
        self.mapping = mapping::auto_map(&self.fields, &table.columns);
        self.rows = projection::project(&table.rows, &self.mapping, &self.fields);
        self.edits.clear();
        info!(
            "Loaded '{}' with {} row(s); auto-mapped {} of {} field(s)",
            name,
            table.row_count(),
            self.mapping.len(),
            self.fields.len()
        );
        self.table = table;
        self.file_name = Some(name);
    }

    fn reproject(&mut self) -> Result<()> {
        let mut rows = projection::project(&self.table.rows, &self.mapping, &self.fields);
        match self.policy {
            RemapPolicy::Discard => {
                if !self.edits.is_empty() {
                    info!("Discarding {} edit(s) after remap", self.edits.len());
                }
                self.edits.clear();
            }
            RemapPolicy::PreserveEdits => {
                for ((row_index, field), value) in &self.edits {
                    projection::apply_edit(&mut rows, *row_index, field, value.clone())?;
                }
            }
        }
        self.rows = rows;
        Ok(())
    }
}
