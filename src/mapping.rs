//! Canonical field to source column bindings.
//!
//! [`auto_map`] proposes bindings by exact, case-insensitive name equality.
//! There is no fuzzy or similarity matching: a field either has a column of
//! the same name (ignoring case) or stays unbound until the user picks one.
//! [`set_mapping`] and [`unbind`] are pure updates returning a new mapping.

use std::{
    collections::BTreeMap,
    fmt,
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::{Context, Result as AnyResult, anyhow};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, ValidationError},
    fields::FieldSet,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingOrigin {
    /// Suggested by [`auto_map`].
    Auto,
    /// Chosen explicitly by the user.
    Manual,
}

impl fmt::Display for BindingOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingOrigin::Auto => write!(f, "auto"),
            BindingOrigin::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub column: String,
    pub origin: BindingOrigin,
}

/// Partial mapping from canonical field to source column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    bindings: BTreeMap<String, Binding>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column_for(&self, field: &str) -> Option<&str> {
        self.bindings.get(field).map(|binding| binding.column.as_str())
    }

    pub fn binding(&self, field: &str) -> Option<&Binding> {
        self.bindings.get(field)
    }

    pub fn is_bound(&self, field: &str) -> bool {
        self.bindings.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bound `(field, column)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(field, binding)| (field.as_str(), binding.column.as_str()))
    }

    /// Fields of `fields` that have no binding, in canonical order.
    pub fn unbound_fields<'a>(&self, fields: &'a FieldSet) -> Vec<&'a str> {
        fields.iter().filter(|field| !self.is_bound(field)).collect()
    }

    pub fn to_file(&self) -> MappingFile {
        MappingFile {
            bindings: self
                .iter()
                .map(|(field, column)| (field.to_string(), column.to_string()))
                .collect(),
        }
    }

    fn with_binding(&self, field: &str, column: &str, origin: BindingOrigin) -> Self {
        let mut next = self.clone();
        next.bindings.insert(
            field.to_string(),
            Binding {
                column: column.to_string(),
                origin,
            },
        );
        next
    }
}

pub fn auto_map(fields: &FieldSet, columns: &[String]) -> FieldMapping {
    let mut mapping = FieldMapping::new();
    for field in fields.iter() {
        let wanted = field.to_lowercase();
        match columns.iter().find(|column| column.to_lowercase() == wanted) {
            Some(column) => {
                debug!("Auto-mapped field '{field}' to column '{column}'");
                mapping = mapping.with_binding(field, column, BindingOrigin::Auto);
            }
            None => debug!("No column matches field '{field}'"),
        }
    }
    mapping
}

/// Binds `field` to `column`, replacing any earlier binding for `field`.
///
/// Fails when `field` is not canonical or `column` is not one of `columns`.
pub fn set_mapping(
    mapping: &FieldMapping,
    fields: &FieldSet,
    columns: &[String],
    field: &str,
    column: &str,
) -> Result<FieldMapping> {
    fields.require(field)?;
    if !columns.iter().any(|candidate| candidate == column) {
        return Err(ValidationError::UnknownColumn {
            column: column.to_string(),
        }
        .into());
    }
    Ok(mapping.with_binding(field, column, BindingOrigin::Manual))
}

pub fn unbind(mapping: &FieldMapping, fields: &FieldSet, field: &str) -> Result<FieldMapping> {
    fields.require(field)?;
    let mut next = mapping.clone();
    next.bindings.remove(field);
    Ok(next)
}

/// Parses a `Field=Column` override as accepted on the command line.
pub fn parse_binding(raw: &str) -> AnyResult<(String, String)> {
    let (field, column) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Mapping '{raw}' must be of the form Field=Column"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(anyhow!("Mapping '{raw}' is missing a field name"));
    }
    Ok((field.to_string(), column.to_string()))
}

/// Saved manual bindings, stored as YAML:
///
/// ```yaml
/// bindings:
///   Amount: Debit
///   Date: Posted On
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingFile {
    #[serde(default)]
    pub bindings: BTreeMap<String, String>,
}

impl MappingFile {
    pub fn load(path: &Path) -> AnyResult<Self> {
        let file = File::open(path).with_context(|| format!("Opening mapping file {path:?}"))?;
        let reader = BufReader::new(file);
        let parsed = serde_yaml::from_reader(reader).context("Parsing mapping YAML")?;
        Ok(parsed)
    }

    pub fn save(&self, path: &Path) -> AnyResult<()> {
        let file =
            File::create(path).with_context(|| format!("Creating mapping file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing mapping YAML")
    }

    /// Applies every saved binding on top of `mapping` as a manual override.
    pub fn apply(
        &self,
        mapping: &FieldMapping,
        fields: &FieldSet,
        columns: &[String],
    ) -> Result<FieldMapping> {
        self.bindings
            .iter()
            .try_fold(mapping.clone(), |acc, (field, column)| {
                set_mapping(&acc, fields, columns, field, column)
            })
    }
}
