//! The fixed, ordered set of canonical fields rows are projected onto.
//!
//! The set is configuration: it either comes from [`FieldSet::default()`]
//! (the six fields an accounting import expects) or from a YAML profile
//! loaded with [`FieldSet::load`]. It is never inferred from file content.
//! Order matters for display and for export column order.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_FIELDS: &[&str] = &[
    "Date",
    "Contact Name",
    "Amount",
    "Description",
    "Account Code",
    "Reference",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FieldProfile", into = "FieldProfile")]
pub struct FieldSet {
    names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FieldProfile {
    fields: Vec<String>,
}

impl TryFrom<FieldProfile> for FieldSet {
    type Error = ValidationError;

    fn try_from(profile: FieldProfile) -> std::result::Result<Self, Self::Error> {
        FieldSet::new(profile.fields)
    }
}

impl From<FieldSet> for FieldProfile {
    fn from(set: FieldSet) -> Self {
        FieldProfile { fields: set.names }
    }
}

impl Default for FieldSet {
    fn default() -> Self {
        Self {
            names: DEFAULT_FIELDS.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl FieldSet {
    /// Builds a field set, rejecting empty lists, blank names, and names that
    /// collide case-insensitively.
    pub fn new<I, S>(names: I) -> std::result::Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names.into_iter().map(Into::into).collect::<Vec<String>>();
        if names.is_empty() {
            return Err(ValidationError::InvalidProfile {
                reason: "at least one field is required".to_string(),
            });
        }
        for (idx, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ValidationError::InvalidProfile {
                    reason: format!("field {} has a blank name", idx + 1),
                });
            }
            if let Some(previous) = names[..idx]
                .iter()
                .find(|earlier| earlier.to_lowercase() == name.to_lowercase())
            {
                return Err(ValidationError::InvalidProfile {
                    reason: format!("field '{name}' duplicates '{previous}'"),
                });
            }
        }
        Ok(Self { names })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening field profile {path:?}"))?;
        let reader = BufReader::new(file);
        let set: FieldSet =
            serde_yaml::from_reader(reader).context("Parsing field profile YAML")?;
        Ok(set)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating field profile {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing field profile YAML")
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Exact, case-sensitive membership. Canonical names are identifiers.
    pub fn contains(&self, field: &str) -> bool {
        self.names.iter().any(|name| name == field)
    }

    pub fn position(&self, field: &str) -> Option<usize> {
        self.names.iter().position(|name| name == field)
    }

    pub(crate) fn require(&self, field: &str) -> std::result::Result<(), ValidationError> {
        if self.contains(field) {
            Ok(())
        } else {
            Err(ValidationError::UnknownField {
                field: field.to_string(),
            })
        }
    }
}
