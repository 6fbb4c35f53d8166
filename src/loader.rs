//! Template document loading
//!
//! Template documents are TOML files with one `[templates.<name>]` table per
//! record. The loader only deserializes and registers raw records; all
//! semantic validation happens during resolution and assembly, so the core
//! stays independent of the document format.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::template::{BaseRef, RawEdge, RawTemplate, RawVariable, TemplateError, TemplateStore};

/// Errors that can occur when loading a template document
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read template document: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse template document: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// TOML structure for deserializing template documents
#[derive(Deserialize)]
struct TomlDocument {
    #[serde(default)]
    templates: BTreeMap<String, TomlTemplate>,
}

#[derive(Deserialize)]
struct TomlTemplate {
    base: BaseRef,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    equations: Option<OneOrMany>,
    #[serde(default)]
    variables: BTreeMap<String, RawVariable>,
    #[serde(default)]
    operators: Option<Vec<String>>,
    #[serde(default)]
    nodes: Option<BTreeMap<String, String>>,
    #[serde(default)]
    edges: Option<Vec<RawEdge>>,
}

/// A single equation may be authored without list brackets
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

impl TemplateStore {
    /// Load a template document from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load a template document from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, LoadError> {
        let mut store = Self::new();
        store.load_toml_str(content)?;
        Ok(store)
    }

    /// Register every record of a TOML document into this store.
    ///
    /// Allows assembling one store from several documents; duplicate names
    /// across documents are rejected.
    pub fn load_toml_str(&mut self, content: &str) -> Result<(), LoadError> {
        let parsed: TomlDocument = toml::from_str(content)?;

        for (name, record) in parsed.templates {
            self.insert(RawTemplate {
                name,
                base: record.base,
                description: record.description,
                unit: record.unit,
                equations: record.equations.map(Into::into),
                variables: record.variables,
                operators: record.operators,
                nodes: record.nodes,
                edges: record.edges,
            })?;
        }
        Ok(())
    }
}
