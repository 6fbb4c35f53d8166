//! Raw template records and the record store

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur during template storage and resolution
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Unknown template or base reference
    #[error("unresolved template reference: {name}")]
    UnresolvedReference { name: String },

    /// Duplicate template definition
    #[error("duplicate template definition: {name}")]
    Duplicate { name: String },

    /// Base chain revisits a name
    #[error("cyclic inheritance: {}", chain.join(" -> "))]
    CyclicInheritance { chain: Vec<String> },

    /// A name resolved to a template of the wrong kind
    #[error("template '{name}' is a {found} template, expected {expected}")]
    KindMismatch {
        name: String,
        expected: TemplateKind,
        found: TemplateKind,
    },
}

/// The four primitive template kinds a base chain terminates in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Operator,
    Node,
    Edge,
    Circuit,
}

impl TemplateKind {
    /// The keyword used in authored documents
    pub fn keyword(&self) -> &'static str {
        match self {
            TemplateKind::Operator => "OperatorTemplate",
            TemplateKind::Node => "NodeTemplate",
            TemplateKind::Edge => "EdgeTemplate",
            TemplateKind::Circuit => "CircuitTemplate",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "OperatorTemplate" => Some(TemplateKind::Operator),
            "NodeTemplate" => Some(TemplateKind::Node),
            "EdgeTemplate" => Some(TemplateKind::Edge),
            "CircuitTemplate" => Some(TemplateKind::Circuit),
            _ => None,
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TemplateKind::Operator => "operator",
            TemplateKind::Node => "node",
            TemplateKind::Edge => "edge",
            TemplateKind::Circuit => "circuit",
        };
        write!(f, "{}", name)
    }
}

/// What a template derives from: a primitive kind terminates the inheritance
/// chain, any other name refers to a parent template.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "String")]
pub enum BaseRef {
    Kind(TemplateKind),
    Template(String),
}

impl From<String> for BaseRef {
    fn from(s: String) -> Self {
        match TemplateKind::from_keyword(&s) {
            Some(kind) => BaseRef::Kind(kind),
            None => BaseRef::Template(s),
        }
    }
}

/// A scalar default as authored: a number, or a string that is either a role
/// keyword or an expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

/// A variable declaration as authored: a bare default value, or the detailed
/// form carrying a unit and description.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawVariable {
    Value(RawValue),
    Detailed {
        default: RawValue,
        #[serde(default)]
        unit: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
}

impl RawVariable {
    pub fn default_value(&self) -> &RawValue {
        match self {
            RawVariable::Value(v) => v,
            RawVariable::Detailed { default, .. } => default,
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            RawVariable::Value(_) => None,
            RawVariable::Detailed { unit, .. } => unit.as_deref(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            RawVariable::Value(_) => None,
            RawVariable::Detailed { description, .. } => description.as_deref(),
        }
    }
}

/// A circuit edge entry as authored, bit-exact to the document format:
/// `[source_path, target_path, edge_template_name, parameter_mapping]`
/// where each path is `"<node>/<operator>/<variable>"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawEdge(
    pub String,
    pub String,
    pub String,
    pub BTreeMap<String, f64>,
);

impl RawEdge {
    pub fn source_path(&self) -> &str {
        &self.0
    }

    pub fn target_path(&self) -> &str {
        &self.1
    }

    pub fn transfer_template(&self) -> &str {
        &self.2
    }

    pub fn parameters(&self) -> &BTreeMap<String, f64> {
        &self.3
    }
}

/// A raw template declaration, as loaded. Immutable once stored.
///
/// Kind-specific fields are optional so that one record shape covers all four
/// kinds and partial child declarations in an inheritance chain.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTemplate {
    pub name: String,
    pub base: BaseRef,
    pub description: Option<String>,
    pub unit: Option<String>,
    /// Ordered equation strings (operator templates)
    pub equations: Option<Vec<String>>,
    /// Variable declarations (operator templates)
    pub variables: BTreeMap<String, RawVariable>,
    /// Ordered operator template names (node/edge templates)
    pub operators: Option<Vec<String>>,
    /// Instance name -> node template name (circuit templates)
    pub nodes: Option<BTreeMap<String, String>>,
    /// Edge entries in declaration order (circuit templates)
    pub edges: Option<Vec<RawEdge>>,
}

impl RawTemplate {
    /// Create a minimal record deriving directly from a primitive kind
    pub fn new(name: impl Into<String>, base: BaseRef) -> Self {
        Self {
            name: name.into(),
            base,
            description: None,
            unit: None,
            equations: None,
            variables: BTreeMap::new(),
            operators: None,
            nodes: None,
            edges: None,
        }
    }

    /// The primitive kind, if the base chain is already terminated
    pub fn kind(&self) -> Option<TemplateKind> {
        match &self.base {
            BaseRef::Kind(kind) => Some(*kind),
            BaseRef::Template(_) => None,
        }
    }
}

/// Store for raw template records, keyed by qualified name.
///
/// Loaded once, then only read; safe to share across concurrent circuit
/// builds.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: HashMap<String, RawTemplate>,
}

impl TemplateStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, rejecting duplicate names
    pub fn insert(&mut self, template: RawTemplate) -> Result<(), TemplateError> {
        if self.templates.contains_key(&template.name) {
            return Err(TemplateError::Duplicate {
                name: template.name.clone(),
            });
        }
        self.templates.insert(template.name.clone(), template);
        Ok(())
    }

    /// Get a record by name
    pub fn get(&self, name: &str) -> Option<&RawTemplate> {
        self.templates.get(name)
    }

    /// Check if a record exists
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// All stored template names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
