//! Rategraph - template resolution and circuit assembly for rate-based
//! neural-mass models
//!
//! This library takes a set of named, inheritable templates (operators,
//! nodes, edges, circuits) and produces a fully resolved, flattened
//! computational graph of typed nodes and weighted edges, ready for a
//! numerical integration engine.
//!
//! # Example
//!
//! ```rust
//! use rategraph::{build_circuit, TemplateStore};
//!
//! let store = TemplateStore::from_toml_str(r#"
//! [templates.RateOp]
//! base = "OperatorTemplate"
//! equations = "d/dt * r = -r / tau + r_in"
//!
//! [templates.RateOp.variables]
//! r = "output"
//! r_in = "input"
//! tau = 1.0
//!
//! [templates.Pop]
//! base = "NodeTemplate"
//! operators = ["RateOp"]
//!
//! [templates.Net]
//! base = "CircuitTemplate"
//! edges = []
//!
//! [templates.Net.nodes]
//! A = "Pop"
//! B = "Pop"
//! "#).unwrap();
//!
//! let graph = build_circuit(&store, "Net").unwrap();
//! assert_eq!(graph.node_count(), 2);
//! ```

pub mod circuit;
pub mod equation;
pub mod error;
pub mod loader;
pub mod operator;
pub mod template;
pub mod unit;

pub use circuit::{CircuitEdge, CircuitError, CircuitGraph, CircuitNode, VariableRef};
pub use equation::{Equation, EquationKind};
pub use error::EquationError;
pub use loader::LoadError;
pub use operator::{Literal, OperatorError, ResolvedOperator, VariableRole, VariableSpec};
pub use template::{
    BaseRef, RawEdge, RawTemplate, RawValue, RawVariable, TemplateError, TemplateKind,
    TemplateResolver, TemplateStore,
};
pub use unit::{AssemblyError, OperatorChain, ResolvedEdge, ResolvedNode};

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors that can occur during the compile pipeline
#[derive(Debug, Error)]
pub enum CompileError {
    /// Error during template resolution
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Error while compiling an operator
    #[error("operator error: {0}")]
    Operator(#[from] OperatorError),

    /// Error while assembling a node or edge unit
    #[error("assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    /// Error while building the circuit graph
    #[error("circuit error: {0}")]
    Circuit(#[from] CircuitError),
}

/// Resolve and compile an operator template
pub fn compile_operator(
    store: &TemplateStore,
    name: &str,
) -> Result<ResolvedOperator, CompileError> {
    let mut resolver = TemplateResolver::new(store);
    let record = resolver.resolve_kind(name, TemplateKind::Operator)?;
    Ok(operator::compile(&record)?)
}

/// Resolve, compile and assemble a node template
pub fn compile_node(store: &TemplateStore, name: &str) -> Result<ResolvedNode, CompileError> {
    let mut resolver = TemplateResolver::new(store);
    node_from_resolver(&mut resolver, name)
}

/// Resolve, compile and assemble an edge template
pub fn compile_edge(store: &TemplateStore, name: &str) -> Result<ResolvedEdge, CompileError> {
    let mut resolver = TemplateResolver::new(store);
    edge_from_resolver(&mut resolver, name)
}

/// Build the flattened graph for a named circuit template.
///
/// This is the main entry point for the library. It resolves the circuit
/// record, compiles and assembles every referenced node and edge template,
/// instantiates the node map, and validates all edge wiring. Building is
/// all-or-nothing.
pub fn build_circuit(store: &TemplateStore, name: &str) -> Result<CircuitGraph, CompileError> {
    let mut resolver = TemplateResolver::new(store);
    let record = resolver.resolve_kind(name, TemplateKind::Circuit)?;

    let mut node_templates = BTreeMap::new();
    for (instance, template) in record.nodes.as_ref().into_iter().flatten() {
        if node_templates.contains_key(template) {
            continue;
        }
        let node = node_from_resolver(&mut resolver, template)
            .map_err(|e| as_unknown_node(e, instance, template))?;
        node_templates.insert(template.clone(), node);
    }

    let mut edge_templates = BTreeMap::new();
    for entry in record.edges.as_deref().unwrap_or_default() {
        let template = entry.transfer_template();
        if edge_templates.contains_key(template) {
            continue;
        }
        let edge = edge_from_resolver(&mut resolver, template)
            .map_err(|e| as_unknown_edge(e, template))?;
        edge_templates.insert(template.to_string(), edge);
    }

    Ok(circuit::build(&record, &node_templates, &edge_templates)?)
}

fn node_from_resolver(
    resolver: &mut TemplateResolver,
    name: &str,
) -> Result<ResolvedNode, CompileError> {
    let record = resolver.resolve_kind(name, TemplateKind::Node)?;
    let operators = operators_from_resolver(resolver, &record)?;
    Ok(unit::assemble_node(record.name, operators)?)
}

fn edge_from_resolver(
    resolver: &mut TemplateResolver,
    name: &str,
) -> Result<ResolvedEdge, CompileError> {
    let record = resolver.resolve_kind(name, TemplateKind::Edge)?;
    let operators = operators_from_resolver(resolver, &record)?;
    Ok(unit::assemble_edge(record.name, operators)?)
}

fn operators_from_resolver(
    resolver: &mut TemplateResolver,
    record: &RawTemplate,
) -> Result<Vec<ResolvedOperator>, CompileError> {
    let mut operators = Vec::new();
    for op_name in record.operators.as_deref().unwrap_or_default() {
        let op_record = resolver.resolve_kind(op_name, TemplateKind::Operator)?;
        operators.push(operator::compile(&op_record)?);
    }
    Ok(operators)
}

/// A node template name that fails resolution is reported as the circuit's
/// problem, not the resolver's; deeper errors pass through untouched.
fn as_unknown_node(err: CompileError, node: &str, template: &str) -> CompileError {
    match &err {
        CompileError::Template(TemplateError::UnresolvedReference { name })
        | CompileError::Template(TemplateError::KindMismatch { name, .. })
            if name == template =>
        {
            CompileError::Circuit(CircuitError::UnknownNodeTemplate {
                node: node.to_string(),
                template: template.to_string(),
            })
        }
        _ => err,
    }
}

fn as_unknown_edge(err: CompileError, template: &str) -> CompileError {
    match &err {
        CompileError::Template(TemplateError::UnresolvedReference { name })
        | CompileError::Template(TemplateError::KindMismatch { name, .. })
            if name == template =>
        {
            CompileError::Circuit(CircuitError::UnknownEdgeTemplate {
                template: template.to_string(),
            })
        }
        _ => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The three-node document with an excitatory/inhibitory pair wired
    /// through a linear coupling edge.
    const NET3: &str = r#"
[templates.Op_base]
base = "OperatorTemplate"
equations = [
    "d/dt * r = delta/(PI*tau^2) + 2.*r*v/tau + r_in",
    "d/dt * v = (v^2 + eta - (PI*r*tau)^2) / tau",
]

[templates.Op_base.variables]
r = "output"
v = "variable"
r_in = "input"
delta = 2.0
tau = 1.0
eta = -5.0

[templates.Op_e]
base = "Op_base"

[templates.Op_i]
base = "Op_base"

[templates.Op_i.variables]
tau = 2.0

[templates.LC_op]
base = "OperatorTemplate"
equations = "r_in = c * r_out"

[templates.LC_op.variables]
r_in = "output"
r_out = "input"
c = 1.0

[templates.LC]
base = "EdgeTemplate"
operators = ["LC_op"]

[templates.PC_pop]
base = "NodeTemplate"
operators = ["Op_e"]

[templates.IIN_pop]
base = "NodeTemplate"
operators = ["Op_i"]

[templates.Net3]
base = "CircuitTemplate"
edges = [
    ["PC/Op_e/r", "IIN/Op_i/r_in", "LC", { weight = 5.0 }],
    ["IIN/Op_i/r", "PC/Op_e/r_in", "LC", { weight = 5.0 }],
]

[templates.Net3.nodes]
PC = "PC_pop"
IIN = "IIN_pop"
"#;

    #[test]
    fn test_build_net3() {
        let store = TemplateStore::from_toml_str(NET3).expect("Should load");
        let graph = build_circuit(&store, "Net3").expect("Should build");

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.edges.iter().all(|e| e.weight == 5.0));
    }

    #[test]
    fn test_inherited_override_flows_into_graph() {
        let store = TemplateStore::from_toml_str(NET3).expect("Should load");
        let graph = build_circuit(&store, "Net3").expect("Should build");

        // Op_i overrides tau to 2.0, Op_e inherits 1.0
        let op_i = graph
            .node("IIN")
            .and_then(|n| n.unit.chain.operator("Op_i"))
            .expect("Should have Op_i");
        assert_eq!(
            op_i.variable("tau").unwrap().default,
            Some(Literal::Number(2.0))
        );

        let op_e = graph
            .node("PC")
            .and_then(|n| n.unit.chain.operator("Op_e"))
            .expect("Should have Op_e");
        assert_eq!(
            op_e.variable("tau").unwrap().default,
            Some(Literal::Number(1.0))
        );
    }

    #[test]
    fn test_compile_operator_facade() {
        let store = TemplateStore::from_toml_str(NET3).expect("Should load");
        let op = compile_operator(&store, "Op_i").expect("Should compile");
        assert_eq!(op.equations.len(), 2);
        assert_eq!(op.variable("r").unwrap().role, VariableRole::Output);
    }

    #[test]
    fn test_compile_node_facade() {
        let store = TemplateStore::from_toml_str(NET3).expect("Should load");
        let node = compile_node(&store, "PC_pop").expect("Should compile");
        assert_eq!(node.chain.operators.len(), 1);
        let free: Vec<&str> = node.chain.free_inputs().collect();
        assert_eq!(free, vec!["r_in"]);
    }

    #[test]
    fn test_compile_edge_facade() {
        let store = TemplateStore::from_toml_str(NET3).expect("Should load");
        let edge = compile_edge(&store, "LC").expect("Should compile");
        assert!(!edge.is_passthrough());
    }

    #[test]
    fn test_unknown_circuit_name() {
        let store = TemplateStore::from_toml_str(NET3).expect("Should load");
        let err = build_circuit(&store, "Net9").expect_err("Should fail");
        assert!(matches!(
            err,
            CompileError::Template(TemplateError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_missing_node_template_reported_as_circuit_error() {
        let doc = r#"
[templates.Net]
base = "CircuitTemplate"
edges = []

[templates.Net.nodes]
A = "NoSuchPop"
"#;
        let store = TemplateStore::from_toml_str(doc).expect("Should load");
        let err = build_circuit(&store, "Net").expect_err("Should fail");
        match err {
            CompileError::Circuit(CircuitError::UnknownNodeTemplate { node, template }) => {
                assert_eq!(node, "A");
                assert_eq!(template, "NoSuchPop");
            }
            other => panic!("Expected UnknownNodeTemplate, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_edge_template_reported_as_circuit_error() {
        let doc = r#"
[templates.Op]
base = "OperatorTemplate"
equations = "d/dt * r = r_in - r"

[templates.Op.variables]
r = "output"
r_in = "input"

[templates.Pop]
base = "NodeTemplate"
operators = ["Op"]

[templates.Net]
base = "CircuitTemplate"
edges = [
    ["A/Op/r", "B/Op/r_in", "NoSuchEdge", { weight = 1.0 }],
]

[templates.Net.nodes]
A = "Pop"
B = "Pop"
"#;
        let store = TemplateStore::from_toml_str(doc).expect("Should load");
        let err = build_circuit(&store, "Net").expect_err("Should fail");
        assert!(matches!(
            err,
            CompileError::Circuit(CircuitError::UnknownEdgeTemplate { .. })
        ));
    }

    #[test]
    fn test_broken_operator_inside_node_passes_through() {
        // The node template exists; the failure inside it must keep its
        // identity instead of being masked as UnknownNodeTemplate
        let doc = r#"
[templates.BadOp]
base = "OperatorTemplate"
equations = "d/dt * r = undeclared"

[templates.BadOp.variables]
r = "output"

[templates.Pop]
base = "NodeTemplate"
operators = ["BadOp"]

[templates.Net]
base = "CircuitTemplate"
edges = []

[templates.Net.nodes]
A = "Pop"
"#;
        let store = TemplateStore::from_toml_str(doc).expect("Should load");
        let err = build_circuit(&store, "Net").expect_err("Should fail");
        assert!(matches!(
            err,
            CompileError::Operator(OperatorError::UndeclaredVariable { .. })
        ));
    }
}
