//! Flattened circuit graph types handed to the numerical engine

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::unit::{ResolvedEdge, ResolvedNode};

/// A `(node, operator, variable)` endpoint reference, authored as the
/// `/`-delimited path `"<node>/<operator>/<variable>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRef {
    pub node: String,
    pub operator: String,
    pub variable: String,
}

impl std::fmt::Display for VariableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.node, self.operator, self.variable)
    }
}

/// An instantiated node: an independently owned copy of its template.
///
/// Multiple circuits instantiating the same template each own their copy.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitNode {
    /// Instance name within the circuit
    pub name: String,
    pub unit: ResolvedNode,
}

impl CircuitNode {
    /// Name of the node template this instance was created from
    pub fn template_name(&self) -> &str {
        &self.unit.name
    }
}

/// A validated, directed coupling between two node variables
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitEdge {
    pub source: VariableRef,
    pub target: VariableRef,
    pub transfer: ResolvedEdge,
    pub weight: f64,
    pub parameters: BTreeMap<String, f64>,
}

/// The flattened build result: instantiated nodes and validated edges.
///
/// Built once per configuration, immutable afterwards. Edges are kept in
/// declaration order; contributions to a shared input are collected, not
/// aggregated - summation is the engine's job.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitGraph {
    pub name: String,
    pub nodes: BTreeMap<String, CircuitNode>,
    pub edges: Vec<CircuitEdge>,
}

impl CircuitGraph {
    pub fn node(&self, name: &str) -> Option<&CircuitNode> {
        self.nodes.get(name)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges targeting a given input, in declaration order
    pub fn edges_into<'a>(
        &'a self,
        target: &'a VariableRef,
    ) -> impl Iterator<Item = &'a CircuitEdge> {
        self.edges.iter().filter(move |e| &e.target == target)
    }

    /// Deterministic human-readable summary of the graph
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "circuit {} ({} nodes, {} edges)",
            self.name,
            self.nodes.len(),
            self.edges.len()
        );
        for (name, node) in &self.nodes {
            let operators: Vec<&str> = node
                .unit
                .chain
                .operators
                .iter()
                .map(|op| op.name.as_str())
                .collect();
            let _ = writeln!(
                out,
                "  node {} [{}]: operators {}",
                name,
                node.template_name(),
                operators.join(", ")
            );
        }
        for edge in &self.edges {
            let _ = writeln!(
                out,
                "  edge {} -> {} [{}] weight {}",
                edge.source, edge.target, edge.transfer.name, edge.weight
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_ref_display() {
        let r = VariableRef {
            node: "PC".to_string(),
            operator: "Op_e".to_string(),
            variable: "r".to_string(),
        };
        assert_eq!(r.to_string(), "PC/Op_e/r");
    }
}
