//! Circuit graph builder - instantiates nodes and validates edge wiring

use std::collections::BTreeMap;

use thiserror::Error;

use crate::operator::VariableRole;
use crate::template::RawTemplate;
use crate::unit::{ResolvedEdge, ResolvedNode};

use super::graph::{CircuitEdge, CircuitGraph, CircuitNode, VariableRef};

/// Errors that can occur while building a circuit graph
#[derive(Debug, Error)]
pub enum CircuitError {
    /// A node map entry references a template that cannot be resolved
    #[error("unknown node template '{template}' for node '{node}'")]
    UnknownNodeTemplate { node: String, template: String },

    /// An edge entry references a transfer template that cannot be resolved
    #[error("unknown edge template '{template}'")]
    UnknownEdgeTemplate { template: String },

    /// An edge endpoint path does not have the `node/operator/variable` shape
    #[error("malformed reference '{path}': expected '<node>/<operator>/<variable>'")]
    MalformedReference { path: String },

    /// An edge endpoint path does not resolve against the instantiated nodes
    #[error("unbound reference '{path}': {reason}{}", format_suggestions(suggestions))]
    UnboundReference {
        path: String,
        reason: String,
        suggestions: Vec<String>,
    },

    /// An edge endpoint resolves to a variable of an incompatible role
    #[error("role mismatch at '{path}': variable has role {role}, expected {expected}")]
    RoleMismatch {
        path: String,
        role: VariableRole,
        expected: &'static str,
    },

    /// A non-empty transfer chain does not expose exactly one free input and
    /// one output
    #[error("invalid transfer template '{template}': {reason}")]
    InvalidTransfer { template: String, reason: String },
}

impl CircuitError {
    fn unbound(
        path: &VariableRef,
        reason: impl Into<String>,
        suggestions: Vec<String>,
    ) -> Self {
        Self::UnboundReference {
            path: path.to_string(),
            reason: reason.into(),
            suggestions,
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean {}?)", suggestions.join(", "))
    }
}

/// Build a circuit graph from a resolved circuit record.
///
/// `node_templates` and `edge_templates` map template names to their
/// assembled forms; the caller resolves and assembles them beforehand.
/// Building is all-or-nothing: no partial graph is returned on failure.
pub fn build(
    circuit: &RawTemplate,
    node_templates: &BTreeMap<String, ResolvedNode>,
    edge_templates: &BTreeMap<String, ResolvedEdge>,
) -> Result<CircuitGraph, CircuitError> {
    // Instantiate every node map entry as an independently owned copy
    let mut nodes = BTreeMap::new();
    for (instance, template) in circuit.nodes.as_ref().into_iter().flatten() {
        let unit = node_templates.get(template).ok_or_else(|| {
            CircuitError::UnknownNodeTemplate {
                node: instance.clone(),
                template: template.clone(),
            }
        })?;
        nodes.insert(
            instance.clone(),
            CircuitNode {
                name: instance.clone(),
                unit: unit.clone(),
            },
        );
    }

    // Resolve edges in declaration order; multiple edges into the same
    // input are all retained
    let mut edges = Vec::new();
    for entry in circuit.edges.as_deref().unwrap_or_default() {
        let source = parse_reference(entry.source_path())?;
        let target = parse_reference(entry.target_path())?;

        let source_role = endpoint_role(&source, &nodes)?;
        if !matches!(source_role, VariableRole::Output | VariableRole::Input) {
            return Err(CircuitError::RoleMismatch {
                path: source.to_string(),
                role: source_role,
                expected: "output",
            });
        }

        let target_role = endpoint_role(&target, &nodes)?;
        if target_role != VariableRole::Input {
            return Err(CircuitError::RoleMismatch {
                path: target.to_string(),
                role: target_role,
                expected: "input",
            });
        }

        let transfer = edge_templates
            .get(entry.transfer_template())
            .ok_or_else(|| CircuitError::UnknownEdgeTemplate {
                template: entry.transfer_template().to_string(),
            })?;
        validate_transfer(transfer)?;

        let parameters = entry.parameters().clone();
        let weight = parameters.get("weight").copied().unwrap_or(1.0);

        edges.push(CircuitEdge {
            source,
            target,
            transfer: transfer.clone(),
            weight,
            parameters,
        });
    }

    Ok(CircuitGraph {
        name: circuit.name.clone(),
        nodes,
        edges,
    })
}

/// Split an endpoint path into its `(node, operator, variable)` triple
fn parse_reference(path: &str) -> Result<VariableRef, CircuitError> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
        return Err(CircuitError::MalformedReference {
            path: path.to_string(),
        });
    }
    Ok(VariableRef {
        node: segments[0].to_string(),
        operator: segments[1].to_string(),
        variable: segments[2].to_string(),
    })
}

/// Resolve an endpoint against the instantiated nodes and return the role of
/// the referenced variable
fn endpoint_role(
    reference: &VariableRef,
    nodes: &BTreeMap<String, CircuitNode>,
) -> Result<VariableRole, CircuitError> {
    let node = nodes.get(&reference.node).ok_or_else(|| {
        CircuitError::unbound(
            reference,
            format!("no node named '{}'", reference.node),
            find_similar(nodes.keys().map(|s| s.as_str()), &reference.node, 2),
        )
    })?;

    let operator = node
        .unit
        .chain
        .operator(&reference.operator)
        .ok_or_else(|| {
            CircuitError::unbound(
                reference,
                format!(
                    "node '{}' has no operator '{}'",
                    reference.node, reference.operator
                ),
                find_similar(
                    node.unit.chain.operators.iter().map(|op| op.name.as_str()),
                    &reference.operator,
                    2,
                ),
            )
        })?;

    let spec = operator.variable(&reference.variable).ok_or_else(|| {
        CircuitError::unbound(
            reference,
            format!(
                "operator '{}' has no variable '{}'",
                reference.operator, reference.variable
            ),
            find_similar(
                operator.variables.keys().map(|s| s.as_str()),
                &reference.variable,
                2,
            ),
        )
    })?;

    Ok(spec.role)
}

/// A non-empty transfer chain must expose exactly one free input (fed by the
/// source variable) and exactly one output (delivered to the target).
fn validate_transfer(transfer: &ResolvedEdge) -> Result<(), CircuitError> {
    if transfer.is_passthrough() {
        return Ok(());
    }
    let inputs = transfer.chain.free_inputs().count();
    if inputs != 1 {
        return Err(CircuitError::InvalidTransfer {
            template: transfer.name.clone(),
            reason: format!("expected exactly one free input, found {}", inputs),
        });
    }
    let outputs = transfer.chain.outputs().count();
    if outputs != 1 {
        return Err(CircuitError::InvalidTransfer {
            template: transfer.name.clone(),
            reason: format!("expected exactly one output, found {}", outputs),
        });
    }
    Ok(())
}

/// Compute Levenshtein edit distance between two strings
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut dp = vec![vec![0usize; n + 1]; m + 1];

    for i in 0..=m {
        dp[i][0] = i;
    }
    for j in 0..=n {
        dp[0][j] = j;
    }

    for i in 1..=m {
        for j in 1..=n {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }

    dp[m][n]
}

/// Find similar names within a maximum edit distance
fn find_similar<'a>(
    candidates: impl Iterator<Item = &'a str>,
    target: &str,
    max_distance: usize,
) -> Vec<String> {
    let mut ranked: Vec<(String, usize)> = candidates
        .filter_map(|name| {
            let dist = levenshtein_distance(name, target);
            if dist <= max_distance && dist > 0 {
                Some((name.to_string(), dist))
            } else {
                None
            }
        })
        .collect();

    ranked.sort_by_key(|(_, d)| *d);
    ranked.into_iter().map(|(name, _)| name).take(3).collect()
}
