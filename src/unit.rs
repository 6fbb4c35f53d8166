//! Node/edge assembler - concatenates compiled operators into units with a
//! shared variable namespace

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::operator::{ResolvedOperator, VariableRole, VariableSpec};

/// Errors that can occur while assembling an operator chain
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Two operators in one unit declare the same variable with conflicting
    /// roles
    #[error("duplicate variable '{variable}' in unit '{unit}': declared as {first}, redeclared as {second}")]
    DuplicateVariable {
        unit: String,
        variable: String,
        first: VariableRole,
        second: VariableRole,
    },
}

/// An ordered chain of compiled operators and the union of their variable
/// namespaces.
///
/// Later operators may consume an earlier operator's `output` as their
/// same-named `input` (pipeline composition); such inputs are recorded as
/// bound and the union keeps the producing side's `output` role.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorChain {
    pub operators: Vec<ResolvedOperator>,
    pub namespace: BTreeMap<String, VariableSpec>,
    bound_inputs: BTreeSet<String>,
}

impl OperatorChain {
    /// Look up an operator by template name
    pub fn operator(&self, name: &str) -> Option<&ResolvedOperator> {
        self.operators.iter().find(|op| op.name == name)
    }

    /// Inputs still open for external contributions
    pub fn free_inputs(&self) -> impl Iterator<Item = &str> {
        self.namespace
            .iter()
            .filter(|(_, spec)| spec.role == VariableRole::Input)
            .map(|(name, _)| name.as_str())
    }

    /// Outputs exposed for downstream wiring
    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.namespace
            .iter()
            .filter(|(_, spec)| spec.role == VariableRole::Output)
            .map(|(name, _)| name.as_str())
    }

    /// True if this input is satisfied inside the chain by an earlier output
    pub fn is_bound_input(&self, name: &str) -> bool {
        self.bound_inputs.contains(name)
    }
}

/// A node unit: a population-like element composed of an operator chain
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNode {
    pub name: String,
    pub chain: OperatorChain,
}

/// An edge unit: a coupling transfer composed of an operator chain.
///
/// An empty chain is the pass-through case: pure scalar multiplication by
/// the edge weight, with no transfer equations of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEdge {
    pub name: String,
    pub chain: OperatorChain,
}

impl ResolvedEdge {
    pub fn is_passthrough(&self) -> bool {
        self.chain.operators.is_empty()
    }
}

/// Assemble compiled operators into a node unit
pub fn assemble_node(
    name: impl Into<String>,
    operators: Vec<ResolvedOperator>,
) -> Result<ResolvedNode, AssemblyError> {
    let name = name.into();
    let chain = assemble_chain(&name, operators)?;
    Ok(ResolvedNode { name, chain })
}

/// Assemble compiled operators into an edge unit
pub fn assemble_edge(
    name: impl Into<String>,
    operators: Vec<ResolvedOperator>,
) -> Result<ResolvedEdge, AssemblyError> {
    let name = name.into();
    let chain = assemble_chain(&name, operators)?;
    Ok(ResolvedEdge { name, chain })
}

fn assemble_chain(
    unit: &str,
    operators: Vec<ResolvedOperator>,
) -> Result<OperatorChain, AssemblyError> {
    let mut namespace: BTreeMap<String, VariableSpec> = BTreeMap::new();
    let mut bound_inputs = BTreeSet::new();

    for op in &operators {
        for (name, spec) in &op.variables {
            match namespace.get(name).map(|existing| existing.role) {
                None => {
                    namespace.insert(name.clone(), spec.clone());
                }
                Some(first) => {
                    let chained =
                        first == VariableRole::Output && spec.role == VariableRole::Input;
                    if chained {
                        // The earlier output satisfies this input; the union
                        // keeps the producing side's spec.
                        bound_inputs.insert(name.clone());
                    } else if first != spec.role {
                        return Err(AssemblyError::DuplicateVariable {
                            unit: unit.to_string(),
                            variable: name.clone(),
                            first,
                            second: spec.role,
                        });
                    }
                    // Same role: intentional sharing, first declaration wins
                }
            }
        }
    }

    Ok(OperatorChain {
        operators,
        namespace,
        bound_inputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::compile;
    use crate::template::{BaseRef, RawTemplate, RawValue, RawVariable, TemplateKind};

    fn operator(name: &str, equations: Vec<&str>, variables: Vec<(&str, RawValue)>) -> ResolvedOperator {
        let mut r = RawTemplate::new(name, BaseRef::Kind(TemplateKind::Operator));
        r.equations = Some(equations.into_iter().map(str::to_string).collect());
        for (var, value) in variables {
            r.variables
                .insert(var.to_string(), RawVariable::Value(value));
        }
        compile(&r).expect("Should compile")
    }

    fn num(n: f64) -> RawValue {
        RawValue::Number(n)
    }

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn test_assemble_single_operator_node() {
        let op = operator(
            "Op_e",
            vec!["d/dt * r = r / tau"],
            vec![("r", text("output")), ("tau", num(1.0))],
        );
        let node = assemble_node("PC_pop", vec![op]).expect("Should assemble");
        assert_eq!(node.chain.operators.len(), 1);
        assert_eq!(node.chain.namespace.len(), 2);
        let outputs: Vec<&str> = node.chain.outputs().collect();
        assert_eq!(outputs, vec!["r"]);
    }

    #[test]
    fn test_chained_operators_bind_input() {
        // First operator produces psp, second consumes it as its input
        let rpo = operator(
            "RPO",
            vec!["d/dt * psp = h * m_in / tau - psp / tau"],
            vec![
                ("psp", text("output")),
                ("m_in", text("input")),
                ("h", num(3.25)),
                ("tau", num(10.0)),
            ],
        );
        let pro = operator(
            "PRO",
            vec!["m_out = m_max / (1. + exp(r*(v_th - psp)))"],
            vec![
                ("m_out", text("output")),
                ("psp", text("input")),
                ("m_max", num(5.0)),
                ("r", num(0.56)),
                ("v_th", num(6.0)),
            ],
        );

        let node = assemble_node("JR_PC", vec![rpo, pro]).expect("Should assemble");
        assert!(node.chain.is_bound_input("psp"));
        // psp stays exposed as the producing operator's output in the union
        assert_eq!(
            node.chain.namespace.get("psp").unwrap().role,
            VariableRole::Output
        );
        // m_in remains the only free input
        let free: Vec<&str> = node.chain.free_inputs().collect();
        assert_eq!(free, vec!["m_in"]);
    }

    #[test]
    fn test_conflicting_roles_fail() {
        let a = operator(
            "A",
            vec!["r = tau"],
            vec![("r", text("output")), ("tau", num(1.0))],
        );
        let b = operator(
            "B",
            vec!["v = tau"],
            vec![("v", text("output")), ("tau", text("input"))],
        );

        let err = assemble_node("N", vec![a, b]).expect_err("Should fail");
        match err {
            AssemblyError::DuplicateVariable {
                unit,
                variable,
                first,
                second,
            } => {
                assert_eq!(unit, "N");
                assert_eq!(variable, "tau");
                assert_eq!(first, VariableRole::Constant);
                assert_eq!(second, VariableRole::Input);
            }
        }
    }

    #[test]
    fn test_same_role_is_allowed() {
        let a = operator(
            "A",
            vec!["r = inp"],
            vec![("r", text("output")), ("inp", text("input"))],
        );
        let b = operator(
            "B",
            vec!["v = inp"],
            vec![("v", text("output")), ("inp", text("input"))],
        );

        let node = assemble_node("N", vec![a, b]).expect("Should assemble");
        let free: Vec<&str> = node.chain.free_inputs().collect();
        assert_eq!(free, vec!["inp"]);
    }

    #[test]
    fn test_input_before_output_conflicts() {
        // Reversed declaration order is not pipeline composition
        let a = operator(
            "A",
            vec!["r = psp"],
            vec![("r", text("output")), ("psp", text("input"))],
        );
        let b = operator(
            "B",
            vec!["d/dt * psp = r"],
            vec![("psp", text("output")), ("r", text("input"))],
        );

        let err = assemble_node("N", vec![a, b]).expect_err("Should fail");
        assert!(matches!(err, AssemblyError::DuplicateVariable { .. }));
    }

    #[test]
    fn test_passthrough_edge() {
        let edge = assemble_edge("Direct", vec![]).expect("Should assemble");
        assert!(edge.is_passthrough());
        assert_eq!(edge.chain.namespace.len(), 0);
    }

    #[test]
    fn test_coupling_edge() {
        let lc = operator(
            "LinearCoupling",
            vec!["r_in = c * r_out"],
            vec![
                ("r_in", text("output")),
                ("r_out", text("input")),
                ("c", num(1.0)),
            ],
        );
        let edge = assemble_edge("LC", vec![lc]).expect("Should assemble");
        assert!(!edge.is_passthrough());
        let free: Vec<&str> = edge.chain.free_inputs().collect();
        assert_eq!(free, vec!["r_out"]);
        let outputs: Vec<&str> = edge.chain.outputs().collect();
        assert_eq!(outputs, vec!["r_in"]);
    }
}
