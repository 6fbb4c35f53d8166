//! Operator compiler - turns resolved operator records into structured
//! descriptors with parsed equations and role-tagged variables

use std::collections::BTreeMap;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::equation::{self, Equation, Span};
use crate::error::EquationError;
use crate::template::{RawTemplate, RawValue};

/// Functional category of an operator variable.
///
/// The authored keyword `variable` maps to [`VariableRole::State`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableRole {
    /// Unbound slot, summed from incoming contributions before integration
    Input,
    /// Exposed for downstream wiring
    Output,
    /// Internal state advanced by the equations
    State,
    /// Fixed default carried into the graph
    Constant,
    /// Bound externally at run time
    Placeholder,
}

impl VariableRole {
    /// Map an authored role keyword, if the string is one
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "input" => Some(VariableRole::Input),
            "output" => Some(VariableRole::Output),
            "variable" => Some(VariableRole::State),
            "placeholder" => Some(VariableRole::Placeholder),
            _ => None,
        }
    }
}

impl std::fmt::Display for VariableRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VariableRole::Input => "input",
            VariableRole::Output => "output",
            VariableRole::State => "variable",
            VariableRole::Constant => "constant",
            VariableRole::Placeholder => "placeholder",
        };
        write!(f, "{}", name)
    }
}

/// A concrete default value for a constant variable
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    /// Uninterpreted expression text, evaluated by the numerical engine
    Expression(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Expression(e) => write!(f, "{}", e),
        }
    }
}

/// Role-tagged variable descriptor.
///
/// `default` is populated exactly when the role is [`VariableRole::Constant`];
/// role keywords carry no numeric default.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    pub role: VariableRole,
    pub default: Option<Literal>,
    pub unit: Option<String>,
    pub description: Option<String>,
}

/// A compiled operator: ordered equations plus its variable namespace
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOperator {
    pub name: String,
    pub equations: Vec<Equation>,
    pub variables: BTreeMap<String, VariableSpec>,
}

impl ResolvedOperator {
    pub fn variable(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.get(name)
    }

    /// Names of variables with a given role, in namespace order
    pub fn variables_with_role(&self, role: VariableRole) -> impl Iterator<Item = &str> {
        self.variables
            .iter()
            .filter(move |(_, spec)| spec.role == role)
            .map(|(name, _)| name.as_str())
    }
}

/// Errors that can occur while compiling an operator
#[derive(Debug, Error)]
pub enum OperatorError {
    /// An equation string does not parse
    #[error("invalid equation in operator '{operator}': {}", format_equation_errors(errors))]
    Equation {
        operator: String,
        equation: String,
        errors: Vec<EquationError>,
    },

    /// An equation references a symbol absent from the variable declarations
    #[error("undeclared variable '{symbol}' in equation '{equation}' of operator '{operator}'")]
    UndeclaredVariable {
        operator: String,
        symbol: String,
        equation: String,
        span: Span,
    },
}

impl OperatorError {
    /// Format the error with the offending equation as context using ariadne
    pub fn format(&self) -> String {
        match self {
            OperatorError::Equation {
                operator,
                equation,
                errors,
            } => errors
                .iter()
                .map(|e| e.format(equation, operator))
                .collect::<Vec<_>>()
                .join("\n"),
            OperatorError::UndeclaredVariable {
                operator,
                symbol,
                equation,
                span,
            } => {
                let mut buf = Vec::new();
                Report::build(ReportKind::Error, operator.as_str(), span.start)
                    .with_message(format!("undeclared variable '{}'", symbol))
                    .with_label(
                        Label::new((operator.as_str(), span.clone()))
                            .with_message("not present in the variable declarations")
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((operator.as_str(), Source::from(equation.as_str())), &mut buf)
                    .unwrap();
                String::from_utf8(buf).unwrap()
            }
        }
    }
}

fn format_equation_errors(errors: &[EquationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Compile a resolved operator record into a [`ResolvedOperator`].
///
/// Variable roles derive from the authored default: the keywords `input`,
/// `output`, `variable` and `placeholder` are role-only declarations; any
/// other value declares a constant with that literal as its default.
/// Equations are parsed for structure only and validated for symbol
/// presence; their order is preserved, never inferred.
pub fn compile(record: &RawTemplate) -> Result<ResolvedOperator, OperatorError> {
    let mut variables = BTreeMap::new();
    for (name, raw) in &record.variables {
        let (role, default) = classify(raw.default_value());
        variables.insert(
            name.clone(),
            VariableSpec {
                role,
                default,
                unit: raw.unit().map(str::to_string),
                description: raw.description().map(str::to_string),
            },
        );
    }

    let mut equations = Vec::new();
    for text in record.equations.as_deref().unwrap_or_default() {
        let parsed = equation::parse(text).map_err(|errors| OperatorError::Equation {
            operator: record.name.clone(),
            equation: text.clone(),
            errors,
        })?;

        for symbol in parsed.free_symbols() {
            if !variables.contains_key(&symbol.node) {
                return Err(OperatorError::UndeclaredVariable {
                    operator: record.name.clone(),
                    symbol: symbol.node.clone(),
                    equation: text.clone(),
                    span: symbol.span.clone(),
                });
            }
        }

        equations.push(parsed);
    }

    Ok(ResolvedOperator {
        name: record.name.clone(),
        equations,
        variables,
    })
}

fn classify(value: &RawValue) -> (VariableRole, Option<Literal>) {
    match value {
        RawValue::Number(n) => (VariableRole::Constant, Some(Literal::Number(*n))),
        RawValue::Text(s) => match VariableRole::from_keyword(s) {
            Some(role) => (role, None),
            None => (
                VariableRole::Constant,
                Some(Literal::Expression(s.clone())),
            ),
        },
    }
}
