//! Structural representation of symbolic equations
//!
//! Equations stay opaque text at this layer: only the defined symbol and the
//! right-hand-side symbol occurrences are extracted. Evaluating or
//! simplifying the mathematics belongs to the downstream numerical engine.

/// Byte range in equation text
pub type Span = std::ops::Range<usize>;

/// A value with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// What the left-hand side of an equation defines
#[derive(Debug, Clone, PartialEq)]
pub enum EquationKind {
    /// `d/dt * x = ...` advances the state variable `x`
    Differential { state: Spanned<String> },
    /// `x = ...` assigns `x` algebraically within the integration step
    Algebraic { target: Spanned<String> },
}

/// A single parsed equation
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    /// The equation text as authored
    pub raw: String,
    pub kind: EquationKind,
    /// Every identifier occurrence on the right-hand side, in source order,
    /// builtins included
    pub symbols: Vec<Spanned<String>>,
}

impl Equation {
    /// The symbol this equation defines
    pub fn defined_symbol(&self) -> &Spanned<String> {
        match &self.kind {
            EquationKind::Differential { state } => state,
            EquationKind::Algebraic { target } => target,
        }
    }

    /// True if this equation advances a state variable over time
    pub fn is_differential(&self) -> bool {
        matches!(self.kind, EquationKind::Differential { .. })
    }

    /// Symbol occurrences that must be declared by the operator: the defined
    /// symbol plus every right-hand-side symbol that is not a builtin.
    pub fn free_symbols(&self) -> impl Iterator<Item = &Spanned<String>> {
        std::iter::once(self.defined_symbol()).chain(
            self.symbols
                .iter()
                .filter(|s| !super::lexer::is_builtin(&s.node)),
        )
    }
}

impl std::fmt::Display for Equation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Equation {
        Equation {
            raw: "d/dt * r = delta/(PI*tau^2)".to_string(),
            kind: EquationKind::Differential {
                state: Spanned::new("r".to_string(), 7..8),
            },
            symbols: vec![
                Spanned::new("delta".to_string(), 11..16),
                Spanned::new("PI".to_string(), 18..20),
                Spanned::new("tau".to_string(), 21..24),
            ],
        }
    }

    #[test]
    fn test_defined_symbol() {
        let eq = sample();
        assert_eq!(eq.defined_symbol().node, "r");
        assert!(eq.is_differential());
    }

    #[test]
    fn test_free_symbols_skip_builtins() {
        let eq = sample();
        let free: Vec<&str> = eq.free_symbols().map(|s| s.node.as_str()).collect();
        assert_eq!(free, vec!["r", "delta", "tau"]);
    }
}
