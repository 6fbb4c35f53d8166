//! Lexer for symbolic equation strings using logos

use logos::Logos;

/// Byte range in equation text
pub type Span = std::ops::Range<usize>;

/// Symbols with a fixed mathematical meaning. These never count as free
/// variables of an equation.
pub const BUILTINS: &[&str] = &[
    "PI", "E", "exp", "sin", "cos", "tan", "sinh", "cosh", "tanh", "sqrt", "abs", "max", "min",
    "sigmoid",
];

/// Check whether a symbol is a mathematical builtin
pub fn is_builtin(symbol: &str) -> bool {
    BUILTINS.contains(&symbol)
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Derivative marker (must outrank a bare 'd' identifier)
    #[token("d/dt")]
    DtOf,

    // Arithmetic operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,
    #[token("=")]
    Equals,

    // Delimiters
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token(",")]
    Comma,

    // Identifiers may carry prime marks for higher-order state (v, v', v'')
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*'*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),
}

/// Lex an equation string into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivative_marker() {
        let tokens: Vec<_> = lex("d/dt * r").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![Token::DtOf, Token::Star, Token::Ident("r".to_string())]
        );
    }

    #[test]
    fn test_operators() {
        let tokens: Vec<_> = lex("+ - * / ^ =").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Caret,
                Token::Equals
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens: Vec<_> = lex("2. 0.5 1e-3 42").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Number(2.0),
                Token::Number(0.5),
                Token::Number(1e-3),
                Token::Number(42.0)
            ]
        );
    }

    #[test]
    fn test_primed_identifiers() {
        let tokens: Vec<_> = lex("v v' v''").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("v".to_string()),
                Token::Ident("v'".to_string()),
                Token::Ident("v''".to_string())
            ]
        );
    }

    #[test]
    fn test_full_equation() {
        let tokens: Vec<_> = lex("d/dt * r = delta/(PI*tau^2) + 2.*r*v/tau")
            .map(|(t, _)| t)
            .collect();
        assert!(tokens.contains(&Token::DtOf));
        assert!(tokens.contains(&Token::Ident("delta".to_string())));
        assert!(tokens.contains(&Token::Caret));
    }

    #[test]
    fn test_spans_index_source() {
        let pairs: Vec<_> = lex("tau + eta").collect();
        let source = "tau + eta";
        for (tok, span) in pairs {
            if let Token::Ident(name) = tok {
                assert_eq!(&source[span], name.as_str());
            }
        }
    }

    #[test]
    fn test_builtins() {
        assert!(is_builtin("PI"));
        assert!(is_builtin("sigmoid"));
        assert!(!is_builtin("tau"));
    }
}
