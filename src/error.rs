//! Error types for equation parsing and diagnostics

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in equation text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug)]
pub enum EquationError {
    #[error("equation syntax error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl EquationError {
    /// Format the error with the equation text as context using ariadne
    pub fn format(&self, equation: &str, origin: &str) -> String {
        let mut buf = Vec::new();
        match self {
            EquationError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                Report::build(ReportKind::Error, origin, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((origin, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((origin, Source::from(equation)), &mut buf)
                    .unwrap();
            }
        }
        String::from_utf8(buf).unwrap()
    }
}

impl<'a> From<chumsky::error::Rich<'a, crate::equation::lexer::Token>> for EquationError {
    fn from(err: chumsky::error::Rich<'a, crate::equation::lexer::Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of equation".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of equation".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        EquationError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &crate::equation::lexer::Token) -> String {
    use crate::equation::lexer::Token;
    match tok {
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::Number(n) => format!("number {}", n),
        Token::DtOf => "'d/dt'".to_string(),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Star => "'*'".to_string(),
        Token::Slash => "'/'".to_string(),
        Token::Caret => "'^'".to_string(),
        Token::Equals => "'='".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::Comma => "','".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = EquationError::Syntax {
            span: 4..5,
            message: "Unexpected '='".to_string(),
            expected: vec![],
        };
        assert!(err.to_string().contains("Unexpected"));
    }

    #[test]
    fn test_format_includes_message() {
        let err = EquationError::Syntax {
            span: 0..1,
            message: "bad token".to_string(),
            expected: vec!["identifier".to_string()],
        };
        let report = err.format("r = = v", "Op_e");
        assert!(report.contains("bad token"));
    }
}
