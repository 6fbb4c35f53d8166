//! Equation shape parser using chumsky
//!
//! Recognizes the two authored equation forms (`d/dt * x = rhs` and
//! `x = rhs`) and collects right-hand-side symbol occurrences. The
//! right-hand side itself is not interpreted.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::equation::ast::*;
use crate::equation::lexer::{self, Token};

/// Parse one equation string into its structural form
pub fn parse(input: &str) -> Result<Equation, Vec<crate::EquationError>> {
    let len = input.len();

    // Create a logos lexer and convert to token stream
    let token_iter = lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    equation_parser()
        .parse(token_stream)
        .into_result()
        .map(|(kind, symbols)| Equation {
            raw: input.to_string(),
            kind,
            symbols,
        })
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's span type
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn equation_parser<'a, I>(
) -> impl Parser<'a, I, (EquationKind, Vec<Spanned<String>>), extra::Err<Rich<'a, Token>>>
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let identifier = select! {
        Token::Ident(s) => s,
    }
    .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

    // Left-hand side: derivative of a state variable, or a plain assignment
    let lhs = choice((
        just(Token::DtOf)
            .ignore_then(just(Token::Star))
            .ignore_then(identifier.clone())
            .map(|state| EquationKind::Differential { state }),
        identifier
            .clone()
            .map(|target| EquationKind::Algebraic { target }),
    ));

    // Right-hand side: an uninterpreted token sequence; only identifier
    // occurrences are kept. A second '=' is a syntax error.
    let symbol = select! {
        Token::Ident(s) => s,
    }
    .map_with(|s, e| Some(Spanned::new(s, span_range(&e.span()))));

    let non_symbol = select! {
        Token::Number(_) => (),
        Token::DtOf => (),
        Token::Plus => (),
        Token::Minus => (),
        Token::Star => (),
        Token::Slash => (),
        Token::Caret => (),
        Token::ParenOpen => (),
        Token::ParenClose => (),
        Token::Comma => (),
    }
    .map(|_| None);

    let rhs_token = symbol.or(non_symbol);

    let rhs = rhs_token
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .map(|items| items.into_iter().flatten().collect::<Vec<_>>());

    lhs.then_ignore(just(Token::Equals))
        .then(rhs)
        .then_ignore(end())
}
