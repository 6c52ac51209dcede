//! Parser for grug source code.
//!
//! This module converts grug source into a typed Abstract Syntax Tree
//! ([`File`]).
//!
//! # Architecture
//!
//! The parser uses a two-phase approach:
//!
//! 1. **Lexical analysis** - Source → Tokens (via [`crate::lexer`])
//! 2. **Parsing** - Tokens → AST (via chumsky combinators)
//!
//! After parsing, every node is stamped with its 1-based source line.
//!
//! # Usage
//!
//! ```rust
//! use grug_ast::parser::parse;
//!
//! let source = "entity gun {\n\tdamage: i32 = 25,\n}\n";
//!
//! match parse(source) {
//!     Ok(file) => println!("{} has {} fields", file.entity.node.name.node, file.entity.node.fields.len()),
//!     Err(err) => eprintln!("line {}: {}", err.line, err),
//! }
//! ```
//!
//! # Errors
//!
//! Parsing stops at the first problem. Of all errors chumsky reports, the one
//! starting earliest in the source is returned as an [`ErrorKind::Syntax`]
//! error.
//!
//! [`ErrorKind::Syntax`]: crate::error::ErrorKind::Syntax

mod expressions;
mod items;
mod primitives;
mod statements;
#[cfg(test)]
mod tests;

use crate::ast::File;
use crate::error::{Error, Result};
use crate::here;
use crate::lexer::{lexer, Token};
use crate::source::{annotate_lines, LineIndex};

use chumsky::error::RichReason;
use chumsky::input::Input as _;
use chumsky::prelude::*;

// Re-export the span type
pub use primitives::Span;
use primitives::{line_end, skip_newlines, GrugExtra, ParserInput};

/// Lex source into spanned tokens.
///
/// Used by the token dump tool; [`parse`] calls the lexer itself.
pub fn lex(source: &str) -> Result<Vec<(Token<'_>, Span)>> {
    lexer().parse(source).into_result().map_err(|errs| {
        let index = LineIndex::new(source);
        let first = errs
            .into_iter()
            .min_by_key(|e| e.span().start)
            .map(|e| (describe(&e), e.span().into_range()));
        match first {
            Some((message, span)) => Error::syntax(message, index.line_of(span.start), span, here!()),
            None => Error::syntax("invalid input", 1, 0..0, here!()),
        }
    })
}

/// Parse a grug file from source code.
pub fn parse(source: &str) -> Result<File> {
    let tokens = lex(source)?;
    let index = LineIndex::new(source);

    let eoi_span = Span::new((), source.len()..source.len());
    let token_stream = tokens.as_slice().split_token_span(eoi_span);

    let (result, errs) = file_parser().parse(token_stream).into_output_errors();

    if let Some(err) = errs.iter().min_by_key(|e| e.span().start) {
        let span = err.span().into_range();
        log::debug!("syntax error at {:?}: {:?}", span, err.reason());
        return Err(Error::syntax(
            describe(err),
            index.line_of(span.start),
            span,
            here!(),
        ));
    }

    let mut file =
        result.ok_or_else(|| Error::syntax("unable to parse file", 1, 0..0, here!()))?;
    annotate_lines(&mut file, &index);
    Ok(file)
}

/// Describe a chumsky error in one line.
fn describe<T: std::fmt::Display>(error: &Rich<'_, T, Span>) -> String {
    if let RichReason::Custom(message) = error.reason() {
        return message.clone();
    }

    let expected: Vec<String> = error.expected().map(|e| e.to_string()).collect();
    let expected_str = match expected.len() {
        0 => String::new(),
        1 => format!(", expected {}", expected[0]),
        _ => format!(", expected one of: {}", expected.join(", ")),
    };

    let found_str = match error.found() {
        Some(tok) => format!("unexpected '{}'", tok),
        None => "unexpected end of input".to_string(),
    };

    format!("{}{}", found_str, expected_str)
}

/// Parse a complete file: the entity, then globals, then functions.
fn file_parser<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, File, GrugExtra<'tokens, 'src>> + Clone {
    let globals = line_end()
        .ignore_then(items::global_variable())
        .repeated()
        .collect::<Vec<_>>();

    let functions = line_end()
        .ignore_then(items::function())
        .repeated()
        .collect::<Vec<_>>();

    skip_newlines()
        .ignore_then(items::entity())
        .then(globals)
        .then(functions)
        .then_ignore(skip_newlines())
        .then_ignore(end())
        .map(|((entity, globals), functions)| File {
            entity,
            globals,
            functions,
        })
}
