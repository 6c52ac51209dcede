//! Primitive parsers for basic tokens.
//!
//! This module contains parsers for identifiers, type tags, newlines and the
//! span helpers the other parser modules share.

use crate::ast::Spanned;
use crate::lexer::Token;
use chumsky::input::MappedInput;
use chumsky::prelude::*;

/// Token span type (from lexer).
pub type Span = SimpleSpan<usize>;

/// Spanned token type.
pub type SpannedToken<'src> = (Token<'src>, Span);

/// Parser input type - a slice of spanned tokens mapped into chumsky format.
/// Created by calling `tokens.split_token_span(eoi_span)` on a token slice.
pub type ParserInput<'tokens, 'src> =
    MappedInput<'tokens, Token<'src>, Span, &'tokens [SpannedToken<'src>]>;

/// Parser extra state: rich errors over grug tokens.
pub type GrugExtra<'tokens, 'src> = extra::Err<Rich<'tokens, Token<'src>, Span>>;

/// Convert a chumsky SimpleSpan to our AST Span (Range<usize>).
pub fn to_ast_span(span: Span) -> std::ops::Range<usize> {
    span.start..span.end
}

/// The span from the start of `first` to the end of `last`.
pub fn cover<A, B>(first: &Spanned<A>, last: &Spanned<B>) -> std::ops::Range<usize> {
    let start = first.span.as_ref().map_or(0, |s| s.start);
    let end = last.span.as_ref().map_or(start, |s| s.end);
    start..end
}

/// Parse an identifier as a spanned string.
pub fn spanned_ident<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<String>, GrugExtra<'tokens, 'src>>
       + Clone {
    select! {
        Token::Ident(s) => s.to_string(),
    }
    .map_with(|s, e| Spanned::new(s, to_ast_span(e.span())))
    .labelled("identifier")
}

/// Parse a type tag such as `i32`, `string` or `id`.
pub fn spanned_type<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<String>, GrugExtra<'tokens, 'src>>
       + Clone {
    select! {
        Token::Ident(s) => s.to_string(),
    }
    .map_with(|s, e| Spanned::new(s, to_ast_span(e.span())))
    .labelled("type")
}

/// Parse a newline token.
pub fn newline<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, (), GrugExtra<'tokens, 'src>> + Clone {
    just(Token::Newline).ignored()
}

/// Skip optional newlines.
pub fn skip_newlines<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, (), GrugExtra<'tokens, 'src>> + Clone {
    newline().repeated().ignored()
}

/// One or more newlines, ending a line-based construct.
pub fn line_end<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, (), GrugExtra<'tokens, 'src>> + Clone {
    newline().repeated().at_least(1).ignored()
}
