//! Top-level item parsers: the entity, global variables and functions.

use crate::ast::{
    check_declared_type, Entity, Field, Function, GlobalVariable, Param, Spanned,
};
use crate::lexer::Token;
use chumsky::prelude::*;

use super::expressions::expr;
use super::primitives::{
    skip_newlines, spanned_ident, spanned_type, to_ast_span, GrugExtra, ParserInput,
};
use super::statements::block;

/// Parse one entity field: `name: type = value`.
fn field<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<Field>, GrugExtra<'tokens, 'src>> + Clone
{
    spanned_ident()
        .then_ignore(just(Token::Colon))
        .then(spanned_type())
        .then_ignore(just(Token::Assign))
        .then(expr())
        .validate(|((name, ty), value), e, emitter| {
            if let Err(msg) = check_declared_type(&name.node, &ty.node, &value.node) {
                emitter.emit(Rich::custom(e.span(), msg));
            }
            ((name, ty), value)
        })
        .map_with(|((name, ty), value), e| {
            Spanned::new(Field { name, ty, value }, to_ast_span(e.span()))
        })
        .labelled("field")
}

/// Parse the entity block.
///
/// Fields are separated by commas; a trailing comma is allowed and newlines
/// may appear around fields and separators.
pub fn entity<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<Entity>, GrugExtra<'tokens, 'src>> + Clone
{
    let separator = skip_newlines()
        .then(just(Token::Comma))
        .then(skip_newlines());

    let fields = field()
        .separated_by(separator)
        .allow_trailing()
        .collect::<Vec<_>>();

    just(Token::Entity)
        .ignore_then(spanned_ident())
        .then(
            fields
                .delimited_by(
                    just(Token::LBrace).then(skip_newlines()),
                    skip_newlines().then(just(Token::RBrace)),
                ),
        )
        .map_with(|(name, fields), e| Spanned::new(Entity { name, fields }, to_ast_span(e.span())))
        .labelled("entity")
}

/// Parse a global variable: `name: type = value`.
pub fn global_variable<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<GlobalVariable>,
    GrugExtra<'tokens, 'src>,
> + Clone {
    spanned_ident()
        .then_ignore(just(Token::Colon))
        .then(spanned_type())
        .then_ignore(just(Token::Assign))
        .then(expr())
        .validate(|((name, ty), value), e, emitter| {
            if let Err(msg) = check_declared_type(&name.node, &ty.node, &value.node) {
                emitter.emit(Rich::custom(e.span(), msg));
            }
            ((name, ty), value)
        })
        .map_with(|((name, ty), value), e| {
            Spanned::new(GlobalVariable { name, ty, value }, to_ast_span(e.span()))
        })
        .labelled("global variable")
}

/// Parse a function: `name(params) [return_type] { ... }`.
pub fn function<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<Function>, GrugExtra<'tokens, 'src>>
       + Clone {
    let param = spanned_ident()
        .then_ignore(just(Token::Colon))
        .then(spanned_type())
        .map_with(|(name, ty), e| Spanned::new(Param { name, ty }, to_ast_span(e.span())));

    let params = param
        .separated_by(just(Token::Comma))
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LParen), just(Token::RParen));

    spanned_ident()
        .then(params)
        .then(spanned_type().or_not())
        .then(block())
        .map_with(|(((name, params), return_type), body), e| {
            Spanned::new(
                Function {
                    name,
                    params,
                    return_type,
                    body,
                },
                to_ast_span(e.span()),
            )
        })
        .labelled("function")
}
