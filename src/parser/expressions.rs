//! Expression parsers.
//!
//! Precedence, loosest first: `or`, `and`, `== !=`, `< > <= >=`, `+ -`,
//! `* / %`, prefix `-`/`not`, atoms. Every binary level is left
//! associative. Parentheses produce no node of their own; the inner
//! expression's span is widened to cover them.

use crate::ast::{BinOp, Call, Expr, LiteralKind, Spanned, UnaryOp};
use crate::lexer::Token;
use chumsky::prelude::*;

use super::primitives::{cover, spanned_ident, to_ast_span, GrugExtra, ParserInput};

/// Fold one left-associative binary precedence level.
fn binary_level<'tokens, 'src: 'tokens>(
    operand: impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<Expr>, GrugExtra<'tokens, 'src>>
        + Clone,
    op: impl Parser<'tokens, ParserInput<'tokens, 'src>, BinOp, GrugExtra<'tokens, 'src>> + Clone,
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<Expr>, GrugExtra<'tokens, 'src>> + Clone
{
    operand
        .clone()
        .foldl(op.then(operand).repeated(), |left, (op, right)| {
            let span = cover(&left, &right);
            Spanned::new(
                Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            )
        })
}

/// Parse an expression.
pub fn expr<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<Expr>, GrugExtra<'tokens, 'src>> + Clone
{
    recursive(|expr| {
        let literal = select! {
            Token::NumberLit(s) => Expr::Literal { kind: LiteralKind::Number, value: s.to_string() },
            Token::StringLit(s) => Expr::Literal { kind: LiteralKind::String, value: s.to_string() },
            Token::True => Expr::bool(true),
            Token::False => Expr::bool(false),
        };

        let arguments = expr
            .clone()
            .separated_by(just(Token::Comma))
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        // A call must be tried before a bare identifier
        let call = spanned_ident()
            .then(arguments)
            .map(|(name, arguments)| Expr::Call(Call { name, arguments }));

        let identifier = select! {
            Token::Ident(s) => Expr::Identifier(s.to_string()),
        };

        let plain = choice((literal, call, identifier))
            .map_with(|e, extra| Spanned::new(e, to_ast_span(extra.span())));

        let parenthesized = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map_with(|inner: Spanned<Expr>, e| Spanned {
                span: Some(to_ast_span(e.span())),
                ..inner
            });

        let atom = choice((plain, parenthesized)).labelled("expression");

        // Prefix operators, innermost applied first
        let unary_op = choice((just(Token::Minus).to(UnaryOp::Neg), just(Token::Not).to(UnaryOp::Not)))
            .map_with(|op, e| (op, e.span()));

        let unary = unary_op
            .repeated()
            .foldr(atom, |(op, op_span), operand: Spanned<Expr>| {
                let end = operand.span.as_ref().map_or(op_span.end, |s| s.end);
                Spanned::new(
                    Expr::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    op_span.start..end,
                )
            })
            .boxed();

        let product = binary_level(
            unary,
            choice((
                just(Token::Star).to(BinOp::Mul),
                just(Token::Slash).to(BinOp::Div),
                just(Token::Percent).to(BinOp::Rem),
            )),
        );

        let sum = binary_level(
            product,
            choice((just(Token::Plus).to(BinOp::Add), just(Token::Minus).to(BinOp::Sub))),
        )
        .boxed();

        let comparison = binary_level(
            sum,
            choice((
                just(Token::Le).to(BinOp::Le),
                just(Token::Ge).to(BinOp::Ge),
                just(Token::Lt).to(BinOp::Lt),
                just(Token::Gt).to(BinOp::Gt),
            )),
        );

        let equality = binary_level(
            comparison,
            choice((just(Token::Eq).to(BinOp::Eq), just(Token::Ne).to(BinOp::Ne))),
        )
        .boxed();

        let and_expr = binary_level(equality, just(Token::And).to(BinOp::And));

        // Box to break the type chain and keep compile times reasonable
        binary_level(and_expr, just(Token::Or).to(BinOp::Or)).boxed()
    })
}
