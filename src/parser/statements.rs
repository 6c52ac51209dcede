//! Statement and block parsers.
//!
//! A block is `{`, then statements each terminated by one or more newlines,
//! then `}`. `{}` is an empty block. An `else if` chain is parsed into an
//! else block holding the nested `if`, spanned over that `if`.

use crate::ast::{check_declared_type, Block, Call, Spanned, Statement};
use crate::lexer::Token;
use chumsky::prelude::*;

use super::expressions::expr;
use super::primitives::{
    line_end, spanned_ident, spanned_type, to_ast_span, GrugExtra, ParserInput,
};

/// Parse a braced block of statements.
pub fn block<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<Block>, GrugExtra<'tokens, 'src>> + Clone
{
    recursive(|block| {
        let expr = expr();

        // name(arguments)
        let call = spanned_ident()
            .then(
                expr.clone()
                    .separated_by(just(Token::Comma))
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .map(|(name, arguments)| Statement::Call(Call { name, arguments }));

        // name = value, name: type = value
        let assignment = spanned_ident()
            .then(just(Token::Colon).ignore_then(spanned_type()).or_not())
            .then_ignore(just(Token::Assign))
            .then(expr.clone())
            .validate(|((name, ty), value), e, emitter| {
                if let Some(ty) = &ty {
                    if let Err(msg) = check_declared_type(&name.node, &ty.node, &value.node) {
                        emitter.emit(Rich::custom(e.span(), msg));
                    }
                }
                ((name, ty), value)
            })
            .map(|((name, ty), value)| Statement::Assignment { name, ty, value });

        let if_stmt = recursive(|if_stmt| {
            let else_branch = just(Token::Else).ignore_then(choice((
                if_stmt.map_with(|nested: Spanned<Statement>, e| {
                    Spanned::new(Block::new(vec![nested]), to_ast_span(e.span()))
                }),
                block.clone(),
            )));

            just(Token::If)
                .ignore_then(expr.clone())
                .then(block.clone())
                .then(else_branch.or_not())
                .map_with(|((condition, then_block), else_block), e| {
                    Spanned::new(
                        Statement::If {
                            condition,
                            then_block,
                            else_block,
                        },
                        to_ast_span(e.span()),
                    )
                })
        });

        let while_stmt = just(Token::While)
            .ignore_then(expr.clone())
            .then(block.clone())
            .map(|(condition, body)| Statement::While { condition, body });

        let return_stmt = just(Token::Return)
            .ignore_then(expr.or_not())
            .map(Statement::Return);

        let simple = choice((
            call,
            assignment,
            while_stmt,
            return_stmt,
            just(Token::Break).to(Statement::Break),
            just(Token::Continue).to(Statement::Continue),
        ))
        .map_with(|stmt, e| Spanned::new(stmt, to_ast_span(e.span())));

        let statement = choice((if_stmt, simple)).labelled("statement");

        let body = line_end().ignore_then(
            statement
                .then_ignore(line_end())
                .repeated()
                .collect::<Vec<_>>(),
        );

        just(Token::LBrace)
            .ignore_then(body.or_not())
            .then_ignore(just(Token::RBrace))
            .map_with(|statements, e| {
                Spanned::new(
                    Block::new(statements.unwrap_or_default()),
                    to_ast_span(e.span()),
                )
            })
            .boxed()
    })
}
