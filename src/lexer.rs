//! Lexer for grug source code.
//!
//! This module tokenizes grug source, handling:
//!
//! - Keywords (`entity`, `if`, `while`, `return`, ...)
//! - Operators (`==`, `<=`, `and`, `not`, ...)
//! - Literals (numbers and strings, kept as their exact text)
//! - Newlines, which terminate statements
//!
//! Horizontal whitespace, carriage returns and `#` comments are trivia: they
//! separate tokens but never become tokens themselves. Their positions are
//! still recoverable from the token spans, which is what the patch engine
//! relies on.
//!
//! # Example
//!
//! ```rust
//! use grug_ast::lexer::{lexer, Token};
//! use chumsky::prelude::*;
//!
//! let tokens = lexer().parse("rpm: i32 = 300 # fast").into_result().unwrap();
//! assert_eq!(tokens[0].0, Token::Ident("rpm"));
//! assert_eq!(tokens[4].0, Token::NumberLit("300"));
//! ```

use chumsky::prelude::*;

/// A token in grug.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token<'src> {
    // Keywords
    Entity,
    If,
    Else,
    While,
    Break,
    Continue,
    Return,
    True,
    False,
    And,
    Or,
    Not,

    // Operators
    Eq,     // ==
    Ne,     // !=
    Le,     // <=
    Ge,     // >=
    Lt,     // <
    Gt,     // >
    Assign, // =
    Plus,   // +
    Minus,  // -
    Star,   // *
    Slash,  // /
    Percent, // %

    // Punctuation
    Colon,  // :
    Comma,  // ,
    LParen, // (
    RParen, // )
    LBrace, // {
    RBrace, // }

    // Identifier
    Ident(&'src str),

    // String literal (content without quotes)
    StringLit(&'src str),

    // Number literal (exact source text)
    NumberLit(&'src str),

    // Newline (statements end at line breaks)
    Newline,
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Entity => write!(f, "entity"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::While => write!(f, "while"),
            Token::Break => write!(f, "break"),
            Token::Continue => write!(f, "continue"),
            Token::Return => write!(f, "return"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::Eq => write!(f, "=="),
            Token::Ne => write!(f, "!="),
            Token::Le => write!(f, "<="),
            Token::Ge => write!(f, ">="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Assign => write!(f, "="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Ident(s) => write!(f, "{}", s),
            Token::StringLit(s) => write!(f, "\"{}\"", s),
            Token::NumberLit(s) => write!(f, "{}", s),
            Token::Newline => write!(f, "newline"),
        }
    }
}

/// Span type for tokens.
pub type Span = SimpleSpan<usize>;

/// A token with its span.
pub type Spanned<T> = (T, Span);

/// Create the lexer parser.
pub fn lexer<'src>(
) -> impl Parser<'src, &'src str, Vec<Spanned<Token<'src>>>, extra::Err<Rich<'src, char, Span>>> {
    // Comments run to the end of the line; the newline itself is a token
    let comment = just('#').then(none_of('\n').repeated()).ignored();

    // Spaces, tabs and carriage returns separate tokens
    let trivia = choice((one_of(" \t\r").ignored(), comment))
        .repeated()
        .ignored();

    // String literals: no escapes, no line breaks
    let string_lit = just('"')
        .ignore_then(none_of("\"\n").repeated().to_slice())
        .then_ignore(just('"'))
        .map(Token::StringLit)
        .labelled("string literal");

    // Number literals keep their exact spelling
    let number = text::digits(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .map(Token::NumberLit)
        .labelled("number");

    // Multi-character operators (must come before single char versions)
    let multi_char_ops = choice((
        just("==").to(Token::Eq),
        just("!=").to(Token::Ne),
        just("<=").to(Token::Le),
        just(">=").to(Token::Ge),
    ));

    let single_char_ops = choice((
        just('<').to(Token::Lt),
        just('>').to(Token::Gt),
        just('=').to(Token::Assign),
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('%').to(Token::Percent),
        just(':').to(Token::Colon),
        just(',').to(Token::Comma),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
    ));

    // Identifiers and keywords share a spelling; keywords win
    let word = text::ascii::ident().map(|s: &'src str| match s {
        "entity" => Token::Entity,
        "if" => Token::If,
        "else" => Token::Else,
        "while" => Token::While,
        "break" => Token::Break,
        "continue" => Token::Continue,
        "return" => Token::Return,
        "true" => Token::True,
        "false" => Token::False,
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        _ => Token::Ident(s),
    });

    let newline = just('\n').to(Token::Newline);

    let token = choice((
        string_lit,
        number,
        multi_char_ops,
        single_char_ops,
        word,
        newline,
    ));

    trivia.clone().ignore_then(
        token
            .map_with(|tok, e| (tok, e.span()))
            .then_ignore(trivia)
            .repeated()
            .collect(),
    )
}
