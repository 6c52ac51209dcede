//! Abstract Syntax Tree types for grug.
//!
//! Every node is wrapped in [`Spanned`], which records where the node came
//! from: a byte span into the parsed source and the 1-based line it starts
//! on. Nodes decoded from JSON have a line (when the JSON carries one) but no
//! span, since there is no source text behind them.
//!
//! # AST Structure
//!
//! ```text
//! File
//! ├── entity: Entity (name + ordered typed fields)
//! ├── globals: Vec<GlobalVariable>
//! └── functions: Vec<Function>
//!     └── body: Block
//!         └── statements: Vec<Statement>
//!             └── Expr
//! ```
//!
//! # Equality
//!
//! `Spanned<T>` compares only the wrapped node. Two trees are equal when they
//! have the same shape and the same names, operators and literal text, no
//! matter where (or whether) they appear in a source file:
//!
//! ```rust
//! use grug_ast::Spanned;
//!
//! let parsed = Spanned::new("gun".to_string(), 7..10);
//! let decoded = Spanned::synthetic("gun".to_string());
//! assert_eq!(parsed, decoded);
//! ```

use std::fmt;
use std::ops::Range;

/// Byte offsets into the source text.
pub type Span = Range<usize>;

/// A node together with its source location.
#[derive(Debug, Clone)]
pub struct Spanned<T> {
    /// The wrapped value.
    pub node: T,
    /// Byte span in the parsed source. `None` for nodes built from JSON.
    pub span: Option<Span>,
    /// 1-based line the node starts on, when known.
    pub line: Option<u32>,
}

impl<T> Spanned<T> {
    /// Create a node parsed from source. The line is filled in later by
    /// [`crate::source::annotate_lines`].
    pub fn new(node: T, span: Span) -> Self {
        Self {
            node,
            span: Some(span),
            line: None,
        }
    }

    /// Create a node with no source text behind it.
    pub fn synthetic(node: T) -> Self {
        Self {
            node,
            span: None,
            line: None,
        }
    }

    /// Attach a line number.
    pub fn with_line(mut self, line: Option<u32>) -> Self {
        self.line = line;
        self
    }

    /// Transform the inner value while preserving the location.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            node: f(self.node),
            span: self.span,
            line: self.line,
        }
    }
}

impl<T: PartialEq> PartialEq for Spanned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

// ============================================================================
// Top-Level File Structure
// ============================================================================

/// A complete grug file.
///
/// The entity always comes first, followed by the global variables and then
/// the functions, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub entity: Spanned<Entity>,
    pub globals: Vec<Spanned<GlobalVariable>>,
    pub functions: Vec<Spanned<Function>>,
}

/// The entity a mod defines: a named record of typed fields.
///
/// ```text
/// entity gun {
///     name: string = "M60",
///     rounds_per_minute: i32 = 300,
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: Spanned<String>,
    pub fields: Vec<Spanned<Field>>,
}

/// One `name: type = value` entry of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Spanned<String>,
    pub ty: Spanned<String>,
    pub value: Spanned<Expr>,
}

/// A top-level `name: type = value` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalVariable {
    pub name: Spanned<String>,
    pub ty: Spanned<String>,
    pub value: Spanned<Expr>,
}

/// `name(params) [return_type] { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Spanned<String>,
    pub params: Vec<Spanned<Param>>,
    pub return_type: Option<Spanned<String>>,
    pub body: Spanned<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Spanned<String>,
    pub ty: Spanned<String>,
}

/// A statement list.
///
/// For parsed blocks the span covers the braces. The block behind an
/// `else if` has no braces of its own; its span is that of the nested `if`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Spanned<Statement>>,
}

impl Block {
    pub fn new(statements: Vec<Spanned<Statement>>) -> Self {
        Self { statements }
    }

    /// The nested `if` when this block is exactly one `if` statement, which
    /// is how `else if` chains are represented.
    pub fn as_else_if(&self) -> Option<&Spanned<Statement>> {
        match self.statements.as_slice() {
            [stmt] if matches!(stmt.node, Statement::If { .. }) => Some(stmt),
            _ => None,
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `name = value`, or `name: type = value` when declaring a local.
    Assignment {
        name: Spanned<String>,
        ty: Option<Spanned<String>>,
        value: Spanned<Expr>,
    },
    If {
        condition: Spanned<Expr>,
        then_block: Spanned<Block>,
        else_block: Option<Spanned<Block>>,
    },
    While {
        condition: Spanned<Expr>,
        body: Spanned<Block>,
    },
    Call(Call),
    Return(Option<Spanned<Expr>>),
    Break,
    Continue,
}

impl Statement {
    /// The JSON `kind` tag of this statement.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Assignment { .. } => "assignment",
            Statement::If { .. } => "if",
            Statement::While { .. } => "while",
            Statement::Call(_) => "call",
            Statement::Return(_) => "return",
            Statement::Break => "break",
            Statement::Continue => "continue",
        }
    }
}

/// `name(arguments)`, usable both as a statement and as an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: Spanned<String>,
    pub arguments: Vec<Spanned<Expr>>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal, stored as its exact source text (without quotes for strings).
    Literal { kind: LiteralKind, value: String },
    Identifier(String),
    Unary {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },
    Binary {
        op: BinOp,
        left: Box<Spanned<Expr>>,
        right: Box<Spanned<Expr>>,
    },
    Call(Call),
}

impl Expr {
    pub fn number(text: impl Into<String>) -> Self {
        Expr::Literal {
            kind: LiteralKind::Number,
            value: text.into(),
        }
    }

    pub fn string(text: impl Into<String>) -> Self {
        Expr::Literal {
            kind: LiteralKind::String,
            value: text.into(),
        }
    }

    pub fn bool(value: bool) -> Self {
        Expr::Literal {
            kind: LiteralKind::Bool,
            value: value.to_string(),
        }
    }

    /// The JSON `kind` tag of this expression.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Literal { kind, .. } => kind.as_str(),
            Expr::Identifier(_) => "identifier",
            Expr::Unary { .. } => "unary",
            Expr::Binary { .. } => "binary",
            Expr::Call(_) => "call",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    String,
    Bool,
}

impl LiteralKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LiteralKind::Number => "number",
            LiteralKind::String => "string",
            LiteralKind::Bool => "bool",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "not",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "-" => Some(UnaryOp::Neg),
            "not" => Some(UnaryOp::Not),
            _ => None,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    pub const ALL: [BinOp; 13] = [
        BinOp::Or,
        BinOp::And,
        BinOp::Eq,
        BinOp::Ne,
        BinOp::Lt,
        BinOp::Gt,
        BinOp::Le,
        BinOp::Ge,
        BinOp::Add,
        BinOp::Sub,
        BinOp::Mul,
        BinOp::Div,
        BinOp::Rem,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Or => "or",
            BinOp::And => "and",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Binding strength; higher binds tighter. All levels are left associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::Ne => 3,
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => 4,
            BinOp::Add | BinOp::Sub => 5,
            BinOp::Mul | BinOp::Div | BinOp::Rem => 6,
        }
    }
}

/// Precedence of prefix operators, tighter than any binary operator.
pub const UNARY_PRECEDENCE: u8 = 7;

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ============================================================================
// Shared validation
// ============================================================================

/// Words that cannot be used as names or type tags.
pub const KEYWORDS: [&str; 12] = [
    "entity", "if", "else", "while", "break", "continue", "return", "true", "false", "and", "or",
    "not",
];

/// Whether `text` is a usable name: an identifier that is not a keyword.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&text)
}

/// Whether `text` is a number literal as the lexer reads it.
pub fn is_number_literal(text: &str) -> bool {
    let (int, frac) = match text.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (text, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(int) && frac.is_none_or(digits)
}

/// Check that a literal's text is something the lexer could have produced.
pub fn check_literal(kind: LiteralKind, value: &str) -> Result<(), String> {
    match kind {
        LiteralKind::Number if !is_number_literal(value) => {
            Err(format!("\"{}\" is not a valid number literal", value))
        }
        LiteralKind::Bool if value != "true" && value != "false" => Err(format!(
            "\"{}\" is not a valid bool literal, expected \"true\" or \"false\"",
            value
        )),
        LiteralKind::String if value.contains(['"', '\n', '\r']) => Err(format!(
            "string literal \"{}\" cannot contain quotes or line breaks",
            value.escape_debug()
        )),
        _ => Ok(()),
    }
}

/// Check a declared type tag against the value it is initialised with.
///
/// Only literal values (and negated number literals) are checked; anything
/// else is left to the typechecker.
pub fn check_declared_type(name: &str, ty: &str, value: &Expr) -> Result<(), String> {
    let (kind, text, negated) = match value {
        Expr::Literal { kind, value } => (*kind, value.as_str(), false),
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match &operand.node {
            Expr::Literal {
                kind: LiteralKind::Number,
                value,
            } => (LiteralKind::Number, value.as_str(), true),
            _ => return Ok(()),
        },
        _ => return Ok(()),
    };

    let expected = match ty {
        "i32" | "f32" => LiteralKind::Number,
        "bool" => LiteralKind::Bool,
        "string" => LiteralKind::String,
        _ => return Ok(()),
    };

    if kind != expected {
        return Err(format!(
            "\"{}\" has type {}, but is assigned a {} literal",
            name,
            ty,
            kind.as_str()
        ));
    }

    if ty == "i32" {
        let signed = if negated {
            format!("-{}", text)
        } else {
            text.to_string()
        };
        if signed.parse::<i32>().is_err() {
            return Err(format!(
                "\"{}\" has type i32, but {} is not a valid i32",
                name, signed
            ));
        }
    }

    Ok(())
}
