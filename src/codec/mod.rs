//! AST ⇄ JSON mapping.
//!
//! Every node becomes one JSON object whose `"kind"` key names the node type
//! and whose other keys hold its children by role. Scalars (names, type tags,
//! operators and literal text) are always JSON strings so numbers keep their
//! exact spelling. Nodes may carry an integer `"line"`; it is informational
//! and never affects equality.
//!
//! ```rust
//! use grug_ast::{codec, parse};
//!
//! let file = parse("entity gun {\n\trpm: i32 = 300,\n}\n").unwrap();
//! let json = codec::encode(&file);
//! assert_eq!(json["entity"]["fields"][0]["value"]["value"], "300");
//! assert_eq!(codec::decode(&json).unwrap(), file);
//! ```

mod decode;
mod encode;

pub use decode::decode;
pub(crate) use decode::decode_for_patch;
pub use encode::encode;

/// Kinds that may appear where a statement is expected.
pub const STATEMENT_KINDS: [&str; 7] = [
    "assignment",
    "if",
    "while",
    "call",
    "return",
    "break",
    "continue",
];

/// Kinds that may appear where an expression is expected.
pub const EXPRESSION_KINDS: [&str; 7] = [
    "number",
    "string",
    "bool",
    "identifier",
    "unary",
    "binary",
    "call",
];

/// Kinds of the structural nodes above statement level.
pub const ITEM_KINDS: [&str; 6] = ["file", "entity", "field", "global", "function", "param"];

/// Whether `kind` names any node type.
pub fn is_known_kind(kind: &str) -> bool {
    ITEM_KINDS.contains(&kind) || STATEMENT_KINDS.contains(&kind) || EXPRESSION_KINDS.contains(&kind)
}
