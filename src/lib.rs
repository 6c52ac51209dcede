//! # grug-ast
//!
//! Round-trip engine for grug mod scripts: parse a `.grug` file into an AST,
//! exchange that AST as JSON, and write edited JSON back.
//!
//! ## Operations
//!
//! | Operation | Description |
//! |-----------|-------------|
//! | [`dump_file_ast`] | Parse a source file and write its AST as compact JSON |
//! | [`dump_file_to_json`] | Same, pretty-printed |
//! | [`apply_file_ast`] | Patch a source file in place to match edited JSON, keeping its comments and layout |
//! | [`generate_file_from_json`] | Render JSON as a brand-new, canonically formatted source file |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use grug_ast::{apply_file_ast, dump_file_ast};
//!
//! dump_file_ast("mods/vanilla/m60/m60.grug", "dump.json")?;
//!
//! let text = std::fs::read_to_string("dump.json")?;
//! let mut json: serde_json::Value = serde_json::from_str(&text)?;
//! json["entity"]["fields"][2]["value"]["value"] = "600".into();
//! std::fs::write("dump.json", json.to_string())?;
//!
//! if apply_file_ast("dump.json", "mods/vanilla/m60/m60.grug")? {
//!     println!("m60.grug updated");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`lexer`] / [`parser`]: source text to [`File`]
//! - [`codec`]: [`File`] to and from JSON
//! - [`patch`]: minimal byte edits between two trees
//! - [`generator`]: canonical source rendering

pub mod ast;
pub mod codec;
pub mod error;
pub mod generator;
pub mod lexer;
pub mod ops;
pub mod parser;
pub mod patch;
pub mod source;

pub use ast::{
    BinOp, Block, Call, Entity, Expr, Field, File, Function, GlobalVariable, LiteralKind, Param,
    Spanned, Statement, UnaryOp,
};
pub use error::{Error, ErrorKind, ErrorReporter, Location, Result};
pub use generator::generate;
pub use ops::{
    apply_file_ast, apply_source, dump_file_ast, dump_file_to_json, dump_source,
    generate_file_from_json, generate_source, Diagnostic, DumpOptions, OpResult,
};
pub use parser::parse;
