//! The four file operations and their in-memory counterparts.
//!
//! | Operation | Flow |
//! |-----------|------|
//! | [`dump_file_ast`] | source → parse → encode → compact JSON file |
//! | [`dump_file_to_json`] | same, pretty-printed |
//! | [`apply_file_ast`] | JSON → decode, target → parse, diff → patched target |
//! | [`generate_file_from_json`] | JSON → decode → canonical source file |
//!
//! Every operation returns a [`Diagnostic`] on failure. Outputs are written
//! through a temporary file in the destination directory and renamed into
//! place, so a failing call never leaves a partially written file.

use crate::ast::File;
use crate::codec::{decode, decode_for_patch, encode};
use crate::error::{Error, ErrorKind, Location, Result};
use crate::generator::generate;
use crate::here;
use crate::parser::parse;
use crate::patch;
use serde_json::Value;
use std::fmt;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// The failure report of a file operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The file the problem was found in.
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
    /// The "content changed" flag of the classic diagnostics record, kept so
    /// reports carry the same fields. A failing operation never writes, so
    /// it is always `false` here; whether a successful apply changed the
    /// target is the return value of [`apply_file_ast`].
    pub has_changed: bool,
    /// 1-based line in `path`, 0 when unknown.
    pub line: u32,
    pub detected_at: Location,
}

impl Diagnostic {
    pub fn new(path: impl Into<PathBuf>, error: Error) -> Self {
        Self {
            path: path.into(),
            kind: error.kind,
            message: error.message,
            has_changed: false,
            line: error.line,
            detected_at: error.detected_at,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} (detected by {})",
            self.path.display(),
            self.line,
            self.message,
            self.detected_at
        )
    }
}

impl std::error::Error for Diagnostic {}

/// Result type of the file operations.
pub type OpResult<T> = std::result::Result<T, Diagnostic>;

/// How dumped JSON is laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpOptions {
    pub pretty: bool,
}

/// Parse `source` and encode its tree as JSON text.
pub fn dump_source(source: &str, options: DumpOptions) -> Result<String> {
    let file = parse(source)?;
    let value = encode(&file);
    let text = if options.pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .map_err(|e| Error::io(format!("cannot serialize JSON: {}", e), here!()))?;
    Ok(text + "\n")
}

/// Patch `source` so it matches the tree in `json`.
///
/// Returns the new text, or `None` when nothing changed.
pub fn apply_source(json: &str, source: &str) -> Result<Option<String>> {
    let original = parse(source)?;
    let edited = decode_for_patch(&parse_json(json)?)?;
    patch_tree(&original, source, &edited)
}

/// Render the tree in `json` as canonical source text.
pub fn generate_source(json: &str) -> Result<String> {
    let file = decode(&parse_json(json)?)?;
    Ok(generate(&file))
}

/// Dump the AST of `source_path` to `json_path` as compact JSON.
pub fn dump_file_ast(source_path: impl AsRef<Path>, json_path: impl AsRef<Path>) -> OpResult<()> {
    dump(source_path.as_ref(), json_path.as_ref(), DumpOptions::default())
}

/// Dump the AST of `source_path` to `json_path` as pretty-printed JSON.
pub fn dump_file_to_json(
    source_path: impl AsRef<Path>,
    json_path: impl AsRef<Path>,
) -> OpResult<()> {
    dump(
        source_path.as_ref(),
        json_path.as_ref(),
        DumpOptions { pretty: true },
    )
}

/// Rewrite `target_path` so it matches the AST in `json_path`, touching
/// only the text of nodes that differ.
///
/// Returns whether the target changed. An unchanged target is not written.
pub fn apply_file_ast(json_path: impl AsRef<Path>, target_path: impl AsRef<Path>) -> OpResult<bool> {
    let (json_path, target_path) = (json_path.as_ref(), target_path.as_ref());
    log::debug!(
        "applying {} to {}",
        json_path.display(),
        target_path.display()
    );

    let json = read(json_path)?;
    let source = read(target_path)?;
    let original = parse(&source).map_err(|e| Diagnostic::new(target_path, e))?;
    let edited = parse_json(&json)
        .and_then(|value| decode_for_patch(&value))
        .map_err(|e| Diagnostic::new(json_path, e))?;

    match patch_tree(&original, &source, &edited).map_err(|e| Diagnostic::new(target_path, e))? {
        Some(patched) => {
            write(target_path, &patched)?;
            log::debug!("{} changed", target_path.display());
            Ok(true)
        }
        None => {
            log::debug!("{} unchanged", target_path.display());
            Ok(false)
        }
    }
}

/// Write a brand-new source file at `output_path` from the AST in
/// `json_path`.
pub fn generate_file_from_json(
    json_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> OpResult<()> {
    let (json_path, output_path) = (json_path.as_ref(), output_path.as_ref());
    log::debug!(
        "generating {} from {}",
        output_path.display(),
        json_path.display()
    );

    let json = read(json_path)?;
    let text = generate_source(&json).map_err(|e| Diagnostic::new(json_path, e))?;
    write(output_path, &text)
}

fn dump(source_path: &Path, json_path: &Path, options: DumpOptions) -> OpResult<()> {
    log::debug!(
        "dumping {} to {}",
        source_path.display(),
        json_path.display()
    );

    let source = read(source_path)?;
    let text = dump_source(&source, options).map_err(|e| Diagnostic::new(source_path, e))?;
    write(json_path, &text)
}

fn patch_tree(original: &File, source: &str, edited: &File) -> Result<Option<String>> {
    let edits = patch::diff(original, source, edited)?;
    if edits.is_empty() {
        return Ok(None);
    }
    for edit in &edits {
        log::trace!("edit {:?} -> {:?}", edit.range(), edit.new_text);
    }
    patch::apply_edits(source, edits).map(Some)
}

fn parse_json(json: &str) -> Result<Value> {
    serde_json::from_str(json).map_err(|e| {
        let line = u32::try_from(e.line()).ok().filter(|&l| l > 0);
        Error::decode(format!("invalid JSON: {}", e), line, here!())
    })
}

fn read(path: &Path) -> OpResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        Diagnostic::new(
            path,
            Error::io(format!("cannot read file: {}", e), here!()),
        )
    })
}

/// Atomic write: temp file in the same directory, fsync, rename.
fn write(path: &Path, content: &str) -> OpResult<()> {
    let io_error = |e: std::io::Error| {
        Diagnostic::new(
            path,
            Error::io(format!("cannot write file: {}", e), here!()),
        )
    };

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(io_error)?;
    temp.write_all(content.as_bytes()).map_err(io_error)?;
    temp.as_file().sync_all().map_err(io_error)?;
    temp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}
