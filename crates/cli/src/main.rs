//! `grug-ast`: dump, apply and generate grug files from the command line.
//!
//! Usage:
//!   grug-ast dump-ast <SOURCE> <JSON>
//!   grug-ast dump-json <SOURCE> <JSON>
//!   grug-ast apply <JSON> <TARGET>
//!   grug-ast generate <JSON> <OUTPUT>
//!   grug-ast tokens <SOURCE> [LINE]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grug_ast::{Diagnostic, ErrorKind, ErrorReporter};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "grug-ast")]
#[command(about = "Round-trip grug files through a JSON AST", long_about = None)]
#[command(version)]
struct Cli {
    /// Render syntax errors with a source excerpt
    #[arg(long, global = true)]
    pretty: bool,

    /// Log more (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the AST of a source file as compact JSON
    DumpAst { source: PathBuf, json: PathBuf },

    /// Dump the AST of a source file as pretty-printed JSON
    DumpJson { source: PathBuf, json: PathBuf },

    /// Patch a source file in place to match a JSON AST
    Apply { json: PathBuf, target: PathBuf },

    /// Write a new source file from a JSON AST
    Generate { json: PathBuf, output: PathBuf },

    /// Print the token stream of a source file
    Tokens {
        source: PathBuf,

        /// Only show tokens within five lines of this one
        line: Option<u32>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::DumpAst { source, json } => grug_ast::dump_file_ast(source, json),
        Commands::DumpJson { source, json } => grug_ast::dump_file_to_json(source, json),
        Commands::Apply { json, target } => {
            grug_ast::apply_file_ast(json, &target).map(|changed| {
                if changed {
                    log::info!("{} updated", target.display());
                } else {
                    log::info!("{} already up to date", target.display());
                }
            })
        }
        Commands::Generate { json, output } => grug_ast::generate_file_from_json(json, output),
        Commands::Tokens { source, line } => return cmd_tokens(source, line, cli.pretty),
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(diagnostic) => {
            report(&diagnostic, cli.pretty);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Print a diagnostic to stderr.
///
/// With `--pretty`, syntax errors are re-derived from the file so the
/// report can show the offending source.
fn report(diagnostic: &Diagnostic, pretty: bool) {
    if pretty && diagnostic.kind == ErrorKind::Syntax {
        if let Ok(source) = fs::read_to_string(&diagnostic.path) {
            if let Err(err) = grug_ast::parse(&source) {
                let name = diagnostic.path.display().to_string();
                eprint!("{}", ErrorReporter::new(name, &source).render(&err));
                return;
            }
        }
    }
    eprintln!("{}", diagnostic);
}

fn cmd_tokens(source_path: PathBuf, target_line: Option<u32>, pretty: bool) -> Result<ExitCode> {
    let source = fs::read_to_string(&source_path)
        .with_context(|| format!("Failed to read {}", source_path.display()))?;
    let index = grug_ast::source::LineIndex::new(&source);

    match grug_ast::parser::lex(&source) {
        Ok(tokens) => {
            for (tok, span) in &tokens {
                let line = index.line_of(span.start);
                let near = target_line
                    .map_or(true, |target| line.abs_diff(target) <= 5);
                if near {
                    println!("Line {:4}: {:?} @ {:?}", line, tok, span);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            report(&Diagnostic::new(source_path, err), pretty);
            Ok(ExitCode::FAILURE)
        }
    }
}
