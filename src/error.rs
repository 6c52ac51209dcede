//! Error types and error reporting for grug.
//!
//! Every failure is an [`Error`] value carrying:
//!
//! - its [`ErrorKind`] (syntax, decode, schema or I/O),
//! - a one-line human message,
//! - the 1-based source line it concerns (0 when there is none),
//! - the engine location that detected it, captured with [`here!`].
//!
//! Syntax errors additionally keep the byte span of the offending token so
//! [`ErrorReporter`] can print a source excerpt with
//! [ariadne](https://crates.io/crates/ariadne).

use ariadne::{Color, Label, Report, ReportKind, Source};
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// A place in this crate's source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub file: &'static str,
    pub line: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Capture the current engine [`Location`].
#[macro_export]
macro_rules! here {
    () => {
        $crate::error::Location {
            file: file!(),
            line: line!(),
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source text is not valid grug.
    Syntax,
    /// The JSON document does not describe a valid AST.
    Decode,
    /// The JSON document cannot be reconciled with the file being patched.
    Schema,
    /// A file could not be read or written.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Decode => "decode error",
            ErrorKind::Schema => "schema error",
            ErrorKind::Io => "I/O error",
        };
        f.write_str(name)
    }
}

/// The error type of every grug operation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    /// 1-based source line, 0 when no line applies.
    pub line: u32,
    /// Byte span of the offending text, for syntax errors.
    pub span: Option<Range<usize>>,
    pub detected_at: Location,
}

impl Error {
    pub fn syntax(
        message: impl Into<String>,
        line: u32,
        span: Range<usize>,
        detected_at: Location,
    ) -> Self {
        Self {
            kind: ErrorKind::Syntax,
            message: message.into(),
            line,
            span: Some(span),
            detected_at,
        }
    }

    pub fn decode(message: impl Into<String>, line: Option<u32>, detected_at: Location) -> Self {
        Self {
            kind: ErrorKind::Decode,
            message: message.into(),
            line: line.unwrap_or(0),
            span: None,
            detected_at,
        }
    }

    pub fn schema(message: impl Into<String>, line: Option<u32>, detected_at: Location) -> Self {
        Self {
            kind: ErrorKind::Schema,
            message: message.into(),
            line: line.unwrap_or(0),
            span: None,
            detected_at,
        }
    }

    pub fn io(message: impl Into<String>, detected_at: Location) -> Self {
        Self {
            kind: ErrorKind::Io,
            message: message.into(),
            line: 0,
            span: None,
            detected_at,
        }
    }

    /// Reclassify this error, keeping everything else.
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Result type for grug operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error reporter that uses ariadne for pretty error output.
pub struct ErrorReporter<'src> {
    source_name: String,
    source: &'src str,
}

impl<'src> ErrorReporter<'src> {
    pub fn new(source_name: impl Into<String>, source: &'src str) -> Self {
        Self {
            source_name: source_name.into(),
            source,
        }
    }

    /// Render an error with a labelled source excerpt.
    ///
    /// Errors without a span are rendered at the start of their line.
    pub fn render(&self, error: &Error) -> String {
        let span = error
            .span
            .clone()
            .unwrap_or_else(|| self.line_span(error.line));

        let report = Report::build(ReportKind::Error, &self.source_name, span.start)
            .with_message(format!("{}: {}", error.kind, error.message))
            .with_label(
                Label::new((&self.source_name, span))
                    .with_color(Color::Red)
                    .with_message("here"),
            )
            .with_note(format!("detected by {}", error.detected_at))
            .finish();

        let mut out = Vec::new();
        if report
            .write((&self.source_name, Source::from(self.source)), &mut out)
            .is_err()
        {
            return error.message.clone();
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    fn line_span(&self, line: u32) -> Range<usize> {
        let start = self
            .source
            .split_inclusive('\n')
            .take(line.saturating_sub(1) as usize)
            .map(str::len)
            .sum::<usize>()
            .min(self.source.len());
        start..start
    }
}
