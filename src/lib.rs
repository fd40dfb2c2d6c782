//! excmd — Ex Command-Line Interpreter
//!
//! This crate turns a single Vim-style command line (`:1,$s`, `:.+3wq!`, ...) into a
//! structured [`CommandLineNode`]: an optional address range plus an optional command
//! with its parsed arguments. A reference address resolver is included for hosts that
//! keep their text in memory.

mod commands;
mod node;
mod parse;
mod registry;
mod resolve;
mod scanner;
mod token;

#[cfg(feature = "pyo3")]
mod python;

pub use commands::Params;
pub use node::{CommandLineNode, RangeNode, Separator};
pub use parse::{parse, ParserState};
pub use registry::{lookup, CommandSpec, ScanFn, COMMANDS};
pub use resolve::{resolve_range, Buffer, LineBuffer, LineRange, ResolveError};
pub use scanner::Scanner;
pub use token::{Command, Token};

use thiserror::Error;

/// Strip the `:` prompt (and any blanks around it) from a raw command line.
pub fn strip_prompt(line: &str) -> &str {
    line.trim_start_matches(|c: char| c == ':' || c == ' ' || c == '\t')
}

/// What went wrong while lexing a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorKind {
    UnterminatedPattern,
    BadEscape,
    MissingMark,
    UnknownCommand,
    MalformedNumber,
    UnexpectedCharacter,
    TrailingCharacters,
    InvalidArgument,
}

impl ScanErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnterminatedPattern => "unterminated search pattern",
            Self::BadEscape => "bad escape",
            Self::MissingMark => "missing mark name",
            Self::UnknownCommand => "E492: Not an editor command",
            Self::MalformedNumber => "malformed number",
            Self::UnexpectedCharacter => "unexpected character",
            Self::TrailingCharacters => "E488: Trailing characters",
            Self::InvalidArgument => "E474: Invalid argument",
        }
    }
}

impl std::fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Library error type. Parsing is all-or-nothing: any of these aborts [`parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Malformed lexeme.
    #[error("{kind}: {text}")]
    Scan {
        kind: ScanErrorKind,
        /// Byte offset into the command line where the bad lexeme starts.
        position: usize,
        /// The offending input.
        text: String,
    },

    /// Structurally invalid range; carries the whole command line.
    #[error("E16: Invalid range: {0}")]
    BadRange(String),

    /// Valid syntax this crate deliberately does not handle.
    #[error("not implemented: {0}")]
    Unsupported(String),
}

impl ParseError {
    pub(crate) fn scan(kind: ScanErrorKind, position: usize, text: impl Into<String>) -> Self {
        Self::Scan {
            kind,
            position,
            text: text.into(),
        }
    }

    /// Vim error code (`"E16"`, `"E492"`, ...) when Vim has one for this failure.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::BadRange(_) => Some("E16"),
            Self::Scan { kind, .. } => match kind {
                ScanErrorKind::UnknownCommand => Some("E492"),
                ScanErrorKind::TrailingCharacters => Some("E488"),
                ScanErrorKind::InvalidArgument => Some("E474"),
                _ => None,
            },
            Self::Unsupported(_) => None,
        }
    }

    /// True for errors that mean "cannot execute" rather than "malformed input".
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}
