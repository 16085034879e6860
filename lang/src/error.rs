//! Unified error handling for indigo.
//!
//! Scan and parse errors carry a full source position; printer errors are
//! invariant violations or write failures. Lexical errors accumulate into
//! a list and are reported together after a best-effort pass.


use std::fmt;
use std::io;

use crate::position::{FileSet, Position};
use crate::printer::EmitError;
use crate::scanner::ScanError;

/// A unified error type for every phase of a conversion.
#[derive(Debug)]
pub enum IndigoError {
    /// Tokenization failed (malformed literal, bad indentation, …).
    Scan { message: String, position: Position },

    /// The token stream does not match the grammar.
    Parse { message: String, position: Position },

    /// A printer invariant was violated or the AST is unsupported.
    Emit { message: String },

    /// Reading or writing a file failed.
    Io { path: String, source: io::Error },
}

impl IndigoError {
    pub fn scan(message: impl Into<String>, position: Position) -> Self {
        IndigoError::Scan {
            message: message.into(),
            position,
        }
    }

    pub fn parse(message: impl Into<String>, position: Position) -> Self {
        IndigoError::Parse {
            message: message.into(),
            position,
        }
    }

    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        IndigoError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short error kind description.
    pub fn kind(&self) -> &'static str {
        match self {
            IndigoError::Scan { .. } => "ScanError",
            IndigoError::Parse { .. } => "ParseError",
            IndigoError::Emit { .. } => "EmitError",
            IndigoError::Io { .. } => "IoError",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            IndigoError::Scan { message, .. } => message,
            IndigoError::Parse { message, .. } => message,
            IndigoError::Emit { message } => message,
            IndigoError::Io { path, .. } => path,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            IndigoError::Scan { position, .. } => Some(position),
            IndigoError::Parse { position, .. } => Some(position),
            _ => None,
        }
    }

    /// Expand a scanner error against the file set it was scanned in.
    pub fn from_scan(err: &ScanError, fset: &FileSet) -> Self {
        IndigoError::scan(err.message.clone(), fset.position(err.pos))
    }

    /// Expand a parser error against the file set it was parsed in.
    pub fn from_parse(err: &crate::parser::ParseError, fset: &FileSet) -> Self {
        IndigoError::parse(err.message.clone(), fset.position(err.pos))
    }
}

impl fmt::Display for IndigoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndigoError::Scan { message, position } => {
                if position.is_valid() {
                    write!(f, "{}: {}", position, message)
                } else {
                    write!(f, "{}", message)
                }
            }
            IndigoError::Parse { message, position } => {
                if position.is_valid() {
                    write!(f, "{}: {}", position, message)
                } else {
                    write!(f, "{}", message)
                }
            }
            IndigoError::Emit { message } => write!(f, "{}", message),
            IndigoError::Io { path, source } => write!(f, "{}: {}", path, source),
        }
    }
}

impl std::error::Error for IndigoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IndigoError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<EmitError> for IndigoError {
    fn from(err: EmitError) -> Self {
        match err {
            EmitError::Internal(message) => IndigoError::Emit { message },
            EmitError::Io(source) => IndigoError::Io {
                path: String::new(),
                source,
            },
        }
    }
}

/// All errors of one conversion pass, in source order.
pub type ErrorList = Vec<IndigoError>;
