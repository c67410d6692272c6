//! Error types for xml-output-parser
//!
//! This module defines the error taxonomy shared by the validator, the
//! output parser and the XSD engine.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias using the crate Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    /// The document does not conform to the schema
    #[error("{0}")]
    Parse(#[from] XmlParseError),

    /// XML text is not well-formed (instance or schema document)
    #[error("XML error: {0}")]
    Xml(String),

    /// Schema document is well-formed but not a usable XSD
    #[error("schema error: {0}")]
    Schema(String),

    /// Value error (invalid lexical value for a type)
    #[error("value error: {0}")]
    Value(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error reports a schema conformance failure
    pub fn is_conformance(&self) -> bool {
        matches!(self, Error::Parse(_))
    }

    /// The offending text, for conformance failures
    pub fn text(&self) -> Option<&str> {
        match self {
            Error::Parse(e) => Some(e.text()),
            _ => None,
        }
    }
}

/// A single conformance diagnostic reported by the validation engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Error message
    pub message: String,
    /// 1-based line of the offending node
    pub line: usize,
    /// 1-based column of the offending node
    pub column: usize,
}

impl ValidationError {
    /// Create a new diagnostic
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (line: {}, column: {})",
            self.message, self.line, self.column
        )
    }
}

/// Prefix of the inner message for non-conforming documents
pub const NON_CONFORMANCE_PREFIX: &str = "XML does not conform to the provided XSD: ";

/// Failure raised when a text could not be parsed into conforming XML
///
/// The message embeds the offending text; the text itself is kept verbatim
/// for callers that want to inspect or retry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlParseError {
    message: String,
    text: String,
    diagnostics: Vec<ValidationError>,
}

impl XmlParseError {
    /// Create a parse error from an inner message and the offending text
    pub fn new(message: impl AsRef<str>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            message: format!(
                "Failed to parse. Text: \"{}\". Error: {}",
                text,
                message.as_ref()
            ),
            text,
            diagnostics: Vec::new(),
        }
    }

    /// Create a non-conformance error from the engine diagnostics
    ///
    /// Diagnostics are rendered one per line, in report order.
    pub fn from_diagnostics(text: impl Into<String>, diagnostics: Vec<ValidationError>) -> Self {
        let joined = diagnostics
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        let mut error = Self::new(format!("{}{}", NON_CONFORMANCE_PREFIX, joined), text);
        error.diagnostics = diagnostics;
        error
    }

    /// The composed, human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The original offending text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Diagnostics behind this failure (empty when built from a plain message)
    pub fn diagnostics(&self) -> &[ValidationError] {
        &self.diagnostics
    }
}

impl fmt::Display for XmlParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for XmlParseError {}
