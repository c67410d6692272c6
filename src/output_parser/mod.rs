//! Output parsers
//!
//! An output parser turns raw language-model text into a checked value and
//! describes, through its format instructions, what the model should emit.

mod xml;

pub use xml::{extract_xml, XmlOutputParser};

use async_trait::async_trait;
use thiserror::Error;

use crate::error::{Error, ValidationError, XmlParseError};

/// Generic failure of an output parser
///
/// Failures that come from a rejected document keep the offending text and
/// the engine diagnostics next to the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct OutputParserException {
    message: String,
    text: Option<String>,
    diagnostics: Vec<ValidationError>,
}

impl OutputParserException {
    /// Create an exception from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            text: None,
            diagnostics: Vec::new(),
        }
    }

    /// The failure message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The text that failed to parse, if the failure was a parse failure
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Diagnostics behind the failure
    pub fn diagnostics(&self) -> &[ValidationError] {
        &self.diagnostics
    }
}

impl From<XmlParseError> for OutputParserException {
    fn from(error: XmlParseError) -> Self {
        Self {
            message: error.message().to_string(),
            text: Some(error.text().to_string()),
            diagnostics: error.diagnostics().to_vec(),
        }
    }
}

impl From<Error> for OutputParserException {
    fn from(error: Error) -> Self {
        match error {
            Error::Parse(e) => e.into(),
            other => Self::new(other.to_string()),
        }
    }
}

/// A parser for language-model output
#[async_trait]
pub trait OutputParser: Send + Sync {
    /// Value produced by a successful parse
    type Output;

    /// Instructions telling the model how to format its output
    fn get_format_instructions(&self) -> String;

    /// Parse raw model output
    async fn parse(&self, text: &str) -> Result<Self::Output, OutputParserException>;
}
