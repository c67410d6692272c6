//! XML Validation Infrastructure
//!
//! This module provides the validation context that collects diagnostics
//! while a document is checked against a schema.

use crate::documents::Element;
use crate::error::{Error, Result, ValidationError};
use serde::Serialize;
use std::str::FromStr;

/// How validation reacts to a conformance failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Stop at the first diagnostic
    Strict,
    /// Collect every diagnostic in the document
    #[default]
    Lax,
}

impl FromStr for ValidationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(ValidationMode::Strict),
            "lax" => Ok(ValidationMode::Lax),
            _ => Err(Error::Value(format!(
                "Invalid validation mode: '{}'. Must be 'strict' or 'lax'",
                s
            ))),
        }
    }
}

/// Validation context for handling the validation process
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    /// Current validation mode
    pub mode: ValidationMode,
    /// Collected diagnostics, in report order
    pub errors: Vec<ValidationError>,
    /// Current nesting level
    pub level: usize,
}

impl ValidationContext {
    /// Create a new validation context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with a specific mode
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enter a new level
    pub fn enter_level(&mut self) {
        self.level += 1;
    }

    /// Exit current level
    pub fn exit_level(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether validation should stop walking the document
    pub fn should_stop(&self) -> bool {
        self.mode == ValidationMode::Strict && self.has_errors()
    }

    /// Record a diagnostic located at an element's start tag
    pub fn report(&mut self, element: &Element, message: impl Into<String>) {
        if self.should_stop() {
            return;
        }
        self.errors
            .push(ValidationError::new(message, element.line, element.column));
    }

    /// Take the collected diagnostics
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}
