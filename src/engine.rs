//! Validation engines
//!
//! The validator and the output parser reach XML parsing and XSD
//! conformance checking through [`ValidationEngine`]. [`XsdEngine`] is the
//! built-in implementation.

use tracing::debug;

use crate::documents::Document;
use crate::error::{Result, ValidationError};
use crate::limits::Limits;
use crate::validators::{ValidationMode, XsdSchema};

/// Capability to parse XML text and check a document against a schema
pub trait ValidationEngine: Send + Sync {
    /// Parsed document representation, used for instances and schemas alike
    type Document;

    /// Parse XML text into a document
    ///
    /// Fails with [`crate::Error::Xml`] when the text is not well-formed.
    fn parse(&self, text: &str) -> Result<Self::Document>;

    /// Validate a document against a schema document
    ///
    /// Conformance problems are returned as diagnostics in report order. An
    /// `Err` means the schema document is not a usable XSD.
    fn validate(&self, doc: &Self::Document, schema: &Self::Document) -> Result<Vec<ValidationError>>;
}

/// Built-in XSD 1.0 engine
///
/// Holds the resource limits applied to both documents and the validation
/// mode. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct XsdEngine {
    limits: Limits,
    mode: ValidationMode,
}

impl XsdEngine {
    /// Create an engine with default limits that collects every diagnostic
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given resource limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Use the given validation mode
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Resource limits in effect
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Validation mode in effect
    pub fn mode(&self) -> ValidationMode {
        self.mode
    }
}

impl ValidationEngine for XsdEngine {
    type Document = Document;

    fn parse(&self, text: &str) -> Result<Document> {
        let doc = Document::from_string_with_limits(text, &self.limits)?;
        debug!(root = %doc.root.qname, "parsed document");
        Ok(doc)
    }

    fn validate(&self, doc: &Document, schema: &Document) -> Result<Vec<ValidationError>> {
        let schema = XsdSchema::from_document_with_limits(schema, self.limits.clone())?;
        debug!(
            elements = schema.elements.len(),
            types = schema.types.len(),
            "built schema"
        );

        let result = schema.validate_with_mode(doc, self.mode)?;
        debug!(valid = result.valid, errors = result.errors.len(), "validated document");
        Ok(result.errors)
    }
}
