//! XML output parser
//!
//! Checks that model output is XML conforming to a fixed XSD. The XML may be
//! wrapped in a fenced code block; only the first fenced block is used.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::{OutputParser, OutputParserException};
use crate::engine::{ValidationEngine, XsdEngine};
use crate::error::Result;
use crate::validator::XmlValidator;

/// Fence marker with an optional language tag
static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z0-9_+\-]*").unwrap());

const FENCE_MARKER: &str = "```";

/// Pull the XML payload out of raw model output
///
/// The text is trimmed. When it contains a fence marker, the payload is the
/// trimmed text between the first marker (and its language tag) and the
/// next marker, or the end of the text.
pub fn extract_xml(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.contains(FENCE_MARKER) {
        return trimmed;
    }

    let mut segments = FENCE.split(trimmed);
    // The first segment is whatever precedes the opening fence
    segments.next();
    segments.next().unwrap_or("").trim()
}

/// Output parser that accepts XML conforming to an XSD
#[derive(Debug, Clone)]
pub struct XmlOutputParser<E: ValidationEngine = XsdEngine> {
    xsd: String,
    validator: XmlValidator<E>,
}

impl XmlOutputParser<XsdEngine> {
    /// Create a parser for the given XSD, using the built-in engine
    pub fn new(xsd: impl Into<String>) -> Self {
        Self::with_engine(xsd, XsdEngine::default())
    }
}

impl<E: ValidationEngine> XmlOutputParser<E> {
    /// Create a parser for the given XSD, using a custom engine
    pub fn with_engine(xsd: impl Into<String>, engine: E) -> Self {
        Self {
            xsd: xsd.into(),
            validator: XmlValidator::with_engine(engine),
        }
    }

    /// The schema this parser validates against
    pub fn xsd(&self) -> &str {
        &self.xsd
    }

    /// Instructions telling the model to emit XML conforming to the schema
    pub fn format_instructions(&self) -> String {
        format!(
            r#"
Your output must be formatted as an XML string that adheres to a given XSD.
Here is the XSD your output must adhere to:
```xml
{}
```

Make sure your XML output starts with the appropriate XML declaration. Typically, this is <?xml version="1.0" encoding="UTF-8"?>
Use proper XML namespaces if they are provided in the XSD. This helps in avoiding naming conflicts and ensures your document is correctly interpreted.

Ensure you do not add any namespaces or other changes that would invalidate your XML against this XSD.
"#,
            self.xsd
        )
    }

    /// Validate the XML found in `text` and return `text` unchanged
    ///
    /// Conformance failures surface as [`Error::Parse`](crate::Error::Parse)
    /// carrying the extracted XML.
    pub async fn parse_text(&self, text: &str) -> Result<String> {
        let xml = extract_xml(text);
        debug!(len = xml.len(), fenced = text.contains(FENCE_MARKER), "extracted xml");

        if let Err(e) = self.validator.validate_against_xsd(xml, &self.xsd) {
            warn!(error = %e, "model output rejected");
            return Err(e);
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl<E: ValidationEngine> OutputParser for XmlOutputParser<E> {
    type Output = String;

    fn get_format_instructions(&self) -> String {
        self.format_instructions()
    }

    async fn parse(&self, text: &str) -> std::result::Result<String, OutputParserException> {
        Ok(self.parse_text(text).await?)
    }
}
