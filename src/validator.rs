//! Schema validation of XML text
//!
//! [`XmlValidator`] parses an XML string and an XSD string, runs the
//! engine, and turns a non-empty diagnostics list into a single
//! [`XmlParseError`].

use tracing::debug;

use crate::engine::{ValidationEngine, XsdEngine};
use crate::error::{Result, XmlParseError};

/// Validates XML text against XSD text using a pluggable engine
#[derive(Debug, Clone, Default)]
pub struct XmlValidator<E: ValidationEngine = XsdEngine> {
    engine: E,
}

impl XmlValidator<XsdEngine> {
    /// Create a validator backed by the built-in engine
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: ValidationEngine> XmlValidator<E> {
    /// Create a validator backed by a custom engine
    pub fn with_engine(engine: E) -> Self {
        Self { engine }
    }

    /// The engine in use
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Validate `xml` against the schema in `xsd`
    ///
    /// Returns `Ok(true)` when the document conforms. When the engine
    /// reports diagnostics, they are joined one per line, in report order,
    /// into an [`Error::Parse`](crate::Error::Parse) that keeps `xml`
    /// verbatim. Malformed XML on either side surfaces unchanged as
    /// [`Error::Xml`](crate::Error::Xml).
    pub fn validate_against_xsd(&self, xml: &str, xsd: &str) -> Result<bool> {
        let doc = self.engine.parse(xml)?;
        let schema = self.engine.parse(xsd)?;

        let diagnostics = self.engine.validate(&doc, &schema)?;
        if diagnostics.is_empty() {
            return Ok(true);
        }

        debug!(count = diagnostics.len(), "document does not conform");
        Err(XmlParseError::from_diagnostics(xml, diagnostics).into())
    }
}

/// Validate `xml` against `xsd` with the built-in engine
pub fn validate_against_xsd(xml: &str, xsd: &str) -> Result<bool> {
    XmlValidator::new().validate_against_xsd(xml, xsd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ValidationError};
    use pretty_assertions::assert_eq;

    /// Engine that reports a fixed diagnostics list for any input
    struct CannedEngine(Vec<ValidationError>);

    impl ValidationEngine for CannedEngine {
        type Document = String;

        fn parse(&self, text: &str) -> Result<String> {
            Ok(text.to_string())
        }

        fn validate(&self, _doc: &String, _schema: &String) -> Result<Vec<ValidationError>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_empty_diagnostics_is_success() {
        let validator = XmlValidator::with_engine(CannedEngine(Vec::new()));
        assert!(validator.validate_against_xsd("<a/>", "<xs:schema/>").unwrap());
    }

    #[test]
    fn test_diagnostics_are_joined_in_order() {
        let validator = XmlValidator::with_engine(CannedEngine(vec![
            ValidationError::new("second", 2, 1),
            ValidationError::new("first", 1, 1),
            ValidationError::new("second", 2, 1),
        ]));
        let err = validator.validate_against_xsd("<a/>", "<s/>").unwrap_err();
        match err {
            Error::Parse(e) => {
                assert_eq!(
                    e.message(),
                    "Failed to parse. Text: \"<a/>\". Error: XML does not conform to the provided XSD: \
                     second (line: 2, column: 1)\nfirst (line: 1, column: 1)\nsecond (line: 2, column: 1)"
                );
                assert_eq!(e.text(), "<a/>");
                assert_eq!(e.diagnostics().len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_default_engine() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><xs:element name="n" type="xs:int"/></xs:schema>"#;
        assert!(validate_against_xsd("<n>5</n>", xsd).unwrap());
        let err = validate_against_xsd("<n>five</n>", xsd).unwrap_err();
        assert!(err.is_conformance());
        assert_eq!(err.text(), Some("<n>five</n>"));
    }

    #[test]
    fn test_malformed_input_is_not_a_conformance_error() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/>"#;
        assert!(matches!(validate_against_xsd("<n>", xsd), Err(Error::Xml(_))));
        assert!(matches!(validate_against_xsd("<n/>", "<xs:schema"), Err(Error::Xml(_))));
    }
}
