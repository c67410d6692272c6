//! # xml-output-parser
//!
//! Validate XML produced by a language model against an XSD schema.
//!
//! The crate has two layers:
//!
//! - a validator that checks an XML string against an XSD string and reports
//!   every conformance diagnostic with its line and column
//! - an output parser that strips an optional fenced code block from raw
//!   model output, validates the XML inside it and hands the original text
//!   back on success
//!
//! Validation runs through the [`ValidationEngine`] trait. The default
//! [`XsdEngine`] is a self-contained XSD 1.0 validator built on quick-xml.
//!
//! ## Features
//!
//! - XSD 1.0 structures: elements, attributes, simple and complex types,
//!   model groups, wildcards, derivation by extension and restriction
//! - All built-in datatypes and constraining facets
//! - libxml2-style diagnostics
//! - Resource limits against hostile input
//!
//! ## Example
//!
//! ```rust
//! use xml_output_parser::{validate_against_xsd, Error};
//!
//! let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
//!   <xs:element name="greeting" type="xs:string"/>
//! </xs:schema>"#;
//!
//! assert!(validate_against_xsd("<greeting>hello</greeting>", xsd).unwrap());
//!
//! match validate_against_xsd("<farewell/>", xsd) {
//!     Err(Error::Parse(e)) => assert!(e.message().contains("does not conform")),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// XML handling
pub mod namespaces;
pub mod documents;

// XSD components and validation
pub mod validators;

// Public surface
pub mod engine;
pub mod validator;
pub mod output_parser;

// Re-exports for convenience
pub use engine::{ValidationEngine, XsdEngine};
pub use error::{Error, Result, ValidationError, XmlParseError};
pub use limits::Limits;
pub use output_parser::{extract_xml, OutputParser, OutputParserException, XmlOutputParser};
pub use validator::{validate_against_xsd, XmlValidator};
pub use validators::{ValidationMode, XsdSchema};

/// Version of the xml-output-parser library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XSD namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XSI namespace
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
