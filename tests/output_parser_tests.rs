//! Integration tests for the XML output parser

use pretty_assertions::assert_eq;
use xml_output_parser::{
    Error, OutputParser, Result, ValidationEngine, ValidationError, XmlOutputParser,
};

const FLAVORS_XSD: &str = r#"<?xml version="1.0"?>
    <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
      <xs:element name="list">
        <xs:complexType>
          <xs:sequence>
            <xs:element name="flavor" type="xs:string" maxOccurs="unbounded"/>
          </xs:sequence>
        </xs:complexType>
      </xs:element>
    </xs:schema>"#;

#[test]
fn test_format_instructions() {
    let parser = XmlOutputParser::new(FLAVORS_XSD);
    let instructions = parser.get_format_instructions();
    assert!(instructions.contains("Your output must be formatted as an XML string"));
    assert!(instructions.contains(FLAVORS_XSD));
    assert!(instructions.contains("XML declaration"));
    assert!(instructions.contains("namespaces"));
    assert_eq!(instructions, parser.get_format_instructions());
}

#[tokio::test]
async fn test_parse_fenced_xml_returns_original_text() {
    let text = "```xml\n<list><flavor>Chocolate</flavor><flavor>Vanilla</flavor></list>\n```";
    let parser = XmlOutputParser::new(FLAVORS_XSD);
    assert_eq!(parser.parse(text).await.unwrap(), text);
}

#[tokio::test]
async fn test_parse_untagged_fence_and_surrounding_prose() {
    let text = "Sure! Here is the list:\n```\n<list><flavor>Mint</flavor></list>\n```\nEnjoy.";
    let parser = XmlOutputParser::new(FLAVORS_XSD);
    assert_eq!(parser.parse(text).await.unwrap(), text);
}

#[tokio::test]
async fn test_parse_plain_text_is_returned_verbatim() {
    let text = "\n  <?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<list><flavor>Mint</flavor></list>  \n";
    let parser = XmlOutputParser::new(FLAVORS_XSD);
    assert_eq!(parser.parse_text(text).await.unwrap(), text);
}

#[tokio::test]
async fn test_only_first_fenced_block_is_validated() {
    let parser = XmlOutputParser::new(FLAVORS_XSD);

    let valid_first = "```xml\n<list><flavor>Mint</flavor></list>\n```\n```xml\n<oops/>\n```";
    assert_eq!(parser.parse_text(valid_first).await.unwrap(), valid_first);

    let invalid_first = "```xml\n<oops/>\n```\n```xml\n<list><flavor>Mint</flavor></list>\n```";
    assert!(parser.parse_text(invalid_first).await.is_err());
}

#[tokio::test]
async fn test_parse_rejects_non_conforming_xml() {
    let text = "```xml\n<list><flavor>Chocolate</flavor><color>Red</color></list>\n```";
    let parser = XmlOutputParser::new(FLAVORS_XSD);

    match parser.parse_text(text).await {
        Err(Error::Parse(e)) => {
            // The error carries the extracted XML, not the raw output
            assert_eq!(e.text(), "<list><flavor>Chocolate</flavor><color>Red</color></list>");
            assert!(e.message().contains("Element 'color': This element is not expected."));
        }
        other => panic!("expected a conformance error, got {:?}", other),
    }

    let exception = parser.parse(text).await.unwrap_err();
    assert!(exception
        .message()
        .starts_with("Failed to parse. Text: \"<list><flavor>Chocolate</flavor><color>Red</color></list>\"."));
}

#[tokio::test]
async fn test_exception_carries_offending_text() {
    let text = "```xml\n<r>x</r>\n```";
    let parser = XmlOutputParser::new(FLAVORS_XSD);

    let exception = parser.parse(text).await.unwrap_err();
    assert_eq!(exception.text(), Some("<r>x</r>"));
    assert_eq!(
        exception.diagnostics(),
        &[ValidationError::new(
            "Element 'r': No matching global declaration available for the validation root.",
            1,
            1
        )]
    );

    // Malformed output has no diagnostics to carry
    let exception = parser.parse("```xml\n<r>\n```").await.unwrap_err();
    assert_eq!(exception.text(), None);
    assert!(exception.message().starts_with("XML error"));
}

#[tokio::test]
async fn test_empty_candidate_goes_to_the_validator() {
    let parser = XmlOutputParser::new(FLAVORS_XSD);
    assert!(matches!(parser.parse_text("   ").await, Err(Error::Xml(_))));
    assert!(matches!(parser.parse_text("```xml\n```").await, Err(Error::Xml(_))));
}

/// Engine that accepts only the text "ok"
struct OkEngine;

impl ValidationEngine for OkEngine {
    type Document = String;

    fn parse(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn validate(&self, doc: &String, _schema: &String) -> Result<Vec<ValidationError>> {
        if doc == "ok" {
            Ok(Vec::new())
        } else {
            Ok(vec![ValidationError::new("not ok", 1, 1)])
        }
    }
}

#[tokio::test]
async fn test_custom_engine() {
    let parser = XmlOutputParser::with_engine("any schema", OkEngine);
    assert_eq!(parser.xsd(), "any schema");
    assert_eq!(parser.parse("```text\nok\n```").await.unwrap(), "```text\nok\n```");

    let exception = parser.parse("nope").await.unwrap_err();
    assert_eq!(
        exception.message(),
        "Failed to parse. Text: \"nope\". Error: XML does not conform to the provided XSD: not ok (line: 1, column: 1)"
    );
}

#[tokio::test]
async fn test_concurrent_parses_do_not_interact() {
    let parser = XmlOutputParser::new(FLAVORS_XSD);
    let good = "<list><flavor>Mint</flavor></list>";
    let bad = "<list><color>Red</color></list>";

    let (a, b) = tokio::join!(parser.parse_text(good), parser.parse_text(bad));
    assert_eq!(a.unwrap(), good);
    assert!(matches!(b, Err(Error::Parse(_))));
}
