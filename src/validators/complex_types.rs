//! XSD Complex Types
//!
//! A complex type is stored as declared: its own particle and attributes plus
//! an optional derivation from a named base. [`XsdComplexType::effective`]
//! folds the derivation chain into the content and attributes an element of
//! that type actually has.

use crate::error::{Error, Result};
use crate::namespaces::QName;
use std::fmt;
use std::sync::Arc;

use super::attributes::{AttributeItem, AttributeSet};
use super::facets::Facets;
use super::groups::{GroupParticle, ModelType, Particle};
use super::schemas::{TypeDef, TypeRef, XsdSchema};
use super::simple_types::XsdSimpleType;
use super::wildcards::Wildcard;

/// Derivation method for complex types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DerivationMethod {
    /// Type derived by restriction
    #[default]
    Restriction,
    /// Type derived by extension
    Extension,
}

impl fmt::Display for DerivationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Restriction => write!(f, "restriction"),
            Self::Extension => write!(f, "extension"),
        }
    }
}

/// Content type label for complex types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTypeLabel {
    /// No content (empty element)
    Empty,
    /// Simple content (text only)
    Simple,
    /// Mixed content (text and elements)
    Mixed,
    /// Element-only content
    ElementOnly,
}

impl fmt::Display for ContentTypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Simple => write!(f, "simple"),
            Self::Mixed => write!(f, "mixed"),
            Self::ElementOnly => write!(f, "element-only"),
        }
    }
}

/// Content of a complex type as written in the schema
#[derive(Debug, Clone)]
pub enum ComplexContent {
    /// Model group given directly (or derived from xs:anyType)
    Group(Option<Particle>),
    /// `xs:complexContent` derivation
    Complex {
        /// Extension or restriction
        method: DerivationMethod,
        /// Name of the base type
        base: QName,
        /// Model group of the derivation
        particle: Option<Particle>,
    },
    /// `xs:simpleContent` derivation
    Simple {
        /// Extension or restriction
        method: DerivationMethod,
        /// Name of the base type
        base: QName,
        /// Facets of a restriction
        facets: Facets,
        /// Inline `xs:simpleType` of a restriction
        simple_type: Option<TypeRef>,
    },
}

/// A complex type definition
#[derive(Debug, Clone)]
pub struct XsdComplexType {
    /// Type name, None for anonymous types
    pub name: Option<QName>,
    /// Whether character data may appear between child elements
    pub mixed: bool,
    /// Abstract types cannot be used directly by instances
    pub is_abstract: bool,
    /// Declared content
    pub content: ComplexContent,
    /// Declared attribute uses and attribute group references
    pub attributes: Vec<AttributeItem>,
    /// Declared attribute wildcard
    pub any_attribute: Option<Wildcard>,
}

/// Content of a complex type once the derivation chain is folded in
#[derive(Debug, Clone)]
pub enum ContentType {
    /// No character data and no children
    Empty,
    /// Character data of a simple type
    Simple(Arc<XsdSimpleType>),
    /// Child elements matched against a particle
    Elements {
        /// Content model, None when no children are allowed
        particle: Option<Particle>,
        /// Whether character data may appear between children
        mixed: bool,
    },
}

impl ContentType {
    /// Label used in diagnostics
    pub fn label(&self) -> ContentTypeLabel {
        match self {
            ContentType::Empty => ContentTypeLabel::Empty,
            ContentType::Simple(_) => ContentTypeLabel::Simple,
            ContentType::Elements { mixed: true, .. } => ContentTypeLabel::Mixed,
            ContentType::Elements { mixed: false, .. } => ContentTypeLabel::ElementOnly,
        }
    }
}

/// Effective content and attributes of a complex type
#[derive(Debug, Clone)]
pub struct EffectiveType {
    /// Content model
    pub content: ContentType,
    /// Allowed attributes
    pub attributes: AttributeSet,
}

impl XsdComplexType {
    /// Create a complex type with the given content
    pub fn new(name: Option<QName>, content: ComplexContent) -> Self {
        Self {
            name,
            mixed: false,
            is_abstract: false,
            content,
            attributes: Vec::new(),
            any_attribute: None,
        }
    }

    /// Fold the derivation chain into the effective content and attributes
    pub fn effective(&self, schema: &XsdSchema) -> Result<EffectiveType> {
        self.effective_at(schema, 0)
    }

    fn effective_at(&self, schema: &XsdSchema, depth: usize) -> Result<EffectiveType> {
        schema.limits.check_model_depth(depth)?;

        let (content, mut attributes) = match &self.content {
            ComplexContent::Group(particle) => (
                element_content(particle.clone(), self.mixed),
                AttributeSet::default(),
            ),
            ComplexContent::Complex {
                method,
                base,
                particle,
            } => match schema.resolve_named_type(base)? {
                TypeDef::AnyType => (
                    element_content(particle.clone(), self.mixed),
                    AttributeSet::default(),
                ),
                TypeDef::Complex(base_type) => {
                    let base_effective = base_type.effective_at(schema, depth + 1)?;
                    let content = match method {
                        DerivationMethod::Restriction => element_content(particle.clone(), self.mixed),
                        DerivationMethod::Extension => {
                            extend_content(base, base_effective.content, particle.clone(), self.mixed)?
                        }
                    };
                    (content, base_effective.attributes)
                }
                TypeDef::Simple(_) => {
                    return Err(Error::Schema(format!(
                        "complexContent base '{}' must be a complex type",
                        base
                    )))
                }
            },
            ComplexContent::Simple {
                method,
                base,
                facets,
                simple_type,
            } => {
                let (base_simple, base_attributes) = match schema.resolve_named_type(base)? {
                    TypeDef::Simple(simple) => (simple, AttributeSet::default()),
                    TypeDef::Complex(base_type) => {
                        let base_effective = base_type.effective_at(schema, depth + 1)?;
                        match base_effective.content {
                            ContentType::Simple(simple) => (simple, base_effective.attributes),
                            _ => {
                                return Err(Error::Schema(format!(
                                    "simpleContent base '{}' must have simple content",
                                    base
                                )))
                            }
                        }
                    }
                    TypeDef::AnyType => {
                        return Err(Error::Schema(
                            "simpleContent cannot derive from xs:anyType".to_string(),
                        ))
                    }
                };
                let value_type = match method {
                    DerivationMethod::Extension => base_simple,
                    DerivationMethod::Restriction => Arc::new(XsdSimpleType::Restriction {
                        name: None,
                        base: simple_type
                            .clone()
                            .unwrap_or(TypeRef::Simple(base_simple)),
                        facets: facets.clone(),
                    }),
                };
                (ContentType::Simple(value_type), base_attributes)
            }
        };

        attributes.extend(&self.attributes, self.any_attribute.as_ref(), schema, depth + 1)?;
        Ok(EffectiveType {
            content,
            attributes,
        })
    }
}

/// Content for a (possibly absent) particle
fn element_content(particle: Option<Particle>, mixed: bool) -> ContentType {
    let particle = particle.filter(|p| !is_empty_particle(p));
    match (particle, mixed) {
        (None, false) => ContentType::Empty,
        (particle, mixed) => ContentType::Elements { particle, mixed },
    }
}

fn is_empty_particle(particle: &Particle) -> bool {
    particle.occurs.is_empty()
        || matches!(&particle.term, GroupParticle::Group(g) if g.is_empty() && g.model != ModelType::Choice)
}

/// Append the extension's particle to the base content
fn extend_content(
    base: &QName,
    base_content: ContentType,
    particle: Option<Particle>,
    mixed: bool,
) -> Result<ContentType> {
    match base_content {
        ContentType::Empty => Ok(element_content(particle, mixed)),
        ContentType::Elements {
            particle: base_particle,
            mixed: base_mixed,
        } => {
            let particle = particle.filter(|p| !is_empty_particle(p));
            let combined = match (base_particle, particle) {
                (Some(first), Some(second)) => Some(Particle::sequence_of(first, second)),
                (first, None) => first,
                (None, second) => second,
            };
            Ok(element_content(combined, mixed || base_mixed))
        }
        ContentType::Simple(_) => Err(Error::Schema(format!(
            "complexContent cannot extend '{}', which has simple content",
            base
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:complexType name="base">
            <xs:sequence>
                <xs:element name="a" type="xs:string"/>
            </xs:sequence>
            <xs:attribute name="id" type="xs:ID" use="required"/>
        </xs:complexType>
        <xs:complexType name="extended">
            <xs:complexContent>
                <xs:extension base="base">
                    <xs:sequence>
                        <xs:element name="b" type="xs:string"/>
                    </xs:sequence>
                    <xs:attribute name="note" type="xs:string"/>
                </xs:extension>
            </xs:complexContent>
        </xs:complexType>
        <xs:complexType name="price">
            <xs:simpleContent>
                <xs:extension base="xs:decimal">
                    <xs:attribute name="currency" type="xs:string"/>
                </xs:extension>
            </xs:simpleContent>
        </xs:complexType>
        <xs:complexType name="smallPrice">
            <xs:simpleContent>
                <xs:restriction base="price">
                    <xs:maxInclusive value="10"/>
                </xs:restriction>
            </xs:simpleContent>
        </xs:complexType>
        <xs:complexType name="nothing"/>
        <xs:complexType name="text" mixed="true"/>
        <xs:element name="root" type="extended"/>
    </xs:schema>"#;

    fn complex(schema: &XsdSchema, name: &str) -> Arc<XsdComplexType> {
        match schema.lookup_type(&QName::local(name)) {
            Some(TypeDef::Complex(complex)) => complex.clone(),
            other => panic!("{} is not a complex type: {:?}", name, other),
        }
    }

    #[test]
    fn test_extension_appends_content_and_attributes() {
        let schema = XsdSchema::from_string(SCHEMA).unwrap();
        let effective = complex(&schema, "extended").effective(&schema).unwrap();

        match effective.content {
            ContentType::Elements {
                particle: Some(ref particle),
                mixed: false,
            } => match particle.term {
                GroupParticle::Group(ref group) => assert_eq!(group.particles.len(), 2),
                ref other => panic!("unexpected term {:?}", other),
            },
            ref other => panic!("unexpected content {:?}", other),
        }
        let names: Vec<String> = effective.attributes.attributes.keys().map(ToString::to_string).collect();
        assert_eq!(names, vec!["id", "note"]);
    }

    #[test]
    fn test_simple_content() {
        let schema = XsdSchema::from_string(SCHEMA).unwrap();
        let effective = complex(&schema, "price").effective(&schema).unwrap();
        assert_eq!(effective.content.label(), ContentTypeLabel::Simple);
        assert!(effective.attributes.attributes.contains_key(&QName::local("currency")));
    }

    #[test]
    fn test_simple_content_restriction_adds_facets() {
        let schema = XsdSchema::from_string(SCHEMA).unwrap();
        let effective = complex(&schema, "smallPrice").effective(&schema).unwrap();
        match effective.content {
            ContentType::Simple(ref simple) => {
                assert!(simple.validate("9.99", &schema).is_ok());
                assert!(simple.validate("10.01", &schema).is_err());
            }
            ref other => panic!("unexpected content {:?}", other),
        }
        assert!(effective.attributes.attributes.contains_key(&QName::local("currency")));
    }

    #[test]
    fn test_empty_and_mixed_labels() {
        let schema = XsdSchema::from_string(SCHEMA).unwrap();
        let empty = complex(&schema, "nothing").effective(&schema).unwrap();
        assert_eq!(empty.content.label(), ContentTypeLabel::Empty);
        let mixed = complex(&schema, "text").effective(&schema).unwrap();
        assert_eq!(mixed.content.label(), ContentTypeLabel::Mixed);
        assert_eq!(ContentTypeLabel::ElementOnly.to_string(), "element-only");
    }

    #[test]
    fn test_circular_derivation_hits_the_depth_limit() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:complexType name="loop">
                <xs:complexContent>
                    <xs:extension base="loop"/>
                </xs:complexContent>
            </xs:complexType>
            <xs:element name="root" type="loop"/>
        </xs:schema>"#;
        let schema = XsdSchema::from_string(xsd).unwrap();
        assert!(matches!(
            complex(&schema, "loop").effective(&schema),
            Err(Error::LimitExceeded(_))
        ));
    }
}
