//! XSD Simple Types
//!
//! Simple types are built-in types, restrictions of other simple types, lists
//! and unions. Base and member types are referenced by name and resolved
//! against the schema when a value is checked.

use crate::error::{Error, Result};
use crate::namespaces::QName;
use std::fmt;

use super::builtins::{BuiltinType, XsdValue};
use super::facets::{Facets, WhiteSpace};
use super::schemas::{TypeDef, TypeRef, XsdSchema};

// =============================================================================
// Simple Type Variety
// =============================================================================

/// Variety of a simple type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleTypeVariety {
    /// Atomic type (single value)
    Atomic,
    /// List type (whitespace-separated values)
    List,
    /// Union type (value matches one of several types)
    Union,
}

impl fmt::Display for SimpleTypeVariety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic => write!(f, "atomic"),
            Self::List => write!(f, "list"),
            Self::Union => write!(f, "union"),
        }
    }
}

// =============================================================================
// Simple Type Definition
// =============================================================================

/// A simple type definition
#[derive(Debug, Clone)]
pub enum XsdSimpleType {
    /// One of the built-in types
    Builtin(&'static BuiltinType),
    /// Restriction of a base simple type by facets
    Restriction {
        /// Type name, None for anonymous types
        name: Option<QName>,
        /// Restricted type
        base: TypeRef,
        /// Constraining facets
        facets: Facets,
    },
    /// Whitespace-separated list of item values
    List {
        /// Type name, None for anonymous types
        name: Option<QName>,
        /// Type of each item
        item: TypeRef,
    },
    /// Value of any of the member types, tried in order
    Union {
        /// Type name, None for anonymous types
        name: Option<QName>,
        /// Member types
        members: Vec<TypeRef>,
    },
}

/// Why a value was rejected
enum Failure {
    /// Not in the lexical space of the type
    Lexical,
    /// Rejected by a facet (message ready for display)
    Facet(String),
    /// Broken schema or limit hit while resolving types
    Fatal(Error),
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Failure::Fatal(error)
    }
}

impl XsdSimpleType {
    /// Name of the type, None for anonymous types
    pub fn name(&self) -> Option<String> {
        match self {
            Self::Builtin(builtin) => Some(format!("xs:{}", builtin.name)),
            Self::Restriction { name, .. } | Self::List { name, .. } | Self::Union { name, .. } => {
                name.as_ref().map(ToString::to_string)
            }
        }
    }

    /// Variety of the type
    pub fn variety(&self, schema: &XsdSchema) -> Result<SimpleTypeVariety> {
        self.variety_at(schema, 0)
    }

    fn variety_at(&self, schema: &XsdSchema, depth: usize) -> Result<SimpleTypeVariety> {
        schema.limits.check_model_depth(depth)?;
        match self {
            Self::Builtin(builtin) if builtin.is_list() => Ok(SimpleTypeVariety::List),
            Self::Builtin(_) => Ok(SimpleTypeVariety::Atomic),
            Self::Restriction { base, .. } => resolve_simple(base, schema)?.variety_at(schema, depth + 1),
            Self::List { .. } => Ok(SimpleTypeVariety::List),
            Self::Union { .. } => Ok(SimpleTypeVariety::Union),
        }
    }

    /// White space handling in effect for this type
    pub fn white_space(&self, schema: &XsdSchema) -> Result<WhiteSpace> {
        self.white_space_at(schema, 0)
    }

    fn white_space_at(&self, schema: &XsdSchema, depth: usize) -> Result<WhiteSpace> {
        schema.limits.check_model_depth(depth)?;
        match self {
            Self::Builtin(builtin) => Ok(builtin.white_space),
            Self::Restriction { base, facets, .. } => match facets.white_space {
                Some(ws) => Ok(ws),
                None => resolve_simple(base, schema)?.white_space_at(schema, depth + 1),
            },
            Self::List { .. } | Self::Union { .. } => Ok(WhiteSpace::Collapse),
        }
    }

    /// Validate a raw value, returning its decoded form
    ///
    /// Error messages read like `'abc' is not a valid value of the atomic type 'xs:int'.`
    /// or carry the failing facet's message.
    pub fn validate(&self, value: &str, schema: &XsdSchema) -> Result<XsdValue> {
        let normalized = self.white_space(schema)?.normalize(value);
        match self.check(&normalized, schema, 0) {
            Ok(decoded) => Ok(decoded),
            Err(Failure::Lexical) => {
                let variety = self.variety(schema)?;
                let described = match self.name() {
                    Some(name) => format!("{} type '{}'", variety, name),
                    None => format!("local {} type", variety),
                };
                Err(Error::Value(format!(
                    "'{}' is not a valid value of the {}.",
                    normalized, described
                )))
            }
            Err(Failure::Facet(message)) => Err(Error::Value(message)),
            Err(Failure::Fatal(error)) => Err(error),
        }
    }

    /// Check an already normalized value
    fn check(&self, lexical: &str, schema: &XsdSchema, depth: usize) -> std::result::Result<XsdValue, Failure> {
        schema.limits.check_model_depth(depth)?;
        match self {
            Self::Builtin(builtin) => builtin.validate(lexical).map_err(|_| Failure::Lexical),
            Self::Restriction { base, facets, .. } => {
                let base_type = resolve_simple(base, schema)?;
                let decoded = base_type.check(lexical, schema, depth + 1)?;
                let white_space = self.white_space_at(schema, depth)?;
                facets
                    .validate(lexical, &decoded, white_space)
                    .map_err(|e| match e {
                        Error::Value(message) => Failure::Facet(message),
                        other => Failure::Fatal(other),
                    })?;
                Ok(decoded)
            }
            Self::List { item, .. } => {
                let item_type = resolve_simple(item, schema)?;
                lexical
                    .split(' ')
                    .filter(|s| !s.is_empty())
                    .map(|token| {
                        item_type.check(token, schema, depth + 1).map_err(|e| match e {
                            Failure::Facet(_) => Failure::Lexical,
                            other => other,
                        })
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map(XsdValue::List)
            }
            Self::Union { members, .. } => {
                for member in members {
                    let member_type = resolve_simple(member, schema)?;
                    let member_value = member_type.white_space_at(schema, depth + 1)?.normalize(lexical);
                    match member_type.check(&member_value, schema, depth + 1) {
                        Ok(decoded) => return Ok(decoded),
                        Err(Failure::Fatal(error)) => return Err(Failure::Fatal(error)),
                        Err(_) => continue,
                    }
                }
                Err(Failure::Lexical)
            }
        }
    }
}

/// Resolve a reference that must name a simple type
fn resolve_simple(type_ref: &TypeRef, schema: &XsdSchema) -> Result<std::sync::Arc<XsdSimpleType>> {
    match schema.resolve_type(type_ref)? {
        TypeDef::Simple(simple) => Ok(simple),
        TypeDef::AnyType | TypeDef::Complex(_) => Err(Error::Schema(format!(
            "'{}' is not a simple type",
            type_ref
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:simpleType name="percent">
            <xs:restriction base="xs:integer">
                <xs:minInclusive value="0"/>
                <xs:maxInclusive value="100"/>
            </xs:restriction>
        </xs:simpleType>
        <xs:simpleType name="smallPercent">
            <xs:restriction base="percent">
                <xs:maxExclusive value="10"/>
            </xs:restriction>
        </xs:simpleType>
        <xs:simpleType name="percents">
            <xs:list itemType="percent"/>
        </xs:simpleType>
        <xs:simpleType name="percentOrAuto">
            <xs:union memberTypes="percent">
                <xs:simpleType>
                    <xs:restriction base="xs:token">
                        <xs:enumeration value="auto"/>
                    </xs:restriction>
                </xs:simpleType>
            </xs:union>
        </xs:simpleType>
        <xs:simpleType name="code">
            <xs:restriction base="xs:string">
                <xs:whiteSpace value="collapse"/>
                <xs:length value="3"/>
            </xs:restriction>
        </xs:simpleType>
        <xs:element name="root" type="xs:string"/>
    </xs:schema>"#;

    fn simple(schema: &XsdSchema, name: &str) -> std::sync::Arc<XsdSimpleType> {
        match schema.lookup_type(&QName::local(name)) {
            Some(TypeDef::Simple(simple)) => simple.clone(),
            other => panic!("{} is not a simple type: {:?}", name, other),
        }
    }

    #[test]
    fn test_restriction_chain() {
        let schema = XsdSchema::from_string(SCHEMA).unwrap();
        let small = simple(&schema, "smallPercent");
        assert!(small.validate("9", &schema).is_ok());
        assert!(small.validate("10", &schema).is_err());
        assert!(small.validate("-1", &schema).is_err());
    }

    #[test]
    fn test_lexical_error_names_the_type() {
        let schema = XsdSchema::from_string(SCHEMA).unwrap();
        let err = simple(&schema, "percent").validate("abc", &schema).unwrap_err();
        assert_eq!(
            err.to_string(),
            "value error: 'abc' is not a valid value of the atomic type 'percent'."
        );
    }

    #[test]
    fn test_facet_error_is_reported_verbatim() {
        let schema = XsdSchema::from_string(SCHEMA).unwrap();
        let err = simple(&schema, "percent").validate("101", &schema).unwrap_err();
        assert_eq!(
            err.to_string(),
            "value error: [facet 'maxInclusive'] The value '101' is greater than the maximum value allowed ('100')."
        );
    }

    #[test]
    fn test_list_type() {
        let schema = XsdSchema::from_string(SCHEMA).unwrap();
        let percents = simple(&schema, "percents");
        assert_eq!(percents.variety(&schema).unwrap(), SimpleTypeVariety::List);
        match percents.validate(" 1  20\n30 ", &schema).unwrap() {
            XsdValue::List(items) => assert_eq!(items.len(), 3),
            other => panic!("unexpected value {:?}", other),
        }
        let err = percents.validate("1 200", &schema).unwrap_err();
        assert!(err.to_string().contains("list type 'percents'"));
    }

    #[test]
    fn test_union_type() {
        let schema = XsdSchema::from_string(SCHEMA).unwrap();
        let union = simple(&schema, "percentOrAuto");
        assert!(union.validate("50", &schema).is_ok());
        assert!(union.validate(" auto ", &schema).is_ok());
        let err = union.validate("manual", &schema).unwrap_err();
        assert!(err.to_string().contains("union type 'percentOrAuto'"));
    }

    #[test]
    fn test_white_space_facet_applies_before_length() {
        let schema = XsdSchema::from_string(SCHEMA).unwrap();
        let code = simple(&schema, "code");
        assert_eq!(code.white_space(&schema).unwrap(), WhiteSpace::Collapse);
        assert!(code.validate("  ABC \n", &schema).is_ok());
        assert!(code.validate("AB", &schema).is_err());
    }
}
