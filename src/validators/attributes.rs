//! XSD Attribute declarations
//!
//! This module covers attribute declarations, attribute uses inside complex
//! types and attribute groups, and their resolution into the flat set of
//! attributes an element may carry.

use crate::error::{Error, Result};
use crate::namespaces::QName;
use indexmap::IndexMap;
use std::str::FromStr;

use super::builtins::XsdValue;
use super::elements::ValueConstraint;
use super::schemas::{TypeDef, TypeRef, XsdSchema};
use super::wildcards::Wildcard;

/// Attribute use mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeUse {
    /// Attribute is optional (default)
    #[default]
    Optional,
    /// Attribute is required
    Required,
    /// Attribute is prohibited
    Prohibited,
}

impl FromStr for AttributeUse {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "optional" => Ok(Self::Optional),
            "required" => Ok(Self::Required),
            "prohibited" => Ok(Self::Prohibited),
            other => Err(Error::Schema(format!("Invalid attribute use: '{}'", other))),
        }
    }
}

/// An attribute declaration
#[derive(Debug, Clone)]
pub struct XsdAttribute {
    /// Attribute name
    pub name: QName,
    /// Simple type of the value (`xs:anySimpleType` when None)
    pub type_ref: Option<TypeRef>,
    /// Default or fixed value
    pub constraint: Option<ValueConstraint>,
}

impl XsdAttribute {
    /// Create an untyped attribute declaration
    pub fn new(name: QName) -> Self {
        Self {
            name,
            type_ref: None,
            constraint: None,
        }
    }

    /// Validate an attribute value against the declared type
    pub fn validate_value(&self, value: &str, schema: &XsdSchema) -> Result<XsdValue> {
        let Some(ref type_ref) = self.type_ref else {
            return Ok(XsdValue::Null);
        };
        match schema.resolve_type(type_ref)? {
            TypeDef::Simple(simple) => simple.validate(value, schema),
            TypeDef::AnyType => Ok(XsdValue::Null),
            TypeDef::Complex(_) => Err(Error::Schema(format!(
                "Attribute '{}' must have a simple type",
                self.name
            ))),
        }
    }
}

/// An entry of a complex type's or attribute group's attribute list
#[derive(Debug, Clone)]
pub enum AttributeItem {
    /// Locally declared attribute
    Local {
        /// The declaration
        decl: XsdAttribute,
        /// required / optional / prohibited
        usage: AttributeUse,
    },
    /// Reference to a global attribute
    Ref {
        /// Name of the global attribute
        name: QName,
        /// required / optional / prohibited
        usage: AttributeUse,
        /// Default or fixed value given at the use
        constraint: Option<ValueConstraint>,
    },
    /// Reference to a named attribute group
    GroupRef(QName),
}

/// A named attribute group
#[derive(Debug, Clone)]
pub struct XsdAttributeGroup {
    /// Group name
    pub name: QName,
    /// Attribute uses and nested group references
    pub items: Vec<AttributeItem>,
    /// Attribute wildcard
    pub any_attribute: Option<Wildcard>,
}

/// An attribute use after references are followed
#[derive(Debug, Clone)]
pub struct ResolvedAttribute {
    /// The declaration in effect
    pub decl: XsdAttribute,
    /// Required, optional or prohibited
    pub usage: AttributeUse,
}

impl ResolvedAttribute {
    /// Value constraint in effect for this use
    pub fn constraint(&self) -> Option<&ValueConstraint> {
        self.decl.constraint.as_ref()
    }
}

/// Flat view of the attributes allowed on an element
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    /// Declared attributes by name
    pub attributes: IndexMap<QName, ResolvedAttribute>,
    /// Wildcard for undeclared attributes
    pub any_attribute: Option<Wildcard>,
}

impl AttributeSet {
    /// Add attribute items; later uses override earlier ones with the same name
    pub fn extend(
        &mut self,
        items: &[AttributeItem],
        any_attribute: Option<&Wildcard>,
        schema: &XsdSchema,
        depth: usize,
    ) -> Result<()> {
        schema.limits.check_model_depth(depth)?;

        for item in items {
            match item {
                AttributeItem::Local { decl, usage } => {
                    self.insert(decl.clone(), *usage);
                }
                AttributeItem::Ref {
                    name,
                    usage,
                    constraint,
                } => {
                    let global = schema.lookup_attribute(name).ok_or_else(|| {
                        Error::Schema(format!("Reference to undeclared attribute '{}'", name))
                    })?;
                    let mut decl = global.clone();
                    if constraint.is_some() {
                        decl.constraint = constraint.clone();
                    }
                    self.insert(decl, *usage);
                }
                AttributeItem::GroupRef(name) => {
                    let group = schema.lookup_attribute_group(name).ok_or_else(|| {
                        Error::Schema(format!("Reference to undeclared attribute group '{}'", name))
                    })?;
                    self.extend(&group.items, group.any_attribute.as_ref(), schema, depth + 1)?;
                }
            }
        }

        if let Some(wildcard) = any_attribute {
            self.any_attribute = Some(match self.any_attribute {
                Some(ref existing) => existing.union(wildcard),
                None => wildcard.clone(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, decl: XsdAttribute, usage: AttributeUse) {
        if usage == AttributeUse::Prohibited {
            self.attributes.shift_remove(&decl.name);
        } else {
            self.attributes
                .insert(decl.name.clone(), ResolvedAttribute { decl, usage });
        }
    }

    /// Required attributes, in declaration order
    pub fn required(&self) -> impl Iterator<Item = &ResolvedAttribute> {
        self.attributes
            .values()
            .filter(|a| a.usage == AttributeUse::Required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:attribute name="lang" type="xs:language"/>
        <xs:attributeGroup name="common">
            <xs:attribute name="id" type="xs:ID" use="required"/>
            <xs:attribute ref="lang"/>
        </xs:attributeGroup>
        <xs:element name="root" type="xs:string"/>
    </xs:schema>"#;

    #[test]
    fn test_attribute_use_from_str() {
        assert_eq!("required".parse::<AttributeUse>().unwrap(), AttributeUse::Required);
        assert_eq!(AttributeUse::default(), AttributeUse::Optional);
        assert!("sometimes".parse::<AttributeUse>().is_err());
    }

    #[test]
    fn test_extend_follows_group_references() {
        let schema = XsdSchema::from_string(SCHEMA).unwrap();
        let mut set = AttributeSet::default();
        set.extend(&[AttributeItem::GroupRef(QName::local("common"))], None, &schema, 0)
            .unwrap();

        let names: Vec<String> = set.attributes.keys().map(ToString::to_string).collect();
        assert_eq!(names, vec!["id", "lang"]);
        assert_eq!(set.required().count(), 1);
    }

    #[test]
    fn test_prohibited_use_removes_attribute() {
        let schema = XsdSchema::from_string(SCHEMA).unwrap();
        let mut set = AttributeSet::default();
        set.extend(&[AttributeItem::GroupRef(QName::local("common"))], None, &schema, 0)
            .unwrap();
        set.extend(
            &[AttributeItem::Ref {
                name: QName::local("lang"),
                usage: AttributeUse::Prohibited,
                constraint: None,
            }],
            None,
            &schema,
            0,
        )
        .unwrap();
        assert!(!set.attributes.contains_key(&QName::local("lang")));
    }

    #[test]
    fn test_unknown_reference_is_a_schema_error() {
        let schema = XsdSchema::from_string(SCHEMA).unwrap();
        let mut set = AttributeSet::default();
        let result = set.extend(&[AttributeItem::GroupRef(QName::local("nope"))], None, &schema, 0);
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_validate_value() {
        let schema = XsdSchema::from_string(SCHEMA).unwrap();
        let lang = schema.lookup_attribute(&QName::local("lang")).unwrap();
        assert!(lang.validate_value("en-GB", &schema).is_ok());
        assert!(lang.validate_value("not a language", &schema).is_err());
        assert_eq!(
            XsdAttribute::new(QName::local("free")).validate_value("anything", &schema).unwrap(),
            XsdValue::Null
        );
    }
}
