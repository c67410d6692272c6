//! XML Schema validators
//!
//! This module contains the main schema component that holds the global
//! declarations of one XSD document and validates instances against them.

use crate::documents::Document;
use crate::error::{Error, Result, ValidationError};
use crate::limits::Limits;
use crate::namespaces::QName;
use crate::XSD_NAMESPACE;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use super::attributes::{AttributeItem, XsdAttribute, XsdAttributeGroup};
use super::builtins::{get_builtin_type, XSD_ANY_TYPE};
use super::complex_types::{ComplexContent, XsdComplexType};
use super::document_validation::validate_document;
use super::elements::{ElementForm, XsdElement};
use super::groups::{GroupParticle, Particle, XsdGroup};
use super::simple_types::XsdSimpleType;
use super::validation::{ValidationContext, ValidationMode};

/// Reference to a type: by name, or an anonymous definition
#[derive(Debug, Clone)]
pub enum TypeRef {
    /// Named type, resolved against the schema (or the built-ins) on use
    Named(QName),
    /// Anonymous simple type
    Simple(Arc<XsdSimpleType>),
    /// Anonymous complex type
    Complex(Arc<XsdComplexType>),
}

impl TypeRef {
    /// Reference to `xs:anyType`
    pub fn any_type() -> Self {
        TypeRef::Named(QName::namespaced(XSD_NAMESPACE, XSD_ANY_TYPE))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::Simple(_) => write!(f, "anonymous simple type"),
            TypeRef::Complex(_) => write!(f, "anonymous complex type"),
        }
    }
}

/// A resolved type definition
#[derive(Debug, Clone)]
pub enum TypeDef {
    /// Simple type (built-in or user-defined)
    Simple(Arc<XsdSimpleType>),
    /// Complex type
    Complex(Arc<XsdComplexType>),
    /// `xs:anyType`: any attributes, any content
    AnyType,
}

/// Result of validating a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Whether the document conforms
    pub valid: bool,
    /// Diagnostics in document order
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// A conforming result
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// A failing result
    pub fn invalid(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}

/// Main XML Schema component
///
/// Holds the global declarations of a single schema document. Named
/// references between components are kept by name and resolved on use.
#[derive(Debug, Clone)]
pub struct XsdSchema {
    /// Target namespace
    pub target_namespace: Option<String>,
    /// Form of local element declarations without a `form` attribute
    pub element_form_default: ElementForm,
    /// Form of local attribute declarations without a `form` attribute
    pub attribute_form_default: ElementForm,
    /// Global element declarations
    pub elements: IndexMap<QName, Arc<XsdElement>>,
    /// Named simple and complex types
    pub types: IndexMap<QName, TypeDef>,
    /// Named model groups
    pub groups: IndexMap<QName, XsdGroup>,
    /// Named attribute groups
    pub attribute_groups: IndexMap<QName, XsdAttributeGroup>,
    /// Global attribute declarations
    pub attributes: IndexMap<QName, XsdAttribute>,
    /// Resource limits for instances and model walking
    pub limits: Limits,
    /// Default validation mode
    pub validation: ValidationMode,
}

impl Default for XsdSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl XsdSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self {
            target_namespace: None,
            element_form_default: ElementForm::Unqualified,
            attribute_form_default: ElementForm::Unqualified,
            elements: IndexMap::new(),
            types: IndexMap::new(),
            groups: IndexMap::new(),
            attribute_groups: IndexMap::new(),
            attributes: IndexMap::new(),
            limits: Limits::default(),
            validation: ValidationMode::Lax,
        }
    }

    /// Set the default validation mode
    pub fn set_validation_mode(&mut self, mode: ValidationMode) {
        self.validation = mode;
    }

    /// Look up a global element declaration
    pub fn lookup_element(&self, qname: &QName) -> Option<&Arc<XsdElement>> {
        self.elements.get(qname)
    }

    /// Look up a named type defined in this schema
    pub fn lookup_type(&self, qname: &QName) -> Option<&TypeDef> {
        self.types.get(qname)
    }

    /// Look up a named model group
    pub fn lookup_group(&self, qname: &QName) -> Option<&XsdGroup> {
        self.groups.get(qname)
    }

    /// Look up a named attribute group
    pub fn lookup_attribute_group(&self, qname: &QName) -> Option<&XsdAttributeGroup> {
        self.attribute_groups.get(qname)
    }

    /// Look up a global attribute declaration
    pub fn lookup_attribute(&self, qname: &QName) -> Option<&XsdAttribute> {
        self.attributes.get(qname)
    }

    /// Resolve a named type, including the XSD built-ins
    pub fn resolve_named_type(&self, qname: &QName) -> Result<TypeDef> {
        if qname.is_in(XSD_NAMESPACE) {
            if qname.local_name == XSD_ANY_TYPE {
                return Ok(TypeDef::AnyType);
            }
            if let Some(builtin) = get_builtin_type(&qname.local_name) {
                return Ok(TypeDef::Simple(Arc::new(XsdSimpleType::Builtin(builtin))));
            }
        }
        self.lookup_type(qname)
            .cloned()
            .ok_or_else(|| Error::Schema(format!("Type '{}' is not defined", qname)))
    }

    /// Resolve a type reference
    pub fn resolve_type(&self, type_ref: &TypeRef) -> Result<TypeDef> {
        match type_ref {
            TypeRef::Named(qname) => self.resolve_named_type(qname),
            TypeRef::Simple(simple) => Ok(TypeDef::Simple(simple.clone())),
            TypeRef::Complex(complex) => Ok(TypeDef::Complex(complex.clone())),
        }
    }

    /// Validate an XML document against this schema
    ///
    /// Returns the diagnostics found in the document. An `Err` means the
    /// schema itself could not be applied (broken reference, limit hit).
    pub fn validate(&self, doc: &Document) -> Result<ValidationResult> {
        self.validate_with_mode(doc, self.validation)
    }

    /// Validate an XML document with a specific validation mode
    pub fn validate_with_mode(&self, doc: &Document, mode: ValidationMode) -> Result<ValidationResult> {
        let mut context = ValidationContext::new().with_mode(mode);
        validate_document(self, doc, &mut context)?;

        if context.has_errors() {
            Ok(ValidationResult::invalid(context.into_errors()))
        } else {
            Ok(ValidationResult::valid())
        }
    }

    /// Check if an XML document is valid against this schema
    pub fn is_valid(&self, doc: &Document) -> Result<bool> {
        Ok(self.validate(doc)?.valid)
    }

    /// Parse an XML string with this schema's limits and validate it
    pub fn validate_string(&self, xml: &str) -> Result<ValidationResult> {
        let doc = Document::from_string_with_limits(xml, &self.limits)?;
        self.validate(&doc)
    }

    /// Check that every named reference between components resolves
    pub(crate) fn check_references(&self) -> Result<()> {
        for element in self.elements.values() {
            self.check_type_ref(&element.type_ref)?;
        }
        for type_def in self.types.values() {
            match type_def {
                TypeDef::Simple(simple) => self.check_simple(simple)?,
                TypeDef::Complex(complex) => self.check_complex(complex)?,
                TypeDef::AnyType => {}
            }
        }
        for group in self.groups.values() {
            self.check_group(group)?;
        }
        for group in self.attribute_groups.values() {
            self.check_attribute_items(&group.items)?;
        }
        for attribute in self.attributes.values() {
            self.check_attribute(attribute)?;
        }
        Ok(())
    }

    fn check_type_ref(&self, type_ref: &TypeRef) -> Result<()> {
        match type_ref {
            TypeRef::Named(qname) => self.resolve_named_type(qname).map(|_| ()),
            TypeRef::Simple(simple) => self.check_simple(simple),
            TypeRef::Complex(complex) => self.check_complex(complex),
        }
    }

    fn check_simple(&self, simple: &XsdSimpleType) -> Result<()> {
        match simple {
            XsdSimpleType::Builtin(_) => Ok(()),
            XsdSimpleType::Restriction { base, .. } => self.check_type_ref(base),
            XsdSimpleType::List { item, .. } => self.check_type_ref(item),
            XsdSimpleType::Union { members, .. } => {
                members.iter().try_for_each(|m| self.check_type_ref(m))
            }
        }
    }

    fn check_complex(&self, complex: &XsdComplexType) -> Result<()> {
        match &complex.content {
            ComplexContent::Group(particle) => {
                if let Some(particle) = particle {
                    self.check_particle(particle)?;
                }
            }
            ComplexContent::Complex { base, particle, .. } => {
                self.resolve_named_type(base)?;
                if let Some(particle) = particle {
                    self.check_particle(particle)?;
                }
            }
            ComplexContent::Simple {
                base, simple_type, ..
            } => {
                self.resolve_named_type(base)?;
                if let Some(simple_type) = simple_type {
                    self.check_type_ref(simple_type)?;
                }
            }
        }
        self.check_attribute_items(&complex.attributes)
    }

    fn check_group(&self, group: &XsdGroup) -> Result<()> {
        group.particles.iter().try_for_each(|p| self.check_particle(p))
    }

    fn check_particle(&self, particle: &Particle) -> Result<()> {
        match &particle.term {
            GroupParticle::Element(element) => self.check_type_ref(&element.type_ref),
            GroupParticle::ElementRef(name) => self
                .lookup_element(name)
                .map(|_| ())
                .ok_or_else(|| Error::Schema(format!("Element '{}' is not declared", name))),
            GroupParticle::Group(group) => self.check_group(group),
            GroupParticle::GroupRef(name) => self
                .lookup_group(name)
                .map(|_| ())
                .ok_or_else(|| Error::Schema(format!("Group '{}' is not defined", name))),
            GroupParticle::Any(_) => Ok(()),
        }
    }

    fn check_attribute_items(&self, items: &[AttributeItem]) -> Result<()> {
        for item in items {
            match item {
                AttributeItem::Local { decl, .. } => self.check_attribute(decl)?,
                AttributeItem::Ref { name, .. } => {
                    if self.lookup_attribute(name).is_none() {
                        return Err(Error::Schema(format!("Attribute '{}' is not declared", name)));
                    }
                }
                AttributeItem::GroupRef(name) => {
                    if self.lookup_attribute_group(name).is_none() {
                        return Err(Error::Schema(format!(
                            "Attribute group '{}' is not defined",
                            name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_attribute(&self, attribute: &XsdAttribute) -> Result<()> {
        match attribute.type_ref {
            Some(ref type_ref) => self.check_type_ref(type_ref),
            None => Ok(()),
        }
    }
}
