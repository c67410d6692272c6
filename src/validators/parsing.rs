//! XSD Document Parsing
//!
//! This module builds an [`XsdSchema`] from a parsed schema document. Only
//! elements in the XSD namespace are schema components; annotations are
//! skipped wherever they may appear.

use std::sync::Arc;

use super::attributes::{AttributeItem, AttributeUse, XsdAttribute, XsdAttributeGroup};
use super::complex_types::{ComplexContent, DerivationMethod, XsdComplexType};
use super::elements::{ElementForm, ValueConstraint, XsdElement};
use super::facets::{Facets, PatternFacet};
use super::groups::{GroupParticle, ModelType, Particle, XsdGroup};
use super::particles::Occurs;
use super::schemas::{TypeDef, TypeRef, XsdSchema};
use super::simple_types::XsdSimpleType;
use super::wildcards::Wildcard;

use crate::documents::{Document, Element};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::QName;
use crate::XSD_NAMESPACE;

/// XSD element local names
mod xsd_elements {
    pub const SCHEMA: &str = "schema";
    pub const ELEMENT: &str = "element";
    pub const COMPLEX_TYPE: &str = "complexType";
    pub const SIMPLE_TYPE: &str = "simpleType";
    pub const ATTRIBUTE: &str = "attribute";
    pub const ATTRIBUTE_GROUP: &str = "attributeGroup";
    pub const GROUP: &str = "group";
    pub const SEQUENCE: &str = "sequence";
    pub const CHOICE: &str = "choice";
    pub const ALL: &str = "all";
    pub const ANNOTATION: &str = "annotation";
    pub const IMPORT: &str = "import";
    pub const INCLUDE: &str = "include";
    pub const REDEFINE: &str = "redefine";
    pub const RESTRICTION: &str = "restriction";
    pub const EXTENSION: &str = "extension";
    pub const LIST: &str = "list";
    pub const UNION: &str = "union";
    pub const COMPLEX_CONTENT: &str = "complexContent";
    pub const SIMPLE_CONTENT: &str = "simpleContent";
    pub const ANY: &str = "any";
    pub const ANY_ATTRIBUTE: &str = "anyAttribute";
    pub const NOTATION: &str = "notation";
    pub const UNIQUE: &str = "unique";
    pub const KEY: &str = "key";
    pub const KEYREF: &str = "keyref";
    // Facets
    pub const PATTERN: &str = "pattern";
    pub const ENUMERATION: &str = "enumeration";
    pub const WHITE_SPACE: &str = "whiteSpace";
    pub const LENGTH: &str = "length";
    pub const MIN_LENGTH: &str = "minLength";
    pub const MAX_LENGTH: &str = "maxLength";
    pub const MIN_INCLUSIVE: &str = "minInclusive";
    pub const MAX_INCLUSIVE: &str = "maxInclusive";
    pub const MIN_EXCLUSIVE: &str = "minExclusive";
    pub const MAX_EXCLUSIVE: &str = "maxExclusive";
    pub const TOTAL_DIGITS: &str = "totalDigits";
    pub const FRACTION_DIGITS: &str = "fractionDigits";
}

/// XSD attribute names
mod xsd_attrs {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const REF: &str = "ref";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const ELEMENT_FORM_DEFAULT: &str = "elementFormDefault";
    pub const ATTRIBUTE_FORM_DEFAULT: &str = "attributeFormDefault";
    pub const FORM: &str = "form";
    pub const NILLABLE: &str = "nillable";
    pub const DEFAULT: &str = "default";
    pub const FIXED: &str = "fixed";
    pub const BASE: &str = "base";
    pub const VALUE: &str = "value";
    pub const MIXED: &str = "mixed";
    pub const ABSTRACT: &str = "abstract";
    pub const NAMESPACE: &str = "namespace";
    pub const PROCESS_CONTENTS: &str = "processContents";
    pub const ITEM_TYPE: &str = "itemType";
    pub const MEMBER_TYPES: &str = "memberTypes";
    pub const MIN_OCCURS: &str = "minOccurs";
    pub const MAX_OCCURS: &str = "maxOccurs";
    pub const USE: &str = "use";
}

use xsd_attrs as attrs;
use xsd_elements as tags;

impl XsdSchema {
    /// Parse an XSD schema from a string with default limits
    pub fn from_string(xsd: &str) -> Result<Self> {
        Self::from_string_with_limits(xsd, Limits::default())
    }

    /// Parse an XSD schema from a string
    pub fn from_string_with_limits(xsd: &str, limits: Limits) -> Result<Self> {
        let doc = Document::from_string_with_limits(xsd, &limits)?;
        Self::from_document_with_limits(&doc, limits)
    }

    /// Parse an XSD schema from a parsed Document
    pub fn from_document(doc: &Document) -> Result<Self> {
        Self::from_document_with_limits(doc, Limits::default())
    }

    /// Parse an XSD schema from a parsed Document with explicit limits
    pub fn from_document_with_limits(doc: &Document, limits: Limits) -> Result<Self> {
        let root = &doc.root;
        if !is_xsd(root, tags::SCHEMA) {
            return Err(Error::Schema(format!(
                "Expected xs:schema root element, got {}",
                root.qname
            )));
        }

        let mut schema = XsdSchema::new();
        schema.limits = limits;
        parse_schema_element(&mut schema, root)?;
        schema.check_references()?;
        Ok(schema)
    }
}

/// Parse the xs:schema root element
fn parse_schema_element(schema: &mut XsdSchema, elem: &Element) -> Result<()> {
    schema.target_namespace = elem
        .get_attribute(attrs::TARGET_NAMESPACE)
        .filter(|ns| !ns.is_empty())
        .map(String::from);
    if let Some(form) = elem.get_attribute(attrs::ELEMENT_FORM_DEFAULT) {
        schema.element_form_default = form.parse()?;
    }
    if let Some(form) = elem.get_attribute(attrs::ATTRIBUTE_FORM_DEFAULT) {
        schema.attribute_form_default = form.parse()?;
    }

    for child in &elem.children {
        parse_schema_child(schema, child)?;
    }
    Ok(())
}

/// Parse one top-level schema component
fn parse_schema_child(schema: &mut XsdSchema, elem: &Element) -> Result<()> {
    if !elem.qname.is_in(XSD_NAMESPACE) {
        return Err(unexpected(elem, "xs:schema"));
    }
    match elem.local_name() {
        tags::ANNOTATION | tags::NOTATION => Ok(()),
        tags::ELEMENT => {
            let element = parse_element_decl(schema, elem, true)?;
            let name = element.name.clone();
            insert_unique(&mut schema.elements, name, Arc::new(element), "element")
        }
        tags::COMPLEX_TYPE => {
            let name = global_name(schema, elem)?;
            let complex = parse_complex_type(schema, elem, Some(name.clone()))?;
            insert_unique(&mut schema.types, name, TypeDef::Complex(Arc::new(complex)), "type")
        }
        tags::SIMPLE_TYPE => {
            let name = global_name(schema, elem)?;
            let simple = parse_simple_type(schema, elem, Some(name.clone()))?;
            insert_unique(&mut schema.types, name, TypeDef::Simple(Arc::new(simple)), "type")
        }
        tags::GROUP => {
            let name = global_name(schema, elem)?;
            let group = parse_named_group(schema, elem)?;
            insert_unique(&mut schema.groups, name, group, "group")
        }
        tags::ATTRIBUTE_GROUP => {
            let name = global_name(schema, elem)?;
            let (items, any_attribute) = parse_attribute_items(schema, elem.children.iter())?;
            let group = XsdAttributeGroup {
                name: name.clone(),
                items,
                any_attribute,
            };
            insert_unique(&mut schema.attribute_groups, name, group, "attribute group")
        }
        tags::ATTRIBUTE => {
            let attribute = parse_attribute_decl(schema, elem, true)?;
            let name = attribute.name.clone();
            insert_unique(&mut schema.attributes, name, attribute, "attribute")
        }
        tags::IMPORT | tags::INCLUDE | tags::REDEFINE => Err(Error::Schema(format!(
            "xs:{} is not supported; the schema must be self-contained",
            elem.local_name()
        ))),
        _ => Err(unexpected(elem, "xs:schema")),
    }
}

fn insert_unique<V>(
    map: &mut indexmap::IndexMap<QName, V>,
    name: QName,
    value: V,
    kind: &str,
) -> Result<()> {
    if map.contains_key(&name) {
        return Err(Error::Schema(format!("Duplicate global {} '{}'", kind, name)));
    }
    map.insert(name, value);
    Ok(())
}

/// Parse an element declaration (global or local, not a reference)
fn parse_element_decl(schema: &XsdSchema, elem: &Element, global: bool) -> Result<XsdElement> {
    let local_name = required(elem, attrs::NAME)?;
    let qualified = global || form(elem, schema.element_form_default)? == ElementForm::Qualified;
    let name = qualify(schema, local_name, qualified);

    let inline = elem.children.iter().find(|c| {
        is_xsd(c, tags::SIMPLE_TYPE) || is_xsd(c, tags::COMPLEX_TYPE)
    });
    let type_ref = match (elem.get_attribute(attrs::TYPE), inline) {
        (Some(_), Some(_)) => {
            return Err(Error::Schema(format!(
                "Element '{}' has both a 'type' attribute and an inline type",
                name
            )))
        }
        (Some(type_name), None) => TypeRef::Named(resolve_qname(elem, type_name)?),
        (None, Some(child)) => inline_type(schema, child)?,
        (None, None) => TypeRef::any_type(),
    };

    for child in &elem.children {
        if !(is_xsd(child, tags::ANNOTATION)
            || is_xsd(child, tags::SIMPLE_TYPE)
            || is_xsd(child, tags::COMPLEX_TYPE)
            || is_xsd(child, tags::UNIQUE)
            || is_xsd(child, tags::KEY)
            || is_xsd(child, tags::KEYREF))
        {
            return Err(unexpected(child, "xs:element"));
        }
    }

    let mut element = XsdElement::new(name, type_ref);
    element.nillable = boolean(elem, attrs::NILLABLE)?;
    element.is_abstract = boolean(elem, attrs::ABSTRACT)?;
    element.constraint = ValueConstraint::from_attributes(
        elem.get_attribute(attrs::DEFAULT),
        elem.get_attribute(attrs::FIXED),
    )?;
    Ok(element)
}

fn inline_type(schema: &XsdSchema, child: &Element) -> Result<TypeRef> {
    if is_xsd(child, tags::SIMPLE_TYPE) {
        Ok(TypeRef::Simple(Arc::new(parse_simple_type(schema, child, None)?)))
    } else {
        Ok(TypeRef::Complex(Arc::new(parse_complex_type(schema, child, None)?)))
    }
}

/// Parse a complexType definition
fn parse_complex_type(schema: &XsdSchema, elem: &Element, name: Option<QName>) -> Result<XsdComplexType> {
    let mut children = significant_children(elem).peekable();
    let mixed = boolean(elem, attrs::MIXED)?;

    let mut complex = match children.peek().copied() {
        Some(first) if is_xsd(first, tags::SIMPLE_CONTENT) => {
            let content = parse_simple_content(schema, first)?;
            children.next();
            content
        }
        Some(first) if is_xsd(first, tags::COMPLEX_CONTENT) => {
            let mut content = parse_complex_content(schema, first)?;
            if first.get_attribute(attrs::MIXED).is_none() {
                content.mixed = mixed;
            }
            children.next();
            content
        }
        _ => {
            let particle = match children.peek().copied() {
                Some(first) if is_particle_group(first) => {
                    let particle = parse_particle(schema, first)?;
                    children.next();
                    Some(particle)
                }
                _ => None,
            };
            let (attributes, any_attribute) = parse_attribute_items(schema, &mut children)?;
            let mut complex = XsdComplexType::new(None, ComplexContent::Group(particle));
            complex.mixed = mixed;
            complex.attributes = attributes;
            complex.any_attribute = any_attribute;
            complex
        }
    };

    if let Some(extra) = children.next() {
        return Err(unexpected(extra, "xs:complexType"));
    }

    complex.name = name;
    complex.is_abstract = boolean(elem, attrs::ABSTRACT)?;
    Ok(complex)
}

/// Parse xs:simpleContent
fn parse_simple_content(schema: &XsdSchema, elem: &Element) -> Result<XsdComplexType> {
    let derivation = single_child(elem, "xs:simpleContent")?;
    let method = derivation_method(derivation)?;
    let base = resolve_qname(derivation, required(derivation, attrs::BASE)?)?;

    let mut facets = Facets::new();
    let mut simple_type = None;
    let mut rest = Vec::new();
    for child in significant_children(derivation) {
        if method == DerivationMethod::Restriction && is_xsd(child, tags::SIMPLE_TYPE) {
            simple_type = Some(TypeRef::Simple(Arc::new(parse_simple_type(schema, child, None)?)));
        } else if method == DerivationMethod::Restriction && is_facet(child) {
            add_facet(&mut facets, child)?;
        } else {
            rest.push(child);
        }
    }
    let (attributes, any_attribute) = parse_attribute_items(schema, rest.into_iter())?;

    let mut complex = XsdComplexType::new(
        None,
        ComplexContent::Simple {
            method,
            base,
            facets,
            simple_type,
        },
    );
    complex.attributes = attributes;
    complex.any_attribute = any_attribute;
    Ok(complex)
}

/// Parse xs:complexContent
fn parse_complex_content(schema: &XsdSchema, elem: &Element) -> Result<XsdComplexType> {
    let derivation = single_child(elem, "xs:complexContent")?;
    let method = derivation_method(derivation)?;
    let base = resolve_qname(derivation, required(derivation, attrs::BASE)?)?;

    let mut children = significant_children(derivation).peekable();
    let particle = match children.peek().copied() {
        Some(first) if is_particle_group(first) => {
            let particle = parse_particle(schema, first)?;
            children.next();
            Some(particle)
        }
        _ => None,
    };
    let (attributes, any_attribute) = parse_attribute_items(schema, children)?;

    let mut complex = XsdComplexType::new(
        None,
        ComplexContent::Complex {
            method,
            base,
            particle,
        },
    );
    complex.mixed = boolean(elem, attrs::MIXED)?;
    complex.attributes = attributes;
    complex.any_attribute = any_attribute;
    Ok(complex)
}

fn derivation_method(elem: &Element) -> Result<DerivationMethod> {
    if is_xsd(elem, tags::EXTENSION) {
        Ok(DerivationMethod::Extension)
    } else if is_xsd(elem, tags::RESTRICTION) {
        Ok(DerivationMethod::Restriction)
    } else {
        Err(unexpected(elem, "content derivation"))
    }
}

/// Parse xs:sequence, xs:choice, xs:all, xs:group ref, xs:element or xs:any
fn parse_particle(schema: &XsdSchema, elem: &Element) -> Result<Particle> {
    let occurs = Occurs::parse(
        elem.get_attribute(attrs::MIN_OCCURS),
        elem.get_attribute(attrs::MAX_OCCURS),
    )?;

    let term = match elem.local_name() {
        _ if !elem.qname.is_in(XSD_NAMESPACE) => return Err(unexpected(elem, "a model group")),
        tags::ELEMENT => match elem.get_attribute(attrs::REF) {
            Some(reference) => GroupParticle::ElementRef(resolve_qname(elem, reference)?),
            None => GroupParticle::Element(Arc::new(parse_element_decl(schema, elem, false)?)),
        },
        tags::SEQUENCE | tags::CHOICE | tags::ALL => GroupParticle::Group(parse_model_group(schema, elem)?),
        tags::GROUP => GroupParticle::GroupRef(resolve_qname(elem, required(elem, attrs::REF)?)?),
        tags::ANY => GroupParticle::Any(Wildcard::parse(
            elem.get_attribute(attrs::NAMESPACE),
            elem.get_attribute(attrs::PROCESS_CONTENTS),
            schema.target_namespace.as_deref(),
        )?),
        _ => return Err(unexpected(elem, "a model group")),
    };
    Ok(Particle::new(occurs, term))
}

/// Parse a compositor and its particles
fn parse_model_group(schema: &XsdSchema, elem: &Element) -> Result<XsdGroup> {
    let model = ModelType::from_tag(elem.local_name())
        .ok_or_else(|| unexpected(elem, "a model group"))?;
    let mut group = XsdGroup::new(model);
    for child in significant_children(elem) {
        let particle = parse_particle(schema, child)?;
        if model == ModelType::All && !matches!(particle.term, GroupParticle::Element(_) | GroupParticle::ElementRef(_)) {
            return Err(Error::Schema("xs:all may only contain element declarations".to_string()));
        }
        group.particles.push(particle);
    }
    Ok(group)
}

/// Parse a named xs:group definition
fn parse_named_group(schema: &XsdSchema, elem: &Element) -> Result<XsdGroup> {
    let compositor = single_child(elem, "xs:group")?;
    if ModelType::from_tag(compositor.local_name()).is_none() {
        return Err(unexpected(compositor, "xs:group"));
    }
    parse_model_group(schema, compositor)
}

/// Parse attribute uses, attribute group references and an optional wildcard
fn parse_attribute_items<'a>(
    schema: &XsdSchema,
    children: impl Iterator<Item = &'a Element>,
) -> Result<(Vec<AttributeItem>, Option<Wildcard>)> {
    let mut items = Vec::new();
    let mut any_attribute = None;
    for child in children {
        if is_xsd(child, tags::ANNOTATION) {
            continue;
        }
        if any_attribute.is_some() {
            return Err(unexpected(child, "attribute declarations (after xs:anyAttribute)"));
        }
        if is_xsd(child, tags::ATTRIBUTE) {
            let usage: AttributeUse = match child.get_attribute(attrs::USE) {
                Some(value) => value.parse()?,
                None => AttributeUse::Optional,
            };
            match child.get_attribute(attrs::REF) {
                Some(reference) => items.push(AttributeItem::Ref {
                    name: resolve_qname(child, reference)?,
                    usage,
                    constraint: ValueConstraint::from_attributes(
                        child.get_attribute(attrs::DEFAULT),
                        child.get_attribute(attrs::FIXED),
                    )?,
                }),
                None => items.push(AttributeItem::Local {
                    decl: parse_attribute_decl(schema, child, false)?,
                    usage,
                }),
            }
        } else if is_xsd(child, tags::ATTRIBUTE_GROUP) {
            items.push(AttributeItem::GroupRef(resolve_qname(
                child,
                required(child, attrs::REF)?,
            )?));
        } else if is_xsd(child, tags::ANY_ATTRIBUTE) {
            any_attribute = Some(Wildcard::parse(
                child.get_attribute(attrs::NAMESPACE),
                child.get_attribute(attrs::PROCESS_CONTENTS),
                schema.target_namespace.as_deref(),
            )?);
        } else {
            return Err(unexpected(child, "attribute declarations"));
        }
    }
    Ok((items, any_attribute))
}

/// Parse an attribute declaration (global or local, not a reference)
fn parse_attribute_decl(schema: &XsdSchema, elem: &Element, global: bool) -> Result<XsdAttribute> {
    let local_name = required(elem, attrs::NAME)?;
    let qualified = global || form(elem, schema.attribute_form_default)? == ElementForm::Qualified;
    let mut attribute = XsdAttribute::new(qualify(schema, local_name, qualified));

    let inline = significant_children(elem).next();
    attribute.type_ref = match (elem.get_attribute(attrs::TYPE), inline) {
        (Some(type_name), None) => Some(TypeRef::Named(resolve_qname(elem, type_name)?)),
        (None, Some(child)) if is_xsd(child, tags::SIMPLE_TYPE) => {
            Some(TypeRef::Simple(Arc::new(parse_simple_type(schema, child, None)?)))
        }
        (None, None) => None,
        (_, Some(child)) => return Err(unexpected(child, "xs:attribute")),
    };
    attribute.constraint = ValueConstraint::from_attributes(
        elem.get_attribute(attrs::DEFAULT),
        elem.get_attribute(attrs::FIXED),
    )?;
    Ok(attribute)
}

/// Parse a simpleType definition
fn parse_simple_type(schema: &XsdSchema, elem: &Element, name: Option<QName>) -> Result<XsdSimpleType> {
    let derivation = single_child(elem, "xs:simpleType")?;
    if !derivation.qname.is_in(XSD_NAMESPACE) {
        return Err(unexpected(derivation, "xs:simpleType"));
    }

    match derivation.local_name() {
        tags::RESTRICTION => {
            let mut facets = Facets::new();
            let mut inline_base = None;
            for child in significant_children(derivation) {
                if is_xsd(child, tags::SIMPLE_TYPE) && inline_base.is_none() {
                    inline_base = Some(TypeRef::Simple(Arc::new(parse_simple_type(schema, child, None)?)));
                } else if is_facet(child) {
                    add_facet(&mut facets, child)?;
                } else {
                    return Err(unexpected(child, "xs:restriction"));
                }
            }
            let base = match (derivation.get_attribute(attrs::BASE), inline_base) {
                (Some(base), None) => TypeRef::Named(resolve_qname(derivation, base)?),
                (None, Some(inline)) => inline,
                _ => {
                    return Err(Error::Schema(
                        "xs:restriction needs exactly one of a 'base' attribute or an inline xs:simpleType"
                            .to_string(),
                    ))
                }
            };
            Ok(XsdSimpleType::Restriction { name, base, facets })
        }
        tags::LIST => {
            let inline = significant_children(derivation).next();
            let item = match (derivation.get_attribute(attrs::ITEM_TYPE), inline) {
                (Some(item), None) => TypeRef::Named(resolve_qname(derivation, item)?),
                (None, Some(child)) if is_xsd(child, tags::SIMPLE_TYPE) => {
                    TypeRef::Simple(Arc::new(parse_simple_type(schema, child, None)?))
                }
                _ => {
                    return Err(Error::Schema(
                        "xs:list needs exactly one of an 'itemType' attribute or an inline xs:simpleType"
                            .to_string(),
                    ))
                }
            };
            Ok(XsdSimpleType::List { name, item })
        }
        tags::UNION => {
            let mut members = Vec::new();
            if let Some(member_types) = derivation.get_attribute(attrs::MEMBER_TYPES) {
                for member in member_types.split_whitespace() {
                    members.push(TypeRef::Named(resolve_qname(derivation, member)?));
                }
            }
            for child in significant_children(derivation) {
                if !is_xsd(child, tags::SIMPLE_TYPE) {
                    return Err(unexpected(child, "xs:union"));
                }
                members.push(TypeRef::Simple(Arc::new(parse_simple_type(schema, child, None)?)));
            }
            if members.is_empty() {
                return Err(Error::Schema("xs:union has no member types".to_string()));
            }
            Ok(XsdSimpleType::Union { name, members })
        }
        _ => Err(unexpected(derivation, "xs:simpleType")),
    }
}

fn is_facet(elem: &Element) -> bool {
    elem.qname.is_in(XSD_NAMESPACE)
        && matches!(
            elem.local_name(),
            tags::PATTERN
                | tags::ENUMERATION
                | tags::WHITE_SPACE
                | tags::LENGTH
                | tags::MIN_LENGTH
                | tags::MAX_LENGTH
                | tags::MIN_INCLUSIVE
                | tags::MAX_INCLUSIVE
                | tags::MIN_EXCLUSIVE
                | tags::MAX_EXCLUSIVE
                | tags::TOTAL_DIGITS
                | tags::FRACTION_DIGITS
        )
}

/// Add one facet element to a facet set
fn add_facet(facets: &mut Facets, elem: &Element) -> Result<()> {
    let value = required(elem, attrs::VALUE)?;
    let number = |value: &str| -> Result<usize> {
        value.trim().parse::<usize>().map_err(|_| {
            Error::Schema(format!(
                "Invalid value '{}' for facet xs:{}",
                value,
                elem.local_name()
            ))
        })
    };

    match elem.local_name() {
        tags::PATTERN => facets.patterns.push(PatternFacet::new(value)?),
        tags::ENUMERATION => facets
            .enumeration
            .get_or_insert_with(Vec::new)
            .push(value.to_string()),
        tags::WHITE_SPACE => facets.white_space = Some(value.trim().parse()?),
        tags::LENGTH => facets.length = Some(number(value)?),
        tags::MIN_LENGTH => facets.min_length = Some(number(value)?),
        tags::MAX_LENGTH => facets.max_length = Some(number(value)?),
        tags::MIN_INCLUSIVE => facets.min_inclusive = Some(value.to_string()),
        tags::MAX_INCLUSIVE => facets.max_inclusive = Some(value.to_string()),
        tags::MIN_EXCLUSIVE => facets.min_exclusive = Some(value.to_string()),
        tags::MAX_EXCLUSIVE => facets.max_exclusive = Some(value.to_string()),
        tags::TOTAL_DIGITS => facets.total_digits = Some(number(value)? as u32),
        tags::FRACTION_DIGITS => facets.fraction_digits = Some(number(value)? as u32),
        _ => return Err(unexpected(elem, "facets")),
    }
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn is_xsd(elem: &Element, local_name: &str) -> bool {
    elem.qname.is_in(XSD_NAMESPACE) && elem.local_name() == local_name
}

fn is_particle_group(elem: &Element) -> bool {
    [tags::SEQUENCE, tags::CHOICE, tags::ALL, tags::GROUP]
        .iter()
        .any(|tag| is_xsd(elem, tag))
}

/// Children other than annotations
fn significant_children(elem: &Element) -> impl Iterator<Item = &Element> {
    elem.children.iter().filter(|c| !is_xsd(c, tags::ANNOTATION))
}

/// The only non-annotation child of an element
fn single_child<'a>(elem: &'a Element, context: &str) -> Result<&'a Element> {
    let mut children = significant_children(elem);
    match (children.next(), children.next()) {
        (Some(child), None) => Ok(child),
        (None, _) => Err(Error::Schema(format!("{} must have content (line {})", context, elem.line))),
        (Some(_), Some(extra)) => Err(unexpected(extra, context)),
    }
}

fn required<'a>(elem: &'a Element, name: &str) -> Result<&'a str> {
    elem.get_attribute(name).ok_or_else(|| {
        Error::Schema(format!(
            "xs:{} at line {} is missing the '{}' attribute",
            elem.local_name(),
            elem.line,
            name
        ))
    })
}

fn boolean(elem: &Element, name: &str) -> Result<bool> {
    match elem.get_attribute(name).map(str::trim) {
        None | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => Err(Error::Schema(format!(
            "Invalid boolean '{}' for attribute '{}'",
            other, name
        ))),
    }
}

fn form(elem: &Element, default: ElementForm) -> Result<ElementForm> {
    match elem.get_attribute(attrs::FORM) {
        Some(value) => value.parse(),
        None => Ok(default),
    }
}

fn qualify(schema: &XsdSchema, local_name: &str, qualified: bool) -> QName {
    match (&schema.target_namespace, qualified) {
        (Some(ns), true) => QName::namespaced(ns.clone(), local_name),
        _ => QName::local(local_name),
    }
}

fn global_name(schema: &XsdSchema, elem: &Element) -> Result<QName> {
    Ok(qualify(schema, required(elem, attrs::NAME)?, true))
}

/// Resolve a QName-valued attribute against the namespaces in scope
fn resolve_qname(elem: &Element, value: &str) -> Result<QName> {
    elem.namespaces.resolve(value.trim()).map_err(|_| {
        Error::Schema(format!(
            "The QName value '{}' at line {} has an undeclared prefix",
            value, elem.line
        ))
    })
}

fn unexpected(elem: &Element, context: &str) -> Error {
    Error::Schema(format!(
        "Unexpected element '{}' in {} (line {}, column {})",
        elem.qname, context, elem.line, elem.column
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::complex_types::ContentType;

    #[test]
    fn test_parse_simple_schema() {
        let xsd = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:annotation><xs:documentation>Flavors</xs:documentation></xs:annotation>
    <xs:element name="list">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="flavor" type="xs:string" maxOccurs="unbounded"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;
        let schema = XsdSchema::from_string(xsd).unwrap();
        assert_eq!(schema.elements.len(), 1);
        let list = schema.lookup_element(&QName::local("list")).unwrap();
        assert!(matches!(list.type_ref, TypeRef::Complex(_)));
    }

    #[test]
    fn test_target_namespace_and_forms() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                xmlns:tns="urn:test" targetNamespace="urn:test" elementFormDefault="qualified">
            <xs:complexType name="itemType">
                <xs:sequence>
                    <xs:element name="qualified" type="xs:string"/>
                    <xs:element name="plain" type="xs:string" form="unqualified"/>
                </xs:sequence>
                <xs:attribute name="id" type="xs:string"/>
            </xs:complexType>
            <xs:element name="item" type="tns:itemType"/>
        </xs:schema>"#;
        let schema = XsdSchema::from_string(xsd).unwrap();
        assert_eq!(schema.target_namespace.as_deref(), Some("urn:test"));
        assert!(schema.lookup_element(&QName::namespaced("urn:test", "item")).is_some());

        let item_type = match schema.lookup_type(&QName::namespaced("urn:test", "itemType")) {
            Some(TypeDef::Complex(c)) => c.clone(),
            other => panic!("unexpected {:?}", other),
        };
        let effective = item_type.effective(&schema).unwrap();
        match effective.content {
            ContentType::Elements { particle: Some(ref particle), .. } => match particle.term {
                GroupParticle::Group(ref group) => {
                    let names: Vec<QName> = group
                        .particles
                        .iter()
                        .map(|p| match p.term {
                            GroupParticle::Element(ref e) => e.name.clone(),
                            _ => panic!("unexpected particle"),
                        })
                        .collect();
                    assert_eq!(
                        names,
                        vec![QName::namespaced("urn:test", "qualified"), QName::local("plain")]
                    );
                }
                _ => panic!("unexpected term"),
            },
            ref other => panic!("unexpected content {:?}", other),
        }
        // Local attributes stay unqualified by default
        assert!(effective.attributes.attributes.contains_key(&QName::local("id")));
    }

    #[test]
    fn test_facets_are_collected() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:simpleType name="color">
                <xs:restriction base="xs:string">
                    <xs:enumeration value="red"/>
                    <xs:enumeration value="green"/>
                    <xs:pattern value="[a-z]+"/>
                    <xs:maxLength value="10"/>
                </xs:restriction>
            </xs:simpleType>
        </xs:schema>"#;
        let schema = XsdSchema::from_string(xsd).unwrap();
        match schema.lookup_type(&QName::local("color")) {
            Some(TypeDef::Simple(simple)) => match simple.as_ref() {
                XsdSimpleType::Restriction { facets, .. } => {
                    assert_eq!(facets.enumeration.as_ref().map(Vec::len), Some(2));
                    assert_eq!(facets.patterns.len(), 1);
                    assert_eq!(facets.max_length, Some(10));
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_schema_errors() {
        for xsd in [
            // Not a schema
            r#"<root/>"#,
            // Unknown built-in type
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><xs:element name="a" type="xs:strin"/></xs:schema>"#,
            // Bad occurrence bounds
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><xs:element name="a"><xs:complexType><xs:sequence><xs:element name="b" minOccurs="2" maxOccurs="1"/></xs:sequence></xs:complexType></xs:element></xs:schema>"#,
            // Invalid pattern
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><xs:simpleType name="t"><xs:restriction base="xs:string"><xs:pattern value="(["/></xs:restriction></xs:simpleType></xs:schema>"#,
            // Unknown schema element
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><xs:elemnt name="a"/></xs:schema>"#,
            // Undeclared prefix in a QName value
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><xs:element name="a" type="zz:t"/></xs:schema>"#,
            // Duplicate global element
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><xs:element name="a"/><xs:element name="a"/></xs:schema>"#,
            // Imports are not supported
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><xs:import namespace="urn:x"/></xs:schema>"#,
        ] {
            let result = XsdSchema::from_string(xsd);
            assert!(matches!(result, Err(Error::Schema(_))), "{} -> {:?}", xsd, result);
        }
    }

    #[test]
    fn test_malformed_schema_is_an_xml_error() {
        let result = XsdSchema::from_string("<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\">");
        assert!(matches!(result, Err(Error::Xml(_))));
    }
}
