//! Document Validation
//!
//! This module implements XML document validation against XSD schemas.
//! It walks the instance tree, checks attributes and values, and matches
//! children against content models. Diagnostics use libxml2 wording and are
//! located at the start tag of the offending element.
//!
//! The walk keeps its own stack of pending tasks, so the nesting depth it
//! can handle is bounded by [`Limits::max_xml_depth`](crate::Limits) and not
//! by the size of the thread stack.

use std::sync::Arc;

use crate::documents::{Attribute, Document, Element};
use crate::error::{Error, Result};
use crate::XSI_NAMESPACE;

use super::attributes::{AttributeSet, XsdAttribute};
use super::builtins::XsdValue;
use super::complex_types::{ContentType, XsdComplexType};
use super::elements::{ValueConstraint, XsdElement};
use super::groups::Particle;
use super::models::{match_content, Binding, ContentMatch};
use super::schemas::{TypeDef, XsdSchema};
use super::simple_types::XsdSimpleType;
use super::validation::ValidationContext;
use super::wildcards::ProcessContents;

/// Pending step of the instance walk
enum Task<'d> {
    /// Validate an element against a declaration
    Element(&'d Element, Arc<XsdElement>),
    /// Validate an element matched by an `xs:any` wildcard
    Wildcard(&'d Element, ProcessContents),
    /// Lax assessment of an element without a declaration
    AnyContent(&'d Element),
    /// Diagnostic that follows the children of an element
    Report(&'d Element, String),
    /// Leave the level entered by an element
    ExitLevel,
}

/// Validate an XML document against the schema
pub fn validate_document(
    schema: &XsdSchema,
    doc: &Document,
    context: &mut ValidationContext,
) -> Result<()> {
    let root = &doc.root;
    match schema.lookup_element(&root.qname) {
        Some(decl) => validate_element(schema, root, decl, context),
        None => {
            context.report(
                root,
                format!(
                    "Element '{}': No matching global declaration available for the validation root.",
                    root.qname
                ),
            );
            Ok(())
        }
    }
}

/// Validate an XML element and its subtree against a declaration
///
/// Children are visited in document order, before the diagnostics that close
/// their parent (unexpected or missing children).
pub fn validate_element(
    schema: &XsdSchema,
    elem: &Element,
    decl: &Arc<XsdElement>,
    context: &mut ValidationContext,
) -> Result<()> {
    let mut tasks = vec![Task::Element(elem, Arc::clone(decl))];
    while let Some(task) = tasks.pop() {
        if context.should_stop() {
            break;
        }
        match task {
            Task::Element(elem, decl) => visit_element(schema, elem, &decl, context, &mut tasks)?,
            Task::Wildcard(child, process_contents) => {
                visit_wildcard_child(schema, child, process_contents, context, &mut tasks)
            }
            Task::AnyContent(elem) => {
                context.enter_level();
                tasks.push(Task::ExitLevel);
                schedule_any_children(schema, elem, &mut tasks);
            }
            Task::Report(elem, message) => context.report(elem, message),
            Task::ExitLevel => context.exit_level(),
        }
    }
    Ok(())
}

/// Check one element and schedule its children
fn visit_element<'d>(
    schema: &XsdSchema,
    elem: &'d Element,
    decl: &XsdElement,
    context: &mut ValidationContext,
    tasks: &mut Vec<Task<'d>>,
) -> Result<()> {
    if decl.is_abstract {
        context.report(
            elem,
            format!("Element '{}': The element declaration is abstract.", elem.qname),
        );
        return Ok(());
    }

    let type_def = match get_xsi_attribute(elem, "type") {
        Some(xsi_type) => match resolve_xsi_type(schema, elem, xsi_type) {
            Some(type_def) => type_def,
            None => {
                context.report(
                    elem,
                    format!(
                        "Element '{}', attribute 'xsi:type': The QName value '{}' of the xsi:type attribute does not resolve to a type definition.",
                        elem.qname, xsi_type
                    ),
                );
                return Ok(());
            }
        },
        None => schema.resolve_type(&decl.type_ref)?,
    };

    if let Some(nil) = get_xsi_attribute(elem, "nil") {
        match nil.trim() {
            "true" | "1" if !decl.nillable => {
                context.report(
                    elem,
                    format!("Element '{}': The element is not 'nillable'.", elem.qname),
                );
                return Ok(());
            }
            "true" | "1" => {
                if !elem.children.is_empty() || elem.has_significant_text() {
                    context.report(
                        elem,
                        format!(
                            "Element '{}': Element content is not allowed, because the element is 'nilled'.",
                            elem.qname
                        ),
                    );
                }
                return Ok(());
            }
            "false" | "0" => {}
            other => {
                context.report(
                    elem,
                    format!(
                        "Element '{}', attribute 'xsi:nil': '{}' is not a valid value of the atomic type 'xs:boolean'.",
                        elem.qname, other
                    ),
                );
                return Ok(());
            }
        }
    }

    context.enter_level();
    tasks.push(Task::ExitLevel);
    match type_def {
        TypeDef::Simple(simple) => {
            validate_simple_element(schema, elem, decl.constraint.as_ref(), &simple, context)
        }
        TypeDef::Complex(complex) => validate_complex_element(
            schema,
            elem,
            decl.constraint.as_ref(),
            &complex,
            context,
            tasks,
        ),
        TypeDef::AnyType => {
            schedule_any_children(schema, elem, tasks);
            Ok(())
        }
    }
}

/// Validate an element with simple type content
fn validate_simple_element(
    schema: &XsdSchema,
    elem: &Element,
    constraint: Option<&ValueConstraint>,
    simple: &XsdSimpleType,
    context: &mut ValidationContext,
) -> Result<()> {
    for attr in &elem.attributes {
        if !attr.qname.is_in(XSI_NAMESPACE) {
            report_not_allowed(elem, attr, context);
        }
    }

    if !elem.children.is_empty() {
        context.report(
            elem,
            format!(
                "Element '{}': Element content is not allowed, because the type definition is simple.",
                elem.qname
            ),
        );
        return Ok(());
    }
    validate_text_value(schema, elem, constraint, simple, context)
}

/// Validate an element with complex type content
fn validate_complex_element<'d>(
    schema: &XsdSchema,
    elem: &'d Element,
    constraint: Option<&ValueConstraint>,
    complex: &XsdComplexType,
    context: &mut ValidationContext,
    tasks: &mut Vec<Task<'d>>,
) -> Result<()> {
    if complex.is_abstract {
        context.report(
            elem,
            format!("Element '{}': The type definition is abstract.", elem.qname),
        );
        return Ok(());
    }

    let effective = complex.effective(schema)?;
    validate_attributes(schema, elem, &effective.attributes, context)?;

    match effective.content {
        ContentType::Empty => validate_empty_content(elem, context),
        ContentType::Simple(ref simple) => {
            if elem.children.is_empty() {
                validate_text_value(schema, elem, constraint, simple, context)?;
            } else {
                context.report(
                    elem,
                    format!(
                        "Element '{}': Element content is not allowed, because the content type is a simple type.",
                        elem.qname
                    ),
                );
            }
        }
        ContentType::Elements {
            ref particle,
            mixed,
        } => {
            if !mixed && elem.has_significant_text() {
                context.report(
                    elem,
                    format!(
                        "Element '{}': Character content other than whitespace is not allowed because the content type is 'element-only'.",
                        elem.qname
                    ),
                );
            }
            schedule_element_content(schema, elem, particle.as_ref(), tasks)?;
        }
    }
    Ok(())
}

/// Validate empty content (no text, no children)
fn validate_empty_content(elem: &Element, context: &mut ValidationContext) {
    if !elem.children.is_empty() {
        context.report(
            elem,
            format!(
                "Element '{}': Element content is not allowed, because the content type is empty.",
                elem.qname
            ),
        );
    } else if elem.has_significant_text() {
        context.report(
            elem,
            format!(
                "Element '{}': Character content is not allowed, because the content type is empty.",
                elem.qname
            ),
        );
    }
}

/// Validate the character data of an element against a simple type
fn validate_text_value(
    schema: &XsdSchema,
    elem: &Element,
    constraint: Option<&ValueConstraint>,
    simple: &XsdSimpleType,
    context: &mut ValidationContext,
) -> Result<()> {
    let text = elem.text_content();
    let value = match constraint {
        Some(constraint) if text.is_empty() => constraint.value(),
        _ => text,
    };

    let decoded = match simple.validate(value, schema) {
        Ok(decoded) => decoded,
        Err(Error::Value(message)) => {
            context.report(elem, format!("Element '{}': {}", elem.qname, message));
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if let Some(fixed) = constraint.and_then(ValueConstraint::fixed_value) {
        let expected = simple.validate(fixed, schema)?;
        if !same_value(&decoded, value, &expected, fixed) {
            context.report(
                elem,
                format!(
                    "Element '{}': The value '{}' does not match the fixed value constraint '{}'.",
                    elem.qname, value, fixed
                ),
            );
        }
    }
    Ok(())
}

/// Match children against the content model and schedule their validation
fn schedule_element_content<'d>(
    schema: &XsdSchema,
    elem: &'d Element,
    particle: Option<&Particle>,
    tasks: &mut Vec<Task<'d>>,
) -> Result<()> {
    match match_content(particle, &elem.children, schema)? {
        ContentMatch::Complete(bindings) => {
            schedule_bound_children(&elem.children, bindings, tasks);
        }
        ContentMatch::Unexpected {
            index,
            bindings,
            expected,
        } => {
            let child = &elem.children[index];
            tasks.push(Task::Report(
                child,
                format!(
                    "Element '{}': This element is not expected.{}",
                    child.qname,
                    expected_suffix(&expected)
                ),
            ));
            schedule_bound_children(&elem.children[..index], bindings, tasks);
        }
        ContentMatch::Incomplete { bindings, expected } => {
            tasks.push(Task::Report(
                elem,
                format!(
                    "Element '{}': Missing child element(s).{}",
                    elem.qname,
                    expected_suffix(&expected)
                ),
            ));
            schedule_bound_children(&elem.children, bindings, tasks);
        }
    }
    Ok(())
}

/// Schedule children against the declarations they were matched to
fn schedule_bound_children<'d>(
    children: &'d [Element],
    bindings: Vec<Binding>,
    tasks: &mut Vec<Task<'d>>,
) {
    let pending = children.iter().zip(bindings).map(|(child, binding)| match binding {
        Binding::Element(decl) => Task::Element(child, decl),
        Binding::Wildcard(process_contents) => Task::Wildcard(child, process_contents),
    });
    tasks.extend(pending.rev());
}

/// Handle an element matched by an `xs:any` wildcard
fn visit_wildcard_child<'d>(
    schema: &XsdSchema,
    child: &'d Element,
    process_contents: ProcessContents,
    context: &mut ValidationContext,
    tasks: &mut Vec<Task<'d>>,
) {
    match (process_contents, schema.lookup_element(&child.qname)) {
        (ProcessContents::Skip, _) => {}
        (_, Some(decl)) => tasks.push(Task::Element(child, Arc::clone(decl))),
        (ProcessContents::Lax, None) => tasks.push(Task::AnyContent(child)),
        (ProcessContents::Strict, None) => {
            context.report(
                child,
                format!(
                    "Element '{}': No matching global element declaration available, but demanded by the strict wildcard.",
                    child.qname
                ),
            );
        }
    }
}

/// Lax assessment of `xs:anyType` content
///
/// Children with a global declaration are validated against it; everything
/// else is accepted.
fn schedule_any_children<'d>(schema: &XsdSchema, elem: &'d Element, tasks: &mut Vec<Task<'d>>) {
    for child in elem.children.iter().rev() {
        tasks.push(match schema.lookup_element(&child.qname) {
            Some(decl) => Task::Element(child, Arc::clone(decl)),
            None => Task::AnyContent(child),
        });
    }
}

/// Validate element attributes
fn validate_attributes(
    schema: &XsdSchema,
    elem: &Element,
    allowed: &AttributeSet,
    context: &mut ValidationContext,
) -> Result<()> {
    for attr in &elem.attributes {
        if attr.qname.is_in(XSI_NAMESPACE) {
            continue;
        }

        if let Some(resolved) = allowed.attributes.get(&attr.qname) {
            validate_attribute_value(schema, elem, attr, &resolved.decl, context)?;
            continue;
        }

        match allowed.any_attribute.as_ref().filter(|w| w.matches(&attr.qname)) {
            Some(wildcard) => match (wildcard.process_contents, schema.lookup_attribute(&attr.qname)) {
                (ProcessContents::Skip, _) | (ProcessContents::Lax, None) => {}
                (_, Some(global)) => validate_attribute_value(schema, elem, attr, global, context)?,
                (ProcessContents::Strict, None) => context.report(
                    elem,
                    format!(
                        "Element '{}', attribute '{}': No matching global attribute declaration available, but demanded by the strict wildcard.",
                        elem.qname, attr.qname
                    ),
                ),
            },
            None => report_not_allowed(elem, attr, context),
        }
    }

    for required in allowed.required() {
        if elem.get_attribute_qname(&required.decl.name).is_none() {
            context.report(
                elem,
                format!(
                    "Element '{}': The attribute '{}' is required but missing.",
                    elem.qname, required.decl.name
                ),
            );
        }
    }
    Ok(())
}

fn validate_attribute_value(
    schema: &XsdSchema,
    elem: &Element,
    attr: &Attribute,
    decl: &XsdAttribute,
    context: &mut ValidationContext,
) -> Result<()> {
    let decoded = match decl.validate_value(&attr.value, schema) {
        Ok(decoded) => decoded,
        Err(Error::Value(message)) => {
            context.report(
                elem,
                format!("Element '{}', attribute '{}': {}", elem.qname, attr.qname, message),
            );
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if let Some(fixed) = decl.constraint.as_ref().and_then(ValueConstraint::fixed_value) {
        let expected = decl.validate_value(fixed, schema)?;
        if !same_value(&decoded, &attr.value, &expected, fixed) {
            context.report(
                elem,
                format!(
                    "Element '{}', attribute '{}': The value '{}' does not match the fixed value constraint '{}'.",
                    elem.qname, attr.qname, attr.value, fixed
                ),
            );
        }
    }
    Ok(())
}

fn report_not_allowed(elem: &Element, attr: &Attribute, context: &mut ValidationContext) {
    context.report(
        elem,
        format!(
            "Element '{}', attribute '{}': The attribute '{}' is not allowed.",
            elem.qname, attr.qname, attr.qname
        ),
    );
}

/// Compare a value with a fixed constraint; untyped values compare as text
fn same_value(actual: &XsdValue, actual_text: &str, expected: &XsdValue, expected_text: &str) -> bool {
    match (actual, expected) {
        (XsdValue::Null, XsdValue::Null) => actual_text == expected_text,
        _ => actual == expected,
    }
}

/// ` Expected is ( a ).` or ` Expected is one of ( a, b ).`
fn expected_suffix(expected: &[String]) -> String {
    match expected {
        [] => String::new(),
        [single] => format!(" Expected is ( {} ).", single),
        many => format!(" Expected is one of ( {} ).", many.join(", ")),
    }
}

/// Get xsi: attribute value
fn get_xsi_attribute<'a>(elem: &'a Element, local_name: &str) -> Option<&'a str> {
    elem.attributes
        .iter()
        .find(|a| a.qname.is_in(XSI_NAMESPACE) && a.qname.local_name == local_name)
        .map(|a| a.value.as_str())
}

/// Resolve the type named by an `xsi:type` attribute
fn resolve_xsi_type(schema: &XsdSchema, elem: &Element, value: &str) -> Option<TypeDef> {
    let qname = elem.namespaces.resolve(value.trim()).ok()?;
    schema.resolve_named_type(&qname).ok()
}
