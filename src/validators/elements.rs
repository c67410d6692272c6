//! XSD Element declarations
//!
//! Elements are the primary building blocks of XML documents. A declaration
//! binds a name to a type plus the value constraints that apply to it.

use crate::error::{Error, Result};
use crate::namespaces::QName;
use std::str::FromStr;

use super::schemas::TypeRef;

/// Element form (qualified or unqualified)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementForm {
    /// Element name must be namespace-qualified
    Qualified,
    /// Element name is unqualified
    #[default]
    Unqualified,
}

impl FromStr for ElementForm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "qualified" => Ok(Self::Qualified),
            "unqualified" => Ok(Self::Unqualified),
            other => Err(Error::Schema(format!("Invalid form value: '{}'", other))),
        }
    }
}

/// Value constraint of an element or attribute declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueConstraint {
    /// Value used when the instance omits one
    Default(String),
    /// The only value allowed
    Fixed(String),
}

impl ValueConstraint {
    /// Build from the `default` and `fixed` attributes, which are exclusive
    pub fn from_attributes(default: Option<&str>, fixed: Option<&str>) -> Result<Option<Self>> {
        match (default, fixed) {
            (Some(_), Some(_)) => Err(Error::Schema(
                "'default' and 'fixed' are mutually exclusive".to_string(),
            )),
            (Some(d), None) => Ok(Some(Self::Default(d.to_string()))),
            (None, Some(f)) => Ok(Some(Self::Fixed(f.to_string()))),
            (None, None) => Ok(None),
        }
    }

    /// The default value, if any
    pub fn default_value(&self) -> Option<&str> {
        match self {
            Self::Default(value) => Some(value),
            Self::Fixed(_) => None,
        }
    }

    /// The fixed value, if any
    pub fn fixed_value(&self) -> Option<&str> {
        match self {
            Self::Fixed(value) => Some(value),
            Self::Default(_) => None,
        }
    }

    /// The value substituted for empty content
    pub fn value(&self) -> &str {
        match self {
            Self::Default(value) | Self::Fixed(value) => value,
        }
    }
}

/// An element declaration, global or local
#[derive(Debug, Clone)]
pub struct XsdElement {
    /// Element name, qualified according to the declaration's form
    pub name: QName,
    /// Element type (`xs:anyType` when the declaration gives none)
    pub type_ref: TypeRef,
    /// Whether `xsi:nil="true"` is accepted
    pub nillable: bool,
    /// Abstract elements cannot appear in instances
    pub is_abstract: bool,
    /// Default or fixed value
    pub constraint: Option<ValueConstraint>,
}

impl XsdElement {
    /// Create a declaration of the given type
    pub fn new(name: QName, type_ref: TypeRef) -> Self {
        Self {
            name,
            type_ref,
            nillable: false,
            is_abstract: false,
            constraint: None,
        }
    }

    /// The fixed value, if any
    pub fn fixed(&self) -> Option<&str> {
        self.constraint.as_ref().and_then(ValueConstraint::fixed_value)
    }
}
