//! XSD Wildcard validators
//!
//! This module implements wildcards for XSD element and attribute content:
//! - xs:any - allows any element from specified namespaces
//! - xs:anyAttribute - allows any attribute from specified namespaces

use crate::error::{Error, Result};
use crate::namespaces::QName;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Process contents mode for wildcards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessContents {
    /// Validate strictly - element/attribute must be declared
    #[default]
    Strict,
    /// Validate if declaration found, otherwise accept
    Lax,
    /// Skip validation entirely
    Skip,
}

impl FromStr for ProcessContents {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "skip" => Ok(Self::Skip),
            _ => Err(Error::Schema(format!(
                "wrong value '{}' in 'processContents' attribute",
                s
            ))),
        }
    }
}

impl fmt::Display for ProcessContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Lax => write!(f, "lax"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Namespace constraint for wildcards
///
/// The empty string stands for "no namespace".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NamespaceConstraint {
    /// Any namespace is allowed (##any)
    #[default]
    Any,
    /// Any namespace except the target namespace and no namespace (##other)
    Other {
        /// The target namespace to exclude
        target_namespace: Option<String>,
    },
    /// Specific set of allowed namespaces
    Enumeration(HashSet<String>),
}

impl NamespaceConstraint {
    /// Create from namespace attribute value
    pub fn from_namespace_attr(value: &str, target_namespace: Option<&str>) -> Result<Self> {
        match value.trim() {
            "##any" => Ok(Self::Any),
            "##other" => Ok(Self::Other {
                target_namespace: target_namespace.map(String::from),
            }),
            value => {
                let mut namespaces = HashSet::new();
                for ns in value.split_whitespace() {
                    match ns {
                        "##local" => {
                            namespaces.insert(String::new());
                        }
                        "##targetNamespace" => {
                            namespaces.insert(target_namespace.unwrap_or_default().to_string());
                        }
                        s if s.starts_with("##") => {
                            return Err(Error::Schema(format!(
                                "wrong value '{}' in 'namespace' attribute",
                                s
                            )));
                        }
                        uri => {
                            namespaces.insert(uri.to_string());
                        }
                    }
                }
                Ok(Self::Enumeration(namespaces))
            }
        }
    }

    /// Check if a namespace is allowed by this constraint
    pub fn is_allowed(&self, namespace: Option<&str>) -> bool {
        let namespace = namespace.unwrap_or_default();
        match self {
            Self::Any => true,
            Self::Other { target_namespace } => {
                !namespace.is_empty() && Some(namespace) != target_namespace.as_deref()
            }
            Self::Enumeration(set) => set.contains(namespace),
        }
    }
}

/// An `xs:any` or `xs:anyAttribute` wildcard
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Wildcard {
    /// Allowed namespaces
    pub namespace: NamespaceConstraint,
    /// How matched items are validated
    pub process_contents: ProcessContents,
}

impl Wildcard {
    /// Create a wildcard from its `namespace` and `processContents` attributes
    pub fn parse(
        namespace: Option<&str>,
        process_contents: Option<&str>,
        target_namespace: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            namespace: match namespace {
                Some(value) => NamespaceConstraint::from_namespace_attr(value, target_namespace)?,
                None => NamespaceConstraint::Any,
            },
            process_contents: match process_contents {
                Some(value) => value.trim().parse()?,
                None => ProcessContents::Strict,
            },
        })
    }

    /// Check whether a name is matched by this wildcard
    pub fn matches(&self, name: &QName) -> bool {
        self.namespace.is_allowed(name.namespace.as_deref())
    }

    /// Union of two attribute wildcards, used when attribute groups combine
    pub fn union(&self, other: &Wildcard) -> Wildcard {
        let namespace = match (&self.namespace, &other.namespace) {
            (NamespaceConstraint::Any, _) | (_, NamespaceConstraint::Any) => NamespaceConstraint::Any,
            (NamespaceConstraint::Enumeration(a), NamespaceConstraint::Enumeration(b)) => {
                NamespaceConstraint::Enumeration(a.union(b).cloned().collect())
            }
            (constraint @ NamespaceConstraint::Other { .. }, _) | (_, constraint) => {
                constraint.clone()
            }
        };
        Wildcard {
            namespace,
            process_contents: self.process_contents,
        }
    }
}

impl fmt::Display for Wildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            NamespaceConstraint::Any => write!(f, "##any"),
            NamespaceConstraint::Other { target_namespace } => match target_namespace {
                Some(tns) => write!(f, "##other{{{}}}*", tns),
                None => write!(f, "##other*"),
            },
            NamespaceConstraint::Enumeration(set) => {
                let mut names: Vec<String> = set
                    .iter()
                    .map(|ns| if ns.is_empty() { "*".to_string() } else { format!("{{{}}}*", ns) })
                    .collect();
                names.sort();
                write!(f, "{}", names.join(", "))
            }
        }
    }
}
