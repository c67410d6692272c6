//! XML Schema validators
//!
//! This module contains the schema components and the validation logic that
//! checks instance documents against them.

// Foundation
pub mod validation;
pub mod particles;

// Type system
pub mod builtins;
pub mod facets;
pub mod simple_types;
pub mod attributes;

// Complex structures
pub mod wildcards;
pub mod groups;
pub mod models;
pub mod complex_types;
pub mod elements;

// Schema assembly and instance validation
pub mod schemas;
pub mod parsing;
pub mod document_validation;

// Re-exports
pub use builtins::{get_builtin_type, validate_builtin, BuiltinType, XsdValue};
pub use complex_types::{ContentType, XsdComplexType};
pub use elements::XsdElement;
pub use facets::{Facets, WhiteSpace};
pub use groups::{ModelType, Particle, XsdGroup};
pub use particles::Occurs;
pub use schemas::{TypeDef, TypeRef, ValidationResult, XsdSchema};
pub use simple_types::{SimpleTypeVariety, XsdSimpleType};
pub use validation::{ValidationContext, ValidationMode};
pub use wildcards::{NamespaceConstraint, ProcessContents, Wildcard};
