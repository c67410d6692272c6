//! XSD Model Group components
//!
//! This module implements model groups for XSD content models:
//! - xs:sequence - ordered content
//! - xs:choice - alternative content
//! - xs:all - unordered content (elements only)

use crate::namespaces::QName;
use std::fmt;
use std::sync::Arc;

use super::elements::XsdElement;
use super::particles::Occurs;
use super::wildcards::Wildcard;

/// Model group compositor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelType {
    /// Ordered sequence of particles
    #[default]
    Sequence,
    /// One of multiple alternatives
    Choice,
    /// Unordered set of particles
    All,
}

impl ModelType {
    /// Parse from the local name of the compositor element
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sequence" => Some(Self::Sequence),
            "choice" => Some(Self::Choice),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence"),
            Self::Choice => write!(f, "choice"),
            Self::All => write!(f, "all"),
        }
    }
}

/// The term of a particle: what may occur at that point of the content
#[derive(Debug, Clone)]
pub enum GroupParticle {
    /// Local element declaration
    Element(Arc<XsdElement>),
    /// Reference to a global element declaration
    ElementRef(QName),
    /// Nested model group
    Group(XsdGroup),
    /// Reference to a named model group
    GroupRef(QName),
    /// Element wildcard (xs:any)
    Any(Wildcard),
}

/// A term with its occurrence bounds
#[derive(Debug, Clone)]
pub struct Particle {
    /// minOccurs / maxOccurs
    pub occurs: Occurs,
    /// What occurs
    pub term: GroupParticle,
}

impl Particle {
    /// Create a particle
    pub fn new(occurs: Occurs, term: GroupParticle) -> Self {
        Self { occurs, term }
    }

    /// A sequence of two particles, used to append extension content to base content
    pub fn sequence_of(first: Particle, second: Particle) -> Self {
        Self::new(
            Occurs::once(),
            GroupParticle::Group(XsdGroup {
                model: ModelType::Sequence,
                particles: vec![first, second],
            }),
        )
    }
}

/// A model group: compositor plus particles
#[derive(Debug, Clone, Default)]
pub struct XsdGroup {
    /// Compositor
    pub model: ModelType,
    /// Particles in declaration order
    pub particles: Vec<Particle>,
}

impl XsdGroup {
    /// Create an empty group
    pub fn new(model: ModelType) -> Self {
        Self {
            model,
            particles: Vec::new(),
        }
    }

    /// Check whether the group declares nothing
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_type_from_tag() {
        assert_eq!(ModelType::from_tag("choice"), Some(ModelType::Choice));
        assert_eq!(ModelType::from_tag("group"), None);
        assert_eq!(ModelType::All.to_string(), "all");
    }

    #[test]
    fn test_sequence_of() {
        let a = Particle::new(Occurs::once(), GroupParticle::ElementRef(QName::local("a")));
        let b = Particle::new(Occurs::optional(), GroupParticle::ElementRef(QName::local("b")));
        let combined = Particle::sequence_of(a, b);
        match combined.term {
            GroupParticle::Group(ref group) => {
                assert_eq!(group.model, ModelType::Sequence);
                assert_eq!(group.particles.len(), 2);
            }
            _ => panic!("expected a nested sequence"),
        }
        assert_eq!(combined.occurs, Occurs::once());
    }

    #[test]
    fn test_empty_group() {
        assert!(XsdGroup::new(ModelType::Sequence).is_empty());
    }
}
