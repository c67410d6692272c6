//! XSD Particle occurrence bounds
//!
//! Particles define occurrence constraints (minOccurs, maxOccurs) for
//! elements, groups and wildcards inside a content model.

use crate::error::{Error, Result};

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// Parse `minOccurs`/`maxOccurs` attribute values
    pub fn parse(min_occurs: Option<&str>, max_occurs: Option<&str>) -> Result<Self> {
        let min = match min_occurs.map(str::trim) {
            None => 1,
            Some(value) => value
                .parse::<u32>()
                .map_err(|_| Error::Schema(format!("Invalid minOccurs value: '{}'", value)))?,
        };
        let max = match max_occurs.map(str::trim) {
            None => Some(1),
            Some("unbounded") => None,
            Some(value) => Some(
                value
                    .parse::<u32>()
                    .map_err(|_| Error::Schema(format!("Invalid maxOccurs value: '{}'", value)))?,
            ),
        };
        if let Some(max) = max {
            if min > max {
                return Err(Error::Schema(format!(
                    "minOccurs ({}) must not be greater than maxOccurs ({})",
                    min, max
                )));
            }
        }
        Ok(Self { min, max })
    }

    /// Check if this particle can be empty (minOccurs == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if this particle is empty (maxOccurs == 0)
    pub fn is_empty(&self) -> bool {
        self.max == Some(0)
    }

    /// Check if occurrence count is at or over the maximum
    pub fn is_over(&self, count: u32) -> bool {
        match self.max {
            Some(max) => count >= max,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurs_parse_defaults() {
        assert_eq!(Occurs::parse(None, None).unwrap(), Occurs::once());
        assert_eq!(
            Occurs::parse(Some("0"), Some("unbounded")).unwrap(),
            Occurs::zero_or_more()
        );
        assert_eq!(Occurs::parse(Some("0"), None).unwrap(), Occurs::optional());
    }

    #[test]
    fn test_occurs_parse_errors() {
        assert!(Occurs::parse(Some("-1"), None).is_err());
        assert!(Occurs::parse(None, Some("many")).is_err());
        assert!(matches!(
            Occurs::parse(Some("3"), Some("2")),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_occurs_predicates() {
        let occurs = Occurs::new(1, Some(3));
        assert!(!occurs.is_emptiable());
        assert!(!occurs.is_over(2));
        assert!(occurs.is_over(3));
        assert!(Occurs::new(0, Some(0)).is_empty());
        assert!(!Occurs::zero_or_more().is_over(u32::MAX));
    }
}
