//! XSD constraining facets
//!
//! This module implements XSD facets that constrain simple types. Facet
//! failures are reported with the wording xmllint users are used to, e.g.
//! `[facet 'enumeration'] The value 'x' is not an element of the set {'a', 'b'}.`

use crate::error::{Error, Result};
use crate::validators::builtins::{parse_decimal, parse_float, XsdValue};
use regex::Regex;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::str::FromStr;

/// White space handling modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpace {
    /// Preserve all white space
    Preserve,
    /// Replace tabs and newlines with spaces
    Replace,
    /// Replace and collapse multiple spaces
    Collapse,
}

impl FromStr for WhiteSpace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "preserve" => Ok(WhiteSpace::Preserve),
            "replace" => Ok(WhiteSpace::Replace),
            "collapse" => Ok(WhiteSpace::Collapse),
            _ => Err(Error::Schema(format!(
                "Invalid whiteSpace value: '{}'. Must be 'preserve', 'replace', or 'collapse'",
                s
            ))),
        }
    }
}

impl WhiteSpace {
    /// Normalize a string according to this white space mode
    pub fn normalize(&self, s: &str) -> String {
        match self {
            WhiteSpace::Preserve => s.to_string(),
            WhiteSpace::Replace => s.replace(['\t', '\n', '\r'], " "),
            WhiteSpace::Collapse => s
                .split(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// A compiled `pattern` facet
///
/// XSD patterns are implicitly anchored at both ends.
#[derive(Debug, Clone)]
pub struct PatternFacet {
    /// Pattern as written in the schema
    pub source: String,
    regex: Regex,
}

impl PatternFacet {
    /// Compile an XSD pattern
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let translated = translate_pattern(&source);
        let regex = Regex::new(&format!("^(?:{})$", translated))
            .map_err(|e| Error::Schema(format!("Invalid pattern '{}': {}", source, e)))?;
        Ok(Self { source, regex })
    }

    /// Check whether the whole value matches
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// Rewrite the XSD-only multi-character escapes into Rust regex classes
fn translate_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('i') => out.push_str(r"[\p{L}_:]"),
            Some('I') => out.push_str(r"[^\p{L}_:]"),
            Some('c') => out.push_str(r"[-.0-9:\p{L}_\x{B7}]"),
            Some('C') => out.push_str(r"[^-.0-9:\p{L}_\x{B7}]"),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Compare a decoded value with a bound written in the schema
fn compare(value: &XsdValue, bound: &str) -> Option<Ordering> {
    match value {
        XsdValue::Decimal(d) => parse_decimal(bound.trim()).ok().map(|b| d.cmp(&b)),
        XsdValue::Float(f) => parse_float(bound.trim()).ok().and_then(|b| f.partial_cmp(&b)),
        XsdValue::Temporal(s) | XsdValue::String(s) => Some(s.as_str().cmp(bound.trim())),
        _ => None,
    }
}

/// Number of significant digits and fraction digits of a decimal
fn digit_counts(value: &Decimal) -> (u32, u32) {
    let normalized = value.normalize();
    let digits = normalized.mantissa().unsigned_abs().to_string().len() as u32;
    (digits.max(normalized.scale()), normalized.scale())
}

/// The facets declared by a single restriction step
#[derive(Debug, Clone, Default)]
pub struct Facets {
    /// whiteSpace
    pub white_space: Option<WhiteSpace>,
    /// length
    pub length: Option<usize>,
    /// minLength
    pub min_length: Option<usize>,
    /// maxLength
    pub max_length: Option<usize>,
    /// Patterns of one step; a value must match at least one of them
    pub patterns: Vec<PatternFacet>,
    /// Allowed lexical values, in declaration order
    pub enumeration: Option<Vec<String>>,
    /// minInclusive, kept lexical until compared against the base type
    pub min_inclusive: Option<String>,
    /// maxInclusive
    pub max_inclusive: Option<String>,
    /// minExclusive
    pub min_exclusive: Option<String>,
    /// maxExclusive
    pub max_exclusive: Option<String>,
    /// totalDigits
    pub total_digits: Option<u32>,
    /// fractionDigits
    pub fraction_digits: Option<u32>,
}

impl Facets {
    /// Create an empty facet set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no facet is declared
    pub fn is_empty(&self) -> bool {
        self.white_space.is_none()
            && self.length.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.patterns.is_empty()
            && self.enumeration.is_none()
            && self.min_inclusive.is_none()
            && self.max_inclusive.is_none()
            && self.min_exclusive.is_none()
            && self.max_exclusive.is_none()
            && self.total_digits.is_none()
            && self.fraction_digits.is_none()
    }

    /// Check a normalized lexical value and its decoded form
    pub fn validate(&self, lexical: &str, value: &XsdValue, white_space: WhiteSpace) -> Result<()> {
        let fail = |message: String| Err(Error::Value(message));
        let length = value.facet_length(lexical);

        if let Some(expected) = self.length {
            if length != expected {
                return fail(format!(
                    "[facet 'length'] The value '{}' has a length of '{}'; this differs from the allowed length of '{}'.",
                    lexical, length, expected
                ));
            }
        }
        if let Some(min) = self.min_length {
            if length < min {
                return fail(format!(
                    "[facet 'minLength'] The value '{}' has a length of '{}'; this underruns the allowed minimum length of '{}'.",
                    lexical, length, min
                ));
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                return fail(format!(
                    "[facet 'maxLength'] The value '{}' has a length of '{}'; this exceeds the allowed maximum length of '{}'.",
                    lexical, length, max
                ));
            }
        }

        if !self.patterns.is_empty() && !self.patterns.iter().any(|p| p.is_match(lexical)) {
            return fail(format!(
                "[facet 'pattern'] The value '{}' is not accepted by the pattern '{}'.",
                lexical, self.patterns[0].source
            ));
        }

        if let Some(ref allowed) = self.enumeration {
            let matched = allowed.iter().any(|entry| {
                let entry = white_space.normalize(entry);
                entry == lexical
                    || (matches!(value, XsdValue::Decimal(_) | XsdValue::Float(_))
                        && compare(value, &entry) == Some(Ordering::Equal))
            });
            if !matched {
                let set = allowed
                    .iter()
                    .map(|e| format!("'{}'", e))
                    .collect::<Vec<_>>()
                    .join(", ");
                return fail(format!(
                    "[facet 'enumeration'] The value '{}' is not an element of the set {{{}}}.",
                    lexical, set
                ));
            }
        }

        if let Some(ref bound) = self.min_inclusive {
            if compare(value, bound) == Some(Ordering::Less) {
                return fail(format!(
                    "[facet 'minInclusive'] The value '{}' is less than the minimum value allowed ('{}').",
                    lexical, bound
                ));
            }
        }
        if let Some(ref bound) = self.max_inclusive {
            if compare(value, bound) == Some(Ordering::Greater) {
                return fail(format!(
                    "[facet 'maxInclusive'] The value '{}' is greater than the maximum value allowed ('{}').",
                    lexical, bound
                ));
            }
        }
        if let Some(ref bound) = self.min_exclusive {
            if matches!(compare(value, bound), Some(Ordering::Less | Ordering::Equal)) {
                return fail(format!(
                    "[facet 'minExclusive'] The value '{}' must be greater than '{}'.",
                    lexical, bound
                ));
            }
        }
        if let Some(ref bound) = self.max_exclusive {
            if matches!(compare(value, bound), Some(Ordering::Greater | Ordering::Equal)) {
                return fail(format!(
                    "[facet 'maxExclusive'] The value '{}' must be less than '{}'.",
                    lexical, bound
                ));
            }
        }

        if let XsdValue::Decimal(d) = value {
            let (total, fraction) = digit_counts(d);
            if let Some(max) = self.total_digits {
                if total > max {
                    return fail(format!(
                        "[facet 'totalDigits'] The value '{}' has more digits than are allowed ('{}').",
                        lexical, max
                    ));
                }
            }
            if let Some(max) = self.fraction_digits {
                if fraction > max {
                    return fail(format!(
                        "[facet 'fractionDigits'] The value '{}' has more fractional digits than are allowed ('{}').",
                        lexical, max
                    ));
                }
            }
        }

        Ok(())
    }
}
