//! XSD built-in types
//!
//! This module defines the built-in primitive and derived types for XML Schema.
//! These types form the foundation of XSD validation.

use crate::error::{Error, Result};
use crate::validators::facets::WhiteSpace;
use base64::Engine;
use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Type Name Constants
// =============================================================================

/// XSD string type name
pub const XSD_STRING: &str = "string";
/// XSD boolean type name
pub const XSD_BOOLEAN: &str = "boolean";
/// XSD decimal type name
pub const XSD_DECIMAL: &str = "decimal";
/// XSD integer type name
pub const XSD_INTEGER: &str = "integer";
/// XSD float type name
pub const XSD_FLOAT: &str = "float";
/// XSD double type name
pub const XSD_DOUBLE: &str = "double";
/// XSD duration type name
pub const XSD_DURATION: &str = "duration";
/// XSD dateTime type name
pub const XSD_DATETIME: &str = "dateTime";
/// XSD date type name
pub const XSD_DATE: &str = "date";
/// XSD time type name
pub const XSD_TIME: &str = "time";
/// XSD hexBinary type name
pub const XSD_HEX_BINARY: &str = "hexBinary";
/// XSD base64Binary type name
pub const XSD_BASE64_BINARY: &str = "base64Binary";
/// XSD anyURI type name
pub const XSD_ANY_URI: &str = "anyURI";
/// XSD QName type name
pub const XSD_QNAME: &str = "QName";
/// XSD anyType type name
pub const XSD_ANY_TYPE: &str = "anyType";
/// XSD anySimpleType type name
pub const XSD_ANY_SIMPLE_TYPE: &str = "anySimpleType";

// =============================================================================
// XSD Value Representation
// =============================================================================

/// Represents a decoded XSD value
#[derive(Debug, Clone, PartialEq)]
pub enum XsdValue {
    /// String-like value (strings, names, URIs, QNames, durations)
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Decimal and integer values
    Decimal(Decimal),
    /// Float and double values
    Float(f64),
    /// Binary value (hex or base64 decoded)
    Binary(Vec<u8>),
    /// Date/time value, kept in its canonical lexical form
    Temporal(String),
    /// List value
    List(Vec<XsdValue>),
    /// Value of anyType/anySimpleType
    Null,
}

impl XsdValue {
    /// Length as counted by the length facets
    pub fn facet_length(&self, lexical: &str) -> usize {
        match self {
            XsdValue::Binary(bytes) => bytes.len(),
            XsdValue::List(items) => items.len(),
            _ => lexical.chars().count(),
        }
    }
}

impl fmt::Display for XsdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XsdValue::String(s) | XsdValue::Temporal(s) => write!(f, "{}", s),
            XsdValue::Boolean(b) => write!(f, "{}", b),
            XsdValue::Decimal(d) => write!(f, "{}", d),
            XsdValue::Float(v) => {
                if v.is_nan() {
                    write!(f, "NaN")
                } else if *v == f64::INFINITY {
                    write!(f, "INF")
                } else if *v == f64::NEG_INFINITY {
                    write!(f, "-INF")
                } else {
                    write!(f, "{}", v)
                }
            }
            XsdValue::Binary(b) => {
                for byte in b {
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
            XsdValue::List(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", rendered.join(" "))
            }
            XsdValue::Null => Ok(()),
        }
    }
}

// =============================================================================
// Built-in Type Definition
// =============================================================================

/// Definition of a built-in XSD type
#[derive(Debug, Clone)]
pub struct BuiltinType {
    /// Type name (local name without namespace)
    pub name: &'static str,
    /// Primitive ancestor, used to pick the value space of bound facets
    pub primitive: &'static str,
    /// White space handling
    pub white_space: WhiteSpace,
    /// Validator function, called on the whitespace-normalized value
    validator: fn(&str) -> Result<XsdValue>,
}

impl BuiltinType {
    /// Validate a string value against this type
    pub fn validate(&self, value: &str) -> Result<XsdValue> {
        let normalized = self.white_space.normalize(value);
        (self.validator)(&normalized).map_err(|_| {
            Error::Value(format!(
                "'{}' is not a valid value of the atomic type 'xs:{}'.",
                normalized, self.name
            ))
        })
    }

    /// Check if this type is a numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(self.primitive, XSD_DECIMAL | XSD_FLOAT | XSD_DOUBLE)
    }

    /// Check if this type is a list type
    pub fn is_list(&self) -> bool {
        matches!(self.name, "IDREFS" | "ENTITIES" | "NMTOKENS")
    }
}

// =============================================================================
// Lexical Patterns
// =============================================================================

static LANGUAGE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$").unwrap());
static NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[:_\p{L}][-.:_\p{L}\p{N}\x{B7}]*$").unwrap());
static NCNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[_\p{L}][-._\p{L}\p{N}\x{B7}]*$").unwrap());
static NMTOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-.:_\p{L}\p{N}\x{B7}]+$").unwrap());
static QNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([_\p{L}][-._\p{L}\p{N}]*:)?[_\p{L}][-._\p{L}\p{N}]*$").unwrap());
static DECIMAL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").unwrap());
static INTEGER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").unwrap());
static FLOAT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?|[+-]?INF|NaN)$").unwrap()
});
static DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?P(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$").unwrap()
});
static DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(-?\d{4,})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})(\.\d+)?(Z|[+-]\d{2}:\d{2})?$",
    )
    .unwrap()
});
static DATE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?\d{4,})-(\d{2})-(\d{2})(Z|[+-]\d{2}:\d{2})?$").unwrap());
static TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2})(\.\d+)?(Z|[+-]\d{2}:\d{2})?$").unwrap()
});
static GYEAR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{4,}(Z|[+-]\d{2}:\d{2})?$").unwrap());
static GYEAR_MONTH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{4,}-(\d{2})(Z|[+-]\d{2}:\d{2})?$").unwrap());
static GMONTH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^--(\d{2})(Z|[+-]\d{2}:\d{2})?$").unwrap());
static GDAY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^---(\d{2})(Z|[+-]\d{2}:\d{2})?$").unwrap());
static GMONTH_DAY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^--(\d{2})-(\d{2})(Z|[+-]\d{2}:\d{2})?$").unwrap());
static HEX_BINARY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9a-fA-F]{2})*$").unwrap());
static URI_SCHEME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").unwrap());

fn invalid(kind: &str) -> Error {
    Error::Value(format!("invalid {} value", kind))
}

fn check(regex: &Regex, value: &str, kind: &str) -> Result<()> {
    if regex.is_match(value) {
        Ok(())
    } else {
        Err(invalid(kind))
    }
}

// =============================================================================
// Validator Functions
// =============================================================================

fn validate_string(value: &str) -> Result<XsdValue> {
    Ok(XsdValue::String(value.to_string()))
}

fn validate_language(value: &str) -> Result<XsdValue> {
    check(&LANGUAGE_REGEX, value, "language")?;
    Ok(XsdValue::String(value.to_string()))
}

fn validate_name(value: &str) -> Result<XsdValue> {
    check(&NAME_REGEX, value, "Name")?;
    Ok(XsdValue::String(value.to_string()))
}

fn validate_ncname(value: &str) -> Result<XsdValue> {
    check(&NCNAME_REGEX, value, "NCName")?;
    Ok(XsdValue::String(value.to_string()))
}

fn validate_nmtoken(value: &str) -> Result<XsdValue> {
    check(&NMTOKEN_REGEX, value, "NMTOKEN")?;
    Ok(XsdValue::String(value.to_string()))
}

fn validate_list_of(value: &str, item: fn(&str) -> Result<XsdValue>) -> Result<XsdValue> {
    let items = value
        .split(' ')
        .filter(|s| !s.is_empty())
        .map(item)
        .collect::<Result<Vec<_>>>()?;
    if items.is_empty() {
        return Err(invalid("list"));
    }
    Ok(XsdValue::List(items))
}

fn validate_ncnames(value: &str) -> Result<XsdValue> {
    validate_list_of(value, validate_ncname)
}

fn validate_nmtokens(value: &str) -> Result<XsdValue> {
    validate_list_of(value, validate_nmtoken)
}

fn validate_boolean(value: &str) -> Result<XsdValue> {
    match value {
        "true" | "1" => Ok(XsdValue::Boolean(true)),
        "false" | "0" => Ok(XsdValue::Boolean(false)),
        _ => Err(invalid("boolean")),
    }
}

/// Parse an xs:decimal lexical value
pub fn parse_decimal(value: &str) -> Result<Decimal> {
    check(&DECIMAL_REGEX, value, "decimal")?;
    let unsigned = value.strip_prefix('+').unwrap_or(value);
    let mut canonical = if let Some(rest) = unsigned.strip_prefix("-.") {
        format!("-0.{}", rest)
    } else if let Some(rest) = unsigned.strip_prefix('.') {
        format!("0.{}", rest)
    } else {
        unsigned.to_string()
    };
    if canonical.ends_with('.') {
        canonical.push('0');
    }
    Decimal::from_str(&canonical).map_err(|_| invalid("decimal"))
}

fn validate_decimal(value: &str) -> Result<XsdValue> {
    parse_decimal(value).map(XsdValue::Decimal)
}

fn integer_in_range(value: &str, min: Option<i128>, max: Option<i128>) -> Result<XsdValue> {
    check(&INTEGER_REGEX, value, "integer")?;
    let number = parse_decimal(value)?;
    if let Some(min) = min {
        if number < Decimal::from_i128_with_scale(min, 0) {
            return Err(invalid("integer"));
        }
    }
    if let Some(max) = max {
        if number > Decimal::from_i128_with_scale(max, 0) {
            return Err(invalid("integer"));
        }
    }
    Ok(XsdValue::Decimal(number))
}

fn validate_integer(value: &str) -> Result<XsdValue> {
    integer_in_range(value, None, None)
}

fn validate_long(value: &str) -> Result<XsdValue> {
    integer_in_range(value, Some(i64::MIN as i128), Some(i64::MAX as i128))
}

fn validate_int(value: &str) -> Result<XsdValue> {
    integer_in_range(value, Some(i32::MIN as i128), Some(i32::MAX as i128))
}

fn validate_short(value: &str) -> Result<XsdValue> {
    integer_in_range(value, Some(i16::MIN as i128), Some(i16::MAX as i128))
}

fn validate_byte(value: &str) -> Result<XsdValue> {
    integer_in_range(value, Some(i8::MIN as i128), Some(i8::MAX as i128))
}

fn validate_non_negative_integer(value: &str) -> Result<XsdValue> {
    integer_in_range(value, Some(0), None)
}

fn validate_positive_integer(value: &str) -> Result<XsdValue> {
    integer_in_range(value, Some(1), None)
}

fn validate_non_positive_integer(value: &str) -> Result<XsdValue> {
    integer_in_range(value, None, Some(0))
}

fn validate_negative_integer(value: &str) -> Result<XsdValue> {
    integer_in_range(value, None, Some(-1))
}

fn validate_unsigned_long(value: &str) -> Result<XsdValue> {
    integer_in_range(value, Some(0), Some(u64::MAX as i128))
}

fn validate_unsigned_int(value: &str) -> Result<XsdValue> {
    integer_in_range(value, Some(0), Some(u32::MAX as i128))
}

fn validate_unsigned_short(value: &str) -> Result<XsdValue> {
    integer_in_range(value, Some(0), Some(u16::MAX as i128))
}

fn validate_unsigned_byte(value: &str) -> Result<XsdValue> {
    integer_in_range(value, Some(0), Some(u8::MAX as i128))
}

/// Parse an xs:float/xs:double lexical value
pub fn parse_float(value: &str) -> Result<f64> {
    check(&FLOAT_REGEX, value, "float")?;
    match value {
        "NaN" => Ok(f64::NAN),
        "INF" | "+INF" => Ok(f64::INFINITY),
        "-INF" => Ok(f64::NEG_INFINITY),
        _ => value.parse::<f64>().map_err(|_| invalid("float")),
    }
}

fn validate_float(value: &str) -> Result<XsdValue> {
    parse_float(value).map(XsdValue::Float)
}

fn validate_duration(value: &str) -> Result<XsdValue> {
    check(&DURATION_REGEX, value, "duration")?;
    if value.ends_with('P') || value.ends_with('T') {
        return Err(invalid("duration"));
    }
    Ok(XsdValue::String(value.to_string()))
}

fn number(text: &str) -> Result<u32> {
    text.parse::<u32>().map_err(|_| invalid("date/time"))
}

fn check_date(year: &str, month: &str, day: &str) -> Result<()> {
    let year: i32 = year.parse().map_err(|_| invalid("date"))?;
    // Year 0 is not allowed in XSD 1.0; chrono accepts it, so check explicitly
    if year == 0 {
        return Err(invalid("date"));
    }
    NaiveDate::from_ymd_opt(year, number(month)?, number(day)?)
        .map(|_| ())
        .ok_or_else(|| invalid("date"))
}

fn check_time(hour: &str, minute: &str, second: &str, fraction: Option<&str>) -> Result<()> {
    let (hour, minute, second) = (number(hour)?, number(minute)?, number(second)?);
    if hour == 24 {
        let zero_fraction = fraction.map_or(true, |f| f[1..].chars().all(|c| c == '0'));
        return if minute == 0 && second == 0 && zero_fraction {
            Ok(())
        } else {
            Err(invalid("time"))
        };
    }
    NaiveTime::from_hms_opt(hour, minute, second)
        .map(|_| ())
        .ok_or_else(|| invalid("time"))
}

fn validate_datetime(value: &str) -> Result<XsdValue> {
    let caps = DATETIME_REGEX.captures(value).ok_or_else(|| invalid("dateTime"))?;
    check_date(&caps[1], &caps[2], &caps[3])?;
    check_time(&caps[4], &caps[5], &caps[6], caps.get(7).map(|m| m.as_str()))?;
    Ok(XsdValue::Temporal(value.to_string()))
}

fn validate_date(value: &str) -> Result<XsdValue> {
    let caps = DATE_REGEX.captures(value).ok_or_else(|| invalid("date"))?;
    check_date(&caps[1], &caps[2], &caps[3])?;
    Ok(XsdValue::Temporal(value.to_string()))
}

fn validate_time(value: &str) -> Result<XsdValue> {
    let caps = TIME_REGEX.captures(value).ok_or_else(|| invalid("time"))?;
    check_time(&caps[1], &caps[2], &caps[3], caps.get(4).map(|m| m.as_str()))?;
    Ok(XsdValue::Temporal(value.to_string()))
}

fn validate_gyear(value: &str) -> Result<XsdValue> {
    check(&GYEAR_REGEX, value, "gYear")?;
    Ok(XsdValue::Temporal(value.to_string()))
}

fn check_month(month: &str) -> Result<()> {
    match number(month)? {
        1..=12 => Ok(()),
        _ => Err(invalid("month")),
    }
}

fn validate_gyear_month(value: &str) -> Result<XsdValue> {
    let caps = GYEAR_MONTH_REGEX.captures(value).ok_or_else(|| invalid("gYearMonth"))?;
    check_month(&caps[1])?;
    Ok(XsdValue::Temporal(value.to_string()))
}

fn validate_gmonth(value: &str) -> Result<XsdValue> {
    let caps = GMONTH_REGEX.captures(value).ok_or_else(|| invalid("gMonth"))?;
    check_month(&caps[1])?;
    Ok(XsdValue::Temporal(value.to_string()))
}

fn validate_gday(value: &str) -> Result<XsdValue> {
    let caps = GDAY_REGEX.captures(value).ok_or_else(|| invalid("gDay"))?;
    match number(&caps[1])? {
        1..=31 => Ok(XsdValue::Temporal(value.to_string())),
        _ => Err(invalid("gDay")),
    }
}

fn validate_gmonth_day(value: &str) -> Result<XsdValue> {
    let caps = GMONTH_DAY_REGEX.captures(value).ok_or_else(|| invalid("gMonthDay"))?;
    // 2000 is a leap year, so --02-29 is accepted
    check_date("2000", &caps[1], &caps[2])?;
    Ok(XsdValue::Temporal(value.to_string()))
}

fn validate_hex_binary(value: &str) -> Result<XsdValue> {
    check(&HEX_BINARY_REGEX, value, "hexBinary")?;
    (0..value.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&value[i..i + 2], 16).map_err(|_| invalid("hexBinary")))
        .collect::<Result<Vec<u8>>>()
        .map(XsdValue::Binary)
}

fn validate_base64_binary(value: &str) -> Result<XsdValue> {
    let cleaned: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .map(XsdValue::Binary)
        .map_err(|_| invalid("base64Binary"))
}

fn validate_any_uri(value: &str) -> Result<XsdValue> {
    if URI_SCHEME_REGEX.is_match(value) {
        url::Url::parse(value).map_err(|_| invalid("anyURI"))?;
    } else if value.contains(|c: char| c.is_control()) {
        return Err(invalid("anyURI"));
    }
    Ok(XsdValue::String(value.to_string()))
}

fn validate_qname(value: &str) -> Result<XsdValue> {
    check(&QNAME_REGEX, value, "QName")?;
    Ok(XsdValue::String(value.to_string()))
}

fn validate_any(_value: &str) -> Result<XsdValue> {
    Ok(XsdValue::Null)
}

// =============================================================================
// Built-in Type Registry
// =============================================================================

fn builtin(
    name: &'static str,
    primitive: &'static str,
    white_space: WhiteSpace,
    validator: fn(&str) -> Result<XsdValue>,
) -> (&'static str, BuiltinType) {
    (
        name,
        BuiltinType {
            name,
            primitive,
            white_space,
            validator,
        },
    )
}

lazy_static::lazy_static! {
    /// Registry of the built-in XSD types, keyed by local name
    pub static ref BUILTIN_TYPES: HashMap<&'static str, BuiltinType> = {
        use WhiteSpace::{Collapse, Preserve, Replace};
        HashMap::from([
            builtin(XSD_ANY_TYPE, XSD_ANY_TYPE, Preserve, validate_any),
            builtin(XSD_ANY_SIMPLE_TYPE, XSD_ANY_SIMPLE_TYPE, Preserve, validate_any),
            // String types
            builtin(XSD_STRING, XSD_STRING, Preserve, validate_string),
            builtin("normalizedString", XSD_STRING, Replace, validate_string),
            builtin("token", XSD_STRING, Collapse, validate_string),
            builtin("language", XSD_STRING, Collapse, validate_language),
            builtin("Name", XSD_STRING, Collapse, validate_name),
            builtin("NCName", XSD_STRING, Collapse, validate_ncname),
            builtin("ID", XSD_STRING, Collapse, validate_ncname),
            builtin("IDREF", XSD_STRING, Collapse, validate_ncname),
            builtin("IDREFS", XSD_STRING, Collapse, validate_ncnames),
            builtin("ENTITY", XSD_STRING, Collapse, validate_ncname),
            builtin("ENTITIES", XSD_STRING, Collapse, validate_ncnames),
            builtin("NMTOKEN", XSD_STRING, Collapse, validate_nmtoken),
            builtin("NMTOKENS", XSD_STRING, Collapse, validate_nmtokens),
            builtin(XSD_BOOLEAN, XSD_BOOLEAN, Collapse, validate_boolean),
            // Numeric types
            builtin(XSD_DECIMAL, XSD_DECIMAL, Collapse, validate_decimal),
            builtin(XSD_INTEGER, XSD_DECIMAL, Collapse, validate_integer),
            builtin("long", XSD_DECIMAL, Collapse, validate_long),
            builtin("int", XSD_DECIMAL, Collapse, validate_int),
            builtin("short", XSD_DECIMAL, Collapse, validate_short),
            builtin("byte", XSD_DECIMAL, Collapse, validate_byte),
            builtin("nonNegativeInteger", XSD_DECIMAL, Collapse, validate_non_negative_integer),
            builtin("positiveInteger", XSD_DECIMAL, Collapse, validate_positive_integer),
            builtin("nonPositiveInteger", XSD_DECIMAL, Collapse, validate_non_positive_integer),
            builtin("negativeInteger", XSD_DECIMAL, Collapse, validate_negative_integer),
            builtin("unsignedLong", XSD_DECIMAL, Collapse, validate_unsigned_long),
            builtin("unsignedInt", XSD_DECIMAL, Collapse, validate_unsigned_int),
            builtin("unsignedShort", XSD_DECIMAL, Collapse, validate_unsigned_short),
            builtin("unsignedByte", XSD_DECIMAL, Collapse, validate_unsigned_byte),
            builtin(XSD_FLOAT, XSD_FLOAT, Collapse, validate_float),
            builtin(XSD_DOUBLE, XSD_DOUBLE, Collapse, validate_float),
            // Date/time types
            builtin(XSD_DURATION, XSD_DURATION, Collapse, validate_duration),
            builtin(XSD_DATETIME, XSD_DATETIME, Collapse, validate_datetime),
            builtin(XSD_DATE, XSD_DATE, Collapse, validate_date),
            builtin(XSD_TIME, XSD_TIME, Collapse, validate_time),
            builtin("gYear", "gYear", Collapse, validate_gyear),
            builtin("gYearMonth", "gYearMonth", Collapse, validate_gyear_month),
            builtin("gMonth", "gMonth", Collapse, validate_gmonth),
            builtin("gDay", "gDay", Collapse, validate_gday),
            builtin("gMonthDay", "gMonthDay", Collapse, validate_gmonth_day),
            // Binary types
            builtin(XSD_HEX_BINARY, XSD_HEX_BINARY, Collapse, validate_hex_binary),
            builtin(XSD_BASE64_BINARY, XSD_BASE64_BINARY, Collapse, validate_base64_binary),
            // Other types
            builtin(XSD_ANY_URI, XSD_ANY_URI, Collapse, validate_any_uri),
            builtin(XSD_QNAME, XSD_QNAME, Collapse, validate_qname),
            builtin("NOTATION", XSD_QNAME, Collapse, validate_qname),
        ])
    };
}

/// Get a built-in type by local name
pub fn get_builtin_type(name: &str) -> Option<&'static BuiltinType> {
    BUILTIN_TYPES.get(name)
}

/// Validate a value against a built-in type by name
pub fn validate_builtin(type_name: &str, value: &str) -> Result<XsdValue> {
    match get_builtin_type(type_name) {
        Some(builtin) => builtin.validate(value),
        None => Err(Error::Schema(format!("Unknown built-in type: xs:{}", type_name))),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_types() {
        assert!(validate_builtin(XSD_STRING, "Hello World").is_ok());
        assert!(validate_builtin("token", "  Hello   World ").is_ok());
        assert!(validate_builtin("NCName", "validName").is_ok());
        assert!(validate_builtin("NCName", "invalid:name").is_err());
        assert!(validate_builtin("Name", "ns:name").is_ok());
        assert!(validate_builtin("NMTOKENS", "a b  c").is_ok());
        assert!(validate_builtin("NMTOKENS", "   ").is_err());
    }

    #[test]
    fn test_whitespace_is_collapsed_before_checking() {
        assert_eq!(
            validate_builtin(XSD_INTEGER, "  42 \n").unwrap(),
            XsdValue::Decimal(Decimal::from(42))
        );
        assert_eq!(
            validate_builtin(XSD_STRING, " keep ").unwrap(),
            XsdValue::String(" keep ".to_string())
        );
    }

    #[test]
    fn test_boolean_type() {
        assert_eq!(validate_builtin(XSD_BOOLEAN, "true").unwrap(), XsdValue::Boolean(true));
        assert_eq!(validate_builtin(XSD_BOOLEAN, "0").unwrap(), XsdValue::Boolean(false));
        assert!(validate_builtin(XSD_BOOLEAN, "yes").is_err());
    }

    #[test]
    fn test_numeric_types() {
        assert!(validate_builtin(XSD_INTEGER, "123").is_ok());
        assert!(validate_builtin(XSD_INTEGER, "-456").is_ok());
        assert!(validate_builtin(XSD_INTEGER, "abc").is_err());
        assert!(validate_builtin(XSD_INTEGER, "1.5").is_err());

        assert!(validate_builtin("byte", "127").is_ok());
        assert!(validate_builtin("byte", "128").is_err());
        assert!(validate_builtin("byte", "-128").is_ok());
        assert!(validate_builtin("byte", "-129").is_err());

        assert!(validate_builtin("unsignedByte", "255").is_ok());
        assert!(validate_builtin("unsignedByte", "256").is_err());
        assert!(validate_builtin("unsignedByte", "-1").is_err());
        assert!(validate_builtin("unsignedLong", "18446744073709551615").is_ok());

        assert!(validate_builtin("positiveInteger", "1").is_ok());
        assert!(validate_builtin("positiveInteger", "0").is_err());
        assert!(validate_builtin("negativeInteger", "-1").is_ok());
        assert!(validate_builtin("negativeInteger", "0").is_err());
    }

    #[test]
    fn test_decimal_and_float_types() {
        assert!(validate_builtin(XSD_DECIMAL, "123.456").is_ok());
        assert!(validate_builtin(XSD_DECIMAL, "+.5").is_ok());
        assert!(validate_builtin(XSD_DECIMAL, "-7.").is_ok());
        assert!(validate_builtin(XSD_DECIMAL, "1e5").is_err());

        assert!(validate_builtin(XSD_FLOAT, "123.456").is_ok());
        assert!(validate_builtin(XSD_FLOAT, "NaN").is_ok());
        assert!(validate_builtin(XSD_FLOAT, "-INF").is_ok());
        assert!(validate_builtin(XSD_DOUBLE, "1.23e10").is_ok());
        assert!(validate_builtin(XSD_DOUBLE, "inf").is_err());
    }

    #[test]
    fn test_binary_types() {
        assert_eq!(
            validate_builtin(XSD_HEX_BINARY, "0A1b").unwrap(),
            XsdValue::Binary(vec![0x0A, 0x1B])
        );
        assert!(validate_builtin(XSD_HEX_BINARY, "ABC").is_err());
        assert!(validate_builtin(XSD_BASE64_BINARY, "SGVsbG8=").is_ok());
        assert!(validate_builtin(XSD_BASE64_BINARY, "SGVsbG8").is_err());
    }

    #[test]
    fn test_datetime_types() {
        assert!(validate_builtin(XSD_DATETIME, "2024-01-15T10:30:00").is_ok());
        assert!(validate_builtin(XSD_DATETIME, "2024-01-15T10:30:00.5+05:30").is_ok());
        assert!(validate_builtin(XSD_DATETIME, "2024-01-15T24:00:00Z").is_ok());
        assert!(validate_builtin(XSD_DATETIME, "2024-01-15T24:00:01Z").is_err());
        assert!(validate_builtin(XSD_DATETIME, "invalid").is_err());

        assert!(validate_builtin(XSD_DATE, "2024-02-29").is_ok());
        assert!(validate_builtin(XSD_DATE, "2023-02-29").is_err());
        assert!(validate_builtin(XSD_DATE, "2024-13-01").is_err());

        assert!(validate_builtin(XSD_TIME, "10:30:00.123").is_ok());
        assert!(validate_builtin(XSD_TIME, "10:61:00").is_err());

        assert!(validate_builtin(XSD_DURATION, "P1Y2M3DT4H5M6S").is_ok());
        assert!(validate_builtin(XSD_DURATION, "PT1H").is_ok());
        assert!(validate_builtin(XSD_DURATION, "P").is_err());
        assert!(validate_builtin(XSD_DURATION, "P1DT").is_err());

        assert!(validate_builtin("gMonthDay", "--02-29").is_ok());
        assert!(validate_builtin("gMonth", "--13").is_err());
        assert!(validate_builtin("gYearMonth", "2024-12").is_ok());
    }

    #[test]
    fn test_uri_and_qname_types() {
        assert!(validate_builtin(XSD_ANY_URI, "http://example.com/a?b#c").is_ok());
        assert!(validate_builtin(XSD_ANY_URI, "relative/path").is_ok());
        assert!(validate_builtin(XSD_ANY_URI, "http://exa mple.com").is_err());

        assert!(validate_builtin(XSD_QNAME, "prefix:localName").is_ok());
        assert!(validate_builtin(XSD_QNAME, "").is_err());
    }

    #[test]
    fn test_error_message_names_the_type() {
        let err = validate_builtin(XSD_INTEGER, "abc").unwrap_err();
        assert_eq!(
            err.to_string(),
            "value error: 'abc' is not a valid value of the atomic type 'xs:integer'."
        );
        assert!(matches!(validate_builtin("nope", "x"), Err(Error::Schema(_))));
    }

    #[test]
    fn test_get_builtin_type() {
        let int_type = get_builtin_type("int").unwrap();
        assert!(int_type.is_numeric());
        assert!(!get_builtin_type(XSD_STRING).unwrap().is_numeric());
        assert!(get_builtin_type("IDREFS").unwrap().is_list());
        assert!(get_builtin_type("unknownType").is_none());
    }
}
