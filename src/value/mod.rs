//! Typed variable values
//!
//! Raw values supplied by callers are tagged into a closed `TypedValue`
//! variant by a `VariableTypeRegistry` before any predicate is compiled.

pub mod compare;

#[cfg(test)]
mod property_tests;

pub use compare::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the integral type a value originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegerWidth {
    Short,
    Integer,
    Long,
}

impl IntegerWidth {
    /// Check whether `value` is representable in this width
    pub fn contains(self, value: i64) -> bool {
        match self {
            IntegerWidth::Short => i16::try_from(value).is_ok(),
            IntegerWidth::Integer => i32::try_from(value).is_ok(),
            IntegerWidth::Long => true,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            IntegerWidth::Short => "short",
            IntegerWidth::Integer => "integer",
            IntegerWidth::Long => "long",
        }
    }
}

/// An untyped query number, matched against every numeric stored value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

impl From<i16> for Numeric {
    fn from(v: i16) -> Self {
        Numeric::Int(i64::from(v))
    }
}

impl From<i32> for Numeric {
    fn from(v: i32) -> Self {
        Numeric::Int(i64::from(v))
    }
}

impl From<i64> for Numeric {
    fn from(v: i64) -> Self {
        Numeric::Int(v)
    }
}

impl From<f64> for Numeric {
    fn from(v: f64) -> Self {
        Numeric::Float(v)
    }
}

/// Value kinds that can be stored but never queried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedKind {
    Bytes,
    Object,
    File,
}

impl UnsupportedKind {
    pub fn type_name(self) -> &'static str {
        match self {
            UnsupportedKind::Bytes => "bytes",
            UnsupportedKind::Object => "object",
            UnsupportedKind::File => "file",
        }
    }
}

/// Closed set of value types a variable predicate can carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TypedValue {
    Null,
    Boolean(bool),
    String(String),
    Integer64 { value: i64, width: IntegerWidth },
    Double(f64),
    Number(Numeric),
    Date(DateTime<Utc>),
    Unsupported(UnsupportedKind),
}

impl TypedValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            TypedValue::Null => "null",
            TypedValue::Boolean(_) => "boolean",
            TypedValue::String(_) => "string",
            TypedValue::Integer64 { width, .. } => width.type_name(),
            TypedValue::Double(_) => "double",
            TypedValue::Number(_) => "number",
            TypedValue::Date(_) => "date",
            TypedValue::Unsupported(kind) => kind.type_name(),
        }
    }

    /// Null and boolean values only support identity comparisons
    pub fn is_null_or_boolean(&self) -> bool {
        matches!(self, TypedValue::Null | TypedValue::Boolean(_))
    }

    pub fn short(value: i16) -> Self {
        TypedValue::Integer64 {
            value: i64::from(value),
            width: IntegerWidth::Short,
        }
    }

    pub fn integer(value: i32) -> Self {
        TypedValue::Integer64 {
            value: i64::from(value),
            width: IntegerWidth::Integer,
        }
    }

    pub fn long(value: i64) -> Self {
        TypedValue::Integer64 {
            value,
            width: IntegerWidth::Long,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Null => write!(f, "null"),
            TypedValue::Boolean(b) => write!(f, "{}", b),
            TypedValue::String(s) => write!(f, "'{}'", s),
            TypedValue::Integer64 { value, .. } => write!(f, "{}", value),
            TypedValue::Double(d) => write!(f, "{}", d),
            TypedValue::Number(Numeric::Int(i)) => write!(f, "{}", i),
            TypedValue::Number(Numeric::Float(d)) => write!(f, "{}", d),
            TypedValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            TypedValue::Unsupported(kind) => write!(f, "<{}>", kind.type_name()),
        }
    }
}

/// Value as handed in by a caller, before tagging
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Boolean(bool),
    Short(i16),
    Integer(i32),
    Long(i64),
    Double(f64),
    Number(Numeric),
    String(String),
    Date(DateTime<Utc>),
    Bytes(Vec<u8>),
    Object { type_name: String },
    File { name: String },
}

/// Untyped number query value
pub fn number_value(n: impl Into<Numeric>) -> RawValue {
    RawValue::Number(n.into())
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::String(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::String(v)
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Boolean(v)
    }
}

impl From<i16> for RawValue {
    fn from(v: i16) -> Self {
        RawValue::Short(v)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Integer(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Long(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Double(v)
    }
}

impl From<DateTime<Utc>> for RawValue {
    fn from(v: DateTime<Utc>) -> Self {
        RawValue::Date(v)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(v: Vec<u8>) -> Self {
        RawValue::Bytes(v)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(RawValue::Null, Into::into)
    }
}

/// Tags raw values with their query type
pub trait VariableTypeRegistry {
    fn normalize(&self, raw: RawValue) -> TypedValue;
}

/// Registry with the built-in primitive types
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTypeRegistry;

impl VariableTypeRegistry for DefaultTypeRegistry {
    fn normalize(&self, raw: RawValue) -> TypedValue {
        match raw {
            RawValue::Null => TypedValue::Null,
            RawValue::Boolean(b) => TypedValue::Boolean(b),
            RawValue::Short(v) => TypedValue::short(v),
            RawValue::Integer(v) => TypedValue::integer(v),
            RawValue::Long(v) => TypedValue::long(v),
            RawValue::Double(v) => TypedValue::Double(v),
            RawValue::Number(n) => TypedValue::Number(n),
            RawValue::String(s) => TypedValue::String(s),
            RawValue::Date(d) => TypedValue::Date(d),
            RawValue::Bytes(_) => TypedValue::Unsupported(UnsupportedKind::Bytes),
            RawValue::Object { .. } => TypedValue::Unsupported(UnsupportedKind::Object),
            RawValue::File { .. } => TypedValue::Unsupported(UnsupportedKind::File),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_tags_primitives() {
        let registry = DefaultTypeRegistry;
        assert_eq!(registry.normalize(RawValue::Null), TypedValue::Null);
        assert_eq!(registry.normalize(7i16.into()), TypedValue::short(7));
        assert_eq!(registry.normalize(7i32.into()), TypedValue::integer(7));
        assert_eq!(registry.normalize(7i64.into()), TypedValue::long(7));
        assert_eq!(registry.normalize("a".into()), TypedValue::String("a".into()));
        assert_eq!(
            registry.normalize(number_value(42.5)),
            TypedValue::Number(Numeric::Float(42.5))
        );
        assert_eq!(registry.normalize(Option::<i32>::None.into()), TypedValue::Null);
    }

    #[test]
    fn test_registry_tags_unsupported() {
        let registry = DefaultTypeRegistry;
        assert_eq!(
            registry.normalize(vec![1u8, 2, 3].into()),
            TypedValue::Unsupported(UnsupportedKind::Bytes)
        );
        assert_eq!(
            registry.normalize(RawValue::Object {
                type_name: "Customer".into()
            }),
            TypedValue::Unsupported(UnsupportedKind::Object)
        );
        assert_eq!(
            registry
                .normalize(RawValue::File {
                    name: "a.pdf".into()
                })
                .type_name(),
            "file"
        );
    }

    #[test]
    fn test_integer_width_contains() {
        assert!(IntegerWidth::Short.contains(32_767));
        assert!(!IntegerWidth::Short.contains(32_768));
        assert!(IntegerWidth::Integer.contains(i64::from(i32::MIN)));
        assert!(!IntegerWidth::Integer.contains(i64::from(i32::MAX) + 1));
        assert!(IntegerWidth::Long.contains(i64::MAX));
    }
}
