//! Static value types and runtime values
//!
//! `ValueType` is what configuration-time checks reason about; `Value` is
//! what flows between a source record and a target record when a compiled
//! mapping runs. `Value::Null` is the only absent marker.
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

use super::{Record, ShapeDescriptor};
use std::cmp::Ordering;
use std::fmt;

/// Static type of a record field or expression
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    Bool,
    I32,
    I64,
    U32,
    U64,
    F64,
    String,
    /// A nested record of the given shape
    Record(&'static ShapeDescriptor),
    /// A type that admits absence; never nests
    Optional(Box<ValueType>),
}

impl ValueType {
    /// Wrap a type as optional, flattening `Optional(Optional(_))`
    pub fn optional(inner: ValueType) -> ValueType {
        match inner {
            ValueType::Optional(_) => inner,
            other => ValueType::Optional(Box::new(other)),
        }
    }

    /// Whether values of this type may be absent
    pub fn is_optional(&self) -> bool {
        matches!(self, ValueType::Optional(_))
    }

    /// The type with any optional wrapper removed
    pub fn non_optional(&self) -> &ValueType {
        match self {
            ValueType::Optional(inner) => inner,
            other => other,
        }
    }

    /// Shape of a record (or optional record) type
    pub fn record_shape(&self) -> Option<&'static ShapeDescriptor> {
        match self.non_optional() {
            ValueType::Record(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ValueType::I32 | ValueType::I64 | ValueType::U32 | ValueType::U64 | ValueType::F64
        )
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, ValueType::I32 | ValueType::I64 | ValueType::F64)
    }

    /// Whether two values of this type can be ordered
    pub fn is_ordered(&self) -> bool {
        self.is_numeric() || matches!(self, ValueType::String)
    }

    pub fn is_record(&self) -> bool {
        matches!(self, ValueType::Record(_))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => write!(f, "bool"),
            ValueType::I32 => write!(f, "i32"),
            ValueType::I64 => write!(f, "i64"),
            ValueType::U32 => write!(f, "u32"),
            ValueType::U64 => write!(f, "u64"),
            ValueType::F64 => write!(f, "f64"),
            ValueType::String => write!(f, "String"),
            ValueType::Record(shape) => write!(f, "{}", shape.name()),
            ValueType::Optional(inner) => write!(f, "Option<{}>", inner),
        }
    }
}

/// A runtime value read from, or written to, a record field
#[derive(Debug)]
pub enum Value {
    /// Absent value (`Option::None`)
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F64(f64),
    String(String),
    Record(Box<dyn Record>),
}

impl Value {
    /// Whether this value is an inhabitant of `ty`
    pub fn conforms_to(&self, ty: &ValueType) -> bool {
        match (self, ty.non_optional()) {
            (Value::Null, _) => ty.is_optional(),
            (Value::Bool(_), ValueType::Bool)
            | (Value::I32(_), ValueType::I32)
            | (Value::I64(_), ValueType::I64)
            | (Value::U32(_), ValueType::U32)
            | (Value::U64(_), ValueType::U64)
            | (Value::F64(_), ValueType::F64)
            | (Value::String(_), ValueType::String) => true,
            (Value::Record(record), ValueType::Record(shape)) => record.descriptor() == *shape,
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the runtime kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F64(_) => "f64",
            Value::String(_) => "String",
            Value::Record(record) => record.descriptor().name(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&dyn Record> {
        match self {
            Value::Record(record) => Some(record.as_ref()),
            _ => None,
        }
    }

    /// Scalar equality; records never compare equal
    pub fn scalar_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => self.compare(other) == Some(Ordering::Equal),
        }
    }

    /// Ordering between two values of the same numeric or string kind
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::I32(a), Value::I32(b)) => Some(a.cmp(b)),
            (Value::I64(a), Value::I64(b)) => Some(a.cmp(b)),
            (Value::U32(a), Value::U32(b)) => Some(a.cmp(b)),
            (Value::U64(a), Value::U64(b)) => Some(a.cmp(b)),
            (Value::F64(a), Value::F64(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Null => Value::Null,
            Value::Bool(b) => Value::Bool(*b),
            Value::I32(n) => Value::I32(*n),
            Value::I64(n) => Value::I64(*n),
            Value::U32(n) => Value::U32(*n),
            Value::U64(n) => Value::U64(*n),
            Value::F64(n) => Value::F64(*n),
            Value::String(s) => Value::String(s.clone()),
            Value::Record(record) => Value::Record(record.clone_record()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I32(n) => write!(f, "{}", n),
            Value::I64(n) => write!(f, "{}", n),
            Value::U32(n) => write!(f, "{}", n),
            Value::U64(n) => write!(f, "{}", n),
            Value::F64(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Record(record) => write!(f, "{} {{ .. }}", record.descriptor().name()),
        }
    }
}

/// Conversion between a Rust field type and `Value`
///
/// Implemented here for the supported scalars and `Option<T>`; `impl_shape!`
/// implements it for every declared record so records can nest.
pub trait FieldValue: Sized + 'static {
    /// Static type of the field
    fn value_type() -> ValueType;

    /// Read the field as a runtime value
    fn to_value(&self) -> Value;

    /// Convert a runtime value back, `None` if the kind does not fit
    fn from_value(value: Value) -> Option<Self>;

    /// Borrow the field as a record, `None` for scalars and absent values
    fn as_record(&self) -> Option<&dyn Record> {
        None
    }
}

macro_rules! scalar_field_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn value_type() -> ValueType {
                    ValueType::$variant
                }

                fn to_value(&self) -> Value {
                    Value::$variant(self.clone())
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

scalar_field_value! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f64 => F64,
    String => String,
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn value_type() -> ValueType {
        ValueType::optional(T::value_type())
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn as_record(&self) -> Option<&dyn Record> {
        self.as_ref().and_then(T::as_record)
    }
}
