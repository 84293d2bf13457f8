//! Record shapes and their static descriptors
//!
//! A shape is a plain Rust struct that describes itself once: its name, its
//! fields, each field's static [`ValueType`], and a pre-resolved accessor pair
//! per field. The mapping compiler works entirely against these descriptors,
//! so name-and-type matching is paid for at configuration time and never
//! repeated when a mapping runs.
//!
//! Shapes are declared with [`impl_shape!`](crate::impl_shape):
//!
//! ```
//! use labyrinth_core::impl_shape;
//! use labyrinth_core::shape::{Shape, ValueType};
//!
//! #[derive(Debug, Clone, Default)]
//! pub struct Card {
//!     id: i32,
//!     title: Option<String>,
//! }
//!
//! impl_shape!(Card { id: i32, title: Option<String> });
//!
//! let shape = Card::shape();
//! assert_eq!(shape.field("id").unwrap().ty(), &ValueType::I32);
//! assert!(shape.field("title").unwrap().ty().is_optional());
//! ```
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

pub mod value;

mod macros;

pub use value::{FieldValue, Value, ValueType};

use crate::{Error, Result};
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;

type Getter = Box<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;
type Setter = Box<dyn Fn(&mut dyn Any, Value) -> Result<()> + Send + Sync>;
type Projector = Box<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Record> + Send + Sync>;

/// Object-safe view of a record instance
///
/// Implemented by `impl_shape!`; user code rarely calls these directly.
pub trait Record: Any + Send + Sync + fmt::Debug {
    fn descriptor(&self) -> &'static ShapeDescriptor;

    fn clone_record(&self) -> Box<dyn Record>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A record type that can take part in a mapping
///
/// `Default` is the parameterless constructor used to allocate targets.
pub trait Shape: Record + Default + Clone {
    /// The cached descriptor for this shape
    fn shape() -> &'static ShapeDescriptor;
}

/// One field of a shape
pub struct FieldDescriptor {
    name: &'static str,
    index: usize,
    ty: ValueType,
    getter: Getter,
    setter: Setter,
    projector: Projector,
}

impl FieldDescriptor {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Position of the field in declaration order
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn ty(&self) -> &ValueType {
        &self.ty
    }

    /// Read this field from a record of the owning shape
    pub fn read(&self, record: &dyn Record) -> Value {
        (self.getter)(record.as_any()).unwrap_or(Value::Null)
    }

    /// Borrow this field of `record` as a record, without copying it
    ///
    /// `None` when the field is not record-typed or is an absent optional.
    pub fn project<'r>(&self, record: &'r dyn Record) -> Option<&'r dyn Record> {
        (self.projector)(record.as_any())
    }

    /// Write this field on a record of the owning shape
    ///
    /// Visibility of the underlying struct field is irrelevant: the setter
    /// was generated next to the struct.
    pub fn write(&self, record: &mut dyn Record, value: Value) -> Result<()> {
        (self.setter)(record.as_any_mut(), value)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("ty", &self.ty.to_string())
            .finish()
    }
}

/// Static description of a record shape
pub struct ShapeDescriptor {
    name: &'static str,
    type_id: TypeId,
    fields: Vec<FieldDescriptor>,
}

impl ShapeDescriptor {
    /// Start describing the shape `S`
    pub fn builder<S: Shape>(name: &'static str) -> ShapeBuilder<S> {
        ShapeBuilder {
            name,
            fields: Vec::new(),
            _shape: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }
}

impl PartialEq for ShapeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ShapeDescriptor {}

impl fmt::Debug for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

fn projector<P>(project: P) -> Projector
where
    P: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Record> + Send + Sync + 'static,
{
    Box::new(project)
}

/// Builder used by `impl_shape!` to assemble a descriptor
pub struct ShapeBuilder<S: Shape> {
    name: &'static str,
    fields: Vec<FieldDescriptor>,
    _shape: PhantomData<fn() -> S>,
}

impl<S: Shape> ShapeBuilder<S> {
    /// Add a field given its projections
    pub fn field<F: FieldValue>(
        mut self,
        name: &'static str,
        get: fn(&S) -> &F,
        get_mut: fn(&mut S) -> &mut F,
    ) -> Self {
        let index = self.fields.len();
        let getter: Getter = Box::new(move |record: &dyn Any| {
            record.downcast_ref::<S>().map(|record| get(record).to_value())
        });
        let setter: Setter = Box::new(move |record: &mut dyn Any, value: Value| {
            let record = record.downcast_mut::<S>().ok_or_else(|| Error::Conversion {
                field: name.to_string(),
                expected: std::any::type_name::<S>().to_string(),
                found: "a record of another shape".to_string(),
            })?;
            let found = value.kind();
            let converted = F::from_value(value).ok_or_else(|| Error::Conversion {
                field: name.to_string(),
                expected: F::value_type().to_string(),
                found: found.to_string(),
            })?;
            *get_mut(record) = converted;
            Ok(())
        });

        let projector = projector(move |record: &dyn Any| {
            record
                .downcast_ref::<S>()
                .and_then(|record| get(record).as_record())
        });

        self.fields.push(FieldDescriptor {
            name,
            index,
            ty: F::value_type(),
            getter,
            setter,
            projector,
        });
        self
    }

    pub fn build(self) -> ShapeDescriptor {
        ShapeDescriptor {
            name: self.name,
            type_id: TypeId::of::<S>(),
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Inner {
        label: Option<String>,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Outer {
        id: i64,
        inner: Inner,
        note: Option<String>,
    }

    crate::impl_shape!(Inner { label: Option<String> });
    crate::impl_shape!(Outer {
        id: i64,
        inner: Inner,
        note: Option<String>,
    });

    #[test]
    fn test_descriptor_lists_fields_in_order() {
        let shape = Outer::shape();
        assert_eq!(shape.name(), "Outer");
        assert_eq!(shape.field_names().collect::<Vec<_>>(), vec!["id", "inner", "note"]);
        assert_eq!(shape.field("note").map(|f| f.index()), Some(2));
        assert!(shape.field("missing").is_none());
    }

    #[test]
    fn test_descriptor_is_cached() {
        assert!(std::ptr::eq(Outer::shape(), Outer::shape()));
        assert_eq!(Outer::shape().field("inner").unwrap().ty(), &ValueType::Record(Inner::shape()));
        assert_ne!(Outer::shape(), Inner::shape());
    }

    #[test]
    fn test_read_and_write_through_descriptor() {
        let shape = Outer::shape();
        let mut record = Outer::default();

        shape.field("id").unwrap().write(&mut record, Value::I64(42)).unwrap();
        shape
            .field("note")
            .unwrap()
            .write(&mut record, Value::String("hello".into()))
            .unwrap();

        assert_eq!(record.id, 42);
        assert_eq!(record.note.as_deref(), Some("hello"));
        assert!(matches!(shape.field("id").unwrap().read(&record), Value::I64(42)));
    }

    #[test]
    fn test_nested_record_read_yields_record_value() {
        let record = Outer {
            inner: Inner { label: Some("x".into()) },
            ..Default::default()
        };
        let value = Outer::shape().field("inner").unwrap().read(&record);
        let inner = value.as_record().expect("record value");
        let label = Inner::shape().field("label").unwrap().read(inner);
        assert_eq!(label.as_str(), Some("x"));
    }

    #[test]
    fn test_write_rejects_wrong_kind() {
        let mut record = Outer::default();
        let err = Outer::shape()
            .field("id")
            .unwrap()
            .write(&mut record, Value::String("nope".into()))
            .unwrap_err();
        assert!(matches!(err, Error::Conversion { ref expected, .. } if expected == "i64"));
        assert_eq!(record.id, 0);
    }
}
