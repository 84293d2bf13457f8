//! Declarative shape registration
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

/// Implement [`Record`](crate::shape::Record), [`Shape`](crate::shape::Shape)
/// and [`FieldValue`](crate::shape::FieldValue) for a struct.
///
/// List the fields that mappings may read or write, with their types. The
/// struct must be `Debug + Clone + Default + Send + Sync + 'static`. Fields may
/// be private: the generated accessors live in the struct's own module, so a
/// mapping can populate fields that have no public setter.
///
/// ```
/// use labyrinth_core::impl_shape;
///
/// #[derive(Debug, Clone, Default)]
/// pub struct PatchCardCommand {
///     user_id: i32,
///     card_id: i32,
///     comment: Option<String>,
/// }
///
/// impl_shape!(PatchCardCommand {
///     user_id: i32,
///     card_id: i32,
///     comment: Option<String>,
/// });
/// ```
#[macro_export]
macro_rules! impl_shape {
    ($shape:ident { $($field:ident : $fty:ty),* $(,)? }) => {
        impl $crate::shape::Record for $shape {
            fn descriptor(&self) -> &'static $crate::shape::ShapeDescriptor {
                <$shape as $crate::shape::Shape>::shape()
            }

            fn clone_record(&self) -> ::std::boxed::Box<dyn $crate::shape::Record> {
                ::std::boxed::Box::new(::std::clone::Clone::clone(self))
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }

        impl $crate::shape::Shape for $shape {
            fn shape() -> &'static $crate::shape::ShapeDescriptor {
                static SHAPE: ::std::sync::OnceLock<$crate::shape::ShapeDescriptor> =
                    ::std::sync::OnceLock::new();
                SHAPE.get_or_init(|| {
                    $crate::shape::ShapeDescriptor::builder::<$shape>(stringify!($shape))
                        $(
                            .field::<$fty>(
                                stringify!($field),
                                {
                                    fn get(record: &$shape) -> &$fty {
                                        &record.$field
                                    }
                                    get
                                },
                                {
                                    fn get_mut(record: &mut $shape) -> &mut $fty {
                                        &mut record.$field
                                    }
                                    get_mut
                                },
                            )
                        )*
                        .build()
                })
            }
        }

        impl $crate::shape::FieldValue for $shape {
            fn value_type() -> $crate::shape::ValueType {
                $crate::shape::ValueType::Record(<$shape as $crate::shape::Shape>::shape())
            }

            fn to_value(&self) -> $crate::shape::Value {
                $crate::shape::Value::Record(::std::boxed::Box::new(::std::clone::Clone::clone(self)))
            }

            fn from_value(value: $crate::shape::Value) -> ::std::option::Option<Self> {
                match value {
                    $crate::shape::Value::Record(record) => record
                        .into_any()
                        .downcast::<$shape>()
                        .ok()
                        .map(|record| *record),
                    _ => ::std::option::Option::None,
                }
            }

            fn as_record(&self) -> ::std::option::Option<&dyn $crate::shape::Record> {
                ::std::option::Option::Some(self)
            }
        }
    };
}
