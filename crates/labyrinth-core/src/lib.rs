//! Labyrinth Core - Declarative object-to-object mapping
//!
//! Mappings between record shapes are declared once as rules, checked and
//! compiled at configuration time, and then run as plain field reads, guarded
//! writes and pre-lowered expression evaluations.
//!
//! # Main Components
//!
//! - **Shapes**: Static record descriptors declared with [`impl_shape!`]
//! - **Expressions**: Captured, type-checked rule bodies over a lambda parameter
//! - **Mappings**: Rule definitions compiled into ordered mapping plans
//! - **Registry**: Per-pair compiled mappings, sealed for shared use
//! - **Error Handling**: Error types using `thiserror` and `anyhow`
//!
//! # Example
//!
//! ```
//! use labyrinth_core::{impl_shape, Lambda, Mapper, Result};
//!
//! #[derive(Debug, Clone, Default)]
//! pub struct PatchCardDto {
//!     title: Option<String>,
//!     content: Option<String>,
//! }
//!
//! #[derive(Debug, Clone, Default)]
//! pub struct PatchCardParameters {
//!     id: i32,
//!     comment: Option<String>,
//!     data: PatchCardDto,
//! }
//!
//! #[derive(Debug, Clone, Default)]
//! pub struct PatchCardCommand {
//!     card_id: i32,
//!     comment: Option<String>,
//!     title: Option<String>,
//!     content: Option<String>,
//! }
//!
//! impl_shape!(PatchCardDto { title: Option<String>, content: Option<String> });
//! impl_shape!(PatchCardParameters { id: i32, comment: Option<String>, data: PatchCardDto });
//! impl_shape!(PatchCardCommand {
//!     card_id: i32,
//!     comment: Option<String>,
//!     title: Option<String>,
//!     content: Option<String>,
//! });
//!
//! fn main() -> Result<()> {
//!     let mut mapper = Mapper::new();
//!     mapper.configure::<PatchCardCommand, PatchCardParameters>(|m| {
//!         m.auto_map(Lambda::new::<PatchCardParameters>(|p| p.field("data")))?
//!             .auto_map(Lambda::new::<PatchCardParameters>(|p| p.clone()))?
//!             .map_property(
//!                 Lambda::new::<PatchCardParameters>(|p| p.field("id")),
//!                 Lambda::new::<PatchCardCommand>(|c| c.field("card_id")),
//!             )?;
//!         Ok(())
//!     })?;
//!     let mapper = mapper.seal();
//!
//!     let params = PatchCardParameters {
//!         id: 12,
//!         comment: Some("why".to_string()),
//!         data: PatchCardDto {
//!             title: Some("new title".to_string()),
//!             content: None,
//!         },
//!     };
//!     let command: PatchCardCommand = mapper.map(&params)?;
//!     assert_eq!(command.card_id, 12);
//!     assert_eq!(command.title.as_deref(), Some("new title"));
//!     assert_eq!(command.content, None);
//!     Ok(())
//! }
//! ```
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

pub mod config;
pub mod error;
pub mod expression;
pub mod mapping;
pub mod registry;
pub mod shape;

// Re-export main types for convenience
pub use config::MapperConfig;
pub use error::{Error, Result};
pub use expression::{Expr, Lambda, NativeFunction, Param};
pub use mapping::{CompiledMapping, MappingDefinition, MappingPlan};
pub use registry::{global, install_global, map_global, Mapper, SealedMapper};
pub use shape::{FieldValue, Record, Shape, ShapeDescriptor, Value, ValueType};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
