//! Mapping definitions and their compiled form
//!
//! A mapping for one (target, source) pair is described by a
//! [`MappingDefinition`]: auto-map rules first, then property rules, each
//! group in call order. Compilation resolves every rule into a
//! [`MappingPlan`] whose steps run in that same order, so a later rule
//! overrides an earlier one that wrote the same target field.
//!
//! # Module Organization
//!
//! - [`definition`] - Rule model and structural contract checks
//! - [`compiler`] - Rule resolution, type checking and plan construction
//! - [`plan`] - Compiled steps and their execution
//! - [`tests`] - Compilation and execution tests
//!
//! # Examples
//!
//! ```
//! use labyrinth_core::{impl_shape, Lambda, MapperConfig, MappingDefinition};
//!
//! #[derive(Debug, Clone, Default)]
//! struct Params { id: i32, comment: Option<String> }
//! impl_shape!(Params { id: i32, comment: Option<String> });
//!
//! #[derive(Debug, Clone, Default)]
//! struct Command { card_id: i32, comment: Option<String> }
//! impl_shape!(Command { card_id: i32, comment: Option<String> });
//!
//! let mut definition = MappingDefinition::<Command, Params>::new();
//! definition
//!     .auto_map(Lambda::new::<Params>(|p| p.clone()))?
//!     .map_property(
//!         Lambda::new::<Params>(|p| p.field("id")),
//!         Lambda::new::<Command>(|c| c.field("card_id")),
//!     )?;
//!
//! let mapping = definition.compile(&MapperConfig::default())?;
//! let command = mapping.map(&Params { id: 7, comment: None })?;
//! assert_eq!(command.card_id, 7);
//! assert_eq!(command.comment, None);
//! # Ok::<(), labyrinth_core::Error>(())
//! ```
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

pub mod compiler;
pub mod definition;
pub mod plan;

#[cfg(test)]
mod tests;

pub use compiler::{CompiledMapping, Compiler};
pub use definition::{AutoMapRule, MappingDefinition, PropertyMap, PropertySource};
pub use plan::{AutoMapStep, AutoSource, FieldCopy, Guard, MappingPlan, PropertyStep, Step};
