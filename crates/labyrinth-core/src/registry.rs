//! Mapping registry
//!
//! A [`Mapper`] owns one compiled mapping per (target, source) pair. It is
//! filled during initialization, then sealed into an immutable
//! [`SealedMapper`] that can be shared across threads or installed once as
//! the process-wide mapper.
//!
//! ```
//! use labyrinth_core::{impl_shape, Lambda, Mapper};
//!
//! #[derive(Debug, Clone, Default)]
//! struct Params { id: i32 }
//! impl_shape!(Params { id: i32 });
//!
//! #[derive(Debug, Clone, Default)]
//! struct Command { card_id: i32 }
//! impl_shape!(Command { card_id: i32 });
//!
//! let mut mapper = Mapper::new();
//! mapper.configure::<Command, Params>(|m| {
//!     m.map_property(
//!         Lambda::new::<Params>(|p| p.field("id")),
//!         Lambda::new::<Command>(|c| c.field("card_id")),
//!     )?;
//!     Ok(())
//! })?;
//!
//! let mapper = mapper.seal();
//! let command: Command = mapper.map(&Params { id: 42 })?;
//! assert_eq!(command.card_id, 42);
//! # Ok::<(), labyrinth_core::Error>(())
//! ```
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

use crate::config::MapperConfig;
use crate::mapping::{CompiledMapping, MappingDefinition};
use crate::shape::Shape;
use crate::{Error, Result};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, info};

type MappingKey = (TypeId, TypeId);

/// Compiled mappings keyed by (target, source) type
#[derive(Default)]
struct Mappings {
    entries: HashMap<MappingKey, Box<dyn Any + Send + Sync>>,
}

impl Mappings {
    fn key<T: Shape, S: Shape>() -> MappingKey {
        (TypeId::of::<T>(), TypeId::of::<S>())
    }

    fn contains<T: Shape, S: Shape>(&self) -> bool {
        self.entries.contains_key(&Self::key::<T, S>())
    }

    fn insert<T: Shape, S: Shape>(&mut self, mapping: CompiledMapping<T, S>) {
        self.entries.insert(Self::key::<T, S>(), Box::new(mapping));
    }

    fn get<T: Shape, S: Shape>(&self) -> Result<&CompiledMapping<T, S>> {
        self.entries
            .get(&Self::key::<T, S>())
            .and_then(|entry| entry.downcast_ref::<CompiledMapping<T, S>>())
            .ok_or_else(|| Error::NotConfigured {
                target: T::shape().name(),
                source_shape: S::shape().name(),
            })
    }

    fn map<T: Shape, S: Shape>(&self, source: &S) -> Result<T> {
        self.get::<T, S>()?.map(source)
    }
}

/// Registry under construction
#[derive(Default)]
pub struct Mapper {
    config: MapperConfig,
    mappings: Mappings,
}

impl Mapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MapperConfig) -> Self {
        Self {
            config,
            mappings: Mappings::default(),
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Configure and compile the mapping from `S` to `T`
    ///
    /// Rules may be added in any order inside `setup`; auto-maps always run
    /// before property maps. Each pair can be configured once.
    pub fn configure<T, S>(
        &mut self,
        setup: impl FnOnce(&mut MappingDefinition<T, S>) -> Result<()>,
    ) -> Result<&mut Self>
    where
        T: Shape,
        S: Shape,
    {
        if self.mappings.contains::<T, S>() {
            return Err(Error::DuplicateMapping {
                target: T::shape().name(),
                source_shape: S::shape().name(),
            });
        }

        let mut definition = MappingDefinition::new();
        setup(&mut definition)?;
        let rules = definition.rule_count();
        let mapping = definition.compile(&self.config)?;

        debug!(
            target_shape = T::shape().name(),
            source_shape = S::shape().name(),
            rules,
            steps = mapping.plan().steps().len(),
            "Registered mapping"
        );
        self.mappings.insert(mapping);
        Ok(self)
    }

    /// Map `source` into a new `T`
    pub fn map<T: Shape, S: Shape>(&self, source: &S) -> Result<T> {
        self.mappings.map(source)
    }

    /// The compiled mapping for a pair, for plan inspection
    pub fn mapping<T: Shape, S: Shape>(&self) -> Result<&CompiledMapping<T, S>> {
        self.mappings.get()
    }

    pub fn is_configured<T: Shape, S: Shape>(&self) -> bool {
        self.mappings.contains::<T, S>()
    }

    pub fn len(&self) -> usize {
        self.mappings.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.entries.is_empty()
    }

    /// Freeze the registry; no further mappings can be configured
    pub fn seal(self) -> SealedMapper {
        info!(mappings = self.len(), "Mapper sealed");
        SealedMapper {
            mappings: self.mappings,
        }
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("config", &self.config)
            .field("mappings", &self.len())
            .finish()
    }
}

/// Read-only registry produced by [`Mapper::seal`]
pub struct SealedMapper {
    mappings: Mappings,
}

impl SealedMapper {
    pub fn map<T: Shape, S: Shape>(&self, source: &S) -> Result<T> {
        self.mappings.map(source)
    }

    pub fn mapping<T: Shape, S: Shape>(&self) -> Result<&CompiledMapping<T, S>> {
        self.mappings.get()
    }

    pub fn is_configured<T: Shape, S: Shape>(&self) -> bool {
        self.mappings.contains::<T, S>()
    }

    pub fn len(&self) -> usize {
        self.mappings.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.entries.is_empty()
    }
}

impl fmt::Debug for SealedMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedMapper")
            .field("mappings", &self.len())
            .finish()
    }
}

static GLOBAL_MAPPER: OnceLock<SealedMapper> = OnceLock::new();

/// Install the process-wide mapper; succeeds only once
pub fn install_global(mapper: SealedMapper) -> Result<()> {
    let mappings = mapper.len();
    GLOBAL_MAPPER
        .set(mapper)
        .map_err(|_| Error::AlreadyInstalled)?;
    info!(mappings, "Global mapper installed");
    Ok(())
}

/// The process-wide mapper, if installed
pub fn global() -> Option<&'static SealedMapper> {
    GLOBAL_MAPPER.get()
}

/// Map through the process-wide mapper
pub fn map_global<T: Shape, S: Shape>(source: &S) -> Result<T> {
    global().ok_or(Error::NotInstalled)?.map(source)
}
