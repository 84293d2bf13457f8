//! Mapping rule model
//!
//! A `MappingDefinition` collects the rules for one (target, source) pair in
//! call order. Structural contracts are checked as each rule is added;
//! everything that needs field lookups waits for compilation.
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

use super::compiler::{CompiledMapping, Compiler};
use crate::config::MapperConfig;
use crate::expression::Lambda;
use crate::shape::{Shape, ValueType};
use crate::{Error, Result};
use std::fmt;
use std::marker::PhantomData;

/// Where a property map reads its value from
#[derive(Debug, Clone)]
pub enum PropertySource {
    /// The source field with the same name as the target field
    Field(String),
    /// A captured expression over the source
    Computed(Lambda),
}

/// One explicit field correspondence
#[derive(Debug, Clone)]
pub struct PropertyMap {
    target: String,
    source: PropertySource,
}

impl PropertyMap {
    /// Name of the target field this rule writes
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn source(&self) -> &PropertySource {
        &self.source
    }
}

impl fmt::Display for PropertyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            PropertySource::Field(name) => write!(f, "{} <- {}", self.target, name),
            PropertySource::Computed(lambda) => write!(f, "{} <- {}", self.target, lambda),
        }
    }
}

/// A declared auto-map source
#[derive(Debug, Clone)]
pub struct AutoMapRule {
    source: Lambda,
}

impl AutoMapRule {
    pub fn source(&self) -> &Lambda {
        &self.source
    }
}

/// The rules configured for mapping `S` into `T`
pub struct MappingDefinition<T: Shape, S: Shape> {
    auto_maps: Vec<AutoMapRule>,
    property_maps: Vec<PropertyMap>,
    _shapes: PhantomData<fn(&S) -> T>,
}

impl<T: Shape, S: Shape> MappingDefinition<T, S> {
    pub fn new() -> Self {
        Self {
            auto_maps: Vec::new(),
            property_maps: Vec::new(),
            _shapes: PhantomData,
        }
    }

    /// Copy every field of the evaluated value whose name and type match a
    /// target field
    ///
    /// ```
    /// # use labyrinth_core::{impl_shape, MappingDefinition, Lambda};
    /// # #[derive(Debug, Clone, Default)] struct Dto { content: Option<String> }
    /// # #[derive(Debug, Clone, Default)] struct Params { data: Dto }
    /// # #[derive(Debug, Clone, Default)] struct Command { content: Option<String> }
    /// # impl_shape!(Dto { content: Option<String> });
    /// # impl_shape!(Params { data: Dto });
    /// # impl_shape!(Command { content: Option<String> });
    /// let mut mapping = MappingDefinition::<Command, Params>::new();
    /// mapping
    ///     .auto_map(Lambda::new::<Params>(|p| p.field("data")))?
    ///     .auto_map(Lambda::new::<Params>(|p| p.clone()))?;
    /// assert_eq!(mapping.auto_maps().len(), 2);
    /// # Ok::<(), labyrinth_core::Error>(())
    /// ```
    pub fn auto_map(&mut self, source: Lambda) -> Result<&mut Self> {
        expect_param::<S>(&source, "auto-map source")?;
        self.auto_maps.push(AutoMapRule { source });
        Ok(self)
    }

    /// Write the value of `source` into the field read by `dest`
    ///
    /// `dest` must be a direct member read of its own parameter, e.g.
    /// `Lambda::new::<T>(|c| c.field("card_id"))`.
    pub fn map_property(&mut self, source: Lambda, dest: Lambda) -> Result<&mut Self> {
        expect_param::<S>(&source, "property source")?;
        expect_param::<T>(&dest, "destination selector")?;
        let target = dest
            .member_name()
            .ok_or_else(|| {
                Error::contract(
                    "destination selector must be a direct member read of its parameter",
                    &dest,
                )
            })?
            .to_string();

        self.property_maps.push(PropertyMap {
            target,
            source: PropertySource::Computed(source),
        });
        Ok(self)
    }

    /// Copy the source field read by `source` into the same-named target field
    pub fn map_same_property(&mut self, source: Lambda) -> Result<&mut Self> {
        expect_param::<S>(&source, "property source")?;
        let name = source
            .member_name()
            .ok_or_else(|| {
                Error::contract(
                    "same-name property source must be a direct member read of its parameter",
                    &source,
                )
            })?
            .to_string();

        self.property_maps.push(PropertyMap {
            target: name.clone(),
            source: PropertySource::Field(name),
        });
        Ok(self)
    }

    pub fn auto_maps(&self) -> &[AutoMapRule] {
        &self.auto_maps
    }

    pub fn property_maps(&self) -> &[PropertyMap] {
        &self.property_maps
    }

    pub fn rule_count(&self) -> usize {
        self.auto_maps.len() + self.property_maps.len()
    }

    /// Compile the rules into a reusable mapping
    pub fn compile(self, config: &MapperConfig) -> Result<CompiledMapping<T, S>> {
        Compiler::new(config).compile(self)
    }
}

impl<T: Shape, S: Shape> fmt::Debug for MappingDefinition<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingDefinition")
            .field("target", &T::shape().name())
            .field("source", &S::shape().name())
            .field("auto_maps", &self.auto_maps)
            .field("property_maps", &self.property_maps)
            .finish()
    }
}

impl<T: Shape, S: Shape> Default for MappingDefinition<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

fn expect_param<R: Shape>(lambda: &Lambda, role: &str) -> Result<()> {
    let expected = ValueType::Record(R::shape());
    if lambda.param().ty() != &expected {
        return Err(Error::contract(
            format!(
                "{} must take a {} parameter, found {}",
                role,
                expected,
                lambda.param().ty()
            ),
            lambda,
        ));
    }
    Ok(())
}
