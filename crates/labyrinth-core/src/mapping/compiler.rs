//! Mapping compilation
//!
//! Turns a [`MappingDefinition`] into a [`MappingPlan`]. All rules are grafted
//! onto one shared source parameter, field matches are resolved against the
//! shape descriptors, and every computed value is type checked and lowered.
//! Nothing in this module runs per mapping call.
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

use super::definition::{AutoMapRule, MappingDefinition, PropertyMap, PropertySource};
use super::plan::{
    AutoMapStep, AutoSource, FieldCopy, Guard, MappingPlan, PropertyStep, Step, ValueSource,
};
use crate::config::MapperConfig;
use crate::expression::{is_assignable, CompiledExpr, Expr, Param, TypeError};
use crate::shape::{FieldDescriptor, Shape, ShapeDescriptor, ValueType};
use crate::{Error, Result};
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, debug_span, trace, warn};

/// Compiles mapping definitions under one configuration
pub struct Compiler<'c> {
    config: &'c MapperConfig,
}

impl<'c> Compiler<'c> {
    pub fn new(config: &'c MapperConfig) -> Self {
        Self { config }
    }

    pub fn compile<T: Shape, S: Shape>(
        &self,
        definition: MappingDefinition<T, S>,
    ) -> Result<CompiledMapping<T, S>> {
        let target = T::shape();
        let source = S::shape();
        let span = debug_span!(
            "compile_mapping",
            target_shape = target.name(),
            source_shape = source.name()
        );
        let _enter = span.enter();

        let source_param = Param::of::<S>("source");
        let source_expr = Expr::Param(source_param.clone());

        let mut steps = Vec::with_capacity(definition.rule_count());
        for rule in definition.auto_maps() {
            let step = self.compile_auto_map(rule, &source_param, &source_expr, target)?;
            steps.push(Step::AutoMap(step));
        }
        for map in definition.property_maps() {
            let step = compile_property_map(map, &source_param, &source_expr, source, target)?;
            steps.push(Step::Property(step));
        }

        let plan = MappingPlan::new(target, source, steps);
        if self.config.warn_on_overrides {
            report_overrides(&plan);
        }
        if self.config.log_plans {
            debug!(plan = %plan, "Compiled mapping plan");
        }

        Ok(CompiledMapping {
            plan,
            _shapes: PhantomData,
        })
    }

    fn compile_auto_map(
        &self,
        rule: &AutoMapRule,
        source_param: &Param,
        source_expr: &Expr,
        target: &'static ShapeDescriptor,
    ) -> Result<AutoMapStep> {
        let body = rule.source().apply(source_expr);
        let ty = body.infer_type()?;
        let context = ty.record_shape().ok_or_else(|| {
            Error::contract(
                format!("auto-map source must produce a record, found {}", ty),
                rule.source(),
            )
        })?;

        let source = if body.is_param(source_param) {
            AutoSource::Source
        } else {
            AutoSource::Evaluated(CompiledExpr::compile(&body, source_param)?)
        };

        let mut copies = Vec::new();
        let mut skipped = Vec::new();
        for field in context.fields() {
            match target.field(field.name()) {
                Some(to) if to.ty() == field.ty() => copies.push(FieldCopy::new(field, to)),
                found => {
                    skipped.push(field.name());
                    self.report_skipped(context, field, found);
                }
            }
        }

        Ok(AutoMapStep::new(source, copies, skipped))
    }

    fn report_skipped(
        &self,
        context: &ShapeDescriptor,
        field: &FieldDescriptor,
        found: Option<&FieldDescriptor>,
    ) {
        let reason = match found {
            Some(to) => format!("target type is {}", to.ty()),
            None => "no target field".to_string(),
        };
        if self.config.report_skipped_fields {
            debug!(shape = context.name(), field = field.name(), ty = %field.ty(), %reason, "Auto-map skipped field");
        } else {
            trace!(shape = context.name(), field = field.name(), ty = %field.ty(), %reason, "Auto-map skipped field");
        }
    }
}

fn compile_property_map(
    map: &PropertyMap,
    source_param: &Param,
    source_expr: &Expr,
    source: &'static ShapeDescriptor,
    target: &'static ShapeDescriptor,
) -> Result<PropertyStep> {
    let to = target
        .field(map.target())
        .ok_or_else(|| TypeError::UnknownField {
            shape: target.name(),
            field: map.target().to_string(),
        })?;

    let (value, ty) = match map.source() {
        PropertySource::Field(name) => source_field(source, name)?,
        PropertySource::Computed(lambda) => {
            let body = lambda.apply(source_expr);
            match body.member_of(source_param) {
                Some(name) => source_field(source, name)?,
                None => {
                    let compiled = CompiledExpr::compile(&body, source_param)?;
                    let ty = compiled.ty().clone();
                    (ValueSource::Computed(compiled), ty)
                }
            }
        }
    };

    if !is_assignable(&ty, to.ty()) {
        return Err(TypeError::Incompatible {
            field: to.name().to_string(),
            expected: to.ty().to_string(),
            found: ty.to_string(),
        }
        .into());
    }

    Ok(PropertyStep::new(value, to, Guard::for_type(&ty)))
}

fn source_field(
    source: &'static ShapeDescriptor,
    name: &str,
) -> std::result::Result<(ValueSource, ValueType), TypeError> {
    let from = source.field(name).ok_or_else(|| TypeError::UnknownField {
        shape: source.name(),
        field: name.to_string(),
    })?;
    Ok((ValueSource::Field(from), from.ty().clone()))
}

fn report_overrides(plan: &MappingPlan) {
    for (field, count) in plan.overridden_fields() {
        warn!(
            target_shape = plan.target().name(),
            field,
            writers = count,
            "Target field written by multiple rules, the last one wins"
        );
    }
}

/// A compiled, immutable mapping from `S` to `T`
pub struct CompiledMapping<T: Shape, S: Shape> {
    plan: MappingPlan,
    _shapes: PhantomData<fn(&S) -> T>,
}

impl<T: Shape, S: Shape> CompiledMapping<T, S> {
    /// Map `source` into a freshly default-constructed `T`
    pub fn map(&self, source: &S) -> Result<T> {
        let mut target = T::default();
        self.plan.execute(source, &mut target)?;
        Ok(target)
    }

    pub fn plan(&self) -> &MappingPlan {
        &self.plan
    }
}

impl<T: Shape, S: Shape> fmt::Debug for CompiledMapping<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledMapping")
            .field("plan", &self.plan)
            .finish()
    }
}
