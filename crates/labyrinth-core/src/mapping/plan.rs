//! Compiled mapping plans
//!
//! A plan is the frozen result of compilation: an ordered list of steps whose
//! field accessors, absence guards and computed expressions were all resolved
//! up front. Running a plan only reads, evaluates and writes.
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

use crate::expression::{CompiledExpr, EvalError};
use crate::shape::{FieldDescriptor, Record, ShapeDescriptor, Value, ValueType};
use crate::{Error, Result};
use std::fmt;

/// Whether a copy happens when the source value is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Plain value types are always copied
    Always,
    /// Optional values are copied only when present, so the target keeps its
    /// default instead of receiving `None`
    SkipAbsent,
}

impl Guard {
    pub fn for_type(ty: &ValueType) -> Self {
        if ty.is_optional() {
            Guard::SkipAbsent
        } else {
            Guard::Always
        }
    }

    fn admits(self, value: &Value) -> bool {
        self == Guard::Always || !value.is_null()
    }
}

/// A pre-resolved field-to-field copy inside an auto-map step
#[derive(Debug)]
pub struct FieldCopy {
    from: &'static FieldDescriptor,
    to: &'static FieldDescriptor,
    guard: Guard,
}

impl FieldCopy {
    pub(crate) fn new(from: &'static FieldDescriptor, to: &'static FieldDescriptor) -> Self {
        Self {
            from,
            to,
            guard: Guard::for_type(from.ty()),
        }
    }

    pub fn field(&self) -> &'static str {
        self.to.name()
    }

    pub fn guard(&self) -> Guard {
        self.guard
    }
}

/// The value an auto-map step copies from
#[derive(Debug)]
pub enum AutoSource {
    /// The source record itself; no intermediate value is built
    Source,
    /// An intermediate value computed once per invocation
    Evaluated(CompiledExpr),
}

/// Copies every matching field of one auto-map value
#[derive(Debug)]
pub struct AutoMapStep {
    source: AutoSource,
    copies: Vec<FieldCopy>,
    skipped: Vec<&'static str>,
}

impl AutoMapStep {
    pub(crate) fn new(source: AutoSource, copies: Vec<FieldCopy>, skipped: Vec<&'static str>) -> Self {
        Self {
            source,
            copies,
            skipped,
        }
    }

    pub fn source(&self) -> &AutoSource {
        &self.source
    }

    pub fn copies(&self) -> &[FieldCopy] {
        &self.copies
    }

    /// Fields of the auto-map value that had no name-and-type match
    pub fn skipped_fields(&self) -> &[&'static str] {
        &self.skipped
    }

    fn apply(&self, source: &dyn Record, target: &mut dyn Record) -> Result<()> {
        match &self.source {
            AutoSource::Source => self.copy_fields(source, target),
            AutoSource::Evaluated(expr) => {
                let failed = |e: EvalError| Error::Evaluation {
                    message: e.to_string(),
                    target_field: format!("auto-map {}", expr),
                };
                if let Some(projected) = expr.project(source) {
                    return match projected.map_err(failed)? {
                        Some(context) => self.copy_fields(context, target),
                        None => Ok(()),
                    };
                }

                let value = expr.evaluate(source).map_err(failed)?;
                match value {
                    Value::Null => Ok(()),
                    Value::Record(context) => self.copy_fields(context.as_ref(), target),
                    other => Err(Error::Evaluation {
                        message: format!("expected a record, found {}", other.kind()),
                        target_field: format!("auto-map {}", expr),
                    }),
                }
            }
        }
    }

    fn copy_fields(&self, context: &dyn Record, target: &mut dyn Record) -> Result<()> {
        for copy in &self.copies {
            let value = copy.from.read(context);
            if copy.guard.admits(&value) {
                copy.to.write(target, value)?;
            }
        }
        Ok(())
    }
}

/// Where a property step reads its value
#[derive(Debug)]
pub enum ValueSource {
    Field(&'static FieldDescriptor),
    Computed(CompiledExpr),
}

/// Writes one explicitly mapped target field
#[derive(Debug)]
pub struct PropertyStep {
    value: ValueSource,
    to: &'static FieldDescriptor,
    guard: Guard,
}

impl PropertyStep {
    pub(crate) fn new(value: ValueSource, to: &'static FieldDescriptor, guard: Guard) -> Self {
        Self { value, to, guard }
    }

    pub fn field(&self) -> &'static str {
        self.to.name()
    }

    pub fn guard(&self) -> Guard {
        self.guard
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.value, ValueSource::Computed(_))
    }

    fn apply(&self, source: &dyn Record, target: &mut dyn Record) -> Result<()> {
        let value = match &self.value {
            ValueSource::Field(from) => from.read(source),
            ValueSource::Computed(expr) => expr.evaluate(source).map_err(|e| Error::Evaluation {
                message: e.to_string(),
                target_field: self.to.name().to_string(),
            })?,
        };
        if self.guard.admits(&value) {
            self.to.write(target, value)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum Step {
    AutoMap(AutoMapStep),
    Property(PropertyStep),
}

impl Step {
    /// Target fields this step may write, in write order
    pub fn written_fields(&self) -> Vec<&'static str> {
        match self {
            Step::AutoMap(auto) => auto.copies.iter().map(FieldCopy::field).collect(),
            Step::Property(property) => vec![property.field()],
        }
    }
}

/// Ordered steps for one (target, source) pair
#[derive(Debug)]
pub struct MappingPlan {
    target: &'static ShapeDescriptor,
    source: &'static ShapeDescriptor,
    steps: Vec<Step>,
}

impl MappingPlan {
    pub(crate) fn new(
        target: &'static ShapeDescriptor,
        source: &'static ShapeDescriptor,
        steps: Vec<Step>,
    ) -> Self {
        Self { target, source, steps }
    }

    pub fn target(&self) -> &'static ShapeDescriptor {
        self.target
    }

    pub fn source(&self) -> &'static ShapeDescriptor {
        self.source
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Target fields written by more than one step, with their writer count
    pub fn overridden_fields(&self) -> Vec<(&'static str, usize)> {
        let mut writers: Vec<(&'static str, usize)> = Vec::new();
        for field in self.target_fields() {
            match writers.iter_mut().find(|(name, _)| *name == field) {
                Some((_, count)) => *count += 1,
                None => writers.push((field, 1)),
            }
        }
        writers.retain(|(_, count)| *count > 1);
        writers
    }

    /// Target fields written by the plan, one entry per write in step order
    pub fn target_fields(&self) -> Vec<&'static str> {
        self.steps.iter().flat_map(Step::written_fields).collect()
    }

    /// Run every step against a freshly allocated target
    pub(crate) fn execute(&self, source: &dyn Record, target: &mut dyn Record) -> Result<()> {
        for step in &self.steps {
            match step {
                Step::AutoMap(auto) => auto.apply(source, target)?,
                Step::Property(property) => property.apply(source, target)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for MappingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source.name(), self.target.name())?;
        for step in &self.steps {
            match step {
                Step::AutoMap(auto) => {
                    match &auto.source {
                        AutoSource::Source => write!(f, "\n  auto source:")?,
                        AutoSource::Evaluated(expr) => write!(f, "\n  auto {}:", expr)?,
                    }
                    let fields = step.written_fields();
                    if fields.is_empty() {
                        write!(f, " (no matching fields)")?;
                    } else {
                        write!(f, " {}", fields.join(", "))?;
                    }
                }
                Step::Property(property) => {
                    write!(f, "\n  {} <- ", property.field())?;
                    match &property.value {
                        ValueSource::Field(from) => write!(f, "source.{}", from.name())?,
                        ValueSource::Computed(expr) => write!(f, "{}", expr)?,
                    }
                    if property.guard == Guard::SkipAbsent {
                        write!(f, " [skip absent]")?;
                    }
                }
            }
        }
        Ok(())
    }
}
