//! Lowering of expression trees into closures
//!
//! An expression closed over a single source parameter is type checked and
//! turned into a tree of boxed closures once. Field reads are resolved to
//! their descriptors here, so evaluation never looks anything up by name.
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

use super::ast::{BinaryOp, Expr, Param, UnaryOp};
use super::types::TypeError;
use crate::shape::{FieldDescriptor, Record, Value, ValueType};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Runtime failure of a compiled expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("division by zero in {expr}")]
    DivisionByZero { expr: String },

    #[error("{function}() failed: {message}")]
    Native { function: String, message: String },

    #[error("unexpected {found} in {expr}")]
    UnexpectedValue { found: String, expr: String },
}

type Eval = Box<dyn Fn(&dyn Record) -> Result<Value, EvalError> + Send + Sync>;
type Projection =
    Box<dyn for<'a> Fn(&'a dyn Record) -> Result<Option<&'a dyn Record>, EvalError> + Send + Sync>;

/// A type-checked expression ready to evaluate against a source record
pub struct CompiledExpr {
    ty: ValueType,
    text: String,
    eval: Eval,
    projection: Option<Projection>,
}

impl CompiledExpr {
    /// Compile `expr`, whose only free parameter must be `source`
    pub fn compile(expr: &Expr, source: &Param) -> Result<Self, TypeError> {
        let ty = expr.infer_type()?;
        let eval = lower(expr, source)?;
        let projection = match ty.record_shape() {
            Some(_) => lower_projection(expr, source)?,
            None => None,
        };
        Ok(Self {
            ty,
            text: expr.to_string(),
            eval,
            projection,
        })
    }

    pub fn ty(&self) -> &ValueType {
        &self.ty
    }

    pub fn evaluate(&self, source: &dyn Record) -> Result<Value, EvalError> {
        (self.eval)(source)
    }

    /// Borrow a record result straight out of `source`
    ///
    /// Only available for record-typed member chains rooted at the source;
    /// `None` means the expression has to be evaluated by value.
    pub fn project<'a>(
        &self,
        source: &'a dyn Record,
    ) -> Option<Result<Option<&'a dyn Record>, EvalError>> {
        self.projection.as_ref().map(|project| project(source))
    }
}

impl fmt::Display for CompiledExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for CompiledExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpr")
            .field("expr", &self.text)
            .field("ty", &self.ty.to_string())
            .finish()
    }
}

fn lower(expr: &Expr, source: &Param) -> Result<Eval, TypeError> {
    let eval: Eval = match expr {
        Expr::Param(param) => {
            if param != source {
                return Err(TypeError::UnboundParameter {
                    name: param.name().to_string(),
                    expr: expr.to_string(),
                });
            }
            Box::new(|record: &dyn Record| Ok(Value::Record(record.clone_record())))
        }
        Expr::Literal { value, .. } => {
            let value = value.clone();
            Box::new(move |_: &dyn Record| Ok(value.clone()))
        }
        Expr::Member { base, field } => {
            let descriptor = member_descriptor(base, field)?;
            if base.is_param(source) {
                Box::new(move |record: &dyn Record| Ok(descriptor.read(record)))
            } else if let Some(base) = lower_projection(base, source)? {
                // Walk the record chain by reference; only the leaf is copied.
                Box::new(move |record: &dyn Record| {
                    Ok(match base(record)? {
                        Some(inner) => descriptor.read(inner),
                        None => Value::Null,
                    })
                })
            } else {
                let base_eval = lower(base, source)?;
                let text = expr.to_string();
                Box::new(move |record: &dyn Record| match base_eval(record)? {
                    Value::Null => Ok(Value::Null),
                    Value::Record(inner) => Ok(descriptor.read(inner.as_ref())),
                    other => Err(unexpected(&other, &text)),
                })
            }
        }
        Expr::Unary { op, operand } => {
            let operand = lower(operand, source)?;
            let op = *op;
            let text = expr.to_string();
            Box::new(move |record: &dyn Record| {
                let value = operand(record)?;
                match (op, value) {
                    (_, Value::Null) => Ok(Value::Null),
                    (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (UnaryOp::Neg, Value::I32(n)) => Ok(Value::I32(n.wrapping_neg())),
                    (UnaryOp::Neg, Value::I64(n)) => Ok(Value::I64(n.wrapping_neg())),
                    (UnaryOp::Neg, Value::F64(n)) => Ok(Value::F64(-n)),
                    (_, other) => Err(unexpected(&other, &text)),
                }
            })
        }
        Expr::Binary { op, left, right } => {
            let left = lower(left, source)?;
            let right = lower(right, source)?;
            let op = *op;
            let text = expr.to_string();
            match op {
                BinaryOp::And => Box::new(move |record: &dyn Record| {
                    if truthy(left(record)?, &text)? {
                        right(record)
                    } else {
                        Ok(Value::Bool(false))
                    }
                }),
                BinaryOp::Or => Box::new(move |record: &dyn Record| {
                    if truthy(left(record)?, &text)? {
                        Ok(Value::Bool(true))
                    } else {
                        right(record)
                    }
                }),
                _ if op.is_comparison() => Box::new(move |record: &dyn Record| {
                    let l = left(record)?;
                    let r = right(record)?;
                    Ok(Value::Bool(compare(op, &l, &r)))
                }),
                _ => Box::new(move |record: &dyn Record| {
                    let l = left(record)?;
                    let r = right(record)?;
                    arithmetic(op, l, r, &text)
                }),
            }
        }
        Expr::Coalesce { value, fallback } => {
            let value = lower(value, source)?;
            let fallback = lower(fallback, source)?;
            Box::new(move |record: &dyn Record| match value(record)? {
                Value::Null => fallback(record),
                present => Ok(present),
            })
        }
        Expr::Conditional { condition, then, otherwise } => {
            let condition = lower(condition, source)?;
            let then = lower(then, source)?;
            let otherwise = lower(otherwise, source)?;
            let text = expr.to_string();
            Box::new(move |record: &dyn Record| {
                if truthy(condition(record)?, &text)? {
                    then(record)
                } else {
                    otherwise(record)
                }
            })
        }
        Expr::Call { function, args } => {
            let args = args
                .iter()
                .map(|arg| lower(arg, source))
                .collect::<Result<Vec<_>, _>>()?;
            let function = function.clone();
            let text = expr.to_string();
            Box::new(move |record: &dyn Record| {
                let values = args
                    .iter()
                    .map(|arg| arg(record))
                    .collect::<Result<Vec<_>, _>>()?;
                let value = function.invoke(&values).map_err(|message| EvalError::Native {
                    function: function.name().to_string(),
                    message,
                })?;
                if !value.conforms_to(function.returns()) {
                    return Err(unexpected(&value, &text));
                }
                Ok(value)
            })
        }
    };
    Ok(eval)
}

/// Lower a chain of record member reads rooted at the source parameter
///
/// Returns `None` for any other expression; those are evaluated by value.
fn lower_projection(expr: &Expr, source: &Param) -> Result<Option<Projection>, TypeError> {
    match expr {
        Expr::Param(param) if param == source => Ok(Some(projection(|record| Ok(Some(record))))),
        Expr::Member { base, field } => {
            let descriptor = member_descriptor(base, field)?;
            let Some(base) = lower_projection(base, source)? else {
                return Ok(None);
            };
            Ok(Some(projection(move |record| {
                Ok(base(record)?.and_then(|inner| descriptor.project(inner)))
            })))
        }
        _ => Ok(None),
    }
}

fn projection<P>(project: P) -> Projection
where
    P: for<'a> Fn(&'a dyn Record) -> Result<Option<&'a dyn Record>, EvalError> + Send + Sync + 'static,
{
    Box::new(project)
}

fn member_descriptor(base: &Expr, field: &str) -> Result<&'static FieldDescriptor, TypeError> {
    let base_ty = base.infer_type()?;
    let shape = base_ty.record_shape().ok_or_else(|| TypeError::NotARecord {
        field: field.to_string(),
        found: base_ty.to_string(),
        expr: base.to_string(),
    })?;
    shape.field(field).ok_or_else(|| TypeError::UnknownField {
        shape: shape.name(),
        field: field.to_string(),
    })
}

fn unexpected(value: &Value, expr: &str) -> EvalError {
    EvalError::UnexpectedValue {
        found: value.kind().to_string(),
        expr: expr.to_string(),
    }
}

fn truthy(value: Value, expr: &str) -> Result<bool, EvalError> {
    value.as_bool().ok_or_else(|| unexpected(&value, expr))
}

/// Comparison with lifted absence: two absent values are equal, an absent
/// value is unequal to any present one and never ordered
fn compare(op: BinaryOp, left: &Value, right: &Value) -> bool {
    match op {
        BinaryOp::Eq => left.scalar_eq(right),
        BinaryOp::Ne => !left.scalar_eq(right),
        _ => match left.compare(right) {
            Some(ordering) => match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                BinaryOp::Ge => ordering != Ordering::Less,
                _ => false,
            },
            None => false,
        },
    }
}

macro_rules! integer_arithmetic {
    ($op:expr, $a:expr, $b:expr, $variant:ident, $text:expr) => {{
        let (a, b) = ($a, $b);
        let result = match $op {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::Div | BinaryOp::Rem if b == 0 => {
                return Err(EvalError::DivisionByZero { expr: $text.to_string() });
            }
            BinaryOp::Div => a.wrapping_div(b),
            BinaryOp::Rem => a.wrapping_rem(b),
            _ => return Err(unexpected(&Value::$variant(a), $text)),
        };
        Ok(Value::$variant(result))
    }};
}

fn arithmetic(op: BinaryOp, left: Value, right: Value, text: &str) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::I32(a), Value::I32(b)) => integer_arithmetic!(op, a, b, I32, text),
        (Value::I64(a), Value::I64(b)) => integer_arithmetic!(op, a, b, I64, text),
        (Value::U32(a), Value::U32(b)) => integer_arithmetic!(op, a, b, U32, text),
        (Value::U64(a), Value::U64(b)) => integer_arithmetic!(op, a, b, U64, text),
        (Value::F64(a), Value::F64(b)) => Ok(Value::F64(match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Rem => a % b,
            _ => return Err(unexpected(&Value::F64(a), text)),
        })),
        (Value::String(a), Value::String(b)) if op == BinaryOp::Add => Ok(Value::String(a + &b)),
        (other, _) => Err(unexpected(&other, text)),
    }
}
