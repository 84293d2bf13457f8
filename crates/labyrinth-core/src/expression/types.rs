//! Configuration-time type checking of expressions
//!
//! Absence is lifted the way nullable operators usually are: member reads
//! through an optional record, and arithmetic with an optional operand,
//! produce optional results.
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

use super::ast::{BinaryOp, Expr, UnaryOp};
use crate::shape::ValueType;
use thiserror::Error;

/// Errors found while type checking or lowering an expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    /// Member read of a field the shape does not declare
    #[error("Unknown field '{field}' on {shape}")]
    UnknownField { shape: &'static str, field: String },

    /// Member read of something that is not a record
    #[error("Cannot read '{field}' from non-record {found} in {expr}")]
    NotARecord {
        field: String,
        found: String,
        expr: String,
    },

    /// Operator applied to an operand type it does not support
    #[error("Operator '{op}' does not accept {found} in {expr}")]
    InvalidOperand {
        op: String,
        found: String,
        expr: String,
    },

    /// Binary operands, branches or arguments disagree
    #[error("Type mismatch in {expr}: expected {expected}, found {found}")]
    Mismatch {
        expected: String,
        found: String,
        expr: String,
    },

    /// Native function called with the wrong number of arguments
    #[error("{function}() takes {expected} argument(s), {found} given")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    /// Expression references a parameter that is not in scope
    #[error("Unbound parameter '{name}' in {expr}")]
    UnboundParameter { name: String, expr: String },

    /// Value cannot be assigned to the target field
    #[error("Cannot assign {found} to field '{field}' of type {expected}")]
    Incompatible {
        field: String,
        expected: String,
        found: String,
    },
}

impl Expr {
    /// Infer the static type of this expression
    pub fn infer_type(&self) -> Result<ValueType, TypeError> {
        match self {
            Expr::Param(param) => Ok(param.ty().clone()),
            Expr::Literal { ty, .. } => Ok(ty.clone()),
            Expr::Member { base, field } => {
                let base_ty = base.infer_type()?;
                let shape = base_ty.record_shape().ok_or_else(|| TypeError::NotARecord {
                    field: field.clone(),
                    found: base_ty.to_string(),
                    expr: self.to_string(),
                })?;
                let descriptor = shape.field(field).ok_or_else(|| TypeError::UnknownField {
                    shape: shape.name(),
                    field: field.clone(),
                })?;
                Ok(lift(descriptor.ty().clone(), base_ty.is_optional()))
            }
            Expr::Unary { op, operand } => {
                let ty = operand.infer_type()?;
                let accepted = match op {
                    UnaryOp::Neg => ty.non_optional().is_signed(),
                    UnaryOp::Not => ty.non_optional() == &ValueType::Bool,
                };
                if !accepted {
                    return Err(TypeError::InvalidOperand {
                        op: match op {
                            UnaryOp::Neg => "-".to_string(),
                            UnaryOp::Not => "!".to_string(),
                        },
                        found: ty.to_string(),
                        expr: self.to_string(),
                    });
                }
                Ok(ty)
            }
            Expr::Binary { op, left, right } => self.infer_binary(*op, left, right),
            Expr::Coalesce { value, fallback } => {
                let value_ty = value.infer_type()?;
                let fallback_ty = fallback.infer_type()?;
                if !value_ty.is_optional() {
                    return Err(TypeError::InvalidOperand {
                        op: "??".to_string(),
                        found: value_ty.to_string(),
                        expr: self.to_string(),
                    });
                }
                if value_ty.non_optional() != fallback_ty.non_optional() {
                    return Err(self.mismatch(value_ty.non_optional(), &fallback_ty));
                }
                Ok(fallback_ty)
            }
            Expr::Conditional { condition, then, otherwise } => {
                let condition_ty = condition.infer_type()?;
                if condition_ty != ValueType::Bool {
                    return Err(self.mismatch(&ValueType::Bool, &condition_ty));
                }
                let then_ty = then.infer_type()?;
                let otherwise_ty = otherwise.infer_type()?;
                if then_ty.non_optional() != otherwise_ty.non_optional() {
                    return Err(self.mismatch(&then_ty, &otherwise_ty));
                }
                let optional = then_ty.is_optional() || otherwise_ty.is_optional();
                Ok(lift(then_ty.non_optional().clone(), optional))
            }
            Expr::Call { function, args } => {
                if args.len() != function.params().len() {
                    return Err(TypeError::ArgumentCount {
                        function: function.name().to_string(),
                        expected: function.params().len(),
                        found: args.len(),
                    });
                }
                for (arg, expected) in args.iter().zip(function.params()) {
                    let found = arg.infer_type()?;
                    if !is_assignable(&found, expected) {
                        return Err(self.mismatch(expected, &found));
                    }
                }
                Ok(function.returns().clone())
            }
        }
    }

    fn infer_binary(&self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<ValueType, TypeError> {
        let left_ty = left.infer_type()?;
        let right_ty = right.infer_type()?;

        if op.is_logical() {
            for ty in [&left_ty, &right_ty] {
                if ty != &ValueType::Bool {
                    return Err(self.invalid_operand(op, ty));
                }
            }
            return Ok(ValueType::Bool);
        }

        let base = left_ty.non_optional();
        if base != right_ty.non_optional() {
            return Err(self.mismatch(&left_ty, &right_ty));
        }

        if op.is_comparison() {
            let comparable = match op {
                BinaryOp::Eq | BinaryOp::Ne => !base.is_record(),
                _ => base.is_ordered(),
            };
            if !comparable {
                return Err(self.invalid_operand(op, &left_ty));
            }
            return Ok(ValueType::Bool);
        }

        let supported = base.is_numeric() || (op == BinaryOp::Add && base == &ValueType::String);
        if !supported {
            return Err(self.invalid_operand(op, &left_ty));
        }
        Ok(lift(base.clone(), left_ty.is_optional() || right_ty.is_optional()))
    }

    fn mismatch(&self, expected: &ValueType, found: &ValueType) -> TypeError {
        TypeError::Mismatch {
            expected: expected.to_string(),
            found: found.to_string(),
            expr: self.to_string(),
        }
    }

    fn invalid_operand(&self, op: BinaryOp, found: &ValueType) -> TypeError {
        TypeError::InvalidOperand {
            op: op.symbol().to_string(),
            found: found.to_string(),
            expr: self.to_string(),
        }
    }
}

/// Whether a value of type `found` may be stored where `expected` is declared
///
/// Exact matches always fit; a plain value fits its optional counterpart; an
/// optional value fits its plain counterpart because absent values are never
/// written.
pub fn is_assignable(found: &ValueType, expected: &ValueType) -> bool {
    found == expected || found.non_optional() == expected.non_optional()
}

fn lift(ty: ValueType, optional: bool) -> ValueType {
    if optional {
        ValueType::optional(ty)
    } else {
        ty
    }
}
