//! Parameter substitution over expression trees
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

use super::ast::{Expr, Param};

/// Replace every reference to `param` in `expr` with `replacement`
///
/// Matching is by parameter identity, so a different parameter that happens
/// to share the name is left alone. All other nodes are rebuilt unchanged.
pub fn rebind(expr: &Expr, param: &Param, replacement: &Expr) -> Expr {
    Rebinder { param, replacement }.visit(expr)
}

struct Rebinder<'a> {
    param: &'a Param,
    replacement: &'a Expr,
}

impl Rebinder<'_> {
    fn visit(&self, expr: &Expr) -> Expr {
        match expr {
            Expr::Param(p) if p == self.param => self.replacement.clone(),
            Expr::Param(_) | Expr::Literal { .. } => expr.clone(),
            Expr::Member { base, field } => Expr::Member {
                base: self.visit_boxed(base),
                field: field.clone(),
            },
            Expr::Unary { op, operand } => Expr::Unary {
                op: *op,
                operand: self.visit_boxed(operand),
            },
            Expr::Binary { op, left, right } => Expr::Binary {
                op: *op,
                left: self.visit_boxed(left),
                right: self.visit_boxed(right),
            },
            Expr::Coalesce { value, fallback } => Expr::Coalesce {
                value: self.visit_boxed(value),
                fallback: self.visit_boxed(fallback),
            },
            Expr::Conditional { condition, then, otherwise } => Expr::Conditional {
                condition: self.visit_boxed(condition),
                then: self.visit_boxed(then),
                otherwise: self.visit_boxed(otherwise),
            },
            Expr::Call { function, args } => Expr::Call {
                function: function.clone(),
                args: args.iter().map(|arg| self.visit(arg)).collect(),
            },
        }
    }

    fn visit_boxed(&self, expr: &Expr) -> Box<Expr> {
        Box::new(self.visit(expr))
    }
}
