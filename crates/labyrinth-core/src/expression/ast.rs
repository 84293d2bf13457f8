//! Expression trees captured by mapping rules
//!
//! Each rule's source expression is written against its own parameter. The
//! compiler later rebinds those parameters onto one shared source parameter,
//! so parameter identity is an id, never a name.
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

use super::rebind::rebind;
use crate::shape::{FieldValue, Shape, Value, ValueType};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_PARAM_ID: AtomicU64 = AtomicU64::new(1);

/// A formal parameter of a lambda
#[derive(Debug, Clone)]
pub struct Param {
    id: u64,
    name: String,
    ty: ValueType,
}

impl Param {
    /// Allocate a fresh parameter; two calls never produce equal parameters
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            id: NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            ty,
        }
    }

    /// A fresh parameter typed as the record shape `S`
    pub fn of<S: Shape>(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Record(S::shape()))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &ValueType {
        &self.ty
    }
}

impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Param {}

impl Hash for Param {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

type NativeFn = dyn Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync;

/// A named Rust function callable from an expression
#[derive(Clone)]
pub struct NativeFunction {
    name: String,
    params: Vec<ValueType>,
    returns: ValueType,
    func: Arc<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, params: Vec<ValueType>, returns: ValueType, func: F) -> Self
    where
        F: Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params,
            returns,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    pub fn returns(&self) -> &ValueType {
        &self.returns
    }

    pub(crate) fn invoke(&self, args: &[Value]) -> std::result::Result<Value, String> {
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("returns", &self.returns.to_string())
            .finish()
    }
}

/// Expression tree node
#[derive(Debug, Clone)]
pub enum Expr {
    /// Reference to a lambda parameter
    Param(Param),
    /// Field read (`base.field`)
    Member { base: Box<Expr>, field: String },
    /// Constant with its declared type
    Literal { value: Value, ty: ValueType },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    /// `value` unless it is absent, then `fallback`
    Coalesce { value: Box<Expr>, fallback: Box<Expr> },
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call { function: NativeFunction, args: Vec<Expr> },
}

impl Expr {
    /// Constant expression of any supported field type
    pub fn lit<V: FieldValue>(value: V) -> Expr {
        Expr::Literal {
            value: value.to_value(),
            ty: V::value_type(),
        }
    }

    /// The absent value of an optional type
    pub fn null(ty: ValueType) -> Expr {
        Expr::Literal {
            value: Value::Null,
            ty: ValueType::optional(ty),
        }
    }

    /// Read a field of this expression's record value
    pub fn field(&self, name: impl Into<String>) -> Expr {
        Expr::Member {
            base: Box::new(self.clone()),
            field: name.into(),
        }
    }

    pub fn binary(op: BinaryOp, left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left.into()),
            right: Box::new(right.into()),
        }
    }

    pub fn equals(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Eq, self, other)
    }

    pub fn not_equals(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Ne, self, other)
    }

    pub fn less_than(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Lt, self, other)
    }

    pub fn less_or_equal(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Le, self, other)
    }

    pub fn greater_than(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Gt, self, other)
    }

    pub fn greater_or_equal(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Ge, self, other)
    }

    pub fn and(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::And, self, other)
    }

    pub fn or(self, other: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Or, self, other)
    }

    /// `self` when present, otherwise `fallback`
    pub fn or_else(self, fallback: impl Into<Expr>) -> Expr {
        Expr::Coalesce {
            value: Box::new(self),
            fallback: Box::new(fallback.into()),
        }
    }

    pub fn when(condition: impl Into<Expr>, then: impl Into<Expr>, otherwise: impl Into<Expr>) -> Expr {
        Expr::Conditional {
            condition: Box::new(condition.into()),
            then: Box::new(then.into()),
            otherwise: Box::new(otherwise.into()),
        }
    }

    pub fn call(function: NativeFunction, args: Vec<Expr>) -> Expr {
        Expr::Call { function, args }
    }

    /// Field name if this is a direct member read of `param`
    pub fn member_of(&self, param: &Param) -> Option<&str> {
        match self {
            Expr::Member { base, field } => match base.as_ref() {
                Expr::Param(p) if p == param => Some(field),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether this expression is exactly the parameter `param`
    pub fn is_param(&self, param: &Param) -> bool {
        matches!(self, Expr::Param(p) if p == param)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Param(param) => write!(f, "{}", param.name()),
            Expr::Member { base, field } => write!(f, "{}.{}", base, field),
            Expr::Literal { value, .. } => write!(f, "{}", value),
            Expr::Unary { op: UnaryOp::Neg, operand } => write!(f, "-{}", operand),
            Expr::Unary { op: UnaryOp::Not, operand } => write!(f, "!{}", operand),
            Expr::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Coalesce { value, fallback } => write!(f, "({} ?? {})", value, fallback),
            Expr::Conditional { condition, then, otherwise } => {
                write!(f, "(if {} then {} else {})", condition, then, otherwise)
            }
            Expr::Call { function, args } => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

macro_rules! literal_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Expr::lit(value)
                }
            }
        )*
    };
}

literal_from!(bool, i32, i64, u32, u64, f64, String);

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::lit(value.to_string())
    }
}

impl From<&Expr> for Expr {
    fn from(value: &Expr) -> Self {
        value.clone()
    }
}

macro_rules! binary_operator {
    ($($trait:ident :: $method:ident => $op:ident),* $(,)?) => {
        $(
            impl<R: Into<Expr>> ops::$trait<R> for Expr {
                type Output = Expr;

                fn $method(self, rhs: R) -> Expr {
                    Expr::binary(BinaryOp::$op, self, rhs)
                }
            }

            impl<R: Into<Expr>> ops::$trait<R> for &Expr {
                type Output = Expr;

                fn $method(self, rhs: R) -> Expr {
                    Expr::binary(BinaryOp::$op, self.clone(), rhs)
                }
            }
        )*
    };
}

binary_operator! {
    Add::add => Add,
    Sub::sub => Sub,
    Mul::mul => Mul,
    Div::div => Div,
    Rem::rem => Rem,
}

impl ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(self),
        }
    }
}

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }
}

/// A single-parameter expression
#[derive(Debug, Clone)]
pub struct Lambda {
    param: Param,
    body: Expr,
}

impl Lambda {
    /// Capture an expression over a fresh parameter of shape `S`
    ///
    /// ```
    /// use labyrinth_core::expression::Lambda;
    /// # use labyrinth_core::impl_shape;
    /// # #[derive(Debug, Clone, Default)]
    /// # struct Params { id: i32 }
    /// # impl_shape!(Params { id: i32 });
    ///
    /// let doubled = Lambda::new::<Params>(|p| p.field("id") * 2);
    /// assert_eq!(doubled.to_string(), "p => (p.id * 2)");
    /// ```
    pub fn new<S: Shape>(build: impl FnOnce(&Expr) -> Expr) -> Self {
        Self::named::<S>("p", build)
    }

    /// Like [`Lambda::new`] with an explicit parameter name
    pub fn named<S: Shape>(name: &str, build: impl FnOnce(&Expr) -> Expr) -> Self {
        let param = Param::of::<S>(name);
        let body = build(&Expr::Param(param.clone()));
        Self { param, body }
    }

    pub fn from_parts(param: Param, body: Expr) -> Self {
        Self { param, body }
    }

    pub fn param(&self) -> &Param {
        &self.param
    }

    pub fn body(&self) -> &Expr {
        &self.body
    }

    /// Field name when the body is a direct member read of the parameter
    pub fn member_name(&self) -> Option<&str> {
        self.body.member_of(&self.param)
    }

    /// The body with the parameter replaced by `replacement`
    pub fn apply(&self, replacement: &Expr) -> Expr {
        rebind(&self.body, &self.param, replacement)
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.param.name(), self.body)
    }
}
