//! Captured expressions for mapping rules
//!
//! Rules describe their source values as small expression trees over a
//! lambda parameter instead of opaque closures. That lets the compiler check
//! them against shape descriptors, decide which copies need an absence
//! guard, and graft them onto one shared source parameter before lowering
//! everything into closures.
//!
//! # Module Organization
//!
//! - [`ast`] - Parameters, expression nodes, lambdas and builder operators
//! - [`rebind`] - Parameter substitution
//! - [`types`] - Type inference and type errors
//! - [`compile`] - Lowering to evaluable closures
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

pub mod ast;
pub mod compile;
pub mod rebind;
pub mod types;

pub use ast::{BinaryOp, Expr, Lambda, NativeFunction, Param, UnaryOp};
pub use compile::{CompiledExpr, EvalError};
pub use rebind::rebind;
pub use types::{is_assignable, TypeError};
