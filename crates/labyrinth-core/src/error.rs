//! Error types for the Labyrinth core library
//!
//! Configuration problems (bad selectors, type mismatches, duplicate
//! registrations) surface from `configure`; the only errors a compiled
//! mapping can raise at call time are arithmetic faults and lookups of
//! pairs that were never configured.
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

use crate::expression::TypeError;
use thiserror::Error;

/// Main error type for Labyrinth operations
#[derive(Error, Debug)]
pub enum Error {
    /// A rule violated its structural contract, e.g. a destination selector
    /// that is not a direct member read of its own parameter
    #[error("Contract violation: {message}")]
    Contract {
        message: String,
        rule: Option<String>,
    },

    /// An expression failed type checking while the mapping was compiled
    #[error("Type error: {0}")]
    Type(#[from] TypeError),

    /// A mapping for this (target, source) pair is already registered
    #[error("Mapping already configured: {source_shape} -> {target}")]
    DuplicateMapping {
        target: &'static str,
        source_shape: &'static str,
    },

    /// No mapping is registered for this (target, source) pair
    #[error("Mapping not configured: {source_shape} -> {target}")]
    NotConfigured {
        target: &'static str,
        source_shape: &'static str,
    },

    /// A computed source expression failed while a mapping ran
    #[error("Evaluation failed for '{target_field}': {message}")]
    Evaluation {
        message: String,
        target_field: String,
    },

    /// A record setter received a value of the wrong kind
    ///
    /// Compiled plans check every value against its declared type before it
    /// reaches a setter, native function results included.
    #[error("Conversion error: field '{field}' expects {expected}, found {found}")]
    Conversion {
        field: String,
        expected: String,
        found: String,
    },

    /// Mapper configuration could not be loaded
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The process-wide mapper was installed twice
    #[error("A global mapper is already installed")]
    AlreadyInstalled,

    /// The process-wide mapper was used before installation
    #[error("No global mapper installed")]
    NotInstalled,
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a contract violation for the named rule
    pub(crate) fn contract(message: impl Into<String>, rule: impl std::fmt::Display) -> Self {
        Error::Contract {
            message: message.into(),
            rule: Some(rule.to_string()),
        }
    }

    /// Whether this error was raised while configuring rather than mapping
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::Contract { .. }
                | Error::Type(_)
                | Error::DuplicateMapping { .. }
                | Error::Configuration { .. }
        )
    }
}
