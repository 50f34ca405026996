//! Error types for the option registry
//!
//! Only programming-contract violations are errors. Malformed values sent by
//! a GUI are rejected silently by [`crate::UciOption::assign`] and never show
//! up here.

use crate::option::OptionKind;

/// Contract violations on the option registry
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    /// Value read through an accessor that does not match the option's kind
    #[error("option '{name}' is of type {actual}, not {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: OptionKind,
    },

    /// Lookup of a name that was never registered
    #[error("no such option: '{0}'")]
    NotFound(String),
}

/// Result type for registry accessors
pub type OptionResult<T> = Result<T, OptionError>;
