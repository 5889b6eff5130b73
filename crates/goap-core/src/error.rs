//! Error types for the planning core.
//!
//! Every failure here is a recoverable outcome returned to the caller.

use thiserror::Error;

use crate::property::{Operator, PropertyMode};
use crate::value::ValueKind;

/// Failures of value-level operations (comparison, arithmetic, parsing).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("value kind mismatch: expected {expected}, found {found}")]
    KindMismatch { expected: ValueKind, found: ValueKind },

    #[error("operator `{op}` is not supported for {kind} values")]
    UnsupportedOperator { kind: ValueKind, op: Operator },

    #[error("integer overflow")]
    Overflow,

    #[error("char arithmetic produced an invalid code point")]
    InvalidChar,

    #[error("unknown value kind `{0}`")]
    UnknownKind(String),

    #[error("unknown operator `{0}`")]
    UnknownOperator(String),
}

/// Rejected at [`Property`](crate::Property) construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("operator `{op}` is not valid for a {kind} {mode}")]
    InvalidOperator {
        kind: ValueKind,
        op: Operator,
        mode: PropertyMode,
    },

    #[error("property key must not be empty")]
    EmptyKey,
}

/// Why a condition could not be evaluated against a state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("variable `{key}` holds {found}, condition expects {expected}")]
    KindMismatch {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackboardError {
    #[error("variable `{0}` already exists in this blackboard")]
    DuplicateKey(String),

    #[error("variable name must not be empty")]
    EmptyName,

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("variable `{name}` holds {expected} values, got {found}")]
    KindMismatch {
        name: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("variable `{name}` is bound to read-only path `{path}`")]
    ReadOnlyBinding { name: String, path: String },

    #[error("binding `{path}` for variable `{name}` could not be resolved")]
    BindingUnavailable { name: String, path: String },

    #[error("no accessor registered for path `{0}`")]
    UnknownBindingPath(String),

    #[error("effect on `{name}` failed: {source}")]
    Effect {
        name: String,
        #[source]
        source: ValueError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("`{0}` already has a condition on this key")]
    DuplicateKey(String),

    #[error("expected a {expected} property, got a {found}")]
    WrongMode {
        expected: PropertyMode,
        found: PropertyMode,
    },

    #[error("action cost must be finite and non-negative")]
    InvalidCost,

    #[error("effect on unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("effect on `{key}` failed: {source}")]
    Value {
        key: String,
        #[source]
        source: ValueError,
    },
}
