//! Automaton construction errors.

use thiserror::Error;

/// A malformed automaton. Raised before any exploration starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomatonError {
    #[error("automaton has no locations")]
    NoLocations,

    #[error("automaton has no initial location")]
    MissingInitial,

    #[error("unknown location: {name}")]
    UnknownLocation { name: String },

    #[error("duplicate location: {name}")]
    DuplicateLocation { name: String },

    #[error("guard on {from} -> {to} requires and forbids '{proposition}'")]
    ContradictoryGuard {
        from: String,
        to: String,
        proposition: String,
    },

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
}

pub type AutomatonResult<T> = Result<T, AutomatonError>;
