//! Exploration errors.

use grove_buchi::AutomatonError;
use grove_gts::{ApplyError, StateId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExploreError {
    /// A match application was cancelled. Never escapes [`crate::Explorer::play`].
    #[error("exploration interrupted")]
    Interrupted,

    #[error("rule application failed: {0}")]
    Apply(ApplyError),

    #[error("malformed property: {0}")]
    Property(#[from] AutomatonError),

    #[error("LTL strategy has no property")]
    MissingProperty,

    #[error("start state {0} is not in the state space")]
    UnknownStartState(StateId),
}

impl From<ApplyError> for ExploreError {
    fn from(err: ApplyError) -> Self {
        match err {
            ApplyError::Interrupted => ExploreError::Interrupted,
            other => ExploreError::Apply(other),
        }
    }
}

pub type ExploreResult<T> = Result<T, ExploreError>;
