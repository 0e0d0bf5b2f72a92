//! Explicit state space for graph transformation systems.
//!
//! The rewriting engine is reached only through [`RuleSystem`]; everything the
//! exploration strategies know about states and transitions comes from [`Gts`].

pub mod gts;
pub mod lts;
pub mod rules;
pub mod state;

pub use gts::{Applied, Gts, GtsEvent, StateInfo, TransitionInfo};
pub use lts::{Lts, LtsMatch, LtsNode};
pub use rules::{ApplyError, RuleSystem};
pub use state::{Fingerprint, StateId, TransitionId};
