//! Exploration strategies and on-the-fly LTL model checking.
//!
//! A [`Strategy`] decides which state of a [`grove_gts::Gts`] to process next;
//! the [`Explorer`] drives it until the strategy runs dry, the [`Acceptor`] is
//! satisfied, or the run is cancelled.

pub mod acceptor;
pub mod boundary;
pub mod bounded;
pub mod closing;
pub mod config;
pub mod error;
pub mod linear;
pub mod ltl;
pub mod product;
pub mod strategy;

pub use acceptor::{Acceptor, Answers, CycleAcceptor, FinalStateAcceptor, PredicateAcceptor};
pub use boundary::{Boundary, NodeCountBoundary, RuleSetBoundary, RunContext};
pub use bounded::BoundedLtlStrategy;
pub use closing::{ClosingStrategy, Pool};
pub use config::{ExploreConfig, ProgressCounters};
pub use error::{ExploreError, ExploreResult};
pub use linear::LinearStrategy;
pub use ltl::LtlStrategy;
pub use product::{
    Colour, ProductGts, ProductState, ProductStateId, ProductTransition, ProductTransitionId,
};
pub use strategy::{Exploration, Explorer, Outcome, Strategy, Termination};
