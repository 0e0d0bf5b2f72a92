//! Büchi automata consumed by the LTL strategies.
//!
//! Atomic propositions are rule names: a proposition holds in a state when a
//! rule of that name is applicable there.

pub mod automaton;
pub mod error;
pub mod parse;

pub use automaton::{
    AutomatonBuilder, BuchiAutomaton, BuchiTransition, Guard, Location, LocationId,
};
pub use error::{AutomatonError, AutomatonResult};
pub use parse::parse_automaton;
