//! The seam between the state space and the graph rewriting engine.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a single match application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The engine was cancelled while applying the match, e.g. an oracle
    /// asked for input and the request was aborted.
    #[error("match application interrupted")]
    Interrupted,

    #[error("rule '{rule}' could not be applied: {message}")]
    Failed { rule: Arc<str>, message: String },
}

/// A graph rewriting engine, seen as a generator of matches.
///
/// Graphs are compared for identity after [`RuleSystem::canonicalize`], so an
/// engine that wants isomorphic graphs to collapse onto one state returns the
/// same canonical representative for all of them.
pub trait RuleSystem {
    type Graph: Clone + Debug + Eq + Hash;
    type Match: Clone + Debug;

    /// The host graph exploration starts from.
    fn start_graph(&self) -> Self::Graph;

    /// All matches of all rules in `graph`.
    fn matches(&self, graph: &Self::Graph) -> Vec<Self::Match>;

    /// Apply `m` to `graph`, producing the target graph.
    fn apply(&self, graph: &Self::Graph, m: &Self::Match) -> Result<Self::Graph, ApplyError>;

    /// Name of the rule `m` belongs to. Used as transition label and as atomic
    /// proposition.
    fn rule_name(&self, m: &Self::Match) -> Arc<str>;

    /// Transient graphs are intermediate rewriting results and are explored
    /// before any non-transient state.
    fn is_transient(&self, _graph: &Self::Graph) -> bool {
        false
    }

    /// Number of nodes of `graph`.
    fn node_count(&self, graph: &Self::Graph) -> usize;

    /// Canonical representative of the isomorphism class of `graph`.
    fn canonicalize(&self, graph: Self::Graph) -> Self::Graph {
        graph
    }
}
