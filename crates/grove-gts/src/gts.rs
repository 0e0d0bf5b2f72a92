//! The explicit, incrementally built graph transition system.

use crate::rules::{ApplyError, RuleSystem};
use crate::state::{Fingerprint, StateId, TransitionId};
use smallvec::SmallVec;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Everything the state space records about one state.
#[derive(Debug, Clone)]
pub struct StateInfo<G, M> {
    /// Canonical graph of the state.
    pub graph: G,
    /// Cached fingerprint of `graph`.
    pub fingerprint: Fingerprint,
    /// Whether the state is an intermediate rewriting result.
    pub transient: bool,
    /// Whether every match of the state has been applied.
    pub closed: bool,
    /// Length of the discovery path from the start state.
    pub depth: usize,
    /// Transition through which the state was first reached (None for the start state).
    pub incoming: Option<TransitionId>,
    /// Matches not yet applied. None until first requested.
    pending: Option<Vec<M>>,
    /// Outgoing transitions in the order they were added.
    out: Vec<TransitionId>,
}

/// A transition between two states, produced by one rule application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionInfo {
    pub source: StateId,
    pub target: StateId,
    pub rule: Arc<str>,
}

impl TransitionInfo {
    #[inline]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Change notification, queued by every mutation of the state space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GtsEvent {
    StateAdded(StateId),
    TransitionAdded(TransitionId),
    StateClosed(StateId),
}

/// Result of applying one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub transition: TransitionId,
    pub target: StateId,
    /// Whether `target` was added by this application.
    pub fresh: bool,
}

/// Explicit state space over a [`RuleSystem`].
///
/// States are deduplicated by the fingerprint of their canonical graph, with
/// full graph equality deciding between fingerprint collisions.
pub struct Gts<R: RuleSystem> {
    rules: R,
    states: Vec<StateInfo<R::Graph, R::Match>>,
    transitions: Vec<TransitionInfo>,
    index: HashMap<Fingerprint, SmallVec<[StateId; 1]>, ahash::RandomState>,
    collisions: usize,
    events: Vec<GtsEvent>,
}

impl<R: RuleSystem> Gts<R> {
    /// Create a state space containing only the start graph of `rules`.
    pub fn new(rules: R) -> Self {
        let mut gts = Self {
            rules,
            states: Vec::new(),
            transitions: Vec::new(),
            index: HashMap::default(),
            collisions: 0,
            events: Vec::new(),
        };
        let start = gts.rules.start_graph();
        gts.insert(start, 0);
        gts
    }

    /// The rewriting engine this state space draws on.
    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn start_state(&self) -> StateId {
        StateId::from_index(0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[inline]
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// Number of distinct graphs that shared a fingerprint with an existing state.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    #[inline]
    pub fn contains(&self, state: StateId) -> bool {
        state.index() < self.states.len()
    }

    pub fn state_ids(&self) -> impl Iterator<Item = StateId> + '_ {
        (0..self.states.len()).map(StateId::from_index)
    }

    #[inline]
    pub fn state(&self, state: StateId) -> &StateInfo<R::Graph, R::Match> {
        &self.states[state.index()]
    }

    #[inline]
    pub fn graph(&self, state: StateId) -> &R::Graph {
        &self.states[state.index()].graph
    }

    #[inline]
    pub fn is_closed(&self, state: StateId) -> bool {
        self.states[state.index()].closed
    }

    #[inline]
    pub fn is_transient(&self, state: StateId) -> bool {
        self.states[state.index()].transient
    }

    #[inline]
    pub fn depth(&self, state: StateId) -> usize {
        self.states[state.index()].depth
    }

    #[inline]
    pub fn out_transitions(&self, state: StateId) -> &[TransitionId] {
        &self.states[state.index()].out
    }

    #[inline]
    pub fn transition(&self, transition: TransitionId) -> &TransitionInfo {
        &self.transitions[transition.index()]
    }

    /// Labels of the outgoing transitions of `state`.
    pub fn out_labels(&self, state: StateId) -> BTreeSet<Arc<str>> {
        self.out_transitions(state)
            .iter()
            .map(|&t| self.transition(t).rule.clone())
            .collect()
    }

    /// Find the state holding (a graph isomorphic to) `graph`.
    pub fn lookup(&self, graph: &R::Graph) -> Option<StateId> {
        let canonical = self.rules.canonicalize(graph.clone());
        let fp = Fingerprint::of(&canonical);
        self.index
            .get(&fp)?
            .iter()
            .copied()
            .find(|&id| self.states[id.index()].graph == canonical)
    }

    /// Number of matches of `state` still to be applied, computing the match
    /// set on first use. A state without matches is closed right away.
    pub fn pending_count(&mut self, state: StateId) -> usize {
        self.ensure_matches(state);
        self.states[state.index()]
            .pending
            .as_ref()
            .map_or(0, Vec::len)
    }

    /// Matches of `state` still to be applied.
    pub fn pending_matches(&mut self, state: StateId) -> &[R::Match] {
        self.ensure_matches(state);
        self.states[state.index()].pending.as_deref().unwrap_or(&[])
    }

    /// Apply the pending match at `index` of `state`.
    ///
    /// On success the match is consumed; the state closes once its last match
    /// is consumed. On failure the match stays pending.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`Gts::pending_count`].
    pub fn apply_match(&mut self, state: StateId, index: usize) -> Result<Applied, ApplyError> {
        self.ensure_matches(state);
        let source = &self.states[state.index()];
        let pending = source.pending.as_deref().unwrap_or(&[]);
        assert!(
            index < pending.len(),
            "match index {} out of range for state {}",
            index,
            state
        );
        let m = &pending[index];
        let rule = self.rules.rule_name(m);
        let target_graph = self.rules.apply(&source.graph, m)?;
        let depth = source.depth + 1;

        if let Some(pending) = self.states[state.index()].pending.as_mut() {
            pending.remove(index);
        }

        let canonical = self.rules.canonicalize(target_graph);
        let (target, fresh) = self.insert(canonical, depth);
        let transition = TransitionId::from_index(self.transitions.len());
        self.transitions.push(TransitionInfo {
            source: state,
            target,
            rule,
        });
        self.states[state.index()].out.push(transition);
        if fresh {
            self.states[target.index()].incoming = Some(transition);
        }
        self.events.push(GtsEvent::TransitionAdded(transition));
        trace!(source = %state, target = %target, fresh, "transition added");

        if self.states[state.index()]
            .pending
            .as_ref()
            .is_some_and(Vec::is_empty)
        {
            self.close(state);
        }

        Ok(Applied {
            transition,
            target,
            fresh,
        })
    }

    /// Take all queued change notifications, oldest first.
    pub fn drain_events(&mut self) -> Vec<GtsEvent> {
        std::mem::take(&mut self.events)
    }

    /// Reconstruct the discovery path from the start state to `state`, as
    /// pairs of state and the label of the transition that entered it.
    pub fn trace_to(&self, state: StateId) -> Vec<(StateId, Option<Arc<str>>)> {
        let mut trace = Vec::new();
        let mut current = Some(state);

        while let Some(id) = current {
            match self.states[id.index()].incoming {
                Some(t) => {
                    let info = &self.transitions[t.index()];
                    trace.push((id, Some(info.rule.clone())));
                    current = Some(info.source);
                }
                None => {
                    trace.push((id, None));
                    current = None;
                }
            }
        }

        trace.reverse();
        trace
    }

    fn ensure_matches(&mut self, state: StateId) {
        let info = &self.states[state.index()];
        if info.pending.is_some() || info.closed {
            return;
        }
        let matches = self.rules.matches(&info.graph);
        let empty = matches.is_empty();
        self.states[state.index()].pending = Some(matches);
        if empty {
            self.close(state);
        }
    }

    fn close(&mut self, state: StateId) {
        let info = &mut self.states[state.index()];
        if info.closed {
            return;
        }
        info.closed = true;
        info.pending = Some(Vec::new());
        self.events.push(GtsEvent::StateClosed(state));
        trace!(state = %state, "state closed");
    }

    /// Insert a canonical graph, returning its state and whether it is new.
    fn insert(&mut self, graph: R::Graph, depth: usize) -> (StateId, bool) {
        let fp = Fingerprint::of(&graph);
        if let Some(bucket) = self.index.get(&fp) {
            if let Some(&existing) = bucket
                .iter()
                .find(|&&id| self.states[id.index()].graph == graph)
            {
                return (existing, false);
            }
            self.collisions += 1;
            if self.collisions == 1 {
                error!(
                    fingerprint = %fp,
                    "hash collision detected: distinct graphs share a fingerprint"
                );
            } else {
                debug!(fingerprint = %fp, "hash collision");
            }
        }

        let id = StateId::from_index(self.states.len());
        let transient = self.rules.is_transient(&graph);
        self.states.push(StateInfo {
            graph,
            fingerprint: fp,
            transient,
            closed: false,
            depth,
            incoming: None,
            pending: None,
            out: Vec::new(),
        });
        self.index.entry(fp).or_default().push(id);
        self.events.push(GtsEvent::StateAdded(id));
        (id, true)
    }
}

impl<R: RuleSystem + std::fmt::Debug> std::fmt::Debug for Gts<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gts")
            .field("rules", &self.rules)
            .field("states", &self.states.len())
            .field("transitions", &self.transitions.len())
            .field("collisions", &self.collisions)
            .finish()
    }
}
