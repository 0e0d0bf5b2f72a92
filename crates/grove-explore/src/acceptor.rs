//! Acceptors: sinks for the answers an exploration produces.

use grove_gts::{Gts, RuleSystem, StateId, TransitionId};
use std::collections::HashSet;
use std::fmt;

/// Collected answer states, optionally bounded.
#[derive(Debug, Clone, Default)]
pub struct Answers {
    states: Vec<StateId>,
    seen: HashSet<StateId, ahash::RandomState>,
    /// Number of answers after which the acceptor is done (0 = never).
    bound: usize,
}

impl Answers {
    pub fn new(bound: usize) -> Self {
        Self {
            bound,
            ..Self::default()
        }
    }

    /// Record `state`. Returns false if it was already recorded.
    pub fn add(&mut self, state: StateId) -> bool {
        if !self.seen.insert(state) {
            return false;
        }
        self.states.push(state);
        true
    }

    pub fn contains(&self, state: StateId) -> bool {
        self.seen.contains(&state)
    }

    /// Answers in the order they were recorded.
    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn bound(&self) -> usize {
        self.bound
    }

    pub fn is_done(&self) -> bool {
        self.bound > 0 && self.states.len() >= self.bound
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.seen.clear();
    }
}

/// Receives state space changes and witness states during a run, and decides
/// when enough has been found.
///
/// The change callbacks are observers: they fire after the state space has
/// been updated and must not expect to influence the current step.
pub trait Acceptor<R: RuleSystem> {
    /// Called once before the strategy is prepared.
    fn prepare(&mut self, _gts: &Gts<R>) {}

    fn state_added(&mut self, _gts: &Gts<R>, _state: StateId) {}

    fn transition_added(&mut self, _gts: &Gts<R>, _transition: TransitionId) {}

    fn state_closed(&mut self, _gts: &Gts<R>, _state: StateId) {}

    /// Record a witness state.
    fn add_state(&mut self, state: StateId);

    /// Record a counterexample path, root first.
    fn add_counter_example(&mut self, path: &[StateId]) {
        for &state in path {
            self.add_state(state);
        }
    }

    fn answers(&self) -> &Answers;

    fn done(&self) -> bool {
        self.answers().is_done()
    }

    fn message(&self) -> String;
}

/// Answers closed states without outgoing transitions: the deadlocks.
#[derive(Debug, Clone, Default)]
pub struct FinalStateAcceptor {
    answers: Answers,
}

impl FinalStateAcceptor {
    /// Stop after `bound` deadlocks (0 = collect all).
    pub fn new(bound: usize) -> Self {
        Self {
            answers: Answers::new(bound),
        }
    }

    fn check<R: RuleSystem>(&mut self, gts: &Gts<R>, state: StateId) {
        if gts.is_closed(state) && gts.out_transitions(state).is_empty() {
            self.answers.add(state);
        }
    }
}

impl<R: RuleSystem> Acceptor<R> for FinalStateAcceptor {
    fn prepare(&mut self, gts: &Gts<R>) {
        self.answers.clear();
        for state in gts.state_ids() {
            self.check(gts, state);
        }
    }

    fn state_closed(&mut self, gts: &Gts<R>, state: StateId) {
        self.check(gts, state);
    }

    fn add_state(&mut self, state: StateId) {
        self.answers.add(state);
    }

    fn answers(&self) -> &Answers {
        &self.answers
    }

    fn message(&self) -> String {
        match self.answers.len() {
            0 => "no final states".to_string(),
            1 => "1 final state".to_string(),
            n => format!("{} final states", n),
        }
    }
}

/// Answers every discovered state whose graph satisfies a predicate.
pub struct PredicateAcceptor<R: RuleSystem> {
    predicate: Box<dyn Fn(&R::Graph) -> bool>,
    answers: Answers,
}

impl<R: RuleSystem> PredicateAcceptor<R> {
    pub fn new(bound: usize, predicate: impl Fn(&R::Graph) -> bool + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
            answers: Answers::new(bound),
        }
    }
}

impl<R: RuleSystem> fmt::Debug for PredicateAcceptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateAcceptor")
            .field("answers", &self.answers)
            .finish()
    }
}

impl<R: RuleSystem> Acceptor<R> for PredicateAcceptor<R> {
    fn prepare(&mut self, gts: &Gts<R>) {
        self.answers.clear();
        for state in gts.state_ids() {
            if (self.predicate)(gts.graph(state)) {
                self.answers.add(state);
            }
        }
    }

    fn state_added(&mut self, gts: &Gts<R>, state: StateId) {
        if (self.predicate)(gts.graph(state)) {
            self.answers.add(state);
        }
    }

    fn add_state(&mut self, state: StateId) {
        self.answers.add(state);
    }

    fn answers(&self) -> &Answers {
        &self.answers
    }

    fn message(&self) -> String {
        format!("{} matching states", self.answers.len())
    }
}

/// Collects LTL counterexamples.
#[derive(Debug, Clone)]
pub struct CycleAcceptor {
    answers: Answers,
    counter_examples: Vec<Vec<StateId>>,
    wanted: usize,
}

impl Default for CycleAcceptor {
    fn default() -> Self {
        Self::new(1)
    }
}

impl CycleAcceptor {
    /// Done after `wanted` counterexamples (0 = never).
    pub fn new(wanted: usize) -> Self {
        Self {
            answers: Answers::new(0),
            counter_examples: Vec::new(),
            wanted,
        }
    }

    pub fn counter_examples(&self) -> &[Vec<StateId>] {
        &self.counter_examples
    }
}

impl<R: RuleSystem> Acceptor<R> for CycleAcceptor {
    fn prepare(&mut self, _gts: &Gts<R>) {
        self.answers.clear();
        self.counter_examples.clear();
    }

    fn add_state(&mut self, state: StateId) {
        self.answers.add(state);
    }

    fn add_counter_example(&mut self, path: &[StateId]) {
        for &state in path {
            self.answers.add(state);
        }
        self.counter_examples.push(path.to_vec());
    }

    fn answers(&self) -> &Answers {
        &self.answers
    }

    fn done(&self) -> bool {
        self.wanted > 0 && self.counter_examples.len() >= self.wanted
    }

    fn message(&self) -> String {
        match self.counter_examples.first() {
            None => "no counterexample found".to_string(),
            Some(path) => format!(
                "counterexample of length {} ({} found)",
                path.len(),
                self.counter_examples.len()
            ),
        }
    }
}
