//! On-the-fly LTL model checking by nested depth-first search over the
//! product of the state space and a Büchi automaton.
//!
//! Product states move from unvisited to cyan when pushed on the search
//! stack, and from cyan to blue (or red, in the bounded search) when popped.
//! A transition back to a cyan state closes a cycle on the current path; if
//! either end of it is accepting, the stack is a counterexample.

use crate::boundary::RunContext;
use crate::error::{ExploreError, ExploreResult};
use crate::product::{ProductGts, ProductStateId, ProductTransitionId};
use crate::strategy::{Exploration, Strategy};
use grove_buchi::{BuchiAutomaton, LocationId};
use grove_gts::{Gts, RuleSystem, StateId, TransitionId};
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::SeedableRng;
use std::sync::atomic::Ordering;
use tracing::{debug, trace};

/// An entry of the search stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Frame {
    pub state: ProductStateId,
    /// System transition that led here; None for the root and stutter steps.
    pub via: Option<TransitionId>,
    /// Whether entering this frame raised the boundary depth.
    pub counted: bool,
}

/// Search state shared by the plain and the bounded LTL strategy.
#[derive(Debug)]
pub(crate) struct NestedDfs {
    pub automaton: Option<BuchiAutomaton>,
    pub product: ProductGts,
    pub stack: Vec<Frame>,
    pub ctx: RunContext,
    pub rng: StdRng,
    pub initial: Option<ProductStateId>,
    pub next: Option<Frame>,
    pub counter_example: Option<Vec<StateId>>,
}

impl NestedDfs {
    pub fn new(automaton: Option<BuchiAutomaton>) -> Self {
        Self {
            automaton,
            product: ProductGts::new(),
            stack: Vec::new(),
            ctx: RunContext::new(),
            rng: StdRng::seed_from_u64(0),
            initial: None,
            next: None,
            counter_example: None,
        }
    }

    /// Seed the product with the initial state of a fresh run.
    pub fn reset<R: RuleSystem>(&mut self, run: &Exploration<'_, R>) -> ExploreResult<()> {
        let location = match &self.automaton {
            Some(automaton) => automaton.initial_location(),
            None => return Err(ExploreError::MissingProperty),
        };
        self.product.clear();
        self.stack.clear();
        self.ctx = RunContext::new();
        self.rng = StdRng::seed_from_u64(run.config().seed);
        self.counter_example = None;
        let (initial, _) = self.product.add_state(run.start_state(), location, 1);
        self.initial = Some(initial);
        self.next = Some(Frame {
            state: initial,
            via: None,
            counted: false,
        });
        Ok(())
    }

    pub fn initial_frame(&self) -> Option<Frame> {
        self.initial.map(|state| Frame {
            state,
            via: None,
            counted: false,
        })
    }

    pub fn push<R: RuleSystem>(&mut self, frame: Frame, run: &Exploration<'_, R>) {
        debug_assert!(
            !self.ctx.is_explored(self.product.state(frame.state).colour),
            "explored product state pushed again"
        );
        self.product.state_mut(frame.state).colour = self.ctx.cyan();
        self.stack.push(frame);
        if let Some(ref p) = run.config().progress {
            p.stack_depth.store(self.stack.len(), Ordering::Relaxed);
        }
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.stack.pop()
    }

    pub fn is_accepting(&self, state: ProductStateId) -> bool {
        let location = self.product.state(state).location;
        self.automaton
            .as_ref()
            .is_some_and(|automaton| automaton.is_accepting(location))
    }

    /// Build the outgoing product transitions of `state`, whose system state
    /// must be closed.
    ///
    /// Automaton transitions are enabled by the labels of the outgoing system
    /// transitions. A system state with nothing but self-loops gets a single
    /// stutter transition per enabled automaton transition.
    pub fn expand<R: RuleSystem>(&mut self, gts: &Gts<R>, state: ProductStateId) {
        let Some(automaton) = self.automaton.as_ref() else {
            return;
        };
        let (system, location) = {
            let ps = self.product.state(state);
            (ps.state, ps.location)
        };
        let props = gts.out_labels(system);
        let moves: Vec<TransitionId> = gts
            .out_transitions(system)
            .iter()
            .copied()
            .filter(|&t| !gts.transition(t).is_self_loop())
            .collect();
        let targets: Vec<LocationId> = automaton
            .out_transitions(location)
            .iter()
            .filter(|bt| bt.is_enabled(&props))
            .map(|bt| bt.target)
            .collect();

        let iteration = self.ctx.iteration();
        for target in targets {
            if moves.is_empty() {
                self.product
                    .add_successor(state, None, system, target, iteration);
            }
            for &t in &moves {
                let next = gts.transition(t).target;
                self.product
                    .add_successor(state, Some(t), next, target, iteration);
            }
        }
        trace!(
            state = %state,
            out = self.product.state(state).out_transitions().len(),
            "product state expanded"
        );
    }

    /// Whether `transition` closes an accepting cycle on the search stack.
    pub fn find_counter_example(&self, transition: ProductTransitionId) -> bool {
        let pt = self.product.transition(transition);
        self.product.state(pt.target).colour == self.ctx.cyan()
            && (self.is_accepting(pt.source) || self.is_accepting(pt.target))
    }

    /// Hand the system states of the search stack to the acceptor.
    pub fn report<R: RuleSystem>(&mut self, run: &mut Exploration<'_, R>) {
        let path: Vec<StateId> = self
            .stack
            .iter()
            .map(|frame| self.product.state(frame.state).state)
            .collect();
        debug!(
            length = path.len(),
            iteration = self.ctx.iteration(),
            "counterexample found"
        );
        run.acceptor().add_counter_example(&path);
        self.counter_example = Some(path);
        self.next = None;
    }
}

/// Nested-DFS LTL model checker.
///
/// Successors are picked at random among the unexplored ones, so runs with
/// different seeds may report different counterexamples.
#[derive(Debug)]
pub struct LtlStrategy {
    dfs: NestedDfs,
}

impl Default for LtlStrategy {
    fn default() -> Self {
        Self {
            dfs: NestedDfs::new(None),
        }
    }
}

impl LtlStrategy {
    /// Check the property whose negation `automaton` encodes.
    pub fn new(automaton: BuchiAutomaton) -> Self {
        Self {
            dfs: NestedDfs::new(Some(automaton)),
        }
    }

    /// Parse and install a property automaton in the text format of
    /// [`grove_buchi::parse_automaton`].
    pub fn set_property(&mut self, source: &str) -> ExploreResult<()> {
        let automaton = grove_buchi::parse_automaton(source)?;
        self.dfs.automaton = Some(automaton);
        Ok(())
    }

    pub fn set_automaton(&mut self, automaton: BuchiAutomaton) {
        self.dfs.automaton = Some(automaton);
    }

    pub fn automaton(&self) -> Option<&BuchiAutomaton> {
        self.dfs.automaton.as_ref()
    }

    pub fn product(&self) -> &ProductGts {
        &self.dfs.product
    }

    pub fn run_context(&self) -> &RunContext {
        &self.dfs.ctx
    }

    /// Product states on the search stack, root first.
    pub fn stack(&self) -> impl Iterator<Item = ProductStateId> + '_ {
        self.dfs.stack.iter().map(|frame| frame.state)
    }

    /// The counterexample of the last run, if one was found.
    pub fn counter_example(&self) -> Option<&[StateId]> {
        self.dfs.counter_example.as_deref()
    }

    fn fresh_successor(&mut self, top: ProductStateId) -> Option<Frame> {
        let NestedDfs {
            product, ctx, rng, ..
        } = &mut self.dfs;
        let pt = product
            .state(top)
            .out_transitions()
            .iter()
            .copied()
            .filter(|&pt| !ctx.is_explored(product.state(product.transition(pt).target).colour))
            .choose(rng)?;
        let pt = product.transition(pt);
        Some(Frame {
            state: pt.target,
            via: pt.transition,
            counted: false,
        })
    }

    fn compute_next_state(&mut self) -> Option<Frame> {
        loop {
            let top = self.dfs.stack.last()?.state;
            if let Some(frame) = self.fresh_successor(top) {
                return Some(frame);
            }
            self.dfs.pop();
            let blue = self.dfs.ctx.blue();
            let ps = self.dfs.product.state_mut(top);
            ps.closed = true;
            ps.colour = blue;
        }
    }
}

impl<R: RuleSystem> Strategy<R> for LtlStrategy {
    fn name(&self) -> &'static str {
        "ltl"
    }

    fn prepare(&mut self, run: &mut Exploration<'_, R>) -> ExploreResult<()> {
        self.dfs.reset(run)
    }

    fn has_next(&self) -> bool {
        self.dfs.next.is_some()
    }

    fn do_next(&mut self, run: &mut Exploration<'_, R>) -> ExploreResult<StateId> {
        let Some(frame) = self.dfs.next.take() else {
            return Ok(run.start_state());
        };
        let system = self.dfs.product.state(frame.state).state;
        if let Err(e) = run.close_state(system) {
            self.dfs.next = Some(frame);
            return Err(e);
        }

        self.dfs.push(frame, run);
        self.dfs.expand(run.gts(), frame.state);
        let out = self.dfs.product.state(frame.state).out_transitions().to_vec();
        if out.into_iter().any(|pt| self.dfs.find_counter_example(pt)) {
            self.dfs.report(run);
            return Ok(system);
        }

        self.dfs.next = self.compute_next_state();
        Ok(system)
    }
}
