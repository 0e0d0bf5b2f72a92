//! Bounded LTL model checking by iterative deepening.
//!
//! Each iteration runs the nested search with a [`Boundary`] instance. Product
//! transitions that would cross the boundary beyond the iteration's budget
//! are deferred; when the search runs dry with deferred transitions left, it
//! restarts from the initial state with a relaxed boundary. Product states
//! closed in earlier iterations replay their transitions instead of being
//! expanded again.

use crate::boundary::{Boundary, RunContext};
use crate::error::ExploreResult;
use crate::ltl::{Frame, NestedDfs};
use crate::product::{ProductGts, ProductStateId, ProductTransitionId};
use crate::strategy::{Exploration, Strategy};
use grove_buchi::BuchiAutomaton;
use grove_gts::{Gts, RuleSystem, StateId};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::Ordering;
use tracing::{debug, info};

/// Bounded nested-DFS LTL model checker, optionally with pocket pruning.
///
/// Successors are taken in order rather than at random. Explored states are
/// painted red when their location is accepting and blue otherwise.
pub struct BoundedLtlStrategy<R: RuleSystem> {
    dfs: NestedDfs,
    prototype: Box<dyn Boundary<R>>,
    boundary: Option<Box<dyn Boundary<R>>>,
    pocket: bool,
    /// Transitions deferred in the current iteration.
    deferred: HashSet<ProductTransitionId, ahash::RandomState>,
}

impl<R: RuleSystem> fmt::Debug for BoundedLtlStrategy<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedLtlStrategy")
            .field("boundary", &self.boundary.as_ref().unwrap_or(&self.prototype))
            .field("pocket", &self.pocket)
            .field("iteration", &self.dfs.ctx.iteration())
            .field("deferred", &self.deferred.len())
            .finish()
    }
}

impl<R: RuleSystem> BoundedLtlStrategy<R> {
    pub fn bounded(automaton: BuchiAutomaton, boundary: impl Boundary<R> + 'static) -> Self {
        Self::with_pocket(automaton, Box::new(boundary), false)
    }

    /// Bounded search that never revisits pocket states.
    pub fn pocket(automaton: BuchiAutomaton, boundary: impl Boundary<R> + 'static) -> Self {
        Self::with_pocket(automaton, Box::new(boundary), true)
    }

    fn with_pocket(
        automaton: BuchiAutomaton,
        prototype: Box<dyn Boundary<R>>,
        pocket: bool,
    ) -> Self {
        Self {
            dfs: NestedDfs::new(Some(automaton)),
            prototype,
            boundary: None,
            pocket,
            deferred: HashSet::default(),
        }
    }

    pub fn is_pocket(&self) -> bool {
        self.pocket
    }

    /// Current iteration, starting at 1.
    pub fn iteration(&self) -> u32 {
        self.dfs.ctx.iteration()
    }

    pub fn run_context(&self) -> &RunContext {
        &self.dfs.ctx
    }

    pub fn product(&self) -> &ProductGts {
        &self.dfs.product
    }

    /// The run's boundary instance, once prepared.
    pub fn boundary(&self) -> Option<&dyn Boundary<R>> {
        self.boundary.as_deref()
    }

    pub fn stack(&self) -> impl Iterator<Item = ProductStateId> + '_ {
        self.dfs.stack.iter().map(|frame| frame.state)
    }

    pub fn counter_example(&self) -> Option<&[StateId]> {
        self.dfs.counter_example.as_deref()
    }

    fn is_unexplored(&self, state: ProductStateId) -> bool {
        let ps = self.dfs.product.state(state);
        if self.dfs.ctx.is_explored(ps.colour) {
            return false;
        }
        !self.pocket || !ps.pocket || ps.colour.is_none()
    }

    /// Leave `transition` for a later iteration. Deferring it again in the
    /// same iteration changes nothing.
    fn defer(&mut self, transition: ProductTransitionId, target: ProductStateId) {
        if !self.deferred.insert(transition) {
            return;
        }
        if self.is_unexplored(target) {
            let next = self.dfs.ctx.iteration() + 1;
            self.dfs.product.state_mut(target).iteration = next;
        }
        debug!(transition = ?transition, target = %target, iteration = self.dfs.ctx.iteration(), "transition deferred");
    }

    /// Number of distinct transitions deferred in the current iteration.
    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    /// Whether the counterexample test may look at `transition` in this
    /// iteration.
    fn admit(&mut self, gts: &Gts<R>, transition: ProductTransitionId) -> bool {
        let pt = *self.dfs.product.transition(transition);
        let Some(t) = pt.transition else {
            return true;
        };
        let Some(boundary) = self.boundary.as_mut() else {
            return true;
        };
        let ctx = &self.dfs.ctx;
        if !boundary.crossing_boundary(ctx, gts, t, false)
            || (boundary.current_depth() as u32) < ctx.iteration() - 1
        {
            return true;
        }
        self.defer(transition, pt.target);
        false
    }

    /// First unexplored successor of `top` that the boundary lets through.
    fn fresh_successor(&mut self, gts: &Gts<R>, top: ProductStateId) -> Option<Frame> {
        let out = self.dfs.product.state(top).out_transitions().to_vec();
        for id in out {
            let pt = *self.dfs.product.transition(id);
            if !self.is_unexplored(pt.target) {
                continue;
            }
            let Some(t) = pt.transition else {
                return Some(Frame {
                    state: pt.target,
                    via: None,
                    counted: false,
                });
            };
            let Some(boundary) = self.boundary.as_mut() else {
                return Some(Frame {
                    state: pt.target,
                    via: Some(t),
                    counted: false,
                });
            };
            let ctx = &self.dfs.ctx;
            let before = boundary.current_depth();
            if !boundary.crossing_boundary(ctx, gts, t, true) {
                return Some(Frame {
                    state: pt.target,
                    via: Some(t),
                    counted: boundary.current_depth() > before,
                });
            }
            if (boundary.current_depth() as u32) < ctx.iteration() - 1 {
                boundary.increase_depth();
                return Some(Frame {
                    state: pt.target,
                    via: Some(t),
                    counted: true,
                });
            }
            self.defer(id, pt.target);
        }
        None
    }

    fn backtrack(&mut self) {
        let Some(frame) = self.dfs.pop() else {
            return;
        };
        if frame.counted {
            if let (Some(boundary), Some(t)) = (self.boundary.as_mut(), frame.via) {
                boundary.backtrack_transition(t);
            }
        }
        let colour = if self.dfs.is_accepting(frame.state) {
            self.dfs.ctx.red()
        } else {
            self.dfs.ctx.blue()
        };
        self.dfs.product.state_mut(frame.state).colour = colour;

        if self.pocket {
            let product = &self.dfs.product;
            let pocket = product
                .state(frame.state)
                .out_transitions()
                .iter()
                .map(|&id| product.transition(id))
                .filter(|pt| pt.transition.is_some())
                .all(|pt| product.state(pt.target).pocket);
            if pocket {
                self.dfs.product.state_mut(frame.state).pocket = true;
            }
        }
    }

    /// Start the next iteration, unless there is nothing to gain from it.
    fn restart(&mut self, run: &Exploration<'_, R>) -> Option<Frame> {
        if self.deferred.is_empty() {
            return None;
        }
        let max = run.config().max_iterations;
        if max > 0 && self.dfs.ctx.iteration() as usize >= max {
            info!(iteration = self.dfs.ctx.iteration(), "iteration limit reached");
            return None;
        }
        self.dfs.ctx.next_iteration();
        if let Some(boundary) = self.boundary.as_mut() {
            boundary.increase(&self.dfs.ctx);
            boundary.set_current_depth(0);
        }
        info!(
            iteration = self.dfs.ctx.iteration(),
            deferred = self.deferred.len(),
            "restarting bounded search"
        );
        self.deferred.clear();
        if let Some(ref p) = run.config().progress {
            p.iteration
                .store(self.dfs.ctx.iteration() as usize, Ordering::Relaxed);
        }
        self.dfs.initial_frame()
    }

    fn compute_next_state(&mut self, run: &Exploration<'_, R>) -> Option<Frame> {
        while let Some(top) = self.dfs.stack.last().map(|frame| frame.state) {
            if let Some(frame) = self.fresh_successor(run.gts(), top) {
                return Some(frame);
            }
            self.backtrack();
        }
        self.restart(run)
    }

    /// Test the outgoing transitions of `state` for a counterexample,
    /// expanding it first unless an earlier iteration already did.
    fn explore_state(&mut self, gts: &Gts<R>, state: ProductStateId) -> bool {
        let closed = self.dfs.product.state(state).closed;
        if !closed {
            self.dfs.expand(gts, state);
        }
        let out = self.dfs.product.state(state).out_transitions().to_vec();
        for id in out {
            if self.admit(gts, id) && self.dfs.find_counter_example(id) {
                return true;
            }
        }
        if !closed {
            self.dfs.product.state_mut(state).closed = true;
        }
        false
    }
}

impl<R: RuleSystem> Strategy<R> for BoundedLtlStrategy<R> {
    fn name(&self) -> &'static str {
        if self.pocket {
            "pocket-ltl"
        } else {
            "bounded-ltl"
        }
    }

    fn prepare(&mut self, run: &mut Exploration<'_, R>) -> ExploreResult<()> {
        self.dfs.reset(run)?;
        self.boundary = Some(self.prototype.instantiate());
        self.deferred.clear();
        if let Some(ref p) = run.config().progress {
            p.iteration.store(1, Ordering::Relaxed);
        }
        Ok(())
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
        if self.explore_state(run.gts(), frame.state) {
            self.dfs.report(run);
            return Ok(system);
        }

        self.dfs.next = self.compute_next_state(run);
        Ok(system)
    }
}
