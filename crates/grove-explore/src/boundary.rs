//! Boundaries: run-scoped limits that cut one iteration of a bounded search.

use crate::product::Colour;
use grove_gts::{Gts, RuleSystem, TransitionId};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Bookkeeping of one bounded run: the iteration counter and the colour
/// tokens that mean cyan, blue and red in the current iteration.
///
/// Every iteration hands out fresh tokens, so colours painted in an earlier
/// iteration read as unexplored without touching the product states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    iteration: u32,
    cyan: Colour,
    blue: Colour,
    red: Colour,
    next_token: u32,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            iteration: 1,
            cyan: Colour(1),
            blue: Colour(2),
            red: Colour(3),
            next_token: 4,
        }
    }

    #[inline]
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    #[inline]
    pub fn cyan(&self) -> Colour {
        self.cyan
    }

    #[inline]
    pub fn blue(&self) -> Colour {
        self.blue
    }

    #[inline]
    pub fn red(&self) -> Colour {
        self.red
    }

    /// Whether `colour` marks a state as visited in the current iteration.
    pub fn is_explored(&self, colour: Colour) -> bool {
        colour == self.cyan || colour == self.blue || colour == self.red
    }

    /// Move to the next iteration with fresh colour tokens.
    pub fn next_iteration(&mut self) {
        self.iteration += 1;
        self.cyan = Colour(self.next_token);
        self.blue = Colour(self.next_token + 1);
        self.red = Colour(self.next_token + 2);
        self.next_token += 3;
    }
}

/// A limit on which transitions one iteration of a bounded search may take.
///
/// Strategies hold a *prototype* and call [`Boundary::instantiate`] at the
/// start of every run; only instances may be queried. An instance counts the
/// boundary-crossing transitions on the current search path in its current
/// depth, which never exceeds the iteration of the run.
pub trait Boundary<R: RuleSystem>: fmt::Debug {
    /// A fresh instance for one run.
    fn instantiate(&self) -> Box<dyn Boundary<R>>;

    /// Whether following `transition` crosses the boundary. With `traverse`
    /// set, a transition that does not cross may still count towards the
    /// current depth.
    fn crossing_boundary(
        &mut self,
        ctx: &RunContext,
        gts: &Gts<R>,
        transition: TransitionId,
        traverse: bool,
    ) -> bool;

    /// Relax the boundary for the next iteration.
    fn increase(&mut self, ctx: &RunContext);

    fn current_depth(&self) -> usize;

    fn set_current_depth(&mut self, depth: usize);

    fn increase_depth(&mut self) {
        let depth = self.current_depth();
        self.set_current_depth(depth + 1);
    }

    /// Undo the depth contribution of `transition` when the search
    /// backtracks over it.
    fn backtrack_transition(&mut self, _transition: TransitionId) {
        let depth = self.current_depth();
        debug_assert!(depth > 0, "boundary depth underflow");
        self.set_current_depth(depth.saturating_sub(1));
    }
}

/// Bounds the size of the graphs a search may enter: a transition crosses
/// when its target has more nodes than the current limit. The limit grows by
/// a fixed step every iteration.
#[derive(Debug, Clone)]
pub struct NodeCountBoundary {
    initial: usize,
    step: usize,
    limit: usize,
    depth: usize,
    prototype: bool,
}

impl NodeCountBoundary {
    pub fn new(limit: usize, step: usize) -> Self {
        Self {
            initial: limit,
            step,
            limit,
            depth: 0,
            prototype: true,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl<R: RuleSystem> Boundary<R> for NodeCountBoundary {
    fn instantiate(&self) -> Box<dyn Boundary<R>> {
        Box::new(Self {
            limit: self.initial,
            depth: 0,
            prototype: false,
            ..self.clone()
        })
    }

    fn crossing_boundary(
        &mut self,
        _ctx: &RunContext,
        gts: &Gts<R>,
        transition: TransitionId,
        _traverse: bool,
    ) -> bool {
        debug_assert!(!self.prototype, "boundary prototype used in a search");
        let target = gts.transition(transition).target;
        gts.rules().node_count(gts.graph(target)) > self.limit
    }

    fn increase(&mut self, _ctx: &RunContext) {
        self.limit += self.step;
    }

    fn current_depth(&self) -> usize {
        self.depth
    }

    fn set_current_depth(&mut self, depth: usize) {
        self.depth = depth;
    }
}

/// Forbids a set of rules. The current depth counts the forbidden
/// applications on the search path; in iteration `k` the first `k - 2` of
/// them do not cross.
#[derive(Debug, Clone)]
pub struct RuleSetBoundary {
    forbidden: BTreeSet<Arc<str>>,
    depth: usize,
    prototype: bool,
}

impl RuleSetBoundary {
    pub fn new<'a>(rules: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            forbidden: rules.into_iter().map(Arc::from).collect(),
            depth: 0,
            prototype: true,
        }
    }

    pub fn is_forbidden(&self, rule: &str) -> bool {
        self.forbidden.contains(rule)
    }
}

impl<R: RuleSystem> Boundary<R> for RuleSetBoundary {
    fn instantiate(&self) -> Box<dyn Boundary<R>> {
        Box::new(Self {
            forbidden: self.forbidden.clone(),
            depth: 0,
            prototype: false,
        })
    }

    fn crossing_boundary(
        &mut self,
        ctx: &RunContext,
        gts: &Gts<R>,
        transition: TransitionId,
        traverse: bool,
    ) -> bool {
        debug_assert!(!self.prototype, "boundary prototype used in a search");
        if !self.is_forbidden(&gts.transition(transition).rule) {
            return false;
        }
        let cap = ctx.iteration().saturating_sub(2) as usize;
        if self.depth >= cap {
            return true;
        }
        if traverse {
            self.depth += 1;
        }
        false
    }

    fn increase(&mut self, _ctx: &RunContext) {}

    fn current_depth(&self) -> usize {
        self.depth
    }

    fn set_current_depth(&mut self, depth: usize) {
        self.depth = depth;
    }
}
