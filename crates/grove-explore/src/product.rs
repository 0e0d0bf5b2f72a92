//! The synchronised product of a state space and a Büchi automaton, stored as
//! an arena of product states addressed by handle.

use grove_buchi::LocationId;
use grove_gts::{StateId, TransitionId};
use std::collections::HashMap;
use std::fmt;

/// Colour token of a product state. Which tokens mean cyan, blue and red is
/// decided by the current [`crate::RunContext`]; tokens of earlier iterations
/// read as unexplored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Colour(pub(crate) u32);

impl Colour {
    /// The colour of a state nobody has touched.
    pub const NONE: Colour = Colour(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductStateId(u32);

impl ProductStateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProductStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductTransitionId(u32);

impl ProductTransitionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A system state paired with an automaton location.
#[derive(Debug, Clone)]
pub struct ProductState {
    pub state: StateId,
    pub location: LocationId,
    pub colour: Colour,
    /// Whether the outgoing product transitions are complete.
    pub closed: bool,
    /// Bounded-search iteration in which the state was created, or for which
    /// a deferred transition into it was left. Recorded for inspection only;
    /// the search itself decides by colour.
    pub iteration: u32,
    /// Dead-end marker of the pocket optimisation.
    pub pocket: bool,
    /// Transition through which the state was created.
    pub origin: Option<ProductTransitionId>,
    out: Vec<ProductTransitionId>,
}

impl ProductState {
    pub fn out_transitions(&self) -> &[ProductTransitionId] {
        &self.out
    }
}

/// `transition` is None for the self-loop synthesised at a system state
/// without outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductTransition {
    pub source: ProductStateId,
    pub transition: Option<TransitionId>,
    pub target: ProductStateId,
}

/// Product states are unique per (system state, location). The system state
/// identity already accounts for isomorphism.
#[derive(Debug, Default)]
pub struct ProductGts {
    states: Vec<ProductState>,
    transitions: Vec<ProductTransition>,
    index: HashMap<(StateId, LocationId), ProductStateId, ahash::RandomState>,
}

impl ProductGts {
    pub fn new() -> Self {
        Self::default()
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

    #[inline]
    pub fn state(&self, id: ProductStateId) -> &ProductState {
        &self.states[id.index()]
    }

    #[inline]
    pub fn state_mut(&mut self, id: ProductStateId) -> &mut ProductState {
        &mut self.states[id.index()]
    }

    #[inline]
    pub fn transition(&self, id: ProductTransitionId) -> &ProductTransition {
        &self.transitions[id.index()]
    }

    pub fn state_ids(&self) -> impl Iterator<Item = ProductStateId> + '_ {
        (0..self.states.len() as u32).map(ProductStateId)
    }

    pub fn find(&self, state: StateId, location: LocationId) -> Option<ProductStateId> {
        self.index.get(&(state, location)).copied()
    }

    /// Find or create the product state for `(state, location)`. Returns the
    /// handle and whether it was created.
    pub fn add_state(
        &mut self,
        state: StateId,
        location: LocationId,
        iteration: u32,
    ) -> (ProductStateId, bool) {
        if let Some(id) = self.find(state, location) {
            return (id, false);
        }
        let id = ProductStateId(self.states.len() as u32);
        self.states.push(ProductState {
            state,
            location,
            colour: Colour::NONE,
            closed: false,
            iteration,
            pocket: false,
            origin: None,
            out: Vec::new(),
        });
        self.index.insert((state, location), id);
        (id, true)
    }

    /// Add a transition from `source` to the product state of
    /// `(state, location)`, creating the target if needed.
    pub fn add_successor(
        &mut self,
        source: ProductStateId,
        transition: Option<TransitionId>,
        state: StateId,
        location: LocationId,
        iteration: u32,
    ) -> (ProductTransitionId, bool) {
        let (target, fresh) = self.add_state(state, location, iteration);
        let id = ProductTransitionId(self.transitions.len() as u32);
        self.transitions.push(ProductTransition {
            source,
            transition,
            target,
        });
        self.states[source.index()].out.push(id);
        if fresh {
            self.states[target.index()].origin = Some(id);
        }
        (id, fresh)
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.states.clear();
        self.transitions.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_buchi::{BuchiAutomaton, Guard};
    use grove_gts::{Gts, Lts};

    #[test]
    fn test_product_states_are_unique() {
        let mut gts = Gts::new(Lts::from_edges("p", &[("p", "a", "q")]));
        let s0 = gts.start_state();
        let t = gts.apply_match(s0, 0).unwrap();
        let aut = BuchiAutomaton::builder()
            .location("l0", true)
            .initial("l0")
            .transition("l0", Guard::always(), "l0")
            .build()
            .unwrap();
        let l0 = aut.initial_location();

        let mut product = ProductGts::new();
        let (root, fresh) = product.add_state(s0, l0, 1);
        assert!(fresh);
        assert_eq!(product.add_state(s0, l0, 7), (root, false));
        assert_eq!(product.state(root).iteration, 1);

        let (pt, fresh) = product.add_successor(root, Some(t.transition), t.target, l0, 1);
        assert!(fresh);
        let target = product.transition(pt).target;
        assert_eq!(product.state(target).origin, Some(pt));
        assert_eq!(product.state(root).out_transitions(), &[pt]);

        let (again, fresh) = product.add_successor(root, Some(t.transition), t.target, l0, 1);
        assert!(!fresh);
        assert_ne!(again, pt);
        assert_eq!(product.transition(again).target, target);
        assert_eq!(product.len(), 2);
        assert_eq!(product.transition_count(), 2);
        assert!(product.state(target).colour.is_none());
    }
}
