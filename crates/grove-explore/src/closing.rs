//! Exhaustive traversal: every reachable state is closed, in pool order.

use crate::error::ExploreResult;
use crate::strategy::{Exploration, Strategy};
use grove_gts::{Gts, RuleSystem, StateId};
use std::collections::VecDeque;

/// Open states waiting to be closed.
#[derive(Debug, Clone)]
pub enum Pool {
    /// First in, first out.
    Breadth(VecDeque<StateId>),
    /// Last in, first out.
    Depth(Vec<StateId>),
    /// Holds at most the designated state.
    Single {
        accepts: Option<StateId>,
        slot: Option<StateId>,
    },
}

impl Pool {
    pub fn take(&mut self) -> Option<StateId> {
        match self {
            Pool::Breadth(queue) => queue.pop_front(),
            Pool::Depth(stack) => stack.pop(),
            Pool::Single { slot, .. } => slot.take(),
        }
    }

    pub fn put(&mut self, state: StateId) {
        match self {
            Pool::Breadth(queue) => queue.push_back(state),
            Pool::Depth(stack) => stack.push(state),
            Pool::Single { accepts, slot } => {
                if *accepts == Some(state) {
                    *slot = Some(state);
                }
            }
        }
    }

    /// Empty the pool for a run from `start`.
    pub fn clear(&mut self, start: StateId) {
        match self {
            Pool::Breadth(queue) => queue.clear(),
            Pool::Depth(stack) => stack.clear(),
            Pool::Single { accepts, slot } => {
                *accepts = Some(start);
                *slot = None;
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Pool::Breadth(queue) => queue.len(),
            Pool::Depth(stack) => stack.len(),
            Pool::Single { slot, .. } => usize::from(slot.is_some()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Closes states one at a time, applying all of their matches.
///
/// Fresh transient targets go on a side stack that is drained before the
/// pool is consulted. A state is queued once: when it is created, or when
/// it is first reached as a state that existed before the run. Closed
/// states of an earlier run are visited only to reach their successors.
#[derive(Debug, Clone)]
pub struct ClosingStrategy {
    pool: Pool,
    transient: Vec<StateId>,
    next: Option<StateId>,
}

impl ClosingStrategy {
    pub fn with_pool(pool: Pool) -> Self {
        Self {
            pool,
            transient: Vec::new(),
            next: None,
        }
    }

    /// Breadth-first exploration.
    pub fn bfs() -> Self {
        Self::with_pool(Pool::Breadth(VecDeque::new()))
    }

    /// Depth-first exploration.
    pub fn dfs() -> Self {
        Self::with_pool(Pool::Depth(Vec::new()))
    }

    /// Closes the start state (and its transient successors) only.
    pub fn explore_state() -> Self {
        Self::with_pool(Pool::Single {
            accepts: None,
            slot: None,
        })
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    fn enqueue<R: RuleSystem>(&mut self, gts: &Gts<R>, state: StateId) {
        if gts.is_transient(state) {
            self.transient.push(state);
        } else {
            self.pool.put(state);
        }
    }

    fn compute_next_state(&mut self) -> Option<StateId> {
        self.transient.pop().or_else(|| self.pool.take())
    }
}

impl<R: RuleSystem> Strategy<R> for ClosingStrategy {
    fn name(&self) -> &'static str {
        match self.pool {
            Pool::Breadth(_) => "bfs",
            Pool::Depth(_) => "dfs",
            Pool::Single { .. } => "state",
        }
    }

    fn prepare(&mut self, run: &mut Exploration<'_, R>) -> ExploreResult<()> {
        let start = run.start_state();
        run.forget_known(start);
        self.pool.clear(start);
        self.transient.clear();
        self.next = Some(start);
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.next.is_some()
    }

    fn do_next(&mut self, run: &mut Exploration<'_, R>) -> ExploreResult<StateId> {
        let Some(state) = self.next.take() else {
            return Ok(run.start_state());
        };

        // Successors that existed before the run are not reported as fresh,
        // so they are queued here, closed or not.
        let out = run.gts().out_transitions(state).to_vec();
        for t in out {
            let target = run.gts().transition(t).target;
            if run.is_known(target) {
                run.forget_known(target);
                self.enqueue(run.gts(), target);
            }
        }

        while run.pending_count(state) > 0 {
            match run.apply_match(state, 0) {
                Ok(applied) => {
                    if applied.fresh {
                        self.enqueue(run.gts(), applied.target);
                    }
                }
                Err(e) => {
                    self.next = Some(state);
                    return Err(e);
                }
            }
        }

        self.next = self.compute_next_state();
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptor::FinalStateAcceptor;
    use crate::config::ExploreConfig;
    use crate::error::ExploreError;
    use crate::strategy::{Explorer, Termination};
    use grove_gts::Lts;

    fn names(gts: &Gts<Lts>, states: &[StateId]) -> Vec<String> {
        states
            .iter()
            .map(|&s| gts.rules().name(*gts.graph(s)).to_string())
            .collect()
    }

    fn drive(strategy: &mut ClosingStrategy, gts: &mut Gts<Lts>) -> Vec<StateId> {
        let mut acceptor = FinalStateAcceptor::new(0);
        let config = ExploreConfig::default();
        let start = gts.start_state();
        let mut run = Exploration::new(gts, &mut acceptor, &config, start).unwrap();
        strategy.prepare(&mut run).unwrap();
        let mut order = Vec::new();
        while Strategy::<Lts>::has_next(strategy) {
            order.push(strategy.do_next(&mut run).unwrap());
        }
        order
    }

    fn tree() -> Lts {
        Lts::from_edges(
            "p",
            &[("p", "x", "a"), ("p", "y", "b"), ("a", "x", "c"), ("b", "y", "d")],
        )
    }

    #[test]
    fn test_bfs_order() {
        let mut gts = Gts::new(tree());
        let order = drive(&mut ClosingStrategy::bfs(), &mut gts);
        assert_eq!(names(&gts, &order), ["p", "a", "b", "c", "d"]);
        assert!(gts.state_ids().all(|s| gts.is_closed(s)));
    }

    #[test]
    fn test_dfs_order() {
        let mut gts = Gts::new(tree());
        let order = drive(&mut ClosingStrategy::dfs(), &mut gts);
        assert_eq!(names(&gts, &order), ["p", "b", "d", "a", "c"]);
    }

    #[test]
    fn test_transient_states_first() {
        let mut lts = Lts::from_edges("p", &[("p", "a", "q"), ("p", "b", "t"), ("t", "c", "u")]);
        lts.set_transient("t");
        let mut gts = Gts::new(lts);
        let order = drive(&mut ClosingStrategy::bfs(), &mut gts);
        assert_eq!(names(&gts, &order), ["p", "t", "q", "u"]);
    }

    #[test]
    fn test_explore_single_state() {
        let mut gts = Gts::new(Lts::from_edges("p", &[("p", "a", "q"), ("q", "b", "r")]));
        let mut strategy = ClosingStrategy::explore_state();
        let order = drive(&mut strategy, &mut gts);
        assert_eq!(names(&gts, &order), ["p"]);
        assert_eq!(gts.len(), 2);
        assert!(strategy.pool().is_empty());
    }

    #[test]
    fn test_deadlock_not_requeued() {
        let mut gts = Gts::new(Lts::from_edges("p", &[("p", "a", "dead"), ("p", "b", "q"), ("q", "c", "p")]));
        let order = drive(&mut ClosingStrategy::bfs(), &mut gts);
        let names = names(&gts, &order);
        assert_eq!(names.iter().filter(|n| *n == "dead").count(), 1);
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_interrupted_state_stays_next() {
        let mut lts = Lts::from_edges("p", &[("p", "a", "q"), ("p", "b", "r")]);
        lts.interrupt_on("b", 1);
        let mut gts = Gts::new(lts);
        let mut acceptor = FinalStateAcceptor::new(0);
        let config = ExploreConfig::default();
        let start = gts.start_state();
        let mut run = Exploration::new(&mut gts, &mut acceptor, &config, start).unwrap();
        let mut strategy = ClosingStrategy::bfs();
        strategy.prepare(&mut run).unwrap();

        assert!(matches!(strategy.do_next(&mut run), Err(ExploreError::Interrupted)));
        assert!(Strategy::<Lts>::has_next(&strategy));
        assert_eq!(strategy.do_next(&mut run).unwrap(), start);
        assert!(run.gts().is_closed(start));
        assert_eq!(run.gts().len(), 3);
    }

    #[test]
    fn test_resume_after_interruption() {
        let mut lts = Lts::from_edges("p", &[("p", "a", "q"), ("q", "b", "r")]);
        lts.interrupt_on("b", 1);
        let mut gts = Gts::new(lts);
        let mut explorer = Explorer::default();
        let mut acceptor = FinalStateAcceptor::new(0);

        let first = explorer
            .play(&mut ClosingStrategy::bfs(), &mut gts, None, &mut acceptor)
            .unwrap();
        assert_eq!(first.termination, Termination::Interrupted);
        assert_eq!(gts.len(), 2);

        let second = explorer
            .play(&mut ClosingStrategy::bfs(), &mut gts, None, &mut acceptor)
            .unwrap();
        assert_eq!(second.termination, Termination::Exhausted);
        assert_eq!(gts.len(), 3);
        assert!(gts.state_ids().all(|s| gts.is_closed(s)));
        assert_eq!(second.message, "1 final state");
    }

    #[test]
    fn test_resume_through_closed_states() {
        let mut lts = Lts::from_edges("p", &[("p", "a", "q"), ("q", "b", "r"), ("r", "c", "s")]);
        lts.interrupt_on("c", 1);
        let mut gts = Gts::new(lts);
        let mut explorer = Explorer::default();
        let mut acceptor = FinalStateAcceptor::new(0);

        let first = explorer
            .play(&mut ClosingStrategy::bfs(), &mut gts, None, &mut acceptor)
            .unwrap();
        assert_eq!(first.termination, Termination::Interrupted);
        let open: Vec<StateId> = gts.state_ids().filter(|&s| !gts.is_closed(s)).collect();
        assert_eq!(names(&gts, &open), ["r"]);

        for mut strategy in [ClosingStrategy::bfs(), ClosingStrategy::dfs()] {
            let second = explorer
                .play(&mut strategy, &mut gts, None, &mut acceptor)
                .unwrap();
            assert_eq!(second.termination, Termination::Exhausted);
            assert_eq!(gts.len(), 4);
            assert!(gts.state_ids().all(|s| gts.is_closed(s)));
            assert_eq!(second.message, "1 final state");
        }
    }

    #[test]
    fn test_resume_visits_known_states_once() {
        let mut gts = Gts::new(Lts::from_edges("p", &[("p", "a", "q"), ("q", "b", "p")]));
        let mut explorer = Explorer::default();
        let mut acceptor = FinalStateAcceptor::new(0);
        explorer
            .play(&mut ClosingStrategy::bfs(), &mut gts, None, &mut acceptor)
            .unwrap();

        let again = explorer
            .play(&mut ClosingStrategy::bfs(), &mut gts, None, &mut acceptor)
            .unwrap();
        assert_eq!(again.termination, Termination::Exhausted);
        assert_eq!(again.steps, 2);
        assert_eq!(gts.transition_count(), 2);
    }
}
