//! The strategy contract and the play loop that drives it.

use crate::acceptor::Acceptor;
use crate::config::ExploreConfig;
use crate::error::{ExploreError, ExploreResult};
use grove_gts::{Applied, Gts, GtsEvent, RuleSystem, StateId};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// A traversal policy over a [`Gts`].
///
/// The [`Explorer`] calls [`Strategy::prepare`] once, then [`Strategy::do_next`]
/// as long as [`Strategy::has_next`] holds and the acceptor is not done, and
/// finally [`Strategy::finish`].
pub trait Strategy<R: RuleSystem> {
    fn name(&self) -> &'static str;

    /// Reset the strategy for a run starting at `run.start_state()`.
    fn prepare(&mut self, run: &mut Exploration<'_, R>) -> ExploreResult<()>;

    /// Whether there is a state left to process.
    fn has_next(&self) -> bool;

    /// Process the next state and advance the cursor. Returns the processed state.
    fn do_next(&mut self, run: &mut Exploration<'_, R>) -> ExploreResult<StateId>;

    fn finish(&mut self, _run: &mut Exploration<'_, R>) {}
}

/// Everything a strategy touches during one run: the state space, the
/// acceptor, the configuration, and the states that existed before the run.
///
/// All state space mutation goes through here so that the change events are
/// delivered to the acceptor right after each rule application.
pub struct Exploration<'a, R: RuleSystem> {
    gts: &'a mut Gts<R>,
    acceptor: &'a mut dyn Acceptor<R>,
    config: &'a ExploreConfig,
    start: StateId,
    known: Vec<bool>,
}

impl<'a, R: RuleSystem> Exploration<'a, R> {
    pub fn new(
        gts: &'a mut Gts<R>,
        acceptor: &'a mut dyn Acceptor<R>,
        config: &'a ExploreConfig,
        start: StateId,
    ) -> ExploreResult<Self> {
        if !gts.contains(start) {
            return Err(ExploreError::UnknownStartState(start));
        }
        // Events from before the run are history, not news.
        gts.drain_events();
        let known = vec![true; gts.len()];
        Ok(Self {
            gts,
            acceptor,
            config,
            start,
            known,
        })
    }

    #[inline]
    pub fn gts(&self) -> &Gts<R> {
        &*self.gts
    }

    #[inline]
    pub fn start_state(&self) -> StateId {
        self.start
    }

    #[inline]
    pub fn config(&self) -> &ExploreConfig {
        self.config
    }

    pub fn acceptor(&mut self) -> &mut (dyn Acceptor<R> + 'a) {
        &mut *self.acceptor
    }

    /// Whether `state` was already in the state space when the run started
    /// and has not been claimed by the strategy since.
    pub fn is_known(&self, state: StateId) -> bool {
        self.known.get(state.index()).copied().unwrap_or(false)
    }

    pub fn forget_known(&mut self, state: StateId) {
        if let Some(flag) = self.known.get_mut(state.index()) {
            *flag = false;
        }
    }

    /// Number of matches of `state` not yet applied.
    pub fn pending_count(&mut self, state: StateId) -> usize {
        let n = self.gts.pending_count(state);
        self.dispatch_events();
        n
    }

    /// Apply one pending match of `state` and deliver the resulting events.
    pub fn apply_match(&mut self, state: StateId, index: usize) -> ExploreResult<Applied> {
        let result = self.gts.apply_match(state, index);
        self.dispatch_events();
        Ok(result?)
    }

    /// Apply every pending match of `state`, closing it.
    pub fn close_state(&mut self, state: StateId) -> ExploreResult<Vec<Applied>> {
        let mut applied = Vec::new();
        while self.pending_count(state) > 0 {
            applied.push(self.apply_match(state, 0)?);
        }
        Ok(applied)
    }

    /// Cooperative cancellation check.
    pub fn test_interrupted(&self) -> bool {
        self.config
            .stop_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn dispatch_events(&mut self) {
        for event in self.gts.drain_events() {
            match event {
                GtsEvent::StateAdded(s) => self.acceptor.state_added(&*self.gts, s),
                GtsEvent::TransitionAdded(t) => self.acceptor.transition_added(&*self.gts, t),
                GtsEvent::StateClosed(s) => self.acceptor.state_closed(&*self.gts, s),
            }
        }
        if let Some(ref p) = self.config.progress {
            p.states.store(self.gts.len(), Ordering::Relaxed);
        }
    }
}

/// How a run ended. All three are normal terminations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The strategy had nothing left to explore.
    Exhausted,
    /// The acceptor reported it was done.
    Accepted,
    /// The run was cancelled, by the stop flag or an interrupted rule application.
    Interrupted,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Termination::Exhausted => "exhausted",
            Termination::Accepted => "accepted",
            Termination::Interrupted => "interrupted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub termination: Termination,
    /// Number of completed `do_next` calls.
    pub steps: usize,
    /// Size of the state space afterwards.
    pub states: usize,
    /// The acceptor's summary.
    pub message: String,
}

/// Runs strategies.
#[derive(Debug, Default)]
pub struct Explorer {
    config: ExploreConfig,
    interrupted: bool,
}

impl Explorer {
    pub fn new(config: ExploreConfig) -> Self {
        Self {
            config,
            interrupted: false,
        }
    }

    pub fn config(&self) -> &ExploreConfig {
        &self.config
    }

    /// Set an external stop flag, checked between steps.
    pub fn set_stop_flag(&mut self, flag: Arc<AtomicBool>) {
        self.config.stop_flag = Some(flag);
    }

    /// Whether the last run ended by cancellation.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Explore `gts` with `strategy` from `start` (default: the start state
    /// of `gts`), reporting to `acceptor`.
    pub fn play<R, S>(
        &mut self,
        strategy: &mut S,
        gts: &mut Gts<R>,
        start: Option<StateId>,
        acceptor: &mut dyn Acceptor<R>,
    ) -> ExploreResult<Outcome>
    where
        R: RuleSystem,
        S: Strategy<R> + ?Sized,
    {
        self.interrupted = false;
        let start = start.unwrap_or_else(|| gts.start_state());
        acceptor.prepare(gts);
        let mut run = Exploration::new(gts, acceptor, &self.config, start)?;

        info!(strategy = strategy.name(), start = %start, "starting exploration");

        let mut steps = 0usize;
        let termination = match strategy.prepare(&mut run) {
            Err(ExploreError::Interrupted) => Termination::Interrupted,
            Err(e) => return Err(e),
            Ok(()) => loop {
                if run.acceptor().done() {
                    break Termination::Accepted;
                }
                if !strategy.has_next() {
                    break Termination::Exhausted;
                }
                if run.test_interrupted() {
                    break Termination::Interrupted;
                }
                match strategy.do_next(&mut run) {
                    Ok(state) => {
                        steps += 1;
                        trace!(state = %state, steps, "processed state");
                        if let Some(ref p) = self.config.progress {
                            p.steps.store(steps, Ordering::Relaxed);
                        }
                    }
                    Err(ExploreError::Interrupted) => {
                        debug!(steps, "rule application interrupted");
                        break Termination::Interrupted;
                    }
                    Err(e) => {
                        strategy.finish(&mut run);
                        return Err(e);
                    }
                }
            },
        };

        strategy.finish(&mut run);
        self.interrupted = termination == Termination::Interrupted;

        let outcome = Outcome {
            termination,
            steps,
            states: run.gts().len(),
            message: run.acceptor().message(),
        };
        info!(
            strategy = strategy.name(),
            termination = %outcome.termination,
            steps = outcome.steps,
            states = outcome.states,
            "exploration finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptor::{Answers, FinalStateAcceptor};
    use grove_gts::Lts;

    /// Processes the start state once.
    struct Once {
        next: Option<StateId>,
    }

    impl<R: RuleSystem> Strategy<R> for Once {
        fn name(&self) -> &'static str {
            "once"
        }

        fn prepare(&mut self, run: &mut Exploration<'_, R>) -> ExploreResult<()> {
            self.next = Some(run.start_state());
            Ok(())
        }

        fn has_next(&self) -> bool {
            self.next.is_some()
        }

        fn do_next(&mut self, run: &mut Exploration<'_, R>) -> ExploreResult<StateId> {
            let state = self.next.take().unwrap_or_else(|| run.start_state());
            run.close_state(state)?;
            Ok(state)
        }
    }

    /// Records every event it sees.
    #[derive(Default)]
    struct Recorder {
        added: Vec<StateId>,
        closed: Vec<StateId>,
        answers: Answers,
    }

    impl<R: RuleSystem> Acceptor<R> for Recorder {
        fn state_added(&mut self, _gts: &Gts<R>, state: StateId) {
            self.added.push(state);
        }

        fn state_closed(&mut self, _gts: &Gts<R>, state: StateId) {
            self.closed.push(state);
        }

        fn add_state(&mut self, state: StateId) {
            self.answers.add(state);
        }

        fn answers(&self) -> &Answers {
            &self.answers
        }

        fn message(&self) -> String {
            format!("{} added", self.added.len())
        }
    }

    #[test]
    fn test_play_delivers_events() {
        let mut gts = Gts::new(Lts::from_edges("p", &[("p", "a", "q"), ("p", "b", "r")]));
        let mut recorder = Recorder::default();
        let mut explorer = Explorer::default();
        let outcome = explorer
            .play(&mut Once { next: None }, &mut gts, None, &mut recorder)
            .unwrap();
        assert_eq!(outcome.termination, Termination::Exhausted);
        assert_eq!(outcome.steps, 1);
        assert_eq!(outcome.states, 3);
        assert_eq!(outcome.message, "2 added");
        assert_eq!(recorder.closed, vec![gts.start_state()]);
        assert!(!explorer.is_interrupted());
    }

    #[test]
    fn test_interrupted_application_ends_run() {
        let mut lts = Lts::from_edges("p", &[("p", "a", "q")]);
        lts.interrupt_on("a", 1);
        let mut gts = Gts::new(lts);
        let mut acceptor = FinalStateAcceptor::new(0);
        let mut explorer = Explorer::default();
        let outcome = explorer
            .play(&mut Once { next: None }, &mut gts, None, &mut acceptor)
            .unwrap();
        assert_eq!(outcome.termination, Termination::Interrupted);
        assert_eq!(outcome.steps, 0);
        assert!(explorer.is_interrupted());
        assert_eq!(gts.len(), 1);
    }

    #[test]
    fn test_stop_flag_prevents_steps() {
        let mut gts = Gts::new(Lts::from_edges("p", &[("p", "a", "q")]));
        let mut acceptor = FinalStateAcceptor::new(0);
        let mut explorer = Explorer::default();
        explorer.set_stop_flag(Arc::new(AtomicBool::new(true)));
        let outcome = explorer
            .play(&mut Once { next: None }, &mut gts, None, &mut acceptor)
            .unwrap();
        assert_eq!(outcome.termination, Termination::Interrupted);
        assert_eq!(outcome.steps, 0);
    }

    #[test]
    fn test_unknown_start_state() {
        let mut gts = Gts::new(Lts::from_edges("p", &[("p", "a", "q")]));
        let mut other = Gts::new(Lts::from_edges("x", &[("x", "a", "y"), ("y", "b", "z")]));
        let mut acceptor = FinalStateAcceptor::new(0);
        let mut explorer = Explorer::default();
        explorer
            .play(&mut Once { next: None }, &mut other, None, &mut acceptor)
            .unwrap();
        let far = other.state_ids().last().unwrap();
        let err = explorer
            .play(&mut Once { next: None }, &mut gts, Some(far), &mut acceptor)
            .unwrap_err();
        assert!(matches!(err, ExploreError::UnknownStartState(s) if s == far));
    }
}
