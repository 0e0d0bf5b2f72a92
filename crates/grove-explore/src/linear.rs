//! Linear exploration: one match per state, along a single path.

use crate::error::ExploreResult;
use crate::strategy::{Exploration, Strategy};
use grove_gts::{RuleSystem, StateId};
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::SeedableRng;

/// Applies a single match of each state and moves on to its target, until
/// the target was already there or the state has nothing left to apply.
///
/// The match is the first pending one, or a seeded random pick.
#[derive(Debug, Clone)]
pub struct LinearStrategy {
    random: bool,
    rng: StdRng,
    next: Option<StateId>,
}

impl LinearStrategy {
    pub fn new(random: bool) -> Self {
        Self {
            random,
            rng: StdRng::seed_from_u64(0),
            next: None,
        }
    }
}

impl<R: RuleSystem> Strategy<R> for LinearStrategy {
    fn name(&self) -> &'static str {
        if self.random {
            "random-linear"
        } else {
            "linear"
        }
    }

    fn prepare(&mut self, run: &mut Exploration<'_, R>) -> ExploreResult<()> {
        self.rng = StdRng::seed_from_u64(run.config().seed);
        self.next = Some(run.start_state());
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.next.is_some()
    }

    fn do_next(&mut self, run: &mut Exploration<'_, R>) -> ExploreResult<StateId> {
        let Some(state) = self.next.take() else {
            return Ok(run.start_state());
        };
        let n = run.pending_count(state);
        if n == 0 {
            return Ok(state);
        }
        let index = if self.random {
            (0..n).choose(&mut self.rng).unwrap_or(0)
        } else {
            0
        };
        match run.apply_match(state, index) {
            Ok(applied) => {
                if applied.fresh {
                    self.next = Some(applied.target);
                }
                Ok(state)
            }
            Err(e) => {
                self.next = Some(state);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptor::FinalStateAcceptor;
    use crate::config::ExploreConfig;
    use crate::strategy::{Explorer, Termination};
    use grove_gts::{Gts, Lts};

    fn fan() -> Lts {
        let mut lts = Lts::from_edges("p", &[("p", "a", "q"), ("q", "b", "r"), ("r", "c", "p")]);
        for i in 0..8 {
            lts.add_edge("p", "fan", &format!("f{}", i));
        }
        lts
    }

    #[test]
    fn test_linear_follows_first_match() {
        let mut gts = Gts::new(fan());
        let mut acceptor = FinalStateAcceptor::new(0);
        let outcome = Explorer::default()
            .play(&mut LinearStrategy::new(false), &mut gts, None, &mut acceptor)
            .unwrap();
        assert_eq!(outcome.termination, Termination::Exhausted);
        // p, q, r; the edge back to p ends the path.
        assert_eq!(outcome.steps, 3);
        assert_eq!(gts.len(), 3);
        assert!(!gts.is_closed(gts.start_state()));
    }

    #[test]
    fn test_random_linear_is_reproducible() {
        let run = |seed| {
            let mut gts = Gts::new(fan());
            let mut acceptor = FinalStateAcceptor::new(0);
            let mut explorer = Explorer::new(ExploreConfig {
                seed,
                ..ExploreConfig::default()
            });
            explorer
                .play(&mut LinearStrategy::new(true), &mut gts, None, &mut acceptor)
                .unwrap();
            gts.state_ids()
                .map(|s| gts.rules().name(*gts.graph(s)).to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
        assert_eq!(run(11), run(11));
    }
}
