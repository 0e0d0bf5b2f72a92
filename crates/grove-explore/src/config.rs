//! Run configuration.

use std::sync::atomic::{AtomicBool, AtomicUsize};
use std::sync::Arc;

/// Lock-free progress counters. The explorer stores into them after every
/// step; observers read them on their own schedule and never block the run.
pub struct ProgressCounters {
    /// States in the state space.
    pub states: AtomicUsize,
    /// Calls to `do_next` completed.
    pub steps: AtomicUsize,
    /// Current bounded-search iteration. Only the bounded strategies store
    /// it; it stays 0 under every other strategy.
    pub iteration: AtomicUsize,
    /// Length of the LTL search stack.
    pub stack_depth: AtomicUsize,
}

impl Default for ProgressCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self {
            states: AtomicUsize::new(0),
            steps: AtomicUsize::new(0),
            iteration: AtomicUsize::new(0),
            stack_depth: AtomicUsize::new(0),
        }
    }
}

/// Configuration shared by every strategy of one [`crate::Explorer`].
#[derive(Clone, Default)]
pub struct ExploreConfig {
    /// Seed for randomized successor choice. Equal seeds give equal runs.
    pub seed: u64,
    /// Maximum number of bounded-search iterations (0 = unlimited).
    pub max_iterations: usize,
    /// Shared progress counters, if anyone is watching.
    pub progress: Option<Arc<ProgressCounters>>,
    /// External cancellation request, checked between steps.
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl std::fmt::Debug for ExploreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExploreConfig")
            .field("seed", &self.seed)
            .field("max_iterations", &self.max_iterations)
            .field("progress", &self.progress.as_ref().map(|_| "..."))
            .field("stop_flag", &self.stop_flag)
            .finish()
    }
}
