//! Criterion benchmarks for the exploration strategies.
//!
//! Run with: cargo bench -p grove-explore

use criterion::{criterion_group, criterion_main, Criterion};
use grove_buchi::{parse_automaton, BuchiAutomaton};
use grove_explore::{
    BoundedLtlStrategy, ClosingStrategy, CycleAcceptor, ExploreConfig, Explorer,
    FinalStateAcceptor, LtlStrategy, RuleSetBoundary,
};
use grove_gts::{Gts, Lts};

/// An `n` by `n` torus where every cell steps right and down.
fn grid(n: usize) -> Lts {
    let mut lts = Lts::new();
    lts.set_start("0_0");
    for x in 0..n {
        for y in 0..n {
            let here = format!("{}_{}", x, y);
            lts.add_edge(&here, "right", &format!("{}_{}", (x + 1) % n, y));
            lts.add_edge(&here, "down", &format!("{}_{}", x, (y + 1) % n));
        }
    }
    lts
}

fn never_accepting() -> BuchiAutomaton {
    parse_automaton("init idle\nidle -> idle : true\n").unwrap()
}

fn bench_closing(c: &mut Criterion, name: &str, n: usize, depth_first: bool) {
    c.bench_function(name, |b| {
        b.iter(|| {
            let mut gts = Gts::new(grid(n));
            let mut strategy = if depth_first {
                ClosingStrategy::dfs()
            } else {
                ClosingStrategy::bfs()
            };
            let mut acceptor = FinalStateAcceptor::new(0);
            Explorer::default()
                .play(&mut strategy, &mut gts, None, &mut acceptor)
                .unwrap();
        })
    });
}

fn benchmarks(c: &mut Criterion) {
    bench_closing(c, "bfs_grid_30", 30, false);
    bench_closing(c, "dfs_grid_30", 30, true);

    c.bench_function("ltl_grid_30_exhaustive", |b| {
        b.iter(|| {
            let mut gts = Gts::new(grid(30));
            let mut strategy = LtlStrategy::new(never_accepting());
            let mut acceptor = CycleAcceptor::default();
            Explorer::default()
                .play(&mut strategy, &mut gts, None, &mut acceptor)
                .unwrap();
        })
    });

    // Cycles through `down` keep deferring, so the iterations are capped.
    let capped = ExploreConfig {
        max_iterations: 4,
        ..ExploreConfig::default()
    };
    c.bench_function("bounded_ltl_grid_20", |b| {
        b.iter(|| {
            let mut gts = Gts::new(grid(20));
            let mut strategy =
                BoundedLtlStrategy::bounded(never_accepting(), RuleSetBoundary::new(["down"]));
            let mut acceptor = CycleAcceptor::default();
            Explorer::new(capped.clone())
                .play(&mut strategy, &mut gts, None, &mut acceptor)
                .unwrap();
        })
    });
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
