#![no_main]
use grove_buchi::parse_automaton;
use grove_explore::{
    BoundedLtlStrategy, ClosingStrategy, CycleAcceptor, ExploreConfig, Explorer,
    FinalStateAcceptor, LinearStrategy, LtlStrategy, NodeCountBoundary, RuleSetBoundary,
};
use grove_gts::{Gts, Lts};
use libfuzzer_sys::fuzz_target;

const LABELS: [&str; 4] = ["a", "b", "c", "d"];

fn build(data: &[u8]) -> Lts {
    let mut lts = Lts::new();
    lts.set_start("n0");
    for chunk in data.chunks_exact(3) {
        let from = format!("n{}", chunk[0] % 16);
        let to = format!("n{}", chunk[2] % 16);
        lts.add_edge(&from, LABELS[(chunk[1] % 4) as usize], &to);
        if chunk[1] & 0x80 != 0 {
            lts.set_transient(&to);
        }
        lts.set_size(&to, (chunk[1] >> 4) as usize % 6 + 1);
    }
    lts
}

fuzz_target!(|data: &[u8]| {
    let Some((&seed, rest)) = data.split_first() else {
        return;
    };
    let config = ExploreConfig {
        seed: u64::from(seed),
        max_iterations: 6,
        ..ExploreConfig::default()
    };
    let mut explorer = Explorer::new(config);

    for mut strategy in [
        ClosingStrategy::bfs(),
        ClosingStrategy::dfs(),
        ClosingStrategy::explore_state(),
    ] {
        let mut gts = Gts::new(build(rest));
        let mut acceptor = FinalStateAcceptor::new(0);
        let _ = explorer.play(&mut strategy, &mut gts, None, &mut acceptor);
    }

    let mut gts = Gts::new(build(rest));
    let mut acceptor = FinalStateAcceptor::new(0);
    let _ = explorer.play(&mut LinearStrategy::new(true), &mut gts, None, &mut acceptor);

    let Ok(automaton) = parse_automaton(
        "init T0\naccept acc\nT0 -> T0 : true\nT0 -> acc : d\nacc -> acc : !a\n",
    ) else {
        return;
    };

    let mut gts = Gts::new(build(rest));
    let mut acceptor = CycleAcceptor::default();
    let _ = explorer.play(
        &mut LtlStrategy::new(automaton.clone()),
        &mut gts,
        None,
        &mut acceptor,
    );

    let mut gts = Gts::new(build(rest));
    let mut acceptor = CycleAcceptor::default();
    let _ = explorer.play(
        &mut BoundedLtlStrategy::bounded(automaton.clone(), RuleSetBoundary::new(["c"])),
        &mut gts,
        None,
        &mut acceptor,
    );

    let mut gts = Gts::new(build(rest));
    let mut acceptor = CycleAcceptor::default();
    let _ = explorer.play(
        &mut BoundedLtlStrategy::pocket(automaton, NodeCountBoundary::new(2, 1)),
        &mut gts,
        None,
        &mut acceptor,
    );
});
