//! Property-based tests for the conveyor line.
//!
//! Uses proptest to generate random lines and item streams, then verify that
//! items are conserved, arms never overflow and runs are reproducible.

use conveyor_core::config::LineConfig;
use conveyor_core::id::PartId;
use conveyor_core::line::{ProductionLine, Side};
use conveyor_core::rng::SimRng;
use conveyor_core::snapshot;
use conveyor_core::source::{ScriptedSource, UniformSource};
use conveyor_core::test_utils::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

/// A stream of A, B, an unrelated C, or nothing.
fn arb_script(max_len: usize) -> impl Strategy<Value = Vec<Option<PartId>>> {
    proptest::collection::vec(
        prop_oneof![
            Just(Some(a())),
            Just(Some(b())),
            Just(Some(c())),
            Just(None),
        ],
        0..max_len,
    )
}

fn arb_line() -> impl Strategy<Value = ProductionLine<ScriptedSource, SimRng>> {
    (1usize..6, 0u32..4, 2u32..5, arb_script(80), any::<u64>()).prop_map(
        |(capacity, duration, arms, script, seed)| {
            let mut config = LineConfig::new(capacity, duration);
            config.worker.arms = arms;
            ProductionLine::new(&config, ScriptedSource::new(script), SimRng::new(seed)).unwrap()
        },
    )
}

fn workers<S, R>(line: &ProductionLine<S, R>) -> impl Iterator<Item = &conveyor_core::worker::Worker> {
    line.stations()
        .iter()
        .flat_map(|s| [s.worker(Side::Front), s.worker(Side::Back)])
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every injected raw part is on the belt, in an arm, consumed by an
    /// assembly or dropped; every assembled product is on the belt, in an
    /// arm or counted at the tail.
    #[test]
    fn items_are_conserved(mut line in arb_line()) {
        for _ in 0..100 {
            line.step().unwrap();
            let stats = line.stats();

            let raw_on_belt = on_belt(&line, a()) + on_belt(&line, b()) + on_belt(&line, c());
            let raw_held = held_by_workers(&line, a()) + held_by_workers(&line, b());
            prop_assert_eq!(stats.injected, raw_on_belt + raw_held + 2 * stats.assembled + stats.drops);

            let products = on_belt(&line, p()) + held_by_workers(&line, p()) + stats.products;
            prop_assert_eq!(stats.assembled, products);
        }
    }

    /// Arms never overflow and unrelated parts are never picked up.
    #[test]
    fn arms_never_overflow(mut line in arb_line()) {
        for _ in 0..100 {
            line.step().unwrap();
            for worker in workers(&line) {
                prop_assert!(worker.busy_arms() <= worker.arms());
                prop_assert_eq!(worker.held(c()), 0);
                // Surplus never eats the arms still needed.
                let raw = worker.held(a()) + worker.held(b());
                prop_assert!(raw + worker.needed_count() <= worker.arms());
            }
        }
    }

    /// Two lines from the same seed stay identical.
    #[test]
    fn same_seed_same_run(seed in any::<u64>(), capacity in 1usize..8, duration in 0u32..4) {
        let config = LineConfig::new(capacity, duration).with_seed(seed);
        let mut l1 = ProductionLine::from_config(&config).unwrap();
        let mut l2 = ProductionLine::from_config(&config).unwrap();
        for _ in 0..50 {
            l1.step().unwrap();
            l2.step().unwrap();
            prop_assert_eq!(l1.state_hash(), l2.state_hash());
        }
    }

    /// A restored snapshot continues exactly like the original.
    #[test]
    fn snapshot_resumes_run(seed in any::<u64>(), capacity in 1usize..6, before in 0usize..40) {
        let config = LineConfig::new(capacity, 2).with_seed(seed);
        let mut line = ProductionLine::from_config(&config).unwrap();
        line.try_run(before).unwrap();

        let bytes = snapshot::save(&line).unwrap();
        let mut restored: ProductionLine<UniformSource, SimRng> = snapshot::load(&bytes).unwrap();
        line.try_run(30).unwrap();
        restored.try_run(30).unwrap();
        prop_assert_eq!(restored.state_hash(), line.state_hash());
        prop_assert_eq!(restored.stats(), line.stats());
    }
}
