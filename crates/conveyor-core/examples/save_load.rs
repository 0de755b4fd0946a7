//! Save/load example: snapshot round-trip.
//!
//! Builds a line, runs 25 timeslots, snapshots it to bytes, restores it into
//! a new line, and verifies both continue identically.
//!
//! Run with: `cargo run -p conveyor-core --example save_load`

use conveyor_core::config::LineConfig;
use conveyor_core::line::ProductionLine;
use conveyor_core::rng::SimRng;
use conveyor_core::snapshot;
use conveyor_core::source::UniformSource;

fn main() {
    let config = LineConfig::new(5, 2).with_seed(2024);
    let mut line = ProductionLine::from_config(&config).unwrap();
    line.try_run(25).unwrap();
    println!("{line}");

    let bytes = snapshot::save(&line).unwrap();
    println!("Snapshot: {} bytes", bytes.len());

    let mut restored: ProductionLine<UniformSource, SimRng> = snapshot::load(&bytes).unwrap();
    assert_eq!(restored.state_hash(), line.state_hash());

    line.try_run(100).unwrap();
    restored.try_run(100).unwrap();
    assert_eq!(restored.stats(), line.stats());
    println!(
        "After 125 timeslots: {} products, {} drops (original and restored agree)",
        line.product_count(),
        line.drop_count()
    );
}
