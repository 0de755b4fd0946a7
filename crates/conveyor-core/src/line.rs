//! The production line: one belt, one item source, two workers per slot.
//!
//! # Timeslot pipeline
//!
//! Each call to [`ProductionLine::step`] runs, in order:
//!
//! 1. **Exit** -- classify the item on the tail slot (product or unused raw
//!    part) before it falls off.
//! 2. **Rotate** -- advance the belt one slot and clear reservations.
//! 3. **Inject** -- draw from the item source and enqueue at the head.
//! 4. **Work** -- for every slot, draw a priority bit and run the front and
//!    back workers in the order it selects.
//!
//! With a fixed order, the first worker at a slot could win every contested
//! collect or release; the per-slot coin flip gives both sides an even share
//! in the long run while each timeslot stays deterministic given the draw.

use crate::belt::{Belt, BeltError, ConveyorBelt};
use crate::config::{ConfigError, LineConfig};
use crate::id::PartId;
use crate::position::PositionView;
use crate::rng::{RandomSource, SimRng};
use crate::sim::{SimulationComponent, StateHash};
use crate::source::{ItemSource, SourceError, UniformSource};
use crate::worker::{Worker, WorkerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error};

/// Mixed into the seed so the priority stream differs from the item stream.
const PRIORITY_STREAM: u64 = 0xD1B5_4A32_D192_ED03;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors building or running a line.
///
/// Belt errors while running mean the timeslot pipeline itself is broken;
/// the run should be treated as failed.
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error(transparent)]
    Belt(#[from] BeltError),
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Stations
// ---------------------------------------------------------------------------

/// Which side of the belt a worker stands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Front,
    Back,
}

impl Side {
    /// Map a priority bit to the side that acts first.
    pub fn from_bit(bit: bool) -> Self {
        if bit { Side::Front } else { Side::Back }
    }

    pub fn other(self) -> Self {
        match self {
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Front => write!(f, "Front"),
            Side::Back => write!(f, "Back"),
        }
    }
}

/// The two workers sharing one belt slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    front: Worker,
    back: Worker,
}

impl Station {
    pub fn new(front: Worker, back: Worker) -> Self {
        Self { front, back }
    }

    pub fn worker(&self, side: Side) -> &Worker {
        match side {
            Side::Front => &self.front,
            Side::Back => &self.back,
        }
    }

    fn worker_mut(&mut self, side: Side) -> &mut Worker {
        match side {
            Side::Front => &mut self.front,
            Side::Back => &mut self.back,
        }
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Counters accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStats {
    /// Products that left the belt at the tail.
    pub products: u64,
    /// Unused raw parts that left the belt at the tail.
    pub drops: u64,
    /// Items injected at the head.
    pub injected: u64,
    /// Assemblies completed by all workers.
    pub assembled: u64,
}

/// What happened during one timeslot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeslotReport {
    /// Part that left the belt at the tail, if any.
    pub exited: Option<PartId>,
    /// Part injected at the head, if any.
    pub injected: Option<PartId>,
    pub collected: u32,
    pub assembled: u32,
    pub released: u32,
}

// ---------------------------------------------------------------------------
// Production line
// ---------------------------------------------------------------------------

/// Orchestrates the belt, the source and every worker, one timeslot at a
/// time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionLine<S, R = SimRng> {
    belt: Belt,
    stations: Vec<Station>,
    source: S,
    rng: R,
    product: PartId,
    stats: LineStats,
    timeslot: u64,
}

impl ProductionLine<UniformSource, SimRng> {
    /// Build the line described by `config`, with a uniform source over its
    /// raw parts and both random streams derived from its seed.
    pub fn from_config(config: &LineConfig) -> Result<Self, LineError> {
        config.validate()?;
        let source = UniformSource::new(config.raw_parts(), config.empty_possible, SimRng::new(config.seed))?;
        Self::new(config, source, SimRng::new(config.seed ^ PRIORITY_STREAM))
    }
}

impl<S: ItemSource, R: RandomSource> ProductionLine<S, R> {
    /// Build a line with an injected item source and priority generator.
    pub fn new(config: &LineConfig, source: S, rng: R) -> Result<Self, LineError> {
        let belt = Belt::new(config.capacity)?;
        let mut stations = Vec::with_capacity(config.capacity);
        for _ in 0..config.capacity {
            let front = config.worker.build(config.assembly_duration)?;
            let back = config.worker.build(config.assembly_duration)?;
            stations.push(Station::new(front, back));
        }
        Ok(Self {
            belt,
            stations,
            source,
            rng,
            product: config.worker.product(),
            stats: LineStats::default(),
            timeslot: 0,
        })
    }

    /// Run one timeslot.
    pub fn step(&mut self) -> Result<TimeslotReport, LineError> {
        let mut report = TimeslotReport::default();

        // Phase 1: Exit -- count what is about to fall off.
        if let Some(item) = self.belt.tail() {
            let part = item.part();
            if part == self.product {
                self.stats.products += 1;
            } else {
                self.stats.drops += 1;
            }
            report.exited = Some(part);
        }

        // Phase 2: Rotate.
        self.belt.advance(1);

        // Phase 3: Inject.
        if let Some(item) = self.source.next_item() {
            report.injected = Some(item.part());
            self.belt.enqueue(item)?;
            self.stats.injected += 1;
        }

        // Phase 4: Work, in random priority per slot.
        for (pos, station) in self.stations.iter_mut().enumerate() {
            let first = Side::from_bit(self.rng.next_bool());
            for side in [first, first.other()] {
                let mut view = PositionView::new(&mut self.belt, pos)?;
                let outcome = station.worker_mut(side).step(&mut view);
                report.collected += u32::from(outcome.collected);
                report.assembled += u32::from(outcome.finished);
                report.released += u32::from(outcome.released);
            }
        }
        self.stats.assembled += u64::from(report.assembled);

        self.timeslot += 1;
        debug!(
            timeslot = self.timeslot,
            exited = ?report.exited,
            injected = ?report.injected,
            collected = report.collected,
            assembled = report.assembled,
            released = report.released,
            "timeslot complete"
        );
        Ok(report)
    }

    /// Run `timeslots` timeslots, stopping at the first error.
    pub fn try_run(&mut self, timeslots: usize) -> Result<LineStats, LineError> {
        for _ in 0..timeslots {
            self.step()?;
        }
        Ok(self.stats)
    }
}

impl<S, R> ProductionLine<S, R> {
    pub fn stats(&self) -> LineStats {
        self.stats
    }

    /// Products that made it off the end of the belt.
    pub fn product_count(&self) -> u64 {
        self.stats.products
    }

    /// Unused raw parts that made it off the end of the belt.
    pub fn drop_count(&self) -> u64 {
        self.stats.drops
    }

    /// Timeslots run so far.
    pub fn timeslot(&self) -> u64 {
        self.timeslot
    }

    pub fn belt(&self) -> &Belt {
        &self.belt
    }

    pub fn product(&self) -> PartId {
        self.product
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// The worker on `side` of slot `pos`.
    pub fn worker(&self, pos: usize, side: Side) -> Option<&Worker> {
        self.stations.get(pos).map(|s| s.worker(side))
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }

    /// Deterministic hash of belt, workers, counters and clock.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();
        hasher.write_u64(self.timeslot);
        hasher.write_u64(self.stats.products);
        hasher.write_u64(self.stats.drops);
        hasher.write_u64(self.stats.injected);
        hasher.write_u64(self.stats.assembled);
        for (item, reserved) in self.belt.slots() {
            match item {
                Some(item) => {
                    hasher.write_bool(true);
                    hasher.write_u32(item.part().0);
                }
                None => hasher.write_bool(false),
            }
            hasher.write_bool(reserved);
        }
        for station in &self.stations {
            station.front.hash_into(&mut hasher);
            station.back.hash_into(&mut hasher);
        }
        hasher.finish()
    }

    /// Whether belt and stations agree with each other. Only a line decoded
    /// from untrusted bytes can fail this.
    pub(crate) fn is_well_formed(&self) -> bool {
        self.belt.is_well_formed()
            && self.stations.len() == self.belt.capacity()
            && self
                .stations
                .iter()
                .flat_map(|s| [&s.front, &s.back])
                .all(|w| w.is_well_formed() && w.product() == self.product)
    }
}

impl<S: ItemSource, R: RandomSource> SimulationComponent for ProductionLine<S, R> {
    fn run(&mut self, timeslots: usize) {
        if let Err(err) = self.try_run(timeslots) {
            error!(%err, timeslot = self.timeslot, "production line halted");
        }
    }
}

impl<S, R> fmt::Display for ProductionLine<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "***** Timeslot {} *****", self.timeslot)?;
        writeln!(
            f,
            "products: {}, drops: {}",
            self.stats.products, self.stats.drops
        )?;
        writeln!(f, "belt: {}", self.belt)?;
        for (pos, station) in self.stations.iter().enumerate() {
            for side in [Side::Front, Side::Back] {
                writeln!(f, "{side} worker {pos}: {}", station.worker(side))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use crate::source::ScriptedSource;
    use crate::test_utils::*;

    #[test]
    fn from_config_builds_two_workers_per_slot() {
        let line = ProductionLine::from_config(&LineConfig::new(4, 2)).unwrap();
        assert_eq!(line.stations().len(), 4);
        assert_eq!(line.belt().capacity(), 4);
        assert_eq!(line.worker(3, Side::Back).unwrap().assembly_duration(), 2);
        assert!(line.worker(4, Side::Front).is_none());
        assert_eq!(line.product(), p());
    }

    #[test]
    fn from_config_seeds_separate_streams() {
        let line = ProductionLine::from_config(&LineConfig::new(3, 1).with_seed(11)).unwrap();
        assert_eq!(line.source().parts(), [a(), b()]);
        assert!(line.source().empty_possible());
        assert_eq!(line.source().outcomes(), 3);
        assert_ne!(line.source().rng(), line.rng());
    }

    #[test]
    fn invalid_configs_rejected() {
        assert!(matches!(
            ProductionLine::from_config(&LineConfig::new(0, 1)),
            Err(LineError::Config(ConfigError::Belt(BeltError::ZeroCapacity)))
        ));
        let mut config = LineConfig::default();
        config.worker.arms = 1;
        let result = ProductionLine::new(&config, ScriptedSource::default(), FixedPriority(Side::Front));
        assert!(matches!(result, Err(LineError::Worker(WorkerError::InsufficientArms { .. }))));
    }

    #[test]
    fn injection_lands_on_head() {
        let mut line = scripted_line(3, 5, [Some(c())], Side::Front);
        let report = line.step().unwrap();
        assert_eq!(report.injected, Some(c()));
        assert_eq!(line.belt().peek(0).unwrap(), Some(&Item::new(c())));
        assert_eq!(line.stats().injected, 1);
    }

    #[test]
    fn unused_parts_counted_as_drops() {
        let mut line = scripted_line(2, 0, [Some(c()), Some(c())], Side::Front);
        line.try_run(2).unwrap();
        assert_eq!(line.drop_count(), 0);
        let report = line.step().unwrap();
        assert_eq!(report.exited, Some(c()));
        line.step().unwrap();
        assert_eq!(line.drop_count(), 2);
        assert_eq!(line.product_count(), 0);
    }

    #[test]
    fn priority_side_wins_contested_slot() {
        for side in [Side::Front, Side::Back] {
            let mut line = scripted_line(1, 5, [Some(a())], side);
            line.step().unwrap();
            assert_eq!(line.worker(0, side).unwrap().held(a()), 1);
            assert_eq!(line.worker(0, side.other()).unwrap().held(a()), 0);
        }
    }

    #[test]
    fn each_slot_draws_its_own_priority() {
        // A, A fill one arm at slot 0 on each side, a third A survives slot 0
        // and meets B one timeslot later, so both slots are contested at t4.
        let script = [a(), a(), a(), b()].map(Some);
        for first in [Side::Front, Side::Back] {
            let priority = [Side::Front; 6].into_iter().chain([first, first.other()]);
            let mut line = ProductionLine::new(
                &LineConfig::new(2, 5),
                ScriptedSource::new(script),
                ScriptedPriority::new(priority),
            )
            .unwrap();
            line.try_run(4).unwrap();
            assert_eq!(line.rng().remaining(), 0);

            assert_eq!(line.worker(0, first).unwrap().held(b()), 1);
            assert_eq!(line.worker(0, first.other()).unwrap().held(b()), 0);
            assert_eq!(line.worker(1, first.other()).unwrap().held(a()), 1);
            assert_eq!(line.worker(1, first).unwrap().held(a()), 0);
        }
    }

    #[test]
    fn seeded_runs_repeat_exactly() {
        let config = LineConfig::new(5, 3).with_seed(77);
        let mut l1 = ProductionLine::from_config(&config).unwrap();
        let mut l2 = ProductionLine::from_config(&config).unwrap();
        for _ in 0..200 {
            l1.step().unwrap();
            l2.step().unwrap();
            assert_eq!(l1.state_hash(), l2.state_hash());
        }
        assert_eq!(l1.stats(), l2.stats());
    }

    #[test]
    fn simulation_component_runs_timeslots() {
        let mut line = ProductionLine::from_config(&LineConfig::new(3, 1)).unwrap();
        line.run(10);
        assert_eq!(line.timeslot(), 10);
    }

    #[test]
    fn display_lists_belt_and_workers() {
        let line = ProductionLine::from_config(&LineConfig::new(2, 1)).unwrap();
        let text = line.to_string();
        assert!(text.contains("products: 0, drops: 0"));
        assert!(text.contains("Front worker 1"));
        assert!(text.contains("Back worker 0"));
    }
}
