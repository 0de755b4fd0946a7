//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::config::LineConfig;
use crate::id::PartId;
use crate::line::{ProductionLine, Side};
use crate::rng::RandomSource;
use crate::source::ScriptedSource;
use crate::worker::Worker;
use std::collections::VecDeque;

// ===========================================================================
// Part constructors
// ===========================================================================

pub fn a() -> PartId {
    PartId::from_char('A')
}
pub fn b() -> PartId {
    PartId::from_char('B')
}
pub fn c() -> PartId {
    PartId::from_char('C')
}
pub fn p() -> PartId {
    PartId::from_char('P')
}

// ===========================================================================
// Workers
// ===========================================================================

/// Worker turning one A and one B into a P.
pub fn ab_worker(arms: u32, assembly_duration: u32) -> Worker {
    Worker::new(arms, [(a(), 1), (b(), 1)], p(), assembly_duration)
        .expect("ab worker needs at least 2 arms")
}

// ===========================================================================
// Priority
// ===========================================================================

/// A priority source that always lets the same side act first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPriority(pub Side);

impl RandomSource for FixedPriority {
    fn next_u64(&mut self) -> u64 {
        match self.0 {
            Side::Front => u64::MAX,
            Side::Back => 0,
        }
    }
}

/// A priority source that replays one side per draw, then always picks
/// `Front`. The line draws once per slot per timeslot, head first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedPriority {
    script: VecDeque<Side>,
}

impl ScriptedPriority {
    pub fn new(script: impl IntoIterator<Item = Side>) -> Self {
        Self { script: script.into_iter().collect() }
    }

    /// Draws still to be replayed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl RandomSource for ScriptedPriority {
    fn next_u64(&mut self) -> u64 {
        FixedPriority(self.script.pop_front().unwrap_or(Side::Front)).next_u64()
    }
}

// ===========================================================================
// Lines
// ===========================================================================

/// Default A+B line fed from `script`, with `first` always acting first.
pub fn scripted_line(
    capacity: usize,
    assembly_duration: u32,
    script: impl IntoIterator<Item = Option<PartId>>,
    first: Side,
) -> ProductionLine<ScriptedSource, FixedPriority> {
    ProductionLine::new(
        &LineConfig::new(capacity, assembly_duration),
        ScriptedSource::new(script),
        FixedPriority(first),
    )
    .expect("scripted line config is valid")
}

/// Units of `part` resting on the belt.
pub fn on_belt<S, R>(line: &ProductionLine<S, R>, part: PartId) -> u64 {
    line.belt()
        .slots()
        .filter(|(item, _)| item.map(|i| i.part()) == Some(part))
        .count() as u64
}

/// Units of `part` held by all workers.
pub fn held_by_workers<S, R>(line: &ProductionLine<S, R>, part: PartId) -> u64 {
    line.stations()
        .iter()
        .flat_map(|s| [s.worker(Side::Front), s.worker(Side::Back)])
        .map(|w| u64::from(w.held(part)))
        .sum()
}
