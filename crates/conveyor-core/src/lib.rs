//! Conveyor Core -- a discrete-time simulation of an assembly line.
//!
//! Raw parts ride a circular conveyor belt of fixed length. At every slot a
//! pair of workers stands on opposite sides, collecting the parts they need,
//! assembling them into a product and putting the product back on the belt.
//! Whatever reaches the end of the belt is counted: finished products on one
//! side, unused raw parts on the other.
//!
//! # Four-Phase Timeslot Pipeline
//!
//! Each call to [`line::ProductionLine::step`] advances the line by one
//! timeslot through the following phases:
//!
//! 1. **Exit** -- Count the item on the tail slot as a product or a drop.
//! 2. **Rotate** -- Shift every item one slot and clear reservations.
//! 3. **Inject** -- Draw from the item source and enqueue at the head.
//! 4. **Work** -- Run both workers of each slot in a random order.
//!
//! # Contention
//!
//! Each slot allows one state-changing operation per timeslot. The first
//! collect or place at a slot reserves it until the next rotation, so the two
//! workers of a slot never both act on it in the same timeslot.
//!
//! # Key Types
//!
//! - [`line::ProductionLine`] -- Orchestrator owning belt, source and workers.
//! - [`belt::Belt`] -- Ring-buffer belt with per-slot reservations.
//! - [`position::PositionView`] -- A belt narrowed to one slot.
//! - [`worker::Worker`] -- Collect/assemble/release state machine with
//!   deadlock avoidance.
//! - [`config::LineConfig`] -- Line description loadable from RON, TOML or
//!   JSON.
//! - [`snapshot`] -- Versioned binary snapshots via bitcode.

pub mod belt;
pub mod config;
pub mod id;
pub mod item;
pub mod line;
pub mod position;
pub mod replicate;
pub mod rng;
pub mod sim;
pub mod snapshot;
pub mod source;
pub mod worker;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
