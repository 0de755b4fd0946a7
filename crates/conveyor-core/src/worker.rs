//! Worker actors: collect inputs from their slot, assemble, release products.
//!
//! A worker stands at one belt slot and owns a fixed number of *arms*. Every
//! timeslot it runs the same five attempts, in order:
//!
//! 1. **Countdown** -- tick the assembly timer down.
//! 2. **Collect** -- take the item at its slot if it is needed.
//! 3. **Initialize** -- start assembling once every quota is met.
//! 4. **Finalize** -- when the timer reaches zero, consume the quotas and
//!    hold one product.
//! 5. **Release** -- put a held product on the slot if it is free.
//!
//! Each attempt either succeeds or does nothing; none of them is an error.
//!
//! # Surplus and deadlock avoidance
//!
//! A worker may pick up more of a part than its quota (a *surplus* unit), but
//! only while its free arms strictly exceed the number of units it still
//! needs. Otherwise a stream made only of one part type could fill every arm
//! with that part and the worker would never make room for the rest.

use crate::id::PartId;
use crate::item::Item;
use crate::position::PositionControl;
use crate::sim::{SimulationComponent, StateHash};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{trace, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Worker configurations that can never complete an assembly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkerError {
    #[error("invalid configuration: a worker needs at least one arm")]
    NoArms,
    #[error("invalid configuration: {arms} arms cannot hold the {needed} items one assembly needs")]
    InsufficientArms { arms: u32, needed: u32 },
}

// ---------------------------------------------------------------------------
// Step outcome
// ---------------------------------------------------------------------------

/// Which of the five attempts succeeded during one timeslot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub counted_down: bool,
    pub collected: bool,
    pub started: bool,
    pub finished: bool,
    pub released: bool,
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// A stateful assembler bound (per timeslot) to one belt slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    arms: u32,
    quotas: BTreeMap<PartId, u32>,
    product: PartId,
    assembly_duration: u32,
    /// Units held per part, including finished products.
    held: BTreeMap<PartId, u32>,
    busy_arms: u32,
    /// Units still required across all quotas (surplus never counts).
    needed_count: u32,
    assembly_countdown: u32,
    busy: bool,
}

impl Worker {
    /// Create an idle worker with empty arms.
    ///
    /// Repeated parts in `quotas` are summed.
    pub fn new(
        arms: u32,
        quotas: impl IntoIterator<Item = (PartId, u32)>,
        product: PartId,
        assembly_duration: u32,
    ) -> Result<Self, WorkerError> {
        if arms == 0 {
            return Err(WorkerError::NoArms);
        }

        let mut quota_map: BTreeMap<PartId, u32> = BTreeMap::new();
        for (part, quantity) in quotas {
            *quota_map.entry(part).or_insert(0) += quantity;
        }

        let needed: u32 = quota_map.values().sum();
        if arms < needed {
            return Err(WorkerError::InsufficientArms { arms, needed });
        }

        let mut held: BTreeMap<PartId, u32> = quota_map.keys().map(|&part| (part, 0)).collect();
        held.insert(product, 0);

        Ok(Self {
            arms,
            quotas: quota_map,
            product,
            assembly_duration,
            held,
            busy_arms: 0,
            needed_count: needed,
            assembly_countdown: 0,
            busy: false,
        })
    }

    // -----------------------------------------------------------------------
    // Timeslot
    // -----------------------------------------------------------------------

    /// Run one timeslot against `position`.
    pub fn step<P: PositionControl + ?Sized>(&mut self, position: &mut P) -> StepOutcome {
        StepOutcome {
            counted_down: self.count_down(),
            collected: self.try_collect(position),
            started: self.try_initialize_assembly(),
            finished: self.try_finalize_assembly(),
            released: self.try_release(position),
        }
    }

    /// Decrement the assembly timer if it is running.
    pub fn count_down(&mut self) -> bool {
        if self.assembly_countdown == 0 {
            return false;
        }
        self.assembly_countdown -= 1;
        true
    }

    /// Take the item at `position` if this worker can hold and use it.
    pub fn try_collect<P: PositionControl + ?Sized>(&mut self, position: &mut P) -> bool {
        let part = match position.peek() {
            Ok(Some(item)) => item.part(),
            _ => return false,
        };
        if !(self.can_pick(position) && self.can_use(part)) {
            return false;
        }

        let item = match position.collect() {
            Ok(item) => item,
            Err(err) => {
                warn!(%err, "slot refused a collect that passed every check");
                return false;
            }
        };

        let part = item.part();
        let quota = self.quota(part);
        let held = self.held.entry(part).or_insert(0);
        if *held < quota {
            self.needed_count -= 1;
        }
        *held += 1;
        self.busy_arms += 1;
        trace!(%part, busy_arms = self.busy_arms, needed = self.needed_count, "collected");
        true
    }

    /// Start assembling if idle and every quota is met.
    pub fn try_initialize_assembly(&mut self) -> bool {
        if self.busy || self.needed_count > 0 {
            return false;
        }
        self.busy = true;
        self.assembly_countdown = self.assembly_duration;
        trace!(countdown = self.assembly_countdown, "assembly started");
        true
    }

    /// Finish the running assembly once its timer has expired.
    ///
    /// Consumes exactly one quota of each input (surplus stays in the arms),
    /// recomputes the still-needed count from what remains, and puts the
    /// product in a free arm.
    pub fn try_finalize_assembly(&mut self) -> bool {
        if !self.busy || self.assembly_countdown > 0 {
            return false;
        }
        let consumed: u32 = self.quotas.values().sum();
        // Only a worker without inputs can be out of arms here.
        if self.busy_arms.saturating_sub(consumed) >= self.arms {
            return false;
        }

        for (part, &quota) in &self.quotas {
            let held = self.held.entry(*part).or_insert(0);
            *held = held.saturating_sub(quota);
            self.needed_count += quota.saturating_sub(*held);
            self.busy_arms = self.busy_arms.saturating_sub(quota);
        }
        self.busy = false;
        *self.held.entry(self.product).or_insert(0) += 1;
        self.busy_arms += 1;
        trace!(product = %self.product, needed = self.needed_count, "assembly finished");
        true
    }

    /// Put one finished product on `position` if the slot is free.
    pub fn try_release<P: PositionControl + ?Sized>(&mut self, position: &mut P) -> bool {
        if self.products_held() == 0 || !position.is_available() {
            return false;
        }
        if !matches!(position.is_empty(), Ok(true)) {
            return false;
        }

        if let Err(err) = position.place(Item::new(self.product)) {
            warn!(%err, "slot refused a release that passed every check");
            return false;
        }
        if let Some(count) = self.held.get_mut(&self.product) {
            *count -= 1;
        }
        self.busy_arms -= 1;
        trace!(product = %self.product, "released");
        true
    }

    fn can_pick<P: PositionControl + ?Sized>(&self, position: &P) -> bool {
        position.is_available() && !self.busy && self.busy_arms < self.arms
    }

    fn can_use(&self, part: PartId) -> bool {
        let Some(&quota) = self.quotas.get(&part) else {
            return false;
        };
        if self.held(part) < quota {
            return true;
        }
        // Surplus: keep enough arms free for everything still missing.
        self.free_arms() > self.needed_count
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn arms(&self) -> u32 {
        self.arms
    }

    pub fn quotas(&self) -> &BTreeMap<PartId, u32> {
        &self.quotas
    }

    /// Quota for `part`, zero if the part is not an input.
    pub fn quota(&self, part: PartId) -> u32 {
        self.quotas.get(&part).copied().unwrap_or(0)
    }

    pub fn product(&self) -> PartId {
        self.product
    }

    pub fn assembly_duration(&self) -> u32 {
        self.assembly_duration
    }

    /// Units of `part` currently in hand.
    pub fn held(&self, part: PartId) -> u32 {
        self.held.get(&part).copied().unwrap_or(0)
    }

    /// Finished products waiting to be released.
    pub fn products_held(&self) -> u32 {
        self.held(self.product)
    }

    pub fn busy_arms(&self) -> u32 {
        self.busy_arms
    }

    pub fn free_arms(&self) -> u32 {
        self.arms - self.busy_arms
    }

    pub fn needed_count(&self) -> u32 {
        self.needed_count
    }

    pub fn assembly_countdown(&self) -> u32 {
        self.assembly_countdown
    }

    /// Whether an assembly is in progress.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether the internal counters are mutually consistent.
    ///
    /// `needed_count` must match what the quotas still miss, and is zero for
    /// the whole of an assembly.
    pub(crate) fn is_well_formed(&self) -> bool {
        let in_hand: u64 = self.held.values().map(|&n| u64::from(n)).sum();
        let required: u64 = self.quotas.values().map(|&q| u64::from(q)).sum();
        let missing: u64 = self
            .quotas
            .iter()
            .map(|(part, &quota)| u64::from(quota.saturating_sub(self.held(*part))))
            .sum();
        self.arms > 0
            && required <= u64::from(self.arms)
            && self.busy_arms <= self.arms
            && in_hand == u64::from(self.busy_arms)
            && u64::from(self.needed_count) == missing
            && (!self.busy || missing == 0)
            && self.assembly_countdown <= self.assembly_duration
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHash) {
        for (part, count) in &self.held {
            hasher.write_u32(part.0);
            hasher.write_u32(*count);
        }
        hasher.write_u32(self.busy_arms);
        hasher.write_u32(self.needed_count);
        hasher.write_u32(self.assembly_countdown);
        hasher.write_bool(self.busy);
    }
}

impl fmt::Display for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {}, products: {}, held: {{ ", self.product, self.products_held())?;
        for (part, quota) in &self.quotas {
            write!(f, "{part}: {}/{quota} ", self.held(*part))?;
        }
        write!(
            f,
            "}}, arms: {}/{}, needed: {}, countdown: {}/{}, busy: {} ]",
            self.busy_arms,
            self.arms,
            self.needed_count,
            self.assembly_countdown,
            self.assembly_duration,
            self.busy
        )
    }
}

// ---------------------------------------------------------------------------
// Worker bound to a position
// ---------------------------------------------------------------------------

/// A worker paired with its position, driven through [`SimulationComponent`].
///
/// Running it for several timeslots does not rotate the belt, so the slot's
/// reservation from the first timeslot persists.
pub struct WorkerAt<'a, P: PositionControl + ?Sized> {
    worker: &'a mut Worker,
    position: &'a mut P,
}

impl<'a, P: PositionControl + ?Sized> WorkerAt<'a, P> {
    pub fn new(worker: &'a mut Worker, position: &'a mut P) -> Self {
        Self { worker, position }
    }

    /// Run one timeslot and report what happened.
    pub fn step(&mut self) -> StepOutcome {
        self.worker.step(self.position)
    }
}

impl<P: PositionControl + ?Sized> SimulationComponent for WorkerAt<'_, P> {
    fn run(&mut self, timeslots: usize) {
        for _ in 0..timeslots {
            self.step();
        }
    }
}
