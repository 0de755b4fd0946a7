//! The conveyor belt: a fixed ring of slots with per-timeslot reservations.
//!
//! Slot 0 is the head, where new items are enqueued; slot `capacity - 1` is
//! the tail, where items fall off. Each rotation shifts every item one slot
//! toward the tail.
//!
//! A slot accepts at most one state-changing operation (collect or place) per
//! timeslot. The first successful operation marks the slot *reserved*; the
//! reservation is only cleared by [`Belt::advance`]. This is how two workers
//! sharing one slot are serialized within a timeslot.
//!
//! Storage is a ring (`Vec` plus head offset), so insert, remove, peek and
//! rotate are all O(1) and the belt never reallocates after construction.

use crate::item::Item;
use crate::sim::SimulationComponent;
use std::fmt;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by belt operations.
///
/// These signal configuration mistakes or illegal sequencing, never transient
/// conditions: callers should not retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BeltError {
    #[error("invalid configuration: conveyor belt capacity must be at least 1")]
    ZeroCapacity,
    #[error("slot {pos} is out of range for a belt of capacity {capacity}")]
    OutOfRange { pos: usize, capacity: usize },
    #[error("slot {pos} is empty")]
    EmptySlot { pos: usize },
    #[error("slot {pos} is occupied by another item")]
    OccupiedSlot { pos: usize },
    #[error("slot {pos} is reserved for this timeslot")]
    ReservedSlot { pos: usize },
}

// ---------------------------------------------------------------------------
// Belt capability
// ---------------------------------------------------------------------------

/// Operations a belt offers to the rest of the simulation.
///
/// Worker logic never sees this trait directly; it goes through a
/// [`PositionView`](crate::position::PositionView), which fixes the slot.
pub trait ConveyorBelt {
    /// Put an item on the head slot.
    ///
    /// Requires slot 0 to be empty and unreserved, and does *not* reserve it:
    /// injection is not a worker action and must not block the workers.
    fn enqueue(&mut self, item: Item) -> Result<(), BeltError>;

    /// Remove and return the item at `pos`, reserving the slot.
    fn collect(&mut self, pos: usize) -> Result<Item, BeltError>;

    /// Put `item` on the empty slot `pos`, reserving the slot.
    fn place(&mut self, item: Item, pos: usize) -> Result<(), BeltError>;

    fn is_empty(&self, pos: usize) -> Result<bool, BeltError>;

    fn is_reserved(&self, pos: usize) -> Result<bool, BeltError>;

    /// Borrow the item at `pos`, if any.
    fn peek(&self, pos: usize) -> Result<Option<&Item>, BeltError>;

    /// Number of slots on the belt.
    fn capacity(&self) -> usize;
}

// ---------------------------------------------------------------------------
// Ring-buffer belt
// ---------------------------------------------------------------------------

/// The concrete belt.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Belt {
    /// Physical storage; logical slot `p` lives at `(head + p) % len`.
    slots: Vec<Option<Item>>,
    /// Physical index of logical slot 0.
    head: usize,
    /// Reservation flags, indexed by logical slot.
    reserved: Vec<bool>,
}

impl Belt {
    /// Create an empty belt with `capacity` slots.
    pub fn new(capacity: usize) -> Result<Self, BeltError> {
        if capacity == 0 {
            return Err(BeltError::ZeroCapacity);
        }
        Ok(Self {
            slots: vec![None; capacity],
            head: 0,
            reserved: vec![false; capacity],
        })
    }

    /// Rotate `num_slots` steps toward the tail, then clear every reservation.
    ///
    /// Items on the tail slot are destroyed. Reservations are cleared once,
    /// after all steps, never between them. `advance(0)` only clears the
    /// reservations.
    pub fn advance(&mut self, num_slots: usize) {
        for _ in 0..num_slots {
            self.rotate();
        }
        self.reserved.fill(false);
    }

    /// The item about to fall off the belt on the next rotation.
    pub fn tail(&self) -> Option<&Item> {
        self.slots[self.physical(self.capacity() - 1)].as_ref()
    }

    /// Number of slots currently holding an item.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Iterate `(item, reserved)` pairs from head to tail.
    pub fn slots(&self) -> impl Iterator<Item = (Option<&Item>, bool)> + '_ {
        (0..self.capacity()).map(move |pos| (self.slots[self.physical(pos)].as_ref(), self.reserved[pos]))
    }

    /// Whether the internal layout is well formed. Only a belt decoded from
    /// untrusted bytes can fail this.
    pub(crate) fn is_well_formed(&self) -> bool {
        !self.slots.is_empty() && self.slots.len() == self.reserved.len() && self.head < self.slots.len()
    }

    fn rotate(&mut self) {
        let len = self.slots.len();
        let tail = (self.head + len - 1) % len;
        // The old tail becomes the new (empty) head.
        self.slots[tail] = None;
        self.head = tail;
    }

    fn physical(&self, pos: usize) -> usize {
        (self.head + pos) % self.slots.len()
    }

    fn check(&self, pos: usize) -> Result<usize, BeltError> {
        if pos < self.capacity() {
            Ok(self.physical(pos))
        } else {
            Err(BeltError::OutOfRange { pos, capacity: self.capacity() })
        }
    }
}

impl ConveyorBelt for Belt {
    fn enqueue(&mut self, item: Item) -> Result<(), BeltError> {
        let idx = self.physical(0);
        if self.slots[idx].is_some() {
            return Err(BeltError::OccupiedSlot { pos: 0 });
        }
        if self.reserved[0] {
            return Err(BeltError::ReservedSlot { pos: 0 });
        }
        self.slots[idx] = Some(item);
        Ok(())
    }

    fn collect(&mut self, pos: usize) -> Result<Item, BeltError> {
        let idx = self.check(pos)?;
        if self.slots[idx].is_none() {
            return Err(BeltError::EmptySlot { pos });
        }
        if self.reserved[pos] {
            return Err(BeltError::ReservedSlot { pos });
        }
        let item = self.slots[idx].take().ok_or(BeltError::EmptySlot { pos })?;
        self.reserved[pos] = true;
        Ok(item)
    }

    fn place(&mut self, item: Item, pos: usize) -> Result<(), BeltError> {
        let idx = self.check(pos)?;
        if self.reserved[pos] {
            return Err(BeltError::ReservedSlot { pos });
        }
        if self.slots[idx].is_some() {
            return Err(BeltError::OccupiedSlot { pos });
        }
        self.slots[idx] = Some(item);
        self.reserved[pos] = true;
        Ok(())
    }

    fn is_empty(&self, pos: usize) -> Result<bool, BeltError> {
        let idx = self.check(pos)?;
        Ok(self.slots[idx].is_none())
    }

    fn is_reserved(&self, pos: usize) -> Result<bool, BeltError> {
        self.check(pos)?;
        Ok(self.reserved[pos])
    }

    fn peek(&self, pos: usize) -> Result<Option<&Item>, BeltError> {
        let idx = self.check(pos)?;
        Ok(self.slots[idx].as_ref())
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl SimulationComponent for Belt {
    fn run(&mut self, timeslots: usize) {
        self.advance(timeslots);
    }
}

impl fmt::Display for Belt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ ")?;
        for (pos, (item, reserved)) in self.slots().enumerate() {
            if pos > 0 {
                write!(f, ", ")?;
            }
            match item {
                Some(item) => write!(f, "{{ {pos}: {item}, reserved: {reserved} }}")?,
                None => write!(f, "{{ {pos}: empty, reserved: {reserved} }}")?,
            }
        }
        write!(f, " ]")
    }
}
