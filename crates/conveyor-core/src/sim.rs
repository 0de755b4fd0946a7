//! Shared timeslot contract and state hashing.
//!
//! Every component that moves through discrete time (the belt, a worker bound
//! to its position, the whole production line) implements
//! [`SimulationComponent`], so tests and composition drive them through
//! identical semantics.

// ---------------------------------------------------------------------------
// Timeslot contract
// ---------------------------------------------------------------------------

/// A component advanced in lockstep, one timeslot at a time.
pub trait SimulationComponent {
    /// Advance the component by `timeslots` timeslots.
    fn run(&mut self, timeslots: usize);
}

impl<C: SimulationComponent + ?Sized> SimulationComponent for &mut C {
    fn run(&mut self, timeslots: usize) {
        (**self).run(timeslots);
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of simulation state for replay comparison.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    /// Start a new hash.
    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    /// Feed a u64 into the hash.
    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// Feed a u32 into the hash.
    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write(&[v as u8]);
    }

    /// Finalize and return the hash value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(usize);

    impl SimulationComponent for Counter {
        fn run(&mut self, timeslots: usize) {
            self.0 += timeslots;
        }
    }

    #[test]
    fn components_run_through_mutable_references() {
        let mut counter = Counter(0);
        {
            let mut by_ref = &mut counter;
            by_ref.run(3);
        }
        counter.run(2);
        assert_eq!(counter.0, 5);
    }

    #[test]
    fn state_hash_deterministic() {
        let mut h1 = StateHash::new();
        h1.write_u64(42);
        h1.write_u32(7);

        let mut h2 = StateHash::new();
        h2.write_u64(42);
        h2.write_u32(7);

        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn state_hash_order_matters() {
        let mut h1 = StateHash::new();
        h1.write_u32(1);
        h1.write_bool(true);

        let mut h2 = StateHash::new();
        h2.write_bool(true);
        h2.write_u32(1);

        assert_ne!(h1.finish(), h2.finish());
    }
}
