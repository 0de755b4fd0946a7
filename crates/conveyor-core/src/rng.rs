//! Deterministic PRNG for simulation use (item draws, worker priority).
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, good statistical
//! properties, and trivially serializable for snapshots. Randomness is always
//! an owned value injected at construction; nothing in the crate reaches for
//! a process-wide generator.

/// A source of uniformly distributed 64-bit words.
///
/// The production line draws its per-position priority bits through this
/// seam so tests can substitute a scripted sequence.
pub trait RandomSource {
    /// Generate the next `u64` in the sequence.
    fn next_u64(&mut self) -> u64;

    /// Uniform value in `0..bound`. Returns 0 when `bound` is 0.
    fn next_below(&mut self, bound: u64) -> u64 {
        // Multiply-shift reduction: unbiased enough for simulation draws and
        // avoids the low-bit weakness of `%`.
        ((self.next_u64() as u128 * bound as u128) >> 64) as u64
    }

    /// A single fair coin flip.
    fn next_bool(&mut self) -> bool {
        self.next_u64() >> 63 == 1
    }
}

/// SplitMix64 pseudo-random number generator.
///
/// Deterministic across platforms: the same seed always yields the same run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Get the internal state (for hashing/serialization).
    pub fn state(&self) -> u64 {
        self.state
    }
}

impl RandomSource for SimRng {
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }
}
