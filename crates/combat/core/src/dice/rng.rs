//! Deterministic random number generation.
//!
//! Every roll in combat is drawn from a [`RollStream`]: a seed plus a
//! monotonically increasing roll index. The value of roll `n` depends only on
//! `(seed, n)`, so a restored snapshot continues the exact same sequence.

use std::collections::VecDeque;

/// RNG oracle for deterministic random number generation.
///
/// Implementations must be deterministic and produce the same values
/// given the same seed.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Roll a die with N sides (1-N inclusive).
    fn roll_die(&self, seed: u64, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        (self.next_u32(seed) % sides) + 1
    }
}

/// PCG random number generator (PCG-XSH-RR, 64-bit state, 32-bit output).
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::pcg_output(Self::pcg_step(seed))
    }
}

/// Mix the combat seed with a roll index into a per-roll seed.
///
/// SplitMix64-style finalizer so adjacent indices produce unrelated seeds.
pub fn compute_seed(combat_seed: u64, roll_index: u64) -> u64 {
    let mut hash = combat_seed ^ roll_index.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xc4ceb9fe1a85ec53);
    hash ^= hash >> 33;
    hash
}

/// Explicit seeded RNG handle threaded through every roll.
///
/// Forced values are a test facility: while the queue is non-empty each roll
/// pops the next value (clamped into the die's range) instead of drawing.
/// They are never persisted.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollStream {
    seed: u64,
    index: u64,
    #[cfg_attr(feature = "serde", serde(skip))]
    forced: VecDeque<u32>,
}

impl RollStream {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            index: 0,
            forced: VecDeque::new(),
        }
    }

    /// Resume a stream at a known roll index.
    pub fn resume(seed: u64, index: u64) -> Self {
        Self {
            seed,
            index,
            forced: VecDeque::new(),
        }
    }

    /// Queue values to be returned by the next rolls, in order.
    pub fn with_forced(mut self, values: impl IntoIterator<Item = u32>) -> Self {
        self.forced.extend(values);
        self
    }

    pub fn force(&mut self, values: impl IntoIterator<Item = u32>) {
        self.forced.extend(values);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of rolls drawn so far.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn forced_remaining(&self) -> usize {
        self.forced.len()
    }

    /// Roll one die with `sides` faces.
    pub fn roll_die(&mut self, sides: u32) -> u32 {
        let index = self.index;
        self.index += 1;
        if let Some(value) = self.forced.pop_front() {
            return value.clamp(1, sides.max(1));
        }
        PcgRng.roll_die(compute_seed(self.seed, index), sides)
    }

    pub fn roll_d20(&mut self) -> u32 {
        self.roll_die(20)
    }
}

impl PartialEq for RollStream {
    fn eq(&self, other: &Self) -> bool {
        self.seed == other.seed && self.index == other.index
    }
}

impl Eq for RollStream {}
