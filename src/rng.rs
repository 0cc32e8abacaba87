//! Random sources for impairment decisions, based on PCG32.
//!
//! The simulator never reaches for a global random generator. Every loss, duplicate
//! and jitter decision is drawn from an [`Rng`] owned by the simulator, so tests can
//! seed it ([`Pcg32::seed_from_u64`]) or script it outright ([`ScriptedRng`]).
//!
//! # PCG32 Algorithm
//!
//! PCG (Permuted Congruential Generator) is a family of simple fast space-efficient
//! statistically good algorithms for random number generation. PCG32 specifically:
//! - Has 64 bits of state, producing 32-bit output
//! - Period of 2^64
//! - Passes TestU01 statistical tests
//!
//! Reference: <https://www.pcg-random.org/>
//!
//! # Usage
//!
//! ```rust
//! use fortress_netsim::rng::{Pcg32, Rng, ScriptedRng, SeedableRng};
//!
//! // Seeded RNG for deterministic behavior
//! let mut rng = Pcg32::seed_from_u64(12345);
//! let roll = rng.gen_range_f64(0.0, 100.0);
//! assert!((0.0..100.0).contains(&roll));
//!
//! // Scripted RNG for exact outcomes
//! let mut scripted = ScriptedRng::new(vec![0.25, 0.75]);
//! assert_eq!(scripted.gen_range_f64(0.0, 100.0), 25.0);
//! assert_eq!(scripted.gen_range_f64(0.0, 100.0), 75.0);
//! ```

/// PCG32 random number generator.
///
/// A minimal implementation of the PCG-XSH-RR variant with 64-bit state.
/// Suitable for simulation and testing, but NOT cryptographically secure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcg32 {
    state: u64,
    inc: u64,
}

/// Default increment for single-stream PCG32.
/// This is a standard value from the PCG paper.
const PCG_DEFAULT_INCREMENT: u64 = 1442695040888963407;

/// Multiplier constant for the LCG step.
const PCG_MULTIPLIER: u64 = 6364136223846793005;

impl Pcg32 {
    /// Creates a new PCG32 generator with the given state and stream.
    ///
    /// The stream selects one of 2^63 independent sequences.
    #[must_use]
    pub const fn new(state: u64, stream: u64) -> Self {
        // The increment must be odd
        let inc = (stream << 1) | 1;
        let mut pcg = Self { state: 0, inc };
        pcg.state = pcg.state.wrapping_mul(PCG_MULTIPLIER).wrapping_add(pcg.inc);
        pcg.state = pcg.state.wrapping_add(state);
        pcg.state = pcg.state.wrapping_mul(PCG_MULTIPLIER).wrapping_add(pcg.inc);
        pcg
    }

    /// Generates the next 32-bit random value.
    #[inline]
    #[must_use]
    pub fn next_u32(&mut self) -> u32 {
        let old_state = self.state;
        self.state = old_state
            .wrapping_mul(PCG_MULTIPLIER)
            .wrapping_add(self.inc);
        // XSH-RR output permutation
        let xorshifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Generates the next 64-bit random value by combining two 32-bit values.
    #[inline]
    #[must_use]
    pub fn next_u64(&mut self) -> u64 {
        let high = u64::from(self.next_u32());
        let low = u64::from(self.next_u32());
        (high << 32) | low
    }
}

/// Trait for seeding random number generators.
pub trait SeedableRng: Sized {
    /// Creates a new RNG seeded from a 64-bit value.
    ///
    /// Different seeds produce different (statistically independent) sequences.
    #[must_use]
    fn seed_from_u64(seed: u64) -> Self;

    /// Creates a new RNG with a non-deterministic seed.
    #[must_use]
    fn from_entropy() -> Self;
}

impl SeedableRng for Pcg32 {
    fn seed_from_u64(seed: u64) -> Self {
        Self::new(seed, PCG_DEFAULT_INCREMENT)
    }

    fn from_entropy() -> Self {
        Self::seed_from_u64(entropy_seed())
    }
}

/// Trait for random number generation.
///
/// Only the 64-bit primitive is required; the floating point helpers the simulator
/// uses are derived from it, and may be overridden by sources that want to dictate
/// exact values (see [`ScriptedRng`]).
pub trait Rng {
    /// Returns the next 64-bit random value.
    fn next_u64(&mut self) -> u64;

    /// Returns a uniform `f64` in `[0.0, 1.0)`.
    fn gen_f64(&mut self) -> f64 {
        // Use the upper 53 bits (f64 has 53 bits of mantissa precision)
        let val = self.next_u64() >> 11;
        val as f64 / (1u64 << 53) as f64
    }

    /// Returns a uniform `f64` in `[low, high)`.
    ///
    /// The result is always strictly below `high`, even where `low + x * (high - low)`
    /// would round up to it.
    ///
    /// # Empty Range Behavior
    /// An empty (`high <= low`) or non-finite range returns `low` without drawing.
    /// Callers that can receive such ranges from user input should check and report
    /// them first.
    fn gen_range_f64(&mut self, low: f64, high: f64) -> f64 {
        if !(low.is_finite() && high.is_finite()) || high <= low {
            return low;
        }
        let value = low + self.gen_f64() * (high - low);
        if value < high {
            value
        } else {
            high.next_down()
        }
    }
}

impl Rng for Pcg32 {
    #[inline]
    fn next_u64(&mut self) -> u64 {
        Self::next_u64(self)
    }
}

impl<R: Rng + ?Sized> Rng for &mut R {
    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }

    fn gen_f64(&mut self) -> f64 {
        (**self).gen_f64()
    }
}

/// A random source that replays a fixed list of unit-interval samples.
///
/// Each call to [`Rng::gen_f64`] returns the next sample, wrapping around at the
/// end of the list. Samples are clamped into `[0.0, 1.0)`. The integer primitive
/// is derived from the same samples, so every draw consumes exactly one sample.
///
/// This lets a test dictate the outcome of each simulator decision: a sample of
/// `0.995` maps to a 99.5% roll (kept at any loss rate below that), `0.0` maps to
/// a 0% roll, and a jitter draw of `0.5` lands exactly on the base latency.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedRng {
    samples: Vec<f64>,
    position: usize,
}

/// Largest `f64` strictly below 1.0.
const MAX_UNIT_SAMPLE: f64 = 1.0 - f64::EPSILON / 2.0;

impl ScriptedRng {
    /// Creates a scripted source. An empty list behaves like `[0.0]`.
    #[must_use]
    pub fn new(samples: Vec<f64>) -> Self {
        let samples = if samples.is_empty() {
            vec![0.0]
        } else {
            samples
                .into_iter()
                .map(|s| if s.is_nan() { 0.0 } else { s.clamp(0.0, MAX_UNIT_SAMPLE) })
                .collect()
        };
        Self {
            samples,
            position: 0,
        }
    }

    /// Creates a scripted source that always returns `sample`.
    #[must_use]
    pub fn constant(sample: f64) -> Self {
        Self::new(vec![sample])
    }

    /// Number of samples consumed so far.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.position
    }

    fn next_sample(&mut self) -> f64 {
        let sample = self.samples[self.position % self.samples.len()];
        self.position += 1;
        sample
    }
}

impl Rng for ScriptedRng {
    fn next_u64(&mut self) -> u64 {
        (self.next_sample() * u64::MAX as f64) as u64
    }

    fn gen_f64(&mut self) -> f64 {
        self.next_sample()
    }
}

/// Derives a non-deterministic seed.
///
/// Mixes wall-clock time (via `web_time`, so this also works on wasm) with a
/// randomly keyed std hasher and the current thread id. Not cryptographically
/// secure. For reproducible runs use [`Pcg32::seed_from_u64`].
fn entropy_seed() -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hash, Hasher};
    use web_time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());

    let mut hasher = RandomState::new().build_hasher();
    nanos.hash(&mut hasher);
    std::thread::current().id().hash(&mut hasher);
    hasher.finish().wrapping_add(0x9e3779b97f4a7c15)
}
