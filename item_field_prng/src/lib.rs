// Random sources for the item field sampler.
//
// Defines `RandomSource`, the contract the Gibbs sampler draws from: a raw
// unsigned integer in the closed range `[0, max_raw()]`. Everything the
// sampler needs (uniform cell indices, uniform floats for categorical draws)
// is derived from this one stream, so a single seed reproduces a whole run.
//
// `FieldRng` is the workspace's concrete source: xoshiro256++ (Blackman &
// Vigna, 2019) seeded through SplitMix64. It is hand-rolled so its output is
// identical on every platform and compiler.
//
// **Critical constraint: determinism.** `FieldRng` uses integer arithmetic
// only. No OS entropy, no global generator, no floating point in the core
// state transition.

use serde::{Deserialize, Serialize};

/// A source of raw unsigned integers in `[0, max_raw()]`.
///
/// The sampler derives uniform integers as `next_raw() % bound` and uniform
/// floats as `next_raw() / max_raw()`. Implementations must report a stable
/// `max_raw()`; a maximum of zero is rejected by the sampler.
pub trait RandomSource {
    /// Produce the next raw value.
    fn next_raw(&mut self) -> u64;

    /// The largest value `next_raw` can return.
    fn max_raw(&self) -> u64;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_raw(&mut self) -> u64 {
        (**self).next_raw()
    }

    fn max_raw(&self) -> u64 {
        (**self).max_raw()
    }
}

/// Xoshiro256++ generator with a 256-bit state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRng {
    state: [u64; 4],
}

impl FieldRng {
    /// Seed a generator from a single `u64`, expanded with SplitMix64.
    pub fn new(seed: u64) -> Self {
        let mut mix = SplitMix64(seed);
        Self {
            state: [mix.next_u64(), mix.next_u64(), mix.next_u64(), mix.next_u64()],
        }
    }

    /// Advance the state and return the next 64-bit output.
    pub fn next_u64(&mut self) -> u64 {
        let [s0, s1, s2, s3] = self.state;
        let out = s0.wrapping_add(s3).rotate_left(23).wrapping_add(s0);

        let t = s1 << 17;
        let s2 = s2 ^ s0;
        let s3 = s3 ^ s1;
        let s1 = s1 ^ s2;
        let s0 = s0 ^ s3;

        self.state = [s0, s1, s2 ^ t, s3.rotate_left(45)];
        out
    }

    /// Uniform `f64` in `[0, 1)` built from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Derive an independent generator, e.g. one per region or per test.
    pub fn fork(&mut self) -> Self {
        Self::new(self.next_u64())
    }
}

impl RandomSource for FieldRng {
    fn next_raw(&mut self) -> u64 {
        self.next_u64()
    }

    fn max_raw(&self) -> u64 {
        u64::MAX
    }
}

/// SplitMix64, used only to expand a seed into xoshiro state.
struct SplitMix64(u64);

impl SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }
}
