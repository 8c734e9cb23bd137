//! Deterministic Random Number Generator
//!
//! Xorshift64* behind a purely functional interface: every draw returns the
//! value together with the successor state, and the state is carried inside
//! the game state rather than in any global. Given the same seed string, the
//! generator produces the identical sequence on all platforms.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Fallback state used when a seed hashes to zero (xorshift cannot leave 0).
const ZERO_SEED_FALLBACK: u64 = 88_172_645_463_325_252;

/// Finalizing multiplier for the xorshift64* output scramble.
const OUTPUT_MULTIPLIER: u64 = 2_685_821_657_736_338_717;

/// State of the deterministic generator.
///
/// The state is a single 64-bit word. Because snapshots are JSON and JSON
/// numbers are only exact up to 2^53, the state serializes as the canonical
/// `"<digits>n"` big-integer marker string and is parsed back losslessly.
///
/// # Determinism Guarantee
///
/// `next_u64`/`next_int` are pure: the same `RngState` always yields the
/// same `(state, value)` pair. Consumers must thread the returned state
/// back into wherever they store it; nothing here mutates shared state.
///
/// # Example
///
/// ```
/// use hexhold::core::rng::{seed_from, next_int};
///
/// let rng = seed_from("rep-seed");
/// let (rng, a) = next_int(rng, 100);
/// let (_rng, b) = next_int(rng, 100);
/// assert_eq!((a, b), (85, 35)); // Always the same!
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RngState(u64);

impl RngState {
    /// Wrap a raw 64-bit state (zero is mapped to the nonzero fallback).
    pub const fn from_raw(raw: u64) -> Self {
        if raw == 0 {
            Self(ZERO_SEED_FALLBACK)
        } else {
            Self(raw)
        }
    }

    /// Raw state word (for checkpointing/diagnostics).
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl Serialize for RngState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}n", self.0))
    }
}

impl<'de> Deserialize<'de> for RngState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RngStateVisitor;

        impl Visitor<'_> for RngStateVisitor {
            type Value = RngState;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a big-integer marker string like \"12345n\"")
            }

            fn visit_str<E: de::Error>(self, s: &str) -> Result<RngState, E> {
                let digits = s
                    .strip_suffix('n')
                    .ok_or_else(|| E::custom("missing trailing 'n' marker"))?;
                let raw: u64 = digits
                    .parse()
                    .map_err(|_| E::custom("invalid big-integer digits"))?;
                Ok(RngState::from_raw(raw))
            }
        }

        deserializer.deserialize_str(RngStateVisitor)
    }
}

/// Seed a generator from an arbitrary string.
///
/// Uses the classic 31-polynomial byte hash over the UTF-8 encoding with
/// wrapping 64-bit arithmetic, so any human-readable seed (scenario names,
/// replay ids) maps to a full-width state.
pub fn seed_from(input: &str) -> RngState {
    let mut n: u64 = 0;
    for byte in input.bytes() {
        n = n.wrapping_mul(31).wrapping_add(u64::from(byte));
    }
    RngState::from_raw(n)
}

/// Seed a generator directly from an integer.
pub fn seed_from_u64(input: u64) -> RngState {
    RngState::from_raw(input)
}

/// Advance the generator and return 64 random bits.
#[inline]
pub fn next_u64(state: RngState) -> (RngState, u64) {
    let mut x = state.0;
    x ^= x >> 12;
    x ^= x << 25;
    x ^= x >> 27;
    (RngState(x), x.wrapping_mul(OUTPUT_MULTIPLIER))
}

/// Advance the generator and return an integer in `[0, bound)`.
///
/// `bound == 0` returns 0 without consuming a draw. The value is derived by
/// a widening multiply on the low 32 output bits, so no floating point is
/// involved anywhere in the reduction.
#[inline]
pub fn next_int(state: RngState, bound: u32) -> (RngState, u32) {
    if bound == 0 {
        return (state, 0);
    }
    let (state, value) = next_u64(state);
    let low = value as u32;
    (state, ((u64::from(low) * u64::from(bound)) >> 32) as u32)
}

/// Advance the generator and return a unit-interval sample in `[0, 1)`.
///
/// The sample is `low32 / 2^32`, which is exact in an f64, so thresholding
/// against fixed constants (world generation biome rules) is bit-stable
/// across platforms. Gameplay decisions never consume this form directly.
#[inline]
pub fn next_unit(state: RngState) -> (RngState, f64) {
    let (state, value) = next_u64(state);
    let low = value as u32;
    (state, f64::from(low) / 4_294_967_296.0)
}

// =============================================================================
// TESTS
// =============================================================================
