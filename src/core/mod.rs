//! Core deterministic primitives.
//!
//! Everything the simulation relies on for bit-identical reproduction:
//! the seeded functional RNG and the canonical-form state hasher.

pub mod hash;
pub mod rng;

// Re-export core types
pub use hash::{hash_state, hash_value};
pub use rng::{next_int, next_u64, next_unit, seed_from, seed_from_u64, RngState};
