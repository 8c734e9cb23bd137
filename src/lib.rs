//! # Hexhold Simulation Core
//!
//! Deterministic simulation core for Hexhold, a turn-based hex-grid
//! strategy game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     HEXHOLD CORE                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Seeded functional xorshift64* PRNG        │
//! │  └── hash.rs     - Canonical form + SHA-256 state hashing    │
//! │                                                              │
//! │  game/           - Simulation (deterministic)                │
//! │  ├── hex.rs      - Axial coordinates on a cylinder           │
//! │  ├── worldgen.rs - Seeded map generation                     │
//! │  ├── state.rs    - Snapshot state model                      │
//! │  ├── content.rs  - Typed catalogs + DAG validation           │
//! │  ├── pathfind.rs - Movement range / shortest paths           │
//! │  ├── rules.rs    - Terrain, yields, production, research     │
//! │  ├── combat.rs   - RNG-threaded combat resolution            │
//! │  ├── action.rs   - Closed action union                       │
//! │  ├── reducer/    - The (state, action) -> state machine      │
//! │  ├── ai.rs       - Deterministic AI turn evaluator           │
//! │  ├── replay.rs   - Replay & hash-divergence harness          │
//! │  └── save.rs     - Snapshot serialization contract           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The whole crate is **100% deterministic**:
//! - No wall-clock or machine entropy anywhere
//! - No `HashMap` in simulation state (`BTreeMap` for sorted iteration)
//! - All randomness flows through the seeded RNG carried in `GameState`
//! - No floating point in gameplay decisions (movement costs are integer
//!   half-points, combat is integer arithmetic)
//!
//! Given the same initial state and ordered action log, the reducer
//! produces **bit-identical snapshots** on any platform; the replay
//! harness in [`game::replay`] is the acceptance gate for that property.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use crate::core::hash::hash_state;
pub use crate::core::rng::{next_int, next_u64, seed_from, RngState};
pub use crate::game::action::Action;
pub use crate::game::pathfind::{compute_path, movement_range};
pub use crate::game::reducer::apply_action;
pub use crate::game::replay::{run_replay, verify_replay, Replay};
pub use crate::game::state::{GameState, SCHEMA_VERSION};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
