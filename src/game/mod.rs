//! Game Simulation Module
//!
//! All game rules. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `hex`: axial coordinate math
//! - `worldgen`: seeded map generation
//! - `state`: the full state model
//! - `content`: typed catalogs and DAG validation
//! - `pathfind`: movement range and shortest paths
//! - `rules`: terrain costs, yields, production, research
//! - `combat`: explicit RNG-threaded combat resolution
//! - `action`: the closed action union
//! - `reducer`: the `(state, action) -> state` machine
//! - `ai`: deterministic turn evaluator for non-human seats
//! - `replay`: replay and hash-divergence harness
//! - `save`: snapshot contract

pub mod action;
pub mod ai;
pub mod combat;
pub mod content;
pub mod hex;
pub mod pathfind;
pub mod reducer;
pub mod replay;
pub mod rules;
pub mod save;
pub mod state;
pub mod worldgen;

// Re-export key types
pub use action::Action;
pub use pathfind::{compute_path, movement_range, MovementRange, PathResult};
pub use reducer::apply_action;
pub use replay::{run_replay, verify_replay, Replay, ReplayRun};
pub use state::{ContentExt, GameState, Tile, Unit, UnitFlags};
