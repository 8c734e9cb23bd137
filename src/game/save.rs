//! Snapshot Serialization
//!
//! The persisted snapshot contract: plain JSON with camelCase keys, the RNG
//! state as the `"<digits>n"` big-integer marker, and a structural
//! validation pass enforcing the data-model invariants on load. Version
//! mismatches and invariant violations are typed errors fatal to the load,
//! never to a running game.

use thiserror::Error;

use crate::game::content;
use crate::game::state::{GameState, SCHEMA_VERSION};

/// Save/load failures.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The snapshot was written by a different schema version.
    #[error("expected schemaVersion {expected} but received {found}")]
    VersionMismatch {
        /// Supported version.
        expected: u32,
        /// Version found in the snapshot.
        found: u32,
    },
    /// The snapshot is not valid JSON for the state model.
    #[error("snapshot parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// The snapshot parsed but violates a structural invariant.
    #[error("snapshot validation failed: {0}")]
    Validation(String),
}

/// Serialize a state into its snapshot form.
pub fn serialize_state(state: &GameState) -> Result<String, SaveError> {
    Ok(serde_json::to_string(state)?)
}

/// Parse and validate a snapshot.
pub fn deserialize_state(json: &str) -> Result<GameState, SaveError> {
    let state: GameState = serde_json::from_str(json)?;
    if state.schema_version != SCHEMA_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found: state.schema_version,
        });
    }
    validate_state(&state)?;
    Ok(state)
}

/// Enforce the structural invariants of the data model.
///
/// - tech/civic prerequisite graphs are DAGs;
/// - tile ids are unique and map 1:1 to their in-bounds coordinates;
/// - unit and city locations resolve to existing extension tiles;
/// - research progress never exceeds the target's cost;
/// - production turn counts are nonzero.
pub fn validate_state(state: &GameState) -> Result<(), SaveError> {
    let fail = |msg: String| Err(SaveError::Validation(msg));

    content::validate_dag(state.tech_catalog.iter())
        .map_err(|e| SaveError::Validation(e.to_string()))?;
    if let Some(ext) = state.content_ext.as_ref() {
        content::validate_dag(ext.techs.values())
            .map_err(|e| SaveError::Validation(e.to_string()))?;
        content::validate_dag(ext.civics.values())
            .map_err(|e| SaveError::Validation(e.to_string()))?;
    }

    if state.in_game() {
        let expected = (state.map.width as usize) * (state.map.height as usize);
        if state.map.tiles.len() != expected {
            return fail(format!(
                "map has {} tiles, dimensions say {expected}",
                state.map.tiles.len()
            ));
        }
    }
    let mut seen = std::collections::BTreeSet::new();
    for tile in &state.map.tiles {
        if tile.id != tile.coord.tile_id() {
            return fail(format!("tile {} does not match its coordinate", tile.id));
        }
        if !seen.insert(&tile.id) {
            return fail(format!("duplicate tile id {}", tile.id));
        }
        if tile.coord.q < 0
            || tile.coord.q >= state.map.width as i32
            || tile.coord.r < 0
            || tile.coord.r >= state.map.height as i32
        {
            return fail(format!("tile {} out of map bounds", tile.id));
        }
    }

    for player in &state.players {
        if let Some(research) = &player.researching {
            let Some(tech) = state.tech_catalog.iter().find(|t| t.id == research.tech_id)
            else {
                return fail(format!("player {} researches unknown tech", player.id));
            };
            if research.progress > tech.cost {
                return fail(format!(
                    "player {} research progress exceeds cost",
                    player.id
                ));
            }
        }
    }

    let Some(ext) = state.content_ext.as_ref() else { return Ok(()) };
    for (id, unit) in &ext.units {
        if *id != unit.id {
            return fail(format!("unit map key {id} disagrees with unit id"));
        }
        if !ext.tiles.contains_key(&unit.location) {
            return fail(format!("unit {id} stands on missing tile {}", unit.location));
        }
    }
    for (id, city) in &ext.cities {
        if !ext.tiles.contains_key(&city.location) {
            return fail(format!("city {id} stands on missing tile {}", city.location));
        }
        for order in &city.production_queue {
            if order.turns_remaining == 0 {
                return fail(format!("city {id} has a zero-turn production order"));
            }
        }
    }
    for (player_id, content_state) in &ext.player_states {
        if let Some(research) = &content_state.research {
            let Some(tech) = ext.techs.get(&research.tech_id) else {
                return fail(format!("player {player_id} researches unknown ext tech"));
            };
            if research.progress > tech.cost {
                return fail(format!(
                    "player {player_id} ext research progress exceeds cost"
                ));
            }
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
