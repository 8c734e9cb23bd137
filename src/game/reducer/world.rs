//! World / Content-Extension Handlers
//!
//! Direct mutations of the extension layer: entity insertion, movement
//! paths, improvements, unit flags, explicit removals and combat. These are
//! the only handlers that thread the RNG state (through combat draws).

use serde_json::json;

use crate::game::action::{TileSpec, UnitFlagName};
use crate::game::combat;
use crate::game::content;
use crate::game::rules;
use crate::game::state::{
    City, ExtBiome, GameState, Hextile, UnitFlags,
};

fn flag_bit(name: UnitFlagName) -> u8 {
    match name {
        UnitFlagName::Idle => UnitFlags::IDLE,
        UnitFlagName::Moved => UnitFlags::MOVED,
        UnitFlagName::Fortified => UnitFlags::FORTIFIED,
        UnitFlagName::Embarked => UnitFlags::EMBARKED,
        UnitFlagName::Selected => UnitFlags::SELECTED,
    }
}

/// EXT_ADD_TILE: insert a tile (scenario setup).
pub(super) fn ext_add_tile(draft: &mut GameState, spec: &TileSpec) {
    let Some(ext) = draft.content_ext.as_mut() else { return };
    ext.tiles.insert(
        spec.id.clone(),
        Hextile {
            id: spec.id.clone(),
            q: spec.q,
            r: spec.r,
            biome: spec.biome.unwrap_or(ExtBiome::Grassland),
            elevation: 0.0,
            features: Vec::new(),
            improvements: Vec::new(),
            occupant_unit_id: None,
            occupant_city_id: None,
        },
    );
}

/// EXT_ADD_UNIT: insert a unit of a registered type.
pub(super) fn ext_add_unit(
    draft: &mut GameState,
    unit_id: &str,
    unit_type: &str,
    owner_id: &str,
    tile_id: Option<&str>,
) {
    let Some(def) = content::unit_type(unit_type) else { return };
    let Some(ext) = draft.content_ext.as_mut() else { return };
    let Some(tile_id) = tile_id else { return };
    if !ext.tiles.contains_key(tile_id) {
        return;
    }
    ext.units.insert(
        unit_id.to_string(),
        crate::game::state::Unit {
            id: unit_id.to_string(),
            unit_type: unit_type.to_string(),
            category: def.category,
            owner_id: owner_id.to_string(),
            location: tile_id.to_string(),
            hp: def.hp,
            movement: def.movement,
            movement_remaining: def.movement,
            attack: def.attack,
            defense: def.defense,
            sight: def.sight,
            flags: UnitFlags::only(UnitFlags::IDLE),
            abilities: def.abilities.iter().map(|a| a.to_string()).collect(),
        },
    );
    if let Some(tile) = ext.tiles.get_mut(tile_id) {
        if tile.occupant_unit_id.is_none() && tile.occupant_city_id.is_none() {
            tile.occupant_unit_id = Some(unit_id.to_string());
        }
    }
}

/// EXT_ADD_CITY: insert a city directly (scenario setup).
pub(super) fn ext_add_city(
    draft: &mut GameState,
    city_id: &str,
    name: Option<&str>,
    owner_id: &str,
    tile_id: Option<&str>,
) {
    let Some(ext) = draft.content_ext.as_mut() else { return };
    let Some(tile_id) = tile_id else { return };
    if !ext.tiles.contains_key(tile_id) {
        return;
    }
    ext.cities.insert(
        city_id.to_string(),
        City {
            id: city_id.to_string(),
            name: name.unwrap_or(city_id).to_string(),
            owner_id: owner_id.to_string(),
            location: tile_id.to_string(),
            population: 1,
            production_queue: Vec::new(),
            tiles_worked: vec![tile_id.to_string()],
            garrison_unit_ids: Vec::new(),
            happiness: 0,
            buildings: Vec::new(),
        },
    );
    if let Some(tile) = ext.tiles.get_mut(tile_id) {
        tile.occupant_city_id = Some(city_id.to_string());
    }
}

/// EXT_FOUND_CITY: found a city with a settler.
pub(super) fn ext_found_city(
    draft: &mut GameState,
    unit_id: &str,
    tile_id: Option<&str>,
    city_id: Option<&str>,
    name: Option<&str>,
) {
    let Some(ext) = draft.content_ext.as_mut() else { return };
    match rules::found_city(ext, unit_id, tile_id, city_id, name) {
        Ok(founded) => {
            draft.push_log(
                "city:found",
                Some(json!({
                    "cityId": founded.city_id,
                    "ownerId": founded.owner_id,
                    "tileId": founded.tile_id,
                })),
            );
        }
        Err(reason) => {
            draft.push_log(
                "action:rejected",
                Some(json!({ "action": "EXT_FOUND_CITY", "reason": reason.to_string() })),
            );
        }
    }
}

/// EXT_MOVE_UNIT: one cost-paying step.
pub(super) fn ext_move_unit(draft: &mut GameState, unit_id: &str, tile_id: &str) {
    let Some(ext) = draft.content_ext.as_mut() else { return };
    rules::move_unit(ext, unit_id, tile_id);
}

/// Walk a unit along a start-exclusive path, stopping on enemy contact
/// (resolving combat instead when confirmed) or when movement runs out.
///
/// Shared by ISSUE_MOVE and EXT_ISSUE_MOVE_PATH.
pub(crate) fn walk_path(
    draft: &mut GameState,
    unit_id: &str,
    path: &[String],
    confirm_combat: bool,
) {
    for tile_id in path {
        let Some(ext) = draft.content_ext.as_mut() else { return };
        if !ext.units.contains_key(unit_id) {
            return;
        }
        if !ext.tiles.contains_key(tile_id) {
            return;
        }

        let owner = ext.units[unit_id].owner_id.clone();
        let tile = &ext.tiles[tile_id];
        let enemy_unit = tile
            .occupant_unit_id
            .as_ref()
            .and_then(|uid| ext.units.get(uid))
            .is_some_and(|u| u.owner_id != owner);
        let enemy_city = tile
            .occupant_city_id
            .as_ref()
            .and_then(|cid| ext.cities.get(cid))
            .is_some_and(|c| c.owner_id != owner);

        if enemy_unit || enemy_city {
            if !confirm_combat {
                return;
            }
            resolve_combat_action(draft, unit_id, tile_id);
            return;
        }
        let Some(ext) = draft.content_ext.as_mut() else { return };
        if !rules::move_unit(ext, unit_id, tile_id) {
            return;
        }
    }
}

/// EXT_BEGIN_RESEARCH: start extension tech research for a player.
pub(super) fn ext_begin_research(draft: &mut GameState, player_id: &str, tech_id: &str) {
    let Some(ext) = draft.content_ext.as_mut() else { return };
    rules::begin_research(ext, player_id, tech_id);
}

/// EXT_BEGIN_CIVIC: start civic study for a player.
pub(super) fn ext_begin_civic(draft: &mut GameState, player_id: &str, civic_id: &str) {
    let Some(ext) = draft.content_ext.as_mut() else { return };
    rules::begin_civic(ext, player_id, civic_id);
}

/// SET_TILE_IMPROVEMENT: place a registered improvement, replacing any
/// existing copy of the same improvement.
pub(super) fn set_tile_improvement(draft: &mut GameState, tile_id: &str, improvement_id: &str) {
    if content::improvement(improvement_id).is_none() {
        return;
    }
    let Some(ext) = draft.content_ext.as_mut() else { return };
    let Some(tile) = ext.tiles.get_mut(tile_id) else { return };
    tile.improvements.retain(|i| i != improvement_id);
    tile.improvements.push(improvement_id.to_string());
}

/// REMOVE_TILE_IMPROVEMENT.
pub(super) fn remove_tile_improvement(
    draft: &mut GameState,
    tile_id: &str,
    improvement_id: &str,
) {
    let Some(ext) = draft.content_ext.as_mut() else { return };
    let Some(tile) = ext.tiles.get_mut(tile_id) else { return };
    tile.improvements.retain(|i| i != improvement_id);
}

/// ADD_UNIT_STATE: set a flag, rejecting reserved combinations (a unit
/// cannot be fortified and moved in the same resolved tick).
pub(super) fn add_unit_flag(draft: &mut GameState, unit_id: &str, name: UnitFlagName) {
    let Some(ext) = draft.content_ext.as_mut() else { return };
    let Some(unit) = ext.units.get_mut(unit_id) else { return };
    let bit = flag_bit(name);
    let conflict = match name {
        UnitFlagName::Fortified => UnitFlags::MOVED,
        UnitFlagName::Moved => UnitFlags::FORTIFIED,
        _ => 0,
    };
    if conflict != 0 && unit.flags.contains(conflict) {
        return;
    }
    unit.flags.insert(bit);
}

/// REMOVE_UNIT_STATE: clear a flag.
pub(super) fn remove_unit_flag(draft: &mut GameState, unit_id: &str, name: UnitFlagName) {
    let Some(ext) = draft.content_ext.as_mut() else { return };
    let Some(unit) = ext.units.get_mut(unit_id) else { return };
    unit.flags.remove(flag_bit(name));
}

/// FORTIFY_UNIT: fortify in place; rejected after moving this turn.
pub(super) fn fortify_unit(draft: &mut GameState, unit_id: &str) {
    let Some(ext) = draft.content_ext.as_mut() else { return };
    let Some(unit) = ext.units.get_mut(unit_id) else { return };
    if unit.flags.contains(UnitFlags::MOVED) {
        return;
    }
    unit.flags.insert(UnitFlags::FORTIFIED);
    unit.flags.remove(UnitFlags::IDLE);
}

/// REMOVE_UNIT: explicit removal (death, disband), clearing occupancy and
/// garrison references.
pub(super) fn remove_unit(draft: &mut GameState, unit_id: &str) {
    let Some(ext) = draft.content_ext.as_mut() else { return };
    let Some(unit) = ext.units.remove(unit_id) else { return };
    if let Some(tile) = ext.tiles.get_mut(&unit.location) {
        if tile.occupant_unit_id.as_deref() == Some(unit_id) {
            tile.occupant_unit_id = None;
        }
    }
    for city in ext.cities.values_mut() {
        city.garrison_unit_ids.retain(|g| g != unit_id);
    }
    draft.push_log("unit:removed", Some(json!({ "unitId": unit_id })));
}

/// REMOVE_BUILDING: explicit demolition.
pub(super) fn remove_building(draft: &mut GameState, city_id: &str, building_id: &str) {
    let Some(ext) = draft.content_ext.as_mut() else { return };
    let Some(city) = ext.cities.get_mut(city_id) else { return };
    let before = city.buildings.len();
    city.buildings.retain(|b| b != building_id);
    if city.buildings.len() != before {
        draft.push_log(
            "building:removed",
            Some(json!({ "cityId": city_id, "buildingId": building_id })),
        );
    }
}

/// RESOLVE_COMBAT: explicit attack resolution, threading the RNG state
/// through the draws and logging the outcome.
pub(super) fn resolve_combat_action(draft: &mut GameState, attacker_id: &str, target_tile: &str) {
    let Some(rng) = draft.rng_state else { return };
    let Some(ext) = draft.content_ext.as_mut() else { return };
    let (rng, outcome) = combat::resolve_combat(ext, rng, attacker_id, target_tile);
    draft.rng_state = Some(rng);
    if let Some(outcome) = outcome {
        draft.push_log(
            "combat:resolved",
            Some(json!({
                "attackerId": attacker_id,
                "tileId": target_tile,
                "damageToDefender": outcome.damage_to_defender,
                "damageToAttacker": outcome.damage_to_attacker,
                "defenderKilled": outcome.defender_killed,
                "attackerKilled": outcome.attacker_killed,
                "cityCaptured": outcome.city_captured,
            })),
        );
    }
}

// =============================================================================
// TESTS
// =============================================================================
