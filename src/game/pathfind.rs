//! Hex Pathfinding
//!
//! Cost-bounded movement-range expansion and shortest-path queries over the
//! extension tile layer. Both are uniform-cost searches with ties broken by
//! tile id, so results are identical on every platform. Enemy-occupied
//! tiles are reachable as attack targets but never traversed through, and
//! unreachable targets are reported as an explicit value, never a panic.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use crate::game::content;
use crate::game::hex::{self, HexCoord};
use crate::game::rules;
use crate::game::state::{
    CombatPreview, CombatTarget, CombatTargetKind, ContentExt, TileId, Unit, UnitFlags,
};

/// Result of a movement-range query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MovementRange {
    /// Reachable tile ids (excluding the start tile), sorted by id.
    pub reachable: Vec<TileId>,
    /// Accumulated cost per visited tile (start included at cost 0).
    pub cost: BTreeMap<TileId, u32>,
}

/// Result of a path query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathResult {
    /// A path exists.
    Found {
        /// Tiles entered, start-exclusive, in travel order.
        path: Vec<TileId>,
        /// Sum of step costs of the entered tiles.
        total_cost: u32,
        /// First enemy contact along the path, if any.
        contact: Option<CombatPreview>,
    },
    /// No path exists for this unit.
    Unreachable,
}

fn coord_index(ext: &ContentExt) -> BTreeMap<(i32, i32), TileId> {
    ext.tiles
        .values()
        .map(|t| ((t.q, t.r), t.id.clone()))
        .collect()
}

fn enemy_contact(ext: &ContentExt, unit: &Unit, tile_id: &str) -> Option<CombatTarget> {
    let tile = ext.tiles.get(tile_id)?;
    if let Some(city_id) = &tile.occupant_city_id {
        if let Some(city) = ext.cities.get(city_id) {
            if city.owner_id != unit.owner_id {
                return Some(CombatTarget {
                    kind: CombatTargetKind::City,
                    id: city.id.clone(),
                    owner_id: city.owner_id.clone(),
                });
            }
        }
    }
    if let Some(occupant_id) = &tile.occupant_unit_id {
        if let Some(occupant) = ext.units.get(occupant_id) {
            if occupant.id != unit.id && occupant.owner_id != unit.owner_id {
                return Some(CombatTarget {
                    kind: CombatTargetKind::Unit,
                    id: occupant.id.clone(),
                    owner_id: occupant.owner_id.clone(),
                });
            }
        }
    }
    None
}

/// Dijkstra over the tile graph from a unit's position.
///
/// `bound` stops expansion past an accumulated cost; `target` stops the
/// search once the goal is settled. Returns accumulated costs and the
/// predecessor map.
fn expand(
    ext: &ContentExt,
    unit: &Unit,
    width: u32,
    height: u32,
    bound: Option<u32>,
    target: Option<&str>,
) -> (BTreeMap<TileId, u32>, BTreeMap<TileId, TileId>) {
    let mut dist: BTreeMap<TileId, u32> = BTreeMap::new();
    let mut pred: BTreeMap<TileId, TileId> = BTreeMap::new();
    let Some(def) = content::unit_type(&unit.unit_type) else {
        return (dist, pred);
    };
    let Some(start) = ext.tiles.get(&unit.location) else {
        return (dist, pred);
    };
    let index = coord_index(ext);

    // Reverse<(cost, id)>: lowest cost first, then lexically smallest id.
    let mut heap: BinaryHeap<Reverse<(u32, TileId)>> = BinaryHeap::new();
    dist.insert(start.id.clone(), 0);
    heap.push(Reverse((0, start.id.clone())));

    while let Some(Reverse((cost, tile_id))) = heap.pop() {
        if dist.get(&tile_id).is_some_and(|&d| cost > d) {
            continue; // stale queue entry
        }
        if target == Some(tile_id.as_str()) {
            break;
        }
        // Enemy-occupied tiles terminate expansion: valid attack targets,
        // never corridors.
        if tile_id != start.id && enemy_contact(ext, unit, &tile_id).is_some() {
            continue;
        }
        let Some(tile) = ext.tiles.get(&tile_id) else { continue };
        for neighbor in hex::neighbors(tile.coord(), Some(width), Some(height)) {
            let Some(next_id) = index.get(&(neighbor.q, neighbor.r)) else {
                continue;
            };
            let Some(next_tile) = ext.tiles.get(next_id) else { continue };
            let Some(step) = rules::step_cost(next_tile, unit, def) else {
                continue;
            };
            let next_cost = cost + step;
            if bound.is_some_and(|b| next_cost > b) {
                continue;
            }
            if dist.get(next_id).is_none_or(|&d| next_cost < d) {
                dist.insert(next_id.clone(), next_cost);
                pred.insert(next_id.clone(), tile_id.clone());
                heap.push(Reverse((next_cost, next_id.clone())));
            }
        }
    }
    (dist, pred)
}

/// Compute the set of tiles a unit can reach with its remaining movement.
///
/// A unit that has already moved or fortified this turn has an empty range.
pub fn movement_range(
    ext: &ContentExt,
    unit_id: &str,
    map_width: u32,
    map_height: u32,
) -> MovementRange {
    let Some(unit) = ext.units.get(unit_id) else {
        return MovementRange::default();
    };
    if unit.flags.contains(UnitFlags::MOVED) || unit.flags.contains(UnitFlags::FORTIFIED) {
        return MovementRange::default();
    }
    if unit.movement_remaining == 0 {
        return MovementRange::default();
    }
    let (dist, _) = expand(
        ext,
        unit,
        map_width,
        map_height,
        Some(unit.movement_remaining),
        None,
    );
    let reachable: Vec<TileId> = dist
        .keys()
        .filter(|id| **id != unit.location)
        .cloned()
        .collect();
    MovementRange { reachable, cost: dist }
}

/// Compute the cheapest path from a unit to a target tile.
///
/// Paths are start-exclusive. Long-range previews are allowed (no movement
/// bound); execution enforces the per-step budget separately.
pub fn compute_path(
    ext: &ContentExt,
    unit_id: &str,
    target_tile_id: &str,
    map_width: u32,
    map_height: u32,
) -> PathResult {
    let Some(unit) = ext.units.get(unit_id) else {
        return PathResult::Unreachable;
    };
    if !ext.tiles.contains_key(target_tile_id) {
        return PathResult::Unreachable;
    }
    if unit.location == target_tile_id {
        return PathResult::Found { path: Vec::new(), total_cost: 0, contact: None };
    }
    let (dist, pred) = expand(ext, unit, map_width, map_height, None, Some(target_tile_id));
    let Some(&total_cost) = dist.get(target_tile_id) else {
        return PathResult::Unreachable;
    };

    let mut path = vec![target_tile_id.to_string()];
    let mut cursor = target_tile_id.to_string();
    while let Some(prev) = pred.get(&cursor) {
        if *prev == unit.location {
            break;
        }
        path.push(prev.clone());
        cursor = prev.clone();
    }
    path.reverse();

    let contact = path.iter().find_map(|tile_id| {
        enemy_contact(ext, unit, tile_id).map(|defender| CombatPreview {
            tile_id: tile_id.clone(),
            attacker_unit_id: unit.id.clone(),
            defender: Some(defender),
            requires_confirm: true,
        })
    });
    PathResult::Found { path, total_cost, contact }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{ExtBiome, Hextile, UnitCategory};

    fn tile(q: i32, r: i32, biome: ExtBiome) -> Hextile {
        let coord = HexCoord::new(q, r);
        Hextile {
            id: coord.tile_id(),
            q,
            r,
            biome,
            elevation: 0.4,
            features: Vec::new(),
            improvements: Vec::new(),
            occupant_unit_id: None,
            occupant_city_id: None,
        }
    }

    fn grid(width: i32, height: i32) -> ContentExt {
        let mut ext = ContentExt::default();
        for r in 0..height {
            for q in 0..width {
                let t = tile(q, r, ExtBiome::Grassland);
                ext.tiles.insert(t.id.clone(), t);
            }
        }
        ext
    }

    fn add_unit(ext: &mut ContentExt, id: &str, owner: &str, location: &str, movement: u32) {
        ext.units.insert(
            id.to_string(),
            Unit {
                id: id.to_string(),
                unit_type: "warrior".to_string(),
                category: UnitCategory::Melee,
                owner_id: owner.to_string(),
                location: location.to_string(),
                hp: 100,
                movement,
                movement_remaining: movement,
                attack: 6,
                defense: 4,
                sight: 2,
                flags: UnitFlags::only(UnitFlags::IDLE),
                abilities: Vec::new(),
            },
        );
        ext.tiles.get_mut(location).unwrap().occupant_unit_id = Some(id.to_string());
    }

    #[test]
    fn test_straight_line_path() {
        let mut ext = grid(5, 1);
        add_unit(&mut ext, "u1", "P1", "0,0", 2);

        match compute_path(&ext, "u1", "3,0", 100, 1) {
            PathResult::Found { path, total_cost, contact } => {
                assert_eq!(path, vec!["1,0", "2,0", "3,0"]);
                assert_eq!(total_cost, 3); // 3 entered tiles at base cost 1
                assert!(contact.is_none());
            }
            PathResult::Unreachable => panic!("expected a path"),
        }
    }

    #[test]
    fn test_unreachable_is_a_value() {
        let mut ext = grid(3, 1);
        // Wall of mountains between start and goal, on a non-wrapping row.
        ext.tiles.get_mut("1,0").unwrap().biome = ExtBiome::Mountain;
        add_unit(&mut ext, "u1", "P1", "0,0", 2);
        // Use a huge width so the cylinder seam cannot route around.
        assert_eq!(compute_path(&ext, "u1", "2,0", 100, 1), PathResult::Unreachable);
        assert_eq!(compute_path(&ext, "u1", "nope", 3, 1), PathResult::Unreachable);
    }

    #[test]
    fn test_path_prefers_cheap_terrain() {
        let mut ext = grid(3, 2);
        // Direct middle tile is hills (cost 3); the detour row stays cost 1.
        ext.tiles.get_mut("1,0").unwrap().biome = ExtBiome::Hills;
        add_unit(&mut ext, "u1", "P1", "0,0", 4);

        match compute_path(&ext, "u1", "2,0", 100, 100) {
            PathResult::Found { path, total_cost, .. } => {
                assert_eq!(total_cost, 3);
                assert!(!path.contains(&"1,0".to_string()));
            }
            PathResult::Unreachable => panic!("expected a path"),
        }
    }

    #[test]
    fn test_movement_range_bounded_by_allowance() {
        let mut ext = grid(6, 1);
        add_unit(&mut ext, "u1", "P1", "0,0", 2);

        let range = movement_range(&ext, "u1", 100, 1);
        assert!(range.reachable.contains(&"1,0".to_string()));
        assert!(range.reachable.contains(&"2,0".to_string()));
        assert!(!range.reachable.contains(&"3,0".to_string()));
        assert!(!range.reachable.contains(&"0,0".to_string()));
        assert_eq!(range.cost.get("2,0"), Some(&2));
    }

    #[test]
    fn test_movement_range_monotonic_in_allowance() {
        let mut ext = grid(8, 4);
        add_unit(&mut ext, "u1", "P1", "0,0", 1);
        let small = movement_range(&ext, "u1", 100, 100);

        ext.units.get_mut("u1").unwrap().movement = 3;
        ext.units.get_mut("u1").unwrap().movement_remaining = 3;
        let large = movement_range(&ext, "u1", 100, 100);

        for id in &small.reachable {
            assert!(large.reachable.contains(id), "{id} lost when allowance grew");
        }
        assert!(large.reachable.len() >= small.reachable.len());
    }

    #[test]
    fn test_moved_unit_has_empty_range() {
        let mut ext = grid(4, 1);
        add_unit(&mut ext, "u1", "P1", "0,0", 2);
        ext.units.get_mut("u1").unwrap().flags.insert(UnitFlags::MOVED);

        let range = movement_range(&ext, "u1", 4, 1);
        assert!(range.reachable.is_empty());
        assert!(range.cost.is_empty());
    }

    #[test]
    fn test_enemy_tile_is_target_not_corridor() {
        let mut ext = grid(4, 1);
        add_unit(&mut ext, "u1", "P1", "0,0", 3);
        add_unit(&mut ext, "e1", "P2", "1,0", 2);

        let range = movement_range(&ext, "u1", 100, 1);
        // The enemy tile is reachable as an attack target...
        assert!(range.reachable.contains(&"1,0".to_string()));
        // ...but nothing beyond it is, on a non-wrapping row.
        assert!(!range.reachable.contains(&"2,0".to_string()));

        // The preview reports the contact.
        match compute_path(&ext, "u1", "1,0", 100, 1) {
            PathResult::Found { contact, .. } => {
                let contact = contact.expect("combat contact");
                assert_eq!(contact.tile_id, "1,0");
                assert_eq!(
                    contact.defender.as_ref().map(|d| d.id.as_str()),
                    Some("e1")
                );
            }
            PathResult::Unreachable => panic!("enemy tile should be targetable"),
        }
    }

    #[test]
    fn test_tie_break_is_stable() {
        // Two equal-cost routes; the result must be identical across runs.
        let ext = {
            let mut ext = grid(3, 3);
            add_unit(&mut ext, "u1", "P1", "0,0", 6);
            ext
        };
        let a = compute_path(&ext, "u1", "2,2", 100, 100);
        let b = compute_path(&ext, "u1", "2,2", 100, 100);
        assert_eq!(a, b);
    }

    proptest::proptest! {
        #[test]
        fn prop_movement_range_monotonic(small in 1u32..5, extra in 0u32..4) {
            let mut ext = grid(9, 9);
            add_unit(&mut ext, "u1", "P1", "4,4", small);
            let narrow = movement_range(&ext, "u1", 100, 100);

            let unit = ext.units.get_mut("u1").unwrap();
            unit.movement = small + extra;
            unit.movement_remaining = small + extra;
            let wide = movement_range(&ext, "u1", 100, 100);

            for id in &narrow.reachable {
                proptest::prop_assert!(
                    wide.reachable.contains(id),
                    "tile {} dropped when allowance grew", id
                );
            }
        }
    }

    #[test]
    fn test_range_wraps_on_cylinder() {
        let mut ext = grid(5, 1);
        add_unit(&mut ext, "u1", "P1", "0,0", 1);
        let range = movement_range(&ext, "u1", 5, 1);
        // With width 5 the west neighbor wraps to 4,0.
        assert!(range.reachable.contains(&"4,0".to_string()));
    }
}
