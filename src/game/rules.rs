//! Terrain, Yield and Progression Rules
//!
//! The cost model works in half-point integer units so no floating point
//! ever reaches a gameplay decision; steps round up to whole movement
//! points when paid.

use thiserror::Error;

use crate::game::content::{self, Domain, UnitTypeDef};
use crate::game::state::{
    City, CityId, ContentExt, ExtBiome, Hextile, ProductionKind, ProductionOrder, TileId, Unit,
    UnitFlags, UnitId,
};

/// One movement point expressed in half-point units.
pub const HALF_POINTS_PER_MOVE: u32 = 2;

// =============================================================================
// PASSABILITY & MOVEMENT COST
// =============================================================================

/// Whether a unit may enter a tile at all.
pub fn passable(tile: &Hextile, unit: &Unit, def: &UnitTypeDef) -> bool {
    match tile.biome {
        ExtBiome::Mountain => unit.abilities.iter().any(|a| a == "canTraverseMountains"),
        ExtBiome::Ocean => {
            def.domain == Domain::Naval || unit.flags.contains(UnitFlags::EMBARKED)
        }
        _ => true,
    }
}

/// Movement cost of entering a tile, in half-point units, or `None` when the
/// tile is impassable for this unit. Base cost per biome, +0.5 for hills or
/// high elevation, +1.0 for woodland features; a road caps the step at one
/// full point.
pub fn step_cost_halves(tile: &Hextile, unit: &Unit, def: &UnitTypeDef) -> Option<u32> {
    if !passable(tile, unit, def) {
        return None;
    }
    let base = match tile.biome {
        ExtBiome::Ocean => 2,
        ExtBiome::Coast => 2,
        ExtBiome::Plains | ExtBiome::Grassland => 2,
        ExtBiome::Desert | ExtBiome::Tundra => 3,
        ExtBiome::Snow | ExtBiome::Forest | ExtBiome::Jungle | ExtBiome::Hills => 4,
        ExtBiome::Mountain => 6,
    };
    let mut halves = base;
    if tile.biome == ExtBiome::Hills || tile.elevation > 0.6 {
        halves += 1;
    }
    if tile.features.iter().any(|f| f == "forest" || f == "jungle") {
        halves += 2;
    }
    if tile.improvements.iter().any(|i| i == "road") {
        halves = halves.min(HALF_POINTS_PER_MOVE);
    }
    Some(halves)
}

/// Movement cost in whole points (half-points rounded up).
pub fn step_cost(tile: &Hextile, unit: &Unit, def: &UnitTypeDef) -> Option<u32> {
    step_cost_halves(tile, unit, def).map(|h| h.div_ceil(HALF_POINTS_PER_MOVE))
}

// =============================================================================
// YIELDS
// =============================================================================

/// Per-turn yields of a tile or city.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Yield {
    /// Food.
    pub food: u32,
    /// Production.
    pub production: u32,
    /// Gold.
    pub gold: u32,
    /// Science.
    pub science: u32,
    /// Culture.
    pub culture: u32,
}

impl Yield {
    fn add(&mut self, other: Yield) {
        self.food += other.food;
        self.production += other.production;
        self.gold += other.gold;
        self.science += other.science;
        self.culture += other.culture;
    }
}

/// Base yield of a tile by biome.
pub fn tile_base_yield(tile: &Hextile) -> Yield {
    match tile.biome {
        ExtBiome::Plains | ExtBiome::Grassland => Yield { food: 2, production: 1, ..Yield::default() },
        ExtBiome::Forest => Yield { food: 1, production: 2, ..Yield::default() },
        ExtBiome::Desert => Yield { production: 1, ..Yield::default() },
        ExtBiome::Hills => Yield { production: 2, ..Yield::default() },
        _ => Yield::default(),
    }
}

/// Tile yield including improvements.
pub fn tile_yield(tile: &Hextile) -> Yield {
    let mut total = tile_base_yield(tile);
    for imp_id in &tile.improvements {
        if let Some(def) = content::improvement(imp_id) {
            total.add(Yield {
                food: def.food,
                production: def.production,
                gold: def.gold,
                ..Yield::default()
            });
        }
    }
    total
}

/// Total city yield: base, worked tiles, then buildings.
pub fn city_yield(ext: &ContentExt, city: &City) -> Yield {
    let mut total = Yield { food: 2, production: 1, ..Yield::default() };
    for tile_id in &city.tiles_worked {
        if let Some(tile) = ext.tiles.get(tile_id) {
            total.add(tile_yield(tile));
        }
    }
    for building_id in &city.buildings {
        if let Some(def) = content::building(building_id) {
            total.add(Yield {
                food: def.food,
                production: def.production,
                gold: def.gold,
                science: def.science,
                culture: def.culture,
            });
        }
    }
    total
}

// =============================================================================
// MOVEMENT
// =============================================================================

/// Move a unit one tile, paying movement cost and updating occupancy.
///
/// Fails (returning `false`, touching nothing) when the unit or tile is
/// missing, the tile is impassable, the destination is occupied, or the
/// remaining movement cannot cover the step.
pub fn move_unit(ext: &mut ContentExt, unit_id: &str, to_tile: &str) -> bool {
    let Some(unit) = ext.units.get(unit_id) else { return false };
    let Some(def) = content::unit_type(&unit.unit_type) else { return false };
    let Some(tile) = ext.tiles.get(to_tile) else { return false };
    if tile.occupant_unit_id.is_some() || tile.occupant_city_id.is_some() {
        // Entering an occupied tile is combat or garrisoning, not movement.
        if tile.occupant_unit_id.as_deref() != Some(unit_id) {
            let friendly_city = tile
                .occupant_city_id
                .as_ref()
                .and_then(|cid| ext.cities.get(cid))
                .is_some_and(|c| c.owner_id == unit.owner_id);
            if !friendly_city || tile.occupant_unit_id.is_some() {
                return false;
            }
        }
    }
    let Some(cost) = step_cost(tile, unit, def) else { return false };
    if cost > unit.movement_remaining {
        return false;
    }

    let from_tile = unit.location.clone();
    let owner = unit.owner_id.clone();
    if let Some(prev) = ext.tiles.get_mut(&from_tile) {
        if prev.occupant_unit_id.as_deref() == Some(unit_id) {
            prev.occupant_unit_id = None;
        }
    }
    if let Some(dest) = ext.tiles.get_mut(to_tile) {
        if dest.occupant_city_id.is_none() {
            dest.occupant_unit_id = Some(unit_id.to_string());
        }
    }
    if let Some(unit) = ext.units.get_mut(unit_id) {
        unit.movement_remaining -= cost;
        unit.location = to_tile.to_string();
        unit.flags.remove(UnitFlags::FORTIFIED);
        if unit.movement_remaining == 0 {
            unit.flags.remove(UnitFlags::IDLE);
            unit.flags.insert(UnitFlags::MOVED);
        }
    }
    // Garrison bookkeeping when stepping into a friendly city.
    let city_id = ext
        .tiles
        .get(to_tile)
        .and_then(|t| t.occupant_city_id.clone());
    if let Some(city_id) = city_id {
        if let Some(city) = ext.cities.get_mut(&city_id) {
            if city.owner_id == owner && !city.garrison_unit_ids.iter().any(|u| u == unit_id) {
                city.garrison_unit_ids.push(unit_id.to_string());
            }
        }
    }
    true
}

// =============================================================================
// PRODUCTION
// =============================================================================

/// Advance the head of a city's production queue by one turn, materializing
/// the item when it completes.
pub fn tick_city_production(ext: &mut ContentExt, city_id: &str) {
    let Some(city) = ext.cities.get(city_id) else { return };
    let Some(head) = city.production_queue.first() else { return };

    let per_turn = city_yield(ext, city).production.max(1);
    let reduction = per_turn.min(head.turns_remaining).max(1);
    let completed = head.turns_remaining <= reduction;
    let order = head.clone();
    let owner = city.owner_id.clone();
    let city_tile = city.location.clone();

    if let Some(city) = ext.cities.get_mut(city_id) {
        if completed {
            city.production_queue.remove(0);
        } else if let Some(head) = city.production_queue.first_mut() {
            head.turns_remaining -= reduction;
        }
    }
    if !completed {
        return;
    }

    match order.kind {
        ProductionKind::Unit => {
            spawn_unit(ext, &order.item, &owner, &city_tile);
        }
        ProductionKind::Improvement => {
            let target = order.target_tile.as_deref().unwrap_or(&city_tile);
            if let Some(tile) = ext.tiles.get_mut(target) {
                if !tile.improvements.iter().any(|i| i == &order.item) {
                    tile.improvements.push(order.item.clone());
                }
            }
        }
        ProductionKind::Building => {
            if let Some(city) = ext.cities.get_mut(city_id) {
                if !city.buildings.iter().any(|b| b == &order.item) {
                    city.buildings.push(order.item.clone());
                }
            }
        }
    }
}

/// Instantiate a unit of a registered type on a tile, with a deterministic
/// serial-numbered id. Returns the new id, or `None` for unknown types.
pub fn spawn_unit(
    ext: &mut ContentExt,
    type_id: &str,
    owner_id: &str,
    tile_id: &str,
) -> Option<UnitId> {
    let def = content::unit_type(type_id)?;
    ext.next_unit_serial += 1;
    let id = format!("u_{}_{}_{}", owner_id, type_id, ext.next_unit_serial);
    ext.units.insert(
        id.clone(),
        Unit {
            id: id.clone(),
            unit_type: type_id.to_string(),
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
            tile.occupant_unit_id = Some(id.clone());
        }
    }
    Some(id)
}

// =============================================================================
// RESEARCH
// =============================================================================

/// Begin researching a tech; fails when prerequisites are unmet.
pub fn begin_research(ext: &mut ContentExt, player_id: &str, tech_id: &str) -> bool {
    let Some(tech) = ext.techs.get(tech_id) else { return false };
    let prereqs = tech.prerequisites.clone();
    let state = ext.player_state_mut(player_id);
    if state.researched_techs.iter().any(|t| t == tech_id) {
        return false;
    }
    if !prereqs.iter().all(|p| state.researched_techs.contains(p)) {
        return false;
    }
    state.research = Some(crate::game::state::ResearchProgress {
        tech_id: tech_id.to_string(),
        progress: 0,
    });
    true
}

/// Begin studying a civic; fails when prerequisites are unmet.
pub fn begin_civic(ext: &mut ContentExt, player_id: &str, civic_id: &str) -> bool {
    let Some(civic) = ext.civics.get(civic_id) else { return false };
    let prereqs = civic.prerequisites.clone();
    let state = ext.player_state_mut(player_id);
    if state.researched_civics.iter().any(|c| c == civic_id) {
        return false;
    }
    if !prereqs.iter().all(|p| state.researched_civics.contains(p)) {
        return false;
    }
    state.culture_research = Some(crate::game::state::CivicProgress {
        civic_id: civic_id.to_string(),
        progress: 0,
    });
    true
}

/// Advance a player's tech research by their science rate, applying unlocks
/// on completion.
pub fn tick_research(ext: &mut ContentExt, player_id: &str) {
    let Some(state) = ext.player_states.get(player_id) else { return };
    let Some(progress) = &state.research else { return };
    let Some(tech) = ext.techs.get(&progress.tech_id) else { return };

    let cost = tech.cost;
    let unlocks = tech.unlocks.clone();
    let tech_id = tech.id.clone();
    let science = state.science;

    let state = ext.player_state_mut(player_id);
    let Some(progress) = state.research.as_mut() else { return };
    progress.progress = (progress.progress + science).min(cost);
    if progress.progress < cost {
        return;
    }
    state.research = None;
    state.researched_techs.push(tech_id);
    for unit in unlocks.units {
        if !state.available_units.contains(&unit) {
            state.available_units.push(unit);
        }
    }
    for imp in unlocks.improvements {
        if !state.available_improvements.contains(&imp) {
            state.available_improvements.push(imp);
        }
    }
}

/// Advance a player's civic study by their culture rate, applying unlocks
/// on completion.
pub fn tick_civic(ext: &mut ContentExt, player_id: &str) {
    let Some(state) = ext.player_states.get(player_id) else { return };
    let Some(progress) = &state.culture_research else { return };
    let Some(civic) = ext.civics.get(&progress.civic_id) else { return };

    let cost = civic.cost;
    let unlocks = civic.unlocks.clone();
    let civic_id = civic.id.clone();
    let culture = state.culture;

    let state = ext.player_state_mut(player_id);
    let Some(progress) = state.culture_research.as_mut() else { return };
    progress.progress = (progress.progress + culture).min(cost);
    if progress.progress < cost {
        return;
    }
    state.culture_research = None;
    state.researched_civics.push(civic_id);
    for unit in unlocks.units {
        if !state.available_units.contains(&unit) {
            state.available_units.push(unit);
        }
    }
    for imp in unlocks.improvements {
        if !state.available_improvements.contains(&imp) {
            state.available_improvements.push(imp);
        }
    }
}

// =============================================================================
// CITY FOUNDING
// =============================================================================

/// Why founding a city failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FoundCityError {
    /// The founding unit does not exist.
    #[error("unit not found")]
    UnitMissing,
    /// Only settlers found cities.
    #[error("unit cannot found cities")]
    NotSettler,
    /// The target tile does not exist.
    #[error("tile not found")]
    TileMissing,
    /// A city already occupies the tile.
    #[error("tile already has a city")]
    TileHasCity,
    /// Terrain does not support settlement.
    #[error("invalid biome for a city")]
    InvalidBiome,
}

/// A successfully founded city.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoundedCity {
    /// New city id.
    pub city_id: CityId,
    /// Owner.
    pub owner_id: String,
    /// Tile claimed.
    pub tile_id: TileId,
}

/// Found a city with a settler, consuming the unit and claiming the tile.
pub fn found_city(
    ext: &mut ContentExt,
    unit_id: &str,
    tile_id: Option<&str>,
    city_id: Option<&str>,
    name: Option<&str>,
) -> Result<FoundedCity, FoundCityError> {
    let unit = ext.units.get(unit_id).ok_or(FoundCityError::UnitMissing)?;
    if unit.unit_type != "settler" {
        return Err(FoundCityError::NotSettler);
    }
    let location = tile_id.unwrap_or(&unit.location).to_string();
    let owner_id = unit.owner_id.clone();
    let tile = ext.tiles.get(&location).ok_or(FoundCityError::TileMissing)?;
    if tile.occupant_city_id.is_some() {
        return Err(FoundCityError::TileHasCity);
    }
    if matches!(tile.biome, ExtBiome::Ocean | ExtBiome::Mountain | ExtBiome::Snow) {
        return Err(FoundCityError::InvalidBiome);
    }

    ext.next_city_serial += 1;
    let new_id = city_id
        .map(|c| c.to_string())
        .unwrap_or_else(|| format!("c_{}_{}", owner_id, ext.next_city_serial));
    let display_name = name
        .map(|n| n.to_string())
        .unwrap_or_else(|| format!("City {new_id}"));
    ext.cities.insert(
        new_id.clone(),
        City {
            id: new_id.clone(),
            name: display_name,
            owner_id: owner_id.clone(),
            location: location.clone(),
            population: 1,
            production_queue: Vec::new(),
            tiles_worked: vec![location.clone()],
            garrison_unit_ids: Vec::new(),
            happiness: 0,
            buildings: Vec::new(),
        },
    );
    ext.units.remove(unit_id);
    if let Some(tile) = ext.tiles.get_mut(&location) {
        if tile.occupant_unit_id.as_deref() == Some(unit_id) {
            tile.occupant_unit_id = None;
        }
        tile.occupant_city_id = Some(new_id.clone());
    }
    Ok(FoundedCity { city_id: new_id, owner_id, tile_id: location })
}

/// End-of-turn unit upkeep: movement reset, Moved flag cleared, garrisoned
/// units heal in friendly cities.
pub fn refresh_units(ext: &mut ContentExt) {
    let heal_targets: Vec<(UnitId, bool)> = ext
        .units
        .iter()
        .map(|(id, unit)| {
            let in_friendly_city = ext
                .tiles
                .get(&unit.location)
                .and_then(|t| t.occupant_city_id.as_ref())
                .and_then(|cid| ext.cities.get(cid))
                .is_some_and(|c| c.owner_id == unit.owner_id);
            (id.clone(), in_friendly_city)
        })
        .collect();
    for (id, heal) in heal_targets {
        if let Some(unit) = ext.units.get_mut(&id) {
            unit.movement_remaining = unit.movement;
            unit.flags.remove(UnitFlags::MOVED);
            unit.flags.insert(UnitFlags::IDLE);
            if heal {
                unit.hp = (unit.hp + 10).min(100);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::UnitCategory;

    fn tile(id: &str, q: i32, r: i32, biome: ExtBiome) -> Hextile {
        Hextile {
            id: id.to_string(),
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

    fn warrior(id: &str, owner: &str, location: &str) -> Unit {
        Unit {
            id: id.to_string(),
            unit_type: "warrior".to_string(),
            category: UnitCategory::Melee,
            owner_id: owner.to_string(),
            location: location.to_string(),
            hp: 100,
            movement: 2,
            movement_remaining: 2,
            attack: 6,
            defense: 4,
            sight: 2,
            flags: UnitFlags::only(UnitFlags::IDLE),
            abilities: Vec::new(),
        }
    }

    fn ext_with_line() -> ContentExt {
        let mut ext = ContentExt::default();
        for q in 0..4 {
            let id = format!("{q},0");
            ext.tiles.insert(id.clone(), tile(&id, q, 0, ExtBiome::Grassland));
        }
        ext.units.insert("u1".to_string(), warrior("u1", "P1", "0,0"));
        ext.tiles.get_mut("0,0").unwrap().occupant_unit_id = Some("u1".to_string());
        ext
    }

    #[test]
    fn test_step_costs() {
        let unit = warrior("u", "P1", "0,0");
        let def = content::unit_type("warrior").unwrap();

        assert_eq!(step_cost(&tile("t", 0, 0, ExtBiome::Grassland), &unit, def), Some(1));
        assert_eq!(step_cost(&tile("t", 0, 0, ExtBiome::Desert), &unit, def), Some(2));
        assert_eq!(step_cost(&tile("t", 0, 0, ExtBiome::Forest), &unit, def), Some(2));
        assert_eq!(step_cost(&tile("t", 0, 0, ExtBiome::Ocean), &unit, def), None);
        assert_eq!(step_cost(&tile("t", 0, 0, ExtBiome::Mountain), &unit, def), None);

        // Hills stack the elevation surcharge on the biome base.
        let mut hills = tile("t", 0, 0, ExtBiome::Hills);
        hills.elevation = 0.3;
        assert_eq!(step_cost(&hills, &unit, def), Some(3));

        // A road caps the step at one point regardless of terrain.
        let mut forest = tile("t", 0, 0, ExtBiome::Forest);
        forest.improvements.push("road".to_string());
        assert_eq!(step_cost(&forest, &unit, def), Some(1));
    }

    #[test]
    fn test_embarked_crosses_ocean() {
        let mut unit = warrior("u", "P1", "0,0");
        let def = content::unit_type("warrior").unwrap();
        let ocean = tile("t", 0, 0, ExtBiome::Ocean);
        assert!(!passable(&ocean, &unit, def));
        unit.flags.insert(UnitFlags::EMBARKED);
        assert!(passable(&ocean, &unit, def));
    }

    #[test]
    fn test_move_unit_pays_cost_and_moves_occupancy() {
        let mut ext = ext_with_line();
        assert!(move_unit(&mut ext, "u1", "1,0"));
        assert_eq!(ext.units["u1"].location, "1,0");
        assert_eq!(ext.units["u1"].movement_remaining, 1);
        assert_eq!(ext.tiles["0,0"].occupant_unit_id, None);
        assert_eq!(ext.tiles["1,0"].occupant_unit_id.as_deref(), Some("u1"));

        // Second step exhausts movement and sets the Moved flag.
        assert!(move_unit(&mut ext, "u1", "2,0"));
        assert!(ext.units["u1"].flags.contains(UnitFlags::MOVED));
        assert!(!ext.units["u1"].flags.contains(UnitFlags::IDLE));

        // No movement left: the third step is rejected.
        assert!(!move_unit(&mut ext, "u1", "3,0"));
        assert_eq!(ext.units["u1"].location, "2,0");
    }

    #[test]
    fn test_move_into_occupied_tile_rejected() {
        let mut ext = ext_with_line();
        ext.units.insert("u2".to_string(), warrior("u2", "P2", "1,0"));
        ext.tiles.get_mut("1,0").unwrap().occupant_unit_id = Some("u2".to_string());
        assert!(!move_unit(&mut ext, "u1", "1,0"));
    }

    #[test]
    fn test_production_completion_spawns_unit() {
        let mut ext = ext_with_line();
        ext.cities.insert(
            "c1".to_string(),
            City {
                id: "c1".to_string(),
                name: "Alpha".to_string(),
                owner_id: "P1".to_string(),
                location: "3,0".to_string(),
                population: 1,
                production_queue: vec![ProductionOrder {
                    kind: ProductionKind::Unit,
                    item: "scout".to_string(),
                    turns_remaining: 1,
                    target_tile: None,
                }],
                tiles_worked: vec!["3,0".to_string()],
                garrison_unit_ids: Vec::new(),
                happiness: 0,
                buildings: Vec::new(),
            },
        );
        ext.tiles.get_mut("3,0").unwrap().occupant_city_id = Some("c1".to_string());

        tick_city_production(&mut ext, "c1");
        assert!(ext.cities["c1"].production_queue.is_empty());
        let spawned: Vec<&Unit> =
            ext.units.values().filter(|u| u.unit_type == "scout").collect();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].location, "3,0");
        assert_eq!(spawned[0].id, "u_P1_scout_1");
    }

    #[test]
    fn test_research_progress_caps_and_completes() {
        let mut ext = ContentExt {
            techs: content::default_technologies(),
            ..ContentExt::default()
        };
        assert!(begin_research(&mut ext, "P1", "agriculture"));
        ext.player_state_mut("P1").science = 4;

        tick_research(&mut ext, "P1");
        let state = &ext.player_states["P1"];
        assert_eq!(state.research.as_ref().map(|r| r.progress), Some(4));

        tick_research(&mut ext, "P1");
        let state = &ext.player_states["P1"];
        assert!(state.research.is_none());
        assert!(state.researched_techs.iter().any(|t| t == "agriculture"));
        assert!(state.available_improvements.iter().any(|i| i == "farm"));
    }

    #[test]
    fn test_research_prerequisites_enforced() {
        let mut ext = ContentExt {
            techs: content::default_technologies(),
            ..ContentExt::default()
        };
        // wheel requires mining.
        assert!(!begin_research(&mut ext, "P1", "wheel"));
        ext.player_state_mut("P1").researched_techs.push("mining".to_string());
        assert!(begin_research(&mut ext, "P1", "wheel"));
    }

    #[test]
    fn test_found_city_consumes_settler() {
        let mut ext = ext_with_line();
        ext.units.insert(
            "s1".to_string(),
            Unit {
                unit_type: "settler".to_string(),
                category: UnitCategory::Civilian,
                attack: 0,
                defense: 0,
                ..warrior("s1", "P1", "2,0")
            },
        );
        let founded = found_city(&mut ext, "s1", None, None, None).unwrap();
        assert_eq!(founded.tile_id, "2,0");
        assert!(!ext.units.contains_key("s1"));
        assert_eq!(
            ext.tiles["2,0"].occupant_city_id.as_ref(),
            Some(&founded.city_id)
        );
        // Founding again on the same tile fails.
        ext.units.insert(
            "s2".to_string(),
            Unit {
                unit_type: "settler".to_string(),
                ..warrior("s2", "P1", "2,0")
            },
        );
        assert_eq!(
            found_city(&mut ext, "s2", None, None, None),
            Err(FoundCityError::TileHasCity)
        );
    }

    #[test]
    fn test_found_city_rejects_non_settler() {
        let mut ext = ext_with_line();
        assert_eq!(
            found_city(&mut ext, "u1", None, None, None),
            Err(FoundCityError::NotSettler)
        );
    }

    #[test]
    fn test_refresh_units_clears_moved_and_heals() {
        let mut ext = ext_with_line();
        {
            let unit = ext.units.get_mut("u1").unwrap();
            unit.movement_remaining = 0;
            unit.hp = 60;
            unit.flags.insert(UnitFlags::MOVED);
            unit.flags.remove(UnitFlags::IDLE);
        }
        ext.cities.insert(
            "c1".to_string(),
            City {
                id: "c1".to_string(),
                name: "Alpha".to_string(),
                owner_id: "P1".to_string(),
                location: "0,0".to_string(),
                population: 1,
                production_queue: Vec::new(),
                tiles_worked: Vec::new(),
                garrison_unit_ids: Vec::new(),
                happiness: 0,
                buildings: Vec::new(),
            },
        );
        ext.tiles.get_mut("0,0").unwrap().occupant_city_id = Some("c1".to_string());

        refresh_units(&mut ext);
        let unit = &ext.units["u1"];
        assert_eq!(unit.movement_remaining, 2);
        assert!(!unit.flags.contains(UnitFlags::MOVED));
        assert!(unit.flags.contains(UnitFlags::IDLE));
        assert_eq!(unit.hp, 70);
    }
}
