//! Lifecycle Handlers
//!
//! World creation, new-game reset, autoplay toggling and log appends. INIT
//! and NEW_GAME perform the one-way transition from the menu state into the
//! in-game state.

use serde_json::json;

use crate::game::content;
use crate::game::hex;
use crate::game::state::{
    BiomeType, ContentExt, ExtBiome, GameLogEntry, GameState, Hextile, PlayerState, Tile,
    UiState, UnitFlags,
};
use crate::game::worldgen::{generate_world, WorldSeed};

/// Map a base biome into the extension palette.
fn ext_biome(biome: BiomeType) -> ExtBiome {
    match biome {
        BiomeType::Grassland => ExtBiome::Grassland,
        BiomeType::Desert => ExtBiome::Desert,
        BiomeType::Forest => ExtBiome::Forest,
        BiomeType::Mountain => ExtBiome::Mountain,
        BiomeType::Ocean => ExtBiome::Ocean,
        BiomeType::Tundra => ExtBiome::Tundra,
        BiomeType::Ice => ExtBiome::Snow,
    }
}

/// Mirror the base map into the extension tile store.
fn populate_extension_tiles(ext: &mut ContentExt, tiles: &[Tile]) {
    for tile in tiles {
        ext.tiles.insert(
            tile.id.clone(),
            Hextile {
                id: tile.id.clone(),
                q: tile.coord.q,
                r: tile.coord.r,
                biome: ext_biome(tile.biome),
                elevation: tile.elevation,
                features: Vec::new(),
                improvements: Vec::new(),
                occupant_unit_id: None,
                occupant_city_id: None,
            },
        );
    }
}

/// Deterministic seed hash used for leader assignment.
fn seed_hash(seed: &str) -> u32 {
    seed.bytes().fold(0u32, |acc, b| acc.wrapping_add(u32::from(b)))
}

fn build_players(seed: &str, total: u32, humans: u32, selected: Option<&[String]>) -> Vec<PlayerState> {
    let roster = content::leaders();
    let mut players = Vec::new();
    for index in 0..total {
        let pick = selected
            .and_then(|s| s.get(index as usize))
            .filter(|p| p.as_str() != "random");
        let leader = pick
            .and_then(|id| roster.iter().find(|l| &l.id == id))
            .unwrap_or_else(|| {
                let at = (seed_hash(seed).wrapping_add(index)) as usize % roster.len();
                &roster[at]
            })
            .clone();
        players.push(PlayerState {
            id: format!("P{}", index + 1),
            is_human: index < humans,
            leader,
            science_points: 0,
            culture_points: 0,
            researched_tech_ids: Vec::new(),
            researching: None,
            research_queue: Vec::new(),
        });
    }
    players
}

fn suitable_spawn_biome(biome: BiomeType) -> bool {
    matches!(
        biome,
        BiomeType::Grassland | BiomeType::Forest | BiomeType::Desert | BiomeType::Tundra
    )
}

/// Spawn each player a warrior and a settler on suitable terrain, keeping a
/// minimum separation between starts. All choices are index/id ordered, so
/// placement is a pure function of the map.
fn spawn_initial_units(draft: &mut GameState) {
    let width = draft.map.width;
    let height = draft.map.height;
    let min_distance = (width.min(height) / 4).max(4);
    let player_ids: Vec<String> = draft.players.iter().map(|p| p.id.clone()).collect();
    let mut used: Vec<hex::HexCoord> = Vec::new();

    for (index, player_id) in player_ids.iter().enumerate() {
        let pad = 2i32;
        let preferred_q = if index % 2 == 0 {
            pad
        } else {
            (width as i32 - pad - 1).max(pad)
        };
        let preferred_r = if index < 2 {
            pad
        } else {
            (height as i32 - pad - 1).max(pad)
        };
        let preferred = hex::HexCoord::new(preferred_q, preferred_r);

        // Nearest suitable tile to the preferred corner that keeps its
        // distance from earlier spawns; grassland/forest score best.
        let choice = draft
            .map
            .tiles
            .iter()
            .filter(|t| suitable_spawn_biome(t.biome))
            .filter(|t| used.iter().all(|u| hex::distance(t.coord, *u) >= min_distance))
            .min_by_key(|t| {
                let terrain_penalty = match t.biome {
                    BiomeType::Grassland | BiomeType::Forest => 0,
                    _ => 2,
                };
                (hex::distance(t.coord, preferred) + terrain_penalty, t.id.clone())
            })
            .or_else(|| {
                draft
                    .map
                    .tiles
                    .iter()
                    .filter(|t| suitable_spawn_biome(t.biome))
                    .min_by_key(|t| (hex::distance(t.coord, preferred), t.id.clone()))
            });
        let Some(tile) = choice else { continue };
        let tile_id = tile.id.clone();
        let coord = tile.coord;
        used.push(coord);

        if let Some(map_tile) = draft.map.tiles.iter_mut().find(|t| t.id == tile_id) {
            if !map_tile.explored_by.contains(player_id) {
                map_tile.explored_by.push(player_id.clone());
            }
        }

        let Some(ext) = draft.content_ext.as_mut() else { continue };
        let warrior_id = format!("u_{player_id}_warrior");
        let settler_id = format!("u_{player_id}_settler");
        for (unit_id, type_id) in [(&warrior_id, "warrior"), (&settler_id, "settler")] {
            let Some(def) = content::unit_type(type_id) else { continue };
            ext.units.insert(
                unit_id.clone(),
                crate::game::state::Unit {
                    id: unit_id.clone(),
                    unit_type: type_id.to_string(),
                    category: def.category,
                    owner_id: player_id.clone(),
                    location: tile_id.clone(),
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
        }
        if let Some(ext_tile) = ext.tiles.get_mut(&tile_id) {
            ext_tile.occupant_unit_id = Some(warrior_id);
        }
    }
}

/// INIT: generate the world in place, keeping existing players (two default
/// seats are created on an empty lobby) and entering the in-game state.
pub(super) fn init(
    draft: &mut GameState,
    seed: Option<&str>,
    width: Option<u32>,
    height: Option<u32>,
) {
    let seed = seed.map(|s| s.to_string()).unwrap_or_else(|| draft.seed.clone());
    let width = width.unwrap_or(draft.map.width).max(1);
    let height = height.unwrap_or(draft.map.height).max(1);

    let (tiles, rng) = generate_world(WorldSeed::Text(&seed), width, height);
    draft.seed = seed.clone();
    draft.map.width = width;
    draft.map.height = height;
    draft.map.tiles = tiles;
    draft.rng_state = Some(rng);

    if draft.players.is_empty() {
        draft.players = build_players(&seed, 2, 1, None);
    }

    let ext = draft.content_ext.get_or_insert_with(|| ContentExt {
        techs: content::default_technologies(),
        civics: content::default_civics(),
        ..ContentExt::default()
    });
    populate_extension_tiles(ext, &draft.map.tiles);
    for player in &draft.players {
        ext.player_state_mut(&player.id);
    }
    spawn_initial_units(draft);

    draft.push_log("turn:start", Some(json!({ "turn": draft.turn })));
}

/// NEW_GAME: full reset with configured seats, then the same world setup as
/// INIT.
#[allow(clippy::too_many_arguments)]
pub(super) fn new_game(
    draft: &mut GameState,
    seed: Option<&str>,
    width: Option<u32>,
    height: Option<u32>,
    total_players: u32,
    human_players: Option<u32>,
    selected_leaders: Option<&[String]>,
) {
    let seed = seed.map(|s| s.to_string()).unwrap_or_else(|| draft.seed.clone());
    let width = width.unwrap_or(draft.map.width).max(1);
    let height = height.unwrap_or(draft.map.height).max(1);

    draft.turn = 0;
    draft.seed = seed.clone();
    draft.ui = UiState::default();
    draft.log.clear();

    let (tiles, rng) = generate_world(WorldSeed::Text(&seed), width, height);
    draft.map.width = width;
    draft.map.height = height;
    draft.map.tiles = tiles;
    draft.rng_state = Some(rng);

    let total = total_players.clamp(1, 6);
    let humans = human_players.unwrap_or(1).min(total);
    draft.players = build_players(&seed, total, humans, selected_leaders);

    let mut ext = ContentExt {
        techs: content::default_technologies(),
        civics: content::default_civics(),
        ..ContentExt::default()
    };
    populate_extension_tiles(&mut ext, &draft.map.tiles);
    for player in &draft.players {
        ext.player_state_mut(&player.id);
    }
    draft.content_ext = Some(ext);
    spawn_initial_units(draft);

    draft.push_log("game:new", Some(json!({ "seed": draft.seed })));
}

/// AUTO_SIM_TOGGLE: set or flip the autoplay flag.
pub(super) fn auto_sim_toggle(draft: &mut GameState, enabled: Option<bool>) {
    draft.auto_sim = enabled.unwrap_or(!draft.auto_sim);
}

/// LOG_EVENT: append a caller-supplied entry under the retention cap.
pub(super) fn log_event(draft: &mut GameState, entry: &GameLogEntry) {
    draft.log.push(entry.clone());
    if draft.log.len() > crate::game::state::LOG_CAP {
        let excess = draft.log.len() - crate::game::state::LOG_CAP;
        draft.log.drain(..excess);
    }
}

// =============================================================================
// TESTS
// =============================================================================
