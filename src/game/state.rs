//! Game State Definitions
//!
//! Every type that participates in the persisted snapshot. Keyed collections
//! use `BTreeMap` so iteration order is deterministic; serde field names
//! follow the camelCase snapshot contract. States are treated as immutable
//! generations: the reducer clones and returns, it never mutates a caller's
//! value in place.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{Deserializer, Error as DeError};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::core::rng::RngState;
use crate::game::hex::HexCoord;

/// Player identifier (e.g. `"P1"`).
pub type PlayerId = String;
/// Tile identifier (`"q,r"`).
pub type TileId = String;
/// Unit identifier (e.g. `"u_P1_warrior"`).
pub type UnitId = String;
/// City identifier (e.g. `"c_P2_1"`).
pub type CityId = String;
/// Technology identifier.
pub type TechId = String;
/// Civic identifier.
pub type CivicId = String;

/// Snapshot schema version; bump when the serialized shape changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Maximum retained log entries.
pub const LOG_CAP: usize = 50;

// =============================================================================
// BASE MAP
// =============================================================================

/// Biome of a base-map tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiomeType {
    /// Open grassland.
    #[serde(rename = "grass")]
    Grassland,
    /// Desert.
    #[serde(rename = "desert")]
    Desert,
    /// Forest.
    #[serde(rename = "forest")]
    Forest,
    /// Impassable mountain.
    #[serde(rename = "mountain")]
    Mountain,
    /// Open ocean.
    #[serde(rename = "ocean")]
    Ocean,
    /// Tundra.
    #[serde(rename = "tundra")]
    Tundra,
    /// Polar ice.
    #[serde(rename = "ice")]
    Ice,
}

/// A single tile of the base map.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    /// Stable id, always `"q,r"` of the coordinate.
    pub id: TileId,
    /// Axial position.
    pub coord: HexCoord,
    /// Biome.
    pub biome: BiomeType,
    /// Elevation in `[0, 1)`.
    pub elevation: f64,
    /// Moisture in `[0, 1)`.
    pub moisture: f64,
    /// Players that have explored this tile.
    pub explored_by: Vec<PlayerId>,
}

/// The base map: dimensions plus the ordered tile list (row-major).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapState {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Tiles in row-major order; empty while in the menu state.
    pub tiles: Vec<Tile>,
}

// =============================================================================
// PLAYERS
// =============================================================================

/// Leader personality weights steering the AI evaluator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderPersonality {
    /// Leader id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Aggression weight in `[0, 1]`.
    pub aggression: f64,
    /// Science focus weight in `[0, 1]`.
    pub science_focus: f64,
    /// Culture focus weight in `[0, 1]`.
    pub culture_focus: f64,
    /// Expansion weight in `[0, 1]`.
    pub expansionism: f64,
    /// Flavor note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_note: Option<String>,
    /// Preferred victory conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_victory: Option<Vec<String>>,
}

/// Which prerequisite tree a tech node belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechTree {
    /// Science tree, advanced by science points.
    Science,
    /// Culture tree, advanced by culture points.
    Culture,
}

/// A node in the shared research catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TechNode {
    /// Node id.
    pub id: TechId,
    /// Owning tree.
    pub tree: TechTree,
    /// Display name.
    pub name: String,
    /// Research cost in points.
    pub cost: u32,
    /// Prerequisite node ids; must form a DAG.
    pub prerequisites: Vec<TechId>,
    /// Effect tags.
    #[serde(default)]
    pub effects: Vec<String>,
}

/// An in-progress research entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchProgress {
    /// Target tech id.
    pub tech_id: TechId,
    /// Accumulated points; never exceeds the target's cost.
    pub progress: u32,
}

/// Per-player base state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Player id.
    pub id: PlayerId,
    /// Human-controlled flag; false means the AI evaluator drives this seat.
    pub is_human: bool,
    /// Leader personality.
    pub leader: LeaderPersonality,
    /// Science points earned per turn.
    pub science_points: u32,
    /// Culture points earned per turn.
    pub culture_points: u32,
    /// Completed research ids.
    pub researched_tech_ids: Vec<TechId>,
    /// Current research, if any.
    #[serde(default)]
    pub researching: Option<ResearchProgress>,
    /// Techs queued to research after the current one completes.
    #[serde(default)]
    pub research_queue: Vec<TechId>,
}

// =============================================================================
// LOG, UI, MODE
// =============================================================================

/// A bounded in-state log entry. Carries the turn index only; the core never
/// reads wall-clock time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameLogEntry {
    /// Turn the entry was recorded on.
    pub turn: u32,
    /// Entry type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional structured payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// What kind of thing a combat preview targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatTargetKind {
    /// An enemy unit.
    Unit,
    /// An enemy city.
    City,
}

/// The defender identified by a path preview.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatTarget {
    /// Target kind.
    pub kind: CombatTargetKind,
    /// Target entity id.
    pub id: String,
    /// Owning player.
    pub owner_id: PlayerId,
}

/// Combat contact reported by `PREVIEW_PATH`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatPreview {
    /// Tile where contact happens.
    pub tile_id: TileId,
    /// Attacking unit.
    pub attacker_unit_id: UnitId,
    /// Defender, when one is present.
    pub defender: Option<CombatTarget>,
    /// Whether executing the move requires combat confirmation.
    pub requires_confirm: bool,
}

/// Which optional panels the UI has open.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPanels {
    /// City panel target, when open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_panel: Option<CityId>,
    /// Research panel visibility.
    #[serde(default)]
    pub research_panel: bool,
}

/// UI-facing transient state (selection and previews). Part of the snapshot,
/// but it never influences simulation outcomes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    /// Currently selected unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_unit_id: Option<UnitId>,
    /// Currently selected city.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_city_id: Option<CityId>,
    /// Path preview for the selected unit (start-exclusive tile ids).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_path: Option<Vec<TileId>>,
    /// Combat contact on the previewed path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_combat: Option<CombatPreview>,
    /// Open panels.
    #[serde(default)]
    pub open_panels: OpenPanels,
}

/// Simulation mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Normal interactive play.
    #[serde(rename = "standard")]
    Standard,
    /// Pure AI simulation.
    #[serde(rename = "ai-sim")]
    AiSim,
}

// =============================================================================
// CONTENT EXTENSION
// =============================================================================

/// Biome of an extension tile (richer than the base palette).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtBiome {
    /// Deep ocean.
    Ocean,
    /// Coastal water.
    Coast,
    /// Plains.
    Plains,
    /// Grassland.
    Grassland,
    /// Desert.
    Desert,
    /// Tundra.
    Tundra,
    /// Snow.
    Snow,
    /// Forest.
    Forest,
    /// Jungle.
    Jungle,
    /// Hills.
    Hills,
    /// Mountain.
    Mountain,
}

/// A tile in the content extension layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hextile {
    /// Stable id, `"q,r"`.
    pub id: TileId,
    /// Column.
    pub q: i32,
    /// Row.
    pub r: i32,
    /// Biome.
    pub biome: ExtBiome,
    /// Elevation in `[0, 1)`.
    #[serde(default)]
    pub elevation: f64,
    /// Terrain features (forest, jungle, ...).
    #[serde(default)]
    pub features: Vec<String>,
    /// Built improvements (farm, mine, road, ...).
    #[serde(default)]
    pub improvements: Vec<String>,
    /// Occupying unit, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupant_unit_id: Option<UnitId>,
    /// Occupying city, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupant_city_id: Option<CityId>,
}

impl Hextile {
    /// Axial coordinate of this tile.
    pub fn coord(&self) -> HexCoord {
        HexCoord::new(self.q, self.r)
    }
}

/// Broad combat role of a unit type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    /// Close combat.
    Melee,
    /// Attacks without taking counter-damage.
    Ranged,
    /// Fast scouting.
    Recon,
    /// Water domain.
    Naval,
    /// Non-combatant (settlers, workers).
    Civilian,
}

// =============================================================================
// UNIT FLAGS
// =============================================================================

/// Concurrently active unit states as a closed fixed-width bitset.
///
/// The `Selected` bit is view state: it participates in runtime queries but
/// is masked out of serialization, so snapshots and hashes never carry it.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitFlags(u8);

impl UnitFlags {
    /// Unit is idle and available for orders.
    pub const IDLE: u8 = 0x01;
    /// Unit has finished moving this turn.
    pub const MOVED: u8 = 0x02;
    /// Unit is fortified.
    pub const FORTIFIED: u8 = 0x04;
    /// Land unit embarked on water.
    pub const EMBARKED: u8 = 0x08;
    /// Unit is selected in the UI (volatile, never persisted).
    pub const SELECTED: u8 = 0x10;

    const PERSISTED_MASK: u8 = Self::IDLE | Self::MOVED | Self::FORTIFIED | Self::EMBARKED;

    /// Empty flag set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Flag set containing only `flag`.
    pub const fn only(flag: u8) -> Self {
        Self(flag)
    }

    /// Whether every bit of `flag` is set.
    #[inline]
    pub const fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    /// Set the given bits.
    #[inline]
    pub fn insert(&mut self, flag: u8) {
        self.0 |= flag;
    }

    /// Clear the given bits.
    #[inline]
    pub fn remove(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    /// Raw bits (persisted bits only).
    pub const fn persisted_bits(self) -> u8 {
        self.0 & Self::PERSISTED_MASK
    }
}

impl fmt::Debug for UnitFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::IDLE, "idle"),
            (Self::MOVED, "moved"),
            (Self::FORTIFIED, "fortified"),
            (Self::EMBARKED, "embarked"),
            (Self::SELECTED, "selected"),
        ]
        .iter()
        .filter(|(bit, _)| self.contains(*bit))
        .map(|(_, name)| *name)
        .collect();
        write!(f, "UnitFlags({})", names.join("|"))
    }
}

impl Serialize for UnitFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.persisted_bits())
    }
}

impl<'de> Deserialize<'de> for UnitFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        if bits & !Self::PERSISTED_MASK != 0 {
            return Err(D::Error::custom("unknown unit flag bits"));
        }
        Ok(UnitFlags(bits))
    }
}

/// A unit on the map.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// Unit id.
    pub id: UnitId,
    /// Registry key of the unit type.
    #[serde(rename = "type")]
    pub unit_type: String,
    /// Combat role.
    pub category: UnitCategory,
    /// Owning player.
    pub owner_id: PlayerId,
    /// Tile the unit stands on; always resolves to an existing tile.
    pub location: TileId,
    /// Hit points, 0..=100.
    pub hp: u32,
    /// Movement allowance per turn.
    pub movement: u32,
    /// Movement left this turn.
    pub movement_remaining: u32,
    /// Attack strength.
    pub attack: u32,
    /// Defense strength.
    pub defense: u32,
    /// Sight radius.
    pub sight: u32,
    /// Active state flags.
    #[serde(default)]
    pub flags: UnitFlags,
    /// Ability tags (e.g. `canTraverseMountains`).
    #[serde(default)]
    pub abilities: Vec<String>,
}

/// What a production order builds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductionKind {
    /// A new unit, spawned at the city tile.
    Unit,
    /// A city building.
    Building,
    /// A tile improvement.
    Improvement,
}

/// One entry of a city production queue.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionOrder {
    /// What is being built.
    #[serde(rename = "type")]
    pub kind: ProductionKind,
    /// Registry key of the item.
    pub item: String,
    /// Turns left until completion; ticks down on END_TURN.
    pub turns_remaining: u32,
    /// Target tile for improvements (defaults to the city tile).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_tile: Option<TileId>,
}

/// A city.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    /// City id.
    pub id: CityId,
    /// Display name.
    pub name: String,
    /// Owning player.
    pub owner_id: PlayerId,
    /// Tile the city occupies.
    pub location: TileId,
    /// Population.
    pub population: u32,
    /// Ordered production queue (insertion order is preserved).
    #[serde(default)]
    pub production_queue: Vec<ProductionOrder>,
    /// Tiles worked for yields.
    #[serde(default)]
    pub tiles_worked: Vec<TileId>,
    /// Garrisoned units.
    #[serde(default)]
    pub garrison_unit_ids: Vec<UnitId>,
    /// Happiness.
    #[serde(default)]
    pub happiness: i32,
    /// Built buildings.
    #[serde(default)]
    pub buildings: Vec<String>,
}

/// What a tech or civic unlocks on completion.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UnlockSet {
    /// Unit type keys.
    #[serde(default)]
    pub units: Vec<String>,
    /// Improvement keys.
    #[serde(default)]
    pub improvements: Vec<String>,
    /// Ability tags.
    #[serde(default)]
    pub abilities: Vec<String>,
    /// Building keys.
    #[serde(default)]
    pub buildings: Vec<String>,
}

/// A technology in the extension catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Technology {
    /// Tech id.
    pub id: TechId,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Research cost.
    pub cost: u32,
    /// Prerequisite tech ids; must form a DAG.
    pub prerequisites: Vec<TechId>,
    /// Unlocks.
    #[serde(default)]
    pub unlocks: UnlockSet,
}

/// A civic in the extension catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Civic {
    /// Civic id.
    pub id: CivicId,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Culture cost.
    pub cost: u32,
    /// Prerequisite civic ids; must form a DAG.
    pub prerequisites: Vec<CivicId>,
    /// Unlocks.
    #[serde(default)]
    pub unlocks: UnlockSet,
}

/// In-progress civic study.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CivicProgress {
    /// Target civic id.
    pub civic_id: CivicId,
    /// Accumulated culture; never exceeds the target's cost.
    pub progress: u32,
}

/// Per-player progression state inside the content extension.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerContentState {
    /// Completed extension techs.
    #[serde(default)]
    pub researched_techs: Vec<TechId>,
    /// Completed civics.
    #[serde(default)]
    pub researched_civics: Vec<CivicId>,
    /// Unit types available to build.
    #[serde(default)]
    pub available_units: Vec<String>,
    /// Improvements available to build.
    #[serde(default)]
    pub available_improvements: Vec<String>,
    /// Science per turn, recomputed from cities at end of turn.
    #[serde(default)]
    pub science: u32,
    /// Culture per turn, recomputed from cities at end of turn.
    #[serde(default)]
    pub culture: u32,
    /// In-progress tech research.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research: Option<ResearchProgress>,
    /// In-progress civic study.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culture_research: Option<CivicProgress>,
}

/// The richer simulation layer: indexed entities plus per-player progression.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentExt {
    /// Extension tiles by id.
    pub tiles: BTreeMap<TileId, Hextile>,
    /// Units by id.
    pub units: BTreeMap<UnitId, Unit>,
    /// Cities by id.
    pub cities: BTreeMap<CityId, City>,
    /// Technology catalog by id.
    pub techs: BTreeMap<TechId, Technology>,
    /// Civic catalog by id.
    pub civics: BTreeMap<CivicId, Civic>,
    /// Per-player progression.
    pub player_states: BTreeMap<PlayerId, PlayerContentState>,
    /// Monotonic counter for spawned unit ids.
    #[serde(default)]
    pub next_unit_serial: u32,
    /// Monotonic counter for founded city ids.
    #[serde(default)]
    pub next_city_serial: u32,
}

impl ContentExt {
    /// Fetch or create the progression record for a player.
    pub fn player_state_mut(&mut self, player_id: &str) -> &mut PlayerContentState {
        self.player_states
            .entry(player_id.to_string())
            .or_default()
    }
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Complete state of a game.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Snapshot schema version.
    pub schema_version: u32,
    /// World seed string.
    pub seed: String,
    /// Current turn counter.
    pub turn: u32,
    /// Base map.
    pub map: MapState,
    /// Players in seat order.
    pub players: Vec<PlayerState>,
    /// Shared research catalog.
    pub tech_catalog: Vec<TechNode>,
    /// Carried RNG state (absent until the world is generated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_state: Option<RngState>,
    /// Bounded event log.
    pub log: Vec<GameLogEntry>,
    /// Simulation mode.
    pub mode: GameMode,
    /// Autoplay flag (the driving loop lives outside the core).
    pub auto_sim: bool,
    /// UI-facing transient state.
    pub ui: UiState,
    /// Optional content extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_ext: Option<ContentExt>,
}

impl GameState {
    /// The menu/uninitialized state: default dimensions, no tiles, no
    /// players. Only INIT / NEW_GAME / LOAD_STATE do anything here.
    pub fn initial() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            seed: "default".to_string(),
            turn: 0,
            map: MapState {
                width: crate::game::worldgen::DEFAULT_MAP_SIZE.0,
                height: crate::game::worldgen::DEFAULT_MAP_SIZE.1,
                tiles: Vec::new(),
            },
            players: Vec::new(),
            tech_catalog: crate::game::content::default_tech_catalog(),
            rng_state: None,
            log: Vec::new(),
            mode: GameMode::Standard,
            auto_sim: false,
            ui: UiState::default(),
            content_ext: Some(ContentExt {
                techs: crate::game::content::default_technologies(),
                civics: crate::game::content::default_civics(),
                ..ContentExt::default()
            }),
        }
    }

    /// Whether the one-way transition into the in-game state has happened.
    pub fn in_game(&self) -> bool {
        !self.map.tiles.is_empty()
    }

    /// Append a log entry, trimming to the retention cap.
    pub fn push_log(&mut self, kind: &str, payload: Option<serde_json::Value>) {
        self.log.push(GameLogEntry {
            turn: self.turn,
            kind: kind.to_string(),
            payload,
        });
        if self.log.len() > LOG_CAP {
            let excess = self.log.len() - LOG_CAP;
            self.log.drain(..excess);
        }
    }

    /// Look up a player by id.
    pub fn player(&self, id: &str) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Look up a player mutably by id.
    pub fn player_mut(&mut self, id: &str) -> Option<&mut PlayerState> {
        self.players.iter_mut().find(|p| p.id == id)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_flags_bit_ops() {
        let mut flags = UnitFlags::empty();
        assert!(!flags.contains(UnitFlags::IDLE));

        flags.insert(UnitFlags::IDLE);
        flags.insert(UnitFlags::FORTIFIED);
        assert!(flags.contains(UnitFlags::IDLE));
        assert!(flags.contains(UnitFlags::FORTIFIED));
        assert!(!flags.contains(UnitFlags::MOVED));

        flags.remove(UnitFlags::IDLE);
        assert!(!flags.contains(UnitFlags::IDLE));
        assert!(flags.contains(UnitFlags::FORTIFIED));
    }

    #[test]
    fn test_selected_flag_never_serializes() {
        let mut flags = UnitFlags::only(UnitFlags::IDLE);
        flags.insert(UnitFlags::SELECTED);

        let json = serde_json::to_string(&flags).unwrap();
        let back: UnitFlags = serde_json::from_str(&json).unwrap();
        assert!(back.contains(UnitFlags::IDLE));
        assert!(!back.contains(UnitFlags::SELECTED));
    }

    #[test]
    fn test_unknown_flag_bits_rejected() {
        assert!(serde_json::from_str::<UnitFlags>("64").is_err());
    }

    #[test]
    fn test_log_cap() {
        let mut state = GameState::initial();
        for i in 0..(LOG_CAP + 10) {
            state.push_log("tick", Some(serde_json::json!({ "i": i })));
        }
        assert_eq!(state.log.len(), LOG_CAP);
        // Oldest entries were dropped.
        assert_eq!(state.log[0].payload, Some(serde_json::json!({ "i": 10 })));
    }

    #[test]
    fn test_initial_state_is_menu() {
        let state = GameState::initial();
        assert!(!state.in_game());
        assert!(state.players.is_empty());
        assert!(!state.tech_catalog.is_empty());
    }

    #[test]
    fn test_btreemap_iteration_is_sorted() {
        let mut ext = ContentExt::default();
        for id in ["u_9", "u_1", "u_5"] {
            ext.units.insert(
                id.to_string(),
                Unit {
                    id: id.to_string(),
                    unit_type: "warrior".to_string(),
                    category: UnitCategory::Melee,
                    owner_id: "P1".to_string(),
                    location: "0,0".to_string(),
                    hp: 100,
                    movement: 2,
                    movement_remaining: 2,
                    attack: 6,
                    defense: 4,
                    sight: 2,
                    flags: UnitFlags::empty(),
                    abilities: Vec::new(),
                },
            );
        }
        let ids: Vec<&String> = ext.units.keys().collect();
        assert_eq!(ids, vec!["u_1", "u_5", "u_9"]);
    }

    #[test]
    fn test_snapshot_keys_are_camel_case() {
        let state = GameState::initial();
        let value = serde_json::to_value(&state).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "schemaVersion",
            "seed",
            "turn",
            "map",
            "players",
            "techCatalog",
            "log",
            "mode",
            "autoSim",
            "ui",
            "contentExt",
        ] {
            assert!(obj.contains_key(key), "missing snapshot key {key}");
        }
    }
}
