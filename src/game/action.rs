//! Game Actions
//!
//! The closed, tagged action vocabulary. An action is a pure value; the
//! reducer is the only code that interprets one. The wire form is
//! `{"type": "...", "payload": {...}}`; unknown tags deserialize to
//! [`Action::Unknown`], which the reducer treats as a forward-compatible
//! no-op rather than an error.

use serde::{Deserialize, Serialize};

use crate::game::state::{
    CityId, GameLogEntry, GameState, PlayerId, ProductionKind, TechId, TileId, UnitId,
};

/// Flag names accepted by ADD_UNIT_FLAG / REMOVE_UNIT_FLAG.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitFlagName {
    /// Idle and awaiting orders.
    Idle,
    /// Finished moving this turn.
    Moved,
    /// Fortified in place.
    Fortified,
    /// Embarked on water.
    Embarked,
    /// Selected in the UI.
    Selected,
}

/// A production request as carried by CHOOSE_PRODUCTION_ITEM; the reducer
/// resolves the turn count from cost and city yield when absent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRequest {
    /// What to build.
    #[serde(rename = "type")]
    pub kind: ProductionKind,
    /// Registry key.
    pub item: String,
    /// Explicit turn count; computed when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turns_remaining: Option<u32>,
    /// Target tile for improvements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_tile: Option<TileId>,
}

/// Per-player score assignment for SET_PLAYER_SCORES.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerScore {
    /// Player id.
    pub id: PlayerId,
    /// Science per turn.
    pub science_points: u32,
    /// Culture per turn.
    pub culture_points: u32,
}

/// A tile description for EXT_ADD_TILE.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSpec {
    /// Tile id (`"q,r"`).
    pub id: TileId,
    /// Column.
    pub q: i32,
    /// Row.
    pub r: i32,
    /// Biome name; defaults to grassland when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biome: Option<crate::game::state::ExtBiome>,
}

/// The closed action set.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all_fields = "camelCase")]
pub enum Action {
    /// Generate the world and enter the in-game state.
    #[serde(rename = "INIT")]
    Init {
        /// Seed; keeps the current seed when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<String>,
        /// Map width.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        /// Map height.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
    },

    /// Reset everything and start a fresh game with configured players.
    #[serde(rename = "NEW_GAME")]
    NewGame {
        /// Seed; keeps the current seed when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<String>,
        /// Map width.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        /// Map height.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
        /// Total players (clamped to 1..=6).
        total_players: u32,
        /// Human seats (clamped to total).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        human_players: Option<u32>,
        /// Leader picks per seat; `"random"` or absent picks by seed hash.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selected_leaders: Option<Vec<String>>,
    },

    /// Replace the whole state with a loaded snapshot.
    #[serde(rename = "LOAD_STATE")]
    LoadState {
        /// The snapshot to install.
        state: Box<GameState>,
    },

    /// Advance the simulation one turn.
    #[serde(rename = "END_TURN")]
    EndTurn,

    /// Toggle (or set) autoplay.
    #[serde(rename = "AUTO_SIM_TOGGLE")]
    AutoSimToggle {
        /// Explicit value; toggles when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        enabled: Option<bool>,
    },

    /// Append a diagnostic entry to the bounded log.
    #[serde(rename = "LOG_EVENT")]
    LogEvent {
        /// The entry.
        entry: GameLogEntry,
    },

    // -------------------------------------------------------------------------
    // UI
    // -------------------------------------------------------------------------
    /// Select a unit (or clear with no id).
    #[serde(rename = "SELECT_UNIT")]
    SelectUnit {
        /// Unit to select.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit_id: Option<UnitId>,
    },

    /// Clear selection and previews.
    #[serde(rename = "CANCEL_SELECTION")]
    CancelSelection,

    /// Compute and store a path preview for overlay rendering.
    #[serde(rename = "PREVIEW_PATH")]
    PreviewPath {
        /// Moving unit; falls back to the selection.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit_id: Option<UnitId>,
        /// Target tile.
        target_tile_id: TileId,
    },

    /// Execute a move along a previewed path.
    #[serde(rename = "ISSUE_MOVE")]
    IssueMove {
        /// Moving unit; falls back to the selection.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit_id: Option<UnitId>,
        /// Start-exclusive tile path.
        path: Vec<TileId>,
        /// Resolve combat on enemy contact instead of stopping.
        #[serde(default)]
        confirm_combat: bool,
    },

    /// Open the city panel.
    #[serde(rename = "OPEN_CITY_PANEL")]
    OpenCityPanel {
        /// City shown in the panel.
        city_id: CityId,
    },

    /// Close the city panel.
    #[serde(rename = "CLOSE_CITY_PANEL")]
    CloseCityPanel,

    /// Open the research panel.
    #[serde(rename = "OPEN_RESEARCH_PANEL")]
    OpenResearchPanel,

    /// Close the research panel.
    #[serde(rename = "CLOSE_RESEARCH_PANEL")]
    CloseResearchPanel,

    // -------------------------------------------------------------------------
    // Player progression
    // -------------------------------------------------------------------------
    /// Start researching a catalog tech.
    #[serde(rename = "SET_RESEARCH")]
    SetResearch {
        /// Acting player.
        player_id: PlayerId,
        /// Target tech.
        tech_id: TechId,
    },

    /// Advance current research by points (or the player's science rate).
    #[serde(rename = "ADVANCE_RESEARCH")]
    AdvanceResearch {
        /// Acting player.
        player_id: PlayerId,
        /// Points to add; player rate when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        points: Option<u32>,
    },

    /// Append a tech to the research queue.
    #[serde(rename = "QUEUE_RESEARCH")]
    QueueResearch {
        /// Acting player.
        player_id: PlayerId,
        /// Tech to queue.
        tech_id: TechId,
    },

    /// Choose (or replace) the head of a city's production queue.
    #[serde(rename = "CHOOSE_PRODUCTION_ITEM", alias = "EXT_QUEUE_PRODUCTION")]
    ChooseProductionItem {
        /// Target city.
        city_id: CityId,
        /// Requested order.
        order: ProductionRequest,
    },

    /// Move a production order within the queue.
    #[serde(rename = "REORDER_PRODUCTION_QUEUE")]
    ReorderProductionQueue {
        /// Target city.
        city_id: CityId,
        /// Source index.
        from: usize,
        /// Destination index.
        to: usize,
    },

    /// Remove a production order from the queue.
    #[serde(rename = "CANCEL_PRODUCTION_ORDER")]
    CancelProductionOrder {
        /// Target city.
        city_id: CityId,
        /// Index to remove.
        index: usize,
    },

    /// Set per-turn science/culture rates for players.
    #[serde(rename = "SET_PLAYER_SCORES")]
    SetPlayerScores {
        /// New rates.
        players: Vec<PlayerScore>,
    },

    // -------------------------------------------------------------------------
    // World / content extension
    // -------------------------------------------------------------------------
    /// Insert a tile into the extension layer.
    #[serde(rename = "EXT_ADD_TILE")]
    ExtAddTile {
        /// Tile description.
        tile: TileSpec,
    },

    /// Insert a unit of a registered type.
    #[serde(rename = "EXT_ADD_UNIT")]
    ExtAddUnit {
        /// New unit id.
        unit_id: UnitId,
        /// Registry key.
        #[serde(rename = "type")]
        unit_type: String,
        /// Owning player.
        owner_id: PlayerId,
        /// Spawn tile.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tile_id: Option<TileId>,
    },

    /// Insert a city directly (scenario setup).
    #[serde(rename = "EXT_ADD_CITY")]
    ExtAddCity {
        /// New city id.
        city_id: CityId,
        /// Display name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Owning player.
        owner_id: PlayerId,
        /// City tile.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tile_id: Option<TileId>,
    },

    /// Found a city with a settler.
    #[serde(rename = "EXT_FOUND_CITY")]
    ExtFoundCity {
        /// Founding settler.
        unit_id: UnitId,
        /// Tile override; the settler's tile when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tile_id: Option<TileId>,
        /// City id override.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        city_id: Option<CityId>,
        /// Name override.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Move a unit one step, paying movement cost.
    #[serde(rename = "EXT_MOVE_UNIT")]
    ExtMoveUnit {
        /// Moving unit.
        unit_id: UnitId,
        /// Adjacent destination tile.
        tile_id: TileId,
    },

    /// Walk a unit along a tile path, stopping on enemy contact unless
    /// combat is confirmed.
    #[serde(rename = "EXT_ISSUE_MOVE_PATH")]
    ExtIssueMovePath {
        /// Moving unit.
        unit_id: UnitId,
        /// Start-exclusive tile path.
        path: Vec<TileId>,
        /// Resolve combat on contact.
        #[serde(default)]
        confirm_combat: bool,
    },

    /// Begin extension tech research for a player.
    #[serde(rename = "EXT_BEGIN_RESEARCH")]
    ExtBeginResearch {
        /// Acting player.
        player_id: PlayerId,
        /// Target tech.
        tech_id: TechId,
    },

    /// Begin civic study for a player.
    #[serde(rename = "EXT_BEGIN_CIVIC")]
    ExtBeginCivic {
        /// Acting player.
        player_id: PlayerId,
        /// Target civic.
        civic_id: String,
    },

    /// Place an improvement on a tile.
    #[serde(rename = "SET_TILE_IMPROVEMENT")]
    SetTileImprovement {
        /// Target tile.
        tile_id: TileId,
        /// Improvement key.
        improvement_id: String,
    },

    /// Remove an improvement from a tile.
    #[serde(rename = "REMOVE_TILE_IMPROVEMENT")]
    RemoveTileImprovement {
        /// Target tile.
        tile_id: TileId,
        /// Improvement key.
        improvement_id: String,
    },

    /// Add an active-state flag to a unit.
    #[serde(rename = "ADD_UNIT_STATE")]
    AddUnitFlag {
        /// Target unit.
        unit_id: UnitId,
        /// Flag to set.
        state: UnitFlagName,
    },

    /// Remove an active-state flag from a unit.
    #[serde(rename = "REMOVE_UNIT_STATE")]
    RemoveUnitFlag {
        /// Target unit.
        unit_id: UnitId,
        /// Flag to clear.
        state: UnitFlagName,
    },

    /// Fortify a unit in place.
    #[serde(rename = "FORTIFY_UNIT")]
    FortifyUnit {
        /// Target unit.
        unit_id: UnitId,
    },

    /// Remove a unit from play (explicit death/disband).
    #[serde(rename = "REMOVE_UNIT")]
    RemoveUnit {
        /// Target unit.
        unit_id: UnitId,
    },

    /// Destroy a city building (explicit demolition).
    #[serde(rename = "REMOVE_BUILDING")]
    RemoveBuilding {
        /// Target city.
        city_id: CityId,
        /// Building key.
        building_id: String,
    },

    /// Resolve an attack against the occupant of a tile.
    #[serde(rename = "RESOLVE_COMBAT")]
    ResolveCombat {
        /// Attacking unit.
        attacker_unit_id: UnitId,
        /// Tile under attack.
        target_tile_id: TileId,
    },

    /// Forward-compatible no-op for unrecognized tags.
    #[serde(other)]
    Unknown,
}

// =============================================================================
// TESTS
// =============================================================================
