//! The State Reducer
//!
//! `apply_action` is the single entry point of the simulation: a pure
//! function from `(state, action)` to the next state. Precondition failures
//! are silent no-ops so a malformed or late UI event can never corrupt the
//! simulation. Submodules mirror the action families: lifecycle, ui,
//! player, world, turn.

mod lifecycle;
mod player;
mod turn;
mod ui;
mod world;

use crate::game::action::Action;
use crate::game::state::GameState;

/// Apply one action, returning the next state generation.
///
/// The input is never mutated; callers may keep old generations for undo or
/// replay snapshots.
pub fn apply_action(state: &GameState, action: &Action) -> GameState {
    // LOAD_STATE replaces the state wholesale.
    if let Action::LoadState { state: loaded } = action {
        return (**loaded).clone();
    }
    let mut draft = state.clone();
    dispatch(&mut draft, action);
    draft
}

/// Route an action into its handler. Also used by the turn handler to apply
/// AI-generated sub-actions, so batches stay inside one generation.
pub(crate) fn dispatch(draft: &mut GameState, action: &Action) {
    // Two coarse machine states: until a map exists, only the lifecycle
    // transitions do anything.
    if !draft.in_game() {
        match action {
            Action::Init { .. } | Action::NewGame { .. } => {}
            _ => return,
        }
    }

    match action {
        Action::LoadState { .. } => {} // handled in apply_action
        Action::Unknown => {}          // forward-compatible ignore

        // Lifecycle
        Action::Init { seed, width, height } => {
            lifecycle::init(draft, seed.as_deref(), *width, *height)
        }
        Action::NewGame {
            seed,
            width,
            height,
            total_players,
            human_players,
            selected_leaders,
        } => lifecycle::new_game(
            draft,
            seed.as_deref(),
            *width,
            *height,
            *total_players,
            *human_players,
            selected_leaders.as_deref(),
        ),
        Action::AutoSimToggle { enabled } => lifecycle::auto_sim_toggle(draft, *enabled),
        Action::LogEvent { entry } => lifecycle::log_event(draft, entry),

        // Turn
        Action::EndTurn => turn::end_turn(draft),

        // UI
        Action::SelectUnit { unit_id } => ui::select_unit(draft, unit_id.as_deref()),
        Action::CancelSelection => ui::cancel_selection(draft),
        Action::PreviewPath { unit_id, target_tile_id } => {
            ui::preview_path(draft, unit_id.as_deref(), target_tile_id)
        }
        Action::IssueMove { unit_id, path, confirm_combat } => {
            ui::issue_move(draft, unit_id.as_deref(), path, *confirm_combat)
        }
        Action::OpenCityPanel { city_id } => ui::open_city_panel(draft, city_id),
        Action::CloseCityPanel => ui::close_city_panel(draft),
        Action::OpenResearchPanel => ui::set_research_panel(draft, true),
        Action::CloseResearchPanel => ui::set_research_panel(draft, false),

        // Player progression
        Action::SetResearch { player_id, tech_id } => {
            player::set_research(draft, player_id, tech_id)
        }
        Action::AdvanceResearch { player_id, points } => {
            player::advance_research(draft, player_id, *points)
        }
        Action::QueueResearch { player_id, tech_id } => {
            player::queue_research(draft, player_id, tech_id)
        }
        Action::ChooseProductionItem { city_id, order } => {
            player::choose_production_item(draft, city_id, order)
        }
        Action::ReorderProductionQueue { city_id, from, to } => {
            player::reorder_production_queue(draft, city_id, *from, *to)
        }
        Action::CancelProductionOrder { city_id, index } => {
            player::cancel_production_order(draft, city_id, *index)
        }
        Action::SetPlayerScores { players } => player::set_player_scores(draft, players),

        // World / extension
        Action::ExtAddTile { tile } => world::ext_add_tile(draft, tile),
        Action::ExtAddUnit { unit_id, unit_type, owner_id, tile_id } => {
            world::ext_add_unit(draft, unit_id, unit_type, owner_id, tile_id.as_deref())
        }
        Action::ExtAddCity { city_id, name, owner_id, tile_id } => {
            world::ext_add_city(draft, city_id, name.as_deref(), owner_id, tile_id.as_deref())
        }
        Action::ExtFoundCity { unit_id, tile_id, city_id, name } => world::ext_found_city(
            draft,
            unit_id,
            tile_id.as_deref(),
            city_id.as_deref(),
            name.as_deref(),
        ),
        Action::ExtMoveUnit { unit_id, tile_id } => {
            world::ext_move_unit(draft, unit_id, tile_id)
        }
        Action::ExtIssueMovePath { unit_id, path, confirm_combat } => {
            world::walk_path(draft, unit_id, path, *confirm_combat);
        }
        Action::ExtBeginResearch { player_id, tech_id } => {
            world::ext_begin_research(draft, player_id, tech_id)
        }
        Action::ExtBeginCivic { player_id, civic_id } => {
            world::ext_begin_civic(draft, player_id, civic_id)
        }
        Action::SetTileImprovement { tile_id, improvement_id } => {
            world::set_tile_improvement(draft, tile_id, improvement_id)
        }
        Action::RemoveTileImprovement { tile_id, improvement_id } => {
            world::remove_tile_improvement(draft, tile_id, improvement_id)
        }
        Action::AddUnitFlag { unit_id, state } => {
            world::add_unit_flag(draft, unit_id, *state)
        }
        Action::RemoveUnitFlag { unit_id, state } => {
            world::remove_unit_flag(draft, unit_id, *state)
        }
        Action::FortifyUnit { unit_id } => world::fortify_unit(draft, unit_id),
        Action::RemoveUnit { unit_id } => world::remove_unit(draft, unit_id),
        Action::RemoveBuilding { city_id, building_id } => {
            world::remove_building(draft, city_id, building_id)
        }
        Action::ResolveCombat { attacker_unit_id, target_tile_id } => {
            world::resolve_combat_action(draft, attacker_unit_id, target_tile_id)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::hash_state;

    fn init_action(seed: &str, width: u32, height: u32) -> Action {
        Action::Init {
            seed: Some(seed.to_string()),
            width: Some(width),
            height: Some(height),
        }
    }

    #[test]
    fn test_apply_action_leaves_input_untouched() {
        let state = GameState::initial();
        let before = hash_state(&state);
        let next = apply_action(&state, &init_action("immutability", 6, 6));
        assert_eq!(hash_state(&state), before);
        assert_ne!(hash_state(&next), before);
    }

    #[test]
    fn test_menu_state_ignores_game_actions() {
        let state = GameState::initial();
        let before = hash_state(&state);
        for action in [
            Action::EndTurn,
            Action::CancelSelection,
            Action::FortifyUnit { unit_id: "u1".to_string() },
            Action::AutoSimToggle { enabled: Some(true) },
        ] {
            let next = apply_action(&state, &action);
            assert_eq!(hash_state(&next), before, "{action:?} acted in menu state");
        }
    }

    #[test]
    fn test_unknown_action_is_noop_in_game() {
        let state = apply_action(&GameState::initial(), &init_action("noop", 6, 6));
        let next = apply_action(&state, &Action::Unknown);
        assert_eq!(hash_state(&next), hash_state(&state));
    }

    #[test]
    fn test_init_transitions_to_in_game() {
        let state = apply_action(&GameState::initial(), &init_action("transition", 8, 8));
        assert!(state.in_game());
        assert_eq!(state.map.tiles.len(), 64);
        assert_eq!(state.seed, "transition");
        assert!(state.rng_state.is_some());
        assert!(!state.players.is_empty());
    }

    #[test]
    fn test_load_state_replaces_wholesale() {
        let loaded = apply_action(&GameState::initial(), &init_action("loaded", 6, 6));
        let state = GameState::initial();
        let next = apply_action(
            &state,
            &Action::LoadState { state: Box::new(loaded.clone()) },
        );
        assert_eq!(hash_state(&next), hash_state(&loaded));
    }

    #[test]
    fn test_same_action_sequence_same_hash() {
        let actions = [
            init_action("rep-seed", 10, 10),
            Action::EndTurn,
            Action::EndTurn,
        ];
        let run = || {
            let mut state = GameState::initial();
            for action in &actions {
                state = apply_action(&state, action);
            }
            hash_state(&state)
        };
        assert_eq!(run(), run());
    }
}
