//! Turn Advancement
//!
//! END_TURN runs the fixed pipeline: catalog research for every player,
//! content-extension upkeep (production, yields, research, movement reset),
//! then one deterministic AI batch per non-human seat, and finally the turn
//! counter. Every stage iterates players in seat order and entities in
//! id order, so the pipeline is a pure function of the state.

use serde_json::json;

use crate::game::ai;
use crate::game::reducer::{dispatch, player as player_reducer};
use crate::game::rules;
use crate::game::state::GameState;

/// END_TURN.
pub(super) fn end_turn(draft: &mut GameState) {
    // 1. Advance catalog research for every player by their current rates.
    let player_ids: Vec<String> = draft.players.iter().map(|p| p.id.clone()).collect();
    for player_id in &player_ids {
        let has_research = draft
            .player(player_id)
            .is_some_and(|p| p.researching.is_some());
        if has_research {
            player_reducer::advance_research(draft, player_id, None);
        }
    }

    // 2. Content extension upkeep.
    if let Some(ext) = draft.content_ext.as_mut() {
        // Recompute per-player science/culture rates from city yields.
        let mut rates: Vec<(String, u32, u32)> = Vec::new();
        for player_id in ext.player_states.keys() {
            let mut science = 0;
            let mut culture = 0;
            for city in ext.cities.values().filter(|c| &c.owner_id == player_id) {
                let y = rules::city_yield(ext, city);
                science += y.science;
                culture += y.culture;
            }
            rates.push((player_id.clone(), science, culture));
        }
        for (player_id, science, culture) in rates {
            let state = ext.player_state_mut(&player_id);
            if science > 0 {
                state.science = science;
            }
            if culture > 0 {
                state.culture = culture;
            }
        }

        // City production, in city-id order.
        let city_ids: Vec<String> = ext.cities.keys().cloned().collect();
        for city_id in &city_ids {
            rules::tick_city_production(ext, city_id);
        }

        // Extension research and civic study, in player-id order.
        let ext_players: Vec<String> = ext.player_states.keys().cloned().collect();
        for player_id in &ext_players {
            rules::tick_research(ext, player_id);
            rules::tick_civic(ext, player_id);
        }

        // Movement reset, Moved flag clearing, garrison healing.
        rules::refresh_units(ext);
    }

    // 3. One deterministic AI batch per non-human player, applied through
    //    the normal dispatch so AI obeys the same rules as everyone else.
    for player_id in &player_ids {
        let is_ai = draft.player(player_id).is_some_and(|p| !p.is_human);
        if !is_ai {
            continue;
        }
        let batch = ai::evaluate_ai(draft, player_id);
        for action in &batch {
            dispatch(draft, action);
        }
    }

    // 4. Advance the turn counter.
    draft.turn += 1;
    draft.push_log("turn:end", Some(json!({ "turn": draft.turn })));
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::game::action::{Action, ProductionRequest};
    use crate::game::reducer::apply_action;
    use crate::game::state::{
        ExtBiome, GameState, ProductionKind, ResearchProgress, UnitFlags,
    };

    fn init(seed: &str) -> GameState {
        apply_action(
            &GameState::initial(),
            &Action::Init {
                seed: Some(seed.to_string()),
                width: Some(10),
                height: Some(10),
            },
        )
    }

    /// A state with one human-owned city whose head order completes in one
    /// turn, on flat terrain.
    fn city_state() -> GameState {
        let mut state = init("turn-tests");
        state.players.truncate(1); // drop the AI seat for isolation
        {
            let ext = state.content_ext.as_mut().unwrap();
            ext.units.clear();
            for tile in ext.tiles.values_mut() {
                tile.biome = ExtBiome::Grassland;
                tile.occupant_unit_id = None;
                tile.occupant_city_id = None;
            }
        }
        let state = apply_action(
            &state,
            &Action::ExtAddCity {
                city_id: "c1".to_string(),
                name: None,
                owner_id: "P1".to_string(),
                tile_id: Some("5,5".to_string()),
            },
        );
        apply_action(
            &state,
            &Action::ChooseProductionItem {
                city_id: "c1".to_string(),
                order: ProductionRequest {
                    kind: ProductionKind::Unit,
                    item: "warrior".to_string(),
                    turns_remaining: Some(1),
                    target_tile: None,
                },
            },
        )
    }

    #[test]
    fn test_end_turn_increments_counter() {
        let state = init("counter");
        let state = apply_action(&state, &Action::EndTurn);
        assert_eq!(state.turn, 1);
        let state = apply_action(&state, &Action::EndTurn);
        assert_eq!(state.turn, 2);
    }

    #[test]
    fn test_production_completes_on_end_turn() {
        let state = city_state();
        let state = apply_action(&state, &Action::EndTurn);
        let ext = state.content_ext.as_ref().unwrap();
        // Head order is gone and the warrior stands at the city.
        assert!(ext.cities["c1"].production_queue.is_empty());
        let built: Vec<_> = ext
            .units
            .values()
            .filter(|u| u.unit_type == "warrior" && u.owner_id == "P1")
            .collect();
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].location, "5,5");
    }

    #[test]
    fn test_end_turn_clears_moved_and_restores_movement() {
        let mut state = init("movement");
        let human = state
            .players
            .iter()
            .find(|p| p.is_human)
            .map(|p| p.id.clone())
            .unwrap();
        {
            let ext = state.content_ext.as_mut().unwrap();
            let id = format!("u_{human}_warrior");
            let unit = ext.units.get_mut(&id).unwrap();
            unit.movement_remaining = 0;
            unit.flags.insert(UnitFlags::MOVED);
            unit.flags.remove(UnitFlags::IDLE);
        }
        let state = apply_action(&state, &Action::EndTurn);
        let ext = state.content_ext.as_ref().unwrap();
        // AI seats may spend movement again in their post-upkeep batch, so
        // only the human seat's units are guaranteed refreshed.
        for unit in ext.units.values().filter(|u| u.owner_id == human) {
            assert_eq!(unit.movement_remaining, unit.movement);
            assert!(!unit.flags.contains(UnitFlags::MOVED));
            assert!(unit.flags.contains(UnitFlags::IDLE));
        }
    }

    #[test]
    fn test_end_turn_advances_catalog_research() {
        let mut state = init("research");
        {
            let player = state.player_mut("P1").unwrap();
            player.science_points = 5;
            player.researching =
                Some(ResearchProgress { tech_id: "mining".to_string(), progress: 0 });
        }
        let state = apply_action(&state, &Action::EndTurn);
        let player = state.player("P1").unwrap();
        assert_eq!(player.researching.as_ref().map(|r| r.progress), Some(5));
    }

    #[test]
    fn test_ai_seat_acts_on_end_turn() {
        let state = init("ai-turn");
        let ai_seat = state
            .players
            .iter()
            .find(|p| !p.is_human)
            .map(|p| p.id.clone())
            .expect("default lobby has an AI seat");
        let state = apply_action(&state, &Action::EndTurn);
        // The AI picked a research target (its first idle-turn decision).
        let ai_player = state.player(&ai_seat).unwrap();
        let ext_state = state
            .content_ext
            .as_ref()
            .and_then(|e| e.player_states.get(&ai_seat));
        let acted = ai_player.researching.is_some()
            || ext_state.is_some_and(|s| s.research.is_some());
        assert!(acted, "AI seat did nothing on END_TURN");
    }

    #[test]
    fn test_two_turns_deterministic() {
        let run = || {
            let mut state = GameState::initial();
            for action in [
                Action::Init {
                    seed: Some("rep-seed".to_string()),
                    width: Some(10),
                    height: Some(10),
                },
                Action::EndTurn,
                Action::EndTurn,
            ] {
                state = apply_action(&state, &action);
            }
            crate::core::hash::hash_state(&state)
        };
        assert_eq!(run(), run());
    }
}
