//! AI Turn Evaluator
//!
//! `evaluate_ai` reads the visible state for one non-human player and
//! returns a short action batch: research choices weighted by the leader
//! personality, production for idle cities, and bounded exploration steps
//! for idle units. Every choice is ordered by (score, id) or (distance,
//! id), so the batch is a pure function of the state; there is no
//! randomness here at all.

use crate::game::action::{Action, ProductionRequest};
use crate::game::content;
use crate::game::hex;
use crate::game::pathfind;
use crate::game::rules;
use crate::game::state::{GameState, PlayerState, ProductionKind, TechNode, TechTree, UnitFlags};

/// How many research entries the AI keeps queued ahead.
const RESEARCH_QUEUE_DEPTH: usize = 3;

/// How many idle units get exploration orders per turn.
const EXPLORATION_ORDERS_PER_TURN: usize = 2;

/// Score a tech for a player: cheaper techs in the leader's focus tree rank
/// higher, with an expansionism bonus for movement-flavored effects.
fn score_tech(player: &PlayerState, tech: &TechNode) -> f64 {
    let leader = &player.leader;
    let focus = match tech.tree {
        TechTree::Science => leader.science_focus,
        TechTree::Culture => leader.culture_focus,
    };
    let mut score = focus * (50.0 / f64::from(tech.cost.max(1)));
    score += tech.effects.len() as f64 * 10.0;
    if tech
        .effects
        .iter()
        .any(|e| e.contains("movement") || e.contains("expansion"))
    {
        score += leader.expansionism * 20.0;
    }
    score
}

fn available_techs<'a>(player: &PlayerState, state: &'a GameState) -> Vec<&'a TechNode> {
    state
        .tech_catalog
        .iter()
        .filter(|tech| {
            !player.researched_tech_ids.contains(&tech.id)
                && player
                    .researching
                    .as_ref()
                    .is_none_or(|r| r.tech_id != tech.id)
                && !player.research_queue.contains(&tech.id)
                && tech
                    .prerequisites
                    .iter()
                    .all(|p| player.researched_tech_ids.contains(p))
        })
        .collect()
}

/// Pick the next research target in the leader's preferred tree.
fn choose_next_tech<'a>(player: &PlayerState, state: &'a GameState) -> Option<&'a TechNode> {
    let preferred = if player.leader.science_focus >= player.leader.culture_focus {
        TechTree::Science
    } else {
        TechTree::Culture
    };
    let candidates = available_techs(player, state);
    candidates
        .iter()
        .find(|t| t.tree == preferred)
        .or_else(|| candidates.first())
        .copied()
}

fn research_actions(player: &PlayerState, state: &GameState) -> Vec<Action> {
    let mut actions = Vec::new();
    if player.researching.is_none() {
        if let Some(tech) = choose_next_tech(player, state) {
            actions.push(Action::SetResearch {
                player_id: player.id.clone(),
                tech_id: tech.id.clone(),
            });
        }
    }
    if player.research_queue.is_empty() {
        // Rank remaining candidates; ties fall back to catalog order, which
        // is itself fixed.
        let mut scored: Vec<(&TechNode, f64)> = available_techs(player, state)
            .into_iter()
            .map(|t| (t, score_tech(player, t)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        for (tech, _) in scored.into_iter().take(RESEARCH_QUEUE_DEPTH) {
            actions.push(Action::QueueResearch {
                player_id: player.id.clone(),
                tech_id: tech.id.clone(),
            });
        }
    }
    actions
}

fn production_actions(player: &PlayerState, state: &GameState) -> Vec<Action> {
    let Some(ext) = state.content_ext.as_ref() else { return Vec::new() };
    let mut actions = Vec::new();
    for city in ext
        .cities
        .values()
        .filter(|c| c.owner_id == player.id && c.production_queue.is_empty())
    {
        let expansionism = player.leader.expansionism;
        let unit_item = if expansionism > 0.6 {
            Some("settler")
        } else if expansionism > 0.3 {
            Some("warrior")
        } else {
            None
        };
        if let Some(item) = unit_item {
            actions.push(Action::ChooseProductionItem {
                city_id: city.id.clone(),
                order: ProductionRequest {
                    kind: ProductionKind::Unit,
                    item: item.to_string(),
                    turns_remaining: None,
                    target_tile: None,
                },
            });
        }
        actions.push(Action::ChooseProductionItem {
            city_id: city.id.clone(),
            order: ProductionRequest {
                kind: ProductionKind::Improvement,
                item: "farm".to_string(),
                turns_remaining: None,
                target_tile: None,
            },
        });
    }
    actions
}

/// Step idle units toward the nearest unexplored tile, one adjacent move
/// each. Targets and steps are chosen by (distance, id), never randomly.
fn exploration_actions(player: &PlayerState, state: &GameState) -> Vec<Action> {
    let Some(ext) = state.content_ext.as_ref() else { return Vec::new() };
    let mut actions = Vec::new();

    let idle_units: Vec<_> = ext
        .units
        .values()
        .filter(|u| {
            u.owner_id == player.id
                && u.flags.contains(UnitFlags::IDLE)
                && !u.flags.contains(UnitFlags::FORTIFIED)
                && u.movement_remaining > 0
        })
        .take(EXPLORATION_ORDERS_PER_TURN)
        .collect();

    for unit in idle_units {
        let Some(def) = content::unit_type(&unit.unit_type) else { continue };
        let Some(here) = ext.tiles.get(&unit.location) else { continue };

        // Nearest passable tile this player has not explored yet.
        let target = state
            .map
            .tiles
            .iter()
            .filter(|t| !t.explored_by.contains(&player.id))
            .filter_map(|t| ext.tiles.get(&t.id))
            .filter(|t| rules::passable(t, unit, def))
            .min_by_key(|t| (hex::distance(here.coord(), t.coord()), t.id.clone()));
        let Some(target) = target else { continue };

        match pathfind::compute_path(ext, &unit.id, &target.id, state.map.width, state.map.height)
        {
            pathfind::PathResult::Found { path, .. } if !path.is_empty() => {
                actions.push(Action::ExtMoveUnit {
                    unit_id: unit.id.clone(),
                    tile_id: path[0].clone(),
                });
            }
            _ => {}
        }
    }
    actions
}

/// Produce the deterministic action batch for one non-human player.
///
/// An empty batch is valid: the turn simply advances with no AI activity.
pub fn evaluate_ai(state: &GameState, player_id: &str) -> Vec<Action> {
    let Some(player) = state.player(player_id) else { return Vec::new() };
    if player.is_human {
        return Vec::new();
    }
    let mut actions = research_actions(player, state);

    // Extension research: keep the content-layer lab busy too.
    if let Some(ext) = state.content_ext.as_ref() {
        if let Some(content_state) = ext.player_states.get(player_id) {
            if content_state.research.is_none() {
                let next = ext.techs.values().find(|t| {
                    !content_state.researched_techs.contains(&t.id)
                        && t.prerequisites
                            .iter()
                            .all(|p| content_state.researched_techs.contains(p))
                });
                if let Some(tech) = next {
                    actions.push(Action::ExtBeginResearch {
                        player_id: player_id.to_string(),
                        tech_id: tech.id.clone(),
                    });
                }
            }
        }
    }

    actions.extend(production_actions(player, state));
    actions.extend(exploration_actions(player, state));
    actions
}

// =============================================================================
// TESTS
// =============================================================================
