//! Player Progression Handlers
//!
//! Research selection and queueing against the shared catalog, production
//! orders, and score assignment. Every handler validates its preconditions
//! and silently no-ops on violation.

use serde_json::json;

use crate::game::action::{PlayerScore, ProductionRequest};
use crate::game::content;
use crate::game::rules;
use crate::game::state::{GameState, ProductionOrder, ResearchProgress, TechTree};

/// SET_RESEARCH: begin a catalog tech when prerequisites are met.
pub(super) fn set_research(draft: &mut GameState, player_id: &str, tech_id: &str) {
    let Some(tech) = draft.tech_catalog.iter().find(|t| t.id == tech_id).cloned() else {
        return;
    };
    let Some(player) = draft.player_mut(player_id) else { return };
    if player.researched_tech_ids.iter().any(|t| t == tech_id) {
        return;
    }
    if !tech
        .prerequisites
        .iter()
        .all(|p| player.researched_tech_ids.contains(p))
    {
        return;
    }
    player.researching = Some(ResearchProgress { tech_id: tech_id.to_string(), progress: 0 });
}

/// ADVANCE_RESEARCH: add points (or the player's rate) to current research,
/// completing and auto-advancing from the queue when the cost is reached.
pub(super) fn advance_research(draft: &mut GameState, player_id: &str, points: Option<u32>) {
    let catalog = draft.tech_catalog.clone();
    let Some(player) = draft.player_mut(player_id) else { return };
    let Some(current) = player.researching.as_mut() else { return };
    let Some(tech) = catalog.iter().find(|t| t.id == current.tech_id) else {
        return;
    };

    let add = points.unwrap_or(match tech.tree {
        TechTree::Science => player.science_points,
        TechTree::Culture => player.culture_points,
    });
    current.progress = (current.progress + add).min(tech.cost);
    if current.progress < tech.cost {
        return;
    }

    let completed = tech.id.clone();
    player.researched_tech_ids.push(completed.clone());
    player.researching = None;

    // Auto-advance: first queued tech whose prerequisites are now met.
    while !player.research_queue.is_empty() {
        let next_id = player.research_queue.remove(0);
        let Some(next_tech) = catalog.iter().find(|t| t.id == next_id) else {
            continue;
        };
        if next_tech
            .prerequisites
            .iter()
            .all(|p| player.researched_tech_ids.contains(p))
        {
            player.researching =
                Some(ResearchProgress { tech_id: next_id, progress: 0 });
            break;
        }
    }

    let player_id = player_id.to_string();
    draft.push_log(
        "tech:unlocked",
        Some(json!({ "playerId": player_id, "techId": completed })),
    );
}

/// QUEUE_RESEARCH: append a tech to the research queue once.
pub(super) fn queue_research(draft: &mut GameState, player_id: &str, tech_id: &str) {
    if !draft.tech_catalog.iter().any(|t| t.id == tech_id) {
        return;
    }
    let Some(player) = draft.player_mut(player_id) else { return };
    if player.researched_tech_ids.iter().any(|t| t == tech_id) {
        return;
    }
    if player
        .researching
        .as_ref()
        .is_some_and(|r| r.tech_id == tech_id)
    {
        return;
    }
    if player.research_queue.iter().any(|t| t == tech_id) {
        return;
    }
    player.research_queue.push(tech_id.to_string());
}

/// CHOOSE_PRODUCTION_ITEM: install an order at the head of a city queue.
///
/// A missing turn count is resolved from the item cost and the city's
/// production yield. An existing head of the same kind is replaced in
/// place; otherwise the order is pushed to the front.
pub(super) fn choose_production_item(
    draft: &mut GameState,
    city_id: &str,
    request: &ProductionRequest,
) {
    let Some(ext) = draft.content_ext.as_mut() else { return };
    let Some(city) = ext.cities.get(city_id) else { return };

    let turns = match request.turns_remaining {
        Some(t) if t > 0 => t,
        _ => {
            let cost = content::item_cost(request.kind, &request.item);
            let per_turn = rules::city_yield(ext, city).production.max(1);
            cost.div_ceil(per_turn).max(1)
        }
    };
    let order = ProductionOrder {
        kind: request.kind,
        item: request.item.clone(),
        turns_remaining: turns,
        target_tile: request.target_tile.clone(),
    };

    let Some(city) = ext.cities.get_mut(city_id) else { return };
    match city.production_queue.first_mut() {
        Some(head) if head.kind == order.kind => *head = order.clone(),
        _ => city.production_queue.insert(0, order.clone()),
    }
    let city_id = city_id.to_string();
    draft.push_log(
        "production:queued",
        Some(json!({ "cityId": city_id, "item": order.item })),
    );
}

/// REORDER_PRODUCTION_QUEUE: move an order to a new position.
pub(super) fn reorder_production_queue(
    draft: &mut GameState,
    city_id: &str,
    from: usize,
    to: usize,
) {
    let Some(ext) = draft.content_ext.as_mut() else { return };
    let Some(city) = ext.cities.get_mut(city_id) else { return };
    if from >= city.production_queue.len() || to >= city.production_queue.len() {
        return;
    }
    let order = city.production_queue.remove(from);
    city.production_queue.insert(to, order);
}

/// CANCEL_PRODUCTION_ORDER: drop an order by index.
pub(super) fn cancel_production_order(draft: &mut GameState, city_id: &str, index: usize) {
    let Some(ext) = draft.content_ext.as_mut() else { return };
    let Some(city) = ext.cities.get_mut(city_id) else { return };
    if index >= city.production_queue.len() {
        return;
    }
    city.production_queue.remove(index);
}

/// SET_PLAYER_SCORES: assign per-turn rates.
pub(super) fn set_player_scores(draft: &mut GameState, scores: &[PlayerScore]) {
    for score in scores {
        if let Some(player) = draft.player_mut(&score.id) {
            player.science_points = score.science_points;
            player.culture_points = score.culture_points;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
