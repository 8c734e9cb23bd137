//! UI Handlers
//!
//! Selection, panels, path previews and move execution. Selection mirrors
//! into the volatile `Selected` unit flag for badge rendering; that flag is
//! masked out of persistence, so none of this perturbs replay hashes except
//! through the genuine simulation effects of ISSUE_MOVE.

use crate::game::pathfind::{self, PathResult};
use crate::game::reducer::world;
use crate::game::state::{GameState, UnitFlags};

fn clear_selected_flags(draft: &mut GameState) {
    if let Some(ext) = draft.content_ext.as_mut() {
        for unit in ext.units.values_mut() {
            unit.flags.remove(UnitFlags::SELECTED);
        }
    }
}

/// SELECT_UNIT: set the selection and mirror the flag.
pub(super) fn select_unit(draft: &mut GameState, unit_id: Option<&str>) {
    clear_selected_flags(draft);
    draft.ui.selected_unit_id = None;
    draft.ui.preview_path = None;
    draft.ui.preview_combat = None;

    let Some(unit_id) = unit_id else { return };
    let Some(ext) = draft.content_ext.as_mut() else { return };
    let Some(unit) = ext.units.get_mut(unit_id) else { return };
    unit.flags.insert(UnitFlags::SELECTED);
    draft.ui.selected_unit_id = Some(unit_id.to_string());
}

/// CANCEL_SELECTION: drop selection and previews.
pub(super) fn cancel_selection(draft: &mut GameState) {
    clear_selected_flags(draft);
    draft.ui.selected_unit_id = None;
    draft.ui.preview_path = None;
    draft.ui.preview_combat = None;
}

/// OPEN_CITY_PANEL.
pub(super) fn open_city_panel(draft: &mut GameState, city_id: &str) {
    let exists = draft
        .content_ext
        .as_ref()
        .is_some_and(|ext| ext.cities.contains_key(city_id));
    if !exists {
        return;
    }
    draft.ui.open_panels.city_panel = Some(city_id.to_string());
    draft.ui.selected_city_id = Some(city_id.to_string());
}

/// CLOSE_CITY_PANEL.
pub(super) fn close_city_panel(draft: &mut GameState) {
    draft.ui.open_panels.city_panel = None;
    draft.ui.selected_city_id = None;
}

/// OPEN/CLOSE_RESEARCH_PANEL.
pub(super) fn set_research_panel(draft: &mut GameState, open: bool) {
    draft.ui.open_panels.research_panel = open;
}

/// PREVIEW_PATH: compute and store the overlay path for the acting unit.
pub(super) fn preview_path(draft: &mut GameState, unit_id: Option<&str>, target_tile_id: &str) {
    let unit_id = unit_id
        .map(|u| u.to_string())
        .or_else(|| draft.ui.selected_unit_id.clone());
    let (Some(unit_id), Some(ext)) = (unit_id, draft.content_ext.as_ref()) else {
        draft.ui.preview_path = None;
        draft.ui.preview_combat = None;
        return;
    };
    match pathfind::compute_path(ext, &unit_id, target_tile_id, draft.map.width, draft.map.height)
    {
        PathResult::Found { path, contact, .. } => {
            draft.ui.preview_path = Some(path);
            draft.ui.preview_combat = contact;
        }
        PathResult::Unreachable => {
            draft.ui.preview_path = None;
            draft.ui.preview_combat = None;
        }
    }
}

/// ISSUE_MOVE: walk the acting unit along a path, stopping at enemy contact
/// unless combat was confirmed, then clear previews.
pub(super) fn issue_move(
    draft: &mut GameState,
    unit_id: Option<&str>,
    path: &[String],
    confirm_combat: bool,
) {
    let unit_id = unit_id
        .map(|u| u.to_string())
        .or_else(|| draft.ui.selected_unit_id.clone());
    let Some(unit_id) = unit_id else {
        cancel_selection(draft);
        return;
    };
    if path.is_empty() {
        return;
    }
    world::walk_path(draft, &unit_id, path, confirm_combat);
    draft.ui.preview_path = None;
    draft.ui.preview_combat = None;
}

// =============================================================================
// TESTS
// =============================================================================
