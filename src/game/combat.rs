//! Combat Resolution
//!
//! Explicit, RNG-threaded resolution for attacks on enemy units and cities.
//! All arithmetic is integer; the only nondeterminism budget is two draws
//! from the shared RNG thread (attacker roll first, defender roll second),
//! so a recorded log replays to the identical outcome.

use crate::core::rng::{next_int, RngState};
use crate::game::state::{ContentExt, UnitCategory, UnitFlags};

/// Variance bound for combat rolls, in percent.
const VARIANCE_PERCENT: u32 = 25;

/// Base damage of an even exchange.
const BASE_DAMAGE: u32 = 30;

/// Fortification defense bonus: x1.5.
const FORTIFY_NUM: u64 = 3;
const FORTIFY_DEN: u64 = 2;

/// What happened in one resolved combat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombatOutcome {
    /// Damage dealt to the defender.
    pub damage_to_defender: u32,
    /// Damage dealt to the attacker (0 for ranged attacks).
    pub damage_to_attacker: u32,
    /// Defender unit died or city fell.
    pub defender_killed: bool,
    /// Attacker died in the exchange.
    pub attacker_killed: bool,
    /// Attacker advanced into the target tile.
    pub advanced: bool,
    /// A city changed owners.
    pub city_captured: bool,
}

fn unit_strength(attack_or_defense: u32, hp: u32, fortified: bool) -> u64 {
    let base = u64::from(attack_or_defense) * u64::from(100 + hp) / 2;
    if fortified {
        base * FORTIFY_NUM / FORTIFY_DEN
    } else {
        base
    }
}

fn damage(attacker_eff: u64, defender_eff: u64) -> u32 {
    if defender_eff == 0 {
        return 100;
    }
    let raw = u64::from(BASE_DAMAGE) * attacker_eff / defender_eff;
    raw.clamp(5, 100) as u32
}

/// Resolve an attack by `attacker_id` against the occupant of `target_tile`.
///
/// Preconditions (attacker exists, has movement, an enemy is present) are
/// the caller's responsibility to have checked as action validation; when
/// they do not hold this returns `(rng, None)` and touches nothing.
pub fn resolve_combat(
    ext: &mut ContentExt,
    rng: RngState,
    attacker_id: &str,
    target_tile: &str,
) -> (RngState, Option<CombatOutcome>) {
    let Some(attacker) = ext.units.get(attacker_id) else {
        return (rng, None);
    };
    if attacker.movement_remaining == 0 || attacker.category == UnitCategory::Civilian {
        return (rng, None);
    }
    let Some(tile) = ext.tiles.get(target_tile) else {
        return (rng, None);
    };
    let attacker_owner = attacker.owner_id.clone();

    // Identify the defender: garrison unit first, then bare city, then unit.
    let defender_unit_id = tile.occupant_unit_id.clone().filter(|uid| {
        ext.units
            .get(uid)
            .is_some_and(|u| u.owner_id != attacker_owner)
    });
    let defender_city_id = tile.occupant_city_id.clone().filter(|cid| {
        ext.cities
            .get(cid)
            .is_some_and(|c| c.owner_id != attacker_owner)
    });
    if defender_unit_id.is_none() && defender_city_id.is_none() {
        return (rng, None);
    }

    // Draw order is part of the replay contract: attacker first.
    let (rng, attacker_roll) = next_int(rng, VARIANCE_PERCENT);
    let (rng, defender_roll) = next_int(rng, VARIANCE_PERCENT);

    let Some(attacker) = ext.units.get(attacker_id) else {
        return (rng, None);
    };
    let attacker_ranged = attacker.category == UnitCategory::Ranged;
    let atk_str = unit_strength(attacker.attack, attacker.hp, false);

    let def_str = match defender_unit_id.as_ref().and_then(|uid| ext.units.get(uid)) {
        Some(defender) => unit_strength(
            defender.defense,
            defender.hp,
            defender.flags.contains(UnitFlags::FORTIFIED),
        ),
        // An ungarrisoned city defends with a fixed baseline, doubled by walls.
        None => {
            let city_id = defender_city_id.as_deref().unwrap_or_default();
            let walls = ext
                .cities
                .get(city_id)
                .is_some_and(|c| c.buildings.iter().any(|b| b == "walls"));
            if walls {
                800
            } else {
                400
            }
        }
    };

    let atk_eff = atk_str * u64::from(100 + attacker_roll) / 100;
    let def_eff = def_str * u64::from(100 + defender_roll) / 100;
    let damage_to_defender = damage(atk_eff, def_eff);
    let damage_to_attacker = if attacker_ranged { 0 } else { damage(def_eff, atk_eff) };

    let mut outcome = CombatOutcome {
        damage_to_defender,
        damage_to_attacker,
        defender_killed: false,
        attacker_killed: false,
        advanced: false,
        city_captured: false,
    };

    // Apply damage to the defender.
    if let Some(uid) = &defender_unit_id {
        let mut killed = false;
        if let Some(defender) = ext.units.get_mut(uid) {
            defender.hp = defender.hp.saturating_sub(damage_to_defender);
            killed = defender.hp == 0;
        }
        if killed {
            outcome.defender_killed = true;
            ext.units.remove(uid);
            if let Some(t) = ext.tiles.get_mut(target_tile) {
                if t.occupant_unit_id.as_deref() == Some(uid.as_str()) {
                    t.occupant_unit_id = None;
                }
            }
            for city in ext.cities.values_mut() {
                city.garrison_unit_ids.retain(|g| g != uid);
            }
        }
    } else if defender_city_id.is_some() && !attacker_ranged {
        // No garrison: a surviving melee attacker captures the city outright.
        outcome.defender_killed = true;
        outcome.city_captured = true;
    }

    // Counter-damage to the attacker.
    let mut attacker_dead = false;
    let mut attacker_location = None;
    if let Some(attacker) = ext.units.get_mut(attacker_id) {
        attacker.hp = attacker.hp.saturating_sub(damage_to_attacker);
        attacker.flags.remove(UnitFlags::IDLE);
        attacker.flags.remove(UnitFlags::FORTIFIED);
        attacker.movement_remaining = 0;
        attacker.flags.insert(UnitFlags::MOVED);
        attacker_dead = attacker.hp == 0;
        attacker_location = Some(attacker.location.clone());
    }
    if attacker_dead {
        outcome.attacker_killed = true;
        ext.units.remove(attacker_id);
        if let Some(t) = attacker_location.and_then(|loc| ext.tiles.get_mut(&loc)) {
            if t.occupant_unit_id.as_deref() == Some(attacker_id) {
                t.occupant_unit_id = None;
            }
        }
        for city in ext.cities.values_mut() {
            city.garrison_unit_ids.retain(|g| g != attacker_id);
        }
    }

    // Capture and advance.
    if outcome.city_captured && !outcome.attacker_killed {
        if let Some(cid) = &defender_city_id {
            if let Some(city) = ext.cities.get_mut(cid) {
                city.owner_id = attacker_owner.clone();
                city.garrison_unit_ids.clear();
            }
        }
    }
    if outcome.defender_killed && !outcome.attacker_killed && !attacker_ranged {
        let from = ext
            .units
            .get(attacker_id)
            .map(|u| u.location.clone())
            .unwrap_or_default();
        if let Some(t) = ext.tiles.get_mut(&from) {
            if t.occupant_unit_id.as_deref() == Some(attacker_id) {
                t.occupant_unit_id = None;
            }
        }
        if let Some(t) = ext.tiles.get_mut(target_tile) {
            if t.occupant_city_id.is_none() {
                t.occupant_unit_id = Some(attacker_id.to_string());
            }
        }
        if let Some(attacker) = ext.units.get_mut(attacker_id) {
            attacker.location = target_tile.to_string();
        }
        outcome.advanced = true;
    }

    (rng, Some(outcome))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::seed_from;
    use crate::game::hex::HexCoord;
    use crate::game::state::{City, ExtBiome, Hextile, Unit};

    fn tile(q: i32, r: i32) -> Hextile {
        let coord = HexCoord::new(q, r);
        Hextile {
            id: coord.tile_id(),
            q,
            r,
            biome: ExtBiome::Grassland,
            elevation: 0.4,
            features: Vec::new(),
            improvements: Vec::new(),
            occupant_unit_id: None,
            occupant_city_id: None,
        }
    }

    fn unit(id: &str, owner: &str, location: &str, attack: u32, defense: u32) -> Unit {
        Unit {
            id: id.to_string(),
            unit_type: "warrior".to_string(),
            category: UnitCategory::Melee,
            owner_id: owner.to_string(),
            location: location.to_string(),
            hp: 100,
            movement: 2,
            movement_remaining: 2,
            attack,
            defense,
            sight: 2,
            flags: UnitFlags::only(UnitFlags::IDLE),
            abilities: Vec::new(),
        }
    }

    fn arena() -> ContentExt {
        let mut ext = ContentExt::default();
        for q in 0..3 {
            let t = tile(q, 0);
            ext.tiles.insert(t.id.clone(), t);
        }
        ext.units.insert("a".to_string(), unit("a", "P1", "0,0", 8, 4));
        ext.units.insert("d".to_string(), unit("d", "P2", "1,0", 6, 4));
        ext.tiles.get_mut("0,0").unwrap().occupant_unit_id = Some("a".to_string());
        ext.tiles.get_mut("1,0").unwrap().occupant_unit_id = Some("d".to_string());
        ext
    }

    #[test]
    fn test_combat_is_deterministic() {
        let run = || {
            let mut ext = arena();
            let (rng, outcome) = resolve_combat(&mut ext, seed_from("battle"), "a", "1,0");
            (rng, outcome)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_combat_damages_both_sides() {
        let mut ext = arena();
        let (_, outcome) = resolve_combat(&mut ext, seed_from("battle"), "a", "1,0");
        let outcome = outcome.expect("combat resolves");
        assert!(outcome.damage_to_defender >= 5);
        assert!(outcome.damage_to_attacker >= 5);
        // The attack consumed the attacker's turn.
        if let Some(attacker) = ext.units.get("a") {
            assert_eq!(attacker.movement_remaining, 0);
            assert!(attacker.flags.contains(UnitFlags::MOVED));
        }
    }

    #[test]
    fn test_no_enemy_means_no_combat() {
        let mut ext = arena();
        let rng = seed_from("battle");
        let (out_rng, outcome) = resolve_combat(&mut ext, rng, "a", "2,0");
        assert!(outcome.is_none());
        // A no-op consumes no RNG draws.
        assert_eq!(out_rng, rng);
    }

    #[test]
    fn test_civilian_cannot_attack() {
        let mut ext = arena();
        ext.units.get_mut("a").unwrap().category = UnitCategory::Civilian;
        let (_, outcome) = resolve_combat(&mut ext, seed_from("battle"), "a", "1,0");
        assert!(outcome.is_none());
    }

    #[test]
    fn test_kill_advances_attacker() {
        let mut ext = arena();
        // A one-hp defender dies to any roll.
        ext.units.get_mut("d").unwrap().hp = 1;
        ext.units.get_mut("d").unwrap().defense = 0;
        let (_, outcome) = resolve_combat(&mut ext, seed_from("battle"), "a", "1,0");
        let outcome = outcome.expect("combat resolves");
        assert!(outcome.defender_killed);
        assert!(outcome.advanced);
        assert!(!ext.units.contains_key("d"));
        assert_eq!(ext.units["a"].location, "1,0");
        assert_eq!(ext.tiles["1,0"].occupant_unit_id.as_deref(), Some("a"));
        assert_eq!(ext.tiles["0,0"].occupant_unit_id, None);
    }

    #[test]
    fn test_fortified_defender_takes_less_damage() {
        let baseline = {
            let mut ext = arena();
            let (_, o) = resolve_combat(&mut ext, seed_from("battle"), "a", "1,0");
            o.expect("resolves").damage_to_defender
        };
        let fortified = {
            let mut ext = arena();
            ext.units
                .get_mut("d")
                .unwrap()
                .flags
                .insert(UnitFlags::FORTIFIED);
            let (_, o) = resolve_combat(&mut ext, seed_from("battle"), "a", "1,0");
            o.expect("resolves").damage_to_defender
        };
        assert!(fortified <= baseline);
    }

    #[test]
    fn test_ranged_attacker_takes_no_counter_damage() {
        let mut ext = arena();
        ext.units.get_mut("a").unwrap().category = UnitCategory::Ranged;
        let (_, outcome) = resolve_combat(&mut ext, seed_from("battle"), "a", "1,0");
        let outcome = outcome.expect("combat resolves");
        assert_eq!(outcome.damage_to_attacker, 0);
        assert_eq!(ext.units["a"].hp, 100);
    }

    #[test]
    fn test_ungarrisoned_city_captured_by_melee() {
        let mut ext = arena();
        ext.units.remove("d");
        ext.tiles.get_mut("1,0").unwrap().occupant_unit_id = None;
        ext.cities.insert(
            "c1".to_string(),
            City {
                id: "c1".to_string(),
                name: "Border Town".to_string(),
                owner_id: "P2".to_string(),
                location: "1,0".to_string(),
                population: 1,
                production_queue: Vec::new(),
                tiles_worked: vec!["1,0".to_string()],
                garrison_unit_ids: Vec::new(),
                happiness: 0,
                buildings: Vec::new(),
            },
        );
        ext.tiles.get_mut("1,0").unwrap().occupant_city_id = Some("c1".to_string());

        let (_, outcome) = resolve_combat(&mut ext, seed_from("siege"), "a", "1,0");
        let outcome = outcome.expect("combat resolves");
        assert!(outcome.city_captured);
        assert_eq!(ext.cities["c1"].owner_id, "P1");
    }
}
