//! Typed Content Catalogs
//!
//! Static registries for unit types, improvements and buildings, the shipped
//! tech/civic catalogs, the leader roster, and prerequisite-graph validation.
//! The core only ever consumes these strongly typed structures; raw dynamic
//! content is a loader concern outside this crate.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::game::state::{
    Civic, LeaderPersonality, TechNode, TechTree, Technology, UnitCategory, UnlockSet,
};

/// Movement domain of a unit type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
    /// Moves on land; oceans require embarkation.
    Land,
    /// Moves on water.
    Naval,
}

/// Static definition of a unit type.
#[derive(Clone, Copy, Debug)]
pub struct UnitTypeDef {
    /// Registry key.
    pub id: &'static str,
    /// Movement domain.
    pub domain: Domain,
    /// Combat role.
    pub category: UnitCategory,
    /// Movement allowance.
    pub movement: u32,
    /// Attack strength.
    pub attack: u32,
    /// Defense strength.
    pub defense: u32,
    /// Sight radius.
    pub sight: u32,
    /// Starting hit points.
    pub hp: u32,
    /// Innate ability tags.
    pub abilities: &'static [&'static str],
    /// Production cost in turns at one production per turn.
    pub cost: u32,
}

/// Shipped unit types.
pub const UNIT_TYPES: &[UnitTypeDef] = &[
    UnitTypeDef {
        id: "worker",
        domain: Domain::Land,
        category: UnitCategory::Civilian,
        movement: 2,
        attack: 0,
        defense: 1,
        sight: 2,
        hp: 100,
        abilities: &[],
        cost: 2,
    },
    UnitTypeDef {
        id: "warrior",
        domain: Domain::Land,
        category: UnitCategory::Melee,
        movement: 2,
        attack: 6,
        defense: 4,
        sight: 2,
        hp: 100,
        abilities: &[],
        cost: 2,
    },
    UnitTypeDef {
        id: "settler",
        domain: Domain::Land,
        category: UnitCategory::Civilian,
        movement: 2,
        attack: 0,
        defense: 0,
        sight: 2,
        hp: 100,
        abilities: &[],
        cost: 3,
    },
    UnitTypeDef {
        id: "scout",
        domain: Domain::Land,
        category: UnitCategory::Recon,
        movement: 3,
        attack: 2,
        defense: 1,
        sight: 3,
        hp: 100,
        abilities: &[],
        cost: 2,
    },
    UnitTypeDef {
        id: "archer",
        domain: Domain::Land,
        category: UnitCategory::Ranged,
        movement: 2,
        attack: 5,
        defense: 2,
        sight: 2,
        hp: 100,
        abilities: &[],
        cost: 3,
    },
    UnitTypeDef {
        id: "galley",
        domain: Domain::Naval,
        category: UnitCategory::Naval,
        movement: 3,
        attack: 4,
        defense: 2,
        sight: 2,
        hp: 100,
        abilities: &[],
        cost: 3,
    },
];

/// Look up a unit type by registry key.
pub fn unit_type(id: &str) -> Option<&'static UnitTypeDef> {
    UNIT_TYPES.iter().find(|def| def.id == id)
}

/// Static definition of a tile improvement.
#[derive(Clone, Copy, Debug)]
pub struct ImprovementDef {
    /// Registry key.
    pub id: &'static str,
    /// Food yield.
    pub food: u32,
    /// Production yield.
    pub production: u32,
    /// Gold yield.
    pub gold: u32,
    /// Turns to build.
    pub build_time: u32,
}

/// Shipped improvements.
pub const IMPROVEMENTS: &[ImprovementDef] = &[
    ImprovementDef { id: "farm", food: 1, production: 0, gold: 0, build_time: 2 },
    ImprovementDef { id: "mine", food: 0, production: 2, gold: 0, build_time: 3 },
    ImprovementDef { id: "road", food: 0, production: 0, gold: 0, build_time: 1 },
];

/// Look up an improvement by registry key.
pub fn improvement(id: &str) -> Option<&'static ImprovementDef> {
    IMPROVEMENTS.iter().find(|def| def.id == id)
}

/// Static definition of a city building.
#[derive(Clone, Copy, Debug)]
pub struct BuildingDef {
    /// Registry key.
    pub id: &'static str,
    /// Production cost.
    pub cost: u32,
    /// Food yield.
    pub food: u32,
    /// Production yield.
    pub production: u32,
    /// Gold yield.
    pub gold: u32,
    /// Science yield.
    pub science: u32,
    /// Culture yield.
    pub culture: u32,
}

/// Shipped buildings.
pub const BUILDINGS: &[BuildingDef] = &[
    BuildingDef { id: "granary", cost: 60, food: 2, production: 0, gold: 0, science: 0, culture: 0 },
    BuildingDef { id: "library", cost: 80, food: 0, production: 0, gold: 0, science: 2, culture: 0 },
    BuildingDef { id: "monument", cost: 40, food: 0, production: 0, gold: 0, science: 0, culture: 1 },
    BuildingDef { id: "walls", cost: 70, food: 0, production: 1, gold: 0, science: 0, culture: 0 },
];

/// Look up a building by registry key.
pub fn building(id: &str) -> Option<&'static BuildingDef> {
    BUILDINGS.iter().find(|def| def.id == id)
}

/// Production cost of a queue item, by kind and registry key.
pub fn item_cost(kind: crate::game::state::ProductionKind, item: &str) -> u32 {
    use crate::game::state::ProductionKind;
    match kind {
        ProductionKind::Unit => unit_type(item).map(|d| d.cost * 20).unwrap_or(40),
        ProductionKind::Improvement => improvement(item).map(|d| d.build_time * 10).unwrap_or(20),
        ProductionKind::Building => building(item).map(|d| d.cost).unwrap_or(60),
    }
}

// =============================================================================
// CATALOGS
// =============================================================================

fn tech_node(
    id: &str,
    tree: TechTree,
    name: &str,
    cost: u32,
    prerequisites: &[&str],
) -> TechNode {
    TechNode {
        id: id.to_string(),
        tree,
        name: name.to_string(),
        cost,
        prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
        effects: Vec::new(),
    }
}

/// The shared research catalog (science + culture trees).
pub fn default_tech_catalog() -> Vec<TechNode> {
    vec![
        // Science tree (Ancient)
        tech_node("pottery", TechTree::Science, "Pottery", 20, &[]),
        tech_node("mining", TechTree::Science, "Mining", 25, &[]),
        tech_node("animal-husbandry", TechTree::Science, "Animal Husbandry", 25, &[]),
        tech_node("bronze-working", TechTree::Science, "Bronze Working", 35, &["mining"]),
        tech_node("sailing", TechTree::Science, "Sailing", 30, &[]),
        tech_node("writing", TechTree::Science, "Writing", 40, &["pottery"]),
        // Culture tree (civics-like)
        tech_node("folklore", TechTree::Culture, "Folklore", 20, &[]),
        tech_node("code-of-laws", TechTree::Culture, "Code of Laws", 25, &["folklore"]),
        tech_node("craftsmanship", TechTree::Culture, "Craftsmanship", 30, &["code-of-laws"]),
        tech_node("foreign-trade", TechTree::Culture, "Foreign Trade", 30, &["code-of-laws"]),
        tech_node("state-workforce", TechTree::Culture, "State Workforce", 35, &["craftsmanship"]),
        tech_node("early-empire", TechTree::Culture, "Early Empire", 35, &["foreign-trade"]),
    ]
}

fn technology(
    id: &str,
    name: &str,
    cost: u32,
    prerequisites: &[&str],
    unlocks: UnlockSet,
) -> (String, Technology) {
    (
        id.to_string(),
        Technology {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            cost,
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
            unlocks,
        },
    )
}

/// The extension technology catalog.
pub fn default_technologies() -> BTreeMap<String, Technology> {
    [
        technology(
            "agriculture",
            "Agriculture",
            6,
            &[],
            UnlockSet { improvements: vec!["farm".to_string()], ..UnlockSet::default() },
        ),
        technology(
            "mining",
            "Mining",
            8,
            &[],
            UnlockSet { improvements: vec!["mine".to_string()], ..UnlockSet::default() },
        ),
        technology(
            "wheel",
            "The Wheel",
            10,
            &["mining"],
            UnlockSet { improvements: vec!["road".to_string()], ..UnlockSet::default() },
        ),
        technology(
            "archery",
            "Archery",
            10,
            &["agriculture"],
            UnlockSet { units: vec!["archer".to_string()], ..UnlockSet::default() },
        ),
        technology(
            "writing",
            "Writing",
            12,
            &["agriculture"],
            UnlockSet { buildings: vec!["library".to_string()], ..UnlockSet::default() },
        ),
        technology(
            "sailing",
            "Sailing",
            12,
            &[],
            UnlockSet { units: vec!["galley".to_string()], ..UnlockSet::default() },
        ),
    ]
    .into_iter()
    .collect()
}

fn civic(
    id: &str,
    name: &str,
    cost: u32,
    prerequisites: &[&str],
    unlocks: UnlockSet,
) -> (String, Civic) {
    (
        id.to_string(),
        Civic {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            cost,
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
            unlocks,
        },
    )
}

/// The extension civic catalog.
pub fn default_civics() -> BTreeMap<String, Civic> {
    [
        civic(
            "folklore",
            "Folklore",
            6,
            &[],
            UnlockSet { buildings: vec!["monument".to_string()], ..UnlockSet::default() },
        ),
        civic(
            "code-of-laws",
            "Code of Laws",
            8,
            &["folklore"],
            UnlockSet { buildings: vec!["walls".to_string()], ..UnlockSet::default() },
        ),
        civic(
            "craftsmanship",
            "Craftsmanship",
            10,
            &["code-of-laws"],
            UnlockSet { improvements: vec!["mine".to_string()], ..UnlockSet::default() },
        ),
    ]
    .into_iter()
    .collect()
}

/// The shipped leader roster.
pub fn leaders() -> Vec<LeaderPersonality> {
    let leader = |id: &str, name: &str, aggression, science, culture, expansion| LeaderPersonality {
        id: id.to_string(),
        name: name.to_string(),
        aggression,
        science_focus: science,
        culture_focus: culture,
        expansionism: expansion,
        historical_note: None,
        preferred_victory: None,
    };
    vec![
        leader("scientist", "Scientist", 0.2, 0.8, 0.2, 0.3),
        leader("culturalist", "Culturalist", 0.2, 0.2, 0.8, 0.3),
        leader("expansionist", "Expansionist", 0.6, 0.3, 0.3, 0.8),
        leader("balanced", "Balanced", 0.4, 0.5, 0.5, 0.5),
    ]
}

// =============================================================================
// PREREQUISITE GRAPH VALIDATION
// =============================================================================

/// Structural content errors, fatal to the content set at load time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    /// The prerequisite graph contains a cycle.
    #[error("prerequisite cycle detected at {id}")]
    CycleDetected {
        /// Node where the cycle was found.
        id: String,
    },
}

/// Anything with an id and a prerequisite list.
pub trait PrereqNode {
    /// Node id.
    fn node_id(&self) -> &str;
    /// Prerequisite ids.
    fn prerequisites(&self) -> &[String];
}

impl PrereqNode for TechNode {
    fn node_id(&self) -> &str {
        &self.id
    }
    fn prerequisites(&self) -> &[String] {
        &self.prerequisites
    }
}

impl PrereqNode for Technology {
    fn node_id(&self) -> &str {
        &self.id
    }
    fn prerequisites(&self) -> &[String] {
        &self.prerequisites
    }
}

impl PrereqNode for Civic {
    fn node_id(&self) -> &str {
        &self.id
    }
    fn prerequisites(&self) -> &[String] {
        &self.prerequisites
    }
}

/// Verify that a prerequisite graph is a DAG.
///
/// Missing prerequisite ids are tolerated (a node may depend on content
/// shipped elsewhere); only cycles are structural errors.
pub fn validate_dag<'a, N, I>(nodes: I) -> Result<(), ContentError>
where
    N: PrereqNode + 'a,
    I: IntoIterator<Item = &'a N>,
{
    let graph: BTreeMap<&str, &[String]> = nodes
        .into_iter()
        .map(|n| (n.node_id(), n.prerequisites()))
        .collect();

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();

    // Iterative DFS; an edge back into an in-progress node is a cycle.
    for &start in graph.keys() {
        if marks.contains_key(start) {
            continue;
        }
        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        marks.insert(start, Mark::InProgress);
        while let Some((node, next_edge)) = stack.pop() {
            let deps = graph.get(node).copied().unwrap_or(&[]);
            if next_edge < deps.len() {
                stack.push((node, next_edge + 1));
                let dep = deps[next_edge].as_str();
                if !graph.contains_key(dep) {
                    continue;
                }
                match marks.get(dep) {
                    Some(Mark::InProgress) => {
                        return Err(ContentError::CycleDetected { id: dep.to_string() })
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(dep, Mark::InProgress);
                        stack.push((dep, 0));
                    }
                }
            } else {
                marks.insert(node, Mark::Done);
            }
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookups() {
        assert_eq!(unit_type("warrior").map(|d| d.attack), Some(6));
        assert_eq!(unit_type("galley").map(|d| d.domain), Some(Domain::Naval));
        assert!(unit_type("catapult").is_none());
        assert_eq!(improvement("farm").map(|d| d.food), Some(1));
        assert_eq!(building("library").map(|d| d.science), Some(2));
    }

    #[test]
    fn test_shipped_catalogs_are_acyclic() {
        validate_dag(default_tech_catalog().iter()).unwrap();
        let techs = default_technologies();
        validate_dag(techs.values()).unwrap();
        let civics = default_civics();
        validate_dag(civics.values()).unwrap();
    }

    #[test]
    fn test_synthetic_cycle_is_rejected() {
        let mut a = tech_node("a", TechTree::Science, "A", 10, &["b"]);
        let b = tech_node("b", TechTree::Science, "B", 10, &["a"]);
        let err = validate_dag([&a, &b]).unwrap_err();
        assert!(matches!(err, ContentError::CycleDetected { .. }));

        // Self-loop is the degenerate cycle.
        a.prerequisites = vec!["a".to_string()];
        assert!(validate_dag([&a]).is_err());
    }

    #[test]
    fn test_missing_prerequisites_are_tolerated() {
        let node = tech_node("x", TechTree::Science, "X", 10, &["not-shipped"]);
        assert!(validate_dag([&node]).is_ok());
    }

    #[test]
    fn test_item_cost_fallbacks() {
        use crate::game::state::ProductionKind;
        assert_eq!(item_cost(ProductionKind::Unit, "warrior"), 40);
        assert_eq!(item_cost(ProductionKind::Unit, "unknown"), 40);
        assert_eq!(item_cost(ProductionKind::Building, "library"), 80);
        assert_eq!(item_cost(ProductionKind::Improvement, "farm"), 20);
    }

    #[test]
    fn test_leader_roster() {
        let roster = leaders();
        assert_eq!(roster.len(), 4);
        assert!(roster.iter().any(|l| l.id == "expansionist" && l.expansionism > 0.6));
    }
}
