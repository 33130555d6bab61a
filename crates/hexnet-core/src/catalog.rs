//! Structure catalog - data templates for every buildable kind and their
//! placement rules.
//!
//! A kind is nothing more than a set of optional capabilities plus display
//! metadata. The default catalog is loaded from `data/structures.json`,
//! embedded at compile time via `include_str!()`.

use std::collections::HashSet;
use std::path::Path;

use hecs::EntityBuilder;
use serde::{Deserialize, Serialize};

use crate::components::{
    AgentId, Construction, Integrity, MatterCollection, MatterConsumption, MatterProduction,
    Modifier, ModifierKind, Repair, Targeting, Tile, UnitProduction,
};
use crate::config::ConfigError;
use crate::network::GroupId;

const BUILTIN_JSON: &str = include_str!("../../../data/structures.json");

/// Where a kind may be placed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PlacementRule {
    /// Empty address; must touch the agent's network once it has one
    Root,
    /// Empty address touching one of the agent's groups
    Adjacent,
    /// Replaces an active tile of kind `from` owned by the same agent
    Upgrade { from: String },
    /// Scenario-only kinds
    Never,
}

/// The occupant of an address a placement would land on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingTile<'a> {
    pub kind: &'a str,
    pub agent: AgentId,
    pub active: bool,
}

/// Everything a placement rule looks at
#[derive(Debug, Clone, Copy)]
pub struct PlacementQuery<'a> {
    pub agent: AgentId,
    pub existing: Option<ExistingTile<'a>>,
    /// The agent's groups adjacent to the address
    pub adjacent: &'a [GroupId],
    /// The agent owns at least one group
    pub has_network: bool,
}

impl PlacementRule {
    pub fn allows(&self, query: &PlacementQuery<'_>) -> bool {
        match self {
            PlacementRule::Root => {
                query.existing.is_none() && (!query.has_network || !query.adjacent.is_empty())
            }
            PlacementRule::Adjacent => query.existing.is_none() && !query.adjacent.is_empty(),
            PlacementRule::Upgrade { from } => query.existing.map_or(false, |tile| {
                tile.active && tile.agent == query.agent && tile.kind == from
            }),
            PlacementRule::Never => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionStats {
    pub max: i32,
    #[serde(default = "one")]
    pub cost: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityStats {
    pub max: i32,
    /// Start at full health instead of being raised on completion
    #[serde(default)]
    pub full: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountStats {
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub max: i32,
    #[serde(default = "one")]
    pub cap: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierStats {
    pub kind: ModifierKind,
    pub delta: i32,
    #[serde(default = "one")]
    pub radius: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairStats {
    #[serde(default = "one")]
    pub radius: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitProductionStats {
    pub threshold: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetingStats {
    pub radius: i32,
    pub damage: i32,
    pub rate: i32,
}

fn one() -> i32 {
    1
}

/// One buildable kind.
///
/// Deserialized from `data/structures.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureTemplate {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
    pub placement: PlacementRule,
    #[serde(default)]
    pub construction: Option<ConstructionStats>,
    #[serde(default)]
    pub integrity: Option<IntegrityStats>,
    #[serde(default)]
    pub production: Option<AmountStats>,
    #[serde(default)]
    pub collection: Option<CollectionStats>,
    #[serde(default)]
    pub consumption: Option<AmountStats>,
    #[serde(default)]
    pub modifier: Option<ModifierStats>,
    #[serde(default)]
    pub repair: Option<RepairStats>,
    #[serde(default)]
    pub unit_production: Option<UnitProductionStats>,
    #[serde(default)]
    pub targeting: Option<TargetingStats>,
}

impl StructureTemplate {
    pub fn can_place(&self, query: &PlacementQuery<'_>) -> bool {
        self.placement.allows(query)
    }

    pub fn is_upgrade(&self) -> bool {
        matches!(self.placement, PlacementRule::Upgrade { .. })
    }

    /// Components for a freshly placed tile of this kind
    pub fn instantiate(&self, agent: AgentId, index: usize, frame: u64) -> EntityBuilder {
        let mut builder = EntityBuilder::new();
        builder.add(Tile::new(self.name.clone(), agent, index, frame));

        if let Some(stats) = &self.construction {
            let site = if self.is_upgrade() {
                Construction::upgrade(stats.max)
            } else {
                Construction::new(stats.max)
            };
            builder.add(site.with_cost(stats.cost));
        }
        if let Some(stats) = &self.integrity {
            builder.add(if stats.full {
                Integrity::full(stats.max)
            } else {
                Integrity::new(stats.max)
            });
        }
        if let Some(stats) = &self.production {
            builder.add(MatterProduction::new(stats.amount));
        }
        if let Some(stats) = &self.collection {
            builder.add(MatterCollection::new(stats.max).with_cap(stats.cap));
        }
        if let Some(stats) = &self.consumption {
            builder.add(MatterConsumption::new(stats.amount));
        }
        if let Some(stats) = &self.modifier {
            let mut modifier = Modifier::new(stats.kind, stats.delta);
            modifier.radius = stats.radius;
            builder.add(modifier);
        }
        if let Some(stats) = &self.repair {
            builder.add(Repair::new(stats.radius));
        }
        if let Some(stats) = &self.unit_production {
            builder.add(UnitProduction::new(stats.threshold));
        }
        if let Some(stats) = &self.targeting {
            builder.add(Targeting::new(stats.radius, stats.damage, stats.rate));
        }
        builder
    }
}

/// All known kinds, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    templates: Vec<StructureTemplate>,
}

impl Catalog {
    /// The default catalog shipped with the crate
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let templates: Vec<StructureTemplate> = serde_json::from_str(json)?;
        Self::new(templates)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn new(templates: Vec<StructureTemplate>) -> Result<Self, ConfigError> {
        let catalog = Self { templates };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for template in &self.templates {
            if !names.insert(template.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate structure kind '{}'",
                    template.name
                )));
            }
        }

        for template in &self.templates {
            if let PlacementRule::Upgrade { from } = &template.placement {
                if !names.contains(from.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "'{}' upgrades unknown kind '{}'",
                        template.name, from
                    )));
                }
            }
            if let Some(stats) = &template.construction {
                if stats.max <= 0 {
                    return Err(ConfigError::Invalid(format!(
                        "'{}' construction max must be positive, got {}",
                        template.name, stats.max
                    )));
                }
            }
            if let Some(stats) = &template.unit_production {
                if stats.threshold <= 0 {
                    return Err(ConfigError::Invalid(format!(
                        "'{}' unit production threshold must be positive, got {}",
                        template.name, stats.threshold
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&StructureTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StructureTemplate> + '_ {
        self.templates.iter()
    }

    /// Kinds agents can place themselves
    pub fn placeable(&self) -> impl Iterator<Item = &StructureTemplate> + '_ {
        self.templates
            .iter()
            .filter(|t| t.placement != PlacementRule::Never)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    fn query<'a>(existing: Option<ExistingTile<'a>>, adjacent: &'a [GroupId], has_network: bool) -> PlacementQuery<'a> {
        PlacementQuery {
            agent: AgentId(1),
            existing,
            adjacent,
            has_network,
        }
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.len(), 13);
        for name in ["Extractor", "Capacitor II", "Regenerator", "Conduit", "Portal"] {
            assert!(catalog.get(name).is_some(), "missing {}", name);
        }
        assert!(catalog.placeable().all(|t| t.name != "Portal"));
        assert_eq!(
            catalog.get("Capacitor II").unwrap().placement,
            PlacementRule::Upgrade {
                from: "Capacitor".to_string()
            }
        );
    }

    #[test]
    fn test_root_rule() {
        let near = [GroupId(0)];
        assert!(PlacementRule::Root.allows(&query(None, &[], false)));
        assert!(PlacementRule::Root.allows(&query(None, &near, true)));
        assert!(!PlacementRule::Root.allows(&query(None, &[], true)));
    }

    #[test]
    fn test_adjacent_rule_needs_network() {
        let near = [GroupId(0)];
        assert!(!PlacementRule::Adjacent.allows(&query(None, &[], false)));
        assert!(PlacementRule::Adjacent.allows(&query(None, &near, true)));

        let occupied = ExistingTile {
            kind: "Conduit",
            agent: AgentId(1),
            active: true,
        };
        assert!(!PlacementRule::Adjacent.allows(&query(Some(occupied), &near, true)));
    }

    #[test]
    fn test_upgrade_rule() {
        let rule = PlacementRule::Upgrade {
            from: "Capacitor".to_string(),
        };
        let mut existing = ExistingTile {
            kind: "Capacitor",
            agent: AgentId(1),
            active: true,
        };
        assert!(rule.allows(&query(Some(existing), &[], true)));
        assert!(!rule.allows(&query(None, &[], true)));

        existing.active = false;
        assert!(!rule.allows(&query(Some(existing), &[], true)));
        existing.active = true;
        existing.agent = AgentId(2);
        assert!(!rule.allows(&query(Some(existing), &[], true)));
        existing.agent = AgentId(1);
        existing.kind = "Extractor";
        assert!(!rule.allows(&query(Some(existing), &[], true)));

        assert!(!PlacementRule::Never.allows(&query(None, &[GroupId(0)], true)));
    }

    #[test]
    fn test_instantiate_components() {
        let catalog = Catalog::builtin().unwrap();
        let mut world = World::new();

        let mut builder = catalog.get("Accelerator").unwrap().instantiate(AgentId(1), 40, 3);
        let entity = world.spawn(builder.build());
        assert_eq!(world.get::<&Tile>(entity).unwrap().frame, 3);
        assert_eq!(world.get::<&Construction>(entity).unwrap().max, 10);
        assert_eq!(world.get::<&Integrity>(entity).unwrap().value, 0);
        assert_eq!(world.get::<&MatterConsumption>(entity).unwrap().amount, 2);
        assert_eq!(world.get::<&Modifier>(entity).unwrap().kind, ModifierKind::Rate);
        assert!(world.get::<&MatterProduction>(entity).is_err());

        let mut builder = catalog.get("Capacitor II").unwrap().instantiate(AgentId(1), 40, 4);
        let entity = world.spawn(builder.build());
        assert!(world.get::<&Construction>(entity).unwrap().upgrade);

        let mut builder = catalog.get("Portal").unwrap().instantiate(AgentId(2), 40, 0);
        let entity = world.spawn(builder.build());
        assert!(world.get::<&Construction>(entity).is_err());
        assert_eq!(world.get::<&Integrity>(entity).unwrap().value, 10);
    }

    #[test]
    fn test_validation() {
        let dup = r#"[
            { "name": "A", "placement": { "rule": "root" } },
            { "name": "A", "placement": { "rule": "adjacent" } }
        ]"#;
        assert!(Catalog::from_json(dup).unwrap_err().to_string().contains("duplicate"));

        let orphan = r#"[{ "name": "B", "placement": { "rule": "upgrade", "from": "Nope" } }]"#;
        assert!(Catalog::from_json(orphan).unwrap_err().to_string().contains("unknown kind"));

        let empty_site = r#"[{ "name": "C", "placement": { "rule": "root" }, "construction": { "max": 0 } }]"#;
        assert!(matches!(Catalog::from_json(empty_site), Err(ConfigError::Invalid(_))));

        let idle = r#"[{ "name": "D", "placement": { "rule": "root" }, "unit_production": { "threshold": 0 } }]"#;
        assert!(matches!(Catalog::from_json(idle), Err(ConfigError::Invalid(_))));
    }
}
