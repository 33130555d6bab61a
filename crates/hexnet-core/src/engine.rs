//! Simulation engine - owns the grid and runs the per-tick pipeline

use hecs::World;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ExistingTile, PlacementQuery, StructureTemplate};
use crate::components::{AgentId, Construction, Integrity, Suspended, Tile};
use crate::config::{ConfigError, SimulationConfig};
use crate::grid::{HexGrid, Traversal};
use crate::network::{Group, Network};
use crate::systems::{
    collection_carry_over_system, collection_system, construction_completion_system,
    construction_funding_system, consumption_system, integrity_system, modifier_system,
    production_system, repair_system, unit_production_system, SpawnRequest,
};
use crate::view::TileView;

/// What happened during one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Frame that was simulated
    pub frame: u64,
    /// Elapsed time accepted for this tick after clamping
    pub elapsed_millis: f64,
    pub spawns: Vec<SpawnRequest>,
    /// Addresses cleared because their integrity dropped below zero
    pub destroyed: Vec<usize>,
    /// Addresses whose construction finished at the start of the tick
    pub completed: Vec<usize>,
    /// Networks as they stood at the end of the tick
    pub groups: Vec<Group>,
}

/// The simulation core: grid, tiles, networks and the structure catalog.
///
/// External collaborators mutate it only between ticks through the `&mut self`
/// methods below.
pub struct SimulationEngine {
    world: World,
    grid: HexGrid,
    network: Network,
    scratch: Traversal,
    catalog: Catalog,
    config: SimulationConfig,
    frame: u64,
    elapsed_millis: f64,
}

impl SimulationEngine {
    /// Default 9x9 grid with the builtin catalog
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config(SimulationConfig::default(), Catalog::builtin()?)
    }

    pub fn with_config(config: SimulationConfig, catalog: Catalog) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            world: World::new(),
            grid: HexGrid::new(&config.grid),
            network: Network::new(),
            scratch: Traversal::new(),
            catalog,
            config,
            frame: 0,
            elapsed_millis: 0.0,
        })
    }

    /// Run every phase once, in order.
    pub fn tick(&mut self, elapsed_millis: f64) -> TickReport {
        let elapsed_millis = elapsed_millis.clamp(0.0, self.config.max_delta_millis);
        self.elapsed_millis += elapsed_millis;
        let frame = self.frame;

        let destroyed = integrity_system(
            &mut self.world,
            &mut self.grid,
            self.config.fragment_exchange_rate,
        );
        let completed = construction_completion_system(&mut self.world, &self.grid);
        self.network.rebuild(&self.grid, &self.world);

        production_system(&mut self.world, &self.grid, &mut self.network);
        collection_carry_over_system(&mut self.world, &self.grid, &mut self.network);

        consumption_system(&mut self.world, &self.grid, &mut self.network);
        repair_system(
            &mut self.world,
            &self.grid,
            &mut self.network,
            &mut self.scratch,
        );
        construction_funding_system(&mut self.world, &self.grid, &mut self.network);
        collection_system(&mut self.world, &self.grid, &mut self.network);

        modifier_system(&mut self.world, &self.grid, &mut self.scratch);
        let spawns = unit_production_system(&mut self.world, &self.grid);

        debug!(
            "frame {}: {} groups, {} matter pooled, {} spawns",
            frame,
            self.network.groups().len(),
            self.network.total_matter(),
            spawns.len()
        );

        self.frame += 1;
        TickReport {
            frame,
            elapsed_millis,
            spawns,
            destroyed,
            completed,
            groups: self.network.groups().to_vec(),
        }
    }

    /// Place a catalog kind for `agent`. Rejected placements leave the grid
    /// untouched and return `false`.
    pub fn place(&mut self, kind: &str, agent: AgentId, index: usize) -> bool {
        if !self.grid.graph().is_valid(index) {
            warn!("{} cannot place {} at invalid address {}", agent, kind, index);
            return false;
        }
        let Some(template) = self.catalog.get(kind) else {
            warn!("{} cannot place unknown kind {}", agent, kind);
            return false;
        };

        let adjacent = self.network.adjacent(&self.grid, &self.world, index, agent);
        let existing = self
            .grid
            .get(index)
            .and_then(|entity| self.world.entity(entity).ok());
        let identity = existing.as_ref().and_then(|e| e.get::<&Tile>());
        let query = PlacementQuery {
            agent,
            existing: existing.as_ref().zip(identity.as_deref()).map(|(e, tile)| ExistingTile {
                kind: &tile.kind,
                agent: tile.agent,
                active: !e.has::<Construction>(),
            }),
            adjacent: &adjacent,
            has_network: self.network.has_agent(agent),
        };
        if !template.can_place(&query) {
            warn!("{} cannot place {} at {}", agent, kind, index);
            return false;
        }
        drop(identity);
        drop(existing);

        let template = template.clone();
        self.occupy(&template, agent, index);
        true
    }

    /// Put a tile down without consulting placement rules. Used for scenario
    /// setup such as enemy portals. Fails only on invalid addresses.
    pub fn spawn_scenario_tile(
        &mut self,
        template: &StructureTemplate,
        agent: AgentId,
        index: usize,
    ) -> bool {
        if !self.grid.graph().is_valid(index) {
            warn!("scenario tile {} at invalid address {}", template.name, index);
            return false;
        }
        self.occupy(template, agent, index);
        true
    }

    fn occupy(&mut self, template: &StructureTemplate, agent: AgentId, index: usize) {
        let mut builder = template.instantiate(agent, index, self.frame);
        let entity = self.world.spawn(builder.build());
        if let Some(previous) = self.grid.set(index, entity) {
            let _ = self.world.despawn(previous);
            self.network.forget(index);
        }
        info!("{} placed {} at {} on frame {}", agent, template.name, index, self.frame);
    }

    /// Deconstruct the tile at `index`
    pub fn remove(&mut self, index: usize) -> bool {
        let Some(entity) = self.grid.clear(index) else {
            return false;
        };
        let _ = self.world.despawn(entity);
        self.network.forget(index);
        info!("tile at {} removed", index);
        true
    }

    /// Armor-amortized damage stamped with the current frame
    pub fn damage(&mut self, index: usize, amount: i32) -> bool {
        let Some(entity) = self.grid.get(index) else {
            return false;
        };
        match self.world.get::<&mut Integrity>(entity) {
            Ok(mut health) => {
                health.damage(amount, self.frame);
                true
            }
            Err(_) => false,
        }
    }

    pub fn set_suspended(&mut self, index: usize, suspended: bool) -> bool {
        let Some(entity) = self.grid.get(index) else {
            return false;
        };
        if suspended {
            self.world.insert_one(entity, Suspended).is_ok()
        } else {
            let _ = self.world.remove_one::<Suspended>(entity);
            true
        }
    }

    pub fn view(&self, index: usize) -> Option<TileView> {
        TileView::capture(&self.world, &self.grid, &self.network, &self.catalog, index)
    }

    /// Views of every occupied cell in address order
    pub fn views(&self) -> Vec<TileView> {
        self.grid
            .occupied()
            .filter_map(|(index, _)| self.view(index))
            .collect()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn grid(&self) -> &HexGrid {
        &self.grid
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Frame the next tick will simulate
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn elapsed_millis(&self) -> f64 {
        self.elapsed_millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::HexCoord;

    fn at(engine: &SimulationEngine, q: i32, r: i32) -> usize {
        engine.grid().graph().index(HexCoord::new(q, r)).unwrap()
    }

    #[test]
    fn test_first_extractor_bootstraps() {
        let mut engine = SimulationEngine::new().unwrap();
        let root = at(&engine, 4, 4);
        assert!(engine.place("Extractor", AgentId(1), root));

        for _ in 0..10 {
            engine.tick(16.0);
        }
        assert!(!engine.view(root).unwrap().active);
        assert_eq!(engine.view(root).unwrap().construction.unwrap().value, 10);

        let report = engine.tick(16.0);
        assert_eq!(report.completed, vec![root]);
        let view = engine.view(root).unwrap();
        assert!(view.active);
        assert_eq!(view.integrity.unwrap().value, 5);
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].production, 1);
    }

    #[test]
    fn test_placement_rules() {
        let mut engine = SimulationEngine::new().unwrap();
        let root = at(&engine, 4, 4);
        let near = at(&engine, 5, 4);
        let far = at(&engine, 7, 2);

        // Needs an adjacent network
        assert!(!engine.place("Capacitor", AgentId(1), near));
        assert!(!engine.place("Portal", AgentId(1), root));
        assert!(!engine.place("Nope", AgentId(1), root));
        assert!(!engine.place("Extractor", AgentId(1), 0));

        assert!(engine.place("Extractor", AgentId(1), root));
        assert!(!engine.place("Extractor", AgentId(1), root));
        for _ in 0..11 {
            engine.tick(16.0);
        }
        assert!(engine.place("Capacitor", AgentId(1), near));
        assert!(!engine.place("Extractor", AgentId(1), far));
        // A second agent still gets a free root
        assert!(engine.place("Extractor", AgentId(2), far));
    }

    #[test]
    fn test_upgrade_replaces_tile() {
        let mut engine = SimulationEngine::new().unwrap();
        let root = at(&engine, 4, 4);
        let store = at(&engine, 5, 4);
        engine.place("Extractor", AgentId(1), root);
        for _ in 0..11 {
            engine.tick(16.0);
        }
        engine.place("Capacitor", AgentId(1), store);
        assert!(!engine.place("Capacitor II", AgentId(1), store));
        for _ in 0..12 {
            engine.tick(16.0);
        }
        assert!(engine.view(store).unwrap().active);
        assert!(engine.place("Capacitor II", AgentId(1), store));

        let view = engine.view(store).unwrap();
        assert_eq!(view.kind, "Capacitor II");
        assert!(view.construction.unwrap().upgrade);
        assert_eq!(engine.world().len(), 2);
    }

    #[test]
    fn test_elapsed_is_clamped() {
        let mut engine = SimulationEngine::new().unwrap();
        let report = engine.tick(500.0);
        assert!((report.elapsed_millis - 1000.0 / 60.0).abs() < 1e-9);
        assert_eq!(report.frame, 0);
        assert_eq!(engine.frame(), 1);
        engine.tick(-3.0);
        assert!((engine.elapsed_millis() - 1000.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_damage_and_destruction() {
        let mut engine = SimulationEngine::new().unwrap();
        let portal = engine.catalog().get("Portal").unwrap().clone();
        let index = at(&engine, 4, 4);
        assert!(engine.spawn_scenario_tile(&portal, AgentId(2), index));

        assert!(engine.damage(index, 10));
        assert_eq!(engine.view(index).unwrap().integrity.unwrap().value, 0);
        assert!(engine.tick(16.0).destroyed.is_empty());

        assert!(engine.damage(index, 1));
        let report = engine.tick(16.0);
        assert_eq!(report.destroyed, vec![index]);
        assert!(engine.view(index).is_none());
        assert!(!engine.damage(index, 1));
    }

    #[test]
    fn test_remove_and_suspend() {
        let mut engine = SimulationEngine::new().unwrap();
        let index = at(&engine, 4, 4);
        engine.place("Extractor", AgentId(1), index);
        for _ in 0..11 {
            engine.tick(16.0);
        }

        assert!(engine.set_suspended(index, true));
        let report = engine.tick(16.0);
        assert_eq!(report.groups[0].production, 0);
        assert!(engine.view(index).unwrap().suspended);

        assert!(engine.set_suspended(index, false));
        assert_eq!(engine.tick(16.0).groups[0].production, 1);

        assert!(engine.remove(index));
        assert!(!engine.remove(index));
        assert!(engine.network().group_of(index).is_none());
        assert!(engine.tick(16.0).groups.is_empty());
    }
}
