//! Shared fixture for unit tests: a default grid with helpers to place tiles

use hecs::{Component, DynamicBundle, Entity, World};

use crate::components::{AgentId, HexCoord, Tile};
use crate::config::GridConfig;
use crate::grid::{HexGrid, Traversal};
use crate::network::{Group, Network};

pub struct Fixture {
    pub world: World,
    pub grid: HexGrid,
    pub network: Network,
    pub scratch: Traversal,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            grid: HexGrid::new(&GridConfig::default()),
            network: Network::new(),
            scratch: Traversal::new(),
        }
    }

    pub fn index(&self, q: i32, r: i32) -> usize {
        self.grid.graph().index(HexCoord::new(q, r)).unwrap()
    }

    /// Place a tile of `agent` with the given capability components
    pub fn place(&mut self, q: i32, r: i32, agent: u32, frame: u64, bundle: impl DynamicBundle) -> usize {
        let index = self.place_bare(q, r, agent, frame);
        let entity = self.entity(index);
        self.world.insert(entity, bundle).unwrap();
        index
    }

    /// Place a tile with no capabilities
    pub fn place_bare(&mut self, q: i32, r: i32, agent: u32, frame: u64) -> usize {
        let index = self.index(q, r);
        let entity = self
            .world
            .spawn((Tile::new("Test", AgentId(agent), index, frame),));
        self.grid.set(index, entity);
        index
    }

    pub fn entity(&self, index: usize) -> Entity {
        self.grid.get(index).unwrap()
    }

    pub fn regroup(&mut self) {
        self.network.rebuild(&self.grid, &self.world);
    }

    pub fn get<T: Component + Clone>(&self, index: usize) -> T {
        let entity = self.entity(index);
        let component = self.world.get::<&T>(entity).unwrap();
        (*component).clone()
    }

    pub fn set<T: Component>(&mut self, index: usize, component: T) {
        let entity = self.entity(index);
        self.world.insert_one(entity, component).unwrap();
    }

    pub fn group(&self, index: usize) -> &Group {
        let id = self.network.group_of(index).unwrap();
        self.network.group(id).unwrap()
    }

    pub fn group_mut(&mut self, index: usize) -> &mut Group {
        let id = self.network.group_of(index).unwrap();
        self.network.group_mut(id).unwrap()
    }
}
