//! Hex grid - static adjacency plus per-cell tile occupancy

mod graph;
mod traverse;

pub use graph::*;
pub use traverse::*;

use hecs::{Entity, World};

use crate::components::{Construction, Tile};
use crate::config::GridConfig;

/// The play area: a fixed hex graph and the entity occupying each valid cell.
///
/// Adjacency never changes after construction; only occupancy does.
#[derive(Debug, Clone)]
pub struct HexGrid {
    graph: HexGraph,
    cells: Vec<Option<Entity>>,
}

impl HexGrid {
    pub fn new(config: &GridConfig) -> Self {
        let graph = HexGraph::new(config);
        let cells = vec![None; graph.len()];
        Self { graph, cells }
    }

    pub fn graph(&self) -> &HexGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Entity at an address
    pub fn get(&self, index: usize) -> Option<Entity> {
        self.cells.get(index).copied().flatten()
    }

    /// Put an entity on a valid address. Returns the previous occupant.
    /// Writes to invalid addresses are ignored.
    pub(crate) fn set(&mut self, index: usize, entity: Entity) -> Option<Entity> {
        if !self.graph.is_valid(index) {
            return None;
        }
        self.cells[index].replace(entity)
    }

    pub(crate) fn clear(&mut self, index: usize) -> Option<Entity> {
        self.cells.get_mut(index).and_then(Option::take)
    }

    /// Occupied addresses in ascending order
    pub fn occupied(&self) -> impl Iterator<Item = (usize, Entity)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| cell.map(|entity| (index, entity)))
    }

    /// Traversal view of an address
    pub fn occupant(&self, world: &World, index: usize) -> Option<Occupant> {
        let entity = self.get(index)?;
        let tile = world.entity(entity).ok()?;
        let identity = tile.get::<&Tile>()?;
        Some(Occupant {
            entity,
            agent: identity.agent,
            frame: identity.frame,
            active: !tile.has::<Construction>(),
        })
    }

    /// Active-and-occupied check used by most phases
    pub fn is_active(&self, world: &World, index: usize) -> bool {
        self.occupant(world, index).map_or(false, |o| o.active)
    }

    /// Breadth-first spread from an occupied address (see [`Traversal::bounded_spread`])
    pub fn spread(
        &self,
        world: &World,
        scratch: &mut Traversal,
        origin: usize,
        limit: u32,
    ) -> Vec<usize> {
        scratch.bounded_spread(&self.graph, origin, limit, |index| {
            self.occupant(world, index)
        })
    }

    /// Spread sorted by ascending placement frame (stable)
    pub fn spread_by_frame(
        &self,
        world: &World,
        scratch: &mut Traversal,
        origin: usize,
        limit: u32,
    ) -> Vec<usize> {
        let mut reached = self.spread(world, scratch, origin, limit);
        reached.sort_by_key(|&index| self.occupant(world, index).map_or(u64::MAX, |o| o.frame));
        reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{AgentId, HexCoord};

    #[test]
    fn test_occupancy() {
        let mut world = World::new();
        let mut grid = HexGrid::new(&GridConfig::default());
        let index = grid.graph().index(HexCoord::new(4, 4)).unwrap();

        let entity = world.spawn((Tile::new("Conduit", AgentId(1), index, 3),));
        assert_eq!(grid.set(index, entity), None);
        assert_eq!(grid.get(index), Some(entity));

        let occupant = grid.occupant(&world, index).unwrap();
        assert_eq!(occupant.agent, AgentId(1));
        assert_eq!(occupant.frame, 3);
        assert!(occupant.active);

        world.insert_one(entity, Construction::new(5)).unwrap();
        assert!(!grid.is_active(&world, index));

        assert_eq!(grid.occupied().count(), 1);
        assert_eq!(grid.clear(index), Some(entity));
        assert!(grid.occupant(&world, index).is_none());
    }

    #[test]
    fn test_set_ignores_trimmed_cells() {
        let mut world = World::new();
        let mut grid = HexGrid::new(&GridConfig::default());
        let entity = world.spawn((Tile::new("Conduit", AgentId(1), 0, 0),));
        grid.set(0, entity);
        assert_eq!(grid.get(0), None);
    }
}
