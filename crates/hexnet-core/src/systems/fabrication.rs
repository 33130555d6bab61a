//! Unit production system - funded factories emit spawn requests

use crate::components::{
    AgentId, Construction, MatterConsumption, Point, Suspended, Tile, UnitProduction,
};
use crate::grid::HexGrid;
use hecs::World;
use log::debug;
use serde::{Deserialize, Serialize};

/// A mobile unit to be created by the unit collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub agent: AgentId,
    /// Address of the producing tile
    pub index: usize,
    /// Center of the producing tile in world units
    pub origin: Point,
    pub bonus_damage: i32,
    pub bonus_speed: i32,
    pub armor: i32,
}

/// Advance every funded factory's stack and emit a batch of units each time
/// it passes the threshold.
pub fn unit_production_system(world: &mut World, grid: &HexGrid) -> Vec<SpawnRequest> {
    let mut requests = Vec::new();

    for (index, entity) in grid.occupied() {
        let Ok((tile, factory, consumer, building, suspended)) = world.query_one_mut::<(
            &Tile,
            &mut UnitProduction,
            Option<&MatterConsumption>,
            Option<&Construction>,
            Option<&Suspended>,
        )>(entity) else {
            continue;
        };
        if building.is_some() || suspended.is_some() || !consumer.map_or(false, |c| c.active) {
            continue;
        }
        if factory.threshold <= 0 {
            continue;
        }

        let batch = factory.batch();
        factory.stack += batch;
        while factory.stack > factory.threshold {
            factory.stack -= factory.threshold;
            let origin = grid.graph().center(index).unwrap_or(Point::ZERO);
            for _ in 0..batch {
                requests.push(SpawnRequest {
                    agent: tile.agent,
                    index,
                    origin,
                    bonus_damage: factory.bonus,
                    bonus_speed: factory.extend,
                    armor: factory.armor,
                });
            }
            debug!("factory at {} released {} units for {}", index, batch, tile.agent);
        }
    }

    requests
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    fn funded() -> MatterConsumption {
        let mut consumer = MatterConsumption::new(1);
        consumer.active = true;
        consumer
    }

    #[test]
    fn test_spawns_when_stack_exceeds_threshold() {
        let mut f = Fixture::new();
        let factory = f.place(4, 4, 2, 0, (UnitProduction::new(2), funded()));

        assert!(unit_production_system(&mut f.world, &f.grid).is_empty());
        assert!(unit_production_system(&mut f.world, &f.grid).is_empty());
        let spawned = unit_production_system(&mut f.world, &f.grid);
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].agent, AgentId(2));
        assert_eq!(spawned[0].origin, f.grid.graph().center(factory).unwrap());
        assert_eq!(f.get::<UnitProduction>(factory).stack, 1);
    }

    #[test]
    fn test_batch_carries_bonuses() {
        let mut f = Fixture::new();
        let mut production = UnitProduction::new(1);
        production.multiplier = 1;
        production.bonus = 3;
        production.extend = 2;
        production.armor = 1;
        f.place(4, 4, 1, 0, (production, funded()));

        let spawned = unit_production_system(&mut f.world, &f.grid);
        assert_eq!(spawned.len(), 2);
        assert!(spawned
            .iter()
            .all(|s| s.bonus_damage == 3 && s.bonus_speed == 2 && s.armor == 1));
    }

    #[test]
    fn test_requires_funded_consumption() {
        let mut f = Fixture::new();
        let unfunded = f.place(4, 4, 1, 0, (UnitProduction::new(1), MatterConsumption::new(1)));
        let bare = f.place(5, 4, 1, 1, (UnitProduction::new(1),));
        f.place(3, 4, 1, 2, (UnitProduction::new(1), funded(), Suspended));

        for _ in 0..3 {
            assert!(unit_production_system(&mut f.world, &f.grid).is_empty());
        }
        assert_eq!(f.get::<UnitProduction>(unfunded).stack, 0);
        assert_eq!(f.get::<UnitProduction>(bare).stack, 0);
    }
}
