//! Matter systems - production, storage carry-over, consumption and collection.
//!
//! All four operate on the groups built at the start of the tick. Production
//! and carry-over fill each group's pool; consumption and collection drain it.

use crate::components::{
    Construction, MatterCollection, MatterConsumption, MatterProduction, Suspended,
};
use crate::grid::HexGrid;
use crate::network::{GroupId, Network};
use hecs::World;

/// Refill every group pool from its producers and snapshot `production`.
pub fn production_system(world: &mut World, grid: &HexGrid, network: &mut Network) {
    for group in network.groups_mut() {
        group.matter = 0;
        group.production = 0;
        group.consumption = 0;
    }

    for (index, entity) in grid.occupied() {
        let Some(id) = network.group_of(index) else { continue };
        let Ok((production, building, suspended)) = world
            .query_one_mut::<(&MatterProduction, Option<&Construction>, Option<&Suspended>)>(
                entity,
            )
        else {
            continue;
        };
        if building.is_some() || suspended.is_some() {
            continue;
        }
        let output = production.total();
        if let Some(group) = network.group_mut(id) {
            group.matter += output;
        }
    }

    for group in network.groups_mut() {
        group.production = group.matter;
    }
}

/// Fold last tick's stored matter back into the pool. Storage is re-earned
/// during collection rather than kept as a standing balance.
pub fn collection_carry_over_system(world: &mut World, grid: &HexGrid, network: &mut Network) {
    for (index, entity) in grid.occupied() {
        let Some(id) = network.group_of(index) else { continue };
        let Ok((store, building, suspended)) = world
            .query_one_mut::<(&mut MatterCollection, Option<&Construction>, Option<&Suspended>)>(
                entity,
            )
        else {
            continue;
        };
        if building.is_some() || suspended.is_some() {
            continue;
        }
        if let Some(group) = network.group_mut(id) {
            group.matter += store.value;
        }
        store.persist = store.value;
        store.value = 0;
    }
}

/// Charge every consumer its upkeep, earliest-placed first within a group.
///
/// A consumer the pool cannot cover drains the pool and stays inactive.
pub fn consumption_system(world: &mut World, grid: &HexGrid, network: &mut Network) {
    for (id, index) in network.members() {
        let Some(entity) = grid.get(index) else { continue };
        let Ok((consumer, building, suspended)) = world
            .query_one_mut::<(&mut MatterConsumption, Option<&Construction>, Option<&Suspended>)>(
                entity,
            )
        else {
            continue;
        };
        consumer.active = false;
        if building.is_some() || suspended.is_some() {
            continue;
        }

        let Some(group) = network.group_mut(id) else { continue };
        let required = consumer.total();
        group.consumption += required;
        if group.matter < required {
            group.matter = 0;
            continue;
        }
        group.matter -= required;
        consumer.active = true;
    }
}

/// Move overflow matter into storage tiles.
///
/// Each store first recovers what it held last tick, then collects new matter
/// limited by its throughput, the remaining pool, the group's remaining
/// overflow and its free capacity. Only newly collected matter earns the bonus.
pub fn collection_system(world: &mut World, grid: &HexGrid, network: &mut Network) {
    for id in (0..network.groups().len()).map(GroupId) {
        let Some(group) = network.group_mut(id) else { continue };
        group.stored = 0;
        let mut overflow = group.overflow();
        let members = group.members.clone();

        for index in members {
            let Some(entity) = grid.get(index) else { continue };
            let Ok((store, building, suspended)) = world
                .query_one_mut::<(&mut MatterCollection, Option<&Construction>, Option<&Suspended>)>(
                    entity,
                )
            else {
                continue;
            };
            if building.is_some() || suspended.is_some() {
                continue;
            }
            let Some(group) = network.group_mut(id) else { continue };

            let recover = store.max.min(store.persist).min(group.matter).max(0);
            let collect = store
                .throughput()
                .min(group.matter - recover)
                .min(overflow.max(0))
                .min(store.max - recover)
                .max(0);
            overflow -= collect;
            group.matter -= recover + collect;
            store.value = store
                .max
                .min(store.value + recover + collect * (store.bonus + 1));
            group.stored += store.value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    #[test]
    fn test_production_fills_group_pool() {
        let mut f = Fixture::new();
        let mut boosted = MatterProduction::new(1);
        boosted.bonus = 1;
        boosted.multiplier = 1;
        let a = f.place(4, 4, 1, 0, (MatterProduction::new(2),));
        f.place(5, 4, 1, 1, (boosted,));
        f.place(3, 4, 1, 2, (MatterProduction::new(7), Suspended));
        f.regroup();

        production_system(&mut f.world, &f.grid, &mut f.network);
        assert_eq!(f.group(a).matter, 6);
        assert_eq!(f.group(a).production, 6);
    }

    #[test]
    fn test_inactive_producer_contributes_nothing() {
        let mut f = Fixture::new();
        let a = f.place(4, 4, 1, 0, (MatterProduction::new(1),));
        f.place(5, 4, 1, 1, (MatterProduction::new(5), Construction::new(3)));
        f.regroup();

        production_system(&mut f.world, &f.grid, &mut f.network);
        assert_eq!(f.group(a).production, 1);
    }

    #[test]
    fn test_carry_over_returns_storage_to_pool() {
        let mut f = Fixture::new();
        let mut store = MatterCollection::new(10);
        store.value = 4;
        let a = f.place(4, 4, 1, 0, (store,));
        f.regroup();

        collection_carry_over_system(&mut f.world, &f.grid, &mut f.network);
        assert_eq!(f.group(a).matter, 4);
        let store = f.get::<MatterCollection>(a);
        assert_eq!(store.persist, 4);
        assert_eq!(store.value, 0);
    }

    #[test]
    fn test_consumption_in_frame_order() {
        let mut f = Fixture::new();
        let late = f.place(4, 4, 1, 5, (MatterConsumption::new(2),));
        let early = f.place(5, 4, 1, 1, (MatterConsumption::new(2),));
        f.regroup();
        f.group_mut(late).matter = 3;

        consumption_system(&mut f.world, &f.grid, &mut f.network);
        assert!(f.get::<MatterConsumption>(early).active);
        assert!(!f.get::<MatterConsumption>(late).active);
        // Short pool is drained rather than overdrawn
        assert_eq!(f.group(late).matter, 0);
        assert_eq!(f.group(late).consumption, 4);
    }

    #[test]
    fn test_suspended_consumer_resets_inactive() {
        let mut f = Fixture::new();
        let mut consumer = MatterConsumption::new(1);
        consumer.active = true;
        let a = f.place(4, 4, 1, 0, (consumer, Suspended));
        f.regroup();
        f.group_mut(a).matter = 5;

        consumption_system(&mut f.world, &f.grid, &mut f.network);
        assert!(!f.get::<MatterConsumption>(a).active);
        assert_eq!(f.group(a).matter, 5);
        assert_eq!(f.group(a).consumption, 0);
    }

    #[test]
    fn test_collection_bounded_by_throughput_and_overflow() {
        let mut f = Fixture::new();
        let a = f.place(4, 4, 1, 0, (MatterCollection::new(10).with_cap(2),));
        f.regroup();
        {
            let group = f.group_mut(a);
            group.production = 5;
            group.consumption = 1;
            group.matter = 4;
        }

        collection_system(&mut f.world, &f.grid, &mut f.network);
        assert_eq!(f.get::<MatterCollection>(a).value, 2);
        assert_eq!(f.group(a).matter, 2);
        assert_eq!(f.group(a).stored, 2);
    }

    #[test]
    fn test_collection_recovers_then_applies_bonus() {
        let mut f = Fixture::new();
        let mut store = MatterCollection::new(10);
        store.persist = 3;
        store.bonus = 1;
        let a = f.place(4, 4, 1, 0, (store,));
        f.regroup();
        {
            let group = f.group_mut(a);
            group.production = 2;
            group.matter = 5;
        }

        collection_system(&mut f.world, &f.grid, &mut f.network);
        // 3 recovered plus 1 collected at double value
        assert_eq!(f.get::<MatterCollection>(a).value, 5);
        assert_eq!(f.group(a).matter, 1);
    }

    #[test]
    fn test_recovery_capped_by_live_pool() {
        let mut f = Fixture::new();
        let mut store = MatterCollection::new(10);
        store.persist = 6;
        let a = f.place(4, 4, 1, 0, (store,));
        f.regroup();
        f.group_mut(a).matter = 2;

        collection_system(&mut f.world, &f.grid, &mut f.network);
        assert_eq!(f.get::<MatterCollection>(a).value, 2);
        assert_eq!(f.group(a).matter, 0);
    }
}
