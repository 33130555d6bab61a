//! Repair system - repairers buy fragments for damaged tiles in range

use crate::components::{Integrity, Repair, Suspended};
use crate::grid::{HexGrid, Traversal};
use crate::network::Network;
use hecs::World;
use log::trace;

/// Matter charged, and fragments credited, per serviced target
const REPAIR_COST: i32 = 1;

/// For every repairer, walk its reach in placement order and credit
/// fragments to damaged active targets, one matter unit each, until its
/// per-tick capacity is used up. Every attempt counts as consumption even
/// when the pool is empty.
pub fn repair_system(
    world: &mut World,
    grid: &HexGrid,
    network: &mut Network,
    scratch: &mut Traversal,
) {
    for (id, index) in network.members() {
        let Some(entity) = grid.get(index) else { continue };
        let suspended = world.get::<&Suspended>(entity).is_ok();
        let Ok(mut repair) = world.get::<&mut Repair>(entity) else {
            continue;
        };
        repair.count = 0;
        if suspended {
            continue;
        }
        let (reach, capacity) = (repair.range(), repair.capacity());
        drop(repair);

        let targets = grid.spread_by_frame(world, scratch, index, reach.max(0) as u32);
        let mut serviced = 0;
        for target in targets {
            if !grid.is_active(world, target) {
                continue;
            }
            let Some(target_entity) = grid.get(target) else { continue };
            let Ok(mut health) = world.get::<&mut Integrity>(target_entity) else {
                continue;
            };
            if !health.is_damaged() {
                continue;
            }
            let Some(group) = network.group_mut(id) else { break };
            group.consumption += REPAIR_COST;
            if group.matter < REPAIR_COST {
                continue;
            }
            group.matter -= REPAIR_COST;
            health.fragments += REPAIR_COST;
            serviced += 1;
            trace!("repairer at {} credited a fragment to {}", index, target);
            if serviced >= capacity {
                break;
            }
        }

        if let Ok(mut repair) = world.get::<&mut Repair>(entity) {
            repair.count = serviced;
        }
    }
}
