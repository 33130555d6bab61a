//! Construction system - completes finished sites and funds the build queue

use std::collections::HashSet;

use crate::components::{AgentId, Construction, Integrity, Suspended, Tile};
use crate::grid::HexGrid;
use crate::network::Network;
use hecs::{Entity, World};
use log::{info, trace};

/// Remove `Construction` from every site that reached its max and restore the
/// tile's integrity to full. Returns the completed addresses.
pub fn construction_completion_system(world: &mut World, grid: &HexGrid) -> Vec<usize> {
    let finished: Vec<(usize, Entity)> = grid
        .occupied()
        .filter(|&(_, entity)| {
            world
                .get::<&Construction>(entity)
                .map_or(false, |c| c.is_complete())
        })
        .collect();

    for &(index, entity) in &finished {
        let _ = world.remove_one::<Construction>(entity);
        if let Ok(mut health) = world.get::<&mut Integrity>(entity) {
            health.value = health.max;
        }
        info!("construction at {} complete", index);
    }

    finished.into_iter().map(|(index, _)| index).collect()
}

/// Fund construction sites from the matter of their adjacent groups.
///
/// Sites are served earliest-placed first. A site is funded only when the
/// full per-tick charge is available; otherwise it waits for a later tick.
pub fn construction_funding_system(world: &mut World, grid: &HexGrid, network: &mut Network) {
    let mut queue: Vec<(usize, Entity, AgentId, u64)> = grid
        .occupied()
        .filter_map(|(index, entity)| {
            let tile = world.entity(entity).ok()?;
            if !tile.has::<Construction>() {
                return None;
            }
            let identity = tile.get::<&Tile>()?;
            Some((index, entity, identity.agent, identity.frame))
        })
        .collect();
    queue.sort_by_key(|&(_, _, _, frame)| frame);

    let mut bootstrapped: HashSet<AgentId> = HashSet::new();

    for (index, entity, agent, _) in queue {
        let adjacent = network.adjacent(grid, world, index, agent);
        let mut available = network.available(&adjacent);
        // An agent without any network still gets its first site off the ground
        if bootstrapped.insert(agent) && !network.has_agent(agent) {
            available = available.max(1);
        }

        if world.get::<&Suspended>(entity).is_ok() {
            continue;
        }
        let Ok(mut site) = world.get::<&mut Construction>(entity) else {
            continue;
        };

        let charge = site.charge();
        if available < charge {
            trace!("site at {} waits: {} of {} matter", index, available, charge);
            continue;
        }
        let withdrawn = network.withdraw(&adjacent, charge);
        site.value += charge;
        trace!(
            "site at {} funded {} ({} from network) -> {}/{}",
            index,
            charge,
            withdrawn,
            site.value,
            site.max
        );
    }
}
