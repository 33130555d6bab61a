//! Integrity system - destroys broken tiles, exchanges repair fragments

use crate::components::Integrity;
use crate::grid::HexGrid;
use hecs::{Entity, World};
use log::info;

/// Remove tiles whose integrity dropped below zero and convert buffered repair
/// fragments into integrity on active, damaged tiles.
///
/// Returns the addresses that were cleared.
pub fn integrity_system(world: &mut World, grid: &mut HexGrid, exchange_rate: i32) -> Vec<usize> {
    let occupied: Vec<(usize, Entity)> = grid.occupied().collect();
    let mut destroyed = Vec::new();

    for (index, entity) in occupied {
        let active = grid.is_active(world, index);
        let Ok(health) = world.query_one_mut::<&mut Integrity>(entity) else {
            continue;
        };
        if health.is_destroyed() {
            destroyed.push((index, entity));
        } else if active && health.is_damaged() {
            health.exchange_fragments(exchange_rate);
        }
    }

    destroyed
        .into_iter()
        .map(|(index, entity)| {
            grid.clear(index);
            let _ = world.despawn(entity);
            info!("tile at {} destroyed", index);
            index
        })
        .collect()
}
