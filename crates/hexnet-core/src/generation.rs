//! Random scenario generation through the normal placement path

use rand::Rng;

use crate::components::AgentId;
use crate::engine::SimulationEngine;

/// Try `attempts` random placements of placeable catalog kinds for `agent`.
/// Rejected attempts are simply skipped. Returns how many tiles were placed.
pub fn populate(
    engine: &mut SimulationEngine,
    agent: AgentId,
    attempts: usize,
    rng: &mut impl Rng,
) -> usize {
    let kinds: Vec<String> = engine.catalog().placeable().map(|t| t.name.clone()).collect();
    let cells: Vec<usize> = engine.grid().graph().valid_indices().collect();
    if kinds.is_empty() || cells.is_empty() {
        return 0;
    }

    let mut placed = 0;
    for _ in 0..attempts {
        let kind = &kinds[rng.gen_range(0..kinds.len())];
        let index = cells[rng.gen_range(0..cells.len())];
        if engine.place(kind, agent, index) {
            placed += 1;
        }
    }
    placed
}

/// Grow a network: alternate random placements with ticks so new tiles can
/// complete and extend the agent's reach.
pub fn grow(
    engine: &mut SimulationEngine,
    agent: AgentId,
    rounds: usize,
    ticks_per_round: usize,
    rng: &mut impl Rng,
) -> usize {
    let mut placed = 0;
    for _ in 0..rounds {
        placed += populate(engine, agent, 8, rng);
        for _ in 0..ticks_per_round {
            engine.tick(1000.0 / 60.0);
        }
    }
    placed
}
