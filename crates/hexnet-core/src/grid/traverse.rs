//! Breadth-first traversal primitives over the hex graph.
//!
//! Both traversals run on a reusable scratch buffer owned by the caller, so
//! they share no module state and visit each address at most once.

use std::collections::VecDeque;

use hecs::Entity;

use super::graph::HexGraph;
use crate::components::AgentId;

/// What a traversal needs to know about an occupied address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupant {
    pub entity: Entity,
    pub agent: AgentId,
    pub frame: u64,
    /// Not under construction
    pub active: bool,
}

/// Scratch state for traversals: visit marks (0 = unvisited, otherwise
/// depth + 1) and the work list
#[derive(Debug, Clone, Default)]
pub struct Traversal {
    marks: Vec<u32>,
    work: VecDeque<usize>,
}

impl Traversal {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, len: usize) {
        self.marks.clear();
        self.marks.resize(len, 0);
        self.work.clear();
    }

    /// Cells reachable from `origin` through tiles of the origin's agent.
    ///
    /// Expansion stops at inactive tiles (they are reported but not crossed)
    /// and at `limit` hops; a `limit` of 0 is unbounded. The origin comes
    /// first, the rest in breadth-first order.
    pub fn bounded_spread<F>(
        &mut self,
        graph: &HexGraph,
        origin: usize,
        limit: u32,
        occupant: F,
    ) -> Vec<usize>
    where
        F: Fn(usize) -> Option<Occupant>,
    {
        let mut out = Vec::new();
        let Some(agent) = occupant(origin).map(|o| o.agent) else {
            return out;
        };
        self.reset(graph.len());
        self.marks[origin] = 1;
        self.work.push_back(origin);

        while let Some(index) = self.work.pop_front() {
            let Some(cell) = occupant(index) else { continue };
            if cell.agent != agent {
                continue;
            }
            out.push(index);
            if !cell.active {
                continue;
            }
            let depth = self.marks[index];
            if limit > 0 && depth > limit {
                continue;
            }
            for &neighbor in graph.neighbors(index) {
                if self.marks[neighbor] == 0 {
                    self.marks[neighbor] = depth + 1;
                    self.work.push_back(neighbor);
                }
            }
        }
        out
    }

    /// Active tiles of `agent` connected to `origin`.
    ///
    /// The walk crosses every occupied address regardless of owner or state,
    /// plus the origin itself, but never expands out of an empty address.
    /// Results are in discovery order.
    pub fn flood_fill<F>(
        &mut self,
        graph: &HexGraph,
        origin: usize,
        agent: AgentId,
        occupant: F,
    ) -> Vec<usize>
    where
        F: Fn(usize) -> Option<Occupant>,
    {
        let mut out = Vec::new();
        if !graph.is_valid(origin) {
            return out;
        }
        self.reset(graph.len());
        self.marks[origin] = 1;
        self.work.push_back(origin);

        while let Some(index) = self.work.pop_back() {
            let cell = occupant(index);
            if let Some(cell) = cell {
                if cell.agent == agent && cell.active {
                    out.push(index);
                }
            }
            if index != origin && cell.is_none() {
                continue;
            }
            for &neighbor in graph.neighbors(index) {
                if self.marks[neighbor] == 0 {
                    self.marks[neighbor] = 1;
                    self.work.push_back(neighbor);
                }
            }
        }
        out
    }
}
