//! Network grouping - per-tick connected components of same-agent active tiles.
//!
//! Groups are rebuilt from scratch every tick and carry no identity across
//! ticks. Each group owns the pooled matter its members share for that tick.

use std::collections::HashSet;

use hecs::World;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::components::AgentId;
use crate::grid::{HexGrid, Traversal};

/// Index of a group within one tick's network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub usize);

/// Summary of one connected network for the current tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub agent: AgentId,
    /// Member addresses by ascending placement frame
    pub members: Vec<usize>,
    /// Pooled matter available right now
    pub matter: i32,
    /// Matter produced this tick, before any spending
    pub production: i32,
    /// Matter requested this tick
    pub consumption: i32,
    /// Matter held in collection tiles after this tick's collection
    pub stored: i32,
}

impl Group {
    fn new(id: GroupId, agent: AgentId, members: Vec<usize>) -> Self {
        Self {
            id,
            agent,
            members,
            matter: 0,
            production: 0,
            consumption: 0,
            stored: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Production minus requested consumption (may be negative)
    pub fn overflow(&self) -> i32 {
        self.production - self.consumption
    }
}

/// All groups of the current tick plus the address → group stamp
#[derive(Debug, Clone, Default)]
pub struct Network {
    groups: Vec<Group>,
    membership: Vec<Option<GroupId>>,
    scratch: Traversal,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition every active, occupied cell into connected groups per agent.
    ///
    /// Cells are seeded in ascending address order; each group's members are
    /// stably sorted by placement frame.
    pub fn rebuild(&mut self, grid: &HexGrid, world: &World) {
        self.groups.clear();
        self.membership.clear();
        self.membership.resize(grid.len(), None);

        for (index, _) in grid.occupied() {
            if self.membership[index].is_some() {
                continue;
            }
            let Some(seed) = grid.occupant(world, index) else { continue };
            if !seed.active {
                continue;
            }

            let mut members = self.scratch.flood_fill(grid.graph(), index, seed.agent, |i| {
                grid.occupant(world, i)
            });
            members.sort_by_key(|&i| grid.occupant(world, i).map_or(u64::MAX, |o| o.frame));

            let id = GroupId(self.groups.len());
            for &member in &members {
                self.membership[member] = Some(id);
            }
            self.groups.push(Group::new(id, seed.agent, members));
        }

        debug!(
            "relinked {} network groups over {} tiles",
            self.groups.len(),
            self.groups.iter().map(Group::len).sum::<usize>()
        );
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut [Group] {
        &mut self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(id.0)
    }

    /// Group stamped on an address during the last rebuild
    pub fn group_of(&self, index: usize) -> Option<GroupId> {
        self.membership.get(index).copied().flatten()
    }

    /// Drop the stamp of a cleared address so lookups between ticks stay honest
    pub(crate) fn forget(&mut self, index: usize) {
        if let Some(slot) = self.membership.get_mut(index) {
            *slot = None;
        }
    }

    /// Every (group, member address) pair in group order, members by frame
    pub fn members(&self) -> Vec<(GroupId, usize)> {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter().map(move |&index| (g.id, index)))
            .collect()
    }

    pub fn agent_groups(&self, agent: AgentId) -> impl Iterator<Item = &Group> + '_ {
        self.groups.iter().filter(move |g| g.agent == agent)
    }

    pub fn has_agent(&self, agent: AgentId) -> bool {
        self.agent_groups(agent).next().is_some()
    }

    /// Distinct groups of `agent` reachable from an address.
    ///
    /// An active tile already in one of the agent's groups yields just that
    /// group; otherwise the groups of all neighbors, in neighbor order.
    pub fn adjacent(
        &self,
        grid: &HexGrid,
        world: &World,
        index: usize,
        agent: AgentId,
    ) -> Vec<GroupId> {
        if let Some(id) = self.group_of(index) {
            let own = self.groups.get(id.0).map_or(false, |g| g.agent == agent);
            if own && grid.is_active(world, index) {
                return vec![id];
            }
        }

        let mut seen = HashSet::new();
        grid.graph()
            .neighbors(index)
            .iter()
            .filter_map(|&neighbor| self.group_of(neighbor))
            .filter(|id| self.groups.get(id.0).map_or(false, |g| g.agent == agent))
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Matter pooled across the given groups
    pub fn available(&self, ids: &[GroupId]) -> i32 {
        ids.iter()
            .filter_map(|id| self.groups.get(id.0))
            .map(|g| g.matter.max(0))
            .sum()
    }

    /// Withdraw `amount` one unit at a time, each unit from the first listed
    /// group that still holds matter. Every unit also counts as consumption.
    /// Returns the amount actually withdrawn.
    pub fn withdraw(&mut self, ids: &[GroupId], amount: i32) -> i32 {
        let mut withdrawn = 0;
        while withdrawn < amount {
            let Some(&id) = ids
                .iter()
                .find(|id| self.groups.get(id.0).map_or(false, |g| g.matter > 0))
            else {
                break;
            };
            let group = &mut self.groups[id.0];
            group.matter -= 1;
            group.consumption += 1;
            withdrawn += 1;
        }
        withdrawn
    }

    pub fn total_matter(&self) -> i32 {
        self.groups.iter().map(|g| g.matter).sum()
    }
}
