//! Read-only snapshots of tiles for the render collaborator.

use hecs::World;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::components::{
    AgentId, Construction, HexCoord, Integrity, MatterCollection, MatterConsumption,
    MatterProduction, Modifier, Point, Repair, Suspended, Targeting, Tile, UnitProduction,
};
use crate::grid::HexGrid;
use crate::network::{GroupId, Network};

/// Everything the renderer needs to draw one occupied cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileView {
    pub index: usize,
    pub coord: HexCoord,
    pub center: Point,
    pub kind: String,
    pub icon: String,
    pub color: String,
    pub agent: AgentId,
    pub frame: u64,
    pub active: bool,
    pub suspended: bool,
    pub group: Option<GroupId>,
    pub construction: Option<Construction>,
    pub integrity: Option<Integrity>,
    pub production: Option<MatterProduction>,
    pub collection: Option<MatterCollection>,
    pub consumption: Option<MatterConsumption>,
    pub modifier: Option<Modifier>,
    pub repair: Option<Repair>,
    pub unit_production: Option<UnitProduction>,
    pub targeting: Option<Targeting>,
    /// Construction progress (0-1) for the progress arc
    pub progress: Option<f32>,
    /// Health bar fill (0-1)
    pub health: Option<f32>,
    /// Storage fill (0-1)
    pub fill: Option<f32>,
    /// Human-readable capability summaries, one line each
    pub lines: Vec<String>,
}

impl TileView {
    /// Capture the tile at `index`, if any
    pub fn capture(
        world: &World,
        grid: &HexGrid,
        network: &Network,
        catalog: &Catalog,
        index: usize,
    ) -> Option<Self> {
        let entity = grid.get(index)?;
        let tile = world.entity(entity).ok()?;
        let identity = tile.get::<&Tile>()?;
        let template = catalog.get(&identity.kind);

        let construction = tile.get::<&Construction>().map(|c| (*c).clone());
        let integrity = tile.get::<&Integrity>().map(|c| (*c).clone());
        let production = tile.get::<&MatterProduction>().map(|c| (*c).clone());
        let collection = tile.get::<&MatterCollection>().map(|c| (*c).clone());
        let consumption = tile.get::<&MatterConsumption>().map(|c| (*c).clone());
        let modifier = tile.get::<&Modifier>().map(|c| (*c).clone());
        let repair = tile.get::<&Repair>().map(|c| (*c).clone());
        let unit_production = tile.get::<&UnitProduction>().map(|c| (*c).clone());
        let targeting = tile.get::<&Targeting>().map(|c| (*c).clone());
        let suspended = tile.has::<Suspended>();

        let mut lines = vec![identity.kind.clone()];
        if suspended {
            lines.push(Suspended.to_string());
        }
        lines.extend(construction.as_ref().map(ToString::to_string));
        lines.extend(integrity.as_ref().map(ToString::to_string));
        lines.extend(production.as_ref().map(ToString::to_string));
        lines.extend(collection.as_ref().map(ToString::to_string));
        lines.extend(consumption.as_ref().map(ToString::to_string));
        lines.extend(modifier.as_ref().map(ToString::to_string));
        lines.extend(repair.as_ref().map(ToString::to_string));
        lines.extend(unit_production.as_ref().map(ToString::to_string));
        lines.extend(targeting.as_ref().map(ToString::to_string));
        if let Some(template) = template.filter(|t| !t.description.is_empty()) {
            lines.push(template.description.clone());
        }

        Some(Self {
            index,
            coord: grid.graph().coord(index)?,
            center: grid.graph().center(index)?,
            kind: identity.kind.clone(),
            icon: template.map(|t| t.icon.clone()).unwrap_or_default(),
            color: template.map(|t| t.color.clone()).unwrap_or_default(),
            agent: identity.agent,
            frame: identity.frame,
            active: construction.is_none(),
            suspended,
            progress: construction.as_ref().map(Construction::progress),
            health: integrity.as_ref().map(Integrity::fraction),
            fill: collection.as_ref().map(MatterCollection::level),
            group: network.group_of(index),
            construction,
            integrity,
            production,
            collection,
            consumption,
            modifier,
            repair,
            unit_production,
            targeting,
            lines,
        })
    }

    /// Funded this tick, or needs no upkeep at all
    pub fn is_powered(&self) -> bool {
        self.active && self.consumption.as_ref().map_or(true, |c| c.active)
    }
}
