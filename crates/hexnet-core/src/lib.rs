//! Hexnet Core - structure networks and matter economy on a hex grid
//!
//! Competing agents build structures on a hexagonal grid. Every tick,
//! connected structures of one agent are merged into a network whose matter
//! is pooled and handed out to consumers, construction sites and repairers
//! under fixed ordering rules.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: One tile per occupied grid cell
//! - **Components**: Capabilities attached to tiles (production, storage, consumption, etc.)
//! - **Systems**: The tick phases that query and update those capabilities
//!
//! # Example
//!
//! ```rust,no_run
//! use hexnet_core::prelude::*;
//!
//! let mut engine = SimulationEngine::new().expect("builtin catalog");
//! let root = engine.grid().graph().index(HexCoord::new(4, 4)).unwrap();
//! engine.place("Extractor", AgentId(1), root);
//!
//! loop {
//!     let report = engine.tick(1000.0 / 60.0);
//!     for spawn in report.spawns {
//!         // hand over to the unit subsystem
//!         let _ = spawn;
//!     }
//! }
//! ```

pub mod catalog;
pub mod components;
pub mod config;
pub mod engine;
pub mod generation;
pub mod grid;
pub mod network;
pub mod systems;
pub mod view;

#[cfg(test)]
mod test_support;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::catalog::{Catalog, PlacementRule, StructureTemplate};
    pub use crate::components::*;
    pub use crate::config::{ConfigError, GridConfig, SimulationConfig};
    pub use crate::engine::{SimulationEngine, TickReport};
    pub use crate::grid::HexGrid;
    pub use crate::network::{Group, GroupId, Network};
    pub use crate::systems::SpawnRequest;
    pub use crate::view::TileView;
}
