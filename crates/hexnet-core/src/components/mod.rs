//! Component definitions for the ECS simulation.
//!
//! A tile is an entity carrying a `Tile` identity plus any subset of the
//! capability components below. Components are pure data; behavior lives in
//! the systems, which operate on "any tile that has capability X".

mod common;
mod effects;
mod matter;
mod tile;

pub use common::*;
pub use effects::*;
pub use matter::*;
pub use tile::*;
