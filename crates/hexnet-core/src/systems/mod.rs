//! Systems - the per-tick phases that operate on tile components.
//!
//! Phase order within a tick (see `SimulationEngine::tick`):
//! integrity → construction completion → regroup → production → carry-over →
//! consumption → repair → construction funding → collection → modifiers →
//! unit production.

mod construction;
mod fabrication;
mod integrity;
mod matter;
mod modifiers;
mod repair;

pub use construction::*;
pub use fabrication::*;
pub use integrity::*;
pub use matter::*;
pub use modifiers::*;
pub use repair::*;

