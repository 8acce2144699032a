//! Beacon Runtime Prelude — convenient imports for common usage.
//!
//! ```rust
//! use beacon_runtime::prelude::*;
//! ```

// Re-export arena
pub use crate::arena::{Arena, ArenaConfig, ArenaEvent, ArenaSnapshot, ArenaStats};

pub use crate::board::BroadcastBoard;
pub use crate::view::{BudgetConfig, UnitView};
pub use crate::world::{AuctionResult, GridWorld, Unit, WorldConfig};

// Re-export from agents
pub use beacon_agents::prelude::*;
