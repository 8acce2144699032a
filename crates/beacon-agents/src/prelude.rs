//! Beacon Agents Prelude — convenient imports for common usage.
//!
//! ```rust
//! use beacon_agents::prelude::*;
//! ```

pub use crate::config::{ControllerConfig, HomeConfig, UnitConfig};
pub use crate::factory::ControllerFactory;
pub use crate::home::HomeController;
pub use crate::phase::{next_phase, refill, Phase, RefillContext};
pub use crate::unit::{role_for, Role, UnitController};

// Re-export from core
pub use beacon_core::prelude::*;
