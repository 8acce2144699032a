//! Beacon Core Prelude — convenient imports for common usage.
//!
//! ```rust
//! use beacon_core::prelude::*;
//! ```

pub use crate::types::{
    AgentAction, AgentId, BuildOrder, Direction, Location, Round, SensedAgent, Team, UnitType,
};

pub use crate::agent::{Agent, AgentFactory, Spawn};
pub use crate::host::{read_message, Host};

pub use crate::comms::{decode, encode, encode_or, try_decode, Label, Message};
pub use crate::exploration::{ExplorationConfig, ExplorationMemory};
pub use crate::nav::{go_to, AbandonReason, DangerMask, NavConfig, NavGoal, NavStep, Navigator};
pub use crate::production::{
    BuildCost, BuildInfeasible, BuildOutcome, CostLadder, Priority, ProductionConfig,
    ProductionScheduler, UnitBuild,
};
pub use crate::bidding::{BidController, BidObservation, BidState, BiddingConfig};
pub use crate::danger::DangerTracker;
pub use crate::id_set::IdSet;
pub use crate::registry::{Allegiance, EcEntry, EcRegistry};

pub use crate::error::{BeaconError, CommsError, ConfigError, HostError, Result};
