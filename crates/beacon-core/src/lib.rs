//! # Beacon Core
//!
//! Decision and coordination primitives for a swarm of agents that share a
//! map, sense only locally and talk through one small public slot each.
//!
//! - **comms** — pack tagged messages into a 24-bit broadcast flag
//! - **exploration** — coarse visited cells, map edges and a spiral search
//! - **nav** — windowed gradient navigation with a danger mask
//! - **production** — prioritized build queue with resource reserves
//! - **bidding** — auction strategy driven by win/loss streaks
//!
//! Agents see the world only through the [`Host`](host::Host) trait and
//! answer each turn with a list of [`AgentAction`](types::AgentAction)s.
//!
//! ## Quick Start
//!
//! ```rust
//! use beacon_core::prelude::*;
//!
//! let msg = Message::with_direction(Label::Scout, Direction::NorthEast);
//! let flag = encode(&msg).unwrap();
//! assert_eq!(decode(flag).unwrap(), msg);
//! ```

pub mod agent;
pub mod bidding;
pub mod comms;
pub mod danger;
pub mod error;
pub mod exploration;
pub mod host;
pub mod id_set;
pub mod nav;
pub mod prelude;
pub mod production;
pub mod registry;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;
