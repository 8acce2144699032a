//! # Beacon
//!
//! Coordination substrate for swarms of agents that each see only a few
//! cells around them and talk through one small integer slot apiece.
//!
//! ## Quick Start
//!
//! ```rust
//! use beacon::prelude::*;
//!
//! // A short match between two teams of reference controllers
//! let config = ArenaConfig { rounds: 50, ..ArenaConfig::default() };
//! let mut arena = Arena::new(config, Box::new(ControllerFactory::default())).unwrap();
//! arena.run(50);
//!
//! let stats = arena.stats();
//! println!("{} units, {} builds, votes {}:{}", stats.units_alive, stats.builds, stats.votes_a, stats.votes_b);
//!
//! // Every slot holds a self-describing message
//! for (id, flag) in arena.board().slots() {
//!     if let Some(message) = try_decode(flag) {
//!         println!("{id}: {message}");
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! Beacon is organized into several crates:
//!
//! - [`beacon_core`] - Message codec, exploration memory, navigation,
//!   production scheduling, bidding and the `Host`/`Agent` seams
//! - [`beacon_agents`] - Reference home and unit controllers
//! - [`beacon_runtime`] - Grid world, broadcast board and match loop
//!
//! ## Key Concepts
//!
//! ### Broadcast slots
//!
//! Each agent owns one 24-bit slot. Anyone who knows the agent's id can
//! read it; only the owner writes it, and writes show up next round.
//! Messages carry a label and up to three fixed-width fields, salted with
//! a nonce so foreign values decode as nothing.
//!
//! | Label | Fields | Used for |
//! |-------|--------|----------|
//! | SCOUT | heading | sending a muckraker toward an edge |
//! | EC_UPDATE | x, y, safe heading | home status and hiding orders |
//! | DANGER_INFO | x, y, count | enemy muckraker sightings |
//! | ENEMY_EC / NEUTRAL_EC | x, y, influence code | center sightings |
//!
//! ### Homes and units
//!
//! Homes (enlightenment centers) queue builds by priority, price them
//! against a reserve that grows with the round, and bid for votes. Units
//! read their first instruction from the home's slot and report back
//! through their own.

// Re-export all subcrates
pub use beacon_core as core;
pub use beacon_runtime as runtime;
pub use beacon_agents as agents;

/// Prelude module for convenient imports.
///
/// ```rust
/// use beacon::prelude::*;
/// ```
pub mod prelude {
    pub use beacon_runtime::prelude::*;
}
