//! # Beacon Runtime
//!
//! Reference host for Beacon agents.
//!
//! The runtime is the match — it owns the map and every unit, gives each
//! controller a budgeted, range-limited view once per round, applies the
//! actions that come back and settles the vote auction.

pub mod arena;
pub mod board;
pub mod prelude;
pub mod view;
pub mod world;
