//! # Beacon Agents
//!
//! Reference controllers built from the Beacon core components.
//!
//! - **HomeController** — production queue, phase refills, slot listening,
//!   danger picture and vote bidding for an enlightenment center
//! - **UnitController** — assignment decoding, role-driven navigation and
//!   reporting for politicians, slanderers and muckrakers
//! - **ControllerFactory** — starts the right controller for each new unit

pub mod config;
pub mod factory;
pub mod home;
pub mod phase;
pub mod prelude;
pub mod unit;
