//! Production phases of a home unit.
//!
//! A home unit moves `Opening → Growth → Pressure` as it queues slanderers.
//! Each phase has a refill list that is queued whenever the build queue
//! runs dry. Both the transition and the refill are pure functions of the
//! home's current picture so they can be tested without a host.

use beacon_core::comms::{Label, Message};
use beacon_core::production::{BuildCost, Priority, UnitBuild};
use beacon_core::registry::EcEntry;
use beacon_core::types::{Location, UnitType};
use serde::{Deserialize, Serialize};

use crate::config::HomeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Economy first: hiding slanderers and cheap politicians.
    Opening,
    /// Mixed production with scouting muckrakers.
    Growth,
    /// Politicians and muckrakers aimed at the enemy.
    Pressure,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Opening => "opening",
            Phase::Growth => "growth",
            Phase::Pressure => "pressure",
        }
    }
}

/// Phase for a home that has queued `slanderers_queued` slanderers so far.
///
/// Centers taken over mid-match skip the opening.
pub fn next_phase(slanderers_queued: usize, acquired: bool, config: &HomeConfig) -> Phase {
    if slanderers_queued < config.opening_slanderers && !acquired {
        Phase::Opening
    } else if slanderers_queued < config.growth_slanderers {
        Phase::Growth
    } else {
        Phase::Pressure
    }
}

/// What a refill needs to know about the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefillContext {
    pub influence: i32,
    /// Cheapest neutral center worth taking, if any.
    pub capture: Option<EcEntry>,
    /// Closest known enemy center.
    pub enemy: Option<Location>,
    /// Hiding instruction handed to new slanderers.
    pub update: Message,
}

fn politician(significance: f64, floor: i32, message: Message) -> UnitBuild {
    UnitBuild::new(UnitType::Politician, BuildCost::Share { significance, floor }, message)
}

fn slanderer(significance: f64, floor: i32, message: Message) -> UnitBuild {
    UnitBuild::new(UnitType::Slanderer, BuildCost::Ladder { significance, floor }, message)
}

fn muckraker(message: Message) -> UnitBuild {
    UnitBuild::new(UnitType::Muckraker, BuildCost::Fixed(1), message)
}

fn capture(entry: &EcEntry, config: &HomeConfig) -> UnitBuild {
    let floor = entry.influence.unwrap_or(0) + config.capture_margin;
    politician(0.8, floor, Message::with_location(Label::CaptureNeutralEc, entry.location))
}

/// Builds to queue when the queue is empty, in order.
pub fn refill(phase: Phase, ctx: &RefillContext, config: &HomeConfig) -> Vec<(UnitBuild, Priority)> {
    let explore = Message::bare(Label::Explore);
    let mut builds = Vec::new();
    match phase {
        Phase::Opening => {
            builds.push((slanderer(0.9, 85, ctx.update), Priority::Medium));
            builds.push((politician(0.05, 17, explore), Priority::Medium));
            if let Some(entry) = &ctx.capture {
                builds.push((capture(entry, config), Priority::High));
            }
        }
        Phase::Growth => {
            builds.push((muckraker(explore), Priority::Medium));
            match &ctx.capture {
                Some(entry) => builds.push((capture(entry, config), Priority::High)),
                None => {
                    let share = if ctx.influence > config.rich_threshold { 0.8 } else { 0.0 };
                    builds.push((politician(share, 20, explore), Priority::Medium));
                }
            }
            builds.push((politician(0.0, 20, explore), Priority::Medium));
            builds.push((muckraker(explore), Priority::Medium));
            builds.push((muckraker(explore), Priority::Medium));
            builds.push((slanderer(0.5, 130, ctx.update), Priority::Medium));
            builds.push((slanderer(0.5, 130, ctx.update), Priority::Medium));
        }
        Phase::Pressure => {
            let share = if ctx.influence > config.rich_threshold { 0.8 } else { 0.5 };
            builds.push((politician(share, 20, explore), Priority::Medium));
            builds.push((slanderer(0.5, 130, ctx.update), Priority::Medium));
            builds.push((politician(0.1, 20, explore), Priority::Medium));
            let target = match ctx.enemy {
                Some(location) => Message::with_location(Label::AttackLoc, location),
                None => explore,
            };
            builds.push((muckraker(target), Priority::Medium));
        }
    }
    builds
}
