//! Controller configuration.
//!
//! One struct gathers the tuning of every component a controller owns, so a
//! whole team can be configured from a single file section.

use beacon_core::bidding::BiddingConfig;
use beacon_core::exploration::ExplorationConfig;
use beacon_core::nav::NavConfig;
use beacon_core::production::ProductionConfig;
use beacon_core::types::Round;
use serde::{Deserialize, Serialize};

/// Tuning for every controller on a team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub nav: NavConfig,
    pub exploration: ExplorationConfig,
    pub production: ProductionConfig,
    pub bidding: BiddingConfig,
    pub home: HomeConfig,
    pub unit: UnitConfig,
}

/// Home unit behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeConfig {
    /// Tracked slots read per turn (default: 75).
    pub slots_per_turn: usize,
    /// Danger reports this close (squared distance) are ignored (default: 9).
    pub danger_ignore_radius_squared: i32,
    /// Slanderers queued before leaving the opening (default: 15).
    pub opening_slanderers: usize,
    /// Slanderers queued before switching to pressure (default: 50).
    pub growth_slanderers: usize,
    /// Influence sent on top of a neutral center's own (default: 10).
    pub capture_margin: i32,
    /// Above this, politicians take a large share (default: 1000).
    pub rich_threshold: i32,
    /// Centers created after this round skip the opening (default: 5).
    pub starting_rounds: Round,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            slots_per_turn: 75,
            danger_ignore_radius_squared: 9,
            opening_slanderers: 15,
            growth_slanderers: 50,
            capture_margin: 10,
            rich_threshold: 1000,
            starting_rounds: 5,
        }
    }
}

/// Mobile unit behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitConfig {
    /// Hovering units stay this close to home on each axis (default: 4).
    pub hover_radius: i32,
    /// Largest edge distance a scout reports (default: 63).
    pub max_edge_report: i32,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            hover_radius: 4,
            max_edge_report: 63,
        }
    }
}
