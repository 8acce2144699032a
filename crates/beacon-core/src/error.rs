//! Error types for Beacon operations.
//!
//! Goal abandonment and infeasible builds are ordinary outcomes, reported
//! through `NavStep` and `BuildOutcome`. Only genuine faults live here.

use crate::types::{AgentId, Direction, UnitType};
use thiserror::Error;

/// Result type for Beacon operations.
pub type Result<T> = std::result::Result<T, BeaconError>;

/// Errors raised by the message codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommsError {
    /// A field value does not fit its declared width, or the field count
    /// does not match the label. Always a caller bug.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The integer belongs to no known label. Expected when reading an
    /// empty, stale or foreign slot.
    #[error("flag {0:#08x} matches no label")]
    InvalidFlag(u32),
}

/// Actions rejected by a host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("agent {0} is not ready to act")]
    NotReady(AgentId),

    #[error("agent {0} cannot move {1:?}")]
    MoveBlocked(AgentId, Direction),

    #[error("agent {id} cannot build a {unit_type} toward {direction:?}")]
    BuildRejected {
        id: AgentId,
        unit_type: UnitType,
        direction: Direction,
    },

    #[error("agent {id} bid {amount} with only {available} influence")]
    BidTooLarge { id: AgentId, amount: u32, available: i32 },

    #[error("agent {0} wrote its broadcast slot twice in one round")]
    DuplicateBroadcast(AgentId),

    #[error("agent {0} is unknown to the host")]
    UnknownAgent(AgentId),
}

/// Invalid tuning values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{field} out of range: {value} (must be {min}-{max})")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },
}

/// Any error a Beacon component can raise.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BeaconError {
    #[error("comms error: {0}")]
    Comms(#[from] CommsError),

    #[error("host error: {0}")]
    Host(#[from] HostError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

// Convenience constructors
impl BeaconError {
    pub fn invalid_config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        BeaconError::Config(ConfigError::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        })
    }

    pub fn out_of_range(field: impl Into<String>, min: f64, max: f64, value: f64) -> Self {
        BeaconError::Config(ConfigError::OutOfRange {
            field: field.into(),
            min,
            max,
            value,
        })
    }
}
