//! Factory handing out the reference controllers.

use beacon_core::agent::{Agent, AgentFactory, Spawn};
use beacon_core::types::{Team, UnitType};

use crate::config::ControllerConfig;
use crate::home::HomeController;
use crate::unit::UnitController;

/// Starts a [`HomeController`] for every center and a [`UnitController`]
/// for everything else. Neutral units stay uncontrolled.
#[derive(Debug, Clone, Default)]
pub struct ControllerFactory {
    config: ControllerConfig,
}

impl ControllerFactory {
    pub fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

impl AgentFactory for ControllerFactory {
    fn create(&mut self, spawn: &Spawn) -> Option<Box<dyn Agent>> {
        if spawn.team == Team::Neutral {
            return None;
        }
        let agent: Box<dyn Agent> = match spawn.unit_type {
            UnitType::EnlightenmentCenter => Box::new(HomeController::new(spawn, &self.config)),
            _ => Box::new(UnitController::new(spawn, &self.config)),
        };
        Some(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::types::{AgentId, Location};

    fn spawn(team: Team, unit_type: UnitType) -> Spawn {
        Spawn {
            id: AgentId(10_001),
            team,
            unit_type,
            location: Location::new(5, 5),
            round: 0,
            seed: 9,
        }
    }

    #[test]
    fn neutral_units_stay_uncontrolled() {
        let mut factory = ControllerFactory::default();
        assert!(factory.create(&spawn(Team::Neutral, UnitType::EnlightenmentCenter)).is_none());
    }

    #[test]
    fn controllers_match_unit_type() {
        let mut factory = ControllerFactory::default();
        for unit_type in [
            UnitType::EnlightenmentCenter,
            UnitType::Politician,
            UnitType::Slanderer,
            UnitType::Muckraker,
        ] {
            let agent = factory.create(&spawn(Team::B, unit_type)).unwrap();
            assert_eq!(agent.unit_type(), unit_type);
            assert_eq!(agent.id(), AgentId(10_001));
            assert_eq!(agent.age(), 0);
        }
    }
}
