//! Configuration management for Beacon CLI.

use anyhow::{Context, Result};
use beacon::agents::config::ControllerConfig;
use beacon::runtime::arena::ArenaConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "beacon.toml";

/// Beacon project configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub arena: ArenaConfig,
    #[serde(default)]
    pub controllers: ControllerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_progress")]
    pub progress: bool,
    /// Print a line every this many rounds when verbose; 0 disables.
    #[serde(default = "default_report_every")]
    pub report_every: u32,
}

fn default_progress() -> bool { true }
fn default_report_every() -> u32 { 100 }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            progress: default_progress(),
            report_every: default_report_every(),
        }
    }
}

impl Config {
    /// Load `path`, or the nearest beacon.toml, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path.map(Path::to_path_buf).or_else(find_config_file) {
            Some(path) => Self::read(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Save config to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

/// Find beacon.toml in current or parent directories.
fn find_config_file() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_read_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = Config::default();
        config.arena.seed = 99;
        config.arena.world.width = 48;
        config.controllers.home.slots_per_turn = 30;
        config.save(&path).unwrap();

        let loaded = Config::read(&path).unwrap();
        assert_eq!(loaded.arena.seed, 99);
        assert_eq!(loaded.arena.world.width, 48);
        assert_eq!(loaded.controllers.home.slots_per_turn, 30);
        assert_eq!(loaded.controllers.production.ladder, config.controllers.production.ladder);
    }

    #[test]
    fn sparse_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[arena]\nrounds = 300\n\n[controllers.bidding]\nmin_bid = 4\n").unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.arena.rounds, 300);
        assert_eq!(loaded.arena.seed, 42);
        assert_eq!(loaded.controllers.bidding.min_bid, 4);
        assert_eq!(loaded.controllers.bidding.votes_to_win, 751);
        assert!(loaded.output.progress);
    }

    #[test]
    fn broken_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[arena\nrounds = ").unwrap();
        let err = Config::read(&path).unwrap_err();
        assert!(format!("{err}").contains("Failed to parse config"));
    }
}
