//! Write a default configuration file.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::config::{Config, CONFIG_FILE};

pub fn run(path: Option<PathBuf>, force: bool) -> Result<()> {
    let base_path = match path {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    println!("{} Initializing Beacon project...", "→".blue());

    if write_default(&base_path, force)? {
        println!("  {} Created {}", "✓".green(), base_path.join(CONFIG_FILE).display());
    } else {
        println!(
            "  {} {} already exists (use --force to overwrite)",
            "•".yellow(),
            base_path.join(CONFIG_FILE).display()
        );
    }

    println!();
    println!("Next steps:");
    println!("  {} beacon run --rounds 300", "1.".blue());
    println!("  {} beacon labels", "2.".blue());
    Ok(())
}

/// Write the default config into `dir`. Returns false when a file was
/// already there and `force` is off.
pub fn write_default(dir: &Path, force: bool) -> Result<bool> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let config_path = dir.join(CONFIG_FILE);
    if config_path.exists() && !force {
        return Ok(false);
    }
    Config::default().save(&config_path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_config_is_kept_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("match");
        assert!(write_default(&project, false).unwrap());

        let path = project.join(CONFIG_FILE);
        std::fs::write(&path, "[arena]\nseed = 5\n").unwrap();
        assert!(!write_default(&project, false).unwrap());
        assert_eq!(Config::read(&path).unwrap().arena.seed, 5);

        assert!(write_default(&project, true).unwrap());
        assert_eq!(Config::read(&path).unwrap().arena.seed, 42);
    }
}
