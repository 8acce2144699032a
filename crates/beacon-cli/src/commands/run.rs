//! Play a match between two reference teams.

use anyhow::{Context, Result};
use beacon::prelude::*;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::info;

use crate::config::Config;

pub fn run(mut config: Config, rounds: Option<u32>, seed: Option<u64>, snapshot: Option<&Path>) -> Result<()> {
    if let Some(rounds) = rounds {
        config.arena.rounds = rounds;
    }
    if let Some(seed) = seed {
        config.arena.seed = seed;
    }
    let total = config.arena.rounds;

    println!(
        "{} Playing {} rounds on a {}x{} map (seed {})...",
        "→".blue(),
        total.to_string().cyan(),
        config.arena.world.width,
        config.arena.world.height,
        config.arena.seed.to_string().cyan()
    );

    let factory = ControllerFactory::new(config.controllers.clone());
    let mut arena = Arena::new(config.arena.clone(), Box::new(factory))
        .context("Failed to set up the match")?;

    let pb = if config.output.progress {
        ProgressBar::new(total as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} rounds")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );

    let every = config.output.report_every;
    while !arena.is_finished() {
        arena.tick();
        pb.inc(1);
        let stats = arena.stats();
        if every > 0 && stats.round % every == 0 {
            info!(
                round = stats.round,
                units = stats.units_alive,
                votes_a = stats.votes_a,
                votes_b = stats.votes_b,
                "progress"
            );
        }
    }
    pb.finish_and_clear();

    let stats = arena.stats();
    println!();
    println!("{} Match complete!", "✓".green().bold());
    println!("  Units:     {} alive, {} spawned", stats.units_alive.to_string().cyan(), stats.total_spawned);
    println!("  Actions:   {} builds, {} moves, {} broadcasts, {} bids", stats.builds, stats.moves, stats.broadcasts, stats.bids);
    if stats.rejected > 0 || stats.budget_overruns > 0 {
        println!(
            "  {} {} rejected actions, {} turns over budget",
            "!".yellow(),
            stats.rejected,
            stats.budget_overruns
        );
    }
    println!(
        "  Votes:     A {} / B {}",
        stats.votes_a.to_string().green(),
        stats.votes_b.to_string().red()
    );
    match arena.winner() {
        Some(team) => println!("  Winner:    {}", format!("{:?}", team).bold()),
        None => println!("  Winner:    {}", "tie".yellow()),
    }

    if let Some(path) = snapshot {
        let json = arena.snapshot_json().context("Failed to serialize snapshot")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
        println!("  {} Snapshot written to {}", "✓".green(), path.display());
    }
    Ok(())
}
