//! Beacon CLI - run matches and inspect broadcast slot messages.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "beacon")]
#[command(author, version, about = "Beacon - swarm coordination over a tiny broadcast channel", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (default: beacon.toml in this or a parent directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default beacon.toml
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Play a match between two teams of reference controllers
    Run {
        /// Rounds to play (default: from config)
        #[arg(short, long)]
        rounds: Option<u32>,

        /// Match seed (default: from config)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Write the final snapshot as JSON
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Encode a message into a slot value
    Encode {
        /// Label name, e.g. SCOUT or danger-info
        label: String,

        /// Field values in declared order
        fields: Vec<u32>,
    },

    /// Decode a slot value (decimal or 0x-prefixed hex)
    Decode {
        flag: String,
    },

    /// List every label with its wire layout
    Labels,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Init { path, force } => commands::init::run(path, force),
        Commands::Run { rounds, seed, snapshot } => {
            let config = config::Config::load(cli.config.as_deref())?;
            commands::run::run(config, rounds, seed, snapshot.as_deref())
        }
        Commands::Encode { label, fields } => commands::codec::encode(&label, &fields),
        Commands::Decode { flag } => commands::codec::decode(&flag),
        Commands::Labels => commands::codec::labels(),
    }
}
