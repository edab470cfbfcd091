//! Forest CLI - headless driver for the forest generators
//!
//! # Commands
//!
//! - `forest one-shot` - Plant fractal trees in one pass and report their shape
//! - `forest grow` - Plant incremental trees and run growth ticks
//! - `forest field` - Build an attraction density field and sample spawn points
//!
//! # Usage
//!
//! ```bash
//! # Ten fractal trees with a fixed seed
//! forest --seed 7 one-shot --trees 10
//!
//! # Grow a small forest for 20 ticks with custom tunables
//! forest --config forest.toml grow --trees 4 --ticks 20
//!
//! # Density field from 50 random points, 5 spawn samples
//! RUST_LOG=debug forest field --random 50 --samples 5
//! ```
//!
//! # Config (forest.toml)
//!
//! Every section and key is optional.
//!
//! ```toml
//! [fractal]
//! min_splits = 2
//! max_splits = 3
//! max_depth = 5
//!
//! [growth]
//! random_growth_factor = 0.1
//!
//! [field]
//! falloff = 0.1
//! ```

mod field;
mod grow;
mod one_shot;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forest_core::config::Config;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Forest CLI - headless driver for the forest generators
#[derive(Parser)]
#[command(name = "forest")]
#[command(about = "Procedural tree and forest generation")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for the random source (random when omitted)
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plant fractal trees in one pass
    OneShot(one_shot::OneShotArgs),

    /// Plant incremental trees and run growth ticks
    Grow(grow::GrowArgs),

    /// Build a density field and sample spawn points from it
    Field(field::FieldArgs),
}

/// State shared by every command.
pub struct Session {
    pub config: Config,
    pub rng: StdRng,
}

impl Session {
    fn open(config: Option<PathBuf>, seed: Option<u64>) -> Result<Self> {
        let config = match config {
            Some(path) => Config::load(&path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => Config::default(),
        };
        config.validate().context("Invalid config")?;

        let seed = seed.unwrap_or_else(|| rand::rng().random());
        log::info!("seed {}", seed);

        Ok(Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut session = Session::open(cli.config, cli.seed)?;

    match cli.command {
        Commands::OneShot(args) => one_shot::execute(args, &mut session),
        Commands::Grow(args) => grow::execute(args, &mut session),
        Commands::Field(args) => field::execute(args, &mut session),
    }
}
