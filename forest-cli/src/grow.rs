//! Grow command - plant incremental trees and run growth ticks

use anyhow::Result;
use clap::Args;
use forest_core::forest::ForestManager;

use crate::Session;

/// Arguments for the grow command
#[derive(Args)]
pub struct GrowArgs {
    /// Number of trees to plant
    #[arg(short, long, default_value_t = 1)]
    pub trees: usize,

    /// Number of growth ticks to run
    #[arg(long, default_value_t = 10)]
    pub ticks: u32,
}

pub fn execute(args: GrowArgs, session: &mut Session) -> Result<()> {
    let mut forest = ForestManager::new();
    for _ in 0..args.trees {
        forest.plant_incremental(&session.config, &mut session.rng);
    }

    for tick in 0..args.ticks {
        let added = forest.grow(&mut session.rng)?;
        log::info!(
            "tick {:>3}: +{} branches, {} nodes total",
            tick,
            added,
            forest.node_count()
        );
    }

    println!("=== Grown forest ({} ticks) ===", args.ticks);
    for (id, tree) in forest.trees().iter().enumerate() {
        let height = tree
            .nodes
            .iter()
            .map(|n| n.tip().y)
            .fold(f32::NEG_INFINITY, f32::max);
        println!(
            "tree {:>3}: {:>6} nodes, depth {:>3}, height {:.2}",
            id,
            tree.len(),
            tree.max_depth(),
            height
        );
    }
    Ok(())
}
