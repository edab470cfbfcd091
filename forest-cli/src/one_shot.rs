//! One-shot command - plant fractal trees and report them

use anyhow::Result;
use clap::Args;
use forest_core::forest::ForestManager;

use crate::Session;

/// Arguments for the one-shot command
#[derive(Args)]
pub struct OneShotArgs {
    /// Number of trees to plant
    #[arg(short, long, default_value_t = 1)]
    pub trees: usize,

    /// Generate trees on the rayon pool instead of one after another
    #[arg(long)]
    pub parallel: bool,
}

pub fn execute(args: OneShotArgs, session: &mut Session) -> Result<()> {
    let mut forest = ForestManager::new();
    if args.parallel {
        forest.plant_one_shot_batch(args.trees, &session.config, &mut session.rng);
    } else {
        for _ in 0..args.trees {
            forest.plant_one_shot(&session.config, &mut session.rng);
        }
    }

    println!("=== One-shot forest ===");
    for (id, tree) in forest.trees().iter().enumerate() {
        let Some(root) = tree.root() else {
            continue;
        };
        println!(
            "tree {:>3}: root ({:>7.2}, {:>7.2}), {:>5} nodes, {:>4} leaves, depth {}",
            id,
            root.position.x,
            root.position.z,
            tree.len(),
            tree.leaves.len(),
            tree.max_depth()
        );
    }
    println!();
    println!("Total nodes: {}", forest.node_count());
    Ok(())
}
