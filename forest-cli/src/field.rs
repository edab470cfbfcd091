//! Field command - build a density field and sample spawn points

use anyhow::{Result, bail};
use clap::Args;
use forest_core::{attractor::AttractionPoints, density::DensityField, forest::ForestManager};
use glam::Vec2;

use crate::Session;

/// Arguments for the field command
#[derive(Args)]
pub struct FieldArgs {
    /// Attraction point as `x,y` in cells (repeatable)
    #[arg(short, long = "point", value_parser = parse_point)]
    pub points: Vec<Vec2>,

    /// Number of random attraction points inside the grid
    #[arg(short, long, default_value_t = 0)]
    pub random: usize,

    /// Number of spawn positions to sample from the field
    #[arg(long, default_value_t = 1)]
    pub samples: usize,
}

fn parse_point(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad x in `{s}`: {e}"))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad y in `{s}`: {e}"))?;
    Ok(Vec2::new(x, y))
}

pub fn execute(args: FieldArgs, session: &mut Session) -> Result<()> {
    let cfg = session.config.field;
    if args.points.is_empty() && args.random == 0 {
        bail!("no attraction points: pass --point or --random");
    }

    let size = Vec2::new(cfg.width as f32, cfg.height as f32);
    let mut points = args.points;
    points.extend(
        AttractionPoints::random_in_rect(size * 0.5, size * 0.5, args.random, &mut session.rng)
            .points,
    );

    let field = DensityField::build(&points, cfg.width, cfg.height, cfg.falloff);

    println!("=== Density field {}x{} ===", field.width(), field.height());
    println!("Points: {}", points.len());
    println!("Cutoff: {:.2} cells", field.cutoff());
    println!("Peak: {}", field.max_intensity());
    println!("Total: {}", field.total_intensity());
    if field.total_intensity() == 0 {
        log::warn!("field is empty, samples fall back to the origin cell");
    }

    let forest = ForestManager::new();
    let bound = session.config.forest.max_generation_distance;
    println!();
    for i in 0..args.samples {
        let spawn = forest.spawn_from_field(&field, bound, &mut session.rng);
        println!(
            "sample {:>3}: ({:>7.2}, {:>7.2})",
            i, spawn.position.x, spawn.position.z
        );
    }
    Ok(())
}
