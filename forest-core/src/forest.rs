//! A collection of trees with spawn placement and parallel growth ticks.
//!
//! A growth tick over the whole forest is a two-step protocol:
//!
//! 1. [`ForestManager::begin_growth`] scans every incremental tree in
//!    parallel and returns a [`GrowthBatch`]. Nothing is mutated; the
//!    collect at the end of the parallel scan is the barrier.
//! 2. [`ForestManager::apply_growth`] applies the batch on the calling
//!    thread, the only place new nodes are created.
//!
//! While a batch is outstanding the forest refuses a second
//! `begin_growth` and any removal or clearing that would invalidate tree
//! indices or node counts. Dropping work is done with
//! [`ForestManager::cancel_growth`].

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;

use crate::{
    config::Config,
    density::DensityField,
    error::{Error, Result},
    fractal::TreeSeed,
    math::{grid_to_ground, min_distance},
    phases::{GrowthPlan, GrowthRates, apply_phase, scan_phase},
    tree::GrowthTree,
    types::TreeId,
};

/// Default number of candidates tried by [`ForestManager::find_spawn_position`].
pub const DEFAULT_SPAWN_CANDIDATES: usize = 10;

/// Where and how a tree is planted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnPoint {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Scanned growth for every incremental tree of one tick.
#[derive(Debug)]
pub struct GrowthBatch {
    tick: u64,
    plans: Vec<(TreeId, GrowthPlan)>,
}

impl GrowthBatch {
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of trees with a plan in this batch.
    #[inline]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Branches that applying this batch will create.
    pub fn pending_branches(&self) -> usize {
        self.plans.iter().map(|(_, p)| p.requests.len()).sum()
    }
}

/// Draws `count` ground candidates in `[-bound, bound]²`.
///
/// Each candidate consumes two draws, x then z.
pub fn draw_spawn_candidates(count: usize, bound: f32, rng: &mut impl Rng) -> Vec<Vec3> {
    let b = bound.abs();
    (0..count)
        .map(|_| {
            let x = rng.random_range(-b..=b);
            let z = rng.random_range(-b..=b);
            Vec3::new(x, 0.0, z)
        })
        .collect()
}

/// Index of the candidate farthest from its nearest occupied position.
///
/// With no occupants every candidate scores infinity. Ties go to the
/// earliest candidate. Returns `None` only for an empty candidate list.
pub fn pick_farthest(candidates: &[Vec3], occupied: &[Vec3]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &c) in candidates.iter().enumerate() {
        let score = min_distance(c, occupied.iter().copied());
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

fn spawn_among(occupied: &[Vec3], count: usize, bound: f32, rng: &mut impl Rng) -> SpawnPoint {
    let candidates = draw_spawn_candidates(count, bound, rng);
    let position = pick_farthest(&candidates, occupied)
        .map(|i| candidates[i])
        .unwrap_or(Vec3::ZERO);
    SpawnPoint {
        position,
        normal: Vec3::Y,
    }
}

#[derive(Debug, Default)]
pub struct ForestManager {
    trees: Vec<GrowthTree>,
    next_tick: u64,
    in_flight: Option<u64>,
}

impl ForestManager {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn trees(&self) -> &[GrowthTree] {
        &self.trees
    }

    pub fn tree(&self, id: TreeId) -> Option<&GrowthTree> {
        self.trees.get(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// `true` while a [`GrowthBatch`] is outstanding.
    #[inline]
    pub fn is_growing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Total node count across all trees.
    pub fn node_count(&self) -> usize {
        self.trees.iter().map(GrowthTree::len).sum()
    }

    /// Root positions of all non-empty trees.
    pub fn root_positions(&self) -> Vec<Vec3> {
        self.trees
            .iter()
            .filter_map(|t| t.root().map(|r| r.position))
            .collect()
    }

    /// Appends a tree. Allowed during a growth tick since indices of
    /// existing trees do not move.
    pub fn add_tree(&mut self, tree: GrowthTree) -> TreeId {
        self.trees.push(tree);
        self.trees.len() - 1
    }

    pub fn remove_tree(&mut self, id: TreeId) -> Result<GrowthTree> {
        if self.is_growing() {
            return Err(Error::GrowthInProgress);
        }
        if id >= self.trees.len() {
            return Err(Error::TreeIndex(id));
        }
        Ok(self.trees.remove(id))
    }

    /// Discards all nodes of one tree, keeping its slot.
    pub fn clear_tree(&mut self, id: TreeId) -> Result<()> {
        if self.is_growing() {
            return Err(Error::GrowthInProgress);
        }
        self.trees.get_mut(id).ok_or(Error::TreeIndex(id))?.clear();
        Ok(())
    }

    /// Picks a ground position far from existing trees.
    ///
    /// Draws `candidate_count` candidates in `[-bound, bound]²` (y = 0)
    /// and keeps the one whose distance to the nearest existing root is
    /// largest. This is a greedy best-of-N, not a global optimum. The
    /// normal is always +Y.
    pub fn find_spawn_position(
        &self,
        candidate_count: usize,
        bound: f32,
        rng: &mut impl Rng,
    ) -> SpawnPoint {
        spawn_among(&self.root_positions(), candidate_count, bound, rng)
    }

    /// Picks a ground position by sampling a density field.
    ///
    /// The sampled cell is mapped linearly from the field onto
    /// `[-bound, bound]²`.
    pub fn spawn_from_field(&self, field: &DensityField, bound: f32, rng: &mut impl Rng) -> SpawnPoint {
        let cell = field.sample_weighted(rng).as_vec2();
        let size = field.size().as_vec2() - Vec2::ONE;
        let position = grid_to_ground(cell, size, bound);
        SpawnPoint {
            position,
            normal: Vec3::Y,
        }
    }

    /// Spawns and generates one one-shot tree.
    pub fn plant_one_shot(&mut self, cfg: &Config, rng: &mut impl Rng) -> TreeId {
        let spawn = self.find_spawn_position(
            cfg.forest.spawn_candidates,
            cfg.forest.max_generation_distance,
            rng,
        );
        let seed = cfg.fractal.sample_seed(spawn.position, spawn.normal, rng);
        let tree = GrowthTree::generate(&cfg.fractal, &seed, rng);
        self.add_tree(tree)
    }

    /// Spawns and generates `count` one-shot trees.
    ///
    /// Spawn points and per-tree seeds are drawn sequentially from `rng`,
    /// since each placement depends on the ones before it. Generation then
    /// runs in parallel with one `StdRng` per tree, and the trees are
    /// appended in spawn order once all of them are done.
    pub fn plant_one_shot_batch(
        &mut self,
        count: usize,
        cfg: &Config,
        rng: &mut impl Rng,
    ) -> Vec<TreeId> {
        let mut occupied = self.root_positions();
        let mut jobs: Vec<(TreeSeed, u64)> = Vec::with_capacity(count);
        for _ in 0..count {
            let spawn = spawn_among(
                &occupied,
                cfg.forest.spawn_candidates,
                cfg.forest.max_generation_distance,
                rng,
            );
            occupied.push(spawn.position);
            let seed = cfg.fractal.sample_seed(spawn.position, spawn.normal, rng);
            jobs.push((seed, rng.random()));
        }

        let fractal = cfg.fractal;
        let trees: Vec<GrowthTree> = jobs
            .par_iter()
            .map(|(seed, rng_seed)| {
                let mut tree_rng = StdRng::seed_from_u64(*rng_seed);
                GrowthTree::generate(&fractal, seed, &mut tree_rng)
            })
            .collect();

        log::info!(target: "forest", "planted {} one-shot trees", trees.len());
        trees.into_iter().map(|t| self.add_tree(t)).collect()
    }

    /// Spawns one incremental tree with freshly sampled growth rates.
    pub fn plant_incremental(&mut self, cfg: &Config, rng: &mut impl Rng) -> TreeId {
        let spawn = self.find_spawn_position(
            cfg.forest.spawn_candidates,
            cfg.forest.max_generation_distance,
            rng,
        );
        let rates = GrowthRates::sample(&cfg.growth, rng);
        let tree = GrowthTree::new_incremental(spawn.position, spawn.normal, rates, rng);
        log::debug!(target: "forest", "planted incremental tree at {:?}", spawn.position);
        self.add_tree(tree)
    }

    /// Scans all incremental trees in parallel and opens a growth tick.
    ///
    /// One-shot trees are skipped. Fails with [`Error::GrowthInProgress`]
    /// if a previous batch has been neither applied nor cancelled.
    pub fn begin_growth(&mut self) -> Result<GrowthBatch> {
        if self.is_growing() {
            return Err(Error::GrowthInProgress);
        }

        let plans: Vec<(TreeId, GrowthPlan)> = self
            .trees
            .par_iter()
            .enumerate()
            .filter(|(_, tree)| !tree.is_one_shot())
            .map(|(id, tree)| scan_phase(tree).map(|plan| (id, plan)))
            .collect::<Result<_>>()?;

        let tick = self.next_tick;
        self.next_tick += 1;
        self.in_flight = Some(tick);

        let batch = GrowthBatch { tick, plans };
        log::debug!(
            target: "forest",
            "tick {}: scanned {} trees, {} pending branches",
            tick,
            batch.len(),
            batch.pending_branches()
        );
        Ok(batch)
    }

    fn close_tick(&mut self, batch: &GrowthBatch) -> Result<()> {
        match self.in_flight {
            None => Err(Error::NoGrowthInProgress),
            Some(t) if t != batch.tick => Err(Error::StaleBatch {
                batch: batch.tick,
                in_flight: t,
            }),
            Some(_) => {
                self.in_flight = None;
                Ok(())
            }
        }
    }

    /// Applies a batch from [`Self::begin_growth`] and closes the tick.
    ///
    /// ### Returns
    /// The number of branches added across the forest.
    pub fn apply_growth(&mut self, batch: GrowthBatch, rng: &mut impl Rng) -> Result<usize> {
        self.close_tick(&batch)?;

        let mut added = 0;
        for (id, plan) in batch.plans {
            let tree = self.trees.get_mut(id).ok_or(Error::TreeIndex(id))?;
            added += apply_phase(tree, plan, rng)?.len();
        }
        log::debug!(target: "forest", "tick {}: added {} branches", batch.tick, added);
        Ok(added)
    }

    /// Drops a batch without applying any of it and closes the tick.
    pub fn cancel_growth(&mut self, batch: GrowthBatch) -> Result<()> {
        self.close_tick(&batch)?;
        log::debug!(target: "forest", "tick {} cancelled", batch.tick);
        Ok(())
    }

    /// Runs a full growth tick: parallel scan, then apply.
    pub fn grow(&mut self, rng: &mut impl Rng) -> Result<usize> {
        let batch = self.begin_growth()?;
        self.apply_growth(batch, rng)
    }
}
