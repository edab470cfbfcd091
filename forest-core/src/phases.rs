//! Incremental growth phases for a single tree.
//!
//! One growth tick is split in two:
//! 1. [`scan_phase`] is read-only. Computes grown lengths, widths and
//!    positions for every node and decides which nodes should sprout a
//!    new branch, producing a [`GrowthPlan`].
//! 2. [`apply_phase`] is the only step that mutates the tree. Commits the
//!    grown values, resolves branch directions and appends new nodes.
//!
//! Because scanning never touches the tree, many trees can be scanned in
//! parallel (see [`crate::forest::ForestManager::begin_growth`]) and the
//! plans applied afterwards on one thread.

use glam::Vec3;
use rand::Rng;

use crate::{
    config::GrowthConfig,
    error::{Error, Result},
    math::offset_direction,
    tree::{GrowthTree, ROOT, TreeKind},
    types::NodeId,
};

/// Trunk dimensions of a freshly planted incremental tree.
const TRUNK_ROOT_WIDTH: f32 = 1.0;
const TRUNK_CHILD_WIDTH: f32 = 0.75;
const TRUNK_LENGTH: f32 = 5.0;

/// New branches start at this fraction of their parent's width and length.
const BRANCH_SCALE: f32 = 0.75;

/// Per-tree growth tuning.
///
/// Percentages are fractions (`0.05` is 5%).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthRates {
    pub extra_width_to_branch: f32,
    pub length_increase: f32,
    pub width_increase: f32,
    /// Jitter bound in degrees for new branch directions.
    pub max_rotation_offset: f32,
}

impl Default for GrowthRates {
    fn default() -> Self {
        Self::from_config(&GrowthConfig::default(), 1.0)
    }
}

impl GrowthRates {
    fn from_config(cfg: &GrowthConfig, scale: f32) -> Self {
        Self {
            extra_width_to_branch: cfg.extra_width_percent_to_branch * scale,
            length_increase: cfg.percent_length_increase * scale,
            width_increase: cfg.percent_width_increase * scale,
            max_rotation_offset: cfg.max_rotation_offset,
        }
    }

    /// Draws rates for one tree.
    ///
    /// A single factor in `1 ± random_growth_factor` scales all three
    /// percentages, so a fast-growing tree also branches later.
    pub fn sample(cfg: &GrowthConfig, rng: &mut impl Rng) -> Self {
        let f = cfg.random_growth_factor.abs();
        let scale = 1.0 + rng.random_range(-f..=f);
        Self::from_config(cfg, scale)
    }
}

/// Grown values for one node, computed during the scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrownNode {
    pub position: Vec3,
    pub width: f32,
    pub length: f32,
}

/// A branch to be added during the apply phase.
///
/// The direction is resolved at apply time from the parent's grown state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BranchRequest {
    pub parent: NodeId,
    pub width: f32,
    pub length: f32,
}

/// Result of scanning one tree; consumed by [`apply_phase`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GrowthPlan {
    /// One entry per node, in arena order.
    pub grown: Vec<GrownNode>,
    pub requests: Vec<BranchRequest>,
}

impl GrowthPlan {
    /// Number of nodes the scanned tree had.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.grown.len()
    }
}

/// Computes one growth tick for `tree` without modifying it.
///
/// For every node, in arena order:
///
/// 1. `length *= 1 + length_increase`, `width *= 1 + width_increase`.
/// 2. The position is recomputed as
///    `parent.position + parent.direction * parent.length`, using the
///    parent's already-grown values. The root keeps its position.
///
/// Then, against that grown snapshot, every node whose width exceeds
/// `(1 + extra_width_to_branch)` times the summed width of its children
/// requests a new branch at 75% of its own width and length.
///
/// ### Parameters
/// - `tree` - An incremental tree; parents must precede their children
///   in the arena, which [`GrowthTree::add_child`] guarantees.
///
/// ### Returns
/// The [`GrowthPlan`] for this tick, or [`Error::FrozenTree`] for one-shot trees.
pub fn scan_phase(tree: &GrowthTree) -> Result<GrowthPlan> {
    let rates = tree.growth_rates().ok_or(Error::FrozenTree)?;

    let mut grown: Vec<GrownNode> = Vec::with_capacity(tree.nodes.len());
    for node in &tree.nodes {
        let position = match node.parent {
            Some(p) => grown[p].position + tree.nodes[p].direction * grown[p].length,
            None => node.position,
        };
        grown.push(GrownNode {
            position,
            width: node.width * (1.0 + rates.width_increase),
            length: node.length * (1.0 + rates.length_increase),
        });
    }

    let threshold = 1.0 + rates.extra_width_to_branch;
    let requests: Vec<BranchRequest> = tree
        .nodes
        .iter()
        .zip(&grown)
        .enumerate()
        .filter_map(|(id, (node, g))| {
            let combined: f32 = node.children.iter().map(|&c| grown[c].width).sum();
            (g.width > threshold * combined).then_some(BranchRequest {
                parent: id,
                width: g.width * BRANCH_SCALE,
                length: g.length * BRANCH_SCALE,
            })
        })
        .collect();

    log::trace!(
        target: "growth",
        "scanned {} nodes, {} branch requests",
        grown.len(),
        requests.len()
    );

    Ok(GrowthPlan { grown, requests })
}

/// Commits a [`GrowthPlan`] to `tree`.
///
/// Grown values are written first, so each new branch direction is a
/// bounded random rotation (`max_rotation_offset`) of the parent's
/// current direction and the branch starts at the parent's grown tip.
/// Requests are resolved in plan order, which keeps the random sequence
/// deterministic.
///
/// ### Parameters
/// - `tree` - The tree the plan was scanned from.
/// - `plan` - Output of [`scan_phase`] for this tree.
/// - `rng` - Random source for branch directions.
///
/// ### Returns
/// Ids of the new nodes in creation order, or
/// [`Error::StalePlan`] if the tree changed shape since the scan.
pub fn apply_phase(
    tree: &mut GrowthTree,
    plan: GrowthPlan,
    rng: &mut impl Rng,
) -> Result<Vec<NodeId>> {
    let rates = tree.growth_rates().ok_or(Error::FrozenTree)?;
    if plan.node_count() != tree.nodes.len() {
        return Err(Error::StalePlan {
            expected: plan.node_count(),
            found: tree.nodes.len(),
        });
    }

    for (node, g) in tree.nodes.iter_mut().zip(&plan.grown) {
        node.position = g.position;
        node.width = g.width;
        node.length = g.length;
    }

    let mut new_ids = Vec::with_capacity(plan.requests.len());
    for req in plan.requests {
        let parent = &tree.nodes[req.parent];
        let direction = offset_direction(parent.direction, rates.max_rotation_offset, rng);
        let position = parent.tip();
        new_ids.push(tree.add_child(req.parent, position, direction, req.width, req.length));
    }
    Ok(new_ids)
}

impl GrowthTree {
    /// Plants an incremental tree: a root along `normal` and one trunk
    /// segment with a jittered direction.
    pub fn new_incremental(
        position: Vec3,
        normal: Vec3,
        rates: GrowthRates,
        rng: &mut impl Rng,
    ) -> Self {
        let mut tree = GrowthTree::from_root(
            TreeKind::Incremental(rates),
            position,
            normal,
            TRUNK_ROOT_WIDTH,
            TRUNK_LENGTH,
        );
        let root = &tree.nodes[ROOT];
        let direction = offset_direction(root.direction, rates.max_rotation_offset, rng);
        let tip = root.tip();
        tree.add_child(ROOT, tip, direction, TRUNK_CHILD_WIDTH, TRUNK_LENGTH);
        tree
    }

    /// See [`scan_phase`].
    #[inline]
    pub fn scan(&self) -> Result<GrowthPlan> {
        scan_phase(self)
    }

    /// See [`apply_phase`].
    #[inline]
    pub fn apply(&mut self, plan: GrowthPlan, rng: &mut impl Rng) -> Result<Vec<NodeId>> {
        apply_phase(self, plan, rng)
    }

    /// Runs one full growth tick (scan then apply) on this tree.
    pub fn step(&mut self, rng: &mut impl Rng) -> Result<Vec<NodeId>> {
        let plan = self.scan()?;
        self.apply(plan, rng)
    }
}
