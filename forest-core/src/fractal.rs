//! One-shot fractal tree generation.
//!
//! A tree is grown in a single call: a jittered trunk above the root, then
//! repeated even splits with depth-dependent jitter until `max_depth`,
//! where each branch ends in a [`crate::tree::Leaf`].

use glam::{FloatExt, Vec3};
use rand::Rng;

use crate::{
    config::FractalConfig,
    math::{axis_angle_degrees, euler_jitter, offset_direction},
    tree::{GrowthTree, ROOT, TreeKind},
    types::NodeId,
};

const MIN_LEAF_SIZE: f32 = 0.5;
const MAX_LEAF_SIZE: f32 = 2.0;

/// Starting dimensions of a single one-shot tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeSeed {
    pub position: Vec3,
    pub normal: Vec3,
    pub width: f32,
    pub length: f32,
    pub leaf_size: f32,
    /// Depth at which branches stop splitting and end in a leaf.
    pub max_depth: u32,
}

impl FractalConfig {
    /// Draws a [`TreeSeed`] for a tree planted at `position`.
    ///
    /// One random fraction drives width, length, leaf size and depth
    /// together, so larger trees are also deeper.
    pub fn sample_seed(&self, position: Vec3, normal: Vec3, rng: &mut impl Rng) -> TreeSeed {
        let t: f32 = rng.random_range(0.0..=1.0);
        TreeSeed {
            position,
            normal,
            width: self.min_starting_width.lerp(self.max_starting_width, t),
            length: self.min_starting_length.lerp(self.max_starting_length, t),
            leaf_size: MIN_LEAF_SIZE.lerp(MAX_LEAF_SIZE, t),
            max_depth: (self.min_depth as f32).lerp(self.max_depth as f32, t).round() as u32,
        }
    }

    fn split_range(&self) -> (u32, u32) {
        let lo = self.min_splits.max(1);
        (lo, self.max_splits.max(lo))
    }
}

impl GrowthTree {
    /// Generates a complete one-shot tree.
    ///
    /// The root sits at `seed.position` facing `seed.normal`. A trunk node
    /// is placed `seed.length` away along the normal rotated by a jitter of
    /// at most `max_rotation_angle_base` degrees per axis. From there every
    /// node below `seed.max_depth` splits into `min_splits..=max_splits`
    /// children spread evenly around its direction, each jittered by up to
    /// `max_rotation_angle + angle_increase_per_depth * depth` degrees.
    /// Children get `width / splits` and `length * length_decay`.
    ///
    /// Expansion uses an explicit stack, first child first, so the random
    /// draw order and node order are fixed for a given `rng` state.
    pub fn generate(cfg: &FractalConfig, seed: &TreeSeed, rng: &mut impl Rng) -> Self {
        let normal = seed.normal.normalize_or(Vec3::Y);
        let mut tree = GrowthTree::from_root(
            TreeKind::OneShot {
                vertices_count: cfg.vertices_count,
            },
            seed.position,
            normal,
            seed.width,
            seed.length,
        );

        let trunk_dir = offset_direction(normal, cfg.max_rotation_angle_base, rng);
        let trunk = tree.add_child(
            ROOT,
            seed.position + trunk_dir * seed.length,
            trunk_dir,
            seed.width,
            seed.length,
        );

        let (min_splits, max_splits) = cfg.split_range();
        let mut stack: Vec<NodeId> = vec![trunk];

        while let Some(id) = stack.pop() {
            let depth = tree.nodes[id].depth;
            if depth >= seed.max_depth {
                tree.add_leaf(id, seed.leaf_size, cfg.max_rotation_angle, rng);
                continue;
            }

            let splits = rng.random_range(min_splits..=max_splits);
            let spread = 360.0 / splits as f32;
            let bound = cfg.max_rotation_angle + cfg.angle_increase_per_depth * depth as f32;

            for i in 0..splits {
                // The parent's direction is re-averaged after every child.
                let (position, direction, width, length) = {
                    let parent = &tree.nodes[id];
                    let base = axis_angle_degrees(parent.direction, spread * i as f32);
                    let jitter = euler_jitter(bound, rng);
                    let direction = (base * jitter) * parent.direction;
                    (
                        parent.position + direction * parent.length,
                        direction,
                        parent.width / splits as f32,
                        parent.length * cfg.length_decay,
                    )
                };
                tree.add_child(id, position, direction, width, length);
            }
            stack.extend(tree.nodes[id].children.iter().rev().copied());
        }

        log::debug!(
            target: "fractal",
            "generated tree at {:?}: {} nodes, {} leaves, depth {}",
            seed.position,
            tree.len(),
            tree.leaves.len(),
            tree.max_depth()
        );
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn seed(max_depth: u32) -> TreeSeed {
        TreeSeed {
            position: Vec3::new(1.0, 0.0, -2.0),
            normal: Vec3::Y,
            width: 0.4,
            length: 1.0,
            leaf_size: 1.0,
            max_depth,
        }
    }

    fn binary() -> FractalConfig {
        FractalConfig {
            min_splits: 2,
            max_splits: 2,
            ..FractalConfig::default()
        }
    }

    #[test]
    fn binary_depth_three_has_eight_nodes() {
        let mut rng = StdRng::seed_from_u64(42);
        let tree = GrowthTree::generate(&binary(), &seed(3), &mut rng);

        // root + trunk + 2 + 4
        assert_eq!(tree.len(), 8);
        assert_eq!(tree.leaves.len(), 4);
        assert_eq!(tree.nodes[0].depth, 0);
        assert_eq!(tree.nodes[1].depth, 1);
    }

    #[test]
    fn depths_are_bounded_and_max_depth_nodes_are_terminal() {
        let cfg = FractalConfig::default();
        for s in 0..10 {
            let mut rng = StdRng::seed_from_u64(s);
            let tree = GrowthTree::generate(&cfg, &seed(4), &mut rng);

            for node in &tree.nodes {
                assert!(node.depth <= 4);
                if node.depth == 4 {
                    assert!(node.is_terminal());
                }
            }
            let leaf_nodes: Vec<NodeId> = tree.leaves.iter().map(|l| l.node).collect();
            let mut terminal: Vec<NodeId> = tree.terminal_nodes().collect();
            terminal.sort_unstable();
            let mut sorted = leaf_nodes.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, terminal);
        }
    }

    #[test]
    fn split_counts_and_widths_follow_parents() {
        let cfg = FractalConfig::default();
        let mut rng = StdRng::seed_from_u64(8);
        let tree = GrowthTree::generate(&cfg, &seed(4), &mut rng);

        for node in tree.nodes.iter().skip(1) {
            let n = node.children.len() as u32;
            if n == 0 {
                continue;
            }
            assert!((cfg.min_splits..=cfg.max_splits).contains(&n));
            for &c in &node.children {
                let child = &tree.nodes[c];
                assert!((child.width - node.width / n as f32).abs() < 1e-6);
                assert!((child.length - node.length * cfg.length_decay).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn children_sit_one_parent_length_away() {
        let mut rng = StdRng::seed_from_u64(17);
        let tree = GrowthTree::generate(&FractalConfig::default(), &seed(5), &mut rng);

        for node in &tree.nodes {
            if let Some(p) = node.parent {
                let parent = &tree.nodes[p];
                let d = node.position.distance(parent.position);
                assert!((d - parent.length).abs() < 1e-4, "{d} vs {}", parent.length);
            }
        }
    }

    #[test]
    fn shallow_depth_degenerates_to_trunk() {
        for max_depth in [0, 1] {
            let mut rng = StdRng::seed_from_u64(2);
            let tree = GrowthTree::generate(&FractalConfig::default(), &seed(max_depth), &mut rng);
            assert_eq!(tree.len(), 2);
            assert_eq!(tree.leaves.len(), 1);
            assert_eq!(tree.leaves[0].node, 1);
        }
    }

    #[test]
    fn root_keeps_normal_and_every_node_has_a_ring() {
        let cfg = FractalConfig::default();
        let mut rng = StdRng::seed_from_u64(4);
        let tree = GrowthTree::generate(&cfg, &seed(3), &mut rng);

        assert_eq!(tree.nodes[0].direction, Vec3::Y);
        for node in &tree.nodes {
            assert_eq!(node.surface_ring.len(), cfg.vertices_count);
            assert!((node.direction.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn same_seed_same_tree() {
        let cfg = FractalConfig::default();
        let a = GrowthTree::generate(&cfg, &seed(5), &mut StdRng::seed_from_u64(1234));
        let b = GrowthTree::generate(&cfg, &seed(5), &mut StdRng::seed_from_u64(1234));

        assert_eq!(a.nodes, b.nodes);
        assert_eq!(a.leaves, b.leaves);
    }

    #[test]
    fn sample_seed_scales_together() {
        let cfg = FractalConfig::default();
        let mut rng = StdRng::seed_from_u64(10);
        for _ in 0..20 {
            let s = cfg.sample_seed(Vec3::ZERO, Vec3::Y, &mut rng);
            let t = (s.width - cfg.min_starting_width)
                / (cfg.max_starting_width - cfg.min_starting_width);
            let expected_len = cfg.min_starting_length.lerp(cfg.max_starting_length, t);
            assert!((s.length - expected_len).abs() < 1e-5);
            assert!((MIN_LEAF_SIZE..=MAX_LEAF_SIZE).contains(&s.leaf_size));
            assert!((cfg.min_depth..=cfg.max_depth).contains(&s.max_depth));
        }
    }
}
