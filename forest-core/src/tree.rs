use glam::{Quat, Vec3};
use rand::Rng;

use crate::{
    math::{euler_jitter, ring_vertices},
    phases::GrowthRates,
    types::NodeId,
};

/// Index of the root node of a non-empty tree.
pub const ROOT: NodeId = 0;

#[derive(Clone, Debug, PartialEq)]
pub struct BranchNode {
    pub position: Vec3,
    pub width: f32,
    pub length: f32,
    /// Unit growth direction.
    pub direction: Vec3,
    pub depth: u32,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Ring of skinning vertices around `position`; empty for incremental trees.
    pub surface_ring: Vec<Vec3>,
}

/// Marker left where a one-shot branch terminated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Leaf {
    pub node: NodeId,
    pub size: f32,
    /// Rotation taking +Z onto the branch direction, plus jitter.
    pub orientation: Quat,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TreeKind {
    /// Generated once, read-only afterwards.
    OneShot { vertices_count: usize },
    /// Grows tick by tick with its own rates.
    Incremental(GrowthRates),
}

#[derive(Clone, Debug)]
pub struct GrowthTree {
    pub nodes: Vec<BranchNode>,
    pub leaves: Vec<Leaf>,
    kind: TreeKind,
}

impl BranchNode {
    pub fn new_root(position: Vec3, direction: Vec3, width: f32, length: f32) -> Self {
        Self {
            position,
            width,
            length,
            direction: direction.normalize_or(Vec3::Y),
            depth: 0,
            parent: None,
            children: Vec::with_capacity(4),
            surface_ring: Vec::new(),
        }
    }

    pub fn new_child(
        position: Vec3,
        direction: Vec3,
        width: f32,
        length: f32,
        parent: NodeId,
        depth: u32,
    ) -> Self {
        Self {
            position,
            width,
            length,
            direction: direction.normalize_or(Vec3::Y),
            depth,
            parent: Some(parent),
            children: Vec::with_capacity(4),
            surface_ring: Vec::new(),
        }
    }

    /// End point of the branch segment starting at this node.
    #[inline]
    pub fn tip(&self) -> Vec3 {
        self.position + self.direction * self.length
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }
}

impl GrowthTree {
    pub fn from_root(kind: TreeKind, position: Vec3, normal: Vec3, width: f32, length: f32) -> Self {
        let mut tree = Self {
            nodes: vec![BranchNode::new_root(position, normal, width, length)],
            leaves: Vec::new(),
            kind,
        };
        tree.refresh_surface(ROOT);
        tree
    }

    #[inline]
    pub fn kind(&self) -> TreeKind {
        self.kind
    }

    #[inline]
    pub fn is_one_shot(&self) -> bool {
        matches!(self.kind, TreeKind::OneShot { .. })
    }

    pub fn growth_rates(&self) -> Option<GrowthRates> {
        match self.kind {
            TreeKind::Incremental(rates) => Some(rates),
            TreeKind::OneShot { .. } => None,
        }
    }

    pub fn root(&self) -> Option<&BranchNode> {
        self.nodes.first()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends a node under `parent` and links it.
    ///
    /// On one-shot trees this also refreshes the direction and surface ring
    /// of both the new node and its parent, since the parent's averaged
    /// direction depends on its children.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        position: Vec3,
        direction: Vec3,
        width: f32,
        length: f32,
    ) -> NodeId {
        let id = self.nodes.len();
        let depth = self.nodes[parent].depth + 1;
        self.nodes.push(BranchNode::new_child(
            position, direction, width, length, parent, depth,
        ));
        self.nodes[parent].children.push(id);

        if self.is_one_shot() {
            self.refresh_surface(parent);
            self.refresh_surface(id);
        }
        id
    }

    /// Records a leaf at a terminated branch.
    pub fn add_leaf(&mut self, node: NodeId, size: f32, max_degrees: f32, rng: &mut impl Rng) {
        let facing = Quat::from_rotation_arc(Vec3::Z, self.nodes[node].direction);
        self.leaves.push(Leaf {
            node,
            size,
            orientation: facing * euler_jitter(max_degrees, rng),
        });
    }

    /// Recomputes the averaged direction (below the root) and the surface
    /// ring of a one-shot node.
    pub fn refresh_surface(&mut self, id: NodeId) {
        let TreeKind::OneShot { vertices_count } = self.kind else {
            return;
        };

        let node = &self.nodes[id];
        let direction = match node.parent {
            Some(parent) if node.depth > 0 => {
                let from_parent = (node.position - self.nodes[parent].position).normalize_or_zero();
                let sum = node
                    .children
                    .iter()
                    .map(|&c| (self.nodes[c].position - node.position).normalize_or_zero())
                    .fold(from_parent, |acc, v| acc + v);
                sum.try_normalize()
                    .or_else(|| from_parent.try_normalize())
                    .unwrap_or(Vec3::Y)
            }
            _ => node.direction,
        };
        let ring = ring_vertices(node.position, direction, node.width * 0.5, vertices_count);

        let node = &mut self.nodes[id];
        node.direction = direction;
        node.surface_ring = ring;
    }

    /// Discards every node and leaf.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.leaves.clear();
    }

    pub fn terminal_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.is_terminal().then_some(i))
    }

    pub fn max_depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn one_shot(vertices_count: usize) -> GrowthTree {
        GrowthTree::from_root(
            TreeKind::OneShot { vertices_count },
            Vec3::ZERO,
            Vec3::Y,
            1.0,
            2.0,
        )
    }

    #[test]
    fn add_child_links_both_ways_and_sets_depth() {
        let mut tree = one_shot(4);
        let a = tree.add_child(ROOT, Vec3::new(0.0, 2.0, 0.0), Vec3::Y, 0.5, 1.0);
        let b = tree.add_child(a, Vec3::new(0.0, 3.0, 0.0), Vec3::Y, 0.25, 1.0);

        assert_eq!((a, b), (1, 2));
        assert_eq!(tree.nodes[ROOT].children, vec![a]);
        assert_eq!(tree.nodes[a].children, vec![b]);
        assert_eq!(tree.nodes[b].parent, Some(a));
        assert_eq!(tree.nodes[b].depth, 2);
        assert_eq!(tree.terminal_nodes().collect::<Vec<_>>(), vec![b]);
        assert_eq!(tree.max_depth(), 2);
    }

    #[test]
    fn root_direction_is_not_averaged() {
        let mut tree = one_shot(4);
        tree.add_child(ROOT, Vec3::new(2.0, 0.0, 0.0), Vec3::X, 0.5, 1.0);
        assert_eq!(tree.nodes[ROOT].direction, Vec3::Y);
    }

    #[test]
    fn parent_direction_averages_incoming_and_children() {
        let mut tree = one_shot(4);
        let a = tree.add_child(ROOT, Vec3::new(0.0, 2.0, 0.0), Vec3::Y, 0.5, 1.0);
        // A child straight along +X bends the parent's direction halfway.
        tree.add_child(a, Vec3::new(1.0, 2.0, 0.0), Vec3::X, 0.5, 1.0);

        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!(tree.nodes[a].direction.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn opposing_child_falls_back_to_parent_vector() {
        let mut tree = one_shot(4);
        let a = tree.add_child(ROOT, Vec3::new(0.0, 2.0, 0.0), Vec3::Y, 0.5, 1.0);
        // Child pointing straight back cancels the incoming vector.
        tree.add_child(a, Vec3::new(0.0, 1.0, 0.0), -Vec3::Y, 0.5, 1.0);
        assert!(tree.nodes[a].direction.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn rings_follow_width_and_direction() {
        let mut tree = one_shot(6);
        let a = tree.add_child(ROOT, Vec3::new(0.0, 2.0, 0.0), Vec3::Y, 0.5, 1.0);
        for id in [ROOT, a] {
            let node = &tree.nodes[id];
            assert_eq!(node.surface_ring.len(), 6);
            for v in &node.surface_ring {
                let off = *v - node.position;
                assert!((off.length() - node.width * 0.5).abs() < 1e-5);
                assert!(off.dot(node.direction).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn incremental_trees_have_no_rings() {
        let mut tree = GrowthTree::from_root(
            TreeKind::Incremental(GrowthRates::default()),
            Vec3::ZERO,
            Vec3::Y,
            1.0,
            5.0,
        );
        let a = tree.add_child(ROOT, Vec3::new(0.0, 5.0, 0.0), Vec3::X, 0.75, 5.0);
        assert!(tree.nodes[ROOT].surface_ring.is_empty());
        // Direction is kept as given instead of recomputed.
        assert_eq!(tree.nodes[a].direction, Vec3::X);
    }

    #[test]
    fn leaf_faces_branch_direction_without_jitter() {
        let mut tree = one_shot(4);
        let a = tree.add_child(ROOT, Vec3::new(2.0, 0.0, 0.0), Vec3::X, 0.5, 1.0);
        let mut rng = StdRng::seed_from_u64(1);
        tree.add_leaf(a, 1.5, 0.0, &mut rng);

        let leaf = tree.leaves[0];
        assert_eq!(leaf.node, a);
        assert_eq!(leaf.size, 1.5);
        assert!((leaf.orientation * Vec3::Z).abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn clear_discards_everything() {
        let mut tree = one_shot(4);
        tree.add_child(ROOT, Vec3::new(0.0, 2.0, 0.0), Vec3::Y, 0.5, 1.0);
        let mut rng = StdRng::seed_from_u64(1);
        tree.add_leaf(1, 1.0, 5.0, &mut rng);

        tree.clear();

        assert!(tree.is_empty());
        assert!(tree.leaves.is_empty());
        assert!(tree.root().is_none());
    }
}
