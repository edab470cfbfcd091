/// Identifier for a node in a [`crate::tree::GrowthTree`].
///
/// This is an index into `GrowthTree::nodes`, and is only meaningful within
/// the lifetime of a given `GrowthTree` instance.
pub type NodeId = usize;

/// Identifier for a tree owned by a [`crate::forest::ForestManager`].
///
/// Indices stay stable while a growth tick is in flight, because removal
/// is refused until the tick is applied or cancelled.
pub type TreeId = usize;
