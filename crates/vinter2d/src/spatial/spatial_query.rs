//! Abstract spatial query interface used by the scene and the trace engine
//!
//! The scene only talks to its index through this trait, so the quadtree
//! can be swapped for another partitioning scheme (grid, BVH, flat list)
//! without touching scene or trace code.

use crate::foundation::collections::NodeId;
use crate::foundation::math::{Line, Rect};
use crate::scene::NodeFlags;

/// Spatial index over scene nodes
///
/// Queries are broad phase: they return every node whose storage cell
/// touches the query shape. Callers that need exact answers re-test each
/// candidate against its bounds.
pub trait SpatialQuery {
    /// Index a node with the given bounds
    ///
    /// Returns `false` if the node could not be placed (bounds entirely
    /// outside the indexed area). Inserting a node that is already indexed
    /// behaves like [`update`](Self::update).
    fn insert(&mut self, node: NodeId, bounds: Rect, flags: NodeFlags) -> bool;

    /// Remove a node; returns `false` if it was not indexed
    fn remove(&mut self, node: NodeId) -> bool;

    /// Re-place a node after its bounds or flags changed
    fn update(&mut self, node: NodeId, bounds: Rect, flags: NodeFlags) -> bool;

    /// Candidate nodes whose storage touches `rect`
    fn query_rect(&self, rect: &Rect) -> Vec<NodeId>;

    /// Candidate nodes whose storage the segment passes through
    fn query_line(&self, line: &Line) -> Vec<NodeId>;

    /// Bounds recorded for a node at its last insert or update
    fn bounds_of(&self, node: NodeId) -> Option<Rect>;

    /// Check if a node is indexed
    fn contains(&self, node: NodeId) -> bool {
        self.bounds_of(node).is_some()
    }

    /// Drop every entry
    fn clear(&mut self);

    /// Number of indexed nodes
    fn len(&self) -> usize;

    /// Check if nothing is indexed
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
