//! Quadtree spatial partitioning structure
//!
//! Divides the world rectangle into four equal quadrants, recursively, up
//! to a fixed depth. A node is stored in the deepest bucket that fully
//! contains its bounds; bounds that straddle a quadrant border stay in the
//! parent bucket. There is no density-driven subdivision: heavy clustering
//! degrades to a linear scan of one bucket, which is acceptable for 2D
//! levels whose content is spread roughly evenly.
//!
//! Buckets live in an arena and are addressed by index. Children are
//! created the first time an insert descends into them. A side table maps
//! every indexed node to its bucket so removal never searches the tree.

use std::collections::HashMap;

use crate::foundation::collections::NodeId;
use crate::foundation::math::{Line, Rect};
use crate::scene::NodeFlags;
use crate::spatial::SpatialQuery;

/// Index of a bucket inside the quadtree arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketId(usize);

impl BucketId {
    /// The bucket covering the whole world
    pub const ROOT: BucketId = BucketId(0);
}

/// Single bucket in the quadtree hierarchy
#[derive(Debug, Clone)]
struct Bucket {
    /// World-space bounds of this bucket
    bounds: Rect,
    /// Depth in the tree (0 = root)
    depth: u32,
    /// Child buckets in quadrant order, once created
    children: Option<[BucketId; 4]>,
    /// Nodes stored here, in insertion order
    entries: Vec<NodeId>,
}

impl Bucket {
    fn new(bounds: Rect, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            children: None,
            entries: Vec::new(),
        }
    }
}

/// Where an indexed node lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Stored in a bucket
    Bucket(BucketId),
    /// Dynamic node, returned by every query without a bucket
    Unclipped,
}

#[derive(Debug, Clone, Copy)]
struct Location {
    slot: Slot,
    bounds: Rect,
}

/// Statistics about a quadtree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadtreeStats {
    /// Buckets allocated so far
    pub bucket_count: usize,
    /// Deepest allocated bucket
    pub deepest_level: u32,
    /// Nodes stored in buckets
    pub bucketed_nodes: usize,
    /// Dynamic nodes kept outside the buckets
    pub unclipped_nodes: usize,
}

/// Fixed-depth quadtree over scene nodes
#[derive(Debug, Clone)]
pub struct Quadtree {
    /// Bucket arena, index 0 is the root
    buckets: Vec<Bucket>,
    /// Maximum subdivision depth
    max_depth: u32,
    /// Node → bucket side table
    locations: HashMap<NodeId, Location>,
    /// Dynamic nodes in insertion order
    unclipped: Vec<NodeId>,
}

impl Quadtree {
    /// Create a quadtree over `bounds` that subdivides at most `max_depth` times
    pub fn new(bounds: Rect, max_depth: u32) -> Self {
        Self {
            buckets: vec![Bucket::new(bounds, 0)],
            max_depth,
            locations: HashMap::new(),
            unclipped: Vec::new(),
        }
    }

    /// World bounds covered by the root bucket
    pub fn bounds(&self) -> Rect {
        self.buckets[BucketId::ROOT.0].bounds
    }

    /// Maximum subdivision depth
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Bounds of the bucket a node is stored in
    ///
    /// `None` for nodes that are not indexed and for dynamic nodes, which
    /// have no bucket.
    pub fn bucket_bounds(&self, node: NodeId) -> Option<Rect> {
        match self.locations.get(&node)?.slot {
            Slot::Bucket(id) => Some(self.buckets[id.0].bounds),
            Slot::Unclipped => None,
        }
    }

    /// Bucket a node is stored in
    pub fn bucket_of(&self, node: NodeId) -> Option<BucketId> {
        match self.locations.get(&node)?.slot {
            Slot::Bucket(id) => Some(id),
            Slot::Unclipped => None,
        }
    }

    /// Collect allocation statistics
    pub fn stats(&self) -> QuadtreeStats {
        QuadtreeStats {
            bucket_count: self.buckets.len(),
            deepest_level: self.buckets.iter().map(|b| b.depth).max().unwrap_or(0),
            bucketed_nodes: self.buckets.iter().map(|b| b.entries.len()).sum(),
            unclipped_nodes: self.unclipped.len(),
        }
    }

    /// Child buckets of `parent`, allocating them on first use
    fn ensure_children(&mut self, parent: BucketId) -> [BucketId; 4] {
        if let Some(children) = self.buckets[parent.0].children {
            return children;
        }

        let (bounds, depth) = {
            let bucket = &self.buckets[parent.0];
            (bucket.bounds, bucket.depth)
        };

        let first = self.buckets.len();
        for quadrant in 0..4 {
            self.buckets.push(Bucket::new(bounds.quadrant(quadrant), depth + 1));
        }

        let children = [
            BucketId(first),
            BucketId(first + 1),
            BucketId(first + 2),
            BucketId(first + 3),
        ];
        self.buckets[parent.0].children = Some(children);
        children
    }

    /// Decide where a node with these bounds and flags belongs
    fn placement(&mut self, bounds: &Rect, flags: NodeFlags) -> Option<Slot> {
        if flags.contains(NodeFlags::DYNAMIC) {
            return Some(Slot::Unclipped);
        }

        // No-clip nodes sit in the root, which every query visits
        if flags.contains(NodeFlags::NO_CLIP) {
            return Some(Slot::Bucket(BucketId::ROOT));
        }

        if !self.bounds().intersects(bounds) {
            return None;
        }

        let mut current = BucketId::ROOT;
        while self.buckets[current.0].depth < self.max_depth {
            let parent_bounds = self.buckets[current.0].bounds;
            let Some(quadrant) = (0..4).find(|&q| parent_bounds.quadrant(q).contains_rect(bounds)) else {
                break;
            };
            current = self.ensure_children(current)[quadrant];
        }

        Some(Slot::Bucket(current))
    }

    fn attach(&mut self, node: NodeId, slot: Slot) {
        match slot {
            Slot::Bucket(id) => self.buckets[id.0].entries.push(node),
            Slot::Unclipped => self.unclipped.push(node),
        }
    }

    fn detach(&mut self, node: NodeId, slot: Slot) {
        // `Vec::remove` keeps the remaining entries in insertion order
        let list = match slot {
            Slot::Bucket(id) => &mut self.buckets[id.0].entries,
            Slot::Unclipped => &mut self.unclipped,
        };
        if let Some(index) = list.iter().position(|&entry| entry == node) {
            list.remove(index);
        }
    }

    /// Depth-first walk over every bucket accepted by `visit_bucket`
    ///
    /// Dynamic nodes come first, then the root (always visited), then
    /// children in quadrant order.
    fn collect(&self, visit_bucket: impl Fn(&Rect) -> bool) -> Vec<NodeId> {
        let mut results = self.unclipped.clone();
        let mut stack = vec![BucketId::ROOT];

        while let Some(id) = stack.pop() {
            let bucket = &self.buckets[id.0];
            if id != BucketId::ROOT && !visit_bucket(&bucket.bounds) {
                continue;
            }

            results.extend_from_slice(&bucket.entries);

            if let Some(children) = bucket.children {
                stack.extend(children.iter().rev());
            }
        }

        results
    }
}

impl SpatialQuery for Quadtree {
    fn insert(&mut self, node: NodeId, bounds: Rect, flags: NodeFlags) -> bool {
        if self.locations.contains_key(&node) {
            return self.update(node, bounds, flags);
        }

        let Some(slot) = self.placement(&bounds, flags) else {
            log::debug!("Node {:?} at {:?} lies outside the quadtree bounds, not indexed", node, bounds);
            return false;
        };

        self.attach(node, slot);
        self.locations.insert(node, Location { slot, bounds });
        true
    }

    fn remove(&mut self, node: NodeId) -> bool {
        match self.locations.remove(&node) {
            Some(location) => {
                self.detach(node, location.slot);
                true
            }
            None => false,
        }
    }

    fn update(&mut self, node: NodeId, bounds: Rect, flags: NodeFlags) -> bool {
        let Some(previous) = self.locations.get(&node).copied() else {
            return self.insert(node, bounds, flags);
        };

        // Dynamic nodes only refresh their recorded bounds
        if previous.slot == Slot::Unclipped && flags.contains(NodeFlags::DYNAMIC) {
            if let Some(location) = self.locations.get_mut(&node) {
                location.bounds = bounds;
            }
            return true;
        }

        match self.placement(&bounds, flags) {
            Some(slot) if slot == previous.slot => {
                // Same bucket: keep the node's position in the entry list
                if let Some(location) = self.locations.get_mut(&node) {
                    location.bounds = bounds;
                }
                true
            }
            Some(slot) => {
                self.detach(node, previous.slot);
                self.attach(node, slot);
                self.locations.insert(node, Location { slot, bounds });
                true
            }
            None => {
                log::warn!("Node {:?} moved outside the quadtree bounds to {:?}, dropped from index", node, bounds);
                self.remove(node);
                false
            }
        }
    }

    fn query_rect(&self, rect: &Rect) -> Vec<NodeId> {
        self.collect(|bounds| bounds.intersects(rect))
    }

    fn query_line(&self, line: &Line) -> Vec<NodeId> {
        self.collect(|bounds| line.intersect_rect(bounds).is_some())
    }

    fn bounds_of(&self, node: NodeId) -> Option<Rect> {
        self.locations.get(&node).map(|location| location.bounds)
    }

    fn clear(&mut self) {
        let bounds = self.bounds();
        self.buckets.clear();
        self.buckets.push(Bucket::new(bounds, 0));
        self.locations.clear();
        self.unclipped.clear();
    }

    fn len(&self) -> usize {
        self.locations.len()
    }
}
