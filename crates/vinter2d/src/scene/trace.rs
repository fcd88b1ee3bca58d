//! Line and rectangle traces against indexed nodes
//!
//! Both traces ask the index for candidates, re-test each against the
//! node's exact bounds and filter by layer. Only root nodes take part.

use crate::core::LayerMatch;
use crate::foundation::collections::NodeId;
use crate::foundation::math::{Line, Point2, Rect};
use crate::spatial::SpatialQuery;

use super::node::{NodeRole, SceneNode};
use super::store::NodeStore;

/// Which node layers a trace accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerFilter {
    /// Layer must be equal
    Exact(u32),
    /// Layer must share a bit with the mask
    Mask(u32),
    /// Every layer
    Any,
}

impl LayerFilter {
    /// Build the filter a scene uses for a plain `layer` argument
    pub fn from_match(layer_match: LayerMatch, layer: u32) -> Self {
        match layer_match {
            LayerMatch::Exact => Self::Exact(layer),
            LayerMatch::Mask => Self::Mask(layer),
        }
    }

    /// Check a node layer
    pub fn matches(self, layer: u32) -> bool {
        match self {
            Self::Exact(wanted) => layer == wanted,
            Self::Mask(mask) => layer & mask != 0,
            Self::Any => true,
        }
    }
}

/// Result of a successful trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceHit {
    /// Node that was hit
    pub node: NodeId,
    /// Line traces: distance from the start to the entry point.
    /// Rect traces: distance between the rect center and the node center.
    pub distance: f32,
    /// Line traces: entry point into the node.
    /// Rect traces: center of the overlap.
    pub position: Point2,
}

fn candidates<'a>(
    store: &'a NodeStore,
    ids: Vec<NodeId>,
    filter: LayerFilter,
) -> impl Iterator<Item = (NodeId, &'a SceneNode)> {
    ids.into_iter().filter_map(move |id| {
        let node = store.get(id)?;
        (node.role() == NodeRole::Root && filter.matches(node.layer)).then_some((id, node))
    })
}

/// Nearest node whose bounds the segment touches
///
/// Ties on distance go to the higher layer, then to the node added first.
pub fn trace_line(
    index: &impl SpatialQuery,
    store: &NodeStore,
    line: &Line,
    filter: LayerFilter,
) -> Option<TraceHit> {
    let length = line.length();
    let mut best: Option<(TraceHit, u32, u64)> = None;

    for (id, node) in candidates(store, index.query_line(line), filter) {
        let Some((t, point)) = line.intersect_rect(&node.bounds()) else {
            continue;
        };
        let hit = TraceHit {
            node: id,
            distance: t * length,
            position: point,
        };
        let better = match &best {
            None => true,
            Some((current, layer, order)) => {
                hit.distance < current.distance
                    || (hit.distance == current.distance
                        && (node.layer > *layer || (node.layer == *layer && node.order() < *order)))
            }
        };
        if better {
            best = Some((hit, node.layer, node.order()));
        }
    }

    best.map(|(hit, _, _)| hit)
}

/// Highest-layer node whose bounds intersect `rect`
///
/// Ties on layer go to the node added first.
pub fn trace_rect(
    index: &impl SpatialQuery,
    store: &NodeStore,
    rect: &Rect,
    filter: LayerFilter,
) -> Option<TraceHit> {
    let mut best: Option<(NodeId, &SceneNode)> = None;

    for (id, node) in candidates(store, index.query_rect(rect), filter) {
        if !node.bounds().intersects(rect) {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, current)) => {
                node.layer > current.layer
                    || (node.layer == current.layer && node.order() < current.order())
            }
        };
        if better {
            best = Some((id, node));
        }
    }

    best.map(|(id, node)| {
        let bounds = node.bounds();
        let overlap = Rect::from_min_max(
            bounds.min().sup(&rect.min()),
            bounds.max().inf(&rect.max()),
        );
        TraceHit {
            node: id,
            distance: nalgebra::distance(&rect.center(), &bounds.center()),
            position: overlap.center(),
        }
    })
}

/// Root nodes whose bounds intersect `rect`, unclipped nodes included
pub fn nodes_in_rect(index: &impl SpatialQuery, store: &NodeStore, rect: &Rect) -> Vec<NodeId> {
    candidates(store, index.query_rect(rect), LayerFilter::Any)
        .filter(|(_, node)| node.flags().is_unclipped() || node.bounds().intersects(rect))
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_filter() {
        assert!(LayerFilter::Exact(2).matches(2));
        assert!(!LayerFilter::Exact(2).matches(3));
        assert!(LayerFilter::Mask(0b0110).matches(0b0010));
        assert!(!LayerFilter::Mask(0b0110).matches(0b1000));
        assert!(LayerFilter::Any.matches(42));
        assert_eq!(LayerFilter::from_match(LayerMatch::Mask, 4), LayerFilter::Mask(4));
    }
}
