//! Spatial partitioning data structures
//!
//! Provides the quadtree that indexes scene nodes for visibility
//! queries and traces.

mod quadtree;
pub mod spatial_query;

pub use quadtree::{BucketId, Quadtree, QuadtreeStats};
pub use spatial_query::SpatialQuery;
