//! Scene management
//!
//! Nodes, cameras, the [`Scene`] that ties them to a quadtree and a
//! physics world, and the line/rect trace engine.

pub mod camera;
pub mod node;
mod physics_bridge;
pub mod render;
#[allow(clippy::module_inception)]
mod scene;
pub mod store;
pub mod trace;

#[cfg(test)]
mod tests;

pub use camera::Camera;
pub use node::{MaterialId, MeshId, NodeFlags, NodeRole, Renderable, SceneNode};
pub use render::{NullRenderer, RenderPass, Renderer};
pub use scene::{FrameStats, Scene};
pub use store::NodeStore;
pub use trace::{LayerFilter, TraceHit};
