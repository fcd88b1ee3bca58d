//! Renderer seam
//!
//! The scene never draws anything itself. For every camera it builds a
//! [`RenderPass`] of visible nodes and hands it to a [`Renderer`].

use crate::foundation::collections::{CameraId, NodeId};

use super::camera::Camera;
use super::node::SceneNode;
use super::store::NodeStore;

/// Nodes to draw for one camera
#[derive(Debug, Clone, Copy)]
pub struct RenderPass<'a> {
    /// Camera being drawn
    pub camera_id: CameraId,
    /// Its view
    pub camera: &'a Camera,
    /// Visible root nodes in index order; children are reached through them
    pub nodes: &'a [NodeId],
    /// Screen-space nodes, drawn after the world
    pub ui_nodes: &'a [NodeId],
    /// Storage for resolving ids
    pub store: &'a NodeStore,
    /// Frame time in seconds
    pub timestep: f64,
}

impl<'a> RenderPass<'a> {
    /// Resolve an id
    pub fn node(&self, id: NodeId) -> Option<&'a SceneNode> {
        self.store.get(id)
    }

    /// Visible root nodes
    pub fn world_nodes(&self) -> impl Iterator<Item = &'a SceneNode> + '_ {
        self.nodes.iter().filter_map(|&id| self.store.get(id))
    }

    /// Screen-space nodes
    pub fn ui(&self) -> impl Iterator<Item = &'a SceneNode> + '_ {
        self.ui_nodes.iter().filter_map(|&id| self.store.get(id))
    }
}

/// Consumer of render passes
pub trait Renderer {
    /// Draw one camera's view
    fn render(&mut self, pass: &RenderPass<'_>);
}

/// Renderer that draws nothing, for headless scenes
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _pass: &RenderPass<'_>) {}
}
