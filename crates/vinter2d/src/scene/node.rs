//! Scene nodes
//!
//! A node is a positioned, sized rectangle with a rotation, a layer and an
//! optional renderable payload. Nodes are stored in a
//! [`NodeStore`](super::NodeStore) and addressed by [`NodeId`]; every
//! change that affects the spatial index goes through the owning
//! [`Scene`](super::Scene) so the index never goes stale.

use bitflags::bitflags;

use crate::foundation::collections::{CameraId, NodeId};
use crate::foundation::math::{Mat4, Point2, Rect, Rotation2, Transform2D, Vec2};

bitflags! {
    /// Per-node behaviour flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u32 {
        /// Never clipped: the node is kept in the quadtree root and shows up
        /// in every query
        const NO_CLIP = 1 << 0;
        /// Never clipped and moved often: kept outside the buckets so moves
        /// cost no tree work
        const DYNAMIC = 1 << 1;
        /// Hint for the renderer that the node may be batched
        const BATCHABLE = 1 << 2;
    }
}

impl NodeFlags {
    /// Check if the node bypasses clipping
    pub fn is_unclipped(self) -> bool {
        self.intersects(Self::NO_CLIP | Self::DYNAMIC)
    }
}

/// Opaque mesh reference, resolved by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

/// Opaque material reference, resolved by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

/// What the renderer draws for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Renderable {
    /// Geometry
    pub mesh: MeshId,
    /// Surface
    pub material: MaterialId,
}

/// The single context that owns a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeRole {
    /// In the store but not attached anywhere
    #[default]
    Detached,
    /// Top-level scene node, indexed in the quadtree
    Root,
    /// Screen-space node, always drawn and never indexed
    Ui,
    /// Child of another node, clipped and drawn through its parent
    Child(NodeId),
}

/// A positioned, sized entity in the scene
#[derive(Debug, Clone)]
pub struct SceneNode {
    position: Point2,
    size: Vec2,
    rotation: f32,
    flags: NodeFlags,
    matrix: Mat4,
    role: NodeRole,
    children: Vec<NodeId>,
    order: u64,

    /// Draw-order hint and trace filter; higher layers are drawn on top
    pub layer: u32,
    /// Label shown in logs
    pub debug_name: Option<String>,
    /// Mesh and material, `None` for pure grouping nodes
    pub renderable: Option<Renderable>,
    /// Camera that must not draw this node (for render-to-texture setups
    /// where the node shows that camera's output)
    pub no_pass: Option<CameraId>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new(Point2::origin(), Vec2::zeros(), 0)
    }
}

impl SceneNode {
    /// Create a node; position is relative to the parent once attached as a child
    pub fn new(position: Point2, size: Vec2, layer: u32) -> Self {
        Self {
            position,
            size,
            rotation: 0.0,
            flags: NodeFlags::empty(),
            matrix: Mat4::identity(),
            role: NodeRole::Detached,
            children: Vec::new(),
            order: 0,
            layer,
            debug_name: None,
            renderable: None,
            no_pass: None,
        }
    }

    /// Set the initial flags
    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the initial rotation in radians
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set a debug label
    pub fn with_debug_name(mut self, name: impl Into<String>) -> Self {
        self.debug_name = Some(name.into());
        self
    }

    /// Attach a renderable payload
    pub fn with_renderable(mut self, renderable: Renderable) -> Self {
        self.renderable = Some(renderable);
        self
    }

    /// Position (minimum corner)
    pub fn position(&self) -> Point2 {
        self.position
    }

    /// Size
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Rotation in radians
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Flags
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Matrix computed by the last [`visit`](Self::visit)
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Context that currently owns the node
    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// Parent node, if the node is a child
    pub fn parent(&self) -> Option<NodeId> {
        match self.role {
            NodeRole::Child(parent) => Some(parent),
            _ => None,
        }
    }

    /// Check if the node has children
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Children in attachment order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Axis-aligned bounds from position and size
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Center of the bounds
    pub fn center(&self) -> Point2 {
        self.position + self.size * 0.5
    }

    /// Center of the rotated rectangle
    ///
    /// Nodes rotate about their position, so this only equals
    /// [`center`](Self::center) at zero rotation.
    pub fn rotated_center(&self) -> Point2 {
        self.position + half_extent(self.size, self.rotation)
    }

    /// Local transform
    pub fn transform(&self) -> Transform2D {
        Transform2D::new(self.position, self.rotation)
    }

    /// Rebuild the matrix from position and rotation
    ///
    /// Children pass their parent's matrix so they end up relative to it.
    pub fn visit(&mut self, timestep: f64, parent: Option<&Mat4>) {
        let local = self.transform().to_matrix();
        self.matrix = match parent {
            Some(parent) => parent * local,
            None => local,
        };
        log::trace!("Visited {} (dt {:.4})", self.label(), timestep);
    }

    /// Debug name or a placeholder
    pub fn label(&self) -> &str {
        self.debug_name.as_deref().unwrap_or("<unnamed>")
    }

    pub(crate) fn set_position(&mut self, position: Point2) {
        self.position = position;
    }

    pub(crate) fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    pub(crate) fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    pub(crate) fn set_flags(&mut self, flags: NodeFlags) {
        self.flags = flags;
    }

    pub(crate) fn set_role(&mut self, role: NodeRole) {
        self.role = role;
    }

    pub(crate) fn order(&self) -> u64 {
        self.order
    }

    pub(crate) fn set_order(&mut self, order: u64) {
        self.order = order;
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn remove_child_id(&mut self, child: NodeId) -> bool {
        match self.children.iter().position(|&c| c == child) {
            Some(index) => {
                self.children.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear_children(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.children)
    }
}

/// Offset from a node's position to its center under `rotation`
pub(crate) fn half_extent(size: Vec2, rotation: f32) -> Vec2 {
    Rotation2::new(rotation) * (size * 0.5)
}
