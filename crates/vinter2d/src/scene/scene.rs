//! The scene: node lifecycle, cameras, traces and the per-frame draw
//!
//! A scene owns a [`NodeStore`], a quadtree over its root nodes, a list of
//! screen-space UI nodes, cameras, an animation server and (optionally) a
//! physics world. Every node is in exactly one context at a time; adding
//! it somewhere new detaches it from wherever it was.

use crate::animation::AnimationServer;
use crate::core::{PhysicsBackend, PhysicsConfig, SceneConfig};
use crate::error::SceneError;
use crate::foundation::collections::{CameraId, NodeId, SlotMap};
use crate::foundation::math::{Line, Mat4, Point2, Rect, Vec2};
use crate::physics::{BasicPhysicsWorld, PhysicsWorld, RapierPhysicsWorld};
use crate::spatial::{Quadtree, SpatialQuery};

use super::camera::Camera;
use super::node::{NodeFlags, NodeRole, SceneNode};
use super::physics_bridge::PhysicsRuntime;
use super::render::{RenderPass, Renderer};
use super::store::NodeStore;
use super::trace::{self, LayerFilter, TraceHit};

/// What happened during one [`Scene::draw`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Fixed physics steps taken
    pub physics_steps: u32,
    /// Cameras rendered
    pub render_passes: usize,
    /// Root nodes handed to the renderer, summed over cameras
    pub rendered_nodes: usize,
}

/// A 2D scene
pub struct Scene {
    config: SceneConfig,
    pub(super) store: NodeStore,
    pub(super) index: Quadtree,
    nodes: Vec<NodeId>,
    ui_nodes: Vec<NodeId>,
    cameras: SlotMap<CameraId, Camera>,
    camera_order: Vec<CameraId>,
    animation_server: AnimationServer,
    pub(super) physics: Option<PhysicsRuntime>,
    next_order: u64,
}

impl Scene {
    /// Create an empty scene
    pub fn new(config: SceneConfig) -> Self {
        Self::with_store(config, NodeStore::new())
    }

    /// Create a scene that takes over nodes from a torn-down scene
    ///
    /// The nodes start out detached; add them again to show them.
    pub fn with_store(config: SceneConfig, store: NodeStore) -> Self {
        let world = config.physics.as_ref().map(build_world);
        Self::build(config, store, world)
    }

    /// Create a scene driving a custom physics backend
    ///
    /// The config's physics parameters (or the defaults, if it has none)
    /// are applied to the world.
    pub fn with_physics_world(mut config: SceneConfig, store: NodeStore, mut world: Box<dyn PhysicsWorld>) -> Self {
        let physics = config.physics.get_or_insert_with(Default::default);
        world.set_gravity(physics.gravity);
        world.set_damping(physics.damping);
        world.set_collision_slop(physics.collision_slop);
        if let Some(hash) = physics.spatial_hash {
            world.enable_spatial_hash(hash);
        }
        Self::build(config, store, Some(world))
    }

    fn build(config: SceneConfig, store: NodeStore, world: Option<Box<dyn PhysicsWorld>>) -> Self {
        let index = Quadtree::new(config.bounds.to_rect(), config.subdivisions);
        let physics = world.zip(config.physics.as_ref()).map(|(world, physics)| {
            PhysicsRuntime::new(world, physics.fixed_timestep)
        });

        log::info!(
            "Scene created: bounds {:?}, {} subdivisions, physics {}",
            index.bounds(),
            config.subdivisions,
            if physics.is_some() { "enabled" } else { "disabled" }
        );

        Self {
            config,
            store,
            index,
            nodes: Vec::new(),
            ui_nodes: Vec::new(),
            cameras: SlotMap::with_key(),
            camera_order: Vec::new(),
            animation_server: AnimationServer::new(),
            physics,
            next_order: 0,
        }
    }

    /// Detach everything and hand the nodes back
    ///
    /// Root and UI nodes come back detached; parent/child links survive.
    /// Physics aspects are kept, their bodies are destroyed.
    pub fn teardown(mut self) -> NodeStore {
        for id in std::mem::take(&mut self.nodes) {
            self.index.remove(id);
            self.deactivate_body(id);
            if let Some(node) = self.store.get_mut(id) {
                node.set_role(NodeRole::Detached);
            }
        }
        for id in std::mem::take(&mut self.ui_nodes) {
            if let Some(node) = self.store.get_mut(id) {
                node.set_role(NodeRole::Detached);
            }
        }
        self.animation_server.clear();

        log::info!("Scene torn down, {} nodes returned", self.store.len());
        self.store
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Construction parameters
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Node storage
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.store.get(id)
    }

    /// Mutable access to a node's free-form fields
    ///
    /// Position, size, rotation and flags change through the scene so the
    /// index stays in sync.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.store.get_mut(id)
    }

    /// Root nodes in insertion order
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// UI nodes in insertion order
    pub fn ui_nodes(&self) -> &[NodeId] {
        &self.ui_nodes
    }

    /// The spatial index over root nodes
    pub fn index(&self) -> &Quadtree {
        &self.index
    }

    /// Animation server run at the start of every draw
    pub fn animation_server(&self) -> &AnimationServer {
        &self.animation_server
    }

    /// Mutable animation server, for `begin`/`commit`
    pub fn animation_server_mut(&mut self) -> &mut AnimationServer {
        &mut self.animation_server
    }

    // ========================================================================
    // Node lifecycle
    // ========================================================================

    /// Move a node into the store, detached
    pub fn spawn(&mut self, mut node: SceneNode) -> NodeId {
        node.set_role(NodeRole::Detached);
        node.clear_children();
        let id = self.store.insert(node);
        log::trace!("Spawned node {:?}", id);
        id
    }

    /// Spawn a node and add it as a root node
    pub fn insert_node(&mut self, node: SceneNode) -> NodeId {
        let id = self.spawn(node);
        self.attach_root(id);
        id
    }

    /// Make a node a root node: indexed, drawn by cameras, simulated
    pub fn add_node(&mut self, id: NodeId) -> Result<(), SceneError> {
        let node = self.store.get(id).ok_or(SceneError::UnknownNode(id))?;
        if node.role() != NodeRole::Root {
            self.detach(id);
            self.attach_root(id);
        }
        Ok(())
    }

    /// Detach a root node; returns `false` if it was not one
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        self.detach_if(id, NodeRole::Root)
    }

    /// Make a node a screen-space UI node
    pub fn add_ui_node(&mut self, id: NodeId) -> Result<(), SceneError> {
        let node = self.store.get(id).ok_or(SceneError::UnknownNode(id))?;
        if node.role() == NodeRole::Ui {
            return Ok(());
        }
        self.detach(id);
        if let Some(node) = self.store.get_mut(id) {
            node.set_role(NodeRole::Ui);
        }
        self.ui_nodes.push(id);
        log::debug!("Added UI node {:?}", id);
        Ok(())
    }

    /// Detach a UI node; returns `false` if it was not one
    pub fn remove_ui_node(&mut self, id: NodeId) -> bool {
        self.detach_if(id, NodeRole::Ui)
    }

    /// Attach `child` under `parent`, detaching it from its current context
    ///
    /// The child's position becomes relative to the parent.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if !self.store.contains(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        let current = self.store.get(child).ok_or(SceneError::UnknownNode(child))?.role();
        if self.store.is_ancestor_or_self(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        if current == NodeRole::Child(parent) {
            return Ok(());
        }

        self.detach(child);
        if let Some(node) = self.store.get_mut(child) {
            node.set_role(NodeRole::Child(parent));
        }
        if let Some(node) = self.store.get_mut(parent) {
            node.push_child(child);
        }
        log::debug!("Attached {:?} under {:?}", child, parent);
        Ok(())
    }

    /// Detach `child` from `parent`; returns `false` if it is not its child
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.detach_if(child, NodeRole::Child(parent))
    }

    /// Destroy a node and its whole subtree
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        if !self.store.contains(id) {
            return false;
        }
        self.detach(id);
        for doomed in self.store.subtree(id) {
            self.deactivate_body(doomed);
            self.store.remove(doomed);
        }
        log::debug!("Deleted node {:?}", id);
        true
    }

    /// Destroy every root node and its subtree
    pub fn delete_all_nodes(&mut self) {
        let count = self.nodes.len();
        for id in self.nodes.clone() {
            self.delete_node(id);
        }
        log::debug!("Deleted {} root nodes", count);
    }

    /// Destroy every UI node and its subtree
    pub fn delete_all_ui_nodes(&mut self) {
        let count = self.ui_nodes.len();
        for id in self.ui_nodes.clone() {
            self.delete_node(id);
        }
        log::debug!("Deleted {} UI nodes", count);
    }

    fn attach_root(&mut self, id: NodeId) {
        let order = self.next_order;
        let Some(node) = self.store.get_mut(id) else {
            return;
        };
        self.next_order += 1;
        node.set_role(NodeRole::Root);
        node.set_order(order);
        let (bounds, flags) = (node.bounds(), node.flags());

        self.nodes.push(id);
        self.index.insert(id, bounds, flags);
        self.activate_body(id);
        log::debug!("Added node {:?} at {:?}", id, bounds);
    }

    fn detach_if(&mut self, id: NodeId, expected: NodeRole) -> bool {
        match self.store.get(id) {
            Some(node) if node.role() == expected => {
                self.detach(id);
                true
            }
            _ => false,
        }
    }

    /// Remove a node from whatever context owns it
    fn detach(&mut self, id: NodeId) {
        let Some(role) = self.store.get(id).map(SceneNode::role) else {
            return;
        };
        match role {
            NodeRole::Detached => return,
            NodeRole::Root => {
                self.nodes.retain(|&n| n != id);
                self.index.remove(id);
                self.deactivate_body(id);
            }
            NodeRole::Ui => self.ui_nodes.retain(|&n| n != id),
            NodeRole::Child(parent) => {
                if let Some(parent) = self.store.get_mut(parent) {
                    parent.remove_child_id(id);
                }
            }
        }
        if let Some(node) = self.store.get_mut(id) {
            node.set_role(NodeRole::Detached);
        }
    }

    // ========================================================================
    // Spatial attributes
    // ========================================================================

    /// Move a node; returns `false` for unknown ids
    pub fn set_position(&mut self, id: NodeId, position: Point2) -> bool {
        let Some(node) = self.store.get_mut(id) else {
            return false;
        };
        node.set_position(position);
        self.reindex(id);
        self.push_pose(id);
        true
    }

    /// Move a node by an offset
    pub fn translate(&mut self, id: NodeId, delta: Vec2) -> bool {
        match self.store.get(id) {
            Some(node) => {
                let position = node.position() + delta;
                self.set_position(id, position)
            }
            None => false,
        }
    }

    /// Resize a node; a live dynamic body is rebuilt with the new size
    pub fn set_size(&mut self, id: NodeId, size: Vec2) -> bool {
        let Some(node) = self.store.get_mut(id) else {
            return false;
        };
        node.set_size(size);
        self.reindex(id);
        self.rebuild_body(id);
        true
    }

    /// Rotate a node
    pub fn set_rotation(&mut self, id: NodeId, rotation: f32) -> bool {
        let Some(node) = self.store.get_mut(id) else {
            return false;
        };
        node.set_rotation(rotation);
        self.push_pose(id);
        true
    }

    /// Replace a node's flags
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) -> bool {
        let Some(node) = self.store.get_mut(id) else {
            return false;
        };
        node.set_flags(flags);
        self.reindex(id);
        true
    }

    /// Re-place a root node in the index after its bounds or flags changed
    pub(super) fn reindex(&mut self, id: NodeId) {
        if let Some(node) = self.store.get(id) {
            if node.role() == NodeRole::Root {
                self.index.update(id, node.bounds(), node.flags());
            }
        }
    }

    // ========================================================================
    // Cameras
    // ========================================================================

    /// Register a camera; cameras draw in registration order
    pub fn add_camera(&mut self, camera: Camera) -> CameraId {
        let id = self.cameras.insert(camera);
        self.camera_order.push(id);
        log::debug!("Added camera {:?}", id);
        id
    }

    /// Unregister a camera
    pub fn remove_camera(&mut self, id: CameraId) -> bool {
        if self.cameras.remove(id).is_none() {
            return false;
        }
        self.camera_order.retain(|&c| c != id);
        true
    }

    /// Look up a camera
    pub fn camera(&self, id: CameraId) -> Result<&Camera, SceneError> {
        self.cameras.get(id).ok_or(SceneError::UnknownCamera(id))
    }

    /// Mutable camera access
    pub fn camera_mut(&mut self, id: CameraId) -> Result<&mut Camera, SceneError> {
        self.cameras.get_mut(id).ok_or(SceneError::UnknownCamera(id))
    }

    /// Cameras in drawing order
    pub fn cameras(&self) -> impl Iterator<Item = (CameraId, &Camera)> {
        self.camera_order
            .iter()
            .filter_map(|&id| self.cameras.get(id).map(|camera| (id, camera)))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Root nodes whose bounds intersect `rect`, unclipped nodes included
    pub fn nodes_in_rect(&self, rect: &Rect) -> Vec<NodeId> {
        trace::nodes_in_rect(&self.index, &self.store, rect)
    }

    /// Nearest node on `layer` hit by the segment `from`..`to`
    ///
    /// `layer` is compared according to the scene's trace config.
    pub fn trace_line(&self, from: Point2, to: Point2, layer: u32) -> Option<TraceHit> {
        let filter = LayerFilter::from_match(self.config.trace.layer_match, layer);
        self.trace_line_filtered(&Line::new(from, to), filter)
    }

    /// Line trace with an explicit layer filter
    pub fn trace_line_filtered(&self, line: &Line, filter: LayerFilter) -> Option<TraceHit> {
        trace::trace_line(&self.index, &self.store, line, filter)
    }

    /// Topmost node on `layer` overlapping `rect`
    pub fn trace_rect(&self, rect: &Rect, layer: u32) -> Option<TraceHit> {
        let filter = LayerFilter::from_match(self.config.trace.layer_match, layer);
        self.trace_rect_filtered(rect, filter)
    }

    /// Rect trace with an explicit layer filter
    pub fn trace_rect_filtered(&self, rect: &Rect, filter: LayerFilter) -> Option<TraceHit> {
        trace::trace_rect(&self.index, &self.store, rect, filter)
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Advance and draw one frame
    ///
    /// Runs animations, steps physics (unless paused) and copies body poses
    /// into nodes, then for each camera visits the visible nodes and hands
    /// them to `renderer`.
    pub fn draw(&mut self, renderer: &mut dyn Renderer, timestep: f64) -> FrameStats {
        self.animation_server.run(timestep);
        let physics_steps = self.step_physics(timestep);
        self.sync_physics();

        for &id in &self.ui_nodes {
            visit_subtree(&mut self.store, id, timestep);
        }

        let mut stats = FrameStats {
            physics_steps,
            ..FrameStats::default()
        };

        for &camera_id in &self.camera_order {
            let Some(camera) = self.cameras.get(camera_id) else {
                continue;
            };
            let visible: Vec<NodeId> = trace::nodes_in_rect(&self.index, &self.store, &camera.frame())
                .into_iter()
                .filter(|&id| self.store.get(id).is_some_and(|node| node.no_pass != Some(camera_id)))
                .collect();

            for &id in &visible {
                visit_subtree(&mut self.store, id, timestep);
            }

            renderer.render(&RenderPass {
                camera_id,
                camera,
                nodes: &visible,
                ui_nodes: &self.ui_nodes,
                store: &self.store,
                timestep,
            });
            stats.render_passes += 1;
            stats.rendered_nodes += visible.len();
        }

        log::trace!("Frame drawn: {:?}", stats);
        stats
    }
}

/// Physics world for the configured backend
fn build_world(config: &PhysicsConfig) -> Box<dyn PhysicsWorld> {
    match config.backend {
        PhysicsBackend::Rapier => Box::new(RapierPhysicsWorld::new(config)),
        PhysicsBackend::Basic => Box::new(BasicPhysicsWorld::new(config)),
    }
}

/// Rebuild matrices for a node and its descendants
fn visit_subtree(store: &mut NodeStore, root: NodeId, timestep: f64) {
    let mut stack: Vec<(NodeId, Option<Mat4>)> = vec![(root, None)];
    while let Some((id, parent)) = stack.pop() {
        let Some(node) = store.get_mut(id) else {
            continue;
        };
        node.visit(timestep, parent.as_ref());
        let matrix = *node.matrix();
        stack.extend(node.children().iter().map(|&child| (child, Some(matrix))));
    }
}
