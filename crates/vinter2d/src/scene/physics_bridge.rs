//! Physics side of the scene
//!
//! Nodes receive a [`PhysicsAspect`] when physics is enabled on them. A
//! body is created in the world when the node becomes a root node and
//! destroyed when it stops being one, so only nodes that are actually in
//! the scene are simulated. After each step the poses of dynamic bodies are
//! copied back into their nodes and the index.

use crate::core::SpatialHashConfig;
use crate::error::PhysicsError;
use crate::foundation::collections::{BodyHandle, NodeId};
use crate::foundation::math::{Point2, Vec2};
use crate::physics::{BodyDesc, BodyPose, BodyProperties, BodyShape, PhysicsAspect, PhysicsState, PhysicsWorld};
use crate::spatial::SpatialQuery;

use super::node::{half_extent, NodeRole};
use super::scene::Scene;

/// Upper bound on fixed steps per frame; leftover time is dropped
const MAX_STEPS_PER_FRAME: u32 = 8;

/// Physics world plus the scene's stepping state
pub(crate) struct PhysicsRuntime {
    world: Box<dyn PhysicsWorld>,
    state: PhysicsState,
    fixed_timestep: f64,
    accumulator: f64,
    total_time: f64,
}

impl PhysicsRuntime {
    pub(crate) fn new(world: Box<dyn PhysicsWorld>, fixed_timestep: f64) -> Self {
        Self {
            world,
            state: PhysicsState::Active,
            fixed_timestep,
            accumulator: 0.0,
            total_time: 0.0,
        }
    }

    /// Consume frame time in fixed steps; a non-positive fixed step means
    /// one step of the frame's length
    fn advance(&mut self, timestep: f64) -> u32 {
        if self.state == PhysicsState::Paused || !timestep.is_finite() || timestep <= 0.0 {
            return 0;
        }
        if self.fixed_timestep <= 0.0 {
            self.world.step(timestep as f32);
            self.total_time += timestep;
            return 1;
        }

        self.accumulator += timestep;
        let mut steps = 0;
        while self.accumulator >= self.fixed_timestep && steps < MAX_STEPS_PER_FRAME {
            self.world.step(self.fixed_timestep as f32);
            self.accumulator -= self.fixed_timestep;
            self.total_time += self.fixed_timestep;
            steps += 1;
        }
        if self.accumulator >= self.fixed_timestep {
            log::debug!("Physics fell behind, dropping {:.4}s", self.accumulator);
            self.accumulator = 0.0;
        }
        steps
    }
}

impl Scene {
    // ========================================================================
    // Enabling
    // ========================================================================

    /// Give a node a dynamic body of the given shape
    ///
    /// Enabling again with the same shape does nothing; a different shape
    /// or a previous static object is replaced, keeping the properties.
    pub fn enable_physics(&mut self, id: NodeId, shape: BodyShape) -> Result<(), PhysicsError> {
        self.check_node(id)?;
        if let Some(PhysicsAspect::Dynamic(dynamic)) = self.store.physics(id) {
            if dynamic.shape == shape {
                return Ok(());
            }
        }
        self.replace_aspect(id, PhysicsAspect::dynamic(shape));
        Ok(())
    }

    /// Turn a node into an immovable segment from its position to `end`
    pub fn make_static_object(&mut self, id: NodeId, end: Point2) -> Result<(), PhysicsError> {
        self.check_node(id)?;
        self.replace_aspect(id, PhysicsAspect::segment(end));
        Ok(())
    }

    /// Remove a node's physics aspect and body
    ///
    /// Returns `Ok(false)` if the node was not physics-enabled.
    pub fn disable_physics(&mut self, id: NodeId) -> Result<bool, PhysicsError> {
        if !self.store.contains(id) {
            return Err(PhysicsError::UnknownNode(id));
        }
        self.deactivate_body(id);
        Ok(self.store.take_physics(id).is_some())
    }

    /// Check if a node has a physics aspect
    pub fn is_physics_enabled(&self, id: NodeId) -> bool {
        self.store.physics(id).is_some()
    }

    /// Check if a node's body exists in the world
    ///
    /// A physics-enabled node that is not a root node waits for activation
    /// and reports `false`.
    pub fn is_physics_active(&self, id: NodeId) -> Result<bool, PhysicsError> {
        Ok(self.aspect(id)?.is_active())
    }

    fn check_node(&self, id: NodeId) -> Result<(), PhysicsError> {
        if self.physics.is_none() {
            return Err(PhysicsError::WorldDisabled);
        }
        if !self.store.contains(id) {
            return Err(PhysicsError::UnknownNode(id));
        }
        Ok(())
    }

    fn replace_aspect(&mut self, id: NodeId, mut aspect: PhysicsAspect) {
        self.deactivate_body(id);
        if let Some(previous) = self.store.take_physics(id) {
            *aspect.properties_mut() = *previous.properties();
        }
        self.store.set_physics(id, aspect);
        self.activate_body(id);
    }

    fn aspect(&self, id: NodeId) -> Result<&PhysicsAspect, PhysicsError> {
        if !self.store.contains(id) {
            return Err(PhysicsError::UnknownNode(id));
        }
        self.store.physics(id).ok_or(PhysicsError::NotPhysicsEnabled(id))
    }

    // ========================================================================
    // Body lifecycle
    // ========================================================================

    /// Create the body for a physics-enabled root node
    pub(super) fn activate_body(&mut self, id: NodeId) {
        let Some(runtime) = self.physics.as_mut() else {
            return;
        };
        let Some((node, aspect)) = self.store.node_and_physics_mut(id) else {
            return;
        };
        if node.role() != NodeRole::Root || aspect.is_active() {
            return;
        }

        let body = match aspect {
            PhysicsAspect::Dynamic(dynamic) => {
                let body = runtime.world.create_body(&BodyDesc {
                    shape: dynamic.shape,
                    size: node.size(),
                    pose: BodyPose::new(node.rotated_center(), node.rotation()),
                    properties: dynamic.properties,
                });
                dynamic.synced = runtime.world.pose(body);
                body
            }
            PhysicsAspect::Static(segment) => {
                runtime
                    .world
                    .create_static_segment(node.position(), segment.end, &segment.properties)
            }
        };
        aspect.set_body(Some(body));
        log::debug!("Created body {:?} for node {:?}", body, id);
    }

    /// Destroy a node's body, keeping its aspect
    pub(super) fn deactivate_body(&mut self, id: NodeId) {
        let Some(body) = self.store.physics_mut(id).and_then(PhysicsAspect::take_body) else {
            return;
        };
        if let Some(runtime) = self.physics.as_mut() {
            runtime.world.destroy_body(body);
        }
        log::debug!("Destroyed body {:?} of node {:?}", body, id);
    }

    pub(super) fn rebuild_body(&mut self, id: NodeId) {
        if self.store.physics(id).is_some_and(PhysicsAspect::is_active) {
            self.deactivate_body(id);
            self.activate_body(id);
        }
    }

    /// Copy a node's position and rotation into its body
    pub(super) fn push_pose(&mut self, id: NodeId) {
        // segments are anchored at the node position
        if self.store.physics(id).is_some_and(PhysicsAspect::is_static) {
            self.rebuild_body(id);
            return;
        }
        let Some(runtime) = self.physics.as_mut() else {
            return;
        };
        let Some((node, PhysicsAspect::Dynamic(dynamic))) = self.store.node_and_physics_mut(id) else {
            return;
        };
        let Some(body) = dynamic.body else {
            return;
        };
        runtime
            .world
            .set_pose(body, BodyPose::new(node.rotated_center(), node.rotation()));
        dynamic.synced = runtime.world.pose(body);
    }

    /// Step the world for one frame
    pub(super) fn step_physics(&mut self, timestep: f64) -> u32 {
        self.physics
            .as_mut()
            .map_or(0, |runtime| runtime.advance(timestep))
    }

    /// Copy moved dynamic body poses into their nodes and the index
    ///
    /// Bodies whose pose is unchanged since the last copy are skipped, so
    /// nodes never drift through the position/center round trip.
    pub(super) fn sync_physics(&mut self) {
        let Some(runtime) = self.physics.as_ref() else {
            return;
        };
        for id in self.store.physics_ids() {
            let Some((node, PhysicsAspect::Dynamic(dynamic))) = self.store.node_and_physics_mut(id) else {
                continue;
            };
            let Some(pose) = dynamic.body.and_then(|body| runtime.world.pose(body)) else {
                continue;
            };
            if dynamic.synced == Some(pose) {
                continue;
            }
            dynamic.synced = Some(pose);

            node.set_position(pose.position - half_extent(node.size(), pose.rotation));
            node.set_rotation(pose.rotation);
            if node.role() == NodeRole::Root {
                self.index.update(id, node.bounds(), node.flags());
            }
        }
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Current properties of a physics-enabled node
    pub fn body_properties(&self, id: NodeId) -> Result<BodyProperties, PhysicsError> {
        Ok(*self.aspect(id)?.properties())
    }

    /// Set the mass of a dynamic body
    pub fn set_mass(&mut self, id: NodeId, mass: f32) -> Result<(), PhysicsError> {
        self.update_properties(id, false, |p| p.mass = mass)
    }

    /// Set the moment of inertia; `None` derives it from shape and mass
    pub fn set_inertia(&mut self, id: NodeId, inertia: Option<f32>) -> Result<(), PhysicsError> {
        self.update_properties(id, false, |p| p.inertia = inertia)
    }

    /// Set bounciness
    pub fn set_elasticity(&mut self, id: NodeId, elasticity: f32) -> Result<(), PhysicsError> {
        self.update_properties(id, true, |p| p.elasticity = elasticity)
    }

    /// Set the friction coefficient
    pub fn set_friction(&mut self, id: NodeId, friction: f32) -> Result<(), PhysicsError> {
        self.update_properties(id, true, |p| p.friction = friction)
    }

    /// Set the surface velocity used for conveyor-belt contacts
    pub fn set_surface_velocity(&mut self, id: NodeId, velocity: Vec2) -> Result<(), PhysicsError> {
        self.update_properties(id, true, |p| p.surface_velocity = velocity)
    }

    /// Set the collision group; bodies sharing a non-zero group ignore each other
    pub fn set_group(&mut self, id: NodeId, group: u32) -> Result<(), PhysicsError> {
        self.update_properties(id, true, |p| p.group = group)
    }

    /// Cap linear speed; `None` removes the cap
    pub fn restrict_velocity(&mut self, id: NodeId, limit: Option<f32>) -> Result<(), PhysicsError> {
        self.update_properties(id, false, |p| p.velocity_limit = limit)
    }

    /// Cap angular speed; `None` removes the cap
    pub fn restrict_angular_velocity(&mut self, id: NodeId, limit: Option<f32>) -> Result<(), PhysicsError> {
        self.update_properties(id, false, |p| p.angular_velocity_limit = limit)
    }

    /// Moment of inertia the node's shape would have at its current mass
    pub fn suggested_inertia(&self, id: NodeId) -> Result<f32, PhysicsError> {
        let size = self.store.get(id).ok_or(PhysicsError::UnknownNode(id))?.size();
        match self.aspect(id)? {
            PhysicsAspect::Dynamic(dynamic) => Ok(dynamic.shape.moment_of_inertia(dynamic.properties.mass, size)),
            PhysicsAspect::Static(_) => Err(PhysicsError::StaticBody(id)),
        }
    }

    fn update_properties(
        &mut self,
        id: NodeId,
        allow_static: bool,
        apply: impl FnOnce(&mut BodyProperties),
    ) -> Result<(), PhysicsError> {
        if !self.store.contains(id) {
            return Err(PhysicsError::UnknownNode(id));
        }
        let aspect = self
            .store
            .physics_mut(id)
            .ok_or(PhysicsError::NotPhysicsEnabled(id))?;
        if aspect.is_static() && !allow_static {
            return Err(PhysicsError::StaticBody(id));
        }

        apply(aspect.properties_mut());
        if let (Some(body), Some(runtime)) = (aspect.body(), self.physics.as_mut()) {
            runtime.world.set_properties(body, aspect.properties());
        }
        Ok(())
    }

    // ========================================================================
    // Forces
    // ========================================================================

    /// Clear accumulated forces
    pub fn reset_force(&mut self, id: NodeId) -> Result<(), PhysicsError> {
        self.with_dynamic_body(id, |world, body| world.reset_forces(body))
    }

    /// Add a persistent force applied at `offset` from the node center
    pub fn apply_force(&mut self, id: NodeId, force: Vec2, offset: Vec2) -> Result<(), PhysicsError> {
        self.with_dynamic_body(id, |world, body| world.apply_force(body, force, offset))
    }

    /// Apply an impulse at `offset` from the node center
    pub fn apply_impulse(&mut self, id: NodeId, impulse: Vec2, offset: Vec2) -> Result<(), PhysicsError> {
        self.with_dynamic_body(id, |world, body| world.apply_impulse(body, impulse, offset))
    }

    /// Put a body to sleep
    pub fn sleep(&mut self, id: NodeId) -> Result<(), PhysicsError> {
        self.with_dynamic_body(id, |world, body| world.sleep(body))
    }

    /// Wake a body
    pub fn activate(&mut self, id: NodeId) -> Result<(), PhysicsError> {
        self.with_dynamic_body(id, |world, body| world.activate(body))
    }

    /// Check if a body is asleep
    pub fn is_sleeping(&mut self, id: NodeId) -> Result<bool, PhysicsError> {
        self.with_dynamic_body(id, |world, body| world.is_sleeping(body))
    }

    /// Linear velocity of a body
    pub fn velocity(&mut self, id: NodeId) -> Result<Vec2, PhysicsError> {
        self.with_dynamic_body(id, |world, body| world.velocity(body).unwrap_or_else(Vec2::zeros))
    }

    fn with_dynamic_body<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut dyn PhysicsWorld, BodyHandle) -> R,
    ) -> Result<R, PhysicsError> {
        let runtime = self.physics.as_mut().ok_or(PhysicsError::WorldDisabled)?;
        if !self.store.contains(id) {
            return Err(PhysicsError::UnknownNode(id));
        }
        match self.store.physics(id) {
            None => Err(PhysicsError::NotPhysicsEnabled(id)),
            Some(PhysicsAspect::Static(_)) => Err(PhysicsError::StaticBody(id)),
            Some(PhysicsAspect::Dynamic(dynamic)) => {
                let body = dynamic.body.ok_or(PhysicsError::Inactive(id))?;
                Ok(f(runtime.world.as_mut(), body))
            }
        }
    }

    // ========================================================================
    // World
    // ========================================================================

    /// Stop stepping the world; node transforms keep their last state
    pub fn pause_physics(&mut self) -> Result<(), PhysicsError> {
        self.runtime_mut()?.state = PhysicsState::Paused;
        log::info!("Physics paused");
        Ok(())
    }

    /// Resume stepping the world
    pub fn unpause_physics(&mut self) -> Result<(), PhysicsError> {
        let runtime = self.runtime_mut()?;
        runtime.state = PhysicsState::Active;
        runtime.accumulator = 0.0;
        log::info!("Physics resumed");
        Ok(())
    }

    /// Current stepping state, `None` without a world
    pub fn physics_state(&self) -> Option<PhysicsState> {
        self.physics.as_ref().map(|runtime| runtime.state)
    }

    /// Simulated time in seconds
    pub fn physics_time(&self) -> Option<f64> {
        self.physics.as_ref().map(|runtime| runtime.total_time)
    }

    /// The physics world
    pub fn physics_world(&self) -> Option<&dyn PhysicsWorld> {
        self.physics.as_ref().map(|runtime| runtime.world.as_ref())
    }

    /// World gravity
    pub fn gravity(&self) -> Option<Vec2> {
        self.physics_world().map(|world| world.gravity())
    }

    /// Replace world gravity
    pub fn set_gravity(&mut self, gravity: Vec2) -> Result<(), PhysicsError> {
        self.runtime_mut()?.world.set_gravity(gravity);
        Ok(())
    }

    /// World damping
    pub fn damping(&self) -> Option<f32> {
        self.physics_world().map(|world| world.damping())
    }

    /// Replace world damping
    pub fn set_damping(&mut self, damping: f32) -> Result<(), PhysicsError> {
        self.runtime_mut()?.world.set_damping(damping);
        Ok(())
    }

    /// World collision slop
    pub fn collision_slop(&self) -> Option<f32> {
        self.physics_world().map(|world| world.collision_slop())
    }

    /// Replace world collision slop
    pub fn set_collision_slop(&mut self, slop: f32) -> Result<(), PhysicsError> {
        self.runtime_mut()?.world.set_collision_slop(slop);
        Ok(())
    }

    /// Switch the world's broad phase to a spatial hash
    pub fn enable_spatial_hash(&mut self, dimension: f32, count: u32) -> Result<(), PhysicsError> {
        self.runtime_mut()?
            .world
            .enable_spatial_hash(SpatialHashConfig { dimension, count });
        Ok(())
    }

    fn runtime_mut(&mut self) -> Result<&mut PhysicsRuntime, PhysicsError> {
        self.physics.as_mut().ok_or(PhysicsError::WorldDisabled)
    }
}
