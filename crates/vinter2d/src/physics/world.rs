//! Physics world interface
//!
//! The scene drives rigid-body simulation through the [`PhysicsWorld`]
//! trait. The world owns bodies and integrates them; the scene owns the
//! mapping from nodes to bodies and copies poses back after each step.
//! Body positions are centers of mass: the center of the node's rectangle
//! after it is rotated about the node position.

use serde::{Deserialize, Serialize};

use crate::core::SpatialHashConfig;
use crate::foundation::collections::BodyHandle;
use crate::foundation::math::{Point2, Vec2};

/// Collision shape of a dynamic body, sized from the node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyShape {
    /// Box matching the node's bounds
    #[default]
    Box,
    /// Circle inscribed in the node's bounds
    Circle,
}

impl BodyShape {
    /// Moment of inertia for a body of this shape filling `size`
    pub fn moment_of_inertia(self, mass: f32, size: Vec2) -> f32 {
        match self {
            Self::Box => mass * (size.x * size.x + size.y * size.y) / 12.0,
            Self::Circle => {
                let radius = size.x.min(size.y) * 0.5;
                mass * radius * radius * 0.5
            }
        }
    }
}

/// Material and motion properties of a body
///
/// Contact-related values (elasticity, friction, surface velocity, group)
/// are stored for the collision solver of the world implementation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyProperties {
    /// Mass; zero or negative makes the body ignore forces
    pub mass: f32,
    /// Moment of inertia, `None` to derive it from shape and mass
    pub inertia: Option<f32>,
    /// Bounciness, 0 for none
    pub elasticity: f32,
    /// Coulomb friction coefficient
    pub friction: f32,
    /// Velocity of the surface for conveyor-belt contacts
    pub surface_velocity: Vec2,
    /// Bodies sharing a non-zero group never collide with each other
    pub group: u32,
    /// Maximum linear speed
    pub velocity_limit: Option<f32>,
    /// Maximum angular speed in radians per second
    pub angular_velocity_limit: Option<f32>,
}

impl BodyProperties {
    /// Apply the velocity limits to a linear and angular velocity
    pub fn limit_velocity(&self, velocity: Vec2, angular_velocity: f32) -> (Vec2, f32) {
        let velocity = match self.velocity_limit {
            Some(limit) if velocity.norm() > limit => velocity.normalize() * limit,
            _ => velocity,
        };
        let angular_velocity = match self.angular_velocity_limit {
            Some(limit) => angular_velocity.clamp(-limit, limit),
            None => angular_velocity,
        };
        (velocity, angular_velocity)
    }
}

impl Default for BodyProperties {
    fn default() -> Self {
        Self {
            mass: 1.0,
            inertia: None,
            elasticity: 0.0,
            friction: 0.5,
            surface_velocity: Vec2::zeros(),
            group: 0,
            velocity_limit: None,
            angular_velocity_limit: None,
        }
    }
}

/// Position and rotation of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    /// Center of mass in world units
    pub position: Point2,
    /// Rotation in radians
    pub rotation: f32,
}

impl BodyPose {
    /// Create a pose
    pub fn new(position: Point2, rotation: f32) -> Self {
        Self { position, rotation }
    }
}

/// Everything needed to create a dynamic body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    /// Collision shape
    pub shape: BodyShape,
    /// Extent of the shape
    pub size: Vec2,
    /// Initial pose
    pub pose: BodyPose,
    /// Initial properties
    pub properties: BodyProperties,
}

/// Rigid-body simulation backend
pub trait PhysicsWorld {
    /// Gravity applied to every awake dynamic body
    fn gravity(&self) -> Vec2;
    /// Replace gravity
    fn set_gravity(&mut self, gravity: Vec2);

    /// Fraction of velocity kept per second
    fn damping(&self) -> f32;
    /// Replace damping
    fn set_damping(&mut self, damping: f32);

    /// Tolerated overlap between shapes
    fn collision_slop(&self) -> f32;
    /// Replace the collision slop
    fn set_collision_slop(&mut self, slop: f32);

    /// Switch the broad phase to a spatial hash
    fn enable_spatial_hash(&mut self, config: SpatialHashConfig);
    /// Current spatial hash settings
    fn spatial_hash(&self) -> Option<SpatialHashConfig>;

    /// Advance the simulation by `dt` seconds
    fn step(&mut self, dt: f32);

    /// Create a dynamic body
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;
    /// Create an immovable segment
    fn create_static_segment(&mut self, start: Point2, end: Point2, properties: &BodyProperties) -> BodyHandle;
    /// Destroy a body; returns `false` for unknown handles
    fn destroy_body(&mut self, body: BodyHandle) -> bool;
    /// Number of live bodies
    fn body_count(&self) -> usize;

    /// Current pose
    fn pose(&self, body: BodyHandle) -> Option<BodyPose>;
    /// Teleport a body
    fn set_pose(&mut self, body: BodyHandle, pose: BodyPose);
    /// Linear velocity
    fn velocity(&self, body: BodyHandle) -> Option<Vec2>;

    /// Current properties
    fn properties(&self, body: BodyHandle) -> Option<BodyProperties>;
    /// Replace properties
    fn set_properties(&mut self, body: BodyHandle, properties: &BodyProperties);

    /// Clear accumulated force and torque
    fn reset_forces(&mut self, body: BodyHandle);
    /// Add a force applied at `offset` from the center; it persists until reset
    fn apply_force(&mut self, body: BodyHandle, force: Vec2, offset: Vec2);
    /// Apply an instantaneous impulse at `offset` from the center
    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2, offset: Vec2);

    /// Put a body to sleep
    fn sleep(&mut self, body: BodyHandle);
    /// Wake a body
    fn activate(&mut self, body: BodyHandle);
    /// Check if a body is asleep
    fn is_sleeping(&self, body: BodyHandle) -> bool;
}
