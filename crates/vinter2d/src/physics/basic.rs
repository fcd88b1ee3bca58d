//! Integrating physics world
//!
//! Integrates gravity, persistent forces, impulses and damping with
//! semi-implicit Euler, honours velocity limits and sleeping. It does not
//! resolve contacts, so contact properties are only stored. Scenes build
//! it for [`PhysicsBackend::Basic`](crate::core::PhysicsBackend::Basic),
//! where exact, collision-free motion is wanted; the default backend is
//! [`RapierPhysicsWorld`](super::RapierPhysicsWorld).

use crate::core::{PhysicsConfig, SpatialHashConfig};
use crate::foundation::collections::{BodyHandle, SlotMap};
use crate::foundation::math::{cross, Point2, Vec2};

use super::world::{BodyDesc, BodyPose, BodyProperties, PhysicsWorld};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Dynamic,
    Static,
}

#[derive(Debug, Clone)]
struct RigidBody {
    kind: BodyKind,
    pose: BodyPose,
    velocity: Vec2,
    angular_velocity: f32,
    force: Vec2,
    torque: f32,
    /// Shape moment for unit mass
    unit_inertia: f32,
    properties: BodyProperties,
    sleeping: bool,
}

impl RigidBody {
    fn inertia(&self) -> f32 {
        self.properties
            .inertia
            .unwrap_or(self.unit_inertia * self.properties.mass)
    }

    fn inverse_mass(&self) -> f32 {
        if self.kind == BodyKind::Dynamic && self.properties.mass > 0.0 {
            1.0 / self.properties.mass
        } else {
            0.0
        }
    }

    fn inverse_inertia(&self) -> f32 {
        let inertia = self.inertia();
        if self.kind == BodyKind::Dynamic && inertia > 0.0 {
            1.0 / inertia
        } else {
            0.0
        }
    }

    fn clamp_velocity(&mut self) {
        (self.velocity, self.angular_velocity) = self
            .properties
            .limit_velocity(self.velocity, self.angular_velocity);
    }
}

/// Force-integrating physics world without contact resolution
#[derive(Debug)]
pub struct BasicPhysicsWorld {
    bodies: SlotMap<BodyHandle, RigidBody>,
    gravity: Vec2,
    damping: f32,
    collision_slop: f32,
    spatial_hash: Option<SpatialHashConfig>,
}

impl Default for BasicPhysicsWorld {
    fn default() -> Self {
        Self::new(&PhysicsConfig::default())
    }
}

impl BasicPhysicsWorld {
    /// Create a world from config
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            bodies: SlotMap::with_key(),
            gravity: config.gravity,
            damping: config.damping,
            collision_slop: config.collision_slop,
            spatial_hash: config.spatial_hash,
        }
    }

    fn dynamic_mut(&mut self, body: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies
            .get_mut(body)
            .filter(|b| b.kind == BodyKind::Dynamic)
    }
}

impl PhysicsWorld for BasicPhysicsWorld {
    fn gravity(&self) -> Vec2 {
        self.gravity
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    fn damping(&self) -> f32 {
        self.damping
    }

    fn set_damping(&mut self, damping: f32) {
        self.damping = damping;
    }

    fn collision_slop(&self) -> f32 {
        self.collision_slop
    }

    fn set_collision_slop(&mut self, slop: f32) {
        self.collision_slop = slop;
    }

    fn enable_spatial_hash(&mut self, config: SpatialHashConfig) {
        log::debug!("Physics broad phase: spatial hash {}x{}", config.dimension, config.count);
        self.spatial_hash = Some(config);
    }

    fn spatial_hash(&self) -> Option<SpatialHashConfig> {
        self.spatial_hash
    }

    fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let damping = self.damping.powf(dt);
        let gravity = self.gravity;

        for body in self.bodies.values_mut() {
            if body.kind != BodyKind::Dynamic || body.sleeping {
                continue;
            }
            let inverse_mass = body.inverse_mass();
            if inverse_mass > 0.0 {
                body.velocity += (gravity + body.force * inverse_mass) * dt;
            }
            body.angular_velocity += body.torque * body.inverse_inertia() * dt;

            body.velocity *= damping;
            body.angular_velocity *= damping;
            body.clamp_velocity();

            body.pose.position += body.velocity * dt;
            body.pose.rotation += body.angular_velocity * dt;
        }
    }

    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        self.bodies.insert(RigidBody {
            kind: BodyKind::Dynamic,
            pose: desc.pose,
            velocity: Vec2::zeros(),
            angular_velocity: 0.0,
            force: Vec2::zeros(),
            torque: 0.0,
            unit_inertia: desc.shape.moment_of_inertia(1.0, desc.size),
            properties: desc.properties,
            sleeping: false,
        })
    }

    fn create_static_segment(&mut self, start: Point2, end: Point2, properties: &BodyProperties) -> BodyHandle {
        let midpoint = nalgebra::center(&start, &end);
        let direction = end - start;
        self.bodies.insert(RigidBody {
            kind: BodyKind::Static,
            pose: BodyPose::new(midpoint, direction.y.atan2(direction.x)),
            velocity: Vec2::zeros(),
            angular_velocity: 0.0,
            force: Vec2::zeros(),
            torque: 0.0,
            unit_inertia: 0.0,
            properties: *properties,
            sleeping: false,
        })
    }

    fn destroy_body(&mut self, body: BodyHandle) -> bool {
        self.bodies.remove(body).is_some()
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn pose(&self, body: BodyHandle) -> Option<BodyPose> {
        self.bodies.get(body).map(|b| b.pose)
    }

    fn set_pose(&mut self, body: BodyHandle, pose: BodyPose) {
        if let Some(b) = self.dynamic_mut(body) {
            b.pose = pose;
        }
    }

    fn velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies.get(body).map(|b| b.velocity)
    }

    fn properties(&self, body: BodyHandle) -> Option<BodyProperties> {
        self.bodies.get(body).map(|b| b.properties)
    }

    fn set_properties(&mut self, body: BodyHandle, properties: &BodyProperties) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.properties = *properties;
            b.clamp_velocity();
        }
    }

    fn reset_forces(&mut self, body: BodyHandle) {
        if let Some(b) = self.dynamic_mut(body) {
            b.force = Vec2::zeros();
            b.torque = 0.0;
        }
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2, offset: Vec2) {
        if let Some(b) = self.dynamic_mut(body) {
            b.force += force;
            b.torque += cross(&offset, &force);
            b.sleeping = false;
        }
    }

    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2, offset: Vec2) {
        if let Some(b) = self.dynamic_mut(body) {
            b.velocity += impulse * b.inverse_mass();
            b.angular_velocity += cross(&offset, &impulse) * b.inverse_inertia();
            b.clamp_velocity();
            b.sleeping = false;
        }
    }

    fn sleep(&mut self, body: BodyHandle) {
        if let Some(b) = self.dynamic_mut(body) {
            b.sleeping = true;
        }
    }

    fn activate(&mut self, body: BodyHandle) {
        if let Some(b) = self.dynamic_mut(body) {
            b.sleeping = false;
        }
    }

    fn is_sleeping(&self, body: BodyHandle) -> bool {
        self.bodies.get(body).is_some_and(|b| b.sleeping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::BodyShape;
    use approx::assert_relative_eq;

    fn body_at(world: &mut BasicPhysicsWorld, x: f32, y: f32) -> BodyHandle {
        world.create_body(&BodyDesc {
            shape: BodyShape::Box,
            size: Vec2::new(2.0, 2.0),
            pose: BodyPose::new(Point2::new(x, y), 0.0),
            properties: BodyProperties::default(),
        })
    }

    #[test]
    fn test_gravity_accelerates_body() {
        let mut world = BasicPhysicsWorld::default();
        let body = body_at(&mut world, 0.0, 0.0);

        world.step(0.5);
        world.step(0.5);

        // v = 50 after the first half second, 100 after the second
        assert_relative_eq!(world.velocity(body).unwrap(), Vec2::new(0.0, 100.0));
        assert_relative_eq!(world.pose(body).unwrap().position, Point2::new(0.0, 75.0));
    }

    #[test]
    fn test_forces_persist_until_reset() {
        let mut world = BasicPhysicsWorld::new(&PhysicsConfig {
            gravity: Vec2::zeros(),
            ..PhysicsConfig::default()
        });
        let body = body_at(&mut world, 0.0, 0.0);

        world.apply_force(body, Vec2::new(2.0, 0.0), Vec2::zeros());
        world.step(1.0);
        world.step(1.0);
        assert_relative_eq!(world.velocity(body).unwrap(), Vec2::new(4.0, 0.0));

        world.reset_forces(body);
        world.step(1.0);
        assert_relative_eq!(world.velocity(body).unwrap(), Vec2::new(4.0, 0.0));
    }

    #[test]
    fn test_impulse_and_velocity_limit() {
        let mut world = BasicPhysicsWorld::new(&PhysicsConfig {
            gravity: Vec2::zeros(),
            ..PhysicsConfig::default()
        });
        let body = body_at(&mut world, 0.0, 0.0);
        let properties = BodyProperties {
            velocity_limit: Some(3.0),
            ..BodyProperties::default()
        };
        world.set_properties(body, &properties);

        world.apply_impulse(body, Vec2::new(10.0, 0.0), Vec2::zeros());
        assert_relative_eq!(world.velocity(body).unwrap(), Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_sleeping_body_does_not_move() {
        let mut world = BasicPhysicsWorld::default();
        let body = body_at(&mut world, 1.0, 1.0);

        world.sleep(body);
        world.step(1.0);
        assert!(world.is_sleeping(body));
        assert_eq!(world.pose(body).unwrap().position, Point2::new(1.0, 1.0));

        world.apply_impulse(body, Vec2::new(0.0, -1.0), Vec2::zeros());
        assert!(!world.is_sleeping(body));
    }

    #[test]
    fn test_damping_decays_velocity() {
        let mut world = BasicPhysicsWorld::new(&PhysicsConfig {
            gravity: Vec2::zeros(),
            damping: 0.25,
            ..PhysicsConfig::default()
        });
        let body = body_at(&mut world, 0.0, 0.0);
        world.apply_impulse(body, Vec2::new(8.0, 0.0), Vec2::zeros());

        world.step(0.5);
        assert_relative_eq!(world.velocity(body).unwrap().x, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_static_segment_ignores_forces() {
        let mut world = BasicPhysicsWorld::default();
        let segment = world.create_static_segment(
            Point2::new(0.0, 10.0),
            Point2::new(20.0, 10.0),
            &BodyProperties::default(),
        );

        world.apply_force(segment, Vec2::new(0.0, 50.0), Vec2::zeros());
        world.step(1.0);

        let pose = world.pose(segment).unwrap();
        assert_eq!(pose.position, Point2::new(10.0, 10.0));
        assert_eq!(world.velocity(segment).unwrap(), Vec2::zeros());
        assert!(world.destroy_body(segment));
        assert_eq!(world.body_count(), 0);
    }
}
