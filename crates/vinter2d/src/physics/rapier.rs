//! rapier2d-backed physics world
//!
//! Every body is a rapier rigid body carrying a single collider built from
//! the body's shape and properties, so contacts, friction, restitution and
//! collision groups are resolved by rapier. Surface velocity is fed into
//! the contact solver through a physics hook. Damping and velocity limits
//! follow the same rules as [`BasicPhysicsWorld`](super::BasicPhysicsWorld)
//! and are applied after each step.

use std::fmt;

use rapier2d::prelude::*;

use crate::core::{PhysicsConfig, SpatialHashConfig};
use crate::foundation::collections::{BodyHandle, SlotMap};
use crate::foundation::math::{Point2, Vec2};

use super::world::{BodyDesc, BodyPose, BodyProperties, BodyShape, PhysicsWorld};

/// What a body's collider is built from
#[derive(Debug, Clone, Copy, PartialEq)]
enum BodyKind {
    Dynamic { shape: BodyShape, size: Vec2 },
    Segment { start: Point2, end: Point2 },
}

#[derive(Debug, Clone, Copy)]
struct BodyEntry {
    rigid_body: RigidBodyHandle,
    collider: ColliderHandle,
    kind: BodyKind,
    properties: BodyProperties,
}

impl BodyEntry {
    fn is_dynamic(&self) -> bool {
        matches!(self.kind, BodyKind::Dynamic { .. })
    }
}

/// Physics world simulated by rapier2d
pub struct RapierPhysicsWorld {
    pipeline: PhysicsPipeline,
    parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    entries: SlotMap<BodyHandle, BodyEntry>,
    gravity: Vec2,
    damping: f32,
    spatial_hash: Option<SpatialHashConfig>,
}

impl fmt::Debug for RapierPhysicsWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RapierPhysicsWorld")
            .field("bodies", &self.entries.len())
            .field("gravity", &self.gravity)
            .field("damping", &self.damping)
            .finish_non_exhaustive()
    }
}

impl Default for RapierPhysicsWorld {
    fn default() -> Self {
        Self::new(&PhysicsConfig::default())
    }
}

impl RapierPhysicsWorld {
    /// Create a world from config
    pub fn new(config: &PhysicsConfig) -> Self {
        let parameters = IntegrationParameters {
            allowed_linear_error: config.collision_slop,
            ..IntegrationParameters::default()
        };

        let mut world = Self {
            pipeline: PhysicsPipeline::new(),
            parameters,
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            entries: SlotMap::with_key(),
            gravity: config.gravity,
            damping: config.damping,
            spatial_hash: None,
        };
        if let Some(hash) = config.spatial_hash {
            world.enable_spatial_hash(hash);
        }
        world
    }

    fn dynamic_body_mut(&mut self, body: BodyHandle) -> Option<&mut RigidBody> {
        let entry = self.entries.get(body).filter(|entry| entry.is_dynamic())?;
        self.rigid_bodies.get_mut(entry.rigid_body)
    }

    /// Replace a body's collider after its properties changed
    fn rebuild_collider(&mut self, body: BodyHandle) {
        let Some(entry) = self.entries.get_mut(body) else {
            return;
        };
        self.colliders
            .remove(entry.collider, &mut self.islands, &mut self.rigid_bodies, true);
        entry.collider = self.colliders.insert_with_parent(
            build_collider(entry.kind, &entry.properties),
            entry.rigid_body,
            &mut self.rigid_bodies,
        );
    }

    fn insert(&mut self, rigid_body: RigidBody, kind: BodyKind, properties: BodyProperties) -> BodyHandle {
        let rigid_body = self.rigid_bodies.insert(rigid_body);
        let collider = self.colliders.insert_with_parent(
            build_collider(kind, &properties),
            rigid_body,
            &mut self.rigid_bodies,
        );
        self.entries.insert(BodyEntry {
            rigid_body,
            collider,
            kind,
            properties,
        })
    }

    /// Apply damping and velocity limits to every awake dynamic body
    fn settle_velocities(&mut self, dt: f32) {
        let damping = self.damping.powf(dt);
        for entry in self.entries.values() {
            let limited = entry.properties.velocity_limit.is_some()
                || entry.properties.angular_velocity_limit.is_some();
            if !entry.is_dynamic() || (!limited && damping >= 1.0) {
                continue;
            }
            let Some(body) = self.rigid_bodies.get_mut(entry.rigid_body) else {
                continue;
            };
            if body.is_sleeping() {
                continue;
            }
            let (velocity, angular_velocity) = entry
                .properties
                .limit_velocity(from_vector(body.linvel()) * damping, body.angvel() * damping);
            body.set_linvel(to_vector(velocity), false);
            body.set_angvel(angular_velocity, false);
        }
    }
}

impl PhysicsWorld for RapierPhysicsWorld {
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
        self.parameters.allowed_linear_error
    }

    fn set_collision_slop(&mut self, slop: f32) {
        self.parameters.allowed_linear_error = slop;
    }

    fn enable_spatial_hash(&mut self, config: SpatialHashConfig) {
        // rapier's sweep-and-prune broad phase sizes itself
        log::debug!(
            "Spatial hash {}x{} recorded; rapier keeps its own broad phase",
            config.dimension,
            config.count
        );
        self.spatial_hash = Some(config);
    }

    fn spatial_hash(&self) -> Option<SpatialHashConfig> {
        self.spatial_hash
    }

    fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.parameters.dt = dt;
        self.pipeline.step(
            &to_vector(self.gravity),
            &self.parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &SurfaceVelocityHooks,
            &NoEvents,
        );
        self.settle_velocities(dt);
    }

    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let rigid_body = RigidBodyBuilder::dynamic().position(isometry(desc.pose)).build();
        let kind = BodyKind::Dynamic {
            shape: desc.shape,
            size: desc.size,
        };
        self.insert(rigid_body, kind, desc.properties)
    }

    fn create_static_segment(&mut self, start: Point2, end: Point2, properties: &BodyProperties) -> BodyHandle {
        // the collider holds world coordinates on a body at the origin
        let rigid_body = RigidBodyBuilder::fixed().build();
        self.insert(rigid_body, BodyKind::Segment { start, end }, *properties)
    }

    fn destroy_body(&mut self, body: BodyHandle) -> bool {
        let Some(entry) = self.entries.remove(body) else {
            return false;
        };
        self.rigid_bodies.remove(
            entry.rigid_body,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        true
    }

    fn body_count(&self) -> usize {
        self.entries.len()
    }

    fn pose(&self, body: BodyHandle) -> Option<BodyPose> {
        let entry = self.entries.get(body)?;
        if let BodyKind::Segment { start, end } = entry.kind {
            let direction = end - start;
            let midpoint = Point2::from((start.coords + end.coords) * 0.5);
            return Some(BodyPose::new(midpoint, direction.y.atan2(direction.x)));
        }
        let rigid_body = self.rigid_bodies.get(entry.rigid_body)?;
        let translation = rigid_body.translation();
        Some(BodyPose::new(
            Point2::new(translation.x, translation.y),
            rigid_body.rotation().angle(),
        ))
    }

    fn set_pose(&mut self, body: BodyHandle, pose: BodyPose) {
        if let Some(rigid_body) = self.dynamic_body_mut(body) {
            rigid_body.set_position(isometry(pose), true);
        }
    }

    fn velocity(&self, body: BodyHandle) -> Option<Vec2> {
        let entry = self.entries.get(body)?;
        let rigid_body = self.rigid_bodies.get(entry.rigid_body)?;
        Some(from_vector(rigid_body.linvel()))
    }

    fn properties(&self, body: BodyHandle) -> Option<BodyProperties> {
        self.entries.get(body).map(|entry| entry.properties)
    }

    fn set_properties(&mut self, body: BodyHandle, properties: &BodyProperties) {
        let Some(entry) = self.entries.get_mut(body) else {
            return;
        };
        entry.properties = *properties;
        self.rebuild_collider(body);
    }

    fn reset_forces(&mut self, body: BodyHandle) {
        if let Some(rigid_body) = self.dynamic_body_mut(body) {
            rigid_body.reset_forces(false);
            rigid_body.reset_torques(false);
        }
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2, offset: Vec2) {
        if let Some(rigid_body) = self.dynamic_body_mut(body) {
            let point = rigid_body.translation() + to_vector(offset);
            rigid_body.add_force_at_point(to_vector(force), Point::new(point.x, point.y), true);
        }
    }

    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2, offset: Vec2) {
        if let Some(rigid_body) = self.dynamic_body_mut(body) {
            let point = rigid_body.translation() + to_vector(offset);
            rigid_body.apply_impulse_at_point(to_vector(impulse), Point::new(point.x, point.y), true);
        }
    }

    fn sleep(&mut self, body: BodyHandle) {
        if let Some(rigid_body) = self.dynamic_body_mut(body) {
            rigid_body.sleep();
        }
    }

    fn activate(&mut self, body: BodyHandle) {
        if let Some(rigid_body) = self.dynamic_body_mut(body) {
            rigid_body.wake_up(true);
        }
    }

    fn is_sleeping(&self, body: BodyHandle) -> bool {
        self.entries
            .get(body)
            .filter(|entry| entry.is_dynamic())
            .and_then(|entry| self.rigid_bodies.get(entry.rigid_body))
            .is_some_and(RigidBody::is_sleeping)
    }
}

/// Feeds the colliders' surface velocities into their contacts
struct SurfaceVelocityHooks;

impl PhysicsHooks for SurfaceVelocityHooks {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let first = unpack_surface_velocity(context.colliders[context.collider1].user_data);
        let second = unpack_surface_velocity(context.colliders[context.collider2].user_data);
        let relative = first - second;
        if relative == Vec2::zeros() {
            return;
        }
        for contact in context.solver_contacts.iter_mut() {
            contact.tangent_velocity = to_vector(relative);
        }
    }
}

struct NoEvents;

impl EventHandler for NoEvents {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
    }
}

fn build_collider(kind: BodyKind, properties: &BodyProperties) -> Collider {
    let builder = match kind {
        BodyKind::Dynamic {
            shape: BodyShape::Box,
            size,
        } => ColliderBuilder::cuboid(size.x * 0.5, size.y * 0.5),
        BodyKind::Dynamic {
            shape: BodyShape::Circle,
            size,
        } => ColliderBuilder::ball(size.x.min(size.y) * 0.5),
        BodyKind::Segment { start, end } => {
            ColliderBuilder::segment(Point::new(start.x, start.y), Point::new(end.x, end.y))
        }
    };
    let builder = builder
        .friction(properties.friction)
        .restitution(properties.elasticity)
        .collision_groups(interaction_groups(properties.group))
        .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS)
        .user_data(pack_surface_velocity(properties.surface_velocity));

    match kind {
        BodyKind::Dynamic { shape, size } => {
            let mass = properties.mass.max(0.0);
            let inertia = properties
                .inertia
                .unwrap_or_else(|| shape.moment_of_inertia(mass, size));
            builder
                .mass_properties(MassProperties::new(Point::new(0.0, 0.0), mass, inertia))
                .build()
        }
        BodyKind::Segment { .. } => builder.build(),
    }
}

/// Group 0 collides with everything; bodies sharing a non-zero group skip
/// each other. Groups wrap around after 32.
fn interaction_groups(group: u32) -> InteractionGroups {
    if group == 0 {
        return InteractionGroups::all();
    }
    let bit = 1u32 << ((group - 1) % 32);
    InteractionGroups::new(bit, !bit)
}

fn pack_surface_velocity(velocity: Vec2) -> u128 {
    u128::from(velocity.x.to_bits()) | (u128::from(velocity.y.to_bits()) << 32)
}

#[allow(clippy::cast_possible_truncation)]
fn unpack_surface_velocity(data: u128) -> Vec2 {
    Vec2::new(f32::from_bits(data as u32), f32::from_bits((data >> 32) as u32))
}

fn to_vector(v: Vec2) -> Vector<Real> {
    Vector::new(v.x, v.y)
}

fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn isometry(pose: BodyPose) -> Isometry<Real> {
    Isometry::new(Vector::new(pose.position.x, pose.position.y), pose.rotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn world(gravity: Vec2) -> RapierPhysicsWorld {
        RapierPhysicsWorld::new(&PhysicsConfig {
            gravity,
            ..PhysicsConfig::default()
        })
    }

    fn crate_at(world: &mut RapierPhysicsWorld, center: Point2, properties: BodyProperties) -> BodyHandle {
        world.create_body(&BodyDesc {
            shape: BodyShape::Box,
            size: Vec2::new(10.0, 10.0),
            pose: BodyPose::new(center, 0.0),
            properties,
        })
    }

    fn run(world: &mut RapierPhysicsWorld, steps: usize) {
        for _ in 0..steps {
            world.step(DT);
        }
    }

    #[test]
    fn test_box_rests_on_static_segment() {
        let mut world = world(Vec2::new(0.0, 100.0));
        world.create_static_segment(
            Point2::new(-100.0, 100.0),
            Point2::new(100.0, 100.0),
            &BodyProperties::default(),
        );
        let body = crate_at(&mut world, Point2::new(0.0, 50.0), BodyProperties::default());

        run(&mut world, 240);

        let y = world.pose(body).unwrap().position.y;
        assert!(y > 85.0 && y < 100.0, "box center at {y}");
    }

    #[test]
    fn test_box_falls_without_floor() {
        let mut world = world(Vec2::new(0.0, 100.0));
        let body = crate_at(&mut world, Point2::new(0.0, 50.0), BodyProperties::default());

        run(&mut world, 180);

        assert!(world.pose(body).unwrap().position.y > 300.0);
    }

    #[test]
    fn test_shared_group_skips_contacts() {
        let mut world = world(Vec2::zeros());
        let grouped = BodyProperties {
            group: 3,
            ..BodyProperties::default()
        };
        let a = crate_at(&mut world, Point2::new(0.0, 0.0), grouped);
        let b = crate_at(&mut world, Point2::new(5.0, 0.0), grouped);

        run(&mut world, 30);

        assert_relative_eq!(world.pose(a).unwrap().position, Point2::new(0.0, 0.0), epsilon = 1e-4);
        assert_relative_eq!(world.pose(b).unwrap().position, Point2::new(5.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_overlapping_bodies_are_pushed_apart() {
        let mut world = world(Vec2::zeros());
        let a = crate_at(&mut world, Point2::new(0.0, 0.0), BodyProperties::default());
        let b = crate_at(&mut world, Point2::new(5.0, 0.0), BodyProperties::default());

        run(&mut world, 30);

        let gap = world.pose(b).unwrap().position.x - world.pose(a).unwrap().position.x;
        assert!(gap > 6.0, "gap {gap}");
    }

    #[test]
    fn test_impulse_respects_mass_and_limit() {
        let mut world = world(Vec2::zeros());
        let body = crate_at(
            &mut world,
            Point2::origin(),
            BodyProperties {
                mass: 2.0,
                ..BodyProperties::default()
            },
        );
        world.step(DT);

        world.apply_impulse(body, Vec2::new(4.0, 0.0), Vec2::zeros());
        assert_relative_eq!(world.velocity(body).unwrap(), Vec2::new(2.0, 0.0), epsilon = 1e-3);

        world.set_properties(
            body,
            &BodyProperties {
                mass: 2.0,
                velocity_limit: Some(1.0),
                ..BodyProperties::default()
            },
        );
        world.step(DT);
        assert!(world.velocity(body).unwrap().norm() <= 1.0 + 1e-4);
    }

    #[test]
    fn test_properties_replace_the_collider() {
        let mut world = world(Vec2::zeros());
        let body = crate_at(&mut world, Point2::origin(), BodyProperties::default());
        let slippery = BodyProperties {
            friction: 0.0,
            elasticity: 0.8,
            surface_velocity: Vec2::new(-2.5, 0.0),
            ..BodyProperties::default()
        };

        world.set_properties(body, &slippery);

        assert_eq!(world.properties(body), Some(slippery));
        assert_eq!(world.colliders.len(), 1);
        let collider = &world.colliders[world.entries[body].collider];
        assert_eq!(unpack_surface_velocity(collider.user_data), Vec2::new(-2.5, 0.0));
    }

    #[test]
    fn test_segment_pose_and_destroy() {
        let mut world = world(Vec2::new(0.0, 100.0));
        let segment = world.create_static_segment(
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 10.0),
            &BodyProperties::default(),
        );

        let pose = world.pose(segment).unwrap();
        assert_relative_eq!(pose.position, Point2::new(0.0, 5.0));
        assert_relative_eq!(pose.rotation, std::f32::consts::FRAC_PI_2);
        assert!(!world.is_sleeping(segment));

        assert!(world.destroy_body(segment));
        assert!(!world.destroy_body(segment));
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.colliders.len(), 0);
    }

    #[test]
    fn test_sleep_and_wake() {
        let mut world = world(Vec2::new(0.0, 100.0));
        let body = crate_at(&mut world, Point2::origin(), BodyProperties::default());
        world.step(DT);

        world.sleep(body);
        assert!(world.is_sleeping(body));
        world.activate(body);
        assert!(!world.is_sleeping(body));
    }

    #[test]
    fn test_groups() {
        assert_eq!(interaction_groups(0), InteractionGroups::all());
        let a = interaction_groups(1);
        let b = interaction_groups(2);
        assert!(!a.test(a));
        assert!(a.test(b));
        assert!(a.test(InteractionGroups::all()));
    }
}
