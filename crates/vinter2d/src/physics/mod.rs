//! Rigid-body physics for scene nodes
//!
//! [`PhysicsWorld`] is the simulation backend seam. [`RapierPhysicsWorld`]
//! resolves contacts with rapier2d; [`BasicPhysicsWorld`] only integrates
//! forces and is used where exact motion matters more than collisions.
//! The scene-side bridge lives in [`Scene`](crate::scene::Scene), which
//! owns the node-to-body mapping.

mod aspect;
mod basic;
mod rapier;
mod world;

pub use aspect::{DynamicBody, PhysicsAspect, StaticSegment};
pub use basic::BasicPhysicsWorld;
pub use rapier::RapierPhysicsWorld;
pub use world::{BodyDesc, BodyPose, BodyProperties, BodyShape, PhysicsWorld};

/// Whether the scene advances its physics world while drawing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhysicsState {
    /// Stepped every frame
    #[default]
    Active,
    /// Not stepped; node transforms keep the last simulated state
    Paused,
}
