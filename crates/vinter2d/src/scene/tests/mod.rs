//! Scene behaviour tests

mod draw;
mod traces;

use crate::core::{PhysicsBackend, PhysicsConfig, SceneConfig, WorldBounds};
use crate::foundation::logging;
use crate::foundation::math::{Point2, Vec2};

use super::{Scene, SceneNode};

/// 1024x1024 world centered on the origin, no physics
fn scene() -> Scene {
    logging::init();
    Scene::new(SceneConfig::new(WorldBounds::new(-512.0, -512.0, 512.0, 512.0), 4).with_physics(None))
}

/// Same world with physics stepped once per draw
///
/// Uses the integrating backend so expected positions are exact.
fn physics_scene() -> Scene {
    logging::init();
    let physics = PhysicsConfig {
        backend: PhysicsBackend::Basic,
        fixed_timestep: 0.0,
        ..PhysicsConfig::default()
    };
    Scene::new(SceneConfig::new(WorldBounds::new(-512.0, -512.0, 512.0, 512.0), 4).with_physics(Some(physics)))
}

fn node(x: f32, y: f32, width: f32, height: f32, layer: u32) -> SceneNode {
    SceneNode::new(Point2::new(x, y), Vec2::new(width, height), layer)
}
