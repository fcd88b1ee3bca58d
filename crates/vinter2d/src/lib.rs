//! # Vinter2D
//!
//! Quadtree-backed 2D scene management.
//!
//! ## Features
//!
//! - **Scene graph**: root, UI and child nodes with exclusive ownership
//! - **Spatial index**: quadtree culling and broad-phase queries
//! - **Traces**: nearest-hit line traces and topmost-hit rect traces
//! - **Physics bridge**: dynamic bodies and static segments behind a
//!   pluggable [`PhysicsWorld`](physics::PhysicsWorld)
//! - **Animations**: frame-driven animation stacks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vinter2d::prelude::*;
//!
//! let mut scene = Scene::new(SceneConfig::default());
//! let crate_node = scene.insert_node(
//!     SceneNode::new(Point2::new(0.0, 0.0), Vec2::new(32.0, 32.0), 1).with_debug_name("crate"),
//! );
//! scene.enable_physics(crate_node, BodyShape::Box).unwrap();
//! scene.add_camera(Camera::new(Point2::new(-400.0, -300.0), Vec2::new(800.0, 600.0)));
//!
//! let stats = scene.draw(&mut NullRenderer, 1.0 / 60.0);
//! assert_eq!(stats.render_passes, 1);
//!
//! let hit = scene.trace_line(Point2::new(-100.0, 16.0), Point2::new(100.0, 16.0), 1);
//! assert_eq!(hit.map(|hit| hit.node), Some(crate_node));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod animation;
pub mod config;
pub mod core;
pub mod error;
pub mod foundation;
pub mod physics;
pub mod scene;
pub mod spatial;

pub use error::{PhysicsError, SceneError};

/// Common imports for scene users
pub mod prelude {
    pub use crate::{
        animation::{Animation, AnimationServer, AnimationStatus},
        config::{Config, ConfigError},
        core::{LayerMatch, PhysicsBackend, PhysicsConfig, SceneConfig, WorldBounds},
        error::{PhysicsError, SceneError},
        foundation::{
            collections::{CameraId, NodeId},
            math::{Line, Point2, Rect, Vec2},
        },
        physics::{BodyProperties, BodyShape, PhysicsState, PhysicsWorld},
        scene::{
            Camera, LayerFilter, NodeFlags, NullRenderer, RenderPass, Renderer, Scene, SceneNode,
            TraceHit,
        },
        spatial::SpatialQuery,
    };
}
