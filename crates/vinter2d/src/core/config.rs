//! # Scene Configuration
//!
//! Typed, serializable settings for a [`Scene`](crate::scene::Scene): the
//! world bounds and subdivision depth of its quadtree, the parameters of
//! its physics world, and how trace calls interpret layers.
//!
//! Every struct carries `#[serde(default)]`, so a config file only needs
//! the keys it wants to change:
//!
//! ```toml
//! subdivisions = 6
//!
//! [physics]
//! gravity = [0.0, 9.81]
//! ```

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::foundation::math::{Point2, Rect, Vec2};

/// World-space extent covered by the quadtree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldBounds {
    /// Left edge
    pub min_x: f32,
    /// Top edge
    pub min_y: f32,
    /// Right edge
    pub max_x: f32,
    /// Bottom edge
    pub max_y: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min_x: -4096.0,
            min_y: -4096.0,
            max_x: 4096.0,
            max_y: 4096.0,
        }
    }
}

impl WorldBounds {
    /// Create bounds from the four edges
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Bounds as a rectangle
    pub fn to_rect(&self) -> Rect {
        Rect::from_min_max(Point2::new(self.min_x, self.min_y), Point2::new(self.max_x, self.max_y))
    }
}

/// Spatial hash tuning forwarded to the physics world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialHashConfig {
    /// Cell size of the hash
    pub dimension: f32,
    /// Number of cells
    pub count: u32,
}

/// Simulation backend a scene builds for its physics world
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhysicsBackend {
    /// rapier2d rigid bodies with contact resolution
    #[default]
    Rapier,
    /// Force integration without contacts, for tests and headless tools
    Basic,
}

/// Physics world parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// World implementation
    pub backend: PhysicsBackend,
    /// Gravity applied to every dynamic body
    pub gravity: Vec2,
    /// Fraction of velocity a body keeps after one second
    pub damping: f32,
    /// Overlap between shapes that is still tolerated
    pub collision_slop: f32,
    /// Size of one physics step in seconds; frame time is accumulated
    /// and consumed in steps of this size
    pub fixed_timestep: f64,
    /// Optional spatial hashing for the broad phase
    pub spatial_hash: Option<SpatialHashConfig>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            backend: PhysicsBackend::default(),
            gravity: Vec2::new(0.0, 100.0),
            damping: 1.0,
            collision_slop: 0.1,
            fixed_timestep: 1.0 / 60.0,
            spatial_hash: None,
        }
    }
}

/// How the `layer` argument of a trace is compared with node layers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerMatch {
    /// Node layer must equal the requested layer
    #[default]
    Exact,
    /// Node layer must share at least one bit with the requested layer
    Mask,
}

/// Trace behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Layer comparison used by `Scene::trace_line` and `Scene::trace_rect`
    pub layer_match: LayerMatch,
}

/// Everything needed to construct a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Extent of the quadtree
    pub bounds: WorldBounds,
    /// Maximum quadtree depth; the smallest bucket is
    /// `bounds / 2^subdivisions` along each axis
    pub subdivisions: u32,
    /// Physics world parameters, `None` disables physics entirely
    pub physics: Option<PhysicsConfig>,
    /// Trace behaviour
    pub trace: TraceConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            bounds: WorldBounds::default(),
            subdivisions: 4,
            physics: Some(PhysicsConfig::default()),
            trace: TraceConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Config with explicit bounds and subdivision count
    pub fn new(bounds: WorldBounds, subdivisions: u32) -> Self {
        Self {
            bounds,
            subdivisions,
            ..Self::default()
        }
    }

    /// Replace the physics parameters
    pub fn with_physics(mut self, physics: Option<PhysicsConfig>) -> Self {
        self.physics = physics;
        self
    }

    /// Replace the layer comparison used by traces
    pub fn with_layer_match(mut self, layer_match: LayerMatch) -> Self {
        self.trace.layer_match = layer_match;
        self
    }
}

impl Config for SceneConfig {}
