//! # Core Engine Module
//!
//! Shared settings types used to build a scene.

pub mod config;

pub use config::{
    LayerMatch,
    PhysicsBackend,
    PhysicsConfig,
    SceneConfig,
    SpatialHashConfig,
    TraceConfig,
    WorldBounds,
};
