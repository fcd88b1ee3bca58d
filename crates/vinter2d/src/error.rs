//! Error types for scene and physics operations

use thiserror::Error;

use crate::foundation::collections::{CameraId, NodeId};

/// Errors raised by scene graph operations
///
/// Removing something that is not there is not an error; those calls
/// return `false` instead.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// The node id is not (or no longer) part of the scene's store
    #[error("Unknown scene node: {0:?}")]
    UnknownNode(NodeId),

    /// The camera id is not registered with the scene
    #[error("Unknown camera: {0:?}")]
    UnknownCamera(CameraId),

    /// Attaching the child would make a node its own ancestor
    #[error("Attaching {child:?} to {parent:?} would create a cycle")]
    Cycle {
        /// Requested parent
        parent: NodeId,
        /// Requested child
        child: NodeId,
    },
}

/// Errors raised by the physics bridge
///
/// These indicate programming errors on the caller's side and are always
/// reported rather than ignored.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsError {
    /// The node id is not part of the scene's store
    #[error("Unknown scene node: {0:?}")]
    UnknownNode(NodeId),

    /// The node has no physics aspect
    #[error("Node {0:?} is not physics-enabled")]
    NotPhysicsEnabled(NodeId),

    /// The operation needs a dynamic body but the node is a static segment
    #[error("Node {0:?} is a static object and cannot be moved by forces")]
    StaticBody(NodeId),

    /// The node has a physics aspect but no live body, because it is not a
    /// root node of the scene
    #[error("Node {0:?} has no active body; add it to the scene first")]
    Inactive(NodeId),

    /// The scene was built without a physics world
    #[error("Physics is disabled for this scene")]
    WorldDisabled,
}
