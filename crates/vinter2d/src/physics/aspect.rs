//! Physics aspect attached to scene nodes
//!
//! A node becomes physics-enabled by receiving an aspect. The aspect
//! remembers shape and properties; the body itself only exists while the
//! node is a root node of a scene with physics enabled.

use crate::foundation::collections::BodyHandle;
use crate::foundation::math::Point2;

use super::world::{BodyPose, BodyProperties, BodyShape};

/// Simulated body following forces and gravity
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicBody {
    /// Collision shape sized from the node
    pub shape: BodyShape,
    /// Current properties
    pub properties: BodyProperties,
    pub(crate) body: Option<BodyHandle>,
    /// Body pose last copied to or from the node
    pub(crate) synced: Option<BodyPose>,
}

/// Immovable segment from the node position to `end`
#[derive(Debug, Clone, PartialEq)]
pub struct StaticSegment {
    /// Far endpoint of the segment
    pub end: Point2,
    /// Contact properties
    pub properties: BodyProperties,
    pub(crate) body: Option<BodyHandle>,
}

/// Physics state of a node
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsAspect {
    /// Dynamic rigid body
    Dynamic(DynamicBody),
    /// Static segment
    Static(StaticSegment),
}

impl PhysicsAspect {
    /// New dynamic aspect with default properties
    pub fn dynamic(shape: BodyShape) -> Self {
        Self::Dynamic(DynamicBody {
            shape,
            properties: BodyProperties::default(),
            body: None,
            synced: None,
        })
    }

    /// New static aspect with default properties
    pub fn segment(end: Point2) -> Self {
        Self::Static(StaticSegment {
            end,
            properties: BodyProperties::default(),
            body: None,
        })
    }

    /// Live body, if the node is currently simulated
    pub fn body(&self) -> Option<BodyHandle> {
        match self {
            Self::Dynamic(dynamic) => dynamic.body,
            Self::Static(segment) => segment.body,
        }
    }

    /// Check if a body exists for this aspect
    pub fn is_active(&self) -> bool {
        self.body().is_some()
    }

    /// Check if this is a static segment
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }

    /// Current properties
    pub fn properties(&self) -> &BodyProperties {
        match self {
            Self::Dynamic(dynamic) => &dynamic.properties,
            Self::Static(segment) => &segment.properties,
        }
    }

    pub(crate) fn properties_mut(&mut self) -> &mut BodyProperties {
        match self {
            Self::Dynamic(dynamic) => &mut dynamic.properties,
            Self::Static(segment) => &mut segment.properties,
        }
    }

    pub(crate) fn set_body(&mut self, body: Option<BodyHandle>) {
        match self {
            Self::Dynamic(dynamic) => dynamic.body = body,
            Self::Static(segment) => segment.body = body,
        }
    }

    pub(crate) fn take_body(&mut self) -> Option<BodyHandle> {
        match self {
            Self::Dynamic(dynamic) => {
                dynamic.synced = None;
                dynamic.body.take()
            }
            Self::Static(segment) => segment.body.take(),
        }
    }
}
