//! Cameras
//!
//! A camera is a view rectangle in world space. The scene draws each camera
//! in registration order, feeding it the nodes whose bounds touch its frame.

use crate::foundation::math::{Point2, Rect, Vec2};

/// A view into the scene
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Minimum corner of the view in world units
    pub position: Point2,
    /// Extent of the view in world units
    pub size: Vec2,
    /// Label shown in logs
    pub debug_name: Option<String>,
}

impl Camera {
    /// Create a camera viewing `size` world units from `position`
    pub fn new(position: Point2, size: Vec2) -> Self {
        Self {
            position,
            size,
            debug_name: None,
        }
    }

    /// Set a debug label
    pub fn with_debug_name(mut self, name: impl Into<String>) -> Self {
        self.debug_name = Some(name.into());
        self
    }

    /// Visible world rectangle
    pub fn frame(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Move the view
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Center the view on a point
    pub fn look_at(&mut self, target: Point2) {
        self.position = target - self.size * 0.5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_look_at_centers_frame() {
        let mut camera = Camera::new(Point2::origin(), Vec2::new(800.0, 600.0));
        camera.look_at(Point2::new(1000.0, 1000.0));

        assert_eq!(camera.frame(), Rect::new(600.0, 700.0, 800.0, 600.0));
        assert_eq!(camera.frame().center(), Point2::new(1000.0, 1000.0));
    }
}
