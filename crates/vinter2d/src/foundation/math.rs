//! Math utilities and types
//!
//! Provides the 2D math types used by the scene core. Vectors and matrices
//! come from `nalgebra`; rectangles and line segments are thin value types
//! on top of them.

pub use nalgebra::{Matrix4, Unit, Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type (used to build homogeneous matrices)
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 2D point type
pub type Point2 = nalgebra::Point2<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// 2D rotation type
pub type Rotation2 = nalgebra::Rotation2<f32>;

/// Axis-aligned rectangle
///
/// `origin` is the minimum corner, so a rectangle at (0, 0) with size
/// (10, 10) covers x and y in `[0, 10]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Minimum corner
    pub origin: Point2,
    /// Extent along each axis (never negative)
    pub size: Vec2,
}

impl Rect {
    /// Create a rectangle from its minimum corner and size
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point2::new(x, y),
            size: Vec2::new(width.max(0.0), height.max(0.0)),
        }
    }

    /// Create a rectangle from an origin point and a size vector
    pub fn from_origin_size(origin: Point2, size: Vec2) -> Self {
        Self::new(origin.x, origin.y, size.x, size.y)
    }

    /// Create a rectangle spanning two corners
    pub fn from_min_max(min: Point2, max: Point2) -> Self {
        Self {
            origin: Point2::new(min.x.min(max.x), min.y.min(max.y)),
            size: Vec2::new((max.x - min.x).abs(), (max.y - min.y).abs()),
        }
    }

    /// Minimum corner
    pub fn min(&self) -> Point2 {
        self.origin
    }

    /// Maximum corner
    pub fn max(&self) -> Point2 {
        self.origin + self.size
    }

    /// Center of the rectangle
    pub fn center(&self) -> Point2 {
        self.origin + self.size * 0.5
    }

    /// Check if this rectangle contains a point (edges inclusive)
    pub fn contains_point(&self, point: Point2) -> bool {
        let max = self.max();
        point.x >= self.origin.x && point.x <= max.x &&
        point.y >= self.origin.y && point.y <= max.y
    }

    /// Check if `other` lies completely inside this rectangle (edges inclusive)
    pub fn contains_rect(&self, other: &Rect) -> bool {
        let (max, other_max) = (self.max(), other.max());
        other.origin.x >= self.origin.x && other_max.x <= max.x &&
        other.origin.y >= self.origin.y && other_max.y <= max.y
    }

    /// Check if this rectangle overlaps another (touching edges count)
    pub fn intersects(&self, other: &Rect) -> bool {
        let (max, other_max) = (self.max(), other.max());
        self.origin.x <= other_max.x && max.x >= other.origin.x &&
        self.origin.y <= other_max.y && max.y >= other.origin.y
    }

    /// One of the four equal quadrants of this rectangle
    ///
    /// Quadrant layout (bit 0 selects +X, bit 1 selects +Y):
    /// 0: -X -Y, 1: +X -Y, 2: -X +Y, 3: +X +Y
    pub fn quadrant(&self, index: usize) -> Rect {
        let half = self.size * 0.5;
        let x = if index & 1 != 0 { self.origin.x + half.x } else { self.origin.x };
        let y = if index & 2 != 0 { self.origin.y + half.y } else { self.origin.y };
        Rect::new(x, y, half.x, half.y)
    }
}

/// A line segment, used for traces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// Start point of the segment
    pub start: Point2,
    /// End point of the segment
    pub end: Point2,
}

impl Line {
    /// Create a new segment
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// Length of the segment
    pub fn length(&self) -> f32 {
        (self.end - self.start).magnitude()
    }

    /// Point at parameter `t` (0 = start, 1 = end)
    pub fn point_at(&self, t: f32) -> Point2 {
        self.start + (self.end - self.start) * t
    }

    /// Axis-aligned bounds of the segment
    pub fn bounds(&self) -> Rect {
        Rect::from_min_max(self.start, self.end)
    }

    /// Clip the segment against a rectangle using the slab method
    ///
    /// Returns the parameter and world position where the segment enters
    /// the rectangle, or `t = 0` and the start point if the segment starts
    /// inside it.
    pub fn intersect_rect(&self, rect: &Rect) -> Option<(f32, Point2)> {
        let direction = self.end - self.start;
        let (min, max) = (rect.min(), rect.max());

        let mut t_enter = 0.0_f32;
        let mut t_exit = 1.0_f32;

        for axis in 0..2 {
            let origin = self.start[axis];
            let delta = direction[axis];

            if delta.abs() <= f32::EPSILON {
                // Parallel to this slab
                if origin < min[axis] || origin > max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / delta;
            let mut t0 = (min[axis] - origin) * inv;
            let mut t1 = (max[axis] - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        Some((t_enter, self.point_at(t_enter)))
    }
}

/// Position and rotation of a node in 2D
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    /// Translation
    pub position: Point2,
    /// Rotation around the Z axis in radians
    pub rotation: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Point2::origin(),
            rotation: 0.0,
        }
    }
}

impl Transform2D {
    /// Create a transform from position and rotation
    pub fn new(position: Point2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    /// Convert to a homogeneous transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&Vec3::new(self.position.x, self.position.y, 0.0))
            * Mat4::from_axis_angle(&Vec3::z_axis(), self.rotation)
    }
}

/// Perpendicular dot product (z component of the 3D cross product)
pub fn cross(a: &Vec2, b: &Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}
