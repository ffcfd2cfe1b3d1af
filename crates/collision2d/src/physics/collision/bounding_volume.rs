//! Bounding volumes for broad-phase culling
//!
//! A bounding volume is a cheap enclosing shape. Every collider keeps two of
//! them: the volume of its shape in model space and that volume transformed to
//! world space. The set of kinds is closed; adding one means adding a variant
//! to [`BoundingVolume`] and its overlap tests.

use crate::foundation::math::{max_axis_scale, Mat3, Point2, Vec2};
use serde::{Deserialize, Serialize};

/// Kind of bounding volume, chosen when a collider is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BoundingVolumeKind {
    /// Axis-aligned box
    #[default]
    Aabb,
    /// Circle around the shape centroid
    Circle,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Point2,
    /// Maximum corner
    pub max: Point2,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given half extents
    pub fn from_center_extents(center: Point2, extents: Vec2) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box containing every point (a zero box at the origin if empty)
    pub fn from_points(points: &[Point2]) -> Self {
        let Some(first) = points.first() else {
            return Self::new(Point2::origin(), Point2::origin());
        };
        points.iter().skip(1).fold(Self::new(*first, *first), |aabb, p| Self {
            min: Point2::new(aabb.min.x.min(p.x), aabb.min.y.min(p.y)),
            max: Point2::new(aabb.max.x.max(p.x), aabb.max.y.max(p.y)),
        })
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Point2 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Point2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Check if this AABB intersects another AABB (touching counts)
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Check if this AABB intersects a circle
    pub fn intersects_circle(&self, circle: &BoundingCircle) -> bool {
        let closest = Point2::new(
            circle.center.x.clamp(self.min.x, self.max.x),
            circle.center.y.clamp(self.min.y, self.max.y),
        );
        (closest - circle.center).magnitude_squared() <= circle.radius * circle.radius
    }

    /// Box enclosing this box after an affine transform
    pub fn transformed(&self, matrix: &Mat3) -> Self {
        let corners = [
            self.min,
            Point2::new(self.max.x, self.min.y),
            self.max,
            Point2::new(self.min.x, self.max.y),
        ]
        .map(|corner| matrix.transform_point(&corner));
        Self::from_points(&corners)
    }
}

/// Bounding circle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingCircle {
    /// Center of the circle
    pub center: Point2,
    /// Radius of the circle
    pub radius: f32,
}

impl BoundingCircle {
    /// Creates a new bounding circle with the given center and radius
    pub fn new(center: Point2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Circle around `center` reaching the farthest point
    pub fn from_points(points: &[Point2], center: Point2) -> Self {
        let radius_squared = points
            .iter()
            .map(|p| (p - center).magnitude_squared())
            .fold(0.0, f32::max);
        Self::new(center, radius_squared.sqrt())
    }

    /// Check if this circle intersects another (touching counts)
    pub fn intersects(&self, other: &BoundingCircle) -> bool {
        let radius_sum = self.radius + other.radius;
        (self.center - other.center).magnitude_squared() <= radius_sum * radius_sum
    }

    /// Circle enclosing this circle after an affine transform
    ///
    /// Non-uniform scale inflates the radius by the largest axis scale.
    pub fn transformed(&self, matrix: &Mat3) -> Self {
        Self::new(
            matrix.transform_point(&self.center),
            self.radius * max_axis_scale(matrix),
        )
    }

    /// Box enclosing the circle
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_extents(self.center, Vec2::new(self.radius, self.radius))
    }
}

/// Bounding volume of one of the supported kinds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingVolume {
    /// Axis-aligned box
    Aabb(Aabb),
    /// Circle
    Circle(BoundingCircle),
}

impl BoundingVolume {
    /// Compute a volume of `kind` enclosing `points`
    pub fn from_points(kind: BoundingVolumeKind, points: &[Point2], centroid: Point2) -> Self {
        match kind {
            BoundingVolumeKind::Aabb => Self::Aabb(Aabb::from_points(points)),
            BoundingVolumeKind::Circle => Self::Circle(BoundingCircle::from_points(points, centroid)),
        }
    }

    /// Kind of this volume
    pub fn kind(&self) -> BoundingVolumeKind {
        match self {
            Self::Aabb(_) => BoundingVolumeKind::Aabb,
            Self::Circle(_) => BoundingVolumeKind::Circle,
        }
    }

    /// Volume after an affine transform (local to world)
    pub fn transformed(&self, matrix: &Mat3) -> Self {
        match self {
            Self::Aabb(aabb) => Self::Aabb(aabb.transformed(matrix)),
            Self::Circle(circle) => Self::Circle(circle.transformed(matrix)),
        }
    }

    /// Check if two volumes overlap, whatever their kinds
    pub fn intersects(&self, other: &BoundingVolume) -> bool {
        match (self, other) {
            (Self::Aabb(a), Self::Aabb(b)) => a.intersects(b),
            (Self::Circle(a), Self::Circle(b)) => a.intersects(b),
            (Self::Aabb(aabb), Self::Circle(circle)) | (Self::Circle(circle), Self::Aabb(aabb)) => {
                aabb.intersects_circle(circle)
            }
        }
    }

    /// Center of the volume
    pub fn center(&self) -> Point2 {
        match self {
            Self::Aabb(aabb) => aabb.center(),
            Self::Circle(circle) => circle.center,
        }
    }

    /// Box enclosing the volume
    pub fn aabb(&self) -> Aabb {
        match self {
            Self::Aabb(aabb) => *aabb,
            Self::Circle(circle) => circle.aabb(),
        }
    }
}

impl Default for BoundingVolume {
    fn default() -> Self {
        Self::Aabb(Aabb::new(Point2::origin(), Point2::origin()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::trs_matrix;
    use approx::assert_relative_eq;

    fn unit_square() -> Vec<Point2> {
        vec![
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(-1.0, 1.0),
        ]
    }

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points(&unit_square());
        assert_eq!(aabb.min, Point2::new(-1.0, -1.0));
        assert_eq!(aabb.max, Point2::new(1.0, 1.0));
        assert_relative_eq!(aabb.extents(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_rotated_aabb_grows() {
        let aabb = Aabb::from_points(&unit_square());
        let matrix = trs_matrix(Vec2::new(3.0, 0.0), std::f32::consts::FRAC_PI_4, Vec2::new(1.0, 1.0));

        let world = aabb.transformed(&matrix);

        let half_diagonal = std::f32::consts::SQRT_2;
        assert_relative_eq!(world.center(), Point2::new(3.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(world.extents(), Vec2::new(half_diagonal, half_diagonal), epsilon = 1e-5);
    }

    #[test]
    fn test_circle_scales_by_largest_axis() {
        let circle = BoundingCircle::from_points(&unit_square(), Point2::origin());
        assert_relative_eq!(circle.radius, std::f32::consts::SQRT_2, epsilon = 1e-6);

        let matrix = trs_matrix(Vec2::new(0.0, 2.0), 0.0, Vec2::new(1.0, 3.0));
        let world = circle.transformed(&matrix);
        assert_relative_eq!(world.center, Point2::new(0.0, 2.0));
        assert_relative_eq!(world.radius, 3.0 * std::f32::consts::SQRT_2, epsilon = 1e-5);
    }

    #[test]
    fn test_mixed_kind_overlap() {
        let aabb = BoundingVolume::Aabb(Aabb::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)));
        let near = BoundingVolume::Circle(BoundingCircle::new(Point2::new(1.5, 0.5), 0.6));
        let corner = BoundingVolume::Circle(BoundingCircle::new(Point2::new(1.5, 1.5), 0.6));

        assert!(aabb.intersects(&near));
        assert!(near.intersects(&aabb));
        // Circle reaches the box's corner region on both axes but not the corner itself
        assert!(!aabb.intersects(&corner));
        assert!(corner.aabb().intersects(&aabb.aabb()));
    }

    #[test]
    fn test_touching_boxes_intersect() {
        let a = Aabb::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        let b = Aabb::new(Point2::new(1.0, 0.0), Point2::new(2.0, 1.0));
        let c = Aabb::new(Point2::new(1.01, 0.0), Point2::new(2.0, 1.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
