//! Math utilities and types
//!
//! Provides the fundamental 2D math types used by the collision pipeline.
//! Everything is `f32` and built on nalgebra, with 3x3 homogeneous matrices
//! standing in for 2D affine transforms.

pub use nalgebra::{Matrix3, Rotation2, Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 2D point type
pub type Point2 = nalgebra::Point2<f32>;

/// 3x3 homogeneous matrix type (2D affine transform)
pub type Mat3 = Matrix3<f32>;

/// 2D rotation type
pub type Rot2 = Rotation2<f32>;

/// Tolerance used by geometric predicates
pub const EPSILON: f32 = 1.0e-6;

/// Build a world matrix in TRS order from position, rotation (radians) and scale
pub fn trs_matrix(position: Vec2, rotation: f32, scale: Vec2) -> Mat3 {
    Mat3::new_translation(&position)
        * Rot2::new(rotation).to_homogeneous()
        * Mat3::new_nonuniform_scaling(&scale)
}

/// Right-hand perpendicular `(y, -x)`.
///
/// For a counter-clockwise polygon this turns an edge direction into its
/// outward normal.
pub fn perp_right(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

/// Scalar 2D cross product (z component of the 3D cross product)
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Largest axis scale factor encoded in an affine matrix
pub fn max_axis_scale(matrix: &Mat3) -> f32 {
    let x_axis = Vec2::new(matrix.m11, matrix.m21).magnitude();
    let y_axis = Vec2::new(matrix.m12, matrix.m22).magnitude();
    x_axis.max(y_axis)
}

/// Signed area of a polygon (positive for counter-clockwise winding)
pub fn signed_area(points: &[Point2]) -> f32 {
    let n = points.len();
    let mut twice_area = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        twice_area += a.x * b.y - b.x * a.y;
    }
    twice_area * 0.5
}

/// Project a point set onto an axis and return `(min, max)`
pub fn project(points: &[Point2], axis: Vec2) -> (f32, f32) {
    points.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), p| {
        let d = p.coords.dot(&axis);
        (min.min(d), max.max(d))
    })
}
