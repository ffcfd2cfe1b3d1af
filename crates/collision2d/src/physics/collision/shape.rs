//! Convex polygon collision shapes
//!
//! Shapes are stored in MODEL SPACE and transformed to world space on demand
//! during collision tests. Replacing a shape's vertices fires a change
//! notification so every collider using the shape refreshes its bounding
//! volumes on the next update.

use crate::foundation::math::{cross, signed_area, Mat3, Point2, Vec2, EPSILON};
use crate::physics::events::{ChangeNotifier, DirtyListener};
use std::cell::RefCell;
use std::rc::Rc;

/// Shape shared between its owner and the colliders that reference it
pub type SharedShape = Rc<RefCell<Shape>>;

/// Errors raised when building a shape from vertices
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// A polygon needs at least three vertices
    #[error("a convex polygon needs at least 3 points, got {0}")]
    TooFewPoints(usize),

    /// A vertex contains NaN or infinity
    #[error("point {index} is not finite")]
    NonFinite {
        /// Offending vertex
        index: usize,
    },

    /// All vertices are collinear or coincident
    #[error("polygon has zero area")]
    ZeroArea,

    /// The polygon turns the wrong way at a vertex
    #[error("polygon is not convex at point {index}")]
    NotConvex {
        /// Offending vertex
        index: usize,
    },

    /// A size parameter was zero, negative or not finite
    #[error("invalid dimension: {0}")]
    InvalidDimension(f32),
}

/// Convex polygon in model space
///
/// Vertices are kept in counter-clockwise order; clockwise input is reversed
/// at construction.
#[derive(Debug)]
pub struct Shape {
    points: Vec<Point2>,
    centroid: Point2,
    notifier: ChangeNotifier,
}

impl Shape {
    /// Create a shape from model-space vertices of a convex polygon
    pub fn new(points: Vec<Point2>) -> Result<Self, ShapeError> {
        let (points, centroid) = validate(points)?;
        Ok(Self {
            points,
            centroid,
            notifier: ChangeNotifier::new(),
        })
    }

    /// Axis-aligned rectangle centered on the origin
    pub fn rectangle(half_width: f32, half_height: f32) -> Result<Self, ShapeError> {
        for dimension in [half_width, half_height] {
            if !(dimension.is_finite() && dimension > 0.0) {
                return Err(ShapeError::InvalidDimension(dimension));
            }
        }
        Self::new(vec![
            Point2::new(-half_width, -half_height),
            Point2::new(half_width, -half_height),
            Point2::new(half_width, half_height),
            Point2::new(-half_width, half_height),
        ])
    }

    /// Square centered on the origin
    pub fn square(half_extent: f32) -> Result<Self, ShapeError> {
        Self::rectangle(half_extent, half_extent)
    }

    /// Regular polygon with `sides` vertices on a circle of `radius`
    pub fn regular_polygon(sides: usize, radius: f32) -> Result<Self, ShapeError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(ShapeError::InvalidDimension(radius));
        }
        let step = std::f32::consts::TAU / sides as f32;
        let points = (0..sides)
            .map(|i| {
                let angle = step * i as f32;
                Point2::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        Self::new(points)
    }

    /// Wrap this shape for sharing with colliders
    pub fn shared(self) -> SharedShape {
        Rc::new(RefCell::new(self))
    }

    /// Model-space vertices (counter-clockwise)
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Area-weighted model-space centroid
    pub fn centroid(&self) -> Point2 {
        self.centroid
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Replace the vertices and notify every collider using this shape
    ///
    /// On error the previous vertices are kept and nobody is notified.
    pub fn set_points(&mut self, points: Vec<Point2>) -> Result<(), ShapeError> {
        let (points, centroid) = validate(points)?;
        self.points = points;
        self.centroid = centroid;
        self.notifier.notify();
        Ok(())
    }

    /// Subscribe to vertex changes
    pub fn subscribe(&mut self, listener: DirtyListener) {
        self.notifier.subscribe(listener);
    }

    /// Number of colliders listening for vertex changes
    pub fn listener_count(&self) -> usize {
        self.notifier.listener_count()
    }

    /// Transform the vertices into `out`, keeping counter-clockwise order
    ///
    /// A mirroring transform flips the winding, which is undone here so edge
    /// normals stay outward-facing.
    pub fn world_points_into(&self, matrix: &Mat3, out: &mut Vec<Point2>) {
        out.clear();
        out.extend(self.points.iter().map(|p| matrix.transform_point(p)));
        if signed_area(out) < 0.0 {
            out.reverse();
        }
    }

    /// Transform the vertices to world space
    pub fn to_world(&self, matrix: &Mat3) -> Vec<Point2> {
        let mut out = Vec::with_capacity(self.points.len());
        self.world_points_into(matrix, &mut out);
        out
    }
}

impl Clone for Shape {
    /// Clones the geometry only; the copy starts with no subscribers
    fn clone(&self) -> Self {
        Self {
            points: self.points.clone(),
            centroid: self.centroid,
            notifier: ChangeNotifier::new(),
        }
    }
}

/// Slack, in radians, on the total turning of a convex polygon
const WINDING_TOLERANCE: f32 = 1e-3;

fn validate(mut points: Vec<Point2>) -> Result<(Vec<Point2>, Point2), ShapeError> {
    if points.len() < 3 {
        return Err(ShapeError::TooFewPoints(points.len()));
    }
    if let Some(index) = points
        .iter()
        .position(|p| !(p.x.is_finite() && p.y.is_finite()))
    {
        return Err(ShapeError::NonFinite { index });
    }

    let area = signed_area(&points);
    if area.abs() <= EPSILON {
        return Err(ShapeError::ZeroArea);
    }
    if area < 0.0 {
        points.reverse();
    }

    let n = points.len();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        if cross(b - a, c - b) < -EPSILON {
            return Err(ShapeError::NotConvex { index: (i + 1) % n });
        }
    }

    // Turning the same way at every vertex still admits stars that wind
    // around more than once, so the exterior angles must sum to one turn
    let turning: f32 = (0..n)
        .map(|i| {
            let incoming = points[(i + 1) % n] - points[i];
            let outgoing = points[(i + 2) % n] - points[(i + 1) % n];
            cross(incoming, outgoing).atan2(incoming.dot(&outgoing))
        })
        .sum();
    if (turning - std::f32::consts::TAU).abs() > WINDING_TOLERANCE {
        return Err(ShapeError::NotConvex { index: 0 });
    }

    let centroid = polygon_centroid(&points, area.abs());
    Ok((points, centroid))
}

fn polygon_centroid(points: &[Point2], area: f32) -> Point2 {
    let n = points.len();
    let mut sum = Vec2::zeros();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let weight = a.x * b.y - b.x * a.y;
        sum += (a.coords + b.coords) * weight;
    }
    Point2::from(sum / (6.0 * area))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::trs_matrix;
    use crate::physics::collider::ColliderFlags;
    use approx::assert_relative_eq;
    use std::cell::Cell;

    #[test]
    fn test_rejects_degenerate_point_counts() {
        let two = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert_eq!(Shape::new(two).unwrap_err(), ShapeError::TooFewPoints(2));
        assert_eq!(Shape::new(Vec::new()).unwrap_err(), ShapeError::TooFewPoints(0));
    }

    #[test]
    fn test_rejects_collinear_and_concave() {
        let line = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ];
        assert_eq!(Shape::new(line).unwrap_err(), ShapeError::ZeroArea);

        let arrow = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(1.0, 0.5),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        assert!(matches!(
            Shape::new(arrow),
            Err(ShapeError::NotConvex { .. })
        ));
    }

    #[test]
    fn test_rejects_self_intersecting_star() {
        let pentagon = Shape::regular_polygon(5, 1.0).unwrap();
        let p = pentagon.points();
        let star = vec![p[0], p[2], p[4], p[1], p[3]];

        assert!(matches!(
            Shape::new(star),
            Err(ShapeError::NotConvex { .. })
        ));
    }

    #[test]
    fn test_clockwise_input_is_reordered() {
        let clockwise = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 0.0),
        ];
        let shape = Shape::new(clockwise).unwrap();
        assert!(signed_area(shape.points()) > 0.0);
    }

    #[test]
    fn test_centroid_is_area_weighted() {
        let triangle = Shape::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(0.0, 3.0),
        ])
        .unwrap();
        assert_relative_eq!(triangle.centroid(), Point2::new(1.0, 1.0), epsilon = 1e-5);

        let offset_box = Shape::new(vec![
            Point2::new(2.0, 2.0),
            Point2::new(4.0, 2.0),
            Point2::new(4.0, 6.0),
            Point2::new(2.0, 6.0),
        ])
        .unwrap();
        assert_relative_eq!(offset_box.centroid(), Point2::new(3.0, 4.0), epsilon = 1e-5);
    }

    #[test]
    fn test_set_points_notifies_subscribers() {
        let flags = Rc::new(Cell::new(ColliderFlags::empty()));
        let mut shape = Shape::square(1.0).unwrap();
        shape.subscribe(DirtyListener::new(&flags, ColliderFlags::all()));

        shape.set_points(Shape::square(2.0).unwrap().points().to_vec()).unwrap();
        assert_eq!(flags.get(), ColliderFlags::all());

        flags.set(ColliderFlags::empty());
        assert!(shape.set_points(vec![Point2::origin()]).is_err());
        assert_eq!(flags.get(), ColliderFlags::empty());
        assert_eq!(shape.vertex_count(), 4);
    }

    #[test]
    fn test_mirrored_world_points_stay_counter_clockwise() {
        let shape = Shape::rectangle(1.0, 2.0).unwrap();
        let mirror = trs_matrix(Vec2::new(5.0, 0.0), 0.0, Vec2::new(-1.0, 1.0));

        let world = shape.to_world(&mirror);

        assert!(signed_area(&world) > 0.0);
        assert_eq!(world.len(), 4);
        assert!(world.iter().all(|p| (4.0..=6.0).contains(&p.x)));
    }

    #[test]
    fn test_regular_polygon_and_invalid_dimensions() {
        let hexagon = Shape::regular_polygon(6, 2.0).unwrap();
        assert_eq!(hexagon.vertex_count(), 6);
        assert_relative_eq!(hexagon.centroid(), Point2::origin(), epsilon = 1e-5);

        assert_eq!(
            Shape::rectangle(-1.0, 1.0).unwrap_err(),
            ShapeError::InvalidDimension(-1.0)
        );
        assert_eq!(
            Shape::regular_polygon(2, 1.0).unwrap_err(),
            ShapeError::TooFewPoints(2)
        );
    }
}
