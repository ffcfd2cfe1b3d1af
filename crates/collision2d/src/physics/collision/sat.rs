//! Separating axis test for convex polygons
//!
//! Works on world-space vertex lists in counter-clockwise order. The minimum
//! translation vector is found over every edge normal of both polygons, then
//! the contact manifold is built by clipping the incident edge against the
//! reference edge.

use crate::foundation::math::{perp_right, project, Point2, Vec2, EPSILON};

/// Up to two contact points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactManifold {
    points: [Point2; 2],
    len: usize,
}

impl ContactManifold {
    /// Manifold without contacts
    pub fn empty() -> Self {
        Self {
            points: [Point2::origin(); 2],
            len: 0,
        }
    }

    /// Build a manifold from at most two points, extra points are ignored
    pub fn from_points(points: &[Point2]) -> Self {
        let mut manifold = Self::empty();
        for point in points.iter().take(2) {
            manifold.points[manifold.len] = *point;
            manifold.len += 1;
        }
        manifold
    }

    /// Contact points
    pub fn points(&self) -> &[Point2] {
        &self.points[..self.len]
    }

    /// Number of contact points
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if there are no contacts
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for ContactManifold {
    fn default() -> Self {
        Self::empty()
    }
}

/// Overlap between two polygons
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    /// Minimum overlap distance
    pub depth: f32,
    /// Unit axis of minimum overlap, pointing from the first polygon to the second
    pub axis: Vec2,
    /// Contact points
    pub contacts: ContactManifold,
}

/// Edge picked for contact clipping
#[derive(Debug, Clone, Copy)]
struct Edge {
    /// Vertex farthest along the search direction
    max: Point2,
    from: Point2,
    to: Point2,
}

impl Edge {
    fn vector(&self) -> Vec2 {
        self.to - self.from
    }
}

/// Compute the penetration of two convex counter-clockwise polygons
///
/// Returns `None` when a separating axis exists. Touching polygons (zero
/// overlap) count as separated.
pub fn polygon_penetration(a: &[Point2], b: &[Point2]) -> Option<Penetration> {
    if a.len() < 3 || b.len() < 3 {
        return None;
    }

    let mut depth = f32::INFINITY;
    let mut axis = Vec2::zeros();

    for polygon in [a, b] {
        let n = polygon.len();
        for i in 0..n {
            let edge = polygon[(i + 1) % n] - polygon[i];
            let Some(normal) = perp_right(edge).try_normalize(EPSILON) else {
                continue;
            };

            let overlap = axis_overlap(project(a, normal), project(b, normal));
            if overlap <= 0.0 {
                return None;
            }
            if overlap < depth {
                depth = overlap;
                axis = normal;
            }
        }
    }

    if !depth.is_finite() {
        return None;
    }

    let direction = vertex_mean(b) - vertex_mean(a);
    if direction.dot(&axis) < 0.0 {
        axis = -axis;
    }

    Some(Penetration {
        depth,
        axis,
        contacts: clip_contacts(a, b, axis),
    })
}

/// Overlap of two projection intervals, extended when one contains the other
fn axis_overlap((min_a, max_a): (f32, f32), (min_b, max_b): (f32, f32)) -> f32 {
    let overlap = max_a.min(max_b) - min_a.max(min_b);
    let contained = (min_a <= min_b && max_b <= max_a) || (min_b <= min_a && max_a <= max_b);
    if contained && overlap > 0.0 {
        overlap + (min_a - min_b).abs().min((max_a - max_b).abs())
    } else {
        overlap
    }
}

fn vertex_mean(points: &[Point2]) -> Point2 {
    let sum = points.iter().fold(Vec2::zeros(), |sum, p| sum + p.coords);
    Point2::from(sum / points.len() as f32)
}

/// Edge most perpendicular to `normal` among the two adjacent to the farthest vertex
fn best_edge(polygon: &[Point2], normal: Vec2) -> Edge {
    let n = polygon.len();
    let mut index = 0;
    let mut farthest = f32::NEG_INFINITY;
    for (i, p) in polygon.iter().enumerate() {
        let d = p.coords.dot(&normal);
        if d > farthest {
            farthest = d;
            index = i;
        }
    }

    let v = polygon[index];
    let next = polygon[(index + 1) % n];
    let prev = polygon[(index + n - 1) % n];

    let left = (v - next).try_normalize(EPSILON).unwrap_or_else(Vec2::zeros);
    let right = (v - prev).try_normalize(EPSILON).unwrap_or_else(Vec2::zeros);

    if right.dot(&normal) <= left.dot(&normal) {
        Edge { max: v, from: prev, to: v }
    } else {
        Edge { max: v, from: v, to: next }
    }
}

/// Keep the part of segment `v1 v2` where `dot(n, p) >= offset`
fn clip(v1: Point2, v2: Point2, n: Vec2, offset: f32) -> Vec<Point2> {
    let mut out = Vec::with_capacity(2);
    let d1 = n.dot(&v1.coords) - offset;
    let d2 = n.dot(&v2.coords) - offset;
    if d1 >= 0.0 {
        out.push(v1);
    }
    if d2 >= 0.0 {
        out.push(v2);
    }
    if d1 * d2 < 0.0 {
        let t = d1 / (d1 - d2);
        out.push(v1 + (v2 - v1) * t);
    }
    out
}

fn clip_contacts(a: &[Point2], b: &[Point2], axis: Vec2) -> ContactManifold {
    let edge_a = best_edge(a, axis);
    let edge_b = best_edge(b, -axis);

    let (reference, incident) =
        if edge_a.vector().dot(&axis).abs() <= edge_b.vector().dot(&axis).abs() {
            (edge_a, edge_b)
        } else {
            (edge_b, edge_a)
        };

    let Some(tangent) = reference.vector().try_normalize(EPSILON) else {
        return ContactManifold::empty();
    };

    let clipped = clip(incident.from, incident.to, tangent, tangent.dot(&reference.from.coords));
    if clipped.len() < 2 {
        return ContactManifold::empty();
    }
    let clipped = clip(clipped[0], clipped[1], -tangent, -tangent.dot(&reference.to.coords));
    if clipped.len() < 2 {
        return ContactManifold::empty();
    }

    // Outward normal of the reference face; keep points behind it
    let face_normal = perp_right(tangent);
    let face = face_normal.dot(&reference.max.coords);
    let kept: Vec<Point2> = clipped
        .into_iter()
        .filter(|p| face - face_normal.dot(&p.coords) >= -EPSILON)
        .collect();
    ContactManifold::from_points(&kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(center: Point2, half: f32) -> Vec<Point2> {
        vec![
            Point2::new(center.x - half, center.y - half),
            Point2::new(center.x + half, center.y - half),
            Point2::new(center.x + half, center.y + half),
            Point2::new(center.x - half, center.y + half),
        ]
    }

    #[test]
    fn test_overlapping_squares() {
        let a = square(Point2::new(0.0, 0.0), 1.0);
        let b = square(Point2::new(1.5, 0.0), 1.0);

        let hit = polygon_penetration(&a, &b).unwrap();

        assert_relative_eq!(hit.depth, 0.5, epsilon = 1e-5);
        assert_relative_eq!(hit.axis, Vec2::new(1.0, 0.0), epsilon = 1e-5);
        assert_eq!(hit.contacts.len(), 2);
        for contact in hit.contacts.points() {
            assert_relative_eq!(contact.x, 0.5, epsilon = 1e-5);
            assert_relative_eq!(contact.y.abs(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_axis_points_from_first_to_second() {
        let a = square(Point2::new(0.0, 0.0), 1.0);
        let b = square(Point2::new(1.5, 0.0), 1.0);

        let hit = polygon_penetration(&b, &a).unwrap();

        assert_relative_eq!(hit.axis, Vec2::new(-1.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(hit.depth, 0.5, epsilon = 1e-5);
        assert_eq!(hit.contacts.len(), 2);
    }

    #[test]
    fn test_separated_and_touching() {
        let a = square(Point2::new(0.0, 0.0), 1.0);
        assert!(polygon_penetration(&a, &square(Point2::new(3.0, 0.0), 1.0)).is_none());
        assert!(polygon_penetration(&a, &square(Point2::new(2.0, 0.0), 1.0)).is_none());
    }

    #[test]
    fn test_boxes_overlap_but_polygons_do_not() {
        let triangle = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(0.0, 2.0),
        ];
        let corner = square(Point2::new(1.6, 1.6), 0.5);

        assert!(polygon_penetration(&triangle, &corner).is_none());
    }

    #[test]
    fn test_contained_polygon_depth_pushes_fully_out() {
        let outer = square(Point2::new(0.0, 0.0), 2.0);
        let inner = square(Point2::new(0.5, 0.0), 0.5);

        let hit = polygon_penetration(&outer, &inner).unwrap();

        assert_relative_eq!(hit.axis, Vec2::new(1.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(hit.depth, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_manifold_caps_at_two_points() {
        let manifold = ContactManifold::from_points(&[Point2::origin(); 3]);
        assert_eq!(manifold.len(), 2);
        assert!(ContactManifold::default().is_empty());
    }
}
