//! Collision-specific debug visualization
//!
//! Pulls state out of a [`CollisionSimulation`] after an update and turns it
//! into debug shapes: world polygons, bounding volumes, broadphase pairs,
//! contact points and penetration vectors.

use crate::debug::draw::{Color, DebugDrawSystem, DebugShape, DebugVertex};
use crate::foundation::math::Point2;
use crate::physics::collision::BoundingVolume;
use crate::physics::CollisionSimulation;

/// Color scheme for collision visualization
#[derive(Clone, Debug)]
pub struct CollisionDebugColors {
    /// Bounding volumes
    pub volume: Color,

    /// Collision shapes (not colliding)
    pub shape_default: Color,

    /// Collision shapes (part of a narrowphase result)
    pub shape_colliding: Color,

    /// Lines joining broadphase pairs
    pub pair: Color,

    /// Contact points
    pub contact: Color,

    /// Penetration vectors
    pub penetration: Color,
}

impl Default for CollisionDebugColors {
    fn default() -> Self {
        Self {
            volume: Color::new(0.5, 0.8, 1.0, 0.4),          // Light blue
            shape_default: Color::new(0.0, 1.0, 0.0, 1.0),   // Green
            shape_colliding: Color::new(1.0, 0.0, 0.0, 1.0), // Red
            pair: Color::new(0.0, 1.0, 1.0, 0.3),            // Cyan, transparent
            contact: Color::new(1.0, 1.0, 0.0, 1.0),         // Yellow
            penetration: Color::new(1.0, 0.5, 0.0, 1.0),     // Orange
        }
    }
}

/// Collision-specific debug visualizer
///
/// Everything it draws lives for one frame: call
/// [`draw_simulation`](Self::draw_simulation) after each simulation update and
/// [`update`](Self::update) once the frame has been rendered.
#[derive(Debug)]
pub struct CollisionDebugVisualizer {
    debug_draw: DebugDrawSystem,
    colors: CollisionDebugColors,

    /// Show world-space collision polygons
    pub show_shapes: bool,

    /// Show world bounding volumes
    pub show_volumes: bool,

    /// Show lines between accepted broadphase pairs
    pub show_pairs: bool,

    /// Show contact points and penetration vectors
    pub show_contacts: bool,

    /// Half-size of contact point crosses
    pub contact_size: f32,
}

impl CollisionDebugVisualizer {
    /// Create a new collision debug visualizer
    pub fn new() -> Self {
        Self {
            debug_draw: DebugDrawSystem::new(),
            colors: CollisionDebugColors::default(),
            show_shapes: true,
            show_volumes: true,
            show_pairs: false,
            show_contacts: true,
            contact_size: 0.1,
        }
    }

    /// Set custom color scheme
    pub fn with_colors(mut self, colors: CollisionDebugColors) -> Self {
        self.colors = colors;
        self
    }

    /// Draw the state left by the simulation's last update
    pub fn draw_simulation(&mut self, simulation: &CollisionSimulation) {
        for collider in simulation.active_colliders() {
            if self.show_shapes {
                let color = if simulation.is_colliding(collider.handle()) {
                    self.colors.shape_colliding
                } else {
                    self.colors.shape_default
                };
                self.debug_draw.draw_polygon(collider.world_points(), color, 0.0);
            }
            if self.show_volumes {
                self.draw_volume(&collider.world_volume());
            }
        }

        if self.show_pairs {
            for pair in simulation.pairs() {
                let (Some(first), Some(second)) =
                    (simulation.collider(pair.first), simulation.collider(pair.second))
                else {
                    continue;
                };
                self.debug_draw.draw_line(
                    first.world_volume().center(),
                    second.world_volume().center(),
                    self.colors.pair,
                    0.0,
                );
            }
        }

        if self.show_contacts {
            for result in simulation.results() {
                let penetration = result.penetration_vector();
                for contact in result.contact_points() {
                    self.debug_draw
                        .draw_point(*contact, self.colors.contact, self.contact_size, 0.0);
                    self.debug_draw
                        .draw_line(*contact, contact + penetration, self.colors.penetration, 0.0);
                }
            }
        }
    }

    /// Draw a bounding volume outline
    pub fn draw_volume(&mut self, volume: &BoundingVolume) {
        let shape = match volume {
            BoundingVolume::Aabb(aabb) => DebugShape::Rect {
                min: aabb.min,
                max: aabb.max,
                color: self.colors.volume,
                duration: 0.0,
            },
            BoundingVolume::Circle(circle) => DebugShape::Circle {
                center: circle.center,
                radius: circle.radius,
                color: self.colors.volume,
                duration: 0.0,
            },
        };
        self.debug_draw.draw(shape);
    }

    /// Draw a marker that stays until removed, e.g. a spawn point
    pub fn draw_marker(&mut self, id: impl Into<String>, position: Point2) {
        let shape = DebugShape::Point {
            position,
            color: self.colors.contact,
            size: self.contact_size * 2.0,
            duration: f32::INFINITY,
        };
        self.debug_draw.draw_persistent(id, shape);
    }

    /// Clear all visualization
    pub fn clear(&mut self) {
        self.debug_draw.clear();
    }

    /// Update debug system (expire temporary shapes)
    pub fn update(&mut self, delta_time: f32) {
        self.debug_draw.update(delta_time);
    }

    /// Iterate over all debug shapes
    pub fn shapes(&self) -> impl Iterator<Item = &DebugShape> + '_ {
        self.debug_draw.shapes()
    }

    /// Line-list vertices for every debug shape
    pub fn line_vertices(&self) -> Vec<DebugVertex> {
        self.debug_draw.line_vertices()
    }

    /// Enable/disable the entire debug system
    pub fn set_enabled(&mut self, enabled: bool) {
        self.debug_draw.enabled = enabled;
    }

    /// Check if debug system is enabled
    pub fn is_enabled(&self) -> bool {
        self.debug_draw.enabled
    }

    /// Get reference to underlying debug draw system
    pub fn debug_draw(&self) -> &DebugDrawSystem {
        &self.debug_draw
    }

    /// Get mutable reference to underlying debug draw system
    pub fn debug_draw_mut(&mut self) -> &mut DebugDrawSystem {
        &mut self.debug_draw
    }
}

impl Default for CollisionDebugVisualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;
    use crate::physics::{BoundingVolumeKind, Shape, Transform2D};

    fn overlapping_simulation() -> CollisionSimulation {
        let mut simulation = CollisionSimulation::default();
        let shape = Shape::square(1.0).unwrap().shared();
        simulation.create_collider(Transform2D::identity().shared(), shape.clone(), BoundingVolumeKind::Aabb);
        simulation.create_collider(
            Transform2D::from_position(Vec2::new(1.5, 0.0)).shared(),
            shape,
            BoundingVolumeKind::Circle,
        );
        simulation.update();
        simulation
    }

    #[test]
    fn test_draw_simulation() {
        let simulation = overlapping_simulation();
        let mut viz = CollisionDebugVisualizer::new();

        viz.draw_simulation(&simulation);

        let polygons = viz.shapes().filter(|s| matches!(s, DebugShape::Polygon { .. })).count();
        let circles = viz.shapes().filter(|s| matches!(s, DebugShape::Circle { .. })).count();
        let points = viz.shapes().filter(|s| matches!(s, DebugShape::Point { .. })).count();
        assert_eq!(polygons, 2);
        assert_eq!(circles, 1);
        assert_eq!(points, 2);

        let colliding = viz
            .shapes()
            .filter(|s| matches!(s, DebugShape::Polygon { color, .. } if *color == CollisionDebugColors::default().shape_colliding))
            .count();
        assert_eq!(colliding, 2);
    }

    #[test]
    fn test_frame_shapes_expire() {
        let simulation = overlapping_simulation();
        let mut viz = CollisionDebugVisualizer::new();
        viz.draw_marker("spawn", Point2::origin());

        viz.draw_simulation(&simulation);
        assert!(!viz.line_vertices().is_empty());

        viz.update(1.0 / 60.0);
        assert_eq!(viz.shapes().count(), 1);
    }
}
