//! Debug drawing primitives and system
//!
//! Collects simple 2D shapes (lines, polygons, boxes, circles, points) and
//! flattens them into a line-list vertex buffer that any renderer can upload
//! as-is. Nothing here talks to a graphics device.

use crate::foundation::math::{Point2, Vec2};
use bytemuck::{Pod, Zeroable};
use std::collections::HashMap;

/// RGBA colour, components in `[0, 1]`
pub type Color = nalgebra::Vector4<f32>;

/// Unique identifier for persistent debug shapes
pub type DebugShapeId = String;

/// Segments used to approximate a circle
const CIRCLE_SEGMENTS: usize = 24;

/// Debug shape primitives that can be rendered for visualization
#[derive(Clone, Debug, PartialEq)]
pub enum DebugShape {
    /// Line segment from start to end
    Line {
        /// Start point
        start: Point2,
        /// End point
        end: Point2,
        /// Line colour
        color: Color,
        /// Seconds left to live
        duration: f32,
    },

    /// Closed polygon outline
    Polygon {
        /// Vertices in drawing order
        points: Vec<Point2>,
        /// Outline colour
        color: Color,
        /// Seconds left to live
        duration: f32,
    },

    /// Axis-aligned rectangle outline
    Rect {
        /// Minimum corner
        min: Point2,
        /// Maximum corner
        max: Point2,
        /// Outline colour
        color: Color,
        /// Seconds left to live
        duration: f32,
    },

    /// Circle outline
    Circle {
        /// Center
        center: Point2,
        /// Radius
        radius: f32,
        /// Outline colour
        color: Color,
        /// Seconds left to live
        duration: f32,
    },

    /// Point drawn as a small cross
    Point {
        /// Position
        position: Point2,
        /// Cross colour
        color: Color,
        /// Half-length of the cross arms
        size: f32,
        /// Seconds left to live
        duration: f32,
    },
}

impl DebugShape {
    fn duration_mut(&mut self) -> &mut f32 {
        match self {
            Self::Line { duration, .. }
            | Self::Polygon { duration, .. }
            | Self::Rect { duration, .. }
            | Self::Circle { duration, .. }
            | Self::Point { duration, .. } => duration,
        }
    }

    /// Get remaining duration
    pub fn duration(&self) -> f32 {
        match self {
            Self::Line { duration, .. }
            | Self::Polygon { duration, .. }
            | Self::Rect { duration, .. }
            | Self::Circle { duration, .. }
            | Self::Point { duration, .. } => *duration,
        }
    }

    /// Set duration (returns modified shape)
    pub fn with_duration(mut self, new_duration: f32) -> Self {
        *self.duration_mut() = new_duration;
        self
    }

    /// Decrease duration by `delta_time`, returns true if expired
    pub fn tick(&mut self, delta_time: f32) -> bool {
        let duration = self.duration_mut();
        *duration -= delta_time;
        *duration <= 0.0
    }

    /// Append this shape as line-list vertices (two per segment)
    pub fn append_line_vertices(&self, out: &mut Vec<DebugVertex>) {
        let mut segment = |a: Point2, b: Point2, color: &Color| {
            out.push(DebugVertex::new(a, color));
            out.push(DebugVertex::new(b, color));
        };

        match self {
            Self::Line { start, end, color, .. } => segment(*start, *end, color),
            Self::Polygon { points, color, .. } => {
                for (i, a) in points.iter().enumerate() {
                    segment(*a, points[(i + 1) % points.len()], color);
                }
            }
            Self::Rect { min, max, color, .. } => {
                let corners = [*min, Point2::new(max.x, min.y), *max, Point2::new(min.x, max.y)];
                for i in 0..4 {
                    segment(corners[i], corners[(i + 1) % 4], color);
                }
            }
            Self::Circle { center, radius, color, .. } => {
                let step = std::f32::consts::TAU / CIRCLE_SEGMENTS as f32;
                let at = |i: usize| {
                    let angle = step * i as f32;
                    center + Vec2::new(angle.cos(), angle.sin()) * *radius
                };
                for i in 0..CIRCLE_SEGMENTS {
                    segment(at(i), at(i + 1), color);
                }
            }
            Self::Point { position, color, size, .. } => {
                segment(position - Vec2::new(*size, 0.0), position + Vec2::new(*size, 0.0), color);
                segment(position - Vec2::new(0.0, *size), position + Vec2::new(0.0, *size), color);
            }
        }
    }
}

/// Line-list vertex, laid out for direct upload to a vertex buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DebugVertex {
    /// World position
    pub position: [f32; 2],
    /// RGBA colour
    pub color: [f32; 4],
}

impl DebugVertex {
    fn new(position: Point2, color: &Color) -> Self {
        Self {
            position: [position.x, position.y],
            color: [color.x, color.y, color.z, color.w],
        }
    }
}

/// Debug drawing system for collecting debug shapes
///
/// Temporary shapes expire after their duration; persistent shapes remain
/// until explicitly removed.
#[derive(Debug)]
pub struct DebugDrawSystem {
    /// Temporary shapes that expire after their duration
    temporary_shapes: Vec<DebugShape>,

    /// Persistent shapes that remain until manually removed
    persistent_shapes: HashMap<DebugShapeId, DebugShape>,

    /// Master enable/disable flag
    pub enabled: bool,
}

impl DebugDrawSystem {
    /// Create a new debug draw system
    pub fn new() -> Self {
        Self {
            temporary_shapes: Vec::new(),
            persistent_shapes: HashMap::new(),
            enabled: true,
        }
    }

    /// Draw any shape (temporary)
    pub fn draw(&mut self, shape: DebugShape) {
        if self.enabled {
            self.temporary_shapes.push(shape);
        }
    }

    /// Draw a line segment (temporary)
    pub fn draw_line(&mut self, start: Point2, end: Point2, color: Color, duration: f32) {
        self.draw(DebugShape::Line {
            start,
            end,
            color,
            duration,
        });
    }

    /// Draw a closed polygon outline (temporary)
    pub fn draw_polygon(&mut self, points: Vec<Point2>, color: Color, duration: f32) {
        self.draw(DebugShape::Polygon {
            points,
            color,
            duration,
        });
    }

    /// Draw a rectangle outline (temporary)
    pub fn draw_rect(&mut self, min: Point2, max: Point2, color: Color, duration: f32) {
        self.draw(DebugShape::Rect {
            min,
            max,
            color,
            duration,
        });
    }

    /// Draw a circle outline (temporary)
    pub fn draw_circle(&mut self, center: Point2, radius: f32, color: Color, duration: f32) {
        self.draw(DebugShape::Circle {
            center,
            radius,
            color,
            duration,
        });
    }

    /// Draw a point (temporary)
    pub fn draw_point(&mut self, position: Point2, color: Color, size: f32, duration: f32) {
        self.draw(DebugShape::Point {
            position,
            color,
            size,
            duration,
        });
    }

    /// Draw a persistent shape that remains until explicitly removed
    pub fn draw_persistent(&mut self, id: impl Into<String>, shape: DebugShape) {
        if self.enabled {
            self.persistent_shapes.insert(id.into(), shape);
        }
    }

    /// Remove a persistent shape
    pub fn clear_persistent(&mut self, id: &str) {
        self.persistent_shapes.remove(id);
    }

    /// Update shape lifetimes and remove expired temporary shapes
    pub fn update(&mut self, delta_time: f32) {
        if self.enabled {
            self.temporary_shapes.retain_mut(|shape| !shape.tick(delta_time));
        }
    }

    /// Iterate over all shapes (temporary first, then persistent)
    pub fn shapes(&self) -> impl Iterator<Item = &DebugShape> + '_ {
        let visible = if self.enabled { self.temporary_shapes.as_slice() } else { &[] };
        let persistent = self.persistent_shapes.values().filter(|_| self.enabled);
        visible.iter().chain(persistent)
    }

    /// Flatten every shape into a line list
    pub fn line_vertices(&self) -> Vec<DebugVertex> {
        let mut vertices = Vec::new();
        for shape in self.shapes() {
            shape.append_line_vertices(&mut vertices);
        }
        vertices
    }

    /// Get the number of active shapes
    pub fn shape_count(&self) -> usize {
        self.temporary_shapes.len() + self.persistent_shapes.len()
    }

    /// Clear all shapes (temporary and persistent)
    pub fn clear(&mut self) {
        self.temporary_shapes.clear();
        self.persistent_shapes.clear();
    }
}

impl Default for DebugDrawSystem {
    fn default() -> Self {
        Self::new()
    }
}
