//! Transforms placing collision shapes in the world
//!
//! The pipeline only consumes the [`Transform`] capability. Game objects own
//! their transform and hand colliders a shared reference; any mutation fires
//! a dirty notification so the collider rebuilds its world bounding volume on
//! the next update.

use crate::foundation::math::{trs_matrix, Mat3, Vec2};
use crate::physics::events::{ChangeNotifier, DirtyListener};
use std::cell::RefCell;
use std::rc::Rc;

/// Transform shared between a game object and its colliders
pub type SharedTransform = Rc<RefCell<dyn Transform>>;

/// 2D placement of a collision shape
pub trait Transform {
    /// World position
    fn position(&self) -> Vec2;

    /// Rotation in radians (counter-clockwise)
    fn rotation(&self) -> f32;

    /// Per-axis scale
    fn scale(&self) -> Vec2;

    /// Local-to-world matrix (scale, then rotation, then translation)
    fn world_matrix(&self) -> Mat3 {
        trs_matrix(self.position(), self.rotation(), self.scale())
    }

    /// Move by `offset` in world space; used by collision responders
    fn translate(&mut self, offset: Vec2);

    /// Register a listener fired whenever the world matrix changes
    fn subscribe_dirty(&mut self, listener: DirtyListener);
}

/// Position, rotation and scale with change notification
#[derive(Debug)]
pub struct Transform2D {
    position: Vec2,
    rotation: f32,
    scale: Vec2,
    notifier: ChangeNotifier,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
            notifier: ChangeNotifier::new(),
        }
    }
}

impl Transform2D {
    /// Create identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create from position only
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create from position, rotation and scale
    pub fn from_transform(position: Vec2, rotation: f32, scale: Vec2) -> Self {
        Self {
            position,
            rotation,
            scale,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Builder pattern: Set rotation (radians)
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder pattern: Set scale (uniform)
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec2::new(scale, scale);
        self
    }

    /// Builder pattern: Set scale (non-uniform)
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Wrap for sharing with colliders
    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    /// Set the position
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.notifier.notify();
    }

    /// Set the rotation (radians)
    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
        self.notifier.notify();
    }

    /// Set the per-axis scale
    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
        self.notifier.notify();
    }

    /// Rotate by `angle` radians
    pub fn rotate(&mut self, angle: f32) {
        self.set_rotation(self.rotation + angle);
    }

    /// Number of colliders listening for changes
    pub fn listener_count(&self) -> usize {
        self.notifier.listener_count()
    }
}

impl Transform for Transform2D {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn rotation(&self) -> f32 {
        self.rotation
    }

    fn scale(&self) -> Vec2 {
        self.scale
    }

    fn translate(&mut self, offset: Vec2) {
        self.set_position(self.position + offset);
    }

    fn subscribe_dirty(&mut self, listener: DirtyListener) {
        self.notifier.subscribe(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point2;
    use crate::physics::collider::ColliderFlags;
    use approx::assert_relative_eq;
    use std::cell::Cell;

    #[test]
    fn test_world_matrix_trs_order() {
        let transform = Transform2D::from_position(Vec2::new(1.0, 2.0))
            .with_rotation(std::f32::consts::PI)
            .with_uniform_scale(2.0);

        let p = transform.world_matrix().transform_point(&Point2::new(1.0, 0.0));

        assert_relative_eq!(p, Point2::new(-1.0, 2.0), epsilon = 1e-5);
    }

    #[test]
    fn test_mutation_marks_listeners_dirty() {
        let flags = Rc::new(Cell::new(ColliderFlags::empty()));
        let mut transform = Transform2D::identity();
        transform.subscribe_dirty(DirtyListener::new(&flags, ColliderFlags::WORLD_VOLUME_DIRTY));

        transform.translate(Vec2::new(0.5, 0.0));
        assert_eq!(flags.get(), ColliderFlags::WORLD_VOLUME_DIRTY);
        assert_relative_eq!(transform.position(), Vec2::new(0.5, 0.0));

        flags.set(ColliderFlags::empty());
        transform.rotate(0.25);
        assert_eq!(flags.get(), ColliderFlags::WORLD_VOLUME_DIRTY);
    }

    #[test]
    fn test_shared_as_trait_object() {
        let concrete = Transform2D::from_position(Vec2::new(3.0, 0.0)).shared();
        let shared: SharedTransform = concrete.clone();

        shared.borrow_mut().translate(Vec2::new(1.0, 1.0));

        assert_relative_eq!(concrete.borrow().position(), Vec2::new(4.0, 1.0));
    }
}
