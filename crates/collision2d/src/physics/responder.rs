//! Collision response
//!
//! A responder receives every accepted narrowphase result and decides what to
//! do about it. The default pushes the two bodies apart along the penetration
//! axis, weighted by a [`SeparationPolicy`].

use crate::foundation::math::Vec2;
use crate::physics::collider::Collider;
use crate::physics::narrowphase::NarrowphaseResult;
use serde::{Deserialize, Serialize};

/// Collision response strategy
pub trait Responder {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// Resolve one narrowphase result
    ///
    /// `first` and `second` match `result.first` and `result.second`.
    fn respond(&mut self, result: &NarrowphaseResult, first: &Collider, second: &Collider);
}

/// How a penetration is split between two bodies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationPolicy {
    /// Share of the correction taken by the first body when both can move
    pub movable_share: f32,
    /// Fraction of the depth corrected per response (1 removes it entirely)
    pub correction: f32,
    /// Penetration left uncorrected
    pub slop: f32,
}

impl Default for SeparationPolicy {
    fn default() -> Self {
        Self {
            movable_share: 0.5,
            correction: 1.0,
            slop: 0.0,
        }
    }
}

impl SeparationPolicy {
    /// Correction shares `(first, second)` given which bodies are immovable
    pub fn shares(&self, first_immovable: bool, second_immovable: bool) -> (f32, f32) {
        match (first_immovable, second_immovable) {
            (false, false) => (self.movable_share, 1.0 - self.movable_share),
            (true, false) => (0.0, 1.0),
            (false, true) => (1.0, 0.0),
            (true, true) => (0.0, 0.0),
        }
    }

    /// Distance to correct for a penetration of `depth`
    pub fn correction_distance(&self, depth: f32) -> f32 {
        (depth - self.slop).max(0.0) * self.correction
    }
}

/// Pushes colliders apart along the penetration axis
#[derive(Debug, Default, Clone)]
pub struct SeparationResponder {
    policy: SeparationPolicy,
}

impl SeparationResponder {
    /// Create a responder with a policy
    pub fn new(policy: SeparationPolicy) -> Self {
        Self { policy }
    }

    /// Active policy
    pub fn policy(&self) -> &SeparationPolicy {
        &self.policy
    }
}

impl Responder for SeparationResponder {
    fn name(&self) -> &'static str {
        "separation"
    }

    fn respond(&mut self, result: &NarrowphaseResult, first: &Collider, second: &Collider) {
        let distance = self.policy.correction_distance(result.depth);
        if distance <= 0.0 {
            return;
        }
        let (first_share, second_share) =
            self.policy.shares(first.is_immovable(), second.is_immovable());

        let offset: Vec2 = result.axis * distance;
        if first_share > 0.0 {
            first.transform().borrow_mut().translate(-offset * first_share);
        }
        if second_share > 0.0 {
            second.transform().borrow_mut().translate(offset * second_share);
        }
    }
}

/// Leaves every body in place
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResponder;

impl Responder for NullResponder {
    fn name(&self) -> &'static str {
        "none"
    }

    fn respond(&mut self, _result: &NarrowphaseResult, _first: &Collider, _second: &Collider) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collider::ColliderHandle;
    use crate::physics::collision::{BoundingVolumeKind, ContactManifold, Shape};
    use crate::physics::transform::{Transform, Transform2D};
    use approx::assert_relative_eq;
    use slotmap::SlotMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Scene {
        first: Collider,
        second: Collider,
        first_transform: Rc<RefCell<Transform2D>>,
        second_transform: Rc<RefCell<Transform2D>>,
        result: NarrowphaseResult,
    }

    fn scene(first_immovable: bool, second_immovable: bool) -> Scene {
        let mut keys: SlotMap<ColliderHandle, ()> = SlotMap::with_key();
        let shape = Shape::square(1.0).unwrap().shared();
        let first_transform = Transform2D::identity().shared();
        let second_transform = Transform2D::from_position(Vec2::new(1.5, 0.0)).shared();

        let mut first = Collider::new(keys.insert(()), first_transform.clone(), shape.clone(), BoundingVolumeKind::Aabb);
        let mut second = Collider::new(keys.insert(()), second_transform.clone(), shape, BoundingVolumeKind::Aabb);
        first.set_immovable(first_immovable);
        second.set_immovable(second_immovable);

        let result = NarrowphaseResult {
            first: first.handle(),
            second: second.handle(),
            depth: 0.5,
            axis: Vec2::new(1.0, 0.0),
            contacts: ContactManifold::empty(),
        };
        Scene {
            first,
            second,
            first_transform,
            second_transform,
            result,
        }
    }

    fn positions(scene: &Scene) -> (Vec2, Vec2) {
        (
            scene.first_transform.borrow().position(),
            scene.second_transform.borrow().position(),
        )
    }

    #[test]
    fn test_movable_pair_splits_evenly() {
        let scene = scene(false, false);
        SeparationResponder::default().respond(&scene.result, &scene.first, &scene.second);

        let (first, second) = positions(&scene);
        assert_relative_eq!(first, Vec2::new(-0.25, 0.0), epsilon = 1e-6);
        assert_relative_eq!(second, Vec2::new(1.75, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_immovable_absorbs_nothing() {
        let scene = scene(true, false);
        SeparationResponder::default().respond(&scene.result, &scene.first, &scene.second);

        let (first, second) = positions(&scene);
        assert_relative_eq!(first, Vec2::zeros());
        assert_relative_eq!(second, Vec2::new(2.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_both_immovable_stay() {
        let scene = scene(true, true);
        SeparationResponder::default().respond(&scene.result, &scene.first, &scene.second);

        let (first, second) = positions(&scene);
        assert_relative_eq!(first, Vec2::zeros());
        assert_relative_eq!(second, Vec2::new(1.5, 0.0));
    }

    #[test]
    fn test_policy_weighting_and_slop() {
        let policy = SeparationPolicy {
            movable_share: 0.25,
            correction: 0.5,
            slop: 0.1,
        };
        assert_eq!(policy.shares(false, false), (0.25, 0.75));
        assert_eq!(policy.shares(false, true), (1.0, 0.0));
        assert_relative_eq!(policy.correction_distance(0.5), 0.2, epsilon = 1e-6);
        assert_relative_eq!(policy.correction_distance(0.05), 0.0);
    }

    #[test]
    fn test_null_responder_moves_nothing() {
        let scene = scene(false, false);
        NullResponder.respond(&scene.result, &scene.first, &scene.second);

        let (first, second) = positions(&scene);
        assert_relative_eq!(first, Vec2::zeros());
        assert_relative_eq!(second, Vec2::new(1.5, 0.0));
    }
}
