//! Narrow-phase collision detection
//!
//! Takes the candidate pairs from the broad phase and performs the exact
//! shape test, producing at most one [`NarrowphaseResult`] per pair.

use crate::foundation::math::{Point2, Vec2};
use crate::physics::broadphase::BroadphasePair;
use crate::physics::collider::{Collider, ColliderHandle};
use crate::physics::collision::{polygon_penetration, ContactManifold};

/// Exact overlap between two colliders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrowphaseResult {
    /// Collider the axis points away from
    pub first: ColliderHandle,
    /// Collider the axis points toward
    pub second: ColliderHandle,
    /// Minimum penetration depth
    pub depth: f32,
    /// Unit axis of minimum penetration, from `first` toward `second`
    pub axis: Vec2,
    /// Contact points (zero to two)
    pub contacts: ContactManifold,
}

impl NarrowphaseResult {
    /// Minimum translation vector (`axis * depth`)
    pub fn penetration_vector(&self) -> Vec2 {
        self.axis * self.depth
    }

    /// Contact points in world space
    pub fn contact_points(&self) -> &[Point2] {
        self.contacts.points()
    }

    /// Check if the result involves `handle`
    pub fn involves(&self, handle: ColliderHandle) -> bool {
        self.first == handle || self.second == handle
    }

    /// The pair this result was produced from
    pub fn pair(&self) -> BroadphasePair {
        BroadphasePair::new(self.first, self.second)
    }
}

/// Exact collision test strategy
pub trait Narrowphase {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// Test one broadphase pair, calling `per_result` at most once
    ///
    /// `first` and `second` are the pair's colliders in reporting order.
    fn resolve(
        &mut self,
        pair: &BroadphasePair,
        first: &Collider,
        second: &Collider,
        per_result: &mut dyn FnMut(NarrowphaseResult),
    );
}

/// Promotes every broadphase pair to a result without an exact test
///
/// Depth is zero, the axis follows the bounding volume centers and there are
/// no contacts.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThroughNarrowphase;

impl Narrowphase for PassThroughNarrowphase {
    fn name(&self) -> &'static str {
        "pass-through"
    }

    fn resolve(
        &mut self,
        pair: &BroadphasePair,
        first: &Collider,
        second: &Collider,
        per_result: &mut dyn FnMut(NarrowphaseResult),
    ) {
        let offset = second.world_volume().center() - first.world_volume().center();
        per_result(NarrowphaseResult {
            first: pair.first,
            second: pair.second,
            depth: 0.0,
            axis: offset.try_normalize(f32::EPSILON).unwrap_or_else(Vec2::x),
            contacts: ContactManifold::empty(),
        });
    }
}

/// Separating axis test over the colliders' world-space polygons
#[derive(Debug, Default)]
pub struct SeparatingAxisNarrowphase {
    first_points: Vec<Point2>,
    second_points: Vec<Point2>,
}

impl SeparatingAxisNarrowphase {
    /// Create the narrowphase
    pub fn new() -> Self {
        Self::default()
    }
}

impl Narrowphase for SeparatingAxisNarrowphase {
    fn name(&self) -> &'static str {
        "separating-axis"
    }

    fn resolve(
        &mut self,
        pair: &BroadphasePair,
        first: &Collider,
        second: &Collider,
        per_result: &mut dyn FnMut(NarrowphaseResult),
    ) {
        first.world_points_into(&mut self.first_points);
        second.world_points_into(&mut self.second_points);

        if let Some(hit) = polygon_penetration(&self.first_points, &self.second_points) {
            per_result(NarrowphaseResult {
                first: pair.first,
                second: pair.second,
                depth: hit.depth,
                axis: hit.axis,
                contacts: hit.contacts,
            });
        }
    }
}
