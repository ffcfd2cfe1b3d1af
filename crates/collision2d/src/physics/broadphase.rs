//! Broad-phase collision detection
//!
//! The broad phase quickly finds pairs of colliders that might be touching by
//! comparing bounding volumes only. Strategies sit behind the [`Broadphase`]
//! trait so the spatial partitioning scheme (flat list, grid, ...) can be
//! swapped without touching the simulation.

use crate::physics::collider::ColliderHandle;
use crate::physics::collision::BoundingVolume;
use slotmap::SecondaryMap;
use std::hash::{Hash, Hasher};

/// A collider's world bounding volume as seen by the broad phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BroadphaseProxy {
    /// Collider this proxy stands for
    pub handle: ColliderHandle,
    /// World bounding volume as of the last refresh
    pub volume: BoundingVolume,
}

impl BroadphaseProxy {
    /// Create a proxy
    pub fn new(handle: ColliderHandle, volume: BoundingVolume) -> Self {
        Self { handle, volume }
    }
}

/// Unordered pair of colliders whose bounding volumes overlap
///
/// Equality and hashing ignore order, so `(a, b)` and `(b, a)` are the same
/// pair. `first` is the collider whose query reported the pair.
#[derive(Debug, Clone, Copy, Eq)]
pub struct BroadphasePair {
    /// Querying collider
    pub first: ColliderHandle,
    /// Reported collider
    pub second: ColliderHandle,
}

impl BroadphasePair {
    /// Create a pair, keeping the reporting order
    pub fn new(first: ColliderHandle, second: ColliderHandle) -> Self {
        Self { first, second }
    }

    /// Handles in a canonical order
    pub fn ordered(&self) -> (ColliderHandle, ColliderHandle) {
        if self.first <= self.second {
            (self.first, self.second)
        } else {
            (self.second, self.first)
        }
    }

    /// Check if the pair involves `handle`
    pub fn involves(&self, handle: ColliderHandle) -> bool {
        self.first == handle || self.second == handle
    }

    /// The collider paired with `handle`, if `handle` is part of the pair
    pub fn other(&self, handle: ColliderHandle) -> Option<ColliderHandle> {
        if self.first == handle {
            Some(self.second)
        } else if self.second == handle {
            Some(self.first)
        } else {
            None
        }
    }
}

impl PartialEq for BroadphasePair {
    fn eq(&self, other: &Self) -> bool {
        self.ordered() == other.ordered()
    }
}

impl Hash for BroadphasePair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ordered().hash(state);
    }
}

/// Spatial partitioning strategy for the broad phase
pub trait Broadphase {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// Start tracking a proxy
    fn add(&mut self, proxy: &BroadphaseProxy);

    /// Stop tracking a proxy
    fn remove(&mut self, proxy: &BroadphaseProxy);

    /// Refresh a tracked proxy's volume; called once per proxy per frame
    fn update(&mut self, proxy: &BroadphaseProxy);

    /// Report every other tracked collider whose volume overlaps `proxy`
    ///
    /// Each overlapping collider is reported exactly once per call and the
    /// proxy itself is never reported.
    fn query(&mut self, proxy: &BroadphaseProxy, per_pair: &mut dyn FnMut(ColliderHandle));

    /// Number of tracked proxies
    fn len(&self) -> usize;

    /// Check if no proxy is tracked
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop tracking every proxy
    fn clear(&mut self);
}

/// Flat list of proxies, every query scans all of them
#[derive(Debug, Default)]
pub struct BruteForceBroadphase {
    proxies: Vec<BroadphaseProxy>,
    positions: SecondaryMap<ColliderHandle, usize>,
}

impl BruteForceBroadphase {
    /// Create an empty broadphase
    pub fn new() -> Self {
        Self::default()
    }
}

impl Broadphase for BruteForceBroadphase {
    fn name(&self) -> &'static str {
        "brute-force"
    }

    fn add(&mut self, proxy: &BroadphaseProxy) {
        if let Some(&position) = self.positions.get(proxy.handle) {
            self.proxies[position] = *proxy;
            return;
        }
        self.positions.insert(proxy.handle, self.proxies.len());
        self.proxies.push(*proxy);
    }

    fn remove(&mut self, proxy: &BroadphaseProxy) {
        let Some(position) = self.positions.remove(proxy.handle) else {
            return;
        };
        self.proxies.swap_remove(position);
        if let Some(moved) = self.proxies.get(position) {
            self.positions.insert(moved.handle, position);
        }
    }

    fn update(&mut self, proxy: &BroadphaseProxy) {
        if let Some(&position) = self.positions.get(proxy.handle) {
            self.proxies[position].volume = proxy.volume;
        }
    }

    fn query(&mut self, proxy: &BroadphaseProxy, per_pair: &mut dyn FnMut(ColliderHandle)) {
        for other in &self.proxies {
            if other.handle != proxy.handle && proxy.volume.intersects(&other.volume) {
                per_pair(other.handle);
            }
        }
    }

    fn len(&self) -> usize {
        self.proxies.len()
    }

    fn clear(&mut self) {
        self.proxies.clear();
        self.positions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point2;
    use crate::physics::collision::Aabb;
    use slotmap::SlotMap;
    use std::collections::HashSet;

    fn boxed(x: f32) -> BoundingVolume {
        BoundingVolume::Aabb(Aabb::new(Point2::new(x - 1.0, -1.0), Point2::new(x + 1.0, 1.0)))
    }

    fn handles(count: usize) -> Vec<ColliderHandle> {
        let mut keys: SlotMap<ColliderHandle, ()> = SlotMap::with_key();
        (0..count).map(|_| keys.insert(())).collect()
    }

    #[test]
    fn test_pair_equality_is_symmetric() {
        let h = handles(3);
        let ab = BroadphasePair::new(h[0], h[1]);
        let ba = BroadphasePair::new(h[1], h[0]);

        assert_eq!(ab, ba);
        assert_ne!(ab, BroadphasePair::new(h[0], h[2]));

        let mut set = HashSet::new();
        assert!(set.insert(ab));
        assert!(!set.insert(ba));
        assert_eq!(ba.first, h[1]);
        assert_eq!(ab.other(h[1]), Some(h[0]));
        assert_eq!(ab.other(h[2]), None);
    }

    #[test]
    fn test_query_reports_overlaps_but_not_self() {
        let h = handles(3);
        let mut broadphase = BruteForceBroadphase::new();
        let proxies = [
            BroadphaseProxy::new(h[0], boxed(0.0)),
            BroadphaseProxy::new(h[1], boxed(1.5)),
            BroadphaseProxy::new(h[2], boxed(10.0)),
        ];
        for proxy in &proxies {
            broadphase.add(proxy);
        }

        let mut reported = Vec::new();
        broadphase.query(&proxies[0], &mut |other| reported.push(other));

        assert_eq!(reported, vec![h[1]]);
    }

    #[test]
    fn test_remove_and_update() {
        let h = handles(3);
        let mut broadphase = BruteForceBroadphase::new();
        let mut proxies = vec![
            BroadphaseProxy::new(h[0], boxed(0.0)),
            BroadphaseProxy::new(h[1], boxed(1.0)),
            BroadphaseProxy::new(h[2], boxed(20.0)),
        ];
        for proxy in &proxies {
            broadphase.add(proxy);
        }

        broadphase.remove(&proxies[1]);
        assert_eq!(broadphase.len(), 2);

        proxies[2].volume = boxed(0.5);
        broadphase.update(&proxies[2]);

        let mut reported = Vec::new();
        broadphase.query(&proxies[0], &mut |other| reported.push(other));
        assert_eq!(reported, vec![h[2]]);

        broadphase.clear();
        assert!(broadphase.is_empty());
    }
}
