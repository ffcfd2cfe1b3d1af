//! Colliders: a shape placed by a transform, with cached bounding volumes
//!
//! A collider caches its local and world bounding volumes and only rebuilds
//! them when its shape or transform reports a change. The shape and transform
//! write into a shared flag cell, so they can be mutated freely (by game logic
//! or by a responder) without borrowing the collider.

use crate::foundation::math::Point2;
use crate::physics::collision::{BoundingVolume, BoundingVolumeKind, SharedShape};
use crate::physics::collision_layers::CollisionLayers;
use crate::physics::events::{CallbackList, DirtyListener, Propagation, SubscriptionId};
use crate::physics::narrowphase::NarrowphaseResult;
use crate::physics::transform::SharedTransform;
use bitflags::bitflags;
use std::cell::Cell;
use std::rc::Rc;

slotmap::new_key_type! {
    /// Stable handle to a collider owned by a [`CollisionSimulation`](crate::physics::CollisionSimulation)
    pub struct ColliderHandle;
}

bitflags! {
    /// Cached data that needs recomputing
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColliderFlags: u8 {
        /// Shape vertices changed, local volume is stale
        const SHAPE_DIRTY = 1 << 0;
        /// Transform or local volume changed, world volume is stale
        const WORLD_VOLUME_DIRTY = 1 << 1;
    }
}

/// Lifecycle of a collider inside a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColliderState {
    /// Created, admitted on the next update
    QueuedForAdd,
    /// Taking part in collision detection
    Active,
    /// Destroyed, retired on the next update
    QueuedForRemove,
    /// Retired and dropped from the simulation
    Removed,
}

/// Per-collider broadphase callback, receives the other collider
pub type BroadphaseCallback = dyn FnMut(ColliderHandle) -> Propagation;

/// Per-collider narrowphase callback, receives the other collider and the result
pub type NarrowphaseCallback = dyn FnMut(ColliderHandle, &NarrowphaseResult) -> Propagation;

/// A shape, a transform and everything the pipeline caches about them
pub struct Collider {
    handle: ColliderHandle,
    shape: SharedShape,
    transform: SharedTransform,
    volume_kind: BoundingVolumeKind,
    local_volume: BoundingVolume,
    world_volume: BoundingVolume,
    flags: Rc<Cell<ColliderFlags>>,
    broadphase_callbacks: CallbackList<BroadphaseCallback>,
    narrowphase_callbacks: CallbackList<NarrowphaseCallback>,
    index: Option<usize>,
    state: ColliderState,
    immovable: bool,
    layers: CollisionLayers,
    mask: CollisionLayers,
    local_volume_updates: u64,
    world_volume_updates: u64,
}

impl Collider {
    /// Create a collider and subscribe it to shape and transform changes
    ///
    /// Starts fully dirty and queued for admission.
    pub(crate) fn new(
        handle: ColliderHandle,
        transform: SharedTransform,
        shape: SharedShape,
        volume_kind: BoundingVolumeKind,
    ) -> Self {
        let flags = Rc::new(Cell::new(ColliderFlags::all()));
        shape
            .borrow_mut()
            .subscribe(DirtyListener::new(&flags, ColliderFlags::all()));
        transform
            .borrow_mut()
            .subscribe_dirty(DirtyListener::new(&flags, ColliderFlags::WORLD_VOLUME_DIRTY));

        Self {
            handle,
            shape,
            transform,
            volume_kind,
            local_volume: BoundingVolume::default(),
            world_volume: BoundingVolume::default(),
            flags,
            broadphase_callbacks: CallbackList::new(),
            narrowphase_callbacks: CallbackList::new(),
            index: None,
            state: ColliderState::QueuedForAdd,
            immovable: false,
            layers: CollisionLayers::default(),
            mask: CollisionLayers::default(),
            local_volume_updates: 0,
            world_volume_updates: 0,
        }
    }

    /// Recompute whichever cached volumes are stale and return the world volume
    pub fn update_if_necessary(&mut self) -> BoundingVolume {
        if self.flags.get().contains(ColliderFlags::SHAPE_DIRTY) {
            let shape = self.shape.borrow();
            self.local_volume =
                BoundingVolume::from_points(self.volume_kind, shape.points(), shape.centroid());
            self.local_volume_updates += 1;
            let flags = self.flags.get() - ColliderFlags::SHAPE_DIRTY;
            self.flags.set(flags | ColliderFlags::WORLD_VOLUME_DIRTY);
        }

        if self.flags.get().contains(ColliderFlags::WORLD_VOLUME_DIRTY) {
            let matrix = self.transform.borrow().world_matrix();
            self.world_volume = self.local_volume.transformed(&matrix);
            self.world_volume_updates += 1;
            self.flags.set(self.flags.get() - ColliderFlags::WORLD_VOLUME_DIRTY);
        }

        self.world_volume
    }

    /// Run broadphase callbacks in registration order until one cancels
    pub fn on_broadphase_collision(&mut self, other: ColliderHandle) -> Propagation {
        self.broadphase_callbacks.dispatch(|callback| callback(other))
    }

    /// Run narrowphase callbacks in registration order until one cancels
    pub fn on_narrowphase_collision(
        &mut self,
        other: ColliderHandle,
        result: &NarrowphaseResult,
    ) -> Propagation {
        self.narrowphase_callbacks
            .dispatch(|callback| callback(other, result))
    }

    /// Subscribe to broadphase pairs involving this collider
    pub fn subscribe_broadphase(&mut self, callback: Box<BroadphaseCallback>) -> SubscriptionId {
        self.broadphase_callbacks.subscribe(callback)
    }

    /// Remove a broadphase callback
    pub fn unsubscribe_broadphase(&mut self, id: SubscriptionId) -> bool {
        self.broadphase_callbacks.unsubscribe(id)
    }

    /// Subscribe to narrowphase results involving this collider
    pub fn subscribe_narrowphase(&mut self, callback: Box<NarrowphaseCallback>) -> SubscriptionId {
        self.narrowphase_callbacks.subscribe(callback)
    }

    /// Remove a narrowphase callback
    pub fn unsubscribe_narrowphase(&mut self, id: SubscriptionId) -> bool {
        self.narrowphase_callbacks.unsubscribe(id)
    }

    /// World-space vertices of the shape, counter-clockwise
    pub fn world_points(&self) -> Vec<Point2> {
        let mut out = Vec::new();
        self.world_points_into(&mut out);
        out
    }

    /// Write world-space vertices into `out`, reusing its allocation
    pub fn world_points_into(&self, out: &mut Vec<Point2>) {
        let matrix = self.transform.borrow().world_matrix();
        self.shape.borrow().world_points_into(&matrix, out);
    }

    /// Handle of this collider
    pub fn handle(&self) -> ColliderHandle {
        self.handle
    }

    /// Shared shape
    pub fn shape(&self) -> &SharedShape {
        &self.shape
    }

    /// Shared transform
    pub fn transform(&self) -> &SharedTransform {
        &self.transform
    }

    /// Kind of bounding volume
    pub fn volume_kind(&self) -> BoundingVolumeKind {
        self.volume_kind
    }

    /// Local bounding volume as of the last update
    pub fn local_volume(&self) -> BoundingVolume {
        self.local_volume
    }

    /// World bounding volume as of the last update
    pub fn world_volume(&self) -> BoundingVolume {
        self.world_volume
    }

    /// Current dirty flags
    pub fn flags(&self) -> ColliderFlags {
        self.flags.get()
    }

    /// Check if any cached volume is stale
    pub fn is_dirty(&self) -> bool {
        !self.flags.get().is_empty()
    }

    /// Position in the simulation's active array, if admitted
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: Option<usize>) {
        self.index = index;
    }

    /// Lifecycle state
    pub fn state(&self) -> ColliderState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ColliderState) {
        self.state = state;
    }

    /// Check if responders must leave this collider in place
    pub fn is_immovable(&self) -> bool {
        self.immovable
    }

    /// Mark the collider as immovable (static geometry)
    pub fn set_immovable(&mut self, immovable: bool) {
        self.immovable = immovable;
    }

    /// Layers this collider sits on
    pub fn layers(&self) -> CollisionLayers {
        self.layers
    }

    /// Layers this collider wants to hit
    pub fn mask(&self) -> CollisionLayers {
        self.mask
    }

    /// Set layer membership and mask
    pub fn set_layers(&mut self, layers: CollisionLayers, mask: CollisionLayers) {
        self.layers = layers;
        self.mask = mask;
    }

    /// Number of local volume rebuilds so far
    pub fn local_volume_updates(&self) -> u64 {
        self.local_volume_updates
    }

    /// Number of world volume rebuilds so far
    pub fn world_volume_updates(&self) -> u64 {
        self.world_volume_updates
    }
}

impl std::fmt::Debug for Collider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collider")
            .field("handle", &self.handle)
            .field("index", &self.index)
            .field("state", &self.state)
            .field("flags", &self.flags.get())
            .field("world_volume", &self.world_volume)
            .field("immovable", &self.immovable)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;
    use crate::physics::collision::Shape;
    use crate::physics::transform::{Transform, Transform2D};
    use approx::assert_relative_eq;
    use slotmap::SlotMap;
    use std::cell::RefCell;

    fn make_collider(
        transform: &Rc<RefCell<Transform2D>>,
        shape: &SharedShape,
        kind: BoundingVolumeKind,
    ) -> Collider {
        let mut keys: SlotMap<ColliderHandle, ()> = SlotMap::with_key();
        let handle = keys.insert(());
        Collider::new(handle, transform.clone(), shape.clone(), kind)
    }

    #[test]
    fn test_update_is_lazy() {
        let transform = Transform2D::from_position(Vec2::new(2.0, 0.0)).shared();
        let shape = Shape::square(1.0).unwrap().shared();
        let mut collider = make_collider(&transform, &shape, BoundingVolumeKind::Aabb);
        assert_eq!(collider.flags(), ColliderFlags::all());

        let volume = collider.update_if_necessary();
        assert_relative_eq!(volume.center(), Point2::new(2.0, 0.0));
        assert!(!collider.is_dirty());

        collider.update_if_necessary();
        assert_eq!(collider.local_volume_updates(), 1);
        assert_eq!(collider.world_volume_updates(), 1);
    }

    #[test]
    fn test_transform_change_only_rebuilds_world_volume() {
        let transform = Transform2D::identity().shared();
        let shape = Shape::square(1.0).unwrap().shared();
        let mut collider = make_collider(&transform, &shape, BoundingVolumeKind::Circle);
        collider.update_if_necessary();

        transform.borrow_mut().translate(Vec2::new(0.0, 5.0));
        assert_eq!(collider.flags(), ColliderFlags::WORLD_VOLUME_DIRTY);

        let volume = collider.update_if_necessary();
        assert_relative_eq!(volume.center(), Point2::new(0.0, 5.0));
        assert_eq!(collider.local_volume_updates(), 1);
        assert_eq!(collider.world_volume_updates(), 2);
    }

    #[test]
    fn test_shape_change_rebuilds_both_volumes() {
        let transform = Transform2D::identity().shared();
        let shape = Shape::square(1.0).unwrap().shared();
        let mut collider = make_collider(&transform, &shape, BoundingVolumeKind::Aabb);
        collider.update_if_necessary();

        let bigger = Shape::square(3.0).unwrap().points().to_vec();
        shape.borrow_mut().set_points(bigger).unwrap();
        assert_eq!(collider.flags(), ColliderFlags::all());

        let volume = collider.update_if_necessary();
        assert_relative_eq!(volume.aabb().extents(), Vec2::new(3.0, 3.0));
        assert_eq!(collider.local_volume_updates(), 2);
        assert_eq!(collider.world_volume_updates(), 2);
    }

    #[test]
    fn test_shared_shape_notifies_every_collider() {
        let shape = Shape::square(1.0).unwrap().shared();
        let mut first = make_collider(&Transform2D::identity().shared(), &shape, BoundingVolumeKind::Aabb);
        let mut second = make_collider(&Transform2D::identity().shared(), &shape, BoundingVolumeKind::Aabb);
        first.update_if_necessary();
        second.update_if_necessary();

        let triangle = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
        shape.borrow_mut().set_points(triangle).unwrap();

        assert!(first.is_dirty());
        assert!(second.is_dirty());
    }

    #[test]
    fn test_broadphase_callbacks_short_circuit() {
        let transform = Transform2D::identity().shared();
        let shape = Shape::square(1.0).unwrap().shared();
        let mut collider = make_collider(&transform, &shape, BoundingVolumeKind::Aabb);
        let other = collider.handle();

        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let cancel = collider.subscribe_broadphase(Box::new(|_| Propagation::Cancel));
        collider.subscribe_broadphase(Box::new(move |_| {
            counter.set(counter.get() + 1);
            Propagation::Continue
        }));

        assert_eq!(collider.on_broadphase_collision(other), Propagation::Cancel);
        assert_eq!(calls.get(), 0);

        assert!(collider.unsubscribe_broadphase(cancel));
        assert_eq!(collider.on_broadphase_collision(other), Propagation::Continue);
        assert_eq!(calls.get(), 1);
    }
}
