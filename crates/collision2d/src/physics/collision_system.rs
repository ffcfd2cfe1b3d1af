//! Collision simulation
//!
//! The simulation owns every collider and runs the pipeline once per
//! [`CollisionSimulation::update`]:
//!
//! 1. admit colliders queued by [`CollisionSimulation::create_collider`]
//! 2. retire colliders queued by [`CollisionSimulation::destroy_collider`]
//! 3. refresh stale bounding volumes and feed them to the broadphase
//! 4. broad phase: collect deduplicated candidate pairs
//! 5. narrow phase: turn candidate pairs into exact results
//! 6. response: hand each result to the responder
//!
//! Global and per-collider callbacks can cancel a pair in step 4 or a result
//! in step 5. A cancelled pair goes no further this frame.
//!
//! Active colliders live in a dense array with a parallel array of broadphase
//! proxies. Removal swaps the last element into the hole, so each collider's
//! `index` always matches its slot.

use crate::config::{ConfigError, SimulationConfig};
use crate::foundation::math::Point2;
use crate::physics::broadphase::{Broadphase, BroadphasePair, BroadphaseProxy, BruteForceBroadphase};
use crate::physics::collider::{Collider, ColliderHandle, ColliderState};
use crate::physics::collision::{BoundingVolumeKind, SharedShape};
use crate::physics::collision_layers::CollisionLayers;
use crate::physics::events::{CallbackList, Propagation, SubscriptionId};
use crate::physics::narrowphase::{Narrowphase, NarrowphaseResult, SeparatingAxisNarrowphase};
use crate::physics::responder::{Responder, SeparationResponder};
use crate::physics::transform::SharedTransform;
use slotmap::SlotMap;
use std::collections::HashSet;

/// Global broadphase callback, runs before any per-collider callback
pub type GlobalBroadphaseCallback = dyn FnMut(&BroadphasePair) -> Propagation;

/// Global narrowphase callback, runs before any per-collider callback
pub type GlobalNarrowphaseCallback = dyn FnMut(&NarrowphaseResult) -> Propagation;

/// Misuse of the simulation API
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationError {
    /// The handle does not name a collider of this simulation (never created or already removed)
    #[error("collider {0:?} is not part of this simulation")]
    UnknownCollider(ColliderHandle),

    /// Only active colliders can be destroyed
    #[error("collider {handle:?} is {state:?}, only active colliders can be destroyed")]
    NotActive {
        /// Offending collider
        handle: ColliderHandle,
        /// Its current state
        state: ColliderState,
    },

    /// The collider is already waiting to be retired
    #[error("collider {0:?} is already queued for removal")]
    AlreadyQueuedForRemoval(ColliderHandle),
}

/// Counters for the most recent update
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number, starting at 1
    pub frame: u64,
    /// Colliders admitted
    pub admitted: usize,
    /// Colliders retired
    pub retired: usize,
    /// Colliders whose bounding volumes were rebuilt
    pub refreshed_volumes: usize,
    /// Distinct overlapping pairs reported by the broadphase
    pub candidate_pairs: usize,
    /// Pairs skipped by collision layers
    pub filtered_pairs: usize,
    /// Pairs cancelled by a broadphase callback
    pub cancelled_pairs: usize,
    /// Pairs handed to the narrowphase
    pub accepted_pairs: usize,
    /// Results cancelled by a narrowphase callback
    pub cancelled_results: usize,
    /// Results handed to the responder
    pub narrowphase_results: usize,
    /// Responder invocations
    pub responses: usize,
}

/// Outcome of raising broadphase events for a pair
enum Verdict {
    Accepted,
    Filtered,
    Cancelled,
}

/// Owns colliders and runs broadphase, narrowphase and response each frame
pub struct CollisionSimulation {
    colliders: SlotMap<ColliderHandle, Collider>,
    active: Vec<ColliderHandle>,
    proxies: Vec<BroadphaseProxy>,
    to_add: Vec<ColliderHandle>,
    to_remove: Vec<ColliderHandle>,

    broadphase: Box<dyn Broadphase>,
    narrowphase: Box<dyn Narrowphase>,
    responder: Box<dyn Responder>,

    pair_set: HashSet<BroadphasePair>,
    pairs: Vec<BroadphasePair>,
    pending_results: Vec<NarrowphaseResult>,
    results: Vec<NarrowphaseResult>,

    broadphase_callbacks: CallbackList<GlobalBroadphaseCallback>,
    narrowphase_callbacks: CallbackList<GlobalNarrowphaseCallback>,

    stats: FrameStats,
    frame: u64,
}

impl CollisionSimulation {
    /// Create a simulation from explicit strategies
    pub fn new(
        broadphase: Box<dyn Broadphase>,
        narrowphase: Box<dyn Narrowphase>,
        responder: Box<dyn Responder>,
    ) -> Self {
        log::info!(
            "Collision simulation: {} broadphase, {} narrowphase, {} responder",
            broadphase.name(),
            narrowphase.name(),
            responder.name()
        );
        Self {
            colliders: SlotMap::with_key(),
            active: Vec::new(),
            proxies: Vec::new(),
            to_add: Vec::new(),
            to_remove: Vec::new(),
            broadphase,
            narrowphase,
            responder,
            pair_set: HashSet::new(),
            pairs: Vec::new(),
            pending_results: Vec::new(),
            results: Vec::new(),
            broadphase_callbacks: CallbackList::new(),
            narrowphase_callbacks: CallbackList::new(),
            stats: FrameStats::default(),
            frame: 0,
        }
    }

    /// Create a simulation from a validated configuration
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            config.broadphase.build(),
            config.narrowphase.build(),
            config.build_responder(),
        ))
    }

    /// Create a collider; it joins the simulation on the next update
    pub fn create_collider(
        &mut self,
        transform: SharedTransform,
        shape: SharedShape,
        volume_kind: BoundingVolumeKind,
    ) -> ColliderHandle {
        let handle = self
            .colliders
            .insert_with_key(|handle| Collider::new(handle, transform, shape, volume_kind));
        self.to_add.push(handle);
        log::trace!("Queued collider {handle:?} for admission");
        handle
    }

    /// Destroy an active collider; it leaves the simulation on the next update
    ///
    /// Anything else is rejected and leaves the simulation untouched.
    pub fn destroy_collider(&mut self, handle: ColliderHandle) -> Result<(), SimulationError> {
        let result = match self.colliders.get_mut(handle) {
            None => Err(SimulationError::UnknownCollider(handle)),
            Some(collider) => match collider.state() {
                ColliderState::Active => {
                    collider.set_state(ColliderState::QueuedForRemove);
                    self.to_remove.push(handle);
                    Ok(())
                }
                ColliderState::QueuedForRemove => Err(SimulationError::AlreadyQueuedForRemoval(handle)),
                state => Err(SimulationError::NotActive { handle, state }),
            },
        };
        if let Err(error) = &result {
            log::warn!("Rejected collider destroy: {error}");
        }
        result
    }

    /// Run one frame of the pipeline and return its statistics
    pub fn update(&mut self) -> FrameStats {
        self.frame += 1;
        self.stats = FrameStats {
            frame: self.frame,
            ..FrameStats::default()
        };

        self.admit();
        self.retire();
        self.refresh();
        self.broad_pairing();
        self.narrow_pairing();
        self.respond();

        log::debug!(
            "Frame {}: +{} -{} colliders, {} refreshed, {} pairs ({} cancelled), {} results",
            self.frame,
            self.stats.admitted,
            self.stats.retired,
            self.stats.refreshed_volumes,
            self.stats.accepted_pairs,
            self.stats.cancelled_pairs,
            self.stats.narrowphase_results
        );
        self.stats
    }

    fn admit(&mut self) {
        for handle in std::mem::take(&mut self.to_add) {
            let Some(collider) = self.colliders.get_mut(handle) else {
                continue;
            };
            collider.set_index(Some(self.active.len()));
            collider.set_state(ColliderState::Active);

            let proxy = BroadphaseProxy::new(handle, collider.update_if_necessary());
            self.broadphase.add(&proxy);
            self.active.push(handle);
            self.proxies.push(proxy);
            self.stats.admitted += 1;
        }
    }

    fn retire(&mut self) {
        for handle in std::mem::take(&mut self.to_remove) {
            let Some(index) = self.colliders.get(handle).and_then(Collider::index) else {
                continue;
            };

            self.active.swap_remove(index);
            let proxy = self.proxies.swap_remove(index);
            if let Some(moved) = self.active.get(index).and_then(|&moved| self.colliders.get_mut(moved)) {
                moved.set_index(Some(index));
            }
            self.broadphase.remove(&proxy);

            if let Some(mut collider) = self.colliders.remove(handle) {
                collider.set_index(None);
                collider.set_state(ColliderState::Removed);
                log::trace!("Retired collider {handle:?}");
            }
            self.stats.retired += 1;
        }
    }

    fn refresh(&mut self) {
        let Self {
            colliders,
            active,
            proxies,
            broadphase,
            stats,
            ..
        } = self;

        for (handle, proxy) in active.iter().zip(proxies.iter_mut()) {
            let Some(collider) = colliders.get_mut(*handle) else {
                continue;
            };
            if collider.is_dirty() {
                stats.refreshed_volumes += 1;
            }
            proxy.volume = collider.update_if_necessary();
            broadphase.update(proxy);
        }
    }

    fn broad_pairing(&mut self) {
        self.pair_set.clear();
        self.pairs.clear();

        let Self {
            colliders,
            proxies,
            broadphase,
            pair_set,
            pairs,
            broadphase_callbacks,
            stats,
            ..
        } = self;

        for proxy in proxies.iter() {
            broadphase.query(proxy, &mut |other| {
                let pair = BroadphasePair::new(proxy.handle, other);
                // Every pair seen this frame is recorded, cancelled ones included,
                // so the reverse report does not raise events again
                if !pair_set.insert(pair) {
                    return;
                }
                stats.candidate_pairs += 1;

                match raise_broadphase_events(&pair, colliders, broadphase_callbacks) {
                    Verdict::Accepted => {
                        log::trace!("Broadphase pair {:?} <-> {:?}", pair.first, pair.second);
                        pairs.push(pair);
                        stats.accepted_pairs += 1;
                    }
                    Verdict::Filtered => stats.filtered_pairs += 1,
                    Verdict::Cancelled => {
                        log::trace!("Broadphase pair {:?} <-> {:?} cancelled", pair.first, pair.second);
                        stats.cancelled_pairs += 1;
                    }
                }
            });
        }
    }

    fn narrow_pairing(&mut self) {
        self.results.clear();

        let Self {
            colliders,
            pairs,
            narrowphase,
            pending_results,
            results,
            narrowphase_callbacks,
            stats,
            ..
        } = self;

        pending_results.clear();
        for pair in pairs.iter() {
            let (Some(first), Some(second)) = (colliders.get(pair.first), colliders.get(pair.second)) else {
                continue;
            };
            narrowphase.resolve(pair, first, second, &mut |result| pending_results.push(result));
        }

        for result in pending_results.drain(..) {
            if raise_narrowphase_events(&result, colliders, narrowphase_callbacks).is_cancelled() {
                log::trace!("Narrowphase result {:?} <-> {:?} cancelled", result.first, result.second);
                stats.cancelled_results += 1;
                continue;
            }
            results.push(result);
            stats.narrowphase_results += 1;
        }
    }

    fn respond(&mut self) {
        let Self {
            colliders,
            results,
            responder,
            stats,
            ..
        } = self;

        for result in results.iter() {
            let (Some(first), Some(second)) = (colliders.get(result.first), colliders.get(result.second)) else {
                continue;
            };
            responder.respond(result, first, second);
            stats.responses += 1;
        }
    }

    /// Subscribe to every broadphase pair; runs before per-collider callbacks
    pub fn subscribe_broadphase(&mut self, callback: Box<GlobalBroadphaseCallback>) -> SubscriptionId {
        self.broadphase_callbacks.subscribe(callback)
    }

    /// Remove a global broadphase callback
    pub fn unsubscribe_broadphase(&mut self, id: SubscriptionId) -> bool {
        self.broadphase_callbacks.unsubscribe(id)
    }

    /// Subscribe to every narrowphase result; runs before per-collider callbacks
    pub fn subscribe_narrowphase(&mut self, callback: Box<GlobalNarrowphaseCallback>) -> SubscriptionId {
        self.narrowphase_callbacks.subscribe(callback)
    }

    /// Remove a global narrowphase callback
    pub fn unsubscribe_narrowphase(&mut self, id: SubscriptionId) -> bool {
        self.narrowphase_callbacks.unsubscribe(id)
    }

    /// Collider by handle, whatever its state
    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle)
    }

    /// Mutable collider by handle, for callbacks, layers and the immovable flag
    pub fn collider_mut(&mut self, handle: ColliderHandle) -> Option<&mut Collider> {
        self.colliders.get_mut(handle)
    }

    /// Lifecycle state, `None` once the collider has been removed
    pub fn collider_state(&self, handle: ColliderHandle) -> Option<ColliderState> {
        self.colliders.get(handle).map(Collider::state)
    }

    /// Active colliders in index order
    pub fn active_colliders(&self) -> impl Iterator<Item = &Collider> + '_ {
        self.active.iter().filter_map(|&handle| self.colliders.get(handle))
    }

    /// Handles of active colliders in index order
    pub fn active_handles(&self) -> &[ColliderHandle] {
        &self.active
    }

    /// Broadphase proxies, parallel to [`Self::active_handles`]
    pub fn proxies(&self) -> &[BroadphaseProxy] {
        &self.proxies
    }

    /// Pairs accepted by the last update
    pub fn pairs(&self) -> &[BroadphasePair] {
        &self.pairs
    }

    /// Narrowphase results accepted by the last update
    pub fn results(&self) -> &[NarrowphaseResult] {
        &self.results
    }

    /// Results of the last update involving `handle`
    pub fn results_for(&self, handle: ColliderHandle) -> impl Iterator<Item = &NarrowphaseResult> + '_ {
        self.results.iter().filter(move |result| result.involves(handle))
    }

    /// Check if `handle` took part in a result of the last update
    pub fn is_colliding(&self, handle: ColliderHandle) -> bool {
        self.results_for(handle).next().is_some()
    }

    /// Contact points of every result of the last update involving `handle`
    pub fn contacts_for(&self, handle: ColliderHandle) -> Vec<Point2> {
        self.results_for(handle)
            .flat_map(|result| result.contact_points().iter().copied())
            .collect()
    }

    /// Number of active colliders
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Check if no collider is active
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Colliders waiting for admission
    pub fn pending_additions(&self) -> usize {
        self.to_add.len()
    }

    /// Colliders waiting for retirement
    pub fn pending_removals(&self) -> usize {
        self.to_remove.len()
    }

    /// Number of updates run so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Statistics of the last update
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Active broadphase strategy
    pub fn broadphase(&self) -> &dyn Broadphase {
        self.broadphase.as_ref()
    }
}

impl Default for CollisionSimulation {
    /// Brute-force broadphase, separating axis narrowphase, even separation
    fn default() -> Self {
        Self::new(
            Box::new(BruteForceBroadphase::new()),
            Box::new(SeparatingAxisNarrowphase::new()),
            Box::new(SeparationResponder::default()),
        )
    }
}

impl std::fmt::Debug for CollisionSimulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionSimulation")
            .field("frame", &self.frame)
            .field("active", &self.active.len())
            .field("pending_additions", &self.to_add.len())
            .field("pending_removals", &self.to_remove.len())
            .field("broadphase", &self.broadphase.name())
            .field("narrowphase", &self.narrowphase.name())
            .field("responder", &self.responder.name())
            .finish_non_exhaustive()
    }
}

/// Layer filter, then global callbacks, then the first collider's, then the second's
fn raise_broadphase_events(
    pair: &BroadphasePair,
    colliders: &mut SlotMap<ColliderHandle, Collider>,
    global: &mut CallbackList<GlobalBroadphaseCallback>,
) -> Verdict {
    let (Some(first), Some(second)) = (colliders.get(pair.first), colliders.get(pair.second)) else {
        return Verdict::Filtered;
    };
    if !CollisionLayers::should_collide(first.layers(), first.mask(), second.layers(), second.mask()) {
        return Verdict::Filtered;
    }

    if global.dispatch(|callback| callback(pair)).is_cancelled() {
        return Verdict::Cancelled;
    }
    for (this, other) in [(pair.first, pair.second), (pair.second, pair.first)] {
        if let Some(collider) = colliders.get_mut(this) {
            if collider.on_broadphase_collision(other).is_cancelled() {
                return Verdict::Cancelled;
            }
        }
    }
    Verdict::Accepted
}

/// Global callbacks, then the first collider's, then the second's
fn raise_narrowphase_events(
    result: &NarrowphaseResult,
    colliders: &mut SlotMap<ColliderHandle, Collider>,
    global: &mut CallbackList<GlobalNarrowphaseCallback>,
) -> Propagation {
    if global.dispatch(|callback| callback(result)).is_cancelled() {
        return Propagation::Cancel;
    }
    for (this, other) in [(result.first, result.second), (result.second, result.first)] {
        if let Some(collider) = colliders.get_mut(this) {
            if collider.on_narrowphase_collision(other, result).is_cancelled() {
                return Propagation::Cancel;
            }
        }
    }
    Propagation::Continue
}
