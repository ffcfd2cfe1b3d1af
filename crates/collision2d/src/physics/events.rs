//! Collision event plumbing
//!
//! Two small mechanisms live here:
//! - [`CallbackList`]: an ordered chain of subscribers where any subscriber can
//!   cancel the event, which stops delivery to the rest of the chain
//!   (chain of responsibility, first cancel wins).
//! - [`ChangeNotifier`] / [`DirtyListener`]: the "became dirty" signal that
//!   shapes and transforms fire so colliders know their cached bounding
//!   volumes are stale.

use crate::physics::collider::ColliderFlags;
use std::cell::Cell;
use std::rc::{Rc, Weak};

/// Outcome of a collision callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    /// Keep delivering the event and keep the pair in the pipeline
    #[default]
    Continue,
    /// Stop delivering the event and drop the pair for the rest of this frame
    Cancel,
}

impl Propagation {
    /// Check if the event was cancelled
    pub fn is_cancelled(self) -> bool {
        self == Self::Cancel
    }
}

/// Identifier returned when subscribing a callback, used to unsubscribe it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Ordered list of cancellable callbacks
///
/// `F` is the unsized callback type, e.g. `dyn FnMut(ColliderHandle) -> Propagation`.
pub struct CallbackList<F: ?Sized> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Box<F>)>,
}

impl<F: ?Sized> CallbackList<F> {
    /// Create an empty callback list
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Append a callback; it runs after every callback registered before it
    pub fn subscribe(&mut self, callback: Box<F>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    /// Remove a callback, returns false if the id is not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.entries.iter().position(|(entry_id, _)| *entry_id == id) {
            Some(position) => {
                self.entries.remove(position);
                true
            }
            None => false,
        }
    }

    /// Invoke every callback in registration order until one cancels
    pub fn dispatch(&mut self, mut invoke: impl FnMut(&mut F) -> Propagation) -> Propagation {
        for (_, callback) in &mut self.entries {
            if invoke(callback.as_mut()).is_cancelled() {
                return Propagation::Cancel;
            }
        }
        Propagation::Continue
    }

    /// Number of subscribed callbacks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no callback is subscribed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every callback
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<F: ?Sized> Default for CallbackList<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> std::fmt::Debug for CallbackList<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackList")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Weak link from a shape or transform back to a collider's dirty flags
#[derive(Debug, Clone)]
pub struct DirtyListener {
    flags: Weak<Cell<ColliderFlags>>,
    mark: ColliderFlags,
}

impl DirtyListener {
    /// Create a listener that sets `mark` on `flags` when notified
    pub fn new(flags: &Rc<Cell<ColliderFlags>>, mark: ColliderFlags) -> Self {
        Self {
            flags: Rc::downgrade(flags),
            mark,
        }
    }

    /// Check if the collider is still around
    pub fn is_alive(&self) -> bool {
        self.flags.strong_count() > 0
    }

    /// Set the marked flags, returns false once the collider is gone
    pub fn notify(&self) -> bool {
        match self.flags.upgrade() {
            Some(flags) => {
                flags.set(flags.get() | self.mark);
                true
            }
            None => false,
        }
    }
}

/// Fan-out of a "became dirty" signal to every subscribed listener
///
/// Listeners whose collider has been dropped are pruned on the next notify
/// or subscribe, so a shape that never changes does not accumulate them.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    listeners: Vec<DirtyListener>,
}

impl ChangeNotifier {
    /// Create a notifier with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a listener
    pub fn subscribe(&mut self, listener: DirtyListener) {
        self.listeners.retain(DirtyListener::is_alive);
        self.listeners.push(listener);
    }

    /// Signal every live listener
    pub fn notify(&mut self) {
        self.listeners.retain(DirtyListener::notify);
    }

    /// Number of listeners (including ones not yet pruned)
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
