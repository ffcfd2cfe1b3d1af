//! Physics module for collision detection and response
//!
//! Broad phase, narrow phase and response are separate strategies
//! ([`Broadphase`], [`Narrowphase`], [`Responder`]) driven by a
//! [`CollisionSimulation`].

pub mod broadphase;
pub mod collider;
pub mod collision;
pub mod collision_layers;
pub mod collision_system;
pub mod events;
pub mod narrowphase;
pub mod responder;
pub mod transform;

pub use broadphase::{Broadphase, BroadphasePair, BroadphaseProxy, BruteForceBroadphase};
pub use collider::{Collider, ColliderFlags, ColliderHandle, ColliderState};
pub use collision::{
    Aabb, BoundingCircle, BoundingVolume, BoundingVolumeKind, ContactManifold, Shape, ShapeError,
    SharedShape,
};
pub use collision_layers::CollisionLayers;
pub use collision_system::{CollisionSimulation, FrameStats, SimulationError};
pub use events::{Propagation, SubscriptionId};
pub use narrowphase::{Narrowphase, NarrowphaseResult, PassThroughNarrowphase, SeparatingAxisNarrowphase};
pub use responder::{NullResponder, Responder, SeparationPolicy, SeparationResponder};
pub use transform::{SharedTransform, Transform, Transform2D};
