//! # Collision2D
//!
//! A 2D collision detection and response pipeline for games.
//!
//! ## Features
//!
//! - **Lazy Bounding Volumes**: Boxes and circles rebuilt only when a shape or transform changes
//! - **Pluggable Strategies**: Broadphase, narrowphase and responder are swappable trait objects
//! - **Cancellable Events**: Global and per-collider callbacks can veto pairs and results
//! - **Stable Handles**: Colliders are added and removed in batches between frames
//! - **Debug Output**: World polygons, volumes and contacts as uploadable line vertices
//!
//! ## Quick Start
//!
//! ```rust
//! use collision2d::prelude::*;
//!
//! let mut simulation = CollisionSimulation::default();
//! let shape = Shape::square(1.0).unwrap().shared();
//!
//! let left = Transform2D::identity().shared();
//! let right = Transform2D::from_position(Vec2::new(1.5, 0.0)).shared();
//! simulation.create_collider(left.clone(), shape.clone(), BoundingVolumeKind::Aabb);
//! simulation.create_collider(right.clone(), shape, BoundingVolumeKind::Aabb);
//!
//! let stats = simulation.update();
//! assert_eq!(stats.narrowphase_results, 1);
//!
//! // The default responder pushed both squares apart
//! assert!(left.borrow().position().x < 0.0);
//! assert!(right.borrow().position().x > 1.5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod debug;
pub mod foundation;
pub mod physics;
pub mod spatial;

/// Common imports for simulation users
pub mod prelude {
    pub use crate::{
        config::{BroadphaseKind, Config, ConfigError, NarrowphaseKind, SimulationConfig},
        debug::{CollisionDebugVisualizer, DebugVertex},
        foundation::math::{Point2, Vec2},
        physics::{
            BoundingVolume, BoundingVolumeKind, BroadphasePair, Collider, ColliderHandle,
            ColliderState, CollisionLayers, CollisionSimulation, FrameStats, NarrowphaseResult,
            Propagation, SeparationPolicy, Shape, ShapeError, SimulationError, SubscriptionId,
            Transform, Transform2D,
        },
    };
}
