//! Collision geometry
//!
//! # Architecture
//!
//! - **Model Space Storage**: Shapes and their local bounding volumes are kept
//!   in model coordinates
//! - **On-Demand Transformation**: World-space vertices are produced only when a
//!   narrowphase test needs them
//! - **Coordinate Decoupling**: Shape geometry is separate from the transform
//!   that places it
//!
//! # Module Organization
//!
//! - [`shape`] - Convex polygon shapes with change notification
//! - [`bounding_volume`] - Box and circle bounding volumes
//! - [`sat`] - Separating axis test and contact clipping

pub mod bounding_volume;
pub mod sat;
pub mod shape;

pub use bounding_volume::{Aabb, BoundingCircle, BoundingVolume, BoundingVolumeKind};
pub use sat::{polygon_penetration, ContactManifold, Penetration};
pub use shape::{Shape, ShapeError, SharedShape};
