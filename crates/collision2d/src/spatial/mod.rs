//! Spatial partitioning data structures
//!
//! Broadphase strategies that index bounding volumes in 2D space so a query
//! only compares nearby colliders.

mod grid;

pub use grid::UniformGridBroadphase;
