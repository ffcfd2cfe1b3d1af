//! Debug module for visualization and debugging tools
//!
//! Produces renderer-agnostic debug primitives; drawing them is up to the host.

pub mod collision_debug;
pub mod draw;

pub use collision_debug::{CollisionDebugColors, CollisionDebugVisualizer};
pub use draw::{Color, DebugDrawSystem, DebugShape, DebugShapeId, DebugVertex};
