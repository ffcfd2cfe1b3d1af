//! Collision simulation configuration

use super::{Config, ConfigError};
use crate::physics::broadphase::{Broadphase, BruteForceBroadphase};
use crate::physics::narrowphase::{Narrowphase, PassThroughNarrowphase, SeparatingAxisNarrowphase};
use crate::physics::responder::{NullResponder, Responder, SeparationPolicy, SeparationResponder};
use crate::spatial::UniformGridBroadphase;
use serde::{Deserialize, Serialize};

/// Broadphase strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadphaseKind {
    /// Compare every pair of proxies
    #[default]
    BruteForce,
    /// Spatial hash with square cells
    UniformGrid {
        /// Cell edge length in world units
        cell_size: f32,
    },
}

impl BroadphaseKind {
    /// Instantiate the strategy
    pub fn build(self) -> Box<dyn Broadphase> {
        match self {
            Self::BruteForce => Box::new(BruteForceBroadphase::new()),
            Self::UniformGrid { cell_size } => Box::new(UniformGridBroadphase::new(cell_size)),
        }
    }
}

/// Narrowphase strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrowphaseKind {
    /// Accept every broadphase pair
    PassThrough,
    /// Exact convex polygon test
    #[default]
    SeparatingAxis,
}

impl NarrowphaseKind {
    /// Instantiate the strategy
    pub fn build(self) -> Box<dyn Narrowphase> {
        match self {
            Self::PassThrough => Box::new(PassThroughNarrowphase),
            Self::SeparatingAxis => Box::new(SeparatingAxisNarrowphase::new()),
        }
    }
}

/// Strategies and response policy for a [`CollisionSimulation`](crate::physics::CollisionSimulation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Broadphase strategy
    pub broadphase: BroadphaseKind,
    /// Narrowphase strategy
    pub narrowphase: NarrowphaseKind,
    /// How penetrations are split between bodies
    pub separation: SeparationPolicy,
    /// Run the response stage
    pub respond: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            broadphase: BroadphaseKind::default(),
            narrowphase: NarrowphaseKind::default(),
            separation: SeparationPolicy::default(),
            respond: true,
        }
    }
}

impl Config for SimulationConfig {}

impl SimulationConfig {
    /// Check every field is in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let BroadphaseKind::UniformGrid { cell_size } = self.broadphase {
            if !(cell_size.is_finite() && cell_size > 0.0) {
                return Err(ConfigError::InvalidValue {
                    field: "broadphase.cell_size",
                    reason: format!("must be positive and finite, got {cell_size}"),
                });
            }
        }

        let unit_ranges = [
            ("separation.movable_share", self.separation.movable_share),
            ("separation.correction", self.separation.correction),
        ];
        for (field, value) in unit_ranges {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be within [0, 1], got {value}"),
                });
            }
        }

        let slop = self.separation.slop;
        if !(slop.is_finite() && slop >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "separation.slop",
                reason: format!("must be non-negative, got {slop}"),
            });
        }
        Ok(())
    }

    /// Instantiate the responder
    pub fn build_responder(&self) -> Box<dyn Responder> {
        if self.respond {
            Box::new(SeparationResponder::new(self.separation))
        } else {
            Box::new(NullResponder)
        }
    }
}
