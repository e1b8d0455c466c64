//! Combat bookkeeping
//!
//! Shared vocabulary between the simulation and its observers:
//! - Unit cues and battle events
//! - Combat logging
//! - Simulation speed control

use bevy::prelude::*;

pub mod events;
pub mod log;

/// Controls the speed of the combat simulation
#[derive(Resource, Debug, Clone, Copy)]
pub struct SimulationSpeed {
    /// Speed multiplier (0.0 = paused, 0.5 = half speed, 1.0 = normal, 2.0 = double, 3.0 = triple)
    pub multiplier: f32,
}

impl Default for SimulationSpeed {
    fn default() -> Self {
        Self { multiplier: 1.0 }
    }
}

impl SimulationSpeed {
    /// Negative multipliers are treated as paused.
    pub fn new(multiplier: f32) -> Self {
        Self {
            multiplier: multiplier.max(0.0),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.multiplier == 0.0
    }

    /// Scale a frame delta by the current multiplier.
    pub fn scale(&self, dt: f32) -> f32 {
        dt * self.multiplier.max(0.0)
    }
}
