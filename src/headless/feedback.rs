//! Floating damage numbers without a renderer
//!
//! Records every popup the battle asks for, jittered the way the on-screen
//! numbers are so runs with the same seed produce the same positions.

use bevy::math::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::battle::presenter::{DamageFeedback, PopupStyle};

/// Seedable random source for everything in a match that is allowed to vary.
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Seeded when `seed` is given, else from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }

    /// Generate a random f32 in the range [0.0, 1.0)
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Generate a random f32 in the given range
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.random_f32() * (max - min)
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Horizontal jitter either side of the unit
const JITTER_X: f32 = 0.2;
/// Vertical offset range above the unit
const JITTER_Y: (f32, f32) = (0.3, 1.0);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatingNumber {
    pub position: Vec2,
    pub amount: i32,
    pub style: PopupStyle,
}

#[derive(Debug, Clone, Default)]
pub struct FloatingNumbers {
    rng: GameRng,
    numbers: Vec<FloatingNumber>,
}

impl FloatingNumbers {
    pub fn new(rng: GameRng) -> Self {
        Self {
            rng,
            numbers: Vec::new(),
        }
    }

    /// Every popup shown so far, oldest first.
    pub fn numbers(&self) -> &[FloatingNumber] {
        &self.numbers
    }

    pub fn seed(&self) -> Option<u64> {
        self.rng.seed
    }

    pub fn clear(&mut self) {
        self.numbers.clear();
    }
}

impl DamageFeedback for FloatingNumbers {
    fn show(&mut self, position: Vec2, amount: i32, style: PopupStyle) {
        let offset = Vec2::new(
            self.rng.random_range(-JITTER_X, JITTER_X),
            self.rng.random_range(JITTER_Y.0, JITTER_Y.1),
        );
        self.numbers.push(FloatingNumber {
            position: position + offset,
            amount,
            style,
        });
    }
}
