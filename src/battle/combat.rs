//! Combat Controller
//!
//! Basic-attack timer and the commit/confirm split of a swing. Committing an
//! attack happens on a tick; resolving it happens later when the presentation
//! layer confirms the hit, so the stored target can go stale in between.

use bevy::math::Vec2;

use super::roster::{UnitId, UnitView};
use super::stats::CombatStats;

/// Observable phase of the attack cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombatPhase {
    /// Timer still running
    Cooldown,
    /// Timer elapsed, waiting for a target in range
    Ready,
    /// Swing committed, awaiting hit confirmation
    Attacking,
}

/// What a combat update decided this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombatStep {
    /// A swing is already in flight
    Busy,
    /// Target is out of range; the unit should move
    OutOfRange,
    /// Timer still counting down
    Waiting,
    /// A swing was committed against this target
    Committed(UnitId),
}

#[derive(Clone, Debug, Default)]
pub struct CombatController {
    /// Seconds until the next swing may be committed. Starts at 0 so the
    /// first attack comes out as soon as a target is in range.
    attack_timer: f32,
    /// Target of the in-flight swing; `Some` exactly while attacking.
    attack_target: Option<UnitId>,
}

impl CombatController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CombatPhase {
        if self.attack_target.is_some() {
            CombatPhase::Attacking
        } else if self.attack_timer > 0.0 {
            CombatPhase::Cooldown
        } else {
            CombatPhase::Ready
        }
    }

    pub fn is_attacking(&self) -> bool {
        self.attack_target.is_some()
    }

    pub fn attack_timer(&self) -> f32 {
        self.attack_timer
    }

    pub fn attack_target(&self) -> Option<UnitId> {
        self.attack_target
    }

    /// Run one tick of the attack cycle against a live `target`.
    ///
    /// On commit the timer is immediately reset to `attack_speed`, so the
    /// cooldown of the next swing overlaps the current animation.
    pub fn update(&mut self, dt: f32, stats: &CombatStats, position: Vec2, target: &UnitView) -> CombatStep {
        if self.is_attacking() {
            return CombatStep::Busy;
        }
        if target.distance_to(position) > stats.attack_range {
            return CombatStep::OutOfRange;
        }

        self.attack_timer -= dt;
        if self.attack_timer > 0.0 {
            return CombatStep::Waiting;
        }

        self.attack_target = Some(target.id);
        self.attack_timer = stats.attack_speed;
        CombatStep::Committed(target.id)
    }

    /// Resolve the in-flight swing on hit confirmation. Returns the stored
    /// target; the caller drops the hit if that target is gone.
    pub fn resolve_hit(&mut self) -> Option<UnitId> {
        self.attack_target.take()
    }

    /// Abort the in-flight swing without dealing damage.
    pub fn cancel(&mut self) {
        self.attack_target = None;
    }

    /// Let the next swing come out immediately.
    pub fn reset_attack_timer(&mut self) {
        self.attack_timer = 0.0;
    }
}
