//! Combat events
//!
//! Cues a unit emits while it updates, and the battle-level events observers
//! can drain after a tick.

use crate::battle::data::AttackType;
use crate::battle::effects::LeapMotion;
use crate::battle::movement::Facing;
use crate::battle::orchestrator::BattleOutcome;
use crate::battle::roster::UnitId;
use crate::battle::targeting::TargetList;

/// Something a unit did that the battle must forward to the presenter and
/// the combat log. Emitted in order into a buffer owned by the battle.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitCue {
    /// Movement animation on or off
    Moving(bool),
    /// Turned to face a new direction
    Faced(Facing),
    /// Basic attack committed against a target
    AttackCommitted {
        target: UnitId,
        attack_type: AttackType,
    },
    /// Skill cast with its resolved targets
    SkillCast {
        skill: String,
        primary: UnitId,
        targets: TargetList,
        /// Hits the presenter is expected to confirm (0 = no pending effect)
        hit_count: u32,
    },
    /// Named skill animation trigger
    SkillAnimation(String),
    /// Leap started
    Leap(LeapMotion),
    /// Rapid-fire swings started
    RepeatedAttack {
        attack_type: AttackType,
        count: u32,
        speed_multiplier: f32,
    },
    /// The in-flight skill finished (leap landed)
    SkillCompleted,
    /// Health reached zero
    Died,
}

/// Battle-level event for observers outside the simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum BattleEvent {
    /// A unit's health reached zero
    UnitDied {
        unit: UnitId,
        killer: Option<UnitId>,
    },
    /// The death animation finished; the unit is fully retired
    UnitRetired { unit: UnitId },
    /// The battle reached a terminal result (emitted exactly once)
    Finished(BattleOutcome),
}
