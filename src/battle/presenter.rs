//! Presentation Boundary
//!
//! Traits the battle talks to the outside world through. The core only ever
//! *calls* these; the presentation side calls back into `Battle` through its
//! inbound signal methods (`on_attack_hit_confirmed`, `on_skill_hit_confirmed`,
//! `on_skill_complete`, `on_attack_end`, `on_death_animation_complete`).

use bevy::math::Vec2;

use super::constants::SPAWN_SLOTS_PER_TEAM;
use super::data::{AttackType, Team};
use super::effects::LeapMotion;
use super::movement::Facing;
use super::roster::UnitId;

// ============================================================================
// Animation Sink
// ============================================================================

/// Receives animation cues. Every method defaults to a no-op so a presenter
/// implements only what it renders.
pub trait Presenter {
    fn set_moving(&mut self, _unit: UnitId, _moving: bool) {}

    fn face(&mut self, _unit: UnitId, _facing: Facing) {}

    /// A basic attack was committed; the hit must be confirmed later.
    fn play_attack_animation(&mut self, _unit: UnitId, _attack_type: AttackType) {}

    fn play_skill_animation(&mut self, _unit: UnitId, _trigger: &str) {}

    /// A skill with a pending effect was cast; its hits must be confirmed later.
    fn skill_cast(&mut self, _unit: UnitId, _skill: &str, _hit_count: u32) {}

    /// The unit died; death completion must be signalled later.
    fn play_death_animation(&mut self, _unit: UnitId) {}

    fn play_hit_flash(&mut self, _unit: UnitId) {}

    fn play_leap(&mut self, _unit: UnitId, _leap: &LeapMotion) {}

    /// Repeated swings for a rapid-fire skill; skill completion must be
    /// signalled after the last one.
    fn play_repeated_attack(&mut self, _unit: UnitId, _attack_type: AttackType, _count: u32, _speed_multiplier: f32) {}
}

/// Presenter that renders nothing.
impl Presenter for () {}

// ============================================================================
// Damage Feedback
// ============================================================================

/// How a floating number should be styled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupStyle {
    /// Damage taken by an ally
    AllyDamage,
    /// Damage taken by an enemy
    EnemyDamage,
    Heal,
}

impl PopupStyle {
    pub fn for_damage(team: Team) -> Self {
        match team {
            Team::Ally => PopupStyle::AllyDamage,
            Team::Enemy => PopupStyle::EnemyDamage,
        }
    }
}

/// Optional, purely observational popup sink.
pub trait DamageFeedback {
    fn show(&mut self, position: Vec2, amount: i32, style: PopupStyle);
}

/// Feedback sink that shows nothing.
impl DamageFeedback for () {
    fn show(&mut self, _position: Vec2, _amount: i32, _style: PopupStyle) {}
}

// ============================================================================
// Spawn Points
// ============================================================================

/// Maps (team, slot) to a world position.
pub trait SpawnProvider {
    fn spawn_position(&self, team: Team, slot: usize) -> Option<Vec2>;

    fn spawn_count(&self, team: Team) -> usize;

    fn is_spawn_valid(&self, team: Team, slot: usize) -> bool {
        self.spawn_position(team, slot).is_some()
    }
}

/// Fixed per-team spawn slots.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnPoints {
    pub ally_slots: Vec<Option<Vec2>>,
    pub enemy_slots: Vec<Option<Vec2>>,
}

impl SpawnPoints {
    pub fn new(ally_slots: Vec<Option<Vec2>>, enemy_slots: Vec<Option<Vec2>>) -> Self {
        Self {
            ally_slots,
            enemy_slots,
        }
    }

    fn slots(&self, team: Team) -> &[Option<Vec2>] {
        match team {
            Team::Ally => &self.ally_slots,
            Team::Enemy => &self.enemy_slots,
        }
    }
}

impl Default for SpawnPoints {
    /// Two facing columns, allies on the left, enemies on the right.
    fn default() -> Self {
        let column = |x: f32| -> Vec<Option<Vec2>> {
            (0..SPAWN_SLOTS_PER_TEAM)
                .map(|slot| Some(Vec2::new(x, 3.0 - 2.0 * slot as f32)))
                .collect()
        };
        Self::new(column(-6.0), column(6.0))
    }
}

impl SpawnProvider for SpawnPoints {
    fn spawn_position(&self, team: Team, slot: usize) -> Option<Vec2> {
        self.slots(team).get(slot).copied().flatten()
    }

    fn spawn_count(&self, team: Team) -> usize {
        self.slots(team).len()
    }
}
