//! Combat Stats
//!
//! Per-instance stat snapshot derived once at spawn from a template and level.

use serde::{Deserialize, Serialize};

use super::constants::*;
use super::data::UnitTemplate;

/// Stats a unit fights with for its whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub max_health: f32,
    pub attack_damage: f32,
    /// Seconds between basic attacks (higher = slower)
    pub attack_speed: f32,
    pub move_speed: f32,
    pub attack_range: f32,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            max_health: DEFAULT_MAX_HEALTH,
            attack_damage: DEFAULT_ATTACK_DAMAGE,
            attack_speed: DEFAULT_ATTACK_SPEED,
            move_speed: DEFAULT_MOVE_SPEED,
            attack_range: DEFAULT_ATTACK_RANGE,
        }
    }
}

/// Multiplier applied to level-scaled stats.
pub fn level_multiplier(level: u32) -> f32 {
    let level = level.max(MIN_LEVEL);
    1.0 + (level - 1) as f32 * LEVEL_STAT_GROWTH
}

/// Derive the stat snapshot for `template` at `level`.
///
/// Health and attack damage grow with level; attack speed, move speed and
/// range are fixed per template. No upper level clamp is applied.
pub fn derive_stats(template: &UnitTemplate, level: u32) -> CombatStats {
    let multiplier = level_multiplier(level);
    CombatStats {
        max_health: template.base_health * multiplier,
        attack_damage: template.base_attack_damage * multiplier,
        attack_speed: template.base_attack_speed,
        move_speed: template.base_move_speed,
        attack_range: template.base_attack_range,
    }
}
