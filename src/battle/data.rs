//! Unit and Skill Templates
//!
//! Immutable, shared data records describing what a unit or skill *is*.
//! Templates are loaded from `assets/config/units.ron` (see `config`) and shared
//! between unit instances behind an `Arc`.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::constants::*;

// ============================================================================
// Enums
// ============================================================================

/// Which side of the battle a unit fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Ally,
    Enemy,
}

impl Team {
    /// The team this team fights against.
    pub fn opponent(self) -> Team {
        match self {
            Team::Ally => Team::Enemy,
            Team::Enemy => Team::Ally,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Team::Ally => "Ally",
            Team::Enemy => "Enemy",
        }
    }
}

/// Party role of a unit template. Informational only for the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitRole {
    Tank,
    #[default]
    Damage,
    Support,
}

/// Basic attack variant. Selects the attack animation; whether the attack
/// is ranged is decided by the presence of a projectile profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackType {
    #[default]
    Melee,
    Bow,
    Staff,
}

/// Condition class governing when a skill is eligible to activate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerType {
    /// Fires whenever the skill is off cooldown.
    #[default]
    CooldownReady,
    /// Fires when ready and the owner's health ratio is at or below the threshold.
    HpBelow,
    /// Fires when ready and the owner's health ratio is at or above the threshold.
    HpAbove,
    /// Only fired by the explicit battle-start call, never by the per-tick check.
    BattleStart,
    /// Declared, not evaluated. Always false.
    OnKill,
    /// Declared, not evaluated. Always false.
    AllyHpBelow,
}

/// What a skill does to its effect targets when a hit is confirmed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectType {
    #[default]
    None,
    Damage,
    DamageAoE,
    Heal,
    HealAoE,
    // Declared for future buffs; they register a zero-magnitude effect.
    BuffAtk,
    DebuffAtk,
    Stun,
    Shield,
}

impl EffectType {
    pub fn is_damage(self) -> bool {
        matches!(self, EffectType::Damage | EffectType::DamageAoE)
    }

    pub fn is_heal(self) -> bool {
        matches!(self, EffectType::Heal | EffectType::HealAoE)
    }

    /// Harmful kinds land on the caster's opponents, supportive kinds on its
    /// own side.
    pub fn is_hostile(self) -> bool {
        !matches!(
            self,
            EffectType::Heal | EffectType::HealAoE | EffectType::BuffAtk | EffectType::Shield
        )
    }
}

/// How a skill picks its primary target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetType {
    #[default]
    NearestEnemy,
    LowestHpEnemy,
    LowestHpPercentageEnemy,
    /// The caster itself; range is ignored
    #[serde(alias = "Self")]
    SelfOnly,
    LowestHpAlly,
    LowestHpPercentageAlly,
    AllEnemiesInRange,
    AllAlliesInRange,
}

/// Center of an area effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectOrigin {
    #[default]
    Caster,
    Target,
}

/// Projectile path shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileMovement {
    #[default]
    Linear,
    Parabolic,
}

// ============================================================================
// Projectile Profile
// ============================================================================

fn default_projectile_speed() -> f32 {
    DEFAULT_PROJECTILE_SPEED
}

fn default_arc_intensity() -> f32 {
    DEFAULT_ARC_INTENSITY
}

fn default_true() -> bool {
    true
}

/// Motion profile of a projectile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileProfile {
    #[serde(default)]
    pub movement: ProjectileMovement,
    /// Travel speed in units per second along the path
    #[serde(default = "default_projectile_speed")]
    pub speed: f32,
    /// Parabolic only: larger values give a higher arc
    #[serde(default = "default_arc_intensity")]
    pub arc_intensity: f32,
    /// Whether the projectile turns to face its direction of travel
    #[serde(default = "default_true")]
    pub rotate_to_direction: bool,
}

impl Default for ProjectileProfile {
    fn default() -> Self {
        Self {
            movement: ProjectileMovement::Linear,
            speed: DEFAULT_PROJECTILE_SPEED,
            arc_intensity: DEFAULT_ARC_INTENSITY,
            rotate_to_direction: true,
        }
    }
}

// ============================================================================
// Skill Behaviors
// ============================================================================

/// Timing of a leap. Positions and scales of the squash/stretch are left to
/// the presenter; only the phases that move the unit matter here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeapSettings {
    /// Wind-up before leaving the ground (seconds)
    pub anticipation_time: f32,
    /// Share of the leap duration spent hanging at the apex
    pub hang_time_ratio: f32,
    /// Landing impact after touching down (seconds)
    pub landing_time: f32,
}

impl Default for LeapSettings {
    fn default() -> Self {
        Self {
            anticipation_time: DEFAULT_LEAP_ANTICIPATION,
            hang_time_ratio: DEFAULT_LEAP_HANG_RATIO,
            landing_time: DEFAULT_LEAP_LANDING,
        }
    }
}

/// Leap to the primary target, stopping short by `stop_distance`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeapBehavior {
    pub stop_distance: f32,
    pub duration: f32,
    pub jump_height: f32,
    pub settings: LeapSettings,
}

impl Default for LeapBehavior {
    fn default() -> Self {
        Self {
            stop_distance: DEFAULT_LEAP_STOP_DISTANCE,
            duration: DEFAULT_LEAP_DURATION,
            jump_height: DEFAULT_LEAP_JUMP_HEIGHT,
            settings: LeapSettings::default(),
        }
    }
}

/// Pluggable skill behavior run after the pending effect is registered.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SkillBehavior {
    /// Plays the skill animation (if any). Completes immediately.
    #[default]
    Basic,
    /// Repositions the caster next to the primary target. Owns completion.
    Leap(LeapBehavior),
    /// Plays the attack animation `attack_count` times. Owns completion; the
    /// presenter signals it after the last swing.
    RapidFire {
        attack_count: u32,
        speed_multiplier: f32,
    },
}

impl SkillBehavior {
    /// Whether this behavior is responsible for signalling skill completion.
    pub fn handles_completion(&self) -> bool {
        !matches!(self, SkillBehavior::Basic)
    }
}

// ============================================================================
// Skill Template
// ============================================================================

/// Well-known keys of `SkillTemplate::params`.
pub mod param_keys {
    pub const DAMAGE: &str = "damage";
    pub const HEAL_AMOUNT: &str = "healAmount";
    pub const DURATION: &str = "duration";
    pub const BUFF_MULTIPLIER: &str = "buffMultiplier";
    pub const BUFF_DURATION: &str = "buffDuration";
    pub const STUN_DURATION: &str = "stunDuration";
    pub const SHIELD_AMOUNT: &str = "shieldAmount";
    pub const SHIELD_DURATION: &str = "shieldDuration";
}

fn default_cooldown() -> f32 {
    5.0
}

fn default_hit_count() -> u32 {
    1
}

fn default_skill_range() -> f32 {
    5.0
}

/// Immutable skill definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillTemplate {
    pub id: String,
    pub name: String,

    // === Trigger ===
    /// Cooldown in seconds; also the value `reset_cooldown` restores
    #[serde(default = "default_cooldown")]
    pub cooldown: f32,
    #[serde(default)]
    pub trigger: TriggerType,
    /// Health-ratio threshold for HpBelow / HpAbove (0.0 - 1.0)
    #[serde(default)]
    pub trigger_value: f32,

    // === Effect ===
    #[serde(default)]
    pub effect: EffectType,
    /// Number of hit confirmations the effect is applied for
    #[serde(default = "default_hit_count")]
    pub hit_count: u32,

    // === Targeting ===
    #[serde(default)]
    pub target: TargetType,
    #[serde(default = "default_skill_range")]
    pub range: f32,
    #[serde(default)]
    pub effect_origin: EffectOrigin,
    /// 0 = single target
    #[serde(default)]
    pub effect_radius: f32,

    // === Projectile ===
    #[serde(default)]
    pub projectile: Option<ProjectileProfile>,
    /// Fall back to the caster's own projectile when `projectile` is None
    #[serde(default)]
    pub use_unit_projectile: bool,

    // === Presentation ===
    /// Animation trigger played on cast (Basic behavior)
    #[serde(default)]
    pub animation: Option<String>,

    #[serde(default)]
    pub params: HashMap<String, f32>,
    #[serde(default)]
    pub behavior: SkillBehavior,
}

impl SkillTemplate {
    /// Minimal skill with the given id; the rest defaults like a data file would.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            cooldown: default_cooldown(),
            trigger: TriggerType::default(),
            trigger_value: 0.0,
            effect: EffectType::default(),
            hit_count: default_hit_count(),
            target: TargetType::default(),
            range: default_skill_range(),
            effect_origin: EffectOrigin::default(),
            effect_radius: 0.0,
            projectile: None,
            use_unit_projectile: false,
            animation: None,
            params: HashMap::new(),
            behavior: SkillBehavior::default(),
        }
    }

    pub fn param(&self, key: &str, default: f32) -> f32 {
        self.params.get(key).copied().unwrap_or(default)
    }

    pub fn has_param(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Magnitude applied per hit for this skill's effect kind.
    pub fn effect_magnitude(&self) -> f32 {
        if self.effect.is_damage() {
            self.param(param_keys::DAMAGE, 0.0)
        } else if self.effect.is_heal() {
            self.param(param_keys::HEAL_AMOUNT, 0.0)
        } else {
            0.0
        }
    }

    /// Whether the area effect, if any, is drawn from the caster's opponents.
    /// Decided by the effect kind, not by who the skill is aimed at.
    pub fn effect_targets_enemies(&self) -> bool {
        self.effect.is_hostile()
    }
}

// ============================================================================
// Unit Template
// ============================================================================

/// Immutable unit definition. Stats are level-1 base values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: UnitRole,

    // === Base Stats ===
    pub base_health: f32,
    pub base_attack_damage: f32,
    /// Seconds between attacks (higher = slower)
    pub base_attack_speed: f32,
    pub base_move_speed: f32,
    pub base_attack_range: f32,

    // === Attack ===
    #[serde(default)]
    pub attack_type: AttackType,
    /// Present for ranged units
    #[serde(default)]
    pub projectile: Option<ProjectileProfile>,
    /// Launch point relative to the unit's position
    #[serde(default)]
    pub fire_offset: [f32; 2],
    /// Point projectiles aim for, relative to the unit's position
    #[serde(default)]
    pub hit_offset: [f32; 2],

    #[serde(default)]
    pub skills: Vec<Arc<SkillTemplate>>,
}

impl UnitTemplate {
    /// Template with default stats and no skills.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            role: UnitRole::default(),
            base_health: DEFAULT_MAX_HEALTH,
            base_attack_damage: DEFAULT_ATTACK_DAMAGE,
            base_attack_speed: DEFAULT_ATTACK_SPEED,
            base_move_speed: DEFAULT_MOVE_SPEED,
            base_attack_range: DEFAULT_ATTACK_RANGE,
            attack_type: AttackType::default(),
            projectile: None,
            fire_offset: [0.0, 0.0],
            hit_offset: [0.0, 0.0],
            skills: Vec::new(),
        }
    }

    pub fn is_ranged(&self) -> bool {
        self.projectile.is_some()
    }

    pub fn fire_offset(&self) -> Vec2 {
        Vec2::from(self.fire_offset)
    }

    pub fn hit_offset(&self) -> Vec2 {
        Vec2::from(self.hit_offset)
    }
}
