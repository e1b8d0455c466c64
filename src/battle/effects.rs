//! Skill Effects
//!
//! Cast planning (primary target, effect targets, pending effect) and the
//! custom skill behaviors that run after it. Behaviors are a closed set:
//!
//! - **Basic**: play the skill animation, done.
//! - **Leap**: move the caster next to the primary target over a timed
//!   leap; the skill completes when the caster lands.
//! - **RapidFire**: play the attack animation several times; the presenter
//!   reports completion after the last swing.

use bevy::math::Vec2;

use super::constants::MAX_LEAP_HANG_RATIO;
use super::data::{LeapBehavior, ProjectileProfile, SkillBehavior, SkillTemplate};
use super::roster::{Roster, UnitId, UnitView};
use super::skills::PendingSkillEffect;
use super::targeting::{expand_effect_targets, select_target, TargetList};

// ============================================================================
// Cast Planning
// ============================================================================

/// Everything decided at the moment a skill is cast.
#[derive(Clone, Debug, PartialEq)]
pub struct SkillCast {
    pub primary: UnitId,
    pub targets: TargetList,
    /// `None` when the effect found nothing to apply to
    pub pending: Option<PendingSkillEffect>,
}

/// Resolve targets for `skill` cast by `caster`. Returns `None` if there is
/// no primary target, in which case nothing about the skill changes.
///
/// `fire_position` is the caster's projectile launch point, captured now so a
/// later hit launches from where the cast happened. `unit_projectile` is the
/// caster's own profile, used when the skill opts into it.
pub fn plan_cast(
    caster: &UnitView,
    fire_position: Vec2,
    unit_projectile: Option<&ProjectileProfile>,
    roster: &Roster,
    skill: &SkillTemplate,
) -> Option<SkillCast> {
    let primary_id = select_target(caster, roster, skill)?;
    let primary = if primary_id == caster.id {
        Some(*caster)
    } else {
        roster.get(primary_id).copied()
    };

    let targets = expand_effect_targets(caster, primary.as_ref(), roster, skill);

    let pending = if targets.is_empty() {
        None
    } else {
        let projectile = skill
            .projectile
            .clone()
            .or_else(|| unit_projectile.filter(|_| skill.use_unit_projectile).cloned());
        Some(PendingSkillEffect {
            skill_name: skill.name.clone(),
            effect: skill.effect,
            magnitude: skill.effect_magnitude(),
            targets: targets.clone(),
            remaining_hits: skill.hit_count,
            projectile,
            origin: fire_position,
        })
    };

    Some(SkillCast {
        primary: primary_id,
        targets,
        pending,
    })
}

// ============================================================================
// Behaviors
// ============================================================================

/// What a behavior asks the caster to do.
#[derive(Clone, Debug, PartialEq)]
pub enum BehaviorAction {
    /// Play the named skill animation, if any. The skill is complete.
    Animate(Option<String>),
    /// Start a leap. The skill completes when the leap finishes.
    Leap(LeapMotion),
    /// Swing `attack_count` times. The presenter signals completion.
    RepeatedAttack { attack_count: u32, speed_multiplier: f32 },
    /// Nothing to do; complete right away.
    Complete,
}

/// Run `skill`'s behavior for a caster at `caster_position`.
pub fn execute_behavior(skill: &SkillTemplate, caster_position: Vec2, primary: Option<&UnitView>) -> BehaviorAction {
    match &skill.behavior {
        SkillBehavior::Basic => BehaviorAction::Animate(skill.animation.clone()),
        SkillBehavior::Leap(leap) => match primary {
            Some(target) => BehaviorAction::Leap(LeapMotion::new(caster_position, target.position, leap)),
            None => BehaviorAction::Complete,
        },
        SkillBehavior::RapidFire {
            attack_count,
            speed_multiplier,
        } => BehaviorAction::RepeatedAttack {
            attack_count: *attack_count,
            speed_multiplier: *speed_multiplier,
        },
    }
}

// ============================================================================
// Leap Motion
// ============================================================================

/// Ground path of a leap.
///
/// Phases: anticipation (holds at start), launch (to the midpoint), hang
/// (to 60% of the way), descent (to the landing point), landing (holds at
/// the landing point). Height and squash are presentation concerns.
#[derive(Clone, Debug, PartialEq)]
pub struct LeapMotion {
    pub start: Vec2,
    pub end: Vec2,
    pub duration: f32,
    pub jump_height: f32,
    pub anticipation: f32,
    pub hang_ratio: f32,
    pub landing: f32,
    elapsed: f32,
}

impl LeapMotion {
    /// Leap from `start` toward `target`, stopping `stop_distance` short.
    pub fn new(start: Vec2, target: Vec2, leap: &LeapBehavior) -> Self {
        let direction = (target - start).normalize_or_zero();
        Self {
            start,
            end: target - direction * leap.stop_distance,
            duration: leap.duration.max(0.0),
            jump_height: leap.jump_height,
            anticipation: leap.settings.anticipation_time.max(0.0),
            hang_ratio: leap.settings.hang_time_ratio.clamp(0.0, MAX_LEAP_HANG_RATIO),
            landing: leap.settings.landing_time.max(0.0),
            elapsed: 0.0,
        }
    }

    pub fn total_time(&self) -> f32 {
        self.anticipation + self.duration + self.landing
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.total_time()
    }

    /// Fraction of the ground path covered so far.
    pub fn ground_progress(&self) -> f32 {
        let flight = self.elapsed - self.anticipation;
        if flight <= 0.0 {
            return 0.0;
        }
        if flight >= self.duration {
            return 1.0;
        }

        let launch = self.duration * (1.0 - self.hang_ratio) * 0.5;
        let hang = self.duration * self.hang_ratio;
        let descent = self.duration - launch - hang;

        if flight < launch {
            0.5 * flight / launch
        } else if flight < launch + hang {
            0.5 + 0.1 * (flight - launch) / hang
        } else {
            0.6 + 0.4 * ((flight - launch - hang) / descent).min(1.0)
        }
    }

    pub fn position(&self) -> Vec2 {
        self.start.lerp(self.end, self.ground_progress())
    }

    /// Advance by `dt`. Returns true once the leap is finished.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        self.is_finished()
    }
}
