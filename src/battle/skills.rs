//! Skill Instances
//!
//! Per-unit cooldown tracking and trigger evaluation for each skill template,
//! plus the pending effect record that bridges a cast to its hit confirmations.

use bevy::math::Vec2;
use std::sync::Arc;

use super::data::{EffectType, ProjectileProfile, SkillTemplate, TriggerType};
use super::targeting::TargetList;

// ============================================================================
// Skill Instance
// ============================================================================

/// Runtime state of one skill on one unit.
#[derive(Clone, Debug)]
pub struct SkillInstance {
    template: Arc<SkillTemplate>,
    /// Seconds until ready. Never negative.
    current_cooldown: f32,
}

impl SkillInstance {
    /// New instance, ready to fire.
    pub fn new(template: Arc<SkillTemplate>) -> Self {
        Self {
            template,
            current_cooldown: 0.0,
        }
    }

    pub fn template(&self) -> &SkillTemplate {
        &self.template
    }

    pub fn shared_template(&self) -> &Arc<SkillTemplate> {
        &self.template
    }

    pub fn current_cooldown(&self) -> f32 {
        self.current_cooldown
    }

    pub fn update_cooldown(&mut self, dt: f32) {
        self.current_cooldown = (self.current_cooldown - dt).max(0.0);
    }

    pub fn reset_cooldown(&mut self) {
        self.current_cooldown = self.template.cooldown.max(0.0);
    }

    pub fn is_ready(&self) -> bool {
        self.current_cooldown <= 0.0
    }

    /// Remaining cooldown as a share of the full cooldown (1.0 = just used).
    pub fn cooldown_ratio(&self) -> f32 {
        if self.template.cooldown > 0.0 {
            (self.current_cooldown / self.template.cooldown).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Per-tick trigger check for an owner at `health_ratio`.
    ///
    /// `BattleStart` is fired by a dedicated call at battle start and is never
    /// reported here. `OnKill` and `AllyHpBelow` are not evaluated.
    pub fn check_trigger(&self, health_ratio: f32) -> bool {
        let threshold = self.template.trigger_value;
        match self.template.trigger {
            TriggerType::CooldownReady => self.is_ready(),
            TriggerType::HpBelow => self.is_ready() && health_ratio <= threshold,
            TriggerType::HpAbove => self.is_ready() && health_ratio >= threshold,
            TriggerType::BattleStart | TriggerType::OnKill | TriggerType::AllyHpBelow => false,
        }
    }
}

// ============================================================================
// Pending Skill Effect
// ============================================================================

/// Effect registered at cast time and applied once per hit confirmation.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingSkillEffect {
    pub skill_name: String,
    pub effect: EffectType,
    /// Damage or heal amount applied to every target per hit
    pub magnitude: f32,
    pub targets: TargetList,
    pub remaining_hits: u32,
    /// Resolved projectile; `None` applies the effect instantly
    pub projectile: Option<ProjectileProfile>,
    /// Launch point captured at cast time
    pub origin: Vec2,
}

/// One hit's worth of a pending effect, handed to the battle to apply.
#[derive(Clone, Debug, PartialEq)]
pub struct SkillHit {
    pub skill_name: String,
    pub effect: EffectType,
    pub magnitude: f32,
    pub targets: TargetList,
    pub projectile: Option<ProjectileProfile>,
    pub origin: Vec2,
}

impl PendingSkillEffect {
    pub fn is_valid(&self) -> bool {
        !self.targets.is_empty() && self.remaining_hits > 0
    }

    /// Take one hit. Returns `None` once the effect is exhausted.
    pub fn consume_hit(&mut self) -> Option<SkillHit> {
        if !self.is_valid() {
            return None;
        }
        self.remaining_hits -= 1;
        Some(SkillHit {
            skill_name: self.skill_name.clone(),
            effect: self.effect,
            magnitude: self.magnitude,
            targets: self.targets.clone(),
            projectile: self.projectile.clone(),
            origin: self.origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::roster::UnitId;
    use smallvec::smallvec;

    fn skill(trigger: TriggerType, threshold: f32) -> SkillInstance {
        let mut template = SkillTemplate::new("test");
        template.cooldown = 4.0;
        template.trigger = trigger;
        template.trigger_value = threshold;
        SkillInstance::new(Arc::new(template))
    }

    #[test]
    fn test_cooldown_never_negative() {
        let mut s = skill(TriggerType::CooldownReady, 0.0);
        s.reset_cooldown();
        assert_eq!(s.current_cooldown(), 4.0);
        s.update_cooldown(10.0);
        assert_eq!(s.current_cooldown(), 0.0);
        assert!(s.is_ready());
    }

    #[test]
    fn test_cooldown_ratio() {
        let mut s = skill(TriggerType::CooldownReady, 0.0);
        assert_eq!(s.cooldown_ratio(), 0.0);
        s.reset_cooldown();
        s.update_cooldown(1.0);
        assert!((s.cooldown_ratio() - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_hp_below_threshold_is_inclusive() {
        let s = skill(TriggerType::HpBelow, 0.3);
        assert!(!s.check_trigger(0.31));
        assert!(s.check_trigger(0.30));
        assert!(s.check_trigger(0.1));
    }

    #[test]
    fn test_hp_below_requires_ready() {
        let mut s = skill(TriggerType::HpBelow, 0.3);
        s.reset_cooldown();
        assert!(!s.check_trigger(0.1));
    }

    #[test]
    fn test_hp_above() {
        let s = skill(TriggerType::HpAbove, 0.8);
        assert!(s.check_trigger(0.8));
        assert!(!s.check_trigger(0.79));
    }

    #[test]
    fn test_inert_triggers_never_fire() {
        for trigger in [TriggerType::BattleStart, TriggerType::OnKill, TriggerType::AllyHpBelow] {
            assert!(!skill(trigger, 1.0).check_trigger(0.0));
        }
    }

    #[test]
    fn test_pending_effect_consumes_hits() {
        let mut pending = PendingSkillEffect {
            skill_name: "Cleave".to_string(),
            effect: EffectType::Damage,
            magnitude: 12.0,
            targets: smallvec![UnitId(1), UnitId(2)],
            remaining_hits: 2,
            projectile: None,
            origin: Vec2::ZERO,
        };

        assert!(pending.consume_hit().is_some());
        assert!(pending.consume_hit().is_some());
        assert!(!pending.is_valid());
        assert!(pending.consume_hit().is_none());
    }

    #[test]
    fn test_pending_effect_without_targets_is_invalid() {
        let mut pending = PendingSkillEffect {
            skill_name: "Whiff".to_string(),
            effect: EffectType::Damage,
            magnitude: 12.0,
            targets: TargetList::new(),
            remaining_hits: 3,
            projectile: None,
            origin: Vec2::ZERO,
        };
        assert!(!pending.is_valid());
        assert!(pending.consume_hit().is_none());
    }
}
