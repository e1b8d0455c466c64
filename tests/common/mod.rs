//! Shared fixtures for the integration tests
#![allow(dead_code)]

use bevy::math::Vec2;
use std::sync::Arc;

use mercsim::battle::data::{AttackType, EffectType, SkillTemplate, TargetType, UnitTemplate};
use mercsim::battle::effects::LeapMotion;
use mercsim::battle::movement::Facing;
use mercsim::battle::{Battle, DamageFeedback, PopupStyle, Presenter, UnitId};

/// One call the battle made into the presenter
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Moving(UnitId, bool),
    Face(UnitId, Facing),
    Attack(UnitId, AttackType),
    SkillAnimation(UnitId, String),
    SkillCast(UnitId, String, u32),
    Death(UnitId),
    HitFlash(UnitId),
    Leap(UnitId, f32),
    RepeatedAttack(UnitId, u32),
}

#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub calls: Vec<Call>,
}

impl RecordingPresenter {
    pub fn attacks_by(&self, unit: UnitId) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Attack(u, _) if *u == unit))
            .count()
    }

    pub fn skill_casts(&self) -> Vec<(UnitId, String, u32)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::SkillCast(unit, skill, hits) => Some((*unit, skill.clone(), *hits)),
                _ => None,
            })
            .collect()
    }

    pub fn deaths(&self) -> Vec<UnitId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Death(unit) => Some(*unit),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn set_moving(&mut self, unit: UnitId, moving: bool) {
        self.calls.push(Call::Moving(unit, moving));
    }

    fn face(&mut self, unit: UnitId, facing: Facing) {
        self.calls.push(Call::Face(unit, facing));
    }

    fn play_attack_animation(&mut self, unit: UnitId, attack_type: AttackType) {
        self.calls.push(Call::Attack(unit, attack_type));
    }

    fn play_skill_animation(&mut self, unit: UnitId, trigger: &str) {
        self.calls.push(Call::SkillAnimation(unit, trigger.to_string()));
    }

    fn skill_cast(&mut self, unit: UnitId, skill: &str, hit_count: u32) {
        self.calls.push(Call::SkillCast(unit, skill.to_string(), hit_count));
    }

    fn play_death_animation(&mut self, unit: UnitId) {
        self.calls.push(Call::Death(unit));
    }

    fn play_hit_flash(&mut self, unit: UnitId) {
        self.calls.push(Call::HitFlash(unit));
    }

    fn play_leap(&mut self, unit: UnitId, leap: &LeapMotion) {
        self.calls.push(Call::Leap(unit, leap.total_time()));
    }

    fn play_repeated_attack(&mut self, unit: UnitId, _attack_type: AttackType, count: u32, _speed_multiplier: f32) {
        self.calls.push(Call::RepeatedAttack(unit, count));
    }
}

#[derive(Debug, Default)]
pub struct RecordingFeedback {
    pub popups: Vec<(Vec2, i32, PopupStyle)>,
}

impl DamageFeedback for RecordingFeedback {
    fn show(&mut self, position: Vec2, amount: i32, style: PopupStyle) {
        self.popups.push((position, amount, style));
    }
}

pub type TestBattle = Battle<RecordingPresenter, RecordingFeedback>;

pub fn battle() -> TestBattle {
    Battle::with_feedback(RecordingPresenter::default(), RecordingFeedback::default())
}

/// Melee unit with the given health and damage, one attack per second
pub fn unit_template(id: &str, health: f32, damage: f32) -> UnitTemplate {
    let mut template = UnitTemplate::new(id);
    template.base_health = health;
    template.base_attack_damage = damage;
    template
}

/// Unit that never moves and never reaches anyone
pub fn dummy_template(id: &str, health: f32) -> UnitTemplate {
    let mut template = unit_template(id, health, 0.0);
    template.base_move_speed = 0.0;
    template.base_attack_range = 0.1;
    template
}

pub fn damage_skill(id: &str, damage: f32) -> SkillTemplate {
    let mut skill = SkillTemplate::new(id);
    skill.name = id.to_string();
    skill.effect = EffectType::Damage;
    skill.target = TargetType::NearestEnemy;
    skill.params.insert("damage".to_string(), damage);
    skill
}

pub fn heal_skill(id: &str, amount: f32) -> SkillTemplate {
    let mut skill = SkillTemplate::new(id);
    skill.name = id.to_string();
    skill.effect = EffectType::Heal;
    skill.target = TargetType::SelfOnly;
    skill.params.insert("healAmount".to_string(), amount);
    skill
}

pub fn with_skill(mut template: UnitTemplate, skill: SkillTemplate) -> UnitTemplate {
    template.skills.push(Arc::new(skill));
    template
}

pub fn at(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y)
}

pub fn health_of(battle: &TestBattle, id: UnitId) -> f32 {
    battle.unit(id).map_or(-1.0, |u| u.health())
}
