//! Battle Unit
//!
//! The per-unit aggregate: health, state machine, target, combat controller,
//! skills and the in-flight skill effect. A unit never touches another unit;
//! it reads the roster snapshot and reports what it did as `UnitCue`s. The
//! battle applies damage and forwards cues.
//!
//! ## State machine
//! `Idle -> Move -> Attack`, with `Dead` terminal and reachable from any
//! other state. While a skill is activating, movement and combat pause.

use bevy::log::debug;
use bevy::math::Vec2;
use std::sync::Arc;

use super::combat::{CombatController, CombatPhase, CombatStep};
use super::data::{Team, TriggerType, UnitTemplate};
use super::effects::{execute_behavior, plan_cast, BehaviorAction, LeapMotion};
use super::movement::{seek, Facing, Seek};
use super::roster::{Roster, UnitId, UnitView};
use super::skills::{PendingSkillEffect, SkillHit, SkillInstance};
use super::stats::{derive_stats, CombatStats};
use super::targeting::find_nearest_in_range;
use crate::combat::events::UnitCue;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnitState {
    #[default]
    Idle,
    Move,
    Attack,
    Dead,
}

/// Outcome of `Unit::take_damage` on a live unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageTaken {
    /// Requested amount (never negative)
    pub amount: f32,
    /// Health actually removed
    pub applied: f32,
    pub killed: bool,
}

#[derive(Clone, Debug)]
pub struct Unit {
    id: UnitId,
    template: Arc<UnitTemplate>,
    level: u32,
    team: Team,
    stats: CombatStats,
    health: f32,
    state: UnitState,
    position: Vec2,
    facing: Facing,
    /// Weak reference; re-validated against the roster every tick
    target: Option<UnitId>,
    combat: CombatController,
    skills: Vec<SkillInstance>,
    activating_skill: bool,
    pending_effect: Option<PendingSkillEffect>,
    leap: Option<LeapMotion>,
    battle_start_fired: bool,
    retired: bool,
}

impl Unit {
    /// Spawn a unit at full health. Stats are derived once, here.
    pub fn new(id: UnitId, template: Arc<UnitTemplate>, level: u32, team: Team, position: Vec2) -> Self {
        let stats = derive_stats(&template, level);
        let skills = template.skills.iter().cloned().map(SkillInstance::new).collect();
        let facing = match team {
            Team::Ally => Facing::Right,
            Team::Enemy => Facing::Left,
        };

        Self {
            id,
            template,
            level,
            team,
            stats,
            health: stats.max_health,
            state: UnitState::Idle,
            position,
            facing,
            target: None,
            combat: CombatController::new(),
            skills,
            activating_skill: false,
            pending_effect: None,
            leap: None,
            battle_start_fired: false,
            retired: false,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn template(&self) -> &Arc<UnitTemplate> {
        &self.template
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    /// Log identity, e.g. "Ally Knight #0".
    pub fn display_id(&self) -> String {
        format!("{} {} {}", self.team.name(), self.template.name, self.id)
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn stats(&self) -> &CombatStats {
        &self.stats
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.stats.max_health
    }

    pub fn health_ratio(&self) -> f32 {
        if self.stats.max_health > 0.0 {
            self.health / self.stats.max_health
        } else {
            0.0
        }
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn is_dead(&self) -> bool {
        self.state == UnitState::Dead
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    /// Dead and done with its death animation.
    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Launch point of this unit's projectiles.
    pub fn fire_position(&self) -> Vec2 {
        self.position + self.template.fire_offset()
    }

    /// Point projectiles aimed at this unit fly to.
    pub fn hit_position(&self) -> Vec2 {
        self.position + self.template.hit_offset()
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn target(&self) -> Option<UnitId> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<UnitId>) {
        self.target = target;
    }

    pub fn combat_phase(&self) -> CombatPhase {
        self.combat.phase()
    }

    pub fn is_attacking(&self) -> bool {
        self.combat.is_attacking()
    }

    pub fn is_activating_skill(&self) -> bool {
        self.activating_skill
    }

    pub fn skills(&self) -> &[SkillInstance] {
        &self.skills
    }

    pub fn pending_effect(&self) -> Option<&PendingSkillEffect> {
        self.pending_effect.as_ref()
    }

    pub fn leap(&self) -> Option<&LeapMotion> {
        self.leap.as_ref()
    }

    /// Snapshot for targeting queries.
    pub fn view(&self) -> UnitView {
        UnitView {
            id: self.id,
            team: self.team,
            position: self.position,
            hit_position: self.hit_position(),
            health: self.health,
            max_health: self.stats.max_health,
            alive: self.is_alive(),
        }
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Change state. Dead units only accept `Dead`. Moving in or out of
    /// `Move` toggles the movement animation.
    pub fn set_state(&mut self, state: UnitState, cues: &mut Vec<UnitCue>) {
        if self.is_dead() && state != UnitState::Dead {
            return;
        }
        let previous = self.state;
        self.state = state;
        if previous != state {
            cues.push(UnitCue::Moving(state == UnitState::Move));
        }
    }

    fn face_toward(&mut self, point: Vec2, cues: &mut Vec<UnitCue>) {
        let facing = Facing::toward(self.position, point, self.facing);
        if facing != self.facing {
            self.facing = facing;
            cues.push(UnitCue::Faced(facing));
        }
    }

    // ========================================================================
    // Per-tick AI
    // ========================================================================

    /// Run one simulation tick for this unit.
    ///
    /// The roster is the battle's snapshot; this unit's own entry is
    /// refreshed after any leap movement so skills see where it really is.
    pub fn update_ai(&mut self, dt: f32, roster: &mut Roster, cues: &mut Vec<UnitCue>) {
        if self.is_dead() {
            return;
        }

        self.advance_leap(dt, cues);
        roster.refresh(self.view());

        for skill in &mut self.skills {
            skill.update_cooldown(dt);
        }
        self.try_activate_skill(roster, cues);

        self.update_target(roster);
        let Some(target) = self.target.and_then(|id| roster.live(id)).copied() else {
            self.target = None;
            self.set_state(UnitState::Idle, cues);
            return;
        };

        if self.activating_skill {
            return;
        }

        match self.state {
            UnitState::Idle | UnitState::Move => self.update_movement(dt, &target, cues),
            UnitState::Attack => self.update_combat(dt, &target, cues),
            UnitState::Dead => {}
        }
    }

    /// Keep the current target if it is still alive, else take the nearest
    /// live opponent.
    pub fn update_target(&mut self, roster: &Roster) {
        if self.target.and_then(|id| roster.live(id)).is_some() {
            return;
        }
        self.target = find_nearest_in_range(self.position, roster.opponents_of(self.team), f32::INFINITY)
            .map(|v| v.id);
    }

    fn update_movement(&mut self, dt: f32, target: &UnitView, cues: &mut Vec<UnitCue>) {
        match seek(self.position, target.position, self.stats.move_speed, self.stats.attack_range, dt) {
            Seek::InRange => self.set_state(UnitState::Attack, cues),
            Seek::Moved { position, .. } => {
                self.set_state(UnitState::Move, cues);
                self.face_toward(target.position, cues);
                self.position = position;
            }
        }
    }

    fn update_combat(&mut self, dt: f32, target: &UnitView, cues: &mut Vec<UnitCue>) {
        match self.combat.update(dt, &self.stats, self.position, target) {
            CombatStep::OutOfRange => self.set_state(UnitState::Move, cues),
            CombatStep::Committed(target) => cues.push(UnitCue::AttackCommitted {
                target,
                attack_type: self.template.attack_type,
            }),
            CombatStep::Busy | CombatStep::Waiting => {}
        }
    }

    // ========================================================================
    // Skills
    // ========================================================================

    /// Activate the first triggered skill, if the unit is free to.
    pub fn try_activate_skill(&mut self, roster: &Roster, cues: &mut Vec<UnitCue>) -> bool {
        if self.is_dead() || self.activating_skill || self.combat.is_attacking() {
            return false;
        }

        let ratio = self.health_ratio();
        match self.skills.iter().position(|s| s.check_trigger(ratio)) {
            Some(index) => self.activate_skill(index, roster, cues),
            None => false,
        }
    }

    /// Fire the first `BattleStart` skill. Only the first call per unit does
    /// anything.
    pub fn trigger_battle_start(&mut self, roster: &Roster, cues: &mut Vec<UnitCue>) -> bool {
        if self.battle_start_fired || self.is_dead() || self.activating_skill {
            return false;
        }
        self.battle_start_fired = true;

        match self
            .skills
            .iter()
            .position(|s| s.template().trigger == TriggerType::BattleStart)
        {
            Some(index) => self.activate_skill(index, roster, cues),
            None => false,
        }
    }

    fn activate_skill(&mut self, index: usize, roster: &Roster, cues: &mut Vec<UnitCue>) -> bool {
        let Some(skill) = self.skills.get(index).map(|s| Arc::clone(s.shared_template())) else {
            return false;
        };

        self.activating_skill = true;
        self.combat.cancel();

        let caster = self.view();
        let Some(cast) = plan_cast(
            &caster,
            self.fire_position(),
            self.template.projectile.as_ref(),
            roster,
            &skill,
        ) else {
            // Cooldown untouched: the skill retries next tick.
            self.activating_skill = false;
            debug!("{} found no target for {}", self.display_id(), skill.name);
            return false;
        };

        let hit_count = cast.pending.as_ref().map_or(0, |p| p.remaining_hits);
        self.pending_effect = cast.pending;
        self.skills[index].reset_cooldown();

        cues.push(UnitCue::SkillCast {
            skill: skill.name.clone(),
            primary: cast.primary,
            targets: cast.targets,
            hit_count,
        });

        let primary = if cast.primary == self.id {
            Some(caster)
        } else {
            roster.get(cast.primary).copied()
        };

        match execute_behavior(&skill, self.position, primary.as_ref()) {
            BehaviorAction::Animate(Some(trigger)) => cues.push(UnitCue::SkillAnimation(trigger)),
            BehaviorAction::Animate(None) => {}
            BehaviorAction::Leap(motion) => {
                cues.push(UnitCue::Leap(motion.clone()));
                self.leap = Some(motion);
            }
            BehaviorAction::RepeatedAttack {
                attack_count,
                speed_multiplier,
            } => cues.push(UnitCue::RepeatedAttack {
                attack_type: self.template.attack_type,
                count: attack_count,
                speed_multiplier,
            }),
            BehaviorAction::Complete => self.finish_skill(cues),
        }

        if !skill.behavior.handles_completion() {
            self.activating_skill = false;
        }
        true
    }

    fn advance_leap(&mut self, dt: f32, cues: &mut Vec<UnitCue>) {
        let Some(leap) = self.leap.as_mut() else {
            return;
        };
        let finished = leap.advance(dt);
        self.position = leap.position();
        if finished {
            self.finish_skill(cues);
        }
    }

    fn finish_skill(&mut self, cues: &mut Vec<UnitCue>) {
        self.leap = None;
        if self.activating_skill {
            self.activating_skill = false;
            cues.push(UnitCue::SkillCompleted);
        }
    }

    /// Completion signal for behaviors that own it.
    pub fn on_skill_complete(&mut self) {
        self.leap = None;
        self.activating_skill = false;
    }

    /// Take one hit of the pending skill effect. `None` if there is nothing
    /// left to apply or this unit is dead.
    pub fn consume_skill_hit(&mut self) -> Option<SkillHit> {
        if self.is_dead() {
            return None;
        }
        let pending = self.pending_effect.as_mut()?;
        let hit = pending.consume_hit();
        if !pending.is_valid() {
            self.pending_effect = None;
        }
        hit
    }

    // ========================================================================
    // Basic Attack
    // ========================================================================

    /// Resolve the in-flight basic attack. Returns its stored target; the
    /// caller drops the hit if that target is no longer alive.
    pub fn resolve_attack_hit(&mut self) -> Option<UnitId> {
        if self.is_dead() {
            return None;
        }
        self.combat.resolve_hit()
    }

    /// Abort the in-flight basic attack without damage.
    pub fn cancel_attack(&mut self) {
        self.combat.cancel();
    }

    /// Attack animation ended. Aborts the swing if its hit never fired.
    pub fn on_attack_end(&mut self) -> bool {
        if self.combat.is_attacking() {
            self.combat.cancel();
            true
        } else {
            false
        }
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Apply damage. No effect on a dead unit.
    pub fn take_damage(&mut self, amount: f32, cues: &mut Vec<UnitCue>) -> Option<DamageTaken> {
        if self.is_dead() {
            return None;
        }

        let amount = amount.max(0.0);
        let before = self.health;
        self.health = (self.health - amount).max(0.0);

        let killed = self.health <= 0.0;
        if killed {
            self.die(cues);
        }

        Some(DamageTaken {
            amount,
            applied: before - self.health,
            killed,
        })
    }

    /// Restore health up to max. Returns the amount actually healed.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.is_dead() {
            return 0.0;
        }
        let before = self.health;
        self.health = (self.health + amount.max(0.0)).min(self.stats.max_health);
        self.health - before
    }

    fn die(&mut self, cues: &mut Vec<UnitCue>) {
        self.health = 0.0;
        self.state = UnitState::Dead;
        self.target = None;
        self.combat.cancel();
        self.activating_skill = false;
        self.pending_effect = None;
        self.leap = None;
        cues.push(UnitCue::Died);
    }

    /// Death animation finished. Returns true the first time only.
    pub fn on_death_animation_complete(&mut self) -> bool {
        if self.is_dead() && !self.retired {
            self.retired = true;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::data::{EffectType, LeapBehavior, SkillBehavior, SkillTemplate, TargetType};

    fn unit(id: u32, team: Team, x: f32) -> Unit {
        Unit::new(UnitId(id), Arc::new(UnitTemplate::new("grunt")), 1, team, Vec2::new(x, 0.0))
    }

    fn roster_of(units: &[&Unit]) -> Roster {
        Roster::new(units.iter().map(|u| u.view()).collect())
    }

    #[test]
    fn test_damage_clamps_and_kills_once() {
        let mut u = unit(0, Team::Ally, 0.0);
        let mut cues = Vec::new();

        let taken = u.take_damage(250.0, &mut cues).unwrap();
        assert!(taken.killed);
        assert_eq!(taken.applied, 100.0);
        assert_eq!(u.health(), 0.0);
        assert_eq!(u.state(), UnitState::Dead);
        assert_eq!(cues, vec![UnitCue::Died]);

        cues.clear();
        assert!(u.take_damage(10.0, &mut cues).is_none());
        assert!(cues.is_empty());
        assert_eq!(u.health(), 0.0);
    }

    #[test]
    fn test_heal_reports_clamped_amount() {
        let mut u = unit(0, Team::Ally, 0.0);
        let mut cues = Vec::new();
        u.take_damage(30.0, &mut cues);

        assert_eq!(u.heal(50.0), 30.0);
        assert_eq!(u.health(), 100.0);

        u.take_damage(100.0, &mut cues);
        assert_eq!(u.heal(50.0), 0.0);
        assert_eq!(u.health(), 0.0);
    }

    #[test]
    fn test_dead_unit_ignores_state_changes() {
        let mut u = unit(0, Team::Ally, 0.0);
        let mut cues = Vec::new();
        u.take_damage(100.0, &mut cues);
        u.set_state(UnitState::Move, &mut cues);
        assert_eq!(u.state(), UnitState::Dead);
    }

    #[test]
    fn test_walks_then_attacks() {
        let mut ally = unit(0, Team::Ally, 0.0);
        let enemy = unit(1, Team::Enemy, 3.0);
        let mut roster = roster_of(&[&ally, &enemy]);
        let mut cues = Vec::new();

        ally.update_ai(0.1, &mut roster, &mut cues);
        assert_eq!(ally.state(), UnitState::Move);
        assert_eq!(ally.target(), Some(UnitId(1)));
        assert!((ally.position().x - 0.3).abs() < 1e-5);

        // Close the gap and arrive in range
        let mut ticks = 0;
        while ally.state() != UnitState::Attack && ticks < 100 {
            ally.update_ai(0.1, &mut roster, &mut cues);
            ticks += 1;
        }
        assert_eq!(ally.state(), UnitState::Attack);

        cues.clear();
        ally.update_ai(0.1, &mut roster, &mut cues);
        assert!(cues.contains(&UnitCue::AttackCommitted {
            target: UnitId(1),
            attack_type: Default::default(),
        }));
        assert!(ally.is_attacking());
    }

    #[test]
    fn test_idle_without_target() {
        let mut ally = unit(0, Team::Ally, 0.0);
        let mut roster = roster_of(&[&ally]);
        let mut cues = Vec::new();
        ally.set_state(UnitState::Move, &mut cues);

        ally.update_ai(0.1, &mut roster, &mut cues);
        assert_eq!(ally.state(), UnitState::Idle);
        assert_eq!(ally.target(), None);
    }

    #[test]
    fn test_attack_end_aborts_unresolved_swing() {
        let mut ally = unit(0, Team::Ally, 0.0);
        let enemy = unit(1, Team::Enemy, 1.0);
        let mut roster = roster_of(&[&ally, &enemy]);
        let mut cues = Vec::new();

        ally.update_ai(0.1, &mut roster, &mut cues);
        ally.update_ai(0.1, &mut roster, &mut cues);
        assert!(ally.is_attacking());

        assert!(ally.on_attack_end());
        assert!(!ally.is_attacking());
        assert_eq!(ally.resolve_attack_hit(), None);
        assert!(!ally.on_attack_end());
    }

    fn caster_with(skill: SkillTemplate) -> Unit {
        let mut template = UnitTemplate::new("caster");
        template.skills.push(Arc::new(skill));
        Unit::new(UnitId(0), Arc::new(template), 1, Team::Ally, Vec2::ZERO)
    }

    #[test]
    fn test_skill_without_target_keeps_cooldown() {
        let mut skill = SkillTemplate::new("snipe");
        skill.range = 2.0;
        let mut caster = caster_with(skill);
        let enemy = unit(1, Team::Enemy, 10.0);
        let roster = roster_of(&[&caster, &enemy]);
        let mut cues = Vec::new();

        assert!(!caster.try_activate_skill(&roster, &mut cues));
        assert!(!caster.is_activating_skill());
        assert!(caster.skills()[0].is_ready());
    }

    #[test]
    fn test_skill_preempts_attack() {
        let mut skill = SkillTemplate::new("bash");
        skill.effect = EffectType::Damage;
        skill.params.insert("damage".to_string(), 25.0);
        let mut caster = caster_with(skill);
        // Put the skill on cooldown so the first swing goes out
        caster.skills[0].reset_cooldown();

        let enemy = unit(1, Team::Enemy, 1.0);
        let mut roster = roster_of(&[&caster, &enemy]);
        let mut cues = Vec::new();
        caster.update_ai(0.1, &mut roster, &mut cues);
        caster.update_ai(0.1, &mut roster, &mut cues);
        assert!(caster.is_attacking());

        // Ready again, but the swing in flight blocks activation
        caster.skills[0].update_cooldown(10.0);
        assert!(!caster.try_activate_skill(&roster, &mut cues));

        caster.resolve_attack_hit();
        assert!(caster.try_activate_skill(&roster, &mut cues));
        assert!(!caster.is_attacking());
        assert!(!caster.is_activating_skill());
        assert_eq!(caster.pending_effect().map(|p| p.remaining_hits), Some(1));
        assert_eq!(caster.skills()[0].current_cooldown(), 5.0);
    }

    #[test]
    fn test_skill_hits_are_consumed() {
        let mut skill = SkillTemplate::new("double tap");
        skill.effect = EffectType::Damage;
        skill.hit_count = 2;
        let mut caster = caster_with(skill);
        let enemy = unit(1, Team::Enemy, 1.0);
        let roster = roster_of(&[&caster, &enemy]);
        let mut cues = Vec::new();

        assert!(caster.try_activate_skill(&roster, &mut cues));
        assert!(caster.consume_skill_hit().is_some());
        assert!(caster.consume_skill_hit().is_some());
        assert!(caster.consume_skill_hit().is_none());
        assert!(caster.pending_effect().is_none());
    }

    #[test]
    fn test_leap_owns_completion_and_moves_caster() {
        let mut skill = SkillTemplate::new("leap");
        skill.range = 20.0;
        skill.behavior = SkillBehavior::Leap(LeapBehavior::default());
        let mut caster = caster_with(skill);
        let enemy = unit(1, Team::Enemy, 10.0);
        let mut roster = roster_of(&[&caster, &enemy]);
        let mut cues = Vec::new();

        caster.update_ai(0.01, &mut roster, &mut cues);
        assert!(caster.is_activating_skill());
        assert!(caster.leap().is_some());

        for _ in 0..100 {
            caster.update_ai(0.01, &mut roster, &mut cues);
        }
        assert!(!caster.is_activating_skill());
        assert!(cues.contains(&UnitCue::SkillCompleted));
        // Landed 1.5 short of the target, then walked into attack range
        assert!(caster.position().x >= 8.5 - 1e-3);
    }

    #[test]
    fn test_battle_start_fires_once() {
        let mut skill = SkillTemplate::new("rally");
        skill.trigger = TriggerType::BattleStart;
        skill.target = TargetType::SelfOnly;
        skill.effect = EffectType::Heal;
        let mut caster = caster_with(skill);
        let roster = roster_of(&[&caster]);
        let mut cues = Vec::new();

        assert!(!caster.try_activate_skill(&roster, &mut cues));
        assert!(caster.trigger_battle_start(&roster, &mut cues));
        assert!(!caster.trigger_battle_start(&roster, &mut cues));
    }

    #[test]
    fn test_death_retires_once() {
        let mut u = unit(0, Team::Enemy, 0.0);
        assert!(!u.on_death_animation_complete());
        let mut cues = Vec::new();
        u.take_damage(100.0, &mut cues);
        assert!(u.on_death_animation_complete());
        assert!(u.is_retired());
        assert!(!u.on_death_animation_complete());
    }
}
