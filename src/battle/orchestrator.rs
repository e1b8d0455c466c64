//! Battle Orchestrator
//!
//! Owns the roster, the projectile simulator and the combat log, and drives
//! one battle from start to its single finalization.
//!
//! ## Tick order
//! 1. Every unit alive at the start of the tick runs `update_ai`, in
//!    registration order, against a roster snapshot patched as units move.
//! 2. Projectiles advance and deliver their impacts.
//! 3. The battle result is checked; the first terminal result finalizes.
//!
//! Hits, animation ends, skill completion and death completion arrive later
//! through the `on_*` signal methods, called by whatever plays animations.

use bevy::log::{debug, error, info, warn};
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::config::{PartyMember, StageData, UnitDatabase};
use super::constants::BASIC_ATTACK_NAME;
use super::data::{Team, UnitTemplate};
use super::presenter::{DamageFeedback, PopupStyle, Presenter, SpawnPoints, SpawnProvider};
use super::projectiles::{ProjectileLaunch, ProjectilePayload, ProjectileSimulator};
use super::roster::{Roster, UnitId};
use super::unit::{DamageTaken, Unit};
use crate::combat::events::{BattleEvent, UnitCue};
use crate::combat::log::{CombatLog, CombatLogEventType};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattlePhase {
    #[default]
    Ready,
    Fighting,
    Ended,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleResult {
    #[default]
    InProgress,
    Victory,
    Defeat,
}

impl BattleResult {
    pub fn is_terminal(self) -> bool {
        self != BattleResult::InProgress
    }
}

/// Produced exactly once, when the battle ends.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleOutcome {
    pub result: BattleResult,
    /// Stage gold on victory, else 0
    pub reward: u32,
    /// Simulated seconds from start to finalization
    pub elapsed: f32,
}

pub struct Battle<P: Presenter = (), F: DamageFeedback = ()> {
    /// All units in registration order
    units: Vec<Unit>,
    allies: Vec<UnitId>,
    enemies: Vec<UnitId>,
    next_id: u32,
    projectiles: ProjectileSimulator,
    presenter: P,
    feedback: F,
    spawns: Box<dyn SpawnProvider + Send + Sync>,
    log: CombatLog,
    phase: BattlePhase,
    result: BattleResult,
    outcome: Option<BattleOutcome>,
    stage: Option<StageData>,
    elapsed: f32,
    events: Vec<BattleEvent>,
    /// Scratch buffer units emit cues into
    cues: Vec<UnitCue>,
}

impl<P: Presenter> Battle<P, ()> {
    /// Battle without damage feedback, using the default spawn points.
    pub fn new(presenter: P) -> Self {
        Battle::with_feedback(presenter, ())
    }
}

impl<P: Presenter, F: DamageFeedback> Battle<P, F> {
    pub fn with_feedback(presenter: P, feedback: F) -> Self {
        Self {
            units: Vec::new(),
            allies: Vec::new(),
            enemies: Vec::new(),
            next_id: 0,
            projectiles: ProjectileSimulator::new(),
            presenter,
            feedback,
            spawns: Box::new(SpawnPoints::default()),
            log: CombatLog::default(),
            phase: BattlePhase::Ready,
            result: BattleResult::InProgress,
            outcome: None,
            stage: None,
            elapsed: 0.0,
            events: Vec::new(),
            cues: Vec::new(),
        }
    }

    pub fn set_spawn_provider(&mut self, spawns: impl SpawnProvider + Send + Sync + 'static) {
        self.spawns = Box::new(spawns);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn feedback_mut(&mut self) -> &mut F {
        &mut self.feedback
    }

    pub fn log(&self) -> &CombatLog {
        &self.log
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn result(&self) -> BattleResult {
        self.result
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    pub fn stage(&self) -> Option<&StageData> {
        self.stage.as_ref()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn projectiles(&self) -> &ProjectileSimulator {
        &self.projectiles
    }

    pub fn all_units(&self) -> &[Unit] {
        &self.units
    }

    pub fn allies(&self) -> impl Iterator<Item = &Unit> {
        self.team_units(Team::Ally)
    }

    pub fn enemies(&self) -> impl Iterator<Item = &Unit> {
        self.team_units(Team::Enemy)
    }

    /// Units fighting against `team`.
    pub fn enemies_of(&self, team: Team) -> impl Iterator<Item = &Unit> {
        self.team_units(team.opponent())
    }

    fn team_units(&self, team: Team) -> impl Iterator<Item = &Unit> {
        let ids = match team {
            Team::Ally => &self.allies,
            Team::Enemy => &self.enemies,
        };
        ids.iter().filter_map(move |id| self.unit(*id))
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id() == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id() == id)
    }

    fn index_of(&self, id: UnitId) -> Option<usize> {
        self.units.iter().position(|u| u.id() == id)
    }

    fn live_index_of(&self, id: UnitId) -> Option<usize> {
        self.index_of(id).filter(|&i| self.units[i].is_alive())
    }

    fn is_unit_alive(&self, id: UnitId) -> bool {
        self.live_index_of(id).is_some()
    }

    fn display_id(&self, id: UnitId) -> String {
        self.unit(id).map_or_else(|| id.to_string(), Unit::display_id)
    }

    /// Snapshot of every registered unit.
    pub fn roster(&self) -> Roster {
        Roster::new(self.units.iter().map(Unit::view).collect())
    }

    /// Take the battle events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Roster
    // ========================================================================

    /// Fresh id for a unit about to be registered.
    pub fn next_unit_id(&mut self) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Register a unit in the roster. Registering an id that is already
    /// known does nothing.
    pub fn register_unit(&mut self, unit: Unit) -> UnitId {
        let id = unit.id();
        if self.index_of(id).is_some() {
            return id;
        }

        self.next_id = self.next_id.max(id.0 + 1);
        match unit.team() {
            Team::Ally => self.allies.push(id),
            Team::Enemy => self.enemies.push(id),
        }
        self.log.register_combatant(unit.display_id());
        self.units.push(unit);
        id
    }

    pub fn unregister_unit(&mut self, id: UnitId) -> Option<Unit> {
        let index = self.index_of(id)?;
        self.allies.retain(|a| *a != id);
        self.enemies.retain(|e| *e != id);
        Some(self.units.remove(index))
    }

    /// Build and register a unit at `position`.
    pub fn create_unit(&mut self, template: Arc<UnitTemplate>, level: u32, team: Team, position: Vec2) -> UnitId {
        let id = self.next_unit_id();
        self.register_unit(Unit::new(id, template, level, team, position))
    }

    /// Build and register a unit at a spawn slot. A missing template or an
    /// invalid slot is logged and spawns nothing.
    pub fn spawn_unit(
        &mut self,
        template: Option<&Arc<UnitTemplate>>,
        level: u32,
        team: Team,
        slot: usize,
    ) -> Option<UnitId> {
        let Some(template) = template else {
            error!("Cannot spawn {} unit in slot {}: no unit template", team.name(), slot);
            return None;
        };
        let Some(position) = self.spawns.spawn_position(team, slot) else {
            warn!(
                "Invalid {} spawn slot {} (0..{})",
                team.name(),
                slot,
                self.spawns.spawn_count(team)
            );
            return None;
        };
        Some(self.create_unit(Arc::clone(template), level, team, position))
    }

    /// Remove every unit and projectile and return to `Ready`.
    pub fn clear_all_units(&mut self) {
        self.units.clear();
        self.allies.clear();
        self.enemies.clear();
        self.next_id = 0;
        self.projectiles.clear();
        self.log.clear();
        self.phase = BattlePhase::Ready;
        self.result = BattleResult::InProgress;
        self.outcome = None;
        self.stage = None;
        self.elapsed = 0.0;
        self.events.clear();
        self.cues.clear();
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Spawn a stage's enemies and the party, then start fighting.
    ///
    /// Refused while a battle is already being fought, or when every party
    /// slot is empty.
    pub fn start_battle(&mut self, stage: &StageData, party: &[Option<PartyMember>], units: &UnitDatabase) -> bool {
        if self.phase == BattlePhase::Fighting {
            warn!("Battle already in progress; ignoring start of '{}'", stage.id);
            return false;
        }
        if party.iter().all(Option::is_none) {
            warn!("Cannot start '{}' with an empty party", stage.id);
            return false;
        }

        self.clear_all_units();
        self.stage = Some(stage.clone());

        for enemy in &stage.enemies {
            self.spawn_from_database(units, &enemy.unit, enemy.level, Team::Enemy, enemy.slot);
        }
        for (slot, member) in party.iter().enumerate() {
            if let Some(member) = member {
                self.spawn_from_database(units, &member.unit, member.level, Team::Ally, slot);
            }
        }

        info!(
            "Battle started: {} ({} allies vs {} enemies)",
            stage.name,
            self.allies.len(),
            self.enemies.len()
        );
        self.begin()
    }

    fn spawn_from_database(&mut self, units: &UnitDatabase, unit_id: &str, level: u32, team: Team, slot: usize) {
        let template = units.get(unit_id);
        if template.is_none() {
            warn!("Unknown unit '{}' for {} slot {}", unit_id, team.name(), slot);
        }
        self.spawn_unit(template, level, team, slot);
    }

    /// Enter `Fighting` with the current roster: fire battle-start skills and
    /// acquire initial targets.
    ///
    /// Only valid from `Ready`. An ended battle goes back to `Ready` through
    /// `start_battle` or `clear_all_units`.
    pub fn begin(&mut self) -> bool {
        match self.phase {
            BattlePhase::Ready => {}
            BattlePhase::Fighting => {
                warn!("Battle already in progress");
                return false;
            }
            BattlePhase::Ended => {
                warn!("Battle already ended; clear or start a new one first");
                return false;
            }
        }

        self.phase = BattlePhase::Fighting;
        self.result = BattleResult::InProgress;
        self.outcome = None;
        self.elapsed = 0.0;
        self.log.match_time = 0.0;
        self.log.log(
            CombatLogEventType::MatchEvent,
            format!("Battle started: {} allies vs {} enemies", self.allies.len(), self.enemies.len()),
        );

        let mut roster = self.roster();
        for index in 0..self.units.len() {
            let unit = &mut self.units[index];
            let id = unit.id();
            unit.trigger_battle_start(&roster, &mut self.cues);
            unit.update_target(&roster);
            roster.refresh(unit.view());
            self.flush_cues(id);
        }
        true
    }

    /// Advance the battle by `dt` seconds. Does nothing unless fighting.
    pub fn tick(&mut self, dt: f32) {
        if self.phase != BattlePhase::Fighting {
            return;
        }
        self.elapsed += dt;
        self.log.match_time = self.elapsed;

        let mut roster = self.roster();
        let live: Vec<UnitId> = self.units.iter().filter(|u| u.is_alive()).map(Unit::id).collect();
        for id in live {
            let Some(index) = self.live_index_of(id) else {
                continue;
            };
            let unit = &mut self.units[index];
            unit.update_ai(dt, &mut roster, &mut self.cues);
            roster.refresh(unit.view());
            self.flush_cues(id);
        }

        self.step_projectiles(dt);
        self.check_and_finalize();
    }

    /// Victory once every enemy is dead, else defeat once every ally is.
    pub fn check_battle_result(&self) -> BattleResult {
        if self.enemies.iter().all(|id| !self.is_unit_alive(*id)) {
            BattleResult::Victory
        } else if self.allies.iter().all(|id| !self.is_unit_alive(*id)) {
            BattleResult::Defeat
        } else {
            BattleResult::InProgress
        }
    }

    fn check_and_finalize(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        let result = self.check_battle_result();
        if result.is_terminal() {
            self.finalize(result);
        }
    }

    fn finalize(&mut self, result: BattleResult) {
        let reward = match (result, &self.stage) {
            (BattleResult::Victory, Some(stage)) => stage.gold_reward,
            _ => 0,
        };
        let outcome = BattleOutcome {
            result,
            reward,
            elapsed: self.elapsed,
        };

        self.phase = BattlePhase::Ended;
        self.result = result;
        self.outcome = Some(outcome);
        self.events.push(BattleEvent::Finished(outcome));

        for unit in self.units.iter().filter(|u| u.is_alive()) {
            self.presenter.set_moving(unit.id(), false);
        }

        let message = format!("Battle ended: {:?} after {:.1}s (reward {})", result, self.elapsed, reward);
        info!("{}", message);
        self.log.log(CombatLogEventType::MatchEvent, message);
    }

    // ========================================================================
    // Inbound Signals
    // ========================================================================

    /// The attack animation reached its hit frame.
    pub fn on_attack_hit_confirmed(&mut self, attacker: UnitId) {
        let Some(index) = self.index_of(attacker) else {
            return;
        };
        let Some(target) = self.units[index].resolve_attack_hit() else {
            return;
        };
        let Some(target_index) = self.live_index_of(target) else {
            debug!("{} attack hit dropped: target {} is gone", self.display_id(attacker), target);
            return;
        };

        let unit = &self.units[index];
        let damage = unit.stats().attack_damage;
        match unit.template().projectile.clone() {
            Some(profile) => {
                let launch = ProjectileLaunch {
                    source: Some(attacker),
                    target,
                    ability: BASIC_ATTACK_NAME.to_string(),
                    profile,
                    payload: ProjectilePayload::Damage(damage),
                    start: unit.fire_position(),
                    target_position: self.units[target_index].hit_position(),
                };
                self.launch_projectile(launch);
            }
            None => {
                self.apply_damage(Some(attacker), target, damage, BASIC_ATTACK_NAME);
            }
        }
    }

    /// The attack animation finished. Aborts a swing whose hit never fired.
    pub fn on_attack_end(&mut self, attacker: UnitId) {
        let aborted = self.unit_mut(attacker).is_some_and(Unit::on_attack_end);
        if aborted {
            debug!("{} attack ended without a hit", self.display_id(attacker));
        }
    }

    /// The skill animation reached a hit frame: apply one hit of the caster's
    /// pending effect.
    pub fn on_skill_hit_confirmed(&mut self, caster: UnitId) {
        let Some(index) = self.index_of(caster) else {
            return;
        };
        let Some(hit) = self.units[index].consume_skill_hit() else {
            return;
        };

        let payload = if hit.effect.is_damage() {
            ProjectilePayload::Damage(hit.magnitude)
        } else if hit.effect.is_heal() {
            ProjectilePayload::Heal(hit.magnitude)
        } else {
            return;
        };

        for &target in &hit.targets {
            let Some(target_index) = self.live_index_of(target) else {
                continue;
            };
            match &hit.projectile {
                Some(profile) => {
                    let launch = ProjectileLaunch {
                        source: Some(caster),
                        target,
                        ability: hit.skill_name.clone(),
                        profile: profile.clone(),
                        payload,
                        start: hit.origin,
                        target_position: self.units[target_index].hit_position(),
                    };
                    self.launch_projectile(launch);
                }
                None => self.deliver(Some(caster), target, payload, &hit.skill_name),
            }
        }
    }

    /// A behavior that owns completion has finished.
    pub fn on_skill_complete(&mut self, caster: UnitId) {
        if let Some(unit) = self.unit_mut(caster) {
            unit.on_skill_complete();
        }
    }

    /// The death animation finished; the unit is retired.
    pub fn on_death_animation_complete(&mut self, id: UnitId) {
        let retired = self.unit_mut(id).is_some_and(Unit::on_death_animation_complete);
        if retired {
            let message = format!("{} retired", self.display_id(id));
            self.log.log(CombatLogEventType::MatchEvent, message);
            self.events.push(BattleEvent::UnitRetired { unit: id });
        }
    }

    // ========================================================================
    // Effects
    // ========================================================================

    fn launch_projectile(&mut self, launch: ProjectileLaunch) {
        let message = format!(
            "{} launches {} at {}",
            launch.source.map_or_else(|| "Unknown".to_string(), |s| self.display_id(s)),
            launch.ability,
            self.display_id(launch.target)
        );
        let source = launch.source.map(|s| self.display_id(s));
        let target = self.display_id(launch.target);
        let ability = launch.ability.clone();

        if self.projectiles.fire(launch) {
            self.log.log_projectile(source, target, ability, message);
        }
    }

    fn step_projectiles(&mut self, dt: f32) {
        if self.projectiles.is_empty() {
            return;
        }
        let units = &self.units;
        let impacts = self
            .projectiles
            .step(dt, |id| units.iter().any(|u| u.id() == id && u.is_alive()));

        for impact in impacts {
            self.deliver(impact.source, impact.target, impact.payload, &impact.ability);
        }
    }

    fn deliver(&mut self, source: Option<UnitId>, target: UnitId, payload: ProjectilePayload, ability: &str) {
        match payload {
            ProjectilePayload::Damage(amount) => {
                self.apply_damage(source, target, amount, ability);
            }
            ProjectilePayload::Heal(amount) => {
                self.apply_heal(source, target, amount, ability);
            }
        }
    }

    /// Damage a unit, with hit flash, popup and log. `None` if the unit is
    /// unknown or already dead.
    pub fn apply_damage(&mut self, source: Option<UnitId>, target: UnitId, amount: f32, ability: &str) -> Option<DamageTaken> {
        let index = self.index_of(target)?;
        let taken = self.units[index].take_damage(amount, &mut self.cues)?;

        let (position, team) = (self.units[index].position(), self.units[index].team());
        self.presenter.play_hit_flash(target);
        self.feedback
            .show(position, taken.amount as i32, PopupStyle::for_damage(team));

        let source_name = source.map(|s| self.display_id(s));
        let target_name = self.display_id(target);
        let message = format!(
            "{}'s {} hits {} for {:.0} damage",
            source_name.as_deref().unwrap_or("Unknown"),
            ability,
            target_name,
            taken.applied
        );
        self.log.log_damage(
            source_name.clone(),
            target_name.clone(),
            ability.to_string(),
            taken.applied,
            taken.killed,
            message,
        );

        if taken.killed {
            let message = match &source_name {
                Some(killer) => format!("{} has been slain by {}", target_name, killer),
                None => format!("{} has died", target_name),
            };
            info!("{}", message);
            self.log.log_death(target_name, source_name, message);
            self.events.push(BattleEvent::UnitDied { unit: target, killer: source });
        }

        self.flush_cues(target);
        Some(taken)
    }

    /// Heal a unit, with popup and log. Returns the amount actually healed,
    /// or `None` if the unit is unknown or dead.
    pub fn apply_heal(&mut self, source: Option<UnitId>, target: UnitId, amount: f32, ability: &str) -> Option<f32> {
        let index = self.live_index_of(target)?;
        let healed = self.units[index].heal(amount);
        let position = self.units[index].position();
        self.feedback.show(position, healed as i32, PopupStyle::Heal);

        let source_name = source.map(|s| self.display_id(s));
        let target_name = self.display_id(target);
        let message = format!(
            "{}'s {} heals {} for {:.0}",
            source_name.as_deref().unwrap_or("Unknown"),
            ability,
            target_name,
            healed
        );
        self.log
            .log_healing(source_name, target_name, ability.to_string(), healed, message);
        Some(healed)
    }

    // ========================================================================
    // Cue Dispatch
    // ========================================================================

    fn flush_cues(&mut self, id: UnitId) {
        if self.cues.is_empty() {
            return;
        }
        let mut cues = std::mem::take(&mut self.cues);
        for cue in cues.drain(..) {
            self.dispatch_cue(id, cue);
        }
        self.cues = cues;
    }

    fn dispatch_cue(&mut self, id: UnitId, cue: UnitCue) {
        match cue {
            UnitCue::Moving(moving) => self.presenter.set_moving(id, moving),
            UnitCue::Faced(facing) => self.presenter.face(id, facing),
            UnitCue::AttackCommitted { target, attack_type } => {
                debug!("{} attacks {}", self.display_id(id), self.display_id(target));
                self.presenter.play_attack_animation(id, attack_type);
            }
            UnitCue::SkillCast {
                skill,
                primary,
                targets,
                hit_count,
            } => {
                let caster = self.display_id(id);
                let target = self.display_id(primary);
                let message = format!("{} uses {} on {} ({} targets)", caster, skill, target, targets.len());
                self.log.log_skill_used(caster, skill.clone(), Some(target), message);
                self.presenter.skill_cast(id, &skill, hit_count);
            }
            UnitCue::SkillAnimation(trigger) => self.presenter.play_skill_animation(id, &trigger),
            UnitCue::Leap(motion) => self.presenter.play_leap(id, &motion),
            UnitCue::RepeatedAttack {
                attack_type,
                count,
                speed_multiplier,
            } => self
                .presenter
                .play_repeated_attack(id, attack_type, count, speed_multiplier),
            UnitCue::SkillCompleted => debug!("{} finished its skill", self.display_id(id)),
            UnitCue::Died => self.presenter.play_death_animation(id),
        }
    }
}
