//! Headless match execution
//!
//! Runs battles without any graphical output, either as a plain fixed-step
//! loop (as fast as possible) or inside a minimal bevy app ticking at 60 Hz.

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::battle::config::{load_databases, PartyMember, StageData, StageDatabase, UnitDatabase};
use crate::battle::data::Team;
use crate::battle::orchestrator::{Battle, BattleResult};
use crate::battle::unit::Unit;
use crate::combat::log::{CombatantMetadata, MatchMetadata};
use crate::combat::SimulationSpeed;
use crate::error::{ConfigError, Result};

use super::config::HeadlessMatchConfig;
use super::feedback::{FloatingNumbers, GameRng};
use super::presenter::{AnimationSignal, HeadlessPresenter};

/// Result of a completed headless match
///
/// This struct provides programmatic access to match results for testing and analysis.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// Victory or defeat, or None for a draw (timeout)
    pub result: Option<BattleResult>,
    /// Gold earned (0 unless victorious)
    pub reward: u32,
    /// Simulated seconds until the battle ended or timed out
    pub elapsed: f32,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
    pub units: Vec<UnitResult>,
}

impl MatchResult {
    pub fn is_draw(&self) -> bool {
        self.result.is_none()
    }

    pub fn team(&self, team: Team) -> impl Iterator<Item = &UnitResult> {
        self.units.iter().filter(move |u| u.team == team)
    }
}

/// Statistics for a single unit after the match
#[derive(Debug, Clone, Serialize)]
pub struct UnitResult {
    /// Combat log id, e.g. "Ally Knight #0"
    pub id: String,
    /// Unit template id
    pub unit: String,
    pub team: Team,
    pub level: u32,
    pub max_health: f32,
    /// Health remaining at match end (0 if dead)
    pub final_health: f32,
    pub survived: bool,
    pub damage_dealt: f32,
    pub damage_taken: f32,
}

// ============================================================================
// Match Driver
// ============================================================================

/// A battle wired to the scripted animation layer.
pub struct HeadlessMatch {
    battle: Battle<HeadlessPresenter, FloatingNumbers>,
    max_duration: f32,
    timed_out: bool,
}

impl HeadlessMatch {
    pub fn new(config: &HeadlessMatchConfig) -> Self {
        let presenter = HeadlessPresenter::new(config.timings);
        let feedback = FloatingNumbers::new(GameRng::new(config.random_seed));
        Self {
            battle: Battle::with_feedback(presenter, feedback),
            max_duration: config.max_duration_secs,
            timed_out: false,
        }
    }

    /// Build a match for `config` and start it.
    pub fn prepare(config: &HeadlessMatchConfig, units: &UnitDatabase, stages: &StageDatabase) -> Result<Self> {
        let stage = stages.require(&config.stage)?;
        for member in config.party.iter().flatten() {
            units.require(&member.unit)?;
        }

        let mut headless = Self::new(config);
        if !headless.start(stage, &config.party, units) {
            return Err(ConfigError::Invalid(format!("could not start stage '{}'", stage.id)));
        }
        Ok(headless)
    }

    pub fn start(&mut self, stage: &StageData, party: &[Option<PartyMember>], units: &UnitDatabase) -> bool {
        self.timed_out = false;
        self.battle.start_battle(stage, party, units)
    }

    pub fn battle(&self) -> &Battle<HeadlessPresenter, FloatingNumbers> {
        &self.battle
    }

    pub fn battle_mut(&mut self) -> &mut Battle<HeadlessPresenter, FloatingNumbers> {
        &mut self.battle
    }

    pub fn is_finished(&self) -> bool {
        self.timed_out || self.battle.outcome().is_some()
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Deliver the animation signals due within `dt`, then tick the battle.
    pub fn step(&mut self, dt: f32) {
        if self.is_finished() {
            return;
        }

        for signal in self.battle.presenter_mut().advance(dt) {
            self.deliver(signal);
        }
        self.battle.tick(dt);

        if self.battle.outcome().is_none() && self.battle.elapsed() >= self.max_duration {
            info!("Match timed out after {:.1}s - declaring DRAW", self.battle.elapsed());
            self.timed_out = true;
        }
    }

    fn deliver(&mut self, signal: AnimationSignal) {
        match signal {
            AnimationSignal::AttackHit(unit) => self.battle.on_attack_hit_confirmed(unit),
            AnimationSignal::AttackEnd(unit) => self.battle.on_attack_end(unit),
            AnimationSignal::SkillHit(unit) => self.battle.on_skill_hit_confirmed(unit),
            AnimationSignal::SkillComplete(unit) => self.battle.on_skill_complete(unit),
            AnimationSignal::DeathComplete(unit) => self.battle.on_death_animation_complete(unit),
        }
    }

    /// Run fixed steps until the battle ends or times out.
    pub fn run_to_end(&mut self, fixed_step: f32) {
        while !self.is_finished() {
            self.step(fixed_step);
        }
    }

    pub fn result(&self) -> MatchResult {
        let outcome = self.battle.outcome();
        MatchResult {
            result: outcome.map(|o| o.result),
            reward: outcome.map_or(0, |o| o.reward),
            elapsed: outcome.map_or(self.battle.elapsed(), |o| o.elapsed),
            random_seed: self.battle.feedback().seed(),
            units: self.battle.all_units().iter().map(|u| self.unit_result(u)).collect(),
        }
    }

    fn unit_result(&self, unit: &Unit) -> UnitResult {
        let id = unit.display_id();
        let log = self.battle.log();
        UnitResult {
            unit: unit.template().id.clone(),
            team: unit.team(),
            level: unit.level(),
            max_health: unit.max_health(),
            final_health: unit.health(),
            survived: unit.is_alive(),
            damage_dealt: log.total_damage_dealt(&id),
            damage_taken: log.total_damage_taken(&id),
            id,
        }
    }

    /// Metadata for the saved combat log.
    pub fn metadata(&self) -> MatchMetadata {
        let result = match self.battle.outcome() {
            Some(outcome) => format!("{:?}", outcome.result),
            None => "Draw".to_string(),
        };
        let log = self.battle.log();
        let combatant = |unit: &Unit| {
            let id = unit.display_id();
            CombatantMetadata {
                unit: unit.template().id.clone(),
                level: unit.level(),
                max_health: unit.max_health(),
                final_health: unit.health(),
                damage_dealt: log.total_damage_dealt(&id),
                damage_taken: log.total_damage_taken(&id),
                final_position: (unit.position().x, unit.position().y),
                id,
            }
        };

        MatchMetadata {
            stage_name: self.battle.stage().map_or_else(String::new, |s| s.name.clone()),
            result,
            reward: self.battle.outcome().map_or(0, |o| o.reward),
            duration: self.battle.elapsed(),
            allies: self.battle.allies().map(combatant).collect(),
            enemies: self.battle.enemies().map(combatant).collect(),
        }
    }

    /// Save the combat log to a file
    pub fn save_log(&self, output_path: Option<&str>) {
        match self.battle.log().save_to_file(&self.metadata(), output_path) {
            Ok(filename) => {
                println!("Match complete. Log saved to: {}", filename);
            }
            Err(e) => {
                eprintln!("Failed to save combat log: {}", e);
            }
        }
    }
}

/// Play a whole match with the fixed-step loop. Nothing is written to disk.
pub fn simulate_match(config: &HeadlessMatchConfig, units: &UnitDatabase, stages: &StageDatabase) -> Result<MatchResult> {
    let mut headless = HeadlessMatch::prepare(config, units, stages)?;
    headless.run_to_end(config.fixed_step);
    Ok(headless.result())
}

// ============================================================================
// Realtime App
// ============================================================================

/// Resource shared between the bevy app and the caller that built it
#[derive(Resource)]
struct RealtimeMatch {
    headless: Arc<Mutex<HeadlessMatch>>,
    fixed_step: f32,
    accumulator: f32,
}

/// Plugin for headless match execution at wall-clock speed
struct HeadlessPlugin {
    headless: Arc<Mutex<HeadlessMatch>>,
    fixed_step: f32,
    speed: SimulationSpeed,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(RealtimeMatch {
            headless: Arc::clone(&self.headless),
            fixed_step: self.fixed_step,
            accumulator: 0.0,
        })
        .insert_resource(self.speed)
        .add_systems(Update, headless_step_match)
        .add_systems(PostUpdate, headless_exit_on_complete);
    }
}

/// Feed frame time into the match in fixed steps
fn headless_step_match(time: Res<Time>, speed: Res<SimulationSpeed>, mut state: ResMut<RealtimeMatch>) {
    let state = &mut *state;
    state.accumulator += speed.scale(time.delta_secs());

    let mut headless = state.headless.lock().unwrap_or_else(PoisonError::into_inner);
    while state.accumulator >= state.fixed_step && !headless.is_finished() {
        headless.step(state.fixed_step);
        state.accumulator -= state.fixed_step;
    }
}

/// Exit the app when the match is complete
fn headless_exit_on_complete(state: Res<RealtimeMatch>, mut exit: EventWriter<AppExit>) {
    let finished = state
        .headless
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .is_finished();
    if finished {
        exit.send(AppExit::Success);
    }
}

fn run_realtime(headless: HeadlessMatch, fixed_step: f32, speed: SimulationSpeed) -> Arc<Mutex<HeadlessMatch>> {
    let shared = Arc::new(Mutex::new(headless));

    App::new()
        // Minimal plugins - no window, no rendering
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 60.0,
            ))),
        )
        .add_plugins(LogPlugin::default())
        .add_plugins(HeadlessPlugin {
            headless: Arc::clone(&shared),
            fixed_step,
            speed,
        })
        .run();

    shared
}

fn report(headless: &HeadlessMatch, output_path: Option<&str>) -> MatchResult {
    let result = headless.result();
    match result.result {
        Some(BattleResult::Victory) => println!("Match ended! Victory (reward {} gold)", result.reward),
        Some(_) => println!("Match ended! Defeat"),
        None => println!("Match ended in a DRAW (timeout)"),
    }
    headless.save_log(output_path);
    result
}

/// Run a headless match with the given configuration and save its combat log.
///
/// With `realtime` set the match plays inside a bevy app at that speed;
/// otherwise it runs as fast as possible.
pub fn run_headless_match(config: HeadlessMatchConfig, realtime: Option<SimulationSpeed>) -> Result<MatchResult> {
    if realtime.is_some_and(|speed| speed.is_paused()) {
        return Err(ConfigError::Invalid("realtime speed must be positive".to_string()));
    }

    println!("Starting headless match simulation...");
    println!("  Stage: {}", config.stage);
    for (slot, member) in config.party.iter().enumerate() {
        if let Some(member) = member {
            println!("  Slot {}: {} (level {})", slot, member.unit, member.level);
        }
    }
    println!("  Max duration: {:.0}s", config.max_duration_secs);

    let (units, stages) = load_databases(&config.units_path, &config.stages_path)?;
    let mut headless = HeadlessMatch::prepare(&config, &units, &stages)?;

    if let Some(seed) = config.random_seed {
        info!("Using deterministic RNG with seed: {}", seed);
    }

    if let Some(speed) = realtime {
        let shared = run_realtime(headless, config.fixed_step, speed);
        let headless = shared.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(report(&headless, config.output_path.as_deref()))
    } else {
        headless.run_to_end(config.fixed_step);
        Ok(report(&headless, config.output_path.as_deref()))
    }
}
