//! JSON configuration parsing for headless mode
//!
//! A headless match names a stage, a party and the scripted animation timings
//! the headless presenter uses to confirm hits.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::battle::config::{PartyMember, DEFAULT_STAGES_PATH, DEFAULT_UNITS_PATH};
use crate::battle::constants::SPAWN_SLOTS_PER_TEAM;
use crate::error::{ConfigError, Result};

/// Headless match configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessMatchConfig {
    /// Stage id from the stages file
    pub stage: String,
    /// One entry per ally slot; `null` leaves the slot empty
    pub party: Vec<Option<PartyMember>>,
    /// Unit templates file (default: assets/config/units.ron)
    #[serde(default = "default_units_path")]
    pub units_path: PathBuf,
    /// Stages file (default: assets/config/stages.ron)
    #[serde(default = "default_stages_path")]
    pub stages_path: PathBuf,
    /// Custom output path for match log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// Maximum match duration in seconds before declaring a draw (default: 300)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Simulation step in seconds (default: 1/60)
    #[serde(default = "default_fixed_step")]
    pub fixed_step: f32,
    /// Random seed for reproducible floating-number jitter
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default)]
    pub timings: AnimationTimings,
}

/// Scripted animation lengths, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationTimings {
    /// Attack start to its hit frame
    pub attack_hit_delay: f32,
    /// Attack start to the end of its animation
    pub attack_end_delay: f32,
    /// Skill start to its first hit frame
    pub skill_hit_delay: f32,
    /// Gap between successive skill hits
    pub skill_hit_interval: f32,
    pub death_duration: f32,
    /// Gap between rapid-fire swings at speed multiplier 1
    pub repeated_attack_interval: f32,
}

impl Default for AnimationTimings {
    fn default() -> Self {
        Self {
            attack_hit_delay: 0.3,
            attack_end_delay: 0.5,
            skill_hit_delay: 0.4,
            skill_hit_interval: 0.2,
            death_duration: 1.0,
            repeated_attack_interval: 0.3,
        }
    }
}

impl AnimationTimings {
    fn validate(&self) -> Result<()> {
        let delays = [
            ("attack_hit_delay", self.attack_hit_delay),
            ("attack_end_delay", self.attack_end_delay),
            ("skill_hit_delay", self.skill_hit_delay),
            ("skill_hit_interval", self.skill_hit_interval),
            ("death_duration", self.death_duration),
            ("repeated_attack_interval", self.repeated_attack_interval),
        ];
        for (name, value) in delays {
            if !(value >= 0.0) {
                return Err(ConfigError::Invalid(format!("timings.{} must not be negative", name)));
            }
        }
        Ok(())
    }
}

fn default_units_path() -> PathBuf {
    PathBuf::from(DEFAULT_UNITS_PATH)
}

fn default_stages_path() -> PathBuf {
    PathBuf::from(DEFAULT_STAGES_PATH)
}

fn default_max_duration() -> f32 {
    300.0
}

fn default_fixed_step() -> f32 {
    1.0 / 60.0
}

impl HeadlessMatchConfig {
    pub fn new(stage: impl Into<String>, party: Vec<Option<PartyMember>>) -> Self {
        Self {
            stage: stage.into(),
            party,
            units_path: default_units_path(),
            stages_path: default_stages_path(),
            output_path: None,
            max_duration_secs: default_max_duration(),
            fixed_step: default_fixed_step(),
            random_seed: None,
            timings: AnimationTimings::default(),
        }
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: HeadlessMatchConfig = serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.stage.is_empty() {
            return Err(ConfigError::Invalid("stage must not be empty".to_string()));
        }
        if self.party.len() > SPAWN_SLOTS_PER_TEAM {
            return Err(ConfigError::Invalid(format!(
                "party has {} slots, at most {} are available",
                self.party.len(),
                SPAWN_SLOTS_PER_TEAM
            )));
        }
        if self.party.iter().all(Option::is_none) {
            return Err(ConfigError::Invalid("party must have at least one member".to_string()));
        }
        if !(self.max_duration_secs > 0.0) {
            return Err(ConfigError::Invalid("max_duration_secs must be positive".to_string()));
        }
        if !(self.fixed_step > 0.0) {
            return Err(ConfigError::Invalid("fixed_step must be positive".to_string()));
        }
        self.timings.validate()
    }
}
