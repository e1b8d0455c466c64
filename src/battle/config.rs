//! Data Loading
//!
//! Unit templates and stages are loaded from RON files under `assets/config/`.
//! Everything is validated at load time so the simulation can trust its data.
//!
//! ## Files
//! - `units.ron`: `(units: [ (id: "knight", name: "Knight", ...), ... ])`,
//!   skills inline per unit
//! - `stages.ron`: `(stages: [ (id: "1-1", name: "...", enemies: [...]), ... ])`

use bevy::log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::constants::SPAWN_SLOTS_PER_TEAM;
use super::data::{ProjectileProfile, SkillTemplate, TriggerType, UnitTemplate};
use crate::error::{ConfigError, Result};

pub const DEFAULT_UNITS_PATH: &str = "assets/config/units.ron";
pub const DEFAULT_STAGES_PATH: &str = "assets/config/stages.ron";

fn read_ron<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_ron(&contents, path)
}

fn parse_ron<T: DeserializeOwned>(contents: &str, path: &Path) -> Result<T> {
    ron::from_str(contents).map_err(|source| ConfigError::Ron {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// Units
// ============================================================================

#[derive(Deserialize)]
struct UnitsFile {
    units: Vec<UnitTemplate>,
}

/// Every unit template, by id.
#[derive(Clone, Debug, Default)]
pub struct UnitDatabase {
    units: HashMap<String, Arc<UnitTemplate>>,
}

impl UnitDatabase {
    /// Build from templates, validating each. Duplicate ids are rejected.
    pub fn from_templates(templates: Vec<UnitTemplate>) -> Result<Self> {
        let mut units = HashMap::new();
        for template in templates {
            validate_unit(&template)?;
            let id = template.id.clone();
            if units.insert(id.clone(), Arc::new(template)).is_some() {
                return Err(ConfigError::Invalid(format!("duplicate unit id '{}'", id)));
            }
        }
        Ok(Self { units })
    }

    pub fn from_ron_str(contents: &str) -> Result<Self> {
        let file: UnitsFile = parse_ron(contents, Path::new("<inline units>"))?;
        Self::from_templates(file.units)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let file: UnitsFile = read_ron(path)?;
        let database = Self::from_templates(file.units)?;
        info!("Loaded {} unit templates from {}", database.len(), path.display());
        Ok(database)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<UnitTemplate>> {
        self.units.get(id)
    }

    /// Like `get`, but a missing id is an error.
    pub fn require(&self, id: &str) -> Result<&Arc<UnitTemplate>> {
        self.get(id).ok_or_else(|| ConfigError::UnknownUnit(id.to_string()))
    }

    /// Unit ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.units.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

fn validate_projectile(owner: &str, projectile: &ProjectileProfile) -> Result<()> {
    if projectile.speed <= 0.0 {
        return Err(ConfigError::Invalid(format!(
            "{}: projectile speed must be positive, got {}",
            owner, projectile.speed
        )));
    }
    Ok(())
}

fn validate_unit(unit: &UnitTemplate) -> Result<()> {
    let invalid = |what: &str, value: f32| {
        Err(ConfigError::Invalid(format!(
            "unit '{}': {} must be positive, got {}",
            unit.id, what, value
        )))
    };

    if unit.base_health <= 0.0 {
        return invalid("base_health", unit.base_health);
    }
    if unit.base_attack_speed <= 0.0 {
        return invalid("base_attack_speed", unit.base_attack_speed);
    }
    if unit.base_move_speed <= 0.0 {
        return invalid("base_move_speed", unit.base_move_speed);
    }
    if unit.base_attack_range <= 0.0 {
        return invalid("base_attack_range", unit.base_attack_range);
    }
    if unit.base_attack_damage < 0.0 {
        return Err(ConfigError::Invalid(format!(
            "unit '{}': base_attack_damage must not be negative",
            unit.id
        )));
    }
    if let Some(projectile) = &unit.projectile {
        validate_projectile(&format!("unit '{}'", unit.id), projectile)?;
    }

    for skill in &unit.skills {
        validate_skill(&unit.id, skill)?;
    }
    Ok(())
}

fn validate_skill(unit_id: &str, skill: &SkillTemplate) -> Result<()> {
    let owner = format!("unit '{}' skill '{}'", unit_id, skill.id);

    if skill.cooldown < 0.0 {
        return Err(ConfigError::Invalid(format!("{}: cooldown must not be negative", owner)));
    }
    if skill.hit_count == 0 {
        return Err(ConfigError::Invalid(format!("{}: hit_count must be at least 1", owner)));
    }
    if skill.range < 0.0 || skill.effect_radius < 0.0 {
        return Err(ConfigError::Invalid(format!("{}: range and effect_radius must not be negative", owner)));
    }
    if matches!(skill.trigger, TriggerType::HpBelow | TriggerType::HpAbove)
        && !(0.0..=1.0).contains(&skill.trigger_value)
    {
        return Err(ConfigError::Invalid(format!(
            "{}: trigger_value must be within 0.0..=1.0, got {}",
            owner, skill.trigger_value
        )));
    }
    if let Some(projectile) = &skill.projectile {
        validate_projectile(&owner, projectile)?;
    }
    Ok(())
}

// ============================================================================
// Stages
// ============================================================================

fn default_level() -> u32 {
    1
}

/// One enemy placed by a stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawnInfo {
    /// Unit template id
    pub unit: String,
    #[serde(default = "default_level")]
    pub level: u32,
    /// Enemy spawn slot
    pub slot: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageData {
    pub id: String,
    pub name: String,
    pub enemies: Vec<EnemySpawnInfo>,
    #[serde(default)]
    pub recommended_power: u32,
    /// Gold awarded on victory
    #[serde(default)]
    pub gold_reward: u32,
}

/// A filled party slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartyMember {
    /// Unit template id
    pub unit: String,
    #[serde(default = "default_level")]
    pub level: u32,
}

impl PartyMember {
    pub fn new(unit: impl Into<String>, level: u32) -> Self {
        Self {
            unit: unit.into(),
            level,
        }
    }
}

#[derive(Deserialize)]
struct StagesFile {
    stages: Vec<StageData>,
}

/// Every stage, in file order.
#[derive(Clone, Debug, Default)]
pub struct StageDatabase {
    stages: Vec<StageData>,
}

impl StageDatabase {
    pub fn from_stages(stages: Vec<StageData>) -> Result<Self> {
        for (i, stage) in stages.iter().enumerate() {
            if stages[..i].iter().any(|s| s.id == stage.id) {
                return Err(ConfigError::Invalid(format!("duplicate stage id '{}'", stage.id)));
            }
            for enemy in &stage.enemies {
                if enemy.slot >= SPAWN_SLOTS_PER_TEAM {
                    return Err(ConfigError::Invalid(format!(
                        "stage '{}': enemy slot {} is out of range (0..{})",
                        stage.id, enemy.slot, SPAWN_SLOTS_PER_TEAM
                    )));
                }
            }
        }
        Ok(Self { stages })
    }

    pub fn from_ron_str(contents: &str) -> Result<Self> {
        let file: StagesFile = parse_ron(contents, Path::new("<inline stages>"))?;
        Self::from_stages(file.stages)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let file: StagesFile = read_ron(path)?;
        let database = Self::from_stages(file.stages)?;
        info!("Loaded {} stages from {}", database.len(), path.display());
        Ok(database)
    }

    /// Check that every enemy references a known unit.
    pub fn validate_against(&self, units: &UnitDatabase) -> Result<()> {
        for stage in &self.stages {
            for enemy in &stage.enemies {
                units.require(&enemy.unit)?;
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&StageData> {
        self.stages.iter().find(|s| s.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&StageData> {
        self.get(id).ok_or_else(|| ConfigError::UnknownStage(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageData> {
        self.stages.iter()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Load both databases and cross-check them.
pub fn load_databases(units_path: &Path, stages_path: &Path) -> Result<(UnitDatabase, StageDatabase)> {
    let units = UnitDatabase::load_from_file(units_path)?;
    let stages = StageDatabase::load_from_file(stages_path)?;
    stages.validate_against(&units)?;
    Ok((units, stages))
}

/// Default data file locations, relative to the working directory.
pub fn default_paths() -> (PathBuf, PathBuf) {
    (PathBuf::from(DEFAULT_UNITS_PATH), PathBuf::from(DEFAULT_STAGES_PATH))
}
