//! Combat logging
//!
//! Records all combat events for display and post-match analysis. Entries
//! carry a human-readable message plus optional structured data, which the
//! query helpers aggregate and the JSON export preserves.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::LogError;

/// Display identity of a unit in the log, e.g. "Ally Knight #0".
pub type CombatantId = String;

/// A single entry in the combat log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatLogEntry {
    /// Timestamp in match time (seconds since battle start)
    pub timestamp: f32,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
    /// Machine-readable payload, when the event has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<StructuredEventData>,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatLogEventType {
    /// Damage dealt
    Damage,
    /// Healing done
    Healing,
    /// Skill cast
    SkillUsed,
    /// Projectile launched
    ProjectileLaunched,
    /// Unit died
    Death,
    /// Battle event (start, end, retirement, etc.)
    MatchEvent,
}

/// Structured payload of an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructuredEventData {
    Damage {
        source: Option<CombatantId>,
        target: CombatantId,
        ability: String,
        amount: f32,
        is_killing_blow: bool,
    },
    Healing {
        source: Option<CombatantId>,
        target: CombatantId,
        ability: String,
        amount: f32,
    },
    SkillUsed {
        caster: CombatantId,
        skill: String,
        target: Option<CombatantId>,
    },
    ProjectileLaunched {
        source: Option<CombatantId>,
        target: CombatantId,
        ability: String,
    },
    Death {
        victim: CombatantId,
        killer: Option<CombatantId>,
    },
}

/// Per-unit summary written alongside the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantMetadata {
    pub id: CombatantId,
    pub unit: String,
    pub level: u32,
    pub max_health: f32,
    pub final_health: f32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub final_position: (f32, f32),
}

/// Battle summary written alongside the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchMetadata {
    pub stage_name: String,
    /// "Victory", "Defeat" or "Draw"
    pub result: String,
    pub reward: u32,
    pub duration: f32,
    pub allies: Vec<CombatantMetadata>,
    pub enemies: Vec<CombatantMetadata>,
}

#[derive(Serialize)]
struct SavedLog<'a> {
    metadata: &'a MatchMetadata,
    entries: &'a [CombatLogEntry],
}

/// The combat log storing all events of one battle
#[derive(Debug, Clone, Default)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current match time
    pub match_time: f32,
    /// Every combatant seen this battle, in registration order
    combatants: Vec<CombatantId>,
}

impl CombatLog {
    /// Clear the log for a new battle
    pub fn clear(&mut self) {
        self.entries.clear();
        self.combatants.clear();
        self.match_time = 0.0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.push(event_type, message, None);
    }

    fn push(&mut self, event_type: CombatLogEventType, message: String, data: Option<StructuredEventData>) {
        self.entries.push(CombatLogEntry {
            timestamp: self.match_time,
            event_type,
            message,
            data,
        });
    }

    pub fn register_combatant(&mut self, id: CombatantId) {
        if !self.combatants.contains(&id) {
            self.combatants.push(id);
        }
    }

    pub fn all_combatants(&self) -> &[CombatantId] {
        &self.combatants
    }

    // ========================================================================
    // Structured logging
    // ========================================================================

    pub fn log_damage(
        &mut self,
        source: Option<CombatantId>,
        target: CombatantId,
        ability: String,
        amount: f32,
        is_killing_blow: bool,
        message: String,
    ) {
        let data = StructuredEventData::Damage {
            source,
            target,
            ability,
            amount,
            is_killing_blow,
        };
        self.push(CombatLogEventType::Damage, message, Some(data));
    }

    pub fn log_healing(
        &mut self,
        source: Option<CombatantId>,
        target: CombatantId,
        ability: String,
        amount: f32,
        message: String,
    ) {
        let data = StructuredEventData::Healing {
            source,
            target,
            ability,
            amount,
        };
        self.push(CombatLogEventType::Healing, message, Some(data));
    }

    pub fn log_skill_used(&mut self, caster: CombatantId, skill: String, target: Option<CombatantId>, message: String) {
        let data = StructuredEventData::SkillUsed { caster, skill, target };
        self.push(CombatLogEventType::SkillUsed, message, Some(data));
    }

    pub fn log_projectile(&mut self, source: Option<CombatantId>, target: CombatantId, ability: String, message: String) {
        let data = StructuredEventData::ProjectileLaunched { source, target, ability };
        self.push(CombatLogEventType::ProjectileLaunched, message, Some(data));
    }

    pub fn log_death(&mut self, victim: CombatantId, killer: Option<CombatantId>, message: String) {
        let data = StructuredEventData::Death { victim, killer };
        self.push(CombatLogEventType::Death, message, Some(data));
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get only HP-changing events (damage and healing)
    pub fn hp_changes_only(&self) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    CombatLogEventType::Damage | CombatLogEventType::Healing
                )
            })
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    fn data(&self) -> impl Iterator<Item = &StructuredEventData> {
        self.entries.iter().filter_map(|e| e.data.as_ref())
    }

    /// Damage dealt by `source`, keyed by ability
    pub fn damage_by_ability(&self, source: &str) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for data in self.data() {
            if let StructuredEventData::Damage {
                source: Some(s),
                ability,
                amount,
                ..
            } = data
            {
                if s == source {
                    *totals.entry(ability.clone()).or_insert(0.0) += amount;
                }
            }
        }
        totals
    }

    /// Healing done by `source`, keyed by ability
    pub fn healing_by_ability(&self, source: &str) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for data in self.data() {
            if let StructuredEventData::Healing {
                source: Some(s),
                ability,
                amount,
                ..
            } = data
            {
                if s == source {
                    *totals.entry(ability.clone()).or_insert(0.0) += amount;
                }
            }
        }
        totals
    }

    pub fn total_damage_dealt(&self, source: &str) -> f32 {
        self.damage_by_ability(source).values().sum()
    }

    pub fn total_damage_taken(&self, target: &str) -> f32 {
        self.data()
            .filter_map(|data| match data {
                StructuredEventData::Damage { target: t, amount, .. } if t == target => Some(*amount),
                _ => None,
            })
            .sum()
    }

    pub fn total_healing_done(&self, source: &str) -> f32 {
        self.healing_by_ability(source).values().sum()
    }

    pub fn killing_blows(&self, source: &str) -> usize {
        self.data()
            .filter(|data| {
                matches!(
                    data,
                    StructuredEventData::Damage {
                        source: Some(s),
                        is_killing_blow: true,
                        ..
                    } if s == source
                )
            })
            .count()
    }

    pub fn combatant_survived(&self, id: &str) -> bool {
        !self
            .data()
            .any(|data| matches!(data, StructuredEventData::Death { victim, .. } if victim == id))
    }

    /// (timestamp, skill) of every cast by `caster`, in order
    pub fn skill_casts_for(&self, caster: &str) -> Vec<(f32, &str)> {
        self.entries
            .iter()
            .filter_map(|e| match &e.data {
                Some(StructuredEventData::SkillUsed { caster: c, skill, .. }) if c == caster => {
                    Some((e.timestamp, skill.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Write the log and metadata as JSON. With no `output_path` the file goes
    /// to `match_logs/battle_<unix seconds>.json`. Returns the written path.
    pub fn save_to_file(&self, metadata: &MatchMetadata, output_path: Option<&str>) -> Result<String, LogError> {
        let filename = match output_path {
            Some(path) => path.to_string(),
            None => {
                let stamp = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                format!("match_logs/battle_{}.json", stamp)
            }
        };

        if let Some(parent) = Path::new(&filename).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| LogError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let saved = SavedLog {
            metadata,
            entries: &self.entries,
        };
        let json = serde_json::to_string_pretty(&saved)?;
        fs::write(&filename, json).map_err(|source| LogError::Write {
            path: filename.clone().into(),
            source,
        })?;

        Ok(filename)
    }
}
