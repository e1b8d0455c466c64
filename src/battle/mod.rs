//! Battle simulation core
//!
//! Frame-stepped, single-threaded auto-battle: units pick targets, walk into
//! range, trade basic attacks and cast skills with no player input. Timing of
//! hits is owned by the presentation layer, which calls back into the
//! `Battle` when an animation reaches its hit frame.
//!
//! Leaves first:
//! - `stats`, `data`, `config`: templates, derived stats, data loading
//! - `roster`, `targeting`, `movement`, `combat`, `skills`, `effects`
//! - `unit`: the per-unit aggregate
//! - `projectiles`, `presenter`, `orchestrator`

pub mod combat;
pub mod config;
pub mod constants;
pub mod data;
pub mod effects;
pub mod movement;
pub mod orchestrator;
pub mod presenter;
pub mod projectiles;
pub mod roster;
pub mod skills;
pub mod stats;
pub mod targeting;
pub mod unit;

pub use config::{PartyMember, StageData, StageDatabase, UnitDatabase};
pub use data::{SkillTemplate, Team, UnitTemplate};
pub use orchestrator::{Battle, BattleOutcome, BattlePhase, BattleResult};
pub use presenter::{DamageFeedback, PopupStyle, Presenter, SpawnPoints, SpawnProvider};
pub use roster::UnitId;
pub use unit::{Unit, UnitState};
