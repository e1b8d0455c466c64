//! MercSim - Mercenary Auto-Battle Simulation
//!
//! The battle core of a real-time auto-battler: allied and enemy units pick
//! targets, close distance, trade attacks and cast skills with no player
//! input until one side is wiped out.
//!
//! This library exposes the simulation for testing, headless runs and reuse
//! behind any presentation layer.

pub mod battle;
pub mod cli;
pub mod combat;
pub mod error;
pub mod headless;

// Re-export commonly used types
pub use battle::{
    Battle, BattleOutcome, BattlePhase, BattleResult, PartyMember, Presenter, StageData, StageDatabase, Team, UnitDatabase,
    UnitId,
};
pub use combat::log::{CombatLog, CombatLogEventType};
pub use error::{ConfigError, LogError};
pub use headless::HeadlessMatchConfig;
