//! Battle Constants
//!
//! Centralized location for magic numbers used throughout the battle simulation.

// ============================================================================
// Stats
// ============================================================================

/// Fraction of the base value gained per level above 1.
/// `stat(level) = base * (1 + (level - 1) * LEVEL_STAT_GROWTH)`
pub const LEVEL_STAT_GROWTH: f32 = 0.1;

/// Lowest level a unit can be derived at. Anything below is treated as this.
pub const MIN_LEVEL: u32 = 1;

// ============================================================================
// Default Stats
// ============================================================================

pub const DEFAULT_MAX_HEALTH: f32 = 100.0;
pub const DEFAULT_ATTACK_DAMAGE: f32 = 10.0;
/// Seconds between basic attacks.
pub const DEFAULT_ATTACK_SPEED: f32 = 1.0;
pub const DEFAULT_MOVE_SPEED: f32 = 3.0;
/// Roughly one body length; melee units stop here.
pub const DEFAULT_ATTACK_RANGE: f32 = 1.5;

// ============================================================================
// Combat
// ============================================================================

/// Ability name basic attacks are logged under.
pub const BASIC_ATTACK_NAME: &str = "Attack";

// ============================================================================
// Projectiles
// ============================================================================

/// Polyline segments used to estimate the length of a parabolic path.
pub const ARC_SAMPLE_SEGMENTS: usize = 10;

/// Squared step length below which a projectile keeps its previous rotation.
pub const ROTATION_EPSILON_SQ: f32 = 0.0001;

pub const DEFAULT_PROJECTILE_SPEED: f32 = 10.0;
pub const DEFAULT_ARC_INTENSITY: f32 = 2.0;

// ============================================================================
// Spawning
// ============================================================================

/// Spawn slots per team (party size and stage enemy slots).
pub const SPAWN_SLOTS_PER_TEAM: usize = 4;

// ============================================================================
// Leap
// ============================================================================

pub const DEFAULT_LEAP_STOP_DISTANCE: f32 = 1.5;
pub const DEFAULT_LEAP_DURATION: f32 = 0.5;
pub const DEFAULT_LEAP_JUMP_HEIGHT: f32 = 2.0;
pub const DEFAULT_LEAP_ANTICIPATION: f32 = 0.12;
pub const DEFAULT_LEAP_HANG_RATIO: f32 = 0.1;
pub const DEFAULT_LEAP_LANDING: f32 = 0.15;
/// Hang-time ratio is capped so launch and descent always get most of the leap.
pub const MAX_LEAP_HANG_RATIO: f32 = 0.3;
