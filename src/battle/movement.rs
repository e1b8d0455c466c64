//! Movement
//!
//! Straight-line seek toward the current target. No pathfinding, avoidance or
//! separation: a unit walks directly at its target until it is within attack
//! range.

use bevy::math::Vec2;

/// Horizontal facing of a unit sprite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// Facing that looks from `from` toward `to`. Keeps `current` when the
    /// two points share an x coordinate.
    pub fn toward(from: Vec2, to: Vec2, current: Facing) -> Facing {
        let dx = to.x - from.x;
        if dx > 0.0 {
            Facing::Right
        } else if dx < 0.0 {
            Facing::Left
        } else {
            current
        }
    }
}

/// Result of one seek step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Seek {
    /// Target is within attack range; the unit does not move this tick.
    InRange,
    /// The unit advanced to `position`, heading along `direction`.
    Moved { position: Vec2, direction: Vec2 },
}

/// Advance from `position` toward `target` by `move_speed * dt`.
///
/// The range check is inclusive. The step is not clamped to the remaining
/// distance, matching a plain seek: a fast unit may overshoot slightly and
/// then find itself in range on the next tick.
pub fn seek(position: Vec2, target: Vec2, move_speed: f32, attack_range: f32, dt: f32) -> Seek {
    let distance = position.distance(target);
    if distance <= attack_range {
        return Seek::InRange;
    }

    let direction = (target - position).normalize_or_zero();
    Seek::Moved {
        position: position + direction * move_speed * dt,
        direction,
    }
}
