//! Projectile Simulator
//!
//! Projectiles fly from a launch point to the target's aim point captured at
//! launch. Linear projectiles follow the straight segment; parabolic ones add
//! a vertical arc. Travel time is path length over speed, so every projectile
//! of a profile covers ground at the same pace.
//!
//! The simulator owns no units. Each step is told which targets are still
//! alive and hands back the impacts for the battle to apply.

use bevy::log::warn;
use bevy::math::Vec2;

use super::constants::{ARC_SAMPLE_SEGMENTS, ROTATION_EPSILON_SQ};
use super::data::{ProjectileMovement, ProjectileProfile};
use super::roster::UnitId;

/// What a projectile delivers on arrival.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProjectilePayload {
    Damage(f32),
    Heal(f32),
}

/// Parameters of a launch.
#[derive(Clone, Debug)]
pub struct ProjectileLaunch {
    pub source: Option<UnitId>,
    pub target: UnitId,
    /// Ability name for the combat log
    pub ability: String,
    pub profile: ProjectileProfile,
    pub payload: ProjectilePayload,
    pub start: Vec2,
    pub target_position: Vec2,
}

/// A projectile reaching a live target.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileImpact {
    pub source: Option<UnitId>,
    pub target: UnitId,
    pub ability: String,
    pub payload: ProjectilePayload,
    pub position: Vec2,
}

/// A projectile in flight.
#[derive(Clone, Debug)]
pub struct Projectile {
    pub source: Option<UnitId>,
    pub target: UnitId,
    pub ability: String,
    pub payload: ProjectilePayload,
    profile: ProjectileProfile,
    start: Vec2,
    target_position: Vec2,
    arc_height: f32,
    travel_time: f32,
    elapsed: f32,
    position: Vec2,
    /// Radians, counter-clockwise from +x
    rotation: f32,
}

impl Projectile {
    /// Build a projectile from a launch. `None` if the profile cannot move.
    pub fn new(launch: ProjectileLaunch) -> Option<Self> {
        let profile = launch.profile;
        if profile.speed <= 0.0 {
            return None;
        }

        let distance = launch.start.distance(launch.target_position);
        let estimated_time = distance / profile.speed;
        let arc_height = match profile.movement {
            ProjectileMovement::Parabolic => profile.arc_intensity * estimated_time * estimated_time,
            ProjectileMovement::Linear => 0.0,
        };

        let direction = launch.target_position - launch.start;
        let rotation = if profile.rotate_to_direction && direction.length_squared() > 0.0 {
            direction.y.atan2(direction.x)
        } else {
            0.0
        };

        let mut projectile = Self {
            source: launch.source,
            target: launch.target,
            ability: launch.ability,
            payload: launch.payload,
            profile,
            start: launch.start,
            target_position: launch.target_position,
            arc_height,
            travel_time: 0.0,
            elapsed: 0.0,
            position: launch.start,
            rotation,
        };
        projectile.travel_time = projectile.path_length() / projectile.profile.speed;
        Some(projectile)
    }

    /// Point on the path at `t` in [0, 1].
    pub fn position_at(&self, t: f32) -> Vec2 {
        let mut position = self.start.lerp(self.target_position, t);
        if self.profile.movement == ProjectileMovement::Parabolic {
            position.y += self.arc_height * 4.0 * t * (1.0 - t);
        }
        position
    }

    /// Path length; sampled as a polyline for parabolic paths.
    fn path_length(&self) -> f32 {
        if self.profile.movement != ProjectileMovement::Parabolic {
            return self.start.distance(self.target_position);
        }

        let mut length = 0.0;
        let mut previous = self.start;
        for i in 1..=ARC_SAMPLE_SEGMENTS {
            let t = i as f32 / ARC_SAMPLE_SEGMENTS as f32;
            let point = self.position_at(t);
            length += previous.distance(point);
            previous = point;
        }
        length
    }

    /// Advance by `dt`. Returns true once the projectile has arrived.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        let t = if self.travel_time > 0.0 {
            (self.elapsed / self.travel_time).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let next = self.position_at(t);
        if self.profile.rotate_to_direction {
            let step = next - self.position;
            if step.length_squared() > ROTATION_EPSILON_SQ {
                self.rotation = step.y.atan2(step.x);
            }
        }
        self.position = next;

        t >= 1.0
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn travel_time(&self) -> f32 {
        self.travel_time
    }

    pub fn arc_height(&self) -> f32 {
        self.arc_height
    }

    fn impact(self) -> ProjectileImpact {
        ProjectileImpact {
            source: self.source,
            target: self.target,
            ability: self.ability,
            payload: self.payload,
            position: self.position,
        }
    }
}

/// Every projectile in flight for one battle.
#[derive(Clone, Debug, Default)]
pub struct ProjectileSimulator {
    projectiles: Vec<Projectile>,
}

impl ProjectileSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launch a projectile. Returns false (and warns) if it cannot fly.
    pub fn fire(&mut self, launch: ProjectileLaunch) -> bool {
        let speed = launch.profile.speed;
        let ability = launch.ability.clone();
        match Projectile::new(launch) {
            Some(projectile) => {
                self.projectiles.push(projectile);
                true
            }
            None => {
                warn!("Projectile for '{}' has non-positive speed {}; not fired", ability, speed);
                false
            }
        }
    }

    /// Advance every projectile. Projectiles whose target is no longer alive
    /// are discarded without effect; arrivals are returned in launch order.
    pub fn step<F>(&mut self, dt: f32, is_alive: F) -> Vec<ProjectileImpact>
    where
        F: Fn(UnitId) -> bool,
    {
        let mut impacts = Vec::new();
        let mut in_flight = Vec::with_capacity(self.projectiles.len());

        for mut projectile in self.projectiles.drain(..) {
            if !is_alive(projectile.target) {
                continue;
            }
            if projectile.advance(dt) {
                impacts.push(projectile.impact());
            } else {
                in_flight.push(projectile);
            }
        }

        self.projectiles = in_flight;
        impacts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter()
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    pub fn clear(&mut self) {
        self.projectiles.clear();
    }
}
