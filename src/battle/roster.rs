//! Roster Snapshot
//!
//! Read-only view of every registered unit, taken by the battle before a unit
//! is updated. Targeting queries run against this snapshot so a unit can
//! mutate itself while looking at everyone else.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::data::Team;

/// Stable identity of a unit within one battle. Targets are held as ids and
/// re-validated against the roster before use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-tick snapshot of a single unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitView {
    pub id: UnitId,
    pub team: Team,
    pub position: Vec2,
    /// Where projectiles aim
    pub hit_position: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub alive: bool,
}

impl UnitView {
    /// Health as a ratio (0.0 to 1.0)
    pub fn health_ratio(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }
}

/// Snapshot of the whole roster in registration order.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    views: Vec<UnitView>,
}

impl Roster {
    pub fn new(views: Vec<UnitView>) -> Self {
        Self { views }
    }

    pub fn get(&self, id: UnitId) -> Option<&UnitView> {
        self.views.iter().find(|v| v.id == id)
    }

    /// The unit if it is registered and alive.
    pub fn live(&self, id: UnitId) -> Option<&UnitView> {
        self.get(id).filter(|v| v.alive)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitView> {
        self.views.iter()
    }

    pub fn team(&self, team: Team) -> impl Iterator<Item = &UnitView> {
        self.views.iter().filter(move |v| v.team == team)
    }

    /// Units fighting against `team`.
    pub fn opponents_of(&self, team: Team) -> impl Iterator<Item = &UnitView> {
        self.team(team.opponent())
    }

    /// Replace the snapshot of one unit after it has been updated.
    pub fn refresh(&mut self, view: UnitView) {
        if let Some(slot) = self.views.iter_mut().find(|v| v.id == view.id) {
            *slot = view;
        }
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
