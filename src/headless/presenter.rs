//! Scripted animation layer for headless matches
//!
//! Stands in for real animations: every cue that expects a callback schedules
//! the matching inbound signal after a fixed delay, and `advance` hands back
//! the signals that came due.

use crate::battle::data::AttackType;
use crate::battle::effects::LeapMotion;
use crate::battle::presenter::Presenter;
use crate::battle::roster::UnitId;

use super::config::AnimationTimings;

/// A callback the battle expects from the animation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationSignal {
    AttackHit(UnitId),
    AttackEnd(UnitId),
    SkillHit(UnitId),
    SkillComplete(UnitId),
    DeathComplete(UnitId),
}

impl AnimationSignal {
    pub fn unit(self) -> UnitId {
        match self {
            AnimationSignal::AttackHit(unit)
            | AnimationSignal::AttackEnd(unit)
            | AnimationSignal::SkillHit(unit)
            | AnimationSignal::SkillComplete(unit)
            | AnimationSignal::DeathComplete(unit) => unit,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Scheduled {
    at: f32,
    /// Insertion order, breaks ties between signals due at the same time
    seq: u64,
    signal: AnimationSignal,
}

#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    timings: AnimationTimings,
    clock: f32,
    next_seq: u64,
    scheduled: Vec<Scheduled>,
    attacks_played: u32,
    skills_cast: Vec<(UnitId, String)>,
    deaths: Vec<UnitId>,
}

impl HeadlessPresenter {
    pub fn new(timings: AnimationTimings) -> Self {
        Self {
            timings,
            ..Default::default()
        }
    }

    pub fn timings(&self) -> &AnimationTimings {
        &self.timings
    }

    /// Animation time elapsed so far
    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// Signals scheduled but not yet due
    pub fn pending(&self) -> usize {
        self.scheduled.len()
    }

    pub fn attacks_played(&self) -> u32 {
        self.attacks_played
    }

    /// Every skill cast so far, in order
    pub fn skills_cast(&self) -> &[(UnitId, String)] {
        &self.skills_cast
    }

    pub fn deaths(&self) -> &[UnitId] {
        &self.deaths
    }

    fn schedule(&mut self, delay: f32, signal: AnimationSignal) {
        self.scheduled.push(Scheduled {
            at: self.clock + delay.max(0.0),
            seq: self.next_seq,
            signal,
        });
        self.next_seq += 1;
    }

    fn drop_signals(&mut self, keep: impl Fn(&AnimationSignal) -> bool) {
        self.scheduled.retain(|s| keep(&s.signal));
    }

    /// Advance the animation clock and return the signals now due, oldest
    /// first.
    pub fn advance(&mut self, dt: f32) -> Vec<AnimationSignal> {
        self.clock += dt.max(0.0);

        let clock = self.clock;
        let mut due: Vec<Scheduled> = Vec::new();
        self.scheduled.retain(|s| {
            if s.at <= clock {
                due.push(*s);
                false
            } else {
                true
            }
        });

        due.sort_by(|a, b| a.at.total_cmp(&b.at).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|s| s.signal).collect()
    }
}

impl Presenter for HeadlessPresenter {
    /// A new swing restarts the animation, so the previous swing's end frame
    /// never plays.
    fn play_attack_animation(&mut self, unit: UnitId, _attack_type: AttackType) {
        self.attacks_played += 1;
        self.drop_signals(|s| *s != AnimationSignal::AttackEnd(unit));
        self.schedule(self.timings.attack_hit_delay, AnimationSignal::AttackHit(unit));
        self.schedule(self.timings.attack_end_delay, AnimationSignal::AttackEnd(unit));
    }

    fn skill_cast(&mut self, unit: UnitId, skill: &str, hit_count: u32) {
        self.skills_cast.push((unit, skill.to_string()));
        for hit in 0..hit_count {
            let delay = self.timings.skill_hit_delay + hit as f32 * self.timings.skill_hit_interval;
            self.schedule(delay, AnimationSignal::SkillHit(unit));
        }
    }

    fn play_death_animation(&mut self, unit: UnitId) {
        self.deaths.push(unit);
        self.drop_signals(|s| s.unit() != unit);
        self.schedule(self.timings.death_duration, AnimationSignal::DeathComplete(unit));
    }

    /// Skill hits land after the caster touches down.
    fn play_leap(&mut self, unit: UnitId, leap: &LeapMotion) {
        let airtime = leap.total_time();
        for scheduled in &mut self.scheduled {
            if scheduled.signal == AnimationSignal::SkillHit(unit) {
                scheduled.at += airtime;
            }
        }
    }

    /// One skill hit per swing, then completion.
    fn play_repeated_attack(&mut self, unit: UnitId, _attack_type: AttackType, count: u32, speed_multiplier: f32) {
        self.drop_signals(|s| *s != AnimationSignal::SkillHit(unit));

        let interval = if speed_multiplier > 0.0 {
            self.timings.repeated_attack_interval / speed_multiplier
        } else {
            self.timings.repeated_attack_interval
        };
        for swing in 1..=count {
            self.schedule(swing as f32 * interval, AnimationSignal::SkillHit(unit));
        }
        self.schedule(count as f32 * interval, AnimationSignal::SkillComplete(unit));
    }
}
