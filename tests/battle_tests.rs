//! Battle orchestration tests
//!
//! Drives `Battle` directly, confirming animations by hand the way a
//! presentation layer would.

mod common;

use std::sync::Arc;

use common::*;
use mercsim::battle::config::{EnemySpawnInfo, PartyMember, StageData, UnitDatabase};
use mercsim::battle::unit::{Unit, UnitState};
use mercsim::battle::{BattlePhase, BattleResult, PopupStyle, Team, UnitId};
use mercsim::combat::events::BattleEvent;
use mercsim::combat::log::{CombatLogEventType, StructuredEventData};

/// Tick once, then confirm every committed swing immediately.
fn tick_and_confirm(battle: &mut TestBattle, dt: f32) {
    battle.tick(dt);
    let swinging: Vec<UnitId> = battle
        .all_units()
        .iter()
        .filter(|u| u.is_attacking())
        .map(Unit::id)
        .collect();
    for id in swinging {
        battle.on_attack_hit_confirmed(id);
    }
}

fn stage(enemies: &[(&str, usize)], gold_reward: u32) -> StageData {
    StageData {
        id: "test".to_string(),
        name: "Test Stage".to_string(),
        enemies: enemies
            .iter()
            .map(|(unit, slot)| EnemySpawnInfo {
                unit: unit.to_string(),
                level: 1,
                slot: *slot,
            })
            .collect(),
        recommended_power: 0,
        gold_reward,
    }
}

// =============================================================================
// Basic Attacks
// =============================================================================

#[test]
fn test_melee_hit_reduces_health() {
    let mut battle = battle();
    let ally = battle.create_unit(Arc::new(unit_template("fighter", 100.0, 10.0)), 1, Team::Ally, at(0.0, 0.0));
    let enemy = battle.create_unit(Arc::new(dummy_template("dummy", 100.0)), 1, Team::Enemy, at(1.0, 0.0));
    assert!(battle.begin());

    // First tick enters attack range, second commits the swing
    battle.tick(0.1);
    assert_eq!(battle.unit(ally).unwrap().state(), UnitState::Attack);
    battle.tick(0.1);
    assert!(battle.unit(ally).unwrap().is_attacking());
    assert_eq!(battle.presenter().attacks_by(ally), 1);
    assert_eq!(health_of(&battle, enemy), 100.0);

    battle.on_attack_hit_confirmed(ally);
    assert_eq!(health_of(&battle, enemy), 90.0);
    assert!(!battle.unit(ally).unwrap().is_attacking());

    // Hit flash, enemy-styled popup and a damage entry
    assert!(battle.presenter().calls.contains(&Call::HitFlash(enemy)));
    assert_eq!(battle.feedback().popups.len(), 1);
    assert_eq!(battle.feedback().popups[0].1, 10);
    assert_eq!(battle.feedback().popups[0].2, PopupStyle::EnemyDamage);
    let damage = battle.log().filter_by_type(CombatLogEventType::Damage);
    assert_eq!(damage.len(), 1);
}

#[test]
fn test_second_confirmation_does_nothing() {
    let mut battle = battle();
    let ally = battle.create_unit(Arc::new(unit_template("fighter", 100.0, 10.0)), 1, Team::Ally, at(0.0, 0.0));
    let enemy = battle.create_unit(Arc::new(dummy_template("dummy", 100.0)), 1, Team::Enemy, at(1.0, 0.0));
    battle.begin();
    battle.tick(0.1);
    battle.tick(0.1);

    battle.on_attack_hit_confirmed(ally);
    battle.on_attack_hit_confirmed(ally);
    assert_eq!(health_of(&battle, enemy), 90.0);
}

#[test]
fn test_attack_speed_spaces_swings() {
    let mut battle = battle();
    let mut template = unit_template("fighter", 100.0, 10.0);
    template.base_attack_speed = 1.0;
    let ally = battle.create_unit(Arc::new(template), 1, Team::Ally, at(0.0, 0.0));
    battle.create_unit(Arc::new(dummy_template("dummy", 1000.0)), 1, Team::Enemy, at(1.0, 0.0));
    battle.begin();

    // Swings land at ~0.1s and ~1.1s; the third is not due within 2.05s
    for _ in 0..41 {
        tick_and_confirm(&mut battle, 0.05);
    }
    assert_eq!(battle.presenter().attacks_by(ally), 2);
}

#[test]
fn test_attack_end_aborts_unconfirmed_swing() {
    let mut battle = battle();
    let ally = battle.create_unit(Arc::new(unit_template("fighter", 100.0, 10.0)), 1, Team::Ally, at(0.0, 0.0));
    let enemy = battle.create_unit(Arc::new(dummy_template("dummy", 100.0)), 1, Team::Enemy, at(1.0, 0.0));
    battle.begin();
    battle.tick(0.1);
    battle.tick(0.1);
    assert!(battle.unit(ally).unwrap().is_attacking());

    battle.on_attack_end(ally);
    assert!(!battle.unit(ally).unwrap().is_attacking());

    // A late hit confirmation finds nothing to resolve
    battle.on_attack_hit_confirmed(ally);
    assert_eq!(health_of(&battle, enemy), 100.0);
}

#[test]
fn test_hit_on_dead_target_is_dropped() {
    let mut battle = battle();
    let ally = battle.create_unit(Arc::new(unit_template("fighter", 100.0, 10.0)), 1, Team::Ally, at(0.0, 0.0));
    let enemy = battle.create_unit(Arc::new(dummy_template("dummy", 100.0)), 1, Team::Enemy, at(1.0, 0.0));
    battle.create_unit(Arc::new(dummy_template("far", 100.0)), 1, Team::Enemy, at(50.0, 0.0));
    battle.begin();
    battle.tick(0.1);
    battle.tick(0.1);

    battle.apply_damage(None, enemy, 500.0, "Trap");
    battle.on_attack_hit_confirmed(ally);

    let hits_from_ally = battle
        .log()
        .entries
        .iter()
        .filter(|e| matches!(&e.data, Some(StructuredEventData::Damage { source: Some(_), .. })))
        .count();
    assert_eq!(hits_from_ally, 0);
}

// =============================================================================
// Health and Death
// =============================================================================

#[test]
fn test_damage_and_heal_are_clamped() {
    let mut battle = battle();
    let ally = battle.create_unit(Arc::new(dummy_template("dummy", 100.0)), 1, Team::Ally, at(0.0, 0.0));
    battle.create_unit(Arc::new(dummy_template("far", 100.0)), 1, Team::Enemy, at(50.0, 0.0));
    battle.begin();

    let taken = battle.apply_damage(None, ally, 30.0, "Trap").unwrap();
    assert_eq!(taken.applied, 30.0);
    assert_eq!(battle.apply_heal(None, ally, 50.0, "Potion"), Some(30.0));
    assert_eq!(health_of(&battle, ally), 100.0);

    let overkill = battle.apply_damage(None, ally, 250.0, "Trap").unwrap();
    assert_eq!(overkill.applied, 100.0);
    assert!(overkill.killed);
    assert_eq!(health_of(&battle, ally), 0.0);
}

#[test]
fn test_dead_unit_ignores_damage_and_heal() {
    let mut battle = battle();
    let ally = battle.create_unit(Arc::new(dummy_template("dummy", 100.0)), 1, Team::Ally, at(0.0, 0.0));
    battle.create_unit(Arc::new(dummy_template("far", 100.0)), 1, Team::Enemy, at(50.0, 0.0));
    battle.begin();

    battle.apply_damage(None, ally, 100.0, "Trap");
    assert!(battle.unit(ally).unwrap().is_dead());
    assert!(battle.apply_damage(None, ally, 10.0, "Trap").is_none());
    assert!(battle.apply_heal(None, ally, 10.0, "Potion").is_none());
    assert_eq!(health_of(&battle, ally), 0.0);
    assert_eq!(battle.presenter().deaths(), vec![ally]);
}

#[test]
fn test_death_clears_in_flight_work() {
    let mut battle = battle();
    let ally = battle.create_unit(Arc::new(unit_template("fighter", 100.0, 10.0)), 1, Team::Ally, at(0.0, 0.0));
    let enemy = battle.create_unit(Arc::new(dummy_template("dummy", 100.0)), 1, Team::Enemy, at(1.0, 0.0));
    battle.create_unit(Arc::new(dummy_template("far", 100.0)), 1, Team::Enemy, at(50.0, 0.0));
    battle.begin();
    battle.tick(0.1);
    battle.tick(0.1);

    battle.apply_damage(Some(enemy), ally, 100.0, "Attack");
    let unit = battle.unit(ally).unwrap();
    assert_eq!(unit.state(), UnitState::Dead);
    assert!(unit.target().is_none());
    assert!(!unit.is_attacking());

    battle.on_attack_hit_confirmed(ally);
    assert_eq!(health_of(&battle, enemy), 100.0);
}

#[test]
fn test_death_animation_retires_once() {
    let mut battle = battle();
    let ally = battle.create_unit(Arc::new(dummy_template("dummy", 100.0)), 1, Team::Ally, at(0.0, 0.0));
    let enemy = battle.create_unit(Arc::new(dummy_template("far", 100.0)), 1, Team::Enemy, at(50.0, 0.0));
    battle.create_unit(Arc::new(dummy_template("far", 100.0)), 1, Team::Ally, at(-50.0, 0.0));
    battle.begin();

    // Living units cannot retire
    battle.on_death_animation_complete(enemy);
    assert!(!battle.unit(enemy).unwrap().is_retired());

    battle.apply_damage(Some(enemy), ally, 100.0, "Attack");
    battle.on_death_animation_complete(ally);
    battle.on_death_animation_complete(ally);

    let events = battle.drain_events();
    assert_eq!(
        events,
        vec![
            BattleEvent::UnitDied {
                unit: ally,
                killer: Some(enemy)
            },
            BattleEvent::UnitRetired { unit: ally },
        ]
    );
    assert!(battle.unit(ally).unwrap().is_retired());
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_one_ally_beats_two_enemies_and_finalizes_once() {
    let mut hero = unit_template("hero", 1000.0, 100.0);
    hero.base_attack_speed = 0.5;
    let units = UnitDatabase::from_templates(vec![hero, unit_template("imp", 50.0, 1.0)]).unwrap();
    let stage = stage(&[("imp", 0), ("imp", 1)], 75);

    let mut battle = battle();
    assert!(battle.start_battle(&stage, &[Some(PartyMember::new("hero", 1))], &units));
    assert_eq!(battle.phase(), BattlePhase::Fighting);
    assert_eq!(battle.allies().count(), 1);
    assert_eq!(battle.enemies().count(), 2);

    for _ in 0..(60 * 60) {
        tick_and_confirm(&mut battle, 1.0 / 60.0);
        if battle.outcome().is_some() {
            break;
        }
    }

    let outcome = battle.outcome().expect("battle should finish");
    assert_eq!(outcome.result, BattleResult::Victory);
    assert_eq!(outcome.reward, 75);
    assert_eq!(battle.phase(), BattlePhase::Ended);
    assert!(battle.enemies().all(|u| u.is_dead()));

    // Further ticks change nothing
    let elapsed = battle.elapsed();
    for _ in 0..10 {
        tick_and_confirm(&mut battle, 1.0 / 60.0);
    }
    assert_eq!(battle.elapsed(), elapsed);
    assert_eq!(battle.outcome(), Some(outcome));

    let finished = battle
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, BattleEvent::Finished(_)))
        .count();
    assert_eq!(finished, 1);

    let endings = battle
        .log()
        .filter_by_type(CombatLogEventType::MatchEvent)
        .into_iter()
        .filter(|e| e.message.starts_with("Battle ended"))
        .count();
    assert_eq!(endings, 1);
}

#[test]
fn test_ended_battle_refuses_begin_until_restarted() {
    let units = UnitDatabase::from_templates(vec![
        unit_template("hero", 1000.0, 100.0),
        unit_template("imp", 50.0, 1.0),
    ])
    .unwrap();
    let stage = stage(&[("imp", 0)], 40);
    let party = [Some(PartyMember::new("hero", 1))];

    let mut battle = battle();
    battle.start_battle(&stage, &party, &units);
    for _ in 0..(60 * 60) {
        tick_and_confirm(&mut battle, 1.0 / 60.0);
        if battle.outcome().is_some() {
            break;
        }
    }
    let outcome = battle.outcome().expect("battle should finish");
    assert_eq!(outcome.reward, 40);

    // Re-entering an ended battle would pay the reward twice
    assert!(!battle.begin());
    assert_eq!(battle.phase(), BattlePhase::Ended);
    for _ in 0..10 {
        tick_and_confirm(&mut battle, 1.0 / 60.0);
    }
    assert_eq!(battle.outcome(), Some(outcome));
    let finished = battle
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, BattleEvent::Finished(_)))
        .count();
    assert_eq!(finished, 1);

    // Starting the stage again is the way back
    assert!(battle.start_battle(&stage, &party, &units));
    assert_eq!(battle.phase(), BattlePhase::Fighting);
    assert!(battle.outcome().is_none());
}

#[test]
fn test_defeat_pays_nothing() {
    let units = UnitDatabase::from_templates(vec![
        unit_template("weakling", 10.0, 1.0),
        unit_template("ogre", 1000.0, 50.0),
    ])
    .unwrap();
    let stage = stage(&[("ogre", 0)], 75);

    let mut battle = battle();
    battle.start_battle(&stage, &[Some(PartyMember::new("weakling", 1))], &units);
    for _ in 0..(60 * 60) {
        tick_and_confirm(&mut battle, 1.0 / 60.0);
        if battle.outcome().is_some() {
            break;
        }
    }

    let outcome = battle.outcome().expect("battle should finish");
    assert_eq!(outcome.result, BattleResult::Defeat);
    assert_eq!(outcome.reward, 0);
}

#[test]
fn test_start_battle_refusals() {
    let units = UnitDatabase::from_templates(vec![unit_template("knight", 100.0, 10.0)]).unwrap();
    let stage = stage(&[("knight", 0)], 10);
    let mut battle = battle();

    // Empty party
    assert!(!battle.start_battle(&stage, &[None, None], &units));
    assert!(!battle.start_battle(&stage, &[], &units));
    assert_eq!(battle.phase(), BattlePhase::Ready);
    assert!(battle.all_units().is_empty());

    // Already fighting
    assert!(battle.start_battle(&stage, &[Some(PartyMember::new("knight", 1))], &units));
    let count = battle.all_units().len();
    assert!(!battle.start_battle(&stage, &[Some(PartyMember::new("knight", 1))], &units));
    assert_eq!(battle.all_units().len(), count);
}

#[test]
fn test_start_battle_skips_empty_slots_and_unknown_units() {
    let units = UnitDatabase::from_templates(vec![unit_template("knight", 100.0, 10.0)]).unwrap();
    let stage = stage(&[("knight", 0), ("ghost", 1)], 10);
    let mut battle = battle();

    let party = [None, Some(PartyMember::new("knight", 3)), Some(PartyMember::new("nobody", 1))];
    assert!(battle.start_battle(&stage, &party, &units));
    assert_eq!(battle.allies().count(), 1);
    assert_eq!(battle.enemies().count(), 1);

    let ally = battle.allies().next().unwrap();
    assert_eq!(ally.level(), 3);
    assert_eq!(ally.position(), at(-6.0, 1.0));
}

#[test]
fn test_spawn_unit_rejects_bad_slot_and_missing_template() {
    let template = Arc::new(unit_template("knight", 100.0, 10.0));
    let mut battle = battle();

    assert!(battle.spawn_unit(Some(&template), 1, Team::Ally, 9).is_none());
    assert!(battle.spawn_unit(None, 1, Team::Ally, 0).is_none());
    assert!(battle.all_units().is_empty());

    let id = battle.spawn_unit(Some(&template), 1, Team::Enemy, 0).unwrap();
    assert_eq!(battle.unit(id).unwrap().position(), at(6.0, 3.0));
}

#[test]
fn test_register_unit_is_idempotent() {
    let template = Arc::new(unit_template("knight", 100.0, 10.0));
    let mut battle = battle();
    let id = battle.next_unit_id();

    let first = Unit::new(id, Arc::clone(&template), 1, Team::Ally, at(0.0, 0.0));
    let second = Unit::new(id, template, 1, Team::Ally, at(5.0, 5.0));
    assert_eq!(battle.register_unit(first), id);
    assert_eq!(battle.register_unit(second), id);

    assert_eq!(battle.all_units().len(), 1);
    assert_eq!(battle.allies().count(), 1);
    assert_eq!(battle.unit(id).unwrap().position(), at(0.0, 0.0));
    assert_ne!(battle.next_unit_id(), id);
}

#[test]
fn test_clear_all_units_resets_battle() {
    let units = UnitDatabase::from_templates(vec![unit_template("knight", 100.0, 10.0)]).unwrap();
    let stage = stage(&[("knight", 0)], 10);
    let mut battle = battle();
    battle.start_battle(&stage, &[Some(PartyMember::new("knight", 1))], &units);

    battle.clear_all_units();
    assert!(battle.all_units().is_empty());
    assert_eq!(battle.phase(), BattlePhase::Ready);
    assert_eq!(battle.result(), BattleResult::InProgress);
    assert!(battle.projectiles().is_empty());

    // A cleared battle can start again
    assert!(battle.start_battle(&stage, &[Some(PartyMember::new("knight", 1))], &units));
}

#[test]
fn test_tick_before_start_does_nothing() {
    let mut battle = battle();
    let ally = battle.create_unit(Arc::new(unit_template("fighter", 100.0, 10.0)), 1, Team::Ally, at(0.0, 0.0));
    battle.create_unit(Arc::new(dummy_template("dummy", 100.0)), 1, Team::Enemy, at(10.0, 0.0));

    battle.tick(1.0);
    assert_eq!(battle.elapsed(), 0.0);
    assert_eq!(battle.unit(ally).unwrap().position(), at(0.0, 0.0));
}

#[test]
fn test_units_close_distance_before_attacking() {
    let mut battle = battle();
    let ally = battle.create_unit(Arc::new(unit_template("fighter", 100.0, 10.0)), 1, Team::Ally, at(0.0, 0.0));
    battle.create_unit(Arc::new(dummy_template("dummy", 100.0)), 1, Team::Enemy, at(10.0, 0.0));
    battle.begin();

    battle.tick(0.5);
    let unit = battle.unit(ally).unwrap();
    assert_eq!(unit.state(), UnitState::Move);
    assert!((unit.position().x - 1.5).abs() < 1e-4);
    assert!(battle.presenter().calls.contains(&Call::Moving(ally, true)));
    assert_eq!(battle.presenter().attacks_by(ally), 0);
}

#[test]
fn test_targets_follow_nearest_opponent() {
    let mut battle = battle();
    let ally = battle.create_unit(Arc::new(unit_template("fighter", 100.0, 10.0)), 1, Team::Ally, at(0.0, 0.0));
    let far = battle.create_unit(Arc::new(dummy_template("far", 100.0)), 1, Team::Enemy, at(8.0, 0.0));
    let near = battle.create_unit(Arc::new(dummy_template("near", 100.0)), 1, Team::Enemy, at(4.0, 0.0));
    battle.begin();
    assert_eq!(battle.unit(ally).unwrap().target(), Some(near));

    // Target dies: the next tick retargets
    battle.apply_damage(None, near, 100.0, "Trap");
    battle.tick(0.01);
    assert_eq!(battle.unit(ally).unwrap().target(), Some(far));
}
