//! Targeting
//!
//! Pure queries over a roster snapshot: nearest, lowest health, lowest health
//! ratio, everyone in range, plus the skill-level mapping from `TargetType` to
//! those primitives and the radius-based effect-target expansion.
//!
//! All queries skip dead units and use inclusive 2D Euclidean range checks.
//! Ties go to the *first* minimal candidate in iteration order (strictly-less
//! comparison), which is roster registration order. Nothing here is an error:
//! an empty result means the attack or skill fizzles.

use bevy::math::Vec2;
use smallvec::SmallVec;

use super::data::{EffectOrigin, SkillTemplate, TargetType};
use super::roster::{Roster, UnitId, UnitView};

/// Effect target list. Rosters are small, so this almost never spills.
pub type TargetList = SmallVec<[UnitId; 4]>;

// ============================================================================
// Primitives
// ============================================================================

/// Generic "first minimal key within range" scan shared by the primitives.
fn first_min_by<'a, I, F>(origin: Vec2, candidates: I, range: f32, key: F) -> Option<&'a UnitView>
where
    I: IntoIterator<Item = &'a UnitView>,
    F: Fn(&UnitView, f32) -> f32,
{
    let mut best: Option<&'a UnitView> = None;
    let mut best_key = f32::MAX;

    for candidate in candidates {
        if !candidate.alive {
            continue;
        }
        let distance = candidate.distance_to(origin);
        if distance > range {
            continue;
        }
        let k = key(candidate, distance);
        if k < best_key {
            best_key = k;
            best = Some(candidate);
        }
    }

    best
}

/// Closest live candidate within `range` of `origin`.
pub fn find_nearest_in_range<'a, I>(origin: Vec2, candidates: I, range: f32) -> Option<&'a UnitView>
where
    I: IntoIterator<Item = &'a UnitView>,
{
    first_min_by(origin, candidates, range, |_, distance| distance)
}

/// Live candidate with the lowest absolute health within `range`.
pub fn find_lowest_health<'a, I>(origin: Vec2, candidates: I, range: f32) -> Option<&'a UnitView>
where
    I: IntoIterator<Item = &'a UnitView>,
{
    first_min_by(origin, candidates, range, |c, _| c.health)
}

/// Live candidate with the lowest health ratio within `range`.
pub fn find_lowest_health_ratio<'a, I>(origin: Vec2, candidates: I, range: f32) -> Option<&'a UnitView>
where
    I: IntoIterator<Item = &'a UnitView>,
{
    first_min_by(origin, candidates, range, |c, _| c.health_ratio())
}

/// Every live candidate within `range`, in iteration order.
pub fn find_all_in_range<'a, I>(origin: Vec2, candidates: I, range: f32) -> TargetList
where
    I: IntoIterator<Item = &'a UnitView>,
{
    candidates
        .into_iter()
        .filter(|c| c.alive && c.distance_to(origin) <= range)
        .map(|c| c.id)
        .collect()
}

// ============================================================================
// Skill Target Selection
// ============================================================================

/// Primary target of `skill` cast by `caster`.
///
/// The area target types pick a representative primary target (nearest enemy,
/// lowest-health ally) that the effect expansion then centers on.
pub fn select_target(caster: &UnitView, roster: &Roster, skill: &SkillTemplate) -> Option<UnitId> {
    let origin = caster.position;
    let range = skill.range;
    let enemies = || roster.opponents_of(caster.team);
    let allies = || roster.team(caster.team);

    let found = match skill.target {
        TargetType::NearestEnemy | TargetType::AllEnemiesInRange => {
            find_nearest_in_range(origin, enemies(), range)
        }
        TargetType::LowestHpEnemy => find_lowest_health(origin, enemies(), range),
        TargetType::LowestHpPercentageEnemy => find_lowest_health_ratio(origin, enemies(), range),
        TargetType::SelfOnly => return Some(caster.id),
        TargetType::LowestHpAlly | TargetType::AllAlliesInRange => {
            find_lowest_health(origin, allies(), range)
        }
        TargetType::LowestHpPercentageAlly => find_lowest_health_ratio(origin, allies(), range),
    };

    found.map(|v| v.id)
}

/// Every target `skill` would select, for multi-target callers.
pub fn select_targets(caster: &UnitView, roster: &Roster, skill: &SkillTemplate) -> TargetList {
    let origin = caster.position;
    match skill.target {
        TargetType::AllEnemiesInRange => {
            find_all_in_range(origin, roster.opponents_of(caster.team), skill.range)
        }
        TargetType::AllAlliesInRange => find_all_in_range(origin, roster.team(caster.team), skill.range),
        _ => select_target(caster, roster, skill).into_iter().collect(),
    }
}

/// Expand a primary target into the set of units the effect applies to.
///
/// With no effect radius only the primary target is hit. Otherwise every live
/// unit of the skill's allegiance within `effect_radius` of the effect origin
/// is collected (the caster, or the primary target when the origin is
/// `Target` and one exists).
pub fn expand_effect_targets(
    caster: &UnitView,
    primary: Option<&UnitView>,
    roster: &Roster,
    skill: &SkillTemplate,
) -> TargetList {
    if skill.effect_radius <= 0.0 {
        return primary.map(|p| p.id).into_iter().collect();
    }

    let center = match (skill.effect_origin, primary) {
        (EffectOrigin::Target, Some(target)) => target.position,
        _ => caster.position,
    };

    if skill.effect_targets_enemies() {
        find_all_in_range(center, roster.opponents_of(caster.team), skill.effect_radius)
    } else {
        find_all_in_range(center, roster.team(caster.team), skill.effect_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::data::{EffectType, Team};

    fn unit(id: u32, team: Team, x: f32, health: f32, max_health: f32) -> UnitView {
        UnitView {
            id: UnitId(id),
            team,
            position: Vec2::new(x, 0.0),
            hit_position: Vec2::new(x, 0.0),
            health,
            max_health,
            alive: health > 0.0,
        }
    }

    #[test]
    fn test_nearest_ignores_out_of_range_and_dead() {
        let candidates = [
            unit(1, Team::Enemy, 1.0, 0.0, 100.0),
            unit(2, Team::Enemy, 3.0, 50.0, 100.0),
            unit(3, Team::Enemy, 9.0, 50.0, 100.0),
        ];
        let found = find_nearest_in_range(Vec2::ZERO, &candidates, 5.0);
        assert_eq!(found.map(|v| v.id), Some(UnitId(2)));
    }

    #[test]
    fn test_range_is_inclusive() {
        let candidates = [unit(1, Team::Enemy, 5.0, 50.0, 100.0)];
        assert!(find_nearest_in_range(Vec2::ZERO, &candidates, 5.0).is_some());
        assert!(find_nearest_in_range(Vec2::ZERO, &candidates, 4.99).is_none());
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        let candidates = [
            unit(1, Team::Enemy, 2.0, 50.0, 100.0),
            unit(2, Team::Enemy, -2.0, 50.0, 100.0),
        ];
        assert_eq!(
            find_nearest_in_range(Vec2::ZERO, &candidates, 10.0).map(|v| v.id),
            Some(UnitId(1))
        );
        assert_eq!(
            find_lowest_health(Vec2::ZERO, &candidates, 10.0).map(|v| v.id),
            Some(UnitId(1))
        );
    }

    #[test]
    fn test_lowest_health_vs_lowest_ratio() {
        let candidates = [
            // 40 hp of 50 = 0.8
            unit(1, Team::Ally, 1.0, 40.0, 50.0),
            // 60 hp of 200 = 0.3
            unit(2, Team::Ally, 1.0, 60.0, 200.0),
        ];
        assert_eq!(
            find_lowest_health(Vec2::ZERO, &candidates, 5.0).map(|v| v.id),
            Some(UnitId(1))
        );
        assert_eq!(
            find_lowest_health_ratio(Vec2::ZERO, &candidates, 5.0).map(|v| v.id),
            Some(UnitId(2))
        );
    }

    #[test]
    fn test_find_all_in_range() {
        let candidates = [
            unit(1, Team::Enemy, 1.0, 10.0, 100.0),
            unit(2, Team::Enemy, 2.0, 0.0, 100.0),
            unit(3, Team::Enemy, 3.0, 10.0, 100.0),
            unit(4, Team::Enemy, 30.0, 10.0, 100.0),
        ];
        let found = find_all_in_range(Vec2::ZERO, &candidates, 3.0);
        assert_eq!(found.as_slice(), &[UnitId(1), UnitId(3)]);
    }

    #[test]
    fn test_no_candidates_is_none() {
        let candidates: [UnitView; 0] = [];
        assert!(find_nearest_in_range(Vec2::ZERO, &candidates, 100.0).is_none());
        assert!(find_all_in_range(Vec2::ZERO, &candidates, 100.0).is_empty());
    }

    fn roster() -> Roster {
        Roster::new(vec![
            unit(0, Team::Ally, 0.0, 80.0, 100.0),
            unit(1, Team::Ally, 1.0, 30.0, 100.0),
            unit(2, Team::Enemy, 2.0, 90.0, 100.0),
            unit(3, Team::Enemy, 4.0, 20.0, 100.0),
            unit(4, Team::Enemy, 8.0, 5.0, 100.0),
        ])
    }

    #[test]
    fn test_select_target_by_type() {
        let roster = roster();
        let caster = *roster.get(UnitId(0)).unwrap();
        let mut skill = SkillTemplate::new("test");
        skill.range = 5.0;

        skill.target = TargetType::NearestEnemy;
        assert_eq!(select_target(&caster, &roster, &skill), Some(UnitId(2)));

        skill.target = TargetType::LowestHpEnemy;
        assert_eq!(select_target(&caster, &roster, &skill), Some(UnitId(3)));

        skill.target = TargetType::SelfOnly;
        assert_eq!(select_target(&caster, &roster, &skill), Some(UnitId(0)));

        skill.target = TargetType::LowestHpAlly;
        assert_eq!(select_target(&caster, &roster, &skill), Some(UnitId(1)));

        skill.target = TargetType::AllEnemiesInRange;
        assert_eq!(select_target(&caster, &roster, &skill), Some(UnitId(2)));
        assert_eq!(
            select_targets(&caster, &roster, &skill).as_slice(),
            &[UnitId(2), UnitId(3)]
        );
    }

    #[test]
    fn test_select_target_none_in_range() {
        let roster = roster();
        let caster = *roster.get(UnitId(0)).unwrap();
        let mut skill = SkillTemplate::new("short");
        skill.range = 1.0;
        skill.target = TargetType::NearestEnemy;
        assert_eq!(select_target(&caster, &roster, &skill), None);
    }

    #[test]
    fn test_expand_single_target_without_radius() {
        let roster = roster();
        let caster = *roster.get(UnitId(0)).unwrap();
        let primary = roster.get(UnitId(3)).copied();
        let skill = SkillTemplate::new("stab");
        let targets = expand_effect_targets(&caster, primary.as_ref(), &roster, &skill);
        assert_eq!(targets.as_slice(), &[UnitId(3)]);
    }

    #[test]
    fn test_expand_around_target_origin() {
        let roster = roster();
        let caster = *roster.get(UnitId(0)).unwrap();
        let primary = roster.get(UnitId(3)).copied();
        let mut skill = SkillTemplate::new("meteor");
        skill.effect_radius = 2.0;
        skill.effect_origin = EffectOrigin::Target;

        let targets = expand_effect_targets(&caster, primary.as_ref(), &roster, &skill);
        // Centered on x=4: enemies at 2 and 4 are within 2.0, the one at 8 is not.
        assert_eq!(targets.as_slice(), &[UnitId(2), UnitId(3)]);
    }

    #[test]
    fn test_expand_allies_around_caster() {
        let roster = roster();
        let caster = *roster.get(UnitId(0)).unwrap();
        let mut skill = SkillTemplate::new("prayer");
        skill.effect = EffectType::HealAoE;
        skill.target = TargetType::LowestHpAlly;
        skill.effect_radius = 1.5;

        let targets = expand_effect_targets(&caster, None, &roster, &skill);
        assert_eq!(targets.as_slice(), &[UnitId(0), UnitId(1)]);
    }

    #[test]
    fn test_self_centred_damage_hits_enemies_only() {
        let roster = roster();
        let caster = *roster.get(UnitId(0)).unwrap();
        let mut skill = SkillTemplate::new("whirlwind");
        skill.effect = EffectType::Damage;
        skill.target = TargetType::SelfOnly;
        skill.effect_radius = 2.5;

        let targets = expand_effect_targets(&caster, Some(&caster), &roster, &skill);
        assert_eq!(targets.as_slice(), &[UnitId(2)]);

        // Same aim, supportive effect: the caster's side
        skill.effect = EffectType::Shield;
        let targets = expand_effect_targets(&caster, Some(&caster), &roster, &skill);
        assert_eq!(targets.as_slice(), &[UnitId(0), UnitId(1)]);
    }
}
