//! Ability registry integration tests.
//!
//! These tests verify phase registration, merge-on-attach semantics, and
//! which phases a battle actually steps through.

use battle_engine::abilities::{
    AbilityDice, BattlePhaseList, CombatUnitAbility, ConvertUnitAbility, Engagement, Faction,
    AA_PHASE, BOMBARD_PHASE, FIRST_STRIKE_PHASE, GENERAL_PHASE,
};
use battle_engine::core::{EngagedUnit, PlayerId, Side, UnitId, UnitTypeId};
use battle_engine::error::BattleError;

const RED: PlayerId = PlayerId::new(0);
const BLUE: PlayerId = PlayerId::new(1);
const INFANTRY: UnitTypeId = UnitTypeId::new(0);
const FIGHTER: UnitTypeId = UnitTypeId::new(1);
const SUBMARINE: UnitTypeId = UnitTypeId::new(2);
const DESTROYER: UnitTypeId = UnitTypeId::new(3);
const AA_GUN: UnitTypeId = UnitTypeId::new(4);

fn unit(id: u32, unit_type: UnitTypeId, owner: PlayerId) -> EngagedUnit {
    EngagedUnit::new(UnitId(id), unit_type, owner).with_attack(2).with_defense(2)
}

fn general(unit_types: &[UnitTypeId]) -> CombatUnitAbility {
    CombatUnitAbility::new("units")
        .with_sides([Side::Offense, Side::Defense])
        .attached(unit_types.iter().copied())
}

// =============================================================================
// Registration Tests
// =============================================================================

/// Test the default phases come in rule order.
#[test]
fn test_default_phase_order() {
    let list = BattlePhaseList::with_defaults();
    let orders: Vec<i32> = list.phases().iter().map(|p| p.order()).collect();
    assert_eq!(orders, vec![100, 200, 300, 400]);
    assert_eq!(list.phase(AA_PHASE).unwrap().order(), 100);
    assert_eq!(list.phase(BOMBARD_PHASE).unwrap().order(), 200);
}

/// Test a duplicate order is rejected and leaves the list untouched.
#[test]
fn test_duplicate_order_rejected() {
    let mut list = BattlePhaseList::new();
    list.register("first", 1).unwrap();
    let err = list.register("second", 1).unwrap_err();
    assert!(matches!(err, BattleError::InvalidArgument(_)));
    assert_eq!(list.phases().len(), 1);
}

/// Test custom phases slot in by order, not by registration time.
#[test]
fn test_custom_phase_order() {
    let mut list = BattlePhaseList::new();
    list.register("late", 50).unwrap();
    list.register("early", 10).unwrap();
    list.register("middle", 30).unwrap();
    let names: Vec<&str> = list.phases().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["early", "middle", "late"]);
}

// =============================================================================
// Merge Tests
// =============================================================================

/// Test merging two structurally identical abilities twice leaves one
/// entry with the union of unit types.
#[test]
fn test_merge_idempotent() {
    let mut list = BattlePhaseList::with_defaults();
    for _ in 0..2 {
        list.add_or_merge_ability(GENERAL_PHASE, RED, general(&[INFANTRY])).unwrap();
        list.add_or_merge_ability(GENERAL_PHASE, RED, general(&[FIGHTER])).unwrap();
    }

    let abilities = list.phase(GENERAL_PHASE).unwrap().abilities(RED);
    assert_eq!(abilities.len(), 1);
    let attached: Vec<_> = abilities[0].attached_unit_types.iter().copied().collect();
    assert_eq!(attached, vec![INFANTRY, FIGHTER]);
}

/// Test the returned handle refers to the entry that absorbed the merge.
#[test]
fn test_merge_preserves_identity() {
    let mut list = BattlePhaseList::with_defaults();
    let first = list.add_or_merge_ability(GENERAL_PHASE, RED, general(&[INFANTRY])).unwrap();
    let second = list.add_or_merge_ability(GENERAL_PHASE, RED, general(&[FIGHTER])).unwrap();

    assert!(!first.slot.merged);
    assert!(second.slot.merged);
    assert_eq!(first.slot.index, second.slot.index);
    assert_eq!(first.phase, second.phase);
    assert!(list.ability(first).unwrap().applies_to(FIGHTER));
}

/// Test abilities differing in anything but unit types stay separate.
#[test]
fn test_distinct_abilities_not_merged() {
    let mut list = BattlePhaseList::with_defaults();
    list.add_or_merge_ability(GENERAL_PHASE, RED, general(&[INFANTRY])).unwrap();
    list.add_or_merge_ability(GENERAL_PHASE, RED, general(&[FIGHTER]).with_targets([INFANTRY]))
        .unwrap();
    list.add_or_merge_ability(GENERAL_PHASE, RED, general(&[FIGHTER]).with_dice(AbilityDice::Bombard))
        .unwrap();
    assert_eq!(list.phase(GENERAL_PHASE).unwrap().abilities(RED).len(), 3);
}

/// Test participants never share ability lists.
#[test]
fn test_participants_isolated() {
    let mut list = BattlePhaseList::with_defaults();
    list.add_or_merge_ability(GENERAL_PHASE, RED, general(&[INFANTRY])).unwrap();
    let general_phase = list.phase(GENERAL_PHASE).unwrap();
    assert_eq!(general_phase.abilities(RED).len(), 1);
    assert!(general_phase.abilities(BLUE).is_empty());
}

/// Test clearing resets every phase.
#[test]
fn test_clear_between_rounds() {
    let mut list = BattlePhaseList::with_defaults();
    list.add_or_merge_ability(AA_PHASE, BLUE, general(&[AA_GUN])).unwrap();
    list.add_or_merge_ability(GENERAL_PHASE, RED, general(&[INFANTRY])).unwrap();
    list.clear_all_abilities();
    assert!(list.phases().iter().all(|p| p.participants().is_empty()));
    assert_eq!(list.phases().len(), 4);
}

// =============================================================================
// Active Phase Tests
// =============================================================================

/// Test only phases with attached units present produce a step.
#[test]
fn test_active_phases() {
    let mut list = BattlePhaseList::with_defaults();
    list.add_or_merge_ability(
        AA_PHASE,
        BLUE,
        CombatUnitAbility::new("aa")
            .with_dice(AbilityDice::Aa)
            .with_sides([Side::Defense])
            .with_rounds(1)
            .with_targets([FIGHTER])
            .attached([AA_GUN]),
    )
    .unwrap();
    list.add_or_merge_ability(GENERAL_PHASE, RED, general(&[INFANTRY, FIGHTER])).unwrap();
    list.add_or_merge_ability(GENERAL_PHASE, BLUE, general(&[INFANTRY])).unwrap();

    let attacking = [unit(1, INFANTRY, RED), unit(2, FIGHTER, RED)];
    let defending = [unit(3, INFANTRY, BLUE), unit(4, AA_GUN, BLUE)];
    let engagement = Engagement { attacker: RED, defender: BLUE, attacking: &attacking, defending: &defending };

    let first_round: Vec<&str> = list.active_phases(&engagement, 0).iter().map(|p| p.name()).collect();
    assert_eq!(first_round, vec![AA_PHASE, GENERAL_PHASE]);

    // Anti-air fires in the first round only
    let second_round: Vec<&str> = list.active_phases(&engagement, 1).iter().map(|p| p.name()).collect();
    assert_eq!(second_round, vec![GENERAL_PHASE]);
}

/// Test an enemy destroyer takes away submarine first strike.
#[test]
fn test_destroyer_cancels_first_strike() {
    let sneak = CombatUnitAbility::new("first strike")
        .with_sides([Side::Offense])
        .with_return_fire(false);

    let mut list = BattlePhaseList::with_defaults();
    list.add_or_merge_ability(FIRST_STRIKE_PHASE, RED, sneak.clone().attached([SUBMARINE])).unwrap();
    list.add_or_merge_convert_ability(
        RED,
        ConvertUnitAbility::new("destroyer blocks first strike", sneak)
            .attached([DESTROYER])
            .with_factions([Faction::Enemy]),
    );

    let attacking = [unit(1, SUBMARINE, RED)];
    let with_destroyer = [unit(2, DESTROYER, BLUE)];
    let engagement = Engagement { attacker: RED, defender: BLUE, attacking: &attacking, defending: &with_destroyer };
    assert!(list.active_phases(&engagement, 0).is_empty());

    // Our own destroyer does not count as the enemy's
    let own = [unit(1, SUBMARINE, RED), unit(3, DESTROYER, RED)];
    let engagement = Engagement { attacker: RED, defender: BLUE, attacking: &own, defending: &[] };
    assert_eq!(list.active_phases(&engagement, 0).len(), 1);
}
