//! Dice resolution integration tests.
//!
//! These tests check the numeric behaviour of both strategies against the
//! random source contract: exact hit counts, expected hits, and exactly
//! which draws are made.

use battle_engine::core::{DiceMode, PlayerId};
use battle_engine::dice::{
    self, participant_from_annotation, roll_n_dice, DieOutcome, LowLuckDice, RollContext,
};
use battle_engine::error::{BattleError, Result};
use battle_engine::power::{self, PowerAndRolls, UnitPower};
use battle_engine::random::{DiceType, DrawRequest, RandomSource, SeededRandomSource};
use proptest::prelude::*;

/// Returns a fixed value for every die and counts calls.
struct CountingSource {
    value: u32,
    calls: usize,
    dice: u32,
}

impl CountingSource {
    fn new(value: u32) -> Self {
        Self { value, calls: 0, dice: 0 }
    }
}

impl RandomSource for CountingSource {
    fn draw(&mut self, request: &DrawRequest) -> Result<Vec<u32>> {
        self.calls += 1;
        self.dice += request.count;
        Ok(vec![self.value.min(request.upper_bound - 1); request.count as usize])
    }
}

fn ctx() -> RollContext {
    RollContext::new(PlayerId::new(0), DiceType::Combat, "Player0 roll dice for units in Egypt, round 1")
}

fn group(power: u32, sides: u32) -> PowerAndRolls {
    PowerAndRolls { power, rolls: 1, dice_sides: sides }
}

// =============================================================================
// Low Luck Tests
// =============================================================================

/// Test 13 power on a d6 with a low remainder die: one extra hit.
#[test]
fn test_low_luck_remainder_hits() {
    let mut source = CountingSource::new(0);
    let roll = LowLuckDice.resolve_power(group(13, 6), &ctx(), &mut source).unwrap();

    assert_eq!(roll.hit_count, 3);
    assert_eq!(roll.dice.len(), 1);
    assert_eq!(roll.dice[0].threshold, 1);
    assert_eq!(roll.dice[0].outcome, DieOutcome::Hit);
    assert!((roll.expected_hits - 13.0 / 6.0).abs() < 1e-9);
    assert_eq!(source.calls, 1);
}

/// Test every remainder value from 1 to 5 misses a threshold of 1.
#[test]
fn test_low_luck_remainder_misses() {
    for value in 1..6 {
        let mut source = CountingSource::new(value);
        let roll = LowLuckDice.resolve_power(group(13, 6), &ctx(), &mut source).unwrap();
        assert_eq!(roll.hit_count, 2, "value {value}");
        assert_eq!(roll.dice[0].outcome, DieOutcome::Miss);
    }
}

/// Test exact multiples never consult the source.
#[test]
fn test_low_luck_exact_multiple() {
    let mut source = CountingSource::new(0);
    let roll = LowLuckDice.resolve_power(group(18, 6), &ctx(), &mut source).unwrap();
    assert_eq!(roll.hit_count, 3);
    assert!(roll.dice.is_empty());
    assert_eq!(roll.expected_hits, 3.0);
    assert_eq!(source.calls, 0);
}

/// Test zero power is an empty roll with no draws at all.
#[test]
fn test_zero_power_is_empty() {
    for mode in [DiceMode::Standard, DiceMode::LowLuck] {
        let mut source = CountingSource::new(0);
        let units = [UnitPower::new(0, 6), UnitPower::new(0, 6)];
        let roll = dice::resolve(mode, &units, 6, &ctx(), &mut source).unwrap();

        assert_eq!(roll.hit_count, 0);
        assert_eq!(roll.expected_hits, 0.0);
        assert!(roll.dice.is_empty());
        assert_eq!(source.calls, 0, "{mode:?}");
    }
}

/// Test an empty group never consults the source either.
#[test]
fn test_empty_group() {
    let mut source = CountingSource::new(0);
    let roll = dice::resolve(DiceMode::LowLuck, &[], 6, &ctx(), &mut source).unwrap();
    assert_eq!(roll.hit_count, 0);
    assert_eq!(source.calls, 0);
}

proptest! {
    /// Hit count is the floor, or the floor plus one.
    #[test]
    fn prop_low_luck_hits_bounded(power in 0u32..500, sides in 2u32..30, seed in any::<u64>()) {
        let mut source = SeededRandomSource::new(seed);
        let roll = LowLuckDice.resolve_power(group(power, sides), &ctx(), &mut source).unwrap();
        let base = power / sides;
        prop_assert!(roll.hit_count == base || roll.hit_count == base + 1);
        if power % sides == 0 {
            prop_assert_eq!(roll.hit_count, base);
        }
    }

    /// Expected hits is the exact ratio whichever branch ran.
    #[test]
    fn prop_low_luck_expected_hits(power in 0u32..500, sides in 2u32..30, seed in any::<u64>()) {
        let mut source = SeededRandomSource::new(seed);
        let roll = LowLuckDice.resolve_power(group(power, sides), &ctx(), &mut source).unwrap();
        let expected = f64::from(power) / f64::from(sides);
        prop_assert!((roll.expected_hits - expected).abs() < 1e-12);
    }

    /// At most one draw, and only when there is a remainder.
    #[test]
    fn prop_low_luck_draw_count(power in 0u32..500, sides in 2u32..30) {
        let mut source = CountingSource::new(0);
        LowLuckDice.resolve_power(group(power, sides), &ctx(), &mut source).unwrap();
        let expected_calls = usize::from(power % sides != 0);
        prop_assert_eq!(source.calls, expected_calls);
    }

    /// Standard mode throws exactly one die per roll of each contributing unit.
    #[test]
    fn prop_standard_one_die_per_roll(strengths in prop::collection::vec(0u32..8, 0..12)) {
        let units: Vec<UnitPower> = strengths.iter().map(|&s| UnitPower::new(s, 6)).collect();
        let contributing = units.iter().filter(|u| u.contributes()).count() as u32;

        let mut source = CountingSource::new(3);
        let roll = dice::resolve(DiceMode::Standard, &units, 6, &ctx(), &mut source).unwrap();

        prop_assert_eq!(source.dice, contributing);
        prop_assert_eq!(roll.dice.len() as u32, contributing);
        prop_assert!(roll.hit_count <= contributing);
        prop_assert_eq!(source.calls, usize::from(contributing > 0));
    }

    /// Aggregated power never exceeds die size times rolls per unit.
    #[test]
    fn prop_aggregate_power_bounded(strengths in prop::collection::vec(0u32..20, 0..10)) {
        let units: Vec<UnitPower> = strengths.iter().map(|&s| UnitPower::new(s, 6)).collect();
        let total = power::aggregate(&units, 6).unwrap();
        prop_assert!(total.power <= 6 * units.len() as u32);
        prop_assert_eq!(total.power, strengths.iter().map(|&s| s.min(6)).sum::<u32>());
    }
}

// =============================================================================
// Standard Mode Tests
// =============================================================================

/// Test the same seed gives the same roll.
#[test]
fn test_standard_is_deterministic() {
    let units = [UnitPower::new(1, 6), UnitPower::new(3, 6).with_rolls(2), UnitPower::new(4, 6)];
    let mut a = SeededRandomSource::new(11);
    let mut b = SeededRandomSource::new(11);

    let first = dice::resolve(DiceMode::Standard, &units, 6, &ctx(), &mut a).unwrap();
    let second = dice::resolve(DiceMode::Standard, &units, 6, &ctx(), &mut b).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.dice.len(), 4);
}

/// Test a strength above the die size always hits.
#[test]
fn test_standard_threshold_clamped() {
    let mut source = CountingSource::new(5);
    let roll = dice::resolve(DiceMode::Standard, &[UnitPower::new(9, 6)], 6, &ctx(), &mut source).unwrap();
    assert_eq!(roll.hit_count, 1);
    assert_eq!(roll.dice[0].threshold, 6);
}

/// Test mixed die sizes are rejected before any draw.
#[test]
fn test_mixed_dice_rejected() {
    let mut source = CountingSource::new(0);
    let units = [UnitPower::new(2, 6), UnitPower::new(2, 12)];
    let result = dice::resolve(DiceMode::Standard, &units, 6, &ctx(), &mut source);
    assert!(matches!(result, Err(BattleError::InvalidArgument(_))));
    assert_eq!(source.calls, 0);

    let groups = power::split_by_dice_sides(&units);
    assert_eq!(groups.len(), 2);
    for (sides, group) in groups {
        assert!(dice::resolve(DiceMode::Standard, &group, sides, &ctx(), &mut source).is_ok());
    }
}

// =============================================================================
// Raw Dice and Annotation Tests
// =============================================================================

/// Test raw dice count every die as a hit and keep the values.
#[test]
fn test_roll_n_dice() {
    let mut source = CountingSource::new(4);
    let roll = roll_n_dice(3, 6, &ctx(), &mut source).unwrap();
    assert_eq!(roll.hit_count, 3);
    assert!(roll.dice.iter().all(|d| d.rolled_value == 4 && d.outcome == DieOutcome::Ignored));

    let none = roll_n_dice(0, 6, &ctx(), &mut source).unwrap();
    assert!(none.is_empty());
    assert_eq!(source.calls, 1);
}

/// Test the annotation names the participant first.
#[test]
fn test_annotation_round_trip() {
    let text = dice::annotation(PlayerId::new(2), "bombers", "Germany", 0);
    assert_eq!(text, "Player2 roll dice for bombers in Germany, round 1");
    assert_eq!(participant_from_annotation(&text), Some("Player2"));
    assert_eq!(participant_from_annotation(""), None);
}
