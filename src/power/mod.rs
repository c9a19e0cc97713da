//! Power aggregation.
//!
//! Reduces a group of engaged units to the two numbers the dice resolvers
//! need: the total power of the group and the die size it rolls on.
//!
//! ## Precondition
//!
//! One call covers one die size. A group mixing die sizes is rejected with
//! an argument error; callers split first with [`split_by_dice_sides`].
//!
//! ## Example
//!
//! ```
//! use battle_engine::power::{aggregate, UnitPower};
//!
//! let group = [
//!     UnitPower::new(3, 6),
//!     UnitPower::new(0, 6), // contributes nothing and throws no die
//!     UnitPower::new(2, 6).with_rolls(2),
//! ];
//! let total = aggregate(&group, 6).unwrap();
//! assert_eq!(total.power, 7);
//! assert_eq!(total.rolls, 3);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{EngagedUnit, Side};
use crate::error::{BattleError, Result};

/// The contribution of one unit to a firing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPower {
    /// Hit threshold, support modifiers already included.
    pub strength: u32,
    pub rolls: u32,
    pub dice_sides: u32,
    pub choose_best_roll: bool,
}

impl UnitPower {
    /// One roll at `strength` on a `dice_sides` die.
    #[must_use]
    pub const fn new(strength: u32, dice_sides: u32) -> Self {
        Self {
            strength,
            rolls: 1,
            dice_sides,
            choose_best_roll: false,
        }
    }

    #[must_use]
    pub const fn with_rolls(mut self, rolls: u32) -> Self {
        self.rolls = rolls;
        self
    }

    #[must_use]
    pub const fn choosing_best_roll(mut self) -> Self {
        self.choose_best_roll = true;
        self
    }

    /// The contribution of `unit` fighting on `side`.
    #[must_use]
    pub fn of(unit: &EngagedUnit, side: Side) -> Self {
        Self {
            strength: unit.strength(side),
            rolls: unit.rolls,
            dice_sides: unit.dice_sides,
            choose_best_roll: unit.choose_best_roll,
        }
    }

    /// Strength clamped to the die size; a threshold above the die size
    /// cannot hit more than always.
    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.strength.min(self.dice_sides)
    }

    /// Whether this unit takes part in the roll at all.
    #[must_use]
    pub fn contributes(&self) -> bool {
        self.threshold() > 0 && self.rolls > 0
    }

    /// Power this unit adds to the group total.
    ///
    /// A choose-best-roll unit approximates the benefit of its extra dice by
    /// adding `max(1, dice_sides / 6)` per extra roll, capped at the die size.
    #[must_use]
    pub fn power(&self) -> u32 {
        if !self.contributes() {
            return 0;
        }
        let threshold = self.threshold();
        if self.rolls == 1 {
            threshold
        } else if self.choose_best_roll {
            let bonus = (self.dice_sides / 6).max(1);
            threshold
                .saturating_add(bonus.saturating_mul(self.rolls - 1))
                .min(self.dice_sides)
        } else {
            threshold.saturating_mul(self.rolls)
        }
    }
}

/// Total power of a group on one die size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerAndRolls {
    pub power: u32,
    pub rolls: u32,
    pub dice_sides: u32,
}

impl PowerAndRolls {
    /// A group with no power on the given die.
    #[must_use]
    pub const fn empty(dice_sides: u32) -> Self {
        Self {
            power: 0,
            rolls: 0,
            dice_sides,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.power == 0
    }

    /// Product of power and rolls.
    #[must_use]
    pub fn effective_power(&self) -> u64 {
        u64::from(self.power) * u64::from(self.rolls)
    }

    #[must_use]
    pub fn subtract_power(self, amount: u32) -> Self {
        Self {
            power: self.power.saturating_sub(amount),
            ..self
        }
    }

    #[must_use]
    pub fn subtract_rolls(self, amount: u32) -> Self {
        Self {
            rolls: self.rolls.saturating_sub(amount),
            ..self
        }
    }

    /// Expected hits: `power / dice_sides`, or zero without a die.
    #[must_use]
    pub fn expected_hits(&self) -> f64 {
        if self.dice_sides == 0 {
            return 0.0;
        }
        f64::from(self.power) / f64::from(self.dice_sides)
    }
}

/// Sum a group of unit contributions rolling on `dice_sides`.
///
/// Fails if `dice_sides` is zero or any unit rolls on a different die.
pub fn aggregate(units: &[UnitPower], dice_sides: u32) -> Result<PowerAndRolls> {
    if dice_sides == 0 {
        return Err(BattleError::invalid("dice sides must be positive"));
    }
    if let Some(other) = units.iter().find(|u| u.dice_sides != dice_sides) {
        return Err(BattleError::invalid(format!(
            "mixed die sizes in one group: d{} and d{}",
            dice_sides, other.dice_sides
        )));
    }

    let mut total = PowerAndRolls::empty(dice_sides);
    for unit in units.iter().filter(|u| u.contributes()) {
        total.power = total.power.saturating_add(unit.power());
        total.rolls = total.rolls.saturating_add(unit.rolls);
    }
    Ok(total)
}

/// Group contributions by die size, smallest die first.
pub fn split_by_dice_sides(units: &[UnitPower]) -> BTreeMap<u32, Vec<UnitPower>> {
    let mut groups: BTreeMap<u32, Vec<UnitPower>> = BTreeMap::new();
    for unit in units {
        groups.entry(unit.dice_sides).or_default().push(*unit);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PlayerId, UnitId, UnitTypeId};

    #[test]
    fn test_sum_of_strengths() {
        let group = [UnitPower::new(1, 6), UnitPower::new(2, 6), UnitPower::new(4, 6)];
        let total = aggregate(&group, 6).unwrap();
        assert_eq!(total.power, 7);
        assert_eq!(total.rolls, 3);
        assert_eq!(total.dice_sides, 6);
    }

    #[test]
    fn test_empty_and_zero_groups() {
        assert_eq!(aggregate(&[], 6).unwrap(), PowerAndRolls::empty(6));

        let zeros = [UnitPower::new(0, 6), UnitPower::new(0, 6).with_rolls(3)];
        let total = aggregate(&zeros, 6).unwrap();
        assert!(total.is_empty());
        assert_eq!(total.rolls, 0);
    }

    #[test]
    fn test_expected_hits() {
        let total = PowerAndRolls { power: 13, rolls: 3, dice_sides: 6 };
        assert!((total.expected_hits() - 13.0 / 6.0).abs() < 1e-12);

        let dieless = PowerAndRolls { power: 5, rolls: 1, dice_sides: 0 };
        assert_eq!(dieless.expected_hits(), 0.0);
    }

    #[test]
    fn test_zero_rolls_skipped() {
        let group = [UnitPower::new(3, 6).with_rolls(0), UnitPower::new(2, 6)];
        let total = aggregate(&group, 6).unwrap();
        assert_eq!(total.power, 2);
        assert_eq!(total.rolls, 1);
    }

    #[test]
    fn test_strength_clamped_to_die() {
        let total = aggregate(&[UnitPower::new(9, 6)], 6).unwrap();
        assert_eq!(total.power, 6);
    }

    #[test]
    fn test_multiple_rolls() {
        let total = aggregate(&[UnitPower::new(3, 6).with_rolls(2)], 6).unwrap();
        assert_eq!(total.power, 6);
        assert_eq!(total.rolls, 2);
    }

    #[test]
    fn test_choose_best_roll_bonus() {
        // d6: bonus 1 per extra roll
        let bomber = UnitPower::new(4, 6).with_rolls(2).choosing_best_roll();
        assert_eq!(bomber.power(), 5);

        // capped at the die size
        let bomber = UnitPower::new(5, 6).with_rolls(3).choosing_best_roll();
        assert_eq!(bomber.power(), 6);

        // d12: bonus 2 per extra roll
        let bomber = UnitPower::new(4, 12).with_rolls(2).choosing_best_roll();
        assert_eq!(bomber.power(), 6);
    }

    #[test]
    fn test_mixed_die_sizes_rejected() {
        let group = [UnitPower::new(1, 6), UnitPower::new(1, 12)];
        assert!(matches!(aggregate(&group, 6), Err(BattleError::InvalidArgument(_))));
        assert!(aggregate(&[], 0).is_err());
    }

    #[test]
    fn test_split_by_dice_sides() {
        let group = [UnitPower::new(1, 12), UnitPower::new(2, 6), UnitPower::new(3, 12)];
        let split = split_by_dice_sides(&group);
        assert_eq!(split.keys().copied().collect::<Vec<_>>(), vec![6, 12]);
        assert_eq!(split[&12].len(), 2);
        assert_eq!(aggregate(&split[&12], 12).unwrap().power, 4);
    }

    #[test]
    fn test_of_unit_uses_side() {
        let unit = EngagedUnit::new(UnitId(1), UnitTypeId::new(0), PlayerId::new(0))
            .with_attack(1)
            .with_defense(2);
        assert_eq!(UnitPower::of(&unit, Side::Offense).strength, 1);
        assert_eq!(UnitPower::of(&unit, Side::Defense).strength, 2);
    }

    #[test]
    fn test_subtract_saturates() {
        let total = PowerAndRolls { power: 5, rolls: 2, dice_sides: 6 };
        assert_eq!(total.effective_power(), 10);
        assert_eq!(total.subtract_power(7).power, 0);
        assert_eq!(total.subtract_rolls(1).rolls, 1);
        assert_eq!(total.subtract_rolls(3).rolls, 0);
    }
}
