//! Low-luck dice.
//!
//! Most of the outcome is a deterministic function of total power:
//!
//! 1. `hits = power / dice_sides`, no randomness.
//! 2. `remainder = power % dice_sides`.
//! 3. If `remainder > 0`, one die `v` is drawn; `v < remainder` adds a hit.
//! 4. `expected_hits = power / dice_sides` as an exact ratio, whichever
//!    branch ran.
//!
//! A group with no power returns immediately and never calls the source.
//! A zero-sided die is an argument error.

use tracing::debug;

use crate::error::{BattleError, Result};
use crate::power::{self, PowerAndRolls, UnitPower};
use crate::random::{self, RandomSource};

use super::{DiceRoll, DiceStrategy, Die, RollContext};

/// Low-luck resolution strategy.
#[derive(Clone, Copy, Debug, Default)]
pub struct LowLuckDice;

impl LowLuckDice {
    /// Resolve an already aggregated group.
    pub fn resolve_power(
        &self,
        total: PowerAndRolls,
        ctx: &RollContext,
        source: &mut dyn RandomSource,
    ) -> Result<DiceRoll> {
        if total.dice_sides == 0 {
            return Err(BattleError::invalid(format!(
                "dice sides must be positive ({})",
                ctx.annotation
            )));
        }
        if total.power == 0 {
            return Ok(DiceRoll::empty(ctx.participant));
        }

        let sides = total.dice_sides;
        let mut hit_count = total.power / sides;
        let remainder = total.power % sides;
        let mut dice = Vec::new();

        if remainder > 0 {
            let values = random::draw(
                source,
                sides,
                1,
                ctx.participant,
                ctx.dice_type,
                ctx.annotation.clone(),
            )?;
            let die = Die::counted(values[0], remainder);
            if die.is_hit() {
                hit_count += 1;
            }
            dice.push(die);
        }

        debug!(
            participant = %ctx.participant,
            power = total.power,
            sides,
            remainder,
            hit_count,
            "low luck roll"
        );

        let max_hits = total.power.div_ceil(sides);
        DiceRoll::checked(dice, hit_count, total.expected_hits(), ctx.participant, max_hits)
    }
}

impl DiceStrategy for LowLuckDice {
    fn resolve(
        &self,
        units: &[UnitPower],
        dice_sides: u32,
        ctx: &RollContext,
        source: &mut dyn RandomSource,
    ) -> Result<DiceRoll> {
        let total = power::aggregate(units, dice_sides)?;
        self.resolve_power(total, ctx, source)
    }
}
