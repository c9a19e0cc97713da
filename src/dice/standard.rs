//! Standard dice: one die per roll.

use tracing::debug;

use crate::error::Result;
use crate::power::{self, UnitPower};
use crate::random::{self, RandomSource};

use super::{DiceRoll, DiceStrategy, Die, RollContext};

/// Standard resolution strategy.
///
/// Every contributing unit throws `rolls` dice; a die hits when its value is
/// strictly below the unit's threshold. All dice for one firing come from a
/// single request, consumed in unit order.
///
/// A choose-best-roll unit throws all its dice but only its lowest value
/// counts; the others are recorded as ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardDice;

impl DiceStrategy for StandardDice {
    fn resolve(
        &self,
        units: &[UnitPower],
        dice_sides: u32,
        ctx: &RollContext,
        source: &mut dyn RandomSource,
    ) -> Result<DiceRoll> {
        let total = power::aggregate(units, dice_sides)?;
        if total.is_empty() {
            return Ok(DiceRoll::empty(ctx.participant));
        }

        let values = random::draw(
            source,
            dice_sides,
            total.rolls,
            ctx.participant,
            ctx.dice_type,
            ctx.annotation.clone(),
        )?;

        let mut dice = Vec::with_capacity(values.len());
        let mut hit_count = 0;
        let mut counted = 0;
        let mut next = values.iter().copied();

        for unit in units.iter().filter(|u| u.contributes()) {
            let threshold = unit.threshold();
            let unit_values: Vec<u32> = next.by_ref().take(unit.rolls as usize).collect();

            if unit.rolls > 1 && unit.choose_best_roll {
                let best = unit_values
                    .iter()
                    .enumerate()
                    .min_by_key(|&(i, v)| (*v, i))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                let die = Die::counted(unit_values[best], threshold);
                hit_count += u32::from(die.is_hit());
                counted += 1;
                dice.push(die);
                dice.extend(
                    unit_values
                        .iter()
                        .enumerate()
                        .filter(|&(i, _)| i != best)
                        .map(|(_, &v)| Die::ignored(v, threshold)),
                );
            } else {
                for v in unit_values {
                    let die = Die::counted(v, threshold);
                    hit_count += u32::from(die.is_hit());
                    counted += 1;
                    dice.push(die);
                }
            }
        }

        debug!(
            participant = %ctx.participant,
            power = total.power,
            rolls = total.rolls,
            hit_count,
            "standard roll"
        );

        DiceRoll::checked(dice, hit_count, total.expected_hits(), ctx.participant, counted)
    }
}
