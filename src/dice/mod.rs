//! Dice resolution.
//!
//! Turns a group's power into hits. Two interchangeable strategies:
//!
//! - [`StandardDice`]: one die per roll, hit when the value is under the
//!   unit's threshold
//! - [`LowLuckDice`]: `power / dice_sides` hits outright, one die for the
//!   remainder
//!
//! Both are zero-based: a value `v` in `[0, dice_sides)` hits a threshold
//! `t` iff `v < t`. Neither touches the random source when the group has
//! no power, so peers that disagree about nothing else never disagree about
//! how many draws a battle consumed.
//!
//! ## Example
//!
//! ```
//! use battle_engine::core::{DiceMode, PlayerId};
//! use battle_engine::dice::{resolve, RollContext};
//! use battle_engine::power::UnitPower;
//! use battle_engine::random::{DiceType, SeededRandomSource};
//!
//! let mut source = SeededRandomSource::new(1);
//! let ctx = RollContext::new(PlayerId::new(0), DiceType::Combat, "example");
//!
//! // 12 power on a d6 in low luck is exactly 2 hits, no dice needed
//! let units = [UnitPower::new(6, 6), UnitPower::new(6, 6)];
//! let roll = resolve(DiceMode::LowLuck, &units, 6, &ctx, &mut source).unwrap();
//! assert_eq!(roll.hit_count, 2);
//! assert!(roll.dice.is_empty());
//! assert_eq!(source.draws(), 0);
//! ```

mod low_luck;
mod standard;

pub use low_luck::LowLuckDice;
pub use standard::StandardDice;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::core::{DiceMode, PlayerId};
use crate::error::{BattleError, Result};
use crate::power::UnitPower;
use crate::random::{self, DiceType, RandomSource};

/// Outcome of a single die.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DieOutcome {
    Hit,
    Miss,
    /// Thrown but not counted (the discarded dice of a best-of-n roll).
    Ignored,
}

/// One thrown die.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Die {
    /// Zero-based value.
    pub rolled_value: u32,
    /// Values strictly below this hit.
    pub threshold: u32,
    pub outcome: DieOutcome,
}

impl Die {
    /// A counted die; hit iff `rolled_value < threshold`.
    #[must_use]
    pub fn counted(rolled_value: u32, threshold: u32) -> Self {
        let outcome = if rolled_value < threshold {
            DieOutcome::Hit
        } else {
            DieOutcome::Miss
        };
        Self {
            rolled_value,
            threshold,
            outcome,
        }
    }

    #[must_use]
    pub fn ignored(rolled_value: u32, threshold: u32) -> Self {
        Self {
            rolled_value,
            threshold,
            outcome: DieOutcome::Ignored,
        }
    }

    #[must_use]
    pub fn is_hit(&self) -> bool {
        self.outcome == DieOutcome::Hit
    }
}

/// The resolved outcome of one firing. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub dice: Vec<Die>,
    /// Not necessarily the number of hit dice: low luck scores most hits
    /// without throwing anything.
    pub hit_count: u32,
    pub expected_hits: f64,
    pub participant: PlayerId,
}

impl DiceRoll {
    /// A roll with no dice and no hits.
    #[must_use]
    pub fn empty(participant: PlayerId) -> Self {
        Self {
            dice: Vec::new(),
            hit_count: 0,
            expected_hits: 0.0,
            participant,
        }
    }

    /// Build a roll, failing if `hit_count` exceeds what the input could
    /// possibly produce.
    ///
    /// Exceeding `max_hits` means the power or ability computation upstream
    /// is corrupt; the error is fatal.
    pub fn checked(
        dice: Vec<Die>,
        hit_count: u32,
        expected_hits: f64,
        participant: PlayerId,
        max_hits: u32,
    ) -> Result<Self> {
        if hit_count > max_hits {
            error!(hit_count, max_hits, %participant, "dice roll exceeded its maximum hits");
            return Err(BattleError::invariant(format!(
                "{hit_count} hits exceeds the maximum of {max_hits} for {participant}"
            )));
        }
        Ok(Self {
            dice,
            hit_count,
            expected_hits,
            participant,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    /// Dice thrown at the given threshold.
    pub fn dice_at(&self, threshold: u32) -> impl Iterator<Item = &Die> {
        self.dice.iter().filter(move |d| d.threshold == threshold)
    }
}

/// Audit information attached to every draw of a firing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollContext {
    pub participant: PlayerId,
    pub dice_type: DiceType,
    pub annotation: String,
}

impl RollContext {
    pub fn new(participant: PlayerId, dice_type: DiceType, annotation: impl Into<String>) -> Self {
        Self {
            participant,
            dice_type,
            annotation: annotation.into(),
        }
    }
}

/// A dice resolution strategy.
pub trait DiceStrategy {
    /// Resolve a group of contributions rolling on `dice_sides`.
    ///
    /// The group must share one die size.
    fn resolve(
        &self,
        units: &[UnitPower],
        dice_sides: u32,
        ctx: &RollContext,
        source: &mut dyn RandomSource,
    ) -> Result<DiceRoll>;
}

/// Resolve with the strategy selected by `mode`.
pub fn resolve(
    mode: DiceMode,
    units: &[UnitPower],
    dice_sides: u32,
    ctx: &RollContext,
    source: &mut dyn RandomSource,
) -> Result<DiceRoll> {
    match mode {
        DiceMode::Standard => StandardDice.resolve(units, dice_sides, ctx, source),
        DiceMode::LowLuck => LowLuckDice.resolve(units, dice_sides, ctx, source),
    }
}

/// Throw `count` raw dice, every one of which counts.
///
/// Used where the values themselves matter (damage rolls) rather than a
/// hit threshold. A zero count returns an empty roll without drawing.
pub fn roll_n_dice(
    count: u32,
    dice_sides: u32,
    ctx: &RollContext,
    source: &mut dyn RandomSource,
) -> Result<DiceRoll> {
    if count == 0 {
        return Ok(DiceRoll::empty(ctx.participant));
    }
    let values = random::draw(
        source,
        dice_sides,
        count,
        ctx.participant,
        ctx.dice_type,
        ctx.annotation.clone(),
    )?;
    let dice = values.into_iter().map(|v| Die::ignored(v, 1)).collect();
    Ok(DiceRoll {
        dice,
        hit_count: count,
        expected_hits: f64::from(count),
        participant: ctx.participant,
    })
}

/// Standard annotation for a firing:
/// `"<participant> roll dice for <subject> in <territory>, round <n>"`.
///
/// `round` is zero-based; the text is one-based.
pub fn annotation(participant: PlayerId, subject: &str, territory: &str, round: u32) -> String {
    format!(
        "{} roll dice for {} in {}, round {}",
        participant,
        subject,
        territory,
        round + 1
    )
}

/// Recover the participant name from an [`annotation`].
#[must_use]
pub fn participant_from_annotation(annotation: &str) -> Option<&str> {
    annotation.split(' ').next().filter(|s| !s.is_empty())
}
