//! Engaged unit model.
//!
//! The engine reads units from the surrounding map model; it never owns unit
//! statistics content. An [`EngagedUnit`] is the read-only view of one unit
//! taking part in a battle: its type, owner, per-side strength, how many dice
//! it throws and on which die size.
//!
//! ```
//! use battle_engine::core::{EngagedUnit, PlayerId, Side, UnitId, UnitTypeId};
//!
//! let infantry = EngagedUnit::new(UnitId(1), UnitTypeId::new(0), PlayerId::new(0))
//!     .with_attack(1)
//!     .with_defense(2);
//!
//! assert_eq!(infantry.strength(Side::Offense), 1);
//! assert_eq!(infantry.strength(Side::Defense), 2);
//! ```

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// Identifier of a unit type (infantry, fighter, ...). Opaque to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitTypeId(pub u32);

impl UnitTypeId {
    /// Create a new unit type ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for UnitTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UnitType({})", self.0)
    }
}

/// Identifier of one concrete unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unit({})", self.0)
    }
}

/// A unit taking part in a battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagedUnit {
    pub id: UnitId,
    pub unit_type: UnitTypeId,
    pub owner: PlayerId,

    /// Hit threshold when attacking, support already folded in.
    pub attack: u32,

    /// Hit threshold when defending, support already folded in.
    pub defense: u32,

    /// Dice thrown per firing.
    pub rolls: u32,

    /// Die size this unit rolls on. Zero means the battle's configured
    /// die size.
    pub dice_sides: u32,

    /// Keep only the best of `rolls` dice instead of counting each.
    pub choose_best_roll: bool,

    /// Hits this unit can absorb before it is removed.
    pub hit_points: u32,
}

impl EngagedUnit {
    /// A unit with no strength, one roll on the battle's die and one hit
    /// point.
    pub fn new(id: UnitId, unit_type: UnitTypeId, owner: PlayerId) -> Self {
        Self {
            id,
            unit_type,
            owner,
            attack: 0,
            defense: 0,
            rolls: 1,
            dice_sides: 0,
            choose_best_roll: false,
            hit_points: 1,
        }
    }

    #[must_use]
    pub fn with_attack(mut self, attack: u32) -> Self {
        self.attack = attack;
        self
    }

    #[must_use]
    pub fn with_defense(mut self, defense: u32) -> Self {
        self.defense = defense;
        self
    }

    #[must_use]
    pub fn with_rolls(mut self, rolls: u32) -> Self {
        self.rolls = rolls;
        self
    }

    #[must_use]
    pub fn with_dice_sides(mut self, dice_sides: u32) -> Self {
        self.dice_sides = dice_sides;
        self
    }

    #[must_use]
    pub fn choosing_best_roll(mut self) -> Self {
        self.choose_best_roll = true;
        self
    }

    #[must_use]
    pub fn with_hit_points(mut self, hit_points: u32) -> Self {
        self.hit_points = hit_points;
        self
    }

    /// Strength when fighting on `side`.
    #[must_use]
    pub const fn strength(&self, side: super::Side) -> u32 {
        match side {
            super::Side::Offense => self.attack,
            super::Side::Defense => self.defense,
        }
    }
}
