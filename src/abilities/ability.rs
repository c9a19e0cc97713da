//! Combat and conversion abilities.
//!
//! An ability is a definition plus the set of unit types it currently
//! applies to. Two abilities are *mergeable* when every field except the
//! attached unit types is structurally equal; merging unions the attached
//! sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{Side, UnitTypeId};
use crate::random::DiceType;

/// Which kind of fire an ability represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityDice {
    Normal,
    Aa,
    Bombard,
}

impl AbilityDice {
    /// Audit classification of draws made for this fire.
    #[must_use]
    pub const fn dice_type(self) -> DiceType {
        match self {
            AbilityDice::Normal => DiceType::Combat,
            AbilityDice::Aa => DiceType::Aa,
            AbilityDice::Bombard => DiceType::Bombard,
        }
    }
}

/// Sorted, deduplicated set of sides.
pub type SideSet = SmallVec<[Side; 2]>;

fn side_set(sides: impl IntoIterator<Item = Side>) -> SideSet {
    let mut set: SideSet = sides.into_iter().collect();
    set.sort_unstable();
    set.dedup();
    set
}

/// Abilities that can be merged into an existing entry.
///
/// Implemented per ability kind with an explicit structural comparison;
/// nothing inspects types at runtime.
pub trait Mergeable {
    /// Unit types the ability currently applies to.
    fn attached_unit_types(&self) -> &BTreeSet<UnitTypeId>;

    /// Union `other`'s attached unit types into this ability.
    fn attach_all(&mut self, other: &BTreeSet<UnitTypeId>);

    /// True when every field other than the attached unit types is equal.
    fn is_mergeable_with(&self, other: &Self) -> bool;
}

/// A way some unit types fire during a battle phase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatUnitAbility {
    pub name: String,
    pub attached_unit_types: BTreeSet<UnitTypeId>,
    pub dice: AbilityDice,
    /// Sides the ability fires on.
    pub sides: SideSet,
    /// Number of rounds the ability fires in; `u32::MAX` for every round.
    pub rounds: u32,
    /// Unit types the ability may hit. Empty means any.
    pub targets: BTreeSet<UnitTypeId>,
    /// Whether units hit by this fire still fire back this round.
    pub return_fire: bool,
    /// Sides on which a firing unit dies after scoring a hit.
    pub suicide_on_hit: SideSet,
    /// Sides on which a firing unit dies after firing.
    pub suicide: SideSet,
}

impl CombatUnitAbility {
    /// Normal fire with no attached units, no sides, every round, any target,
    /// and return fire allowed.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attached_unit_types: BTreeSet::new(),
            dice: AbilityDice::Normal,
            sides: SideSet::new(),
            rounds: u32::MAX,
            targets: BTreeSet::new(),
            return_fire: true,
            suicide_on_hit: SideSet::new(),
            suicide: SideSet::new(),
        }
    }

    #[must_use]
    pub fn attached(mut self, unit_types: impl IntoIterator<Item = UnitTypeId>) -> Self {
        self.attached_unit_types.extend(unit_types);
        self
    }

    #[must_use]
    pub fn with_dice(mut self, dice: AbilityDice) -> Self {
        self.dice = dice;
        self
    }

    #[must_use]
    pub fn with_sides(mut self, sides: impl IntoIterator<Item = Side>) -> Self {
        self.sides = side_set(sides);
        self
    }

    #[must_use]
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    #[must_use]
    pub fn with_targets(mut self, targets: impl IntoIterator<Item = UnitTypeId>) -> Self {
        self.targets = targets.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_return_fire(mut self, return_fire: bool) -> Self {
        self.return_fire = return_fire;
        self
    }

    #[must_use]
    pub fn with_suicide_on_hit(mut self, sides: impl IntoIterator<Item = Side>) -> Self {
        self.suicide_on_hit = side_set(sides);
        self
    }

    #[must_use]
    pub fn with_suicide(mut self, sides: impl IntoIterator<Item = Side>) -> Self {
        self.suicide = side_set(sides);
        self
    }

    #[must_use]
    pub fn applies_to(&self, unit_type: UnitTypeId) -> bool {
        self.attached_unit_types.contains(&unit_type)
    }

    #[must_use]
    pub fn fires_on(&self, side: Side) -> bool {
        self.sides.contains(&side)
    }

    /// Whether the ability still fires in zero-based `round`.
    #[must_use]
    pub fn fires_in_round(&self, round: u32) -> bool {
        round < self.rounds
    }

    #[must_use]
    pub fn can_target(&self, unit_type: UnitTypeId) -> bool {
        self.targets.is_empty() || self.targets.contains(&unit_type)
    }
}

impl Mergeable for CombatUnitAbility {
    fn attached_unit_types(&self) -> &BTreeSet<UnitTypeId> {
        &self.attached_unit_types
    }

    fn attach_all(&mut self, other: &BTreeSet<UnitTypeId>) {
        self.attached_unit_types.extend(other.iter().copied());
    }

    fn is_mergeable_with(&self, other: &Self) -> bool {
        self.name == other.name
            && self.dice == other.dice
            && self.sides == other.sides
            && self.rounds == other.rounds
            && self.targets == other.targets
            && self.return_fire == other.return_fire
            && self.suicide_on_hit == other.suicide_on_hit
            && self.suicide == other.suicide
    }
}

/// Whose units trigger a conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Units on the same side as the ability's owner.
    Allied,
    /// Units on the opposing side.
    Enemy,
}

/// Replaces one combat ability with another while certain units are present.
///
/// While a unit of an attached type is present on a matching faction, the
/// owner's ability matching `from` is replaced by `to` for the same unit
/// types, or suppressed when `to` is `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertUnitAbility {
    pub name: String,
    pub attached_unit_types: BTreeSet<UnitTypeId>,
    pub factions: SmallVec<[Faction; 2]>,
    pub from: CombatUnitAbility,
    pub to: Option<CombatUnitAbility>,
}

impl ConvertUnitAbility {
    pub fn new(name: impl Into<String>, from: CombatUnitAbility) -> Self {
        Self {
            name: name.into(),
            attached_unit_types: BTreeSet::new(),
            factions: SmallVec::new(),
            from,
            to: None,
        }
    }

    #[must_use]
    pub fn attached(mut self, unit_types: impl IntoIterator<Item = UnitTypeId>) -> Self {
        self.attached_unit_types.extend(unit_types);
        self
    }

    #[must_use]
    pub fn with_factions(mut self, factions: impl IntoIterator<Item = Faction>) -> Self {
        let mut set: SmallVec<[Faction; 2]> = factions.into_iter().collect();
        set.sort_unstable();
        set.dedup();
        self.factions = set;
        self
    }

    #[must_use]
    pub fn converting_to(mut self, to: CombatUnitAbility) -> Self {
        self.to = Some(to);
        self
    }
}

impl Mergeable for ConvertUnitAbility {
    fn attached_unit_types(&self) -> &BTreeSet<UnitTypeId> {
        &self.attached_unit_types
    }

    fn attach_all(&mut self, other: &BTreeSet<UnitTypeId>) {
        self.attached_unit_types.extend(other.iter().copied());
    }

    fn is_mergeable_with(&self, other: &Self) -> bool {
        self.name == other.name
            && self.factions == other.factions
            && self.from == other.from
            && self.to == other.to
    }
}

/// Position of an ability within a participant's list, returned by
/// add-or-merge so callers can refer back to the stored entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilitySlot {
    pub index: usize,
    /// True when the ability was folded into an existing entry.
    pub merged: bool,
}

/// Append `item`, or fold it into the first mergeable entry.
///
/// First match wins; a later, equally mergeable entry is never considered.
pub fn add_or_merge<T: Mergeable>(list: &mut Vec<T>, item: T) -> AbilitySlot {
    match list.iter().position(|existing| existing.is_mergeable_with(&item)) {
        Some(index) => {
            list[index].attach_all(item.attached_unit_types());
            AbilitySlot { index, merged: true }
        }
        None => {
            list.push(item);
            AbilitySlot {
                index: list.len() - 1,
                merged: false,
            }
        }
    }
}
