//! Ability registry and battle phases.
//!
//! A battle walks an ordered list of [`BattlePhase`]s. Each phase holds,
//! per participant, the [`CombatUnitAbility`]s that fire in it. Abilities
//! are registered with merge-on-attach semantics: registering an ability
//! that differs from an existing one only in its attached unit types widens
//! the existing entry instead of adding a second one.
//!
//! ## Example
//!
//! ```
//! use battle_engine::abilities::{BattlePhaseList, CombatUnitAbility, GENERAL_PHASE};
//! use battle_engine::core::{PlayerId, Side, UnitTypeId};
//!
//! let mut phases = BattlePhaseList::with_defaults();
//! let attacker = PlayerId::new(0);
//!
//! let infantry = CombatUnitAbility::new("units")
//!     .with_sides([Side::Offense])
//!     .attached([UnitTypeId::new(0)]);
//! let tanks = CombatUnitAbility::new("units")
//!     .with_sides([Side::Offense])
//!     .attached([UnitTypeId::new(1)]);
//!
//! let first = phases.add_or_merge_ability(GENERAL_PHASE, attacker, infantry).unwrap();
//! let second = phases.add_or_merge_ability(GENERAL_PHASE, attacker, tanks).unwrap();
//!
//! // One stored ability covering both unit types
//! assert_eq!(first.slot.index, second.slot.index);
//! assert!(second.slot.merged);
//! let general = phases.phase(GENERAL_PHASE).unwrap();
//! assert_eq!(general.abilities(attacker).len(), 1);
//! assert_eq!(general.abilities(attacker)[0].attached_unit_types.len(), 2);
//! ```

mod ability;
mod phase;
mod phase_list;

pub use ability::{
    add_or_merge, AbilityDice, AbilitySlot, CombatUnitAbility, ConvertUnitAbility, Faction,
    Mergeable, SideSet,
};
pub use phase::BattlePhase;
pub use phase_list::{
    AbilityHandle, BattlePhaseList, Engagement, PhaseHandle, AA_PHASE, BOMBARD_PHASE,
    FIRST_STRIKE_PHASE, GENERAL_PHASE,
};
