//! A single battle phase and its per-participant abilities.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

use super::ability::{add_or_merge, AbilitySlot, CombatUnitAbility};

/// A named, ordered stage of combat resolution (anti-air, first strike, ...).
///
/// Each participant holds its own list of abilities in the phase.
/// [`BattlePhase::add_or_merge_ability`] keeps the list free of mutually
/// mergeable entries; [`BattlePhase::add_ability`] appends unconditionally.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BattlePhase {
    name: String,
    order: i32,
    abilities: FxHashMap<PlayerId, Vec<CombatUnitAbility>>,
}

impl BattlePhase {
    pub(crate) fn new(name: impl Into<String>, order: i32) -> Self {
        Self {
            name: name.into(),
            order,
            abilities: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Append without merging.
    pub fn add_ability(&mut self, participant: PlayerId, ability: CombatUnitAbility) {
        self.abilities.entry(participant).or_default().push(ability);
    }

    /// Fold `ability` into the first mergeable entry of `participant`, or
    /// append it.
    ///
    /// The returned slot points at the stored entry: on a merge it is the
    /// pre-existing one, so anything already referring to that slot keeps
    /// referring to the merged ability.
    pub fn add_or_merge_ability(
        &mut self,
        participant: PlayerId,
        ability: CombatUnitAbility,
    ) -> AbilitySlot {
        add_or_merge(self.abilities.entry(participant).or_default(), ability)
    }

    /// Abilities of `participant`; empty when it has none.
    #[must_use]
    pub fn abilities(&self, participant: PlayerId) -> &[CombatUnitAbility] {
        self.abilities
            .get(&participant)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The ability stored at `slot`.
    #[must_use]
    pub fn ability(&self, participant: PlayerId, slot: AbilitySlot) -> Option<&CombatUnitAbility> {
        self.abilities(participant).get(slot.index)
    }

    /// Participants holding at least one ability, in id order.
    pub fn participants(&self) -> Vec<PlayerId> {
        let mut participants: Vec<PlayerId> = self
            .abilities
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(p, _)| *p)
            .collect();
        participants.sort_unstable();
        participants
    }

    #[must_use]
    pub fn has_abilities(&self) -> bool {
        self.abilities.values().any(|list| !list.is_empty())
    }

    /// Drop every ability of every participant.
    pub fn clear_abilities(&mut self) {
        self.abilities.clear();
    }
}
