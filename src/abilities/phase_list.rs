//! The ordered set of phases for one battle.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{EngagedUnit, PlayerId, Side};
use crate::error::{BattleError, Result};

use super::ability::{add_or_merge, AbilitySlot, CombatUnitAbility, ConvertUnitAbility, Faction, Mergeable};
use super::phase::BattlePhase;

pub const AA_PHASE: &str = "AA";
pub const BOMBARD_PHASE: &str = "BOMBARD";
pub const FIRST_STRIKE_PHASE: &str = "FIRST_STRIKE";
pub const GENERAL_PHASE: &str = "GENERAL";

/// Refers to a registered phase. Orders are unique within a list, so the
/// order doubles as the identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhaseHandle(i32);

impl PhaseHandle {
    #[must_use]
    pub fn of(phase: &BattlePhase) -> Self {
        Self(phase.order())
    }

    #[must_use]
    pub const fn order(self) -> i32 {
        self.0
    }
}

/// Refers to a stored combat ability.
///
/// Valid until the phase's abilities are cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilityHandle {
    pub phase: PhaseHandle,
    pub participant: PlayerId,
    pub slot: AbilitySlot,
}

/// Read-only view of who is fighting with what.
#[derive(Clone, Copy, Debug)]
pub struct Engagement<'a> {
    pub attacker: PlayerId,
    pub defender: PlayerId,
    pub attacking: &'a [EngagedUnit],
    pub defending: &'a [EngagedUnit],
}

impl<'a> Engagement<'a> {
    /// Units fighting on `side`.
    #[must_use]
    pub fn units(&self, side: Side) -> &'a [EngagedUnit] {
        match side {
            Side::Offense => self.attacking,
            Side::Defense => self.defending,
        }
    }

    /// The side `participant` fights on, if it fights at all.
    ///
    /// The attacker and defender are identified directly; any other
    /// participant fights on the side its units are on.
    #[must_use]
    pub fn side_of(&self, participant: PlayerId) -> Option<Side> {
        if participant == self.attacker {
            Some(Side::Offense)
        } else if participant == self.defender {
            Some(Side::Defense)
        } else if self.attacking.iter().any(|u| u.owner == participant) {
            Some(Side::Offense)
        } else if self.defending.iter().any(|u| u.owner == participant) {
            Some(Side::Defense)
        } else {
            None
        }
    }

    /// Units owned by `participant` on `side`.
    pub fn units_of(&self, participant: PlayerId, side: Side) -> impl Iterator<Item = &'a EngagedUnit> {
        self.units(side).iter().filter(move |u| u.owner == participant)
    }
}

/// All phases of a battle, in execution order, plus the conversion
/// abilities that rewrite them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BattlePhaseList {
    phases: Vec<BattlePhase>,
    convert_abilities: FxHashMap<PlayerId, Vec<ConvertUnitAbility>>,
}

impl BattlePhaseList {
    /// A list with no phases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The four standard phases: anti-air, bombardment, first strike and
    /// general combat, in that order.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut list = Self::new();
        for (name, order) in [
            (AA_PHASE, 100),
            (BOMBARD_PHASE, 200),
            (FIRST_STRIKE_PHASE, 300),
            (GENERAL_PHASE, 400),
        ] {
            list.phases.push(BattlePhase::new(name, order));
        }
        list
    }

    /// Register a phase.
    ///
    /// Fails if another phase already has the same order or the same name.
    pub fn register(&mut self, name: impl Into<String>, order: i32) -> Result<PhaseHandle> {
        let name = name.into();
        if self.phases.iter().any(|p| p.name() == name) {
            return Err(BattleError::invalid(format!("phase {name} already registered")));
        }
        match self.phases.binary_search_by_key(&order, BattlePhase::order) {
            Ok(existing) => Err(BattleError::invalid(format!(
                "phase {name} order {order} collides with phase {}",
                self.phases[existing].name()
            ))),
            Err(position) => {
                self.phases.insert(position, BattlePhase::new(name, order));
                Ok(PhaseHandle(order))
            }
        }
    }

    /// Phases in ascending order.
    #[must_use]
    pub fn phases(&self) -> &[BattlePhase] {
        &self.phases
    }

    #[must_use]
    pub fn phase(&self, name: &str) -> Option<&BattlePhase> {
        self.phases.iter().find(|p| p.name() == name)
    }

    pub fn phase_mut(&mut self, name: &str) -> Option<&mut BattlePhase> {
        self.phases.iter_mut().find(|p| p.name() == name)
    }

    #[must_use]
    pub fn handle(&self, name: &str) -> Option<PhaseHandle> {
        self.phase(name).map(PhaseHandle::of)
    }

    #[must_use]
    pub fn get(&self, handle: PhaseHandle) -> Option<&BattlePhase> {
        self.phases
            .binary_search_by_key(&handle.0, BattlePhase::order)
            .ok()
            .map(|i| &self.phases[i])
    }

    pub fn get_mut(&mut self, handle: PhaseHandle) -> Option<&mut BattlePhase> {
        self.phases
            .binary_search_by_key(&handle.0, BattlePhase::order)
            .ok()
            .map(move |i| &mut self.phases[i])
    }

    /// Add or merge `ability` into the named phase.
    ///
    /// Fails if the phase does not exist.
    pub fn add_or_merge_ability(
        &mut self,
        phase: &str,
        participant: PlayerId,
        ability: CombatUnitAbility,
    ) -> Result<AbilityHandle> {
        let target = self
            .phase_mut(phase)
            .ok_or_else(|| BattleError::invalid(format!("phase {phase} doesn't exist")))?;
        let handle = PhaseHandle::of(target);
        let slot = target.add_or_merge_ability(participant, ability);
        Ok(AbilityHandle {
            phase: handle,
            participant,
            slot,
        })
    }

    /// Look up a stored ability.
    #[must_use]
    pub fn ability(&self, handle: AbilityHandle) -> Option<&CombatUnitAbility> {
        self.get(handle.phase)?.ability(handle.participant, handle.slot)
    }

    /// Add or merge a conversion ability for `participant`.
    pub fn add_or_merge_convert_ability(
        &mut self,
        participant: PlayerId,
        ability: ConvertUnitAbility,
    ) -> AbilitySlot {
        add_or_merge(self.convert_abilities.entry(participant).or_default(), ability)
    }

    /// Conversion abilities of `participant`; empty when it has none.
    #[must_use]
    pub fn convert_abilities(&self, participant: PlayerId) -> &[ConvertUnitAbility] {
        self.convert_abilities
            .get(&participant)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Clear every phase and every conversion, ready for fresh registration
    /// at the start of a round.
    pub fn clear_all_abilities(&mut self) {
        for phase in &mut self.phases {
            phase.clear_abilities();
        }
        self.convert_abilities.clear();
    }

    /// The abilities `participant` actually fires with in `phase`, after
    /// applying every triggered conversion.
    ///
    /// A conversion replaces the first ability matching its `from` within
    /// the same phase. The replacement takes over the replaced ability's
    /// unit types and is merged like any other registration.
    #[must_use]
    pub fn effective_abilities(
        &self,
        phase: &BattlePhase,
        participant: PlayerId,
        engagement: &Engagement<'_>,
    ) -> Vec<CombatUnitAbility> {
        let mut abilities = phase.abilities(participant).to_vec();
        let Some(side) = engagement.side_of(participant) else {
            return abilities;
        };

        for convert in self.convert_abilities(participant) {
            if !conversion_triggered(convert, side, engagement) {
                continue;
            }
            let Some(position) = abilities
                .iter()
                .position(|a| a.is_mergeable_with(&convert.from))
            else {
                continue;
            };
            let replaced = abilities.remove(position);
            if let Some(to) = &convert.to {
                let mut to = to.clone();
                to.attach_all(&replaced.attached_unit_types);
                add_or_merge(&mut abilities, to);
            }
        }
        abilities
    }

    /// Phases that produce a combat step this round.
    ///
    /// A phase is active when some participant holds an ability in it that
    /// fires on its side this round and is attached to a unit type that
    /// participant has in the battle. Each active phase yields one step
    /// however many abilities qualify.
    #[must_use]
    pub fn active_phases(&self, engagement: &Engagement<'_>, round: u32) -> Vec<&BattlePhase> {
        self.phases
            .iter()
            .filter(|phase| {
                phase.participants().into_iter().any(|participant| {
                    let Some(side) = engagement.side_of(participant) else {
                        return false;
                    };
                    self.effective_abilities(phase, participant, engagement)
                        .iter()
                        .filter(|a| a.fires_on(side) && a.fires_in_round(round))
                        .any(|a| {
                            engagement
                                .units_of(participant, side)
                                .any(|u| a.applies_to(u.unit_type))
                        })
                })
            })
            .collect()
    }
}

fn conversion_triggered(convert: &ConvertUnitAbility, side: Side, engagement: &Engagement<'_>) -> bool {
    convert.factions.iter().any(|faction| {
        let units = match faction {
            Faction::Allied => engagement.units(side),
            Faction::Enemy => engagement.units(side.opposite()),
        };
        units.iter().any(|u| convert.attached_unit_types.contains(&u.unit_type))
    })
}
