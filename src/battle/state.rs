//! Mutable battle state: who is still fighting, damage, casualties.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::abilities::Engagement;
use crate::core::{EngagedUnit, PlayerId, Side, UnitId};
use crate::error::{BattleError, Result};

/// How a battle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleOutcome {
    /// The defending side was eliminated.
    AttackerWon,
    /// The attacking side was eliminated.
    DefenderWon,
    /// Both sides were eliminated in the same round.
    MutualDestruction,
    /// Both sides remain: the round limit was hit, or neither could hurt
    /// the other.
    Stalemate,
}

/// Everything about a battle that steps change.
///
/// Units leave `attacking`/`defending` only when they are removed from the
/// battle. A unit that took lethal damage from fire that allows return fire
/// stays until the end of the round, marked as waiting to die.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleState {
    pub territory: String,
    pub attacker: PlayerId,
    pub defender: PlayerId,
    attacking: Vec<EngagedUnit>,
    defending: Vec<EngagedUnit>,
    /// Accumulated damage of units still present.
    damage: BTreeMap<UnitId, u32>,
    waiting_to_die: BTreeSet<UnitId>,
    /// Removed units, in removal order.
    killed: Vec<UnitId>,
    /// Zero-based current round.
    pub round: u32,
    /// Set when some fire this round had power and something to aim at.
    pub(crate) contested: bool,
    pub(crate) outcome: Option<BattleOutcome>,
}

impl BattleState {
    /// Fails on duplicate unit ids, zero hit points, or if the attacker and
    /// defender are the same participant.
    pub fn new(
        territory: impl Into<String>,
        attacker: PlayerId,
        defender: PlayerId,
        attacking: Vec<EngagedUnit>,
        defending: Vec<EngagedUnit>,
    ) -> Result<Self> {
        if attacker == defender {
            return Err(BattleError::invalid(format!(
                "{attacker} cannot fight itself"
            )));
        }
        let mut seen = BTreeSet::new();
        for unit in attacking.iter().chain(&defending) {
            if !seen.insert(unit.id) {
                return Err(BattleError::invalid(format!("duplicate unit {}", unit.id)));
            }
            if unit.hit_points == 0 {
                return Err(BattleError::invalid(format!("{} has no hit points", unit.id)));
            }
        }
        Ok(Self {
            territory: territory.into(),
            attacker,
            defender,
            attacking,
            defending,
            damage: BTreeMap::new(),
            waiting_to_die: BTreeSet::new(),
            killed: Vec::new(),
            round: 0,
            contested: false,
            outcome: None,
        })
    }

    /// Units present on `side`, including those waiting to die.
    #[must_use]
    pub fn units(&self, side: Side) -> &[EngagedUnit] {
        match side {
            Side::Offense => &self.attacking,
            Side::Defense => &self.defending,
        }
    }

    pub(crate) fn units_mut(&mut self, side: Side) -> &mut Vec<EngagedUnit> {
        match side {
            Side::Offense => &mut self.attacking,
            Side::Defense => &mut self.defending,
        }
    }

    /// The participant that decides for `side`.
    #[must_use]
    pub fn participant(&self, side: Side) -> PlayerId {
        match side {
            Side::Offense => self.attacker,
            Side::Defense => self.defender,
        }
    }

    #[must_use]
    pub fn engagement(&self) -> Engagement<'_> {
        Engagement {
            attacker: self.attacker,
            defender: self.defender,
            attacking: &self.attacking,
            defending: &self.defending,
        }
    }

    /// A present unit and its side.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<(&EngagedUnit, Side)> {
        self.attacking
            .iter()
            .find(|u| u.id == id)
            .map(|u| (u, Side::Offense))
            .or_else(|| self.defending.iter().find(|u| u.id == id).map(|u| (u, Side::Defense)))
    }

    #[must_use]
    pub fn damage(&self, id: UnitId) -> u32 {
        self.damage.get(&id).copied().unwrap_or(0)
    }

    /// Hits `id` can still absorb; zero once it is waiting to die or gone.
    #[must_use]
    pub fn remaining_hit_points(&self, id: UnitId) -> u32 {
        match self.unit(id) {
            Some((unit, _)) if !self.is_waiting_to_die(id) => {
                unit.hit_points.saturating_sub(self.damage(id))
            }
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_waiting_to_die(&self, id: UnitId) -> bool {
        self.waiting_to_die.contains(&id)
    }

    /// Units removed so far, in removal order.
    #[must_use]
    pub fn killed(&self) -> &[UnitId] {
        &self.killed
    }

    /// Units on `side` that can still take hits.
    pub fn survivors(&self, side: Side) -> impl Iterator<Item = &EngagedUnit> {
        self.units(side)
            .iter()
            .filter(move |u| !self.waiting_to_die.contains(&u.id))
    }

    #[must_use]
    pub fn has_survivors(&self, side: Side) -> bool {
        self.survivors(side).next().is_some()
    }

    #[must_use]
    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    /// Add one hit to `id`. Returns whether the hit was lethal.
    pub(crate) fn apply_hit(&mut self, id: UnitId) -> Result<bool> {
        let remaining = self.remaining_hit_points(id);
        if remaining == 0 {
            return Err(BattleError::invariant(format!(
                "{id} took a hit it cannot absorb"
            )));
        }
        let damage = self.damage.entry(id).or_insert(0);
        *damage += 1;
        Ok(remaining == 1)
    }

    pub(crate) fn mark_waiting_to_die(&mut self, id: UnitId) {
        self.waiting_to_die.insert(id);
    }

    /// Take `id` out of the battle. Returns its side, or `None` if it was
    /// already gone.
    pub(crate) fn remove(&mut self, id: UnitId) -> Option<Side> {
        for side in [Side::Offense, Side::Defense] {
            let units = self.units_mut(side);
            if let Some(position) = units.iter().position(|u| u.id == id) {
                units.remove(position);
                self.damage.remove(&id);
                self.waiting_to_die.remove(&id);
                self.killed.push(id);
                return Some(side);
            }
        }
        None
    }

    /// Remove every unit waiting to die, in id order.
    pub(crate) fn clear_waiting_to_die(&mut self) -> Vec<(UnitId, Side)> {
        let dying: Vec<UnitId> = self.waiting_to_die.iter().copied().collect();
        dying
            .into_iter()
            .filter_map(|id| self.remove(id).map(|side| (id, side)))
            .collect()
    }

    /// Fill in the default die size for units that did not set one.
    pub(crate) fn default_dice_sides(&mut self, dice_sides: u32) {
        for unit in self.attacking.iter_mut().chain(self.defending.iter_mut()) {
            if unit.dice_sides == 0 {
                unit.dice_sides = dice_sides;
            }
        }
    }
}
