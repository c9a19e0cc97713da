//! What a battle reports to, and asks of, the outside world.
//!
//! The engine never mutates the map model. It emits [`Change`] records to a
//! [`ChangeJournal`], and asks a [`CasualtySelector`] which units absorb
//! hits. A selector that needs a human answers [`CasualtyResponse::Pending`];
//! the battle then suspends until the answer is supplied through
//! `Battle::provide_casualties`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::{PlayerId, Side, UnitId, UnitTypeId};
use crate::dice::DiceRoll;
use crate::error::{BattleError, Result};

use super::state::BattleOutcome;

/// A discrete, journaled effect of the battle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Change {
    RoundStarted { round: u32 },
    DiceRolled { phase: String, roll: DiceRoll },
    /// A hit that did not remove the unit.
    UnitDamaged { unit: UnitId, damage: u32 },
    UnitRemoved { unit: UnitId, side: Side },
    BattleEnded { outcome: BattleOutcome, rounds: u32 },
}

/// Sink for battle changes.
pub trait ChangeJournal {
    fn record(&mut self, change: Change);
}

impl ChangeJournal for Vec<Change> {
    fn record(&mut self, change: Change) {
        self.push(change);
    }
}

/// A unit that may absorb hits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasualtyCandidate {
    pub id: UnitId,
    pub unit_type: UnitTypeId,
    /// Strength on the side it fights for.
    pub strength: u32,
    pub remaining_hit_points: u32,
}

/// A request to assign hits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasualtyRequest {
    /// The participant that picks.
    pub chooser: PlayerId,
    /// The participant that scored the hits.
    pub firing: PlayerId,
    /// The side taking the hits.
    pub side: Side,
    pub hits: u32,
    pub candidates: Vec<CasualtyCandidate>,
}

impl CasualtyRequest {
    /// Check a selection. Each entry assigns one hit; a unit may appear as
    /// often as it has hit points left.
    pub fn validate(&self, selection: &[UnitId]) -> Result<()> {
        if selection.len() != self.hits as usize {
            return Err(BattleError::invalid(format!(
                "{} casualties selected for {} hits",
                selection.len(),
                self.hits
            )));
        }
        let mut assigned: BTreeMap<UnitId, u32> = BTreeMap::new();
        for &id in selection {
            let Some(candidate) = self.candidates.iter().find(|c| c.id == id) else {
                return Err(BattleError::invalid(format!("{id} is not a casualty candidate")));
            };
            let count = assigned.entry(id).or_insert(0);
            *count += 1;
            if *count > candidate.remaining_hit_points {
                return Err(BattleError::invalid(format!(
                    "{id} assigned more hits than it can absorb"
                )));
            }
        }
        Ok(())
    }

    /// Total hits the candidates can absorb.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.candidates.iter().map(|c| c.remaining_hit_points).sum()
    }
}

/// Answer of a [`CasualtySelector`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CasualtyResponse {
    Selected(Vec<UnitId>),
    /// The choice will arrive later; suspend the battle.
    Pending,
}

/// Decides which units absorb hits.
pub trait CasualtySelector {
    fn select_casualties(&mut self, request: &CasualtyRequest) -> CasualtyResponse;
}

/// Everything a battle needs from its surroundings.
pub trait BattleActions: ChangeJournal + CasualtySelector {}

impl<T: ChangeJournal + CasualtySelector> BattleActions for T {}

/// Assign hits automatically.
///
/// Units with spare hit points absorb first (down to their last hit point),
/// then the weakest units die, lowest id first among equals.
#[must_use]
pub fn weakest_first(request: &CasualtyRequest) -> Vec<UnitId> {
    let mut left = request.hits;
    let mut selection = Vec::with_capacity(left as usize);
    let mut remaining: BTreeMap<UnitId, u32> = BTreeMap::new();

    for candidate in &request.candidates {
        let absorb = left.min(candidate.remaining_hit_points.saturating_sub(1));
        selection.extend(std::iter::repeat(candidate.id).take(absorb as usize));
        left -= absorb;
        remaining.insert(candidate.id, candidate.remaining_hit_points - absorb);
    }

    let mut order: Vec<&CasualtyCandidate> = request.candidates.iter().collect();
    order.sort_by_key(|c| (c.strength, c.id));
    for candidate in order {
        if left == 0 {
            break;
        }
        let take = left.min(remaining.get(&candidate.id).copied().unwrap_or(0));
        selection.extend(std::iter::repeat(candidate.id).take(take as usize));
        left -= take;
    }
    selection
}

/// Journal plus automatic casualty selection, except for participants
/// marked interactive, whose requests are left pending.
#[derive(Clone, Debug, Default)]
pub struct DefaultActions {
    pub journal: Vec<Change>,
    interactive: BTreeSet<PlayerId>,
}

impl DefaultActions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave `participant`'s casualty choices to a human.
    #[must_use]
    pub fn with_interactive(mut self, participant: PlayerId) -> Self {
        self.interactive.insert(participant);
        self
    }

    /// Take the journal, leaving it empty.
    pub fn drain(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.journal)
    }
}

impl ChangeJournal for DefaultActions {
    fn record(&mut self, change: Change) {
        self.journal.push(change);
    }
}

impl CasualtySelector for DefaultActions {
    fn select_casualties(&mut self, request: &CasualtyRequest) -> CasualtyResponse {
        if self.interactive.contains(&request.chooser) {
            CasualtyResponse::Pending
        } else {
            CasualtyResponse::Selected(weakest_first(request))
        }
    }
}
