//! The steps a battle is made of.
//!
//! A round is `StartRound`, then per active phase one `Fire` step per side,
//! then `ClearCasualties` and `CheckBattleEnd`. `Fire` expands into one
//! `Roll` per participant, ability and die size. A `Roll` that scores hits
//! pushes `SelectCasualties`, which pushes `RemoveCasualties`.
//!
//! Every step touches the random source at most once, and only after that
//! draw does it change state, so a step suspended on an unreachable source
//! can simply run again.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::abilities::{AbilityDice, BattlePhaseList, CombatUnitAbility, PhaseHandle};
use crate::core::{EngineConfig, PlayerId, Side, UnitId};
use crate::dice::{self, RollContext};
use crate::error::{BattleError, Result};
use crate::power::UnitPower;
use crate::random::RandomSource;
use crate::stack::{Step, StepOutcome, StepPusher, SuspendReason};

use super::actions::{
    BattleActions, CasualtyCandidate, CasualtyRequest, CasualtyResponse, CasualtySelector, Change,
    ChangeJournal,
};
use super::state::{BattleOutcome, BattleState};

/// What a step runs against.
pub struct BattleContext<'a> {
    pub state: &'a mut BattleState,
    pub phases: &'a BattlePhaseList,
    pub config: &'a EngineConfig,
    pub random: &'a mut dyn RandomSource,
    pub actions: &'a mut dyn BattleActions,
}

/// One participant firing one ability on one die size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Roll {
    pub phase: PhaseHandle,
    pub side: Side,
    pub participant: PlayerId,
    pub ability: CombatUnitAbility,
    pub dice_sides: u32,
}

/// Waiting for hits to be assigned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectCasualties {
    pub request: CasualtyRequest,
    /// Whether the units hit still fire back this round.
    pub return_fire: bool,
    /// A selection supplied while suspended.
    pub chosen: Option<Vec<UnitId>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BattleStep {
    StartRound,
    Fire { phase: PhaseHandle, side: Side },
    Roll(Roll),
    SelectCasualties(SelectCasualties),
    RemoveCasualties {
        return_fire: bool,
        casualties: Vec<UnitId>,
    },
    ClearCasualties,
    CheckBattleEnd,
}

impl<'a> Step<BattleContext<'a>> for BattleStep {
    fn execute(
        &mut self,
        pusher: &mut StepPusher<Self>,
        ctx: &mut BattleContext<'a>,
    ) -> Result<StepOutcome> {
        match self {
            BattleStep::StartRound => start_round(pusher, ctx),
            BattleStep::Fire { phase, side } => fire(*phase, *side, pusher, ctx),
            BattleStep::Roll(roll) => roll.execute(pusher, ctx),
            BattleStep::SelectCasualties(select) => select.execute(pusher, ctx),
            BattleStep::RemoveCasualties {
                return_fire,
                casualties,
            } => remove_casualties(*return_fire, casualties, ctx),
            BattleStep::ClearCasualties => clear_casualties(ctx),
            BattleStep::CheckBattleEnd => check_battle_end(pusher, ctx),
        }
    }
}

fn start_round(
    pusher: &mut StepPusher<BattleStep>,
    ctx: &mut BattleContext<'_>,
) -> Result<StepOutcome> {
    ctx.state.contested = false;
    let round = ctx.state.round;
    ctx.actions.record(Change::RoundStarted { round });

    let active = ctx.phases.active_phases(&ctx.state.engagement(), round);
    debug!(round, phases = active.len(), "round started");

    let mut steps = Vec::with_capacity(active.len() * 2 + 2);
    for phase in active {
        let phase = PhaseHandle::of(phase);
        steps.push(BattleStep::Fire { phase, side: Side::Offense });
        steps.push(BattleStep::Fire { phase, side: Side::Defense });
    }
    steps.push(BattleStep::ClearCasualties);
    steps.push(BattleStep::CheckBattleEnd);
    pusher.push_in_order(steps);
    Ok(StepOutcome::Done)
}

fn fire(
    handle: PhaseHandle,
    side: Side,
    pusher: &mut StepPusher<BattleStep>,
    ctx: &mut BattleContext<'_>,
) -> Result<StepOutcome> {
    let phase = ctx
        .phases
        .get(handle)
        .ok_or_else(|| BattleError::invariant(format!("no phase with order {}", handle.order())))?;
    let engagement = ctx.state.engagement();
    let round = ctx.state.round;

    let mut rolls = Vec::new();
    for participant in phase.participants() {
        if engagement.side_of(participant) != Some(side) {
            continue;
        }
        for ability in ctx.phases.effective_abilities(phase, participant, &engagement) {
            if !ability.fires_on(side) || !ability.fires_in_round(round) {
                continue;
            }
            let sizes: BTreeSet<u32> = engagement
                .units_of(participant, side)
                .filter(|u| ability.applies_to(u.unit_type))
                .map(|u| u.dice_sides)
                .collect();
            for dice_sides in sizes {
                rolls.push(BattleStep::Roll(Roll {
                    phase: handle,
                    side,
                    participant,
                    ability: ability.clone(),
                    dice_sides,
                }));
            }
        }
    }

    pusher.push_in_order(rolls);
    Ok(StepOutcome::Done)
}

impl Roll {
    fn execute(
        &self,
        pusher: &mut StepPusher<BattleStep>,
        ctx: &mut BattleContext<'_>,
    ) -> Result<StepOutcome> {
        let firing: Vec<(UnitId, UnitPower)> = ctx
            .state
            .units(self.side)
            .iter()
            .filter(|u| {
                u.owner == self.participant
                    && u.dice_sides == self.dice_sides
                    && self.ability.applies_to(u.unit_type)
            })
            .map(|u| (u.id, UnitPower::of(u, self.side)))
            .collect();
        if firing.is_empty() {
            return Ok(StepOutcome::Done);
        }

        let phase_name = ctx
            .phases
            .get(self.phase)
            .map(|p| p.name().to_string())
            .ok_or_else(|| BattleError::invariant(format!("no phase with order {}", self.phase.order())))?;
        let mode = ctx.config.mode_for(self.ability.dice == AbilityDice::Aa);
        let roll_ctx = RollContext::new(
            self.participant,
            self.ability.dice.dice_type(),
            dice::annotation(self.participant, &self.ability.name, &ctx.state.territory, ctx.state.round),
        );
        let powers: Vec<UnitPower> = firing.iter().map(|(_, power)| *power).collect();

        // Nothing below may fail recoverably: the draw has been consumed.
        let roll = dice::resolve(mode, &powers, self.dice_sides, &roll_ctx, &mut *ctx.random)?;

        let target_side = self.side.opposite();
        let state = &mut *ctx.state;
        let candidates: Vec<CasualtyCandidate> = state
            .survivors(target_side)
            .filter(|u| self.ability.can_target(u.unit_type))
            .map(|u| CasualtyCandidate {
                id: u.id,
                unit_type: u.unit_type,
                strength: u.strength(target_side),
                remaining_hit_points: state.remaining_hit_points(u.id),
            })
            .collect();
        let capacity: u32 = candidates.iter().map(|c| c.remaining_hit_points).sum();
        let hits = roll.hit_count.min(capacity);

        debug!(
            participant = %self.participant,
            ability = %self.ability.name,
            phase = %phase_name,
            hit_count = roll.hit_count,
            hits,
            "fired"
        );

        if roll.expected_hits > 0.0 {
            if capacity > 0 {
                state.contested = true;
            }
            ctx.actions.record(Change::DiceRolled {
                phase: phase_name,
                roll: roll.clone(),
            });
        }

        let suiciding: Vec<UnitId> = if self.ability.suicide.contains(&self.side) {
            firing.iter().map(|(id, _)| *id).collect()
        } else if self.ability.suicide_on_hit.contains(&self.side) {
            firing
                .iter()
                .take(roll.hit_count as usize)
                .map(|(id, _)| *id)
                .collect()
        } else {
            Vec::new()
        };
        for unit in suiciding {
            if let Some(side) = state.remove(unit) {
                ctx.actions.record(Change::UnitRemoved { unit, side });
            }
        }

        if hits > 0 {
            pusher.push(BattleStep::SelectCasualties(SelectCasualties {
                request: CasualtyRequest {
                    chooser: state.participant(target_side),
                    firing: self.participant,
                    side: target_side,
                    hits,
                    candidates,
                },
                return_fire: self.ability.return_fire,
                chosen: None,
            }));
        }
        Ok(StepOutcome::Done)
    }
}

impl SelectCasualties {
    fn execute(
        &mut self,
        pusher: &mut StepPusher<BattleStep>,
        ctx: &mut BattleContext<'_>,
    ) -> Result<StepOutcome> {
        let casualties = match self.chosen.take() {
            Some(chosen) => chosen,
            None => match ctx.actions.select_casualties(&self.request) {
                CasualtyResponse::Selected(selected) => selected,
                CasualtyResponse::Pending => {
                    return Ok(StepOutcome::Suspend(SuspendReason::AwaitingInput(
                        self.request.chooser,
                    )))
                }
            },
        };
        self.request.validate(&casualties)?;

        pusher.push(BattleStep::RemoveCasualties {
            return_fire: self.return_fire,
            casualties,
        });
        Ok(StepOutcome::Done)
    }
}

fn remove_casualties(
    return_fire: bool,
    casualties: &[UnitId],
    ctx: &mut BattleContext<'_>,
) -> Result<StepOutcome> {
    for &unit in casualties {
        let lethal = ctx.state.apply_hit(unit)?;
        if lethal && !return_fire {
            if let Some(side) = ctx.state.remove(unit) {
                ctx.actions.record(Change::UnitRemoved { unit, side });
            }
            continue;
        }
        if lethal {
            ctx.state.mark_waiting_to_die(unit);
        }
        ctx.actions.record(Change::UnitDamaged {
            unit,
            damage: ctx.state.damage(unit),
        });
    }
    Ok(StepOutcome::Done)
}

fn clear_casualties(ctx: &mut BattleContext<'_>) -> Result<StepOutcome> {
    for (unit, side) in ctx.state.clear_waiting_to_die() {
        ctx.actions.record(Change::UnitRemoved { unit, side });
    }
    Ok(StepOutcome::Done)
}

fn check_battle_end(
    pusher: &mut StepPusher<BattleStep>,
    ctx: &mut BattleContext<'_>,
) -> Result<StepOutcome> {
    let state = &mut *ctx.state;
    let outcome = match (
        state.has_survivors(Side::Offense),
        state.has_survivors(Side::Defense),
    ) {
        (true, true) if state.contested && state.round.saturating_add(1) < ctx.config.max_rounds => None,
        (true, true) => Some(BattleOutcome::Stalemate),
        (true, false) => Some(BattleOutcome::AttackerWon),
        (false, true) => Some(BattleOutcome::DefenderWon),
        (false, false) => Some(BattleOutcome::MutualDestruction),
    };

    match outcome {
        None => {
            state.round += 1;
            pusher.push(BattleStep::StartRound);
        }
        Some(outcome) => {
            let rounds = state.round + 1;
            state.outcome = Some(outcome);
            info!(territory = %state.territory, ?outcome, rounds, "battle ended");
            ctx.actions.record(Change::BattleEnded { outcome, rounds });
        }
    }
    Ok(StepOutcome::Done)
}
