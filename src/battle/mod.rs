//! Battle driver.
//!
//! A [`Battle`] is a plain value owned by the caller: state, phases,
//! configuration and the execution stack of one engagement. The random
//! source and the outside-world [`BattleActions`] are lent to each call, so
//! battles on different threads can share one source through
//! [`SharedRandomSource`](crate::random::SharedRandomSource).
//!
//! ## Example
//!
//! ```
//! use battle_engine::abilities::{BattlePhaseList, CombatUnitAbility, GENERAL_PHASE};
//! use battle_engine::battle::{Battle, BattleState, BattleStatus, DefaultActions};
//! use battle_engine::core::{EngagedUnit, EngineConfig, PlayerId, Side, UnitId, UnitTypeId};
//! use battle_engine::random::SeededRandomSource;
//!
//! let (red, blue) = (PlayerId::new(0), PlayerId::new(1));
//! let infantry = UnitTypeId::new(0);
//!
//! let mut phases = BattlePhaseList::with_defaults();
//! for player in [red, blue] {
//!     phases
//!         .add_or_merge_ability(
//!             GENERAL_PHASE,
//!             player,
//!             CombatUnitAbility::new("units")
//!                 .with_sides([Side::Offense, Side::Defense])
//!                 .attached([infantry]),
//!         )
//!         .unwrap();
//! }
//!
//! let state = BattleState::new(
//!     "Ukraine",
//!     red,
//!     blue,
//!     vec![EngagedUnit::new(UnitId(1), infantry, red).with_attack(6)],
//!     vec![EngagedUnit::new(UnitId(2), infantry, blue).with_defense(0)],
//! )
//! .unwrap();
//!
//! let mut battle = Battle::new(state, phases, EngineConfig::default().with_seed(7)).unwrap();
//! let mut random = SeededRandomSource::from_config(battle.config());
//! let mut actions = DefaultActions::new();
//!
//! let status = battle.start(&mut random, &mut actions).unwrap();
//! assert!(matches!(status, BattleStatus::Completed(_)));
//! assert_eq!(battle.state().killed(), &[UnitId(2)]);
//! ```

mod actions;
mod state;
mod steps;

pub use actions::{
    weakest_first, BattleActions, CasualtyCandidate, CasualtyRequest, CasualtyResponse,
    CasualtySelector, Change, ChangeJournal, DefaultActions,
};
pub use state::{BattleOutcome, BattleState};
pub use steps::{BattleContext, BattleStep, Roll, SelectCasualties};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::abilities::BattlePhaseList;
use crate::core::{EngineConfig, UnitId};
use crate::error::{BattleError, Result};
use crate::random::RandomSource;
use crate::stack::{ExecutionStack, StackSnapshot, StackState, StackStatus, SuspendReason};

/// Where a battle stands after a call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleStatus {
    Completed(BattleOutcome),
    Suspended(SuspendReason),
}

/// Everything needed to pick a suspended battle up again.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub state: BattleState,
    pub phases: BattlePhaseList,
    pub config: EngineConfig,
    pub stack: StackSnapshot<BattleStep>,
}

impl BattleSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// One battle.
#[derive(Clone, Debug)]
pub struct Battle {
    state: BattleState,
    phases: BattlePhaseList,
    config: EngineConfig,
    stack: ExecutionStack<BattleStep>,
}

impl Battle {
    /// Set up a battle, ready to start.
    ///
    /// Units with a die size of 0 roll on the configured default die.
    pub fn new(mut state: BattleState, phases: BattlePhaseList, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        state.default_dice_sides(config.dice_sides);
        let mut stack = ExecutionStack::new();
        stack.push(BattleStep::StartRound)?;
        Ok(Self {
            state,
            phases,
            config,
            stack,
        })
    }

    #[must_use]
    pub fn state(&self) -> &BattleState {
        &self.state
    }

    #[must_use]
    pub fn phases(&self) -> &BattlePhaseList {
        &self.phases
    }

    /// Phases, for registering abilities between calls.
    pub fn phases_mut(&mut self) -> &mut BattlePhaseList {
        &mut self.phases
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn stack_state(&self) -> StackState {
        self.stack.state()
    }

    /// The casualty choice the battle is waiting for, if any.
    #[must_use]
    pub fn pending_casualties(&self) -> Option<&CasualtyRequest> {
        match self.stack.current() {
            Some(BattleStep::SelectCasualties(select)) if select.chosen.is_none() => Some(&select.request),
            _ => None,
        }
    }

    /// Run a battle that has not started yet.
    pub fn start(
        &mut self,
        random: &mut dyn RandomSource,
        actions: &mut dyn BattleActions,
    ) -> Result<BattleStatus> {
        match self.stack.state() {
            StackState::Idle => {
                info!(
                    territory = %self.state.territory,
                    attacker = %self.state.attacker,
                    defender = %self.state.defender,
                    "battle started"
                );
                self.run(random, actions)
            }
            state => Err(self.not_in_state(state, "start")),
        }
    }

    /// Continue a suspended battle.
    pub fn resume(
        &mut self,
        random: &mut dyn RandomSource,
        actions: &mut dyn BattleActions,
    ) -> Result<BattleStatus> {
        match self.stack.state() {
            StackState::Suspended => self.run(random, actions),
            state => Err(self.not_in_state(state, "resume")),
        }
    }

    /// Answer the pending casualty choice. Takes effect on the next
    /// [`resume`](Self::resume).
    pub fn provide_casualties(&mut self, casualties: Vec<UnitId>) -> Result<()> {
        let state = self.stack.state();
        if state.is_terminal() {
            return Err(self.not_in_state(state, "provide casualties to"));
        }
        match self.stack.current_mut() {
            Some(BattleStep::SelectCasualties(select)) if select.chosen.is_none() => {
                select.request.validate(&casualties)?;
                select.chosen = Some(casualties);
                Ok(())
            }
            _ => Err(BattleError::invalid("battle is not waiting for casualties")),
        }
    }

    /// Abandon the battle. Nothing runs afterwards.
    pub fn cancel(&mut self) -> Result<()> {
        self.stack.cancel()?;
        info!(territory = %self.state.territory, "battle cancelled");
        Ok(())
    }

    /// Capture a battle that is not started or is suspended.
    pub fn save(&self) -> Result<BattleSnapshot> {
        Ok(BattleSnapshot {
            state: self.state.clone(),
            phases: self.phases.clone(),
            config: self.config.clone(),
            stack: self.stack.save()?,
        })
    }

    pub fn restore(snapshot: BattleSnapshot) -> Result<Self> {
        snapshot.config.validate()?;
        Ok(Self {
            state: snapshot.state,
            phases: snapshot.phases,
            config: snapshot.config,
            stack: ExecutionStack::restore(snapshot.stack)?,
        })
    }

    fn run(
        &mut self,
        random: &mut dyn RandomSource,
        actions: &mut dyn BattleActions,
    ) -> Result<BattleStatus> {
        let mut ctx = BattleContext {
            state: &mut self.state,
            phases: &self.phases,
            config: &self.config,
            random,
            actions,
        };
        match self.stack.execute(&mut ctx)? {
            StackStatus::Suspended(reason) => Ok(BattleStatus::Suspended(reason)),
            StackStatus::Completed => self
                .state
                .outcome()
                .map(BattleStatus::Completed)
                .ok_or_else(|| BattleError::invariant("battle stack emptied without an outcome")),
        }
    }

    fn not_in_state(&self, state: StackState, action: &str) -> BattleError {
        let message = format!("cannot {action} a {state} battle in {}", self.state.territory);
        if state.is_terminal() {
            BattleError::StaleBattle(message)
        } else {
            BattleError::invalid(message)
        }
    }
}
