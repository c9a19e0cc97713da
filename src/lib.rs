//! # battle-engine
//!
//! A deterministic, suspendable battle resolution engine for turn-based
//! strategy games.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Every random integer enters through a
//!    [`RandomSource`]. Peers that feed the same draws compute the same
//!    battle, hit for hit.
//!
//! 2. **Suspendable**: A battle is a stack of plain-data steps. It can stop
//!    mid-round (waiting for a human, or for a lost random authority), be
//!    saved, restored, and resumed without repeating a side effect.
//!
//! 3. **Configuration Over Convention**: Phases, abilities and dice modes
//!    are registered per battle; nothing about a particular ruleset is
//!    hardcoded.
//!
//! ## Modules
//!
//! - `core`: Participant and unit ids, engaged units, RNG, configuration
//! - `random`: Random source contract, seeded/recording/replay/shared sources
//! - `power`: Aggregating unit strength into power and rolls
//! - `dice`: Standard and low-luck dice resolution
//! - `abilities`: Combat/convert abilities and ordered battle phases
//! - `stack`: Suspendable execution stack
//! - `battle`: Battle state, steps, outside-world actions, the driver
//! - `error`: Error type

pub mod core;
pub mod error;
pub mod random;
pub mod power;
pub mod dice;
pub mod abilities;
pub mod stack;
pub mod battle;

// Re-export commonly used types
pub use crate::core::{
    DiceMode, EngagedUnit, EngineConfig, GameRng, GameRngState, PlayerId, Side, UnitId,
    UnitTypeId,
};

pub use crate::error::{BattleError, Result};

pub use crate::random::{
    DiceType, DrawRecord, DrawRequest, RandomSource, RecordingRandomSource,
    ReplayRandomSource, SeededRandomSource, SeededSourceState, SharedRandomSource,
};

pub use crate::power::{PowerAndRolls, UnitPower};

pub use crate::dice::{DiceRoll, DiceStrategy, Die, DieOutcome, LowLuckDice, RollContext, StandardDice};

pub use crate::abilities::{
    AbilityDice, AbilityHandle, BattlePhase, BattlePhaseList, CombatUnitAbility,
    ConvertUnitAbility, Engagement, Faction, PhaseHandle,
};

pub use crate::stack::{ExecutionStack, StackSnapshot, StackState, StackStatus, Step, StepOutcome, SuspendReason};

pub use crate::battle::{
    Battle, BattleActions, BattleOutcome, BattleSnapshot, BattleState, BattleStatus,
    CasualtyRequest, CasualtyResponse, CasualtySelector, Change, ChangeJournal, DefaultActions,
};
