//! Core engine types: participants, units, RNG, configuration.
//!
//! This module contains the building blocks shared by every other module.
//! Games configure these via `EngineConfig` rather than modifying the core.

pub mod player;
pub mod unit;
pub mod rng;
pub mod config;

pub use player::{PlayerId, Side};
pub use unit::{EngagedUnit, UnitId, UnitTypeId};
pub use rng::{GameRng, GameRngState};
pub use config::{DiceMode, EngineConfig};
