//! Random source contract.
//!
//! Every random integer the engine uses enters through a [`RandomSource`].
//! A request carries audit information (who rolled, what kind of dice, a
//! free-text annotation) so that an external authority can log it and
//! replay it on every peer.
//!
//! ## Contract
//!
//! - `upper_bound > 0` and `count > 0`, otherwise the request fails with
//!   [`BattleError::InvalidArgument`] before any source is consulted.
//! - Exactly `count` integers in `[0, upper_bound)` are returned.
//! - The same logical call, issued in the same order on every peer, yields
//!   the same integers. The engine does not provide this guarantee itself;
//!   it relies on a single authority such as [`SeededRandomSource`] shared
//!   in lock step, or a [`ReplayRandomSource`] fed from the authority's log.
//!
//! ## Example
//!
//! ```
//! use battle_engine::core::PlayerId;
//! use battle_engine::random::{draw, DiceType, SeededRandomSource};
//!
//! let mut source = SeededRandomSource::new(42);
//! let values = draw(&mut source, 6, 3, PlayerId::new(0), DiceType::Combat, "opening volley")
//!     .unwrap();
//! assert_eq!(values.len(), 3);
//! assert!(values.iter().all(|&v| v < 6));
//!
//! // Zero-sided dice are rejected, never clamped.
//! assert!(draw(&mut source, 0, 1, PlayerId::new(0), DiceType::Combat, "bad").is_err());
//! ```

mod replay;
mod seeded;
mod shared;

pub use replay::{RecordingRandomSource, ReplayRandomSource};
pub use seeded::{SeededRandomSource, SeededSourceState};
pub use shared::SharedRandomSource;

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;
use crate::error::{BattleError, Result};

/// Audit classification of a dice request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiceType {
    Combat,
    Aa,
    Bombard,
    Bombing,
    NonCombat,
    Tech,
    Engine,
}

/// A request for random integers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRequest {
    /// Exclusive upper bound of every returned value.
    pub upper_bound: u32,
    /// How many values to return.
    pub count: u32,
    pub participant: PlayerId,
    pub dice_type: DiceType,
    pub annotation: String,
}

impl DrawRequest {
    /// Build a validated request.
    pub fn new(
        upper_bound: u32,
        count: u32,
        participant: PlayerId,
        dice_type: DiceType,
        annotation: impl Into<String>,
    ) -> Result<Self> {
        let request = Self {
            upper_bound,
            count,
            participant,
            dice_type,
            annotation: annotation.into(),
        };
        request.validate()?;
        Ok(request)
    }

    /// Check the bound and count are positive.
    pub fn validate(&self) -> Result<()> {
        if self.upper_bound == 0 {
            return Err(BattleError::invalid(format!(
                "random upper bound must be positive ({})",
                self.annotation
            )));
        }
        if self.count == 0 {
            return Err(BattleError::invalid(format!(
                "random count must be positive ({})",
                self.annotation
            )));
        }
        Ok(())
    }

    /// Check a response honours this request.
    ///
    /// A source returning the wrong number of values, or values out of range,
    /// is corrupt; carrying on would desynchronize peers.
    pub fn check_response(&self, values: &[u32]) -> Result<()> {
        if values.len() != self.count as usize {
            return Err(BattleError::invariant(format!(
                "random source returned {} values, {} requested ({})",
                values.len(),
                self.count,
                self.annotation
            )));
        }
        if let Some(bad) = values.iter().find(|&&v| v >= self.upper_bound) {
            return Err(BattleError::invariant(format!(
                "random source returned {} outside [0, {}) ({})",
                bad, self.upper_bound, self.annotation
            )));
        }
        Ok(())
    }
}

/// One answered request, as kept in an audit log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub request: DrawRequest,
    pub values: Vec<u32>,
}

/// A pluggable source of audit-tagged random integers.
///
/// Implementations may assume the request has been validated.
pub trait RandomSource {
    /// Answer a request with exactly `request.count` values in
    /// `[0, request.upper_bound)`.
    ///
    /// Returns [`BattleError::RandomUnavailable`] when the authority cannot
    /// currently be reached; the caller suspends and retries later.
    fn draw(&mut self, request: &DrawRequest) -> Result<Vec<u32>>;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn draw(&mut self, request: &DrawRequest) -> Result<Vec<u32>> {
        (**self).draw(request)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn draw(&mut self, request: &DrawRequest) -> Result<Vec<u32>> {
        (**self).draw(request)
    }
}

/// Validate, draw and check the response in one call.
///
/// This is the only entry point the resolvers use.
pub fn draw<R: RandomSource + ?Sized>(
    source: &mut R,
    upper_bound: u32,
    count: u32,
    participant: PlayerId,
    dice_type: DiceType,
    annotation: impl Into<String>,
) -> Result<Vec<u32>> {
    let request = DrawRequest::new(upper_bound, count, participant, dice_type, annotation)?;
    let values = source.draw(&request)?;
    request.check_response(&values)?;
    Ok(values)
}
