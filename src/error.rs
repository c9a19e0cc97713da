//! Engine error type.
//!
//! Errors fall into three groups:
//!
//! - **Argument errors** are raised before anything happens and are never
//!   coerced into a "close enough" value, since a silently clamped argument
//!   on one peer desynchronizes every other peer.
//! - **Recoverable errors** ([`BattleError::StaleBattle`],
//!   [`BattleError::RandomUnavailable`]) are reported to the caller, who may
//!   retry or surface them to a user.
//! - **Fatal errors** ([`BattleError::InvariantViolation`],
//!   [`BattleError::ReplayDesync`]) indicate a corrupted computation upstream.
//!   The battle that hit one is aborted.

use thiserror::Error;

/// Errors produced by the battle engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BattleError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("stale battle: {0}")]
    StaleBattle(String),

    #[error("random source unavailable: {0}")]
    RandomUnavailable(String),

    #[error("replay desync at draw {index}: {detail}")]
    ReplayDesync { index: usize, detail: String },

    #[error("engine invariant violated: {0}")]
    InvariantViolation(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BattleError {
    /// Shorthand for an [`BattleError::InvalidArgument`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Shorthand for an [`BattleError::InvariantViolation`].
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Whether this error means the engine itself is in an inconsistent state.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvariantViolation(_) | Self::ReplayDesync { .. }
        )
    }

    /// Whether the battle can continue once the cause has cleared.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::StaleBattle(_) | Self::RandomUnavailable(_))
    }
}

impl From<bincode::Error> for BattleError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BattleError {
    fn from(err: toml::de::Error) -> Self {
        Self::InvalidArgument(format!("config: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, BattleError>;
