//! Engine configuration.
//!
//! Games configure the engine at battle start. The engine never hardcodes a
//! die size or a dice mode; it reads them from [`EngineConfig`].
//!
//! ```
//! use battle_engine::core::{DiceMode, EngineConfig};
//!
//! let config = EngineConfig::from_toml_str(
//!     r#"
//!     dice_sides = 12
//!     dice_mode = "low_luck"
//!     max_rounds = 3
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.dice_sides, 12);
//! assert_eq!(config.dice_mode, DiceMode::LowLuck);
//! assert!(!config.low_luck_aa_only);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{BattleError, Result};

/// How dice are resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiceMode {
    /// One die per roll, hit when the value is under the unit's threshold.
    #[default]
    Standard,
    /// Hits are mostly `power / dice_sides`; only the remainder is rolled.
    LowLuck,
}

/// Configuration for one battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Canonical die size for the battle (6 for a standard d6).
    pub dice_sides: u32,

    /// Dice resolution strategy.
    pub dice_mode: DiceMode,

    /// Resolve only anti-air fire with low luck, regardless of `dice_mode`.
    pub low_luck_aa_only: bool,

    /// Combat rounds before the battle stops on its own.
    /// `u32::MAX` fights until one side is eliminated.
    pub max_rounds: u32,

    /// Seed read by [`SeededRandomSource::from_config`](crate::random::SeededRandomSource::from_config).
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dice_sides: 6,
            dice_mode: DiceMode::Standard,
            low_luck_aa_only: false,
            max_rounds: u32::MAX,
            seed: 42,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.dice_sides < 2 {
            return Err(BattleError::invalid(format!(
                "dice_sides must be at least 2, got {}",
                self.dice_sides
            )));
        }
        if self.max_rounds == 0 {
            return Err(BattleError::invalid("max_rounds must be positive"));
        }
        Ok(())
    }

    #[must_use]
    pub fn with_dice_sides(mut self, dice_sides: u32) -> Self {
        self.dice_sides = dice_sides;
        self
    }

    #[must_use]
    pub fn with_dice_mode(mut self, mode: DiceMode) -> Self {
        self.dice_mode = mode;
        self
    }

    #[must_use]
    pub fn with_low_luck_aa_only(mut self, enabled: bool) -> Self {
        self.low_luck_aa_only = enabled;
        self
    }

    #[must_use]
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Dice mode used for a firing, given whether it is anti-air fire.
    #[must_use]
    pub fn mode_for(&self, is_aa: bool) -> DiceMode {
        if is_aa && self.low_luck_aa_only {
            DiceMode::LowLuck
        } else {
            self.dice_mode
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.dice_sides, 6);
        assert_eq!(config.dice_mode, DiceMode::Standard);
        assert_eq!(config.max_rounds, u32::MAX);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::default()
            .with_dice_sides(10)
            .with_dice_mode(DiceMode::LowLuck)
            .with_max_rounds(2)
            .with_seed(7);

        assert_eq!(config.dice_sides, 10);
        assert_eq!(config.dice_mode, DiceMode::LowLuck);
        assert_eq!(config.max_rounds, 2);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(matches!(
            EngineConfig::default().with_dice_sides(1).validate(),
            Err(BattleError::InvalidArgument(_))
        ));
        assert!(EngineConfig::default().with_max_rounds(0).validate().is_err());
    }

    #[test]
    fn test_from_toml_defaults_missing_keys() {
        let config = EngineConfig::from_toml_str("seed = 99").unwrap();
        assert_eq!(config.seed, 99);
        assert_eq!(config.dice_sides, 6);
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        assert!(EngineConfig::from_toml_str("dice_sides = 0").is_err());
        assert!(EngineConfig::from_toml_str("dice_mode = \"chaotic\"").is_err());
    }

    #[test]
    fn test_aa_only_low_luck() {
        let config = EngineConfig::default().with_low_luck_aa_only(true);
        assert_eq!(config.mode_for(true), DiceMode::LowLuck);
        assert_eq!(config.mode_for(false), DiceMode::Standard);
    }

    #[test]
    fn test_serialization() {
        let config = EngineConfig::default().with_dice_mode(DiceMode::LowLuck);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
