//! Engine configuration as supplied by the surrounding system.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::wager::{
    CardPlan, CustomGroupDef, GroupError, ProgressionStrategy, SessionLimits,
    MAX_PROGRESSION_STEPS,
};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_unit() -> u64 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Chip value of one stake multiplier.
    #[serde(default = "default_base_unit")]
    pub base_unit: u64,
    #[serde(default)]
    pub strategy: ProgressionStrategy,
    #[serde(default)]
    pub custom_groups: Vec<CustomGroupDef>,
    #[serde(default)]
    pub cards: CardPlan,
    #[serde(default)]
    pub session: SessionLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            base_unit: default_base_unit(),
            strategy: ProgressionStrategy::default(),
            custom_groups: Vec::new(),
            cards: CardPlan::default(),
            session: SessionLimits::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("{field} is too large (got {value}, max {max})")]
    TooLarge {
        field: &'static str,
        value: u64,
        max: u64,
    },
    #[error("{strategy} steps must be in 1..={max} (got {steps})")]
    StepsOutOfRange {
        strategy: &'static str,
        steps: usize,
        max: usize,
    },
    #[error("sequential strategy needs at least one entry")]
    EmptySequence,
    #[error("sequence entry {index} must be > 0")]
    InvalidSequenceEntry { index: usize },
    #[error("custom group id must not be empty")]
    EmptyCustomGroupId,
    #[error("custom group {id} is invalid")]
    InvalidCustomGroup {
        id: String,
        #[source]
        source: GroupError,
    },
    #[error("custom group {id} is defined more than once")]
    DuplicateCustomGroup { id: String },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
}

impl EngineConfig {
    pub fn new(base_unit: u64, strategy: ProgressionStrategy) -> Self {
        Self {
            base_unit,
            strategy,
            ..Self::default()
        }
    }

    pub fn with_cards(mut self, total_cards: u32, target: u64, max_wagers: u32) -> Self {
        self.cards = CardPlan {
            total_cards,
            target,
            max_wagers,
        };
        self
    }

    pub fn with_session(mut self, limits: SessionLimits) -> Self {
        self.session = limits;
        self
    }

    pub fn with_custom_group(mut self, group: CustomGroupDef) -> Self {
        self.custom_groups.push(group);
        self
    }

    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            });
        }
        ensure_non_zero("base_unit", self.base_unit)?;
        ensure_non_zero("session.bankroll", self.session.bankroll)?;
        ensure_fits_i64("session.bankroll", self.session.bankroll)?;
        if self.cards.total_cards > 0 {
            ensure_non_zero("cards.target", self.cards.target)?;
            ensure_fits_i64("cards.target", self.cards.target)?;
            ensure_non_zero("cards.max_wagers", u64::from(self.cards.max_wagers))?;
        }
        validate_strategy(&self.strategy)?;

        let mut seen = BTreeSet::new();
        for group in &self.custom_groups {
            if group.id.trim().is_empty() {
                return Err(ConfigError::EmptyCustomGroupId);
            }
            if !seen.insert(group.id.as_str()) {
                return Err(ConfigError::DuplicateCustomGroup {
                    id: group.id.clone(),
                });
            }
            group
                .to_group()
                .map_err(|source| ConfigError::InvalidCustomGroup {
                    id: group.id.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

fn ensure_non_zero(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidNonZero { field, value });
    }
    Ok(())
}

fn ensure_fits_i64(field: &'static str, value: u64) -> Result<(), ConfigError> {
    let max = i64::MAX as u64;
    if value > max {
        return Err(ConfigError::TooLarge { field, value, max });
    }
    Ok(())
}

fn ensure_steps(strategy: &'static str, steps: usize) -> Result<(), ConfigError> {
    if steps == 0 || steps > MAX_PROGRESSION_STEPS {
        return Err(ConfigError::StepsOutOfRange {
            strategy,
            steps,
            max: MAX_PROGRESSION_STEPS,
        });
    }
    Ok(())
}

fn validate_strategy(strategy: &ProgressionStrategy) -> Result<(), ConfigError> {
    match strategy {
        ProgressionStrategy::Flat | ProgressionStrategy::Paroli => Ok(()),
        ProgressionStrategy::Martingale { steps }
        | ProgressionStrategy::Fibonacci { steps }
        | ProgressionStrategy::DAlembert { steps }
        | ProgressionStrategy::ReverseDAlembert { steps } => ensure_steps(strategy.name(), *steps),
        ProgressionStrategy::OutcomeRules(rules) => ensure_steps(strategy.name(), rules.steps),
        ProgressionStrategy::Sequential(rules) => {
            if rules.sequence.is_empty() {
                return Err(ConfigError::EmptySequence);
            }
            if let Some(index) = rules.sequence.iter().position(|entry| *entry == 0) {
                return Err(ConfigError::InvalidSequenceEntry { index });
            }
            if rules.reset_after_wins == Some(0) {
                return Err(ConfigError::InvalidNonZero {
                    field: "reset_after_wins",
                    value: 0,
                });
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wager::{OutcomeRules, SequentialRules};

    #[test]
    fn test_default_config_is_valid() {
        EngineConfig::default().validate().expect("valid default");
    }

    #[test]
    fn test_rejects_zero_base_unit() {
        let config = EngineConfig::new(0, ProgressionStrategy::Flat);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidNonZero {
                field: "base_unit",
                value: 0
            })
        );
    }

    #[test]
    fn test_rejects_bad_log_level() {
        let config = EngineConfig {
            log_level: "loud".to_string(),
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel { .. })
        ));
    }

    #[test]
    fn test_card_fields_only_checked_when_cards_enabled() {
        let config = EngineConfig::new(10, ProgressionStrategy::Flat).with_cards(0, 0, 0);
        config.validate().expect("cards disabled");

        let config = EngineConfig::new(10, ProgressionStrategy::Flat).with_cards(3, 100, 0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidNonZero {
                field: "cards.max_wagers",
                value: 0
            })
        );
    }

    #[test]
    fn test_rejects_steps_out_of_range() {
        let config = EngineConfig::new(10, ProgressionStrategy::Martingale { steps: 0 });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StepsOutOfRange { strategy: "martingale", .. })
        ));

        let rules = OutcomeRules {
            steps: MAX_PROGRESSION_STEPS + 1,
            ..OutcomeRules::default()
        };
        let config = EngineConfig::new(10, ProgressionStrategy::OutcomeRules(rules));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StepsOutOfRange { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_sequences() {
        let config = EngineConfig::new(
            10,
            ProgressionStrategy::Sequential(SequentialRules::new(vec![])),
        );
        assert_eq!(config.validate(), Err(ConfigError::EmptySequence));

        let config = EngineConfig::new(
            10,
            ProgressionStrategy::Sequential(SequentialRules::new(vec![1, 0, 2])),
        );
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidSequenceEntry { index: 1 })
        );
    }

    #[test]
    fn test_rejects_duplicate_and_invalid_custom_groups() {
        let config = EngineConfig::default()
            .with_custom_group(CustomGroupDef::new("lucky", [7, 17]))
            .with_custom_group(CustomGroupDef::new("lucky", [8]));
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateCustomGroup {
                id: "lucky".to_string()
            })
        );

        let config = EngineConfig::default().with_custom_group(CustomGroupDef::new("empty", []));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCustomGroup {
                source: GroupError::Empty,
                ..
            })
        ));

        let mut group = CustomGroupDef::new("wide", [1]);
        group.numbers.push(37);
        let config = EngineConfig::default().with_custom_group(group);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCustomGroup {
                source: GroupError::NumberOutOfRange { got: 37, .. },
                ..
            })
        ));
    }

    #[test]
    fn test_parses_yaml() {
        let yaml = r#"
base_unit: 10
strategy: { kind: fibonacci, steps: 6 }
custom_groups:
  - id: lucky
    numbers: [7, 17, 27]
cards: { total_cards: 3, target: 100, max_wagers: 15 }
session: { bankroll: 1000, stop_loss: 300 }
"#;
        let config: EngineConfig = serde_yaml::from_str(yaml).expect("parse");
        config.validate().expect("valid");
        assert_eq!(config.base_unit, 10);
        assert_eq!(config.strategy, ProgressionStrategy::Fibonacci { steps: 6 });
        assert_eq!(config.custom_groups[0].numbers, vec![7, 17, 27]);
        assert_eq!(config.cards.total_cards, 3);
        assert_eq!(config.session.stop_loss, Some(300));
        assert_eq!(config.session.stop_profit, None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_parses_sequential_strategy() {
        let yaml = r#"
kind: sequential
sequence: [1, 1, 2, 4]
on_win: move_back2
on_loss: move_forward1
reset_after_wins: 2
at_sequence_end: pause
"#;
        let strategy: ProgressionStrategy = serde_yaml::from_str(yaml).expect("parse");
        let ProgressionStrategy::Sequential(rules) = strategy else {
            panic!("expected sequential strategy");
        };
        assert_eq!(rules.sequence, vec![1, 1, 2, 4]);
        assert_eq!(rules.reset_after_wins, Some(2));
        assert_eq!(rules.at_sequence_end, crate::wager::SequenceEnd::Pause);
    }
}
