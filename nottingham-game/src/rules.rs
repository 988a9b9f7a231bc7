//! Tunable rule parameters and configuration errors.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::strategy::StrategyKind;

/// Errors raised when entities or rule parameters violate their documented domains.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    TraitOutOfRange {
        field: &'static str,
        min: u8,
        max: u8,
        value: u8,
    },
    #[error("bag size must be between {min} and {max} (got {len})")]
    BagSizeOutOfRange { len: usize, min: usize, max: usize },
    #[error("declared count must be between {min} and {max} (got {count})")]
    DeclaredCountOutOfRange { count: u8, min: usize, max: usize },
    #[error("unknown strategy kind `{0}`")]
    UnknownStrategy(String),
    #[error("unknown good id `{0}`")]
    UnknownGood(String),
    #[error("duplicate good id `{0}`")]
    DuplicateGood(String),
    #[error("catalog needs at least {required} {category} goods (got {found})")]
    CatalogTooSmall {
        category: &'static str,
        required: usize,
        found: usize,
    },
    #[error("declaration for `{strategy}` breaks its invariant: {reason}")]
    InvalidDeclaration {
        strategy: StrategyKind,
        reason: &'static str,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RateOutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("bribe anchor band invalid (min {min:.2} > max {max:.2})")]
    AnchorBand { min: f64, max: f64 },
    #[error("{field} must be at least {min} (got {value})")]
    LimitTooSmall {
        field: &'static str,
        min: usize,
        value: usize,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Runtime-tunable rule parameters; defaults mirror [`crate::constants`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "RulesConfig::default_trait_max")]
    pub trait_max: u8,
    #[serde(default = "RulesConfig::default_bluff_skill_max")]
    pub bluff_skill_max: u8,
    #[serde(default = "RulesConfig::default_bag_size_limit")]
    pub bag_size_limit: usize,
    #[serde(default = "RulesConfig::default_easy_window")]
    pub easy_history_window: usize,
    #[serde(default = "RulesConfig::default_medium_window")]
    pub medium_history_window: usize,
    #[serde(default = "RulesConfig::default_high_catch_rate")]
    pub high_catch_rate: f64,
    #[serde(default = "RulesConfig::default_low_catch_rate")]
    pub low_catch_rate: f64,
    #[serde(default = "RulesConfig::default_anchor_min")]
    pub bribe_anchor_min: f64,
    #[serde(default = "RulesConfig::default_anchor_max")]
    pub bribe_anchor_max: f64,
    #[serde(default = "RulesConfig::default_cap_rate")]
    pub bribe_cap_rate: f64,
    #[serde(default = "RulesConfig::default_advanced_bluff_chance")]
    pub advanced_bluff_chance: f64,
    #[serde(default = "RulesConfig::default_penalty_rate")]
    pub penalty_rate: f64,
    #[serde(default = "RulesConfig::default_max_rounds")]
    pub max_negotiation_rounds: u8,
}

impl RulesConfig {
    const fn default_trait_max() -> u8 {
        constants::TRAIT_MAX
    }

    const fn default_bluff_skill_max() -> u8 {
        constants::BLUFF_SKILL_EXPERT_MAX
    }

    const fn default_bag_size_limit() -> usize {
        constants::BAG_SIZE_LIMIT
    }

    const fn default_easy_window() -> usize {
        constants::EASY_HISTORY_WINDOW
    }

    const fn default_medium_window() -> usize {
        constants::MEDIUM_HISTORY_WINDOW
    }

    const fn default_high_catch_rate() -> f64 {
        constants::HIGH_CATCH_RATE
    }

    const fn default_low_catch_rate() -> f64 {
        constants::LOW_CATCH_RATE
    }

    const fn default_anchor_min() -> f64 {
        constants::BRIBE_ANCHOR_MIN
    }

    const fn default_anchor_max() -> f64 {
        constants::BRIBE_ANCHOR_MAX
    }

    const fn default_cap_rate() -> f64 {
        constants::BRIBE_CAP_RATE
    }

    const fn default_advanced_bluff_chance() -> f64 {
        constants::ADVANCED_BLUFF_CHANCE
    }

    const fn default_penalty_rate() -> f64 {
        constants::PENALTY_RATE
    }

    const fn default_max_rounds() -> u8 {
        constants::MAX_NEGOTIATION_ROUNDS
    }

    /// Parse a rules override from JSON, filling omitted fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Parse`] for malformed JSON and any
    /// validation error raised by [`RulesConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigurationError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every parameter against its documented domain.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.bag_size_limit < constants::ARCHETYPE_BAG_SIZE_MAX {
            return Err(ConfigurationError::LimitTooSmall {
                field: "bag_size_limit",
                min: constants::ARCHETYPE_BAG_SIZE_MAX,
                value: self.bag_size_limit,
            });
        }
        if self.easy_history_window == 0 {
            return Err(ConfigurationError::LimitTooSmall {
                field: "easy_history_window",
                min: 1,
                value: 0,
            });
        }
        if self.medium_history_window < self.easy_history_window {
            return Err(ConfigurationError::LimitTooSmall {
                field: "medium_history_window",
                min: self.easy_history_window,
                value: self.medium_history_window,
            });
        }
        if self.max_negotiation_rounds == 0 {
            return Err(ConfigurationError::LimitTooSmall {
                field: "max_negotiation_rounds",
                min: 1,
                value: 0,
            });
        }
        if self.bluff_skill_max < self.trait_max {
            return Err(ConfigurationError::LimitTooSmall {
                field: "bluff_skill_max",
                min: usize::from(self.trait_max),
                value: usize::from(self.bluff_skill_max),
            });
        }
        for (field, value) in [
            ("high_catch_rate", self.high_catch_rate),
            ("low_catch_rate", self.low_catch_rate),
            ("bribe_cap_rate", self.bribe_cap_rate),
            ("advanced_bluff_chance", self.advanced_bluff_chance),
            ("penalty_rate", self.penalty_rate),
        ] {
            check_unit_rate(field, value)?;
        }
        if self.low_catch_rate > self.high_catch_rate {
            return Err(ConfigurationError::RateOutOfRange {
                field: "low_catch_rate",
                min: 0.0,
                max: self.high_catch_rate,
                value: self.low_catch_rate,
            });
        }
        if !(self.bribe_anchor_min.is_finite() && self.bribe_anchor_max.is_finite())
            || self.bribe_anchor_min < 0.0
            || self.bribe_anchor_min > self.bribe_anchor_max
        {
            return Err(ConfigurationError::AnchorBand {
                min: self.bribe_anchor_min,
                max: self.bribe_anchor_max,
            });
        }
        Ok(())
    }

    /// Reject a personality or skill trait outside `[0, max]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::TraitOutOfRange`] when `value > max`.
    pub fn check_trait(
        field: &'static str,
        value: u8,
        max: u8,
    ) -> Result<(), ConfigurationError> {
        if value > max {
            return Err(ConfigurationError::TraitOutOfRange {
                field,
                min: constants::TRAIT_MIN,
                max,
                value,
            });
        }
        Ok(())
    }

    /// Reject bag lengths outside `[1, bag_size_limit]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::BagSizeOutOfRange`].
    pub fn check_bag_len(&self, len: usize) -> Result<(), ConfigurationError> {
        if len < constants::BAG_SIZE_MIN || len > self.bag_size_limit {
            return Err(ConfigurationError::BagSizeOutOfRange {
                len,
                min: constants::BAG_SIZE_MIN,
                max: self.bag_size_limit,
            });
        }
        Ok(())
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            trait_max: Self::default_trait_max(),
            bluff_skill_max: Self::default_bluff_skill_max(),
            bag_size_limit: Self::default_bag_size_limit(),
            easy_history_window: Self::default_easy_window(),
            medium_history_window: Self::default_medium_window(),
            high_catch_rate: Self::default_high_catch_rate(),
            low_catch_rate: Self::default_low_catch_rate(),
            bribe_anchor_min: Self::default_anchor_min(),
            bribe_anchor_max: Self::default_anchor_max(),
            bribe_cap_rate: Self::default_cap_rate(),
            advanced_bluff_chance: Self::default_advanced_bluff_chance(),
            penalty_rate: Self::default_penalty_rate(),
            max_negotiation_rounds: Self::default_max_rounds(),
        }
    }
}

fn check_unit_rate(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigurationError::RateOutOfRange {
            field,
            min: 0.0,
            max: 1.0,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = RulesConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.bag_size_limit, 6);
        assert_eq!(cfg.max_negotiation_rounds, 3);
        assert!((cfg.penalty_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn json_override_fills_missing_fields() {
        let cfg = RulesConfig::from_json(r#"{ "penalty_rate": 0.75, "max_negotiation_rounds": 2 }"#)
            .unwrap();
        assert!((cfg.penalty_rate - 0.75).abs() < f64::EPSILON);
        assert_eq!(cfg.max_negotiation_rounds, 2);
        assert_eq!(cfg.bag_size_limit, constants::BAG_SIZE_LIMIT);
    }

    #[test]
    fn invalid_values_are_rejected_not_clamped() {
        let err = RulesConfig::from_json(r#"{ "penalty_rate": 1.5 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::RateOutOfRange {
                field: "penalty_rate",
                ..
            }
        ));

        let err = RulesConfig::from_json(r#"{ "bribe_anchor_min": 1.2 }"#).unwrap_err();
        assert!(matches!(err, ConfigurationError::AnchorBand { .. }));

        let err = RulesConfig::from_json(r#"{ "max_negotiation_rounds": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigurationError::LimitTooSmall { .. }));

        for limit in [2, 4] {
            let cfg = RulesConfig {
                bag_size_limit: limit,
                ..RulesConfig::default()
            };
            assert_eq!(
                cfg.validate(),
                Err(ConfigurationError::LimitTooSmall {
                    field: "bag_size_limit",
                    min: 5,
                    value: limit,
                })
            );
        }
        let roomy = RulesConfig {
            bag_size_limit: 5,
            ..RulesConfig::default()
        };
        assert!(roomy.validate().is_ok());

        assert!(matches!(
            RulesConfig::from_json("not json"),
            Err(ConfigurationError::Parse(_))
        ));
    }

    #[test]
    fn trait_and_bag_checks() {
        assert!(RulesConfig::check_trait("greed", 10, 10).is_ok());
        assert_eq!(
            RulesConfig::check_trait("greed", 11, 10),
            Err(ConfigurationError::TraitOutOfRange {
                field: "greed",
                min: 0,
                max: 10,
                value: 11
            })
        );
        let cfg = RulesConfig::default();
        assert!(cfg.check_bag_len(1).is_ok());
        assert!(cfg.check_bag_len(6).is_ok());
        assert!(cfg.check_bag_len(0).is_err());
        assert!(cfg.check_bag_len(7).is_err());
    }
}
