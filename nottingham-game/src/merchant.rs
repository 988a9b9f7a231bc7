//! Merchant records, personalities and the roster loader.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::STARTING_MERCHANT_GOLD;
use crate::goods::{Bag, GoodsCatalog};
use crate::rules::{ConfigurationError, RulesConfig};

const DEFAULT_ROSTER_DATA: &str = include_str!("../data/merchants.json");

/// Personality triple steering every merchant decision; each trait in `[0, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Personality {
    pub risk_tolerance: u8,
    pub greed: u8,
    pub honesty_bias: u8,
}

impl Personality {
    #[must_use]
    pub const fn new(risk_tolerance: u8, greed: u8, honesty_bias: u8) -> Self {
        Self {
            risk_tolerance,
            greed,
            honesty_bias,
        }
    }

    /// Reject any trait above the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::TraitOutOfRange`] naming the offending trait.
    pub fn validate(&self, rules: &RulesConfig) -> Result<(), ConfigurationError> {
        RulesConfig::check_trait("risk_tolerance", self.risk_tolerance, rules.trait_max)?;
        RulesConfig::check_trait("greed", self.greed, rules.trait_max)?;
        RulesConfig::check_trait("honesty_bias", self.honesty_bias, rules.trait_max)
    }
}

impl Default for Personality {
    fn default() -> Self {
        Self::new(5, 5, 5)
    }
}

/// Difficulty class controlling history depth and decision sophistication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Easy,
    Medium,
    Hard,
}

impl Tier {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Tier {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(ConfigurationError::Parse(format!("unknown tier `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MerchantRole {
    #[default]
    Standard,
    /// Reads only history correlated to the current inspector.
    InformationBroker,
}

/// Aggregate smuggling counters shown to the inspector between rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SmugglingSummary {
    pub contraband_passed: u32,
    pub contraband_value: u32,
    pub legal_sold: u32,
    pub legal_value: u32,
}

impl SmugglingSummary {
    /// Tally goods that made it through the gate.
    pub fn absorb(&mut self, passed: &Bag, catalog: &GoodsCatalog) {
        for id in passed {
            let Some(good) = catalog.get(id) else {
                continue;
            };
            if good.is_contraband() {
                self.contraband_passed = self.contraband_passed.saturating_add(1);
                self.contraband_value = self.contraband_value.saturating_add(good.value);
            } else {
                self.legal_sold = self.legal_sold.saturating_add(1);
                self.legal_value = self.legal_value.saturating_add(good.value);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: String,
    pub name: String,
    pub personality: Personality,
    pub bluff_skill: u8,
    pub tier: Tier,
    #[serde(default)]
    pub role: MerchantRole,
    #[serde(default = "Merchant::default_gold")]
    pub gold: u32,
    #[serde(default)]
    pub summary: SmugglingSummary,
}

impl Merchant {
    const fn default_gold() -> u32 {
        STARTING_MERCHANT_GOLD
    }

    /// Create a validated merchant with the starting purse.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::TraitOutOfRange`] when a personality trait
    /// or the bluff skill is outside its domain.
    pub fn new(
        id: &str,
        name: &str,
        personality: Personality,
        bluff_skill: u8,
        tier: Tier,
        rules: &RulesConfig,
    ) -> Result<Self, ConfigurationError> {
        let merchant = Self {
            id: id.to_string(),
            name: name.to_string(),
            personality,
            bluff_skill,
            tier,
            role: MerchantRole::Standard,
            gold: STARTING_MERCHANT_GOLD,
            summary: SmugglingSummary::default(),
        };
        merchant.validate(rules)?;
        Ok(merchant)
    }

    #[must_use]
    pub const fn with_role(mut self, role: MerchantRole) -> Self {
        self.role = role;
        self
    }

    #[must_use]
    pub const fn with_gold(mut self, gold: u32) -> Self {
        self.gold = gold;
        self
    }

    /// Check traits; HARD merchants count as experts and may bluff up to the
    /// expert ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::TraitOutOfRange`].
    pub fn validate(&self, rules: &RulesConfig) -> Result<(), ConfigurationError> {
        self.personality.validate(rules)?;
        let bluff_max = if self.tier == Tier::Hard {
            rules.bluff_skill_max
        } else {
            rules.trait_max
        };
        RulesConfig::check_trait("bluff_skill", self.bluff_skill, bluff_max)
    }

    #[must_use]
    pub fn is_broker(&self) -> bool {
        self.role == MerchantRole::InformationBroker
    }

    /// Tier used for decisions; information brokers always play HARD.
    #[must_use]
    pub fn effective_tier(&self) -> Tier {
        if self.is_broker() { Tier::Hard } else { self.tier }
    }

    /// Deduct up to `amount`, never going below zero. Returns what was paid.
    pub fn pay(&mut self, amount: u32) -> u32 {
        let paid = amount.min(self.gold);
        self.gold -= paid;
        paid
    }

    pub fn receive(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }
}

/// Collection of merchants loaded from data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchantRoster(pub Vec<Merchant>);

impl MerchantRoster {
    /// Parse and validate a JSON array of merchants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Parse`] for malformed JSON or the first
    /// merchant validation failure.
    pub fn from_json(json: &str, rules: &RulesConfig) -> Result<Self, ConfigurationError> {
        let roster: Self =
            serde_json::from_str(json).map_err(|err| ConfigurationError::Parse(err.to_string()))?;
        for merchant in &roster.0 {
            merchant.validate(rules)?;
        }
        Ok(roster)
    }

    /// The roster shipped with the crate.
    ///
    /// # Errors
    ///
    /// Fails only if `rules` are stricter than the bundled merchants allow.
    pub fn bundled(rules: &RulesConfig) -> Result<Self, ConfigurationError> {
        Self::from_json(DEFAULT_ROSTER_DATA, rules)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Merchant> {
        self.0.iter().find(|merchant| merchant.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Merchant> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
