use serde::{Deserialize, Serialize};

use crate::constants::{
    EXPERIENCE_PER_PERCEPTION, INSPECTOR_STAT_MAX, STARTING_INSPECTOR_REPUTATION,
    THREAT_LEVEL_MAX,
};
use crate::rules::{ConfigurationError, RulesConfig};

/// The gatekeeper a merchant plays against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspector {
    pub id: String,
    pub perception: u8,
    pub authority: u8,
    /// May go negative after too many wrongful inspections.
    #[serde(default = "Inspector::default_reputation")]
    pub reputation: i32,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub experience: u32,
}

impl Inspector {
    const fn default_reputation() -> i32 {
        STARTING_INSPECTOR_REPUTATION
    }

    /// # Errors
    ///
    /// Returns [`ConfigurationError::TraitOutOfRange`] for stats above 10.
    pub fn new(id: &str, perception: u8, authority: u8) -> Result<Self, ConfigurationError> {
        RulesConfig::check_trait("perception", perception, INSPECTOR_STAT_MAX)?;
        RulesConfig::check_trait("authority", authority, INSPECTOR_STAT_MAX)?;
        Ok(Self {
            id: id.to_string(),
            perception,
            authority,
            reputation: STARTING_INSPECTOR_REPUTATION,
            gold: 0,
            experience: 0,
        })
    }

    /// Intimidation felt by a merchant: `min(10, (authority + reputation) / 2)`,
    /// with negative reputation counting as zero.
    #[must_use]
    pub fn threat_level(&self) -> u8 {
        let reputation = u32::try_from(self.reputation.max(0)).unwrap_or(0);
        let combined = (u32::from(self.authority) + reputation) / 2;
        u8::try_from(combined.min(u32::from(THREAT_LEVEL_MAX))).unwrap_or(THREAT_LEVEL_MAX)
    }

    pub fn adjust_reputation(&mut self, delta: i32) {
        self.reputation = self.reputation.saturating_add(delta);
    }

    /// Add experience; perception rises by one for every third point earned.
    pub fn gain_experience(&mut self, points: u32) {
        for _ in 0..points {
            self.experience = self.experience.saturating_add(1);
            if self.experience % EXPERIENCE_PER_PERCEPTION == 0 && self.perception < INSPECTOR_STAT_MAX
            {
                self.perception += 1;
                log::debug!(
                    "inspector {} perception rose to {}",
                    self.id,
                    self.perception
                );
            }
        }
    }

    pub fn receive(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }
}
