//! Nottingham Decision Core
//!
//! Platform-agnostic merchant and inspector logic for a bluffing card game:
//! declarations, bribes, tiered strategy selection, the bluff contest and
//! bribe negotiation. This crate has no UI or I/O; callers supply data and
//! an inspector policy.

pub mod bribe;
pub mod constants;
pub mod declaration;
pub mod goods;
pub mod history;
pub mod inspection;
pub mod inspector;
pub mod merchant;
pub mod negotiation;
pub mod numbers;
pub mod rng;
pub mod rules;
pub mod session;
pub mod strategy;

// Re-export commonly used types
pub use bribe::{BribeContext, BribePlan, calculate as calculate_bribe, should_offer_bribe};
pub use declaration::{Declaration, LieType, build as build_declaration};
pub use goods::{Bag, Good, GoodCategory, GoodId, GoodsCatalog};
pub use history::{HistoryStore, InspectorAction, InspectorProfile, OpponentStats, RoundRecord};
pub use inspection::{
    BluffRolls, InspectionContext, InspectionOutcome, PassOutcome, Verdict, bag_matches_declaration,
    partition_bag, resolve_inspection, settle_contest, settle_pass,
};
pub use inspector::Inspector;
pub use merchant::{Merchant, MerchantRole, MerchantRoster, Personality, SmugglingSummary, Tier};
pub use negotiation::{
    InspectorReply, Negotiation, NegotiationError, NegotiationOutcome, NegotiationPhase,
    NegotiationTerms,
};
pub use rng::RngBundle;
pub use rules::{ConfigurationError, RulesConfig};
pub use session::{BagView, InspectorPolicy, RoundError, RoundReport, Session};
pub use strategy::{MerchantDecision, StrategyKind, decide, select_strategy};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// Returns an error if the goods cannot be loaded.
    fn load_catalog(&self) -> Result<GoodsCatalog, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the merchants cannot be loaded or fail validation.
    fn load_roster(&self, rules: &RulesConfig) -> Result<MerchantRoster, Self::Error>;

    /// Rules override; loaders without one fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a rules source exists but cannot be parsed.
    fn load_rules(&self) -> Result<RulesConfig, Self::Error> {
        Ok(RulesConfig::default())
    }
}

/// Loader backed by the data files compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledData;

impl DataLoader for BundledData {
    type Error = ConfigurationError;

    fn load_catalog(&self) -> Result<GoodsCatalog, Self::Error> {
        GoodsCatalog::bundled()
    }

    fn load_roster(&self, rules: &RulesConfig) -> Result<MerchantRoster, Self::Error> {
        MerchantRoster::bundled(rules)
    }
}

/// Main entry point for creating game sessions
pub struct GameEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
}

impl<L> GameEngine<L>
where
    L: DataLoader,
{
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    /// Start a new game with the loader's catalog and rules.
    ///
    /// # Errors
    ///
    /// Returns an error if data cannot be loaded or the rules are invalid.
    pub fn create_session(&self, seed: u64) -> Result<Session, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
    {
        let rules = self.data_loader.load_rules().map_err(Into::into)?;
        let catalog = self.data_loader.load_catalog().map_err(Into::into)?;
        Ok(Session::new(seed, catalog, rules)?)
    }

    /// Merchants validated against the loader's rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules or the roster cannot be loaded.
    pub fn load_roster(&self) -> Result<MerchantRoster, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
    {
        let rules = self.data_loader.load_rules().map_err(Into::into)?;
        self.data_loader.load_roster(&rules).map_err(Into::into)
    }
}
