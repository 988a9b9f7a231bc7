//! Append-only round history with tier-scoped views and opponent statistics.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    CORRUPT_ACCEPTANCE_RATE, GREEDY_ACCEPTANCE_RATE, PRIOR_BRIBE_ACCEPTANCE_RATE, PRIOR_CATCH_RATE,
    PRIOR_INSPECTION_RATE, PROFILE_MIN_BRIBES, PROFILE_MIN_RECORDS, PROFILE_RECENT_WINDOW,
    STRICT_OPEN_RATE, TRIGGER_HAPPY_BRIBED_OPEN_RATE, TRIGGER_HAPPY_QUIET_OPEN_RATE,
};
use crate::declaration::Declaration;
use crate::merchant::Tier;
use crate::numbers::ratio_or;
use crate::rules::RulesConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectorAction {
    Pass,
    Inspect,
    Threaten,
}

impl InspectorAction {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Inspect => "inspect",
            Self::Threaten => "threaten",
        }
    }
}

impl fmt::Display for InspectorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Immutable outcome of one merchant encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub merchant_id: String,
    pub inspector_id: String,
    pub declaration: Declaration,
    pub action: InspectorAction,
    pub bag_opened: bool,
    pub bribe_offered: u32,
    pub bribe_accepted: bool,
    pub lie_caught: bool,
    pub penalty_paid: u32,
    pub merchant_gold_delta: i64,
    pub inspector_gold_delta: i64,
    pub reputation_delta: i32,
    pub negotiation_rounds: u8,
}

impl RoundRecord {
    #[must_use]
    pub const fn bribe_was_offered(&self) -> bool {
        self.bribe_offered > 0
    }
}

/// Ordered log of every round in the current game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStore {
    records: Vec<RoundRecord>,
}

impl HistoryStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a finished round. Records are never edited afterwards.
    pub fn record(&mut self, record: RoundRecord) {
        log::debug!(
            "{} round={} merchant={} action={} caught={}",
            crate::constants::LOG_ROUND_RECORDED,
            record.round,
            record.merchant_id,
            record.action,
            record.lie_caught
        );
        self.records.push(record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn all(&self) -> &[RoundRecord] {
        &self.records
    }

    /// The most recent `n` records, oldest first.
    #[must_use]
    pub fn last_n(&self, n: usize) -> &[RoundRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// History visible to a tier: EASY and MEDIUM see a short window, HARD sees everything.
    #[must_use]
    pub fn for_tier(&self, tier: Tier, rules: &RulesConfig) -> &[RoundRecord] {
        match tier {
            Tier::Easy => self.last_n(rules.easy_history_window),
            Tier::Medium => self.last_n(rules.medium_history_window),
            Tier::Hard => self.all(),
        }
    }

    /// Records correlated to one inspector, oldest first.
    #[must_use]
    pub fn for_inspector(&self, inspector_id: &str) -> Vec<&RoundRecord> {
        self.records
            .iter()
            .filter(|record| record.inspector_id == inspector_id)
            .collect()
    }

    /// Start a new game.
    pub fn reset(&mut self) {
        self.records.clear();
    }
}

/// Aggregate opponent rates, computed on demand from a history view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpponentStats {
    pub inspection_rate: f64,
    pub catch_rate: f64,
    pub bribe_acceptance_rate: f64,
    pub samples: usize,
}

impl OpponentStats {
    /// Neutral priors used when no history is visible.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            inspection_rate: PRIOR_INSPECTION_RATE,
            catch_rate: PRIOR_CATCH_RATE,
            bribe_acceptance_rate: PRIOR_BRIBE_ACCEPTANCE_RATE,
            samples: 0,
        }
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a RoundRecord>) -> Self {
        let mut total = 0_usize;
        let mut opened = 0_usize;
        let mut caught = 0_usize;
        let mut offered = 0_usize;
        let mut accepted = 0_usize;
        for record in records {
            total += 1;
            opened += usize::from(record.bag_opened);
            caught += usize::from(record.lie_caught);
            if record.bribe_was_offered() {
                offered += 1;
                accepted += usize::from(record.bribe_accepted);
            }
        }
        Self {
            inspection_rate: ratio_or(opened, total, PRIOR_INSPECTION_RATE),
            catch_rate: ratio_or(caught, opened, PRIOR_CATCH_RATE),
            bribe_acceptance_rate: ratio_or(accepted, offered, PRIOR_BRIBE_ACCEPTANCE_RATE),
            samples: total,
        }
    }
}

impl Default for OpponentStats {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Behavioral classification of an inspector mined from correlated history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectorProfile {
    /// Takes nearly every bribe offered.
    Corrupt,
    /// Takes bribes often, but not reliably.
    Greedy,
    /// Opens the bags of merchants who offer bribes and waves the rest through.
    TriggerHappy,
    /// Opens most bags.
    Strict,
    Unknown,
}

impl InspectorProfile {
    /// Classify from the most recent correlated records; fewer than five records
    /// is always `Unknown`.
    #[must_use]
    pub fn detect(records: &[&RoundRecord]) -> Self {
        if records.len() < PROFILE_MIN_RECORDS {
            return Self::Unknown;
        }
        let start = records.len().saturating_sub(PROFILE_RECENT_WINDOW);
        let recent = &records[start..];
        let (bribed, quiet): (Vec<&RoundRecord>, Vec<&RoundRecord>) =
            recent.iter().copied().partition(|r| r.bribe_was_offered());
        if bribed.len() >= PROFILE_MIN_BRIBES {
            let accepted = bribed.iter().filter(|r| r.bribe_accepted).count();
            let rate = ratio_or(accepted, bribed.len(), 0.0);
            if rate > CORRUPT_ACCEPTANCE_RATE {
                return Self::Corrupt;
            }
            let bribed_opened = bribed.iter().filter(|r| r.bag_opened).count();
            let quiet_opened = quiet.iter().filter(|r| r.bag_opened).count();
            if ratio_or(bribed_opened, bribed.len(), 0.0) >= TRIGGER_HAPPY_BRIBED_OPEN_RATE
                && ratio_or(quiet_opened, quiet.len(), 0.0) <= TRIGGER_HAPPY_QUIET_OPEN_RATE
            {
                return Self::TriggerHappy;
            }
            if rate >= GREEDY_ACCEPTANCE_RATE {
                return Self::Greedy;
            }
        }
        let opened = recent.iter().filter(|r| r.bag_opened).count();
        if ratio_or(opened, recent.len(), 0.0) > STRICT_OPEN_RATE {
            return Self::Strict;
        }
        Self::Unknown
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Corrupt => "corrupt",
            Self::Greedy => "greedy",
            Self::TriggerHappy => "trigger_happy",
            Self::Strict => "strict",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::declaration::Declaration;
    use crate::goods::{Bag, GoodId, GoodsCatalog};
    use crate::strategy::StrategyKind;

    pub(crate) fn honest_declaration() -> Declaration {
        let bag: Bag = std::iter::repeat_n(GoodId::new("apple"), 2).collect();
        Declaration::from_parts(
            StrategyKind::Honest,
            GoodId::new("apple"),
            2,
            bag,
            &GoodsCatalog::standard().unwrap(),
            &RulesConfig::default(),
        )
        .unwrap()
    }

    pub(crate) fn record(
        round: u32,
        inspector: &str,
        opened: bool,
        caught: bool,
        bribe: u32,
        accepted: bool,
    ) -> RoundRecord {
        RoundRecord {
            round,
            merchant_id: "m".to_string(),
            inspector_id: inspector.to_string(),
            declaration: honest_declaration(),
            action: if opened {
                InspectorAction::Inspect
            } else {
                InspectorAction::Pass
            },
            bag_opened: opened,
            bribe_offered: bribe,
            bribe_accepted: accepted,
            lie_caught: caught,
            penalty_paid: 0,
            merchant_gold_delta: 0,
            inspector_gold_delta: 0,
            reputation_delta: 0,
            negotiation_rounds: 0,
        }
    }

    #[test]
    fn empty_view_uses_neutral_priors() {
        let store = HistoryStore::new();
        let stats = OpponentStats::from_records(store.all());
        assert_eq!(stats, OpponentStats::neutral());
        assert!((stats.bribe_acceptance_rate - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn rates_use_their_own_denominators() {
        let mut store = HistoryStore::new();
        store.record(record(1, "s", true, true, 0, false));
        store.record(record(2, "s", true, false, 4, false));
        store.record(record(3, "s", false, false, 3, true));
        store.record(record(4, "s", false, false, 0, false));
        let stats = OpponentStats::from_records(store.all());
        assert!((stats.inspection_rate - 0.5).abs() < f64::EPSILON);
        assert!((stats.catch_rate - 0.5).abs() < f64::EPSILON);
        assert!((stats.bribe_acceptance_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats.samples, 4);
    }

    #[test]
    fn tier_views_slice_recent_records() {
        let rules = RulesConfig::default();
        let mut store = HistoryStore::new();
        for round in 1..=6 {
            store.record(record(round, "s", false, false, 0, false));
        }
        assert_eq!(store.for_tier(Tier::Easy, &rules).len(), 2);
        assert_eq!(store.for_tier(Tier::Medium, &rules).len(), 4);
        assert_eq!(store.for_tier(Tier::Hard, &rules).len(), 6);
        assert_eq!(store.for_tier(Tier::Easy, &rules)[0].round, 5);
        store.reset();
        assert!(store.is_empty());
    }

    #[test]
    fn per_inspector_view_filters_by_id() {
        let mut store = HistoryStore::new();
        store.record(record(1, "a", true, false, 0, false));
        store.record(record(2, "b", false, false, 0, false));
        store.record(record(3, "a", false, false, 0, false));
        let view = store.for_inspector("a");
        assert_eq!(view.len(), 2);
        assert!(store.for_inspector("zzz").is_empty());
    }

    #[test]
    fn profile_detection() {
        let corrupt: Vec<RoundRecord> = (1..=6).map(|r| record(r, "s", false, false, 3, true)).collect();
        let view: Vec<&RoundRecord> = corrupt.iter().collect();
        assert_eq!(InspectorProfile::detect(&view), InspectorProfile::Corrupt);

        let strict: Vec<RoundRecord> = (1..=6).map(|r| record(r, "s", true, false, 0, false)).collect();
        let view: Vec<&RoundRecord> = strict.iter().collect();
        assert_eq!(InspectorProfile::detect(&view), InspectorProfile::Strict);

        let mixed: Vec<RoundRecord> = (1..=6)
            .map(|r| record(r, "s", false, false, 2, r % 2 == 0))
            .collect();
        let view: Vec<&RoundRecord> = mixed.iter().collect();
        assert_eq!(InspectorProfile::detect(&view), InspectorProfile::Greedy);

        let view: Vec<&RoundRecord> = strict.iter().take(4).collect();
        assert_eq!(InspectorProfile::detect(&view), InspectorProfile::Unknown);
    }

    #[test]
    fn inspectors_who_only_open_bribed_bags_are_trigger_happy() {
        let records: Vec<RoundRecord> = (1..=8)
            .map(|r| {
                if r % 2 == 0 {
                    record(r, "s", true, false, 2, false)
                } else {
                    record(r, "s", false, false, 0, false)
                }
            })
            .collect();
        let view: Vec<&RoundRecord> = records.iter().collect();
        assert_eq!(InspectorProfile::detect(&view), InspectorProfile::TriggerHappy);
    }
}
