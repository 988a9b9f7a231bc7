use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use nottingham_game::numbers::{ratio_or, u32_to_f64};
use nottingham_game::{
    GoodsCatalog, Inspector, MerchantRoster, RoundReport, RulesConfig, Session, StrategyKind,
};
use serde::Serialize;

use crate::logic::policy::InspectorPersonality;

/// Configuration for one simulated game.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub personality: InspectorPersonality,
    pub rounds: usize,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(personality: InspectorPersonality, seed: u64) -> Self {
        Self {
            seed,
            personality,
            rounds: 100,
        }
    }

    #[must_use]
    pub const fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }
}

/// Balance counters gathered over a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BalanceMetrics {
    pub strategies: BTreeMap<String, usize>,
    pub bags_opened: usize,
    pub lies_caught: usize,
    pub lies_told: usize,
    pub bribes_accepted: usize,
    pub bribe_gold: u64,
    pub penalty_gold: u64,
    pub contraband_passed_value: u64,
    pub inspector_reputation: i32,
    pub inspector_gold: u32,
    pub merchant_gold: BTreeMap<String, u32>,
}

impl BalanceMetrics {
    #[must_use]
    pub fn catch_rate(&self) -> f64 {
        ratio_or(self.lies_caught, self.bags_opened, 0.0)
    }

    #[must_use]
    pub fn lie_rate(&self, rounds: usize) -> f64 {
        ratio_or(self.lies_told, rounds, 0.0)
    }
}

/// Outcome of a simulated game, including any broken invariants.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub personality: InspectorPersonality,
    pub seed: u64,
    pub rounds_played: usize,
    pub violations: Vec<String>,
    pub metrics: BalanceMetrics,
    #[serde(skip)]
    pub duration: Duration,
}

impl SimulationResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Play `config.rounds` rounds against one inspector, cycling through the
/// roster, and check the round invariants after every round.
///
/// # Errors
///
/// Returns an error if the session cannot be created or a round fails to
/// resolve.
pub fn run_simulation(
    config: SimulationConfig,
    roster: &MerchantRoster,
    catalog: &GoodsCatalog,
    rules: &RulesConfig,
) -> Result<SimulationResult> {
    let start = Instant::now();
    let mut session = Session::new(config.seed, catalog.clone(), rules.clone())
        .context("invalid rules for simulation")?;
    let mut merchants = roster.0.clone();
    let mut inspector = Inspector::new(config.personality.key(), 5, 5)?;
    let mut policy = config.personality.create_policy(config.seed);
    let mut metrics = BalanceMetrics::default();
    let mut violations = Vec::new();

    if merchants.is_empty() {
        violations.push("roster is empty".to_string());
    }
    for round in 0..config.rounds {
        let Some(merchant) = merchants.get_mut(round % roster.len().max(1)) else {
            break;
        };
        let gold_before = merchant.gold;
        let inspector_gold_before = inspector.gold;
        let report = session
            .play_round(merchant, &mut inspector, policy.as_mut())
            .with_context(|| format!("round {} for merchant {}", round + 1, merchant.id))?;
        check_round(
            &report,
            (gold_before, merchant.gold),
            (inspector_gold_before, inspector.gold),
            &session,
            &mut violations,
        );
        tally(&report, catalog, &mut metrics);
    }
    if session.history().len() != usize::try_from(session.rounds_played()).unwrap_or(usize::MAX) {
        violations.push(format!(
            "history holds {} records after {} rounds",
            session.history().len(),
            session.rounds_played()
        ));
    }

    metrics.inspector_reputation = inspector.reputation;
    metrics.inspector_gold = inspector.gold;
    metrics.merchant_gold = merchants.iter().map(|m| (m.id.clone(), m.gold)).collect();
    let rounds_played = session.history().len();
    log::info!(
        "{} seed {}: {} rounds, {} violations",
        config.personality,
        config.seed,
        rounds_played,
        violations.len()
    );
    Ok(SimulationResult {
        personality: config.personality,
        seed: config.seed,
        rounds_played,
        violations,
        metrics,
        duration: start.elapsed(),
    })
}

/// Gold pairs are `(before, after)` for the round.
fn check_round(
    report: &RoundReport,
    merchant_gold: (u32, u32),
    inspector_gold: (u32, u32),
    session: &Session,
    violations: &mut Vec<String>,
) {
    let (gold_before, gold_after) = merchant_gold;
    let (inspector_gold_before, inspector_gold_after) = inspector_gold;
    let record = &report.record;
    let round = record.round;
    if i64::from(gold_before) + record.merchant_gold_delta != i64::from(gold_after) {
        violations.push(format!(
            "round {round}: merchant gold {gold_before} {:+} != {gold_after}",
            record.merchant_gold_delta
        ));
    }
    if i64::from(inspector_gold_before) + record.inspector_gold_delta != i64::from(inspector_gold_after) {
        violations.push(format!("round {round}: inspector gold drifted"));
    }
    let undeclared = record.declaration.undeclared_value(session.catalog());
    let cap = u32_to_f64(undeclared) * session.rules().bribe_cap_rate;
    if undeclared > 0 && u32_to_f64(report.bribe_paid) > cap {
        violations.push(format!(
            "round {round}: bribe {} above cap {cap:.1}",
            report.bribe_paid
        ));
    }
    if record.negotiation_rounds > session.rules().max_negotiation_rounds {
        violations.push(format!(
            "round {round}: negotiation ran {} rounds",
            record.negotiation_rounds
        ));
    }
    if !record.declaration.lie && (record.penalty_paid > 0 || !report.confiscated.is_empty()) {
        violations.push(format!("round {round}: honest bag was penalized"));
    }
    if record.declaration.strategy == StrategyKind::LegalLie
        && record.declaration.has_contraband(session.catalog())
    {
        violations.push(format!("round {round}: legal lie carried contraband"));
    }
}

fn tally(report: &RoundReport, catalog: &GoodsCatalog, metrics: &mut BalanceMetrics) {
    let record = &report.record;
    *metrics
        .strategies
        .entry(report.strategy.key().to_string())
        .or_default() += 1;
    metrics.bags_opened += usize::from(record.bag_opened);
    metrics.lies_caught += usize::from(record.lie_caught);
    metrics.lies_told += usize::from(record.declaration.lie);
    metrics.bribes_accepted += usize::from(record.bribe_accepted);
    metrics.bribe_gold += u64::from(report.bribe_paid);
    metrics.penalty_gold += u64::from(record.penalty_paid);
    metrics.contraband_passed_value += u64::from(catalog.contraband_value(&report.passed));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (MerchantRoster, GoodsCatalog, RulesConfig) {
        let rules = RulesConfig::default();
        (
            MerchantRoster::bundled(&rules).unwrap(),
            GoodsCatalog::standard().unwrap(),
            rules,
        )
    }

    #[test]
    fn every_personality_runs_clean() {
        let (roster, catalog, rules) = fixtures();
        for personality in InspectorPersonality::ALL {
            let config = SimulationConfig::new(personality, 1337).with_rounds(40);
            let result = run_simulation(config, &roster, &catalog, &rules).unwrap();
            assert_eq!(result.rounds_played, 40);
            assert!(result.passed(), "{personality}: {:?}", result.violations);
            assert_eq!(result.metrics.strategies.values().sum::<usize>(), 40);
        }
    }

    #[test]
    fn strict_inspector_opens_everything() {
        let (roster, catalog, rules) = fixtures();
        let config = SimulationConfig::new(InspectorPersonality::Strict, 7).with_rounds(25);
        let result = run_simulation(config, &roster, &catalog, &rules).unwrap();
        assert_eq!(result.metrics.bags_opened, 25);
        assert_eq!(result.metrics.bribes_accepted, 0);
    }

    #[test]
    fn inspector_purse_is_bribes_plus_penalties() {
        let (roster, catalog, rules) = fixtures();
        let config = SimulationConfig::new(InspectorPersonality::Corrupt, 9).with_rounds(50);
        let result = run_simulation(config, &roster, &catalog, &rules).unwrap();
        let metrics = &result.metrics;
        assert!(metrics.bags_opened + metrics.bribes_accepted <= 50);
        assert_eq!(
            u64::from(metrics.inspector_gold),
            metrics.bribe_gold + metrics.penalty_gold
        );
    }
}
