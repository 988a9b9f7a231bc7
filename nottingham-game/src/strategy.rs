//! Tiered strategy selection and the information-broker policy.
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::bribe::{self, BribeContext, BribePlan};
use crate::constants::{
    ACCEPTED_BRIBES_BONUS, DANGER_WEIGHT, EASY_STRATEGY_WEIGHTS, GREED_BONUS,
    GREED_BONUS_THRESHOLD, HARD_STRATEGY_WEIGHTS, HIGH_CATCH_PENALTY, HIGH_INSPECTION_RATE,
    INSPECTION_RATE_SHIFT, LENIENT_STREAK_BONUS, LOG_BROKER_POLICY, LOG_STRATEGY_SELECTED,
    LOW_CATCH_BONUS, LOW_INSPECTION_RATE, MEDIUM_STRATEGY_WEIGHTS, PATTERN_WINDOW,
    PROFILE_LONG_WINDOW, REVERSE_PSYCHOLOGY_CATCH_RATE, REVERSE_PSYCHOLOGY_CHANCE,
    RISK_SCORE_CUTS, RISK_SCORE_MAX,
};
use crate::declaration::{self, Declaration};
use crate::goods::GoodsCatalog;
use crate::history::{HistoryStore, InspectorProfile, OpponentStats, RoundRecord};
use crate::merchant::{Merchant, Personality, Tier};
use crate::numbers::trait_to_f64;
use crate::rules::{ConfigurationError, RulesConfig};

/// Declaration archetypes, ordered from safest to boldest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Honest,
    LegalLie,
    Mixed,
    ContrabandLow,
    ContrabandHigh,
}

impl StrategyKind {
    pub const ALL: [Self; 5] = [
        Self::Honest,
        Self::LegalLie,
        Self::Mixed,
        Self::ContrabandLow,
        Self::ContrabandHigh,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Honest => "honest",
            Self::LegalLie => "legal_lie",
            Self::Mixed => "mixed",
            Self::ContrabandLow => "contraband_low",
            Self::ContrabandHigh => "contraband_high",
        }
    }

    /// Archetypes that fill the bag mostly with contraband.
    #[must_use]
    pub const fn is_smuggling(self) -> bool {
        matches!(self, Self::ContrabandLow | Self::ContrabandHigh)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == normalized)
            .ok_or_else(|| ConfigurationError::UnknownStrategy(s.to_string()))
    }
}

/// Appetite for smuggling in `[0, 10]`; higher is bolder.
#[must_use]
pub fn risk_score(
    personality: Personality,
    tier: Tier,
    stats: &OpponentStats,
    view: &[RoundRecord],
    rules: &RulesConfig,
) -> f64 {
    let mut score = trait_to_f64(personality.risk_tolerance) - trait_to_f64(personality.honesty_bias) / 2.0;
    if personality.greed > GREED_BONUS_THRESHOLD {
        score += GREED_BONUS;
    }
    if stats.catch_rate > rules.high_catch_rate {
        score -= HIGH_CATCH_PENALTY;
    } else if stats.catch_rate < rules.low_catch_rate {
        score += LOW_CATCH_BONUS;
    }
    if stats.inspection_rate > HIGH_INSPECTION_RATE {
        score -= INSPECTION_RATE_SHIFT;
    } else if stats.inspection_rate < LOW_INSPECTION_RATE {
        score += INSPECTION_RATE_SHIFT;
    }
    if tier == Tier::Hard && view.len() >= 3 {
        let recent = &view[view.len().saturating_sub(PATTERN_WINDOW)..];
        let passes = recent.iter().filter(|record| !record.bag_opened).count();
        if passes >= 4 {
            score += LENIENT_STREAK_BONUS;
        }
        let accepted = recent.iter().filter(|record| record.bribe_accepted).count();
        if accepted >= 2 {
            score += ACCEPTED_BRIBES_BONUS;
        }
        let danger = stats.inspection_rate * 0.6 + stats.catch_rate * 0.4;
        score -= danger * DANGER_WEIGHT;
    }
    score.clamp(0.0, RISK_SCORE_MAX)
}

/// Weights over [`StrategyKind::ALL`] for a risk score and tier.
#[must_use]
pub fn strategy_weights(risk_score: f64, tier: Tier) -> [f64; 5] {
    let table = match tier {
        Tier::Easy => &EASY_STRATEGY_WEIGHTS,
        Tier::Medium => &MEDIUM_STRATEGY_WEIGHTS,
        Tier::Hard => &HARD_STRATEGY_WEIGHTS,
    };
    let band = RISK_SCORE_CUTS
        .iter()
        .position(|cut| risk_score <= *cut)
        .unwrap_or(RISK_SCORE_CUTS.len());
    table[band]
}

/// Pick an archetype for a standard merchant.
///
/// Very honest merchants may refuse to lie before any weighting happens, and
/// honest-leaning ones may back out of a smuggling pick afterwards. HARD
/// merchants facing a sharp inspector sometimes play honest on purpose.
pub fn select_strategy<R: Rng + ?Sized>(
    personality: Personality,
    tier: Tier,
    stats: &OpponentStats,
    view: &[RoundRecord],
    rules: &RulesConfig,
    rng: &mut R,
) -> StrategyKind {
    let honesty = personality.honesty_bias;
    if honesty >= 8 && rng.r#gen::<f64>() < f64::from(honesty - 7) * 0.1 {
        return StrategyKind::Honest;
    }
    if tier == Tier::Hard
        && stats.catch_rate > REVERSE_PSYCHOLOGY_CATCH_RATE
        && rng.r#gen::<f64>() < REVERSE_PSYCHOLOGY_CHANCE
    {
        return StrategyKind::Honest;
    }
    let score = risk_score(personality, tier, stats, view, rules);
    let weights = strategy_weights(score, tier);
    let picked = WeightedIndex::new(weights)
        .map_or(StrategyKind::Honest, |dist| StrategyKind::ALL[dist.sample(rng)]);
    if picked.is_smuggling() && honesty >= 7 && rng.r#gen::<f64>() < f64::from(honesty - 6) * 0.05 {
        return StrategyKind::Honest;
    }
    picked
}

/// Broker policy over history correlated to the current inspector only.
///
/// The correlated catch rate picks the band: sharp inspectors get an honest or
/// legal-only bag, careless ones a full contraband load, the rest a light
/// smuggle. The inspector's profile only chooses within the band.
/// Missing history yields neutral priors, which land on the moderate band.
pub fn broker_strategy<R: Rng + ?Sized>(
    correlated: &[&RoundRecord],
    rules: &RulesConfig,
    rng: &mut R,
) -> (StrategyKind, InspectorProfile, OpponentStats) {
    let start = correlated.len().saturating_sub(PROFILE_LONG_WINDOW);
    let window = &correlated[start..];
    let stats = OpponentStats::from_records(window.iter().copied());
    let profile = InspectorProfile::detect(window);
    let coin = rng.r#gen::<bool>();
    let kind = if stats.catch_rate > rules.high_catch_rate {
        match profile {
            InspectorProfile::Strict | InspectorProfile::TriggerHappy => StrategyKind::Honest,
            _ if coin => StrategyKind::Honest,
            _ => StrategyKind::LegalLie,
        }
    } else if stats.catch_rate < rules.low_catch_rate {
        StrategyKind::ContrabandHigh
    } else {
        match profile {
            // Offers land reliably, so carry the heavier of the two loads.
            InspectorProfile::Corrupt => StrategyKind::ContrabandLow,
            _ if coin => StrategyKind::ContrabandLow,
            _ => StrategyKind::Mixed,
        }
    };
    log::debug!(
        "{LOG_BROKER_POLICY} profile={} samples={} catch_rate={:.2} -> {kind}",
        profile.key(),
        stats.samples,
        stats.catch_rate
    );
    (kind, profile, stats)
}

/// Everything a merchant settles on before meeting the inspector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantDecision {
    pub declaration: Declaration,
    /// Revealed only if the inspector threatens.
    pub bribe_plan: BribePlan,
    pub stats: OpponentStats,
    pub profile: Option<InspectorProfile>,
}

impl MerchantDecision {
    #[must_use]
    pub const fn strategy(&self) -> StrategyKind {
        self.declaration.strategy
    }
}

/// Choose, build and price one bag for `merchant` facing `inspector_id`.
///
/// # Errors
///
/// Propagates [`ConfigurationError`] from the declaration builder.
pub fn decide<R: Rng + ?Sized>(
    merchant: &Merchant,
    inspector_id: &str,
    history: &HistoryStore,
    catalog: &GoodsCatalog,
    rules: &RulesConfig,
    rng: &mut R,
) -> Result<MerchantDecision, ConfigurationError> {
    let tier = merchant.effective_tier();
    let personality = merchant.personality;
    let (kind, stats, profile) = if merchant.is_broker() {
        let correlated = history.for_inspector(inspector_id);
        let (kind, profile, stats) = broker_strategy(&correlated, rules, rng);
        (kind, stats, Some(profile))
    } else {
        let view = history.for_tier(tier, rules);
        let stats = OpponentStats::from_records(view);
        (select_strategy(personality, tier, &stats, view, rules, rng), stats, None)
    };

    let declaration = declaration::build(kind, catalog, rules, personality.risk_tolerance, rng)?;
    let declared_value = declaration.declared_value(catalog);
    let bribe_plan = if declaration.lie {
        if bribe::should_offer_bribe(declaration.lie_type, personality, &stats, tier, rng) {
            let ctx = BribeContext {
                declared_value,
                undeclared_value: declaration.undeclared_value(catalog),
                personality,
                stats: &stats,
                tier,
                lie_type: declaration.lie_type,
            };
            BribePlan::Priced(bribe::calculate(&ctx, rules, rng))
        } else {
            BribePlan::None
        }
    } else if profile == Some(InspectorProfile::TriggerHappy) {
        BribePlan::Bluff(bribe::legal_good_trick_bribe(declared_value, rng))
    } else if tier == Tier::Hard && rng.r#gen::<f64>() < rules.advanced_bluff_chance {
        BribePlan::Bluff(bribe::advanced_bluff_bribe(declared_value, rng))
    } else {
        BribePlan::None
    };

    log::debug!(
        "{LOG_STRATEGY_SELECTED} merchant={} tier={tier} strategy={kind} lie={:?} bribe={:?}",
        merchant.id,
        declaration.lie_type,
        bribe_plan
    );
    Ok(MerchantDecision {
        declaration,
        bribe_plan,
        stats,
        profile,
    })
}
