//! Bribe pricing and the decision of whether to offer one at all.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    ADVANCED_BLUFF_MAX, ADVANCED_BLUFF_MIN, ADVANCED_BLUFF_RATE_MAX, ADVANCED_BLUFF_RATE_MIN,
    AGGRESSIVE_BRIBE_MULTIPLIER, AGGRESSIVE_INSPECTOR_RATE, BRIBE_CHANCE_CEILING,
    BRIBE_FLOOR_RATE, BRIBE_VARIANCE_MAX, BRIBE_VARIANCE_MIN, EASY_CONTRABAND_BRIBE_CHANCE,
    GREED_DIVISOR, HARD_ACCEPTANCE_BONUS, HARD_CONTRABAND_BRIBE_CHANCE,
    HARD_LEGAL_LIE_BRIBE_CHANCE, LEGAL_GOOD_TRICK_RATE_MAX, LEGAL_GOOD_TRICK_RATE_MIN,
    LEGAL_LIE_DECLARED_SCALE, LEGAL_LIE_GAP_MAX, LEGAL_LIE_GAP_MIN, LEGAL_LIE_GREED_DIVISOR,
    LEGAL_LIE_MIN_BRIBE, LENIENT_BRIBE_MULTIPLIER, LENIENT_INSPECTOR_RATE, LOG_BRIBE_PRICED,
    MEDIUM_CONTRABAND_BRIBE_CHANCE, MEDIUM_LEGAL_LIE_BRIBE_CHANCE, RISK_DIVISOR,
    THREAT_OFFER_BASE, THREAT_OFFER_SCALE,
};
use crate::declaration::LieType;
use crate::history::OpponentStats;
use crate::merchant::{Personality, Tier};
use crate::numbers::{floor_f64_to_u32, trait_to_f64, u32_to_f64};
use crate::rules::RulesConfig;

/// How the merchant intends to open negotiations if threatened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum BribePlan {
    #[default]
    None,
    /// Priced against the undeclared value; never above the cap.
    Priced(u32),
    /// Goodwill offer on a truthful bag; any counter is refused.
    Bluff(u32),
}

impl BribePlan {
    #[must_use]
    pub const fn amount(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Priced(amount) | Self::Bluff(amount) => amount,
        }
    }

    #[must_use]
    pub const fn is_bluff(self) -> bool {
        matches!(self, Self::Bluff(_))
    }
}

/// Inputs to bribe pricing for a single bag.
#[derive(Debug, Clone, Copy)]
pub struct BribeContext<'a> {
    pub declared_value: u32,
    pub undeclared_value: u32,
    pub personality: Personality,
    pub stats: &'a OpponentStats,
    pub tier: Tier,
    pub lie_type: LieType,
}

/// Price a bribe for the undeclared part of a bag.
///
/// The result is always within `[0, floor(cap_rate × undeclared)]`; it is
/// zero only when the cap itself floors to zero.
pub fn calculate<R: Rng + ?Sized>(ctx: &BribeContext<'_>, rules: &RulesConfig, rng: &mut R) -> u32 {
    if ctx.undeclared_value == 0 {
        return 0;
    }
    let declared = u32_to_f64(ctx.declared_value);
    let undeclared = u32_to_f64(ctx.undeclared_value);
    let cap = undeclared * rules.bribe_cap_rate;

    let base = if ctx.lie_type == LieType::Legal {
        legal_lie_bribe(ctx.declared_value, ctx.undeclared_value, ctx.personality.greed, rng)
    } else {
        let anchor = declared * rng.gen_range(rules.bribe_anchor_min..=rules.bribe_anchor_max);
        let greed_factor = 1.0 - trait_to_f64(ctx.personality.greed) / GREED_DIVISOR;
        let risk_factor = 1.0 - trait_to_f64(ctx.personality.risk_tolerance) / RISK_DIVISOR;
        anchor.min(cap) * greed_factor * risk_factor
    };

    let pressure = if ctx.stats.inspection_rate > AGGRESSIVE_INSPECTOR_RATE {
        AGGRESSIVE_BRIBE_MULTIPLIER
    } else if ctx.stats.inspection_rate < LENIENT_INSPECTOR_RATE {
        LENIENT_BRIBE_MULTIPLIER
    } else {
        1.0
    };
    let variance = rng.gen_range(BRIBE_VARIANCE_MIN..=BRIBE_VARIANCE_MAX);
    let amount = clamp_to_band(base * pressure * variance, ctx.undeclared_value, cap);
    log::debug!(
        "{LOG_BRIBE_PRICED} tier={} lie={:?} declared={} undeclared={} amount={amount}",
        ctx.tier,
        ctx.lie_type,
        ctx.declared_value,
        ctx.undeclared_value
    );
    amount
}

/// Clamp into `[max(1, floor(20% undeclared)), floor(cap)]`, or 0 when the cap floors to 0.
fn clamp_to_band(raw: f64, undeclared_value: u32, cap: f64) -> u32 {
    let ceiling = floor_f64_to_u32(cap);
    if ceiling == 0 {
        return 0;
    }
    let floor = floor_f64_to_u32(u32_to_f64(undeclared_value) * BRIBE_FLOOR_RATE).max(1);
    floor_f64_to_u32(raw).clamp(floor.min(ceiling), ceiling)
}

/// Smaller anchor for pure legal lies: a share of the value gap, scaled by
/// the size of the claim and damped by greed. Never below two gold before
/// the cap is applied.
pub fn legal_lie_bribe<R: Rng + ?Sized>(
    declared_value: u32,
    actual_value: u32,
    greed: u8,
    rng: &mut R,
) -> f64 {
    let gap = u32_to_f64(actual_value.abs_diff(declared_value));
    let share = gap * rng.gen_range(LEGAL_LIE_GAP_MIN..=LEGAL_LIE_GAP_MAX);
    let scaling = 1.0 + u32_to_f64(declared_value) / LEGAL_LIE_DECLARED_SCALE;
    let greed_factor = 1.0 - trait_to_f64(greed) / LEGAL_LIE_GREED_DIVISOR;
    (share * scaling * greed_factor).max(u32_to_f64(LEGAL_LIE_MIN_BRIBE))
}

/// Goodwill bribe offered on a truthful HARD bag.
pub fn advanced_bluff_bribe<R: Rng + ?Sized>(declared_value: u32, rng: &mut R) -> u32 {
    let rate = rng.gen_range(ADVANCED_BLUFF_RATE_MIN..=ADVANCED_BLUFF_RATE_MAX);
    floor_f64_to_u32(u32_to_f64(declared_value) * rate).clamp(ADVANCED_BLUFF_MIN, ADVANCED_BLUFF_MAX)
}

/// Broker variant of the advanced bluff used against strict inspectors.
pub fn legal_good_trick_bribe<R: Rng + ?Sized>(declared_value: u32, rng: &mut R) -> u32 {
    let rate = rng.gen_range(LEGAL_GOOD_TRICK_RATE_MIN..=LEGAL_GOOD_TRICK_RATE_MAX);
    floor_f64_to_u32(u32_to_f64(declared_value) * rate).clamp(ADVANCED_BLUFF_MIN, ADVANCED_BLUFF_MAX)
}

/// Opening offer when threatened without a precomputed bribe: a share of the
/// undeclared value that grows with the inspector's threat, within the same band
/// as [`calculate`].
#[must_use]
pub fn threat_offer(undeclared_value: u32, threat_level: u8, greed: u8, cap_rate: f64) -> u32 {
    let undeclared = u32_to_f64(undeclared_value);
    let share = THREAT_OFFER_BASE + trait_to_f64(threat_level) / THREAT_OFFER_SCALE;
    let greed_factor = 1.0 - trait_to_f64(greed) / GREED_DIVISOR;
    clamp_to_band(undeclared * share * greed_factor, undeclared_value, undeclared * cap_rate)
}

/// Whether a lying merchant offers a bribe at all.
///
/// Honest bags never go through here; their goodwill offers are the advanced
/// bluff. The chance rises with the inspection rate and falls with honesty.
pub fn should_offer_bribe<R: Rng + ?Sized>(
    lie_type: LieType,
    personality: Personality,
    stats: &OpponentStats,
    tier: Tier,
    rng: &mut R,
) -> bool {
    let base = match (tier, lie_type) {
        (_, LieType::None) => return false,
        (Tier::Easy, LieType::Legal) => return false,
        (Tier::Easy, _) => EASY_CONTRABAND_BRIBE_CHANCE,
        (Tier::Medium, LieType::Legal) => MEDIUM_LEGAL_LIE_BRIBE_CHANCE,
        (Tier::Medium, _) => MEDIUM_CONTRABAND_BRIBE_CHANCE,
        (Tier::Hard, LieType::Legal) => HARD_LEGAL_LIE_BRIBE_CHANCE,
        (Tier::Hard, _) => {
            if stats.bribe_acceptance_rate > 0.5 {
                HARD_CONTRABAND_BRIBE_CHANCE + HARD_ACCEPTANCE_BONUS
            } else {
                HARD_CONTRABAND_BRIBE_CHANCE
            }
        }
    };
    let pressure = 0.5 + stats.inspection_rate;
    let honesty_factor = 1.25 - trait_to_f64(personality.honesty_bias) / 20.0;
    let chance = (base * pressure * honesty_factor).clamp(0.0, BRIBE_CHANCE_CEILING);
    rng.r#gen::<f64>() < chance
}
