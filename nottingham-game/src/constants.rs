//! Centralized balance and tuning constants for the merchant decision core.
//!
//! These values define the default math for declarations, bribes, the bluff
//! contest and negotiation. The externally tunable subset (trait ranges, tier
//! windows, bribe band, penalty rate, round and bag limits) seeds the defaults
//! of [`crate::rules::RulesConfig`] and is read through it at runtime.

// Entity bounds ------------------------------------------------------------
pub const TRAIT_MIN: u8 = 0;
pub const TRAIT_MAX: u8 = 10;
/// Bluff skill ceiling for "expert" merchants.
pub const BLUFF_SKILL_EXPERT_MAX: u8 = 15;
pub const BAG_SIZE_MIN: usize = 1;
pub const BAG_SIZE_LIMIT: usize = 6;
/// Smallest bag limit that still fits every archetype's full size range.
pub const ARCHETYPE_BAG_SIZE_MAX: usize = 5;
pub const CONTRABAND_HIGH_MIN_ITEMS: usize = 3;
pub const CONTRABAND_HIGH_MAX_ITEMS: usize = 5;
pub const STARTING_MERCHANT_GOLD: u32 = 50;
pub const STARTING_INSPECTOR_REPUTATION: i32 = 5;
pub const INSPECTOR_STAT_MAX: u8 = 10;
pub const THREAT_LEVEL_MAX: u8 = 10;
pub const EXPERIENCE_PER_PERCEPTION: u32 = 3;

// History windows ----------------------------------------------------------
pub const EASY_HISTORY_WINDOW: usize = 2;
pub const MEDIUM_HISTORY_WINDOW: usize = 4;
pub const PATTERN_WINDOW: usize = 5;
pub const PROFILE_MIN_RECORDS: usize = 5;
pub const PROFILE_RECENT_WINDOW: usize = 10;
pub const PROFILE_LONG_WINDOW: usize = 20;
pub const PROFILE_MIN_BRIBES: usize = 3;
pub const CORRUPT_ACCEPTANCE_RATE: f64 = 0.8;
pub const GREEDY_ACCEPTANCE_RATE: f64 = 0.4;
pub const TRIGGER_HAPPY_BRIBED_OPEN_RATE: f64 = 0.8;
pub const TRIGGER_HAPPY_QUIET_OPEN_RATE: f64 = 0.3;
pub const STRICT_OPEN_RATE: f64 = 0.5;

// Neutral priors -----------------------------------------------------------
pub const PRIOR_INSPECTION_RATE: f64 = 0.5;
pub const PRIOR_CATCH_RATE: f64 = 0.5;
pub const PRIOR_BRIBE_ACCEPTANCE_RATE: f64 = 0.3;

// Risk scoring -------------------------------------------------------------
pub const RISK_SCORE_MAX: f64 = 10.0;
pub const GREED_BONUS_THRESHOLD: u8 = 7;
pub const GREED_BONUS: f64 = 1.5;
pub const HIGH_CATCH_RATE: f64 = 0.6;
pub const LOW_CATCH_RATE: f64 = 0.3;
pub const HIGH_CATCH_PENALTY: f64 = 2.0;
pub const LOW_CATCH_BONUS: f64 = 1.5;
pub const HIGH_INSPECTION_RATE: f64 = 0.6;
pub const LOW_INSPECTION_RATE: f64 = 0.3;
pub const INSPECTION_RATE_SHIFT: f64 = 2.5;
pub const LENIENT_STREAK_BONUS: f64 = 4.0;
pub const ACCEPTED_BRIBES_BONUS: f64 = 2.0;
pub const DANGER_WEIGHT: f64 = 4.0;
pub const REVERSE_PSYCHOLOGY_CATCH_RATE: f64 = 0.7;
pub const REVERSE_PSYCHOLOGY_CHANCE: f64 = 0.25;

// Strategy weights ---------------------------------------------------------
/// Upper bounds (inclusive) of the risk bands. Scores above the last cut use
/// the final row of each table.
pub const RISK_SCORE_CUTS: [f64; 5] = [0.0, 2.0, 4.0, 6.0, 8.0];
/// One row per risk band, columns follow `StrategyKind::ALL`.
pub const EASY_STRATEGY_WEIGHTS: [[f64; 5]; 6] = [
    [0.95, 0.04, 0.01, 0.0, 0.0],
    [0.75, 0.20, 0.04, 0.01, 0.0],
    [0.50, 0.35, 0.12, 0.03, 0.0],
    [0.35, 0.35, 0.20, 0.08, 0.02],
    [0.20, 0.30, 0.30, 0.15, 0.05],
    [0.05, 0.15, 0.25, 0.35, 0.20],
];
pub const MEDIUM_STRATEGY_WEIGHTS: [[f64; 5]; 6] = [
    [0.90, 0.08, 0.02, 0.0, 0.0],
    [0.65, 0.25, 0.08, 0.02, 0.0],
    [0.40, 0.30, 0.22, 0.06, 0.02],
    [0.25, 0.25, 0.30, 0.15, 0.05],
    [0.12, 0.18, 0.30, 0.28, 0.12],
    [0.05, 0.10, 0.25, 0.40, 0.20],
];
/// HARD merchants never get a zero-risk band; scores at or below 2 share a row.
pub const HARD_STRATEGY_WEIGHTS: [[f64; 5]; 6] = [
    [0.40, 0.30, 0.20, 0.08, 0.02],
    [0.40, 0.30, 0.20, 0.08, 0.02],
    [0.25, 0.25, 0.30, 0.15, 0.05],
    [0.15, 0.20, 0.30, 0.25, 0.10],
    [0.08, 0.15, 0.27, 0.35, 0.15],
    [0.05, 0.10, 0.25, 0.40, 0.20],
];

// Bribe pricing ------------------------------------------------------------
pub const BRIBE_ANCHOR_MIN: f64 = 0.7;
pub const BRIBE_ANCHOR_MAX: f64 = 1.1;
pub const BRIBE_CAP_RATE: f64 = 0.8;
pub const BRIBE_FLOOR_RATE: f64 = 0.2;
pub const GREED_DIVISOR: f64 = 30.0;
pub const RISK_DIVISOR: f64 = 40.0;
pub const AGGRESSIVE_INSPECTOR_RATE: f64 = 0.7;
pub const LENIENT_INSPECTOR_RATE: f64 = 0.3;
pub const AGGRESSIVE_BRIBE_MULTIPLIER: f64 = 1.3;
pub const LENIENT_BRIBE_MULTIPLIER: f64 = 0.7;
pub const BRIBE_VARIANCE_MIN: f64 = 0.85;
pub const BRIBE_VARIANCE_MAX: f64 = 1.15;
pub const LEGAL_LIE_GAP_MIN: f64 = 0.2;
pub const LEGAL_LIE_GAP_MAX: f64 = 0.3;
pub const LEGAL_LIE_DECLARED_SCALE: f64 = 150.0;
pub const LEGAL_LIE_GREED_DIVISOR: f64 = 25.0;
pub const LEGAL_LIE_MIN_BRIBE: u32 = 2;
pub const ADVANCED_BLUFF_CHANCE: f64 = 0.15;
pub const ADVANCED_BLUFF_RATE_MIN: f64 = 0.15;
pub const ADVANCED_BLUFF_RATE_MAX: f64 = 0.25;
pub const ADVANCED_BLUFF_MIN: u32 = 2;
pub const ADVANCED_BLUFF_MAX: u32 = 5;
pub const LEGAL_GOOD_TRICK_RATE_MIN: f64 = 0.20;
pub const LEGAL_GOOD_TRICK_RATE_MAX: f64 = 0.35;

// Bribe gating -------------------------------------------------------------
pub const EASY_CONTRABAND_BRIBE_CHANCE: f64 = 0.3;
pub const MEDIUM_CONTRABAND_BRIBE_CHANCE: f64 = 0.45;
pub const MEDIUM_LEGAL_LIE_BRIBE_CHANCE: f64 = 0.2;
pub const HARD_CONTRABAND_BRIBE_CHANCE: f64 = 0.7;
pub const HARD_LEGAL_LIE_BRIBE_CHANCE: f64 = 0.35;
pub const HARD_ACCEPTANCE_BONUS: f64 = 0.2;
pub const BRIBE_CHANCE_CEILING: f64 = 0.95;

// Inspection ---------------------------------------------------------------
pub const BLUFF_DIE_SIDES: u8 = 10;
pub const PENALTY_RATE: f64 = 0.5;
pub const REP_CAUGHT_LIE: i32 = 1;
pub const REP_HONEST_INSPECTED: i32 = -1;
pub const REP_BLUFF_MISSED: i32 = -1;
pub const REP_HONEST_PASSED: i32 = 1;
pub const REP_CONTRABAND_PASSED: i32 = -2;

// Negotiation --------------------------------------------------------------
pub const MAX_NEGOTIATION_ROUNDS: u8 = 3;
pub const NEGOTIATION_WILLINGNESS_THRESHOLD: i32 = 30;
pub const NEGOTIATION_THREAT_WEIGHT: i32 = 10;
pub const NEGOTIATION_RISK_WEIGHT: i32 = 5;
pub const NEGOTIATION_FATIGUE: i32 = 10;
pub const NEGOTIATION_VALUE_BONUS_MAX: i32 = 15;
pub const NEGOTIATION_JITTER: i32 = 10;
pub const COUNTER_SLACK_MAX: f64 = 0.5;
pub const COUNTER_STEP_MAX: f64 = 0.6;
pub const COUNTER_STEP_GREED: f64 = 0.03;
pub const THREAT_OFFER_BASE: f64 = 0.3;
pub const THREAT_OFFER_SCALE: f64 = 20.0;

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_STRATEGY_SELECTED: &str = "log.strategy.selected";
pub(crate) const LOG_BROKER_POLICY: &str = "log.strategy.broker";
pub(crate) const LOG_BRIBE_PRICED: &str = "log.bribe.priced";
pub(crate) const LOG_NEGOTIATION_STEP: &str = "log.negotiation.step";
pub(crate) const LOG_INSPECTION_VERDICT: &str = "log.inspection.verdict";
pub(crate) const LOG_ROUND_RECORDED: &str = "log.round.recorded";
