//! Bribe negotiation between a threatened merchant and the inspector.
//!
//! The machine alternates strictly: the merchant moves in `Threatened` and
//! `MerchantDeciding`, the inspector replies in `BribeOffered`. Every other
//! phase is terminal. Calls made out of turn fail with [`NegotiationError`]
//! and leave the state untouched.
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::bribe::{self, BribePlan};
use crate::constants::{
    COUNTER_SLACK_MAX, COUNTER_STEP_GREED, COUNTER_STEP_MAX, LOG_NEGOTIATION_STEP,
    NEGOTIATION_FATIGUE, NEGOTIATION_JITTER, NEGOTIATION_RISK_WEIGHT, NEGOTIATION_THREAT_WEIGHT,
    NEGOTIATION_VALUE_BONUS_MAX, NEGOTIATION_WILLINGNESS_THRESHOLD, TRAIT_MAX,
};
use crate::merchant::Personality;
use crate::numbers::{floor_f64_to_u32, trait_to_f64, u32_to_f64};
use crate::rules::RulesConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationPhase {
    Threatened,
    MerchantDeciding,
    BribeOffered,
    Accepted,
    /// The inspector turned the offer down and opens the bag.
    Rejected,
    /// The merchant walked away and accepts inspection.
    Refused,
}

impl NegotiationPhase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Refused)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectorReply {
    Accept,
    Reject,
    Counter(u32),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("{action} is not allowed while the negotiation is {phase:?}")]
    OutOfTurn {
        phase: NegotiationPhase,
        action: &'static str,
    },
    #[error("counter demand {demand} must exceed the standing offer {offer}")]
    CounterNotAbove { demand: u32, offer: u32 },
}

/// Fixed facts about the threatened bag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NegotiationTerms {
    pub threat_level: u8,
    pub undeclared_value: u32,
    pub personality: Personality,
    pub plan: BribePlan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Negotiation {
    terms: NegotiationTerms,
    phase: NegotiationPhase,
    round: u8,
    max_rounds: u8,
    cap_rate: f64,
    offers: SmallVec<[u32; 4]>,
    demands: SmallVec<[u32; 4]>,
    final_offer: bool,
    agreed: Option<u32>,
}

/// Terminal summary of a negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationOutcome {
    pub phase: NegotiationPhase,
    pub bribe_paid: u32,
    pub rounds: u8,
    pub offers: Vec<u32>,
    pub demands: Vec<u32>,
    /// Whether the bag is opened afterwards.
    pub inspects: bool,
}

impl Negotiation {
    #[must_use]
    pub fn open(terms: NegotiationTerms, rules: &RulesConfig) -> Self {
        Self {
            terms,
            phase: NegotiationPhase::Threatened,
            round: 1,
            max_rounds: rules.max_negotiation_rounds,
            cap_rate: rules.bribe_cap_rate,
            offers: SmallVec::new(),
            demands: SmallVec::new(),
            final_offer: false,
            agreed: None,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> NegotiationPhase {
        self.phase
    }

    #[must_use]
    pub const fn round(&self) -> u8 {
        self.round
    }

    #[must_use]
    pub fn standing_offer(&self) -> Option<u32> {
        self.offers.last().copied()
    }

    #[must_use]
    pub fn offers(&self) -> &[u32] {
        &self.offers
    }

    #[must_use]
    pub fn demands(&self) -> &[u32] {
        &self.demands
    }

    /// True once the merchant has restated an offer as final.
    #[must_use]
    pub const fn is_final_offer(&self) -> bool {
        self.final_offer
    }

    #[must_use]
    pub const fn terms(&self) -> &NegotiationTerms {
        &self.terms
    }

    /// Let the merchant move: open with an offer, or answer the last counter.
    ///
    /// # Errors
    ///
    /// [`NegotiationError::OutOfTurn`] unless the phase is `Threatened` or
    /// `MerchantDeciding`.
    pub fn merchant_turn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<NegotiationPhase, NegotiationError> {
        let next = match self.phase {
            NegotiationPhase::Threatened => self.opening_move(rng),
            NegotiationPhase::MerchantDeciding => self.counter_move(rng),
            phase => {
                return Err(NegotiationError::OutOfTurn {
                    phase,
                    action: "merchant turn",
                });
            }
        };
        self.transition(next);
        Ok(next)
    }

    fn opening_move<R: Rng + ?Sized>(&mut self, rng: &mut R) -> NegotiationPhase {
        let terms = self.terms;
        let offer = match terms.plan {
            BribePlan::Bluff(amount) => amount,
            _ if terms.undeclared_value == 0 => 0,
            _ if !should_negotiate(
                terms.threat_level,
                terms.undeclared_value,
                self.round,
                terms.personality.risk_tolerance,
                rng,
            ) =>
            {
                0
            }
            BribePlan::Priced(amount) if amount > 0 => amount,
            _ => bribe::threat_offer(
                terms.undeclared_value,
                terms.threat_level,
                terms.personality.greed,
                self.cap_rate,
            ),
        };
        if offer == 0 {
            return NegotiationPhase::Refused;
        }
        self.offers.push(offer);
        NegotiationPhase::BribeOffered
    }

    fn counter_move<R: Rng + ?Sized>(&mut self, rng: &mut R) -> NegotiationPhase {
        let terms = self.terms;
        if terms.plan.is_bluff() {
            return NegotiationPhase::Refused;
        }
        let (Some(&demand), Some(&original), Some(&last)) =
            (self.demands.last(), self.offers.first(), self.offers.last())
        else {
            return NegotiationPhase::Refused;
        };
        if !should_negotiate(
            terms.threat_level,
            terms.undeclared_value,
            self.round,
            terms.personality.risk_tolerance,
            rng,
        ) {
            return NegotiationPhase::Refused;
        }
        if should_accept_counter(
            demand,
            original,
            terms.undeclared_value,
            terms.personality.greed,
            self.cap_rate,
        ) {
            self.agreed = Some(demand);
            return NegotiationPhase::Accepted;
        }
        match next_offer(last, demand, terms.personality.greed) {
            Some(offer) if u32_to_f64(offer) <= u32_to_f64(terms.undeclared_value) * self.cap_rate => {
                self.offers.push(offer);
                NegotiationPhase::BribeOffered
            }
            _ => NegotiationPhase::Refused,
        }
    }

    /// Apply the inspector's answer to the standing offer.
    ///
    /// # Errors
    ///
    /// [`NegotiationError::OutOfTurn`] unless an offer is standing;
    /// [`NegotiationError::CounterNotAbove`] for a counter not above it.
    pub fn inspector_reply(&mut self, reply: InspectorReply) -> Result<NegotiationPhase, NegotiationError> {
        let (NegotiationPhase::BribeOffered, Some(offer)) = (self.phase, self.standing_offer()) else {
            return Err(NegotiationError::OutOfTurn {
                phase: self.phase,
                action: "inspector reply",
            });
        };
        let next = match reply {
            InspectorReply::Accept => {
                self.agreed = Some(offer);
                NegotiationPhase::Accepted
            }
            InspectorReply::Reject => NegotiationPhase::Rejected,
            InspectorReply::Counter(demand) if demand <= offer => {
                return Err(NegotiationError::CounterNotAbove { demand, offer });
            }
            InspectorReply::Counter(_) if self.final_offer => NegotiationPhase::Rejected,
            InspectorReply::Counter(demand) => {
                self.demands.push(demand);
                if self.round >= self.max_rounds {
                    // Out of rounds: the last offer stands as final.
                    self.final_offer = true;
                    NegotiationPhase::BribeOffered
                } else {
                    self.round += 1;
                    NegotiationPhase::MerchantDeciding
                }
            }
        };
        self.transition(next);
        Ok(next)
    }

    fn transition(&mut self, next: NegotiationPhase) {
        log::debug!(
            "{LOG_NEGOTIATION_STEP} round={} {:?} -> {next:?} offers={:?} demands={:?}",
            self.round,
            self.phase,
            self.offers,
            self.demands
        );
        self.phase = next;
    }

    /// Summary once the machine is terminal; `None` while still running.
    #[must_use]
    pub fn outcome(&self) -> Option<NegotiationOutcome> {
        if !self.phase.is_terminal() {
            return None;
        }
        Some(NegotiationOutcome {
            phase: self.phase,
            bribe_paid: self.agreed.unwrap_or(0),
            rounds: if self.offers.is_empty() { 0 } else { self.round },
            offers: self.offers.to_vec(),
            demands: self.demands.to_vec(),
            inspects: self.phase != NegotiationPhase::Accepted,
        })
    }
}

/// Merchant's appetite for (continuing) a negotiation.
///
/// willingness = 10·threat − 5·risk − 10·(round − 1) + min(undeclared / 2, 15) + U{−10..10};
/// the merchant negotiates when it exceeds 30.
pub fn should_negotiate<R: Rng + ?Sized>(
    threat_level: u8,
    undeclared_value: u32,
    round: u8,
    risk_tolerance: u8,
    rng: &mut R,
) -> bool {
    let value_bonus = i32::try_from(undeclared_value / 2)
        .unwrap_or(NEGOTIATION_VALUE_BONUS_MAX)
        .min(NEGOTIATION_VALUE_BONUS_MAX);
    let willingness = NEGOTIATION_THREAT_WEIGHT * i32::from(threat_level)
        - NEGOTIATION_RISK_WEIGHT * i32::from(risk_tolerance)
        - NEGOTIATION_FATIGUE * (i32::from(round) - 1)
        + value_bonus
        + rng.gen_range(-NEGOTIATION_JITTER..=NEGOTIATION_JITTER);
    willingness > NEGOTIATION_WILLINGNESS_THRESHOLD
}

/// Accept a demand close enough to the opening offer that still leaves a profit.
#[must_use]
pub fn should_accept_counter(
    demand: u32,
    original_offer: u32,
    undeclared_value: u32,
    greed: u8,
    cap_rate: f64,
) -> bool {
    let slack = COUNTER_SLACK_MAX * (1.0 - trait_to_f64(greed) / trait_to_f64(TRAIT_MAX));
    let demand = u32_to_f64(demand);
    demand <= u32_to_f64(original_offer) * (1.0 + slack) && demand <= u32_to_f64(undeclared_value) * cap_rate
}

/// An offer strictly between `last` and `demand`, moving 30–60% of the gap
/// depending on greed. `None` when no integer fits between them.
#[must_use]
pub fn next_offer(last: u32, demand: u32, greed: u8) -> Option<u32> {
    let gap = demand.checked_sub(last)?;
    if gap < 2 {
        return None;
    }
    let step = COUNTER_STEP_MAX - COUNTER_STEP_GREED * (trait_to_f64(TRAIT_MAX) - trait_to_f64(greed));
    let increment = floor_f64_to_u32(u32_to_f64(gap) * step).max(1);
    Some((last + increment).min(demand - 1))
}
