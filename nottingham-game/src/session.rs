//! One game: owns the history, rules, catalog and random streams, and plays
//! complete rounds against an inspector policy.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::goods::{Bag, GoodId, GoodsCatalog};
use crate::history::{HistoryStore, InspectorAction, RoundRecord};
use crate::inspection::{self, InspectionContext, InspectionOutcome};
use crate::inspector::Inspector;
use crate::merchant::{Merchant, SmugglingSummary, Tier};
use crate::negotiation::{
    InspectorReply, Negotiation, NegotiationError, NegotiationOutcome, NegotiationPhase,
    NegotiationTerms,
};
use crate::rng::RngBundle;
use crate::rules::{ConfigurationError, RulesConfig};
use crate::strategy::{self, MerchantDecision, StrategyKind};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoundError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
}

/// What the inspector is allowed to see before acting: the claim, never the bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BagView<'a> {
    pub round: u32,
    pub merchant_id: &'a str,
    pub merchant_name: &'a str,
    pub tier: Tier,
    pub declared_id: &'a GoodId,
    pub declared_count: u8,
    pub declared_value: u32,
    pub summary: &'a SmugglingSummary,
}

/// Decision-making seam for whoever plays the inspector.
pub trait InspectorPolicy {
    fn name(&self) -> &str;

    fn choose_action(&mut self, view: &BagView<'_>, inspector: &Inspector) -> InspectorAction;

    /// Answer the standing offer. Only called while an offer is on the table.
    fn respond(&mut self, view: &BagView<'_>, negotiation: &Negotiation) -> InspectorReply;

    /// Called with every finished round, after it is recorded.
    fn observe(&mut self, _record: &RoundRecord) {}
}

/// Everything that happened in one round, beyond the stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    pub record: RoundRecord,
    pub strategy: StrategyKind,
    pub negotiation: Option<NegotiationOutcome>,
    pub inspection: Option<InspectionOutcome>,
    pub passed: Bag,
    pub confiscated: Bag,
    pub bribe_paid: u32,
}

#[derive(Debug, Clone)]
pub struct Session {
    seed: u64,
    catalog: GoodsCatalog,
    rules: RulesConfig,
    history: HistoryStore,
    rng: RngBundle,
    next_round: u32,
}

impl Session {
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError`] found in `rules`.
    pub fn new(seed: u64, catalog: GoodsCatalog, rules: RulesConfig) -> Result<Self, ConfigurationError> {
        rules.validate()?;
        Ok(Self {
            seed,
            catalog,
            rules,
            history: HistoryStore::new(),
            rng: RngBundle::from_user_seed(seed),
            next_round: 1,
        })
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn catalog(&self) -> &GoodsCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    #[must_use]
    pub const fn history(&self) -> &HistoryStore {
        &self.history
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    #[must_use]
    pub const fn rounds_played(&self) -> u32 {
        self.next_round - 1
    }

    /// Start a new game with the same seed: history cleared, streams rewound.
    pub fn reset(&mut self) {
        self.history.reset();
        self.rng = RngBundle::from_user_seed(self.seed);
        self.next_round = 1;
    }

    /// Let `merchant` decide against this inspector's record.
    ///
    /// # Errors
    ///
    /// Propagates merchant validation and declaration building failures.
    pub fn decide(&self, merchant: &Merchant, inspector: &Inspector) -> Result<MerchantDecision, ConfigurationError> {
        merchant.validate(&self.rules)?;
        strategy::decide(
            merchant,
            &inspector.id,
            &self.history,
            &self.catalog,
            &self.rules,
            &mut *self.rng.decision(),
        )
    }

    /// Decide and resolve one full round.
    ///
    /// # Errors
    ///
    /// [`RoundError::Configuration`] for invalid merchants,
    /// [`RoundError::Negotiation`] when the policy answers out of protocol.
    pub fn play_round(
        &mut self,
        merchant: &mut Merchant,
        inspector: &mut Inspector,
        policy: &mut dyn InspectorPolicy,
    ) -> Result<RoundReport, RoundError> {
        let decision = self.decide(merchant, inspector)?;
        self.resolve_round(merchant, inspector, decision, policy)
    }

    /// Resolve an already made decision: the inspector acts, any negotiation
    /// runs, the bag is settled and the round is appended to history.
    ///
    /// The merchant, the inspector and the history are left untouched when an
    /// error is returned.
    ///
    /// # Errors
    ///
    /// See [`Session::play_round`].
    pub fn resolve_round(
        &mut self,
        merchant: &mut Merchant,
        inspector: &mut Inspector,
        decision: MerchantDecision,
        policy: &mut dyn InspectorPolicy,
    ) -> Result<RoundReport, RoundError> {
        decision.declaration.validate(&self.catalog, &self.rules)?;
        let round = self.next_round;
        let declaration = &decision.declaration;
        let declared_value = declaration.declared_value(&self.catalog);
        let summary = merchant.summary;
        let view = BagView {
            round,
            merchant_id: &merchant.id,
            merchant_name: &merchant.name,
            tier: merchant.tier,
            declared_id: &declaration.declared_id,
            declared_count: declaration.declared_count,
            declared_value,
            summary: &summary,
        };
        let action = policy.choose_action(&view, inspector);

        let negotiation = if action == InspectorAction::Threaten {
            let terms = NegotiationTerms {
                threat_level: inspector.threat_level(),
                undeclared_value: declaration.undeclared_value(&self.catalog),
                personality: merchant.personality,
                plan: decision.bribe_plan,
            };
            Some(self.negotiate(terms, &view, policy)?)
        } else {
            None
        };

        let opens_bag = match (&negotiation, action) {
            (Some(outcome), _) => outcome.inspects,
            (None, InspectorAction::Inspect) => true,
            (None, _) => false,
        };
        let bribe_agreed = negotiation.as_ref().map_or(0, |outcome| outcome.bribe_paid);
        let bribe_paid = merchant.pay(bribe_agreed);
        inspector.receive(bribe_paid);

        let (inspection, passed, confiscated, reputation_delta, experience) = if opens_bag {
            let ctx = InspectionContext {
                declaration,
                catalog: &self.catalog,
                perception: inspector.perception,
                bluff_skill: merchant.bluff_skill,
                merchant_gold: merchant.gold,
                penalty_rate: self.rules.penalty_rate,
            };
            let outcome = inspection::resolve_inspection(&ctx, &mut *self.rng.inspection());
            let passed = outcome.passed.clone();
            let confiscated = outcome.confiscated.clone();
            let (reputation, experience) = (outcome.reputation_delta, outcome.experience_gained);
            (Some(outcome), passed, confiscated, reputation, experience)
        } else {
            let outcome = inspection::settle_pass(declaration, &self.catalog);
            (None, outcome.passed, Bag::new(), outcome.reputation_delta, outcome.experience_gained)
        };

        let penalty_paid = inspection
            .as_ref()
            .map_or(0, |outcome| merchant.pay(outcome.penalty_paid));
        inspector.receive(penalty_paid);
        inspector.adjust_reputation(reputation_delta);
        inspector.gain_experience(experience);
        merchant.summary.absorb(&passed, &self.catalog);

        let transferred = i64::from(bribe_paid) + i64::from(penalty_paid);
        let record = RoundRecord {
            round,
            merchant_id: merchant.id.clone(),
            inspector_id: inspector.id.clone(),
            declaration: decision.declaration.clone(),
            action,
            bag_opened: inspection.is_some(),
            bribe_offered: negotiation
                .as_ref()
                .and_then(|outcome| outcome.offers.last().copied())
                .unwrap_or(0),
            bribe_accepted: negotiation
                .as_ref()
                .is_some_and(|outcome| outcome.phase == NegotiationPhase::Accepted),
            lie_caught: inspection.as_ref().is_some_and(InspectionOutcome::lie_caught),
            penalty_paid,
            merchant_gold_delta: -transferred,
            inspector_gold_delta: transferred,
            reputation_delta,
            negotiation_rounds: negotiation.as_ref().map_or(0, |outcome| outcome.rounds),
        };
        self.history.record(record.clone());
        self.next_round += 1;
        policy.observe(&record);

        log::info!(
            "round {round}: {} {} vs {} ({}) -> {action} opened={} paid={transferred}",
            record.merchant_id,
            decision.strategy(),
            record.inspector_id,
            policy.name(),
            record.bag_opened
        );
        Ok(RoundReport {
            record,
            strategy: decision.strategy(),
            negotiation,
            inspection,
            passed,
            confiscated,
            bribe_paid,
        })
    }

    fn negotiate(
        &self,
        terms: NegotiationTerms,
        view: &BagView<'_>,
        policy: &mut dyn InspectorPolicy,
    ) -> Result<NegotiationOutcome, NegotiationError> {
        let mut negotiation = Negotiation::open(terms, &self.rules);
        loop {
            if let Some(outcome) = negotiation.outcome() {
                return Ok(outcome);
            }
            match negotiation.phase() {
                NegotiationPhase::BribeOffered => {
                    let reply = policy.respond(view, &negotiation);
                    negotiation.inspector_reply(reply)?;
                }
                _ => {
                    negotiation.merchant_turn(&mut *self.rng.negotiation())?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bribe::BribePlan;
    use crate::declaration::Declaration;
    use crate::history::OpponentStats;
    use crate::merchant::Personality;

    /// Plays a fixed action and a fixed list of replies, then rejects.
    struct Scripted {
        action: InspectorAction,
        replies: Vec<InspectorReply>,
    }

    impl InspectorPolicy for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn choose_action(&mut self, _view: &BagView<'_>, _inspector: &Inspector) -> InspectorAction {
            self.action
        }

        fn respond(&mut self, _view: &BagView<'_>, _negotiation: &Negotiation) -> InspectorReply {
            if self.replies.is_empty() {
                InspectorReply::Reject
            } else {
                self.replies.remove(0)
            }
        }
    }

    fn scripted(action: InspectorAction, replies: &[InspectorReply]) -> Scripted {
        Scripted {
            action,
            replies: replies.to_vec(),
        }
    }

    fn session() -> Session {
        Session::new(11, GoodsCatalog::standard().unwrap(), RulesConfig::default()).unwrap()
    }

    fn merchant() -> Merchant {
        Merchant::new("ada", "Ada", Personality::new(5, 5, 5), 5, Tier::Medium, &RulesConfig::default()).unwrap()
    }

    fn decision(strategy: StrategyKind, declared: &str, count: u8, actual: &[&str], plan: BribePlan) -> MerchantDecision {
        let declaration = Declaration::from_parts(
            strategy,
            GoodId::new(declared),
            count,
            actual.iter().map(|id| GoodId::new(id)).collect(),
            &GoodsCatalog::standard().unwrap(),
            &RulesConfig::default(),
        )
        .unwrap();
        MerchantDecision {
            declaration,
            bribe_plan: plan,
            stats: OpponentStats::neutral(),
            profile: None,
        }
    }

    #[test]
    fn honest_pass_rewards_reputation() {
        let mut session = session();
        let mut merchant = merchant();
        let mut inspector = Inspector::new("nott", 5, 5).unwrap();
        let report = session
            .resolve_round(
                &mut merchant,
                &mut inspector,
                decision(StrategyKind::Honest, "apple", 2, &["apple", "apple"], BribePlan::None),
                &mut scripted(InspectorAction::Pass, &[]),
            )
            .unwrap();
        assert_eq!(report.passed.len(), 2);
        assert_eq!(inspector.reputation, 6);
        assert_eq!(merchant.gold, 50);
        assert_eq!(merchant.summary.legal_sold, 2);
        assert_eq!(session.history().len(), 1);
        assert_eq!(report.record.round, 1);
    }

    #[test]
    fn accepted_bribe_moves_gold_and_skips_inspection() {
        let mut session = session();
        let mut merchant = merchant();
        let mut inspector = Inspector::new("nott", 5, 10).unwrap();
        let report = session
            .resolve_round(
                &mut merchant,
                &mut inspector,
                decision(
                    StrategyKind::ContrabandHigh,
                    "apple",
                    3,
                    &["crossbow", "mead", "silk"],
                    BribePlan::Priced(12),
                ),
                &mut scripted(InspectorAction::Threaten, &[InspectorReply::Accept]),
            )
            .unwrap();
        assert_eq!(report.bribe_paid, 12);
        assert!(report.inspection.is_none());
        assert!(report.record.bribe_accepted);
        assert_eq!(report.record.bribe_offered, 12);
        assert_eq!(report.record.merchant_gold_delta, -12);
        assert_eq!(merchant.gold, 38);
        assert_eq!(inspector.gold, 12);
        assert_eq!(inspector.reputation, 3);
        assert_eq!(merchant.summary.contraband_passed, 3);
    }

    #[test]
    fn rejected_offer_opens_the_bag() {
        let mut session = session();
        let mut merchant = merchant();
        let mut inspector = Inspector::new("nott", 5, 10).unwrap();
        let report = session
            .resolve_round(
                &mut merchant,
                &mut inspector,
                decision(
                    StrategyKind::ContrabandHigh,
                    "apple",
                    3,
                    &["crossbow", "mead", "silk"],
                    BribePlan::Priced(10),
                ),
                &mut scripted(InspectorAction::Threaten, &[InspectorReply::Reject]),
            )
            .unwrap();
        assert!(report.record.bag_opened);
        assert!(!report.record.bribe_accepted);
        assert_eq!(report.bribe_paid, 0);
        let inspection = report.inspection.unwrap();
        assert_eq!(report.record.lie_caught, inspection.lie_caught());
        assert_eq!(merchant.gold, 50 - report.record.penalty_paid);
    }

    #[test]
    fn protocol_errors_leave_the_session_untouched() {
        let mut session = session();
        let mut merchant = merchant();
        let mut inspector = Inspector::new("nott", 5, 10).unwrap();
        let err = session
            .resolve_round(
                &mut merchant,
                &mut inspector,
                decision(
                    StrategyKind::ContrabandHigh,
                    "apple",
                    3,
                    &["crossbow", "mead", "silk"],
                    BribePlan::Priced(10),
                ),
                &mut scripted(InspectorAction::Threaten, &[InspectorReply::Counter(5)]),
            )
            .unwrap_err();
        assert_eq!(
            err,
            RoundError::Negotiation(NegotiationError::CounterNotAbove { demand: 5, offer: 10 })
        );
        assert!(session.history().is_empty());
        assert_eq!(merchant.gold, 50);
        assert_eq!(inspector.reputation, 5);
    }

    #[test]
    fn play_round_appends_and_reset_rewinds() {
        let mut session = session();
        let mut merchant = merchant();
        let mut inspector = Inspector::new("nott", 5, 5).unwrap();
        let mut policy = scripted(InspectorAction::Inspect, &[]);
        let first = session.play_round(&mut merchant, &mut inspector, &mut policy).unwrap();
        session.play_round(&mut merchant, &mut inspector, &mut policy).unwrap();
        assert_eq!(session.rounds_played(), 2);
        assert!(first.record.bag_opened);

        session.reset();
        assert!(session.history().is_empty());
        let mut fresh_merchant = self::merchant();
        let mut fresh_inspector = Inspector::new("nott", 5, 5).unwrap();
        let replay = session
            .play_round(&mut fresh_merchant, &mut fresh_inspector, &mut policy)
            .unwrap();
        assert_eq!(replay.record, first.record);
    }

    #[test]
    fn invalid_merchant_is_rejected_before_deciding() {
        let session = session();
        let mut merchant = merchant();
        merchant.personality.greed = 11;
        let inspector = Inspector::new("nott", 5, 5).unwrap();
        assert!(matches!(
            session.decide(&merchant, &inspector),
            Err(ConfigurationError::TraitOutOfRange { .. })
        ));
    }
}
