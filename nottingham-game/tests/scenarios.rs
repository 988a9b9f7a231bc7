use nottingham_game::history::OpponentStats;
use nottingham_game::{
    BluffRolls, BribePlan, Declaration, GoodId, GoodsCatalog, HistoryStore, InspectionContext,
    Inspector, InspectorAction, InspectorPolicy, InspectorReply, Merchant, MerchantDecision,
    Negotiation, Personality, RulesConfig, Session, StrategyKind, Tier, Verdict, decide,
    resolve_inspection, settle_contest,
};
use nottingham_game::session::BagView;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn declaration(kind: StrategyKind, declared: &str, count: u8, actual: &[&str]) -> Declaration {
    Declaration::from_parts(
        kind,
        GoodId::new(declared),
        count,
        actual.iter().map(|id| GoodId::new(id)).collect(),
        &GoodsCatalog::standard().unwrap(),
        &RulesConfig::default(),
    )
    .unwrap()
}

fn context<'a>(
    declaration: &'a Declaration,
    catalog: &'a GoodsCatalog,
    perception: u8,
    bluff_skill: u8,
    merchant_gold: u32,
) -> InspectionContext<'a> {
    InspectionContext {
        declaration,
        catalog,
        perception,
        bluff_skill,
        merchant_gold,
        penalty_rate: RulesConfig::default().penalty_rate,
    }
}

struct AlwaysInspect;

impl InspectorPolicy for AlwaysInspect {
    fn name(&self) -> &str {
        "always-inspect"
    }

    fn choose_action(&mut self, _view: &BagView<'_>, _inspector: &Inspector) -> InspectorAction {
        InspectorAction::Inspect
    }

    fn respond(&mut self, _view: &BagView<'_>, _negotiation: &Negotiation) -> InspectorReply {
        InspectorReply::Reject
    }
}

#[test]
fn honest_apples_pass_untouched() {
    let catalog = GoodsCatalog::standard().unwrap();
    let decl = declaration(StrategyKind::Honest, "apple", 4, &["apple"; 4]);
    assert_eq!(decl.declared_value(&catalog), 8);
    let mut rng = ChaCha20Rng::seed_from_u64(1);
    let outcome = resolve_inspection(&context(&decl, &catalog, 10, 0, 50), &mut rng);
    assert_eq!(outcome.verdict, Verdict::HonestPass);
    assert!(outcome.confiscated.is_empty());
    assert_eq!(outcome.penalty_paid, 0);
    assert_eq!(outcome.passed.len(), 4);
}

#[test]
fn caught_pepper_is_confiscated_and_fined() {
    let catalog = GoodsCatalog::standard().unwrap();
    let decl = declaration(StrategyKind::ContrabandLow, "bread", 3, &["bread", "pepper", "pepper"]);
    // Sheriff total 5 + 8 = 13 against merchant total 2 + 3 = 5.
    let outcome = settle_contest(
        &context(&decl, &catalog, 5, 2, 50),
        Some(BluffRolls { sheriff: 8, merchant: 3 }),
    );
    assert_eq!(outcome.verdict, Verdict::Caught);
    assert_eq!(outcome.passed.as_slice(), &[GoodId::new("bread")]);
    assert_eq!(
        outcome.confiscated.as_slice(),
        &[GoodId::new("pepper"), GoodId::new("pepper")]
    );
    let pepper = catalog.value_of(&GoodId::new("pepper"));
    assert_eq!(outcome.penalty_paid, (2 * pepper) / 2);
}

#[test]
fn successful_bluff_passes_everything() {
    let catalog = GoodsCatalog::standard().unwrap();
    let decl = declaration(StrategyKind::Mixed, "apple", 3, &["apple", "apple", "silk"]);
    // Sheriff total 4 + 5 = 9 against merchant total 10 + 6 = 16.
    let outcome = settle_contest(
        &context(&decl, &catalog, 4, 10, 50),
        Some(BluffRolls { sheriff: 5, merchant: 6 }),
    );
    assert_eq!(outcome.verdict, Verdict::BluffSuccess);
    assert_eq!(outcome.passed.len(), 3);
    assert!(outcome.confiscated.is_empty());
    assert_eq!(outcome.penalty_paid, 0);
}

#[test]
fn penalty_is_clamped_to_a_thin_purse() {
    let rules = RulesConfig::default();
    let mut session = Session::new(3, GoodsCatalog::standard().unwrap(), rules.clone()).unwrap();
    let mut merchant = Merchant::new("poor", "Poor Pete", Personality::new(5, 5, 5), 0, Tier::Easy, &rules)
        .unwrap()
        .with_gold(3);
    // Perception 10 always beats a zero-skill bluff.
    let mut inspector = Inspector::new("nott", 10, 5).unwrap();
    let decl = declaration(StrategyKind::ContrabandLow, "apple", 2, &["apple", "mead"]);
    assert_eq!(decl.undeclared_value(session.catalog()), 10);
    let decision = MerchantDecision {
        declaration: decl,
        bribe_plan: BribePlan::None,
        stats: OpponentStats::neutral(),
        profile: None,
    };
    let report = session
        .resolve_round(&mut merchant, &mut inspector, decision, &mut AlwaysInspect)
        .unwrap();
    let inspection = report.inspection.unwrap();
    assert_eq!(inspection.penalty_assessed, 5);
    assert_eq!(inspection.penalty_paid, 3);
    assert_eq!(report.record.penalty_paid, 3);
    assert_eq!(merchant.gold, 0);
    assert_eq!(inspector.gold, 3);
}

#[test]
fn hard_merchant_without_history_uses_neutral_priors() {
    let rules = RulesConfig::default();
    let catalog = GoodsCatalog::standard().unwrap();
    let history = HistoryStore::new();
    let merchant = Merchant::new("hard", "Hard Hal", Personality::new(6, 6, 4), 12, Tier::Hard, &rules).unwrap();
    for seed in 0..32 {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let decision = decide(&merchant, "nott", &history, &catalog, &rules, &mut rng).unwrap();
        assert_eq!(decision.stats.inspection_rate, 0.5);
        assert_eq!(decision.stats.catch_rate, 0.5);
        assert_eq!(decision.stats.samples, 0);
        decision.declaration.validate(&catalog, &rules).unwrap();
    }
}
