//! Inspection resolution: the bluff contest, confiscation and penalties.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    BLUFF_DIE_SIDES, LOG_INSPECTION_VERDICT, REP_BLUFF_MISSED, REP_CAUGHT_LIE,
    REP_CONTRABAND_PASSED, REP_HONEST_INSPECTED, REP_HONEST_PASSED,
};
use crate::declaration::{Declaration, LieType};
use crate::goods::{Bag, GoodsCatalog};
use crate::numbers::{floor_f64_to_u32, u32_to_f64};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    HonestPass,
    BluffSuccess,
    Caught,
}

/// Raw d10 faces for both sides of a bluff contest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BluffRolls {
    pub sheriff: u8,
    pub merchant: u8,
}

impl BluffRolls {
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let sheriff = rng.gen_range(1..=BLUFF_DIE_SIDES);
        let merchant = rng.gen_range(1..=BLUFF_DIE_SIDES);
        Self { sheriff, merchant }
    }
}

/// Everything the resolver needs about a bag and the two players.
#[derive(Debug, Clone, Copy)]
pub struct InspectionContext<'a> {
    pub declaration: &'a Declaration,
    pub catalog: &'a GoodsCatalog,
    pub perception: u8,
    pub bluff_skill: u8,
    /// Penalties are capped at this balance.
    pub merchant_gold: u32,
    pub penalty_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionOutcome {
    pub verdict: Verdict,
    pub passed: Bag,
    pub confiscated: Bag,
    pub penalty_assessed: u32,
    pub penalty_paid: u32,
    pub reputation_delta: i32,
    pub experience_gained: u32,
    pub rolls: Option<BluffRolls>,
}

impl InspectionOutcome {
    #[must_use]
    pub fn lie_caught(&self) -> bool {
        self.verdict == Verdict::Caught
    }
}

/// Split a bag into the truthfully declared part (the declared good, up to
/// the declared count) and everything else.
#[must_use]
pub fn partition_bag(declaration: &Declaration) -> (Bag, Bag) {
    let mut declared = Bag::new();
    let mut undeclared = Bag::new();
    let limit = usize::from(declaration.declared_count);
    for id in &declaration.actual {
        if *id == declaration.declared_id && declared.len() < limit {
            declared.push(id.clone());
        } else {
            undeclared.push(id.clone());
        }
    }
    (declared, undeclared)
}

/// True when the bag holds exactly the declared multiset. Read from the bag
/// itself, never from the cached `lie` flag.
#[must_use]
pub fn bag_matches_declaration(declaration: &Declaration) -> bool {
    let (declared, undeclared) = partition_bag(declaration);
    undeclared.is_empty() && declared.len() == usize::from(declaration.declared_count)
}

/// Open the bag. Exact matches pass without any dice; lies go to a contest.
pub fn resolve_inspection<R: Rng + ?Sized>(ctx: &InspectionContext<'_>, rng: &mut R) -> InspectionOutcome {
    if bag_matches_declaration(ctx.declaration) {
        return settle_contest(ctx, None);
    }
    let rolls = BluffRolls::roll(rng);
    settle_contest(ctx, Some(rolls))
}

/// Deterministic half of [`resolve_inspection`]; accepts fixed rolls for replay.
///
/// `rolls` is ignored for truthful bags. A lying bag with no rolls supplied is
/// treated as caught.
#[must_use]
pub fn settle_contest(ctx: &InspectionContext<'_>, rolls: Option<BluffRolls>) -> InspectionOutcome {
    let declaration = ctx.declaration;
    if bag_matches_declaration(declaration) {
        log::debug!("{LOG_INSPECTION_VERDICT} verdict=honest_pass");
        return InspectionOutcome {
            verdict: Verdict::HonestPass,
            passed: declaration.actual.clone(),
            confiscated: Bag::new(),
            penalty_assessed: 0,
            penalty_paid: 0,
            reputation_delta: REP_HONEST_INSPECTED,
            experience_gained: 0,
            rolls: None,
        };
    }

    let caught = rolls.is_none_or(|r| {
        u16::from(r.sheriff) + u16::from(ctx.perception) >= u16::from(r.merchant) + u16::from(ctx.bluff_skill)
    });
    if !caught {
        log::debug!("{LOG_INSPECTION_VERDICT} verdict=bluff_success rolls={rolls:?}");
        return InspectionOutcome {
            verdict: Verdict::BluffSuccess,
            passed: declaration.actual.clone(),
            confiscated: Bag::new(),
            penalty_assessed: 0,
            penalty_paid: 0,
            reputation_delta: REP_BLUFF_MISSED,
            experience_gained: 0,
            rolls,
        };
    }

    let (passed, confiscated) = partition_bag(declaration);
    let penalty_assessed = floor_f64_to_u32(u32_to_f64(ctx.catalog.total_value(&confiscated)) * ctx.penalty_rate);
    let penalty_paid = penalty_assessed.min(ctx.merchant_gold);
    log::debug!(
        "{LOG_INSPECTION_VERDICT} verdict=caught confiscated={} penalty={penalty_paid}/{penalty_assessed}",
        confiscated.len()
    );
    InspectionOutcome {
        verdict: Verdict::Caught,
        passed,
        confiscated,
        penalty_assessed,
        penalty_paid,
        reputation_delta: REP_CAUGHT_LIE,
        experience_gained: 1,
        rolls,
    }
}

/// Outcome of waving a bag through unopened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassOutcome {
    pub passed: Bag,
    pub reputation_delta: i32,
    pub experience_gained: u32,
}

/// The whole bag passes. Reputation rewards letting honest merchants through
/// and punishes letting contraband through; a legal-only lie is neutral but
/// teaches the inspector something. The bag is classified afresh against the
/// catalog.
#[must_use]
pub fn settle_pass(declaration: &Declaration, catalog: &GoodsCatalog) -> PassOutcome {
    let lie_type = LieType::classify(
        &declaration.declared_id,
        declaration.declared_count,
        &declaration.actual,
        catalog,
    );
    let (reputation_delta, experience_gained) = match lie_type {
        LieType::None => (REP_HONEST_PASSED, 0),
        LieType::Legal => (0, 1),
        LieType::Mixed | LieType::Contraband => (REP_CONTRABAND_PASSED, 0),
    };
    PassOutcome {
        passed: declaration.actual.clone(),
        reputation_delta,
        experience_gained,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goods::GoodId;
    use crate::rules::RulesConfig;
    use crate::strategy::StrategyKind;
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

    fn ctx<'a>(declaration: &'a Declaration, catalog: &'a GoodsCatalog, gold: u32) -> InspectionContext<'a> {
        InspectionContext {
            declaration,
            catalog,
            perception: 5,
            bluff_skill: 5,
            merchant_gold: gold,
            penalty_rate: 0.5,
        }
    }

    #[test]
    fn partition_respects_declared_count() {
        let decl = declaration(StrategyKind::Mixed, "apple", 3, &["apple", "silk", "apple"]);
        let (declared, undeclared) = partition_bag(&decl);
        assert_eq!(declared.len(), 2);
        assert_eq!(undeclared.as_slice(), &[GoodId::new("silk")]);

        let over = declaration(StrategyKind::LegalLie, "apple", 2, &["apple", "apple", "apple"]);
        let (declared, undeclared) = partition_bag(&over);
        assert_eq!(declared.len(), 2);
        assert_eq!(undeclared.len(), 1);
    }

    #[test]
    fn honest_bag_passes_without_rolling() {
        let catalog = GoodsCatalog::standard().unwrap();
        let decl = declaration(StrategyKind::Honest, "bread", 3, &["bread", "bread", "bread"]);
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let before = rng.get_word_pos();
        let outcome = resolve_inspection(&ctx(&decl, &catalog, 50), &mut rng);
        assert_eq!(outcome.verdict, Verdict::HonestPass);
        assert_eq!(outcome.passed.len(), 3);
        assert_eq!(outcome.reputation_delta, -1);
        assert!(outcome.rolls.is_none());
        assert_eq!(rng.get_word_pos(), before);
    }

    #[test]
    fn ties_go_to_the_sheriff() {
        let catalog = GoodsCatalog::standard().unwrap();
        let decl = declaration(StrategyKind::Mixed, "bread", 3, &["bread", "bread", "pepper"]);
        let tie = settle_contest(&ctx(&decl, &catalog, 50), Some(BluffRolls { sheriff: 4, merchant: 4 }));
        assert_eq!(tie.verdict, Verdict::Caught);
        assert_eq!(tie.penalty_paid, 4);
        assert_eq!(tie.reputation_delta, 1);
        assert_eq!(tie.confiscated.as_slice(), &[GoodId::new("pepper")]);

        let miss = settle_contest(&ctx(&decl, &catalog, 50), Some(BluffRolls { sheriff: 3, merchant: 4 }));
        assert_eq!(miss.verdict, Verdict::BluffSuccess);
        assert_eq!(miss.passed.len(), 3);
        assert_eq!(miss.reputation_delta, -1);
    }

    #[test]
    fn penalty_is_capped_by_merchant_gold() {
        let catalog = GoodsCatalog::standard().unwrap();
        let decl = declaration(
            StrategyKind::ContrabandHigh,
            "apple",
            4,
            &["crossbow", "crossbow", "mead", "mead"],
        );
        let outcome = settle_contest(&ctx(&decl, &catalog, 7), Some(BluffRolls { sheriff: 10, merchant: 1 }));
        assert_eq!(outcome.penalty_assessed, 25);
        assert_eq!(outcome.penalty_paid, 7);
        assert!(outcome.passed.is_empty());
        assert_eq!(outcome.confiscated.len(), 4);
    }

    #[test]
    fn pass_settlement_by_lie_type() {
        let catalog = GoodsCatalog::standard().unwrap();
        let honest = declaration(StrategyKind::Honest, "apple", 2, &["apple", "apple"]);
        assert_eq!(settle_pass(&honest, &catalog).reputation_delta, 1);
        let legal = declaration(StrategyKind::LegalLie, "apple", 2, &["chicken", "chicken"]);
        let outcome = settle_pass(&legal, &catalog);
        assert_eq!(outcome.reputation_delta, 0);
        assert_eq!(outcome.experience_gained, 1);
        let smuggled = declaration(StrategyKind::ContrabandLow, "apple", 2, &["apple", "mead"]);
        assert_eq!(settle_pass(&smuggled, &catalog).reputation_delta, -2);
    }

    #[test]
    fn stale_lie_flag_does_not_wave_contraband_through() {
        let catalog = GoodsCatalog::standard().unwrap();
        let forged = Declaration {
            strategy: StrategyKind::Honest,
            declared_id: GoodId::new("apple"),
            declared_count: 2,
            actual: ["apple", "crossbow"].iter().map(|id| GoodId::new(id)).collect(),
            lie: false,
            lie_type: LieType::None,
        };
        assert!(!bag_matches_declaration(&forged));

        let caught = settle_contest(&ctx(&forged, &catalog, 50), Some(BluffRolls { sheriff: 9, merchant: 1 }));
        assert_eq!(caught.verdict, Verdict::Caught);
        assert_eq!(caught.confiscated.as_slice(), &[GoodId::new("crossbow")]);
        assert!(caught.penalty_assessed > 0);

        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let opened = resolve_inspection(&ctx(&forged, &catalog, 50), &mut rng);
        assert_ne!(opened.verdict, Verdict::HonestPass);
        assert!(opened.rolls.is_some());

        assert_eq!(settle_pass(&forged, &catalog).reputation_delta, REP_CONTRABAND_PASSED);
    }

    #[test]
    fn short_count_is_not_an_exact_match() {
        let catalog = GoodsCatalog::standard().unwrap();
        let forged = Declaration {
            strategy: StrategyKind::Honest,
            declared_id: GoodId::new("bread"),
            declared_count: 3,
            actual: ["bread", "bread"].iter().map(|id| GoodId::new(id)).collect(),
            lie: false,
            lie_type: LieType::None,
        };
        let outcome = settle_contest(&ctx(&forged, &catalog, 50), None);
        assert_eq!(outcome.verdict, Verdict::Caught);
        assert!(outcome.confiscated.is_empty());
        assert_eq!(settle_pass(&forged, &catalog).experience_gained, 1);
    }
}
