//! Declaration builders for each strategy archetype.
//!
//! Builders are pure apart from the injected RNG: they pick a declared good,
//! a declared count and fill the actual bag so the archetype's invariant holds.
//! The result is always checked with [`Declaration::validate`] before it leaves
//! this module.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::constants::{CONTRABAND_HIGH_MAX_ITEMS, CONTRABAND_HIGH_MIN_ITEMS};
use crate::goods::{Bag, Good, GoodId, GoodsCatalog};
use crate::inspection::partition_bag;
use crate::rules::{ConfigurationError, RulesConfig};
use crate::strategy::StrategyKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LieType {
    None,
    /// Only legal goods, but not the declared multiset.
    Legal,
    /// A single contraband item hidden among the declared good.
    Mixed,
    Contraband,
}

impl LieType {
    /// Describe what a bag actually holds relative to its declaration.
    #[must_use]
    pub fn classify(
        declared: &GoodId,
        declared_count: u8,
        actual: &[GoodId],
        catalog: &GoodsCatalog,
    ) -> Self {
        if matches_declaration(declared, declared_count, actual) {
            return Self::None;
        }
        let contraband = actual.iter().filter(|id| catalog.is_contraband(id)).count();
        if contraband == 0 {
            return Self::Legal;
        }
        let declared_items = actual.iter().filter(|id| *id == declared).count();
        if contraband == 1 && declared_items + 1 == actual.len() && declared_items > 0 {
            Self::Mixed
        } else {
            Self::Contraband
        }
    }

    #[must_use]
    pub const fn carries_contraband(self) -> bool {
        matches!(self, Self::Mixed | Self::Contraband)
    }
}

fn matches_declaration(declared: &GoodId, declared_count: u8, actual: &[GoodId]) -> bool {
    actual.len() == usize::from(declared_count) && actual.iter().all(|id| id == declared)
}

/// What a merchant claims about a bag, alongside what the bag truly holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub declared_id: GoodId,
    pub declared_count: u8,
    pub actual: Bag,
    pub lie: bool,
    pub lie_type: LieType,
    pub strategy: StrategyKind,
}

impl Declaration {
    /// Assemble a declaration, deriving `lie` and `lie_type` from the bag and
    /// validating it against the catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] when the bag, the count or the goods
    /// are invalid.
    pub fn from_parts(
        strategy: StrategyKind,
        declared_id: GoodId,
        declared_count: u8,
        actual: Bag,
        catalog: &GoodsCatalog,
        rules: &RulesConfig,
    ) -> Result<Self, ConfigurationError> {
        let lie_type = LieType::classify(&declared_id, declared_count, &actual, catalog);
        let declaration = Self {
            declared_id,
            declared_count,
            actual,
            lie: lie_type != LieType::None,
            lie_type,
            strategy,
        };
        declaration.validate(catalog, rules)?;
        Ok(declaration)
    }

    /// # Errors
    ///
    /// Returns the first broken invariant.
    pub fn validate(&self, catalog: &GoodsCatalog, rules: &RulesConfig) -> Result<(), ConfigurationError> {
        rules.check_bag_len(self.actual.len())?;
        let count = usize::from(self.declared_count);
        if count == 0 || count > rules.bag_size_limit {
            return Err(ConfigurationError::DeclaredCountOutOfRange {
                count: self.declared_count,
                min: 1,
                max: rules.bag_size_limit,
            });
        }
        let declared = catalog.require(&self.declared_id)?;
        if declared.is_contraband() {
            return Err(self.invalid("contraband cannot be declared"));
        }
        for id in &self.actual {
            catalog.require(id)?;
        }
        let expected = LieType::classify(&self.declared_id, self.declared_count, &self.actual, catalog);
        if self.lie_type != expected || self.lie != (expected != LieType::None) {
            return Err(self.invalid("lie flags disagree with the bag"));
        }
        match self.strategy {
            StrategyKind::Honest if self.lie => Err(self.invalid("honest bag must match its declaration")),
            StrategyKind::LegalLie if self.lie_type != LieType::Legal => {
                Err(self.invalid("legal lie must carry only legal goods and differ from the claim"))
            }
            StrategyKind::ContrabandHigh
                if !(CONTRABAND_HIGH_MIN_ITEMS..=CONTRABAND_HIGH_MAX_ITEMS).contains(&self.actual.len()) =>
            {
                Err(self.invalid("high-value smuggling carries three to five items"))
            }
            StrategyKind::ContrabandHigh
                if !self.actual.iter().all(|id| catalog.is_contraband(id)) =>
            {
                Err(self.invalid("high-value smuggling carries contraband only"))
            }
            StrategyKind::Mixed | StrategyKind::ContrabandLow if !self.lie_type.carries_contraband() => {
                Err(self.invalid("smuggling bag carries no contraband"))
            }
            _ => Ok(()),
        }
    }

    const fn invalid(&self, reason: &'static str) -> ConfigurationError {
        ConfigurationError::InvalidDeclaration {
            strategy: self.strategy,
            reason,
        }
    }

    /// Value the merchant claims: declared unit value × declared count.
    #[must_use]
    pub fn declared_value(&self, catalog: &GoodsCatalog) -> u32 {
        catalog
            .value_of(&self.declared_id)
            .saturating_mul(u32::from(self.declared_count))
    }

    /// Value of the goods outside the declared subset.
    #[must_use]
    pub fn undeclared_value(&self, catalog: &GoodsCatalog) -> u32 {
        let (_, undeclared) = partition_bag(self);
        catalog.total_value(&undeclared)
    }

    #[must_use]
    pub fn actual_value(&self, catalog: &GoodsCatalog) -> u32 {
        catalog.total_value(&self.actual)
    }

    #[must_use]
    pub fn has_contraband(&self, catalog: &GoodsCatalog) -> bool {
        self.actual.iter().any(|id| catalog.is_contraband(id))
    }
}

/// Build a declaration for `strategy`.
///
/// # Errors
///
/// Returns a [`ConfigurationError`] if the catalog cannot satisfy the
/// archetype; the standard catalog always can.
pub fn build<R: Rng + ?Sized>(
    strategy: StrategyKind,
    catalog: &GoodsCatalog,
    rules: &RulesConfig,
    risk_tolerance: u8,
    rng: &mut R,
) -> Result<Declaration, ConfigurationError> {
    let (declared, count, bag) = match strategy {
        StrategyKind::Honest => build_honest(catalog, rules, rng)?,
        StrategyKind::LegalLie => build_legal_lie(catalog, rules, risk_tolerance, rng)?,
        StrategyKind::Mixed => build_mixed(catalog, rules, rng)?,
        StrategyKind::ContrabandLow => build_contraband_low(catalog, rules, rng)?,
        StrategyKind::ContrabandHigh => build_contraband_high(catalog, rules, rng)?,
    };
    Declaration::from_parts(strategy, declared, count, bag, catalog, rules)
}

type Parts = (GoodId, u8, Bag);

fn pick<'a, R: Rng + ?Sized>(goods: &'a [Good], rng: &mut R) -> Result<&'a Good, ConfigurationError> {
    goods.choose(rng).ok_or(ConfigurationError::CatalogTooSmall {
        category: "eligible",
        required: 1,
        found: 0,
    })
}

/// Draw a count in `[lo, hi]`, capped by the bag limit.
fn draw_count<R: Rng + ?Sized>(lo: usize, hi: usize, rules: &RulesConfig, rng: &mut R) -> usize {
    let hi = hi.min(rules.bag_size_limit).max(1);
    let lo = lo.min(hi).max(1);
    rng.gen_range(lo..=hi)
}

fn count_u8(count: usize) -> u8 {
    u8::try_from(count).unwrap_or(u8::MAX)
}

fn repeat(id: &GoodId, count: usize) -> Bag {
    std::iter::repeat_n(id.clone(), count).collect()
}

fn build_honest<R: Rng + ?Sized>(
    catalog: &GoodsCatalog,
    rules: &RulesConfig,
    rng: &mut R,
) -> Result<Parts, ConfigurationError> {
    let good = pick(catalog.legal(), rng)?;
    let count = draw_count(2, 4, rules, rng);
    Ok((good.id.clone(), count_u8(count), repeat(&good.id, count)))
}

fn build_legal_lie<R: Rng + ?Sized>(
    catalog: &GoodsCatalog,
    rules: &RulesConfig,
    risk_tolerance: u8,
    rng: &mut R,
) -> Result<Parts, ConfigurationError> {
    let legal = catalog.legal();
    let count = draw_count(2, 4, rules, rng);
    let (declared, bag) = if risk_tolerance <= 3 {
        // Claim something pricier, carry the cheapest substitute.
        let declared = pick(&legal[1..], rng)?;
        let substitute = pick_other(legal, &declared.id, true)?;
        (declared.id.clone(), repeat(&substitute.id, count))
    } else if risk_tolerance >= 7 {
        let declared = &legal[0];
        let substitute = pick_other(legal, &declared.id, false)?;
        (declared.id.clone(), repeat(&substitute.id, count))
    } else {
        let declared = pick(legal, rng)?;
        let others: Vec<Good> = legal
            .iter()
            .filter(|good| good.id != declared.id)
            .cloned()
            .collect();
        let substitute = pick(&others, rng)?;
        let swapped = rng.gen_range(1..=count);
        let mut bag = repeat(&declared.id, count - swapped);
        bag.extend(repeat(&substitute.id, swapped));
        bag.shuffle(rng);
        (declared.id.clone(), bag)
    };
    let declared_count = count_u8(count);
    Ok((declared, declared_count, bag))
}

/// Cheapest (or most valuable) legal good other than `declared`.
fn pick_other<'a>(legal: &'a [Good], declared: &GoodId, cheapest: bool) -> Result<&'a Good, ConfigurationError> {
    let mut others = legal.iter().filter(|good| &good.id != declared);
    let found = if cheapest { others.next() } else { others.last() };
    found.ok_or(ConfigurationError::CatalogTooSmall {
        category: "legal",
        required: 2,
        found: legal.len(),
    })
}

fn build_mixed<R: Rng + ?Sized>(
    catalog: &GoodsCatalog,
    rules: &RulesConfig,
    rng: &mut R,
) -> Result<Parts, ConfigurationError> {
    let declared = pick(catalog.legal(), rng)?;
    let contraband = catalog.contraband();
    let cheaper_half = &contraband[..contraband.len().div_ceil(2)];
    let hidden = pick(cheaper_half, rng)?;
    let count = draw_count(3, 4, rules, rng);
    let mut bag = repeat(&declared.id, count - 1);
    bag.push(hidden.id.clone());
    bag.shuffle(rng);
    Ok((declared.id.clone(), count_u8(count), bag))
}

fn build_contraband_low<R: Rng + ?Sized>(
    catalog: &GoodsCatalog,
    rules: &RulesConfig,
    rng: &mut R,
) -> Result<Parts, ConfigurationError> {
    let declared = pick(catalog.legal(), rng)?;
    let contraband = catalog.contraband();
    let upper = &contraband[contraband.len() / 3..];
    let size = draw_count(2, 3, rules, rng);
    let smuggled = rng.gen_range(1..=2).min(size.saturating_sub(1)).max(1);
    let mut bag = Bag::new();
    for _ in 0..smuggled {
        bag.push(pick(upper, rng)?.id.clone());
    }
    bag.extend(repeat(&declared.id, size - smuggled));
    bag.shuffle(rng);
    Ok((declared.id.clone(), count_u8(size), bag))
}

fn build_contraband_high<R: Rng + ?Sized>(
    catalog: &GoodsCatalog,
    rules: &RulesConfig,
    rng: &mut R,
) -> Result<Parts, ConfigurationError> {
    let declared = &catalog.legal()[0];
    let contraband = catalog.contraband();
    let upper = &contraband[contraband.len() / 2..];
    let size = draw_count(CONTRABAND_HIGH_MIN_ITEMS, CONTRABAND_HIGH_MAX_ITEMS, rules, rng);
    let mut bag = Bag::new();
    for _ in 0..size {
        bag.push(pick(upper, rng)?.id.clone());
    }
    Ok((declared.id.clone(), count_u8(size), bag))
}
