//! Goods catalog: legal wares and contraband.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

use crate::constants::BAG_SIZE_LIMIT;
use crate::rules::ConfigurationError;

const DEFAULT_GOODS_DATA: &str = include_str!("../data/goods.json");

/// Contents of a merchant's bag, stored inline up to the bag limit.
pub type Bag = SmallVec<[GoodId; BAG_SIZE_LIMIT]>;

/// Stable identifier of a good; every other record refers to goods by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoodId(pub String);

impl GoodId {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_ascii_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GoodId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoodCategory {
    Legal,
    Contraband,
}

impl GoodCategory {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Legal => "legal",
            Self::Contraband => "contraband",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Good {
    pub id: GoodId,
    pub name: String,
    pub category: GoodCategory,
    pub value: u32,
}

impl Good {
    #[must_use]
    pub fn new(id: &str, name: &str, category: GoodCategory, value: u32) -> Self {
        Self {
            id: GoodId::new(id),
            name: name.to_string(),
            category,
            value,
        }
    }

    #[must_use]
    pub fn is_legal(&self) -> bool {
        self.category == GoodCategory::Legal
    }

    #[must_use]
    pub fn is_contraband(&self) -> bool {
        self.category == GoodCategory::Contraband
    }
}

/// Immutable set of goods defined once at load time.
///
/// Goods are kept sorted by ascending value within each category so builders
/// can take "cheapest" and "most valuable" slices directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodsCatalog {
    goods: Vec<Good>,
    index: HashMap<GoodId, usize>,
}

impl GoodsCatalog {
    /// Build a catalog, rejecting duplicates and catalogs too small to support
    /// every declaration strategy (two legal goods, one contraband good).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateGood`] or
    /// [`ConfigurationError::CatalogTooSmall`].
    pub fn new(mut goods: Vec<Good>) -> Result<Self, ConfigurationError> {
        goods.sort_by(|a, b| {
            (a.category == GoodCategory::Contraband)
                .cmp(&(b.category == GoodCategory::Contraband))
                .then(a.value.cmp(&b.value))
                .then(a.id.cmp(&b.id))
        });
        let mut index = HashMap::with_capacity(goods.len());
        for (pos, good) in goods.iter().enumerate() {
            if index.insert(good.id.clone(), pos).is_some() {
                return Err(ConfigurationError::DuplicateGood(good.id.0.clone()));
            }
        }
        let catalog = Self { goods, index };
        let legal = catalog.legal().len();
        if legal < 2 {
            return Err(ConfigurationError::CatalogTooSmall {
                category: GoodCategory::Legal.key(),
                required: 2,
                found: legal,
            });
        }
        let contraband = catalog.contraband().len();
        if contraband == 0 {
            return Err(ConfigurationError::CatalogTooSmall {
                category: GoodCategory::Contraband.key(),
                required: 1,
                found: 0,
            });
        }
        Ok(catalog)
    }

    /// The standard eight-good set: four legal wares and four contraband.
    ///
    /// # Errors
    ///
    /// Propagates catalog validation; the built-in list always passes it.
    pub fn standard() -> Result<Self, ConfigurationError> {
        let goods = vec![
            Good::new("apple", "Apple", GoodCategory::Legal, 2),
            Good::new("cheese", "Cheese", GoodCategory::Legal, 3),
            Good::new("bread", "Bread", GoodCategory::Legal, 3),
            Good::new("chicken", "Chicken", GoodCategory::Legal, 4),
            Good::new("silk", "Silk", GoodCategory::Contraband, 8),
            Good::new("pepper", "Pepper", GoodCategory::Contraband, 8),
            Good::new("mead", "Mead", GoodCategory::Contraband, 10),
            Good::new("crossbow", "Crossbow", GoodCategory::Contraband, 15),
        ];
        Self::new(goods)
    }

    /// The catalog shipped as `data/goods.json`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Parse`] if the bundled file is malformed.
    pub fn bundled() -> Result<Self, ConfigurationError> {
        Self::from_json(DEFAULT_GOODS_DATA)
    }

    /// Load goods from a JSON array of [`Good`] records.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Parse`] for malformed JSON plus any
    /// catalog validation error.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let goods: Vec<Good> =
            serde_json::from_str(json).map_err(|err| ConfigurationError::Parse(err.to_string()))?;
        Self::new(goods)
    }

    #[must_use]
    pub fn get(&self, id: &GoodId) -> Option<&Good> {
        self.index.get(id).and_then(|pos| self.goods.get(*pos))
    }

    /// Look up a good, treating unknown ids as a configuration error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownGood`].
    pub fn require(&self, id: &GoodId) -> Result<&Good, ConfigurationError> {
        self.get(id)
            .ok_or_else(|| ConfigurationError::UnknownGood(id.0.clone()))
    }

    /// Legal goods in ascending value order.
    #[must_use]
    pub fn legal(&self) -> &[Good] {
        let split = self.split_point();
        &self.goods[..split]
    }

    /// Contraband goods in ascending value order.
    #[must_use]
    pub fn contraband(&self) -> &[Good] {
        let split = self.split_point();
        &self.goods[split..]
    }

    fn split_point(&self) -> usize {
        self.goods
            .iter()
            .position(Good::is_contraband)
            .unwrap_or(self.goods.len())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Good> {
        self.goods.iter()
    }

    #[must_use]
    pub fn value_of(&self, id: &GoodId) -> u32 {
        self.get(id).map_or(0, |good| good.value)
    }

    /// Sum of unit values; unknown ids count as zero.
    #[must_use]
    pub fn total_value<'a>(&self, ids: impl IntoIterator<Item = &'a GoodId>) -> u32 {
        ids.into_iter()
            .fold(0_u32, |acc, id| acc.saturating_add(self.value_of(id)))
    }

    #[must_use]
    pub fn is_contraband(&self, id: &GoodId) -> bool {
        self.get(id).is_some_and(Good::is_contraband)
    }

    /// Sum of contraband unit values only.
    #[must_use]
    pub fn contraband_value<'a>(&self, ids: impl IntoIterator<Item = &'a GoodId>) -> u32 {
        ids.into_iter()
            .filter(|id| self.is_contraband(id))
            .fold(0_u32, |acc, id| acc.saturating_add(self.value_of(id)))
    }
}

impl<'a> IntoIterator for &'a GoodsCatalog {
    type Item = &'a Good;
    type IntoIter = std::slice::Iter<'a, Good>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_partitions_by_category() {
        let catalog = GoodsCatalog::standard().unwrap();
        assert_eq!(catalog.legal().len(), 4);
        assert_eq!(catalog.contraband().len(), 4);
        assert!(catalog.legal().iter().all(Good::is_legal));
        assert!(catalog.contraband().iter().all(Good::is_contraband));
        assert_eq!(catalog.legal()[0].id, GoodId::new("apple"));
        assert_eq!(catalog.contraband().last().unwrap().id, GoodId::new("crossbow"));
    }

    #[test]
    fn bundled_data_matches_standard_set() {
        assert_eq!(GoodsCatalog::bundled().unwrap(), GoodsCatalog::standard().unwrap());
    }

    #[test]
    fn values_and_lookups() {
        let catalog = GoodsCatalog::standard().unwrap();
        let bag: Bag = ["bread", "pepper", "pepper"]
            .into_iter()
            .map(GoodId::new)
            .collect();
        assert_eq!(catalog.total_value(&bag), 19);
        assert_eq!(catalog.contraband_value(&bag), 16);
        assert!(catalog.require(&GoodId::new("unicorn")).is_err());
        assert_eq!(catalog.value_of(&GoodId::new("unicorn")), 0);
    }

    #[test]
    fn json_loading_validates() {
        let json = r#"[
            { "id": "apple", "name": "Apple", "category": "legal", "value": 2 },
            { "id": "bread", "name": "Bread", "category": "legal", "value": 3 },
            { "id": "silk", "name": "Silk", "category": "contraband", "value": 8 }
        ]"#;
        let catalog = GoodsCatalog::from_json(json).unwrap();
        assert_eq!(catalog.iter().count(), 3);

        let too_small = r#"[
            { "id": "apple", "name": "Apple", "category": "legal", "value": 2 },
            { "id": "silk", "name": "Silk", "category": "contraband", "value": 8 }
        ]"#;
        assert!(matches!(
            GoodsCatalog::from_json(too_small),
            Err(ConfigurationError::CatalogTooSmall { category: "legal", .. })
        ));

        let duplicate = r#"[
            { "id": "apple", "name": "Apple", "category": "legal", "value": 2 },
            { "id": "apple", "name": "Apple", "category": "legal", "value": 2 },
            { "id": "silk", "name": "Silk", "category": "contraband", "value": 8 }
        ]"#;
        assert_eq!(
            GoodsCatalog::from_json(duplicate),
            Err(ConfigurationError::DuplicateGood("apple".to_string()))
        );
    }
}
