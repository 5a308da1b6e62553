//! Transaction store: basket corpus and product catalog
//!
//! Raw rows are grouped into baskets keyed by transaction id. Item ids are
//! interned against a sorted vocabulary so each basket becomes a sorted
//! vector of indices; index order therefore equals id order, which keeps
//! mining output lexicographically reproducible.

use crate::errors::{DataError, NotFoundError};
use crate::types::{Item, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// One (transaction, item, name) row from the tabular source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(rename = "TransactionID", alias = "transaction_id", default)]
    pub transaction_id: Option<String>,
    #[serde(rename = "SKU", alias = "item_id", default)]
    pub item_id: Option<String>,
    #[serde(rename = "ProductName", alias = "item_name", default)]
    pub item_name: Option<String>,
}

impl RawRow {
    pub fn new(
        transaction_id: impl Into<String>,
        item_id: impl Into<String>,
        item_name: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id: Some(transaction_id.into()),
            item_id: Some(item_id.into()),
            item_name: Some(item_name.into()),
        }
    }
}

/// Product catalog keyed by item id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<Item>", try_from = "Vec<Item>")]
pub struct Catalog {
    items: BTreeMap<ItemId, Item>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the id is already known. Returns the existing entry
    /// when the id was seen before.
    pub fn insert_first_seen(&mut self, item: Item) -> Option<&Item> {
        use std::collections::btree_map::Entry;
        match self.items.entry(item.id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(item);
                None
            }
            Entry::Occupied(slot) => Some(slot.into_mut()),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// Lookup that reports unknown ids as [`NotFoundError`]
    pub fn require(&self, id: &str) -> Result<&Item, NotFoundError> {
        self.get(id).ok_or_else(|| NotFoundError(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// All items, ordered by id
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<Catalog> for Vec<Item> {
    fn from(catalog: Catalog) -> Self {
        catalog.items.into_values().collect()
    }
}

impl TryFrom<Vec<Item>> for Catalog {
    type Error = DataError;

    fn try_from(items: Vec<Item>) -> Result<Self, Self::Error> {
        let mut catalog = Catalog::new();
        for item in items {
            let id = item.id.to_string();
            if catalog.insert_first_seen(item).is_some() {
                return Err(DataError::DuplicateItem(id));
            }
        }
        Ok(catalog)
    }
}

/// Basket corpus with interned item ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSet {
    vocabulary: Vec<ItemId>,
    baskets: Vec<Vec<usize>>,
}

impl TransactionSet {
    /// Build a corpus from baskets of ids. Duplicates inside a basket collapse.
    pub fn from_baskets<B, S>(baskets: impl IntoIterator<Item = B>) -> Self
    where
        B: IntoIterator<Item = S>,
        S: Into<ItemId>,
    {
        let sets: Vec<BTreeSet<ItemId>> = baskets
            .into_iter()
            .map(|basket| basket.into_iter().map(Into::into).collect())
            .collect();

        let vocabulary: Vec<ItemId> = sets
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let baskets = sets
            .iter()
            .map(|set| {
                // BTreeSet iteration is sorted, so the indices come out sorted too
                set.iter()
                    .filter_map(|id| vocabulary.binary_search(id).ok())
                    .collect()
            })
            .collect();

        Self {
            vocabulary,
            baskets,
        }
    }

    /// Number of transactions
    pub fn len(&self) -> usize {
        self.baskets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baskets.is_empty()
    }

    /// Distinct items in id order
    pub fn vocabulary(&self) -> &[ItemId] {
        &self.vocabulary
    }

    /// Baskets as sorted vocabulary indices
    pub fn baskets(&self) -> &[Vec<usize>] {
        &self.baskets
    }

    pub fn item(&self, index: usize) -> &ItemId {
        &self.vocabulary[index]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.vocabulary
            .binary_search_by(|probe| probe.as_str().cmp(id))
            .ok()
    }
}

fn required(value: Option<String>, row: usize, field: &'static str) -> Result<String, DataError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(DataError::MissingField { row, field }),
    }
}

/// Group rows into baskets and build the catalog.
///
/// Rows are numbered from 1 in error messages. When one id carries several
/// names, the first name seen is kept and the conflict is logged.
pub fn load<I>(rows: I) -> Result<(TransactionSet, Catalog), DataError>
where
    I: IntoIterator<Item = RawRow>,
{
    let mut grouped: BTreeMap<String, BTreeSet<ItemId>> = BTreeMap::new();
    let mut catalog = Catalog::new();
    let mut row_count = 0usize;
    let mut name_conflicts = 0usize;

    for (idx, raw) in rows.into_iter().enumerate() {
        let row = idx + 1;
        row_count = row;

        let transaction_id = required(raw.transaction_id, row, "transaction_id")?;
        let item_id = ItemId::new(required(raw.item_id, row, "item_id")?);
        let item_name = required(raw.item_name, row, "item_name")?;

        if let Some(existing) = catalog.insert_first_seen(Item::new(item_id.clone(), item_name.clone())) {
            if existing.name != item_name {
                name_conflicts += 1;
                warn!(
                    "row {}: item {} already named {:?}, ignoring {:?}",
                    row, item_id, existing.name, item_name
                );
            }
        }

        grouped.entry(transaction_id).or_default().insert(item_id);
    }

    if row_count == 0 {
        return Err(DataError::Empty);
    }

    let transactions = TransactionSet::from_baskets(grouped.into_values());

    info!(
        "Loaded {} transactions with {} unique products from {} rows",
        transactions.len(),
        catalog.len(),
        row_count
    );
    if name_conflicts > 0 {
        warn!("{} rows carried a conflicting product name", name_conflicts);
    }

    Ok((transactions, catalog))
}
