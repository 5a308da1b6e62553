//! Level-wise frequent itemset mining
//!
//! Implements the Apriori search:
//! 1. Count single items and keep those reaching `min_support`
//! 2. Join surviving (k-1)-itemsets sharing their first k-2 items
//! 3. Drop candidates having any (k-1)-subset that did not survive
//! 4. Count the remaining candidates over the corpus and keep the frequent ones
//! 5. Stop when a level produces no candidates or no survivors
//!
//! Support counts are integers, so parallel counting yields exactly the
//! same itemsets and scores as the sequential path.

use crate::errors::TrainingError;
use crate::store::TransactionSet;
use crate::types::{validate_support, ItemId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// A frequent itemset with its absolute and relative support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itemset {
    /// Item ids in ascending order
    pub items: Vec<ItemId>,
    /// Number of transactions containing every item
    pub count: u64,
    /// `count / total transactions`
    pub support: f64,
}

impl Itemset {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// All itemsets that reached the support threshold, indexed by sorted id key.
#[derive(Debug, Clone, Default)]
pub struct FrequentItemsets {
    itemsets: Vec<Itemset>,
    index: HashMap<Vec<ItemId>, usize>,
    transaction_count: usize,
    min_support: f64,
}

impl FrequentItemsets {
    fn new(mut itemsets: Vec<Itemset>, transaction_count: usize, min_support: f64) -> Self {
        itemsets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.items.cmp(&b.items)));
        let index = itemsets
            .iter()
            .enumerate()
            .map(|(i, set)| (set.items.clone(), i))
            .collect();
        Self {
            itemsets,
            index,
            transaction_count,
            min_support,
        }
    }

    /// Itemsets ordered by support descending, then by ids
    pub fn iter(&self) -> impl Iterator<Item = &Itemset> {
        self.itemsets.iter()
    }

    pub fn as_slice(&self) -> &[Itemset] {
        &self.itemsets
    }

    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    /// Look up an itemset by its ids in ascending order
    pub fn get(&self, sorted_items: &[ItemId]) -> Option<&Itemset> {
        self.index.get(sorted_items).map(|&i| &self.itemsets[i])
    }

    pub fn support_of(&self, sorted_items: &[ItemId]) -> Option<f64> {
        self.get(sorted_items).map(|set| set.support)
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    pub fn min_support(&self) -> f64 {
        self.min_support
    }

    /// Number of itemsets with exactly `k` items
    pub fn count_of_size(&self, k: usize) -> usize {
        self.itemsets.iter().filter(|set| set.len() == k).count()
    }

    /// Number of itemsets a rule can be derived from
    pub fn multi_item_count(&self) -> usize {
        self.itemsets.iter().filter(|set| set.len() >= 2).count()
    }

    pub fn max_itemset_len(&self) -> usize {
        self.itemsets.iter().map(Itemset::len).max().unwrap_or(0)
    }
}

/// Apriori miner configuration.
#[derive(Debug, Clone)]
pub struct Miner {
    min_support: f64,
    max_len: Option<usize>,
    parallel: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl Miner {
    /// Create a miner with the given support threshold; counting runs in
    /// parallel by default.
    pub fn new(min_support: f64) -> Self {
        Self {
            min_support,
            max_len: None,
            parallel: true,
            cancel: None,
        }
    }

    /// Stop after itemsets of `max_len` items
    #[must_use]
    pub fn with_max_len(mut self, max_len: Option<usize>) -> Self {
        self.max_len = max_len;
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Flag checked between levels; setting it aborts with [`TrainingError::Cancelled`]
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn min_support(&self) -> f64 {
        self.min_support
    }

    /// Run the level-wise search over `transactions`.
    pub fn mine(&self, transactions: &TransactionSet) -> Result<FrequentItemsets, TrainingError> {
        validate_support(self.min_support)?;
        if transactions.is_empty() {
            return Err(TrainingError::EmptyCorpus);
        }
        if let Some(0) = self.max_len {
            return Err(TrainingError::InvalidThreshold {
                name: "max_len",
                value: 0.0,
                reason: "must be at least 1",
            });
        }

        let total = transactions.len();
        let baskets = transactions.baskets();
        let mut found: Vec<(Vec<usize>, u64)> = Vec::new();

        let mut current = self.frequent_singletons(transactions);
        let mut level = 1usize;
        debug!("level 1: {} frequent items", current.len());

        loop {
            if current.is_empty() {
                break;
            }
            found.extend(current.iter().cloned());

            if self.max_len.is_some_and(|max| level >= max) {
                break;
            }
            if self.is_cancelled() {
                return Err(TrainingError::Cancelled {
                    completed_levels: level,
                });
            }

            let candidates = generate_candidates(&current);
            if candidates.is_empty() {
                break;
            }

            let counts = self.count_supports(&candidates, baskets);
            level += 1;
            current = candidates
                .into_iter()
                .zip(counts)
                .filter(|(_, count)| self.is_frequent(*count, total))
                .collect();
            debug!("level {}: {} frequent itemsets", level, current.len());
        }

        let itemsets: Vec<Itemset> = found
            .into_iter()
            .map(|(indices, count)| Itemset {
                items: indices.iter().map(|&i| transactions.item(i).clone()).collect(),
                count,
                support: count as f64 / total as f64,
            })
            .collect();

        let frequent = FrequentItemsets::new(itemsets, total, self.min_support);
        info!(
            "Found {} frequent itemsets (min_support={}, {} transactions, longest={})",
            frequent.len(),
            self.min_support,
            total,
            frequent.max_itemset_len()
        );
        Ok(frequent)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn is_frequent(&self, count: u64, total: usize) -> bool {
        count as f64 / total as f64 >= self.min_support
    }

    fn frequent_singletons(&self, transactions: &TransactionSet) -> Vec<(Vec<usize>, u64)> {
        let mut counts = vec![0u64; transactions.vocabulary().len()];
        for basket in transactions.baskets() {
            for &item in basket {
                counts[item] += 1;
            }
        }

        counts
            .into_iter()
            .enumerate()
            .filter(|(_, count)| self.is_frequent(*count, transactions.len()))
            .map(|(item, count)| (vec![item], count))
            .collect()
    }

    fn count_supports(&self, candidates: &[Vec<usize>], baskets: &[Vec<usize>]) -> Vec<u64> {
        let count = |candidate: &Vec<usize>| {
            baskets
                .iter()
                .filter(|basket| is_subset(candidate, basket))
                .count() as u64
        };

        if self.parallel {
            candidates.par_iter().map(count).collect()
        } else {
            candidates.iter().map(count).collect()
        }
    }
}

/// Mine with default options (parallel counting, no length limit).
pub fn mine(
    transactions: &TransactionSet,
    min_support: f64,
) -> Result<FrequentItemsets, TrainingError> {
    Miner::new(min_support).mine(transactions)
}

/// Join step plus subset pruning over one level.
///
/// `prev` must be sorted lexicographically with each itemset sorted, which
/// holds for every level the miner produces. Itemsets sharing their first
/// k-2 items are contiguous, so the join only scans forward within a block.
fn generate_candidates(prev: &[(Vec<usize>, u64)]) -> Vec<Vec<usize>> {
    let survivors: HashSet<&[usize]> = prev.iter().map(|(set, _)| set.as_slice()).collect();
    let mut candidates = Vec::new();

    for i in 0..prev.len() {
        let left = &prev[i].0;
        let prefix = &left[..left.len() - 1];

        for (right, _) in &prev[i + 1..] {
            if &right[..right.len() - 1] != prefix {
                break;
            }

            let mut candidate = left.clone();
            candidate.push(right[right.len() - 1]);

            if !has_infrequent_subset(&candidate, &survivors) {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

fn has_infrequent_subset(candidate: &[usize], survivors: &HashSet<&[usize]>) -> bool {
    let mut subset = Vec::with_capacity(candidate.len() - 1);
    (0..candidate.len()).any(|skip| {
        subset.clear();
        subset.extend(
            candidate
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, &item)| item),
        );
        !survivors.contains(subset.as_slice())
    })
}

/// Merge-based subset test over two sorted slices.
fn is_subset(needle: &[usize], haystack: &[usize]) -> bool {
    if needle.len() > haystack.len() {
        return false;
    }
    let mut hay = haystack.iter();
    needle
        .iter()
        .all(|item| hay.by_ref().any(|candidate| candidate == item))
}
