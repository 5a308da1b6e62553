//! Association rule generation
//!
//! Every frequent itemset with two or more items is split into each
//! non-empty proper subset (antecedent) and its complement (consequent).

use crate::errors::TrainingError;
use crate::miner::FrequentItemsets;
use crate::types::{validate_confidence, validate_lift, ItemId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::info;

/// Association rule: antecedent => consequent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Items on the left side, ascending
    pub antecedent: Vec<ItemId>,
    /// Items on the right side, ascending
    pub consequent: Vec<ItemId>,
    /// Support of antecedent ∪ consequent
    pub support: f64,
    /// support(antecedent ∪ consequent) / support(antecedent)
    pub confidence: f64,
    /// confidence / support(consequent)
    pub lift: f64,
}

impl Rule {
    /// True when every antecedent item is in `cart`
    pub fn applies_to(&self, cart: &std::collections::HashSet<&str>) -> bool {
        self.antecedent.iter().all(|item| cart.contains(item.as_str()))
    }
}

/// Ranking used for the stored rule set: confidence desc, lift desc, then ids.
pub fn rule_order(a: &Rule, b: &Rule) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| b.lift.total_cmp(&a.lift))
        .then_with(|| a.antecedent.cmp(&b.antecedent))
        .then_with(|| a.consequent.cmp(&b.consequent))
}

// Bitmask enumeration needs one bit per item.
const MAX_RULE_ITEMSET_LEN: usize = 63;

/// Derive rules from `itemsets`, keeping those with
/// `confidence >= min_confidence` and `lift >= min_lift`.
pub fn generate_rules(
    itemsets: &FrequentItemsets,
    min_confidence: f64,
    min_lift: f64,
) -> Result<Vec<Rule>, TrainingError> {
    validate_confidence(min_confidence)?;
    validate_lift(min_lift)?;

    if itemsets.is_empty() {
        return Err(TrainingError::NoFrequentItemsets {
            min_support: itemsets.min_support(),
            transactions: itemsets.transaction_count(),
        });
    }

    let mut rules = Vec::new();

    for itemset in itemsets.iter().filter(|set| set.len() >= 2) {
        let n = itemset.len();
        if n > MAX_RULE_ITEMSET_LEN {
            return Err(TrainingError::ItemsetTooLarge(n));
        }

        // Skip the empty mask and the full mask
        for mask in 1..(1u64 << n) - 1 {
            let (antecedent, consequent): (Vec<_>, Vec<_>) = itemset
                .items
                .iter()
                .enumerate()
                .partition(|(i, _)| mask & (1u64 << *i) != 0);
            let antecedent: Vec<ItemId> = antecedent.into_iter().map(|(_, id)| id.clone()).collect();
            let consequent: Vec<ItemId> = consequent.into_iter().map(|(_, id)| id.clone()).collect();

            let antecedent_support = lookup_support(itemsets, &antecedent)?;
            let confidence = itemset.support / antecedent_support;
            if confidence < min_confidence {
                continue;
            }

            let consequent_support = lookup_support(itemsets, &consequent)?;
            let lift = confidence / consequent_support;
            if lift < min_lift {
                continue;
            }

            rules.push(Rule {
                antecedent,
                consequent,
                support: itemset.support,
                confidence,
                lift,
            });
        }
    }

    rules.sort_by(rule_order);

    info!(
        "Generated {} association rules (min_confidence={}, min_lift={})",
        rules.len(),
        min_confidence,
        min_lift
    );

    Ok(rules)
}

fn lookup_support(itemsets: &FrequentItemsets, items: &[ItemId]) -> Result<f64, TrainingError> {
    itemsets.support_of(items).ok_or_else(|| {
        TrainingError::MissingSubset(items.iter().map(ToString::to_string).collect())
    })
}
