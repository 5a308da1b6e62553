//! Cart-to-rule matching
//!
//! Pure read-only query over a rule set and catalog. Safe to call from any
//! number of threads against shared, immutable inputs.

use crate::rules::Rule;
use crate::store::Catalog;
use crate::types::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A ranked product suggestion for a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub display_name: String,
    pub confidence: f64,
    pub lift: f64,
    pub support: f64,
}

/// Best proposal for one item during a single matching call.
#[derive(Debug, Clone, Copy)]
struct RecommendationCandidate<'r> {
    item: &'r ItemId,
    confidence: f64,
    lift: f64,
    support: f64,
}

/// Recommend up to `top_n` items for `cart_items`.
///
/// `rules` is expected in stored order (see [`crate::rules::rule_order`]).
/// An item proposed by several rules keeps the first proposal unless a later
/// one has strictly higher confidence; its position stays where it was
/// first proposed. Items without a catalog entry are dropped after ranking.
pub fn recommend<S: AsRef<str>>(
    cart_items: &[S],
    rules: &[Rule],
    catalog: &Catalog,
    top_n: usize,
) -> Vec<Recommendation> {
    if cart_items.is_empty() || rules.is_empty() || top_n == 0 {
        return Vec::new();
    }

    let cart: HashSet<&str> = cart_items.iter().map(AsRef::as_ref).collect();
    let mut candidates: Vec<RecommendationCandidate<'_>> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for rule in rules.iter().filter(|rule| rule.applies_to(&cart)) {
        for item in &rule.consequent {
            if cart.contains(item.as_str()) {
                continue;
            }

            let proposal = RecommendationCandidate {
                item,
                confidence: rule.confidence,
                lift: rule.lift,
                support: rule.support,
            };

            match positions.get(item.as_str()) {
                Some(&pos) => {
                    if proposal.confidence > candidates[pos].confidence {
                        candidates[pos] = proposal;
                    }
                }
                None => {
                    positions.insert(item.as_str(), candidates.len());
                    candidates.push(proposal);
                }
            }
        }
    }

    // Stable sort: equal scores keep first-proposed order
    candidates.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.lift.total_cmp(&a.lift))
    });
    candidates.truncate(top_n);

    candidates
        .into_iter()
        .filter_map(|candidate| match catalog.get(candidate.item.as_str()) {
            Some(entry) => Some(Recommendation {
                item_id: candidate.item.clone(),
                display_name: entry.name.clone(),
                confidence: candidate.confidence,
                lift: candidate.lift,
                support: candidate.support,
            }),
            None => {
                debug!("dropping recommendation {}: not in catalog", candidate.item);
                None
            }
        })
        .collect()
}
