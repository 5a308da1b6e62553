use basket_core::{
    generate_rules, load, recommend, snapshot, Catalog, FrequentItemsets, ItemId, Miner, RawRow,
    Rule, TrainingParams, TransactionSet,
};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};

// Property-based checks for mining, rule generation and matching.
// Small alphabets keep itemsets dense enough for multi-item rules.

const ALPHABET: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

fn arbitrary_baskets() -> impl Strategy<Value = Vec<BTreeSet<&'static str>>> {
    prop::collection::vec(
        prop::collection::btree_set(prop::sample::select(ALPHABET.to_vec()), 1..=5),
        1..30,
    )
}

fn arbitrary_cart() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(ALPHABET.to_vec()), 0..4)
}

fn corpus(baskets: &[BTreeSet<&'static str>]) -> (TransactionSet, Catalog) {
    let rows = baskets.iter().enumerate().flat_map(|(t, basket)| {
        basket
            .iter()
            .map(move |id| RawRow::new(format!("T{:03}", t), *id, format!("Product {}", id)))
    });
    load(rows).expect("generated rows are valid")
}

fn brute_force_count(baskets: &[BTreeSet<&'static str>], items: &[ItemId]) -> u64 {
    baskets
        .iter()
        .filter(|basket| items.iter().all(|id| basket.contains(id.as_str())))
        .count() as u64
}

fn rule_keys(rules: &[Rule]) -> HashSet<(Vec<ItemId>, Vec<ItemId>)> {
    rules
        .iter()
        .map(|r| (r.antecedent.clone(), r.consequent.clone()))
        .collect()
}

fn rules_or_empty(itemsets: &FrequentItemsets, confidence: f64, lift: f64) -> Vec<Rule> {
    if itemsets.is_empty() {
        return Vec::new();
    }
    generate_rules(itemsets, confidence, lift).expect("valid thresholds")
}

proptest! {
    #[test]
    fn frequent_itemsets_are_antimonotone_and_exact(
        baskets in arbitrary_baskets(),
        min_support in 0.05f64..0.8,
    ) {
        let (transactions, _) = corpus(&baskets);
        let itemsets = Miner::new(min_support).mine(&transactions).unwrap();

        for set in itemsets.iter() {
            prop_assert_eq!(set.count, brute_force_count(&baskets, &set.items));
            prop_assert!(set.support >= min_support);

            if set.len() >= 2 {
                for skip in 0..set.len() {
                    let subset: Vec<ItemId> = set
                        .items
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != skip)
                        .map(|(_, id)| id.clone())
                        .collect();
                    let parent = itemsets.get(&subset);
                    prop_assert!(parent.is_some(), "missing subset {:?}", subset);
                    prop_assert!(parent.unwrap().count >= set.count);
                }
            }
        }
    }

    #[test]
    fn parallel_mining_matches_sequential(
        baskets in arbitrary_baskets(),
        min_support in 0.05f64..0.8,
    ) {
        let (transactions, _) = corpus(&baskets);
        let sequential = Miner::new(min_support).with_parallel(false).mine(&transactions).unwrap();
        let parallel = Miner::new(min_support).with_parallel(true).mine(&transactions).unwrap();

        prop_assert_eq!(sequential.as_slice(), parallel.as_slice());
    }

    #[test]
    fn raising_min_support_only_removes_itemsets(
        baskets in arbitrary_baskets(),
        low in 0.05f64..0.4,
        delta in 0.0f64..0.4,
    ) {
        let (transactions, _) = corpus(&baskets);
        let loose = Miner::new(low).mine(&transactions).unwrap();
        let strict = Miner::new(low + delta).mine(&transactions).unwrap();

        for set in strict.iter() {
            prop_assert!(loose.get(&set.items).is_some());
        }
    }

    #[test]
    fn rules_are_valid(baskets in arbitrary_baskets(), min_support in 0.05f64..0.5) {
        let (transactions, _) = corpus(&baskets);
        let itemsets = Miner::new(min_support).mine(&transactions).unwrap();
        let rules = rules_or_empty(&itemsets, 0.0, 0.0);

        for rule in &rules {
            prop_assert!(!rule.antecedent.is_empty() && !rule.consequent.is_empty());
            prop_assert!(rule.antecedent.iter().all(|id| !rule.consequent.contains(id)));

            let mut union: Vec<ItemId> =
                rule.antecedent.iter().chain(&rule.consequent).cloned().collect();
            union.sort();
            let union_support = itemsets.support_of(&union).unwrap();
            let ante_support = itemsets.support_of(&rule.antecedent).unwrap();
            let cons_support = itemsets.support_of(&rule.consequent).unwrap();

            prop_assert_eq!(rule.support, union_support);
            prop_assert!((rule.confidence - union_support / ante_support).abs() < 1e-12);
            prop_assert!((rule.lift - rule.confidence / cons_support).abs() < 1e-12);
        }
    }

    #[test]
    fn raising_thresholds_only_removes_rules(
        baskets in arbitrary_baskets(),
        confidence in 0.0f64..0.6,
        confidence_step in 0.0f64..0.4,
        lift in 0.0f64..1.5,
        lift_step in 0.0f64..1.0,
    ) {
        let (transactions, _) = corpus(&baskets);
        let itemsets = Miner::new(0.1).mine(&transactions).unwrap();

        let loose = rule_keys(&rules_or_empty(&itemsets, confidence, lift));
        let strict_confidence = rule_keys(&rules_or_empty(&itemsets, confidence + confidence_step, lift));
        let strict_lift = rule_keys(&rules_or_empty(&itemsets, confidence, lift + lift_step));

        prop_assert!(strict_confidence.is_subset(&loose));
        prop_assert!(strict_lift.is_subset(&loose));
    }

    #[test]
    fn recommendations_exclude_cart_and_are_deterministic(
        baskets in arbitrary_baskets(),
        cart in arbitrary_cart(),
        top_n in 0usize..8,
    ) {
        let (transactions, catalog) = corpus(&baskets);
        let itemsets = Miner::new(0.1).mine(&transactions).unwrap();
        let rules = rules_or_empty(&itemsets, 0.0, 0.0);

        let first = recommend(&cart, &rules, &catalog, top_n);
        prop_assert!(first.len() <= top_n);
        for rec in &first {
            prop_assert!(!cart.contains(&rec.item_id.as_str()));
        }
        let unique: HashSet<&str> = first.iter().map(|r| r.item_id.as_str()).collect();
        prop_assert_eq!(unique.len(), first.len());

        prop_assert_eq!(recommend(&cart, &rules, &catalog, top_n), first);
    }

    #[test]
    fn snapshot_round_trip_is_exact(baskets in arbitrary_baskets()) {
        let (transactions, catalog) = corpus(&baskets);
        let itemsets = Miner::new(0.1).mine(&transactions).unwrap();
        let rules = rules_or_empty(&itemsets, 0.0, 0.0);
        let params = TrainingParams::new(0.1, 0.0, 0.0);

        let blob = snapshot::save(&rules, &catalog, &params).unwrap();
        let loaded = snapshot::load(&blob).unwrap();

        prop_assert_eq!(&loaded.catalog, &catalog);
        prop_assert_eq!(loaded.params, params);
        prop_assert_eq!(loaded.rules.len(), rules.len());
        for (a, b) in loaded.rules.iter().zip(&rules) {
            prop_assert_eq!(&a.antecedent, &b.antecedent);
            prop_assert_eq!(&a.consequent, &b.consequent);
            prop_assert_eq!(a.support.to_bits(), b.support.to_bits());
            prop_assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
            prop_assert_eq!(a.lift.to_bits(), b.lift.to_bits());
        }
    }
}
