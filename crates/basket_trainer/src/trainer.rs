//! Training pipeline: rows -> corpus -> frequent itemsets -> rules -> model

use basket_core::{
    generate_rules, load, Catalog, FrequentItemsets, Miner, Model, RawRow, TrainingError,
    TrainingParams, TransactionSet,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::errors::TrainerError;

/// Support threshold retried when the requested one finds no pairs
pub const DEFAULT_FALLBACK_MIN_SUPPORT: f64 = 0.02;

/// Training configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub params: TrainingParams,
    /// Lower support retried once when no itemset of two or more items survives
    pub fallback_min_support: Option<f64>,
    pub max_itemset_len: Option<usize>,
    pub parallel: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            params: TrainingParams::default(),
            fallback_min_support: Some(DEFAULT_FALLBACK_MIN_SUPPORT),
            max_itemset_len: None,
            parallel: true,
        }
    }
}

impl TrainingConfig {
    /// Check the thresholds and the fallback support.
    pub fn validate(&self) -> Result<(), TrainingError> {
        self.params.validate()?;
        if let Some(fallback) = self.fallback_min_support {
            TrainingParams {
                min_support: fallback,
                ..self.params
            }
            .validate()?;
        }
        Ok(())
    }
}

/// Summary of a training run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub transaction_count: usize,
    pub product_count: usize,
    pub itemset_count: usize,
    pub rule_count: usize,
    /// Support threshold the rules were mined at
    pub effective_min_support: f64,
    pub used_fallback: bool,
}

/// Association-rule trainer
#[derive(Debug)]
pub struct BasketTrainer {
    config: TrainingConfig,
    cancel: Arc<AtomicBool>,
}

impl BasketTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Setting this flag aborts mining at the next level boundary
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn train_dataset(&self, dataset: &Dataset) -> Result<(Model, TrainingReport), TrainerError> {
        self.train_rows(dataset.rows().iter().cloned())
    }

    pub fn train_rows<I>(&self, rows: I) -> Result<(Model, TrainingReport), TrainerError>
    where
        I: IntoIterator<Item = RawRow>,
    {
        // Reject bad thresholds before touching the data
        self.config.validate()?;

        let (transactions, catalog) = load(rows)?;
        self.train(&transactions, catalog)
    }

    /// Train on an already loaded corpus
    pub fn train(
        &self,
        transactions: &TransactionSet,
        catalog: Catalog,
    ) -> Result<(Model, TrainingReport), TrainerError> {
        let params = self.config.params;
        params.validate()?;

        info!(
            "Mining frequent itemsets (min_support={}, transactions={})",
            params.min_support,
            transactions.len()
        );
        let mut effective_min_support = params.min_support;
        let mut used_fallback = false;
        let mut itemsets = self.mine(transactions, params.min_support)?;

        if itemsets.multi_item_count() == 0 {
            match self.config.fallback_min_support {
                Some(fallback) if fallback < params.min_support => {
                    warn!(
                        "No frequent itemsets of two or more items at min_support={}, retrying with {}",
                        params.min_support, fallback
                    );
                    itemsets = self.mine(transactions, fallback)?;
                    effective_min_support = fallback;
                    used_fallback = true;
                }
                _ => {}
            }
        }
        info!("Found {} frequent itemsets", itemsets.len());

        let rules = generate_rules(&itemsets, params.min_confidence, params.min_lift)?;
        if rules.is_empty() {
            return Err(TrainingError::NoRules {
                min_confidence: params.min_confidence,
                min_lift: params.min_lift,
                itemsets: itemsets.len(),
                multi_item: itemsets.multi_item_count(),
            }
            .into());
        }

        let report = TrainingReport {
            transaction_count: transactions.len(),
            product_count: catalog.len(),
            itemset_count: itemsets.len(),
            rule_count: rules.len(),
            effective_min_support,
            used_fallback,
        };

        let effective = TrainingParams {
            min_support: effective_min_support,
            ..params
        };
        let model = Model::new(effective, catalog, rules)?;
        info!("Model training completed ({} rules, hash {})", report.rule_count, model.hash());

        Ok((model, report))
    }

    fn mine(&self, transactions: &TransactionSet, min_support: f64) -> Result<FrequentItemsets, TrainingError> {
        Miner::new(min_support)
            .with_max_len(self.config.max_itemset_len)
            .with_parallel(self.config.parallel)
            .with_cancel_flag(self.cancel_flag())
            .mine(transactions)
    }
}
