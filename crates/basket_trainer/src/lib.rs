//! Basket Trainer - offline association-rule trainer
//!
//! Reads a transaction CSV, mines frequent itemsets and rules, and packages
//! the result as a model ready for snapshotting or installation.

pub mod dataset;
pub mod errors;
pub mod trainer;

use basket_core::Model;
use std::path::Path;

pub use dataset::{Dataset, TRANSACTION_COLUMNS};
pub use errors::TrainerError;
pub use trainer::{BasketTrainer, TrainingConfig, TrainingReport, DEFAULT_FALLBACK_MIN_SUPPORT};

/// Train a model directly from a CSV file using the provided configuration.
pub fn train_model_from_csv(
    path: &Path,
    config: TrainingConfig,
) -> Result<(Model, TrainingReport), TrainerError> {
    let dataset = Dataset::from_csv(path)?;
    BasketTrainer::new(config).train_dataset(&dataset)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
