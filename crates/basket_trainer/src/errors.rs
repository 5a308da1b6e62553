use basket_core::{BasketError, CorruptModelError, DataError, TrainingError};
use thiserror::Error;

/// Errors returned by the training pipeline.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("dataset error: {0}")]
    Dataset(#[from] DataError),

    #[error("training error: {0}")]
    Training(#[from] TrainingError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] CorruptModelError),

    #[error(transparent)]
    Model(#[from] BasketError),
}
