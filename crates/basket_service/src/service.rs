//! Model lifecycle: startup load-or-train and explicit retraining

use basket_core::{snapshot, Model, ModelHandle};
use basket_trainer::{train_model_from_csv, TrainingReport};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::errors::ServiceError;

/// State shared by every request handler
#[derive(Debug)]
pub struct AppState {
    pub config: ServiceConfig,
    pub model: ModelHandle,
    retrain_lock: Arc<Mutex<()>>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: ServiceConfig, model: ModelHandle) -> SharedState {
        Arc::new(Self {
            config,
            model,
            retrain_lock: Arc::new(Mutex::new(())),
        })
    }
}

/// Outcome of a successful retrain
#[derive(Debug, Clone, Serialize)]
pub struct RetrainOutcome {
    pub model_hash: String,
    pub report: TrainingReport,
}

/// Load the persisted model, or train from the CSV and persist it when
/// no model file exists yet.
pub fn bootstrap(config: &ServiceConfig) -> Result<ModelHandle, ServiceError> {
    if config.model_path.exists() {
        let snapshot = snapshot::read_file(&config.model_path)?;
        info!("Model loaded from {}", config.model_path.display());
        return Ok(ModelHandle::new(Model::from_snapshot(snapshot)));
    }

    warn!(
        "Model not found at {}, training from {}",
        config.model_path.display(),
        config.data_path.display()
    );
    let model = train_and_persist(config)?.0;
    Ok(ModelHandle::new(model))
}

fn train_and_persist(config: &ServiceConfig) -> Result<(Model, TrainingReport), ServiceError> {
    let (model, report) = train_model_from_csv(&config.data_path, config.training.clone())?;
    let blob = model.to_blob()?;
    snapshot::write_file(&config.model_path, &blob)?;
    info!(
        "Model trained and saved to {} ({} rules)",
        config.model_path.display(),
        report.rule_count
    );
    Ok((model, report))
}

/// Retrain from the configured CSV, persist, then swap the installed model.
///
/// Concurrent calls run one at a time. The work runs in its own task that
/// holds the lock through persist and install, so dropping the returned
/// future does not split the two. On any failure the installed model and
/// the file on disk are left as they were.
pub async fn retrain(state: &SharedState) -> Result<RetrainOutcome, ServiceError> {
    let guard = Arc::clone(&state.retrain_lock).lock_owned().await;
    let state = Arc::clone(state);

    let task = tokio::spawn(async move {
        let _guard = guard;
        info!("Retraining from {}", state.config.data_path.display());

        let config = state.config.clone();
        let (model, report) = tokio::task::spawn_blocking(move || train_and_persist(&config))
            .await
            .map_err(|e| ServiceError::Task(e.to_string()))??;

        let model_hash = model.hash().to_string();
        state.model.install(model);
        Ok::<_, ServiceError>(RetrainOutcome { model_hash, report })
    });

    task.await.map_err(|e| ServiceError::Task(e.to_string()))?
}
