//! Installed model and the swappable handle shared by readers

use crate::errors::{CorruptModelError, NotFoundError};
use crate::matcher::{recommend, Recommendation};
use crate::rules::Rule;
use crate::snapshot::{self, ModelSnapshot};
use crate::store::Catalog;
use crate::types::{Item, TrainingParams};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// A trained rule set together with its catalog and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    params: TrainingParams,
    catalog: Catalog,
    rules: Vec<Rule>,
    hash: String,
}

impl Model {
    pub fn new(
        params: TrainingParams,
        catalog: Catalog,
        rules: Vec<Rule>,
    ) -> Result<Self, CorruptModelError> {
        let hash = snapshot::payload_checksum(&rules, &catalog, &params)?;
        Ok(Self {
            params,
            catalog,
            rules,
            hash,
        })
    }

    pub fn from_snapshot(snapshot: ModelSnapshot) -> Self {
        Self {
            params: snapshot.params,
            catalog: snapshot.catalog,
            rules: snapshot.rules,
            hash: snapshot.checksum,
        }
    }

    /// Encode as a snapshot blob
    pub fn to_blob(&self) -> Result<Vec<u8>, CorruptModelError> {
        snapshot::save(&self.rules, &self.catalog, &self.params)
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Payload checksum, stable across saves of the same model
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn recommend<S: AsRef<str>>(&self, cart_items: &[S], top_n: usize) -> Vec<Recommendation> {
        recommend(cart_items, &self.rules, &self.catalog, top_n)
    }
}

/// Overall service readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// No model installed yet
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub model_loaded: bool,
    pub total_products: usize,
    pub rule_count: usize,
    pub model_hash: Option<String>,
}

/// Cloneable handle to the currently installed model.
///
/// Readers take a cheap `Arc<Model>` clone and release the lock before
/// matching. `install` replaces the model in a single write.
#[derive(Debug, Clone, Default)]
pub struct ModelHandle {
    inner: Arc<RwLock<Option<Arc<Model>>>>,
}

impl ModelHandle {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(model: Model) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(Arc::new(model)))),
        }
    }

    pub fn current(&self) -> Option<Arc<Model>> {
        self.inner.read().clone()
    }

    /// Swap in `model`, returning the one it replaced.
    pub fn install(&self, model: Model) -> Option<Arc<Model>> {
        let model = Arc::new(model);
        info!(
            "Installing model {} ({} rules, {} products)",
            model.hash(),
            model.rules().len(),
            model.catalog().len()
        );
        self.inner.write().replace(model)
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Empty when no model is installed
    pub fn recommend<S: AsRef<str>>(&self, cart_items: &[S], top_n: usize) -> Vec<Recommendation> {
        match self.current() {
            Some(model) => model.recommend(cart_items, top_n),
            None => Vec::new(),
        }
    }

    pub fn products(&self) -> Vec<Item> {
        self.current()
            .map(|model| model.catalog().items().cloned().collect())
            .unwrap_or_default()
    }

    pub fn product(&self, id: &str) -> Result<Item, NotFoundError> {
        match self.current() {
            Some(model) => model.catalog().require(id).cloned(),
            None => Err(NotFoundError(id.to_string())),
        }
    }

    pub fn health(&self) -> HealthReport {
        match self.current() {
            Some(model) => HealthReport {
                status: HealthStatus::Healthy,
                model_loaded: true,
                total_products: model.catalog().len(),
                rule_count: model.rules().len(),
                model_hash: Some(model.hash().to_string()),
            },
            None => HealthReport {
                status: HealthStatus::Degraded,
                model_loaded: false,
                total_products: 0,
                rule_count: 0,
                model_hash: None,
            },
        }
    }
}
