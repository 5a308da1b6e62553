//! Common data structures shared by the mining and matching stages

use crate::errors::TrainingError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque product identifier (SKU).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Catalog entry: identifier plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The three thresholds a model was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    pub min_support: f64,
    pub min_confidence: f64,
    pub min_lift: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            min_support: 0.05,
            min_confidence: 0.3,
            min_lift: 1.0,
        }
    }
}

impl TrainingParams {
    pub fn new(min_support: f64, min_confidence: f64, min_lift: f64) -> Self {
        Self {
            min_support,
            min_confidence,
            min_lift,
        }
    }

    /// Check every threshold against its admissible range
    pub fn validate(&self) -> Result<(), TrainingError> {
        validate_support(self.min_support)?;
        validate_confidence(self.min_confidence)?;
        validate_lift(self.min_lift)
    }
}

/// Support thresholds live in (0, 1].
pub(crate) fn validate_support(value: f64) -> Result<(), TrainingError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(TrainingError::InvalidThreshold {
            name: "min_support",
            value,
            reason: "must be in (0, 1]",
        })
    }
}

pub(crate) fn validate_confidence(value: f64) -> Result<(), TrainingError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TrainingError::InvalidThreshold {
            name: "min_confidence",
            value,
            reason: "must be in [0, 1]",
        })
    }
}

pub(crate) fn validate_lift(value: f64) -> Result<(), TrainingError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TrainingError::InvalidThreshold {
            name: "min_lift",
            value,
            reason: "must be finite and non-negative",
        })
    }
}
