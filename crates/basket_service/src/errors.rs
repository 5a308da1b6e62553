use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use basket_core::{BasketError, CorruptModelError, NotFoundError, TrainingError};
use basket_trainer::TrainerError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by the recommendation service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Product not found")]
    NotFound(#[from] NotFoundError),

    #[error("{0}")]
    BadRequest(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Trainer(#[from] TrainerError),

    #[error(transparent)]
    Model(#[from] BasketError),

    #[error("background task failed: {0}")]
    Task(String),
}

impl From<CorruptModelError> for ServiceError {
    fn from(err: CorruptModelError) -> Self {
        ServiceError::Model(err.into())
    }
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::BadRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            // Thresholds or data that yield no usable model
            ServiceError::Trainer(TrainerError::Training(TrainingError::NoRules { .. }))
            | ServiceError::Trainer(TrainerError::Training(TrainingError::NoFrequentItemsets {
                ..
            }))
            | ServiceError::Trainer(TrainerError::Dataset(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {}", self);
        }
        let payload = Json(ErrorResponse {
            detail: self.to_string(),
        });
        (status, payload).into_response()
    }
}
