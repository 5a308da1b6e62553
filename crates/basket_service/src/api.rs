//! HTTP handlers and request/response bodies

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Html;
use axum::Json;
use basket_core::{HealthReport, Item, Recommendation};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::service::{self, RetrainOutcome, SharedState};

/// Default number of recommendations per request
pub const DEFAULT_TOP_N: usize = 5;

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductDto {
    pub sku: String,
    pub product_name: String,
}

impl From<Item> for ProductDto {
    fn from(item: Item) -> Self {
        Self {
            sku: item.id.to_string(),
            product_name: item.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<ProductDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CartRequest {
    pub cart_items: Vec<String>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationDto {
    pub sku: String,
    pub product_name: String,
    pub confidence: f64,
    pub lift: f64,
    pub support: f64,
}

impl From<Recommendation> for RecommendationDto {
    fn from(rec: Recommendation) -> Self {
        Self {
            sku: rec.item_id.to_string(),
            product_name: rec.display_name,
            confidence: rec.confidence,
            lift: rec.lift,
            support: rec.support,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<RecommendationDto>,
    pub cart_size: usize,
}

#[derive(Debug, Serialize)]
pub struct RetrainResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub outcome: RetrainOutcome,
}

pub async fn index(State(state): State<SharedState>) -> Html<String> {
    let products = state.model.products();
    let items: String = products
        .iter()
        .map(|item| {
            format!(
                "        <li><code>{}</code> {}</li>\n",
                escape_html(item.id.as_str()),
                escape_html(&item.name)
            )
        })
        .collect();

    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n    <title>Market Basket Recommendations</title>\n</head>\n<body>\n    <h1>Products</h1>\n    <ul>\n{}    </ul>\n    <p>{} products. POST a cart to <code>/api/recommendations</code>.</p>\n</body>\n</html>\n",
        items,
        products.len()
    ))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub async fn products(State(state): State<SharedState>) -> Json<ProductsResponse> {
    let products = state.model.products().into_iter().map(ProductDto::from).collect();
    Json(ProductsResponse { products })
}

pub async fn product(
    State(state): State<SharedState>,
    Path(sku): Path<String>,
) -> Result<Json<ProductDto>, ServiceError> {
    let item = state.model.product(&sku)?;
    Ok(Json(item.into()))
}

pub async fn recommendations(
    State(state): State<SharedState>,
    payload: Result<Json<CartRequest>, JsonRejection>,
) -> Result<Json<RecommendationResponse>, ServiceError> {
    let Json(request) = payload.map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;

    let recommendations = state
        .model
        .recommend(&request.cart_items, request.top_n)
        .into_iter()
        .map(RecommendationDto::from)
        .collect();

    Ok(Json(RecommendationResponse {
        recommendations,
        cart_size: request.cart_items.len(),
    }))
}

pub async fn health(State(state): State<SharedState>) -> Json<HealthReport> {
    Json(state.model.health())
}

pub async fn retrain(State(state): State<SharedState>) -> Result<Json<RetrainResponse>, ServiceError> {
    let outcome = service::retrain(&state).await?;
    Ok(Json(RetrainResponse {
        status: "retrained",
        outcome,
    }))
}
