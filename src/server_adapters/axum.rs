//! Axum routes for the token-cost estimator
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use redguard::pricing::PricingEstimator;
//! use redguard::server_adapters::axum::pricing_router;
//!
//! let estimator = Arc::new(PricingEstimator::builtin()?.clone());
//! let app = pricing_router(estimator);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3006").await?;
//! axum::serve(listener, app).await?;
//! ```

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::pricing::{CostEstimate, PricingEstimator, PricingInfo};
use crate::types::TokenUsageEntry;

pub const ESTIMATE_PATH: &str = "/api/token-cost/estimate";
pub const PRICING_PATH: &str = "/api/token-cost/pricing";
pub const HEALTH_PATH: &str = "/health";

/// Router exposing estimate, pricing and health endpoints.
pub fn pricing_router(estimator: Arc<PricingEstimator>) -> Router {
    Router::new()
        .route(ESTIMATE_PATH, post(estimate))
        .route(PRICING_PATH, get(pricing))
        .route(HEALTH_PATH, get(health))
        .with_state(estimator)
}

async fn estimate(
    State(estimator): State<Arc<PricingEstimator>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CostEstimate>, Response> {
    let tokens = body
        .ok()
        .and_then(|Json(mut body)| body.get_mut("tokens").map(Value::take))
        .filter(Value::is_array)
        .ok_or_else(|| bad_request("tokens array is required"))?;

    let entries: Vec<TokenUsageEntry> = serde_json::from_value(tokens).map_err(|e| {
        tracing::debug!(target: "redguard::server", err=%e, "rejected token entries");
        bad_request(&format!("invalid token entry: {e}"))
    })?;

    let estimate = estimator.estimate(&entries);
    tracing::debug!(
        target: "redguard::server",
        entries = entries.len(),
        total = estimate.total_estimate_precise,
        "estimated token cost"
    );
    Ok(Json(estimate))
}

async fn pricing(State(estimator): State<Arc<PricingEstimator>>) -> Json<PricingInfo> {
    Json(estimator.pricing_info())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "token-cost" }))
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}
