use std::future::Future;
use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiError;
use super::state::AppState;
use crate::application::BubbleLayout;
use crate::domain::chart::ChartPoint;
use crate::domain::token::{SizeMetric, Token};
use crate::ports::market_data::{MarketDataError, TokenQuery, DEFAULT_SORT};
use crate::ports::swap::SwapParams;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/tokens/prices", get(token_prices))
        .route("/api/token/price", get(swap_price))
        .route("/api/token/quote", get(swap_quote))
        .route("/api/token/chart", get(token_chart))
        .route("/api/bubbles", get(bubbles))
        .route("/api/webhook", post(webhook))
        .route("/api/notifications/status", get(notification_status))
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves
pub async fn serve<F>(addr: SocketAddr, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown).await
}

#[derive(Debug, Deserialize)]
struct TokensParams {
    page: Option<u32>,
    sort: Option<String>,
}

async fn token_prices(
    State(state): State<AppState>,
    Query(params): Query<TokensParams>,
) -> Result<Json<Vec<Token>>, ApiError> {
    let query = TokenQuery {
        page: params.page.unwrap_or(1),
        sort: params.sort.filter(|s| !s.is_empty()).unwrap_or_else(|| DEFAULT_SORT.to_string()),
    };

    state.bubbles.tokens(&query).await.map(Json).map_err(|e| {
        tracing::error!("Error fetching from GeckoTerminal: {}", e);
        ApiError::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch token data")
    })
}

async fn swap_price(
    State(state): State<AppState>,
    Query(params): Query<SwapParams>,
) -> Result<Json<Value>, ApiError> {
    state
        .swap
        .get_price(&params)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_swap(e, "Failed to fetch price"))
}

async fn swap_quote(
    State(state): State<AppState>,
    Query(params): Query<SwapParams>,
) -> Result<Json<Value>, ApiError> {
    state
        .swap
        .get_quote(&params)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_swap(e, "Failed to fetch quote"))
}

#[derive(Debug, Deserialize)]
struct ChartParams {
    address: Option<String>,
    network: Option<String>,
}

async fn token_chart(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Vec<ChartPoint>>, ApiError> {
    let Some(address) = params.address.filter(|a| !a.is_empty()) else {
        return Err(ApiError::error(StatusCode::BAD_REQUEST, "Missing address"));
    };
    let network = params.network.unwrap_or_else(|| "base".to_string());

    match state.bubbles.chart(&address, &network).await {
        Ok(points) => Ok(Json(points)),
        Err(MarketDataError::NoPools(_)) => Err(ApiError::error(StatusCode::NOT_FOUND, "No pools found for token")),
        Err(e) => {
            tracing::error!("Chart fetch failed for {}: {}", address, e);
            Err(ApiError::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch chart data"))
        }
    }
}

#[derive(Debug, Deserialize)]
struct BubblesParams {
    metric: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
}

async fn bubbles(
    State(state): State<AppState>,
    Query(params): Query<BubblesParams>,
) -> Result<Json<BubbleLayout>, ApiError> {
    let metric = match params.metric.as_deref() {
        Some(raw) => raw
            .parse::<SizeMetric>()
            .map_err(|e| ApiError::error(StatusCode::BAD_REQUEST, &e.to_string()))?,
        None => state.metric,
    };
    let width = params.width.unwrap_or(state.viewport.0);
    let height = params.height.unwrap_or(state.viewport.1);
    if !(width > 0.0 && height > 0.0) {
        return Err(ApiError::error(StatusCode::BAD_REQUEST, "Viewport must be positive"));
    }

    let tokens = state.bubbles.bubble_tokens().await.map_err(|e| {
        tracing::error!("Bubble token fetch failed: {}", e);
        ApiError::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch token data")
    })?;

    let layout = state.bubbles.layout(&tokens, metric, width, height, &mut rand::thread_rng());
    Ok(Json(layout))
}

async fn webhook(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let started = std::time::Instant::now();
    let body: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("Webhook body is not JSON: {}", e);
        ApiError::error(StatusCode::BAD_REQUEST, "Invalid request data")
    })?;

    match state.notifications.handle_webhook(&body).await {
        Ok(outcome) => {
            tracing::info!("Webhook processed in {:?}: {:?}", started.elapsed(), outcome);
            Ok(Json(json!({ "success": true })))
        }
        Err(e) => {
            tracing::error!("Error processing webhook: {}", e);
            Err(e.into())
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatusParams {
    fid: Option<String>,
}

async fn notification_status(
    State(state): State<AppState>,
    Query(params): Query<StatusParams>,
) -> Result<Json<Value>, ApiError> {
    let Some(raw) = params.fid.filter(|f| !f.is_empty()) else {
        return Err(ApiError::message(StatusCode::BAD_REQUEST, "Missing fid"));
    };
    let fid: u64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::message(StatusCode::BAD_REQUEST, "Invalid fid"))?;

    let enabled = state.notifications.is_enabled(fid).await.map_err(|e| {
        tracing::error!("Error in notification status: {}", e);
        ApiError::message(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
    })?;

    Ok(Json(json!({ "enabled": enabled })))
}
