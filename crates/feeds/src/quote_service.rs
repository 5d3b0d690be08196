//! Mock 1inch-style quote service

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Behaviour of the mock quote service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteServiceConfig {
    /// `dstAmount` for pairs without an override
    pub default_dst_amount: String,
    /// Overrides keyed by `"{src}-{dst}"`, lowercase hex addresses
    #[serde(default)]
    pub dst_amounts: HashMap<String, String>,
    /// Pairs answered with HTTP 500
    #[serde(default)]
    pub failing_pairs: Vec<String>,
    /// How many `/swap` calls are answered with 429 before succeeding
    #[serde(default)]
    pub swap_rejections: u32,
    /// Bearer token to require, if any
    #[serde(default)]
    pub api_key: Option<String>,
    /// Router address put in swap transactions
    pub router: String,
}

impl Default for QuoteServiceConfig {
    fn default() -> Self {
        Self {
            default_dst_amount: "1000000000000000000".to_string(),
            dst_amounts: HashMap::new(),
            failing_pairs: vec![],
            swap_rejections: 0,
            api_key: None,
            router: "0x111111125421ca6dc452d289314280a0f8842a65".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct QuoteServiceState {
    pub config: RwLock<QuoteServiceConfig>,
    rejections_left: AtomicU32,
    requests: AtomicUsize,
}

impl QuoteServiceState {
    pub fn new(config: QuoteServiceConfig) -> Self {
        Self {
            rejections_left: AtomicU32::new(config.swap_rejections),
            config: RwLock::new(config),
            requests: AtomicUsize::new(0),
        }
    }

    /// Total requests served, including rejected ones
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub src: String,
    pub dst: String,
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct SwapQuery {
    pub src: String,
    pub dst: String,
    pub amount: String,
    pub from: String,
    #[serde(default)]
    pub slippage: Option<String>,
}

fn pair_key(src: &str, dst: &str) -> String {
    format!("{}-{}", src.to_lowercase(), dst.to_lowercase())
}

fn error(status: StatusCode, description: &str) -> Response {
    let body = json!({ "statusCode": status.as_u16(), "description": description });
    (status, Json(body)).into_response()
}

fn authorized(config: &QuoteServiceConfig, headers: &HeaderMap) -> bool {
    let Some(key) = &config.api_key else {
        return true;
    };
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", key))
        .unwrap_or(false)
}

fn dst_amount(config: &QuoteServiceConfig, src: &str, dst: &str) -> Result<String, Response> {
    let key = pair_key(src, dst);
    if config.failing_pairs.contains(&key) {
        return Err(error(StatusCode::INTERNAL_SERVER_ERROR, "insufficient liquidity"));
    }
    Ok(config
        .dst_amounts
        .get(&key)
        .cloned()
        .unwrap_or_else(|| config.default_dst_amount.clone()))
}

pub async fn get_quote(
    State(state): State<Arc<QuoteServiceState>>,
    headers: HeaderMap,
    Query(query): Query<QuoteQuery>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let config = state.config.read().await;

    if !authorized(&config, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    tracing::debug!("Quote {} -> {} for {}", query.src, query.dst, query.amount);

    match dst_amount(&config, &query.src, &query.dst) {
        Ok(amount) => Json(json!({ "dstAmount": amount })).into_response(),
        Err(response) => response,
    }
}

pub async fn get_swap(
    State(state): State<Arc<QuoteServiceState>>,
    headers: HeaderMap,
    Query(query): Query<SwapQuery>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let config = state.config.read().await;

    if !authorized(&config, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let rejected = state
        .rejections_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok();
    if rejected {
        tracing::debug!("Rejecting swap request with 429");
        return error(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests");
    }

    let amount = match dst_amount(&config, &query.src, &query.dst) {
        Ok(amount) => amount,
        Err(response) => return response,
    };

    Json(json!({
        "dstAmount": amount,
        "tx": {
            "from": query.from,
            "to": config.router,
            "data": "0x12aa3caf",
            "value": "0",
            "gas": 0,
            "gasPrice": "0"
        },
        "slippage": query.slippage
    }))
    .into_response()
}

/// Router serving `/quote` and `/swap`
pub fn quote_router(state: Arc<QuoteServiceState>) -> Router {
    Router::new()
        .route("/quote", get(get_quote))
        .route("/swap", get(get_swap))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
