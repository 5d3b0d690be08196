//! Mock private relay and chain RPC
//!
//! Answers the bundle methods a Flashbots relay exposes plus the handful of
//! chain reads the submitter needs, so one mock can stand in for both.

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;

/// Behaviour of the mock relay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Head block reported by `eth_blockNumber`
    pub block_number: u64,
    /// Top-level error for `eth_callBundle`
    #[serde(default)]
    pub simulation_error: Option<String>,
    /// Per-transaction revert reported by `eth_callBundle`
    #[serde(default)]
    pub revert: Option<String>,
    /// Top-level error for `eth_sendBundle`
    #[serde(default)]
    pub send_error: Option<String>,
}

/// One JSON-RPC call as received
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub params: Value,
    pub signature: Option<String>,
}

#[derive(Debug)]
pub struct RelayState {
    pub config: RwLock<RelayConfig>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RelayState {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config: RwLock::new(config),
            calls: Mutex::new(vec![]),
        }
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    /// Methods received, in order
    pub async fn methods(&self) -> Vec<String> {
        self.calls.lock().await.iter().map(|c| c.method.clone()).collect()
    }
}

fn rpc_result(id: &Value, result: Value) -> Json<Value> {
    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

fn rpc_error(id: &Value, code: i64, message: &str) -> Json<Value> {
    Json(json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } }))
}

fn bundle_hash(seed: usize) -> String {
    format!("0x{:064x}", seed)
}

pub async fn handle_rpc(
    State(state): State<Arc<RelayState>>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> Json<Value> {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request.get("method").and_then(Value::as_str).unwrap_or_default().to_string();
    let params = request.get("params").cloned().unwrap_or(Value::Null);
    let signature = headers
        .get("X-Flashbots-Signature")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let seq = {
        let mut calls = state.calls.lock().await;
        calls.push(RecordedCall {
            method: method.clone(),
            params: params.clone(),
            signature,
        });
        calls.len()
    };

    let config = state.config.read().await;
    tracing::debug!("Relay received {}", method);

    match method.as_str() {
        "eth_chainId" => rpc_result(&id, json!("0x1")),
        "eth_blockNumber" => rpc_result(&id, json!(format!("0x{:x}", config.block_number))),
        "eth_getTransactionCount" => rpc_result(&id, json!("0x0")),
        "eth_callBundle" => {
            if let Some(message) = &config.simulation_error {
                return rpc_error(&id, -32000, message);
            }
            let txs = params
                .get(0)
                .and_then(|p| p.get("txs"))
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let results: Vec<Value> = txs
                .iter()
                .enumerate()
                .map(|(i, _)| match &config.revert {
                    Some(reason) => json!({
                        "txHash": bundle_hash(i + 1),
                        "gasUsed": 0,
                        "error": "execution reverted",
                        "revert": reason
                    }),
                    None => json!({
                        "txHash": bundle_hash(i + 1),
                        "gasUsed": 21000,
                        "value": "0x"
                    }),
                })
                .collect();
            rpc_result(
                &id,
                json!({
                    "bundleHash": bundle_hash(seq),
                    "totalGasUsed": 21000 * results.len(),
                    "results": results
                }),
            )
        }
        "eth_sendBundle" => match &config.send_error {
            Some(message) => rpc_error(&id, -32000, message),
            None => rpc_result(&id, json!({ "bundleHash": bundle_hash(seq) })),
        },
        other => rpc_error(&id, -32601, &format!("method {} not supported", other)),
    }
}

/// Router serving JSON-RPC on `/`
pub fn relay_router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/", post(handle_rpc))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
