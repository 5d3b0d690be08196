//! Private relay access (Flashbots-style JSON-RPC)

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Bytes;
use ethers::utils::keccak256;
use flashroute_models::RelayFailure;
use serde::Serialize;
use serde_json::{json, Value};

pub const SIGNATURE_HEADER: &str = "X-Flashbots-Signature";

/// Signed transactions that must land together in `target_block`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBundle {
    pub transactions: Vec<Bytes>,
    pub target_block: u64,
}

/// What a successful dry-run reported
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationReport {
    pub bundle_hash: Option<String>,
    pub total_gas_used: Option<u64>,
}

#[async_trait]
pub trait Relay: Send + Sync {
    /// Dry-run the bundle at its target block
    async fn simulate(&self, bundle: &SignedBundle) -> Result<SimulationReport, RelayFailure>;

    /// Submit for inclusion; `Ok` only means the relay accepted it for consideration
    async fn send(&self, bundle: &SignedBundle) -> Result<Option<String>, RelayFailure>;
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

fn block_tag(block: u64) -> String {
    format!("0x{:x}", block)
}

pub fn call_bundle_params(bundle: &SignedBundle) -> Value {
    json!({
        "txs": bundle.transactions,
        "blockNumber": block_tag(bundle.target_block),
        "stateBlockNumber": "latest",
    })
}

pub fn send_bundle_params(bundle: &SignedBundle) -> Value {
    json!({
        "txs": bundle.transactions,
        "blockNumber": block_tag(bundle.target_block),
    })
}

fn rpc_error(response: &Value) -> Option<String> {
    let error = response.get("error")?;
    Some(
        error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    )
}

/// Interpret an `eth_callBundle` response
///
/// A top-level error or any per-transaction error or revert fails the
/// simulation.
pub fn parse_call_bundle(response: &Value) -> Result<SimulationReport, RelayFailure> {
    if let Some(message) = rpc_error(response) {
        return Err(RelayFailure::simulation(message));
    }

    let result = response
        .get("result")
        .ok_or_else(|| RelayFailure::simulation("response carries neither result nor error"))?;

    if let Some(results) = result.get("results").and_then(Value::as_array) {
        for tx in results {
            let failure = ["error", "revert"]
                .iter()
                .filter_map(|key| tx.get(*key))
                .find(|v| !v.is_null());
            if let Some(reason) = failure {
                let hash = tx.get("txHash").and_then(Value::as_str).unwrap_or("unknown");
                let reason = reason
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| reason.to_string());
                return Err(RelayFailure::simulation(format!("tx {}: {}", hash, reason)));
            }
        }
    }

    Ok(SimulationReport {
        bundle_hash: result.get("bundleHash").and_then(Value::as_str).map(str::to_string),
        total_gas_used: result.get("totalGasUsed").and_then(Value::as_u64),
    })
}

/// Interpret an `eth_sendBundle` response, returning the bundle hash if any
pub fn parse_send_bundle(response: &Value) -> Result<Option<String>, RelayFailure> {
    if let Some(message) = rpc_error(response) {
        return Err(RelayFailure::relay(message));
    }

    Ok(response
        .get("result")
        .and_then(|r| r.get("bundleHash"))
        .and_then(Value::as_str)
        .map(str::to_string))
}

/// Flashbots relay client
///
/// Every request body is signed by a reputation key distinct from the
/// wallet that signs the transactions.
pub struct FlashbotsRelay {
    client: reqwest::Client,
    url: String,
    signer: LocalWallet,
}

impl FlashbotsRelay {
    pub fn new(url: &str, signer: LocalWallet) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            signer,
        }
    }

    /// `X-Flashbots-Signature` value for a request body
    pub async fn sign_body(&self, body: &str) -> Result<String, String> {
        let digest = format!("0x{}", hex::encode(keccak256(body.as_bytes())));
        let signature = self
            .signer
            .sign_message(digest)
            .await
            .map_err(|e| format!("Failed to sign relay request: {}", e))?;

        Ok(format!("{:?}:0x{}", self.signer.address(), hex::encode(signature.to_vec())))
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, String> {
        let body = serde_json::to_string(&JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params: vec![params],
        })
        .map_err(|e| e.to_string())?;

        let signature = self.sign_body(&body).await?;

        tracing::debug!("Relay call {} to {}", method, self.url);

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .map_err(|e| format!("{} request failed: {}", method, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| format!("Failed to read {} response: {}", method, e))?;

        serde_json::from_str(&text).map_err(|_| format!("{} returned {}: {}", method, status, text))
    }
}

#[async_trait]
impl Relay for FlashbotsRelay {
    async fn simulate(&self, bundle: &SignedBundle) -> Result<SimulationReport, RelayFailure> {
        let response = self
            .call("eth_callBundle", call_bundle_params(bundle))
            .await
            .map_err(RelayFailure::simulation)?;
        parse_call_bundle(&response)
    }

    async fn send(&self, bundle: &SignedBundle) -> Result<Option<String>, RelayFailure> {
        let response = self
            .call("eth_sendBundle", send_bundle_params(bundle))
            .await
            .map_err(RelayFailure::relay)?;
        parse_send_bundle(&response)
    }
}
