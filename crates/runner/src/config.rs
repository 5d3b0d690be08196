//! Pipeline configuration and credentials

use anyhow::{Context, Result};
use ethers::types::U256;
use flashroute_bundle::TxParams;
use flashroute_quotes::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Token catalog, JSON keyed by symbol
    pub catalog_path: PathBuf,
    /// Directory holding circuit.json and both keys
    pub artifacts_dir: PathBuf,
    /// Append-only log of sent bundles
    pub results_log: PathBuf,
    /// Append-only log of failed runs
    pub errors_log: PathBuf,
    /// Quote service base URL
    pub quote_api_url: String,
    /// Ethereum JSON-RPC URL
    pub rpc_url: String,
    /// Private relay URL
    pub relay_url: String,
    pub chain_id: u64,
    /// Flash-loan contract
    pub contract_address: String,
    /// Catalog symbol of the flash-loaned token
    pub loan_token: String,
    /// Loan amount in whole tokens
    pub loan_amount: String,
    pub routing_width: usize,
    pub sample_size: usize,
    /// Minimum spacing between quote calls
    pub rate_limit_ms: u64,
    /// Swap-data attempts in total before giving up on HTTP 429
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub gas_limit: u64,
    pub max_fee_gwei: u64,
    pub priority_fee_gwei: u64,
    /// Request swap call data for each hop and attach it to the loan
    pub fetch_swap_data: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("formattedTokens.json"),
            artifacts_dir: PathBuf::from("artifacts"),
            results_log: PathBuf::from("results.jsonl"),
            errors_log: PathBuf::from("errors.jsonl"),
            quote_api_url: env::var("QUOTE_API_URL")
                .unwrap_or_else(|_| "https://api.1inch.dev/swap/v6.0/1".to_string()),
            rpc_url: env::var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8545".to_string()),
            relay_url: env::var("RELAY_URL")
                .unwrap_or_else(|_| "https://builder0x69.io/".to_string()),
            chain_id: env::var("CHAIN_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            contract_address: env::var("CONTRACT_ADDRESS")
                .unwrap_or_else(|_| "0x2D4a6E547418aeFCC543bb536CE59fAc0a66733e".to_string()),
            loan_token: "GURU".to_string(),
            loan_amount: "1000".to_string(),
            routing_width: flashroute_models::ROUTING_WIDTH,
            sample_size: flashroute_quotes::SAMPLE_SIZE,
            rate_limit_ms: 1000,
            max_retries: 3,
            retry_base_delay_ms: 2000,
            batch_size: 1,
            batch_delay_ms: 2000,
            gas_limit: 16_000_000,
            max_fee_gwei: 55,
            priority_fee_gwei: 55,
            fetch_swap_data: false,
        }
    }
}

impl PipelineConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&raw)?;
        Ok(config)
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn tx_params(&self) -> TxParams {
        let gwei = U256::exp10(9);
        TxParams {
            chain_id: self.chain_id,
            gas_limit: U256::from(self.gas_limit),
            max_fee_per_gas: U256::from(self.max_fee_gwei) * gwei,
            max_priority_fee_per_gas: U256::from(self.priority_fee_gwei) * gwei,
        }
    }
}

/// Secrets read from the environment
///
/// `Debug` never prints the values.
#[derive(Clone)]
pub struct Credentials {
    /// Key that signs the flash-loan transaction
    pub private_key: String,
    /// Bearer token for the quote service
    pub quote_api_key: String,
    /// Relay reputation key; an ephemeral key is used when absent
    pub relay_signing_key: Option<String>,
    /// Decimal field element committed with the route
    pub route_secret: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        let private_key = env::var("PRIVATE_KEY").context("PRIVATE_KEY is not set")?;
        let route_secret = env::var("ROUTE_SECRET").context("ROUTE_SECRET is not set")?;

        let quote_api_key = env::var("ONEINCH_API_KEY").unwrap_or_default();
        if quote_api_key.is_empty() {
            tracing::warn!("ONEINCH_API_KEY is not set, quote requests will be unauthenticated");
        }

        Ok(Self {
            private_key,
            quote_api_key,
            relay_signing_key: env::var("FLASHBOTS_SIGNING_KEY").ok().filter(|k| !k.is_empty()),
            route_secret,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("private_key", &"<redacted>")
            .field("quote_api_key", &"<redacted>")
            .field("relay_signing_key", &self.relay_signing_key.as_ref().map(|_| "<redacted>"))
            .field("route_secret", &"<redacted>")
            .finish()
    }
}
