//! Records appended to the run logs
//!
//! Both logs are append-only, one JSON object per line. Results are only
//! written for bundles that reached the relay; errors are written once per
//! failed run at the outermost boundary.

use crate::RoutingArray;
use chrono::{DateTime, Utc};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A successful submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub run_id: Uuid,
    /// Flash-loaned token
    pub token: Address,
    /// Padded routing array, decimal identifiers
    pub routing: Vec<String>,
    /// Loan amount in the token's smallest unit
    pub initial_dst_amount: String,
    pub target_block: u64,
    pub recorded_at: DateTime<Utc>,
}

impl ResultRecord {
    pub fn new(
        run_id: Uuid,
        token: Address,
        routing: &RoutingArray,
        amount: U256,
        target_block: u64,
    ) -> Self {
        Self {
            run_id,
            token,
            routing: routing.to_decimal_strings(),
            initial_dst_amount: amount.to_string(),
            target_block,
            recorded_at: Utc::now(),
        }
    }
}

/// A failed run, caught at the top level
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub run_id: Uuid,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(run_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            run_id,
            message: message.into(),
            recorded_at: Utc::now(),
        }
    }
}
