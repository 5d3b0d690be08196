//! Rate-limited quote client

use crate::{Endpoint, QuoteError, QuoteTransport, RateLimiter, TransportResponse};
use ethers::types::{Address, Bytes, U256};
use flashroute_models::{Pair, Quote};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Backoff schedule for rate-limited swap-data requests
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_retries: u32,
    /// First backoff delay, doubled after each rejection
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(2000),
        }
    }
}

/// Parameters of a swap call-data request
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub src: Address,
    pub dst: Address,
    pub amount: U256,
    /// Account that will execute the swap
    pub from: Address,
    /// Slippage tolerance in percent
    pub slippage: String,
}

impl SwapRequest {
    pub fn new(src: Address, dst: Address, amount: U256, from: Address) -> Self {
        Self {
            src,
            dst,
            amount,
            from,
            slippage: "2".to_string(),
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("src", format!("{:?}", self.src)),
            ("dst", format!("{:?}", self.dst)),
            ("amount", self.amount.to_string()),
            ("from", format!("{:?}", self.from)),
            ("slippage", self.slippage.clone()),
            ("compatibility", "true".to_string()),
            ("disableEstimate", "true".to_string()),
        ]
    }
}

/// Swap call data returned by the quote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapData {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub dst_amount: Option<U256>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    dst_amount: Option<String>,
    tx: SwapTx,
}

#[derive(Deserialize)]
struct SwapTx {
    to: Address,
    data: Bytes,
    #[serde(default)]
    value: Option<String>,
}

impl TryFrom<SwapResponse> for SwapData {
    type Error = QuoteError;

    fn try_from(response: SwapResponse) -> Result<Self, Self::Error> {
        let value = match response.tx.value.as_deref() {
            Some(raw) if !raw.is_empty() => U256::from_dec_str(raw)
                .map_err(|e| QuoteError::ParseError(format!("tx.value: {}", e)))?,
            _ => U256::zero(),
        };
        let dst_amount = response
            .dst_amount
            .as_deref()
            .map(U256::from_dec_str)
            .transpose()
            .map_err(|e| QuoteError::ParseError(format!("dstAmount: {}", e)))?;

        Ok(Self {
            to: response.tx.to,
            data: response.tx.data,
            value,
            dst_amount,
        })
    }
}

/// Client for the external quote service
///
/// Every request first passes through the shared [`RateLimiter`].
pub struct QuoteClient<T> {
    transport: T,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl<T: QuoteTransport> QuoteClient<T> {
    pub fn new(transport: T, limiter: Arc<RateLimiter>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            limiter,
            retry,
        }
    }

    /// Fetch the price of `pair` for `amount` of the source asset
    ///
    /// Any upstream failure is logged and yields `None`; callers treat that
    /// as "no price available".
    pub async fn fetch_quote(&self, pair: &Pair, amount: U256) -> Option<Quote> {
        self.limiter.acquire().await;

        let params = [
            ("src", format!("{:?}", pair.from.address)),
            ("dst", format!("{:?}", pair.to.address)),
            ("amount", amount.to_string()),
        ];

        let response = match self.transport.get(Endpoint::Quote, &params).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Quote request for {} failed: {}", pair, e);
                return None;
            }
        };

        if !response.is_success() {
            tracing::warn!(
                "Quote request for {} rejected ({}): {}",
                pair,
                response.status,
                response.error_text()
            );
            return None;
        }

        let dst_amount = match parse_dst_amount(&response) {
            Ok(amount) => amount,
            Err(e) => {
                tracing::warn!("Quote response for {} unusable: {}", pair, e);
                return None;
            }
        };

        let price = dst_amount / 10f64.powi(pair.from.decimals as i32);
        tracing::info!("Price for {}: {}", pair, price);

        Some(Quote::new(pair.clone(), price))
    }

    /// Fetch swap call data, retrying HTTP 429 with exponential backoff
    ///
    /// Makes at most `max_retries` attempts in total and backs off after
    /// every rejection, the last one included, so the default policy sleeps
    /// 2s, 4s and 8s before giving up with `RateLimitExceeded`. Any other
    /// upstream failure returns `Ok(None)`. Backoff sleeps do not go through
    /// the rate limiter.
    pub async fn fetch_swap_data(
        &self,
        request: &SwapRequest,
    ) -> Result<Option<SwapData>, QuoteError> {
        self.limiter.acquire().await;

        let params = request.params();
        let mut delay = self.retry.base_delay;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let response = match self.transport.get(Endpoint::Swap, &params).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("Swap data request failed: {}", e);
                    return Ok(None);
                }
            };

            if response.is_rate_limited() {
                tracing::warn!(
                    "Swap data rate limited on attempt {}/{}, backing off {:?}",
                    attempts,
                    self.retry.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                if attempts >= self.retry.max_retries {
                    return Err(QuoteError::RateLimitExceeded { attempts });
                }
                continue;
            }

            if !response.is_success() {
                tracing::warn!(
                    "Swap data request rejected ({}): {}",
                    response.status,
                    response.error_text()
                );
                return Ok(None);
            }

            return match serde_json::from_value::<SwapResponse>(response.body)
                .map_err(|e| QuoteError::ParseError(e.to_string()))
                .and_then(SwapData::try_from)
            {
                Ok(data) => Ok(Some(data)),
                Err(e) => {
                    tracing::warn!("Swap data response unusable: {}", e);
                    Ok(None)
                }
            };
        }
    }
}

fn parse_dst_amount(response: &TransportResponse) -> Result<f64, QuoteError> {
    match response.body.get("dstAmount") {
        Some(serde_json::Value::String(raw)) => raw
            .parse::<f64>()
            .map_err(|e| QuoteError::ParseError(format!("dstAmount '{}': {}", raw, e))),
        Some(serde_json::Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| QuoteError::ParseError("dstAmount out of range".to_string())),
        _ => Err(QuoteError::ParseError("missing dstAmount".to_string())),
    }
}
