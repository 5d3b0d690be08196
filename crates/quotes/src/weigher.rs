//! Batch pricing of candidate pairs

use crate::{QuoteClient, QuoteTransport};
use flashroute_models::{Pair, Quote, Weight};
use std::time::Duration;

/// Prices pairs in fixed-size batches and converts them to weights
#[derive(Debug, Clone, Copy)]
pub struct RouteWeigher {
    batch_size: usize,
    batch_delay: Duration,
}

impl Default for RouteWeigher {
    fn default() -> Self {
        Self::new(1, Duration::from_millis(2000))
    }
}

impl RouteWeigher {
    pub fn new(batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    /// One weight per pair, same order as the input
    ///
    /// Quotes within a batch are fetched concurrently; the batch delay only
    /// separates consecutive batches.
    pub async fn weigh_pairs<T: QuoteTransport>(
        &self,
        client: &QuoteClient<T>,
        pairs: &[Pair],
    ) -> Vec<Weight> {
        let mut weights = Vec::with_capacity(pairs.len());
        let batches: Vec<&[Pair]> = pairs.chunks(self.batch_size).collect();

        for (index, batch) in batches.iter().enumerate() {
            let quotes = futures::future::join_all(
                batch
                    .iter()
                    .map(|pair| client.fetch_quote(pair, pair.from.unit_amount())),
            )
            .await;

            for (pair, quote) in batch.iter().zip(quotes) {
                let weight = quote.as_ref().map_or(Weight::Unweighable, Quote::weight);
                tracing::debug!("Weight for {}: {}", pair, weight);
                weights.push(weight);
            }

            if index + 1 < batches.len() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::{ok, status, ScriptedTransport};
    use crate::{RateLimiter, RetryPolicy};
    use ethers::types::Address;
    use flashroute_models::{enumerate_pairs, Asset};
    use serde_json::json;
    use std::sync::Arc;
    use tokio::time::Instant;

    fn assets() -> Vec<Asset> {
        vec![
            Asset::new("USDC", Address::from_low_u64_be(1), "eth", 6),
            Asset::new("DAI", Address::from_low_u64_be(2), "eth", 18),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_unweighable_pair_keeps_its_slot() {
        let pairs = enumerate_pairs(&[
            assets()[0].clone(),
            assets()[1].clone(),
            Asset::new("GURU", Address::from_low_u64_be(3), "eth", 18),
        ]);
        assert_eq!(pairs.len(), 6);

        let transport = ScriptedTransport::new(vec![
            ok(json!({ "dstAmount": "1000000000000000000" })),
            status(500),
            ok(json!({ "dstAmount": "0" })),
            ok(json!({ "dstAmount": "2000000000000000000" })),
            ok(json!({ "dstAmount": "500000000000000000" })),
            ok(json!({ "dstAmount": "1000000000000000000" })),
        ]);
        let client = QuoteClient::new(
            transport.clone(),
            Arc::new(RateLimiter::new(Duration::from_millis(1000))),
            RetryPolicy::default(),
        );

        let weights = RouteWeigher::default().weigh_pairs(&client, &pairs).await;

        assert_eq!(weights.len(), pairs.len());
        assert!(weights[0].is_weighable());
        assert_eq!(weights[1], Weight::Unweighable);
        assert_eq!(weights[2], Weight::Unweighable);
        assert!(weights[3..].iter().all(Weight::is_weighable));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_only_between_batches() {
        let pairs = enumerate_pairs(&assets());
        let transport = ScriptedTransport::new(vec![
            ok(json!({ "dstAmount": "1000000000000000000" })),
            ok(json!({ "dstAmount": "1000000" })),
        ]);
        let client = QuoteClient::new(
            transport.clone(),
            Arc::new(RateLimiter::new(Duration::from_millis(1000))),
            RetryPolicy::default(),
        );

        let start = Instant::now();
        RouteWeigher::default().weigh_pairs(&client, &pairs).await;
        let elapsed = start.elapsed();

        let calls = transport.call_times();
        assert_eq!(calls.len(), 2);
        assert!(calls[1] - calls[0] >= Duration::from_millis(2000));
        // no trailing delay after the last batch
        assert!(elapsed < Duration::from_millis(2100));
    }
}
