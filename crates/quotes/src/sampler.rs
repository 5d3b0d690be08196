//! Candidate asset sampling

use flashroute_models::Asset;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use thiserror::Error;

/// Number of assets in a candidate set
pub const SAMPLE_SIZE: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SamplerError {
    #[error("Anchor catalog is empty")]
    NoAnchors,
    #[error("Catalog offers {available} distinct symbols besides the anchor, {required} required")]
    NotEnoughAssets { available: usize, required: usize },
}

/// Draws one anchor plus distinct catalog assets
pub struct CandidateSampler {
    anchors: Vec<Asset>,
    pool: Vec<Asset>,
    size: usize,
}

impl CandidateSampler {
    pub fn new(anchors: Vec<Asset>, pool: Vec<Asset>) -> Self {
        Self::with_size(anchors, pool, SAMPLE_SIZE)
    }

    pub fn with_size(anchors: Vec<Asset>, pool: Vec<Asset>, size: usize) -> Self {
        Self { anchors, pool, size }
    }

    /// Sample a candidate set of distinct symbols
    ///
    /// Element 0 is an anchor; the others come from the pool. Fails instead
    /// of looping when the pool cannot supply enough distinct symbols.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Asset>, SamplerError> {
        let anchor = self.anchors.choose(rng).ok_or(SamplerError::NoAnchors)?;
        let required = self.size.saturating_sub(1);

        // dedupe by symbol so each symbol is equally likely
        let mut seen = BTreeSet::new();
        let mut candidates: Vec<&Asset> = self
            .pool
            .iter()
            .filter(|asset| asset.symbol != anchor.symbol && seen.insert(asset.symbol.as_str()))
            .collect();

        if candidates.len() < required {
            return Err(SamplerError::NotEnoughAssets {
                available: candidates.len(),
                required,
            });
        }

        candidates.shuffle(rng);

        let mut picked = Vec::with_capacity(self.size);
        picked.push(anchor.clone());
        picked.extend(candidates.into_iter().take(required).cloned());

        tracing::debug!(
            "Sampled candidate set: {}",
            picked.iter().map(|a| a.symbol.as_str()).collect::<Vec<_>>().join(", ")
        );

        Ok(picked)
    }
}
