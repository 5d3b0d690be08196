//! Ordered asset pairs

use crate::Asset;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered exchange direction between two distinct assets
///
/// Directionality matters: the price of A->B is generally not the
/// reciprocal of B->A.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub from: Asset,
    pub to: Asset,
}

impl Pair {
    /// Create a pair, returning `None` for a self pair
    pub fn new(from: Asset, to: Asset) -> Option<Self> {
        if from.symbol == to.symbol {
            return None;
        }
        Some(Self { from, to })
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from.symbol, self.to.symbol)
    }
}

/// Every ordered pair (i, j) with i != j, in row-major order
pub fn enumerate_pairs(assets: &[Asset]) -> Vec<Pair> {
    let mut pairs = Vec::with_capacity(assets.len() * assets.len().saturating_sub(1));

    for (i, from) in assets.iter().enumerate() {
        for (j, to) in assets.iter().enumerate() {
            if i != j {
                pairs.push(Pair {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }
    }

    pairs
}
