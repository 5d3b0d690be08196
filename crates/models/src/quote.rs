//! Quote and weight models

use crate::Pair;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A price observed for one pair
///
/// Ephemeral: consumed immediately to produce a [`Weight`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    /// The priced pair
    pub pair: Pair,
    /// Units of `pair.to` per whole unit of `pair.from`
    pub price: f64,
    /// When the quote was fetched
    pub fetched_at: DateTime<Utc>,
}

impl Quote {
    pub fn new(pair: Pair, price: f64) -> Self {
        Self {
            pair,
            price,
            fetched_at: Utc::now(),
        }
    }

    pub fn weight(&self) -> Weight {
        Weight::from_price(Some(self.price))
    }
}

/// Edge cost of a pair: -ln(price)
///
/// More negative means a more favorable rate. A pair without a usable
/// price is kept in place as `Unweighable` so batch order is preserved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Weight {
    Finite(f64),
    Unweighable,
}

impl Weight {
    pub fn from_price(price: Option<f64>) -> Self {
        match price {
            Some(p) if p.is_finite() && p > 0.0 => Self::Finite(-p.ln()),
            _ => Self::Unweighable,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Finite(w) => Some(*w),
            Self::Unweighable => None,
        }
    }

    pub fn is_weighable(&self) -> bool {
        matches!(self, Self::Finite(_))
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(w) => write!(f, "{:.6}", w),
            Self::Unweighable => write!(f, "unweighable"),
        }
    }
}
