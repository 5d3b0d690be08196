//! Fixed-width routing arrays

use crate::Asset;
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input width of the deployed routing circuit
pub const ROUTING_WIDTH: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    #[error("Route has {len} hops but the circuit accepts at most {width}")]
    RouteTooLong { len: usize, width: usize },
    #[error("Route is empty")]
    EmptyRoute,
    #[error("Routing array has {len} entries, expected {width}")]
    WidthMismatch { len: usize, width: usize },
}

/// An ordered sequence of asset identifiers, right-padded with zeros
///
/// The length always equals the circuit's input width; entries past the
/// real route are the sentinel 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingArray {
    values: Vec<U256>,
}

impl RoutingArray {
    /// Encode a route of assets, padding to `width`
    ///
    /// Routes longer than `width` are rejected rather than truncated.
    pub fn encode(assets: &[Asset], width: usize) -> Result<Self, RoutingError> {
        Self::from_ids(assets.iter().map(Asset::route_id).collect(), width)
    }

    /// Pad raw identifiers to `width`
    pub fn from_ids(mut ids: Vec<U256>, width: usize) -> Result<Self, RoutingError> {
        if ids.is_empty() {
            return Err(RoutingError::EmptyRoute);
        }
        if ids.len() > width {
            return Err(RoutingError::RouteTooLong {
                len: ids.len(),
                width,
            });
        }

        ids.resize(width, U256::zero());
        Ok(Self { values: ids })
    }

    /// Wrap an already padded array without re-padding
    pub fn from_padded(values: Vec<U256>, width: usize) -> Result<Self, RoutingError> {
        if values.len() != width {
            return Err(RoutingError::WidthMismatch {
                len: values.len(),
                width,
            });
        }
        Ok(Self { values })
    }

    pub fn width(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[U256] {
        &self.values
    }

    /// Number of real hops (entries before the first zero)
    pub fn route_len(&self) -> usize {
        self.values.iter().take_while(|v| !v.is_zero()).count()
    }

    /// Decimal rendering, as logged in result records
    pub fn to_decimal_strings(&self) -> Vec<String> {
        self.values.iter().map(|v| v.to_string()).collect()
    }
}
