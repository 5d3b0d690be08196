//! Asset models and the token catalog

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read token catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse token catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Token '{0}' not found in catalog")]
    UnknownToken(String),
    #[error("Invalid anchor address for {symbol}: {address}")]
    InvalidAnchor { symbol: String, address: String },
    #[error("Token '{symbol}' has {decimals} decimals, more than uint256 can hold")]
    InvalidDecimals { symbol: String, decimals: u32 },
}

/// Largest decimal precision whose whole unit fits in a uint256
pub const MAX_DECIMALS: u32 = 77;

/// A tradeable asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Ticker symbol (e.g., "USDC")
    pub symbol: String,
    /// Token contract address
    pub address: Address,
    /// Chain tag (e.g., "eth")
    pub chain: String,
    /// Decimal precision of the token
    pub decimals: u32,
}

impl Asset {
    pub fn new(symbol: &str, address: Address, chain: &str, decimals: u32) -> Self {
        Self {
            symbol: symbol.to_string(),
            address,
            chain: chain.to_string(),
            decimals,
        }
    }

    /// One whole token expressed in its smallest unit
    ///
    /// Catalog loading rejects assets above [`MAX_DECIMALS`].
    pub fn unit_amount(&self) -> U256 {
        U256::exp10(self.decimals as usize)
    }

    /// The numeric identifier used inside routing arrays
    pub fn route_id(&self) -> U256 {
        U256::from_big_endian(self.address.as_bytes())
    }
}

/// Static symbol -> asset mapping, loaded once at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenCatalog {
    tokens: BTreeMap<String, Asset>,
}

impl TokenCatalog {
    pub fn new(assets: impl IntoIterator<Item = Asset>) -> Self {
        Self {
            tokens: assets
                .into_iter()
                .map(|asset| (asset.symbol.clone(), asset))
                .collect(),
        }
    }

    /// Load a catalog from a JSON file keyed by symbol
    pub fn load_from(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(raw)?;
        if let Some(asset) = catalog.tokens.values().find(|a| a.decimals > MAX_DECIMALS) {
            return Err(CatalogError::InvalidDecimals {
                symbol: asset.symbol.clone(),
                decimals: asset.decimals,
            });
        }
        Ok(catalog)
    }

    /// Look up an asset by symbol
    pub fn get(&self, symbol: &str) -> Result<&Asset, CatalogError> {
        self.tokens
            .get(symbol)
            .ok_or_else(|| CatalogError::UnknownToken(symbol.to_string()))
    }

    pub fn assets(&self) -> Vec<Asset> {
        self.tokens.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// The high-liquidity anchor set always eligible as the first sampled asset
const ANCHORS: [(&str, &str, u32); 6] = [
    ("USDC", "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", 6),
    ("DAI", "0x6b175474e89094c44da98b954eedeac495271d0f", 18),
    ("USDT", "0xdac17f958d2ee523a2206206994597c13d831ec7", 6),
    ("UNI", "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984", 18),
    ("LINK", "0x514910771af9ca656af840dff83e8264ecf986ca", 18),
    ("MKR", "0x9f8f72aa9304c8b593d555f12ef6589cc3a579a2", 18),
];

/// Build the anchor catalog
pub fn anchor_assets() -> Result<Vec<Asset>, CatalogError> {
    ANCHORS
        .iter()
        .map(|(symbol, address, decimals)| {
            let parsed = address.parse::<Address>().map_err(|_| CatalogError::InvalidAnchor {
                symbol: symbol.to_string(),
                address: address.to_string(),
            })?;
            Ok(Asset::new(symbol, parsed, "eth", *decimals))
        })
        .collect()
}
