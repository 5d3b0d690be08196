//! Chain state needed to build a bundle

use crate::BundleError;
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, BlockNumber, U256};

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn block_number(&self) -> Result<u64, BundleError>;

    /// Next nonce for `address`
    async fn nonce(&self, address: Address) -> Result<U256, BundleError>;
}

/// JSON-RPC chain access over HTTP
pub struct EthersChain {
    provider: Provider<Http>,
}

impl EthersChain {
    pub fn new(rpc_url: &str) -> Result<Self, BundleError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| BundleError::Chain(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;
        Ok(Self { provider })
    }
}

#[async_trait]
impl ChainClient for EthersChain {
    async fn block_number(&self) -> Result<u64, BundleError> {
        let block = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| BundleError::Chain(e.to_string()))?;
        Ok(block.as_u64())
    }

    async fn nonce(&self, address: Address) -> Result<U256, BundleError> {
        self.provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| BundleError::Chain(e.to_string()))
    }
}
