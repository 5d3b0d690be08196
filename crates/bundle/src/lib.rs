//! Bundle construction and private relay submission
//!
//! Takes a [`VerifiedRoute`](flashroute_circuit::VerifiedRoute), encodes the
//! flash-loan call, signs it as an EIP-1559 transaction and hands the
//! one-transaction bundle to a private relay: simulate first, send only if
//! the simulation is clean.

use thiserror::Error;

pub mod calldata;
mod chain;
mod journal;
mod relay;
mod submitter;

pub use calldata::{encode_flash_loan, flash_loan_selector, FLASH_LOAN_SIGNATURE};
pub use chain::{ChainClient, EthersChain};
pub use journal::{Journal, JournalError};
pub use relay::{
    call_bundle_params, parse_call_bundle, parse_send_bundle, send_bundle_params, FlashbotsRelay,
    Relay, SignedBundle, SimulationReport, SIGNATURE_HEADER,
};
pub use submitter::{BundleSubmitter, TxParams};

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("Chain RPC error: {0}")]
    Chain(String),
    #[error("Failed to sign transaction: {0}")]
    Signing(String),
}
