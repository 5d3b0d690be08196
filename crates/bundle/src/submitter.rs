//! Proof-gated flash-loan bundle submission

use crate::calldata::encode_flash_loan;
use crate::{BundleError, ChainClient, Journal, Relay, SignedBundle};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Eip1559TransactionRequest, U256};
use flashroute_circuit::VerifiedRoute;
use flashroute_models::{ResultRecord, SubmissionOutcome};
use uuid::Uuid;

/// Fee and gas settings for the flash-loan transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxParams {
    pub chain_id: u64,
    pub gas_limit: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

impl Default for TxParams {
    fn default() -> Self {
        let fee = U256::from(55u64) * U256::exp10(9);
        Self {
            chain_id: 1,
            gas_limit: U256::from(16_000_000u64),
            max_fee_per_gas: fee,
            max_priority_fee_per_gas: fee,
        }
    }
}

/// Builds, simulates and submits the single-transaction flash-loan bundle
pub struct BundleSubmitter<C, R> {
    chain: C,
    relay: R,
    wallet: LocalWallet,
    params: TxParams,
    results: Journal,
    run_id: Uuid,
}

impl<C: ChainClient, R: Relay> BundleSubmitter<C, R> {
    pub fn new(
        chain: C,
        relay: R,
        wallet: LocalWallet,
        params: TxParams,
        results: Journal,
    ) -> Self {
        let wallet = wallet.with_chain_id(params.chain_id);
        Self {
            chain,
            relay,
            wallet,
            params,
            results,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn relay(&self) -> &R {
        &self.relay
    }

    fn sign(&self, contract: Address, calldata: Bytes, nonce: U256) -> Result<Bytes, BundleError> {
        let request = Eip1559TransactionRequest::new()
            .from(self.wallet.address())
            .to(contract)
            .data(calldata)
            .value(U256::zero())
            .nonce(nonce)
            .gas(self.params.gas_limit)
            .max_fee_per_gas(self.params.max_fee_per_gas)
            .max_priority_fee_per_gas(self.params.max_priority_fee_per_gas)
            .chain_id(self.params.chain_id);

        let tx: TypedTransaction = request.into();
        let signature = self
            .wallet
            .sign_transaction_sync(&tx)
            .map_err(|e| BundleError::Signing(e.to_string()))?;

        Ok(tx.rlp_signed(&signature))
    }

    /// Submit a flash loan of `amount` of `token` along a verified route
    ///
    /// The bundle targets the block after the current head. A failed
    /// simulation is terminal: nothing is sent and nothing is retried.
    /// Only `Sent` outcomes are appended to the results log.
    pub async fn submit_bundle(
        &self,
        contract: Address,
        token: Address,
        amount: U256,
        route: &VerifiedRoute,
        extra_tx_data: Vec<Bytes>,
    ) -> Result<SubmissionOutcome, BundleError> {
        let routing = route.routing();
        let calldata = encode_flash_loan(token, amount, routing, &extra_tx_data);

        let block = self.chain.block_number().await?;
        let target_block = block + 1;
        let nonce = self.chain.nonce(self.wallet.address()).await?;

        let raw = self.sign(contract, calldata, nonce)?;
        let bundle = SignedBundle {
            transactions: vec![raw],
            target_block,
        };

        tracing::info!(
            "Simulating flash-loan bundle for block {} ({} hops, {} legs)",
            target_block,
            routing.route_len(),
            extra_tx_data.len()
        );

        match self.relay.simulate(&bundle).await {
            Ok(report) => {
                tracing::debug!(
                    "Simulation passed (gas used: {:?}, hash: {:?})",
                    report.total_gas_used,
                    report.bundle_hash
                );
            }
            Err(failure) => {
                tracing::warn!("{}", failure);
                return Ok(SubmissionOutcome::from_failure(target_block, failure));
            }
        }

        let outcome = match self.relay.send(&bundle).await {
            Ok(bundle_hash) => SubmissionOutcome::Sent {
                target_block,
                bundle_hash,
            },
            Err(failure) => {
                tracing::warn!("{}", failure);
                return Ok(SubmissionOutcome::from_failure(target_block, failure));
            }
        };

        tracing::info!("{}", outcome.message());

        let record = ResultRecord::new(self.run_id, token, routing, amount, target_block);
        if let Err(e) = self.results.append(&record) {
            // the bundle is already with the relay
            tracing::error!("Failed to record sent bundle: {}", e);
        }

        Ok(outcome)
    }
}
