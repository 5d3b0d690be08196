//! One pipeline cycle: sample, price, prove, submit

use crate::config::{Credentials, PipelineConfig};
use anyhow::{bail, Context, Result};
use ethers::signers::LocalWallet;
use ethers::types::{Address, Bytes, U256};
use flashroute_bundle::{BundleSubmitter, ChainClient, EthersChain, FlashbotsRelay, Journal, Relay};
use flashroute_circuit::{
    ArtifactPaths, CircuitArtifacts, Groth16Backend, ProofBackend, ProofPipeline, Secret,
    VerifiedRoute,
};
use flashroute_models::{
    anchor_assets, enumerate_pairs, Asset, RoutingArray, SubmissionOutcome, TokenCatalog, Weight,
};
use flashroute_quotes::{
    CandidateSampler, HttpTransport, QuoteClient, QuoteTransport, RateLimiter, RouteWeigher,
    SwapRequest,
};
use std::sync::Arc;
use uuid::Uuid;

/// The pipeline wired to live services
pub type LivePipeline = Pipeline<HttpTransport, Groth16Backend, EthersChain, FlashbotsRelay>;

/// Everything one cycle needs, wired once at startup
pub struct Pipeline<T, B, C, R> {
    config: PipelineConfig,
    catalog: TokenCatalog,
    sampler: CandidateSampler,
    quotes: QuoteClient<T>,
    weigher: RouteWeigher,
    backend: Arc<B>,
    secret: Secret,
    submitter: BundleSubmitter<C, R>,
    contract: Address,
    run_id: Uuid,
}

impl LivePipeline {
    /// Load the catalog and artifacts and connect to the configured services
    pub fn connect(
        config: PipelineConfig,
        credentials: &Credentials,
        run_id: Uuid,
    ) -> Result<Self> {
        let catalog = TokenCatalog::load_from(&config.catalog_path).with_context(|| {
            format!("Failed to load token catalog {}", config.catalog_path.display())
        })?;

        let artifacts = CircuitArtifacts::load(&ArtifactPaths::in_dir(&config.artifacts_dir))
            .with_context(|| {
                format!(
                    "Failed to load circuit artifacts from {}",
                    config.artifacts_dir.display()
                )
            })?;
        if artifacts.manifest().width != config.routing_width {
            bail!(
                "Circuit artifacts are for width {}, configured routing width is {}",
                artifacts.manifest().width,
                config.routing_width
            );
        }
        let backend = Groth16Backend::new(artifacts)?;

        let transport = HttpTransport::new(&config.quote_api_url, &credentials.quote_api_key)?;

        let wallet: LocalWallet = credentials
            .private_key
            .trim_start_matches("0x")
            .parse()
            .context("PRIVATE_KEY is not a valid secp256k1 key")?;
        let relay_signer = match &credentials.relay_signing_key {
            Some(key) => key
                .trim_start_matches("0x")
                .parse()
                .context("FLASHBOTS_SIGNING_KEY is not a valid secp256k1 key")?,
            None => {
                tracing::info!("No relay signing key configured, using an ephemeral one");
                LocalWallet::new(&mut rand::thread_rng())
            }
        };

        let chain = EthersChain::new(&config.rpc_url)?;
        let relay = FlashbotsRelay::new(&config.relay_url, relay_signer);
        let secret = Secret::from_decimal(&credentials.route_secret)
            .context("ROUTE_SECRET is invalid")?;

        Self::new(
            config,
            catalog,
            transport,
            Arc::new(backend),
            secret,
            chain,
            relay,
            wallet,
            run_id,
        )
    }
}

impl<T, B, C, R> Pipeline<T, B, C, R>
where
    T: QuoteTransport,
    B: ProofBackend + 'static,
    C: ChainClient,
    R: Relay,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: PipelineConfig,
        catalog: TokenCatalog,
        transport: T,
        backend: Arc<B>,
        secret: Secret,
        chain: C,
        relay: R,
        wallet: LocalWallet,
        run_id: Uuid,
    ) -> Result<Self> {
        let contract: Address = config
            .contract_address
            .parse()
            .with_context(|| format!("Invalid contract address {}", config.contract_address))?;

        let sampler =
            CandidateSampler::with_size(anchor_assets()?, catalog.assets(), config.sample_size);
        let limiter = Arc::new(RateLimiter::new(config.rate_limit()));
        let quotes = QuoteClient::new(transport, limiter, config.retry_policy());
        let weigher = RouteWeigher::new(config.batch_size, config.batch_delay());
        let submitter = BundleSubmitter::new(
            chain,
            relay,
            wallet,
            config.tx_params(),
            Journal::new(config.results_log.clone()),
        )
        .with_run_id(run_id);

        Ok(Self {
            config,
            catalog,
            sampler,
            quotes,
            weigher,
            backend,
            secret,
            submitter,
            contract,
            run_id,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Sample a candidate set and carry it through to the relay
    pub async fn run_cycle(&self) -> Result<SubmissionOutcome> {
        let assets = {
            let mut rng = rand::thread_rng();
            self.sampler.sample(&mut rng)?
        };
        self.run_route(&assets).await
    }

    /// Price, prove and submit a fixed asset route
    pub async fn run_route(&self, assets: &[Asset]) -> Result<SubmissionOutcome> {
        tracing::info!(
            "Run {}: route {}",
            self.run_id,
            assets.iter().map(|a| a.symbol.as_str()).collect::<Vec<_>>().join(" -> ")
        );

        let weights = self.weigh(assets).await;
        let weighable = weights.iter().filter(|w| w.is_weighable()).count();
        tracing::info!("Priced {}/{} pairs", weighable, weights.len());

        let routing = RoutingArray::encode(assets, self.config.routing_width)?;
        let verified = self.prove(routing).await?;
        tracing::info!(
            "Route proof verified, {} public signals",
            verified.proof().public_signals.as_slice().len()
        );

        let loan = self.catalog.get(&self.config.loan_token)?;
        let amount = self.loan_amount(loan)?;

        let legs = if self.config.fetch_swap_data {
            self.swap_legs(assets).await?
        } else {
            vec![]
        };

        let outcome = self
            .submitter
            .submit_bundle(self.contract, loan.address, amount, &verified, legs)
            .await?;

        Ok(outcome)
    }

    /// Weights are not consumed by route selection yet; they are logged
    /// alongside the run.
    async fn weigh(&self, assets: &[Asset]) -> Vec<Weight> {
        let pairs = enumerate_pairs(assets);
        let weights = self.weigher.weigh_pairs(&self.quotes, &pairs).await;
        for (pair, weight) in pairs.iter().zip(&weights) {
            tracing::info!("{} weight {}", pair, weight);
        }
        weights
    }

    async fn prove(&self, routing: RoutingArray) -> Result<VerifiedRoute> {
        let backend = self.backend.clone();
        let secret = self.secret.clone();

        let verified =
            tokio::task::spawn_blocking(move || ProofPipeline::new(backend).run(&routing, &secret))
                .await
                .context("Proof task panicked")??;

        Ok(verified)
    }

    fn loan_amount(&self, loan: &Asset) -> Result<U256> {
        let whole = U256::from_dec_str(&self.config.loan_amount)
            .with_context(|| format!("Invalid loan amount {}", self.config.loan_amount))?;
        whole
            .checked_mul(loan.unit_amount())
            .context("Loan amount overflows uint256")
    }

    /// Swap call data for each consecutive hop, executed by the contract
    ///
    /// Each hop swaps what the previous one returned, starting from the
    /// configured whole-unit amount of the first asset.
    async fn swap_legs(&self, assets: &[Asset]) -> Result<Vec<Bytes>> {
        let mut legs = Vec::with_capacity(assets.len().saturating_sub(1));
        let mut amount = U256::from_dec_str(&self.config.loan_amount)?
            .checked_mul(assets.first().map(Asset::unit_amount).unwrap_or_default())
            .context("Swap amount overflows uint256")?;

        for hop in assets.windows(2) {
            let request = SwapRequest::new(hop[0].address, hop[1].address, amount, self.contract);
            let Some(data) = self.quotes.fetch_swap_data(&request).await? else {
                bail!("No swap data for {} -> {}", hop[0].symbol, hop[1].symbol);
            };
            tracing::debug!("Swap leg {} -> {} via {:?}", hop[0].symbol, hop[1].symbol, data.to);
            amount = data.dst_amount.unwrap_or(amount);
            legs.push(data.data);
        }

        Ok(legs)
    }
}
