//! End-to-end tests for the proof-gated submission flow
//!
//! Each test runs the real quote client, Groth16 backend, chain client and
//! relay client against the mock quote service and mock relay.

use ethers::signers::LocalWallet;
use ethers::types::U256;
use flashroute::{Pipeline, PipelineConfig};
use flashroute_bundle::{EthersChain, FlashbotsRelay, Journal};
use flashroute_circuit::{
    CircuitArtifacts, Groth16Backend, ProofBackend, ProofError, RouteProof, Secret, Witness,
};
use flashroute_feeds::{
    quote_router, relay_router, spawn, QuoteServiceConfig, QuoteServiceState, RelayConfig,
    RelayState,
};
use flashroute_models::{ResultRecord, RoutingArray, SubmissionOutcome, TokenCatalog};
use flashroute_quotes::HttpTransport;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

const CATALOG: &str = r#"{
    "GURU": {
        "symbol": "GURU",
        "address": "0x525574c899a7c877a11865339e57376092168258",
        "chain": "eth",
        "decimals": 18
    },
    "WBTC": {
        "symbol": "WBTC",
        "address": "0x2260fac5e5542a773aa44fbcfedf7c193bc2c599",
        "chain": "eth",
        "decimals": 8
    },
    "PEPE": {
        "symbol": "PEPE",
        "address": "0x6982508145454ce325ddbe47a25d4ec3d2311933",
        "chain": "eth",
        "decimals": 18
    }
}"#;

/// Verifies nothing, proves honestly
struct RejectingBackend(Groth16Backend);

impl ProofBackend for RejectingBackend {
    fn compute_witness(
        &self,
        routing: &RoutingArray,
        secret: &Secret,
    ) -> Result<Witness, ProofError> {
        self.0.compute_witness(routing, secret)
    }

    fn prove(&self, witness: Witness) -> Result<RouteProof, ProofError> {
        self.0.prove(witness)
    }

    fn verify(&self, _proof: &RouteProof) -> Result<bool, ProofError> {
        Ok(false)
    }
}

struct Harness {
    quotes: Arc<QuoteServiceState>,
    relay: Arc<RelayState>,
    quote_url: String,
    relay_url: String,
    config: PipelineConfig,
    catalog: TokenCatalog,
    _dir: TempDir,
}

impl Harness {
    async fn start(quotes: QuoteServiceConfig, relay: RelayConfig) -> Self {
        let quotes = Arc::new(QuoteServiceState::new(quotes));
        let relay = Arc::new(RelayState::new(relay));
        let (quote_addr, _) = spawn(quote_router(quotes.clone())).await.unwrap();
        let (relay_addr, _) = spawn(relay_router(relay.clone())).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            results_log: dir.path().join("results.jsonl"),
            errors_log: dir.path().join("errors.jsonl"),
            rate_limit_ms: 0,
            retry_base_delay_ms: 0,
            batch_delay_ms: 0,
            ..PipelineConfig::default()
        };

        Self {
            quotes,
            relay,
            quote_url: format!("http://{}", quote_addr),
            relay_url: format!("http://{}/", relay_addr),
            config,
            catalog: TokenCatalog::from_json(CATALOG).unwrap(),
            _dir: dir,
        }
    }

    fn pipeline<B: ProofBackend + 'static>(
        &self,
        backend: B,
    ) -> Pipeline<HttpTransport, B, EthersChain, FlashbotsRelay> {
        let mut rng = StdRng::seed_from_u64(21);
        Pipeline::new(
            self.config.clone(),
            self.catalog.clone(),
            HttpTransport::new(&self.quote_url, "test-key").unwrap(),
            Arc::new(backend),
            Secret::from_decimal("1234567890").unwrap(),
            EthersChain::new(&self.relay_url).unwrap(),
            FlashbotsRelay::new(&self.relay_url, LocalWallet::new(&mut rng)),
            LocalWallet::new(&mut rng),
            Uuid::new_v4(),
        )
        .unwrap()
    }

    fn results(&self) -> Vec<ResultRecord> {
        Journal::new(self.config.results_log.clone()).read_all().unwrap()
    }

    async fn bundle_methods(&self) -> Vec<String> {
        self.relay
            .methods()
            .await
            .into_iter()
            .filter(|m| m.ends_with("Bundle"))
            .collect()
    }
}

fn backend(width: usize) -> Groth16Backend {
    let mut rng = StdRng::seed_from_u64(3);
    Groth16Backend::new(CircuitArtifacts::generate(width, &mut rng).unwrap()).unwrap()
}

#[tokio::test]
async fn test_verified_route_is_simulated_and_sent() {
    let harness = Harness::start(
        QuoteServiceConfig::default(),
        RelayConfig {
            block_number: 19_000_000,
            ..RelayConfig::default()
        },
    )
    .await;
    let pipeline = harness.pipeline(backend(10));
    let route = harness.catalog.assets();

    let outcome = pipeline.run_route(&route).await.unwrap();

    assert!(outcome.is_sent(), "unexpected outcome: {:?}", outcome);
    assert_eq!(outcome.target_block(), 19_000_001);
    assert_eq!(harness.bundle_methods().await, ["eth_callBundle", "eth_sendBundle"]);

    // three assets, six ordered pairs
    assert_eq!(harness.quotes.requests(), 6);

    let records = harness.results();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.run_id, pipeline.run_id());
    assert_eq!(record.routing.len(), 10);
    assert_eq!(record.routing[0], route[0].route_id().to_string());
    assert_eq!(record.routing[2], route[2].route_id().to_string());
    assert!(record.routing[3..].iter().all(|v| v == "0"));

    // 1000 GURU at 18 decimals
    let expected = U256::from(1000u64) * U256::exp10(18);
    assert_eq!(record.initial_dst_amount, expected.to_string());
}

#[tokio::test]
async fn test_rejected_proof_never_reaches_relay() {
    let harness = Harness::start(QuoteServiceConfig::default(), RelayConfig::default()).await;
    let pipeline = harness.pipeline(RejectingBackend(backend(10)));

    let err = pipeline.run_route(&harness.catalog.assets()).await.unwrap_err();

    assert!(matches!(err.downcast_ref::<ProofError>(), Some(ProofError::InvalidProof)));
    assert!(harness.relay.methods().await.is_empty());
    assert!(harness.results().is_empty());
}

#[tokio::test]
async fn test_simulation_failure_skips_send() {
    let harness = Harness::start(
        QuoteServiceConfig::default(),
        RelayConfig {
            block_number: 500,
            simulation_error: Some("insufficient funds for flash loan fee".to_string()),
            ..RelayConfig::default()
        },
    )
    .await;
    let pipeline = harness.pipeline(backend(10));

    let outcome = pipeline.run_route(&harness.catalog.assets()).await.unwrap();

    assert_eq!(
        outcome,
        SubmissionOutcome::SimulationFailed {
            target_block: 501,
            message: "insufficient funds for flash loan fee".to_string()
        }
    );
    assert_eq!(harness.bundle_methods().await, ["eth_callBundle"]);
    assert!(harness.results().is_empty());
}

#[tokio::test]
async fn test_unpriced_pairs_do_not_block_submission() {
    let guru = "0x525574c899a7c877a11865339e57376092168258";
    let wbtc = "0x2260fac5e5542a773aa44fbcfedf7c193bc2c599";
    let harness = Harness::start(
        QuoteServiceConfig {
            failing_pairs: vec![format!("{}-{}", guru, wbtc)],
            ..QuoteServiceConfig::default()
        },
        RelayConfig::default(),
    )
    .await;
    let pipeline = harness.pipeline(backend(10));

    let outcome = pipeline.run_route(&harness.catalog.assets()).await.unwrap();

    assert!(outcome.is_sent());
    assert_eq!(harness.quotes.requests(), 6);
}

#[tokio::test]
async fn test_swap_legs_survive_rate_limiting() {
    let mut harness = Harness::start(
        QuoteServiceConfig {
            swap_rejections: 2,
            ..QuoteServiceConfig::default()
        },
        RelayConfig::default(),
    )
    .await;
    harness.config.fetch_swap_data = true;
    let pipeline = harness.pipeline(backend(10));

    let outcome = pipeline.run_route(&harness.catalog.assets()).await.unwrap();

    assert!(outcome.is_sent());
    // six quotes, two hops, two rejected swap attempts
    assert_eq!(harness.quotes.requests(), 10);
}

#[tokio::test]
async fn test_swap_rate_limit_exhaustion_aborts() {
    let mut harness = Harness::start(
        QuoteServiceConfig {
            swap_rejections: 10,
            ..QuoteServiceConfig::default()
        },
        RelayConfig::default(),
    )
    .await;
    harness.config.fetch_swap_data = true;
    let pipeline = harness.pipeline(backend(10));

    let err = pipeline.run_route(&harness.catalog.assets()).await.unwrap_err();

    assert!(err.to_string().contains("Rate limit exceeded after 3 attempts"));
    assert!(harness.bundle_methods().await.is_empty());
}

#[tokio::test]
async fn test_full_cycle_samples_an_anchor_first() {
    let harness = Harness::start(QuoteServiceConfig::default(), RelayConfig::default()).await;
    let pipeline = harness.pipeline(backend(10));

    let outcome = pipeline.run_cycle().await.unwrap();

    assert!(outcome.is_sent());
    let records = harness.results();
    assert_eq!(records.len(), 1);

    let anchors: Vec<String> = flashroute_models::anchor_assets()
        .unwrap()
        .iter()
        .map(|a| a.route_id().to_string())
        .collect();
    assert!(anchors.contains(&records[0].routing[0]));
    assert_eq!(records[0].routing.iter().filter(|v| *v != "0").count(), 3);
}

#[tokio::test]
async fn test_artifact_width_mismatch_fails_witness() {
    let harness = Harness::start(QuoteServiceConfig::default(), RelayConfig::default()).await;
    let pipeline = harness.pipeline(backend(4));

    let err = pipeline.run_route(&harness.catalog.assets()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ProofError>(),
        Some(ProofError::WitnessComputation(_))
    ));
    assert!(harness.relay.methods().await.is_empty());
}
