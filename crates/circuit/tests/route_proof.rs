//! Proof flow against artifacts loaded from disk

use ethers::types::Address;
use flashroute_circuit::{
    ArtifactPaths, CircuitArtifacts, CircuitManifest, CircuitSource, Groth16Backend, ProofBackend,
    ProofError, ProofPipeline, ProofStage, PublicSignals, RouteProof, Secret,
};
use flashroute_models::{Asset, RoutingArray, ROUTING_WIDTH};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sha2::{Digest, Sha256};

fn address(raw: &str) -> Address {
    raw.parse().unwrap()
}

fn assets() -> Vec<Asset> {
    vec![
        Asset::new("USDC", address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"), "eth", 6),
        Asset::new("DAI", address("0x6b175474e89094c44da98b954eedeac495271d0f"), "eth", 18),
        Asset::new("GURU", Address::from_low_u64_be(0x5255), "eth", 18),
    ]
}

fn load_backend(dir: &std::path::Path) -> Groth16Backend {
    let paths = ArtifactPaths::in_dir(dir);
    let mut rng = StdRng::seed_from_u64(2024);
    CircuitArtifacts::generate(ROUTING_WIDTH, &mut rng)
        .unwrap()
        .save(&paths)
        .unwrap();

    Groth16Backend::new(CircuitArtifacts::load(&paths).unwrap()).unwrap()
}

#[test]
fn test_three_hop_route_verifies_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let backend = load_backend(dir.path());
    let routing = RoutingArray::encode(&assets(), ROUTING_WIDTH).unwrap();
    let secret = Secret::from_decimal("1234567890").unwrap();

    let mut pipeline = ProofPipeline::new(&backend);
    let verified = pipeline.run(&routing, &secret).unwrap();

    assert_eq!(pipeline.stage(), ProofStage::Verified(true));
    let signals = verified.proof().public_signals.to_decimal_strings();
    assert_eq!(signals.len(), ROUTING_WIDTH + 1);
    assert_eq!(signals[1..], routing.to_decimal_strings()[..]);
}

#[test]
fn test_proof_does_not_transfer_to_another_route() {
    let dir = tempfile::tempdir().unwrap();
    let backend = load_backend(dir.path());
    let secret = Secret::from_decimal("1234567890").unwrap();

    let routing = RoutingArray::encode(&assets(), ROUTING_WIDTH).unwrap();
    let proof = backend
        .prove(backend.compute_witness(&routing, &secret).unwrap())
        .unwrap();

    let mut reversed = assets();
    reversed.reverse();
    let other = RoutingArray::encode(&reversed, ROUTING_WIDTH).unwrap();
    let other_signals = backend
        .compute_witness(&other, &secret)
        .unwrap()
        .public_signals()
        .clone();

    let transplanted = RouteProof {
        proof: proof.proof,
        public_signals: PublicSignals::new(other_signals.into_inner()),
    };
    assert!(!backend.verify(&transplanted).unwrap());
}

#[test]
fn test_oversized_route_never_reaches_the_prover() {
    let mut assets = assets();
    while assets.len() <= ROUTING_WIDTH {
        let i = assets.len() as u64;
        let symbol = format!("X{}", i);
        assets.push(Asset::new(&symbol, Address::from_low_u64_be(i + 1), "eth", 18));
    }
    assert!(RoutingArray::encode(&assets, ROUTING_WIDTH).is_err());
}

#[test]
fn test_width_mismatch_against_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let backend = load_backend(dir.path());
    let routing = RoutingArray::encode(&assets(), 4).unwrap();
    let secret = Secret::from_decimal("1234567890").unwrap();

    let result = ProofPipeline::new(&backend).run(&routing, &secret);
    assert!(matches!(result, Err(ProofError::WitnessComputation(_))));
}

/// Rewrite a saved manifest so it points at `wasm` and `r1cs` next to it
fn attach_compiled_circuit(paths: &ArtifactPaths, wasm: &[u8], r1cs: &[u8]) {
    std::fs::write(&paths.wasm, wasm).unwrap();
    std::fs::write(&paths.r1cs, r1cs).unwrap();

    let mut manifest: CircuitManifest =
        serde_json::from_slice(&std::fs::read(&paths.manifest).unwrap()).unwrap();
    manifest.circuit = CircuitSource::Compiled {
        wasm_sha256: hex::encode(Sha256::digest(wasm)),
        r1cs_sha256: hex::encode(Sha256::digest(r1cs)),
    };
    std::fs::write(&paths.manifest, serde_json::to_vec_pretty(&manifest).unwrap()).unwrap();
}

#[test]
fn test_unloadable_compiled_circuit_fails_witness() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ArtifactPaths::in_dir(dir.path());
    load_backend(dir.path());
    attach_compiled_circuit(&paths, b"\0asm truncated", b"r1cs truncated");

    let backend = Groth16Backend::new(CircuitArtifacts::load(&paths).unwrap()).unwrap();
    let routing = RoutingArray::encode(&assets(), ROUTING_WIDTH).unwrap();
    let secret = Secret::from_decimal("1234567890").unwrap();

    let mut pipeline = ProofPipeline::new(&backend);
    let result = pipeline.run(&routing, &secret);
    assert!(matches!(result, Err(ProofError::WitnessComputation(_))));
    assert_eq!(pipeline.stage(), ProofStage::Idle);

    // gone after loading
    std::fs::remove_file(&paths.wasm).unwrap();
    let result = ProofPipeline::new(&backend).run(&routing, &secret);
    assert!(
        matches!(result, Err(ProofError::WitnessComputation(msg)) if msg.contains("missing"))
    );
}
