//! Example: How a route proof gates submission
//!
//! Walks through encoding a route, proving it under a private secret and
//! verifying it, then shows the two ways a forged route is caught. Nothing
//! here touches the network.
//!
//! Run with: cargo run -p flashroute --example route_proof_demo

use anyhow::Result;
use ethers::types::Address;
use flashroute_circuit::{
    commit, to_field, CircuitArtifacts, Groth16Backend, ProofBackend, ProofError, ProofPipeline,
    RouteProof, Secret,
};
use flashroute_models::{Asset, RoutingArray, ROUTING_WIDTH};

fn asset(symbol: &str, address: &str, decimals: u32) -> Result<Asset> {
    Ok(Asset::new(symbol, address.parse::<Address>()?, "eth", decimals))
}

fn main() -> Result<()> {
    // ============================================================================
    // STEP 1: Generate the proving artifacts
    // ============================================================================
    //
    // `flashroute setup` writes these to disk once; every later run loads the
    // same keys, so a proof made today verifies against tomorrow's key. This
    // demo uses the built-in route circuit so it needs no compiled files.

    println!("Generating artifacts for width {}...", ROUTING_WIDTH);
    let artifacts = CircuitArtifacts::generate(ROUTING_WIDTH, &mut rand::thread_rng())?;
    println!("  verification key sha256: {}", artifacts.manifest().verifying_key_sha256);
    let backend = Groth16Backend::new(artifacts)?;

    // ============================================================================
    // STEP 2: Encode the route
    // ============================================================================
    //
    // Each address is read as a big-endian integer and the array is padded
    // with zeros on the right.

    let route = vec![
        asset("USDC", "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", 6)?,
        asset("WBTC", "0x2260fac5e5542a773aa44fbcfedf7c193bc2c599", 8)?,
        asset("GURU", "0x525574c899a7c877a11865339e57376092168258", 18)?,
    ];
    let routing = RoutingArray::encode(&route, ROUTING_WIDTH)?;
    println!("\nRouting array ({} hops):", routing.route_len());
    for (i, value) in routing.to_decimal_strings().iter().enumerate() {
        println!("  [{}] {}", i, value);
    }

    // ============================================================================
    // STEP 3: Prove and verify
    // ============================================================================
    //
    // The secret never leaves this process. The verifier only sees the
    // commitment and the route.

    let secret: Secret = "1234567890".parse()?;
    let verified = ProofPipeline::new(&backend).run(&routing, &secret)?;
    let signals = &verified.proof().public_signals;
    println!("\nProof verified");
    println!("  proof size: {} bytes", verified.proof().proof.len());
    println!("  commitment: {}", signals.to_decimal_strings()[0]);

    let fields: Vec<_> = routing.values().iter().filter_map(|v| to_field(*v)).collect();
    let expected = commit(&fields, to_field(1234567890u64.into()).unwrap_or_default());
    println!("  matches Poseidon(secret, route): {}", signals.commitment() == Some(&expected));

    // ============================================================================
    // STEP 4: Forge a route
    // ============================================================================
    //
    // Swapping the route in the public signals breaks verification, so the
    // submitter never sees a VerifiedRoute for it.

    let mut forged_signals = signals.clone().into_inner();
    forged_signals.swap(1, 2);
    let forged = RouteProof {
        proof: verified.proof().proof.clone(),
        public_signals: flashroute_circuit::PublicSignals::new(forged_signals),
    };
    println!("\nForged route verifies: {}", backend.verify(&forged)?);

    // ============================================================================
    // STEP 5: Break the padding rule
    // ============================================================================
    //
    // A gap in the route is unsatisfiable, so no witness exists for it.

    let mut values = routing.values().to_vec();
    values.swap(1, 5);
    let gapped = RoutingArray::from_padded(values, ROUTING_WIDTH)?;
    match ProofPipeline::new(&backend).run(&gapped, &secret) {
        Err(ProofError::WitnessComputation(reason)) => {
            println!("Gapped route rejected: {}", reason)
        }
        Err(e) => println!("Gapped route rejected: {}", e),
        Ok(_) => println!("Gapped route unexpectedly verified"),
    }

    Ok(())
}
