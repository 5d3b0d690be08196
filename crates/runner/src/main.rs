//! flashroute
//!
//! Single-shot proof-gated flash-loan submission.
//!
//! Each run:
//! - Samples a candidate asset set and prices every ordered pair
//! - Encodes the route and proves it against the route circuit
//! - Simulates the flash-loan bundle at the next block and sends it only if
//!   the simulation is clean
//!
//! ## Usage
//!
//! ```bash
//! # One-time: generate proving artifacts for the compiled route circuit
//! cargo run -p flashroute -- setup --wasm route.wasm --r1cs route.r1cs --out artifacts
//!
//! # One cycle
//! PRIVATE_KEY=... ROUTE_SECRET=... ONEINCH_API_KEY=... cargo run -p flashroute -- run
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ethers::types::U256;
use flashroute::{live_cycle, RunOptions};
use flashroute_circuit::{
    ArtifactPaths, CircuitArtifacts, CompiledCircuit, Groth16Backend, ProofPipeline, Secret,
};
use flashroute_models::{RoutingArray, ROUTING_WIDTH};
use rand::Rng;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI arguments
#[derive(Parser)]
#[command(name = "flashroute")]
#[command(about = "Proof-gated flash-loan bundle submission")]
struct CliArgs {
    /// Path to pipeline configuration file
    #[arg(short, long, default_value = "pipeline.yaml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one pipeline cycle (default)
    Run {
        /// Token catalog (overrides config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Artifact directory (overrides config)
        #[arg(long)]
        artifacts: Option<PathBuf>,

        /// Errors log (overrides config, used even if the config is unreadable)
        #[arg(long)]
        errors_log: Option<PathBuf>,

        /// Attach swap call data for each hop
        #[arg(long)]
        fetch_swap_data: bool,
    },
    /// Generate proving artifacts
    Setup {
        /// Route slots in the circuit
        #[arg(long, default_value_t = ROUTING_WIDTH)]
        width: usize,

        /// Compiled circuit witness generator (.wasm)
        #[arg(long, requires = "r1cs")]
        wasm: Option<PathBuf>,

        /// Compiled circuit constraints (.r1cs)
        #[arg(long, requires = "wasm")]
        r1cs: Option<PathBuf>,

        /// Output directory
        #[arg(long, default_value = "artifacts")]
        out: PathBuf,
    },
    /// Load artifacts, check fingerprints and prove a sample route
    VerifyArtifacts {
        #[arg(long, default_value = "artifacts")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,flashroute=debug".into()),
        )
        .init();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env loaded: {}", e);
    }

    let args = CliArgs::parse();

    match args.command.unwrap_or(Command::Run {
        catalog: None,
        artifacts: None,
        errors_log: None,
        fetch_swap_data: false,
    }) {
        Command::Run {
            catalog,
            artifacts,
            errors_log,
            fetch_swap_data,
        } => {
            let options = RunOptions {
                config_path: args.config,
                catalog,
                artifacts,
                errors_log,
                fetch_swap_data,
            };
            flashroute::run(options, live_cycle).await
        }
        Command::Setup {
            width,
            wasm,
            r1cs,
            out,
        } => setup(width, wasm.zip(r1cs).map(|(w, r)| CompiledCircuit::new(w, r)), out),
        Command::VerifyArtifacts { dir } => verify_artifacts(dir),
    }
}

fn setup(width: usize, compiled: Option<CompiledCircuit>, out: PathBuf) -> Result<()> {
    tracing::info!("Generating artifacts for width {} into {}", width, out.display());

    let mut rng = rand::thread_rng();
    let artifacts = match compiled {
        Some(compiled) => {
            tracing::info!("Using compiled circuit {}", compiled.wasm.display());
            CircuitArtifacts::generate_compiled(width, compiled, &mut rng)?
        }
        None => {
            tracing::warn!("No compiled circuit given, falling back to the built-in route circuit");
            CircuitArtifacts::generate(width, &mut rng)?
        }
    };
    artifacts.save(&ArtifactPaths::in_dir(&out))?;

    let manifest = artifacts.manifest();
    tracing::info!("Proving key sha256:      {}", manifest.proving_key_sha256);
    tracing::info!("Verification key sha256: {}", manifest.verifying_key_sha256);
    Ok(())
}

fn verify_artifacts(dir: PathBuf) -> Result<()> {
    let artifacts = CircuitArtifacts::load(&ArtifactPaths::in_dir(&dir))
        .with_context(|| format!("Failed to load artifacts from {}", dir.display()))?;
    let width = artifacts.manifest().width;
    tracing::info!("Fingerprints match for width {}", width);

    let hops = width.min(3);
    let routing = RoutingArray::from_ids((1..=hops as u64).map(U256::from).collect(), width)?;
    let secret = Secret::from_decimal(&rand::thread_rng().gen_range(1..u64::MAX).to_string())?;

    let backend = Groth16Backend::new(artifacts)?;
    let verified = ProofPipeline::new(backend).run(&routing, &secret)?;

    tracing::info!(
        "Sample proof verified ({} bytes, {} public signals)",
        verified.proof().proof.len(),
        verified.proof().public_signals.as_slice().len()
    );
    Ok(())
}
