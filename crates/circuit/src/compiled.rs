//! Compiled circom circuits
//!
//! The circuit is read from its `.wasm` witness generator and `.r1cs`
//! constraint file each time a witness is computed. It must take the route
//! as a public `arr[width]` input and the secret as a private `secret`
//! input, and expose exactly one output, so that its public signals line up
//! as `[output, arr_0, .., arr_{w-1}]`.

use crate::witness::{check_satisfied, route_fields, WitnessCircuit};
use crate::{ProofError, PublicSignals, Secret, Witness};
use ark_bn254::Fr;
use ark_circom::{CircomBuilder, CircomCircuit, CircomConfig};
use ark_ff::PrimeField;
use flashroute_models::RoutingArray;
use num_bigint::{BigInt, BigUint};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// Name of the route input array
const ROUTE_INPUT: &str = "arr";
/// Name of the private secret input
const SECRET_INPUT: &str = "secret";

/// Paths to a compiled circuit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCircuit {
    pub wasm: PathBuf,
    pub r1cs: PathBuf,
}

fn to_bigint(value: &Fr) -> BigInt {
    BigInt::from(BigUint::from(value.into_bigint()))
}

/// Run a call into the circom loader, turning its panics into errors
///
/// The wasm loader unwraps internally on malformed modules.
fn guarded<T, E: std::fmt::Display>(
    stage: &str,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, String> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("{}: {}", stage, e)),
        Err(_) => Err(format!("{}: loader panicked", stage)),
    }
}

impl CompiledCircuit {
    pub fn new(wasm: impl Into<PathBuf>, r1cs: impl Into<PathBuf>) -> Self {
        Self {
            wasm: wasm.into(),
            r1cs: r1cs.into(),
        }
    }

    fn load(&self) -> Result<CircomConfig<Fr>, String> {
        for path in [&self.wasm, &self.r1cs] {
            if !path.is_file() {
                return Err(format!("compiled circuit file {} is missing", path.display()));
            }
        }
        guarded("loading compiled circuit", || {
            CircomConfig::<Fr>::new(&self.wasm, &self.r1cs)
        })
    }

    /// The constraint system without a witness, for key generation
    pub fn blank(&self) -> Result<CircomCircuit<Fr>, ProofError> {
        let config = self.load().map_err(ProofError::Artifact)?;
        Ok(CircomBuilder::new(config).setup())
    }

    /// Run the witness generator on the route and secret
    pub fn compute_witness(
        &self,
        routing: &RoutingArray,
        secret: &Secret,
        width: usize,
    ) -> Result<Witness, ProofError> {
        let route = route_fields(routing, width)?;
        let config = self.load().map_err(ProofError::WitnessComputation)?;

        let mut builder = CircomBuilder::new(config);
        for hop in &route {
            builder.push_input(ROUTE_INPUT, to_bigint(hop));
        }
        builder.push_input(SECRET_INPUT, to_bigint(&secret.value()));

        let circuit = guarded("witness generation", || builder.build())
            .map_err(ProofError::WitnessComputation)?;

        let public = circuit.get_public_inputs().ok_or_else(|| {
            ProofError::WitnessComputation("witness carries no public inputs".to_string())
        })?;
        if public.len() != width + 1 {
            return Err(ProofError::WitnessComputation(format!(
                "compiled circuit exposes {} public signals, expected {}",
                public.len(),
                width + 1
            )));
        }

        check_satisfied(circuit.clone())?;

        Ok(Witness::new(
            WitnessCircuit::Compiled(circuit),
            PublicSignals::new(public),
            width,
        ))
    }

    /// Both files, for fingerprinting and copying
    pub fn files(&self) -> [&Path; 2] {
        [&self.wasm, &self.r1cs]
    }
}
