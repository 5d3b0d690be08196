//! Witness computation and public signals

use crate::circuit::{RouteAssignment, RouteCircuit};
use crate::{CircuitManifest, ProofError};
use ark_bn254::Fr;
use ark_circom::CircomCircuit;
use ark_ff::{BigInteger, PrimeField};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, SynthesisError,
};
use ethers::types::U256;
use flashroute_models::RoutingArray;
use num_bigint::BigUint;
use std::fmt;
use std::str::FromStr;

fn modulus() -> BigUint {
    Fr::MODULUS.into()
}

/// Map an integer into the scalar field, rejecting anything not below the modulus
pub fn to_field(value: U256) -> Option<Fr> {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    let value = BigUint::from_bytes_be(&bytes);
    (value < modulus()).then(|| Fr::from(value))
}

pub fn from_field(value: &Fr) -> U256 {
    U256::from_big_endian(&value.into_bigint().to_bytes_be())
}

/// The private field element bound into the route commitment
///
/// Never printed and never part of the public signals.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Fr);

impl Secret {
    /// Parse a decimal field element
    pub fn from_decimal(raw: &str) -> Result<Self, ProofError> {
        let trimmed = raw.trim();
        let value = BigUint::parse_bytes(trimmed.as_bytes(), 10)
            .ok_or_else(|| ProofError::InvalidSecret("not a decimal integer".to_string()))?;
        if value >= modulus() {
            return Err(ProofError::InvalidSecret("outside the scalar field".to_string()));
        }
        Ok(Self(Fr::from(value)))
    }

    pub(crate) fn value(&self) -> Fr {
        self.0
    }
}

impl FromStr for Secret {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal(s)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

/// Public inputs of a proof: `[commitment, route_0, .., route_{w-1}]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicSignals(Vec<Fr>);

impl PublicSignals {
    pub fn new(signals: Vec<Fr>) -> Self {
        Self(signals)
    }

    pub fn as_slice(&self) -> &[Fr] {
        &self.0
    }

    pub fn commitment(&self) -> Option<&Fr> {
        self.0.first()
    }

    pub fn route(&self) -> &[Fr] {
        self.0.get(1..).unwrap_or(&[])
    }

    /// Whether the route part carries exactly `routing`
    pub fn matches(&self, routing: &RoutingArray) -> bool {
        let route = self.route();
        route.len() == routing.width()
            && route
                .iter()
                .zip(routing.values())
                .all(|(signal, value)| to_field(*value).as_ref() == Some(signal))
    }

    pub fn to_decimal_strings(&self) -> Vec<String> {
        self.0.iter().map(|v| from_field(v).to_string()).collect()
    }

    pub fn into_inner(self) -> Vec<Fr> {
        self.0
    }
}

/// The circuit a witness was computed against
#[derive(Clone)]
pub(crate) enum WitnessCircuit {
    BuiltIn(RouteCircuit),
    Compiled(CircomCircuit<Fr>),
}

impl ConstraintSynthesizer<Fr> for WitnessCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        match self {
            Self::BuiltIn(circuit) => circuit.generate_constraints(cs),
            Self::Compiled(circuit) => circuit.generate_constraints(cs),
        }
    }
}

/// A satisfied assignment, ready for proving
pub struct Witness {
    circuit: WitnessCircuit,
    public_signals: PublicSignals,
    width: usize,
}

impl Witness {
    pub(crate) fn new(
        circuit: WitnessCircuit,
        public_signals: PublicSignals,
        width: usize,
    ) -> Self {
        Self {
            circuit,
            public_signals,
            width,
        }
    }

    pub fn public_signals(&self) -> &PublicSignals {
        &self.public_signals
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn into_circuit(self) -> WitnessCircuit {
        self.circuit
    }
}

impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Witness")
            .field("width", &self.width)
            .field("public_signals", &self.public_signals)
            .finish_non_exhaustive()
    }
}

/// Field elements of a routing array laid out for a circuit of `width` slots
pub(crate) fn route_fields(routing: &RoutingArray, width: usize) -> Result<Vec<Fr>, ProofError> {
    if routing.width() != width {
        return Err(ProofError::WitnessComputation(format!(
            "route width {} does not match circuit width {}",
            routing.width(),
            width
        )));
    }

    routing
        .values()
        .iter()
        .enumerate()
        .map(|(i, value)| {
            to_field(*value).ok_or_else(|| {
                ProofError::WitnessComputation(format!("route[{}] is outside the scalar field", i))
            })
        })
        .collect()
}

/// Synthesize `circuit` and check every constraint holds
pub(crate) fn check_satisfied<C: ConstraintSynthesizer<Fr>>(circuit: C) -> Result<(), ProofError> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit
        .generate_constraints(cs.clone())
        .map_err(|e| ProofError::WitnessComputation(e.to_string()))?;

    let satisfied = cs
        .is_satisfied()
        .map_err(|e| ProofError::WitnessComputation(e.to_string()))?;
    if !satisfied {
        let which = cs
            .which_is_unsatisfied()
            .ok()
            .flatten()
            .unwrap_or_else(|| "unknown".to_string());
        return Err(ProofError::WitnessComputation(format!(
            "constraint {} is not satisfied",
            which
        )));
    }

    tracing::debug!(
        "Witness computed: {} constraints, {} witness variables",
        cs.num_constraints(),
        cs.num_witness_variables()
    );
    Ok(())
}

/// Build the full assignment for the built-in circuit and check it
pub fn compute_witness(
    routing: &RoutingArray,
    secret: &Secret,
    manifest: &CircuitManifest,
) -> Result<Witness, ProofError> {
    let route = route_fields(routing, manifest.width)?;

    let assignment = RouteAssignment {
        route,
        secret: secret.value(),
    };
    let mut signals = Vec::with_capacity(assignment.route.len() + 1);
    signals.push(assignment.commitment());
    signals.extend_from_slice(&assignment.route);

    let circuit = RouteCircuit::with_assignment(assignment);
    check_satisfied(circuit.clone())?;

    Ok(Witness::new(
        WitnessCircuit::BuiltIn(circuit),
        PublicSignals::new(signals),
        manifest.width,
    ))
}
