//! Zero-knowledge gate for flashroute bundles
//!
//! A route is committed under a private secret inside an R1CS circuit and
//! proven with Groth16 over BN254. [`ProofPipeline`] runs witness, proof and
//! verification in order; only a passing verification yields the
//! [`VerifiedRoute`] that the bundle submitter accepts.
//!
//! The circuit and keys come from fixed artifacts (see [`CircuitArtifacts`]),
//! generated once by `flashroute setup` and loaded read-only afterwards. The
//! circuit is a compiled circom circuit ([`CompiledCircuit`]) when one is
//! given at setup, and the built-in [`RouteCircuit`] otherwise.

mod artifacts;
mod backend;
mod circuit;
mod compiled;
mod error;
mod groth16;
mod pipeline;
mod witness;

pub use artifacts::{
    ArtifactPaths, CircuitArtifacts, CircuitManifest, CircuitSource, CIRCUIT_NAME, CIRCUIT_VERSION,
};
pub use backend::{ProofBackend, RouteProof};
pub use circuit::{commit, RouteAssignment, RouteCircuit};
pub use compiled::CompiledCircuit;
pub use error::ProofError;
pub use groth16::Groth16Backend;
pub use pipeline::{ProofPipeline, ProofStage, VerifiedRoute};
pub use witness::{compute_witness, from_field, to_field, PublicSignals, Secret, Witness};

pub use ark_bn254::Fr;
