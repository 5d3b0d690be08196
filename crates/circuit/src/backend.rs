//! The proving seam

use crate::{ProofError, PublicSignals, Secret, Witness};
use flashroute_models::RoutingArray;
use std::sync::Arc;

/// A proof and the public signals it commits to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteProof {
    /// Serialized proof, opaque outside the backend
    pub proof: Vec<u8>,
    pub public_signals: PublicSignals,
}

/// The three proving stages
///
/// Implementations are synchronous and CPU-bound; async callers run them on
/// the blocking pool.
pub trait ProofBackend: Send + Sync {
    fn compute_witness(
        &self,
        routing: &RoutingArray,
        secret: &Secret,
    ) -> Result<Witness, ProofError>;

    fn prove(&self, witness: Witness) -> Result<RouteProof, ProofError>;

    /// `Ok(false)` for a well-formed proof that does not verify
    fn verify(&self, proof: &RouteProof) -> Result<bool, ProofError>;
}

impl<T: ProofBackend + ?Sized> ProofBackend for Arc<T> {
    fn compute_witness(
        &self,
        routing: &RoutingArray,
        secret: &Secret,
    ) -> Result<Witness, ProofError> {
        (**self).compute_witness(routing, secret)
    }

    fn prove(&self, witness: Witness) -> Result<RouteProof, ProofError> {
        (**self).prove(witness)
    }

    fn verify(&self, proof: &RouteProof) -> Result<bool, ProofError> {
        (**self).verify(proof)
    }
}

impl<T: ProofBackend + ?Sized> ProofBackend for &T {
    fn compute_witness(
        &self,
        routing: &RoutingArray,
        secret: &Secret,
    ) -> Result<Witness, ProofError> {
        (**self).compute_witness(routing, secret)
    }

    fn prove(&self, witness: Witness) -> Result<RouteProof, ProofError> {
        (**self).prove(witness)
    }

    fn verify(&self, proof: &RouteProof) -> Result<bool, ProofError> {
        (**self).verify(proof)
    }
}
