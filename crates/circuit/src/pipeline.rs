//! Witness -> proof -> verification, as a gate in front of submission

use crate::{ProofBackend, ProofError, RouteProof, Secret};
use flashroute_models::RoutingArray;
use std::fmt;

/// Where a pipeline run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofStage {
    Idle,
    WitnessComputed,
    ProofGenerated,
    Verified(bool),
}

impl fmt::Display for ProofStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::WitnessComputed => write!(f, "witness computed"),
            Self::ProofGenerated => write!(f, "proof generated"),
            Self::Verified(true) => write!(f, "verified"),
            Self::Verified(false) => write!(f, "rejected"),
        }
    }
}

/// A route whose proof verified
///
/// Only [`ProofPipeline::run`] can produce one, so holding it means the
/// verification gate was passed.
#[derive(Debug, Clone)]
pub struct VerifiedRoute {
    routing: RoutingArray,
    proof: RouteProof,
}

impl VerifiedRoute {
    pub fn routing(&self) -> &RoutingArray {
        &self.routing
    }

    pub fn proof(&self) -> &RouteProof {
        &self.proof
    }
}

pub struct ProofPipeline<B> {
    backend: B,
    stage: ProofStage,
}

impl<B: ProofBackend> ProofPipeline<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            stage: ProofStage::Idle,
        }
    }

    pub fn stage(&self) -> ProofStage {
        self.stage
    }

    fn advance(&mut self, stage: ProofStage) {
        tracing::debug!("Proof pipeline: {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    /// Prove `routing` under `secret` and verify the result
    ///
    /// Fails with `InvalidProof` when verification returns false and with
    /// `PublicSignalMismatch` when the proof commits to a different route.
    pub fn run(
        &mut self,
        routing: &RoutingArray,
        secret: &Secret,
    ) -> Result<VerifiedRoute, ProofError> {
        self.stage = ProofStage::Idle;

        let witness = self.backend.compute_witness(routing, secret)?;
        self.advance(ProofStage::WitnessComputed);

        let proof = self.backend.prove(witness)?;
        self.advance(ProofStage::ProofGenerated);

        let valid = self.backend.verify(&proof)?;
        self.advance(ProofStage::Verified(valid));

        if !valid {
            tracing::warn!("Route proof rejected by the verification key");
            return Err(ProofError::InvalidProof);
        }

        if !proof.public_signals.matches(routing) {
            tracing::warn!("Route proof commits to a different route");
            return Err(ProofError::PublicSignalMismatch);
        }

        tracing::info!("Route proof verified ({} hops)", routing.route_len());

        Ok(VerifiedRoute {
            routing: routing.clone(),
            proof,
        })
    }
}
