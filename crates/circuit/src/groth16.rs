//! Groth16 over BN254

use crate::{
    compute_witness, CircuitArtifacts, ProofBackend, ProofError, RouteProof, Secret, Witness,
};
use ark_bn254::Bn254;
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use flashroute_models::RoutingArray;

/// Proves and verifies with a fixed set of artifacts
///
/// Witnesses come from the compiled circuit when the artifacts carry one and
/// from the built-in route circuit otherwise.
pub struct Groth16Backend {
    artifacts: CircuitArtifacts,
    prepared_vk: PreparedVerifyingKey<Bn254>,
}

impl Groth16Backend {
    pub fn new(artifacts: CircuitArtifacts) -> Result<Self, ProofError> {
        let prepared_vk = Groth16::<Bn254>::process_vk(artifacts.verifying_key()).map_err(|e| {
            ProofError::Artifact(format!("Failed to prepare verification key: {}", e))
        })?;

        Ok(Self {
            artifacts,
            prepared_vk,
        })
    }

    pub fn artifacts(&self) -> &CircuitArtifacts {
        &self.artifacts
    }
}

impl ProofBackend for Groth16Backend {
    fn compute_witness(
        &self,
        routing: &RoutingArray,
        secret: &Secret,
    ) -> Result<Witness, ProofError> {
        let manifest = self.artifacts.manifest();
        match self.artifacts.compiled() {
            Some(compiled) => compiled.compute_witness(routing, secret, manifest.width),
            None => compute_witness(routing, secret, manifest),
        }
    }

    fn prove(&self, witness: Witness) -> Result<RouteProof, ProofError> {
        let public_signals = witness.public_signals().clone();
        let mut rng = rand::thread_rng();

        let proof =
            Groth16::<Bn254>::prove(self.artifacts.proving_key(), witness.into_circuit(), &mut rng)
                .map_err(|e| ProofError::Proving(e.to_string()))?;

        let mut bytes = Vec::with_capacity(proof.compressed_size());
        proof.serialize_compressed(&mut bytes)?;

        Ok(RouteProof {
            proof: bytes,
            public_signals,
        })
    }

    fn verify(&self, proof: &RouteProof) -> Result<bool, ProofError> {
        let expected = self.artifacts.manifest().width + 1;
        let inputs = proof.public_signals.as_slice();
        if inputs.len() != expected {
            return Err(ProofError::Verification(format!(
                "{} public signals, verification key expects {}",
                inputs.len(),
                expected
            )));
        }

        let decoded = Proof::<Bn254>::deserialize_compressed(proof.proof.as_slice())?;

        Groth16::<Bn254>::verify_with_processed_vk(&self.prepared_vk, inputs, &decoded)
            .map_err(|e| ProofError::Verification(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PublicSignals;
    use ark_bn254::Fr;
    use ark_ff::One;
    use ethers::types::U256;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn backend() -> Groth16Backend {
        let mut rng = StdRng::seed_from_u64(3);
        Groth16Backend::new(CircuitArtifacts::generate(4, &mut rng).unwrap()).unwrap()
    }

    fn routing() -> RoutingArray {
        RoutingArray::from_ids(vec![U256::from(0xaa), U256::from(0xbb)], 4).unwrap()
    }

    #[test]
    fn test_valid_route_verifies() {
        let backend = backend();
        let secret = Secret::from_decimal("1234567890").unwrap();
        let witness = backend.compute_witness(&routing(), &secret).unwrap();
        let proof = backend.prove(witness).unwrap();

        assert!(backend.verify(&proof).unwrap());
    }

    #[test]
    fn test_tampered_signals_fail() {
        let backend = backend();
        let secret = Secret::from_decimal("1234567890").unwrap();
        let proof = backend
            .prove(backend.compute_witness(&routing(), &secret).unwrap())
            .unwrap();

        let mut commitment_bumped = proof.public_signals.clone().into_inner();
        commitment_bumped[0] += Fr::one();
        let tampered = RouteProof {
            proof: proof.proof.clone(),
            public_signals: PublicSignals::new(commitment_bumped),
        };
        assert!(!backend.verify(&tampered).unwrap());

        let mut hop_swapped = proof.public_signals.clone().into_inner();
        hop_swapped.swap(1, 2);
        let tampered = RouteProof {
            proof: proof.proof.clone(),
            public_signals: PublicSignals::new(hop_swapped),
        };
        assert!(!backend.verify(&tampered).unwrap());
    }

    #[test]
    fn test_wrong_signal_count_is_an_error() {
        let backend = backend();
        let secret = Secret::from_decimal("5").unwrap();
        let proof = backend
            .prove(backend.compute_witness(&routing(), &secret).unwrap())
            .unwrap();

        let mut short = proof.public_signals.into_inner();
        short.pop();
        let result = backend.verify(&RouteProof {
            proof: proof.proof,
            public_signals: PublicSignals::new(short),
        });
        assert!(matches!(result, Err(ProofError::Verification(_))));
    }

    #[test]
    fn test_garbage_proof_bytes() {
        let backend = backend();
        let secret = Secret::from_decimal("5").unwrap();
        let witness = backend.compute_witness(&routing(), &secret).unwrap();
        let signals = witness.public_signals().clone();

        let result = backend.verify(&RouteProof {
            proof: vec![0u8; 7],
            public_signals: signals,
        });
        assert!(matches!(result, Err(ProofError::Serialization(_))));
    }
}
