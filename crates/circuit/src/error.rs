use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProofError {
    #[error("Witness computation failed: {0}")]
    WitnessComputation(String),
    #[error("Proof generation failed: {0}")]
    Proving(String),
    #[error("Verification could not run: {0}")]
    Verification(String),
    #[error("Proof failed verification")]
    InvalidProof,
    #[error("Public signals carry a different route than the one submitted")]
    PublicSignalMismatch,
    #[error("Invalid secret: {0}")]
    InvalidSecret(String),
    #[error("Artifact error: {0}")]
    Artifact(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ark_serialize::SerializationError> for ProofError {
    fn from(e: ark_serialize::SerializationError) -> Self {
        Self::Serialization(e.to_string())
    }
}
