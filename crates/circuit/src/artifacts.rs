//! Proving artifacts: compiled circuit, proving key, verification key
//!
//! Keys are stored in arkworks compressed encoding. The manifest pins the
//! SHA-256 fingerprint of every file so a stale or swapped artifact is
//! caught at load time rather than as a failed verification.
//!
//! The circuit is normally a compiled circom circuit (`circuit.wasm` and
//! `circuit.r1cs`). A directory set up without one falls back to the
//! built-in route circuit, recorded as such in the manifest.

use crate::circuit::RouteCircuit;
use crate::{CompiledCircuit, ProofError};
use ark_bn254::Bn254;
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::CircuitSpecificSetupSNARK;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

pub const CIRCUIT_NAME: &str = "flashroute-route";
pub const CIRCUIT_VERSION: u32 = 2;

/// Which circuit the keys belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CircuitSource {
    /// `circuit.wasm` and `circuit.r1cs` next to the manifest
    Compiled {
        wasm_sha256: String,
        r1cs_sha256: String,
    },
    /// The route circuit built into this crate
    BuiltIn,
}

/// Describes the circuit the keys were generated for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitManifest {
    pub name: String,
    pub version: u32,
    /// Number of route slots
    pub width: usize,
    pub circuit: CircuitSource,
    pub proving_key_sha256: String,
    pub verifying_key_sha256: String,
}

impl CircuitManifest {
    pub fn new(
        width: usize,
        circuit: CircuitSource,
        proving_key_sha256: &str,
        verifying_key_sha256: &str,
    ) -> Self {
        Self {
            name: CIRCUIT_NAME.to_string(),
            version: CIRCUIT_VERSION,
            width,
            circuit,
            proving_key_sha256: proving_key_sha256.to_string(),
            verifying_key_sha256: verifying_key_sha256.to_string(),
        }
    }
}

/// Where the artifact files live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub manifest: PathBuf,
    pub wasm: PathBuf,
    pub r1cs: PathBuf,
    pub proving_key: PathBuf,
    pub verifying_key: PathBuf,
}

impl ArtifactPaths {
    /// Conventional file names inside one directory
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            manifest: dir.join("circuit.json"),
            wasm: dir.join("circuit.wasm"),
            r1cs: dir.join("circuit.r1cs"),
            proving_key: dir.join("proving_key.bin"),
            verifying_key: dir.join("verification_key.bin"),
        }
    }
}

fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn read(path: &Path) -> Result<Vec<u8>, ProofError> {
    std::fs::read(path)
        .map_err(|e| ProofError::Artifact(format!("Failed to read {}: {}", path.display(), e)))
}

/// Loaded keys plus their manifest
#[derive(Clone)]
pub struct CircuitArtifacts {
    manifest: CircuitManifest,
    compiled: Option<CompiledCircuit>,
    proving_key: ProvingKey<Bn254>,
    verifying_key: VerifyingKey<Bn254>,
}

impl CircuitArtifacts {
    /// Run the circuit-specific setup for a compiled circuit of `width` slots
    pub fn generate_compiled<R: RngCore + CryptoRng>(
        width: usize,
        compiled: CompiledCircuit,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        check_width(width)?;

        let [wasm, r1cs] = compiled.files().map(read);
        let source = CircuitSource::Compiled {
            wasm_sha256: fingerprint(&wasm?),
            r1cs_sha256: fingerprint(&r1cs?),
        };

        let (proving_key, verifying_key) = Groth16::<Bn254>::setup(compiled.blank()?, rng)
            .map_err(|e| ProofError::Artifact(format!("Setup failed: {}", e)))?;
        check_input_count(&verifying_key, width)?;

        Self::assemble(width, source, Some(compiled), proving_key, verifying_key)
    }

    /// Run the circuit-specific setup for the built-in circuit
    pub fn generate<R: RngCore + CryptoRng>(width: usize, rng: &mut R) -> Result<Self, ProofError> {
        check_width(width)?;

        let (proving_key, verifying_key) =
            Groth16::<Bn254>::setup(RouteCircuit::blank(width), rng)
                .map_err(|e| ProofError::Artifact(format!("Setup failed: {}", e)))?;

        Self::assemble(width, CircuitSource::BuiltIn, None, proving_key, verifying_key)
    }

    fn assemble(
        width: usize,
        source: CircuitSource,
        compiled: Option<CompiledCircuit>,
        proving_key: ProvingKey<Bn254>,
        verifying_key: VerifyingKey<Bn254>,
    ) -> Result<Self, ProofError> {
        let pk_bytes = encode(&proving_key)?;
        let vk_bytes = encode(&verifying_key)?;
        let manifest =
            CircuitManifest::new(width, source, &fingerprint(&pk_bytes), &fingerprint(&vk_bytes));

        tracing::info!(
            "Generated artifacts for {} v{} (width {}, {} circuit)",
            manifest.name,
            manifest.version,
            width,
            if compiled.is_some() { "compiled" } else { "built-in" }
        );

        Ok(Self {
            manifest,
            compiled,
            proving_key,
            verifying_key,
        })
    }

    /// Write every file, creating parent directories
    ///
    /// A compiled circuit is copied next to the manifest.
    pub fn save(&self, paths: &ArtifactPaths) -> Result<(), ProofError> {
        for path in [&paths.manifest, &paths.proving_key, &paths.verifying_key] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        if let Some(compiled) = &self.compiled {
            for (from, to) in compiled.files().into_iter().zip([&paths.wasm, &paths.r1cs]) {
                if from != to.as_path() {
                    std::fs::copy(from, to)?;
                }
            }
        }

        std::fs::write(&paths.proving_key, encode(&self.proving_key)?)?;
        std::fs::write(&paths.verifying_key, encode(&self.verifying_key)?)?;
        let manifest = serde_json::to_string_pretty(&self.manifest)
            .map_err(|e| ProofError::Serialization(e.to_string()))?;
        std::fs::write(&paths.manifest, manifest)?;

        tracing::info!("Artifacts written to {}", paths.manifest.display());
        Ok(())
    }

    /// Load and cross-check the artifacts
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ProofError> {
        let manifest: CircuitManifest = serde_json::from_slice(&read(&paths.manifest)?)
            .map_err(|e| ProofError::Artifact(format!("Invalid circuit manifest: {}", e)))?;

        if manifest.name != CIRCUIT_NAME || manifest.version != CIRCUIT_VERSION {
            return Err(ProofError::Artifact(format!(
                "Manifest describes {} v{}, expected {} v{}",
                manifest.name, manifest.version, CIRCUIT_NAME, CIRCUIT_VERSION
            )));
        }

        let compiled = match &manifest.circuit {
            CircuitSource::Compiled {
                wasm_sha256,
                r1cs_sha256,
            } => {
                check_fingerprint("compiled circuit wasm", &read(&paths.wasm)?, wasm_sha256)?;
                check_fingerprint("compiled circuit r1cs", &read(&paths.r1cs)?, r1cs_sha256)?;
                Some(CompiledCircuit::new(&paths.wasm, &paths.r1cs))
            }
            CircuitSource::BuiltIn => {
                tracing::warn!("Artifacts carry no compiled circuit, using the built-in one");
                None
            }
        };

        let pk_bytes = read(&paths.proving_key)?;
        check_fingerprint("proving key", &pk_bytes, &manifest.proving_key_sha256)?;
        let vk_bytes = read(&paths.verifying_key)?;
        check_fingerprint("verification key", &vk_bytes, &manifest.verifying_key_sha256)?;

        let proving_key = ProvingKey::<Bn254>::deserialize_compressed(pk_bytes.as_slice())?;
        let verifying_key = VerifyingKey::<Bn254>::deserialize_compressed(vk_bytes.as_slice())?;
        check_input_count(&verifying_key, manifest.width)?;

        tracing::debug!("Loaded artifacts for width {}", manifest.width);

        Ok(Self {
            manifest,
            compiled,
            proving_key,
            verifying_key,
        })
    }

    pub fn manifest(&self) -> &CircuitManifest {
        &self.manifest
    }

    /// The compiled circuit, `None` for the built-in one
    pub fn compiled(&self) -> Option<&CompiledCircuit> {
        self.compiled.as_ref()
    }

    pub fn proving_key(&self) -> &ProvingKey<Bn254> {
        &self.proving_key
    }

    pub fn verifying_key(&self) -> &VerifyingKey<Bn254> {
        &self.verifying_key
    }
}

fn check_width(width: usize) -> Result<(), ProofError> {
    if width == 0 {
        return Err(ProofError::Artifact("circuit width must be at least 1".to_string()));
    }
    Ok(())
}

/// Commitment plus one input per route slot
fn check_input_count(verifying_key: &VerifyingKey<Bn254>, width: usize) -> Result<(), ProofError> {
    if verifying_key.gamma_abc_g1.len() != width + 2 {
        return Err(ProofError::Artifact(format!(
            "Verification key takes {} public inputs, manifest width is {}",
            verifying_key.gamma_abc_g1.len().saturating_sub(1),
            width
        )));
    }
    Ok(())
}

fn encode<T: CanonicalSerialize>(value: &T) -> Result<Vec<u8>, ProofError> {
    let mut bytes = Vec::with_capacity(value.compressed_size());
    value.serialize_compressed(&mut bytes)?;
    Ok(bytes)
}

fn check_fingerprint(label: &str, bytes: &[u8], expected: &str) -> Result<(), ProofError> {
    let actual = fingerprint(bytes);
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(ProofError::Artifact(format!(
            "{} fingerprint {} does not match manifest {}",
            label, actual, expected
        )));
    }
    Ok(())
}
