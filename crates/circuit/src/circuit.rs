//! The built-in route circuit
//!
//! Used when no compiled circuit is configured. Public inputs, in allocation
//! order: `[commitment, route_0, .., route_{w-1}]`.
//!
//! Constraints, for route `r` of width `w` and secret `s`:
//!
//! - `s` has an inverse, so the secret is non-zero
//! - `z_i = (r_i == 0)` and `z_0` is false, so the route has at least one hop
//! - `z_i * r_{i+1} = 0`, so padding only appears on the right
//! - `commitment = Poseidon(s, r_0, .., r_{w-1})`
//!
//! The commitment is a Poseidon sponge over BN254 (width 3, rate 2, x^5
//! S-box, 8 full and 57 partial rounds), so it binds the route without
//! exposing an algebraic relation that would give up the secret.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_crypto_primitives::sponge::poseidon::{
    find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge,
};
use ark_crypto_primitives::sponge::CryptographicSponge;
use ark_ff::PrimeField;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use std::sync::OnceLock;

const FULL_ROUNDS: u64 = 8;
const PARTIAL_ROUNDS: u64 = 57;
const ALPHA: u64 = 5;
const RATE: usize = 2;
const CAPACITY: usize = 1;

/// Poseidon parameters shared by the native hash and the gadget
pub fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    static CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();
    CONFIG.get_or_init(|| {
        let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
            Fr::MODULUS_BIT_SIZE as u64,
            RATE,
            FULL_ROUNDS,
            PARTIAL_ROUNDS,
            0,
        );
        PoseidonConfig::new(
            FULL_ROUNDS as usize,
            PARTIAL_ROUNDS as usize,
            ALPHA,
            mds,
            ark,
            RATE,
            CAPACITY,
        )
    })
}

/// Concrete values for one proving run
#[derive(Clone)]
pub struct RouteAssignment {
    pub route: Vec<Fr>,
    pub secret: Fr,
}

impl RouteAssignment {
    pub fn commitment(&self) -> Fr {
        commit(&self.route, self.secret)
    }
}

/// Poseidon hash of the secret followed by every route slot
pub fn commit(route: &[Fr], secret: Fr) -> Fr {
    let mut sponge = PoseidonSponge::<Fr>::new(poseidon_config());
    sponge.absorb(&secret);
    for hop in route {
        sponge.absorb(hop);
    }
    sponge.squeeze_field_elements::<Fr>(1).pop().unwrap_or_default()
}

/// The route circuit for a fixed width
///
/// Without an assignment it is only good for key generation.
#[derive(Clone)]
pub struct RouteCircuit {
    width: usize,
    assignment: Option<RouteAssignment>,
}

impl RouteCircuit {
    pub fn blank(width: usize) -> Self {
        Self {
            width,
            assignment: None,
        }
    }

    pub fn with_assignment(assignment: RouteAssignment) -> Self {
        Self {
            width: assignment.route.len(),
            assignment: Some(assignment),
        }
    }
}

fn assigned<T>(value: Option<T>) -> impl FnOnce() -> Result<T, SynthesisError> {
    move || value.ok_or(SynthesisError::AssignmentMissing)
}

impl ConstraintSynthesizer<Fr> for RouteCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        if self.width == 0 {
            return Err(SynthesisError::Unsatisfiable);
        }

        let values = self.assignment.as_ref();

        let commitment = FpVar::<Fr>::new_input(
            cs.clone(),
            assigned(values.map(RouteAssignment::commitment)),
        )?;
        let route = (0..self.width)
            .map(|i| FpVar::<Fr>::new_input(cs.clone(), assigned(values.map(|a| a.route[i]))))
            .collect::<Result<Vec<_>, _>>()?;
        let secret = FpVar::<Fr>::new_witness(cs.clone(), assigned(values.map(|a| a.secret)))?;

        let _inverse = secret.inverse()?;

        let is_zero = route
            .iter()
            .map(|hop| hop.is_eq(&FpVar::zero()))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(first) = is_zero.first() {
            first.enforce_equal(&Boolean::constant(false))?;
        }
        for (z, next) in is_zero.iter().zip(route.iter().skip(1)) {
            (FpVar::from(z.clone()) * next).enforce_equal(&FpVar::zero())?;
        }

        let mut sponge = PoseidonSpongeVar::<Fr>::new(cs, poseidon_config());
        sponge.absorb(&secret)?;
        for hop in &route {
            sponge.absorb(hop)?;
        }
        let digest = sponge.squeeze_field_elements(1)?;
        let digest = digest.first().ok_or(SynthesisError::Unsatisfiable)?;
        commitment.enforce_equal(digest)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::to_field;
    use ark_ff::{Field, One, Zero};
    use ark_relations::r1cs::ConstraintSystem;
    use ethers::types::Address;

    fn satisfied(route: &[u64], secret: u64) -> bool {
        let circuit = RouteCircuit::with_assignment(RouteAssignment {
            route: route.iter().map(|&r| Fr::from(r)).collect(),
            secret: Fr::from(secret),
        });
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    fn route_of(addresses: &[&str]) -> Vec<Fr> {
        addresses
            .iter()
            .map(|a| {
                let address: Address = a.parse().unwrap();
                to_field(ethers::types::U256::from_big_endian(address.as_bytes())).unwrap()
            })
            .collect()
    }

    /// Value at `x` of the lowest-degree polynomial through `points`
    fn extrapolate(points: &[(Fr, Fr)], x: Fr) -> Fr {
        points
            .iter()
            .enumerate()
            .map(|(i, (xi, yi))| {
                points
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .fold(*yi, |acc, (_, (xj, _))| {
                        acc * (x - xj) * (*xi - xj).inverse().unwrap()
                    })
            })
            .fold(Fr::zero(), |sum, term| sum + term)
    }

    #[test]
    fn test_padded_route_is_satisfied() {
        assert!(satisfied(&[11, 22, 33, 0, 0], 1234567890));
        assert!(satisfied(&[11, 22, 33, 44, 55], 7));
    }

    #[test]
    fn test_gap_in_route_is_unsatisfied() {
        assert!(!satisfied(&[11, 0, 33, 0, 0], 1234567890));
    }

    #[test]
    fn test_empty_route_is_unsatisfied() {
        assert!(!satisfied(&[0, 0, 0], 1234567890));
    }

    #[test]
    fn test_zero_secret_is_unsatisfied() {
        assert!(!satisfied(&[11, 22, 0], 0));
    }

    #[test]
    fn test_commitment_depends_on_secret() {
        let route = vec![Fr::from(11u64), Fr::from(22u64), Fr::zero()];
        assert_ne!(commit(&route, Fr::from(5u64)), commit(&route, Fr::from(6u64)));
    }

    #[test]
    fn test_commitment_binds_every_slot() {
        let secret = Fr::from(1234567890u64);
        let base = vec![Fr::from(1u64), Fr::from(2u64), Fr::from(3u64)];
        let committed = commit(&base, secret);

        for i in 0..base.len() {
            let mut changed = base.clone();
            changed[i] += Fr::one();
            assert_ne!(commit(&changed, secret), committed, "slot {} not bound", i);
        }
        assert_ne!(commit(&[base[1], base[0], base[2]], secret), committed);
    }

    #[test]
    fn test_commitment_is_not_a_low_degree_polynomial_in_the_secret() {
        // USDC, DAI, MKR padded to five slots
        let mut route = route_of(&[
            "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
            "0x6b175474e89094c44da98b954eedeac495271d0f",
            "0x9f8f72aa9304c8b593d555f12ef6589cc3a579a2",
        ]);
        route.resize(5, Fr::zero());

        // A fold like ((s + r_0) * s + r_1) * s .. is a degree w + 1
        // polynomial in s, so w + 2 samples pin it down and its roots give
        // the secret back. The extrapolation below catches such a scheme.
        let fold = |s: Fr| route.iter().fold(s, |acc, r| (acc + r) * s);
        let samples: Vec<Fr> = (1..=route.len() as u64 + 2).map(Fr::from).collect();
        let target = Fr::from(1234567890u64);

        let fold_points: Vec<_> = samples.iter().map(|&s| (s, fold(s))).collect();
        assert_eq!(extrapolate(&fold_points, target), fold(target));

        let points: Vec<_> = samples.iter().map(|&s| (s, commit(&route, s))).collect();
        assert_ne!(extrapolate(&points, target), commit(&route, target));
    }

    #[test]
    fn test_public_input_count() {
        let circuit = RouteCircuit::with_assignment(RouteAssignment {
            route: vec![Fr::from(5u64), Fr::zero(), Fr::zero()],
            secret: Fr::from(9u64),
        });
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        // the constant one plus commitment plus three hops
        assert_eq!(cs.num_instance_variables(), 5);
    }
}
