//! Circuit implementation of the committee commitment.
//!
//! A committee is bound to a single field element by a flat two-level Rescue
//! fold: each key coordinate is hashed from its limbs, each slot digest is
//! `H(H(x), H(y), weight)`, and the commitment is `H(slot_0, .., slot_{N-1})`.
//! Slot order matters.

use ark_std::{format, vec::Vec};
use jf_primitives::{circuit::rescue::RescueNativeGadget, rescue::RescueParameter};
use jf_relation::{
    errors::CircuitError,
    gadgets::{EmulatedVariable, EmulationConfig},
    PlonkCircuit, Variable,
};
use tracing::{span, Level};

use super::point::G1PointVar;

/// Plonk circuit gadget hashing a committee into its commitment.
pub trait CommitteeCommitmentGadget<F: RescueParameter> {
    /// Returns the commitment to a committee.
    /// * `keys` - list of validator public keys.
    /// * `weights` - list of weights for the corresponding keys.
    fn committee_commitment<E, const N: usize>(
        &mut self,
        keys: &[G1PointVar<E>; N],
        weights: &[Variable; N],
    ) -> Result<Variable, CircuitError>
    where
        E: EmulationConfig<F>;

    /// Hash the limbs of an emulated coordinate into one native element.
    fn coordinate_digest<E>(&mut self, coord: &EmulatedVariable<E>) -> Result<Variable, CircuitError>
    where
        E: EmulationConfig<F>;
}

impl<F: RescueParameter> CommitteeCommitmentGadget<F> for PlonkCircuit<F> {
    fn committee_commitment<E, const N: usize>(
        &mut self,
        keys: &[G1PointVar<E>; N],
        weights: &[Variable; N],
    ) -> Result<Variable, CircuitError>
    where
        E: EmulationConfig<F>,
    {
        let span = span!(Level::TRACE, "committee_commitment", slots = N);
        let _enter = span.enter();

        let mut slot_digests = Vec::with_capacity(N);
        for (key, &weight) in keys.iter().zip(weights.iter()) {
            let x_digest = self.coordinate_digest(&key.x)?;
            let y_digest = self.coordinate_digest(&key.y)?;
            let slot_digest = RescueNativeGadget::<F>::rescue_sponge_with_padding(
                self,
                &[x_digest, y_digest, weight],
                1,
            )?[0];
            slot_digests.push(slot_digest);
        }
        Ok(RescueNativeGadget::<F>::rescue_sponge_with_padding(self, &slot_digests, 1)?[0])
    }

    fn coordinate_digest<E>(&mut self, coord: &EmulatedVariable<E>) -> Result<Variable, CircuitError>
    where
        E: EmulationConfig<F>,
    {
        let limbs = coord.to_vec();
        if limbs.len() != E::NUM_LIMBS {
            return Err(CircuitError::ParameterError(format!(
                "coordinate has {} limbs, expected {}",
                limbs.len(),
                E::NUM_LIMBS,
            )));
        }
        Ok(RescueNativeGadget::<F>::rescue_sponge_with_padding(self, &limbs, 1)?[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        circuit::{into_array, point::G1PointGadget},
        committee::Committee,
        config::{u256_to_field, CurveParam, EmulatedField, NativeField, RANGE_BIT_LEN},
    };
    use ark_ec::{short_weierstrass::Projective, CurveGroup};
    use ark_std::UniformRand;
    use ethereum_types::U256;
    use jf_relation::Circuit;

    type G1 = Projective<CurveParam>;
    const N: usize = 4;

    fn committee() -> Committee<CurveParam, N> {
        let mut rng = jf_utils::test_rng();
        Committee::new(
            [(); N].map(|_| G1::rand(&mut rng).into_affine()),
            [3u64, 1, 4, 1].map(U256::from),
        )
    }

    fn circuit_commitment(
        committee: &Committee<CurveParam, N>,
    ) -> Result<(PlonkCircuit<NativeField>, Variable), CircuitError> {
        let mut circuit = PlonkCircuit::<NativeField>::new_ultra_plonk(RANGE_BIT_LEN);
        let keys: [G1PointVar<EmulatedField>; N] = into_array(
            committee
                .keys
                .iter()
                .map(|key| circuit.create_g1_point_variable(key))
                .collect::<Result<Vec<_>, _>>()?,
        )?;
        let weights: [Variable; N] = into_array(
            committee
                .weights
                .iter()
                .map(|w| circuit.create_variable(u256_to_field(w)))
                .collect::<Result<Vec<_>, _>>()?,
        )?;
        let digest = circuit.committee_commitment(&keys, &weights)?;
        Ok((circuit, digest))
    }

    #[test]
    fn test_commitment_matches_native() -> Result<(), CircuitError> {
        let committee = committee();
        let expected: NativeField = committee.commitment();

        let (mut circuit, digest) = circuit_commitment(&committee)?;
        assert_eq!(circuit.witness(digest)?, expected);

        let claimed = circuit.create_variable(expected)?;
        circuit.enforce_equal(digest, claimed)?;
        assert!(circuit.check_circuit_satisfiability(&[]).is_ok());

        // bad path: wrong claimed commitment
        *circuit.witness_mut(claimed) = expected + NativeField::from(1u8);
        assert!(circuit.check_circuit_satisfiability(&[]).is_err());
        Ok(())
    }

    #[test]
    fn test_commitment_is_deterministic() {
        let a: NativeField = committee().commitment();
        let b: NativeField = committee().commitment();
        assert_eq!(a, b);
    }

    #[test]
    fn test_commitment_sensitivity() {
        let base = committee();
        let expected: NativeField = base.commitment();

        for i in 0..N {
            let mut changed = base.clone();
            changed.weights[i] = changed.weights[i] + U256::one();
            assert_ne!(changed.commitment::<NativeField>(), expected);

            let mut changed = base.clone();
            changed.keys[i] = (G1::from(changed.keys[i]) + G1::from(changed.keys[i])).into_affine();
            assert_ne!(changed.commitment::<NativeField>(), expected);
        }

        // slot order is part of the commitment
        let mut swapped = base.clone();
        swapped.keys.swap(0, 1);
        swapped.weights.swap(0, 1);
        assert_ne!(swapped.commitment::<NativeField>(), expected);
    }

    #[test]
    fn test_coordinate_digest_limbs() -> Result<(), CircuitError> {
        let mut circuit = PlonkCircuit::<NativeField>::new_ultra_plonk(RANGE_BIT_LEN);
        let coord = circuit.create_emulated_variable(EmulatedField::from(42u64))?;
        assert_eq!(coord.to_vec().len(), <EmulatedField as EmulationConfig<NativeField>>::NUM_LIMBS);
        circuit.coordinate_digest(&coord)?;
        assert!(circuit.check_circuit_satisfiability(&[]).is_ok());
        Ok(())
    }
}
