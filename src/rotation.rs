//! Prover side of a committee rotation: the witness, its public inputs and the
//! constraint system built from it.

use ark_ec::short_weierstrass::{Affine, SWCurveConfig};
use ark_std::{format, vec::Vec};
use derivative::Derivative;
use ethereum_types::U256;
use jf_primitives::rescue::RescueParameter;
use jf_relation::{
    errors::CircuitError,
    gadgets::{from_emulated_field, EmulationConfig},
    BoolVar, Circuit, PlonkCircuit, Variable,
};
use tracing::{debug, span, Level};

use crate::{
    circuit::{
        into_array, point::affine_coordinates, CommitteeRotationGadget, G1PointGadget,
        G1PointVar, RotationVars,
    },
    committee::{Bitlist, Committee},
    config::{u256_to_field, RANGE_BIT_LEN},
    errors::RotationError,
};

/// Public statement of a committee rotation.
#[derive(Derivative)]
#[derivative(
    Clone(bound = "F: Clone"),
    Copy(bound = "F: Copy"),
    Debug(bound = "F: core::fmt::Debug"),
    PartialEq(bound = "F: PartialEq"),
    Eq(bound = "F: Eq")
)]
pub struct RotationClaim<F, P: SWCurveConfig> {
    /// Weight of the old signers carried over to the new committee.
    pub trusted_weight: U256,
    /// Aggregated public key of the new committee signers.
    pub apk: Affine<P>,
    /// Commitment to the old committee.
    pub old_commitment: F,
    /// Commitment to the new committee.
    pub new_commitment: F,
}

/// Full assignment of a committee rotation: both committees, the three
/// bitmaps and the claim derived from them.
#[derive(Derivative)]
#[derivative(
    Clone(bound = "F: Clone"),
    Debug(bound = "F: core::fmt::Debug"),
    PartialEq(bound = "F: PartialEq")
)]
pub struct RotationWitness<F, P: SWCurveConfig, const N: usize> {
    /// Committee handing over.
    pub old_committee: Committee<P, N>,
    /// Committee taking over.
    pub new_committee: Committee<P, N>,
    /// New committee members that signed.
    pub signing_bits: Bitlist<N>,
    /// Old committee members that signed, indexed over the old committee.
    pub old_bits: Bitlist<N>,
    /// The same members, indexed over the new committee.
    pub intersection_bits: Bitlist<N>,
    /// Public statement.
    pub claim: RotationClaim<F, P>,
}

impl<F, P, const N: usize> RotationWitness<F, P, N>
where
    F: RescueParameter,
    P: SWCurveConfig,
    P::BaseField: EmulationConfig<F>,
{
    /// Derive the claim of an honest rotation.
    ///
    /// Fails with [`RotationError::ParameterError`] if the members selected by
    /// `old_bits` are not the ones selected by `intersection_bits`, and with
    /// [`RotationError::WeightOverflow`] if their weights overflow.
    pub fn new(
        old_committee: Committee<P, N>,
        new_committee: Committee<P, N>,
        signing_bits: Bitlist<N>,
        old_bits: Bitlist<N>,
        intersection_bits: Bitlist<N>,
    ) -> Result<Self, RotationError> {
        if old_committee.masked_key_sum(&old_bits)
            != new_committee.masked_key_sum(&intersection_bits)
        {
            return Err(RotationError::ParameterError(format!(
                "{} old signers do not match {} carried over members",
                old_bits.count_ones(),
                intersection_bits.count_ones()
            )));
        }
        let claim = RotationClaim {
            trusted_weight: old_committee.signed_weight(&old_bits)?,
            apk: new_committee.aggregate_key(&signing_bits),
            old_commitment: old_committee.commitment(),
            new_commitment: new_committee.commitment(),
        };
        Ok(Self {
            old_committee,
            new_committee,
            signing_bits,
            old_bits,
            intersection_bits,
            claim,
        })
    }

    /// Public inputs in allocation order: the old commitment, the new
    /// commitment, the trusted weight, then the limbs of `apk.x` and `apk.y`.
    pub fn public_inputs(&self) -> Vec<F> {
        let (x, y) = affine_coordinates(&self.claim.apk);
        let x_limbs: Vec<F> = from_emulated_field(x);
        let y_limbs: Vec<F> = from_emulated_field(y);
        let mut inputs = Vec::with_capacity(3 + x_limbs.len() + y_limbs.len());
        inputs.push(self.claim.old_commitment);
        inputs.push(self.claim.new_commitment);
        inputs.push(u256_to_field(&self.claim.trusted_weight));
        inputs.extend(x_limbs);
        inputs.extend(y_limbs);
        inputs
    }

    /// Allocate the variables of the rotation, public ones first.
    pub fn allocate(
        &self,
        circuit: &mut PlonkCircuit<F>,
    ) -> Result<RotationVars<P::BaseField, N>, CircuitError> {
        let old_commitment = circuit.create_public_variable(self.claim.old_commitment)?;
        let new_commitment = circuit.create_public_variable(self.claim.new_commitment)?;
        let trusted_weight =
            circuit.create_public_variable(u256_to_field(&self.claim.trusted_weight))?;
        let apk = circuit.create_public_g1_point_variable(&self.claim.apk)?;

        let (new_keys, new_weights) = allocate_committee(circuit, &self.new_committee)?;
        let (old_keys, old_weights) = allocate_committee(circuit, &self.old_committee)?;
        Ok(RotationVars {
            new_keys,
            new_weights,
            signing_bits: allocate_bits(circuit, &self.signing_bits)?,
            old_keys,
            old_weights,
            old_bits: allocate_bits(circuit, &self.old_bits)?,
            intersection_bits: allocate_bits(circuit, &self.intersection_bits)?,
            trusted_weight,
            apk,
            old_commitment,
            new_commitment,
        })
    }

    /// Build the constraint system of the rotation.
    pub fn build_circuit(&self) -> Result<PlonkCircuit<F>, RotationError> {
        let span = span!(Level::TRACE, "build_circuit", slots = N);
        let _enter = span.enter();

        let mut circuit = PlonkCircuit::new_ultra_plonk(RANGE_BIT_LEN);
        let vars = self.allocate(&mut circuit)?;
        circuit.enforce_committee_rotation::<P::BaseField, P, N>(&vars)?;
        debug!(
            "rotation circuit built: {} gates, {} public inputs",
            circuit.num_gates(),
            circuit.num_inputs()
        );
        Ok(circuit)
    }

    /// Build the constraint system and check it against [`Self::public_inputs`].
    /// A violated constraint of any of the four checks yields
    /// [`RotationError::Unsatisfied`].
    pub fn check_satisfiability(&self) -> Result<(), RotationError> {
        let circuit = self.build_circuit()?;
        circuit
            .check_circuit_satisfiability(&self.public_inputs())
            .map_err(|e| {
                debug!("committee rotation rejected: {}", e);
                RotationError::Unsatisfied
            })
    }
}

fn allocate_committee<F, P, const N: usize>(
    circuit: &mut PlonkCircuit<F>,
    committee: &Committee<P, N>,
) -> Result<([G1PointVar<P::BaseField>; N], [Variable; N]), CircuitError>
where
    F: RescueParameter,
    P: SWCurveConfig,
    P::BaseField: EmulationConfig<F>,
{
    let keys = committee
        .keys
        .iter()
        .map(|key| circuit.create_g1_point_variable(key))
        .collect::<Result<Vec<_>, _>>()?;
    let weights = committee
        .weights
        .iter()
        .map(|w| circuit.create_variable(u256_to_field(w)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((into_array(keys)?, into_array(weights)?))
}

fn allocate_bits<F: RescueParameter, const N: usize>(
    circuit: &mut PlonkCircuit<F>,
    bits: &Bitlist<N>,
) -> Result<[BoolVar; N], CircuitError> {
    into_array(
        bits.iter()
            .map(|b| circuit.create_boolean_variable(b))
            .collect::<Result<Vec<_>, _>>()?,
    )
}
