//! Circuit implementation of the committee rotation relation.

use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ff::PrimeField;
use jf_primitives::rescue::RescueParameter;
use jf_relation::{
    errors::CircuitError, gadgets::EmulationConfig, BoolVar, Circuit, PlonkCircuit, Variable,
};
use tracing::{debug, span, Level};

use super::{
    aggregate::ConditionalAggregateGadget,
    commitment::CommitteeCommitmentGadget,
    intersection::TrustedWeightGadget,
    point::{G1PointGadget, G1PointVar},
};
use crate::config::g1_offset;

#[derive(Debug, Clone)]
/// Variables of one committee rotation instance.
/// All per-slot arrays of a committee must use the same slot order as the
/// committee commitment.
pub struct RotationVars<E: PrimeField, const N: usize> {
    /// Public keys of the new committee.
    pub new_keys: [G1PointVar<E>; N],
    /// Weights of the new committee.
    pub new_weights: [Variable; N],
    /// New committee members that signed, indexed over `new_keys`.
    pub signing_bits: [BoolVar; N],
    /// Public keys of the old committee.
    pub old_keys: [G1PointVar<E>; N],
    /// Weights of the old committee.
    pub old_weights: [Variable; N],
    /// Old committee members that signed, indexed over `old_keys`.
    pub old_bits: [BoolVar; N],
    /// The same members as `old_bits`, indexed over `new_keys`.
    pub intersection_bits: [BoolVar; N],
    /// Claimed trusted weight.
    pub trusted_weight: Variable,
    /// Claimed aggregated public key of the signers.
    pub apk: G1PointVar<E>,
    /// Claimed commitment to the old committee.
    pub old_commitment: Variable,
    /// Claimed commitment to the new committee.
    pub new_commitment: Variable,
}

/// Plonk circuit gadget for the committee rotation relation.
pub trait CommitteeRotationGadget<F: RescueParameter> {
    /// Constrain a committee rotation. The four checks are conjunctive:
    /// 1. the trusted weight computed from the old signers carried over to the
    ///    new committee equals `vars.trusted_weight`;
    /// 2. the old committee hashes to `vars.old_commitment`;
    /// 3. the new committee hashes to `vars.new_commitment`;
    /// 4. the signers of the new committee aggregate to `vars.apk`.
    fn enforce_committee_rotation<E, P, const N: usize>(
        &mut self,
        vars: &RotationVars<E, N>,
    ) -> Result<(), CircuitError>
    where
        E: EmulationConfig<F>,
        P: SWCurveConfig<BaseField = E>;
}

impl<F: RescueParameter> CommitteeRotationGadget<F> for PlonkCircuit<F> {
    fn enforce_committee_rotation<E, P, const N: usize>(
        &mut self,
        vars: &RotationVars<E, N>,
    ) -> Result<(), CircuitError>
    where
        E: EmulationConfig<F>,
        P: SWCurveConfig<BaseField = E>,
    {
        let span = span!(Level::TRACE, "enforce_committee_rotation", slots = N);
        let _enter = span.enter();

        let offset = self.create_constant_g1_point_variable(&g1_offset::<P>())?;

        let trusted_weight = self.trusted_weight(
            &vars.old_keys,
            &vars.new_keys,
            &vars.old_bits,
            &vars.intersection_bits,
            &vars.old_weights,
            &offset,
        )?;
        self.enforce_equal(trusted_weight, vars.trusted_weight)?;

        let old_commitment = self.committee_commitment(&vars.old_keys, &vars.old_weights)?;
        self.enforce_equal(old_commitment, vars.old_commitment)?;

        let new_commitment = self.committee_commitment(&vars.new_keys, &vars.new_weights)?;
        self.enforce_equal(new_commitment, vars.new_commitment)?;

        self.enforce_aggregate_key::<E, P, N>(
            &vars.apk,
            &vars.new_keys,
            &vars.signing_bits,
            &offset,
        )?;

        debug!("committee rotation constrained with {} gates", self.num_gates());
        Ok(())
    }
}
