//! Circuit implementation of the trusted weight check.
//!
//! The trusted weight is the weight of the old committee members that signed
//! and are still part of the new committee. Membership is proven by comparing
//! two aggregates: the keys selected by the old signer bitmap over the old
//! committee and the keys selected by the intersection bitmap over the new
//! committee. Public keys being distinct curve points, equal aggregates mean
//! equal key sets, whatever the slot positions. Empty `(0, 0)` slots are
//! skipped by both sums.

use ark_ff::PrimeField;
use ark_std::vec::Vec;
use jf_relation::{
    errors::CircuitError, gadgets::EmulationConfig, BoolVar, Circuit, PlonkCircuit, Variable,
};
use tracing::{span, trace, Level};

use super::{
    aggregate::ConditionalAggregateGadget,
    point::{G1PointGadget, G1PointVar},
};

/// Plonk circuit gadget computing the weight carried over between committees.
pub trait TrustedWeightGadget<F: PrimeField> {
    /// Returns the sum of `old_weights[i]` over `old_bits[i] = 1`, after
    /// constraining `Σ_{old_bits[i] = 1} old_keys[i] == Σ_{intersection_bits[j] = 1} new_keys[j]`.
    /// The caller compares the returned weight with the claimed trusted weight.
    /// * `old_keys` - public keys of the old committee.
    /// * `new_keys` - public keys of the new committee.
    /// * `old_bits` - old committee members that signed, indexed over `old_keys`.
    /// * `intersection_bits` - the same members, indexed over `new_keys`.
    /// * `old_weights` - weights of the old committee.
    /// * `offset` - a fixed non-identity point seeding both sums.
    fn trusted_weight<E, const N: usize>(
        &mut self,
        old_keys: &[G1PointVar<E>; N],
        new_keys: &[G1PointVar<E>; N],
        old_bits: &[BoolVar; N],
        intersection_bits: &[BoolVar; N],
        old_weights: &[Variable; N],
        offset: &G1PointVar<E>,
    ) -> Result<Variable, CircuitError>
    where
        E: EmulationConfig<F>;
}

impl<F: PrimeField> TrustedWeightGadget<F> for PlonkCircuit<F> {
    fn trusted_weight<E, const N: usize>(
        &mut self,
        old_keys: &[G1PointVar<E>; N],
        new_keys: &[G1PointVar<E>; N],
        old_bits: &[BoolVar; N],
        intersection_bits: &[BoolVar; N],
        old_weights: &[Variable; N],
        offset: &G1PointVar<E>,
    ) -> Result<Variable, CircuitError>
    where
        E: EmulationConfig<F>,
    {
        let span = span!(Level::TRACE, "trusted_weight", slots = N);
        let _enter = span.enter();

        let mut signed_weights = Vec::with_capacity(N);
        for (&weight, &bit) in old_weights.iter().zip(old_bits.iter()) {
            signed_weights.push(self.mul(weight, bit.into())?);
        }
        let weight = self.sum(&signed_weights[..])?;

        let old_signers = self.masked_key_sum(old_keys, old_bits, offset)?;
        let carried_over = self.masked_key_sum(new_keys, intersection_bits, offset)?;
        trace!("comparing old signers with carried over members");
        self.enforce_g1_point_equal(&old_signers, &carried_over)?;

        Ok(weight)
    }
}
