//! Circuit implementation of signer key aggregation.
//!
//! The aggregate is never computed directly: summing only the selected keys
//! could add a point to its own negation. The gadget instead returns
//! `2 * apk + offset`, and [`ConditionalAggregateGadget::enforce_doubled_aggregate`]
//! checks a claimed `apk` against that value by doubling it, which avoids
//! halving inside the circuit.
//!
//! Doubling erases points of order two. On curves with an even cofactor,
//! [`ConditionalAggregateGadget::enforce_aggregate_key`] also compares the
//! claim against the plain masked sum.
//!
//! A key equal to `(0, 0)` marks an empty slot and is skipped by every fold.

use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ff::PrimeField;
use ark_std::format;
use jf_relation::{errors::CircuitError, gadgets::EmulationConfig, BoolVar, PlonkCircuit};
use tracing::{span, trace, Level};

use super::point::{has_two_torsion, G1PointGadget, G1PointVar};

/// Plonk circuit gadget aggregating the keys of a signer bitmap.
pub trait ConditionalAggregateGadget<F: PrimeField> {
    /// Returns `2 * (Σ_{bits[i] = 1} keys[i]) + offset`.
    /// The result must be checked with
    /// [`enforce_doubled_aggregate`](Self::enforce_doubled_aggregate) using the same `offset`.
    /// * `keys` - the committee public keys.
    /// * `bits` - the signer bitmap, `bits[i] = 1` if `keys[i]` signed.
    /// * `offset` - a fixed non-identity point.
    fn aggregate_keys_with_offset<E, const N: usize>(
        &mut self,
        keys: &[G1PointVar<E>; N],
        bits: &[BoolVar; N],
        offset: &G1PointVar<E>,
    ) -> Result<G1PointVar<E>, CircuitError>
    where
        E: EmulationConfig<F>;

    /// Constrain `doubled_with_offset == 2 * claimed_apk + offset`.
    /// A claimed identity `(0, 0)` is accepted iff `doubled_with_offset == offset`.
    ///
    /// Doubling only determines `claimed_apk` on curves without points of
    /// order two, so curves with an even cofactor are rejected with a
    /// `ParameterError`; use [`enforce_aggregate_key`](Self::enforce_aggregate_key) there.
    /// * `claimed_apk` - the claimed aggregated public key.
    /// * `doubled_with_offset` - the output of `aggregate_keys_with_offset`.
    /// * `offset` - the offset used for the aggregation.
    fn enforce_doubled_aggregate<E, P>(
        &mut self,
        claimed_apk: &G1PointVar<E>,
        doubled_with_offset: &G1PointVar<E>,
        offset: &G1PointVar<E>,
    ) -> Result<(), CircuitError>
    where
        E: EmulationConfig<F>,
        P: SWCurveConfig<BaseField = E>;

    /// Constrain `claimed_apk == Σ_{bits[i] = 1} keys[i]` on any curve.
    /// Aggregates with the doubling trick and verifies the claim against it.
    /// If the curve has points of order two, the claim is also matched against
    /// `masked_key_sum`, which rules out `claimed_apk = apk + T` with `2T = 0`.
    fn enforce_aggregate_key<E, P, const N: usize>(
        &mut self,
        claimed_apk: &G1PointVar<E>,
        keys: &[G1PointVar<E>; N],
        bits: &[BoolVar; N],
        offset: &G1PointVar<E>,
    ) -> Result<(), CircuitError>
    where
        E: EmulationConfig<F>,
        P: SWCurveConfig<BaseField = E>;

    /// Returns `offset + Σ_{bits[i] = 1} keys[i]`.
    /// Every addition is computed, the bit only selects whether it is kept.
    fn masked_key_sum<E, const N: usize>(
        &mut self,
        keys: &[G1PointVar<E>; N],
        bits: &[BoolVar; N],
        offset: &G1PointVar<E>,
    ) -> Result<G1PointVar<E>, CircuitError>
    where
        E: EmulationConfig<F>;
}

impl<F: PrimeField> ConditionalAggregateGadget<F> for PlonkCircuit<F> {
    fn aggregate_keys_with_offset<E, const N: usize>(
        &mut self,
        keys: &[G1PointVar<E>; N],
        bits: &[BoolVar; N],
        offset: &G1PointVar<E>,
    ) -> Result<G1PointVar<E>, CircuitError>
    where
        E: EmulationConfig<F>,
    {
        let span = span!(Level::TRACE, "aggregate_keys_with_offset", slots = N);
        let _enter = span.enter();

        // acc = offset + Σ (keys[i] + signed[i]) where signed[i] = ±keys[i],
        // i.e. the unconditional total plus the signed sum in a single fold.
        let mut acc = offset.clone();
        for (key, &bit) in keys.iter().zip(bits.iter()) {
            let is_empty = self.is_g1_identity(key)?;
            let neg_key = self.g1_neg(key)?;
            let signed_key = G1PointVar {
                x: key.x.clone(),
                y: self.conditional_select_emulated(bit, &neg_key.y, &key.y)?,
            };
            let with_key = self.g1_add(&acc, key)?;
            let with_signed = self.g1_add(&with_key, &signed_key)?;
            acc = self.binary_g1_point_select(is_empty, &with_signed, &acc)?;
        }
        trace!("aggregated {} signer slots", N);
        Ok(acc)
    }

    fn enforce_doubled_aggregate<E, P>(
        &mut self,
        claimed_apk: &G1PointVar<E>,
        doubled_with_offset: &G1PointVar<E>,
        offset: &G1PointVar<E>,
    ) -> Result<(), CircuitError>
    where
        E: EmulationConfig<F>,
        P: SWCurveConfig<BaseField = E>,
    {
        if has_two_torsion::<P>() {
            return Err(CircuitError::ParameterError(format!(
                "curve cofactor {:?} is even, doubling does not determine the aggregate key",
                P::COFACTOR
            )));
        }
        doubled_aggregate_constraints::<F, E, P>(self, claimed_apk, doubled_with_offset, offset)
    }

    fn enforce_aggregate_key<E, P, const N: usize>(
        &mut self,
        claimed_apk: &G1PointVar<E>,
        keys: &[G1PointVar<E>; N],
        bits: &[BoolVar; N],
        offset: &G1PointVar<E>,
    ) -> Result<(), CircuitError>
    where
        E: EmulationConfig<F>,
        P: SWCurveConfig<BaseField = E>,
    {
        let span = span!(Level::TRACE, "enforce_aggregate_key", slots = N);
        let _enter = span.enter();

        let doubled_apk = self.aggregate_keys_with_offset(keys, bits, offset)?;
        doubled_aggregate_constraints::<F, E, P>(self, claimed_apk, &doubled_apk, offset)?;
        if !has_two_torsion::<P>() {
            return Ok(());
        }

        trace!("even cofactor, matching the claim against the masked sum");
        let apk_with_offset = self.masked_key_sum(keys, bits, offset)?;
        let is_identity = self.is_g1_identity(claimed_apk)?;
        let shifted = self.g1_add(claimed_apk, offset)?;
        let expected = self.binary_g1_point_select(is_identity, &shifted, offset)?;
        self.enforce_g1_point_equal(&expected, &apk_with_offset)
    }

    fn masked_key_sum<E, const N: usize>(
        &mut self,
        keys: &[G1PointVar<E>; N],
        bits: &[BoolVar; N],
        offset: &G1PointVar<E>,
    ) -> Result<G1PointVar<E>, CircuitError>
    where
        E: EmulationConfig<F>,
    {
        let mut acc = offset.clone();
        for (key, &bit) in keys.iter().zip(bits.iter()) {
            let is_empty = self.is_g1_identity(key)?;
            let with_key = self.g1_add(&acc, key)?;
            let selected = self.binary_g1_point_select(bit, &acc, &with_key)?;
            acc = self.binary_g1_point_select(is_empty, &selected, &acc)?;
        }
        Ok(acc)
    }
}

// 2 * claimed_apk + offset == doubled_with_offset, with a claimed (0, 0) standing
// for the identity.
fn doubled_aggregate_constraints<F, E, P>(
    circuit: &mut PlonkCircuit<F>,
    claimed_apk: &G1PointVar<E>,
    doubled_with_offset: &G1PointVar<E>,
    offset: &G1PointVar<E>,
) -> Result<(), CircuitError>
where
    F: PrimeField,
    E: EmulationConfig<F>,
    P: SWCurveConfig<BaseField = E>,
{
    let span = span!(Level::TRACE, "enforce_doubled_aggregate");
    let _enter = span.enter();

    let is_identity = circuit.is_g1_identity(claimed_apk)?;
    // the offset stands in for an identity claim so the doubling stays defined
    let base = circuit.binary_g1_point_select(is_identity, claimed_apk, offset)?;
    let doubled = circuit.g1_double::<E, P>(&base)?;
    let shifted = circuit.g1_add(&doubled, offset)?;
    let expected = circuit.binary_g1_point_select(is_identity, &shifted, offset)?;
    circuit.enforce_g1_point_equal(&expected, doubled_with_offset)
}
