//! Native committee data.
//!
//! These are the values a prover works with outside the circuit. They mirror
//! the in-circuit computations so that the claimed commitments, aggregate key
//! and weights of a rotation can be derived before building the relation.

use ark_ec::{
    short_weierstrass::{Affine, Projective, SWCurveConfig},
    CurveGroup,
};
use ark_std::{format, vec::Vec, Zero};
use derivative::Derivative;
use ethereum_types::U256;
use jf_primitives::rescue::{sponge::RescueCRHF, RescueParameter};
use jf_relation::gadgets::{from_emulated_field, EmulationConfig};

use crate::{circuit::point::affine_coordinates, config::u256_to_field, errors::RotationError};

/// Characteristic vector over the slots of a committee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bitlist<const N: usize>(pub [bool; N]);

impl<const N: usize> Bitlist<N> {
    /// A bitlist with no slot selected.
    pub fn empty() -> Self {
        Self([false; N])
    }

    /// A bitlist with every slot selected.
    pub fn full() -> Self {
        Self([true; N])
    }

    /// A bitlist selecting exactly the given slots.
    pub fn from_indices(indices: &[usize]) -> Result<Self, RotationError> {
        let mut bits = Self::empty();
        for &i in indices {
            *bits.slot_mut(i)? = true;
        }
        Ok(bits)
    }

    /// Whether slot `i` is selected, `None` if `i` is out of range.
    pub fn get(&self, i: usize) -> Option<bool> {
        self.0.get(i).copied()
    }

    /// Toggle slot `i`.
    pub fn flip(&mut self, i: usize) -> Result<(), RotationError> {
        let bit = self.slot_mut(i)?;
        *bit = !*bit;
        Ok(())
    }

    /// Number of selected slots.
    pub fn count_ones(&self) -> usize {
        self.0.iter().filter(|&&b| b).count()
    }

    /// Iterate over the bits in slot order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    fn slot_mut(&mut self, i: usize) -> Result<&mut bool, RotationError> {
        self.0.get_mut(i).ok_or_else(|| {
            RotationError::ParameterError(format!(
                "slot {} out of range for a committee of {}",
                i, N
            ))
        })
    }
}

/// A committee of `N` validators: the public key and the weight of each slot.
#[derive(Derivative)]
#[derivative(
    Clone(bound = ""),
    Copy(bound = ""),
    Debug(bound = ""),
    PartialEq(bound = ""),
    Eq(bound = "")
)]
pub struct Committee<P: SWCurveConfig, const N: usize> {
    /// Public keys in slot order.
    pub keys: [Affine<P>; N],
    /// Weights in slot order.
    pub weights: [U256; N],
}

impl<P: SWCurveConfig, const N: usize> Committee<P, N> {
    /// Creates a committee from parallel key and weight arrays.
    pub fn new(keys: [Affine<P>; N], weights: [U256; N]) -> Self {
        Self { keys, weights }
    }

    /// Commitment binding the keys and weights of the committee, in slot order.
    /// Matches [`CommitteeCommitmentGadget::committee_commitment`](crate::circuit::CommitteeCommitmentGadget::committee_commitment).
    pub fn commitment<F>(&self) -> F
    where
        F: RescueParameter,
        P::BaseField: EmulationConfig<F>,
    {
        let slot_digests: Vec<F> = self
            .keys
            .iter()
            .zip(self.weights.iter())
            .map(|(key, weight)| {
                let (x, y) = affine_coordinates(key);
                let x_digest = coordinate_digest::<F, P::BaseField>(x);
                let y_digest = coordinate_digest::<F, P::BaseField>(y);
                RescueCRHF::<F>::sponge_with_bit_padding(
                    &[x_digest, y_digest, u256_to_field(weight)],
                    1,
                )[0]
            })
            .collect();
        RescueCRHF::<F>::sponge_with_bit_padding(&slot_digests, 1)[0]
    }

    /// Sum of the keys selected by `bits`.
    pub fn masked_key_sum(&self, bits: &Bitlist<N>) -> Projective<P> {
        self.keys
            .iter()
            .zip(bits.iter())
            .fold(Projective::<P>::zero(), |acc, (key, b)| {
                if b {
                    acc + key
                } else {
                    acc
                }
            })
    }

    /// Aggregated public key of the slots selected by `bits`.
    pub fn aggregate_key(&self, bits: &Bitlist<N>) -> Affine<P> {
        self.masked_key_sum(bits).into_affine()
    }

    /// Total weight of the slots selected by `bits`.
    pub fn signed_weight(&self, bits: &Bitlist<N>) -> Result<U256, RotationError> {
        self.weights
            .iter()
            .zip(bits.iter())
            .try_fold(U256::zero(), |acc, (weight, b)| {
                if b {
                    acc.checked_add(*weight).ok_or(RotationError::WeightOverflow)
                } else {
                    Ok(acc)
                }
            })
    }
}

fn coordinate_digest<F, E>(coord: E) -> F
where
    F: RescueParameter,
    E: EmulationConfig<F>,
{
    let limbs: Vec<F> = from_emulated_field(coord);
    RescueCRHF::<F>::sponge_with_bit_padding(&limbs, 1)[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CurveParam, NativeField};
    use ark_std::UniformRand;

    type G1 = Projective<CurveParam>;

    fn committee<const N: usize>() -> Committee<CurveParam, N> {
        let mut rng = jf_utils::test_rng();
        let keys = [(); N].map(|_| G1::rand(&mut rng).into_affine());
        let mut weights = [U256::zero(); N];
        for (i, w) in weights.iter_mut().enumerate() {
            *w = U256::from(i as u64 + 1);
        }
        Committee::new(keys, weights)
    }

    #[test]
    fn test_bitlist() -> Result<(), RotationError> {
        let mut bits = Bitlist::<5>::from_indices(&[0, 3])?;
        assert_eq!(bits, Bitlist([true, false, false, true, false]));
        assert_eq!(bits.count_ones(), 2);
        bits.flip(3)?;
        assert_eq!(bits.get(3), Some(false));
        assert_eq!(bits.get(0), Some(true));
        assert_eq!(Bitlist::<5>::full().count_ones(), 5);
        assert_eq!(Bitlist::<5>::empty().count_ones(), 0);

        // out of range slots are reported, not indexed
        assert!(Bitlist::<5>::from_indices(&[5]).is_err());
        assert_eq!(bits.get(5), None);
        assert!(matches!(bits.flip(5), Err(RotationError::ParameterError(_))));
        assert_eq!(bits, Bitlist([true, false, false, false, false]));
        Ok(())
    }

    #[test]
    fn test_aggregate_and_weight() -> Result<(), RotationError> {
        let committee = committee::<4>();
        let bits = Bitlist::from_indices(&[1, 2])?;
        assert_eq!(
            committee.aggregate_key(&bits),
            (G1::from(committee.keys[1]) + committee.keys[2]).into_affine()
        );
        assert_eq!(committee.signed_weight(&bits)?, U256::from(5u8));
        assert!(committee.aggregate_key(&Bitlist::empty()).infinity);
        assert_eq!(committee.signed_weight(&Bitlist::empty())?, U256::zero());
        assert_eq!(committee.signed_weight(&Bitlist::full())?, U256::from(10u8));
        Ok(())
    }

    #[test]
    fn test_weight_overflow() {
        let mut committee = committee::<2>();
        committee.weights = [U256::MAX, U256::one()];
        assert!(matches!(
            committee.signed_weight(&Bitlist::full()),
            Err(RotationError::WeightOverflow)
        ));
        assert_eq!(
            committee.signed_weight(&Bitlist([true, false])).ok(),
            Some(U256::MAX)
        );
    }

    #[test]
    fn test_commitment_depends_on_every_slot() {
        let committee = committee::<3>();
        let expected: NativeField = committee.commitment();
        let mut reweighted = committee;
        reweighted.weights[2] = U256::from(100u8);
        assert_ne!(reweighted.commitment::<NativeField>(), expected);
    }
}
