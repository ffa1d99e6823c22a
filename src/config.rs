//! Compile-time configuration of the committee rotation relation.
use ark_ec::short_weierstrass::{Affine, SWCurveConfig};
use ark_ff::PrimeField;
use ark_std::vec;
use ethereum_types::U256;

/// Number of validator slots in a production committee.
pub const COMMITTEE_SIZE: usize = 10;

/// Number of validator slots used by the first prototype of the relation.
pub const PROTOTYPE_COMMITTEE_SIZE: usize = 3;

/// Bit length of the UltraPlonk lookup range.
/// Must divide the limb size of the emulated field.
pub const RANGE_BIT_LEN: usize = 20;

/// Field over which the relation is expressed.
pub type NativeField = ark_bn254::Fr;
/// Base field of the validator keys, emulated inside [`NativeField`].
pub type EmulatedField = ark_bls12_377::Fq;
/// Curve of the validator public keys.
pub type CurveParam = ark_bls12_377::g1::Config;

/// Fixed non-identity point added to every accumulator so that no partial sum
/// hits the identity.
pub fn g1_offset<P: SWCurveConfig>() -> Affine<P> {
    P::GENERATOR
}

/// convert a U256 weight to a field element, reducing modulo the field order.
pub fn u256_to_field<F: PrimeField>(v: &U256) -> F {
    let mut bytes = vec![0u8; 32];
    v.to_little_endian(&mut bytes);
    F::from_le_bytes_mod_order(&bytes)
}
