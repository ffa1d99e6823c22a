//! Plonk gadgets for the committee rotation relation.

use ark_std::{format, vec::Vec};
use jf_relation::errors::CircuitError;

pub mod aggregate;
pub mod commitment;
pub mod intersection;
pub mod point;
pub mod rotation;

pub use aggregate::ConditionalAggregateGadget;
pub use commitment::CommitteeCommitmentGadget;
pub use intersection::TrustedWeightGadget;
pub use point::{G1PointGadget, G1PointVar};
pub use rotation::{CommitteeRotationGadget, RotationVars};

/// Convert the variables allocated for a committee into a fixed-size array.
pub(crate) fn into_array<T, const N: usize>(vars: Vec<T>) -> Result<[T; N], CircuitError> {
    vars.try_into().map_err(|vars: Vec<T>| {
        CircuitError::ParameterError(format!(
            "expected {} committee slots, got {}",
            N,
            vars.len()
        ))
    })
}
