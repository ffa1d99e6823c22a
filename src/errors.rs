//! Error types of the committee rotation relation.
use ark_std::string::String;
use displaydoc::Display;
use jf_relation::errors::CircuitError;

/// Errors raised while building or checking a committee rotation relation.
#[derive(Debug, Display)]
pub enum RotationError {
    /// Failed to build the constraint system: {0}
    Circuit(CircuitError),
    /// Invalid parameters: {0}
    ParameterError(String),
    /// Sum of the validator weights exceeds U256
    WeightOverflow,
    /// The committee rotation relation is not satisfied
    Unsatisfied,
}

impl From<CircuitError> for RotationError {
    fn from(e: CircuitError) -> Self {
        Self::Circuit(e)
    }
}

impl ark_std::error::Error for RotationError {}
