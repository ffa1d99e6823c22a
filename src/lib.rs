//! Plonk relation for a weighted validator committee rotation.
//!
//! A rotation proves that the old committee handed over to the new one: the
//! old signers that remain in the new committee carry a claimed trusted
//! weight, both committees hash to their claimed commitments, and the new
//! committee signers aggregate to a claimed public key.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

pub mod circuit;
pub mod committee;
pub mod config;
pub mod errors;
pub mod rotation;

pub use committee::{Bitlist, Committee};
pub use errors::RotationError;
pub use rotation::{RotationClaim, RotationWitness};
