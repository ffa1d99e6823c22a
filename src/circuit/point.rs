//! Affine short Weierstrass point arithmetic over an emulated base field.
//!
//! The formulas are incomplete: adding two points with the same x-coordinate,
//! or doubling a point with `y = 0`, leaves no valid inverse witness and the
//! circuit becomes unsatisfiable. Callers keep every accumulator away from
//! those cases with a fixed offset point.

use ark_ec::{
    short_weierstrass::{Affine, SWCurveConfig},
    AffineRepr,
};
use ark_ff::{Field, PrimeField};
use ark_std::{One, Zero};
use jf_relation::{
    errors::CircuitError,
    gadgets::{EmulatedVariable, EmulationConfig},
    BoolVar, Circuit, PlonkCircuit,
};

#[derive(Debug, Clone)]
/// Affine point variable with coordinates in the emulated field `E`.
/// The identity is encoded as `(0, 0)`, which lies on no curve with `b != 0`.
pub struct G1PointVar<E: PrimeField> {
    /// x-coordinate
    pub x: EmulatedVariable<E>,
    /// y-coordinate
    pub y: EmulatedVariable<E>,
}

/// Returns the affine coordinates of `point`, with the identity mapped to `(0, 0)`.
pub fn affine_coordinates<P: SWCurveConfig>(point: &Affine<P>) -> (P::BaseField, P::BaseField) {
    match point.xy() {
        Some((x, y)) => (*x, *y),
        None => (P::BaseField::zero(), P::BaseField::zero()),
    }
}

/// Whether the curve has a rational point of order two, i.e. an even cofactor.
/// Doubling is not injective on such curves.
pub fn has_two_torsion<P: SWCurveConfig>() -> bool {
    P::COFACTOR.first().map_or(true, |limb| limb % 2 == 0)
}

/// Plonk circuit gadget for affine point arithmetic on a curve whose base field
/// is emulated in `F`.
pub trait G1PointGadget<F: PrimeField> {
    /// Allocate a witness point.
    fn create_g1_point_variable<E, P>(
        &mut self,
        point: &Affine<P>,
    ) -> Result<G1PointVar<E>, CircuitError>
    where
        E: EmulationConfig<F>,
        P: SWCurveConfig<BaseField = E>;

    /// Allocate a public point; the x limbs are published before the y limbs.
    fn create_public_g1_point_variable<E, P>(
        &mut self,
        point: &Affine<P>,
    ) -> Result<G1PointVar<E>, CircuitError>
    where
        E: EmulationConfig<F>,
        P: SWCurveConfig<BaseField = E>;

    /// Allocate a constant point.
    fn create_constant_g1_point_variable<E, P>(
        &mut self,
        point: &Affine<P>,
    ) -> Result<G1PointVar<E>, CircuitError>
    where
        E: EmulationConfig<F>,
        P: SWCurveConfig<BaseField = E>;

    /// The constant `(0, 0)` standing for the identity.
    fn g1_zero_point_variable<E: EmulationConfig<F>>(
        &mut self,
    ) -> Result<G1PointVar<E>, CircuitError>;

    /// Read back the coordinates assigned to `p`.
    fn g1_point_witness<E: EmulationConfig<F>>(
        &self,
        p: &G1PointVar<E>,
    ) -> Result<(E, E), CircuitError>;

    /// Returns `-p`.
    fn g1_neg<E: EmulationConfig<F>>(
        &mut self,
        p: &G1PointVar<E>,
    ) -> Result<G1PointVar<E>, CircuitError>;

    /// Returns `p + q` using the chord rule. Requires `p.x != q.x`.
    fn g1_add<E: EmulationConfig<F>>(
        &mut self,
        p: &G1PointVar<E>,
        q: &G1PointVar<E>,
    ) -> Result<G1PointVar<E>, CircuitError>;

    /// Returns `2 * p` using the tangent rule. Requires `p.y != 0`.
    fn g1_double<E, P>(&mut self, p: &G1PointVar<E>) -> Result<G1PointVar<E>, CircuitError>
    where
        E: EmulationConfig<F>,
        P: SWCurveConfig<BaseField = E>;

    /// Returns `p0` if `b = 0`, `p1` otherwise.
    fn binary_g1_point_select<E: EmulationConfig<F>>(
        &mut self,
        b: BoolVar,
        p0: &G1PointVar<E>,
        p1: &G1PointVar<E>,
    ) -> Result<G1PointVar<E>, CircuitError>;

    /// Constrain `p` and `q` to have equal coordinates.
    fn enforce_g1_point_equal<E: EmulationConfig<F>>(
        &mut self,
        p: &G1PointVar<E>,
        q: &G1PointVar<E>,
    ) -> Result<(), CircuitError>;

    /// Returns a boolean variable set iff `p` is the `(0, 0)` identity encoding.
    fn is_g1_identity<E: EmulationConfig<F>>(
        &mut self,
        p: &G1PointVar<E>,
    ) -> Result<BoolVar, CircuitError>;
}

impl<F: PrimeField> G1PointGadget<F> for PlonkCircuit<F> {
    fn create_g1_point_variable<E, P>(
        &mut self,
        point: &Affine<P>,
    ) -> Result<G1PointVar<E>, CircuitError>
    where
        E: EmulationConfig<F>,
        P: SWCurveConfig<BaseField = E>,
    {
        let (x, y) = affine_coordinates(point);
        Ok(G1PointVar {
            x: self.create_emulated_variable(x)?,
            y: self.create_emulated_variable(y)?,
        })
    }

    fn create_public_g1_point_variable<E, P>(
        &mut self,
        point: &Affine<P>,
    ) -> Result<G1PointVar<E>, CircuitError>
    where
        E: EmulationConfig<F>,
        P: SWCurveConfig<BaseField = E>,
    {
        let (x, y) = affine_coordinates(point);
        Ok(G1PointVar {
            x: self.create_public_emulated_variable(x)?,
            y: self.create_public_emulated_variable(y)?,
        })
    }

    fn create_constant_g1_point_variable<E, P>(
        &mut self,
        point: &Affine<P>,
    ) -> Result<G1PointVar<E>, CircuitError>
    where
        E: EmulationConfig<F>,
        P: SWCurveConfig<BaseField = E>,
    {
        let (x, y) = affine_coordinates(point);
        Ok(G1PointVar {
            x: self.create_constant_emulated_variable(x)?,
            y: self.create_constant_emulated_variable(y)?,
        })
    }

    fn g1_zero_point_variable<E: EmulationConfig<F>>(
        &mut self,
    ) -> Result<G1PointVar<E>, CircuitError> {
        Ok(G1PointVar {
            x: self.create_constant_emulated_variable(E::zero())?,
            y: self.create_constant_emulated_variable(E::zero())?,
        })
    }

    fn g1_point_witness<E: EmulationConfig<F>>(
        &self,
        p: &G1PointVar<E>,
    ) -> Result<(E, E), CircuitError> {
        Ok((self.emulated_witness(&p.x)?, self.emulated_witness(&p.y)?))
    }

    fn g1_neg<E: EmulationConfig<F>>(
        &mut self,
        p: &G1PointVar<E>,
    ) -> Result<G1PointVar<E>, CircuitError> {
        let zero = self.create_constant_emulated_variable(E::zero())?;
        Ok(G1PointVar {
            x: p.x.clone(),
            y: self.emulated_sub(&zero, &p.y)?,
        })
    }

    fn g1_add<E: EmulationConfig<F>>(
        &mut self,
        p: &G1PointVar<E>,
        q: &G1PointVar<E>,
    ) -> Result<G1PointVar<E>, CircuitError> {
        // lambda = (q.y - p.y) / (q.x - p.x)
        let qy_py = self.emulated_sub(&q.y, &p.y)?;
        let qx_px = self.emulated_sub(&q.x, &p.x)?;
        let lambda = emulated_div(self, &qy_py, &qx_px)?;

        // x_r = lambda^2 - p.x - q.x
        let lambda_sq = self.emulated_mul(&lambda, &lambda)?;
        let px_qx = self.emulated_add(&p.x, &q.x)?;
        let x = self.emulated_sub(&lambda_sq, &px_qx)?;

        // y_r = lambda * (p.x - x_r) - p.y
        let px_xr = self.emulated_sub(&p.x, &x)?;
        let t = self.emulated_mul(&lambda, &px_xr)?;
        let y = self.emulated_sub(&t, &p.y)?;

        Ok(G1PointVar { x, y })
    }

    fn g1_double<E, P>(&mut self, p: &G1PointVar<E>) -> Result<G1PointVar<E>, CircuitError>
    where
        E: EmulationConfig<F>,
        P: SWCurveConfig<BaseField = E>,
    {
        // lambda = (3 * x^2 + a) / (2 * y)
        let xx = self.emulated_mul(&p.x, &p.x)?;
        let xx2 = self.emulated_add(&xx, &xx)?;
        let mut num = self.emulated_add(&xx2, &xx)?;
        if !P::COEFF_A.is_zero() {
            let a = self.create_constant_emulated_variable(P::COEFF_A)?;
            num = self.emulated_add(&num, &a)?;
        }
        let den = self.emulated_add(&p.y, &p.y)?;
        let lambda = emulated_div(self, &num, &den)?;

        // x_r = lambda^2 - 2 * x
        let lambda_sq = self.emulated_mul(&lambda, &lambda)?;
        let x2 = self.emulated_add(&p.x, &p.x)?;
        let x = self.emulated_sub(&lambda_sq, &x2)?;

        // y_r = lambda * (x - x_r) - y
        let px_xr = self.emulated_sub(&p.x, &x)?;
        let t = self.emulated_mul(&lambda, &px_xr)?;
        let y = self.emulated_sub(&t, &p.y)?;

        Ok(G1PointVar { x, y })
    }

    fn binary_g1_point_select<E: EmulationConfig<F>>(
        &mut self,
        b: BoolVar,
        p0: &G1PointVar<E>,
        p1: &G1PointVar<E>,
    ) -> Result<G1PointVar<E>, CircuitError> {
        Ok(G1PointVar {
            x: self.conditional_select_emulated(b, &p0.x, &p1.x)?,
            y: self.conditional_select_emulated(b, &p0.y, &p1.y)?,
        })
    }

    fn enforce_g1_point_equal<E: EmulationConfig<F>>(
        &mut self,
        p: &G1PointVar<E>,
        q: &G1PointVar<E>,
    ) -> Result<(), CircuitError> {
        self.enforce_emulated_var_equal(&p.x, &q.x)?;
        self.enforce_emulated_var_equal(&p.y, &q.y)
    }

    fn is_g1_identity<E: EmulationConfig<F>>(
        &mut self,
        p: &G1PointVar<E>,
    ) -> Result<BoolVar, CircuitError> {
        let x_is_zero = self.is_emulated_var_zero(&p.x)?;
        let y_is_zero = self.is_emulated_var_zero(&p.y)?;
        self.logic_and(x_is_zero, y_is_zero)
    }
}

/// Returns `a / b`. The inverse of `b` is a witness constrained by `b * b_inv = 1`,
/// so `b = 0` cannot be satisfied.
fn emulated_div<F, E>(
    circuit: &mut PlonkCircuit<F>,
    a: &EmulatedVariable<E>,
    b: &EmulatedVariable<E>,
) -> Result<EmulatedVariable<E>, CircuitError>
where
    F: PrimeField,
    E: EmulationConfig<F>,
{
    let b_inv = circuit
        .emulated_witness(b)?
        .inverse()
        .unwrap_or_else(E::zero);
    let b_inv = circuit.create_emulated_variable(b_inv)?;
    let one = circuit.create_constant_emulated_variable(E::one())?;
    let prod = circuit.emulated_mul(b, &b_inv)?;
    circuit.enforce_emulated_var_equal(&prod, &one)?;
    circuit.emulated_mul(a, &b_inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CurveParam, EmulatedField, NativeField, RANGE_BIT_LEN};
    use ark_ec::{short_weierstrass::Projective, CurveGroup};
    use ark_std::{vec::Vec, UniformRand};
    use jf_relation::gadgets::from_emulated_field;

    type G1 = Projective<CurveParam>;

    fn new_circuit() -> PlonkCircuit<NativeField> {
        PlonkCircuit::new_ultra_plonk(RANGE_BIT_LEN)
    }

    fn assert_point_witness(
        circuit: &PlonkCircuit<NativeField>,
        var: &G1PointVar<EmulatedField>,
        expected: &Affine<CurveParam>,
    ) -> Result<(), CircuitError> {
        assert_eq!(circuit.g1_point_witness(var)?, affine_coordinates(expected));
        Ok(())
    }

    #[test]
    fn test_add_double_neg() -> Result<(), CircuitError> {
        let mut rng = jf_utils::test_rng();
        let p = G1::rand(&mut rng).into_affine();
        let q = G1::rand(&mut rng).into_affine();

        let mut circuit = new_circuit();
        let p_var = circuit.create_g1_point_variable(&p)?;
        let q_var = circuit.create_g1_point_variable(&q)?;

        let sum = circuit.g1_add(&p_var, &q_var)?;
        assert_point_witness(&circuit, &sum, &(G1::from(p) + q).into_affine())?;

        let double = circuit.g1_double::<EmulatedField, CurveParam>(&p_var)?;
        assert_point_witness(&circuit, &double, &(G1::from(p) + G1::from(p)).into_affine())?;

        let neg = circuit.g1_neg(&q_var)?;
        assert_point_witness(&circuit, &neg, &(-q))?;

        let diff = circuit.g1_add(&p_var, &neg)?;
        assert_point_witness(&circuit, &diff, &(G1::from(p) - G1::from(q)).into_affine())?;

        assert!(circuit.check_circuit_satisfiability(&[]).is_ok());

        // bad path: tamper with the first limb of the sum
        let limb = sum.x.to_vec()[0];
        *circuit.witness_mut(limb) = NativeField::from(1u8) + circuit.witness(limb)?;
        assert!(circuit.check_circuit_satisfiability(&[]).is_err());
        Ok(())
    }

    #[test]
    fn test_add_same_x_is_unsatisfiable() -> Result<(), CircuitError> {
        let mut rng = jf_utils::test_rng();
        let p = G1::rand(&mut rng).into_affine();

        // p + p: chord rule does not apply
        let mut circuit = new_circuit();
        let p_var = circuit.create_g1_point_variable(&p)?;
        circuit.g1_add(&p_var, &p_var)?;
        assert!(circuit.check_circuit_satisfiability(&[]).is_err());

        // p + (-p): the result would be the identity
        let mut circuit = new_circuit();
        let p_var = circuit.create_g1_point_variable(&p)?;
        let neg_var = circuit.create_g1_point_variable(&(-p))?;
        circuit.g1_add(&p_var, &neg_var)?;
        assert!(circuit.check_circuit_satisfiability(&[]).is_err());
        Ok(())
    }

    #[test]
    fn test_select_and_identity() -> Result<(), CircuitError> {
        let mut rng = jf_utils::test_rng();
        let p = G1::rand(&mut rng).into_affine();
        let identity = G1::zero().into_affine();

        let mut circuit = new_circuit();
        let p_var = circuit.create_g1_point_variable(&p)?;
        let zero_var = circuit.g1_zero_point_variable()?;
        let id_var = circuit.create_g1_point_variable(&identity)?;
        assert_eq!(
            circuit.g1_point_witness(&id_var)?,
            (EmulatedField::zero(), EmulatedField::zero())
        );

        let b0 = circuit.create_boolean_variable(false)?;
        let b1 = circuit.create_boolean_variable(true)?;
        let s0 = circuit.binary_g1_point_select(b0, &zero_var, &p_var)?;
        let s1 = circuit.binary_g1_point_select(b1, &zero_var, &p_var)?;
        assert_point_witness(&circuit, &s0, &identity)?;
        assert_point_witness(&circuit, &s1, &p)?;

        let is_id = circuit.is_g1_identity(&id_var)?;
        let is_not_id = circuit.is_g1_identity(&p_var)?;
        assert_eq!(circuit.witness(is_id.into())?, NativeField::one());
        assert_eq!(circuit.witness(is_not_id.into())?, NativeField::zero());
        assert!(circuit.check_circuit_satisfiability(&[]).is_ok());
        Ok(())
    }

    #[test]
    fn test_has_two_torsion() {
        assert!(has_two_torsion::<CurveParam>());
        assert!(!has_two_torsion::<ark_bn254::g1::Config>());
    }

    #[test]
    fn test_public_point() -> Result<(), CircuitError> {
        let mut rng = jf_utils::test_rng();
        let p = G1::rand(&mut rng).into_affine();

        let mut circuit = new_circuit();
        circuit.create_public_g1_point_variable(&p)?;
        let (x, y) = affine_coordinates(&p);
        let mut public_inputs: Vec<NativeField> = from_emulated_field(x);
        let y_limbs: Vec<NativeField> = from_emulated_field(y);
        public_inputs.extend(y_limbs);
        assert!(circuit.check_circuit_satisfiability(&public_inputs).is_ok());

        public_inputs[0] += NativeField::one();
        assert!(circuit.check_circuit_satisfiability(&public_inputs).is_err());
        Ok(())
    }
}
