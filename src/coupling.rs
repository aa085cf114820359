//! Boundary to the external body-stress solver
//!
//! The elastic (or viscoelastic) body solve is not part of this crate:
//! the fault only needs shear stress along the fault plane as a function
//! of time and fault displacement. [`StressOperator`] is that boundary.
//!
//! The contract is strictly value-based: the operator receives read-only
//! views of the fault displacement and returns freshly allocated stress
//! vectors. No component hands out a live handle another could mutate.
//! A failed body solve is reported as `Err` and propagates up through
//! the rate function as a fatal integration failure — a missing stress
//! field makes friction evaluation meaningless.

use nalgebra::DVector;

/// Shear stress along the fault plane, one entry per node
///
/// `minus` is present for full-duplex faults, reported in the body
/// solver's own sign convention ([`crate::fault::Fault::set_tau_qs`]
/// negates it on the way in).
#[derive(Debug, Clone)]
pub struct ShearLoad {
    /// Plus-side shear stress (MPa)
    pub plus: DVector<f64>,
    /// Minus-side shear stress (MPa), full-duplex only
    pub minus: Option<DVector<f64>>,
}

/// The opaque stress operator of the surrounding medium
///
/// Implementations range from a closed-form spring-block
/// ([`crate::models::SpringSlider`]) to an adapter around a full sparse
/// elastic solve. `&mut self` allows implementations to cache
/// factorizations or advance internal loading state.
pub trait StressOperator: Send {
    /// Shear stress along the fault at `time`, given the current fault
    /// displacement
    fn shear_stress(
        &mut self,
        time: f64,
        slip: &DVector<f64>,
        slip_minus: Option<&DVector<f64>>,
    ) -> Result<ShearLoad, String>;

    /// Name of the operator (used for display and reporting)
    fn name(&self) -> &str;
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct ConstantLoad {
        tau: f64,
    }

    impl StressOperator for ConstantLoad {
        fn shear_stress(
            &mut self,
            _time: f64,
            slip: &DVector<f64>,
            _slip_minus: Option<&DVector<f64>>,
        ) -> Result<ShearLoad, String> {
            Ok(ShearLoad {
                plus: DVector::from_element(slip.len(), self.tau),
                minus: None,
            })
        }

        fn name(&self) -> &str {
            "Constant Load"
        }
    }

    #[test]
    fn test_trait_object_usage() {
        let mut op: Box<dyn StressOperator> = Box::new(ConstantLoad { tau: 20.0 });
        let slip = DVector::zeros(4);
        let load = op.shear_stress(0.0, &slip, None).unwrap();
        assert_eq!(load.plus.len(), 4);
        assert_eq!(load.plus[2], 20.0);
        assert!(load.minus.is_none());
    }
}
