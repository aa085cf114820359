//! Spring-slider loading model
//!
//! The classic quasi-dynamic reduction of the body solve: each node is
//! pulled through a spring of stiffness `k` by a load point moving at
//! the plate rate,
//!
//! ```text
//! tau_qs(t) = tau_ref + k * (v_plate * t - slip)
//! ```
//!
//! With `k == 0` the traction is simply held at `tau_ref` — the
//! configuration used to study a single node's approach to steady state.
//! With `k > 0` slip deficit accumulates between events and the model
//! produces full stick-slip cycles.
//!
//! For full-duplex faults the minus side reports the negated stress (the
//! fault re-negates it on the way in), so both sides see the same
//! loading.

use crate::coupling::{ShearLoad, StressOperator};
use crate::fault::Fault;
use nalgebra::DVector;

/// Spring-block stress operator
#[derive(Debug, Clone)]
pub struct SpringSlider {
    tau_ref: DVector<f64>,
    stiffness: f64,
    v_plate: f64,
}

impl SpringSlider {
    /// Create a spring slider
    ///
    /// # Arguments
    ///
    /// * `tau_ref` - reference traction per node (MPa)
    /// * `stiffness` - spring stiffness (MPa per m of slip deficit)
    /// * `v_plate` - load-point velocity (m/s)
    ///
    /// # Panics
    ///
    /// Panics on negative or non-finite stiffness, negative plate rate,
    /// or a non-finite reference traction.
    pub fn new(tau_ref: DVector<f64>, stiffness: f64, v_plate: f64) -> Self {
        assert!(
            stiffness.is_finite() && stiffness >= 0.0,
            "spring stiffness must be non-negative and finite, got {}",
            stiffness
        );
        assert!(
            v_plate.is_finite() && v_plate >= 0.0,
            "plate rate must be non-negative and finite, got {}",
            v_plate
        );
        assert!(
            tau_ref.iter().all(|t| t.is_finite()),
            "reference traction must be finite"
        );
        Self { tau_ref, stiffness, v_plate }
    }

    /// Zero-stiffness loading that holds the traction at the fault's
    /// steady-state value
    pub fn steady_loading(fault: &Fault) -> Self {
        Self::new(fault.steady_state_traction(), 0.0, fault.context().v_plate)
    }

    /// Loading with the given stiffness, referenced to the fault's
    /// steady-state traction
    pub fn with_stiffness(fault: &Fault, stiffness: f64) -> Self {
        Self::new(
            fault.steady_state_traction(),
            stiffness,
            fault.context().v_plate,
        )
    }

    /// Reference traction per node
    pub fn tau_ref(&self) -> &DVector<f64> {
        &self.tau_ref
    }

    /// Spring stiffness
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }
}

impl StressOperator for SpringSlider {
    fn shear_stress(
        &mut self,
        time: f64,
        slip: &DVector<f64>,
        _slip_minus: Option<&DVector<f64>>,
    ) -> Result<ShearLoad, String> {
        if slip.len() != self.tau_ref.len() {
            return Err(format!(
                "spring slider has {} nodes but received slip of length {}",
                self.tau_ref.len(),
                slip.len()
            ));
        }

        let load_point = self.v_plate * time;
        let plus = DVector::from_fn(self.tau_ref.len(), |i, _| {
            self.tau_ref[i] + self.stiffness * (load_point - slip[i])
        });
        let minus = plus.map(|t| -t);
        Ok(ShearLoad { plus, minus: Some(minus) })
    }

    fn name(&self) -> &str {
        "Spring Slider"
    }
}

// =================================================================================================
// Tests
// =================================================================================================
