//! The coupled earthquake-cycle system
//!
//! [`CycleModel`] wires a [`Fault`] to a [`StressOperator`] and exposes
//! the combined system as a [`RateModel`]. One rate evaluation runs the
//! full data flow:
//!
//! 1. query the stress operator with the current fault displacement;
//! 2. stage the returned shear stress into the fault's traction fields;
//! 3. let the fault solve for velocity and evaluate the state law.
//!
//! Step-size control is driven by the slip fields only: state-variable
//! error is not a reliable step-size proxy, but any state inaccuracy
//! feeds back into slip through the velocity solve.

use crate::coupling::StressOperator;
use crate::fault::{Fault, FaultVariant};
use crate::physics::{FieldKind, FieldSet, RateModel};

/// Fault + loading model, ready for the integrator
pub struct CycleModel {
    fault: Fault,
    stress: Box<dyn StressOperator>,
}

impl CycleModel {
    /// Couple a fault to a stress operator
    pub fn new(fault: Fault, stress: Box<dyn StressOperator>) -> Self {
        Self { fault, stress }
    }

    /// The owned fault
    pub fn fault(&self) -> &Fault {
        &self.fault
    }

    /// Mutable access to the owned fault (commit, diagnostics)
    pub fn fault_mut(&mut self) -> &mut Fault {
        &mut self.fault
    }

    /// Name of the coupled stress operator
    pub fn stress_operator_name(&self) -> &str {
        self.stress.name()
    }

    /// Tear the model apart, keeping the fault
    pub fn into_fault(self) -> Fault {
        self.fault
    }
}

impl RateModel for CycleModel {
    fn points(&self) -> usize {
        self.fault.nodes()
    }

    fn rate(&mut self, time: f64, state: &FieldSet) -> Result<FieldSet, String> {
        let slip = state
            .get(FieldKind::Slip)
            .ok_or_else(|| "integration state is missing the 'slip' field".to_string())?;
        let slip_minus = state.get(FieldKind::SlipMinus);

        let load = self.stress.shear_stress(time, slip, slip_minus)?;
        self.fault.set_tau_qs(&load.plus, load.minus.as_ref())?;
        self.fault.d_dt(time, state)
    }

    fn initial_state(&self) -> FieldSet {
        self.fault.initial_state()
    }

    fn error_fields(&self) -> Vec<FieldKind> {
        match self.fault.variant() {
            FaultVariant::Symmetric => vec![FieldKind::Slip],
            FaultVariant::FullDuplex => vec![FieldKind::Slip, FieldKind::SlipMinus],
        }
    }

    fn name(&self) -> &str {
        "Quasi-dynamic earthquake cycle"
    }

    fn description(&self) -> Option<&str> {
        Some("Rate-and-state fault driven by an external stress operator")
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::FaultConfig;
    use crate::models::SpringSlider;

    fn steady_model(nodes: usize) -> CycleModel {
        let fault = Fault::new(&FaultConfig::symmetric(nodes, 24.0)).unwrap();
        let loading = SpringSlider::steady_loading(&fault);
        CycleModel::new(fault, Box::new(loading))
    }

    #[test]
    fn test_error_fields_exclude_state() {
        let model = steady_model(4);
        assert_eq!(model.error_fields(), vec![FieldKind::Slip]);

        let fault = Fault::new(&FaultConfig::full_duplex(4, 24.0)).unwrap();
        let loading = SpringSlider::steady_loading(&fault);
        let model = CycleModel::new(fault, Box::new(loading));
        assert_eq!(
            model.error_fields(),
            vec![FieldKind::Slip, FieldKind::SlipMinus]
        );
    }

    #[test]
    fn test_rate_runs_full_data_flow() {
        let mut model = steady_model(4);
        let state = model.initial_state();

        let rates = model.rate(0.0, &state).unwrap();
        assert!(rates.shape_matches(&state));

        // at psi = f0 under steady loading the fault creeps near the
        // plate rate
        let v_plate = model.fault().context().v_plate;
        for i in 0..4 {
            let v = rates.get(FieldKind::Slip).unwrap()[i];
            assert!(
                (v - v_plate).abs() < 0.01 * v_plate,
                "node {}: velocity {} vs plate rate {}",
                i,
                v,
                v_plate
            );
        }
    }

    #[test]
    fn test_rate_depends_only_on_supplied_state() {
        let mut model = steady_model(2);
        let state = model.initial_state();

        let first = model.rate(0.0, &state).unwrap();
        let second = model.rate(0.0, &state).unwrap();
        assert_eq!(
            first.get(FieldKind::Slip).unwrap(),
            second.get(FieldKind::Slip).unwrap()
        );
        assert_eq!(
            first.get(FieldKind::State).unwrap(),
            second.get(FieldKind::State).unwrap()
        );
    }

    #[test]
    fn test_rate_missing_slip_field_is_error() {
        let mut model = steady_model(2);
        let state = FieldSet::uniform(FieldKind::State, 2, 0.6);
        assert!(model.rate(0.0, &state).is_err());
    }
}
