//! IMEX Runge-Kutta 3(2) with Backward-Euler implicit fields
//!
//! Implicit-explicit time stepping for models whose state splits into a
//! non-stiff part (advanced by the embedded explicit RK3(2) pair of
//! [`super::Rk32Solver`]) and a stiff part (advanced once per accepted
//! step by an implicit solve the model performs itself, typically
//! Backward Euler with the freshly accepted explicit state as forcing).
//!
//! The implicit fields never participate in the error estimate: step
//! -size control is driven by the explicit error fields alone, and the
//! implicit solve is unconditionally stable by construction.
//!
//! Because the implicit solve is part of the model contract
//! ([`ImplicitRateModel`]), this solver exposes its own `integrate`
//! method instead of implementing [`crate::solver::Integrator`] for
//! plain rate models.

use crate::physics::ImplicitRateModel;
use crate::solver::step::StepSizeController;
use crate::solver::traits::{
    IntegrationReport, MonitorSignal, SolverConfiguration, StepMonitor, Termination,
};
use crate::solver::validate_state;
use std::collections::HashMap;

// =================================================================================================
// IMEX RK32 Solver
// =================================================================================================

/// Explicit RK3(2) with a once-per-step implicit solve
#[derive(Debug, Clone, Copy, Default)]
pub struct ImexRk32Solver;

impl ImexRk32Solver {
    /// Create a new IMEX solver
    pub fn new() -> Self {
        Self
    }

    /// Name of the method
    pub fn name(&self) -> &'static str {
        "IMEX Runge-Kutta 3(2) + Backward Euler"
    }

    /// Integrate `model` over the configured time window
    pub fn integrate(
        &mut self,
        model: &mut dyn ImplicitRateModel,
        config: &SolverConfiguration,
        monitor: &mut dyn StepMonitor,
    ) -> Result<IntegrationReport, String> {
        // ====== Step 1: Validation ======

        config.validate()?;

        let error_fields = model.error_fields();
        let mut y = model.initial_state();
        if y.is_empty() {
            return Err(format!("model '{}' provided an empty initial state", model.name()));
        }

        let mut var_im = model.initial_implicit_state();
        for kind in model.implicit_fields() {
            if !var_im.contains(kind) {
                return Err(format!(
                    "model '{}' lists implicit field '{}' but its implicit state lacks it",
                    model.name(),
                    kind
                ));
            }
        }

        // ====== Step 2: Setup ======

        let mut t = config.time.initial;
        let final_t = config.time.final_time;
        let mut dt = config.control.init_dt;
        let mut controller = StepSizeController::new(&config.control);

        let mut steps = 0usize;
        let mut evaluations = 0usize;
        let mut time_points = vec![t];
        let mut trajectory = vec![y.clone()];
        let mut termination = Termination::TimeReached;

        // ====== Step 3: Stepping loop ======

        'stepping: while t < final_t && steps < config.max_steps {
            if t + dt > final_t {
                dt = final_t - t;
            }

            loop {
                // explicit stages, identical to the pure RK3(2) scheme
                let k1 = model.rate(t, &y)?;
                evaluations += 1;
                if !k1.shape_matches(&y) {
                    return Err(format!(
                        "rate buffer of model '{}' is not shape-matched to the state",
                        model.name()
                    ));
                }

                let y_half = y.clone() + k1.clone() * (0.5 * dt);
                let k2 = model.rate(t + 0.5 * dt, &y_half)?;
                evaluations += 1;

                let y_full = y.clone() + k1.clone() * (-dt) + k2.clone() * (2.0 * dt);
                let k3 = model.rate(t + dt, &y_full)?;
                evaluations += 1;

                let second = y.clone() + (k1.clone() + k3.clone()) * (0.5 * dt);
                let third = y.clone() + (k1 + k2 * 4.0 + k3) * (dt / 6.0);

                let err = StepSizeController::error_norm(&third, &second, &error_fields)?;

                if controller.accepts(err) {
                    t += dt;
                    steps += 1;
                    y = third;
                    validate_state(&y, steps)?;

                    // implicit update, once per accepted step
                    model.step_implicit(t, dt, &y, &mut var_im)?;
                    validate_state(&var_im, steps)?;

                    time_points.push(t);
                    trajectory.push(y.clone());

                    if monitor.on_step(t, steps, dt, &y)? == MonitorSignal::Stop {
                        termination = Termination::MonitorStop;
                        break 'stepping;
                    }

                    dt = controller.propose(err, dt);
                    break;
                }

                controller.record_rejection();
                if dt <= controller.min_dt() {
                    return Err(format!(
                        "step size underflow at t={:e}: error {:e} exceeds tolerance {:e} \
                         at the minimum step size {:e}",
                        t,
                        err,
                        controller.atol(),
                        controller.min_dt()
                    ));
                }
                dt = controller.propose(err, dt);
            }
        }

        if termination == Termination::TimeReached && t < final_t {
            termination = Termination::MaxStepsReached;
        }

        // ====== Step 4: Build Report ======

        let mut report = IntegrationReport {
            time_points,
            trajectory,
            final_state: y,
            implicit_state: Some(var_im),
            termination,
            steps,
            rejected_steps: controller.rejected_steps,
            min_step_hits: controller.min_step_hits,
            max_step_hits: controller.max_step_hits,
            rate_evaluations: evaluations,
            final_dt: dt,
            metadata: HashMap::new(),
        };
        report.add_metadata("solver", self.name());
        report.add_metadata("model", model.name());
        report.add_metadata("atol", &config.control.atol.to_string());
        Ok(report)
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{FieldKind, FieldSet, RateModel};
    use crate::solver::NullMonitor;

    /// Explicit: constant slip growth. Implicit: temperature relaxing
    /// toward `t_eq` with time constant `tau`, solved by Backward Euler:
    /// `T_new = (T + dt*t_eq/tau) / (1 + dt/tau)`.
    struct ThermalRelaxation {
        points: usize,
        growth: f64,
        t_eq: f64,
        tau: f64,
        t_init: f64,
    }

    impl RateModel for ThermalRelaxation {
        fn points(&self) -> usize {
            self.points
        }

        fn rate(&mut self, _time: f64, _state: &FieldSet) -> Result<FieldSet, String> {
            Ok(FieldSet::uniform(FieldKind::Slip, self.points, self.growth))
        }

        fn initial_state(&self) -> FieldSet {
            FieldSet::uniform(FieldKind::Slip, self.points, 0.0)
        }

        fn name(&self) -> &str {
            "Thermal Relaxation"
        }
    }

    impl ImplicitRateModel for ThermalRelaxation {
        fn implicit_fields(&self) -> Vec<FieldKind> {
            vec![FieldKind::Temperature]
        }

        fn initial_implicit_state(&self) -> FieldSet {
            FieldSet::uniform(FieldKind::Temperature, self.points, self.t_init)
        }

        fn step_implicit(
            &mut self,
            _time: f64,
            dt: f64,
            _explicit: &FieldSet,
            implicit: &mut FieldSet,
        ) -> Result<(), String> {
            let temp = implicit
                .get_mut(FieldKind::Temperature)
                .ok_or_else(|| "temperature field missing".to_string())?;
            for value in temp.iter_mut() {
                *value = (*value + dt * self.t_eq / self.tau) / (1.0 + dt / self.tau);
            }
            Ok(())
        }
    }

    fn model() -> ThermalRelaxation {
        ThermalRelaxation {
            points: 3,
            growth: 1e-9,
            t_eq: 483.0,
            tau: 10.0,
            t_init: 283.0,
        }
    }

    #[test]
    fn test_implicit_field_relaxes_to_equilibrium() {
        let mut model = model();
        let config = SolverConfiguration::adaptive(500.0, 10_000, 1e-8)
            .with_step_bounds(1e-9, 5.0)
            .with_initial_step(0.1);

        let report = ImexRk32Solver::new()
            .integrate(&mut model, &config, &mut NullMonitor)
            .unwrap();

        assert_eq!(report.termination, Termination::TimeReached);

        // 50 relaxation times: Backward Euler must be at equilibrium
        let temp = report
            .implicit_state
            .as_ref()
            .unwrap()
            .get(FieldKind::Temperature)
            .unwrap();
        for i in 0..3 {
            assert!(
                (temp[i] - 483.0).abs() < 0.5,
                "node {}: T = {}",
                i,
                temp[i]
            );
        }

        // the explicit field advanced as usual
        let slip = report.final_state.get(FieldKind::Slip).unwrap();
        assert!((slip[0] - 1e-9 * 500.0).abs() < 1e-12);
    }

    #[test]
    fn test_implicit_fields_do_not_drive_step_control() {
        // the explicit part has zero error, so the step size must grow
        // to the maximum regardless of the stiff implicit relaxation
        let mut model = model();
        let config = SolverConfiguration::adaptive(100.0, 10_000, 1e-8)
            .with_step_bounds(1e-9, 20.0)
            .with_initial_step(0.1);

        let report = ImexRk32Solver::new()
            .integrate(&mut model, &config, &mut NullMonitor)
            .unwrap();

        assert_eq!(report.rejected_steps, 0);
        assert!(report.max_step_hits > 0);
    }

    #[test]
    fn test_missing_implicit_field_is_error() {
        struct Broken(ThermalRelaxation);

        impl RateModel for Broken {
            fn points(&self) -> usize {
                self.0.points()
            }
            fn rate(&mut self, time: f64, state: &FieldSet) -> Result<FieldSet, String> {
                self.0.rate(time, state)
            }
            fn initial_state(&self) -> FieldSet {
                self.0.initial_state()
            }
            fn name(&self) -> &str {
                "Broken"
            }
        }

        impl ImplicitRateModel for Broken {
            fn implicit_fields(&self) -> Vec<FieldKind> {
                vec![FieldKind::Temperature]
            }
            fn initial_implicit_state(&self) -> FieldSet {
                FieldSet::empty() // lacks the declared field
            }
            fn step_implicit(
                &mut self,
                _time: f64,
                _dt: f64,
                _explicit: &FieldSet,
                _implicit: &mut FieldSet,
            ) -> Result<(), String> {
                Ok(())
            }
        }

        let mut model = Broken(model());
        let config = SolverConfiguration::adaptive(1.0, 10, 1e-8);
        let err = ImexRk32Solver::new()
            .integrate(&mut model, &config, &mut NullMonitor)
            .unwrap_err();
        assert!(err.contains("implicit field"), "unexpected error: {}", err);
    }
}
