//! Embedded explicit Runge-Kutta 3(2) with adaptive step size
//!
//! # Mathematical Background
//!
//! The scheme (Hairer, Norsett & Wanner) advances `dy/dt = f(t, y)` with
//! three stages per attempted step:
//!
//! ```text
//! k1 = f(t, y)
//! k2 = f(t + dt/2, y + dt/2 * k1)
//! k3 = f(t + dt,   y - dt*k1 + 2*dt*k2)
//!
//! y2 = y + dt/2 * (k1 + k3)            (2nd order)
//! y3 = y + dt/6 * (k1 + 4*k2 + k3)     (3rd order)
//! ```
//!
//! The pair self-estimates the local truncation error as the difference
//! between the two candidates, measured only over the model's designated
//! error fields. The 3rd-order candidate propagates.
//!
//! # Characteristics
//!
//! - **Order**: third order, with an embedded second-order error estimate
//! - **Cost**: 3 rate evaluations per attempted step
//! - **Step control**: `dt_new = safety * dt * (atol/err)^(1/3)`, growth
//!   capped, clamped to the configured bounds
//!
//! # When to Use
//!
//! Earthquake-cycle rate functions are expensive (every evaluation runs
//! a per-node nonlinear solve) and their stiffness varies over many
//! orders of magnitude between interseismic loading and an event. A low
//! -order embedded pair keeps the per-step cost small while the error
//! control does the work of finding the usable step size.
//!
//! # Failure semantics
//!
//! A rejected step already at the minimum step size is a hard
//! integration failure: the error cannot be brought under tolerance and
//! silent continuation would corrupt the solution.

use crate::physics::RateModel;
use crate::solver::step::StepSizeController;
use crate::solver::traits::{
    IntegrationReport, Integrator, MonitorSignal, SolverConfiguration, StepMonitor, Termination,
};
use crate::solver::validate_state;
use std::collections::HashMap;

// =================================================================================================
// RK32 Solver
// =================================================================================================

/// Adaptive embedded Runge-Kutta 3(2) integrator
///
/// # Example
///
/// ```rust
/// use quake_rs::prelude::*;
///
/// # fn main() -> Result<(), String> {
/// let config = FaultConfig::symmetric(4, 24.0);
/// let fault = Fault::new(&config)?;
/// let loading = SpringSlider::steady_loading(&fault);
/// let mut model = CycleModel::new(fault, Box::new(loading));
///
/// let config = SolverConfiguration::adaptive(1.0e6, 100, 1e-7);
/// let mut solver = Rk32Solver::new();
/// let report = solver.integrate(&mut model, &config, &mut NullMonitor)?;
/// assert!(report.steps > 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Rk32Solver;

impl Rk32Solver {
    /// Create a new RK3(2) solver
    pub fn new() -> Self {
        Self
    }
}

impl Integrator for Rk32Solver {
    fn integrate(
        &mut self,
        model: &mut dyn RateModel,
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
            // never step past the final time
            if t + dt > final_t {
                dt = final_t - t;
            }

            // attempt loop: reject and retry from the same t until the
            // error estimate passes the tolerance
            loop {
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

                    time_points.push(t);
                    trajectory.push(y.clone());

                    if monitor.on_step(t, steps, dt, &y)? == MonitorSignal::Stop {
                        termination = Termination::MonitorStop;
                        break 'stepping;
                    }

                    dt = controller.propose(err, dt);
                    break;
                }

                // rejection: shrink and retry, unless the step size is
                // already pinned at the minimum
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
            implicit_state: None,
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

    fn name(&self) -> &'static str {
        "Runge-Kutta 3(2)"
    }
}

// =================================================================================================
// Tests
// =================================================================================================
