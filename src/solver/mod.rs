//! Adaptive time integration
//!
//! This module provides the embedded Runge-Kutta machinery that drives a
//! [`crate::physics::RateModel`] through time with error-controlled,
//! adaptive step sizes.
//!
//! # Core Concepts
//!
//! ## The Architecture (WHAT vs HOW)
//!
//! 1. **Model** ([`crate::physics::RateModel`]) - WHAT to solve
//!    - the rate function `d/dt(state)` and its initial condition
//!
//! 2. **Configuration** ([`SolverConfiguration`]) - HOW to solve
//!    - time range, step-size bounds, tolerance, iteration budget
//!
//! 3. **Integrator** ([`Integrator`] trait) - the numerical method
//!    - embedded Runge-Kutta 3(2), explicit or IMEX
//!
//! ## Stepping loop
//!
//! Every step computes an embedded 2nd/3rd-order solution pair, estimates
//! the local truncation error over the model's designated error fields,
//! and either accepts the step (advance time, invoke the monitor, propose
//! the next step size) or rejects it (shrink the step by a safety-factor
//! power law and retry from the same time). A rejection that is already
//! at the minimum step size is a hard integration failure.
//!
//! Reaching the final time or exhausting the step budget are both
//! normal, successful terminations, distinguished in the report. A
//! monitor may also stop the loop early.

mod step;
mod traits;

pub mod methods;

pub use methods::{ImexRk32Solver, Rk32Solver};
pub use step::StepSizeController;
pub use traits::{
    IntegrationReport, Integrator, MonitorSignal, NullMonitor, SolverConfiguration, StepControl,
    StepMonitor, Termination, TimeRange,
};

// =================================================================================================
// Helper Functions
// =================================================================================================

use crate::physics::FieldSet;

/// Validate an accepted state for numerical issues
///
/// Checks that no field contains NaN or Inf values, which would indicate
/// numerical instability or an error in the physics evaluation.
pub(crate) fn validate_state(state: &FieldSet, step: usize) -> Result<(), String> {
    for (kind, data) in state.iter() {
        if data.iter().any(|x| x.is_nan()) {
            return Err(format!(
                "NaN detected in {} at step {}. This indicates numerical instability; \
                 check the model parameters or tighten the tolerance.",
                kind, step
            ));
        }
        if data.iter().any(|x| x.is_infinite()) {
            return Err(format!(
                "Infinity detected in {} at step {}. This indicates numerical overflow; \
                 check the model parameters or reduce the maximum step size.",
                kind, step
            ));
        }
    }
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
