//! Step-size control
//!
//! Shared by the explicit and IMEX integrators: an error norm over the
//! designated error fields and the safety-factor power-law proposal with
//! growth cap, clamping and bound-hit bookkeeping.

use crate::physics::{FieldKind, FieldSet};
use crate::solver::traits::StepControl;

/// Error-based step-size controller
///
/// Owns the tolerance, the bounds and the rejection counters for one
/// integration run.
#[derive(Debug, Clone)]
pub struct StepSizeController {
    atol: f64,
    safety: f64,
    order: f64,
    min_dt: f64,
    max_dt: f64,
    growth_cap: f64,

    /// Rejected step attempts
    pub rejected_steps: usize,
    /// Times the proposal was clamped up to `min_dt`
    pub min_step_hits: usize,
    /// Times the proposal was clamped down to `max_dt`
    pub max_step_hits: usize,
}

impl StepSizeController {
    /// Build a controller from validated control parameters
    pub fn new(control: &StepControl) -> Self {
        Self {
            atol: control.atol,
            safety: control.safety,
            order: control.order,
            min_dt: control.min_dt,
            max_dt: control.max_dt,
            growth_cap: control.growth_cap,
            rejected_steps: 0,
            min_step_hits: 0,
            max_step_hits: 0,
        }
    }

    /// Smallest allowed step size
    pub fn min_dt(&self) -> f64 {
        self.min_dt
    }

    /// Absolute tolerance
    pub fn atol(&self) -> f64 {
        self.atol
    }

    /// RMS difference between the two embedded solution candidates over
    /// the designated error fields
    ///
    /// Only the listed fields contribute: not every integrated quantity
    /// is a reliable step-size proxy.
    pub fn error_norm(
        high: &FieldSet,
        low: &FieldSet,
        error_fields: &[FieldKind],
    ) -> Result<f64, String> {
        let mut sum_sq = 0.0;
        let mut count = 0usize;

        for &kind in error_fields {
            let high_field = high
                .get(kind)
                .ok_or_else(|| format!("error field '{}' missing from stage state", kind))?;
            let low_field = low
                .get(kind)
                .ok_or_else(|| format!("error field '{}' missing from stage state", kind))?;
            if high_field.len() != low_field.len() {
                return Err(format!(
                    "error field '{}' has mismatched lengths {} vs {}",
                    kind,
                    high_field.len(),
                    low_field.len()
                ));
            }
            for (x, y) in high_field.iter().zip(low_field.iter()) {
                let diff = x - y;
                sum_sq += diff * diff;
            }
            count += high_field.len();
        }

        if count == 0 {
            return Err("error-index list selected no components".to_string());
        }
        Ok((sum_sq / count as f64).sqrt())
    }

    /// Whether an error estimate passes the tolerance
    pub fn accepts(&self, err: f64) -> bool {
        err <= self.atol
    }

    /// Record one rejected attempt
    pub fn record_rejection(&mut self) {
        self.rejected_steps += 1;
    }

    /// Propose the next step size after a step with error `err`
    ///
    /// `dt_new = safety * dt * (atol/err)^(1/order)`, growth capped and
    /// clamped to the bounds. A zero error proposes maximal growth.
    pub fn propose(&mut self, err: f64, dt: f64) -> f64 {
        let raw = if err <= 0.0 {
            dt * self.growth_cap
        } else {
            self.safety * dt * (self.atol / err).powf(1.0 / self.order)
        };
        let capped = raw.min(dt * self.growth_cap);

        if capped < self.min_dt {
            self.min_step_hits += 1;
        } else if capped > self.max_dt {
            self.max_step_hits += 1;
        }
        capped.clamp(self.min_dt, self.max_dt)
    }
}

// =================================================================================================
// Tests
// =================================================================================================
