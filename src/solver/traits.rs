//! Integrator traits and configuration types
//!
//! # Design Philosophy
//!
//! Configuration is plain data with validation: [`TimeRange`] says over
//! what interval to integrate, [`StepControl`] how the step size may
//! move, and [`SolverConfiguration`] bundles them with the step budget.
//! The [`Integrator`] trait is the stable entry point all methods
//! implement; [`IntegrationReport`] is the uniform result.

use crate::physics::{FieldSet, RateModel};
use std::collections::HashMap;

// =================================================================================================
// Configuration
// =================================================================================================

/// Integration time window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    /// Start time (s)
    pub initial: f64,
    /// End time (s)
    pub final_time: f64,
}

impl TimeRange {
    /// Validate that the window is finite and forward in time
    pub fn validate(&self) -> Result<(), String> {
        if !self.initial.is_finite() || !self.final_time.is_finite() {
            return Err(format!(
                "time range [{}, {}] must be finite",
                self.initial, self.final_time
            ));
        }
        if self.final_time < self.initial {
            return Err(format!(
                "final time {} lies before initial time {}",
                self.final_time, self.initial
            ));
        }
        Ok(())
    }
}

/// Adaptive step-size control parameters
///
/// The proposal after a step with error estimate `err` is
///
/// ```text
/// dt_new = safety * dt * (atol / err)^(1/order)
/// ```
///
/// with growth capped at `growth_cap` per step (to prevent step-size
/// oscillation) and the result clamped to `[min_dt, max_dt]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepControl {
    /// Absolute tolerance on the local truncation error
    pub atol: f64,
    /// First attempted step size (s)
    pub init_dt: f64,
    /// Smallest allowed step size (s); a rejected step already at this
    /// size is a fatal integration failure
    pub min_dt: f64,
    /// Largest allowed step size (s)
    pub max_dt: f64,
    /// Safety factor kappa in the step-size formula
    pub safety: f64,
    /// Maximum step-size growth factor per accepted step
    pub growth_cap: f64,
    /// Order used in the error exponent (3 for the embedded RK3(2) pair)
    pub order: f64,
}

impl Default for StepControl {
    fn default() -> Self {
        Self {
            atol: 1e-7,
            init_dt: 1e-3,
            min_dt: 1e-12,
            max_dt: 1e7,
            safety: 0.9,
            growth_cap: 5.0,
            order: 3.0,
        }
    }
}

impl StepControl {
    /// Validate that the parameters are usable
    pub fn validate(&self) -> Result<(), String> {
        if !(self.atol > 0.0) || !self.atol.is_finite() {
            return Err(format!("atol must be positive and finite, got {}", self.atol));
        }
        if !(self.min_dt > 0.0) || !(self.max_dt > 0.0) {
            return Err(format!(
                "step-size bounds must be positive, got [{}, {}]",
                self.min_dt, self.max_dt
            ));
        }
        if self.min_dt > self.max_dt {
            return Err(format!(
                "minimum step size {} exceeds maximum {}",
                self.min_dt, self.max_dt
            ));
        }
        if self.init_dt < self.min_dt || self.init_dt > self.max_dt {
            return Err(format!(
                "initial step size {} outside bounds [{}, {}]",
                self.init_dt, self.min_dt, self.max_dt
            ));
        }
        if !(self.safety > 0.0 && self.safety <= 1.0) {
            return Err(format!("safety factor must be in (0, 1], got {}", self.safety));
        }
        if !(self.growth_cap > 1.0) {
            return Err(format!("growth cap must exceed 1, got {}", self.growth_cap));
        }
        if !(self.order >= 1.0) {
            return Err(format!("order must be at least 1, got {}", self.order));
        }
        Ok(())
    }
}

/// Full integrator configuration
///
/// # Examples
///
/// ```rust
/// use quake_rs::solver::SolverConfiguration;
///
/// let config = SolverConfiguration::adaptive(3.0e9, 10_000, 1e-8)
///     .with_step_bounds(1e-6, 1e6)
///     .with_initial_step(1.0);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfiguration {
    /// Integration window
    pub time: TimeRange,
    /// Step budget; exhausting it is a normal termination
    pub max_steps: usize,
    /// Step-size control parameters
    pub control: StepControl,
}

impl SolverConfiguration {
    /// Adaptive integration from `t = 0` to `final_time`
    pub fn adaptive(final_time: f64, max_steps: usize, atol: f64) -> Self {
        Self {
            time: TimeRange { initial: 0.0, final_time },
            max_steps,
            control: StepControl { atol, ..StepControl::default() },
        }
    }

    /// Builder: integration window
    pub fn with_time_range(mut self, initial: f64, final_time: f64) -> Self {
        self.time = TimeRange { initial, final_time };
        self
    }

    /// Builder: step-size bounds
    pub fn with_step_bounds(mut self, min_dt: f64, max_dt: f64) -> Self {
        self.control.min_dt = min_dt;
        self.control.max_dt = max_dt;
        self
    }

    /// Builder: first attempted step size
    pub fn with_initial_step(mut self, init_dt: f64) -> Self {
        self.control.init_dt = init_dt;
        self
    }

    /// Builder: safety factor
    pub fn with_safety(mut self, safety: f64) -> Self {
        self.control.safety = safety;
        self
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<(), String> {
        self.time.validate()?;
        if self.max_steps == 0 {
            return Err("step budget must be positive".to_string());
        }
        self.control.validate()
    }
}

// =================================================================================================
// Report
// =================================================================================================

/// Why the stepping loop ended
///
/// All three are normal, successful terminations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The final time was reached
    TimeReached,
    /// The step budget was exhausted
    MaxStepsReached,
    /// A monitor signalled stop
    MonitorStop,
}

/// Result of one integration run
#[derive(Debug, Clone)]
pub struct IntegrationReport {
    /// Accepted time points, including the initial time
    pub time_points: Vec<f64>,
    /// Accepted states, index-aligned with `time_points`
    pub trajectory: Vec<FieldSet>,
    /// State at the last accepted step
    pub final_state: FieldSet,
    /// Implicit fields at the last accepted step (IMEX only)
    pub implicit_state: Option<FieldSet>,
    /// Why the loop ended
    pub termination: Termination,
    /// Accepted steps
    pub steps: usize,
    /// Rejected step attempts
    pub rejected_steps: usize,
    /// Times the proposal was clamped up to the minimum step size
    pub min_step_hits: usize,
    /// Times the proposal was clamped down to the maximum step size
    pub max_step_hits: usize,
    /// Rate-function evaluations
    pub rate_evaluations: usize,
    /// Last proposed step size
    pub final_dt: f64,
    /// Free-form metadata (solver name, tolerances, diagnostics)
    pub metadata: HashMap<String, String>,
}

impl IntegrationReport {
    /// Number of recorded points (accepted steps + initial condition)
    pub fn len(&self) -> usize {
        self.time_points.len()
    }

    /// True when nothing beyond the initial condition was recorded
    pub fn is_empty(&self) -> bool {
        self.time_points.len() <= 1
    }

    /// Final reached time
    pub fn final_time(&self) -> f64 {
        *self.time_points.last().unwrap_or(&0.0)
    }

    /// Attach a metadata entry
    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    /// Human-readable summary block
    pub fn summary(&self) -> String {
        let termination = match self.termination {
            Termination::TimeReached => "final time reached",
            Termination::MaxStepsReached => "step budget exhausted",
            Termination::MonitorStop => "stopped by monitor",
        };
        format!(
            "Integration summary:\n\
             \x20  termination:        {}\n\
             \x20  steps accepted:     {}\n\
             \x20  steps rejected:     {}\n\
             \x20  rate evaluations:   {}\n\
             \x20  final time reached: {:.6e}\n\
             \x20  last step size:     {:.6e}\n\
             \x20  min/max dt hits:    {}/{}",
            termination,
            self.steps,
            self.rejected_steps,
            self.rate_evaluations,
            self.final_time(),
            self.final_dt,
            self.min_step_hits,
            self.max_step_hits
        )
    }
}

// =================================================================================================
// Monitor
// =================================================================================================

/// Signal returned by a step monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorSignal {
    /// Keep stepping
    Continue,
    /// End the run (a normal termination)
    Stop,
}

/// Per-accepted-step hook
///
/// Invoked after every accepted step with the new time, the step count,
/// the step size just used and the accepted state. Errors propagate as
/// integration failures; returning [`MonitorSignal::Stop`] ends the run
/// normally (e.g. on detecting a simulation-specific termination
/// criterion).
pub trait StepMonitor {
    /// Observe one accepted step
    fn on_step(
        &mut self,
        time: f64,
        step: usize,
        dt: f64,
        state: &FieldSet,
    ) -> Result<MonitorSignal, String>;
}

/// Monitor that does nothing and never stops the run
pub struct NullMonitor;

impl StepMonitor for NullMonitor {
    fn on_step(
        &mut self,
        _time: f64,
        _step: usize,
        _dt: f64,
        _state: &FieldSet,
    ) -> Result<MonitorSignal, String> {
        Ok(MonitorSignal::Continue)
    }
}

// =================================================================================================
// Integrator Trait
// =================================================================================================

/// Stable interface for all explicit integrators
pub trait Integrator {
    /// Integrate `model` over the configured time window
    fn integrate(
        &mut self,
        model: &mut dyn RateModel,
        config: &SolverConfiguration,
        monitor: &mut dyn StepMonitor,
    ) -> Result<IntegrationReport, String>;

    /// Name of the method
    fn name(&self) -> &'static str;
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_control_is_valid() {
        assert!(StepControl::default().validate().is_ok());
    }

    #[test]
    fn test_control_rejects_bad_bounds() {
        let mut control = StepControl::default();
        control.min_dt = 1.0;
        control.max_dt = 0.5;
        assert!(control.validate().is_err());

        let mut control = StepControl::default();
        control.init_dt = 1e9;
        assert!(control.validate().unwrap_err().contains("initial step"));

        let mut control = StepControl::default();
        control.atol = 0.0;
        assert!(control.validate().is_err());

        let mut control = StepControl::default();
        control.safety = 1.5;
        assert!(control.validate().is_err());
    }

    #[test]
    fn test_configuration_factory_and_builders() {
        let config = SolverConfiguration::adaptive(100.0, 50, 1e-9)
            .with_step_bounds(1e-6, 10.0)
            .with_initial_step(0.5)
            .with_safety(0.8);

        assert!(config.validate().is_ok());
        assert_eq!(config.time.final_time, 100.0);
        assert_eq!(config.max_steps, 50);
        assert_eq!(config.control.atol, 1e-9);
        assert_eq!(config.control.init_dt, 0.5);
        assert_eq!(config.control.safety, 0.8);
    }

    #[test]
    fn test_configuration_rejects_backward_time() {
        let config = SolverConfiguration::adaptive(10.0, 100, 1e-8).with_time_range(20.0, 10.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configuration_rejects_zero_budget() {
        let config = SolverConfiguration::adaptive(10.0, 0, 1e-8);
        assert!(config.validate().unwrap_err().contains("budget"));
    }

    #[test]
    fn test_report_summary_names_termination() {
        let report = IntegrationReport {
            time_points: vec![0.0, 1.0],
            trajectory: vec![FieldSet::empty(), FieldSet::empty()],
            final_state: FieldSet::empty(),
            implicit_state: None,
            termination: Termination::MaxStepsReached,
            steps: 1,
            rejected_steps: 2,
            min_step_hits: 0,
            max_step_hits: 3,
            rate_evaluations: 9,
            final_dt: 0.5,
            metadata: HashMap::new(),
        };
        let summary = report.summary();
        assert!(summary.contains("step budget exhausted"));
        assert!(summary.contains("steps accepted:     1"));
        assert!(summary.contains("0/3"));
    }
}
