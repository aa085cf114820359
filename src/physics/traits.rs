//! Rate-model traits
//!
//! This module defines the contract between a physical model and the
//! time integrator:
//! - `RateModel`: evaluates `d/dt(state)` at a given time
//! - `ImplicitRateModel`: adds the once-per-step implicit solve used by
//!   IMEX integration

use super::data::{FieldKind, FieldSet};

// =================================================================================================
// Rate Model Trait
// =================================================================================================

/// Trait for time-dependent physical models
///
/// # Responsibility
/// Computes the right-hand side `f(t, y)` of `dy/dt = f(t, y)`.
/// Does NOT integrate it (that's the integrator's job).
///
/// The model provides the "physics" (equations), the integrator provides
/// the "numerics" (method to advance them).
///
/// # Protocol
///
/// `rate` receives a *read-only* view of the current state and returns a
/// freshly allocated rate buffer. A model may stage the incoming state
/// into internal work copies (hence `&mut self`), but it must never hold
/// a long-lived alias into the integrator's buffers: the integrator owns
/// the integrated state, the model owns its work fields.
///
/// The result of `rate` must depend only on the supplied time and state
/// (plus whatever boundary values the model was explicitly given), so
/// the integrator is free to call it repeatedly at trial stages.
pub trait RateModel: Send {
    /// Number of spatial nodes
    ///
    /// Used by the integrator for shape checks and reporting.
    fn points(&self) -> usize;

    /// Evaluate `d/dt(state)` at `time`
    ///
    /// # Returns
    /// A rate buffer carrying the same field kinds and lengths as
    /// `state`, or `Err` with diagnostic context if any evaluated rate
    /// is not finite or a required boundary value is missing.
    fn rate(&mut self, time: f64, state: &FieldSet) -> Result<FieldSet, String>;

    /// Create the initial condition for this model
    ///
    /// Defines which fields the model evolves (state variable, slip, ...)
    /// and their initial values.
    fn initial_state(&self) -> FieldSet;

    /// Fields whose local truncation error drives step-size control
    ///
    /// Not every integrated quantity is a reliable step-size proxy; a
    /// fault controls on slip rather than on the state variable. The
    /// default uses every field of the initial condition.
    fn error_fields(&self) -> Vec<FieldKind> {
        self.initial_state().kinds()
    }

    /// Name of the model (used for display and reporting)
    fn name(&self) -> &str;

    /// Description of the model (optional)
    fn description(&self) -> Option<&str> {
        None
    }
}

// =================================================================================================
// Implicit Extension (IMEX)
// =================================================================================================

/// Extension trait for models with implicitly integrated fields
///
/// IMEX integration splits the state: the explicit fields advance through
/// the embedded Runge-Kutta stages of [`RateModel::rate`]; the implicit
/// fields advance once per accepted step through `step_implicit`, which
/// the model solves itself (typically Backward Euler, using the freshly
/// accepted explicit state as forcing).
pub trait ImplicitRateModel: RateModel {
    /// Field kinds advanced implicitly
    fn implicit_fields(&self) -> Vec<FieldKind>;

    /// Initial condition for the implicit fields
    fn initial_implicit_state(&self) -> FieldSet;

    /// Advance the implicit fields over `[time - dt, time]`
    ///
    /// # Arguments
    /// * `time` - time at the END of the accepted step
    /// * `dt` - size of the accepted step
    /// * `explicit` - the accepted explicit state at `time`
    /// * `implicit` - implicit fields at `time - dt`, updated in place
    fn step_implicit(
        &mut self,
        time: f64,
        dt: f64,
        explicit: &FieldSet,
        implicit: &mut FieldSet,
    ) -> Result<(), String>;
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    /// Minimal model: constant slip rate
    struct PlateCreep {
        points: usize,
        rate: f64,
    }

    impl RateModel for PlateCreep {
        fn points(&self) -> usize {
            self.points
        }

        fn rate(&mut self, _time: f64, state: &FieldSet) -> Result<FieldSet, String> {
            let n = state
                .len_of(FieldKind::Slip)
                .ok_or_else(|| "slip field missing".to_string())?;
            Ok(FieldSet::new(
                FieldKind::Slip,
                DVector::from_element(n, self.rate),
            ))
        }

        fn initial_state(&self) -> FieldSet {
            FieldSet::uniform(FieldKind::Slip, self.points, 0.0)
        }

        fn name(&self) -> &str {
            "Plate Creep"
        }
    }

    #[test]
    fn test_default_error_fields_cover_initial_state() {
        let model = PlateCreep { points: 4, rate: 1e-9 };
        assert_eq!(model.error_fields(), vec![FieldKind::Slip]);
    }

    #[test]
    fn test_rate_shape_matches_state() {
        let mut model = PlateCreep { points: 4, rate: 1e-9 };
        let state = model.initial_state();
        let rate = model.rate(0.0, &state).unwrap();
        assert!(rate.shape_matches(&state));
        assert_eq!(rate.get(FieldKind::Slip).unwrap()[0], 1e-9);
    }

    #[test]
    fn test_rate_missing_field_is_error() {
        let mut model = PlateCreep { points: 4, rate: 1e-9 };
        let state = FieldSet::uniform(FieldKind::State, 4, 0.6);
        assert!(model.rate(0.0, &state).is_err());
    }
}
