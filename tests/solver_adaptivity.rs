//! Step-size control and termination behaviour of the adaptive solver

use quake_rs::physics::FieldKind;
use quake_rs::solver::{
    Integrator, NullMonitor, Rk32Solver, SolverConfiguration, Termination,
};

mod common;
use common::test_helpers::relative_error;
use common::{ConstantGrowth, ExponentialDecay};

// =================================================================================================
// Step-size boundary behaviour
// =================================================================================================

#[test]
fn test_zero_error_system_saturates_at_max_step() {
    // a constant-rate system is integrated exactly: the error estimate
    // is zero, so the step size must grow to max_dt and stay there
    let mut model = ConstantGrowth::new(4, 3.0);
    let config = SolverConfiguration::adaptive(500.0, 10_000, 1e-8)
        .with_step_bounds(1e-9, 4.0)
        .with_initial_step(1e-3);

    let report = Rk32Solver::new()
        .integrate(&mut model, &config, &mut NullMonitor)
        .unwrap();

    assert_eq!(report.termination, Termination::TimeReached);
    assert_eq!(report.rejected_steps, 0);
    assert_eq!(report.min_step_hits, 0);
    assert!(report.max_step_hits > 0);

    // and the result is exact up to roundoff
    let y = report.final_state.get(FieldKind::Slip).unwrap()[0];
    assert!(relative_error(y, 1500.0) < 1e-12);
}

#[test]
fn test_stiff_system_rejects_then_recovers() {
    // starting far outside the stability region forces at least one
    // rejection before the controller finds a workable step size
    let mut model = ExponentialDecay::new(2, 300.0);
    let config = SolverConfiguration::adaptive(0.2, 200_000, 1e-10)
        .with_step_bounds(1e-13, 1.0)
        .with_initial_step(1.0);

    let report = Rk32Solver::new()
        .integrate(&mut model, &config, &mut NullMonitor)
        .unwrap();

    assert!(report.rejected_steps >= 1);
    assert_eq!(report.termination, Termination::TimeReached);

    let actual = report.final_state.get(FieldKind::Slip).unwrap()[0];
    let expected = (-300.0f64 * 0.2).exp();
    assert!((actual - expected).abs() < 1e-6);
}

#[test]
fn test_tighter_tolerance_means_smaller_error() {
    let run = |atol: f64| {
        let mut model = ExponentialDecay::new(1, 1.0);
        let config = SolverConfiguration::adaptive(3.0, 100_000, atol)
            .with_step_bounds(1e-12, 0.5)
            .with_initial_step(1e-3);
        let report = Rk32Solver::new()
            .integrate(&mut model, &config, &mut NullMonitor)
            .unwrap();
        let actual = report.final_state.get(FieldKind::Slip).unwrap()[0];
        relative_error(actual, (-3.0f64).exp())
    };

    let loose = run(1e-5);
    let tight = run(1e-10);
    assert!(
        tight < loose,
        "tightening atol did not reduce the error: {} vs {}",
        tight,
        loose
    );
    assert!(tight < 1e-6);
}

// =================================================================================================
// Termination accounting
// =================================================================================================

#[test]
fn test_time_and_step_budgets_are_distinguished() {
    // generous budget: terminates on time
    let mut model = ConstantGrowth::new(1, 1.0);
    let config = SolverConfiguration::adaptive(10.0, 1000, 1e-8)
        .with_step_bounds(1e-9, 1.0)
        .with_initial_step(1.0);
    let report = Rk32Solver::new()
        .integrate(&mut model, &config, &mut NullMonitor)
        .unwrap();
    assert_eq!(report.termination, Termination::TimeReached);
    assert!(report.summary().contains("final time reached"));

    // tiny budget: terminates on steps, also a success
    let mut model = ConstantGrowth::new(1, 1.0);
    let config = SolverConfiguration::adaptive(1e9, 3, 1e-8)
        .with_step_bounds(1e-9, 1.0)
        .with_initial_step(0.5);
    let report = Rk32Solver::new()
        .integrate(&mut model, &config, &mut NullMonitor)
        .unwrap();
    assert_eq!(report.termination, Termination::MaxStepsReached);
    assert_eq!(report.steps, 3);
    assert!(report.summary().contains("step budget exhausted"));
}

#[test]
fn test_final_time_is_hit_exactly() {
    // the last step is clamped so the trajectory ends exactly at the
    // configured final time
    let mut model = ExponentialDecay::new(1, 0.3);
    let config = SolverConfiguration::adaptive(7.3, 10_000, 1e-9)
        .with_step_bounds(1e-12, 2.0)
        .with_initial_step(0.1);

    let report = Rk32Solver::new()
        .integrate(&mut model, &config, &mut NullMonitor)
        .unwrap();

    assert_eq!(report.termination, Termination::TimeReached);
    assert!((report.final_time() - 7.3).abs() < 1e-12);
}

#[test]
fn test_trajectory_and_counters_are_consistent() {
    let mut model = ExponentialDecay::new(3, 0.5);
    let config = SolverConfiguration::adaptive(2.0, 10_000, 1e-9)
        .with_step_bounds(1e-12, 0.5)
        .with_initial_step(0.01);

    let report = Rk32Solver::new()
        .integrate(&mut model, &config, &mut NullMonitor)
        .unwrap();

    assert_eq!(report.len(), report.steps + 1);
    // three rate evaluations per attempted step
    assert_eq!(
        report.rate_evaluations,
        3 * (report.steps + report.rejected_steps)
    );
    // times strictly increase
    for pair in report.time_points.windows(2) {
        assert!(pair[1] > pair[0]);
    }
}
