//! Single-node spring slider
//!
//! The smallest meaningful run: one fault node with its traction held at
//! the steady-state value, integrated with the adaptive RK3(2) solver.
//! Started from `psi = f0` the node first creeps at the plate rate, then
//! heals and locks; the state variable rises toward the aging-law
//! fixed-point value `f0 + b*ln(v0/v_plate)`.
//!
//! ```bash
//! cargo run --example spring_slider
//! ```

use quake_rs::friction::DepthProfile;
use quake_rs::output::export::{export_series_csv, CsvConfig, CsvMetadata, FieldHistory};
use quake_rs::prelude::*;

fn main() -> Result<(), String> {
    // ====== Fault: one node, classic benchmark parameters ======

    let mut config = FaultConfig::symmetric(1, 1.0);
    config.a = DepthProfile::constant(0.015);
    config.b = DepthProfile::constant(0.02);
    config.dc = DepthProfile::constant(1e-4);
    config.sigma_n = DepthProfile::constant(50.0);

    let fault = Fault::new(&config)?;
    println!(
        "tau_inf = {:.3} MPa, z = {:.1} MPa s/m",
        fault.steady_state_traction()[0],
        fault.impedance()[0]
    );

    let loading = SpringSlider::steady_loading(&fault);
    let mut model = CycleModel::new(fault, Box::new(loading));

    // ====== Integrate ======

    let config = SolverConfiguration::adaptive(1e6, 5000, 1e-8)
        .with_step_bounds(1e-6, 1e5)
        .with_initial_step(1.0);

    let mut solver = Rk32Solver::new();
    let report = solver.integrate(&mut model, &config, &mut NullMonitor)?;
    println!("{}", report.summary());

    let diagnostics = model.fault().root_diagnostics();
    println!(
        "root finder: {} iterations total, {} best-effort solves",
        diagnostics.total_iterations, diagnostics.best_effort_nodes
    );

    // ====== Export the state history ======

    let psi = FieldHistory::from_report(&report, FieldKind::State)?;
    let csv_config = CsvConfig {
        value_header: "State variable psi".to_string(),
        ..CsvConfig::default()
    }
    .with_metadata(CsvMetadata {
        model_name: Some("Spring slider".to_string()),
        solver_name: Some("Runge-Kutta 3(2)".to_string()),
        final_time: Some(report.final_time()),
        steps: Some(report.steps),
    });
    export_series_csv(
        &psi.times,
        &psi.node_series(0),
        "spring_slider_psi.csv",
        Some(&csv_config),
    )
    .map_err(|e| e.to_string())?;

    let psi_ss = 0.6 + 0.02 * (1e-6f64 / 1e-9).ln();
    println!(
        "final psi = {:.4} (aging-law fixed point at {:.4})",
        psi.node_series(0).last().unwrap(),
        psi_ss
    );
    println!("wrote spring_slider_psi.csv");
    Ok(())
}
