//! Binary per-field archives
//!
//! Persistence contract: one file per field. The context fields (`a`,
//! `b`, `z`, `sigma_n`) are written once at the start of a run; the
//! time-series fields (`slip`, `slip_vel`, `tau_qs`, `psi`, plus a
//! `time` file) are appended one flat array per recorded step, so every
//! file is a single growable array in write order. Values are
//! little-endian `f64`.

use crate::models::CycleModel;
use crate::solver::IntegrationReport;
use nalgebra::DVector;
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Binary archive writer rooted at one output directory
pub struct FieldArchive {
    dir: PathBuf,
    steps_written: usize,
}

impl FieldArchive {
    /// Create (or reuse) the output directory
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, String> {
        let dir = dir.as_ref().to_path_buf();
        create_dir_all(&dir)
            .map_err(|e| format!("cannot create archive directory {}: {}", dir.display(), e))?;
        Ok(Self { dir, steps_written: 0 })
    }

    /// Number of steps appended so far
    pub fn steps_written(&self) -> usize {
        self.steps_written
    }

    fn write_vector(file: &mut File, values: &DVector<f64>) -> Result<(), String> {
        let mut bytes = Vec::with_capacity(values.len() * 8);
        for x in values.iter() {
            bytes.extend_from_slice(&x.to_le_bytes());
        }
        file.write_all(&bytes).map_err(|e| format!("archive write failed: {}", e))
    }

    fn truncate_file(&self, name: &str) -> Result<File, String> {
        let path = self.dir.join(name);
        File::create(&path).map_err(|e| format!("cannot create {}: {}", path.display(), e))
    }

    fn append_file(&self, name: &str) -> Result<File, String> {
        let path = self.dir.join(name);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| format!("cannot open {} for append: {}", path.display(), e))
    }

    /// Write the run-constant context fields, truncating any previous
    /// content
    pub fn write_context(&mut self, fault: &crate::fault::Fault) -> Result<(), String> {
        Self::write_vector(&mut self.truncate_file("a")?, fault.a())?;
        Self::write_vector(&mut self.truncate_file("b")?, fault.b())?;
        Self::write_vector(&mut self.truncate_file("z")?, fault.impedance())?;
        Self::write_vector(&mut self.truncate_file("sigma_n")?, fault.sigma_n())?;
        if let Some(z_minus) = fault.impedance_minus() {
            Self::write_vector(&mut self.truncate_file("z_minus")?, z_minus)?;
        }
        Ok(())
    }

    /// Append one recorded step from the fault's committed fields
    pub fn append_step(&mut self, time: f64, fault: &crate::fault::Fault) -> Result<(), String> {
        self.append_file("time")?
            .write_all(&time.to_le_bytes())
            .map_err(|e| format!("archive write failed: {}", e))?;

        Self::write_vector(&mut self.append_file("slip")?, fault.slip())?;
        Self::write_vector(&mut self.append_file("slip_vel")?, fault.slip_velocity())?;
        Self::write_vector(&mut self.append_file("tau_qs")?, fault.tau_qs())?;
        Self::write_vector(&mut self.append_file("psi")?, fault.state())?;

        if let Some(u_minus) = fault.slip_minus() {
            Self::write_vector(&mut self.append_file("slip_minus")?, u_minus)?;
        }
        if let Some(v_minus) = fault.slip_velocity_minus() {
            Self::write_vector(&mut self.append_file("slip_vel_minus")?, v_minus)?;
        }
        if let Some(tau_minus) = fault.tau_qs_minus() {
            Self::write_vector(&mut self.append_file("tau_qs_minus")?, tau_minus)?;
        }

        self.steps_written += 1;
        Ok(())
    }

    /// Replay an integration report through the model and archive every
    /// recorded step
    ///
    /// Each recorded state is pushed back through the rate function so
    /// the fault's traction and velocity fields are consistent with it,
    /// then committed and appended. This costs one rate evaluation per
    /// recorded step but keeps the archive faithful to the accepted
    /// trajectory.
    pub fn write_report(
        &mut self,
        model: &mut CycleModel,
        report: &IntegrationReport,
    ) -> Result<(), String> {
        use crate::physics::RateModel;

        for (time, state) in report.time_points.iter().zip(report.trajectory.iter()) {
            model.rate(*time, state)?;
            model.fault_mut().commit(state)?;
            self.append_step(*time, model.fault())?;
        }
        Ok(())
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{Fault, FaultConfig};
    use crate::models::SpringSlider;
    use crate::solver::{Integrator, NullMonitor, Rk32Solver, SolverConfiguration};
    use std::fs;

    fn read_f64_file(path: &Path) -> Vec<f64> {
        let bytes = fs::read(path).unwrap();
        bytes
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
            .collect()
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("quake_rs_archive_{}_{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_context_fields_written_once() {
        let dir = temp_dir("context");
        let fault = Fault::new(&FaultConfig::symmetric(4, 24.0)).unwrap();

        let mut archive = FieldArchive::create(&dir).unwrap();
        archive.write_context(&fault).unwrap();

        let a = read_f64_file(&dir.join("a"));
        assert_eq!(a.len(), 4);
        assert!((a[0] - 0.015).abs() < 1e-12);

        let z = read_f64_file(&dir.join("z"));
        assert!((z[2] - 12.0).abs() < 1e-12);

        // symmetric faults carry no minus-side impedance
        assert!(!dir.join("z_minus").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_steps_append_in_write_order() {
        let dir = temp_dir("steps");
        let mut fault = Fault::new(&FaultConfig::symmetric(3, 24.0)).unwrap();
        fault.compute_vel().unwrap();

        let mut archive = FieldArchive::create(&dir).unwrap();
        archive.append_step(0.0, &fault).unwrap();
        archive.append_step(10.0, &fault).unwrap();
        assert_eq!(archive.steps_written(), 2);

        let time = read_f64_file(&dir.join("time"));
        assert_eq!(time, vec![0.0, 10.0]);

        let slip = read_f64_file(&dir.join("slip"));
        assert_eq!(slip.len(), 2 * 3); // one flat array per step

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_write_report_replays_trajectory() {
        let dir = temp_dir("report");
        let fault = Fault::new(&FaultConfig::symmetric(2, 24.0)).unwrap();
        let loading = SpringSlider::steady_loading(&fault);
        let mut model = crate::models::CycleModel::new(fault, Box::new(loading));

        let config = SolverConfiguration::adaptive(1e4, 20, 1e-7)
            .with_step_bounds(1e-6, 1e3)
            .with_initial_step(1.0);
        let report = Rk32Solver::new()
            .integrate(&mut model, &config, &mut NullMonitor)
            .unwrap();

        let mut archive = FieldArchive::create(&dir).unwrap();
        archive.write_context(model.fault()).unwrap();
        archive.write_report(&mut model, &report).unwrap();

        assert_eq!(archive.steps_written(), report.len());
        let time = read_f64_file(&dir.join("time"));
        assert_eq!(time.len(), report.len());
        assert_eq!(time[0], 0.0);

        let psi = read_f64_file(&dir.join("psi"));
        assert_eq!(psi.len(), report.len() * 2);
        // the first recorded state is the initial condition psi = f0
        assert!((psi[0] - 0.6).abs() < 1e-12);

        let _ = fs::remove_dir_all(&dir);
    }
}
