//! The fault interface
//!
//! A [`Fault`] owns the per-node field arrays of the rate-and-state
//! problem and orchestrates the per-node root finder to turn quasi-static
//! traction into a slip-velocity field. It exposes the rate function
//! consumed by the time integrator ([`Fault::d_dt`]) and the boundary
//! entry points fed by the external body-stress solver
//! ([`Fault::set_tau_qs`], [`Fault::set_fault_disp`]).
//!
//! # Variants
//!
//! Two fault geometries share one implementation, selected by
//! [`FaultVariant`] (a tagged variant rather than virtual dispatch, so
//! the per-node hot loop stays monomorphic):
//!
//! - **Symmetric**: only the `y > 0` half-space is modeled; slip is twice
//!   the one-sided displacement and the radiation term is `0.5*z*V`.
//! - **FullDuplex**: both sides carry their own impedance, traction and
//!   displacement; the root finder solves for the *relative* slip
//!   velocity and the per-side velocities are backed out afterwards.
//!
//! # Rate evaluation protocol
//!
//! Each call to [`Fault::d_dt`] performs, strictly in order:
//!
//! 1. stage the incoming state's psi component into the work copy
//!    `temp_psi`;
//! 2. recompute the velocity field via [`Fault::compute_vel`] (one
//!    bracketed bisection per owned node);
//! 3. evaluate the state-evolution law per node and emit the rates.
//!
//! The function has no persistent state beyond the owned arrays: its
//! result depends only on the supplied state and the currently staged
//! traction, so the integrator may call it repeatedly at trial stages.
//! Accepted states are copied back explicitly through [`Fault::commit`].

use crate::friction::law::{self, FrictionContext};
use crate::friction::profile::DepthProfile;
use crate::friction::root::{Bisection, DEGENERATE_BRACKET};
use crate::physics::{FieldKind, FieldSet};
use nalgebra::DVector;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// =================================================================================================
// Parallel Execution Threshold
// =================================================================================================
//
// Deciding *when* to hand the per-node velocity solves off to Rayon is a
// numerical-execution concern, not a physics concern, so it lives here
// next to the loop it controls. The node solves are independent (no
// inter-node data dependency), so any partition is valid as long as all
// results are visible before compute_vel returns.
//
// The threshold is stored in an AtomicUsize so that it can be changed at
// runtime (useful in benchmarks and tests) without requiring a mutex on
// every compute_vel call. Relaxed ordering is sufficient: the value is a
// performance hint, not a synchronisation point.
// =================================================================================================

/// Default number of owned nodes above which [`Fault::compute_vel`]
/// switches to parallel iteration.
///
/// Below this point the overhead of Rayon's thread-pool dispatch
/// outweighs the per-node bisection work.
const DEFAULT_PARALLEL_THRESHOLD: usize = 999;

/// Runtime-configurable parallel-execution threshold.
static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// Return the current parallel-execution threshold.
///
/// [`Fault::compute_vel`] uses sequential iteration when the owned range
/// contains fewer nodes than this value, and switches to Rayon when it
/// contains more — but only when the crate is compiled with the
/// `parallel` feature.
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Set the parallel-execution threshold to a new value.
///
/// # Panics
///
/// Panics when `threshold == 0`: a zero-node threshold would force
/// parallel dispatch on every single-node solve, which is never the
/// intended behaviour.
pub fn set_parallel_threshold(threshold: usize) {
    assert!(threshold > 0, "parallel threshold must be at least 1");
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
}

/// RAII guard that saves the current threshold on construction and
/// restores it on drop.
///
/// Only compiled in test builds. Prevents one test from leaking a
/// modified threshold value into the next.
#[cfg(test)]
pub(crate) struct ThresholdGuard {
    previous: usize,
}

#[cfg(test)]
impl ThresholdGuard {
    /// Set the threshold to `new_value` and return a guard that will
    /// restore the previous value on drop.
    pub(crate) fn save(new_value: usize) -> Self {
        let previous = parallel_threshold();
        set_parallel_threshold(new_value);
        Self { previous }
    }
}

#[cfg(test)]
impl Drop for ThresholdGuard {
    fn drop(&mut self) {
        PARALLEL_THRESHOLD.store(self.previous, Ordering::Relaxed);
    }
}

// =================================================================================================
// Configuration
// =================================================================================================

/// Fault geometry variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultVariant {
    /// Only the plus half-space is modeled; slip = 2x one-sided
    /// displacement
    Symmetric,
    /// Both sides carry independent impedance, traction and displacement
    FullDuplex,
}

/// State evolution law
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateLaw {
    /// Aging law: contacts heal while the fault is locked
    Aging,
    /// Slip law: state evolves only while the fault slips
    Slip,
}

/// Configuration surface of a fault
///
/// Plain data, typically filled by input-file parsing code outside this
/// crate. Units follow the usual quasi-dynamic convention: depths and
/// lengths in km, stresses in MPa, velocities in m/s, shear modulus in
/// GPa and shear wave speed in km/s, so impedance `mu/cs` lands in
/// MPa·s/m.
#[derive(Debug, Clone)]
pub struct FaultConfig {
    /// Number of nodes along dip
    pub nodes: usize,
    /// Down-dip fault length (km); grid spacing is `length/(nodes-1)`
    pub length: f64,
    /// Depth of the seismogenic zone (km), controls the default b ramp
    pub seismogenic_depth: f64,

    /// Reference friction coefficient
    pub f0: f64,
    /// Reference slip rate (m/s)
    pub v0: f64,
    /// Plate loading rate (m/s)
    pub v_plate: f64,

    /// Direct-effect parameter a over depth (must be non-negative)
    pub a: DepthProfile,
    /// Evolution-effect parameter b over depth
    pub b: DepthProfile,
    /// Characteristic slip distance Dc over depth (m)
    pub dc: DepthProfile,
    /// Effective normal stress over depth (MPa)
    pub sigma_n: DepthProfile,
    /// Shear modulus over depth, plus side (GPa)
    pub shear_modulus: DepthProfile,
    /// Shear wave speed over depth, plus side (km/s)
    pub shear_wave_speed: DepthProfile,
    /// Shear modulus over depth, minus side (full-duplex only)
    pub shear_modulus_minus: Option<DepthProfile>,
    /// Shear wave speed over depth, minus side (full-duplex only)
    pub shear_wave_speed_minus: Option<DepthProfile>,

    /// State evolution law
    pub state_law: StateLaw,
    /// Absolute tolerance of the per-node velocity solve (m/s)
    pub root_tol: f64,
    /// Iteration budget of the per-node velocity solve
    pub root_max_iter: usize,
    /// Geometry variant
    pub variant: FaultVariant,
}

impl FaultConfig {
    /// Symmetric fault with conventional parameter values: constant
    /// `a = 0.015`, seismogenic `b = 0.02` ramping to zero below
    /// 1.5x the seismogenic depth, `sigma_n = 50 MPa`, `mu = 36 GPa`,
    /// `cs = 3 km/s`.
    pub fn symmetric(nodes: usize, length: f64) -> Self {
        let seis = 0.5 * length;
        Self {
            nodes,
            length,
            seismogenic_depth: seis,
            f0: 0.6,
            v0: 1e-6,
            v_plate: 1e-9,
            a: DepthProfile::constant(0.015),
            b: DepthProfile::ramp(seis, 0.02, 1.5 * seis, 0.0),
            dc: DepthProfile::constant(8e-3),
            sigma_n: DepthProfile::constant(50.0),
            shear_modulus: DepthProfile::constant(36.0),
            shear_wave_speed: DepthProfile::constant(3.0),
            shear_modulus_minus: None,
            shear_wave_speed_minus: None,
            state_law: StateLaw::Aging,
            root_tol: 1e-12,
            root_max_iter: 100_000,
            variant: FaultVariant::Symmetric,
        }
    }

    /// Full-duplex fault; the minus side starts with the same material
    /// profiles as the plus side.
    pub fn full_duplex(nodes: usize, length: f64) -> Self {
        let mut config = Self::symmetric(nodes, length);
        config.variant = FaultVariant::FullDuplex;
        config.shear_modulus_minus = Some(config.shear_modulus.clone());
        config.shear_wave_speed_minus = Some(config.shear_wave_speed.clone());
        config
    }

    /// Validate that the configuration is physically meaningful
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes == 0 {
            return Err("fault needs at least one node".to_string());
        }
        if !(self.length > 0.0) {
            return Err(format!("fault length must be positive, got {}", self.length));
        }
        if !self.f0.is_finite() {
            return Err(format!("f0 must be finite, got {}", self.f0));
        }
        if !(self.v0 > 0.0) || !self.v0.is_finite() {
            return Err(format!("v0 must be positive and finite, got {}", self.v0));
        }
        if self.v_plate < 0.0 || !self.v_plate.is_finite() {
            return Err(format!(
                "v_plate must be non-negative and finite, got {}",
                self.v_plate
            ));
        }
        if !(self.root_tol > 0.0) {
            return Err(format!("root tolerance must be positive, got {}", self.root_tol));
        }
        if self.root_max_iter == 0 {
            return Err("root-finder iteration budget must be positive".to_string());
        }
        if self.variant == FaultVariant::FullDuplex
            && (self.shear_modulus_minus.is_none() || self.shear_wave_speed_minus.is_none())
        {
            return Err(
                "full-duplex fault requires minus-side shear modulus and wave speed profiles"
                    .to_string(),
            );
        }
        Ok(())
    }
}

// =================================================================================================
// Diagnostics
// =================================================================================================

/// Running root-finder diagnostics, accumulated across rate evaluations
///
/// Non-convergence of a node solve is accepted as best effort; these
/// counters let a user judge accuracy after the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RootDiagnostics {
    /// Total bisection iterations across all nodes and evaluations
    pub total_iterations: u64,
    /// Number of node solves that exhausted the iteration budget
    pub best_effort_nodes: u64,
}

// =================================================================================================
// Fault
// =================================================================================================

/// Minus-side fields, present only for full-duplex faults
#[derive(Debug, Clone)]
struct DuplexFields {
    z_minus: DVector<f64>,
    tau_qs_minus: DVector<f64>,
    u_minus: DVector<f64>,
    vel_minus: DVector<f64>,
    /// Relative slip velocity `velPlus - velMinus`
    vel_rel: DVector<f64>,
}

/// A rate-and-state fault with per-node field arrays
///
/// Parameter arrays (`a`, `b`, `dc`, `sigma_n`, impedance) are set once
/// at construction and never mutated afterwards. `tau_qs`, `temp_psi`
/// and the velocity fields are overwritten once per rate evaluation; the
/// `psi`/`slip` mirrors hold the last committed (accepted) state for
/// export.
#[derive(Debug, Clone)]
pub struct Fault {
    n: usize,
    h: f64,
    owned: Range<usize>,
    context: FrictionContext,
    state_law: StateLaw,
    root_tol: f64,
    root_max_iter: usize,

    // parameter fields, set once
    a: DVector<f64>,
    b: DVector<f64>,
    dc: DVector<f64>,
    sigma_n: DVector<f64>,
    z_plus: DVector<f64>,

    // work fields, overwritten per rate evaluation
    tau_qs_plus: DVector<f64>,
    temp_psi: DVector<f64>,
    vel_plus: DVector<f64>,

    // committed state mirrors
    psi: DVector<f64>,
    u_plus: DVector<f64>,

    duplex: Option<DuplexFields>,
    diagnostics: RootDiagnostics,
}

impl Fault {
    /// Build a fault from a configuration
    ///
    /// Samples every depth profile onto the node grid, checks the
    /// per-node invariants (`a >= 0`, `z > 0`, `Dc > 0`) and initializes
    /// the traction fields to the steady-state value `tau_inf`.
    pub fn new(config: &FaultConfig) -> Result<Self, String> {
        config.validate()?;

        let n = config.nodes;
        let h = if n > 1 { config.length / (n as f64 - 1.0) } else { 0.0 };
        let context = FrictionContext::new(config.f0, config.v0, config.v_plate);

        let a = config.a.sample_nodes(n, h);
        let b = config.b.sample_nodes(n, h);
        let dc = config.dc.sample_nodes(n, h);
        let sigma_n = config.sigma_n.sample_nodes(n, h);
        let z_plus = Self::impedance_profile(&config.shear_modulus, &config.shear_wave_speed, n, h)?;

        for i in 0..n {
            if a[i] < 0.0 {
                return Err(format!("a must be non-negative, got {} at node {}", a[i], i));
            }
            if !(dc[i] > 0.0) {
                return Err(format!("Dc must be positive, got {} at node {}", dc[i], i));
            }
            if sigma_n[i] < 0.0 || !sigma_n[i].is_finite() {
                return Err(format!(
                    "normal stress must be non-negative and finite, got {} at node {}",
                    sigma_n[i], i
                ));
            }
        }

        let tau_qs_plus =
            DVector::from_fn(n, |i, _| context.steady_state_traction(a[i], sigma_n[i]));
        let psi = DVector::from_element(n, config.f0);

        let duplex = match config.variant {
            FaultVariant::Symmetric => None,
            FaultVariant::FullDuplex => {
                // presence checked by validate()
                let mu_minus = config
                    .shear_modulus_minus
                    .as_ref()
                    .ok_or("full-duplex fault missing minus-side shear modulus")?;
                let cs_minus = config
                    .shear_wave_speed_minus
                    .as_ref()
                    .ok_or("full-duplex fault missing minus-side shear wave speed")?;
                let z_minus = Self::impedance_profile(mu_minus, cs_minus, n, h)?;
                Some(DuplexFields {
                    z_minus,
                    // both sides start at the steady-sliding traction, in
                    // the internal (pre-negated) sign convention
                    tau_qs_minus: tau_qs_plus.clone(),
                    u_minus: DVector::zeros(n),
                    vel_minus: DVector::zeros(n),
                    vel_rel: DVector::zeros(n),
                })
            }
        };

        Ok(Self {
            n,
            h,
            owned: 0..n,
            context,
            state_law: config.state_law,
            root_tol: config.root_tol,
            root_max_iter: config.root_max_iter,
            a,
            b,
            dc,
            sigma_n,
            z_plus,
            tau_qs_plus,
            temp_psi: psi.clone(),
            vel_plus: DVector::zeros(n),
            psi,
            u_plus: DVector::zeros(n),
            duplex,
            diagnostics: RootDiagnostics::default(),
        })
    }

    fn impedance_profile(
        mu: &DepthProfile,
        cs: &DepthProfile,
        n: usize,
        h: f64,
    ) -> Result<DVector<f64>, String> {
        let mut z = DVector::zeros(n);
        for i in 0..n {
            let depth = i as f64 * h;
            let cs_i = cs.sample(depth);
            if !(cs_i > 0.0) {
                return Err(format!(
                    "shear wave speed must be positive, got {} at node {}",
                    cs_i, i
                ));
            }
            z[i] = mu.sample(depth) / cs_i;
            if !(z[i] > 0.0) || !z[i].is_finite() {
                return Err(format!("impedance must be positive, got {} at node {}", z[i], i));
            }
        }
        Ok(z)
    }

    // ======================================= Accessors =======================================

    /// Number of fault nodes
    pub fn nodes(&self) -> usize {
        self.n
    }

    /// Grid spacing along dip (km); zero for a single-node fault
    pub fn grid_spacing(&self) -> f64 {
        self.h
    }

    /// Geometry variant
    pub fn variant(&self) -> FaultVariant {
        if self.duplex.is_some() {
            FaultVariant::FullDuplex
        } else {
            FaultVariant::Symmetric
        }
    }

    /// Shared friction constants
    pub fn context(&self) -> &FrictionContext {
        &self.context
    }

    /// State evolution law in use
    pub fn state_law(&self) -> StateLaw {
        self.state_law
    }

    /// Direct-effect parameter per node
    pub fn a(&self) -> &DVector<f64> {
        &self.a
    }

    /// Evolution-effect parameter per node
    pub fn b(&self) -> &DVector<f64> {
        &self.b
    }

    /// Characteristic slip distance per node
    pub fn dc(&self) -> &DVector<f64> {
        &self.dc
    }

    /// Effective normal stress per node
    pub fn sigma_n(&self) -> &DVector<f64> {
        &self.sigma_n
    }

    /// Plus-side impedance per node
    pub fn impedance(&self) -> &DVector<f64> {
        &self.z_plus
    }

    /// Minus-side impedance per node (full-duplex only)
    pub fn impedance_minus(&self) -> Option<&DVector<f64>> {
        self.duplex.as_ref().map(|d| &d.z_minus)
    }

    /// Quasi-static traction, plus side
    pub fn tau_qs(&self) -> &DVector<f64> {
        &self.tau_qs_plus
    }

    /// Quasi-static traction, minus side, in the internal sign
    /// convention (full-duplex only)
    pub fn tau_qs_minus(&self) -> Option<&DVector<f64>> {
        self.duplex.as_ref().map(|d| &d.tau_qs_minus)
    }

    /// Last computed slip velocity (symmetric) or plus-side velocity
    /// (full-duplex)
    pub fn slip_velocity(&self) -> &DVector<f64> {
        &self.vel_plus
    }

    /// Last computed minus-side velocity (full-duplex only)
    pub fn slip_velocity_minus(&self) -> Option<&DVector<f64>> {
        self.duplex.as_ref().map(|d| &d.vel_minus)
    }

    /// Last computed relative slip velocity (full-duplex only; for a
    /// symmetric fault [`Fault::slip_velocity`] already is the relative
    /// velocity)
    pub fn relative_velocity(&self) -> Option<&DVector<f64>> {
        self.duplex.as_ref().map(|d| &d.vel_rel)
    }

    /// Committed state variable
    pub fn state(&self) -> &DVector<f64> {
        &self.psi
    }

    /// Committed slip (symmetric) / plus-side displacement (full-duplex)
    pub fn slip(&self) -> &DVector<f64> {
        &self.u_plus
    }

    /// Committed minus-side displacement (full-duplex only)
    pub fn slip_minus(&self) -> Option<&DVector<f64>> {
        self.duplex.as_ref().map(|d| &d.u_minus)
    }

    /// Accumulated root-finder diagnostics
    pub fn root_diagnostics(&self) -> RootDiagnostics {
        self.diagnostics
    }

    /// Reset the root-finder diagnostics counters
    pub fn reset_root_diagnostics(&mut self) {
        self.diagnostics = RootDiagnostics::default();
    }

    // ==================================== Ownership range ====================================

    /// Locally owned, contiguous slice of the global node index space
    pub fn owned_range(&self) -> Range<usize> {
        self.owned.clone()
    }

    /// Restrict this fault to a contiguous ownership range
    ///
    /// Under domain decomposition every process owns a disjoint range;
    /// the ranges must partition `[0, n)` exactly once across processes.
    pub fn set_owned_range(&mut self, range: Range<usize>) -> Result<(), String> {
        if range.start >= range.end || range.end > self.n {
            return Err(format!(
                "ownership range {}..{} is not a non-empty subrange of 0..{}",
                range.start, range.end, self.n
            ));
        }
        self.owned = range;
        Ok(())
    }

    fn assert_owned(&self, i: usize) {
        assert!(
            self.owned.contains(&i),
            "node {} is outside the locally owned range {}..{}",
            i,
            self.owned.start,
            self.owned.end
        );
    }

    // ==================================== Scalar evaluations ====================================

    /// Shear-stress imbalance at node `i` for a trial velocity
    ///
    /// Reads the staged state copy `temp_psi`, never the committed
    /// mirror. Fatal (`Err`) if the result is not finite — that
    /// indicates an out-of-bounds parameter or a numerically
    /// unrepresentable velocity.
    pub fn residual(&self, i: usize, vel: f64) -> Result<f64, String> {
        self.assert_owned(i);

        let psi = self.temp_psi[i];
        let a = self.a[i];
        let sigma_n = self.sigma_n[i];
        let z_plus = self.z_plus[i];
        let tau_plus = self.tau_qs_plus[i];
        let strength = self.context.strength(a, sigma_n, psi, vel);

        let out = match &self.duplex {
            None => law::one_sided_residual(strength, z_plus, vel, tau_plus),
            Some(d) => law::two_sided_residual(
                strength,
                z_plus,
                d.z_minus[i],
                vel,
                tau_plus,
                d.tau_qs_minus[i],
            ),
        };

        if !out.is_finite() {
            return Err(format!(
                "friction residual is not finite at node {}: value={}, psi={}, a={}, \
                 sigma_n={}, z={}, tau_qs={}, vel={}",
                i, out, psi, a, sigma_n, z_plus, tau_plus, vel
            ));
        }
        Ok(out)
    }

    /// State-evolution rate at node `i` for a given state value
    ///
    /// Reads this node's just-computed slip velocity, so it must only be
    /// called after [`Fault::compute_vel`].
    pub fn state_rate(&self, i: usize, psi: f64) -> Result<f64, String> {
        self.assert_owned(i);

        let vel = match &self.duplex {
            None => self.vel_plus[i],
            Some(d) => d.vel_rel[i],
        };
        let b = self.b[i];
        let dc = self.dc[i];
        let a = self.a[i];

        let rate = match self.state_law {
            StateLaw::Aging => self.context.aging_rate(b, dc, psi, vel),
            StateLaw::Slip => self.context.slip_rate(a, b, dc, psi, vel),
        };

        if !rate.is_finite() {
            return Err(format!(
                "state rate is not finite at node {}: value={}, psi={}, b={}, Dc={}, \
                 f0={}, v0={}, vel={}",
                i, rate, psi, b, dc, self.context.f0, self.context.v0, vel
            ));
        }
        Ok(rate)
    }

    /// Steady-state reference traction per node
    ///
    /// Used to initialize `tau_qs` and to pre-shift remote boundary
    /// displacement to the value consistent with steady sliding.
    pub fn steady_state_traction(&self) -> DVector<f64> {
        DVector::from_fn(self.n, |i, _| {
            self.context.steady_state_traction(self.a[i], self.sigma_n[i])
        })
    }

    // ==================================== Velocity solve ====================================

    /// Velocity bracket for node `i`
    ///
    /// The lower bound is zero (no negative slip velocity,
    /// right-lateral-fault convention); the upper bound is the velocity
    /// that would obtain with zero frictional resistance. The friction
    /// residual is monotonically increasing in velocity, so the bracket
    /// contains the root.
    fn velocity_bracket(&self, i: usize) -> (f64, f64) {
        match &self.duplex {
            None => (0.0, 2.0 * (self.tau_qs_plus[i] / self.z_plus[i]).abs()),
            Some(d) => (
                0.0,
                (d.z_minus[i] * self.tau_qs_plus[i] + self.z_plus[i] * d.tau_qs_minus[i])
                    / (self.z_plus[i] * d.z_minus[i]),
            ),
        }
    }

    /// Solve one node; returns `(velocity, iterations, converged)`
    fn solve_node(&self, i: usize) -> Result<(f64, usize, bool), String> {
        let (left, right) = self.velocity_bracket(i);
        if (left - right).abs() < DEGENERATE_BRACKET {
            // locked, zero-stress-drop node: no bisection needed
            return Ok((left, 0, true));
        }

        // construct fresh each time so the bounds are correct per node
        let mut alg = Bisection::new(self.root_max_iter, self.root_tol);
        alg.bracket(left, right)?;
        let sol = alg.find_root(|vel| self.residual(i, vel))?;
        Ok((sol.root, sol.iterations, sol.converged))
    }

    fn solve_owned_nodes(&self) -> Result<Vec<(usize, f64, usize, bool)>, String> {
        let owned = self.owned.clone();

        #[cfg(feature = "parallel")]
        {
            if owned.len() > parallel_threshold() {
                return owned
                    .into_par_iter()
                    .map(|i| self.solve_node(i).map(|(v, its, conv)| (i, v, its, conv)))
                    .collect::<Result<Vec<_>, String>>();
            }
        }

        owned
            .map(|i| self.solve_node(i).map(|(v, its, conv)| (i, v, its, conv)))
            .collect()
    }

    /// Recompute the velocity field from the currently staged traction
    /// and state
    ///
    /// For the full-duplex variant the root is the relative slip
    /// velocity; the per-side velocities are backed out as
    /// `velPlus = (tauP - tauM + zM*vel)/(zP + zM)` and
    /// `velMinus = velPlus - vel`.
    pub fn compute_vel(&mut self) -> Result<(), String> {
        let solutions = self.solve_owned_nodes()?;

        for &(_, _, iterations, converged) in &solutions {
            self.diagnostics.total_iterations += iterations as u64;
            if !converged {
                self.diagnostics.best_effort_nodes += 1;
            }
        }

        if let Some(d) = self.duplex.as_mut() {
            for &(i, vel, _, _) in &solutions {
                d.vel_rel[i] = vel;
            }
            for i in self.owned.clone() {
                let z_sum = self.z_plus[i] + d.z_minus[i];
                let vel_plus = (self.tau_qs_plus[i] - d.tau_qs_minus[i]
                    + d.z_minus[i] * d.vel_rel[i])
                    / z_sum;
                self.vel_plus[i] = vel_plus;
                d.vel_minus[i] = vel_plus - d.vel_rel[i];
            }
        } else {
            for &(i, vel, _, _) in &solutions {
                self.vel_plus[i] = vel;
            }
        }

        Ok(())
    }

    // ==================================== Rate function ====================================

    /// Evaluate the fault's contribution to `d/dt(state)`
    ///
    /// Stage the supplied psi into the work copy, recompute the velocity
    /// field, then emit the state-evolution and slip rates. See the
    /// module docs for the ordering guarantees.
    pub fn d_dt(&mut self, _time: f64, state: &FieldSet) -> Result<FieldSet, String> {
        let psi_in = state
            .get(FieldKind::State)
            .ok_or_else(|| "integration state is missing the 'state' field".to_string())?;
        if psi_in.len() != self.n {
            return Err(format!(
                "state field length {} does not match fault nodes {}",
                psi_in.len(),
                self.n
            ));
        }

        // 1. stage
        self.temp_psi.copy_from(psi_in);

        // 2. velocity field
        self.compute_vel()?;

        // 3. state rates (read the freshly computed velocity)
        let mut dpsi = DVector::zeros(self.n);
        for i in self.owned.clone() {
            dpsi[i] = self.state_rate(i, psi_in[i])?;
        }

        let mut rates = FieldSet::new(FieldKind::State, dpsi);
        rates.set(FieldKind::Slip, self.vel_plus.clone());
        if let Some(d) = &self.duplex {
            rates.set(FieldKind::SlipMinus, d.vel_minus.clone());
        }
        Ok(rates)
    }

    // ==================================== Boundary entry points ====================================

    /// Copy body shear stress into the local traction fields
    ///
    /// The minus-side input is negated on the way in (sign convention:
    /// the body solver reports stress in its own coordinate frame).
    pub fn set_tau_qs(
        &mut self,
        stress_plus: &DVector<f64>,
        stress_minus: Option<&DVector<f64>>,
    ) -> Result<(), String> {
        if stress_plus.len() < self.n {
            return Err(format!(
                "plus-side stress has {} entries, fault needs {}",
                stress_plus.len(),
                self.n
            ));
        }
        for i in 0..self.n {
            self.tau_qs_plus[i] = stress_plus[i];
        }

        if let Some(d) = self.duplex.as_mut() {
            let minus = stress_minus.ok_or_else(|| {
                "full-duplex fault requires minus-side stress in set_tau_qs".to_string()
            })?;
            if minus.len() < self.n {
                return Err(format!(
                    "minus-side stress has {} entries, fault needs {}",
                    minus.len(),
                    self.n
                ));
            }
            for i in 0..self.n {
                d.tau_qs_minus[i] = -minus[i];
            }
        }
        Ok(())
    }

    /// Record the fault-plane displacement supplied by the body solver
    ///
    /// Symmetric faults double the one-sided displacement (fault slip is
    /// twice the one-sided displacement under the symmetry assumption).
    pub fn set_fault_disp(
        &mut self,
        disp_plus: &DVector<f64>,
        disp_minus: Option<&DVector<f64>>,
    ) -> Result<(), String> {
        if disp_plus.len() < self.n {
            return Err(format!(
                "plus-side displacement has {} entries, fault needs {}",
                disp_plus.len(),
                self.n
            ));
        }

        if let Some(d) = self.duplex.as_mut() {
            for i in 0..self.n {
                self.u_plus[i] = disp_plus[i];
            }
            let minus = disp_minus.ok_or_else(|| {
                "full-duplex fault requires minus-side displacement in set_fault_disp".to_string()
            })?;
            if minus.len() < self.n {
                return Err(format!(
                    "minus-side displacement has {} entries, fault needs {}",
                    minus.len(),
                    self.n
                ));
            }
            for i in 0..self.n {
                d.u_minus[i] = minus[i];
            }
        } else {
            for i in 0..self.n {
                self.u_plus[i] = 2.0 * disp_plus[i];
            }
        }
        Ok(())
    }

    /// Copy an accepted integration state into the committed mirrors
    ///
    /// The integrator owns the integrated state; the fault only sees it
    /// through read-only views. This is the explicit commit step that
    /// replaces long-lived mutable aliasing between the two.
    pub fn commit(&mut self, state: &FieldSet) -> Result<(), String> {
        let psi = state
            .get(FieldKind::State)
            .ok_or_else(|| "commit: state field missing".to_string())?;
        let slip = state
            .get(FieldKind::Slip)
            .ok_or_else(|| "commit: slip field missing".to_string())?;
        if psi.len() != self.n || slip.len() != self.n {
            return Err(format!(
                "commit: field lengths ({}, {}) do not match fault nodes {}",
                psi.len(),
                slip.len(),
                self.n
            ));
        }
        self.psi.copy_from(psi);
        self.u_plus.copy_from(slip);

        if let Some(d) = self.duplex.as_mut() {
            let u_minus = state
                .get(FieldKind::SlipMinus)
                .ok_or_else(|| "commit: slip_minus field missing".to_string())?;
            if u_minus.len() != self.n {
                return Err(format!(
                    "commit: slip_minus length {} does not match fault nodes {}",
                    u_minus.len(),
                    self.n
                ));
            }
            d.u_minus.copy_from(u_minus);
        }
        Ok(())
    }

    /// Initial integration state: `psi = f0`, zero slip
    pub fn initial_state(&self) -> FieldSet {
        let mut state = FieldSet::new(FieldKind::State, self.psi.clone());
        state.set(FieldKind::Slip, self.u_plus.clone());
        if let Some(d) = &self.duplex {
            state.set(FieldKind::SlipMinus, d.u_minus.clone());
        }
        state
    }
}

// =================================================================================================
// Tests
// =================================================================================================
