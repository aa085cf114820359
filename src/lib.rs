//! quake-rs: Earthquake Cycle Simulation Framework
//!
//! A framework for simulating quasi-dynamic earthquake rupture on a planar
//! fault governed by rate-and-state friction, embedded in an antiplane
//! elastic medium. Built with Rust for performance and safety.
//!
//! # Architecture
//!
//! quake-rs is built on two core principles:
//!
//! 1. **Separation of Physics and Numerics**
//!    - Physical models define equations (what to solve)
//!    - Numerical integrators provide methods (how to solve)
//!
//! 2. **Extensibility and Type Safety**
//!    - Trait-based design at the seams: the rate interface
//!      ([`physics::RateModel`]) and the body-stress boundary
//!      ([`coupling::StressOperator`])
//!    - Type-safe state management through named field buffers
//!
//! The heart of the crate is the [`fault::Fault`]: it owns the per-node
//! friction fields and, at every rate evaluation, solves the nonlinear
//! rate-and-state relation for slip velocity at each node with a bracketed
//! bisection search. The [`solver`] module drives the coupled system with
//! an embedded, error-controlled Runge-Kutta integrator (explicit or IMEX)
//! with adaptive step-size control.
//!
//! # Quick Start
//!
//! ```rust
//! use quake_rs::prelude::*;
//!
//! # fn main() -> Result<(), String> {
//! // 1. Configure the fault (30 nodes along dip, 24 km deep)
//! let config = FaultConfig::symmetric(30, 24.0);
//! let fault = Fault::new(&config)?;
//!
//! // 2. Couple it to a loading model (here: traction held at the
//! //    steady-state value, the locked spring-slider configuration)
//! let loading = SpringSlider::steady_loading(&fault);
//! let mut model = CycleModel::new(fault, Box::new(loading));
//!
//! // 3. Configure and run the adaptive integrator
//! let config = SolverConfiguration::adaptive(3.0e7, 200, 1e-7);
//! let mut solver = Rk32Solver::new();
//! let report = solver.integrate(&mut model, &config, &mut NullMonitor)?;
//!
//! // 4. Access results
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`physics`]: state containers and the rate-model traits
//! - [`friction`]: scalar rate-and-state laws, depth profiles, root finder
//! - [`fault`]: the fault interface (field arrays, velocity solve, rates)
//! - [`coupling`]: boundary to the external body-stress solver
//! - [`models`]: concrete loading models and the coupled cycle system
//! - [`solver`]: adaptive explicit / IMEX time integration
//! - [`output`]: result export and visualization

pub mod physics;

pub mod friction;
pub mod fault;
pub mod coupling;
pub mod models;
pub mod solver;
pub mod output;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use quake_rs::prelude::*;
    //! ```
    pub use crate::physics::{FieldKind,
                             FieldSet,
                             RateModel,
                             ImplicitRateModel};
    pub use crate::friction::{DepthProfile, FrictionContext};
    pub use crate::fault::{Fault, FaultConfig, FaultVariant, StateLaw};
    pub use crate::coupling::{ShearLoad, StressOperator};
    pub use crate::models::{CycleModel, SpringSlider};
    pub use crate::solver::{Integrator,
                            SolverConfiguration,
                            IntegrationReport,
                            Termination,
                            StepMonitor,
                            MonitorSignal,
                            NullMonitor,
                            Rk32Solver,
                            ImexRk32Solver};
}
