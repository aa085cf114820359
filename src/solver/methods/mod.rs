//! Integrator implementations
//!
//! - [`Rk32Solver`]: embedded explicit Runge-Kutta 3(2) with adaptive
//!   step-size control
//! - [`ImexRk32Solver`]: the same explicit machinery plus a
//!   once-per-step Backward-Euler implicit solve controlled by the model

mod imex;
mod rk32;

pub use imex::ImexRk32Solver;
pub use rk32::Rk32Solver;
