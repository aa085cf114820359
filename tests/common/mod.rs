//! Shared test infrastructure
//!
//! Mock rate models with known analytical solutions and numerical
//! helpers used across the integration tests.

pub mod mock_models;
pub mod test_helpers;

#[allow(unused_imports)]
pub use mock_models::{ConstantGrowth, ExponentialDecay};
