//! Mock rate models for testing
//!
//! These models have known analytical solutions, making them ideal for
//! validating integrator accuracy and step-size control behaviour.

use nalgebra::DVector;
use quake_rs::physics::{FieldKind, FieldSet, RateModel};

// =================================================================================================
// Exponential Decay: dy/dt = -k*y
// =================================================================================================

/// Exponential decay model: `dy/dt = -k*y`
///
/// Analytical solution: `y(t) = y0 * exp(-k*t)`
pub struct ExponentialDecay {
    pub points: usize,
    pub decay_rate: f64,
}

impl ExponentialDecay {
    pub fn new(points: usize, decay_rate: f64) -> Self {
        Self { points, decay_rate }
    }

    /// Analytical solution at time `t`
    pub fn analytical_solution(&self, t: f64, y0: f64) -> f64 {
        y0 * (-self.decay_rate * t).exp()
    }
}

impl RateModel for ExponentialDecay {
    fn points(&self) -> usize {
        self.points
    }

    fn rate(&mut self, _time: f64, state: &FieldSet) -> Result<FieldSet, String> {
        let y = state
            .get(FieldKind::Slip)
            .ok_or_else(|| "slip field missing".to_string())?;
        Ok(FieldSet::new(FieldKind::Slip, y * (-self.decay_rate)))
    }

    fn initial_state(&self) -> FieldSet {
        FieldSet::new(FieldKind::Slip, DVector::from_element(self.points, 1.0))
    }

    fn name(&self) -> &str {
        "Exponential Decay"
    }
}

// =================================================================================================
// Constant Growth: dy/dt = c
// =================================================================================================

/// Constant growth model: `dy/dt = c`
///
/// Analytical solution: `y(t) = y0 + c*t`. Every Runge-Kutta scheme is
/// exact for it, so the embedded error estimate is identically zero —
/// the step size must grow to the configured maximum.
pub struct ConstantGrowth {
    pub points: usize,
    pub growth_rate: f64,
}

impl ConstantGrowth {
    pub fn new(points: usize, growth_rate: f64) -> Self {
        Self { points, growth_rate }
    }

    /// Analytical solution at time `t`
    pub fn analytical_solution(&self, t: f64, y0: f64) -> f64 {
        y0 + self.growth_rate * t
    }
}

impl RateModel for ConstantGrowth {
    fn points(&self) -> usize {
        self.points
    }

    fn rate(&mut self, _time: f64, _state: &FieldSet) -> Result<FieldSet, String> {
        Ok(FieldSet::new(
            FieldKind::Slip,
            DVector::from_element(self.points, self.growth_rate),
        ))
    }

    fn initial_state(&self) -> FieldSet {
        FieldSet::new(FieldKind::Slip, DVector::zeros(self.points))
    }

    fn name(&self) -> &str {
        "Constant Growth"
    }
}

// =================================================================================================
// Tests for Mock Models
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_decay_analytical() {
        let model = ExponentialDecay::new(5, 0.5);
        assert!((model.analytical_solution(0.0, 1.0) - 1.0).abs() < 1e-10);
        assert!((model.analytical_solution(1.0, 1.0) - 0.6065306597).abs() < 1e-6);
    }

    #[test]
    fn test_constant_growth_analytical() {
        let model = ConstantGrowth::new(5, 2.0);
        assert!((model.analytical_solution(5.0, 0.0) - 10.0).abs() < 1e-10);
    }
}
