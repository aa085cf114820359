//! Depth-dependent parameter profiles
//!
//! Friction parameters vary with depth along the fault: the evolution
//! parameter `b` typically holds a seismogenic value down to some depth
//! and transitions linearly to a velocity-strengthening value below it.
//! A [`DepthProfile`] captures this as piecewise-linear control points
//! `(depth, value)`, sampled once at construction of the fault.

use nalgebra::DVector;

/// Piecewise-linear profile of a parameter over depth
///
/// Outside the control-point range the profile is clamped to the first /
/// last value. An optional cap bounds the sampled value from above
/// (used for normal stress).
///
/// # Example
///
/// ```
/// use quake_rs::friction::DepthProfile;
///
/// // seismogenic b = 0.02 down to 12 km, velocity strengthening below 18 km
/// let b = DepthProfile::ramp(12.0, 0.02, 18.0, 0.0);
/// assert_eq!(b.sample(6.0), 0.02);
/// assert_eq!(b.sample(24.0), 0.0);
/// assert!((b.sample(15.0) - 0.01).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DepthProfile {
    depths: Vec<f64>,
    values: Vec<f64>,
    cap: Option<f64>,
}

impl DepthProfile {
    /// Create a profile from `(depth, value)` control points
    ///
    /// Depths must be strictly increasing and all entries finite.
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self, String> {
        if points.is_empty() {
            return Err("depth profile needs at least one control point".to_string());
        }
        for pair in points.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(format!(
                    "depth profile control points must have strictly increasing depths, \
                     got {} after {}",
                    pair[1].0, pair[0].0
                ));
            }
        }
        for &(depth, value) in &points {
            if !depth.is_finite() || !value.is_finite() {
                return Err(format!(
                    "depth profile control point ({}, {}) is not finite",
                    depth, value
                ));
            }
        }

        let (depths, values) = points.into_iter().unzip();
        Ok(Self { depths, values, cap: None })
    }

    /// Depth-independent profile
    pub fn constant(value: f64) -> Self {
        assert!(value.is_finite(), "profile value must be finite, got {}", value);
        Self {
            depths: vec![0.0],
            values: vec![value],
            cap: None,
        }
    }

    /// Two-point ramp: `value_above` down to `depth_top`, linear
    /// transition to `value_below` at `depth_bottom`, constant below.
    ///
    /// # Panics
    ///
    /// Panics when `depth_bottom <= depth_top`.
    pub fn ramp(depth_top: f64, value_above: f64, depth_bottom: f64, value_below: f64) -> Self {
        assert!(
            depth_bottom > depth_top,
            "ramp requires depth_bottom ({}) > depth_top ({})",
            depth_bottom,
            depth_top
        );
        Self {
            depths: vec![depth_top, depth_bottom],
            values: vec![value_above, value_below],
            cap: None,
        }
    }

    /// Bound sampled values from above
    pub fn with_cap(mut self, cap: f64) -> Self {
        assert!(cap.is_finite(), "profile cap must be finite, got {}", cap);
        self.cap = Some(cap);
        self
    }

    /// Sample the profile at one depth
    pub fn sample(&self, depth: f64) -> f64 {
        let value = if depth <= self.depths[0] {
            self.values[0]
        } else if depth >= *self.depths.last().unwrap() {
            *self.values.last().unwrap()
        } else {
            // find the bracketing control points
            let idx = self
                .depths
                .windows(2)
                .position(|w| depth >= w[0] && depth < w[1])
                .unwrap();
            let frac = (depth - self.depths[idx]) / (self.depths[idx + 1] - self.depths[idx]);
            self.values[idx] + frac * (self.values[idx + 1] - self.values[idx])
        };

        match self.cap {
            Some(cap) => value.min(cap),
            None => value,
        }
    }

    /// Sample the profile at `n` nodes with grid spacing `h`
    ///
    /// Node `i` sits at depth `i * h`.
    pub fn sample_nodes(&self, n: usize, h: f64) -> DVector<f64> {
        DVector::from_fn(n, |i, _| self.sample(i as f64 * h))
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_profile() {
        let p = DepthProfile::constant(0.015);
        assert_eq!(p.sample(0.0), 0.015);
        assert_eq!(p.sample(100.0), 0.015);
    }

    #[test]
    fn test_ramp_matches_endpoints() {
        let p = DepthProfile::ramp(12.0, 0.02, 18.0, 0.0);
        assert_eq!(p.sample(0.0), 0.02);
        assert_eq!(p.sample(12.0), 0.02);
        assert_eq!(p.sample(18.0), 0.0);
        assert_eq!(p.sample(30.0), 0.0);
    }

    #[test]
    fn test_ramp_interpolates_linearly() {
        let p = DepthProfile::ramp(10.0, 1.0, 20.0, 0.0);
        assert!((p.sample(12.5) - 0.75).abs() < 1e-12);
        assert!((p.sample(15.0) - 0.5).abs() < 1e-12);
        assert!((p.sample(17.5) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_multi_point_profile() {
        let p = DepthProfile::new(vec![(0.0, 1.0), (5.0, 2.0), (10.0, 0.0)]).unwrap();
        assert!((p.sample(2.5) - 1.5).abs() < 1e-12);
        assert!((p.sample(7.5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cap() {
        let p = DepthProfile::ramp(0.0, 10.0, 10.0, 100.0).with_cap(50.0);
        assert_eq!(p.sample(0.0), 10.0);
        assert_eq!(p.sample(10.0), 50.0);
    }

    #[test]
    fn test_sample_nodes() {
        let p = DepthProfile::ramp(1.0, 1.0, 3.0, 0.0);
        let v = p.sample_nodes(5, 1.0); // depths 0,1,2,3,4
        assert_eq!(v.len(), 5);
        assert_eq!(v[0], 1.0);
        assert_eq!(v[1], 1.0);
        assert!((v[2] - 0.5).abs() < 1e-12);
        assert_eq!(v[3], 0.0);
        assert_eq!(v[4], 0.0);
    }

    #[test]
    fn test_non_increasing_depths_rejected() {
        let err = DepthProfile::new(vec![(0.0, 1.0), (0.0, 2.0)]).unwrap_err();
        assert!(err.contains("strictly increasing"));
    }

    #[test]
    fn test_non_finite_value_rejected() {
        assert!(DepthProfile::new(vec![(0.0, f64::NAN)]).is_err());
        assert!(DepthProfile::new(vec![]).is_err());
    }
}
