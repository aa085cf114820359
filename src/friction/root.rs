//! Bracketed bisection root finding
//!
//! Solving the rate-and-state relation for slip velocity is a scalar
//! root-find per fault node. The residual is strictly increasing in
//! velocity and the bracket `[0, 2|tau_qs/z|]` is available in closed
//! form, so plain bisection is robust: linear convergence, no derivative
//! needed, and it cannot leave the bracket.
//!
//! A fresh [`Bisection`] instance is constructed per node per rate
//! evaluation — reuse across nodes is unsafe because the bracket differs
//! per node.
//!
//! # Non-convergence policy
//!
//! Exhausting the iteration budget is NOT an error: the midpoint of the
//! final bracket is accepted as a best-effort root and flagged through
//! [`BracketSolution::converged`]. Callers accumulate the iteration count
//! into running diagnostics so a user can judge accuracy after the run.

/// Bracket endpoints closer than this skip the search entirely: the
/// common value is returned with an iteration count of zero. This covers
/// the locked, zero-stress-drop node without risking a spurious failure
/// on a zero-width bracket.
pub const DEGENERATE_BRACKET: f64 = 1e-14;

/// Outcome of one bracketed search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BracketSolution {
    /// Best available root estimate
    pub root: f64,
    /// Iterations actually performed
    pub iterations: usize,
    /// Whether the bracket width reached the tolerance
    pub converged: bool,
}

/// Bisection search over a prescribed bracket
///
/// # Example
///
/// ```
/// use quake_rs::friction::Bisection;
///
/// let mut alg = Bisection::new(100, 1e-12);
/// alg.bracket(0.0, 2.0).unwrap();
/// let sol = alg.find_root(|v| Ok(v * v - 2.0)).unwrap();
/// assert!((sol.root - std::f64::consts::SQRT_2).abs() < 1e-11);
/// assert!(sol.converged);
/// ```
#[derive(Debug, Clone)]
pub struct Bisection {
    max_iter: usize,
    tol: f64,
    bounds: Option<(f64, f64)>,
}

impl Bisection {
    /// Create a search with an iteration budget and an absolute
    /// tolerance on the bracket width
    ///
    /// # Panics
    ///
    /// Panics on a zero iteration budget or a non-positive tolerance.
    pub fn new(max_iter: usize, tol: f64) -> Self {
        assert!(max_iter > 0, "bisection needs a positive iteration budget");
        assert!(
            tol.is_finite() && tol > 0.0,
            "bisection tolerance must be positive and finite, got {}",
            tol
        );
        Self { max_iter, tol, bounds: None }
    }

    /// Set the bracket endpoints
    pub fn bracket(&mut self, left: f64, right: f64) -> Result<(), String> {
        if !left.is_finite() || !right.is_finite() {
            return Err(format!(
                "bisection bracket endpoints must be finite, got [{}, {}]",
                left, right
            ));
        }
        // extreme parameter combinations can hand us a reversed bracket
        self.bounds = if left <= right {
            Some((left, right))
        } else {
            Some((right, left))
        };
        Ok(())
    }

    /// Iteration budget
    pub fn max_iterations(&self) -> usize {
        self.max_iter
    }

    /// Absolute tolerance on the bracket width
    pub fn tolerance(&self) -> f64 {
        self.tol
    }

    /// Find the root of `f` inside the bracket
    ///
    /// `f` itself is fallible (a friction residual evaluation can detect
    /// non-finite values); its error aborts the search immediately.
    pub fn find_root<F>(&mut self, mut f: F) -> Result<BracketSolution, String>
    where
        F: FnMut(f64) -> Result<f64, String>,
    {
        let (mut left, mut right) = self
            .bounds
            .ok_or_else(|| "bisection bracket was not set before find_root".to_string())?;

        if (right - left).abs() < DEGENERATE_BRACKET {
            return Ok(BracketSolution {
                root: left,
                iterations: 0,
                converged: true,
            });
        }

        let mut f_left = f(left)?;
        let mut iterations = 0;

        while iterations < self.max_iter && (right - left) > self.tol {
            let mid = 0.5 * (left + right);
            let f_mid = f(mid)?;
            iterations += 1;

            if f_mid == 0.0 {
                return Ok(BracketSolution {
                    root: mid,
                    iterations,
                    converged: true,
                });
            }

            // keep the sign change inside the bracket
            if f_left * f_mid > 0.0 {
                left = mid;
                f_left = f_mid;
            } else {
                right = mid;
            }
        }

        Ok(BracketSolution {
            root: 0.5 * (left + right),
            iterations,
            converged: (right - left) <= self.tol,
        })
    }
}

// =================================================================================================
// Tests
// =================================================================================================
