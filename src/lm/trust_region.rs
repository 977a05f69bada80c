//! Trust region implementation for the Levenberg-Marquardt algorithm.
//!
//! The step is bounded by `‖D·δ‖ ≤ Δ`, where `D` holds the running maximum of
//! the Jacobian column norms. The radius `Δ` grows or shrinks with the
//! agreement between predicted and actual reduction in cost, and the damping
//! parameter that realizes the bound is carried between steps as a warm start.

/// Fraction of the predicted reduction a step must achieve to be accepted.
const MIN_RATIO: f64 = 1e-4;

/// At or below this ratio the region shrinks.
const POOR_RATIO: f64 = 0.25;

/// At or above this ratio the region grows.
const GOOD_RATIO: f64 = 0.75;

/// Reductions of the scaled cost `‖r‖²` for one trial step, relative to the
/// cost at the current point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reduction {
    /// `1 - (‖r_new‖ / ‖r‖)²`, or `-1` when the trial norm grew tenfold
    pub actual: f64,

    /// Reduction predicted by the linearized model, including the damping term
    pub predicted: f64,

    /// Directional derivative of the cost along the step
    pub directional: f64,
}

impl Reduction {
    /// Computes the reductions for a step.
    ///
    /// # Arguments
    ///
    /// * `norm` - `‖r‖` at the current point
    /// * `trial_norm` - `‖r‖` at the trial point, `+inf` when not finite
    /// * `linear_norm` - `‖J·δ‖`
    /// * `par` - The damping parameter the step was solved with
    /// * `scaled_step_norm` - `‖D·δ‖`
    pub fn new(norm: f64, trial_norm: f64, linear_norm: f64, par: f64, scaled_step_norm: f64) -> Self {
        let actual = if 0.1 * trial_norm < norm {
            1.0 - (trial_norm / norm).powi(2)
        } else {
            -1.0
        };

        let t1 = (linear_norm / norm).powi(2);
        let t2 = (par.sqrt() * scaled_step_norm / norm).powi(2);

        Self {
            actual,
            predicted: t1 + 2.0 * t2,
            directional: -(t1 + t2),
        }
    }

    /// Ratio of actual to predicted reduction.
    pub fn ratio(&self) -> f64 {
        if self.predicted != 0.0 {
            self.actual / self.predicted
        } else {
            0.0
        }
    }
}

/// Trust region implementation for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone)]
pub struct TrustRegion {
    /// Current radius `Δ` of the scaled trust region
    pub delta: f64,

    /// Damping parameter of the last step, reused as the next starting value
    pub par: f64,
}

impl TrustRegion {
    /// Creates a region of radius `step_bound * scaled_norm`, or `step_bound`
    /// when the scaled parameter norm is zero.
    pub fn new(step_bound: f64, scaled_norm: f64) -> Self {
        let delta = step_bound * scaled_norm;
        Self {
            delta: if delta == 0.0 { step_bound } else { delta },
            par: 0.0,
        }
    }

    /// Caps the radius at the length of the first step taken.
    pub fn limit_to(&mut self, scaled_step_norm: f64) {
        self.delta = self.delta.min(scaled_step_norm);
    }

    /// Updates the radius and damping after a trial step.
    ///
    /// Returns `true` when the step should be accepted.
    pub fn update(&mut self, reduction: &Reduction, scaled_step_norm: f64, diverged: bool) -> bool {
        let ratio = reduction.ratio();

        if ratio <= POOR_RATIO {
            let mut shrink = if reduction.actual >= 0.0 {
                0.5
            } else {
                0.5 * reduction.directional / (reduction.directional + 0.5 * reduction.actual)
            };
            // Also taken for NaN factors
            if diverged || !(shrink >= 0.1) {
                shrink = 0.1;
            }
            self.delta = shrink * self.delta.min(scaled_step_norm / 0.1);
            self.par /= shrink;
        } else if self.par == 0.0 || ratio >= GOOD_RATIO {
            self.delta = 2.0 * scaled_step_norm;
            self.par *= 0.5;
        }

        ratio >= MIN_RATIO
    }
}
