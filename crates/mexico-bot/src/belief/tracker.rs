use rand::Rng;
use rand_distr::{Beta, Distribution};

/// Beta-Bernoulli estimate of one unknown probability.
///
/// `alpha` counts successes and `beta` failures, both seeded with prior
/// pseudo-counts. Counts only grow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityTracker {
    alpha: f64,
    beta: f64,
}

impl ProbabilityTracker {
    pub const UNIFORM: ProbabilityTracker = ProbabilityTracker::new(1.0, 1.0);

    /// Priors must be positive; use [`ProbabilityTracker::from_counts`] for untrusted input.
    pub const fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// Restores a tracker, rejecting counts that are not positive and finite.
    pub fn from_counts(alpha: f64, beta: f64) -> Option<Self> {
        let valid = |value: f64| value.is_finite() && value > 0.0;
        (valid(alpha) && valid(beta)).then_some(Self { alpha, beta })
    }

    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    pub const fn beta(&self) -> f64 {
        self.beta
    }

    pub const fn counts(&self) -> (f64, f64) {
        (self.alpha, self.beta)
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// One posterior draw for Thompson sampling.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let draw = match Beta::new(self.alpha, self.beta) {
            Ok(dist) => dist.sample(rng),
            Err(_) => self.mean(),
        };
        if draw.is_finite() {
            draw.clamp(0.0, 1.0)
        } else {
            self.mean()
        }
    }

    pub fn update(&mut self, success: bool) {
        if success {
            self.alpha += 1.0;
        } else {
            self.beta += 1.0;
        }
    }
}

impl Default for ProbabilityTracker {
    fn default() -> Self {
        Self::UNIFORM
    }
}
