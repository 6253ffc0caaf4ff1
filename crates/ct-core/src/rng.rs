//! Deterministic simulation RNG.
//!
//! One `SimRng` is seeded from `SimConfig::seed` and owned by the scenario
//! state.  Every stochastic draw (operation durations, handshake delays,
//! vessel inter-arrival gaps) goes through it, in event order, so a fixed seed
//! reproduces a run exactly.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, LogNormal};

use crate::{CtError, CtResult};

/// Simulation-level RNG.
///
/// Used only from the single logical timeline.  Each scenario in a sweep
/// gets its own seed through `SimConfig`.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    // ── Continuous draws ──────────────────────────────────────────────────

    /// Uniform draw in `[lo, hi)`.  A degenerate range returns `lo`.
    #[inline]
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo { self.0.gen_range(lo..hi) } else { lo }
    }

    /// Log-normal draw with location `mu` and shape `sigma` (the underlying
    /// normal's mean and standard deviation).  The median is `e^mu`.
    pub fn lognormal(&mut self, mu: f64, sigma: f64) -> CtResult<f64> {
        let dist = LogNormal::new(mu, sigma)
            .map_err(|e| CtError::Distribution(format!("lognormal(mu={mu}, sigma={sigma}): {e}")))?;
        Ok(dist.sample(&mut self.0))
    }

    /// Exponential draw with the given mean.
    pub fn exponential(&mut self, mean: f64) -> CtResult<f64> {
        if !(mean.is_finite() && mean > 0.0) {
            return Err(CtError::Distribution(format!("exponential mean {mean} must be positive")));
        }
        let dist = Exp::new(1.0 / mean)
            .map_err(|e| CtError::Distribution(format!("exponential(mean={mean}): {e}")))?;
        Ok(dist.sample(&mut self.0))
    }
}
