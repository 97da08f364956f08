//! Signal Level Estimator
//!
//! Exponentially smoothed power (`|x|²`) of the incoming stream. The
//! smoothing coefficient is supplied by the caller so the estimator and the
//! gain loop share one time constant.

#[cfg(all(not(feature = "std"), feature = "micromath"))]
#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::LEVEL_FLOOR;
use crate::types::Sample;

/// Convert a linear power to dB, flooring at [`LEVEL_FLOOR`] (-120 dB).
///
/// NaN passes through so a poisoned estimate stays visible.
#[must_use]
pub fn power_to_db(power: f32) -> f32 {
    10.0 * floor_power(power).log10()
}

/// Clamp a power estimate up to [`LEVEL_FLOOR`], keeping NaN.
#[inline]
pub(crate) fn floor_power(power: f32) -> f32 {
    if power < LEVEL_FLOOR {
        LEVEL_FLOOR
    } else {
        power
    }
}

/// Instantaneous power of `sample`.
///
/// A finite sample whose square overflows is held at `f32::MAX`, so the
/// smoothing step never computes `inf - inf`. Non-finite samples pass
/// through unchanged.
#[inline]
pub(crate) fn sample_power<S: Sample>(sample: &S) -> f32 {
    let power = sample.magnitude_squared();
    if power > f32::MAX && sample.is_finite() {
        f32::MAX
    } else {
        power
    }
}

/// Single-pole power estimator
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LevelEstimator {
    /// Smoothed power (linear)
    level: f32,
    /// Set once the first sample has been seen
    primed: bool,
}

impl LevelEstimator {
    /// Create an estimator with no history
    #[must_use]
    pub const fn new() -> Self {
        Self {
            level: 0.0,
            primed: false,
        }
    }

    /// Feed one instantaneous power value and return the new estimate.
    ///
    /// The first value after creation or [`reset`](Self::reset) is taken
    /// as-is, avoiding a cold-start bias toward zero.
    #[inline]
    pub fn update(&mut self, power: f32, alpha: f32) -> f32 {
        if self.primed {
            self.level += alpha * (power - self.level);
        } else {
            self.level = power;
            self.primed = true;
        }
        self.level
    }

    /// Seed the estimate directly, e.g. from a block average
    pub fn prime(&mut self, power: f32) {
        self.level = power;
        self.primed = true;
    }

    /// Current smoothed power (linear)
    #[must_use]
    pub const fn level(&self) -> f32 {
        self.level
    }

    /// Current smoothed power in dB
    #[must_use]
    pub fn level_db(&self) -> f32 {
        power_to_db(self.level)
    }

    /// Whether a sample has been seen since the last reset
    #[must_use]
    pub const fn is_primed(&self) -> bool {
        self.primed
    }

    /// Forget all history
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
