//! Gain Loop Filter
//!
//! Converts the level estimate into a multiplicative gain. The instantaneous
//! ideal gain `target / sqrt(level)` is blended into the persistent gain with
//! the same coefficient the level estimator uses.

#[cfg(all(not(feature = "std"), feature = "micromath"))]
#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::{
    validate_bandwidth, validate_target_level, DEFAULT_BANDWIDTH, DEFAULT_TARGET_LEVEL, MAX_GAIN,
    MIN_GAIN,
};
use crate::dsp::level::floor_power;
use crate::error::{AgcError, Parameter, Result};

/// Loop bandwidth with its cached smoothing coefficient.
///
/// `alpha = 1 - exp(-bandwidth)`, so the loop error decays as
/// `exp(-bandwidth * n)`. The exponential is evaluated only here, never per
/// sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopBandwidth {
    bandwidth: f32,
    alpha: f32,
}

impl LoopBandwidth {
    /// Validate `bandwidth` (must lie in (0, 1)) and derive `alpha`
    ///
    /// # Errors
    ///
    /// [`AgcError::InvalidParameter`] if `bandwidth` is outside (0, 1).
    pub fn new(bandwidth: f32) -> Result<Self> {
        validate_bandwidth(bandwidth)?;
        Ok(Self::derive(bandwidth))
    }

    fn derive(bandwidth: f32) -> Self {
        Self {
            bandwidth,
            alpha: 1.0 - (-bandwidth).exp(),
        }
    }

    /// Configured bandwidth
    #[must_use]
    pub const fn bandwidth(&self) -> f32 {
        self.bandwidth
    }

    /// Per-sample smoothing coefficient
    #[must_use]
    pub const fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl Default for LoopBandwidth {
    fn default() -> Self {
        Self::derive(DEFAULT_BANDWIDTH)
    }
}

/// Single-pole gain loop
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GainLoop {
    /// Desired output magnitude
    target_level: f32,
    /// Current gain (linear), always in `[MIN_GAIN, MAX_GAIN]` unless poisoned
    gain: f32,
    /// Gain frozen
    locked: bool,
}

impl GainLoop {
    /// Create a loop with unit gain
    ///
    /// # Errors
    ///
    /// [`AgcError::InvalidParameter`] for a non-positive or non-finite target.
    pub fn new(target_level: f32) -> Result<Self> {
        validate_target_level(target_level)?;
        Ok(Self {
            target_level,
            gain: 1.0,
            locked: false,
        })
    }

    /// Gain that maps a signal of power `level` exactly onto the target
    #[must_use]
    #[inline]
    pub fn ideal_gain(&self, level: f32) -> f32 {
        self.target_level / floor_power(level).sqrt()
    }

    /// Move the gain one step toward the ideal gain for `level`.
    ///
    /// Does nothing while locked. Returns the gain to apply.
    #[inline]
    pub fn update(&mut self, level: f32, alpha: f32) -> f32 {
        if !self.locked {
            let ideal = self.ideal_gain(level);
            self.gain = (self.gain + alpha * (ideal - self.gain)).clamp(MIN_GAIN, MAX_GAIN);
        }
        self.gain
    }

    /// Jump straight to the ideal gain for `level`
    pub fn settle(&mut self, level: f32) {
        self.gain = self.ideal_gain(level).clamp(MIN_GAIN, MAX_GAIN);
    }

    /// Current gain (linear)
    #[must_use]
    pub const fn gain(&self) -> f32 {
        self.gain
    }

    /// Desired output magnitude
    #[must_use]
    pub const fn target_level(&self) -> f32 {
        self.target_level
    }

    /// Set the target level (must be positive and finite)
    ///
    /// # Errors
    ///
    /// [`AgcError::InvalidParameter`]; the previous target is kept.
    pub fn set_target_level(&mut self, target_level: f32) -> Result<()> {
        validate_target_level(target_level)?;
        self.target_level = target_level;
        Ok(())
    }

    /// Preload the gain (must be positive and finite)
    ///
    /// # Errors
    ///
    /// [`AgcError::InvalidParameter`]; the previous gain is kept.
    pub fn set_gain(&mut self, gain: f32) -> Result<()> {
        if !(gain > 0.0 && gain.is_finite()) {
            return Err(AgcError::invalid(Parameter::Gain, gain));
        }
        self.gain = gain.clamp(MIN_GAIN, MAX_GAIN);
        Ok(())
    }

    /// Freeze or release the gain
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Whether the gain is frozen
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Back to unit gain; target and lock are kept
    pub fn reset(&mut self) {
        self.gain = 1.0;
    }
}

impl Default for GainLoop {
    fn default() -> Self {
        Self {
            target_level: DEFAULT_TARGET_LEVEL,
            gain: 1.0,
            locked: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_cached() {
        let bw = LoopBandwidth::new(0.1).unwrap();
        assert!((bw.alpha() - (1.0 - (-0.1f32).exp())).abs() < 1e-7);
        assert_eq!(LoopBandwidth::new(0.1).unwrap(), bw);
    }

    #[test]
    fn test_bandwidth_domain() {
        assert!(LoopBandwidth::new(0.0).is_err());
        assert!(LoopBandwidth::new(1.0).is_err());
        assert!(LoopBandwidth::new(-0.5).is_err());
        assert!(LoopBandwidth::new(0.999).is_ok());
    }

    #[test]
    fn test_ideal_gain() {
        let g = GainLoop::new(2.0).unwrap();
        assert!((g.ideal_gain(4.0) - 1.0).abs() < 1e-6);
        // floored: 1 / sqrt(1e-12)
        assert!((g.ideal_gain(0.0) / 2.0e6 - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_locked_gain_holds() {
        let mut g = GainLoop::default();
        g.set_locked(true);
        assert_eq!(g.update(100.0, 0.5), 1.0);
        g.set_locked(false);
        assert!(g.update(100.0, 0.5) < 1.0);
    }

    #[test]
    fn test_set_gain_rejects_zero() {
        let mut g = GainLoop::default();
        assert!(g.set_gain(0.0).is_err());
        assert!(g.set_gain(f32::INFINITY).is_err());
        assert_eq!(g.gain(), 1.0);
        g.set_gain(3.0).unwrap();
        assert_eq!(g.gain(), 3.0);
    }
}
