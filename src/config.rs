//! AGC configuration and numeric constants
//!
//! Defaults, numeric limits and the validated configuration value types.
//! A controller built from an [`AgcConfig`] is equivalent to one built with
//! [`Agc::new`](crate::Agc::new) followed by the matching setters.

#[cfg(all(not(feature = "std"), feature = "micromath"))]
#[allow(unused_imports)]
use micromath::F32Ext;

use crate::error::{AgcError, Parameter, Result};

/// Default target output magnitude
pub const DEFAULT_TARGET_LEVEL: f32 = 1.0;

/// Default loop bandwidth (time constant of 100 samples)
pub const DEFAULT_BANDWIDTH: f32 = 0.01;

/// Floor applied to the power estimate before dividing or taking logs
pub const LEVEL_FLOOR: f32 = 1e-12;

/// Smallest gain the loop will ever hold
pub const MIN_GAIN: f32 = 1e-30;

/// Largest gain the loop will ever hold
pub const MAX_GAIN: f32 = 1e30;

/// Default squelch threshold in dB
pub const DEFAULT_SQUELCH_THRESHOLD_DB: f32 = -40.0;

/// Default squelch timeout in samples
pub const DEFAULT_SQUELCH_TIMEOUT: u32 = 100;

/// Capacity of the one-line status summary
pub const SUMMARY_CAPACITY: usize = 128;

/// Squelch configuration
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SquelchConfig {
    /// Level in dB below which the signal is considered absent
    pub threshold_db: f32,
    /// Consecutive samples before a transition commits
    pub timeout: u32,
}

impl SquelchConfig {
    /// Create a squelch configuration
    #[must_use]
    pub const fn new(threshold_db: f32, timeout: u32) -> Self {
        Self {
            threshold_db,
            timeout,
        }
    }

    /// Check the threshold is finite
    ///
    /// # Errors
    ///
    /// [`AgcError::InvalidParameter`] for a NaN or infinite threshold.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.threshold_db)
    }
}

impl Default for SquelchConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SQUELCH_THRESHOLD_DB, DEFAULT_SQUELCH_TIMEOUT)
    }
}

/// AGC configuration
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgcConfig {
    /// Target output magnitude
    pub target_level: f32,
    /// Loop bandwidth in (0, 1)
    pub bandwidth: f32,
    /// Squelch settings; `None` leaves the squelch disabled
    pub squelch: Option<SquelchConfig>,
}

impl AgcConfig {
    /// Fast loop for bursty signals (time constant of 10 samples)
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            target_level: DEFAULT_TARGET_LEVEL,
            bandwidth: 0.1,
            squelch: None,
        }
    }

    /// Medium loop, same as the default
    #[must_use]
    pub const fn medium() -> Self {
        Self {
            target_level: DEFAULT_TARGET_LEVEL,
            bandwidth: DEFAULT_BANDWIDTH,
            squelch: None,
        }
    }

    /// Slow loop for steady carriers (time constant of 1000 samples)
    #[must_use]
    pub const fn slow() -> Self {
        Self {
            target_level: DEFAULT_TARGET_LEVEL,
            bandwidth: 0.001,
            squelch: None,
        }
    }

    /// Replace the target level
    #[must_use]
    pub const fn with_target_level(mut self, target_level: f32) -> Self {
        self.target_level = target_level;
        self
    }

    /// Replace the loop bandwidth
    #[must_use]
    pub const fn with_bandwidth(mut self, bandwidth: f32) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    /// Enable the squelch with the given settings
    #[must_use]
    pub const fn with_squelch(mut self, squelch: SquelchConfig) -> Self {
        self.squelch = Some(squelch);
        self
    }

    /// Check every field against its domain
    ///
    /// # Errors
    ///
    /// [`AgcError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        validate_target_level(self.target_level)?;
        validate_bandwidth(self.bandwidth)?;
        if let Some(squelch) = &self.squelch {
            squelch.validate()?;
        }
        Ok(())
    }

    /// Samples needed for the loop to shrink an initial gain error by
    /// `tolerance` (e.g. `1e-3`).
    ///
    /// The error decays as `exp(-bandwidth * n)`, plus one sample to prime
    /// the level estimator. Returns `None` for an invalid bandwidth or a
    /// tolerance outside (0, 1).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn settling_samples(&self, tolerance: f32) -> Option<u32> {
        if validate_bandwidth(self.bandwidth).is_err() || !(tolerance > 0.0 && tolerance < 1.0) {
            return None;
        }
        let n = (1.0 / tolerance).ln() / self.bandwidth;
        Some(n.ceil() as u32 + 1)
    }
}

impl Default for AgcConfig {
    fn default() -> Self {
        Self::medium()
    }
}

pub(crate) fn validate_target_level(level: f32) -> Result<()> {
    if level > 0.0 && level.is_finite() {
        Ok(())
    } else {
        Err(AgcError::invalid(Parameter::TargetLevel, level))
    }
}

pub(crate) fn validate_bandwidth(bandwidth: f32) -> Result<()> {
    if bandwidth > 0.0 && bandwidth < 1.0 {
        Ok(())
    } else {
        Err(AgcError::invalid(Parameter::Bandwidth, bandwidth))
    }
}

pub(crate) fn validate_threshold(threshold_db: f32) -> Result<()> {
    if threshold_db.is_finite() {
        Ok(())
    } else {
        Err(AgcError::invalid(Parameter::SquelchThreshold, threshold_db))
    }
}
