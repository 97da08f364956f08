//! Automatic Gain Control
//!
//! The public controller. Each call to [`Agc::execute`] feeds one sample to
//! the level estimator, steps the gain loop, advances the squelch (when
//! active) and returns the rescaled sample.
//!
//! The squelch does not alter the output: a muted gate is reported through
//! [`Agc::squelch_is_muted`] and the caller decides what to do with the
//! samples. The gain loop keeps tracking through silence.

use core::fmt::{self, Write as _};

#[cfg(all(not(feature = "std"), feature = "micromath"))]
#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::{AgcConfig, SquelchConfig, SUMMARY_CAPACITY};
use crate::dsp::gain_loop::{GainLoop, LoopBandwidth};
use crate::dsp::level::{power_to_db, sample_power, LevelEstimator};
use crate::dsp::squelch::{Squelch, SquelchStatus};
use crate::error::{AgcError, Result};
use crate::types::Sample;

/// AGC state
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Agc {
    /// Bandwidth and cached coefficient shared by estimator and loop
    bandwidth: LoopBandwidth,
    /// Smoothed input power
    estimator: LevelEstimator,
    /// Gain loop filter
    gain_loop: GainLoop,
    /// Signal presence detector
    squelch: Squelch,
}

impl Agc {
    /// Create an AGC with unit target, default bandwidth and squelch disabled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an AGC with the given target level and loop bandwidth
    ///
    /// # Errors
    ///
    /// [`AgcError::InvalidParameter`] for a non-positive target or a
    /// bandwidth outside (0, 1).
    pub fn with_params(target_level: f32, bandwidth: f32) -> Result<Self> {
        Ok(Self {
            bandwidth: LoopBandwidth::new(bandwidth)?,
            gain_loop: GainLoop::new(target_level)?,
            ..Self::default()
        })
    }

    /// Create an AGC from a configuration; the squelch is activated when the
    /// configuration carries one.
    ///
    /// # Errors
    ///
    /// [`AgcError::InvalidParameter`] for the first invalid field.
    pub fn with_config(config: &AgcConfig) -> Result<Self> {
        config.validate()?;
        let mut agc = Self::with_params(config.target_level, config.bandwidth)?;
        if let Some(squelch) = &config.squelch {
            agc.squelch.set_threshold(squelch.threshold_db)?;
            agc.squelch.set_timeout(squelch.timeout as usize)?;
            agc.squelch.activate();
        }
        log::debug!(
            "agc configured: target {}, bandwidth {}",
            config.target_level,
            config.bandwidth
        );
        Ok(agc)
    }

    /// Snapshot of the current configuration
    #[must_use]
    pub fn config(&self) -> AgcConfig {
        AgcConfig {
            target_level: self.gain_loop.target_level(),
            bandwidth: self.bandwidth.bandwidth(),
            squelch: self.squelch.is_enabled().then(|| {
                SquelchConfig::new(self.squelch.threshold_db(), self.squelch.timeout())
            }),
        }
    }

    /// Process a single sample.
    ///
    /// O(1), no allocation, never fails. Finite input keeps the gain
    /// positive and finite, however large. Non-finite input poisons the
    /// level and gain (NaN) until [`reset`](Self::reset).
    #[inline]
    pub fn execute<S: Sample>(&mut self, sample: S) -> S {
        let alpha = self.bandwidth.alpha();
        let level = self.estimator.update(sample_power(&sample), alpha);
        let gain = self.gain_loop.update(level, alpha);
        debug_assert!(
            (gain > 0.0 && gain.is_finite()) || level.is_nan(),
            "gain {gain} with level {level}"
        );
        if self.squelch.is_enabled() {
            self.squelch.update(power_to_db(level));
        }
        sample * gain
    }

    /// Process a block of samples in-place
    pub fn process_block<S: Sample>(&mut self, samples: &mut [S]) {
        for sample in samples.iter_mut() {
            *sample = self.execute(*sample);
        }
    }

    /// Process `input` into `output`.
    ///
    /// # Errors
    ///
    /// [`AgcError::LengthMismatch`] if the blocks differ in length; no
    /// sample is processed.
    pub fn execute_block<S: Sample>(&mut self, input: &[S], output: &mut [S]) -> Result<()> {
        if input.len() != output.len() {
            return Err(AgcError::LengthMismatch {
                input: input.len(),
                output: output.len(),
            });
        }
        for (x, y) in input.iter().zip(output.iter_mut()) {
            *y = self.execute(*x);
        }
        Ok(())
    }

    /// Prime the loop from a block: the level becomes the mean power of
    /// `samples` and the gain jumps to the matching ideal gain. The squelch
    /// is not advanced.
    ///
    /// # Errors
    ///
    /// [`AgcError::EmptyBlock`] for an empty slice.
    pub fn initialize<S: Sample>(&mut self, samples: &[S]) -> Result<()> {
        if samples.is_empty() {
            return Err(AgcError::EmptyBlock);
        }
        #[allow(clippy::cast_precision_loss)]
        let n = samples.len() as f32;
        let mut level = samples.iter().map(sample_power).sum::<f32>() / n;
        // the plain sum can overflow on finite input; rescale before summing
        if level.is_infinite() && samples.iter().all(Sample::is_finite) {
            level = samples
                .iter()
                .map(|s| sample_power(s) / n)
                .sum::<f32>()
                .min(f32::MAX);
        }
        self.estimator.prime(level);
        if !self.gain_loop.is_locked() {
            self.gain_loop.settle(level);
        }
        log::debug!("agc initialized from {} samples: level {}", samples.len(), level);
        Ok(())
    }

    /// Back to the freshly-configured state: unit gain, no level history,
    /// active squelch closed. Configuration and lock are kept.
    pub fn reset(&mut self) {
        self.estimator.reset();
        self.gain_loop.reset();
        self.squelch.reset();
    }

    /// Set the target output magnitude
    ///
    /// # Errors
    ///
    /// [`AgcError::InvalidParameter`] unless positive and finite; nothing
    /// changes on failure.
    pub fn set_target_level(&mut self, target_level: f32) -> Result<()> {
        self.gain_loop.set_target_level(target_level)?;
        log::debug!("agc target level set to {}", target_level);
        Ok(())
    }

    /// Set the loop bandwidth and recompute the smoothing coefficient
    ///
    /// # Errors
    ///
    /// [`AgcError::InvalidParameter`] unless in (0, 1); nothing changes on
    /// failure.
    pub fn set_bandwidth(&mut self, bandwidth: f32) -> Result<()> {
        self.bandwidth = LoopBandwidth::new(bandwidth)?;
        log::debug!(
            "agc bandwidth set to {} (alpha {})",
            bandwidth,
            self.bandwidth.alpha()
        );
        Ok(())
    }

    /// Preload the loop gain
    ///
    /// # Errors
    ///
    /// [`AgcError::InvalidParameter`] unless positive and finite.
    pub fn set_gain(&mut self, gain: f32) -> Result<()> {
        self.gain_loop.set_gain(gain)
    }

    /// Freeze the gain; level estimate and squelch keep running
    pub fn lock(&mut self) {
        self.gain_loop.set_locked(true);
    }

    /// Release a frozen gain
    pub fn unlock(&mut self) {
        self.gain_loop.set_locked(false);
    }

    /// Whether the gain is frozen
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.gain_loop.is_locked()
    }

    /// Target output magnitude
    #[must_use]
    pub const fn target_level(&self) -> f32 {
        self.gain_loop.target_level()
    }

    /// Loop bandwidth
    #[must_use]
    pub const fn bandwidth(&self) -> f32 {
        self.bandwidth.bandwidth()
    }

    /// Smoothed input power (linear)
    #[must_use]
    pub const fn signal_level(&self) -> f32 {
        self.estimator.level()
    }

    /// Smoothed input power in dB, the value the squelch compares
    #[must_use]
    pub fn rssi_db(&self) -> f32 {
        self.estimator.level_db()
    }

    /// Current gain (linear)
    #[must_use]
    pub const fn gain(&self) -> f32 {
        self.gain_loop.gain()
    }

    /// Current gain in dB
    #[must_use]
    pub fn gain_db(&self) -> f32 {
        20.0 * self.gain_loop.gain().log10()
    }

    /// Turn the squelch on (gate starts closed); the gain loop is untouched
    pub fn squelch_activate(&mut self) {
        self.squelch.activate();
    }

    /// Turn the squelch off; the gain loop is untouched
    pub fn squelch_deactivate(&mut self) {
        self.squelch.deactivate();
    }

    /// Set the squelch threshold in dB
    ///
    /// # Errors
    ///
    /// [`AgcError::InvalidParameter`] unless finite.
    pub fn squelch_set_threshold(&mut self, threshold_db: f32) -> Result<()> {
        self.squelch.set_threshold(threshold_db)
    }

    /// Set the squelch timeout in samples
    ///
    /// # Errors
    ///
    /// [`AgcError::InvalidParameter`] if `timeout` does not fit in `u32`.
    pub fn squelch_set_timeout(&mut self, timeout: usize) -> Result<()> {
        self.squelch.set_timeout(timeout)
    }

    /// Squelch logic active
    #[must_use]
    pub fn squelch_is_enabled(&self) -> bool {
        self.squelch.is_enabled()
    }

    /// Gate closed: `SignalAbsent`, or a rise not yet committed
    #[must_use]
    pub const fn squelch_is_muted(&self) -> bool {
        self.squelch.is_muted()
    }

    /// Current squelch phase
    #[must_use]
    pub const fn squelch_status(&self) -> SquelchStatus {
        self.squelch.status()
    }

    /// Squelch threshold in dB
    #[must_use]
    pub const fn squelch_threshold(&self) -> f32 {
        self.squelch.threshold_db()
    }

    /// Squelch timeout in samples
    #[must_use]
    pub const fn squelch_timeout(&self) -> u32 {
        self.squelch.timeout()
    }

    /// One-line status report
    #[must_use]
    pub fn summary(&self) -> heapless::String<SUMMARY_CAPACITY> {
        let mut s = heapless::String::new();
        let written = write!(s, "{self}");
        debug_assert!(written.is_ok(), "summary exceeds {SUMMARY_CAPACITY} bytes");
        s
    }
}

impl fmt::Display for Agc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "agc [rssi: {:.2} dB, gain: {:.2} dB, bw: {:.3e}, locked: {}, squelch: {}]",
            self.rssi_db(),
            self.gain_db(),
            self.bandwidth(),
            if self.is_locked() { "yes" } else { "no" },
            self.squelch_status().label()
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Agc {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Agc(rssi={}dB, gain={}dB, squelch={})",
            self.rssi_db(),
            self.gain_db(),
            self.squelch_status()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_GAIN;
    use crate::types::IqSample;

    #[test]
    fn test_agc_default() {
        let agc = Agc::new();
        assert_eq!(agc.gain(), 1.0);
        assert_eq!(agc.signal_level(), 0.0);
        assert_eq!(agc.target_level(), 1.0);
        assert!(!agc.squelch_is_enabled());
    }

    #[test]
    fn test_agc_reduces_loud_signal() {
        let mut agc = Agc::with_params(1.0, 0.05).unwrap();
        let mut y = IqSample::ZERO;
        for _ in 0..1000 {
            y = agc.execute(IqSample::new(3.0, 4.0));
        }
        assert!((y.magnitude() - 1.0).abs() < 1e-3);
        assert!((agc.gain() - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_agc_real_samples() {
        let mut agc = Agc::with_params(0.5, 0.1).unwrap();
        let mut y = 0.0f32;
        for n in 0..500 {
            let x = if n % 2 == 0 { 0.01 } else { -0.01 };
            y = agc.execute(x);
        }
        assert!((y.abs() - 0.5).abs() < 1e-3);
        assert!(y < 0.0);
    }

    #[test]
    fn test_summary_fits() {
        let mut agc = Agc::new();
        agc.squelch_activate();
        agc.lock();
        let s = agc.summary();
        assert!(s.starts_with("agc [rssi: -120.00 dB"), "{}", s);
        assert!(s.ends_with("locked: yes, squelch: absent]"), "{}", s);
    }

    #[test]
    fn test_summary_fits_extreme_state() {
        let mut agc = Agc::with_params(f32::MAX, 0.999).unwrap();
        agc.squelch_activate();
        agc.set_gain(MAX_GAIN).unwrap();
        agc.execute(IqSample::new(f32::MAX, -f32::MAX));
        let s = agc.summary();
        assert_eq!(s.as_str(), agc.to_string());
        assert!(s.ends_with(']'), "{}", s);
    }

    #[test]
    fn test_initialize_overflowing_block() {
        let mut agc = Agc::new();
        agc.initialize(&[f32::MAX, f32::MAX, 1e20]).unwrap();
        assert!(agc.signal_level().is_finite());
        assert!(agc.gain() > 0.0 && agc.gain().is_finite());

        agc.initialize(&[1.0, f32::INFINITY]).unwrap();
        assert!(agc.signal_level().is_infinite());
    }
}
