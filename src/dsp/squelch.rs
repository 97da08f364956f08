//! Squelch State Machine
//!
//! Decides whether a signal is present by comparing the level estimate (in
//! dB) against a threshold. Transitions are debounced: a change of side must
//! persist for `timeout` further samples before it commits.
//!
//! ```text
//!              below                    counter >= timeout
//!  SignalPresent ─────▶ FallPending ───────────────────────▶ SignalAbsent
//!        ▲  ◀──────────── (above)                                 │
//!        │                                                        │ above
//!        │          counter >= timeout                            ▼
//!        └──────────────────────────────── RisePending ◀──────────┘
//!                                            (below) ──────▶ SignalAbsent
//! ```
//!
//! `Disabled` sits outside the cycle and is left only by
//! [`Squelch::activate`].

use crate::config::{validate_threshold, DEFAULT_SQUELCH_THRESHOLD_DB, DEFAULT_SQUELCH_TIMEOUT};
use crate::error::{AgcError, Parameter, Result};

/// Squelch phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SquelchStatus {
    /// Squelch bypassed; every sample counts as signal
    #[default]
    Disabled,
    /// Level above threshold, waiting for the rise to commit
    RisePending,
    /// Signal present (gate open)
    SignalPresent,
    /// Level below threshold, waiting for the fall to commit
    FallPending,
    /// Signal absent (gate closed)
    SignalAbsent,
}

impl SquelchStatus {
    /// Short label for display
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::RisePending => "rise",
            Self::SignalPresent => "signal",
            Self::FallPending => "fall",
            Self::SignalAbsent => "absent",
        }
    }

    /// Committed gate state: closed in `SignalAbsent` and while a rise is
    /// still pending.
    #[must_use]
    pub const fn is_muted(self) -> bool {
        matches!(self, Self::SignalAbsent | Self::RisePending)
    }

    /// A transition is waiting on the debounce counter
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::RisePending | Self::FallPending)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SquelchStatus {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.label());
    }
}

/// Timeout-debounced squelch
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Squelch {
    /// Current phase
    status: SquelchStatus,
    /// Threshold in dB
    threshold_db: f32,
    /// Samples a pending transition must last
    timeout: u32,
    /// Samples elapsed in the pending transition
    counter: u32,
}

impl Squelch {
    /// Create a disabled squelch with default threshold and timeout
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: SquelchStatus::Disabled,
            threshold_db: DEFAULT_SQUELCH_THRESHOLD_DB,
            timeout: DEFAULT_SQUELCH_TIMEOUT,
            counter: 0,
        }
    }

    /// Turn the squelch on.
    ///
    /// From `Disabled` the gate starts closed (`SignalAbsent`). Already
    /// active: no change.
    pub fn activate(&mut self) {
        if self.status == SquelchStatus::Disabled {
            self.enter(SquelchStatus::SignalAbsent);
            log::debug!("squelch activated ({} dB, timeout {})", self.threshold_db, self.timeout);
        }
    }

    /// Turn the squelch off
    pub fn deactivate(&mut self) {
        if self.status != SquelchStatus::Disabled {
            self.enter(SquelchStatus::Disabled);
            log::debug!("squelch deactivated");
        }
    }

    /// Set the threshold in dB (must be finite)
    ///
    /// # Errors
    ///
    /// [`AgcError::InvalidParameter`]; the previous threshold is kept.
    pub fn set_threshold(&mut self, threshold_db: f32) -> Result<()> {
        validate_threshold(threshold_db)?;
        self.threshold_db = threshold_db;
        log::debug!("squelch threshold set to {} dB", threshold_db);
        Ok(())
    }

    /// Set the timeout in samples (must fit in `u32`).
    ///
    /// A pending counter beyond the new timeout is pulled back to it, so
    /// the transition commits on the next qualifying sample.
    ///
    /// # Errors
    ///
    /// [`AgcError::InvalidParameter`]; the previous timeout is kept.
    pub fn set_timeout(&mut self, timeout: usize) -> Result<()> {
        #[allow(clippy::cast_precision_loss)]
        let timeout = u32::try_from(timeout)
            .map_err(|_| AgcError::invalid(Parameter::SquelchTimeout, timeout as f64))?;
        self.timeout = timeout;
        self.counter = self.counter.min(timeout);
        log::debug!("squelch timeout set to {} samples", timeout);
        Ok(())
    }

    /// Advance one sample given the current level in dB.
    ///
    /// A NaN level never counts as above threshold.
    pub fn update(&mut self, level_db: f32) -> SquelchStatus {
        let above = level_db >= self.threshold_db;
        match (self.status, above) {
            (SquelchStatus::Disabled, _)
            | (SquelchStatus::SignalPresent, true)
            | (SquelchStatus::SignalAbsent, false) => {}
            (SquelchStatus::SignalPresent, false) => {
                self.enter(SquelchStatus::FallPending);
                self.commit_if_due(SquelchStatus::SignalAbsent);
            }
            (SquelchStatus::SignalAbsent, true) => {
                self.enter(SquelchStatus::RisePending);
                self.commit_if_due(SquelchStatus::SignalPresent);
            }
            (SquelchStatus::FallPending, true) => self.enter(SquelchStatus::SignalPresent),
            (SquelchStatus::RisePending, false) => self.enter(SquelchStatus::SignalAbsent),
            (SquelchStatus::FallPending, false) => {
                self.counter += 1;
                self.commit_if_due(SquelchStatus::SignalAbsent);
            }
            (SquelchStatus::RisePending, true) => {
                self.counter += 1;
                self.commit_if_due(SquelchStatus::SignalPresent);
            }
        }
        self.status
    }

    fn enter(&mut self, status: SquelchStatus) {
        self.status = status;
        self.counter = 0;
    }

    fn commit_if_due(&mut self, status: SquelchStatus) {
        if self.counter >= self.timeout {
            self.enter(status);
            log::trace!("squelch -> {}", status.label());
        }
    }

    /// Return an active squelch to `SignalAbsent`; settings kept
    pub fn reset(&mut self) {
        if self.status != SquelchStatus::Disabled {
            self.enter(SquelchStatus::SignalAbsent);
        }
    }

    /// Current phase
    #[must_use]
    pub const fn status(&self) -> SquelchStatus {
        self.status
    }

    /// Squelch logic active (`status != Disabled`)
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.status != SquelchStatus::Disabled
    }

    /// Gate closed, see [`SquelchStatus::is_muted`]
    #[must_use]
    pub const fn is_muted(&self) -> bool {
        self.status.is_muted()
    }

    /// Threshold in dB
    #[must_use]
    pub const fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    /// Timeout in samples
    #[must_use]
    pub const fn timeout(&self) -> u32 {
        self.timeout
    }

    /// Samples elapsed in the current pending transition
    #[must_use]
    pub const fn counter(&self) -> u32 {
        self.counter
    }
}

impl Default for Squelch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(threshold_db: f32, timeout: usize) -> Squelch {
        let mut sq = Squelch::new();
        sq.set_threshold(threshold_db).unwrap();
        sq.set_timeout(timeout).unwrap();
        sq.activate();
        sq
    }

    #[test]
    fn test_disabled_ignores_level() {
        let mut sq = Squelch::new();
        assert_eq!(sq.update(-200.0), SquelchStatus::Disabled);
        assert_eq!(sq.update(50.0), SquelchStatus::Disabled);
        assert!(!sq.is_enabled());
    }

    #[test]
    fn test_activate_starts_closed() {
        let sq = active(-20.0, 4);
        assert_eq!(sq.status(), SquelchStatus::SignalAbsent);
        assert!(sq.is_muted());
    }

    #[test]
    fn test_rise_commits_after_timeout() {
        let mut sq = active(-20.0, 2);
        assert_eq!(sq.update(0.0), SquelchStatus::RisePending);
        assert_eq!(sq.update(0.0), SquelchStatus::RisePending);
        assert_eq!(sq.update(0.0), SquelchStatus::SignalPresent);
        assert_eq!(sq.counter(), 0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut sq = active(-20.0, 0);
        assert_eq!(sq.update(-20.0), SquelchStatus::SignalPresent);
    }

    #[test]
    fn test_shrinking_timeout_clamps_counter() {
        let mut sq = active(-20.0, 10);
        for _ in 0..6 {
            sq.update(0.0);
        }
        assert_eq!(sq.counter(), 5);
        sq.set_timeout(3).unwrap();
        assert_eq!(sq.counter(), 3);
        assert_eq!(sq.update(0.0), SquelchStatus::SignalPresent);
    }

    #[test]
    fn test_nan_level_counts_as_below() {
        let mut sq = active(-20.0, 0);
        sq.update(0.0);
        assert_eq!(sq.update(f32::NAN), SquelchStatus::SignalAbsent);
    }
}
