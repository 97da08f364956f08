//! Error types
//!
//! Configuration is all-or-nothing: every fallible setter validates before
//! touching any state, so an `Err` always leaves the instance unchanged.

use core::fmt;

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = core::result::Result<T, AgcError>;

/// Configurable parameter named in an [`AgcError::InvalidParameter`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parameter {
    /// Desired output magnitude, must be positive and finite
    TargetLevel,
    /// Loop bandwidth, must lie in (0, 1)
    Bandwidth,
    /// Loop gain preload, must be positive and finite
    Gain,
    /// Squelch threshold in dB, must be finite
    SquelchThreshold,
    /// Squelch timeout in samples, must fit in `u32`
    SquelchTimeout,
}

impl Parameter {
    /// Short lowercase name, as used in log and error messages
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TargetLevel => "target level",
            Self::Bandwidth => "bandwidth",
            Self::Gain => "gain",
            Self::SquelchThreshold => "squelch threshold",
            Self::SquelchTimeout => "squelch timeout",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Parameter {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.name());
    }
}

/// Errors reported by the AGC
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum AgcError {
    /// A setter or configuration value is outside its domain
    #[error("invalid {parameter}: {value}")]
    InvalidParameter {
        /// Which parameter was rejected
        parameter: Parameter,
        /// The rejected value
        value: f64,
    },
    /// Input and output blocks differ in length
    #[error("block length mismatch: input {input}, output {output}")]
    LengthMismatch {
        /// Input block length
        input: usize,
        /// Output block length
        output: usize,
    },
    /// A block operation was given no samples
    #[error("empty sample block")]
    EmptyBlock,
}

impl AgcError {
    /// Build an [`AgcError::InvalidParameter`] and log the rejection
    pub(crate) fn invalid(parameter: Parameter, value: impl Into<f64>) -> Self {
        let value = value.into();
        log::warn!("rejected {}: {}", parameter, value);
        Self::InvalidParameter { parameter, value }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AgcError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::InvalidParameter { parameter, value } => {
                defmt::write!(f, "Invalid({}={})", parameter, value);
            }
            Self::LengthMismatch { input, output } => {
                defmt::write!(f, "LengthMismatch({}!={})", input, output);
            }
            Self::EmptyBlock => defmt::write!(f, "EmptyBlock"),
        }
    }
}
