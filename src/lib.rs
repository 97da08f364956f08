//! Adaptive Automatic Gain Control with Squelch
//!
//! This library provides a closed-loop AGC for complex baseband (IQ) and
//! real sample streams, with an integrated signal-presence detector
//! (squelch). It is intended for SDR receive chains where the input level
//! is unknown and time-varying.
//!
//! # Architecture
//!
//! Each sample flows through the controller in one direction:
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │    Level     │──▶│  Gain Loop   │──▶│   Squelch    │──▶│  output  │
//! │  Estimator   │   │    Filter    │   │ State Machine│   │ x * gain │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────┘
//! ```
//!
//! The estimator and loop filter share a single bandwidth-derived
//! coefficient, so the whole loop behaves as one first-order system with a
//! time constant of `1 / bandwidth` samples.
//!
//! # Example
//!
//! ```
//! use sdr_agc::{Agc, IqSample, SquelchStatus};
//!
//! let mut agc = Agc::with_params(1.0, 0.1).unwrap();
//! agc.squelch_activate();
//! agc.squelch_set_threshold(-20.0).unwrap();
//! agc.squelch_set_timeout(16).unwrap();
//!
//! let mut y = IqSample::ZERO;
//! for _ in 0..500 {
//!     y = agc.execute(IqSample::new(0.25, 0.0));
//! }
//! assert!((y.magnitude() - 1.0).abs() < 1e-3);
//! assert_eq!(agc.squelch_status(), SquelchStatus::SignalPresent);
//! ```
//!
//! # Features
//!
//! - `std` (default): host float math, `std::error::Error` for [`AgcError`]
//! - `micromath`: float math for `no_std` builds
//! - `num-complex`: [`Sample`] for `num_complex::Complex32`
//! - `serde`: serialization of configuration types
//! - `defmt`: `defmt::Format` for embedded logging

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(not(any(feature = "std", feature = "micromath")))]
compile_error!("float math needs either the `std` or the `micromath` feature");

/// Digital Signal Processing
///
/// Level estimator, gain loop, squelch and the AGC controller.
pub mod dsp;

/// Shared sample types
pub mod types;

/// Defaults, limits and configuration value types
pub mod config;

/// Error types
pub mod error;

pub use config::{AgcConfig, SquelchConfig};
pub use dsp::agc::Agc;
pub use dsp::squelch::{Squelch, SquelchStatus};
pub use error::{AgcError, Parameter, Result};
pub use types::{IqSample, Sample};

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::dsp::agc::Agc;
    pub use crate::dsp::squelch::SquelchStatus;
    pub use crate::error::{AgcError, Parameter, Result};
    pub use crate::types::{IqSample, Sample};
}
