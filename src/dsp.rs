//! Digital Signal Processing
//!
//! Building blocks of the AGC, leaf-first:
//! - Signal level estimator (smoothed power)
//! - Gain loop filter (single-pole, shared bandwidth coefficient)
//! - Squelch state machine (timeout-debounced hysteresis)
//! - AGC controller tying them together per sample

pub mod level;
pub mod gain_loop;
pub mod squelch;
pub mod agc;
