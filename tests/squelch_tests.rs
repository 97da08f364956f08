//! Squelch State Machine Tests
//!
//! Debounce, recovery and gate semantics of the squelch, both on the bare
//! state machine and through the AGC controller.
//! Run with: cargo test --test squelch_tests

use sdr_agc::{Agc, AgcError, IqSample, Parameter, Squelch, SquelchStatus};

const THRESHOLD_DB: f32 = -20.0;
const ABOVE_DB: f32 = 0.0;
const BELOW_DB: f32 = -50.0;

fn squelch(timeout: usize) -> Squelch {
    let mut sq = Squelch::new();
    sq.set_threshold(THRESHOLD_DB).unwrap();
    sq.set_timeout(timeout).unwrap();
    sq.activate();
    sq
}

fn open_squelch(timeout: usize) -> Squelch {
    let mut sq = squelch(timeout);
    for _ in 0..=timeout {
        sq.update(ABOVE_DB);
    }
    assert_eq!(sq.status(), SquelchStatus::SignalPresent);
    sq
}

// =============================================================================
// Activation Tests
// =============================================================================

#[test]
fn test_squelch_starts_disabled() {
    let sq = Squelch::new();
    assert_eq!(sq.status(), SquelchStatus::Disabled);
    assert!(!sq.is_enabled());
    assert!(!sq.is_muted());
}

#[test]
fn test_activate_is_idempotent() {
    let mut sq = open_squelch(4);
    sq.activate();
    assert_eq!(sq.status(), SquelchStatus::SignalPresent);
}

#[test]
fn test_deactivate_returns_to_disabled() {
    let mut sq = open_squelch(4);
    sq.update(BELOW_DB);
    assert_eq!(sq.status(), SquelchStatus::FallPending);

    sq.deactivate();
    assert_eq!(sq.status(), SquelchStatus::Disabled);
    assert_eq!(sq.counter(), 0);

    // no automatic transition leaves Disabled
    for _ in 0..100 {
        assert_eq!(sq.update(BELOW_DB), SquelchStatus::Disabled);
        assert_eq!(sq.update(ABOVE_DB), SquelchStatus::Disabled);
    }
}

// =============================================================================
// Debounce Tests
// =============================================================================

#[test]
fn test_fall_debounce() {
    const T: usize = 16;
    let mut sq = open_squelch(T);

    // the level drops below threshold at sample k = 0
    for j in 0..T {
        let status = sq.update(BELOW_DB);
        assert_ne!(status, SquelchStatus::SignalAbsent, "committed early at k+{}", j);
        assert_eq!(status, SquelchStatus::FallPending);
        assert!(sq.counter() as usize <= T);
    }
    assert_eq!(sq.update(BELOW_DB), SquelchStatus::SignalAbsent);
    assert_eq!(sq.counter(), 0);
}

#[test]
fn test_rise_debounce() {
    const T: usize = 8;
    let mut sq = squelch(T);
    for _ in 0..T {
        assert_eq!(sq.update(ABOVE_DB), SquelchStatus::RisePending);
    }
    assert_eq!(sq.update(ABOVE_DB), SquelchStatus::SignalPresent);
}

#[test]
fn test_zero_timeout_commits_immediately() {
    let mut sq = squelch(0);
    assert_eq!(sq.update(ABOVE_DB), SquelchStatus::SignalPresent);
    assert_eq!(sq.update(BELOW_DB), SquelchStatus::SignalAbsent);
    assert_eq!(sq.update(ABOVE_DB), SquelchStatus::SignalPresent);
}

#[test]
fn test_recovery_resets_fall_debounce() {
    const T: usize = 16;
    let mut sq = open_squelch(T);

    for _ in 0..10 {
        sq.update(BELOW_DB);
    }
    assert_eq!(sq.status(), SquelchStatus::FallPending);
    assert_eq!(sq.counter(), 9);

    // a single recovery sample: no partial credit
    assert_eq!(sq.update(ABOVE_DB), SquelchStatus::SignalPresent);
    assert_eq!(sq.counter(), 0);

    for j in 0..T {
        assert_ne!(
            sq.update(BELOW_DB),
            SquelchStatus::SignalAbsent,
            "fresh fall committed early at k+{}",
            j
        );
    }
    assert_eq!(sq.update(BELOW_DB), SquelchStatus::SignalAbsent);
}

#[test]
fn test_dip_resets_rise_debounce() {
    const T: usize = 4;
    let mut sq = squelch(T);
    for _ in 0..3 {
        sq.update(ABOVE_DB);
    }
    assert_eq!(sq.update(BELOW_DB), SquelchStatus::SignalAbsent);
    for _ in 0..T {
        assert_eq!(sq.update(ABOVE_DB), SquelchStatus::RisePending);
    }
    assert_eq!(sq.update(ABOVE_DB), SquelchStatus::SignalPresent);
}

#[test]
fn test_exactly_one_status_per_sample() {
    let mut sq = squelch(3);
    let pattern = [ABOVE_DB, BELOW_DB, ABOVE_DB, ABOVE_DB, ABOVE_DB, ABOVE_DB, BELOW_DB];
    for level in pattern.iter().cycle().take(200) {
        let status = sq.update(*level);
        let flags = [
            status == SquelchStatus::RisePending,
            status == SquelchStatus::SignalPresent,
            status == SquelchStatus::FallPending,
            status == SquelchStatus::SignalAbsent,
        ];
        assert_eq!(flags.iter().filter(|f| **f).count(), 1);
        assert!(sq.counter() <= sq.timeout());
    }
}

// =============================================================================
// Gate (muted) Semantics
// =============================================================================

#[test]
fn test_muted_follows_committed_state() {
    let mut sq = squelch(2);
    assert!(sq.is_muted());

    sq.update(ABOVE_DB);
    assert_eq!(sq.status(), SquelchStatus::RisePending);
    assert!(sq.is_muted(), "gate stays closed until the rise commits");

    sq.update(ABOVE_DB);
    sq.update(ABOVE_DB);
    assert_eq!(sq.status(), SquelchStatus::SignalPresent);
    assert!(!sq.is_muted());

    sq.update(BELOW_DB);
    assert_eq!(sq.status(), SquelchStatus::FallPending);
    assert!(!sq.is_muted(), "gate stays open until the fall commits");

    sq.update(BELOW_DB);
    sq.update(BELOW_DB);
    assert_eq!(sq.status(), SquelchStatus::SignalAbsent);
    assert!(sq.is_muted());
}

#[test]
fn test_status_helpers() {
    assert!(SquelchStatus::RisePending.is_pending());
    assert!(SquelchStatus::FallPending.is_pending());
    assert!(!SquelchStatus::SignalAbsent.is_pending());
    assert!(!SquelchStatus::Disabled.is_muted());
    assert_eq!(SquelchStatus::SignalPresent.label(), "signal");
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_threshold_rejects_non_finite() {
    let mut sq = squelch(4);
    for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
        assert!(matches!(
            sq.set_threshold(bad),
            Err(AgcError::InvalidParameter {
                parameter: Parameter::SquelchThreshold,
                ..
            })
        ));
    }
    assert_eq!(sq.threshold_db(), THRESHOLD_DB);
}

#[cfg(target_pointer_width = "64")]
#[test]
fn test_timeout_must_fit_u32() {
    let mut sq = squelch(4);
    let too_large = u32::MAX as usize + 1;
    assert!(matches!(
        sq.set_timeout(too_large),
        Err(AgcError::InvalidParameter {
            parameter: Parameter::SquelchTimeout,
            ..
        })
    ));
    assert_eq!(sq.timeout(), 4);
    assert!(sq.set_timeout(u32::MAX as usize).is_ok());
}

// =============================================================================
// Controller Integration
// =============================================================================

#[test]
fn test_agc_squelch_toggle_keeps_gain_loop() {
    let mut agc = Agc::with_params(1.0, 0.1).unwrap();
    for _ in 0..300 {
        agc.execute(IqSample::new(0.5, 0.0));
    }
    let gain = agc.gain();
    let level = agc.signal_level();

    agc.squelch_activate();
    assert!(agc.squelch_is_enabled());
    assert_eq!(agc.gain(), gain);
    assert_eq!(agc.signal_level(), level);

    agc.squelch_deactivate();
    assert!(!agc.squelch_is_enabled());
    assert_eq!(agc.gain(), gain);
}

#[test]
fn test_agc_squelch_opens_and_closes() {
    const T: usize = 16;
    let mut agc = Agc::with_params(1.0, 0.5).unwrap();
    agc.squelch_activate();
    agc.squelch_set_threshold(THRESHOLD_DB).unwrap();
    agc.squelch_set_timeout(T).unwrap();

    for _ in 0..100 {
        agc.execute(IqSample::new(1.0, 0.0));
    }
    assert_eq!(agc.squelch_status(), SquelchStatus::SignalPresent);
    assert!(!agc.squelch_is_muted());

    // silence: the level decays below -20 dB within a few samples, then
    // the fall needs T more
    let mut absent_at = None;
    for n in 0..200 {
        agc.execute(IqSample::ZERO);
        if agc.squelch_status() == SquelchStatus::SignalAbsent {
            absent_at = Some(n);
            break;
        }
    }
    let absent_at = absent_at.expect("squelch never closed");
    assert!(absent_at >= T, "closed after {} samples", absent_at);
    assert!(agc.squelch_is_muted());
    assert!(agc.squelch_is_enabled());

    // the gain loop keeps running through silence
    let gain_before = agc.gain();
    for _ in 0..50 {
        agc.execute(IqSample::ZERO);
    }
    assert!(agc.gain() > gain_before);
}

#[test]
fn test_agc_squelch_without_activation_never_mutes() {
    let mut agc = Agc::with_params(1.0, 0.1).unwrap();
    agc.squelch_set_threshold(THRESHOLD_DB).unwrap();
    for _ in 0..100 {
        agc.execute(IqSample::ZERO);
        assert_eq!(agc.squelch_status(), SquelchStatus::Disabled);
        assert!(!agc.squelch_is_muted());
    }
}
