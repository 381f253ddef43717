//! Voice and Carrier Detection Tests
//!
//! Tests for the retriggerable hold detector and the signal router interface.
//! Run with: cargo test --test detection_tests

use usb_radio_audio::audio::detect::{Detector, DetectorParams};
use usb_radio_audio::router::{DetectionSignals, SignalState, SignalWatcher};
use usb_radio_audio::types::{DetectionKind, HoldTime, SampleRate};

// =============================================================================
// Hold Window
// =============================================================================

#[test]
fn asserts_on_first_crossing() {
    let mut det = Detector::new();
    assert!(!det.is_asserted());
    assert_eq!(det.step(101, 100, 10), Some(true));
    assert!(det.is_asserted());
    assert_eq!(det.countdown(), 10);
}

#[test]
fn holds_for_exactly_the_hold_window() {
    // 100 ms at 48 kHz
    let params = DetectorParams::new(1000, 1600);
    let rate = SampleRate::Hz48000;
    let hold = params.hold().ticks_at(rate);
    assert_eq!(hold, 4800);

    let mut det = Detector::new();
    assert_eq!(det.step_with(2000, &params, rate), Some(true));

    for quiet in 1..hold {
        assert_eq!(det.step_with(0, &params, rate), None, "quiet tick {quiet}");
        assert!(det.is_asserted());
    }
    assert_eq!(det.step_with(0, &params, rate), Some(false));
    assert!(!det.is_asserted());
}

#[test]
fn crossing_retriggers_full_window() {
    let mut det = Detector::new();
    det.step(500, 100, 5);
    det.step(0, 100, 5);
    det.step(0, 100, 5);
    assert_eq!(det.countdown(), 3);

    assert_eq!(det.step(500, 100, 5), None);
    assert_eq!(det.countdown(), 5);

    for _ in 0..4 {
        assert_eq!(det.step(0, 100, 5), None);
    }
    assert_eq!(det.step(0, 100, 5), Some(false));
}

#[test]
fn magnitude_equal_to_threshold_is_quiet() {
    let mut det = Detector::new();
    det.step(200, 100, 2);
    assert_eq!(det.step(100, 100, 2), None);
    assert_eq!(det.step(100, 100, 2), Some(false));
}

#[test]
fn stays_deasserted_below_threshold() {
    let mut det = Detector::new();
    for magnitude in [0, 50, 99, 100] {
        assert_eq!(det.step(magnitude, 100, 10), None);
    }
    assert!(!det.is_asserted());
    assert_eq!(det.countdown(), 0);
}

#[test]
fn reset_drops_signal() {
    let mut det = Detector::new();
    det.step(500, 100, 50);
    det.reset();
    assert!(!det.is_asserted());
    assert_eq!(det.countdown(), 0);
}

#[test]
fn hold_scales_with_rate() {
    let params = DetectorParams::new(10, 20 << 4);
    for (rate, ticks) in [
        (SampleRate::Hz8000, 160),
        (SampleRate::Hz16000, 320),
        (SampleRate::Hz48000, 960),
    ] {
        let mut det = Detector::new();
        det.step_with(100, &params, rate);
        assert_eq!(det.countdown(), ticks, "{rate:?}");
    }
}

// =============================================================================
// Shared Parameters
// =============================================================================

#[test]
fn params_update_takes_effect_on_next_crossing() {
    let params = DetectorParams::new(1000, 10 << 4);
    assert_eq!(params.threshold(), 1000);
    assert_eq!(params.hold().as_millis(), 10);

    params.set_threshold(50);
    params.set_hold(HoldTime::from_millis(1));

    let mut det = Detector::new();
    det.step_with(60, &params, SampleRate::Hz8000);
    assert!(det.is_asserted());
    assert_eq!(det.countdown(), 8);
}

// =============================================================================
// Signal Router Interface
// =============================================================================

#[test]
fn signals_start_deasserted() {
    let signals = DetectionSignals::new();
    assert_eq!(signals.snapshot(), SignalState::default());
    assert!(!signals.is_asserted(DetectionKind::Voice));
    assert!(!signals.is_asserted(DetectionKind::Carrier));
}

#[test]
fn signal_levels_are_independent() {
    let signals = DetectionSignals::new();
    signals.set(DetectionKind::Carrier, true);
    assert_eq!(
        signals.snapshot(),
        SignalState {
            voice: false,
            carrier: true
        }
    );
    signals.set(DetectionKind::Voice, true);
    signals.set(DetectionKind::Carrier, false);
    assert!(signals.is_asserted(DetectionKind::Voice));
    assert!(!signals.is_asserted(DetectionKind::Carrier));
}

#[test]
fn state_bits() {
    assert_eq!(SignalState::default().to_bits(), 0);
    let both = SignalState {
        voice: true,
        carrier: true,
    };
    assert_eq!(both.to_bits(), 0b11);
    let cos = SignalState {
        voice: false,
        carrier: true,
    };
    assert_eq!(cos.to_bits(), 0b10);
}

#[test]
fn watcher_reports_changes_once() {
    let signals = DetectionSignals::new();
    let mut watcher = SignalWatcher::new();
    assert_eq!(watcher.poll(&signals), None);

    signals.set(DetectionKind::Voice, true);
    let state = watcher.poll(&signals).unwrap();
    assert!(state.voice);
    assert_eq!(watcher.poll(&signals), None);

    signals.set(DetectionKind::Voice, false);
    assert_eq!(watcher.poll(&signals), Some(SignalState::default()));
}

#[test]
fn watcher_skips_pulse_between_polls() {
    let signals = DetectionSignals::new();
    let mut watcher = SignalWatcher::new();

    signals.set(DetectionKind::Carrier, true);
    signals.set(DetectionKind::Carrier, false);
    assert_eq!(watcher.poll(&signals), None);
    assert_eq!(signals.sequence(), 2);
}
