//! Configuration and Constants Tests
//!
//! Tests to verify configuration values are valid and consistent.
//! Run with: cargo test --test config_tests

use usb_radio_audio::config::*;
use usb_radio_audio::settings::RegisterId;
use usb_radio_audio::types::{HoldTime, SampleRate};

// =============================================================================
// Clock Tests
// =============================================================================

#[test]
fn master_clock_valid() {
    // STM32F302 max clock is 72 MHz
    assert_eq!(MASTER_CLOCK_HZ, 72_000_000);
}

#[test]
fn full_speed_frame_rate() {
    assert_eq!(USB_FRAMES_PER_SECOND, 1_000);
    assert_eq!(CYCLES_PER_FRAME, 72_000);
}

#[test]
fn dividers_fit_16_bit_timers() {
    for rate in SampleRate::ALL {
        let divider = rate.timer_divider();
        assert!(divider > 1 && divider - 1 <= u32::from(u16::MAX), "{rate:?}");
    }
}

// =============================================================================
// Queue Configuration Tests
// =============================================================================

#[test]
fn queue_capacity_power_of_two() {
    assert!(QUEUE_CAPACITY.is_power_of_two());
    assert_eq!(QUEUE_CAPACITY * SAMPLE_BYTES, AUDIO_BUFFER_BYTES);
}

#[test]
fn target_fill_is_half_capacity() {
    assert_eq!(QUEUE_TARGET_FILL * 2, QUEUE_CAPACITY);
}

#[test]
fn pacing_margin_inside_queue() {
    assert!(CAPTURE_PACING_MARGIN < QUEUE_TARGET_FILL);
}

#[test]
fn silence_is_zero() {
    assert_eq!(SILENCE, 0);
}

// =============================================================================
// USB Configuration Tests
// =============================================================================

#[test]
fn max_packet_holds_fastest_rate_plus_one() {
    let fastest = SampleRate::ALL.iter().map(|r| r.as_hz()).max().unwrap();
    let per_frame = (fastest / USB_FRAMES_PER_SECOND) as usize;
    assert!(MAX_PACKET_SAMPLES > per_frame);
    assert_eq!(MAX_PACKET_BYTES, MAX_PACKET_SAMPLES * 2);
}

#[test]
fn feedback_refresh_at_least_two_frames() {
    assert!(FEEDBACK_REFRESH.frame_count() >= 2);
}

#[test]
fn feedback_tolerance_under_one_percent() {
    assert!(CYCLES_PER_FRAME / FEEDBACK_TOLERANCE_DIVISOR < CYCLES_PER_FRAME / 100);
}

#[test]
fn usb_ids_set() {
    assert_eq!(USB_VID, 0x1209);
    assert_ne!(USB_PID, 0);
}

// =============================================================================
// Default Register Tests
// =============================================================================

#[test]
fn default_rate_is_48k() {
    assert_eq!(DEFAULT_SAMPLE_RATE, SampleRate::Hz48000);
}

#[test]
fn default_hold_times() {
    assert_eq!(HoldTime::from_bits(DEFAULT_VPTT_HOLD).as_millis(), 20);
    assert_eq!(HoldTime::from_bits(DEFAULT_VCOS_HOLD).as_millis(), 100);
}

#[test]
fn default_registers_validate() {
    for id in RegisterId::ALL {
        assert_eq!(id.validate(id.default_value()), Ok(()), "{id:?}");
    }
}

#[test]
fn defaults_start_unattenuated() {
    assert_eq!(DEFAULT_RX_ATTENUATION_DB, 0);
    assert_eq!(DEFAULT_TX_ATTENUATION_DB, 0);
}

// =============================================================================
// Timer Assignment Tests
// =============================================================================

#[test]
fn timers_unique() {
    let timers = [
        timers::CAPTURE_SAMPLE,
        timers::PLAYBACK_SAMPLE,
        timers::FRAME_COUNTER,
        timers::TIME_DRIVER,
    ];
    for (i, a) in timers.iter().enumerate() {
        for b in &timers[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn pins_unique() {
    let pins = [
        pins::AUDIO_IN,
        pins::AUDIO_OUT,
        pins::GAIN_SEL0,
        pins::GAIN_SEL1,
        pins::GAIN_SEL2,
        pins::LEVEL_SEL,
        pins::PTT_OUT,
        pins::COS_OUT,
        pins::USB_DP,
        pins::USB_DM,
    ];
    for (i, a) in pins.iter().enumerate() {
        for b in &pins[i + 1..] {
            assert_ne!(a, b);
        }
    }
}
