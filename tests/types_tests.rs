//! Domain Type Tests
//!
//! Tests for sample rates, volumes, hold times and feedback encodings.
//! Run with: cargo test --test types_tests

use usb_radio_audio::audio::gain::scale;
use usb_radio_audio::types::*;

// =============================================================================
// Sample Rate Tests
// =============================================================================

#[test]
fn rate_lookup_roundtrips_for_supported_rates() {
    for rate in SampleRate::ALL {
        assert_eq!(SampleRate::from_hz(rate.as_hz()), Some(rate));
    }
}

#[test]
fn unsupported_rates_rejected() {
    assert_eq!(SampleRate::from_hz(44_100), None);
    assert_eq!(SampleRate::from_hz(96_000), None);
    assert_eq!(SampleRate::from_hz(0), None);
}

#[test]
fn frequency_control_payload() {
    // 48000 = 0x00BB80, 8000 = 0x001F40
    assert_eq!(
        SampleRate::from_freq_control(&[0x80, 0xBB, 0x00]),
        Some(SampleRate::Hz48000)
    );
    assert_eq!(
        SampleRate::from_freq_control(&[0x40, 0x1F, 0x00, 0xFF]),
        Some(SampleRate::Hz8000)
    );
    // 44100 is not offered
    assert_eq!(SampleRate::from_freq_control(&[0x44, 0xAC, 0x00]), None);
    assert_eq!(SampleRate::from_freq_control(&[0x80, 0xBB]), None);
    assert_eq!(SampleRate::from_freq_control(&[]), None);
}

#[test]
fn timer_dividers_from_72mhz() {
    assert_eq!(SampleRate::Hz48000.timer_divider(), 1500);
    assert_eq!(SampleRate::Hz32000.timer_divider(), 2250);
    assert_eq!(SampleRate::Hz24000.timer_divider(), 3000);
    assert_eq!(SampleRate::Hz22050.timer_divider(), 3265);
    assert_eq!(SampleRate::Hz16000.timer_divider(), 4500);
    assert_eq!(SampleRate::Hz12000.timer_divider(), 6000);
    assert_eq!(SampleRate::Hz11025.timer_divider(), 6531);
    assert_eq!(SampleRate::Hz8000.timer_divider(), 9000);
}

#[test]
fn six_rates_are_exact() {
    let exact = SampleRate::ALL
        .iter()
        .filter(|r| r.error_ppm() == 0)
        .count();
    assert_eq!(exact, 6);
}

#[test]
fn fractional_rates_within_documented_error() {
    let e22 = SampleRate::Hz22050.error_ppm();
    let e11 = SampleRate::Hz11025.error_ppm();
    assert!((4..=95).contains(&e22.abs()), "22.05 kHz error {e22} ppm");
    assert!((4..=95).contains(&e11.abs()), "11.025 kHz error {e11} ppm");
}

#[test]
fn default_rate_is_48k() {
    assert_eq!(SampleRate::default(), SampleRate::Hz48000);
}

// =============================================================================
// Volume Tests
// =============================================================================

#[test]
fn volume_clamps_to_range() {
    assert_eq!(Volume::from_db(10).as_db(), 0);
    assert_eq!(Volume::from_db(-200).as_db(), -96);
    assert_eq!(Volume::from_db(-20).as_db(), -20);
}

#[test]
fn volume_attenuation_encoding() {
    assert_eq!(Volume::from_attenuation(0), Volume::UNITY);
    assert_eq!(Volume::from_attenuation(30).as_db(), -30);
    assert_eq!(Volume::from_attenuation(500).as_db(), -96);
    assert_eq!(Volume::from_db(-12).attenuation(), 12);
}

#[test]
fn uac_volume_rounds_to_whole_db() {
    assert_eq!(Volume::from_uac(0).as_db(), 0);
    assert_eq!(Volume::from_uac(-256 * 6).as_db(), -6);
    assert_eq!(Volume::from_uac(-256 * 6 - 100).as_db(), -6);
    assert_eq!(Volume::from_uac(-256 * 6 - 200).as_db(), -7);
    assert_eq!(Volume::from_uac(i16::MIN).as_db(), -96);
    assert_eq!(Volume::from_uac(256 * 10).as_db(), 0);
    assert_eq!(Volume::from_db(-3).as_uac(), -768);
}

#[test]
fn unity_volume_is_exact() {
    assert_eq!(Volume::UNITY.linear_q15(), Volume::UNITY_Q15);
    for s in [i16::MIN, -1, 0, 1, 1000, i16::MAX] {
        assert_eq!(scale(s, Volume::UNITY.linear_q15()), s);
    }
}

#[test]
fn volume_factor_monotonic() {
    let mut previous = Volume::UNITY.linear_q15();
    for db in (-96..0).rev() {
        let factor = Volume::from_db(db).linear_q15();
        assert!(factor <= previous, "{db} dB not monotonic");
        previous = factor;
    }
}

#[test]
fn minus_six_db_is_about_half() {
    let factor = Volume::from_db(-6).linear_q15();
    assert!((16_300..16_500).contains(&factor), "factor {factor}");
}

#[test]
fn scaled_magnitude_never_exceeds_input() {
    let samples = [i16::MIN, -20_000, -1, 0, 1, 12_345, i16::MAX];
    for db in -96..=0 {
        let factor = Volume::from_db(db).linear_q15();
        for s in samples {
            let out = scale(s, factor);
            assert!(
                out.unsigned_abs() <= s.unsigned_abs(),
                "{s} at {db} dB gave {out}"
            );
        }
    }
}

// =============================================================================
// Hold Time Tests
// =============================================================================

#[test]
fn hold_time_fixed_point() {
    let hold = HoldTime::from_bits(20 << 4);
    assert_eq!(hold.as_millis(), 20);
    assert_eq!(HoldTime::from_millis(20), hold);
    assert_eq!(HoldTime::from_bits(0x18).to_bits(), 0x18); // 1.5 ms
}

#[test]
fn hold_time_saturates() {
    assert_eq!(HoldTime::from_millis(10_000).as_millis(), 4095);
}

#[test]
fn hold_ticks_at_rate() {
    let hold = HoldTime::from_millis(10);
    assert_eq!(hold.ticks_at(SampleRate::Hz48000), 480);
    assert_eq!(hold.ticks_at(SampleRate::Hz8000), 80);
    assert_eq!(HoldTime::from_bits(0x18).ticks_at(SampleRate::Hz16000), 24);
    assert_eq!(HoldTime::from_millis(100).ticks_at(SampleRate::Hz22050), 2205);
}

// =============================================================================
// Feedback Format Tests
// =============================================================================

#[test]
fn feedback_formats() {
    assert_eq!(FeedbackFormat::default(), FeedbackFormat::Q16_16);
    assert_eq!(FeedbackFormat::Q16_16.frac_bits(), 16);
    assert_eq!(FeedbackFormat::Q10_14.frac_bits(), 14);
    assert_eq!(FeedbackFormat::Q16_16.wire_len(), 4);
    assert_eq!(FeedbackFormat::Q10_14.wire_len(), 3);
}

#[test]
fn feedback_wire_encoding_16_16() {
    let value = FeedbackValue {
        format: FeedbackFormat::Q16_16,
        bits: 48 << 16,
    };
    assert_eq!(value.to_bytes().as_slice(), &[0x00, 0x00, 0x30, 0x00]);
}

#[test]
fn feedback_wire_encoding_10_14() {
    let value = FeedbackValue {
        format: FeedbackFormat::Q10_14,
        bits: 48 << 14,
    };
    assert_eq!(value.to_bytes().as_slice(), &[0x00, 0x00, 0x0C]);
}

#[test]
fn feedback_normalises_to_16_16() {
    let a = FeedbackValue {
        format: FeedbackFormat::Q10_14,
        bits: (441 << 14) / 10,
    };
    let b = FeedbackValue {
        format: FeedbackFormat::Q16_16,
        bits: (441 << 16) / 10,
    };
    let a = i64::from(a.samples_per_frame().to_bits());
    let b = i64::from(b.samples_per_frame().to_bits());
    assert!((a - b).abs() <= 4);
}

// =============================================================================
// Front-end Encoding Tests
// =============================================================================

#[test]
fn input_gain_register_values() {
    for (value, gain) in [
        (1, InputGain::X1),
        (2, InputGain::X2),
        (4, InputGain::X4),
        (8, InputGain::X8),
        (16, InputGain::X16),
    ] {
        assert_eq!(InputGain::from_register(value), Some(gain));
        assert_eq!(gain.multiplier(), value);
    }
    assert_eq!(InputGain::from_register(3), None);
    assert_eq!(InputGain::from_register(0), None);
}

#[test]
fn output_level_register_values() {
    assert_eq!(OutputLevel::from_register(0), Some(OutputLevel::Line));
    assert_eq!(OutputLevel::from_register(1), Some(OutputLevel::Mic));
    assert_eq!(OutputLevel::from_register(2), None);
    assert_eq!(OutputLevel::Mic.to_register(), 1);
}

#[test]
fn direction_indices() {
    assert_eq!(Direction::Capture.index(), 0);
    assert_eq!(Direction::Playback.index(), 1);
    assert_eq!(Direction::ALL, [Direction::Capture, Direction::Playback]);
}
