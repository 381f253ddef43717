//! Settings Register Tests
//!
//! Tests for the register map, applying settings and diagnostics.
//! Run with: cargo test --test settings_tests

use usb_radio_audio::audio::shared::AudioShared;
use usb_radio_audio::error::Error;
use usb_radio_audio::settings::{
    self, AnalogFrontend, RegisterBank, RegisterId, RegisterStore, Settings,
};
use usb_radio_audio::types::{DetectionKind, HoldTime, InputGain, OutputLevel, Volume};

/// Front-end mock remembering the last selection
#[derive(Default)]
struct MockFrontend {
    gain: Option<InputGain>,
    level: Option<OutputLevel>,
    updates: usize,
}

impl AnalogFrontend for MockFrontend {
    fn set_input_gain(&mut self, gain: InputGain) {
        self.gain = Some(gain);
        self.updates += 1;
    }

    fn set_output_level(&mut self, level: OutputLevel) {
        self.level = Some(level);
        self.updates += 1;
    }
}

/// Store that hands back whatever was put in, bypassing validation
struct RawStore([u32; 256]);

impl RegisterStore for RawStore {
    fn read(&self, id: RegisterId) -> u32 {
        self.0[usize::from(id.to_u8())]
    }

    fn write(&mut self, id: RegisterId, value: u32) -> Result<(), Error> {
        self.0[usize::from(id.to_u8())] = value;
        Ok(())
    }

    fn update_diagnostic(&mut self, id: RegisterId, value: u32) {
        self.0[usize::from(id.to_u8())] = value;
    }
}

impl RawStore {
    fn with_defaults() -> Self {
        let mut store = Self([0; 256]);
        for id in RegisterId::ALL {
            store.0[usize::from(id.to_u8())] = id.default_value();
        }
        store
    }
}

// =============================================================================
// Register Map
// =============================================================================

#[test]
fn addresses_roundtrip() {
    for id in RegisterId::ALL {
        assert_eq!(RegisterId::from_u8(id.to_u8()), Some(id));
    }
    assert_eq!(RegisterId::from_u8(0x00), None);
    assert_eq!(RegisterId::from_u8(0x46), None);
    assert_eq!(RegisterId::from_u8(0x6A), None);
}

#[test]
fn diagnostics_are_read_only() {
    let writable = RegisterId::ALL.iter().filter(|id| id.is_writable()).count();
    assert_eq!(writable, 10);
    assert!(!RegisterId::DetectState.is_writable());
    assert!(RegisterId::VcosHold.is_writable());
}

#[test]
fn bank_starts_with_defaults() {
    let bank = RegisterBank::new();
    assert_eq!(bank.read(RegisterId::RxVolume), 0);
    assert_eq!(bank.read(RegisterId::RxGain), 1);
    assert_eq!(bank.read(RegisterId::VpttHold), 20 << 4);
    assert_eq!(bank.read(RegisterId::VcosHold), 100 << 4);
    assert_eq!(bank.read(RegisterId::PlaybackUnderruns), 0);
}

#[test]
fn write_rejects_read_only_register() {
    let mut bank = RegisterBank::new();
    assert_eq!(
        bank.write(RegisterId::CaptureOverruns, 5),
        Err(Error::ReadOnlyRegister(0x61))
    );
    assert_eq!(bank.read(RegisterId::CaptureOverruns), 0);
}

#[test]
fn write_rejects_invalid_values() {
    let mut bank = RegisterBank::new();
    for (id, value) in [
        (RegisterId::RxVolume, 97),
        (RegisterId::TxMute, 2),
        (RegisterId::RxGain, 3),
        (RegisterId::TxLevel, 2),
        (RegisterId::VpttHold, 0x1_0000),
    ] {
        assert_eq!(
            bank.write(id, value),
            Err(Error::InvalidValue {
                register: id.to_u8(),
                value
            })
        );
        assert_eq!(bank.read(id), id.default_value());
    }
}

#[test]
fn raw_address_access() {
    let mut bank = RegisterBank::new();
    assert_eq!(bank.write_raw(0x42, 12), Ok(()));
    assert_eq!(bank.read_raw(0x42), Ok(12));
    assert_eq!(bank.read(RegisterId::TxVolume), 12);

    assert_eq!(bank.write_raw(0x30, 1), Err(Error::InvalidRegister(0x30)));
    assert_eq!(bank.read_raw(0xFF), Err(Error::InvalidRegister(0xFF)));
}

// =============================================================================
// Applying Settings
// =============================================================================

#[test]
fn defaults_decode() {
    let settings = Settings::load(&RegisterBank::new()).unwrap();
    assert_eq!(settings.rx_volume, Volume::UNITY);
    assert!(!settings.tx_mute);
    assert_eq!(settings.rx_gain, InputGain::X1);
    assert_eq!(settings.tx_level, OutputLevel::Line);
    assert_eq!(settings.vptt_hold, HoldTime::from_millis(20));
}

#[test]
fn apply_publishes_to_audio_core() {
    let shared = AudioShared::new();
    let mut bank = RegisterBank::new();
    let mut frontend = MockFrontend::default();

    bank.write(RegisterId::RxVolume, 10).unwrap();
    bank.write(RegisterId::TxMute, 1).unwrap();
    bank.write(RegisterId::RxGain, 8).unwrap();
    bank.write(RegisterId::TxLevel, 1).unwrap();
    bank.write(RegisterId::VpttThreshold, 3000).unwrap();
    bank.write(RegisterId::VcosHold, 5 << 4).unwrap();

    settings::apply(&bank, &shared, &mut frontend).unwrap();

    assert_eq!(shared.capture.gain.volume(), Volume::from_db(-10));
    assert!(!shared.capture.gain.is_muted());
    assert!(shared.playback.gain.is_muted());
    assert_eq!(shared.playback.detector.threshold(), 3000);
    assert_eq!(shared.capture.detector.hold().as_millis(), 5);
    assert_eq!(frontend.gain, Some(InputGain::X8));
    assert_eq!(frontend.level, Some(OutputLevel::Mic));
}

#[test]
fn invalid_store_contents_apply_nothing() {
    let shared = AudioShared::new();
    let mut store = RawStore::with_defaults();
    let mut frontend = MockFrontend::default();
    store.write(RegisterId::RxVolume, 40).unwrap();
    store.write(RegisterId::RxGain, 5).unwrap();

    assert_eq!(
        settings::apply(&store, &shared, &mut frontend),
        Err(Error::InvalidValue {
            register: 0x44,
            value: 5
        })
    );
    assert_eq!(shared.capture.gain.volume(), Volume::UNITY);
    assert_eq!(frontend.updates, 0);
}

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn diagnostics_reflect_audio_core() {
    let shared = AudioShared::new();
    let mut bank = RegisterBank::new();

    shared.playback_queue.pop_or_silence();
    shared.playback_queue.pop_or_silence();
    for s in 0..3 {
        shared.capture_queue.push(s);
    }
    shared.signals.set(DetectionKind::Carrier, true);

    settings::publish_diagnostics(&shared, &mut bank);

    assert_eq!(bank.read(RegisterId::PlaybackUnderruns), 2);
    assert_eq!(bank.read(RegisterId::CaptureFill), 3);
    assert_eq!(bank.read(RegisterId::PlaybackFill), 0);
    assert_eq!(bank.read(RegisterId::DetectState), 0b10);
    assert_eq!(bank.read(RegisterId::FeedbackAnomalies), 0);
}

#[test]
fn diagnostics_still_read_only_after_publish() {
    let shared = AudioShared::new();
    let mut bank = RegisterBank::new();
    settings::publish_diagnostics(&shared, &mut bank);
    assert!(bank.write(RegisterId::DetectState, 0).is_err());
}
