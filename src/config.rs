//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the radio interface hardware.
//! Clock frequencies, buffer sizes and register defaults are centralized here.

use crate::audio::feedback::FeedbackRefresh;
use crate::types::SampleRate;

/// Master clock feeding the sample timers (STM32F302 @ 72MHz)
pub const MASTER_CLOCK_HZ: u32 = 72_000_000;

/// USB full-speed frame rate (1 ms frames)
pub const USB_FRAMES_PER_SECOND: u32 = 1_000;

/// Nominal master clock cycles in one USB frame
pub const CYCLES_PER_FRAME: u32 = MASTER_CLOCK_HZ / USB_FRAMES_PER_SECOND;

/// Software buffer per direction in bytes
pub const AUDIO_BUFFER_BYTES: usize = 1024;

/// Bytes per mono 16-bit sample
pub const SAMPLE_BYTES: usize = 2;

/// Sample queue capacity (512 samples at 16-bit mono)
pub const QUEUE_CAPACITY: usize = AUDIO_BUFFER_BYTES / SAMPLE_BYTES;

/// Queue fill the feedback loop steers towards
pub const QUEUE_TARGET_FILL: usize = QUEUE_CAPACITY / 2;

/// Value substituted for missing or muted samples
pub const SILENCE: i16 = 0;

/// Rate both directions start at after reset
pub const DEFAULT_SAMPLE_RATE: SampleRate = SampleRate::Hz48000;

/// Largest USB audio packet in samples (48 kHz plus one pacing sample)
pub const MAX_PACKET_SAMPLES: usize = 49;

/// Largest USB audio packet in bytes
pub const MAX_PACKET_BYTES: usize = MAX_PACKET_SAMPLES * SAMPLE_BYTES;

/// Feedback endpoint measurement period (full-speed UAC1 needs at least 2 ms)
pub const FEEDBACK_REFRESH: FeedbackRefresh = FeedbackRefresh::Period8Frames;

/// A frame measurement may deviate from nominal by `nominal / N` cycles
pub const FEEDBACK_TOLERANCE_DIVISOR: u32 = 128;

/// Feedback correction in format LSBs per sample of queue fill error
pub const FILL_ERROR_GAIN: i64 = 1;

/// Capture packets gain or lose a sample outside target ± this fill
pub const CAPTURE_PACING_MARGIN: usize = QUEUE_CAPACITY / 4;

/// Default voice (PTT) detection threshold, sample magnitude
pub const DEFAULT_VPTT_THRESHOLD: u16 = 0x0800;

/// Default voice (PTT) hold time, 12.4 fixed-point milliseconds (20 ms)
pub const DEFAULT_VPTT_HOLD: u16 = 20 << 4;

/// Default carrier (COS) detection threshold, sample magnitude
pub const DEFAULT_VCOS_THRESHOLD: u16 = 0x0400;

/// Default carrier (COS) hold time, 12.4 fixed-point milliseconds (100 ms)
pub const DEFAULT_VCOS_HOLD: u16 = 100 << 4;

/// Default capture attenuation in dB
pub const DEFAULT_RX_ATTENUATION_DB: u8 = 0;

/// Default playback attenuation in dB
pub const DEFAULT_TX_ATTENUATION_DB: u8 = 0;

/// Settings task poll period in milliseconds
pub const SETTINGS_POLL_MS: u64 = 10;

/// Pending stream lifecycle events between the USB stack and the state machine
pub const STREAM_EVENT_DEPTH: usize = 8;

/// Latched frame boundaries waiting for the feedback controller
pub const FRAME_BOUNDARY_DEPTH: usize = 4;

/// USB VID (pid.codes test VID)
pub const USB_VID: u16 = 0x1209;

/// USB PID
pub const USB_PID: u16 = 0x7388;

/// Timer assignments
pub mod timers {
    //! Hardware timer assignments

    /// Capture sample timer (ADC trigger)
    pub const CAPTURE_SAMPLE: u8 = 3;

    /// Playback sample timer (DAC trigger)
    pub const PLAYBACK_SAMPLE: u8 = 6;

    /// Free-running master clock counter latched at each USB frame
    pub const FRAME_COUNTER: u8 = 2;

    /// Embassy time driver
    pub const TIME_DRIVER: u8 = 15;
}

/// Pin assignments
pub mod pins {
    //! GPIO pin assignments matching the schematic

    /// Radio receive audio (ADC input)
    pub const AUDIO_IN: &str = "PA0";

    /// Radio transmit audio (DAC output)
    pub const AUDIO_OUT: &str = "PA4";

    /// Input gain selector bit 0
    pub const GAIN_SEL0: &str = "PB0";

    /// Input gain selector bit 1
    pub const GAIN_SEL1: &str = "PB1";

    /// Input gain selector bit 2
    pub const GAIN_SEL2: &str = "PB2";

    /// Line/mic output level switch
    pub const LEVEL_SEL: &str = "PB10";

    /// PTT output to the radio
    pub const PTT_OUT: &str = "PB12";

    /// COS output to the host side
    pub const COS_OUT: &str = "PB13";

    /// USB D+ (handled by USB peripheral)
    pub const USB_DP: &str = "PA12";

    /// USB D- (handled by USB peripheral)
    pub const USB_DM: &str = "PA11";
}
