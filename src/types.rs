//! Shared types used across the audio core
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time and provide type safety throughout the codebase.

use core::fmt;

use fixed::types::{U12F4, U16F16};
#[cfg(feature = "embedded")]
use micromath::F32Ext;

use crate::config::MASTER_CLOCK_HZ;

/// One mono 16-bit PCM sample
pub type Sample = i16;

/// Streaming direction as seen from the radio side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum Direction {
    /// Radio → input converter → USB host (microphone interface)
    Capture,
    /// USB host → output converter → radio (speaker interface)
    Playback,
}

impl Direction {
    /// Both directions, capture first
    pub const ALL: [Self; 2] = [Self::Capture, Self::Playback];

    /// Index for per-direction tables
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Capture => 0,
            Self::Playback => 1,
        }
    }
}

/// Supported sample rates
///
/// The set is closed: the USB descriptors only advertise these rates, so
/// anything else reaching the core is a protocol error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SampleRate {
    /// 48 kHz
    Hz48000,
    /// 32 kHz
    Hz32000,
    /// 24 kHz
    Hz24000,
    /// 22.05 kHz
    Hz22050,
    /// 16 kHz
    Hz16000,
    /// 12 kHz
    Hz12000,
    /// 11.025 kHz
    Hz11025,
    /// 8 kHz
    Hz8000,
}

impl SampleRate {
    /// All rates in descriptor order
    pub const ALL: [Self; 8] = [
        Self::Hz48000,
        Self::Hz32000,
        Self::Hz24000,
        Self::Hz22050,
        Self::Hz16000,
        Self::Hz12000,
        Self::Hz11025,
        Self::Hz8000,
    ];

    /// Look up a rate by its value in Hz
    #[must_use]
    pub const fn from_hz(hz: u32) -> Option<Self> {
        match hz {
            48_000 => Some(Self::Hz48000),
            32_000 => Some(Self::Hz32000),
            24_000 => Some(Self::Hz24000),
            22_050 => Some(Self::Hz22050),
            16_000 => Some(Self::Hz16000),
            12_000 => Some(Self::Hz12000),
            11_025 => Some(Self::Hz11025),
            8_000 => Some(Self::Hz8000),
            _ => None,
        }
    }

    /// Rate from a UAC1 sampling frequency control payload
    ///
    /// The control carries three little-endian bytes; anything shorter or
    /// naming an unsupported rate yields `None`.
    #[must_use]
    pub fn from_freq_control(data: &[u8]) -> Option<Self> {
        let [b0, b1, b2, ..] = *data else {
            return None;
        };
        Self::from_hz(u32::from_le_bytes([b0, b1, b2, 0]))
    }

    /// Nominal rate in Hz
    #[must_use]
    pub const fn as_hz(self) -> u32 {
        match self {
            Self::Hz48000 => 48_000,
            Self::Hz32000 => 32_000,
            Self::Hz24000 => 24_000,
            Self::Hz22050 => 22_050,
            Self::Hz16000 => 16_000,
            Self::Hz12000 => 12_000,
            Self::Hz11025 => 11_025,
            Self::Hz8000 => 8_000,
        }
    }

    /// Timer divider from the master clock, rounded to nearest
    #[must_use]
    pub const fn timer_divider(self) -> u32 {
        let hz = self.as_hz();
        (MASTER_CLOCK_HZ + hz / 2) / hz
    }

    /// Rate the timer actually produces, in millihertz
    #[must_use]
    pub const fn actual_millihertz(self) -> u32 {
        ((MASTER_CLOCK_HZ as u64 * 1000) / self.timer_divider() as u64) as u32
    }

    /// Deviation of the produced rate from nominal in parts per million
    #[must_use]
    pub const fn error_ppm(self) -> i32 {
        let nominal = self.as_hz() as i64 * 1000;
        let actual = self.actual_millihertz() as i64;
        ((actual - nominal) * 1_000_000 / nominal) as i32
    }

    /// Nominal samples in one USB frame, in millisamples
    #[must_use]
    pub const fn millisamples_per_frame(self) -> u32 {
        self.as_hz()
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::Hz48000
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SampleRate {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} Hz", self.as_hz());
    }
}

/// Volume in whole decibels, −96 dB to 0 dB
///
/// The core only attenuates, never amplifies.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Volume(i8);

impl Volume {
    /// Quietest setting
    pub const MIN_DB: i8 = -96;

    /// Loudest setting (unity gain)
    pub const MAX_DB: i8 = 0;

    /// Unity gain
    pub const UNITY: Self = Self(0);

    /// Linear factor for unity gain in Q15
    pub const UNITY_Q15: u16 = 1 << 15;

    /// Create from decibels, clamping into range
    #[must_use]
    pub const fn from_db(db: i16) -> Self {
        if db < Self::MIN_DB as i16 {
            Self(Self::MIN_DB)
        } else if db > Self::MAX_DB as i16 {
            Self(Self::MAX_DB)
        } else {
            Self(db as i8)
        }
    }

    /// Create from a positive attenuation in dB (register encoding)
    #[must_use]
    pub const fn from_attenuation(db: u32) -> Self {
        if db > 96 {
            Self(Self::MIN_DB)
        } else {
            Self(-(db as i8))
        }
    }

    /// Create from a USB audio class volume (1/256 dB steps), rounded
    #[must_use]
    pub const fn from_uac(raw: i16) -> Self {
        let raw = raw as i32;
        let db = if raw < 0 { (raw - 128) / 256 } else { (raw + 128) / 256 };
        Self::from_db(db as i16)
    }

    /// Volume in dB
    #[must_use]
    pub const fn as_db(self) -> i8 {
        self.0
    }

    /// Attenuation in dB (register encoding)
    #[must_use]
    pub const fn attenuation(self) -> u32 {
        (-(self.0 as i32)) as u32
    }

    /// Volume as a USB audio class value (1/256 dB steps)
    #[must_use]
    pub const fn as_uac(self) -> i16 {
        self.0 as i16 * 256
    }

    /// Linear multiplicative factor in Q15, never above unity
    #[must_use]
    pub fn linear_q15(self) -> u16 {
        if self.0 == 0 {
            return Self::UNITY_Q15;
        }
        let linear = 10.0_f32.powf(f32::from(self.0) / 20.0);
        let q15 = (linear * f32::from(Self::UNITY_Q15)) as u32;
        q15.min(u32::from(Self::UNITY_Q15)) as u16
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::UNITY
    }
}

impl fmt::Debug for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Volume({} dB)", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Volume {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} dB", self.0);
    }
}

/// Detection hold time in 12.4 fixed-point milliseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct HoldTime(U12F4);

impl HoldTime {
    /// Create from the raw 12.4 register encoding
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(U12F4::from_bits(bits))
    }

    /// Create from whole milliseconds, saturating at the 12-bit limit
    #[must_use]
    pub fn from_millis(ms: u16) -> Self {
        Self(U12F4::saturating_from_num(ms))
    }

    /// Raw 12.4 encoding
    #[must_use]
    pub const fn to_bits(self) -> u16 {
        self.0.to_bits()
    }

    /// Whole milliseconds (truncated)
    #[must_use]
    pub fn as_millis(self) -> u16 {
        self.0.to_num()
    }

    /// Hold time expressed in sample ticks at the given rate
    #[must_use]
    pub const fn ticks_at(self, rate: SampleRate) -> u32 {
        ((self.to_bits() as u64 * rate.as_hz() as u64) / 16_000) as u32
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for HoldTime {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}/16 ms", self.to_bits());
    }
}

/// Fixed-point encoding the host expects on the feedback endpoint
///
/// Chosen once per session by the USB stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum FeedbackFormat {
    /// 16.16 samples per frame, 4 bytes on the wire
    #[default]
    Q16_16,
    /// 10.14 samples per frame, 3 bytes on the wire (full-speed UAC1)
    Q10_14,
}

impl FeedbackFormat {
    /// Fractional bits
    #[must_use]
    pub const fn frac_bits(self) -> u32 {
        match self {
            Self::Q16_16 => 16,
            Self::Q10_14 => 14,
        }
    }

    /// Bytes on the wire
    #[must_use]
    pub const fn wire_len(self) -> usize {
        match self {
            Self::Q16_16 => 4,
            Self::Q10_14 => 3,
        }
    }

    /// Largest representable raw value
    #[must_use]
    pub const fn max_bits(self) -> u32 {
        match self {
            Self::Q16_16 => u32::MAX,
            Self::Q10_14 => (1 << 24) - 1,
        }
    }

    /// Encode for storage in an atomic
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Q16_16 => 0,
            Self::Q10_14 => 1,
        }
    }

    /// Decode from atomic storage
    #[must_use]
    pub const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Q10_14,
            _ => Self::Q16_16,
        }
    }
}

/// Feedback value as sent to the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedbackValue {
    /// Encoding of `bits`
    pub format: FeedbackFormat,
    /// Raw fixed-point samples per frame
    pub bits: u32,
}

impl FeedbackValue {
    /// Samples per frame normalized to 16.16
    #[must_use]
    pub fn samples_per_frame(self) -> U16F16 {
        let shift = 16 - self.format.frac_bits();
        U16F16::from_bits(self.bits << shift)
    }

    /// Little-endian wire encoding (3 or 4 bytes)
    #[must_use]
    pub fn to_bytes(self) -> heapless::Vec<u8, 4> {
        let mut out = heapless::Vec::new();
        for byte in self.bits.to_le_bytes().iter().take(self.format.wire_len()) {
            let _ = out.push(*byte);
        }
        out
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for FeedbackValue {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}: 0x{:08X}", self.format, self.bits);
    }
}

/// Analog input gain stage ahead of the converter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum InputGain {
    /// 1×
    #[default]
    X1,
    /// 2×
    X2,
    /// 4×
    X4,
    /// 8×
    X8,
    /// 16×
    X16,
}

impl InputGain {
    /// Decode the register value (the multiplier itself)
    #[must_use]
    pub const fn from_register(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::X1),
            2 => Some(Self::X2),
            4 => Some(Self::X4),
            8 => Some(Self::X8),
            16 => Some(Self::X16),
            _ => None,
        }
    }

    /// Multiplier
    #[must_use]
    pub const fn multiplier(self) -> u32 {
        match self {
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X4 => 4,
            Self::X8 => 8,
            Self::X16 => 16,
        }
    }
}

/// Analog output level after the converter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum OutputLevel {
    /// Full line level
    #[default]
    Line,
    /// Attenuated for a microphone input
    Mic,
}

impl OutputLevel {
    /// Decode the register value
    #[must_use]
    pub const fn from_register(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Line),
            1 => Some(Self::Mic),
            _ => None,
        }
    }

    /// Register encoding
    #[must_use]
    pub const fn to_register(self) -> u32 {
        match self {
            Self::Line => 0,
            Self::Mic => 1,
        }
    }
}

/// Signals derived from the audio stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum DetectionKind {
    /// Outgoing audio keys the transmitter (PTT)
    Voice,
    /// Incoming audio indicates a carrier (COS)
    Carrier,
}
