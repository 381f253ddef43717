//! Settings register map
//!
//! The settings collaborator owns a flat map of 32-bit registers. The core
//! reads the writable ones synchronously, pushes them into the atomically
//! readable scalars the tick handlers use, and refreshes the read-only
//! diagnostic registers.

use heapless::LinearMap;

use crate::audio::shared::AudioShared;
use crate::config::{
    DEFAULT_RX_ATTENUATION_DB, DEFAULT_TX_ATTENUATION_DB, DEFAULT_VCOS_HOLD,
    DEFAULT_VCOS_THRESHOLD, DEFAULT_VPTT_HOLD, DEFAULT_VPTT_THRESHOLD,
};
use crate::error::{Error, Result};
use crate::types::{HoldTime, InputGain, OutputLevel, Volume};

/// Register identifiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum RegisterId {
    /// Capture attenuation in dB (0..=96)
    RxVolume,
    /// Capture mute (0/1)
    RxMute,
    /// Playback attenuation in dB (0..=96)
    TxVolume,
    /// Playback mute (0/1)
    TxMute,
    /// Input gain stage multiplier (1, 2, 4, 8, 16)
    RxGain,
    /// Output level (0 line, 1 mic)
    TxLevel,
    /// Voice detection threshold
    VpttThreshold,
    /// Voice hold time, 12.4 ms
    VpttHold,
    /// Carrier detection threshold
    VcosThreshold,
    /// Carrier hold time, 12.4 ms
    VcosHold,
    /// Playback underruns
    PlaybackUnderruns,
    /// Capture overruns
    CaptureOverruns,
    /// Playback overruns
    PlaybackOverruns,
    /// Smallest feedback value
    FeedbackMin,
    /// Largest feedback value
    FeedbackMax,
    /// Mean feedback value
    FeedbackAvg,
    /// Rejected clock measurements
    FeedbackAnomalies,
    /// Capture queue fill
    CaptureFill,
    /// Playback queue fill
    PlaybackFill,
    /// Detection outputs, bit 0 PTT, bit 1 COS
    DetectState,
}

impl RegisterId {
    /// Every register, writable ones first
    pub const ALL: [Self; 20] = [
        Self::RxVolume,
        Self::RxMute,
        Self::TxVolume,
        Self::TxMute,
        Self::RxGain,
        Self::TxLevel,
        Self::VpttThreshold,
        Self::VpttHold,
        Self::VcosThreshold,
        Self::VcosHold,
        Self::PlaybackUnderruns,
        Self::CaptureOverruns,
        Self::PlaybackOverruns,
        Self::FeedbackMin,
        Self::FeedbackMax,
        Self::FeedbackAvg,
        Self::FeedbackAnomalies,
        Self::CaptureFill,
        Self::PlaybackFill,
        Self::DetectState,
    ];

    /// Decode a register address
    #[must_use]
    pub const fn from_u8(id: u8) -> Option<Self> {
        Some(match id {
            0x40 => Self::RxVolume,
            0x41 => Self::RxMute,
            0x42 => Self::TxVolume,
            0x43 => Self::TxMute,
            0x44 => Self::RxGain,
            0x45 => Self::TxLevel,
            0x50 => Self::VpttThreshold,
            0x51 => Self::VpttHold,
            0x52 => Self::VcosThreshold,
            0x53 => Self::VcosHold,
            0x60 => Self::PlaybackUnderruns,
            0x61 => Self::CaptureOverruns,
            0x62 => Self::PlaybackOverruns,
            0x63 => Self::FeedbackMin,
            0x64 => Self::FeedbackMax,
            0x65 => Self::FeedbackAvg,
            0x66 => Self::FeedbackAnomalies,
            0x67 => Self::CaptureFill,
            0x68 => Self::PlaybackFill,
            0x69 => Self::DetectState,
            _ => return None,
        })
    }

    /// Register address
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::RxVolume => 0x40,
            Self::RxMute => 0x41,
            Self::TxVolume => 0x42,
            Self::TxMute => 0x43,
            Self::RxGain => 0x44,
            Self::TxLevel => 0x45,
            Self::VpttThreshold => 0x50,
            Self::VpttHold => 0x51,
            Self::VcosThreshold => 0x52,
            Self::VcosHold => 0x53,
            Self::PlaybackUnderruns => 0x60,
            Self::CaptureOverruns => 0x61,
            Self::PlaybackOverruns => 0x62,
            Self::FeedbackMin => 0x63,
            Self::FeedbackMax => 0x64,
            Self::FeedbackAvg => 0x65,
            Self::FeedbackAnomalies => 0x66,
            Self::CaptureFill => 0x67,
            Self::PlaybackFill => 0x68,
            Self::DetectState => 0x69,
        }
    }

    /// Diagnostic registers are read-only
    #[must_use]
    pub const fn is_writable(self) -> bool {
        self.to_u8() < 0x60
    }

    /// Power-on value
    #[must_use]
    pub const fn default_value(self) -> u32 {
        match self {
            Self::RxVolume => DEFAULT_RX_ATTENUATION_DB as u32,
            Self::TxVolume => DEFAULT_TX_ATTENUATION_DB as u32,
            Self::RxGain => 1,
            Self::VpttThreshold => DEFAULT_VPTT_THRESHOLD as u32,
            Self::VpttHold => DEFAULT_VPTT_HOLD as u32,
            Self::VcosThreshold => DEFAULT_VCOS_THRESHOLD as u32,
            Self::VcosHold => DEFAULT_VCOS_HOLD as u32,
            _ => 0,
        }
    }

    /// Check a value against the register's encoding
    ///
    /// # Errors
    ///
    /// [`Error::InvalidValue`] if the value cannot be decoded.
    pub fn validate(self, value: u32) -> Result<()> {
        let ok = match self {
            Self::RxVolume | Self::TxVolume => value <= 96,
            Self::RxMute | Self::TxMute => value <= 1,
            Self::RxGain => InputGain::from_register(value).is_some(),
            Self::TxLevel => OutputLevel::from_register(value).is_some(),
            Self::VpttThreshold | Self::VpttHold | Self::VcosThreshold | Self::VcosHold => {
                value <= u32::from(u16::MAX)
            }
            _ => true,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::InvalidValue {
                register: self.to_u8(),
                value,
            })
        }
    }
}

/// Key-value register store owned by the settings collaborator
pub trait RegisterStore {
    /// Read a register
    fn read(&self, id: RegisterId) -> u32;

    /// Write a register on behalf of the host
    ///
    /// # Errors
    ///
    /// Rejects read-only registers and undecodable values.
    fn write(&mut self, id: RegisterId, value: u32) -> Result<()>;

    /// Refresh a read-only diagnostic register
    fn update_diagnostic(&mut self, id: RegisterId, value: u32);
}

/// In-memory register store
pub struct RegisterBank {
    registers: LinearMap<RegisterId, u32, 20>,
}

impl RegisterBank {
    /// Bank holding the power-on defaults
    #[must_use]
    pub fn new() -> Self {
        let mut registers = LinearMap::new();
        for id in RegisterId::ALL {
            let _ = registers.insert(id, id.default_value());
        }
        Self { registers }
    }

    /// Write by raw address
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRegister`] for unmapped addresses, otherwise as
    /// [`RegisterStore::write`].
    pub fn write_raw(&mut self, address: u8, value: u32) -> Result<()> {
        let id = RegisterId::from_u8(address).ok_or(Error::InvalidRegister(address))?;
        self.write(id, value)
    }

    /// Read by raw address
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRegister`] for unmapped addresses.
    pub fn read_raw(&self, address: u8) -> Result<u32> {
        let id = RegisterId::from_u8(address).ok_or(Error::InvalidRegister(address))?;
        Ok(self.read(id))
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterStore for RegisterBank {
    fn read(&self, id: RegisterId) -> u32 {
        self.registers.get(&id).copied().unwrap_or(0)
    }

    fn write(&mut self, id: RegisterId, value: u32) -> Result<()> {
        if !id.is_writable() {
            return Err(Error::ReadOnlyRegister(id.to_u8()));
        }
        id.validate(value)?;
        let _ = self.registers.insert(id, value);
        Ok(())
    }

    fn update_diagnostic(&mut self, id: RegisterId, value: u32) {
        let _ = self.registers.insert(id, value);
    }
}

/// Analog stages around the converters
pub trait AnalogFrontend {
    /// Select the input gain stage
    fn set_input_gain(&mut self, gain: InputGain);

    /// Select the output level
    fn set_output_level(&mut self, level: OutputLevel);
}

/// Decoded writable registers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Capture volume
    pub rx_volume: Volume,
    /// Capture mute
    pub rx_mute: bool,
    /// Playback volume
    pub tx_volume: Volume,
    /// Playback mute
    pub tx_mute: bool,
    /// Input gain stage
    pub rx_gain: InputGain,
    /// Output level
    pub tx_level: OutputLevel,
    /// Voice detection threshold
    pub vptt_threshold: u16,
    /// Voice hold time
    pub vptt_hold: HoldTime,
    /// Carrier detection threshold
    pub vcos_threshold: u16,
    /// Carrier hold time
    pub vcos_hold: HoldTime,
}

impl Settings {
    /// Read and decode every writable register
    ///
    /// # Errors
    ///
    /// [`Error::InvalidValue`] for the first register that does not decode;
    /// nothing is applied in that case.
    pub fn load<S: RegisterStore + ?Sized>(store: &S) -> Result<Self> {
        let read = |id: RegisterId| -> Result<u32> {
            let value = store.read(id);
            id.validate(value)?;
            Ok(value)
        };
        let half = |id: RegisterId| -> Result<u16> {
            let value = read(id)?;
            u16::try_from(value).map_err(|_| Error::InvalidValue {
                register: id.to_u8(),
                value,
            })
        };
        let invalid = |id: RegisterId| Error::InvalidValue {
            register: id.to_u8(),
            value: store.read(id),
        };

        Ok(Self {
            rx_volume: Volume::from_attenuation(read(RegisterId::RxVolume)?),
            rx_mute: read(RegisterId::RxMute)? != 0,
            tx_volume: Volume::from_attenuation(read(RegisterId::TxVolume)?),
            tx_mute: read(RegisterId::TxMute)? != 0,
            rx_gain: InputGain::from_register(store.read(RegisterId::RxGain))
                .ok_or_else(|| invalid(RegisterId::RxGain))?,
            tx_level: OutputLevel::from_register(store.read(RegisterId::TxLevel))
                .ok_or_else(|| invalid(RegisterId::TxLevel))?,
            vptt_threshold: half(RegisterId::VpttThreshold)?,
            vptt_hold: HoldTime::from_bits(half(RegisterId::VpttHold)?),
            vcos_threshold: half(RegisterId::VcosThreshold)?,
            vcos_hold: HoldTime::from_bits(half(RegisterId::VcosHold)?),
        })
    }

    /// Publish to the tick handlers and the analog front-end
    pub fn apply_to<F: AnalogFrontend + ?Sized>(&self, shared: &AudioShared, frontend: &mut F) {
        shared.capture.gain.set_volume(self.rx_volume);
        shared.capture.gain.set_muted(self.rx_mute);
        shared.playback.gain.set_volume(self.tx_volume);
        shared.playback.gain.set_muted(self.tx_mute);

        shared.playback.detector.set_threshold(self.vptt_threshold);
        shared.playback.detector.set_hold(self.vptt_hold);
        shared.capture.detector.set_threshold(self.vcos_threshold);
        shared.capture.detector.set_hold(self.vcos_hold);

        frontend.set_input_gain(self.rx_gain);
        frontend.set_output_level(self.tx_level);
    }
}

/// Load the register store and publish it to the audio core
///
/// # Errors
///
/// See [`Settings::load`].
pub fn apply<S, F>(store: &S, shared: &AudioShared, frontend: &mut F) -> Result<()>
where
    S: RegisterStore + ?Sized,
    F: AnalogFrontend + ?Sized,
{
    let settings = Settings::load(store)?;
    settings.apply_to(shared, frontend);
    debug!(
        "settings: rx {} tx {} mute {}/{}",
        settings.rx_volume,
        settings.tx_volume,
        settings.rx_mute,
        settings.tx_mute
    );
    Ok(())
}

/// Refresh the read-only diagnostic registers
pub fn publish_diagnostics<S: RegisterStore + ?Sized>(shared: &AudioShared, store: &mut S) {
    let diag = shared.diagnostics();
    store.update_diagnostic(RegisterId::PlaybackUnderruns, diag.playback_underruns);
    store.update_diagnostic(RegisterId::CaptureOverruns, diag.capture_overruns);
    store.update_diagnostic(RegisterId::PlaybackOverruns, diag.playback_overruns);
    store.update_diagnostic(RegisterId::FeedbackMin, diag.feedback_min);
    store.update_diagnostic(RegisterId::FeedbackMax, diag.feedback_max);
    store.update_diagnostic(RegisterId::FeedbackAvg, diag.feedback_average);
    store.update_diagnostic(RegisterId::FeedbackAnomalies, diag.feedback_anomalies);
    store.update_diagnostic(RegisterId::CaptureFill, diag.capture_fill);
    store.update_diagnostic(RegisterId::PlaybackFill, diag.playback_fill);
    store.update_diagnostic(RegisterId::DetectState, diag.signals.to_bits());
}
