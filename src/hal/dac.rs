//! DAC Driver
//!
//! Radio transmit audio on DAC1 channel 1, written once per playback tick.

use embassy_stm32::dac::{DacCh1, Instance, Value};

use crate::audio::OutputConverter;
use crate::types::Sample;

/// Audio output sample
#[derive(Clone, Copy, Debug)]
pub struct DacSample {
    /// 12-bit DAC value (0-4095)
    value: u16,
}

impl DacSample {
    /// Create from raw 12-bit value
    #[must_use]
    pub const fn from_raw(value: u16) -> Self {
        Self {
            value: if value > 4095 { 4095 } else { value },
        }
    }

    /// Create from signed 16-bit audio
    #[must_use]
    pub const fn from_i16(sample: Sample) -> Self {
        let shifted = (sample as i32 + 32768) / 16;
        Self::from_raw(shifted as u16)
    }

    /// Get the raw 12-bit value
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.value
    }

    /// Convert to embassy DAC value
    #[must_use]
    pub const fn as_dac_value(self) -> Value {
        Value::Bit12Right(self.value)
    }
}

impl Default for DacSample {
    fn default() -> Self {
        Self::from_raw(2048) // Mid-scale (0V with bias)
    }
}

impl defmt::Format for DacSample {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "DAC({})", self.value);
    }
}

/// Audio DAC output driver
pub struct AudioDac<'d, T: Instance> {
    channel: DacCh1<'d, T>,
}

impl<'d, T: Instance> AudioDac<'d, T> {
    /// Create the driver and park the output at mid-scale
    #[must_use]
    pub fn new(mut channel: DacCh1<'d, T>) -> Self {
        channel.set(DacSample::default().as_dac_value());
        Self { channel }
    }
}

impl<T: Instance> OutputConverter for AudioDac<'_, T> {
    #[inline]
    fn write(&mut self, sample: Sample) {
        self.channel.set(DacSample::from_i16(sample).as_dac_value());
    }
}
