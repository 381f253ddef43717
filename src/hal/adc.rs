//! ADC Driver
//!
//! Radio receive audio on ADC1. Each capture tick collects the previous
//! conversion and starts the next one, so the converter never stalls the
//! tick handler.

use embassy_stm32::adc::{Adc, SampleTime};
use embassy_stm32::pac;
use embassy_stm32::peripherals::ADC1;

use crate::audio::InputConverter;
use crate::types::Sample;

/// ADC reading result
#[derive(Clone, Copy, Debug)]
pub struct AdcReading {
    /// Raw 12-bit ADC value (0-4095)
    raw: u16,
}

impl AdcReading {
    /// Create a new ADC reading from raw value
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw: raw & 0x0FFF }
    }

    /// Get the raw 12-bit value
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.raw
    }

    /// Convert offset-binary to a signed 16-bit audio sample
    #[must_use]
    pub const fn as_i16(self) -> Sample {
        ((self.raw as i32 - 2048) * 16) as Sample
    }
}

impl defmt::Format for AdcReading {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ADC({})", self.raw);
    }
}

/// Audio ADC driver for receiving radio audio
pub struct AudioAdc<'d> {
    _adc: Adc<'d, ADC1>,
}

impl<'d> AudioAdc<'d> {
    /// Take over an initialised ADC1 with the audio input on channel 1
    #[must_use]
    pub fn new(mut adc: Adc<'d, ADC1>) -> Self {
        adc.set_sample_time(SampleTime::CYCLES19_5);

        let regs = pac::ADC1;
        regs.sqr1().modify(|w| {
            w.set_l(0);
            w.set_sq(0, 1);
        });
        regs.cr().modify(|w| w.set_adstart(true));

        Self { _adc: adc }
    }
}

impl InputConverter for AudioAdc<'_> {
    #[inline]
    fn read(&mut self) -> Sample {
        let regs = pac::ADC1;
        let raw = regs.dr().read().rdata();
        regs.cr().modify(|w| w.set_adstart(true));
        AdcReading::from_raw(raw).as_i16()
    }
}
