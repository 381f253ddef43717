//! GPIO Abstractions
//!
//! Type-safe wrappers for the analog front-end selectors and the detection
//! signal outputs of the radio interface.

use embassy_stm32::gpio::Output;

use crate::router::SignalState;
use crate::settings::AnalogFrontend;
use crate::types::{InputGain, OutputLevel};

/// Input gain stage selector
///
/// Controls the 5-step programmable gain amplifier using 3 GPIO pins for
/// binary selection (0 = 1×, 4 = 16×).
pub struct GainSelector<'d> {
    sel0: Output<'d>,
    sel1: Output<'d>,
    sel2: Output<'d>,
    current: InputGain,
}

impl<'d> GainSelector<'d> {
    /// Create gain selector (initially 1×)
    #[must_use]
    pub fn new(sel0: Output<'d>, sel1: Output<'d>, sel2: Output<'d>) -> Self {
        let mut selector = Self {
            sel0,
            sel1,
            sel2,
            current: InputGain::X1,
        };
        selector.select(InputGain::X1);
        selector
    }

    /// Select a gain stage
    pub fn select(&mut self, gain: InputGain) {
        self.current = gain;
        let code = gain.multiplier().trailing_zeros();

        set_level(&mut self.sel0, code & 0x01 != 0);
        set_level(&mut self.sel1, code & 0x02 != 0);
        set_level(&mut self.sel2, code & 0x04 != 0);
    }

    /// Currently selected stage
    #[must_use]
    pub const fn current(&self) -> InputGain {
        self.current
    }
}

/// Line/mic output level switch
pub struct LevelSwitch<'d> {
    pin: Output<'d>,
    level: OutputLevel,
}

impl<'d> LevelSwitch<'d> {
    /// Create the switch (starts at line level)
    #[must_use]
    pub fn new(mut pin: Output<'d>) -> Self {
        pin.set_low();
        Self {
            pin,
            level: OutputLevel::Line,
        }
    }

    /// Switch the output attenuator
    pub fn set(&mut self, level: OutputLevel) {
        set_level(&mut self.pin, level == OutputLevel::Mic);
        self.level = level;
    }

    /// Current level
    #[must_use]
    pub const fn level(&self) -> OutputLevel {
        self.level
    }
}

/// Analog stages around the converters
pub struct Frontend<'d> {
    gain: GainSelector<'d>,
    level: LevelSwitch<'d>,
}

impl<'d> Frontend<'d> {
    /// Combine the selectors
    #[must_use]
    pub const fn new(gain: GainSelector<'d>, level: LevelSwitch<'d>) -> Self {
        Self { gain, level }
    }
}

impl AnalogFrontend for Frontend<'_> {
    fn set_input_gain(&mut self, gain: InputGain) {
        if self.gain.current() != gain {
            debug!("frontend: input gain {}", gain);
            self.gain.select(gain);
        }
    }

    fn set_output_level(&mut self, level: OutputLevel) {
        if self.level.level() != level {
            debug!("frontend: output level {}", level);
            self.level.set(level);
        }
    }
}

/// PTT and COS lines driven from the detection signals
pub struct SignalOutputs<'d> {
    ptt: Output<'d>,
    cos: Output<'d>,
}

impl<'d> SignalOutputs<'d> {
    /// Create the outputs (both released)
    #[must_use]
    pub fn new(mut ptt: Output<'d>, mut cos: Output<'d>) -> Self {
        ptt.set_low();
        cos.set_low();
        Self { ptt, cos }
    }

    /// Mirror a signal snapshot onto the pins
    pub fn apply(&mut self, state: SignalState) {
        set_level(&mut self.ptt, state.voice);
        set_level(&mut self.cos, state.carrier);
    }
}

fn set_level(pin: &mut Output<'_>, high: bool) {
    if high {
        pin.set_high();
    } else {
        pin.set_low();
    }
}
