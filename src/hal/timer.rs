//! Timer Abstractions
//!
//! Sample-rate timers for the capture (TIM3) and playback (TIM6) ticks,
//! and the free-running TIM2 counter that is captured on every USB
//! start-of-frame for the clock feedback.

use embassy_stm32::pac;
use embassy_stm32::peripherals::{TIM2, TIM3, TIM6};
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::{InputTISelection, Timer, TriggerSource};
use embassy_stm32::timer::Channel;

use crate::clock::SampleTimer;
use crate::config::MASTER_CLOCK_HZ;
use crate::types::Direction;

/// The two sample timers, running from the 72 MHz timer clock
pub struct SampleTimers<'d> {
    capture: Timer<'d, TIM3>,
    playback: Timer<'d, TIM6>,
}

impl<'d> SampleTimers<'d> {
    /// Create both timers with their update interrupt enabled
    #[must_use]
    pub fn new(capture: Timer<'d, TIM3>, playback: Timer<'d, TIM6>) -> Self {
        capture.enable_update_interrupt(true);
        playback.enable_update_interrupt(true);
        Self { capture, playback }
    }
}

impl SampleTimer for SampleTimers<'_> {
    fn program(&mut self, direction: Direction, divider: u32) {
        let regs = match direction {
            Direction::Capture => self.capture.regs_core(),
            Direction::Playback => self.playback.regs_core(),
        };
        let reload = divider.saturating_sub(1).min(u32::from(u16::MAX)) as u16;

        regs.psc().write_value(0);
        regs.arr().write(|r| r.set_arr(reload));
        // Load PSC/ARR without firing the tick handler
        regs.cr1().modify(|r| r.set_urs(pac::timer::vals::Urs::COUNTER_ONLY));
        regs.egr().write(|r| r.set_ug(true));
    }

    fn start(&mut self, direction: Direction) {
        match direction {
            Direction::Capture => self.capture.start(),
            Direction::Playback => self.playback.start(),
        }
    }

    fn stop(&mut self, direction: Direction) {
        match direction {
            Direction::Capture => self.capture.stop(),
            Direction::Playback => self.playback.stop(),
        }
    }
}

/// Clear a sample timer's update flag from its interrupt handler
#[inline]
pub fn acknowledge(direction: Direction) {
    match direction {
        Direction::Capture => pac::TIM3.sr().modify(|r| r.set_uif(false)),
        Direction::Playback => pac::TIM6.sr().modify(|r| r.set_uif(false)),
    }
}

/// Master clock counter latched at USB start-of-frame
///
/// Owning the timer keeps TIM2 reserved; the handler reads it through
/// [`latch_frame`].
pub struct FrameCounter<'d> {
    _timer: Timer<'d, TIM2>,
}

impl<'d> FrameCounter<'d> {
    const CHANNEL: Channel = Channel::Ch1;

    /// Run TIM2 at the master clock and capture it on the SOF trigger
    #[must_use]
    pub fn new(timer: Timer<'d, TIM2>) -> Self {
        timer.set_tick_freq(Hertz(MASTER_CLOCK_HZ));
        timer.set_trigger_source(TriggerSource::ITR1);
        timer.set_input_ti_selection(Self::CHANNEL, InputTISelection::TRC);
        timer.set_input_capture_prescaler(Self::CHANNEL, 0);

        timer.regs_gp32().sr().write(|r| r.0 = 0);
        timer.enable_channel(Self::CHANNEL, true);
        timer.enable_input_interrupt(Self::CHANNEL, true);
        timer.start();

        Self { _timer: timer }
    }
}

/// Captured TIM2 value, if a frame boundary occurred
///
/// Called from the TIM2 handler; only touches the timer registers.
#[inline]
pub fn latch_frame() -> Option<u32> {
    let regs = pac::TIM2;
    let status = regs.sr().read();
    regs.sr().modify(|r| r.set_tif(false));

    if status.ccif(0) {
        Some(regs.ccr(0).read())
    } else {
        None
    }
}
