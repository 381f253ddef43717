//! Sample clock source
//!
//! Two independent periodic timers, one per direction, each dividing the
//! master clock down to the negotiated sample rate. A rate change for a
//! streaming direction is held back until the stream stops so a timer is
//! never reprogrammed mid-burst.

use crate::types::{Direction, SampleRate};

/// Hardware timers that trigger the tick handlers
pub trait SampleTimer {
    /// Program the period of a direction's timer in master clock cycles
    fn program(&mut self, direction: Direction, divider: u32);

    /// Start a direction's timer
    fn start(&mut self, direction: Direction);

    /// Stop a direction's timer
    fn stop(&mut self, direction: Direction);
}

/// Per-direction rate bookkeeping over a [`SampleTimer`]
pub struct SampleClockSource<T: SampleTimer> {
    timer: T,
    current: [SampleRate; 2],
    pending: [Option<SampleRate>; 2],
    streaming: [bool; 2],
}

impl<T: SampleTimer> SampleClockSource<T> {
    /// Program and start both timers at `rate`
    pub fn new(mut timer: T, rate: SampleRate) -> Self {
        for direction in Direction::ALL {
            timer.program(direction, rate.timer_divider());
            timer.start(direction);
        }
        Self {
            timer,
            current: [rate; 2],
            pending: [None; 2],
            streaming: [false; 2],
        }
    }

    /// Rate the timer currently runs at
    #[must_use]
    pub fn rate(&self, direction: Direction) -> SampleRate {
        self.current[direction.index()]
    }

    /// Rate waiting for the stream to stop, if any
    #[must_use]
    pub fn pending(&self, direction: Direction) -> Option<SampleRate> {
        self.pending[direction.index()]
    }

    /// Request a rate
    ///
    /// Applied at once when the direction is not streaming, otherwise
    /// deferred. Returns `true` if the timer was reprogrammed.
    pub fn set_rate(&mut self, direction: Direction, rate: SampleRate) -> bool {
        let i = direction.index();
        if self.streaming[i] {
            debug!("clock: deferring {} for {}", rate, direction);
            self.pending[i] = Some(rate);
            return false;
        }
        self.pending[i] = None;
        self.apply(direction, rate);
        true
    }

    /// Mark the direction as streaming; rate requests are deferred from now
    pub fn begin_stream(&mut self, direction: Direction) {
        self.streaming[direction.index()] = true;
    }

    /// Mark the direction idle and apply any deferred rate
    pub fn end_stream(&mut self, direction: Direction) -> Option<SampleRate> {
        let i = direction.index();
        self.streaming[i] = false;
        let rate = self.pending[i].take()?;
        self.apply(direction, rate);
        Some(rate)
    }

    /// Access the underlying timers
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    fn apply(&mut self, direction: Direction, rate: SampleRate) {
        if self.current[direction.index()] == rate {
            return;
        }
        self.timer.stop(direction);
        self.timer.program(direction, rate.timer_divider());
        self.timer.start(direction);
        self.current[direction.index()] = rate;
        debug!("clock: {} now {} (divider {})", direction, rate, rate.timer_divider());
    }
}
