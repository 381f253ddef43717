//! Rate and interface state machine
//!
//! Driven by the USB stack's lifecycle callbacks at the lowest priority.
//! Each direction moves `Inactive → Configuring → Active → Inactive`;
//! `Configuring` reprograms the sample timer and discards stale queue
//! contents before the tick handlers see the stream as active again.
//!
//! The state machine also hands out the output converter: playback and
//! the beacon generator each acquire it here, at transitions only.

use crate::audio::arbiter::OutputOwner;
use crate::audio::shared::AudioShared;
use crate::clock::{SampleClockSource, SampleTimer};
use crate::config::DEFAULT_SAMPLE_RATE;
use crate::error::{Error, Result};
use crate::types::{Direction, SampleRate};

/// Stream state of one direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum StreamState {
    /// Host is not streaming
    #[default]
    Inactive,
    /// Clock and queues are being reset
    Configuring,
    /// Tick handlers move samples
    Active,
}

/// Outcome of an activation request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum Activation {
    /// The stream is active
    Started,
    /// Playback waits for the beacon to release the output converter
    Deferred,
}

/// Per-direction stream control
pub struct StreamControl<'a, T: SampleTimer> {
    shared: &'a AudioShared,
    clock: SampleClockSource<T>,
    state: [StreamState; 2],
    /// Playback activation waiting for the beacon to finish
    deferred: Option<SampleRate>,
}

impl<'a, T: SampleTimer> StreamControl<'a, T> {
    /// Start both sample timers at the default rate, streams inactive
    pub fn new(shared: &'a AudioShared, timer: T) -> Self {
        for direction in Direction::ALL {
            shared.direction(direction).set_rate(DEFAULT_SAMPLE_RATE);
        }
        Self {
            shared,
            clock: SampleClockSource::new(timer, DEFAULT_SAMPLE_RATE),
            state: [StreamState::Inactive; 2],
            deferred: None,
        }
    }

    /// Current state of a direction
    #[must_use]
    pub fn state(&self, direction: Direction) -> StreamState {
        self.state[direction.index()]
    }

    /// Rate a direction's timer runs at
    #[must_use]
    pub fn rate(&self, direction: Direction) -> SampleRate {
        self.clock.rate(direction)
    }

    /// Playback activation waiting for the output converter
    #[must_use]
    pub const fn deferred_playback(&self) -> Option<SampleRate> {
        self.deferred
    }

    /// Clock source
    #[must_use]
    pub const fn clock(&self) -> &SampleClockSource<T> {
        &self.clock
    }

    /// Clock source, mutable
    pub fn clock_mut(&mut self) -> &mut SampleClockSource<T> {
        &mut self.clock
    }

    /// Host selected the streaming alternate setting
    ///
    /// An unsupported rate is rejected before anything changes. Playback
    /// is deferred while the beacon owns the output converter. Activating
    /// an already active direction restarts it.
    pub fn on_interface_activate(&mut self, direction: Direction, hz: u32) -> Result<Activation> {
        let rate = SampleRate::from_hz(hz).ok_or(Error::InvalidRate(hz))?;

        if self.state(direction) != StreamState::Inactive {
            self.stop(direction);
        }

        if direction == Direction::Playback
            && !self.shared.output.try_acquire(OutputOwner::Audio)
        {
            info!("stream: playback at {} deferred, beacon owns output", rate);
            self.deferred = Some(rate);
            return Ok(Activation::Deferred);
        }

        self.start(direction, rate);
        Ok(Activation::Started)
    }

    /// Host selected the zero-bandwidth alternate setting
    pub fn on_interface_deactivate(&mut self, direction: Direction) {
        if direction == Direction::Playback && self.deferred.take().is_some() {
            debug!("stream: deferred playback activation dropped");
        }
        if self.state(direction) != StreamState::Inactive {
            self.stop(direction);
        }
    }

    /// USB bus reset: everything stops, the next session renegotiates
    pub fn on_bus_reset(&mut self) {
        info!("stream: bus reset");
        self.deferred = None;
        for direction in Direction::ALL {
            if self.state(direction) != StreamState::Inactive {
                self.stop(direction);
            }
        }
    }

    /// Host asked for a new rate on a direction
    ///
    /// An active stream is cycled through `Inactive → Configuring →
    /// Active` so no sample of the old rate survives in the queue.
    pub fn on_rate_change_request(&mut self, direction: Direction, hz: u32) -> Result<()> {
        let rate = SampleRate::from_hz(hz).ok_or(Error::InvalidRate(hz))?;

        match self.state(direction) {
            StreamState::Active | StreamState::Configuring => {
                debug!("stream: {} rate change to {} while active", direction, rate);
                self.stop(direction);
                if direction == Direction::Playback
                    && !self.shared.output.try_acquire(OutputOwner::Audio)
                {
                    self.deferred = Some(rate);
                    return Ok(());
                }
                self.start(direction, rate);
            }
            StreamState::Inactive => {
                if direction == Direction::Playback && self.deferred.is_some() {
                    self.deferred = Some(rate);
                }
                self.clock.set_rate(direction, rate);
                self.shared.direction(direction).set_rate(rate);
            }
        }
        Ok(())
    }

    /// Beacon generator wants the output converter
    ///
    /// # Errors
    ///
    /// [`Error::OutputBusy`] unless playback is inactive.
    pub fn acquire_beacon(&mut self) -> Result<()> {
        if self.state(Direction::Playback) != StreamState::Inactive
            || !self.shared.output.try_acquire(OutputOwner::Beacon)
        {
            return Err(Error::OutputBusy);
        }
        debug!("stream: beacon owns output");
        Ok(())
    }

    /// Beacon generator is done; completes a deferred playback activation
    pub fn release_beacon(&mut self) -> Option<Activation> {
        if !self.shared.output.release(OutputOwner::Beacon) {
            return None;
        }
        debug!("stream: beacon released output");

        let rate = self.deferred.take()?;
        if !self.shared.output.try_acquire(OutputOwner::Audio) {
            self.deferred = Some(rate);
            return Some(Activation::Deferred);
        }
        self.start(Direction::Playback, rate);
        Some(Activation::Started)
    }

    fn start(&mut self, direction: Direction, rate: SampleRate) {
        let stream = self.shared.direction(direction);
        self.state[direction.index()] = StreamState::Configuring;

        self.clock.set_rate(direction, rate);
        stream.set_rate(rate);
        self.shared.queue(direction).clear();
        stream.bump_epoch();
        if direction == Direction::Playback {
            self.shared.feedback.request_reset();
        }

        self.clock.begin_stream(direction);
        stream.set_active(true);
        self.state[direction.index()] = StreamState::Active;
        info!("stream: {} active at {}", direction, rate);
    }

    fn stop(&mut self, direction: Direction) {
        let stream = self.shared.direction(direction);
        stream.set_active(false);
        self.shared.queue(direction).clear();
        if let Some(rate) = self.clock.end_stream(direction) {
            stream.set_rate(rate);
        }
        if direction == Direction::Playback {
            self.shared.output.release(OutputOwner::Audio);
        }
        self.state[direction.index()] = StreamState::Inactive;
        info!("stream: {} inactive", direction);
    }
}
