//! State shared between the priority levels
//!
//! Everything here is reachable through `&AudioShared` and made of
//! single-word atomics or SPSC queues, so a `static` instance can be read
//! and written from every interrupt level without locks.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::audio::arbiter::OutputArbiter;
use crate::audio::detect::DetectorParams;
use crate::audio::feedback::FeedbackShared;
use crate::audio::gain::GainControl;
use crate::audio::queue::SampleQueue;
use crate::config::{
    DEFAULT_SAMPLE_RATE, DEFAULT_VCOS_HOLD, DEFAULT_VCOS_THRESHOLD, DEFAULT_VPTT_HOLD,
    DEFAULT_VPTT_THRESHOLD, QUEUE_CAPACITY,
};
use crate::router::{DetectionSignals, SignalState};
use crate::types::{Direction, SampleRate};

/// Queue type used for both directions
pub type AudioQueue = SampleQueue<QUEUE_CAPACITY>;

/// Per-direction stream state
pub struct DirectionShared {
    /// Volume and mute
    pub gain: GainControl,
    /// Detection parameters for this direction's detector
    pub detector: DetectorParams,
    rate_hz: AtomicU32,
    active: AtomicBool,
    /// Bumped on every activation
    epoch: AtomicU32,
}

impl DirectionShared {
    const fn new(threshold: u16, hold_bits: u16) -> Self {
        Self {
            gain: GainControl::new(),
            detector: DetectorParams::new(threshold, hold_bits),
            rate_hz: AtomicU32::new(DEFAULT_SAMPLE_RATE.as_hz()),
            active: AtomicBool::new(false),
            epoch: AtomicU32::new(0),
        }
    }

    /// Rate the sample timer currently runs at
    #[must_use]
    pub fn rate(&self) -> SampleRate {
        SampleRate::from_hz(self.rate_hz.load(Ordering::Relaxed)).unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    pub(crate) fn set_rate(&self, rate: SampleRate) {
        self.rate_hz.store(rate.as_hz(), Ordering::Relaxed);
    }

    /// Check if the host streams in this direction
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// Activation generation
    #[must_use]
    pub fn epoch(&self) -> u32 {
        self.epoch.load(Ordering::Acquire)
    }

    pub(crate) fn bump_epoch(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }
}

/// Read-only diagnostic snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub struct Diagnostics {
    /// Silence substituted on the host→playback queue
    pub playback_underruns: u32,
    /// Samples dropped on the capture→host queue
    pub capture_overruns: u32,
    /// Samples dropped on the host→playback queue
    pub playback_overruns: u32,
    /// Smallest feedback value this session
    pub feedback_min: u32,
    /// Largest feedback value this session
    pub feedback_max: u32,
    /// Mean feedback value this session
    pub feedback_average: u32,
    /// Implausible clock measurements
    pub feedback_anomalies: u32,
    /// Samples waiting for the host
    pub capture_fill: u32,
    /// Samples waiting for the output converter
    pub playback_fill: u32,
    /// Detection outputs
    pub signals: SignalState,
}

/// The audio core's shared state
pub struct AudioShared {
    /// Radio → host direction
    pub capture: DirectionShared,
    /// Host → radio direction
    pub playback: DirectionShared,
    /// Samples waiting for the USB IN endpoint
    pub capture_queue: AudioQueue,
    /// Samples waiting for the output converter
    pub playback_queue: AudioQueue,
    /// PTT and COS levels
    pub signals: DetectionSignals,
    /// Output converter ownership
    pub output: OutputArbiter,
    /// Feedback endpoint state
    pub feedback: FeedbackShared,
}

impl AudioShared {
    /// Power-on state: both directions inactive at the default rate
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capture: DirectionShared::new(DEFAULT_VCOS_THRESHOLD, DEFAULT_VCOS_HOLD),
            playback: DirectionShared::new(DEFAULT_VPTT_THRESHOLD, DEFAULT_VPTT_HOLD),
            capture_queue: SampleQueue::new(),
            playback_queue: SampleQueue::new(),
            signals: DetectionSignals::new(),
            output: OutputArbiter::new(),
            feedback: FeedbackShared::new(),
        }
    }

    /// Shared state for one direction
    #[must_use]
    pub const fn direction(&self, direction: Direction) -> &DirectionShared {
        match direction {
            Direction::Capture => &self.capture,
            Direction::Playback => &self.playback,
        }
    }

    /// Queue for one direction
    #[must_use]
    pub const fn queue(&self, direction: Direction) -> &AudioQueue {
        match direction {
            Direction::Capture => &self.capture_queue,
            Direction::Playback => &self.playback_queue,
        }
    }

    /// Whether the playback path may drive the output converter
    #[must_use]
    pub fn is_output_owned_by_audio(&self) -> bool {
        self.output.is_owned_by_audio()
    }

    /// Collect the diagnostic counters
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            playback_underruns: self.playback_queue.underruns(),
            capture_overruns: self.capture_queue.overruns(),
            playback_overruns: self.playback_queue.overruns(),
            feedback_min: self.feedback.min(),
            feedback_max: self.feedback.max(),
            feedback_average: self.feedback.average(),
            feedback_anomalies: self.feedback.anomalies(),
            capture_fill: self.capture_queue.len() as u32,
            playback_fill: self.playback_queue.len() as u32,
            signals: self.signals.snapshot(),
        }
    }
}

impl Default for AudioShared {
    fn default() -> Self {
        Self::new()
    }
}
