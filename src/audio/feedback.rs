//! Asynchronous clock feedback
//!
//! The sample timers run from the device master clock, the host paces
//! data by its USB frame clock. Once per measurement window the master
//! clock cycles elapsed since the previous frame boundary are turned into
//! a fixed-point samples-per-frame value for the feedback endpoint, then
//! biased by the host→playback queue fill so the queue stays centred.
//!
//! ```text
//!   reported = elapsed · rate / f_master  −  (fill − capacity/2)
//!              └──── raw, fixed-point ──┘     └─ LSBs of format ─┘
//! ```

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::audio::shared::AudioShared;
use crate::config::{
    CAPTURE_PACING_MARGIN, CYCLES_PER_FRAME, FEEDBACK_TOLERANCE_DIVISOR, FILL_ERROR_GAIN,
    MASTER_CLOCK_HZ, MAX_PACKET_SAMPLES, QUEUE_TARGET_FILL, USB_FRAMES_PER_SECOND,
};
use crate::types::{FeedbackFormat, FeedbackValue, SampleRate};

/// Frames spanned by one feedback measurement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum FeedbackRefresh {
    /// Every frame
    #[default]
    Period1Frame,
    /// Every 2 frames
    Period2Frames,
    /// Every 4 frames
    Period4Frames,
    /// Every 8 frames
    Period8Frames,
    /// Every 16 frames
    Period16Frames,
    /// Every 32 frames
    Period32Frames,
}

impl FeedbackRefresh {
    /// Frames per measurement
    #[must_use]
    pub const fn frame_count(self) -> u32 {
        match self {
            Self::Period1Frame => 1,
            Self::Period2Frames => 2,
            Self::Period4Frames => 4,
            Self::Period8Frames => 8,
            Self::Period16Frames => 16,
            Self::Period32Frames => 32,
        }
    }

    /// Log2 of the period, as used for `bRefresh`
    #[must_use]
    pub const fn exponent(self) -> u8 {
        self.frame_count().trailing_zeros() as u8
    }
}

/// Feedback state visible to lower priority contexts
pub struct FeedbackShared {
    format: AtomicU8,
    /// Bumped whenever the playback stream (re)activates
    epoch: AtomicU32,
    value: AtomicU32,
    min: AtomicU32,
    max: AtomicU32,
    average: AtomicU32,
    anomalies: AtomicU32,
}

impl FeedbackShared {
    /// Default format, no history
    #[must_use]
    pub const fn new() -> Self {
        Self {
            format: AtomicU8::new(0),
            epoch: AtomicU32::new(0),
            value: AtomicU32::new(0),
            min: AtomicU32::new(0),
            max: AtomicU32::new(0),
            average: AtomicU32::new(0),
            anomalies: AtomicU32::new(0),
        }
    }

    /// Format requested by the USB stack for this session
    #[must_use]
    pub fn format(&self) -> FeedbackFormat {
        FeedbackFormat::from_u8(self.format.load(Ordering::Relaxed))
    }

    /// Select the format (done once per session by the USB stack)
    pub fn set_format(&self, format: FeedbackFormat) {
        self.format.store(format.to_u8(), Ordering::Relaxed);
    }

    /// Current stream generation
    #[must_use]
    pub fn epoch(&self) -> u32 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Ask the controller to start over at its next frame boundary
    pub fn request_reset(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// Last reported value
    #[must_use]
    pub fn value(&self) -> FeedbackValue {
        FeedbackValue {
            format: self.format(),
            bits: self.value.load(Ordering::Relaxed),
        }
    }

    /// Smallest reported value this session
    #[must_use]
    pub fn min(&self) -> u32 {
        self.min.load(Ordering::Relaxed)
    }

    /// Largest reported value this session
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max.load(Ordering::Relaxed)
    }

    /// Mean reported value this session
    #[must_use]
    pub fn average(&self) -> u32 {
        self.average.load(Ordering::Relaxed)
    }

    /// Implausible measurements replaced by the last good value
    #[must_use]
    pub fn anomalies(&self) -> u32 {
        self.anomalies.load(Ordering::Relaxed)
    }
}

impl Default for FeedbackShared {
    fn default() -> Self {
        Self::new()
    }
}

/// Nominal samples per frame for a rate in a format
#[must_use]
pub const fn nominal_bits(rate: SampleRate, format: FeedbackFormat) -> u32 {
    (((rate.as_hz() as u64) << format.frac_bits()) / USB_FRAMES_PER_SECOND as u64) as u32
}

/// Measurements after which older ones start to fade from the average
const AVERAGE_SPAN: u32 = 1 << 24;

/// Feedback computation, owned by the frame-boundary context
pub struct FeedbackController<'a> {
    shared: &'a AudioShared,
    refresh: FeedbackRefresh,
    epoch: u32,
    /// Counter latched at the start of the current window
    window_start: Option<u32>,
    frames_in_window: u32,
    last_good: u32,
    sum: u64,
    count: u32,
    min: u32,
    max: u32,
}

impl<'a> FeedbackController<'a> {
    /// Create a controller measuring over `refresh` frames
    #[must_use]
    pub fn new(shared: &'a AudioShared, refresh: FeedbackRefresh) -> Self {
        let mut controller = Self {
            shared,
            refresh,
            epoch: shared.feedback.epoch(),
            window_start: None,
            frames_in_window: 0,
            last_good: 0,
            sum: 0,
            count: 0,
            min: u32::MAX,
            max: 0,
        };
        controller.reset();
        controller
    }

    /// Measurement period
    #[must_use]
    pub const fn refresh(&self) -> FeedbackRefresh {
        self.refresh
    }

    /// Last value that passed the plausibility check
    #[must_use]
    pub const fn last_good(&self) -> u32 {
        self.last_good
    }

    /// Forget all history and report nominal until the next measurement
    pub fn reset(&mut self) {
        let format = self.shared.feedback.format();
        let nominal = nominal_bits(self.shared.playback.rate(), format);

        self.epoch = self.shared.feedback.epoch();
        self.window_start = None;
        self.frames_in_window = 0;
        self.last_good = nominal;
        self.sum = 0;
        self.count = 0;
        self.min = u32::MAX;
        self.max = 0;

        let fb = &self.shared.feedback;
        fb.value.store(nominal, Ordering::Relaxed);
        fb.min.store(0, Ordering::Relaxed);
        fb.max.store(0, Ordering::Relaxed);
        fb.average.store(0, Ordering::Relaxed);
    }

    /// Handle one USB frame boundary with the latched master clock counter
    ///
    /// Returns a value to hand to the feedback endpoint at the end of each
    /// measurement window.
    pub fn on_frame_boundary(&mut self, counter: u32) -> Option<FeedbackValue> {
        self.sync_epoch();

        let Some(start) = self.window_start else {
            self.window_start = Some(counter);
            self.frames_in_window = 0;
            return None;
        };

        self.frames_in_window += 1;
        if self.frames_in_window < self.refresh.frame_count() {
            return None;
        }

        self.window_start = Some(counter);
        self.frames_in_window = 0;
        Some(self.measure(counter.wrapping_sub(start)))
    }

    /// Turn one window's elapsed master clock cycles into a feedback value
    pub fn measure(&mut self, elapsed: u32) -> FeedbackValue {
        self.sync_epoch();

        let format = self.shared.feedback.format();
        let rate = self.shared.playback.rate();
        let frames = self.refresh.frame_count();

        let expected = CYCLES_PER_FRAME * frames;
        let tolerance = expected / FEEDBACK_TOLERANCE_DIVISOR;

        let bits = if elapsed.abs_diff(expected) > tolerance {
            self.shared.feedback.anomalies.fetch_add(1, Ordering::Relaxed);
            warn!("feedback: implausible frame measurement {} cycles", elapsed);
            self.last_good
        } else {
            let raw = ((u64::from(elapsed) * u64::from(rate.as_hz())) << format.frac_bits())
                / (u64::from(MASTER_CLOCK_HZ) * u64::from(frames));
            let fill = self.shared.playback_queue.len() as i64;
            let fill_error = fill - QUEUE_TARGET_FILL as i64;

            let reported = (raw as i64 - fill_error * FILL_ERROR_GAIN)
                .clamp(0, i64::from(format.max_bits())) as u32;
            self.last_good = reported;
            reported
        };

        self.record(bits);
        FeedbackValue { format, bits }
    }

    fn sync_epoch(&mut self) {
        if self.shared.feedback.epoch() != self.epoch {
            debug!("feedback: stream restarted, resetting");
            self.reset();
        }
    }

    fn record(&mut self, bits: u32) {
        self.min = self.min.min(bits);
        self.max = self.max.max(bits);
        while self.count >= AVERAGE_SPAN {
            // Same mean, half the weight
            self.sum /= 2;
            self.count /= 2;
        }
        self.sum += u64::from(bits);
        self.count += 1;

        let fb = &self.shared.feedback;
        fb.value.store(bits, Ordering::Relaxed);
        fb.min.store(self.min, Ordering::Relaxed);
        fb.max.store(self.max, Ordering::Relaxed);
        fb.average
            .store((self.sum / u64::from(self.count)) as u32, Ordering::Relaxed);
    }
}

/// Sample counts for the host-bound isochronous stream
///
/// Fractional rates (22.05 kHz, 11.025 kHz) are spread over frames with an
/// accumulator; the capture queue fill adds or removes one sample when it
/// strays from the middle.
pub struct CapturePacer<'a> {
    shared: &'a AudioShared,
    epoch: u32,
    /// Millisamples carried into the next frame
    remainder: u32,
}

impl<'a> CapturePacer<'a> {
    /// Create a pacer for the capture stream
    #[must_use]
    pub fn new(shared: &'a AudioShared) -> Self {
        Self {
            shared,
            epoch: shared.capture.epoch(),
            remainder: 0,
        }
    }

    /// Samples to send in the next frame
    pub fn next_packet_len(&mut self) -> usize {
        let epoch = self.shared.capture.epoch();
        if epoch != self.epoch {
            self.epoch = epoch;
            self.remainder = 0;
        }

        let total = self.remainder + self.shared.capture.rate().millisamples_per_frame();
        let mut samples = (total / USB_FRAMES_PER_SECOND) as usize;
        self.remainder = total % USB_FRAMES_PER_SECOND;

        let fill = self.shared.capture_queue.len();
        if fill > QUEUE_TARGET_FILL + CAPTURE_PACING_MARGIN {
            samples += 1;
        } else if fill + CAPTURE_PACING_MARGIN < QUEUE_TARGET_FILL {
            samples = samples.saturating_sub(1);
        }

        samples.min(MAX_PACKET_SAMPLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centred() -> AudioShared {
        let shared = AudioShared::new();
        for _ in 0..QUEUE_TARGET_FILL {
            shared.playback_queue.push(0);
        }
        shared
    }

    #[test]
    fn long_sessions_keep_averaging() {
        let shared = centred();
        let mut controller = FeedbackController::new(&shared, FeedbackRefresh::Period1Frame);
        let nominal = nominal_bits(SampleRate::Hz48000, FeedbackFormat::Q16_16);

        controller.count = AVERAGE_SPAN;
        controller.sum = u64::from(AVERAGE_SPAN) * u64::from(nominal);
        assert_eq!(controller.measure(CYCLES_PER_FRAME).bits, nominal);
        assert_eq!(controller.count, AVERAGE_SPAN / 2 + 1);
        assert_eq!(shared.feedback.average(), nominal);
    }

    #[test]
    fn saturated_count_does_not_overflow() {
        let shared = centred();
        let mut controller = FeedbackController::new(&shared, FeedbackRefresh::Period1Frame);
        let nominal = nominal_bits(SampleRate::Hz48000, FeedbackFormat::Q16_16);

        controller.count = u32::MAX;
        controller.sum = u64::from(u32::MAX) * u64::from(nominal);
        for _ in 0..4 {
            controller.measure(CYCLES_PER_FRAME);
        }
        assert!(controller.count <= AVERAGE_SPAN);
        assert!(shared.feedback.average().abs_diff(nominal) <= 1);
    }
}
