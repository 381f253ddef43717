//! Capture path: radio → input converter → host-bound queue
//!
//! Runs once per capture-timer tick at the highest priority. Must finish
//! within one sample period, so it never blocks and never logs.

use crate::audio::detect::Detector;
use crate::audio::shared::AudioShared;
use crate::audio::InputConverter;
use crate::config::SILENCE;
use crate::types::DetectionKind;

/// Capture tick handler
pub struct CapturePath<'a, A: InputConverter> {
    shared: &'a AudioShared,
    adc: A,
    carrier: Detector,
}

impl<'a, A: InputConverter> CapturePath<'a, A> {
    /// Create a capture path reading from `adc`
    #[must_use]
    pub fn new(shared: &'a AudioShared, adc: A) -> Self {
        Self {
            shared,
            adc,
            carrier: Detector::new(),
        }
    }

    /// Carrier detector state
    #[must_use]
    pub const fn carrier(&self) -> &Detector {
        &self.carrier
    }

    /// Access the converter
    pub fn converter_mut(&mut self) -> &mut A {
        &mut self.adc
    }

    /// Process one sample period
    ///
    /// Carrier detection keeps running while the host is not recording;
    /// samples are only queued for an active stream.
    #[inline]
    pub fn tick(&mut self) {
        let direction = &self.shared.capture;
        let raw = self.adc.read();

        // Detection sees the physical level, independent of user volume.
        let detect_input = if direction.gain.is_muted() { SILENCE } else { raw };
        if let Some(level) = self.carrier.step_with(
            detect_input.unsigned_abs(),
            &direction.detector,
            direction.rate(),
        ) {
            self.shared.signals.set(DetectionKind::Carrier, level);
        }

        if direction.is_active() {
            let _ = self.shared.capture_queue.push(direction.gain.apply(raw));
        }
    }
}
