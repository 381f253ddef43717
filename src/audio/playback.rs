//! Playback path: host queue → output converter → radio
//!
//! Runs once per playback-timer tick at the highest priority.

use crate::audio::detect::Detector;
use crate::audio::shared::AudioShared;
use crate::audio::OutputConverter;
use crate::config::SILENCE;
use crate::types::DetectionKind;

/// Playback tick handler
pub struct PlaybackPath<'a, D: OutputConverter> {
    shared: &'a AudioShared,
    dac: D,
    voice: Detector,
}

impl<'a, D: OutputConverter> PlaybackPath<'a, D> {
    /// Create a playback path writing to `dac`
    #[must_use]
    pub fn new(shared: &'a AudioShared, dac: D) -> Self {
        Self {
            shared,
            dac,
            voice: Detector::new(),
        }
    }

    /// Voice detector state
    #[must_use]
    pub const fn voice(&self) -> &Detector {
        &self.voice
    }

    /// Access the converter
    pub fn converter_mut(&mut self) -> &mut D {
        &mut self.dac
    }

    /// Process one sample period
    ///
    /// An inactive stream feeds silence so a held PTT still times out.
    /// While the beacon owns the converter nothing is written.
    #[inline]
    pub fn tick(&mut self) {
        let direction = &self.shared.playback;
        let sample = if direction.is_active() {
            self.shared.playback_queue.pop_or_silence()
        } else {
            SILENCE
        };

        // Pre-mute, pre-volume level.
        if let Some(level) =
            self.voice
                .step_with(sample.unsigned_abs(), &direction.detector, direction.rate())
        {
            self.shared.signals.set(DetectionKind::Voice, level);
        }

        if self.shared.output.is_owned_by_audio() {
            self.dac.write(direction.gain.apply(sample));
        }
    }
}
