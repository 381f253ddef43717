//! Voice (PTT) and carrier (COS) detection
//!
//! A retriggerable one-shot: any sample above the threshold re-arms the
//! full hold window, and the signal drops once the window runs out with
//! no further crossing. Not an envelope follower.

use core::sync::atomic::{AtomicU16, Ordering};

use crate::types::{HoldTime, SampleRate};

/// Threshold and hold time, written by the settings context
pub struct DetectorParams {
    threshold: AtomicU16,
    hold: AtomicU16,
}

impl DetectorParams {
    /// Create with a threshold and a raw 12.4 hold time
    #[must_use]
    pub const fn new(threshold: u16, hold_bits: u16) -> Self {
        Self {
            threshold: AtomicU16::new(threshold),
            hold: AtomicU16::new(hold_bits),
        }
    }

    /// Sample magnitude that must be exceeded
    #[must_use]
    pub fn threshold(&self) -> u16 {
        self.threshold.load(Ordering::Relaxed)
    }

    /// Set the threshold
    pub fn set_threshold(&self, threshold: u16) {
        self.threshold.store(threshold, Ordering::Relaxed);
    }

    /// Hold time after the last crossing
    #[must_use]
    pub fn hold(&self) -> HoldTime {
        HoldTime::from_bits(self.hold.load(Ordering::Relaxed))
    }

    /// Set the hold time
    pub fn set_hold(&self, hold: HoldTime) {
        self.hold.store(hold.to_bits(), Ordering::Relaxed);
    }
}

/// Detector state, owned by one tick handler
#[derive(Clone, Copy, Debug, Default)]
pub struct Detector {
    /// Ticks left before deassertion
    countdown: u32,
    asserted: bool,
}

impl Detector {
    /// Create a deasserted detector
    #[must_use]
    pub const fn new() -> Self {
        Self {
            countdown: 0,
            asserted: false,
        }
    }

    /// Check if the signal is asserted
    #[must_use]
    pub const fn is_asserted(&self) -> bool {
        self.asserted
    }

    /// Ticks remaining in the hold window
    #[must_use]
    pub const fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Advance one tick
    ///
    /// Returns the new signal level when it changes.
    #[inline]
    pub fn step(&mut self, magnitude: u16, threshold: u16, hold_ticks: u32) -> Option<bool> {
        if magnitude > threshold {
            self.countdown = hold_ticks;
            if !self.asserted {
                self.asserted = true;
                return Some(true);
            }
        } else if self.asserted {
            self.countdown = self.countdown.saturating_sub(1);
            if self.countdown == 0 {
                self.asserted = false;
                return Some(false);
            }
        }
        None
    }

    /// Advance one tick reading the shared parameters
    #[inline]
    pub fn step_with(&mut self, magnitude: u16, params: &DetectorParams, rate: SampleRate) -> Option<bool> {
        let threshold = params.threshold();
        // The hold window only matters on a crossing.
        let hold_ticks = if magnitude > threshold {
            params.hold().ticks_at(rate)
        } else {
            0
        };
        self.step(magnitude, threshold, hold_ticks)
    }

    /// Drop the signal immediately
    pub fn reset(&mut self) {
        self.countdown = 0;
        self.asserted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_hold_releases_on_next_quiet_tick() {
        let mut det = Detector::new();
        assert_eq!(det.step(100, 10, 0), Some(true));
        assert_eq!(det.step(0, 10, 0), Some(false));
    }

    #[test]
    fn equal_to_threshold_does_not_trigger() {
        let mut det = Detector::new();
        assert_eq!(det.step(10, 10, 5), None);
        assert!(!det.is_asserted());
    }
}
