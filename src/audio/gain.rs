//! Volume and mute
//!
//! Written from the settings context, read by the tick handlers. Each
//! value lives in its own atomic word so a tick never sees a torn value.

use core::sync::atomic::{AtomicBool, AtomicI8, AtomicU16, Ordering};

use crate::config::SILENCE;
use crate::types::{Sample, Volume};

/// Scale a sample by a Q15 factor, saturating at the i16 range
#[inline]
#[must_use]
pub fn scale(sample: Sample, factor_q15: u16) -> Sample {
    let scaled = (i32::from(sample) * i32::from(factor_q15)) >> 15;
    scaled.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as Sample
}

/// Per-direction gain state
pub struct GainControl {
    muted: AtomicBool,
    volume_db: AtomicI8,
    factor_q15: AtomicU16,
}

impl GainControl {
    /// Unmuted at unity gain
    #[must_use]
    pub const fn new() -> Self {
        Self {
            muted: AtomicBool::new(false),
            volume_db: AtomicI8::new(0),
            factor_q15: AtomicU16::new(Volume::UNITY_Q15),
        }
    }

    /// Set the volume; the linear factor is computed here, not per tick
    pub fn set_volume(&self, volume: Volume) {
        self.factor_q15.store(volume.linear_q15(), Ordering::Relaxed);
        self.volume_db.store(volume.as_db(), Ordering::Relaxed);
    }

    /// Current volume
    #[must_use]
    pub fn volume(&self) -> Volume {
        Volume::from_db(i16::from(self.volume_db.load(Ordering::Relaxed)))
    }

    /// Set the mute flag
    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    /// Check the mute flag
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    /// Apply mute and volume to one sample
    #[inline]
    #[must_use]
    pub fn apply(&self, sample: Sample) -> Sample {
        if self.is_muted() {
            SILENCE
        } else {
            scale(sample, self.factor_q15.load(Ordering::Relaxed))
        }
    }
}

impl Default for GainControl {
    fn default() -> Self {
        Self::new()
    }
}
