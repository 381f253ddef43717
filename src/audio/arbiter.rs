//! Output converter ownership
//!
//! The playback path and the beacon generator share one output
//! converter. Ownership is a single token that only changes at stream
//! state transitions, never in the middle of a tick.

use core::sync::atomic::{AtomicU8, Ordering};

/// Current holder of the output converter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum OutputOwner {
    /// Nobody drives the converter
    Free,
    /// Playback path
    Audio,
    /// Morse beacon generator
    Beacon,
}

impl OutputOwner {
    const fn to_u8(self) -> u8 {
        match self {
            Self::Free => 0,
            Self::Audio => 1,
            Self::Beacon => 2,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Audio,
            2 => Self::Beacon,
            _ => Self::Free,
        }
    }
}

/// Exclusive-ownership flag for the output converter
pub struct OutputArbiter {
    owner: AtomicU8,
}

impl OutputArbiter {
    /// Unowned converter
    #[must_use]
    pub const fn new() -> Self {
        Self {
            owner: AtomicU8::new(0),
        }
    }

    /// Current owner
    #[must_use]
    pub fn owner(&self) -> OutputOwner {
        OutputOwner::from_u8(self.owner.load(Ordering::Acquire))
    }

    /// Check if the playback path drives the converter
    #[inline]
    #[must_use]
    pub fn is_owned_by_audio(&self) -> bool {
        self.owner() == OutputOwner::Audio
    }

    /// Take the converter if free (or already held by `who`)
    pub fn try_acquire(&self, who: OutputOwner) -> bool {
        match self.owner.compare_exchange(
            OutputOwner::Free.to_u8(),
            who.to_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => true,
            Err(current) => current == who.to_u8(),
        }
    }

    /// Give the converter back; a no-op unless `who` holds it
    pub fn release(&self, who: OutputOwner) -> bool {
        self.owner
            .compare_exchange(
                who.to_u8(),
                OutputOwner::Free.to_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl Default for OutputArbiter {
    fn default() -> Self {
        Self::new()
    }
}
