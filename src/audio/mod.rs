//! Real-time audio core
//!
//! Sample queues, the capture and playback tick handlers, detection and
//! the clock feedback controller.
//!
//! # Priority levels
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ HIGHEST   capture tick │ playback tick │ (beacon tone)       │
//! ├──────────────────────────────────────────────────────────────┤
//! │ USB       frame boundary feedback │ packet transfer          │
//! ├──────────────────────────────────────────────────────────────┤
//! │ LOWEST    stream state machine │ settings │ diagnostics      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The levels only meet in [`shared::AudioShared`].

pub mod arbiter;
pub mod capture;
pub mod detect;
pub mod feedback;
pub mod gain;
pub mod playback;
pub mod queue;
pub mod shared;
pub mod transfer;

use crate::types::Sample;

/// Source of captured samples (the input converter)
pub trait InputConverter {
    /// Read the current conversion result as a signed sample
    fn read(&mut self) -> Sample;
}

/// Sink for played samples (the output converter)
pub trait OutputConverter {
    /// Latch one signed sample into the converter
    fn write(&mut self, sample: Sample);
}
