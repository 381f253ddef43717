//! USB Radio Interface Audio Library
//!
//! This library provides the audio data-plane of an STM32F302-based USB
//! radio interface adapter. It moves mono 16-bit audio between the radio
//! and a USB host in both directions, keeps the free-running sample clock
//! locked to the host's frame clock through an asynchronous feedback
//! endpoint, and derives voice (PTT) and carrier (COS) signals from the
//! audio itself.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    USB / SETTINGS                            │
//! │  Stream State Machine  │  Register Map  │  Signal Router      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    FRAME LEVEL                               │
//! │  Feedback Controller  │  Packet Transfer  │  Capture Pacing  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    SAMPLE LEVEL                              │
//! │  Capture Path (ADC)  │  Playback Path (DAC)  │  Detection    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / SCHEDULER                            │
//! │  Sample Timers  │  Frame Counter  │  embassy-rs executors    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **No locks on the audio path**: levels meet only through atomics
//!   and single-producer single-consumer queues
//! - **Type-driven design**: rates, volumes, hold times and feedback
//!   formats are closed types
//! - **No unsafe in application code**
//! - **Hardware behind traits**: converters, timers and the register store
//!   are ports, so the whole core runs in host tests
//! - **Graceful degradation**: underrun, overrun and clock anomalies are
//!   counted, never fatal

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Must come first so the logging macros are visible to every module
#[macro_use]
mod fmt;

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;
#[cfg(feature = "embedded")]
pub use embassy_usb;

/// Hardware Abstraction Layer
///
/// Converters and timers of the STM32F302 behind the audio core's ports.
#[cfg(feature = "embedded")]
pub mod hal;

/// USB Subsystem
///
/// UAC1 speaker and microphone streams, feedback endpoint.
#[cfg(feature = "embedded")]
pub mod usb;

/// Real-time Audio Core
///
/// Sample queues, tick handlers, detection and clock feedback.
pub mod audio;

/// Sample Clock Source
///
/// Per-direction sample timers with deferred rate changes.
pub mod clock;

/// Rate and Interface State Machine
///
/// Stream activation, rate changes and output converter ownership.
pub mod stream;

/// Settings Register Map
///
/// Register store port, defaults and diagnostics publishing.
pub mod settings;

/// Detection Signal Router Interface
pub mod router;

/// Control-plane errors
pub mod error;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::audio::capture::CapturePath;
    pub use crate::audio::feedback::{CapturePacer, FeedbackController, FeedbackRefresh};
    pub use crate::audio::playback::PlaybackPath;
    pub use crate::audio::shared::AudioShared;
    pub use crate::audio::{InputConverter, OutputConverter};
    pub use crate::clock::SampleTimer;
    pub use crate::error::Error;
    pub use crate::settings::{AnalogFrontend, RegisterId, RegisterStore};
    pub use crate::stream::{Activation, StreamControl, StreamState};

    // Embassy
    #[cfg(feature = "embedded")]
    pub use embassy_time::{Duration, Instant, Timer};
}
