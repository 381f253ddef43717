//! USB Subsystem
//!
//! Provides the USB audio functions of the radio interface:
//! - UAC1 speaker with asynchronous feedback (host → radio)
//! - UAC1 microphone (radio → host)
//! - Lifecycle events feeding the stream state machine

pub mod audio;
pub mod events;
pub mod microphone;
