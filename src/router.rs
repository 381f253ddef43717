//! Detection signal outputs
//!
//! The PTT and COS levels produced by the tick handlers, exposed to an
//! external signal router that may OR them into physical outputs.
//! Routers either poll [`DetectionSignals::snapshot`] or use a
//! [`SignalWatcher`] to be told about changes.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::types::DetectionKind;

/// Snapshot of both signals
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub struct SignalState {
    /// Voice detected on outgoing audio (PTT)
    pub voice: bool,
    /// Carrier detected on incoming audio (COS)
    pub carrier: bool,
}

impl SignalState {
    /// Pack into register bits (bit 0 PTT, bit 1 COS)
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        (self.voice as u32) | ((self.carrier as u32) << 1)
    }
}

/// Shared signal levels
pub struct DetectionSignals {
    voice: AtomicBool,
    carrier: AtomicBool,
    /// Bumped on every level change
    sequence: AtomicU32,
}

impl DetectionSignals {
    /// Both deasserted
    #[must_use]
    pub const fn new() -> Self {
        Self {
            voice: AtomicBool::new(false),
            carrier: AtomicBool::new(false),
            sequence: AtomicU32::new(0),
        }
    }

    /// Publish a level change from a tick handler
    #[inline]
    pub fn set(&self, kind: DetectionKind, asserted: bool) {
        let flag = match kind {
            DetectionKind::Voice => &self.voice,
            DetectionKind::Carrier => &self.carrier,
        };
        flag.store(asserted, Ordering::Relaxed);
        self.sequence.fetch_add(1, Ordering::Release);
    }

    /// Level of one signal
    #[must_use]
    pub fn is_asserted(&self, kind: DetectionKind) -> bool {
        match kind {
            DetectionKind::Voice => self.voice.load(Ordering::Relaxed),
            DetectionKind::Carrier => self.carrier.load(Ordering::Relaxed),
        }
    }

    /// Both levels
    #[must_use]
    pub fn snapshot(&self) -> SignalState {
        SignalState {
            voice: self.voice.load(Ordering::Relaxed),
            carrier: self.carrier.load(Ordering::Relaxed),
        }
    }

    /// Change counter
    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.sequence.load(Ordering::Acquire)
    }
}

impl Default for DetectionSignals {
    fn default() -> Self {
        Self::new()
    }
}

/// Change notification for a router running at lower priority
#[derive(Clone, Copy, Debug, Default)]
pub struct SignalWatcher {
    last_sequence: u32,
    last_state: SignalState,
}

impl SignalWatcher {
    /// Watcher that reports the first non-idle state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_sequence: 0,
            last_state: SignalState {
                voice: false,
                carrier: false,
            },
        }
    }

    /// Return the new state if anything changed since the last poll
    ///
    /// A pulse that asserts and drops between two polls bumps the
    /// sequence but leaves the levels unchanged; it is not reported.
    pub fn poll(&mut self, signals: &DetectionSignals) -> Option<SignalState> {
        let sequence = signals.sequence();
        if sequence == self.last_sequence {
            return None;
        }
        self.last_sequence = sequence;

        let state = signals.snapshot();
        if state == self.last_state {
            return None;
        }
        self.last_state = state;
        Some(state)
    }
}
