//! Lock-free single-producer single-consumer sample queue
//!
//! Bridges a sample-timer interrupt and the USB transfer context. Slots
//! and indices are atomics, so no `unsafe` is needed and every index read
//! is a single indivisible load.
//!
//! # Contract
//!
//! - Only ONE context calls [`push()`](SampleQueue::push) (the producer).
//! - Only ONE context calls [`pop()`](SampleQueue::pop) (the consumer).
//! - [`clear()`](SampleQueue::clear) runs in the consumer context or while
//!   the producer is stopped.

use core::sync::atomic::{AtomicI16, AtomicU32, AtomicUsize, Ordering};

use crate::config::SILENCE;
use crate::types::Sample;

/// Fixed-capacity ring of mono samples
///
/// `N` must be a power of two; all `N` slots are usable because the
/// indices run freely and only their difference is masked.
pub struct SampleQueue<const N: usize> {
    slots: [AtomicI16; N],
    /// Write index (only advanced by the producer)
    head: AtomicUsize,
    /// Read index (only advanced by the consumer)
    tail: AtomicUsize,
    /// Samples dropped because the queue was full
    overruns: AtomicU32,
    /// Silence substituted because the queue was empty
    underruns: AtomicU32,
}

impl<const N: usize> SampleQueue<N> {
    const MASK: usize = N - 1;

    /// Create an empty queue
    ///
    /// # Panics
    ///
    /// Compile-time assertion: `N` must be a power of two.
    #[must_use]
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "queue capacity must be a power of two");

        Self {
            slots: [const { AtomicI16::new(SILENCE) }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            overruns: AtomicU32::new(0),
            underruns: AtomicU32::new(0),
        }
    }

    /// Capacity in samples
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Append a sample (producer side)
    ///
    /// On a full queue the new sample is dropped, the overrun counter is
    /// incremented and `false` is returned. Never blocks.
    #[inline]
    pub fn push(&self, sample: Sample) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        if head.wrapping_sub(tail) >= N {
            self.overruns.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        self.slots[head & Self::MASK].store(sample, Ordering::Relaxed);
        // Slot write must be visible before the index moves.
        self.head.store(head.wrapping_add(1), Ordering::Release);
        true
    }

    /// Take the oldest sample (consumer side)
    #[inline]
    pub fn pop(&self) -> Option<Sample> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        if tail == head {
            return None;
        }

        let sample = self.slots[tail & Self::MASK].load(Ordering::Relaxed);
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(sample)
    }

    /// Take the oldest sample or substitute silence (consumer side)
    ///
    /// Each substitution increments the underrun counter by one.
    #[inline]
    pub fn pop_or_silence(&self) -> Sample {
        if let Some(sample) = self.pop() {
            sample
        } else {
            self.underruns.fetch_add(1, Ordering::Relaxed);
            SILENCE
        }
    }

    /// Number of queued samples
    ///
    /// Computed from one load of each index, so a concurrently advancing
    /// index can only make the value stale, never torn.
    #[must_use]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(tail).min(N)
    }

    /// Check if the queue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the queue is full
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    /// Discard all queued samples
    pub fn clear(&self) {
        let head = self.head.load(Ordering::Acquire);
        self.tail.store(head, Ordering::Release);
    }

    /// Samples dropped on a full queue
    #[must_use]
    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// Silence substitutions on an empty queue
    #[must_use]
    pub fn underruns(&self) -> u32 {
        self.underruns.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for SampleQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_survive_wraparound() {
        let q: SampleQueue<4> = SampleQueue::new();
        q.head.store(usize::MAX - 1, Ordering::Relaxed);
        q.tail.store(usize::MAX - 1, Ordering::Relaxed);

        for v in 1..=4 {
            assert!(q.push(v));
        }
        assert!(q.is_full());
        assert!(!q.push(5));

        for v in 1..=4 {
            assert_eq!(q.pop(), Some(v));
        }
        assert!(q.is_empty());
    }

    #[test]
    fn clear_keeps_producer_index() {
        let q: SampleQueue<8> = SampleQueue::new();
        q.push(1);
        q.push(2);
        q.clear();
        assert_eq!(q.head.load(Ordering::Relaxed), 2);
        assert!(q.is_empty());
        q.push(3);
        assert_eq!(q.pop(), Some(3));
    }
}
