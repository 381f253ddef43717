//! Sample Queue Tests
//!
//! Tests for the lock-free SPSC queue bridging the tick handlers and USB.
//! Run with: cargo test --test queue_tests

use usb_radio_audio::audio::queue::SampleQueue;
use usb_radio_audio::audio::transfer::{read_packet, write_packet};
use usb_radio_audio::config::{QUEUE_CAPACITY, SILENCE};

// =============================================================================
// FIFO Order
// =============================================================================

#[test]
fn dequeue_order_matches_enqueue_order() {
    let queue: SampleQueue<8> = SampleQueue::new();
    let mut expected = Vec::new();
    let mut received = Vec::new();

    // Interleave pushes and pops so the indices wrap several times
    let mut next: i16 = -500;
    for round in 0..40 {
        for _ in 0..(round % 5) + 1 {
            if queue.push(next) {
                expected.push(next);
            }
            next += 7;
        }
        for _ in 0..(round % 3) + 1 {
            if let Some(sample) = queue.pop() {
                received.push(sample);
            }
        }
    }
    while let Some(sample) = queue.pop() {
        received.push(sample);
    }

    assert_eq!(received, expected);
    assert!(queue.is_empty());
}

#[test]
fn all_slots_usable() {
    let queue: SampleQueue<4> = SampleQueue::new();
    for i in 0..4 {
        assert!(queue.push(i));
    }
    assert!(queue.is_full());
    assert_eq!(queue.len(), 4);
}

#[test]
fn default_capacity_is_512_samples() {
    let queue: SampleQueue<QUEUE_CAPACITY> = SampleQueue::new();
    assert_eq!(queue.capacity(), 512);
}

// =============================================================================
// Underrun / Overrun
// =============================================================================

#[test]
fn underrun_yields_silence_and_counts_once() {
    let queue: SampleQueue<8> = SampleQueue::new();
    assert_eq!(queue.pop_or_silence(), SILENCE);
    assert_eq!(queue.underruns(), 1);

    queue.push(42);
    assert_eq!(queue.pop_or_silence(), 42);
    assert_eq!(queue.underruns(), 1);
}

#[test]
fn plain_pop_on_empty_does_not_count() {
    let queue: SampleQueue<8> = SampleQueue::new();
    assert_eq!(queue.pop(), None);
    assert_eq!(queue.underruns(), 0);
}

#[test]
fn overrun_drops_newest_and_counts_once() {
    let queue: SampleQueue<4> = SampleQueue::new();
    for s in [1, 2, 3, 4] {
        assert!(queue.push(s));
    }

    assert!(!queue.push(99));
    assert_eq!(queue.overruns(), 1);

    let contents: Vec<i16> = std::iter::from_fn(|| queue.pop()).collect();
    assert_eq!(contents, vec![1, 2, 3, 4]);
}

#[test]
fn clear_discards_everything() {
    let queue: SampleQueue<8> = SampleQueue::new();
    for s in 0..5 {
        queue.push(s);
    }
    queue.clear();
    assert!(queue.is_empty());
    assert_eq!(queue.pop(), None);

    queue.push(7);
    assert_eq!(queue.pop(), Some(7));
}

// =============================================================================
// Concurrent Producer / Consumer
// =============================================================================

#[test]
fn concurrent_producer_consumer_preserves_order() {
    let queue: SampleQueue<64> = SampleQueue::new();
    const COUNT: i16 = 20_000;

    let received = std::thread::scope(|s| {
        s.spawn(|| {
            let mut next = 0;
            while next < COUNT {
                if !queue.is_full() && queue.push(next) {
                    next += 1;
                } else {
                    std::thread::yield_now();
                }
            }
        });

        let consumer = s.spawn(|| {
            let mut out = Vec::with_capacity(COUNT as usize);
            while out.len() < COUNT as usize {
                match queue.pop() {
                    Some(sample) => out.push(sample),
                    None => std::thread::yield_now(),
                }
            }
            out
        });

        consumer.join().unwrap()
    });

    assert!(received.iter().copied().eq(0..COUNT));
    assert_eq!(queue.overruns(), 0);
}

// =============================================================================
// USB Packet Transfer
// =============================================================================

#[test]
fn write_packet_decodes_little_endian() {
    let queue: SampleQueue<8> = SampleQueue::new();
    let data = [0x34, 0x12, 0xFF, 0xFF, 0x00, 0x80];
    assert_eq!(write_packet(&queue, &data), 3);

    assert_eq!(queue.pop(), Some(0x1234));
    assert_eq!(queue.pop(), Some(-1));
    assert_eq!(queue.pop(), Some(i16::MIN));
}

#[test]
fn write_packet_ignores_trailing_odd_byte() {
    let queue: SampleQueue<8> = SampleQueue::new();
    assert_eq!(write_packet(&queue, &[1, 0, 2]), 1);
    assert_eq!(queue.len(), 1);
}

#[test]
fn write_packet_counts_overrun_on_full_queue() {
    let queue: SampleQueue<2> = SampleQueue::new();
    let data = [1, 0, 2, 0, 3, 0];
    assert_eq!(write_packet(&queue, &data), 2);
    assert_eq!(queue.overruns(), 1);
}

#[test]
fn read_packet_respects_sample_limit() {
    let queue: SampleQueue<8> = SampleQueue::new();
    for s in [10, -10, 300] {
        queue.push(s);
    }

    let mut out = [0u8; 8];
    assert_eq!(read_packet(&queue, &mut out, 2), 4);
    assert_eq!(&out[..4], &[10, 0, 0xF6, 0xFF]);
    assert_eq!(queue.len(), 1);
}

#[test]
fn read_packet_short_when_queue_runs_dry() {
    let queue: SampleQueue<8> = SampleQueue::new();
    queue.push(5);

    let mut out = [0u8; 8];
    assert_eq!(read_packet(&queue, &mut out, 4), 2);
    assert_eq!(queue.underruns(), 0);
}
