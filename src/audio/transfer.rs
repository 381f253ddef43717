//! USB transfer primitives
//!
//! Move 16-bit little-endian mono PCM between USB packet buffers and the
//! sample queues. Both sides are non-blocking: a full queue drops the
//! excess, an empty one yields a short packet.

use crate::audio::queue::SampleQueue;
use crate::config::SAMPLE_BYTES;
use crate::types::Sample;

/// Queue the samples of one host→device packet
///
/// Returns the number of samples accepted. A trailing odd byte is
/// ignored.
pub fn write_packet<const N: usize>(queue: &SampleQueue<N>, data: &[u8]) -> usize {
    let mut accepted = 0;
    for chunk in data.chunks_exact(SAMPLE_BYTES) {
        let sample = Sample::from_le_bytes([chunk[0], chunk[1]]);
        if queue.push(sample) {
            accepted += 1;
        }
    }
    accepted
}

/// Fill one device→host packet with up to `max_samples` queued samples
///
/// Returns the number of bytes written to `out`.
pub fn read_packet<const N: usize>(queue: &SampleQueue<N>, out: &mut [u8], max_samples: usize) -> usize {
    let mut written = 0;
    for chunk in out.chunks_exact_mut(SAMPLE_BYTES).take(max_samples) {
        let Some(sample) = queue.pop() else {
            break;
        };
        chunk.copy_from_slice(&sample.to_le_bytes());
        written += SAMPLE_BYTES;
    }
    written
}
