//! The real-time drain path.
//!
//! Invoked from the consumer context once per quantum. The destination is
//! always filled completely: queued bytes first, silence for whatever is
//! left. Underrun is policy, not failure. This path must not allocate,
//! block, or panic.

use crate::queue::ChunkQueue;

/// What a single drain call did to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Bytes copied out of queued chunks.
    pub copied_bytes: usize,
    /// Bytes zero-filled after the queue ran dry.
    pub zero_filled_bytes: usize,
    /// Queued frames remaining after this call's accounting.
    pub queued_frames_after: u64,
}

/// Fill `dest` from the queue, zero-filling any shortfall.
///
/// Copies the minimum of (front chunk remainder, destination remainder) per
/// step, evicts chunks as they are consumed, and debits `queued_frames` by
/// `span / bytes_per_frame` for each copied span using the geometry currently
/// in effect. Returns the outcome the caller uses to fire backpressure
/// signals; the accounting here happens-before any of those wakeups.
pub fn drain_into(queue: &mut ChunkQueue, dest: &mut [u8], bytes_per_frame: usize) -> DrainOutcome {
    debug_assert!(bytes_per_frame > 0);

    let mut dest_offset = 0;
    while dest_offset < dest.len() {
        let (copied, consumed) = match queue.front_mut() {
            None => break,
            Some(chunk) => {
                let src = chunk.remaining();
                let take = src.len().min(dest.len() - dest_offset);
                dest[dest_offset..dest_offset + take].copy_from_slice(&src[..take]);
                chunk.advance(take);
                (take, chunk.is_consumed())
            }
        };
        dest_offset += copied;
        queue.record_consumed(copied, bytes_per_frame);
        if consumed {
            queue.evict_front();
        }
    }

    let copied_bytes = dest_offset;
    let zero_filled_bytes = dest.len() - copied_bytes;
    if zero_filled_bytes > 0 {
        dest[copied_bytes..].fill(0);
    }
    if copied_bytes == 0 && !dest.is_empty() {
        queue.record_underrun();
    }

    tracing::trace!(
        copied_bytes,
        zero_filled_bytes,
        queued_frames = queue.queued_frames(),
        "drained quantum"
    );

    DrainOutcome {
        copied_bytes,
        zero_filled_bytes,
        queued_frames_after: queue.queued_frames(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(len: usize, value: u8) -> Vec<u8> {
        vec![value; len]
    }

    #[test]
    fn drain_spans_multiple_chunks() {
        let mut queue = ChunkQueue::new();
        queue.enqueue(filled(8, 1), 4);
        queue.enqueue(filled(8, 2), 4);

        let mut dest = [0xffu8; 12];
        let outcome = drain_into(&mut queue, &mut dest, 4);

        assert_eq!(outcome.copied_bytes, 12);
        assert_eq!(outcome.zero_filled_bytes, 0);
        assert_eq!(outcome.queued_frames_after, 1);
        assert_eq!(&dest[..8], &[1u8; 8]);
        assert_eq!(&dest[8..], &[2u8; 4]);

        // The second chunk's tail is still queued.
        assert_eq!(queue.total_queued_bytes(), 4);
    }

    #[test]
    fn partial_chunk_survives_for_the_next_drain() {
        let mut queue = ChunkQueue::new();
        queue.enqueue(filled(16, 7), 4);

        let mut first = [0u8; 4];
        drain_into(&mut queue, &mut first, 4);
        assert_eq!(queue.queued_frames(), 3);

        let mut second = [0u8; 12];
        let outcome = drain_into(&mut queue, &mut second, 4);
        assert_eq!(outcome.copied_bytes, 12);
        assert_eq!(second, [7u8; 12]);
        assert!(queue.is_empty());
    }

    #[test]
    fn empty_queue_zero_fills_everything() {
        let mut queue = ChunkQueue::new();
        let mut dest = [0xabu8; 16];
        let outcome = drain_into(&mut queue, &mut dest, 8);

        assert_eq!(outcome.copied_bytes, 0);
        assert_eq!(outcome.zero_filled_bytes, 16);
        assert_eq!(outcome.queued_frames_after, 0);
        assert_eq!(dest, [0u8; 16]);
        assert_eq!(queue.stats(4).underruns, 1);
    }

    #[test]
    fn shortfall_is_silence_after_the_copied_region() {
        let mut queue = ChunkQueue::new();
        queue.enqueue(filled(8, 9), 8);

        let mut dest = [0x55u8; 24];
        let outcome = drain_into(&mut queue, &mut dest, 8);

        assert_eq!(outcome.copied_bytes, 8);
        assert_eq!(outcome.zero_filled_bytes, 16);
        assert_eq!(&dest[..8], &[9u8; 8]);
        assert_eq!(&dest[8..], &[0u8; 16]);
    }

    #[test]
    fn geometry_growth_cannot_strand_queued_frames() {
        // 16 bytes written at 8 bytes/frame (2 frames credited), then the
        // geometry grows to 16 bytes/frame. The copied span debits only one
        // frame, but emptying the queue clears the residue so a byte-empty
        // queue never reports frames.
        let mut queue = ChunkQueue::new();
        queue.enqueue(filled(16, 5), 8);

        let mut dest = [0u8; 16];
        let outcome = drain_into(&mut queue, &mut dest, 16);

        assert_eq!(outcome.copied_bytes, 16);
        assert_eq!(outcome.queued_frames_after, 0);
        assert!(queue.is_empty());
        assert_eq!(queue.queued_frames(), 0);
    }

    #[test]
    fn geometry_change_between_write_and_drain_uses_recorded_byte_length() {
        // 16 bytes written at 8 bytes/frame (2 frames credited), then the
        // geometry changes to 4 bytes/frame before any drain. The drain
        // consumes the recorded 16 bytes and debits 16 / 4 = 4 frames,
        // saturating the counter at zero.
        let mut queue = ChunkQueue::new();
        queue.enqueue(filled(16, 3), 8);
        assert_eq!(queue.queued_frames(), 2);

        let mut dest = [0u8; 16];
        let outcome = drain_into(&mut queue, &mut dest, 4);

        assert_eq!(outcome.copied_bytes, 16);
        assert_eq!(dest, [3u8; 16]);
        assert_eq!(outcome.queued_frames_after, 0);
        assert!(queue.is_empty());
    }
}
