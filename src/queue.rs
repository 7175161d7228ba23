//! Ownership of pending write chunks and the queued-frame accounting.
//!
//! The queue accepts writes unconditionally: capacity is advisory
//! backpressure for the producer, never a reason to reject or drop audio.
//! The real-time side must never stall waiting for space, so `queued_frames`
//! may temporarily exceed the capacity.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One producer write, owned by the queue from enqueue until fully consumed.
#[derive(Debug)]
pub(crate) struct Chunk {
    bytes: Vec<u8>,
    read_offset: usize,
}

impl Chunk {
    fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            read_offset: 0,
        }
    }

    /// The unread tail of this chunk.
    pub(crate) fn remaining(&self) -> &[u8] {
        &self.bytes[self.read_offset..]
    }

    /// Advance the read offset after `n` bytes were copied out.
    pub(crate) fn advance(&mut self, n: usize) {
        debug_assert!(self.read_offset + n <= self.bytes.len());
        self.read_offset += n;
    }

    /// True once every byte has been copied out; the chunk is then evicted.
    pub(crate) fn is_consumed(&self) -> bool {
        self.read_offset >= self.bytes.len()
    }
}

/// Point-in-time snapshot of the queue for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Frames currently queued (may exceed `capacity_frames`).
    pub queued_frames: u64,
    /// Bytes currently queued across all chunks.
    pub queued_bytes: u64,
    /// Number of pending chunks.
    pub chunks: usize,
    /// Advisory capacity in frames.
    pub capacity_frames: u64,
    /// Drain calls that found the queue already empty.
    pub underruns: u64,
}

/// FIFO of pending write chunks with O(1) frame/byte counters.
#[derive(Debug)]
pub struct ChunkQueue {
    chunks: VecDeque<Chunk>,
    queued_frames: u64,
    queued_bytes: u64,
    underruns: u64,
}

impl ChunkQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            chunks: VecDeque::new(),
            queued_frames: 0,
            queued_bytes: 0,
            underruns: 0,
        }
    }

    /// Append a chunk, crediting `bytes.len() / bytes_per_frame` frames.
    ///
    /// The caller must have validated frame alignment; the queue itself never
    /// rejects a write. Empty writes are accepted and queue nothing.
    pub fn enqueue(&mut self, bytes: Vec<u8>, bytes_per_frame: usize) {
        debug_assert!(bytes_per_frame > 0);
        debug_assert_eq!(bytes.len() % bytes_per_frame, 0);
        if bytes.is_empty() {
            return;
        }
        self.queued_frames += (bytes.len() / bytes_per_frame) as u64;
        self.queued_bytes += bytes.len() as u64;
        self.chunks.push_back(Chunk::new(bytes));
    }

    /// Frames currently queued. O(1).
    pub fn queued_frames(&self) -> u64 {
        self.queued_frames
    }

    /// Bytes currently queued across all chunks. O(1).
    pub fn total_queued_bytes(&self) -> u64 {
        self.queued_bytes
    }

    /// True when no chunk has unread bytes.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Snapshot of the queue counters.
    pub fn stats(&self, capacity_frames: u64) -> QueueStats {
        QueueStats {
            queued_frames: self.queued_frames,
            queued_bytes: self.queued_bytes,
            chunks: self.chunks.len(),
            capacity_frames,
            underruns: self.underruns,
        }
    }

    pub(crate) fn front_mut(&mut self) -> Option<&mut Chunk> {
        self.chunks.front_mut()
    }

    /// Remove the oldest chunk once fully consumed.
    ///
    /// Evicting the last chunk zeroes the counters. Frame debits round
    /// through the drain-time stride, so a geometry change between enqueue
    /// and drain can leave a residue; an empty queue must report zero frames.
    pub(crate) fn evict_front(&mut self) {
        debug_assert!(self.chunks.front().is_none_or(Chunk::is_consumed));
        self.chunks.pop_front();
        if self.chunks.is_empty() {
            self.queued_frames = 0;
            self.queued_bytes = 0;
        }
    }

    /// Debit the counters for a copied span.
    ///
    /// Frame math uses the bytes-per-frame in effect at drain time, not at
    /// write time, and saturates at zero so the count can never go negative
    /// when the geometry changed mid-flight.
    pub(crate) fn record_consumed(&mut self, bytes: usize, bytes_per_frame: usize) {
        self.queued_bytes = self.queued_bytes.saturating_sub(bytes as u64);
        self.queued_frames = self
            .queued_frames
            .saturating_sub((bytes / bytes_per_frame) as u64);
    }

    /// Count a drain call that found nothing queued.
    pub(crate) fn record_underrun(&mut self) {
        self.underruns += 1;
    }
}

impl Default for ChunkQueue {
    fn default() -> Self {
        Self::new()
    }
}
