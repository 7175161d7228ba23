//! Tests for the output stream lifecycle.
//!
//! Covers the producer surface, the quantum drain path, backpressure
//! wakeups, negotiation, and teardown ordering against a mock transport.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::negotiation::FormatCandidates;
use crate::transport::Transport;
use crate::{OutputStream, SampleFormat, StreamConfig, StreamEvents, TransportError};


#[derive(Default)]
struct MockState {
    buffers: VecDeque<Vec<u8>>,
    filled: Vec<Vec<u8>>,
    commits: Vec<(usize, usize)>,
    connects: Vec<FormatCandidates>,
    disconnects: usize,
    exclusive_entries: usize,
    fail_connect: bool,
    fail_disconnect: bool,
}

/// A transport whose buffers are staged by the test and inspected after.
///
/// Clones share state, so a test can keep a handle after the stream takes
/// ownership of the transport.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stage a zeroed quantum buffer of the given size.
    pub(crate) fn stage_buffer(&self, len: usize) {
        self.state.lock().buffers.push_back(vec![0u8; len]);
    }

    /// Stage a quantum buffer with known contents, to check untouched bytes.
    pub(crate) fn stage_buffer_filled(&self, bytes: Vec<u8>) {
        self.state.lock().buffers.push_back(bytes);
    }

    pub(crate) fn fail_next_connect(&self) {
        self.state.lock().fail_connect = true;
    }

    pub(crate) fn commits(&self) -> Vec<(usize, usize)> {
        self.state.lock().commits.clone()
    }

    pub(crate) fn filled_buffers(&self) -> Vec<Vec<u8>> {
        self.state.lock().filled.clone()
    }

    pub(crate) fn connects(&self) -> Vec<FormatCandidates> {
        self.state.lock().connects.clone()
    }

    pub(crate) fn disconnects(&self) -> usize {
        self.state.lock().disconnects
    }

    pub(crate) fn exclusive_entries(&self) -> usize {
        self.state.lock().exclusive_entries
    }
}

impl Transport for MockTransport {
    fn with_exclusive_access<R>(&self, f: impl FnOnce() -> R) -> R {
        self.state.lock().exclusive_entries += 1;
        f()
    }

    fn connect_stream(&self, candidates: &FormatCandidates) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if state.fail_connect {
            state.fail_connect = false;
            return Err(TransportError::new("connect_stream", "injected failure"));
        }
        state.connects.push(candidates.clone());
        Ok(())
    }

    fn disconnect_stream(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if state.fail_disconnect {
            state.fail_disconnect = false;
            return Err(TransportError::new("disconnect_stream", "injected failure"));
        }
        state.disconnects += 1;
        Ok(())
    }

    fn acquire_buffer<R>(&self, fill: impl FnOnce(&mut [u8]) -> R) -> Option<R> {
        let mut buffer = self.state.lock().buffers.pop_front()?;
        let result = fill(&mut buffer);
        self.state.lock().filled.push(buffer);
        Some(result)
    }

    fn commit_buffer(&self, bytes_written: usize, stride_bytes: usize) {
        self.state.lock().commits.push((bytes_written, stride_bytes));
    }
}

/// Stereo 32-bit float at 48 kHz, 8 bytes per frame, small capacity so
/// backpressure is easy to trip.
pub(crate) fn small_config() -> StreamConfig {
    StreamConfig {
        format: SampleFormat::F32,
        rate: 48_000,
        channels: 2,
        capacity_frames: 4,
    }
}

pub(crate) fn make_stream(
    config: StreamConfig,
) -> (MockTransport, OutputStream<MockTransport>, StreamEvents) {
    let transport = MockTransport::new();
    let (stream, events) = OutputStream::new(transport.clone(), config);
    (transport, stream, events)
}
