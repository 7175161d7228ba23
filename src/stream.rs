//! The output stream: producer surface, real-time process path, teardown.
//!
//! Two execution contexts meet here. The control context writes chunks,
//! awaits backpressure, and drives connect/destroy through the transport's
//! coarse lock. The consumer context is [`OutputStream::process`], invoked
//! once per quantum by the transport's clock: it drains into the hardware
//! buffer, zero-fills underruns, and wakes backpressure waiters without ever
//! blocking on the control side. Byte accounting inside a process call
//! happens-before any wakeup that call triggers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::drain::drain_into;
use crate::error::{AudioOutputError, AudioOutputResult};
use crate::events::{ParamUpdate, StreamEvent, StreamState};
use crate::format::{FrameGeometry, SampleFormat, StreamFormat};
use crate::negotiation::{NegotiationDescriptor, StreamPhase};
use crate::properties::StreamProperties;
use crate::queue::{ChunkQueue, QueueStats};
use crate::signal::BackpressureSignal;
use crate::transport::Transport;

/// Initial geometry and buffering for a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Sample encoding assumed until the first confirmed negotiation.
    pub format: SampleFormat,
    /// Sample rate assumed until the first confirmed negotiation.
    pub rate: u32,
    /// Channel count.
    pub channels: u32,
    /// Advisory queue capacity in frames; governs backpressure only.
    pub capacity_frames: u64,
}

impl Default for StreamConfig {
    /// Stereo 64-bit float at 48 kHz with a 2048-frame buffer.
    fn default() -> Self {
        Self {
            format: SampleFormat::F64,
            rate: 48_000,
            channels: 2,
            capacity_frames: 2048,
        }
    }
}

/// State shared between the control and consumer contexts.
struct StreamCore {
    geometry: FrameGeometry,
    queue: ChunkQueue,
    phase: StreamPhase,
}

struct StreamShared {
    core: Mutex<StreamCore>,
    capacity_frames: u64,
    space: BackpressureSignal,
    drained: BackpressureSignal,
    properties: Mutex<StreamProperties>,
    events: Mutex<Option<mpsc::UnboundedSender<StreamEvent>>>,
    destroyed: AtomicBool,
}

impl StreamShared {
    fn emit(&self, event: StreamEvent) {
        if let Some(sender) = self.events.lock().as_ref() {
            // Non-blocking; a dropped receiver just means nobody listens.
            let _ = sender.send(event);
        }
    }
}

/// Receiving end of the stream's notification channel.
///
/// Created together with the stream; events stop after `destroy()` releases
/// the sending side.
pub struct StreamEvents {
    receiver: mpsc::UnboundedReceiver<StreamEvent>,
}

impl StreamEvents {
    /// Await the next event; `None` once the stream is destroyed and the
    /// backlog is fully consumed.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }

    /// Non-blocking poll for a queued event.
    pub fn try_recv(&mut self) -> Option<StreamEvent> {
        self.receiver.try_recv().ok()
    }
}

/// An audio output stream over a [`Transport`].
///
/// See the crate docs for the full lifecycle; in short: `write` queues
/// frame-aligned bytes, `process` drains them into hardware buffers on the
/// service clock, `wait_for_space`/`wait_for_drained` pace the producer, and
/// `connect`/`destroy` run the negotiation state machine.
pub struct OutputStream<T: Transport> {
    transport: Arc<T>,
    shared: Arc<StreamShared>,
}

impl<T: Transport> OutputStream<T> {
    /// Create a stream over the given transport.
    ///
    /// # Panics
    ///
    /// Panics when `config.channels` or `config.capacity_frames` is zero;
    /// both would make every byte/frame conversion meaningless.
    pub fn new(transport: T, config: StreamConfig) -> (Self, StreamEvents) {
        assert!(config.channels > 0, "channel count must be positive");
        assert!(
            config.capacity_frames > 0,
            "capacity must be a positive frame count"
        );

        let geometry = FrameGeometry {
            format: config.format,
            bytes_per_sample: config.format.bytes_per_sample(),
            channels: config.channels,
            rate: config.rate,
        };
        let (sender, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(StreamShared {
            core: Mutex::new(StreamCore {
                geometry,
                queue: ChunkQueue::new(),
                phase: StreamPhase::Unconnected,
            }),
            capacity_frames: config.capacity_frames,
            space: BackpressureSignal::new(),
            drained: BackpressureSignal::new(),
            properties: Mutex::new(StreamProperties::default()),
            events: Mutex::new(Some(sender)),
            destroyed: AtomicBool::new(false),
        });

        (
            Self {
                transport: Arc::new(transport),
                shared,
            },
            StreamEvents { receiver },
        )
    }

    /// Queue a chunk of interleaved audio bytes.
    ///
    /// The length must be a multiple of the current frame size; a misaligned
    /// write is rejected synchronously with the queue untouched. Writes are
    /// never rejected for being over capacity; capacity only decides when
    /// the producer is told to pause via [`wait_for_space`](Self::wait_for_space).
    pub fn write(&self, bytes: Vec<u8>) -> AudioOutputResult<()> {
        if self.shared.destroyed.load(Ordering::Acquire) {
            return Err(AudioOutputError::Destroyed);
        }
        let mut core = self.shared.core.lock();
        let bytes_per_frame = core.geometry.bytes_per_frame();
        if bytes.len() % bytes_per_frame != 0 {
            return Err(AudioOutputError::misaligned_write(
                bytes.len(),
                &core.geometry,
            ));
        }
        core.queue.enqueue(bytes, bytes_per_frame);
        Ok(())
    }

    /// Queue a slice of samples, casting them to bytes.
    ///
    /// The sample type must match the negotiated encoding for the result to
    /// be meaningful; alignment is validated the same way as [`write`](Self::write).
    pub fn write_samples<S: bytemuck::NoUninit>(&self, samples: &[S]) -> AudioOutputResult<()> {
        self.write(bytemuck::cast_slice(samples).to_vec())
    }

    /// Instantaneous free capacity in bytes, clamped at zero.
    pub fn available_bytes(&self) -> usize {
        let core = self.shared.core.lock();
        let free_frames = self
            .shared
            .capacity_frames
            .saturating_sub(core.queue.queued_frames());
        free_frames as usize * core.geometry.bytes_per_frame()
    }

    /// Snapshot of the queue counters for diagnostics.
    pub fn stats(&self) -> QueueStats {
        self.shared
            .core
            .lock()
            .queue
            .stats(self.shared.capacity_frames)
    }

    /// Wait until the queue has free capacity; resolves with the free byte
    /// count.
    ///
    /// Immediate when capacity is already free. Otherwise the call shares
    /// the single pending waiter, which the drain path resolves on the first
    /// quantum that brings the queue strictly below capacity. Rejected with
    /// [`AudioOutputError::Destroyed`] at teardown.
    pub async fn wait_for_space(&self) -> AudioOutputResult<usize> {
        let shared = Arc::clone(&self.shared);
        shared
            .space
            .wait(|| {
                let n = self.available_bytes();
                (n > 0).then_some(n)
            })
            .await
    }

    /// Wait until the producer backlog is fully drained.
    ///
    /// "Drained" means a quantum found nothing queued: the producer has no
    /// backlog, not that the hardware buffer is silent. Immediate when the
    /// queue is already empty. Rejected with [`AudioOutputError::Destroyed`]
    /// at teardown.
    pub async fn wait_for_drained(&self) -> AudioOutputResult<()> {
        let shared = Arc::clone(&self.shared);
        shared
            .drained
            .wait(|| {
                let core = self.shared.core.lock();
                (core.queue.queued_frames() == 0).then_some(())
            })
            .await
    }

    /// Offer the descriptor's candidate geometry to the service.
    ///
    /// Valid only on an unconnected stream. Descriptor validation failures
    /// are usage errors and leave the stream unconnected; transport failures
    /// surface here and also leave it unconnected, never half-initialized.
    pub async fn connect(&self, descriptor: &NegotiationDescriptor) -> AudioOutputResult<()> {
        if self.shared.destroyed.load(Ordering::Acquire) {
            return Err(AudioOutputError::Destroyed);
        }
        let candidates = {
            let mut core = self.shared.core.lock();
            match core.phase {
                StreamPhase::Unconnected => {}
                StreamPhase::Destroyed => return Err(AudioOutputError::Destroyed),
                phase => return Err(AudioOutputError::NotConnectable(phase)),
            }
            let candidates = descriptor.candidates(core.geometry.rate)?;
            core.phase = StreamPhase::Negotiating;
            candidates
        };

        tracing::debug!(?candidates, "connecting stream");
        let connected = self
            .transport
            .with_exclusive_access(|| self.transport.connect_stream(&candidates));
        if let Err(err) = connected {
            let mut core = self.shared.core.lock();
            if core.phase == StreamPhase::Negotiating {
                core.phase = StreamPhase::Unconnected;
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Tear the stream down. Idempotent; only the first call reaches the
    /// transport.
    ///
    /// Ordering: reject pending (and all future) backpressure waiters, stop
    /// accepting writes, detach from the transport under its coarse lock,
    /// release the notification channel. Rejection precedes the destroyed
    /// flag, so no waiter can resolve successfully once the flag is
    /// observable. After this returns, no consumer-context callback observes
    /// live state.
    pub async fn destroy(&self) -> AudioOutputResult<()> {
        self.shared.space.reject();
        self.shared.drained.reject();
        if self.shared.destroyed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.shared.core.lock().phase = StreamPhase::Destroyed;

        let detached = self
            .transport
            .with_exclusive_access(|| self.transport.disconnect_stream());

        *self.shared.events.lock() = None;
        tracing::debug!("stream destroyed");
        detached.map_err(AudioOutputError::from)
    }

    /// The real-time entry point, invoked once per quantum.
    ///
    /// Acquires the hardware buffer from the transport, drains queued chunks
    /// into the largest frame-aligned prefix, zero-fills any shortfall, then
    /// fires backpressure signals and commits the filled region. Skips the
    /// invocation (with a warning) when no buffer is available.
    pub fn process(&self) {
        if self.shared.destroyed.load(Ordering::Acquire) {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let committed = self.transport.acquire_buffer(|dest| {
            let (byte_count, stride, outcome) = {
                let mut core = shared.core.lock();
                let stride = core.geometry.bytes_per_frame();
                let byte_count = dest.len() - dest.len() % stride;
                let outcome = drain_into(&mut core.queue, &mut dest[..byte_count], stride);
                (byte_count, stride, outcome)
            };

            // Accounting above happens-before these wakeups: a producer
            // waking on "space" always sees the post-drain queue state.
            if outcome.queued_frames_after < shared.capacity_frames {
                shared.space.resolve();
            }
            if outcome.copied_bytes == 0 {
                shared.drained.resolve();
            }

            (byte_count, stride)
        });

        match committed {
            Some((bytes_written, stride)) => self.transport.commit_buffer(bytes_written, stride),
            None => tracing::warn!("no output buffer available, skipping quantum"),
        }
    }

    /// Service entry point: the stream moved between states.
    pub fn handle_state_change(
        &self,
        old: StreamState,
        new: StreamState,
        error: Option<String>,
    ) {
        self.shared.emit(StreamEvent::StateChanged { old, new, error });
    }

    /// Service entry point: a parameter changed.
    ///
    /// Dispatches property updates into the accumulated snapshot, confirmed
    /// formats into the negotiation path, latency into its event, and
    /// anything unrecognized into [`StreamEvent::UnknownParam`].
    pub fn handle_param_change(&self, update: ParamUpdate) {
        match update {
            ParamUpdate::Props(props) => {
                let snapshot = {
                    let mut properties = self.shared.properties.lock();
                    properties.apply_all(props);
                    properties.clone()
                };
                self.shared.emit(StreamEvent::PropertiesChanged(snapshot));
            }
            ParamUpdate::Format(confirmed) => self.apply_format(confirmed),
            ParamUpdate::Latency(info) => self.shared.emit(StreamEvent::LatencyChanged(info)),
            ParamUpdate::Other(id) => self.shared.emit(StreamEvent::UnknownParam(id)),
        }
    }

    /// The geometry currently in effect.
    pub fn geometry(&self) -> FrameGeometry {
        self.shared.core.lock().geometry
    }

    /// Where the stream is in its lifecycle.
    pub fn phase(&self) -> StreamPhase {
        self.shared.core.lock().phase
    }

    fn apply_format(&self, confirmed: StreamFormat) {
        let changed = {
            let mut core = self.shared.core.lock();
            if core.phase == StreamPhase::Destroyed {
                return;
            }
            if core.phase == StreamPhase::Negotiating {
                core.phase = StreamPhase::Active;
            }
            core.geometry.apply(confirmed)
        };
        if changed {
            tracing::debug!(?confirmed, "stream format changed");
            self.shared.emit(StreamEvent::FormatChanged(confirmed));
        }
    }
}
