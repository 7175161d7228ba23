//! The seam between the engine and the audio service.
//!
//! Everything the engine needs from the session/connection layer is behind
//! this trait: buffer handoff for the real-time path, the service's coarse
//! lock for connect/destroy mutations, and issuing/releasing the stream
//! itself. Implementations own the service plumbing; the engine never talks
//! to the service directly.

use crate::error::TransportError;
use crate::negotiation::FormatCandidates;

/// External collaborator providing hardware buffers and the service link.
///
/// Methods take `&self`; implementations are expected to manage their own
/// interior mutability, since the real-time path and the control path call
/// in from different threads.
pub trait Transport: Send + Sync + 'static {
    /// Scoped acquisition of the service's coarse lock.
    ///
    /// Used around connect/destroy mutations, which are explicitly outside
    /// the real-time path. The periodic consumer invocation never contends
    /// with this lock except during those transitions.
    fn with_exclusive_access<R>(&self, f: impl FnOnce() -> R) -> R;

    /// Offer the candidate geometry to the service and begin negotiation.
    ///
    /// Called under [`with_exclusive_access`](Self::with_exclusive_access).
    fn connect_stream(&self, candidates: &FormatCandidates) -> Result<(), TransportError>;

    /// Detach the stream from the service.
    ///
    /// Called under [`with_exclusive_access`](Self::with_exclusive_access)
    /// during teardown. Must be idempotent.
    fn disconnect_stream(&self) -> Result<(), TransportError>;

    /// Hand the engine one hardware buffer for this quantum.
    ///
    /// Returns `None` when no buffer is currently available, in which case
    /// the engine skips the invocation (reportable, non-fatal). Otherwise
    /// `fill` runs exactly once with the destination buffer and its result
    /// is returned.
    fn acquire_buffer<R>(&self, fill: impl FnOnce(&mut [u8]) -> R) -> Option<R>;

    /// Publish the filled region of the buffer handed out by the previous
    /// [`acquire_buffer`](Self::acquire_buffer) call.
    fn commit_buffer(&self, bytes_written: usize, stride_bytes: usize);
}
