//! Error types for the output engine.

/// Failure reported by the external transport collaborator.
///
/// The engine never produces these itself; it surfaces them from
/// `connect_stream`/`disconnect_stream` on the in-flight awaitable.
#[derive(Debug, Clone, thiserror::Error)]
#[error("transport error during {operation}: {details}")]
pub struct TransportError {
    /// The transport operation that failed ("connect", "disconnect", ...).
    pub operation: &'static str,
    /// Human-readable failure description from the transport.
    pub details: String,
}

impl TransportError {
    /// Create a transport error for the given operation.
    pub fn new(operation: &'static str, details: impl Into<String>) -> Self {
        Self {
            operation,
            details: details.into(),
        }
    }
}

/// Errors produced by the output engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AudioOutputError {
    /// A write whose length is not a multiple of the current frame size.
    #[error(
        "buffer size {size} must align to frame size {frame_size} ({bytes_per_sample} x {channels})"
    )]
    MisalignedWrite {
        /// Length of the rejected write, in bytes.
        size: usize,
        /// Current bytes per frame.
        frame_size: usize,
        /// Current bytes per sample.
        bytes_per_sample: usize,
        /// Current channel count.
        channels: u32,
    },

    /// A negotiation descriptor that cannot be offered to the service.
    #[error("invalid negotiation descriptor: {0}")]
    InvalidDescriptor(String),

    /// `connect()` called while the stream is not in the unconnected phase.
    #[error("connect() requires an unconnected stream (current phase: {0:?})")]
    NotConnectable(crate::negotiation::StreamPhase),

    /// Failure from the external transport collaborator.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The stream was destroyed; pending waiters and later calls get this.
    #[error("stream destroyed")]
    Destroyed,
}

impl AudioOutputError {
    /// Create a misaligned-write error from the rejected length and the
    /// geometry in effect at the time of the write.
    pub fn misaligned_write(size: usize, geometry: &crate::format::FrameGeometry) -> Self {
        Self::MisalignedWrite {
            size,
            frame_size: geometry.bytes_per_frame(),
            bytes_per_sample: geometry.bytes_per_sample,
            channels: geometry.channels,
        }
    }

    /// Create an invalid-descriptor error.
    pub fn invalid_descriptor(details: impl Into<String>) -> Self {
        Self::InvalidDescriptor(details.into())
    }

    /// True for caller mistakes reported synchronously with state untouched.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::MisalignedWrite { .. } | Self::InvalidDescriptor(_) | Self::NotConnectable(_)
        )
    }

    /// True for errors that leave the stream unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Destroyed | Self::Transport(_))
    }
}

/// Result type for output engine operations.
pub type AudioOutputResult<T> = Result<T, AudioOutputError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FrameGeometry;

    #[test]
    fn misaligned_write_reports_geometry() {
        let geometry = FrameGeometry::default();
        let err = AudioOutputError::misaligned_write(13, &geometry);
        let msg = err.to_string();
        assert!(msg.contains("13"), "message should carry the length: {msg}");
        assert!(
            msg.contains("16"),
            "message should carry the frame size: {msg}"
        );
        assert!(err.is_usage());
        assert!(!err.is_fatal());
    }

    #[test]
    fn transport_errors_are_fatal() {
        let err = AudioOutputError::from(TransportError::new("connect", "service unavailable"));
        assert!(err.is_fatal());
        assert!(!err.is_usage());
        assert_eq!(
            err.to_string(),
            "transport error during connect: service unavailable"
        );
    }
}
