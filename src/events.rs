//! Notifications delivered from the consumer context to the control side.

use serde::{Deserialize, Serialize};

use crate::format::StreamFormat;
use crate::properties::{Prop, StreamProperties};

/// Stream state as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamState {
    /// The stream is in an error state.
    Error,
    /// Not connected to a node.
    Unconnected,
    /// Connection in progress.
    Connecting,
    /// Connected but not processing.
    Paused,
    /// Processing audio.
    Streaming,
}

/// Which end of the stream a latency bound describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LatencyDirection {
    /// Latency toward the capture side.
    Input,
    /// Latency toward the playback side.
    Output,
}

/// One end of a latency range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LatencyBound {
    /// Latency in nanoseconds.
    pub ns: u64,
    /// Latency in quanta.
    pub quantum: u32,
    /// Latency in samples at the stream rate.
    pub rate: u32,
}

/// Latency reported by the service for this stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyInfo {
    /// Which direction the bounds describe.
    pub direction: LatencyDirection,
    /// The minimum latency.
    pub min: LatencyBound,
    /// The maximum latency.
    pub max: LatencyBound,
}

/// A parameter update pushed by the service, already decoded by the
/// transport into the engine's structured types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamUpdate {
    /// Property key/value pairs changed.
    Props(Vec<Prop>),
    /// The service confirmed (or changed) the stream geometry.
    Format(StreamFormat),
    /// The stream latency changed.
    Latency(LatencyInfo),
    /// A parameter kind the engine does not dispatch, by id.
    Other(u32),
}

/// Events emitted on the stream's notification channel.
///
/// Delivery is asynchronous and at-least-once: the consumer context sends
/// without waiting for confirmation, and nothing is dropped while the
/// receiver is alive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamEvent {
    /// The service moved the stream between states.
    StateChanged {
        /// Previous state.
        old: StreamState,
        /// New state.
        new: StreamState,
        /// Error description when `new` is [`StreamState::Error`].
        error: Option<String>,
    },
    /// Stream properties changed; carries the accumulated snapshot.
    PropertiesChanged(StreamProperties),
    /// The confirmed geometry changed (including the first confirmation).
    FormatChanged(StreamFormat),
    /// The stream latency changed.
    LatencyChanged(LatencyInfo),
    /// The service pushed a parameter kind the engine does not recognize.
    UnknownParam(u32),
}
