// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::box_collection)] // Warns on boxed `Vec`, `String`, etc.
#![warn(clippy::vec_box)] // Avoids using `Vec<Box<T>>` when unnecessary
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::let_unit_value)] // Avoids binding `()` to variables
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_safety_doc)] // Docs for `unsafe` functions
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![deny(missing_docs)] // Documentation is a must for release

//! # audio_output
//!
//! Buffered, backpressure-aware audio output on top of a pluggable real-time
//! transport.
//!
//! ## Overview
//!
//! The crate sits between an application that produces interleaved audio
//! bytes at its own pace and a service that consumes them on a hard
//! real-time clock. An [`OutputStream`] queues writes in a chunk queue,
//! drains them into transport buffers one quantum at a time, zero-fills when
//! the producer falls behind, and tells the producer when to pause and when
//! to resume through awaitable backpressure signals.
//!
//! The real-time side never allocates, never blocks on the producer, and
//! never fails: a missing buffer skips the quantum, an empty queue plays
//! silence.
//!
//! ## Installation
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! audio_output = "0.1.0"
//! ```
//!
//! ## Error Handling
//!
//! Errors are split by who can act on them: usage errors (misaligned writes,
//! connecting a connected stream, invalid descriptors) are synchronous and
//! leave all state untouched, while transport failures carry the failing
//! operation for logging:
//!
//! ```rust
//! use audio_output::{AudioOutputError, AudioOutputResult, TransportError};
//!
//! let result: AudioOutputResult<()> =
//!     Err(AudioOutputError::Transport(TransportError::new(
//!         "connect_stream",
//!         "service refused the candidate set",
//!     )));
//!
//! match result {
//!     Ok(()) => {}
//!     Err(err) if err.is_usage() => eprintln!("caller bug: {err}"),
//!     Err(err) => eprintln!("stream failed: {err}"),
//! }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use audio_output::{NegotiationDescriptor, OutputStream, SampleFormat, StreamConfig};
//!
//! let (stream, mut events) = OutputStream::new(transport, StreamConfig::default());
//! stream
//!     .connect(&NegotiationDescriptor::single(SampleFormat::F32, 48_000, 2))
//!     .await?;
//!
//! // Pace the producer off the queue's free capacity.
//! for chunk in chunks {
//!     stream.write(chunk)?;
//!     if stream.available_bytes() == 0 {
//!         stream.wait_for_space().await?;
//!     }
//! }
//!
//! stream.wait_for_drained().await?;
//! stream.destroy().await?;
//! ```

mod drain;
mod error;
mod events;
mod format;
mod negotiation;
mod properties;
mod queue;
mod signal;
mod stream;
mod transport;

#[cfg(test)]
mod tests;

pub use drain::DrainOutcome;
pub use error::{AudioOutputError, AudioOutputResult, TransportError};
pub use events::{LatencyBound, LatencyDirection, LatencyInfo, ParamUpdate, StreamEvent, StreamState};
pub use format::{FrameGeometry, SampleFormat, StreamFormat};
pub use negotiation::{Choice, FormatCandidates, NegotiationDescriptor, StreamPhase};
pub use properties::{ChannelInfo, Prop, PropKey, PropValue, StreamProperties};
pub use queue::QueueStats;
pub use stream::{OutputStream, StreamConfig, StreamEvents};
pub use transport::Transport;
