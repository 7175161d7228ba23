//! Sample encodings and frame geometry.
//!
//! The geometry is the unit system for every byte/frame conversion in the
//! engine. It is mutated only when the service confirms a format during
//! negotiation; chunks record byte lengths precisely so that a geometry
//! change between enqueue and drain cannot corrupt the accounting.

use serde::{Deserialize, Serialize};

/// Raw sample encodings the engine can be negotiated into.
///
/// The set mirrors the encodings the service enumerates; anything the engine
/// does not recognize is carried as `Other` and byte-accounted with the
/// 4-byte fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleFormat {
    /// 64-bit float.
    F64,
    /// 32-bit float.
    F32,
    /// 32-bit signed integer.
    S32,
    /// 32-bit unsigned integer.
    U32,
    /// 24-bit signed samples padded to 32 bits.
    S24_32,
    /// 16-bit signed integer.
    S16,
    /// 16-bit unsigned integer.
    U16,
    /// An encoding the engine does not recognize, by service id.
    Other(u32),
}

impl SampleFormat {
    /// Bytes per sample for this encoding.
    ///
    /// This table is authoritative: downstream byte accounting depends on it.
    /// Unrecognized encodings default to 4 bytes.
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::F64 => 8,
            SampleFormat::F32 | SampleFormat::S32 | SampleFormat::U32 | SampleFormat::S24_32 => 4,
            SampleFormat::S16 | SampleFormat::U16 => 2,
            SampleFormat::Other(_) => 4,
        }
    }
}

/// A confirmed (or proposed) stream format: encoding, rate, channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFormat {
    /// Sample encoding.
    pub format: SampleFormat,
    /// Sample rate in Hz.
    pub rate: u32,
    /// Number of channels.
    pub channels: u32,
}

/// The frame geometry currently in effect for the stream.
///
/// Invariant: `bytes_per_frame() > 0` whenever the stream is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGeometry {
    /// Sample encoding.
    pub format: SampleFormat,
    /// Bytes per sample, derived from `format` on every confirmation.
    pub bytes_per_sample: usize,
    /// Number of channels.
    pub channels: u32,
    /// Sample rate in Hz.
    pub rate: u32,
}

impl FrameGeometry {
    /// Bytes per frame: one sample per channel, taken together.
    pub const fn bytes_per_frame(&self) -> usize {
        self.bytes_per_sample * self.channels as usize
    }

    /// Apply a confirmed format, re-deriving bytes per sample.
    ///
    /// Returns `true` when anything actually changed, which is the condition
    /// for reporting a format-change event (the first confirmation counts
    /// when it differs from the constructor defaults).
    pub fn apply(&mut self, confirmed: StreamFormat) -> bool {
        let bytes_per_sample = confirmed.format.bytes_per_sample();
        let changed = confirmed.rate != self.rate
            || confirmed.channels != self.channels
            || confirmed.format != self.format
            || bytes_per_sample != self.bytes_per_sample;
        if changed {
            self.format = confirmed.format;
            self.rate = confirmed.rate;
            self.channels = confirmed.channels;
            self.bytes_per_sample = bytes_per_sample;
        }
        changed
    }

    /// The format triple currently in effect.
    pub const fn stream_format(&self) -> StreamFormat {
        StreamFormat {
            format: self.format,
            rate: self.rate,
            channels: self.channels,
        }
    }
}

impl Default for FrameGeometry {
    /// Stereo 64-bit float at 48 kHz, the geometry assumed before the first
    /// confirmed negotiation.
    fn default() -> Self {
        Self {
            format: SampleFormat::F64,
            bytes_per_sample: 8,
            channels: 2,
            rate: 48_000,
        }
    }
}
