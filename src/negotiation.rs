//! Candidate-format negotiation with the audio service.
//!
//! The producer offers ordered lists of acceptable encodings and rates; the
//! service picks one of each and confirms the resulting geometry, possibly
//! again later when the shared clock or routing changes. The engine only
//! models the candidate set and the phase machine; the wire encoding belongs
//! to the transport.

use serde::{Deserialize, Serialize};

use crate::error::{AudioOutputError, AudioOutputResult};
use crate::format::SampleFormat;

/// Where the stream is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamPhase {
    /// No connection attempted yet.
    Unconnected,
    /// Candidates issued, waiting for the service to confirm a geometry.
    Negotiating,
    /// A geometry is confirmed; the stream may renegotiate at any time.
    Active,
    /// Torn down. Terminal.
    Destroyed,
}

/// What the producer is willing to accept, built once per `connect` call.
///
/// The first entry of each list is the preferred choice; order matters.
/// An empty rate list offers the stream's current rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationDescriptor {
    /// Acceptable sample encodings, most preferred first. Must be non-empty.
    pub formats: Vec<SampleFormat>,
    /// Acceptable sample rates in Hz, most preferred first.
    pub rates: Vec<u32>,
    /// Fixed channel count for this stream.
    pub channels: u32,
}

impl NegotiationDescriptor {
    /// Descriptor offering a single format at the given rate.
    pub fn single(format: SampleFormat, rate: u32, channels: u32) -> Self {
        Self {
            formats: vec![format],
            rates: vec![rate],
            channels,
        }
    }

    /// Validate and expand into the candidate set handed to the transport.
    ///
    /// `current_rate` backfills an empty rate list; an empty format list is
    /// a usage error reported synchronously.
    pub fn candidates(&self, current_rate: u32) -> AudioOutputResult<FormatCandidates> {
        if self.formats.is_empty() {
            return Err(AudioOutputError::invalid_descriptor(
                "preferred format list must not be empty",
            ));
        }
        if self.channels == 0 {
            return Err(AudioOutputError::invalid_descriptor(
                "channel count must be positive",
            ));
        }
        let rates = if self.rates.is_empty() {
            vec![current_rate]
        } else {
            self.rates.clone()
        };
        Ok(FormatCandidates {
            formats: Choice::new(self.formats.clone()),
            rates: Choice::new(rates),
            channels: self.channels,
        })
    }
}

/// An enumerated choice set: the preferred entry plus every alternative.
///
/// The service may pick any entry, not necessarily the preferred one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice<T> {
    /// The default the producer asks for.
    pub preferred: T,
    /// The full ordered enumeration, preferred entry included.
    pub alternatives: Vec<T>,
}

impl<T: Clone> Choice<T> {
    fn new(entries: Vec<T>) -> Self {
        debug_assert!(!entries.is_empty());
        Self {
            preferred: entries[0].clone(),
            alternatives: entries,
        }
    }

    /// True when the producer offered exactly one option.
    pub fn is_fixed(&self) -> bool {
        self.alternatives.len() == 1
    }
}

/// The candidate geometry offered to the service at connect time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatCandidates {
    /// Encoding choice set.
    pub formats: Choice<SampleFormat>,
    /// Rate choice set.
    pub rates: Choice<u32>,
    /// Fixed channel count.
    pub channels: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_entry_is_preferred() {
        let descriptor = NegotiationDescriptor {
            formats: vec![SampleFormat::F32, SampleFormat::S16, SampleFormat::F64],
            rates: vec![48_000, 44_100],
            channels: 2,
        };
        let candidates = descriptor.candidates(48_000).unwrap();
        assert_eq!(candidates.formats.preferred, SampleFormat::F32);
        assert_eq!(candidates.formats.alternatives.len(), 3);
        assert_eq!(candidates.rates.preferred, 48_000);
        assert!(!candidates.rates.is_fixed());
    }

    #[test]
    fn empty_rates_default_to_current_rate() {
        let descriptor = NegotiationDescriptor {
            formats: vec![SampleFormat::F64],
            rates: Vec::new(),
            channels: 2,
        };
        let candidates = descriptor.candidates(96_000).unwrap();
        assert_eq!(candidates.rates.preferred, 96_000);
        assert!(candidates.rates.is_fixed());
    }

    #[test]
    fn empty_formats_are_a_usage_error() {
        let descriptor = NegotiationDescriptor {
            formats: Vec::new(),
            rates: vec![48_000],
            channels: 2,
        };
        let err = descriptor.candidates(48_000).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn zero_channels_are_a_usage_error() {
        let descriptor = NegotiationDescriptor {
            formats: vec![SampleFormat::F32],
            rates: vec![48_000],
            channels: 0,
        };
        assert!(descriptor.candidates(48_000).unwrap_err().is_usage());
    }
}
