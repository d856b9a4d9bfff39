//! Decoder trait and format registry
//!
//! Each supported container/codec family is one [`FormatDecoder`]. The
//! [`DecoderRegistry`] asks every registered decoder whether it recognizes the
//! header signature and hands the bytes to the first one that does. Adding a
//! format means registering another decoder.

use log::debug;

use super::compressed::CompressedDecoder;
use super::wav::WavDecoder;
use crate::engine::SampleBuffer;
use crate::error::DecodeError;

/// One supported input format family
pub trait FormatDecoder: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Check whether the header signature belongs to this format
    fn accepts(&self, bytes: &[u8]) -> bool;

    /// Decode the complete buffer into normalized float samples
    fn decode(&self, bytes: &[u8]) -> Result<SampleBuffer, DecodeError>;
}

/// Ordered set of decoders, tried first to last
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn FormatDecoder>>,
}

impl DecoderRegistry {
    /// Create a registry with no formats
    pub fn empty() -> Self {
        Self {
            decoders: Vec::new(),
        }
    }

    /// Add a decoder after the ones already registered
    pub fn register(&mut self, decoder: Box<dyn FormatDecoder>) {
        self.decoders.push(decoder);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, decoder: impl FormatDecoder + 'static) -> Self {
        self.register(Box::new(decoder));
        self
    }

    /// Names of the registered decoders in lookup order
    pub fn names(&self) -> Vec<&'static str> {
        self.decoders.iter().map(|d| d.name()).collect()
    }

    /// First decoder whose signature matches
    pub fn find(&self, bytes: &[u8]) -> Option<&dyn FormatDecoder> {
        self.decoders
            .iter()
            .find(|d| d.accepts(bytes))
            .map(|d| d.as_ref())
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<SampleBuffer, DecodeError> {
        let decoder = self.find(bytes).ok_or(DecodeError::UnrecognizedFormat)?;
        debug!("decoding {} bytes as {}", bytes.len(), decoder.name());

        let buffer = decoder.decode(bytes)?;

        debug!(
            "{}: {} Hz, {} channels, {} bits, {} frames",
            decoder.name(),
            buffer.sample_rate,
            buffer.channels,
            buffer.source_bits,
            buffer.frames()
        );

        Ok(buffer)
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::empty().with(WavDecoder).with(CompressedDecoder)
    }
}
