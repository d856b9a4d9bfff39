//! Uncompressed RIFF/WAVE decoding
//!
//! Integer PCM (8 to 32 bits) and 32-bit float are supported. Integer samples
//! are divided by `2^(bits-1)` so full scale maps to [-1.0, 1.0).

use hound::{SampleFormat, WavReader, WavSpec};
use log::warn;

use super::decoder::FormatDecoder;
use crate::engine::SampleBuffer;
use crate::error::DecodeError;

/// Minimum size of a RIFF header: `RIFF`, chunk size, `WAVE`
const RIFF_HEADER_LEN: usize = 12;

/// Decoder for PCM and IEEE float WAV files
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

impl FormatDecoder for WavDecoder {
    fn name(&self) -> &'static str {
        "wav"
    }

    fn accepts(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(b"RIFF")
    }

    fn decode(&self, bytes: &[u8]) -> Result<SampleBuffer, DecodeError> {
        if bytes.len() < RIFF_HEADER_LEN {
            return Err(DecodeError::truncated(format!(
                "RIFF header needs {} bytes, got {}",
                RIFF_HEADER_LEN,
                bytes.len()
            )));
        }
        if &bytes[8..12] != b"WAVE" {
            return Err(DecodeError::UnrecognizedFormat);
        }

        let reader = WavReader::new(bytes).map_err(map_hound_error)?;
        let spec = reader.spec();

        if spec.channels == 0 {
            return Err(DecodeError::unsupported("zero channels"));
        }
        if spec.sample_rate == 0 {
            return Err(DecodeError::unsupported("zero sample rate"));
        }

        let mut samples = read_samples_as_f32(reader, spec)?;

        let channels = spec.channels as usize;
        let partial = samples.len() % channels;
        if partial != 0 {
            warn!(
                "dropping {} samples of an incomplete trailing frame",
                partial
            );
            samples.truncate(samples.len() - partial);
        }

        Ok(SampleBuffer::new(
            samples,
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample,
        ))
    }
}

/// Read every declared sample and convert to f32
fn read_samples_as_f32(
    mut reader: WavReader<&[u8]>,
    spec: WavSpec,
) -> Result<Vec<f32>, DecodeError> {
    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(map_hound_error),
        (SampleFormat::Float, bits) => Err(DecodeError::unsupported(format!(
            "{}-bit float samples",
            bits
        ))),
        (SampleFormat::Int, bits @ 1..=32) => {
            let scale = (1u64 << (bits - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v as f64 / scale) as f32))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(map_hound_error)
        }
        (SampleFormat::Int, bits) => Err(DecodeError::unsupported(format!(
            "{}-bit integer samples",
            bits
        ))),
    }
}

fn map_hound_error(err: hound::Error) -> DecodeError {
    match err {
        // Reads from an in-memory slice only fail when they run past its end
        hound::Error::IoError(e) => DecodeError::truncated(e.to_string()),
        hound::Error::UnfinishedSample => DecodeError::truncated("data ends inside a sample"),
        other => DecodeError::unsupported(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::fixtures::{wav_bytes, wav_float_bytes};
    use approx::assert_relative_eq;

    #[test]
    fn test_decode_16bit_mono() {
        let bytes = wav_bytes(44100, 1, 16, &[0, 16384, -16384, -32768, 32767]);
        let buffer = WavDecoder.decode(&bytes).unwrap();

        assert_eq!(buffer.sample_rate, 44100);
        assert_eq!(buffer.channels, 1);
        assert_eq!(buffer.source_bits, 16);
        assert_eq!(buffer.frames(), 5);
        assert_eq!(&buffer.samples[..4], &[0.0, 0.5, -0.5, -1.0]);
        assert_relative_eq!(buffer.samples[4], 32767.0 / 32768.0);
    }

    #[test]
    fn test_decode_8bit_is_centered() {
        // hound stores 8-bit as unsigned; values are handed back signed
        let bytes = wav_bytes(8000, 1, 8, &[0, 64, -128, 127]);
        let buffer = WavDecoder.decode(&bytes).unwrap();

        assert_eq!(buffer.samples[0], 0.0);
        assert_eq!(buffer.samples[1], 0.5);
        assert_eq!(buffer.samples[2], -1.0);
        assert_relative_eq!(buffer.samples[3], 127.0 / 128.0);
    }

    #[test]
    fn test_decode_24bit_stereo() {
        let bytes = wav_bytes(48000, 2, 24, &[4_194_304, -4_194_304, 8_388_607, 0]);
        let buffer = WavDecoder.decode(&bytes).unwrap();

        assert_eq!(buffer.channels, 2);
        assert_eq!(buffer.frames(), 2);
        assert_eq!(buffer.frame(0), &[0.5, -0.5]);
        assert_relative_eq!(buffer.samples[2], 8_388_607.0 / 8_388_608.0);
    }

    #[test]
    fn test_decode_float() {
        let bytes = wav_float_bytes(22050, 1, &[0.25, -0.75, 1.0]);
        let buffer = WavDecoder.decode(&bytes).unwrap();

        assert_eq!(buffer.source_bits, 32);
        assert_eq!(buffer.samples, vec![0.25, -0.75, 1.0]);
    }

    #[test]
    fn test_short_header_is_truncated() {
        let result = WavDecoder.decode(b"RIFF\x24\0\0\0");
        assert!(matches!(result, Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn test_cut_inside_fmt_chunk_is_truncated() {
        let bytes = wav_bytes(44100, 1, 16, &[1, 2, 3]);
        let result = WavDecoder.decode(&bytes[..20]);
        assert!(matches!(result, Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn test_declared_data_longer_than_file_is_truncated() {
        let bytes = wav_bytes(44100, 1, 16, &[100; 64]);
        // Drop the last 10 samples while the header still declares 64
        let result = WavDecoder.decode(&bytes[..bytes.len() - 20]);
        assert!(matches!(result, Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn test_riff_without_wave_is_unrecognized() {
        let result = WavDecoder.decode(b"RIFF\x04\0\0\0AVI LIST");
        assert_eq!(result.unwrap_err(), DecodeError::UnrecognizedFormat);
    }

    #[test]
    fn test_compressed_wav_is_unsupported() {
        let mut bytes = wav_bytes(44100, 1, 16, &[0; 8]);
        // Format tag lives right after "fmt " and its size field
        bytes[20] = 0x02; // MS ADPCM
        let result = WavDecoder.decode(&bytes);
        assert!(matches!(result, Err(DecodeError::UnsupportedEncoding { .. })));
    }

    #[test]
    fn test_accepts_riff_signature() {
        assert!(WavDecoder.accepts(b"RIFF"));
        assert!(!WavDecoder.accepts(b"fLaC"));
        assert!(!WavDecoder.accepts(b"RI"));
    }
}
