//! Compressed format decoding using symphonia
//!
//! Handles MP3, FLAC, Ogg Vorbis and AAC in MP4 containers. The whole input is
//! decoded up front into interleaved f32.

use std::io::{Cursor, ErrorKind};

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer as PacketSamples;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::decoder::FormatDecoder;
use crate::engine::SampleBuffer;
use crate::error::DecodeError;

/// Precision reported for codecs that decode straight to float
const LOSSY_SOURCE_BITS: u16 = 32;

/// Decoder for container/codec formats handled by symphonia
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressedDecoder;

/// Identify a compressed container from its leading bytes
///
/// Returns the file extension passed to symphonia as a format hint.
pub fn detect_container(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [b'I', b'D', b'3', ..] => Some("mp3"),
        [b'f', b'L', b'a', b'C', ..] => Some("flac"),
        [b'O', b'g', b'g', b'S', ..] => Some("ogg"),
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => Some("m4a"),
        // MPEG audio frame sync (also matches ADTS AAC)
        [0xFF, second, ..] if second & 0xE0 == 0xE0 => Some("mp3"),
        _ => None,
    }
}

impl FormatDecoder for CompressedDecoder {
    fn name(&self) -> &'static str {
        "compressed"
    }

    fn accepts(&self, bytes: &[u8]) -> bool {
        detect_container(bytes).is_some()
    }

    fn decode(&self, bytes: &[u8]) -> Result<SampleBuffer, DecodeError> {
        let source = Box::new(Cursor::new(bytes.to_vec()));
        let mss = MediaSourceStream::new(source, Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = detect_container(bytes) {
            hint.with_extension(extension);
        }

        let opened = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| match e {
                SymphoniaError::Unsupported(_) => DecodeError::UnrecognizedFormat,
                other => map_stream_error(other),
            })?;

        let mut format = opened.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| DecodeError::unsupported("no audio track found"))?;

        let track_id = track.id;
        let declared_rate = track.codec_params.sample_rate;
        let declared_channels = track.codec_params.channels.map(|c| c.count() as u16);
        let declared_frames = track.codec_params.n_frames;
        let source_bits = track
            .codec_params
            .bits_per_sample
            .map_or(LOSSY_SOURCE_BITS, |b| b as u16);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::unsupported(format!("no decoder for codec: {}", e)))?;

        let mut samples: Vec<f32> = Vec::new();
        let mut stream_format: Option<(u32, u16)> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    debug!("reached end of stream");
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    warn!(
                        "stream requires decoder reset; stopping at {} samples",
                        samples.len()
                    );
                    break;
                }
                Err(e) => return Err(map_stream_error(e)),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(reason)) => {
                    warn!("skipping corrupt packet: {}", reason);
                    continue;
                }
                Err(SymphoniaError::IoError(ref e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(e) => return Err(map_stream_error(e)),
            };

            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            let channels = spec.channels.count() as u16;

            match stream_format {
                None => stream_format = Some((spec.rate, channels)),
                Some((rate, count)) if rate != spec.rate || count != channels => {
                    return Err(DecodeError::unsupported(format!(
                        "stream format changes from {} Hz/{} ch to {} Hz/{} ch",
                        rate, count, spec.rate, channels
                    )));
                }
                Some(_) => {}
            }

            let mut packet_samples = PacketSamples::<f32>::new(decoded.capacity() as u64, spec);
            packet_samples.copy_interleaved_ref(decoded);
            samples.extend_from_slice(packet_samples.samples());
        }

        let Some((sample_rate, channels)) = stream_format else {
            return Err(DecodeError::truncated(format!(
                "stream ended before any audio (declared {} Hz, {} channels)",
                declared_rate.map_or_else(|| "?".to_string(), |r| r.to_string()),
                declared_channels.map_or_else(|| "?".to_string(), |c| c.to_string()),
            )));
        };

        if channels == 0 || sample_rate == 0 {
            return Err(DecodeError::unsupported(
                "stream without channels or sample rate",
            ));
        }

        let decoded_frames = (samples.len() / channels as usize) as u64;
        if let Some(declared) = declared_frames {
            if decoded_frames < declared {
                return Err(DecodeError::truncated(format!(
                    "stream declares {} frames but only {} could be decoded",
                    declared, decoded_frames
                )));
            }
        }

        Ok(SampleBuffer::new(samples, sample_rate, channels, source_bits))
    }
}

fn map_stream_error(err: SymphoniaError) -> DecodeError {
    match err {
        SymphoniaError::IoError(e) => DecodeError::truncated(e.to_string()),
        SymphoniaError::Unsupported(what) => DecodeError::unsupported(what),
        other => DecodeError::unsupported(other.to_string()),
    }
}
