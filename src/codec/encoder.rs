//! WAV encoding
//!
//! Writes a canonical PCM WAV file: `RIFF` header, 16-byte `fmt ` chunk and the
//! `data` chunk. Slice boundaries follow the audio as a `cue ` chunk plus a
//! `LIST`/`adtl` chunk of labels. Players that do not know those chunks skip
//! them; samplers that do can address every input by its cue point.

use log::debug;

use crate::engine::{BitDepth, PcmBuffer, Slice};
use crate::error::EncodeError;

/// WAVE_FORMAT_PCM
pub const FORMAT_PCM: u16 = 0x0001;

/// Size of the `fmt ` chunk payload for plain PCM
const FMT_CHUNK_LEN: u32 = 16;

/// Size of one cue point record
const CUE_POINT_LEN: usize = 24;

/// Serializes quantized audio into a WAV file
#[derive(Debug, Clone)]
pub struct WavEncoder {
    slice_markers: bool,
    labels: Vec<String>,
}

impl Default for WavEncoder {
    fn default() -> Self {
        Self {
            slice_markers: true,
            labels: Vec::new(),
        }
    }
}

impl WavEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the `cue `/`LIST` slice chunks
    pub fn with_slice_markers(mut self, enabled: bool) -> Self {
        self.slice_markers = enabled;
        self
    }

    /// Label text per source index; missing entries fall back to "step N"
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// Encode the buffer and its slice table into a complete file
    ///
    /// # Errors
    /// * `TooLarge` - If any size or frame offset does not fit the 32-bit RIFF fields
    pub fn encode(&self, buffer: &PcmBuffer, slices: &[Slice]) -> Result<Vec<u8>, EncodeError> {
        let block_align = buffer.block_align();
        let data_len = buffer.frames() as u64 * block_align as u64;

        let mut markers = Vec::new();
        if self.slice_markers && !slices.is_empty() {
            write_cue_chunk(&mut markers, slices)?;
            write_label_chunk(&mut markers, slices, &self.labels);
        }

        // "WAVE" + fmt chunk + data chunk (with pad byte) + marker chunks
        let riff_len =
            4 + (8 + FMT_CHUNK_LEN as u64) + 8 + data_len + (data_len & 1) + markers.len() as u64;
        let total_len = 8 + riff_len;
        if riff_len > u32::MAX as u64 {
            return Err(EncodeError::TooLarge { bytes: total_len });
        }

        let mut out = Vec::with_capacity(total_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(riff_len as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");

        write_chunk_header(&mut out, b"fmt ", FMT_CHUNK_LEN);
        out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
        out.extend_from_slice(&buffer.channels.to_le_bytes());
        out.extend_from_slice(&buffer.sample_rate.to_le_bytes());
        let byte_rate = buffer
            .sample_rate
            .checked_mul(block_align as u32)
            .ok_or(EncodeError::TooLarge { bytes: total_len })?;
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&(block_align as u16).to_le_bytes());
        out.extend_from_slice(&buffer.bit_depth.bits().to_le_bytes());

        write_chunk_header(&mut out, b"data", data_len as u32);
        write_samples(&mut out, &buffer.samples, buffer.bit_depth);
        if data_len & 1 == 1 {
            out.push(0);
        }

        out.extend_from_slice(&markers);

        debug_assert_eq!(out.len() as u64, total_len);
        debug!(
            "encoded {} frames ({} bytes of audio, {} slices) into {} bytes",
            buffer.frames(),
            data_len,
            slices.len(),
            out.len()
        );

        Ok(out)
    }
}

fn write_chunk_header(out: &mut Vec<u8>, id: &[u8; 4], len: u32) {
    out.extend_from_slice(id);
    out.extend_from_slice(&len.to_le_bytes());
}

/// Little-endian sample data; 8-bit is unsigned with a 128 offset
fn write_samples(out: &mut Vec<u8>, samples: &[i32], depth: BitDepth) {
    out.reserve(samples.len() * depth.bytes());

    match depth {
        BitDepth::Eight => {
            out.extend(samples.iter().map(|&s| (s + 128) as u8));
        }
        BitDepth::Sixteen => {
            for &s in samples {
                out.extend_from_slice(&(s as i16).to_le_bytes());
            }
        }
        BitDepth::TwentyFour => {
            for &s in samples {
                out.extend_from_slice(&s.to_le_bytes()[..3]);
            }
        }
        BitDepth::ThirtyTwo => {
            for &s in samples {
                out.extend_from_slice(&s.to_le_bytes());
            }
        }
    }
}

fn write_cue_chunk(out: &mut Vec<u8>, slices: &[Slice]) -> Result<(), EncodeError> {
    let len = 4 + slices.len() * CUE_POINT_LEN;
    write_chunk_header(out, b"cue ", len as u32);
    out.extend_from_slice(&(slices.len() as u32).to_le_bytes());

    for (i, slice) in slices.iter().enumerate() {
        let offset = u32::try_from(slice.start_frame).map_err(|_| EncodeError::TooLarge {
            bytes: slice.start_frame as u64,
        })?;

        out.extend_from_slice(&cue_id(i).to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes()); // play order position
        out.extend_from_slice(b"data");
        out.extend_from_slice(&0u32.to_le_bytes()); // chunk start
        out.extend_from_slice(&0u32.to_le_bytes()); // block start
        out.extend_from_slice(&offset.to_le_bytes()); // sample offset
    }

    Ok(())
}

fn write_label_chunk(out: &mut Vec<u8>, slices: &[Slice], labels: &[String]) {
    let mut body = Vec::new();
    body.extend_from_slice(b"adtl");

    for (i, slice) in slices.iter().enumerate() {
        let text = labels
            .get(slice.source_index)
            .cloned()
            .unwrap_or_else(|| format!("step {}", i + 1));

        // cue id + text + NUL terminator
        let len = 4 + text.len() + 1;
        write_chunk_header(&mut body, b"labl", len as u32);
        body.extend_from_slice(&cue_id(i).to_le_bytes());
        body.extend_from_slice(text.as_bytes());
        body.push(0);
        if len & 1 == 1 {
            body.push(0);
        }
    }

    write_chunk_header(out, b"LIST", body.len() as u32);
    out.extend_from_slice(&body);
}

/// Cue point identifiers start at 1
fn cue_id(slice_index: usize) -> u32 {
    slice_index as u32 + 1
}
