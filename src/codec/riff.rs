//! RIFF chunk walking and slice marker recovery
//!
//! Reads back the `cue ` and `adtl` chunks written by
//! [`WavEncoder`](super::encoder::WavEncoder) so a produced file can be inspected
//! without the original slice table.

use serde::{Deserialize, Serialize};

use crate::engine::Slice;
use crate::error::DecodeError;

/// One chunk inside a RIFF/WAVE file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub id: [u8; 4],
    pub body: &'a [u8],
}

/// A slice recovered from a file, with its label when present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceMarker {
    pub slice: Slice,
    pub label: Option<String>,
}

/// Split a RIFF/WAVE file into its top-level chunks
pub fn chunks(bytes: &[u8]) -> Result<Vec<Chunk<'_>>, DecodeError> {
    if bytes.len() < 12 {
        return Err(DecodeError::truncated("RIFF header"));
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(DecodeError::UnrecognizedFormat);
    }

    let mut found = Vec::new();
    let mut pos = 12;

    while pos + 8 <= bytes.len() {
        let id = [bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]];
        let len = read_u32(bytes, pos + 4) as usize;
        let start = pos + 8;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| {
                DecodeError::truncated(format!(
                    "chunk '{}' declares {} bytes",
                    String::from_utf8_lossy(&id),
                    len
                ))
            })?;

        found.push(Chunk {
            id,
            body: &bytes[start..end],
        });

        // Chunks are word aligned
        pos = end + (len & 1);
    }

    Ok(found)
}

/// Recover slice boundaries and labels from a file written with slice markers
///
/// Slice lengths are the distance to the next cue point; the last slice runs to
/// the end of the data chunk. Returns an empty list when the file has no cues.
pub fn read_slice_markers(bytes: &[u8]) -> Result<Vec<SliceMarker>, DecodeError> {
    let chunks = chunks(bytes)?;

    let fmt = find(&chunks, b"fmt ").ok_or_else(|| DecodeError::unsupported("missing fmt chunk"))?;
    if fmt.body.len() < 16 {
        return Err(DecodeError::truncated("fmt chunk"));
    }
    let block_align = u16::from_le_bytes([fmt.body[12], fmt.body[13]]) as usize;
    if block_align == 0 {
        return Err(DecodeError::unsupported("zero block alignment"));
    }

    let data = find(&chunks, b"data").ok_or_else(|| DecodeError::truncated("missing data chunk"))?;
    let total_frames = data.body.len() / block_align;

    let mut cues: Vec<(u32, usize)> = match find(&chunks, b"cue ") {
        Some(cue) => parse_cue_points(cue.body)?,
        None => return Ok(Vec::new()),
    };
    cues.sort_by_key(|&(id, _)| id);

    let labels = chunks
        .iter()
        .filter(|c| &c.id == b"LIST" && c.body.starts_with(b"adtl"))
        .flat_map(|c| parse_labels(&c.body[4..]))
        .collect::<Vec<_>>();

    let markers = cues
        .iter()
        .enumerate()
        .map(|(index, &(id, start))| {
            let end = cues.get(index + 1).map_or(total_frames, |&(_, next)| next);
            SliceMarker {
                slice: Slice {
                    start_frame: start,
                    frame_count: end.saturating_sub(start),
                    source_index: index,
                },
                label: labels
                    .iter()
                    .find(|(label_id, _)| *label_id == id)
                    .map(|(_, text)| text.clone()),
            }
        })
        .collect();

    Ok(markers)
}

/// Convenience wrapper returning only the slices
pub fn read_slices(bytes: &[u8]) -> Result<Vec<Slice>, DecodeError> {
    Ok(read_slice_markers(bytes)?
        .into_iter()
        .map(|marker| marker.slice)
        .collect())
}

fn find<'a, 'b>(chunks: &'b [Chunk<'a>], id: &[u8; 4]) -> Option<&'b Chunk<'a>> {
    chunks.iter().find(|c| &c.id == id)
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// (cue id, sample offset) pairs
fn parse_cue_points(body: &[u8]) -> Result<Vec<(u32, usize)>, DecodeError> {
    if body.len() < 4 {
        return Err(DecodeError::truncated("cue chunk"));
    }
    let count = read_u32(body, 0) as usize;
    let points = &body[4..];
    if points.len() / 24 < count {
        return Err(DecodeError::truncated(format!("cue chunk with {} points", count)));
    }

    Ok(points
        .chunks_exact(24)
        .take(count)
        .map(|point| (read_u32(point, 0), read_u32(point, 20) as usize))
        .collect())
}

/// (cue id, text) pairs from the sub-chunks of an `adtl` list
fn parse_labels(mut body: &[u8]) -> Vec<(u32, String)> {
    let mut labels = Vec::new();

    while body.len() >= 8 {
        let id = &body[0..4];
        let len = read_u32(body, 4) as usize;
        let Some(payload) = body.get(8..8 + len) else {
            break;
        };

        if id == b"labl" && payload.len() >= 4 {
            let text = &payload[4..];
            let text = text.split(|&b| b == 0).next().unwrap_or_default();
            labels.push((
                read_u32(payload, 0),
                String::from_utf8_lossy(text).into_owned(),
            ));
        }

        let next = 8 + len + (len & 1);
        body = body.get(next..).unwrap_or_default();
    }

    labels
}
