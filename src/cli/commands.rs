//! CLI Command Implementations
//!
//! The only part of the crate that touches the file system: inputs are read
//! whole, handed to the pipeline, and the result is written back out.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use super::ProcessArgs;
use crate::codec::{read_slice_markers, DecoderRegistry};
use crate::config::ProcessParams;
use crate::engine::{Pipeline, ProcessOutput, RawInput};
use crate::error::ProcessError;

/// File extensions picked up when an input is a directory
const AUDIO_EXTENSIONS: &[&str] = &[
    "wav", "wave", "mp3", "flac", "ogg", "oga", "m4a", "mp4", "aac",
];

/// Summary written by `process --report`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub output: PathBuf,
    pub sha256: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
    pub total_frames: usize,
    pub slices: Vec<ReportSlice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSlice {
    pub index: usize,
    pub name: String,
    pub start_frame: usize,
    pub frame_count: usize,
}

impl Report {
    pub fn new(output_path: &Path, output: &ProcessOutput, inputs: &[RawInput]) -> Self {
        let slices = output
            .slices
            .iter()
            .map(|slice| ReportSlice {
                index: slice.source_index,
                name: inputs[slice.source_index].name.clone(),
                start_frame: slice.start_frame,
                frame_count: slice.frame_count,
            })
            .collect();

        Self {
            output: output_path.to_path_buf(),
            sha256: format!("{:x}", Sha256::digest(&output.bytes)),
            sample_rate: output.sample_rate,
            channels: output.channels,
            bit_depth: output.bit_depth.bits(),
            total_frames: output.total_frames,
            slices,
        }
    }
}

/// Expand directories into the audio files they contain, in sorted path order
///
/// Files named explicitly are kept whatever their extension.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && has_audio_extension(entry.path()))
            .map(|entry| entry.into_path())
            .collect();
        found.sort();

        if found.is_empty() {
            warn!("No audio files found in {}", path.display());
        }
        files.extend(found);
    }

    Ok(files)
}

fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn load_params(config: Option<&Path>) -> Result<ProcessParams> {
    let Some(path) = config else {
        return Ok(ProcessParams::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

fn read_inputs(files: &[PathBuf]) -> Result<Vec<RawInput>> {
    files
        .iter()
        .map(|path| {
            let bytes = fs::read(path)
                .with_context(|| format!("Failed to read input {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(RawInput::new(name, bytes))
        })
        .collect()
}

/// Join the inputs into one sliced WAV file.
pub fn process(args: &ProcessArgs) -> Result<()> {
    let params = args.merge_into(load_params(args.config.as_deref())?);
    let config = params.validate().map_err(ProcessError::from)?;

    let files = collect_inputs(&args.inputs)?;
    if files.is_empty() {
        bail!("no input files provided");
    }
    let inputs = read_inputs(&files)?;

    println!("Output sample will contain {} segments; {}", inputs.len(), config);

    let output = Pipeline::new(config).run(&inputs).map_err(|e| {
        for suggestion in e.recovery_suggestions() {
            warn!("{}", suggestion);
        }
        e
    })?;

    fs::write(&args.output, &output.bytes)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Wrote {}", args.output.display());

    print_slices(
        output
            .slices
            .iter()
            .map(|s| (s.start_frame, s.frame_count, inputs[s.source_index].name.as_str())),
        output.sample_rate,
    );

    if let Some(report_path) = &args.report {
        let report = Report::new(&args.output, &output, &inputs);
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(report_path, json)
            .with_context(|| format!("Failed to write report {}", report_path.display()))?;
        info!("Wrote report {}", report_path.display());
    }

    Ok(())
}

/// Print the format and slice table of a WAV file.
pub fn inspect(path: &Path) -> Result<()> {
    info!("Inspecting: {}", path.display());

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let buffer = DecoderRegistry::default()
        .decode(&bytes)
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    let markers = read_slice_markers(&bytes)
        .with_context(|| format!("Failed to read slice markers from {}", path.display()))?;

    println!("File: {}", path.display());
    println!(
        "Format: {} Hz, {} channels, {}-bit, {} frames ({:.2} s)",
        buffer.sample_rate,
        buffer.channels,
        buffer.source_bits,
        buffer.frames(),
        buffer.duration_secs()
    );

    if markers.is_empty() {
        println!("No slice markers.");
        return Ok(());
    }

    print_slices(
        markers.iter().map(|m| {
            (
                m.slice.start_frame,
                m.slice.frame_count,
                m.label.as_deref().unwrap_or("-"),
            )
        }),
        buffer.sample_rate,
    );

    Ok(())
}

fn print_slices<'a>(rows: impl Iterator<Item = (usize, usize, &'a str)>, sample_rate: u32) {
    println!("{:-<60}", "");
    println!("{:>4}  {:>10}  {:>10}  {:>8}  Name", "#", "Start", "Frames", "Secs");
    for (index, (start, frames, name)) in rows.enumerate() {
        println!(
            "{:>4}  {:>10}  {:>10}  {:>8.3}  {}",
            index + 1,
            start,
            frames,
            frames as f64 / sample_rate as f64,
            name
        );
    }
    println!("{:-<60}", "");
}
