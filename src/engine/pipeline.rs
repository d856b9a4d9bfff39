//! Batch processing pipeline
//!
//! Stage order for one call:
//! 1. Decode every input (parallel, first failure in input order wins)
//! 2. Resolve the output rate from the first decoded input if none was given
//! 3. Trim → normalize → resample → convert each input (parallel)
//! 4. Optionally pad to an even grid
//! 5. Concatenate in input order and encode
//!
//! Nothing is shared between calls and no partial output is ever returned.

use log::{debug, info};
use rayon::prelude::*;

use super::buffer::{BitDepth, PcmBuffer, RawInput, SampleBuffer, Slice};
use super::concat::{concat, pad_to_longest};
use crate::codec::{DecoderRegistry, WavEncoder};
use crate::config::{ProcessParams, ProcessingConfig};
use crate::dsp;
use crate::error::{ConfigError, ProcessError, Result};

/// Everything produced by one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    /// Complete WAV file
    pub bytes: Vec<u8>,
    /// Position of each input in the output, in input order
    pub slices: Vec<Slice>,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: BitDepth,
    pub total_frames: usize,
}

impl ProcessOutput {
    /// Output length in seconds
    pub fn duration_secs(&self) -> f64 {
        self.total_frames as f64 / self.sample_rate as f64
    }
}

/// Runs a batch of inputs through every stage with one validated config
pub struct Pipeline {
    config: ProcessingConfig,
    registry: DecoderRegistry,
}

impl Pipeline {
    /// Pipeline with the default decoder set
    pub fn new(config: ProcessingConfig) -> Self {
        Self::with_registry(config, DecoderRegistry::default())
    }

    /// Pipeline that decodes with a caller-supplied set of formats
    pub fn with_registry(config: ProcessingConfig, registry: DecoderRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Process all inputs into one sliced WAV file
    ///
    /// # Errors
    /// * `Config(NoInputs)` - If `inputs` is empty
    /// * `Decode` - For the first input, in input order, that fails to decode
    /// * `Internal` - If a later stage fails
    pub fn run(&self, inputs: &[RawInput]) -> Result<ProcessOutput> {
        if inputs.is_empty() {
            return Err(ConfigError::NoInputs.into());
        }

        info!("processing {} inputs; {}", inputs.len(), self.config);

        let decoded = self.decode_all(inputs)?;

        let sample_rate = self.config.output_rate.unwrap_or(decoded[0].sample_rate);
        debug!("output rate {} Hz", sample_rate);

        let results: Vec<Result<PcmBuffer>> = decoded
            .into_par_iter()
            .map(|buffer| self.normalize_one(buffer, sample_rate))
            .collect();
        let mut buffers = results.into_iter().collect::<Result<Vec<_>>>()?;

        if self.config.equal_slices {
            pad_to_longest(&mut buffers);
        }

        let (joined, slices) = concat(buffers);

        let labels = inputs.iter().map(|input| input.name.clone()).collect();
        let bytes = WavEncoder::new()
            .with_slice_markers(self.config.slice_markers)
            .with_labels(labels)
            .encode(&joined, &slices)?;

        info!(
            "wrote {} slices, {} frames ({:.2} s), {} bytes",
            slices.len(),
            joined.frames(),
            joined.frames() as f64 / joined.sample_rate as f64,
            bytes.len()
        );

        Ok(ProcessOutput {
            bytes,
            total_frames: joined.frames(),
            sample_rate: joined.sample_rate,
            channels: joined.channels,
            bit_depth: joined.bit_depth,
            slices,
        })
    }

    fn decode_all(&self, inputs: &[RawInput]) -> Result<Vec<SampleBuffer>> {
        let results: Vec<Result<SampleBuffer>> = inputs
            .par_iter()
            .enumerate()
            .map(|(index, input)| {
                self.registry
                    .decode(&input.bytes)
                    .map_err(|source| ProcessError::Decode {
                        index,
                        name: input.name.clone(),
                        source,
                    })
            })
            .collect();

        // Sequential collect so the reported error does not depend on scheduling
        results.into_iter().collect()
    }

    fn normalize_one(&self, buffer: SampleBuffer, sample_rate: u32) -> Result<PcmBuffer> {
        let mut buffer = dsp::trim(buffer, self.config.silence_threshold);
        if self.config.normalize {
            buffer = dsp::normalize_peak(buffer);
        }
        let buffer = dsp::resample(buffer, sample_rate)?;
        let pcm = dsp::convert(buffer, self.config.layout, self.config.bit_depth.bits())?;
        Ok(pcm)
    }
}

/// Process raw file buffers into one WAV file
///
/// Inputs are named `input-1`, `input-2`, ... in errors and slice labels.
///
/// # Example
/// ```no_run
/// use stepsampler::{process, ProcessParams};
///
/// let kick = std::fs::read("kick.wav").unwrap();
/// let snare = std::fs::read("snare.wav").unwrap();
/// let wav = process(&[kick, snare], &ProcessParams::default()).unwrap();
/// ```
pub fn process<B: AsRef<[u8]> + Sync>(files: &[B], params: &ProcessParams) -> Result<Vec<u8>> {
    let inputs: Vec<RawInput> = files
        .iter()
        .enumerate()
        .map(|(i, bytes)| RawInput::new(format!("input-{}", i + 1), bytes.as_ref()))
        .collect();

    process_named(&inputs, params).map(|output| output.bytes)
}

/// Process named inputs, returning the slice table alongside the file
pub fn process_named(inputs: &[RawInput], params: &ProcessParams) -> Result<ProcessOutput> {
    let config = params.validate()?;
    Pipeline::new(config).run(inputs)
}
