//! CLI Module
//!
//! Command-line interface for stepsampler.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ProcessParams;

/// Stepsampler - consolidate recordings into one sliced WAV for step-samplers
#[derive(Parser, Debug)]
#[command(name = "stepsampler")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Join audio files into one WAV with a slice per input
    #[command(name = "process")]
    Process(ProcessArgs),

    /// Print the format and slice table of a WAV written by this tool
    #[command(name = "inspect")]
    Inspect {
        /// WAV file to inspect
        file: PathBuf,
    },
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ProcessArgs {
    /// Output WAV file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Output sample rate in Hz (default: rate of the first input)
    #[arg(short = 'r', long = "rate")]
    pub rate: Option<i64>,

    /// Trim edge silence at or below this linear amplitude (0.005 when given without a value)
    #[arg(
        short = 't',
        long = "threshold",
        num_args = 0..=1,
        default_missing_value = "0.005"
    )]
    pub threshold: Option<f64>,

    /// Produce stereo output
    #[arg(short, long)]
    pub stereo: bool,

    /// Output bit depth: 8, 16, 24 or 32
    #[arg(short = 'b', long = "bits")]
    pub bits: Option<i64>,

    /// Scale every input to full-scale peak
    #[arg(long)]
    pub normalize: bool,

    /// Pad every input to the longest one
    #[arg(long)]
    pub equal_slices: bool,

    /// Leave out cue points and slice labels
    #[arg(long)]
    pub no_markers: bool,

    /// JSON file with default parameters; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write a JSON report of the slices to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Input audio files or directories
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

impl ProcessArgs {
    /// Apply the command-line flags on top of `base`
    pub fn merge_into(&self, base: ProcessParams) -> ProcessParams {
        ProcessParams {
            output_rate: self.rate.or(base.output_rate),
            silence_threshold: self.threshold.or(base.silence_threshold),
            stereo: if self.stereo { Some(true) } else { base.stereo },
            bit_depth: self.bits.or(base.bit_depth),
            normalize: self.normalize || base.normalize,
            equal_slices: self.equal_slices || base.equal_slices,
            slice_markers: !self.no_markers && base.slice_markers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SILENCE_THRESHOLD;

    fn parse(args: &[&str]) -> ProcessArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Process(args) => args,
            other => panic!("expected process, got {:?}", other),
        }
    }

    #[test]
    fn test_process_flags() {
        let args = parse(&[
            "stepsampler",
            "process",
            "-o",
            "out.wav",
            "-r",
            "48000",
            "-s",
            "-b",
            "24",
            "a.wav",
            "b.wav",
        ]);

        assert_eq!(args.output, PathBuf::from("out.wav"));
        assert_eq!(args.rate, Some(48000));
        assert!(args.stereo);
        assert_eq!(args.bits, Some(24));
        assert_eq!(args.threshold, None);
        assert_eq!(args.inputs.len(), 2);
    }

    #[test]
    fn test_threshold_without_value_uses_default() {
        let args = parse(&["stepsampler", "process", "-o", "out.wav", "a.wav", "-t"]);
        assert_eq!(args.threshold, Some(DEFAULT_SILENCE_THRESHOLD as f64));

        let args = parse(&["stepsampler", "process", "-t", "0.02", "-o", "out.wav", "a.wav"]);
        assert_eq!(args.threshold, Some(0.02));
    }

    #[test]
    fn test_inputs_required() {
        assert!(Cli::try_parse_from(["stepsampler", "process", "-o", "out.wav"]).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let base = ProcessParams {
            output_rate: Some(22050),
            bit_depth: Some(8),
            stereo: Some(true),
            ..Default::default()
        };
        let args = parse(&[
            "stepsampler",
            "process",
            "-o",
            "o.wav",
            "-b",
            "24",
            "--no-markers",
            "a.wav",
        ]);
        let params = args.merge_into(base);

        assert_eq!(params.output_rate, Some(22050));
        assert_eq!(params.bit_depth, Some(24));
        assert_eq!(params.stereo, Some(true));
        assert!(!params.slice_markers);
    }
}
