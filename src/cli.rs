//! Command-Line Interface related code.
//!
//! This module handles the parsing of CLI arguments using the [`clap`][1]
//! crate. It defines the available runtime options and subcommands.
//!
//! [1]: https://crates.io/crates/clap

use crate::consts;

use clap::{Parser, Subcommand};

use std::path::PathBuf;

/// Cross-backend performance benchmarking of numerical kernels.
///
/// Runs the same kernel under several execution backends (sequential,
/// vectorized, thread-parallel, GPU, and a portable forall layer over these),
/// times the repeated-loop region and cross-checks the numerical results of
/// the backends via checksums.
#[derive(Clone, Debug, Parser)]
pub struct CliArgs {
    /// Number of meta-repetitions (timed passes) per variant.
    #[arg(
        short,
        long,
        value_name = "META_REPS",
        default_value_t = consts::META_REPETITIONS,
        value_parser = clap::value_parser!(u8).range(2..u8::MAX.into()),
    )]
    pub meta_repetitions: u8,

    /// Override the kernel's default repetition count for the timed loop.
    #[arg(short, long, value_name = "REPS")]
    pub reps: Option<usize>,

    /// Variant to run; repeat the flag to select several. Defaults to every
    /// variant available in this build.
    #[arg(short, long, value_name = "VARIANT")]
    pub variants: Vec<String>,

    /// Kernel command to run.
    #[command(subcommand)]
    pub kernel: KernelCmd,

    /// Output file, defaults to `stdout` if unspecified.
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Seed for the random number generator (RNG).
    #[arg(short, long, value_name = "SEED")]
    pub seed: Option<u64>,
}

/// List of available kernels to profile.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum KernelCmd {
    /// Elementwise triple initialization: out1[i] = out2[i] = out3[i] = -in1[i] - in2[i]
    Init3 {
        /// Problem sizes (buffer lengths); defaults to the kernel's default
        /// size when omitted.
        #[arg(
            short = 'n',
            long,
            num_args = 1..,
        )]
        sizes: Vec<usize>,
    },
}
