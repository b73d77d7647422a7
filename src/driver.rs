//! Suite driver.
//!
//! This module orchestrates the benchmark: for each requested problem size
//! the kernel object is built once through the registry, then every selected
//! variant goes through `meta_repetitions` passes of the fixed lifecycle
//! order (set up, run, update checksum, tear down) while the per-pass
//! execution times are recorded.
//!
//! # High-level approach
//! ## 1. Data initialization
//! Buffers are reallocated and refilled from the seeded RNG on every pass so
//! each variant sees identical inputs and no variant can warm another's
//! caches.
//!
//! ## 2. Performance evaluation
//! The region timer brackets only the repeated-loop region inside `run`;
//! setup, teardown and checksum work stay outside of it. The per-pass time
//! divided by the kernel's repetition count gives the per-execution time,
//! and the meta-repetition loop yields enough samples to assess precision.
//!
//! ## 3. Post-processing
//! The recorded times are condensed into [`PerfReport`] rows (CSV, to
//! `stdout` or a file) and the per-variant checksums are compared against the
//! first executed variant to flag numerical divergence between backends.

use crate::cli::{CliArgs, KernelCmd};
use crate::consts::CHECKSUM_RTOL;
use crate::kernel::{Kernel, RunParams};
use crate::perf_report::PerfReport;
use crate::suite::{self, VariantId};

use std::fs::OpenOptions;
use std::io::{stdout, Write};

/// Runs the full benchmark for the named kernel and writes the reports.
pub fn run_kernel(name: &str, args: &CliArgs) {
    let sizes: Vec<Option<usize>> = match &args.kernel {
        KernelCmd::Init3 { sizes } if !sizes.is_empty() => {
            sizes.iter().copied().map(Some).collect()
        }
        // Fall back to the kernel descriptor's default size.
        KernelCmd::Init3 { .. } => vec![None],
    };

    let variants = selected_variants(args);

    let mut reports = Vec::new();
    for size in sizes {
        let params = RunParams {
            size,
            reps: args.reps,
            seed: args.seed,
        };
        let Some(mut kernel) = suite::kernel_for_name(name, &params) else {
            return;
        };
        eprint!("{}: size {}\r", name, kernel.base().run_size());

        for &vid in &variants {
            if !suite::variant_available(vid) {
                eprintln!(
                    "{}: skipping variant {} (backend not compiled in)",
                    name,
                    suite::variant_name(vid)
                );
                continue;
            }

            let run_reps = kernel.base().run_reps();
            let mut durations = Vec::with_capacity(args.meta_repetitions.into());
            for _ in 0..durations.capacity() {
                kernel.set_up(vid);
                kernel.run(vid);
                kernel.update_checksum(vid);
                kernel.tear_down(vid);
                durations.push(kernel.base_mut().take_elapsed().as_secs_f64() / run_reps as f64);
            }

            reports.push(PerfReport::new(
                kernel.base().kernel_id(),
                vid,
                kernel.base().run_size(),
                kernel.base().checksum(vid),
                &mut durations,
            ));
        }

        verify_checksums(kernel.as_ref(), &variants);
    }

    let mut output: Box<dyn Write> = match args.output_file {
        Some(ref name) => Box::new(
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(name)
                .expect("failed to open output file"),
        ),
        None => Box::new(stdout()),
    };

    PerfReport::print_csv_header(&mut output);
    for report in reports {
        writeln!(output, "{report}").expect("Failed to write report");
    }
}

/// Resolves the `--variants` filter, defaulting to every variant available in
/// this build. Unknown names get a diagnostic and are dropped.
fn selected_variants(args: &CliArgs) -> Vec<VariantId> {
    if args.variants.is_empty() {
        return VariantId::ALL
            .into_iter()
            .filter(|&vid| suite::variant_available(vid))
            .collect();
    }
    args.variants
        .iter()
        .filter_map(|name| {
            let vid = suite::variant_id_for_name(name);
            if vid.is_none() {
                eprintln!("\n Unknown variant name = {name}");
            }
            vid
        })
        .collect()
}

/// Prints the per-variant checksums for one kernel run and flags divergence
/// from the first executed variant beyond [`CHECKSUM_RTOL`].
fn verify_checksums(kernel: &dyn Kernel, variants: &[VariantId]) {
    let executed: Vec<VariantId> = variants
        .iter()
        .copied()
        .filter(|&vid| suite::variant_available(vid))
        .collect();
    let Some(&reference) = executed.first() else {
        return;
    };
    let ref_sum = kernel.base().checksum(reference);

    eprintln!(
        "\n{} checksums (size {}):",
        suite::kernel_name(kernel.base().kernel_id()),
        kernel.base().run_size()
    );
    for &vid in &executed {
        let sum = kernel.base().checksum(vid);
        let rel = if ref_sum == 0.0 {
            (sum - ref_sum).abs()
        } else {
            ((sum - ref_sum) / ref_sum).abs()
        };
        if rel > CHECKSUM_RTOL {
            eprintln!(
                "  {:<16} {:24.16e}  DIVERGED from {} (rel. diff {:e})",
                suite::variant_name(vid),
                sum,
                suite::variant_name(reference),
                rel
            );
        } else {
            eprintln!("  {:<16} {:24.16e}", suite::variant_name(vid), sum);
        }
    }
}
