//! Performance report related structures and functions.
//!
//! This module turns the execution times recorded for a kernel variant into
//! a performance report: runtime statistics plus derived metrics such as
//! memory bandwidth and computational performance, emitted as one CSV row
//! per benchmark.

use crate::suite::{self, KernelId, VariantId};
use crate::utils::Real;

use statistical::{mean, standard_deviation};

use std::{fmt, io::Write, mem::size_of};

/// Enum defining the target of a kernel variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetKind {
    Host,
    Device,
}

impl From<VariantId> for TargetKind {
    fn from(vid: VariantId) -> Self {
        if vid.is_device() {
            Self::Device
        } else {
            Self::Host
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Device => write!(f, "device"),
        }
    }
}

/// Performance information and statistics of a benchmark.
pub struct PerfReport {
    /// Target platform: either `Host` or `Device`.
    target: TargetKind,
    /// Benchmarked kernel.
    kernel: KernelId,
    /// Execution-backend variant of the kernel.
    variant: VariantId,
    /// Number of elements per buffer.
    nb_elems: usize,
    /// Bytes touched per kernel execution.
    nb_bytes: usize,
    /// Floating-point operations per kernel execution.
    nb_flops: usize,
    /// Minimum recorded runtime in milliseconds.
    min_time: f64,
    /// Median recorded runtime in milliseconds.
    median_time: f64,
    /// Maximum recorded runtime in milliseconds.
    max_time: f64,
    /// Average runtime in milliseconds.
    avg_time: f64,
    /// Runtime standard deviation.
    stddev_time: f64,
    /// Arithmetic intensity in FLOPs/byte.
    arithmetic_intensity: f64,
    /// Memory bandwidth in GiB/s.
    memory_bandwidth: f64,
    /// Computational performance in GFLOP/s.
    computational_performance: f64,
    /// Accumulated checksum of the variant's output buffers.
    checksum: Real,
}

impl PerfReport {
    pub fn print_csv_header(output: &mut dyn Write) {
        writeln!(
            output,
            "target,group,kernel,variant,elems,Bytes,FLOPs,min_runtime,median_runtime,max_runtime,avg_runtime,stddev,FLOPs/Byte,GiB/s,GFLOP/s,checksum"
        ).expect("Failed to write report's CSV header");
    }

    /// Creates a new `PerfReport` from per-execution durations in seconds.
    pub fn new(
        kernel: KernelId,
        variant: VariantId,
        nb_elems: usize,
        checksum: Real,
        durations: &mut [f64],
    ) -> Self {
        // Sort durations to avoid having to do two passes to get both min
        // and max elements
        durations.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let min_time = *durations.first().expect("Failed to get minimum duration") * 1e3;
        let median_time = *durations
            .get(durations.len() / 2)
            .expect("Failed to get median duration")
            * 1e3;
        let max_time = *durations.last().expect("Failed to get maximum duration") * 1e3;
        let avg_time = mean(durations);
        let stddev_time = standard_deviation(durations, Some(avg_time));

        // Bytes touched and FLOPs per execution of the kernel body
        let (nb_bytes, nb_flops) = match kernel {
            // 3 stores + 2 loads, one negation + one subtraction per element
            KernelId::Init3 => (5 * size_of::<Real>() * nb_elems, 2 * nb_elems),
        };

        let memory_bandwidth = nb_bytes as f64 / 1024_f64.powi(3) / avg_time;
        let arithmetic_intensity = nb_flops as f64 / nb_bytes as f64;
        let computational_performance = nb_flops as f64 / (1024_f64.powi(3) * avg_time);

        let avg_time = avg_time * 1e3;

        Self {
            target: variant.into(),
            kernel,
            variant,
            nb_elems,
            nb_bytes,
            nb_flops,
            min_time,
            median_time,
            max_time,
            avg_time,
            stddev_time,
            arithmetic_intensity,
            memory_bandwidth,
            computational_performance,
            checksum,
        }
    }
}

impl fmt::Display for PerfReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{},{:18.15},{:18.15},{:18.15},{:18.15},{},{},{},{},{:.16e}",
            self.target,
            suite::group_name(self.kernel.group()),
            self.kernel,
            self.variant,
            self.nb_elems,
            self.nb_bytes,
            self.nb_flops,
            self.min_time,
            self.median_time,
            self.max_time,
            self.avg_time,
            self.stddev_time,
            self.arithmetic_intensity,
            self.memory_bandwidth,
            self.computational_performance,
            self.checksum,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_row_matches_header_shape() {
        let mut durations = vec![3e-3, 1e-3, 2e-3];
        let report = PerfReport::new(KernelId::Init3, VariantId::BaseSeq, 1000, 1.25, &mut durations);

        let mut header = Vec::new();
        PerfReport::print_csv_header(&mut header);
        let header = String::from_utf8(header).unwrap();
        let row = format!("{report}");

        assert_eq!(header.trim().split(',').count(), row.split(',').count());
        assert!(row.starts_with("host,Basic,INIT3,Base_Seq,1000,"));
    }

    #[test]
    fn statistics_are_ordered() {
        let mut durations = vec![5e-3, 1e-3, 4e-3, 2e-3, 3e-3];
        let report = PerfReport::new(KernelId::Init3, VariantId::BaseThreads, 64, 0.0, &mut durations);
        assert!(report.min_time <= report.median_time);
        assert!(report.median_time <= report.max_time);
        assert_eq!(report.min_time, 1.0);
        assert_eq!(report.max_time, 5.0);
    }

    #[test]
    fn device_variants_report_device_target() {
        assert_eq!(TargetKind::from(VariantId::BaseCuda), TargetKind::Device);
        assert_eq!(TargetKind::from(VariantId::ForallSimd), TargetKind::Host);
    }
}
