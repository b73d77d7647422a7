//! Kernel lifecycle contract and the state shared by every kernel.
//!
//! Each kernel in the suite goes through the same four operations, invoked in
//! fixed order by the driver: `set_up` allocates and initializes the buffers
//! for the target variant, `run` executes the timed repetition loop,
//! `update_checksum` folds the output buffers into the per-variant checksum
//! slot and `tear_down` releases everything again.

use crate::suite::{KernelId, VariantId, NUM_VARIANTS};
use crate::utils::Real;

use std::time::{Duration, Instant};

/// Run configuration forwarded from the command line: optional overrides for
/// the kernel descriptor's problem size and repetition count, plus the RNG
/// seed used for buffer initialization.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunParams {
    pub size: Option<usize>,
    pub reps: Option<usize>,
    pub seed: Option<u64>,
}

/// Elapsed-time accumulator bracketing the repeated-loop region of a kernel,
/// excluding setup and teardown.
#[derive(Debug, Default)]
pub struct RegionTimer {
    started: Option<Instant>,
    elapsed: Duration,
}

impl RegionTimer {
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.elapsed += started.elapsed();
        }
    }

    /// Returns the accumulated elapsed time and resets the timer.
    pub fn take(&mut self) -> Duration {
        self.started = None;
        std::mem::take(&mut self.elapsed)
    }
}

/// State shared by every kernel: its identifier, the resolved run
/// configuration, the region timer and one checksum accumulator per variant.
pub struct KernelBase {
    kernel_id: KernelId,
    run_size: usize,
    run_reps: usize,
    seed: u64,
    timer: RegionTimer,
    checksums: [Real; NUM_VARIANTS],
}

impl KernelBase {
    /// Resolves the run configuration against the kernel descriptor's
    /// defaults.
    pub fn new(
        kernel_id: KernelId,
        default_size: usize,
        default_reps: usize,
        params: &RunParams,
    ) -> Self {
        Self {
            kernel_id,
            run_size: params.size.unwrap_or(default_size),
            run_reps: params.reps.unwrap_or(default_reps),
            seed: params.seed.unwrap_or(0),
            timer: RegionTimer::default(),
            checksums: [0.0; NUM_VARIANTS],
        }
    }

    pub fn kernel_id(&self) -> KernelId {
        self.kernel_id
    }

    pub fn run_size(&self) -> usize {
        self.run_size
    }

    pub fn run_reps(&self) -> usize {
        self.run_reps
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn start_timer(&mut self) {
        self.timer.start();
    }

    pub fn stop_timer(&mut self) {
        self.timer.stop();
    }

    /// Returns the time accumulated since the last call and resets the timer.
    pub fn take_elapsed(&mut self) -> Duration {
        self.timer.take()
    }

    pub fn add_to_checksum(&mut self, vid: VariantId, value: Real) {
        self.checksums[vid as usize] += value;
    }

    pub fn checksum(&self, vid: VariantId) -> Real {
        self.checksums[vid as usize]
    }
}

/// Lifecycle contract implemented by every benchmarked kernel.
pub trait Kernel {
    fn base(&self) -> &KernelBase;
    fn base_mut(&mut self) -> &mut KernelBase;

    /// Allocates and initializes the kernel's buffers for the given variant
    /// (host memory, plus device-resident mirrors for device variants).
    fn set_up(&mut self, vid: VariantId);

    /// Executes the kernel `run_reps` times inside the timed region,
    /// dispatching on the variant. Unrecognized or unavailable variants print
    /// a diagnostic and compute nothing.
    fn run(&mut self, vid: VariantId);

    /// Reduces the output buffers into the per-variant checksum slot.
    fn update_checksum(&mut self, vid: VariantId);

    /// Releases all buffers allocated by `set_up`.
    fn tear_down(&mut self, vid: VariantId);

    /// Bytes currently held by the kernel's buffers (host and device), used
    /// for allocation accounting.
    fn allocated_bytes(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_accumulates_and_resets() {
        let mut timer = RegionTimer::default();
        timer.start();
        std::thread::sleep(Duration::from_millis(1));
        timer.stop();
        timer.start();
        std::thread::sleep(Duration::from_millis(1));
        timer.stop();
        assert!(timer.take() >= Duration::from_millis(2));
        assert_eq!(timer.take(), Duration::ZERO);
    }

    #[test]
    fn stop_without_start_is_a_no_op() {
        let mut timer = RegionTimer::default();
        timer.stop();
        assert_eq!(timer.take(), Duration::ZERO);
    }

    #[test]
    fn base_resolves_defaults_and_overrides() {
        let defaults = KernelBase::new(KernelId::Init3, 100, 10, &RunParams::default());
        assert_eq!(defaults.run_size(), 100);
        assert_eq!(defaults.run_reps(), 10);
        assert_eq!(defaults.seed(), 0);

        let params = RunParams {
            size: Some(7),
            reps: Some(3),
            seed: Some(99),
        };
        let overridden = KernelBase::new(KernelId::Init3, 100, 10, &params);
        assert_eq!(overridden.run_size(), 7);
        assert_eq!(overridden.run_reps(), 3);
        assert_eq!(overridden.seed(), 99);
    }

    #[test]
    fn checksums_accumulate_per_variant() {
        let mut base = KernelBase::new(KernelId::Init3, 1, 1, &RunParams::default());
        base.add_to_checksum(VariantId::BaseSeq, 1.5);
        base.add_to_checksum(VariantId::BaseSeq, 2.0);
        base.add_to_checksum(VariantId::BaseThreads, 4.0);
        assert_eq!(base.checksum(VariantId::BaseSeq), 3.5);
        assert_eq!(base.checksum(VariantId::BaseThreads), 4.0);
        assert_eq!(base.checksum(VariantId::ForallSimd), 0.0);
    }
}
