//! Crate-level constants.

/// Default number of meta repetitions (timed passes) performed when
/// benchmarking a kernel variant.
pub const META_REPETITIONS: u8 = 31;

/// Fixed thread-block size for elementwise GPU kernel launches.
#[cfg(any(feature = "cuda", feature = "opencl"))]
pub const GPU_BLOCK_SIZE: usize = 256;

/// Relative tolerance above which two variants' checksums are reported as
/// numerically divergent.
pub const CHECKSUM_RTOL: f64 = 1e-10;
