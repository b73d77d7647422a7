//! kernelperf - cross-backend performance benchmarking of numerical kernels.
//!
//! # About
//! kernelperf measures the execution time of small numerical kernels across
//! multiple execution backends and verifies that every backend computes the
//! same result. The same one-line loop body is benchmarked as:
//! - a plain sequential loop,
//! - a vectorizable iterator loop,
//! - a thread-parallel loop (via [`rayon`][1]),
//! - a GPU kernel launch (OpenCL via [`ocl`][2], NVIDIA CUDA via [`cust`][3]),
//! - and through a portable `forall` layer parameterized by backend.
//!
//! Each backend comes in a `Base_*` variant (loop or launch spelled out by
//! hand) and a `Forall_*` variant (routed through the portability layer), so
//! the overhead of the abstraction itself can be measured. After every run
//! the output buffers are reduced into a checksum and the variants are
//! cross-checked for numerical divergence.
//!
//! Currently implemented kernels:
//! - `INIT3` (elementwise triple initialization):
//!   `out1[i] = out2[i] = out3[i] = -in1[i] - in2[i]`
//!
//! # Quickstart
//! ## Build
//! The default build is CPU-only and needs no GPU runtime:
//! ```sh
//! cargo build --release
//! ```
//! The GPU backends are opt-in features; make sure an [OpenCL 2.0+][4]
//! library and/or the [NVIDIA CUDA Toolkit][5] are installed before enabling
//! them:
//! ```sh
//! cargo build --release --features cuda,opencl
//! ```
//!
//! ## Example run
//! Benchmark INIT3 on several problem sizes, writing the CSV report to a
//! file:
//! ```sh
//! cargo run --release -- -o results.csv init3 --sizes 100000 1000000 10000000
//! ```
//!
//! Restrict the run to specific variants:
//! ```sh
//! cargo run --release -- -v Base_Seq -v Forall_Threads init3
//! ```
//!
//! ## Documentation
//! The crate's documentation is available using `cargo`:
//! ```sh
//! cargo doc --open
//! ```
//!
//! [1]: https://crates.io/crates/rayon
//! [2]: https://crates.io/crates/ocl
//! [3]: https://crates.io/crates/cust
//! [4]: https://www.khronos.org/opencl/
//! [5]: https://developer.nvidia.com/cuda-downloads

pub mod basic;
pub mod cli;
pub mod consts;
pub mod driver;
pub mod forall;
pub mod kernel;
pub mod kernels;
pub mod perf_report;
pub mod suite;
pub mod utils;

use crate::cli::{CliArgs, KernelCmd};

use clap::Parser;

fn main() {
    let args = CliArgs::parse();

    let kernel_name = match args.kernel {
        KernelCmd::Init3 { .. } => "INIT3",
    };
    driver::run_kernel(kernel_name, &args);
}
