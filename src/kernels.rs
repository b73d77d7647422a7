//! Kernel loop bodies.
//!
//! This module contains the actual computational code: the host loop bodies
//! and the embedded device kernel sources. The INIT3 reference loop is
//!
//! ```text
//! for i in 0..len {
//!     out1[i] = out2[i] = out3[i] = -in1[i] - in2[i];
//! }
//! ```
//!
//! and every variant in the suite computes exactly this, differing only in
//! how the iteration space is executed.

pub mod host {
    //! Host loop bodies.
    //!
    //! The parallel implementation relies on the [`rayon`][1] crate.
    //!
    //! [1]: https://crates.io/crates/rayon

    use rayon::prelude::*;

    use crate::utils::SuiteFloat;

    // Naive index-loop implementation of the INIT3 body (unidiomatic Rust).
    pub fn init3<T: SuiteFloat>(
        out1: &mut [T],
        out2: &mut [T],
        out3: &mut [T],
        in1: &[T],
        in2: &[T],
    ) {
        for i in 0..out1.len() {
            out3[i] = -in1[i] - in2[i];
            out2[i] = out3[i];
            out1[i] = out3[i];
        }
    }

    // Parallel implementation of the INIT3 body (using `rayon`'s parallel
    // iterators).
    pub fn par_init3<T: SuiteFloat>(
        out1: &mut [T],
        out2: &mut [T],
        out3: &mut [T],
        in1: &[T],
        in2: &[T],
    ) {
        out1.par_iter_mut()
            .zip(out2.par_iter_mut())
            .zip(out3.par_iter_mut())
            .zip(in1.par_iter().zip(in2.par_iter()))
            .for_each(|(((o1, o2), o3), (a, b))| {
                let v = -*a - *b;
                *o1 = v;
                *o2 = v;
                *o3 = v;
            });
    }
}

#[cfg(any(feature = "cuda", feature = "opencl"))]
pub mod device {
    //! Device kernel sources.
    //!
    //! There is no generic way of writing a function that executes on an
    //! accelerator in Rust, so the device kernels are written in the syntax
    //! of the target framework (OpenCL C, or CUDA C++ pre-compiled to PTX)
    //! and embedded as raw text.

    /// Represents a device kernel: the function name inside the source and
    /// the source text itself.
    pub struct DeviceKernel {
        kernel_name: &'static str,
        kernel_source: &'static str,
    }

    impl DeviceKernel {
        pub const fn new(kernel_name: &'static str, kernel_source: &'static str) -> Self {
            Self {
                kernel_name,
                kernel_source,
            }
        }

        /// Function name of the kernel inside its source.
        pub fn name(&self) -> &'static str {
            self.kernel_name
        }

        /// Source code (or PTX text) of the kernel.
        pub fn source(&self) -> &'static str {
            self.kernel_source
        }
    }

    /// Name and source code of the OpenCL INIT3.
    #[cfg(feature = "opencl")]
    pub static CL_INIT3: DeviceKernel =
        DeviceKernel::new("init3", include_str!("../kernels/opencl/init3.cl"));

    /// Name and pre-compiled PTX of the NVIDIA CUDA INIT3.
    #[cfg(feature = "cuda")]
    pub static CUDA_INIT3: DeviceKernel =
        DeviceKernel::new("init3", include_str!("../kernels/cuda/init3.ptx"));
}

#[cfg(test)]
mod tests {
    use super::host;

    const IN1: [f64; 4] = [1.0, 2.0, 3.0, 4.0];
    const IN2: [f64; 4] = [10.0, 20.0, 30.0, 40.0];
    const EXPECTED: [f64; 4] = [-11.0, -22.0, -33.0, -44.0];

    #[test]
    fn init3_matches_reference() {
        let mut out1 = [0.0; 4];
        let mut out2 = [0.0; 4];
        let mut out3 = [0.0; 4];
        host::init3(&mut out1, &mut out2, &mut out3, &IN1, &IN2);
        assert_eq!(out1, EXPECTED);
        assert_eq!(out2, EXPECTED);
        assert_eq!(out3, EXPECTED);
    }

    #[test]
    fn par_init3_matches_reference() {
        let mut out1 = [0.0; 4];
        let mut out2 = [0.0; 4];
        let mut out3 = [0.0; 4];
        host::par_init3(&mut out1, &mut out2, &mut out3, &IN1, &IN2);
        assert_eq!(out1, EXPECTED);
        assert_eq!(out2, EXPECTED);
        assert_eq!(out3, EXPECTED);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let mut out1 = [7.0; 4];
        let mut out2 = [8.0; 4];
        let mut out3 = [9.0; 4];
        for _ in 0..3 {
            host::init3(&mut out1, &mut out2, &mut out3, &IN1, &IN2);
        }
        assert_eq!(out1, EXPECTED);
        assert_eq!(out2, EXPECTED);
        assert_eq!(out3, EXPECTED);
    }
}
