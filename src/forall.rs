//! Portable parallel-for layer.
//!
//! Lets a kernel express its loop once and pick *how* the iteration space is
//! executed through an execution policy, instead of restating the loop per
//! backend. Host policies cover the vectorizable-iterator and thread-parallel
//! cases; the device submodules cover grid sizing and launch for the GPU
//! runtimes.
//!
//! Parallel execution is fork-join throughout: every iteration has completed
//! by the time the call returns (host) or by the time the stream/queue is
//! synchronized (device).

use rayon::prelude::*;

/// Host execution policies understood by [`forall3`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecPolicy {
    /// Sequential iterator loop the compiler can vectorize.
    Simd,
    /// Thread-parallel loop on the rayon pool.
    Threads,
}

/// Portable elementwise parallel-for with a three-way output broadcast:
/// computes `body(in1[i], in2[i])` for every index and stores the value into
/// all three output slices.
///
/// All five slices must have equal length.
pub fn forall3<T, F>(
    policy: ExecPolicy,
    out1: &mut [T],
    out2: &mut [T],
    out3: &mut [T],
    in1: &[T],
    in2: &[T],
    body: F,
) where
    T: Copy + Send + Sync,
    F: Fn(T, T) -> T + Send + Sync,
{
    match policy {
        ExecPolicy::Simd => {
            out1.iter_mut()
                .zip(out2.iter_mut())
                .zip(out3.iter_mut())
                .zip(in1.iter().zip(in2.iter()))
                .for_each(|(((o1, o2), o3), (a, b))| {
                    let v = body(*a, *b);
                    *o1 = v;
                    *o2 = v;
                    *o3 = v;
                });
        }
        ExecPolicy::Threads => {
            out1.par_iter_mut()
                .zip(out2.par_iter_mut())
                .zip(out3.par_iter_mut())
                .zip(in1.par_iter().zip(in2.par_iter()))
                .for_each(|(((o1, o2), o3), (a, b))| {
                    let v = body(*a, *b);
                    *o1 = v;
                    *o2 = v;
                    *o3 = v;
                });
        }
    }
}

#[cfg(feature = "cuda")]
pub mod cuda {
    //! Device-side forall for CUDA: grid sizing and launch of the elementwise
    //! three-output kernel.

    use crate::consts::GPU_BLOCK_SIZE;
    use crate::utils::Real;

    use cust::error::CudaResult;
    use cust::function::{BlockSize, GridSize};
    use cust::prelude::*;

    /// Grid dimensions covering `len` items at the fixed block size.
    pub fn elementwise_grid(len: usize) -> (GridSize, BlockSize) {
        let grid = (len + GPU_BLOCK_SIZE - 1) / GPU_BLOCK_SIZE;
        (GridSize::x(grid as u32), BlockSize::x(GPU_BLOCK_SIZE as u32))
    }

    /// Launches the elementwise three-output kernel over `len` items,
    /// delegating grid selection to the layer. The caller synchronizes the
    /// stream.
    #[allow(clippy::too_many_arguments)]
    pub fn forall3(
        func: &Function,
        stream: &Stream,
        len: usize,
        out1: &DeviceBuffer<Real>,
        out2: &DeviceBuffer<Real>,
        out3: &DeviceBuffer<Real>,
        in1: &DeviceBuffer<Real>,
        in2: &DeviceBuffer<Real>,
    ) -> CudaResult<()> {
        let (grid_size, block_size) = elementwise_grid(len);
        unsafe {
            launch!(
                func<<<grid_size, block_size, 0, stream>>>(
                    out1.as_device_ptr(),
                    out2.as_device_ptr(),
                    out3.as_device_ptr(),
                    in1.as_device_ptr(),
                    in2.as_device_ptr(),
                    len
                )
            )
        }
    }
}

#[cfg(feature = "opencl")]
pub mod opencl {
    //! Device-side forall for OpenCL: work-size selection and enqueue.

    /// Enqueues `kernel` once over `len` work items.
    pub fn forall(kernel: &ocl::Kernel, len: usize) -> ocl::Result<()> {
        unsafe { kernel.cmd().global_work_size(len).enq() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_policy(policy: ExecPolicy) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let in1 = vec![1.0, 2.0, 3.0, 4.0];
        let in2 = vec![10.0, 20.0, 30.0, 40.0];
        let mut out1 = vec![0.0; 4];
        let mut out2 = vec![0.0; 4];
        let mut out3 = vec![0.0; 4];
        forall3(
            policy,
            &mut out1,
            &mut out2,
            &mut out3,
            &in1,
            &in2,
            |a, b| -a - b,
        );
        (out1, out2, out3)
    }

    #[test]
    fn simd_policy_matches_reference() {
        let expected = vec![-11.0, -22.0, -33.0, -44.0];
        let (out1, out2, out3) = run_policy(ExecPolicy::Simd);
        assert_eq!(out1, expected);
        assert_eq!(out2, expected);
        assert_eq!(out3, expected);
    }

    #[test]
    fn threads_policy_matches_reference() {
        let expected = vec![-11.0, -22.0, -33.0, -44.0];
        let (out1, out2, out3) = run_policy(ExecPolicy::Threads);
        assert_eq!(out1, expected);
        assert_eq!(out2, expected);
        assert_eq!(out3, expected);
    }

    #[test]
    fn policies_agree_on_larger_buffers() {
        let in1: Vec<f64> = (0..4096).map(|i| i as f64 * 0.5).collect();
        let in2: Vec<f64> = (0..4096).map(|i| i as f64 * 0.25).collect();
        let mut simd = (vec![0.0; 4096], vec![0.0; 4096], vec![0.0; 4096]);
        let mut par = (vec![0.0; 4096], vec![0.0; 4096], vec![0.0; 4096]);
        forall3(
            ExecPolicy::Simd,
            &mut simd.0,
            &mut simd.1,
            &mut simd.2,
            &in1,
            &in2,
            |a, b| -a - b,
        );
        forall3(
            ExecPolicy::Threads,
            &mut par.0,
            &mut par.1,
            &mut par.2,
            &in1,
            &in2,
            |a, b| -a - b,
        );
        assert_eq!(simd, par);
    }
}
